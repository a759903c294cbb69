use crate::{
    CipherError,
    chaining::{cbc_decrypt_blocks, cbc_encrypt_blocks},
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Cipher text Stealing (CTS) mode, alternative 1.
///
/// Several incompatible designs of CTS exist. This one implements the
/// description in:
/// - Bruce Schneier, Applied Cryptography (2nd Ed.), pp 191, 195
/// - RFC 2040, The RC5, RC5-CBC, RC5-CBC-Pad, and RC5-CTS Algorithms
/// - "CBC ciphertext stealing" on <https://en.wikipedia.org/wiki/Ciphertext_stealing>
///
/// The message must be strictly longer than one block: CTS needs at least
/// two blocks, the last one possibly partial.
pub struct Cts1<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Cts1<P> {
    /// Properties of CTS1 over `P`.
    pub const PROPS: BlockCipherProperties = BlockCipherProperties::chained(
        P::PROPS,
        "CTS1",
        true,
        P::PROPS.block_size + 1,
        3,
        P::PROPS.block_size,
    );

    pub fn new() -> Self {
        Self {
            core: CipherCore::new(Self::PROPS),
            algo: P::new(),
        }
    }

    // Size of the final chunk: the last partial block, or a whole block
    // when the message is an exact multiple of the block size.
    fn final_chunk(bsize: usize, len: usize) -> usize {
        match len % bsize {
            0 => bsize,
            r => r,
        }
    }
}

impl<P: Primitive> Default for Cts1<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Cts1<P> {
    fn core(&self) -> &CipherCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CipherCore {
        &mut self.core
    }

    fn schedule_key(&mut self) -> Result<(), CipherError> {
        self.algo.rekey(self.core.current_key())
    }

    fn encrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let n = data.len();
        let r = Self::final_chunk(bsize, n);
        let main = n - r;

        // All blocks before the final chunk are plain CBC.
        {
            let (iv, work) = self.core.iv_and_work();
            cbc_encrypt_blocks(&self.algo, bsize, iv, work, &mut data[..main])?;
        }

        let (_, work) = self.core.iv_and_work();
        let (w1, w2) = work.split_at_mut(bsize);
        let w2 = &mut w2[..bsize];

        // w2 = last partial block, zero-padded.
        w2.fill(0);
        w2[..r].copy_from_slice(&data[main..]);
        // w1 = previous-cipher XOR padded.
        for i in 0..bsize {
            w1[i] = data[main - bsize + i] ^ w2[i];
        }
        // w2 = encrypt(w1).
        self.algo.encrypt_block(w1, w2)?;
        // Swap the last two blocks, truncating the final one: the final
        // chunk receives the previous cipher text, the previous block
        // position receives the new encrypted block.
        let (head, tail) = data.split_at_mut(main);
        tail.copy_from_slice(&head[main - bsize..main - bsize + r]);
        head[main - bsize..].copy_from_slice(w2);
        Ok(())
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let n = data.len();
        let r = Self::final_chunk(bsize, n);
        let main = n - r - bsize;

        // CBC-decrypt everything before the final two blocks; the last
        // cipher block of that region (or the IV) is left in the second
        // scratch block.
        {
            let (iv, work) = self.core.iv_and_work();
            cbc_decrypt_blocks(&self.algo, bsize, iv, work, &mut data[..main])?;
        }

        let (_, work) = self.core.iv_and_work();
        let (w1, rest) = work.split_at_mut(bsize);
        let (prev, wd) = rest.split_at_mut(bsize);
        let wd = &mut wd[..bsize];

        // The remaining layout is: Cn, Cn-1 truncated to r bytes.
        // w1 = Cn-1, truncated.
        w1[..r].copy_from_slice(&data[main + bsize..]);
        // wd = decrypt(Cn) = Cn-1 XOR Pn (zero-padded).
        self.algo.decrypt_block(&data[main..main + bsize], wd)?;
        // Pn = wd XOR Cn-1, truncated, moved to its final place.
        for i in 0..r {
            data[main + bsize + i] = wd[i] ^ w1[i];
        }
        // Rebuild the complete Cn-1: first part received, tail from wd.
        w1[r..].copy_from_slice(&wd[r..]);
        // Pn-1 = decrypt(Cn-1) XOR previous cipher.
        self.algo.decrypt_block(w1, &mut data[main..main + bsize])?;
        for i in 0..bsize {
            data[main + i] ^= prev[i];
        }
        Ok(())
    }
}
