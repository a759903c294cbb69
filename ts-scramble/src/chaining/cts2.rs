use crate::{
    CipherError,
    chaining::{cbc_decrypt_blocks, cbc_encrypt_blocks},
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Cipher text Stealing (CTS) mode, alternative 2.
///
/// Several incompatible designs of CTS exist. This one implements the NIST
/// proposal "Proposal To Extend CBC Mode By Ciphertext Stealing". When the
/// message size is a multiple of the block size, the result is identical to
/// CBC; otherwise the block preceding the residue is encrypted against a
/// reconstructed block and the output ordering differs from CTS1.
///
/// The message must be at least one block long.
pub struct Cts2<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Cts2<P> {
    /// Properties of CTS2 over `P`.
    pub const PROPS: BlockCipherProperties = BlockCipherProperties::chained(
        P::PROPS,
        "CTS2",
        true,
        P::PROPS.block_size,
        3,
        P::PROPS.block_size,
    );

    pub fn new() -> Self {
        Self {
            core: CipherCore::new(Self::PROPS),
            algo: P::new(),
        }
    }
}

impl<P: Primitive> Default for Cts2<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Cts2<P> {
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
        let r = n % bsize;
        let main = n - r;

        // All whole blocks are plain CBC. A multiple of the block size is
        // exactly CBC.
        {
            let (iv, work) = self.core.iv_and_work();
            cbc_encrypt_blocks(&self.algo, bsize, iv, work, &mut data[..main])?;
        }
        if r == 0 {
            return Ok(());
        }

        let (_, work) = self.core.iv_and_work();
        let (w1, w2) = work.split_at_mut(bsize);
        let w2 = &mut w2[..bsize];
        let q = main - bsize;

        // w1 = Cn-1 XOR Pn over the residue, then the tail of Cn-1.
        for i in 0..r {
            w1[i] = data[q + i] ^ data[main + i];
        }
        w1[r..].copy_from_slice(&data[q + r..main]);
        // Cn = encrypt(w1), written over the tail of Cn-1 and the residue.
        self.algo.encrypt_block(w1, w2)?;
        data[q + r..q + r + bsize].copy_from_slice(w2);
        Ok(())
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let n = data.len();
        let r = n % bsize;

        if r == 0 {
            let (iv, work) = self.core.iv_and_work();
            return cbc_decrypt_blocks(&self.algo, bsize, iv, work, data);
        }

        // CBC-decrypt everything before the final complete-plus-partial
        // pair; the preceding cipher block (or the IV) stays in scratch.
        let main = n - bsize - r;
        {
            let (iv, work) = self.core.iv_and_work();
            cbc_decrypt_blocks(&self.algo, bsize, iv, work, &mut data[..main])?;
        }

        let (_, work) = self.core.iv_and_work();
        let (w1, rest) = work.split_at_mut(bsize);
        let (prev, _) = rest.split_at_mut(bsize);
        let q = main;

        // The remaining layout is: Cn-1 truncated to r bytes, then Cn.
        // w1 = decrypt(Cn).
        self.algo.decrypt_block(&data[q + r..q + r + bsize], w1)?;
        // Pn = w1 XOR Cn-1, truncated, moved to its final place.
        for i in 0..r {
            data[q + bsize + i] = w1[i] ^ data[q + i];
        }
        // Rebuild the complete Cn-1 in w1.
        for i in 0..r {
            w1[i] = data[q + i];
        }
        // Pn-1 = decrypt(Cn-1) XOR previous cipher.
        self.algo.decrypt_block(w1, &mut data[q..q + bsize])?;
        for i in 0..bsize {
            data[q + i] ^= prev[i];
        }
        Ok(())
    }
}
