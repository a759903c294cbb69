use crate::{
    CipherError,
    chaining::{ecb_decrypt_in_place, ecb_encrypt_in_place},
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Cipher text Stealing (CTS) mode, alternative 4.
///
/// Several incompatible designs of CTS exist. This one reproduces the
/// STMicroelectronics STi71xx ECB-CTS implementation, bit for bit. The
/// residue is interleaved with the tail of the previous block in an
/// asymmetric fashion which matches no published standard; the byte layout
/// of the hardware is authoritative. There is no IV.
///
/// The message must be strictly longer than one block.
pub struct Cts4<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Cts4<P> {
    /// Properties of CTS4 over `P`.
    pub const PROPS: BlockCipherProperties = BlockCipherProperties::chained(
        P::PROPS,
        "CTS4",
        true,
        P::PROPS.block_size + 1,
        2,
        0,
    );

    pub fn new() -> Self {
        Self {
            core: CipherCore::new(Self::PROPS),
            algo: P::new(),
        }
    }
}

impl<P: Primitive> Default for Cts4<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Cts4<P> {
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
        let r = match n % bsize {
            0 => bsize,
            r => r,
        };
        let q = n - bsize - r;

        // ECB for everything before the last two blocks.
        ecb_encrypt_in_place(&self.algo, &mut data[..q])?;

        let work = &mut self.core.work;
        let (w1, w2) = work.split_at_mut(bsize);
        let w2 = &mut w2[..bsize];

        // First pass: tail of Pn-1 followed by the residue.
        w1[..bsize - r].copy_from_slice(&data[q + r..q + bsize]);
        w1[bsize - r..].copy_from_slice(&data[q + bsize..]);
        self.algo.encrypt_block(w1, w2)?;
        // The tail of that cipher block lands after the swap point.
        data[q + bsize..].copy_from_slice(&w2[bsize - r..]);
        // Second pass: head of Pn-1 followed by the head of the first pass.
        w1[..r].copy_from_slice(&data[q..q + r]);
        w1[r..].copy_from_slice(&w2[..bsize - r]);
        self.algo.encrypt_block(w1, &mut data[q..q + bsize])?;
        Ok(())
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let n = data.len();
        let r = match n % bsize {
            0 => bsize,
            r => r,
        };
        let q = n - r;

        // ECB for every whole block before the final chunk.
        ecb_decrypt_in_place(&self.algo, &mut data[..q])?;

        let work = &mut self.core.work;
        let (w1, w2) = work.split_at_mut(bsize);
        let w2 = &mut w2[..bsize];

        // Rebuild the interleaved block from the tail of the decrypted
        // previous block and the final cipher chunk, then decrypt it over
        // both regions.
        w1[..bsize - r].copy_from_slice(&data[q - bsize + r..q]);
        w1[bsize - r..].copy_from_slice(&data[q..]);
        self.algo.decrypt_block(w1, w2)?;
        data[q - bsize + r..].copy_from_slice(w2);
        Ok(())
    }
}
