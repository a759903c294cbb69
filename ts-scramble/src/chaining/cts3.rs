use crate::{
    CipherError,
    chaining::{ecb_decrypt_in_place, ecb_encrypt_in_place},
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Cipher text Stealing (CTS) mode, alternative 3.
///
/// Several incompatible designs of CTS exist. This one implements "ECB
/// ciphertext stealing" as described on
/// <https://en.wikipedia.org/wiki/Ciphertext_stealing>. There is no IV.
///
/// The message must be strictly longer than one block.
pub struct Cts3<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Cts3<P> {
    /// Properties of CTS3 over `P`.
    pub const PROPS: BlockCipherProperties = BlockCipherProperties::chained(
        P::PROPS,
        "CTS3",
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

    fn final_chunk(bsize: usize, len: usize) -> usize {
        match len % bsize {
            0 => bsize,
            r => r,
        }
    }
}

impl<P: Primitive> Default for Cts3<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Cts3<P> {
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
        let q = n - bsize - r;

        // ECB for everything before the last two blocks.
        ecb_encrypt_in_place(&self.algo, &mut data[..q])?;

        let work = &mut self.core.work;
        let (w1, w2) = work.split_at_mut(bsize);
        let w2 = &mut w2[..bsize];

        // w1 = encrypt(Pn-1); its first r bytes will become Cn.
        self.algo.encrypt_block(&data[q..q + bsize], w1)?;
        // w2 = Pn || tail of w1.
        w2[..r].copy_from_slice(&data[q + bsize..]);
        w2[r..].copy_from_slice(&w1[r..]);
        // Cn-1 = encrypt(w2), then Cn.
        self.algo.encrypt_block(w2, &mut data[q..q + bsize])?;
        data[q + bsize..].copy_from_slice(&w1[..r]);
        Ok(())
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let n = data.len();
        let r = Self::final_chunk(bsize, n);
        let q = n - bsize - r;

        // ECB for everything before the last two blocks.
        ecb_decrypt_in_place(&self.algo, &mut data[..q])?;

        let work = &mut self.core.work;
        let (w1, w2) = work.split_at_mut(bsize);
        let w2 = &mut w2[..bsize];

        // w1 = decrypt(Cn-1); its first r bytes are Pn.
        self.algo.decrypt_block(&data[q..q + bsize], w1)?;
        // Save Cn, then move Pn to its final place.
        w2[..r].copy_from_slice(&data[q + bsize..]);
        data[q + bsize..].copy_from_slice(&w1[..r]);
        // Rebuild the stolen block: Cn || tail of w1.
        w1[..r].copy_from_slice(&w2[..r]);
        self.algo.decrypt_block(w1, &mut data[q..q + bsize])?;
        Ok(())
    }
}
