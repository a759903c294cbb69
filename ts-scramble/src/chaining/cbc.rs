use crate::{
    CipherError,
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Cipher Block Chaining (CBC) mode.
///
/// No padding is performed. The plain text and cipher text sizes must be
/// multiples of the block size of the base algorithm.
pub struct Cbc<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Cbc<P> {
    /// Properties of CBC over `P`. Three scratch blocks are needed for the
    /// in-place decryption.
    pub const PROPS: BlockCipherProperties = BlockCipherProperties::chained(
        P::PROPS,
        "CBC",
        false,
        P::PROPS.block_size,
        3,
        P::PROPS.block_size,
    );

    pub fn new() -> Self {
        Self::with_properties(Self::PROPS)
    }

    // For standards which are a fixed CBC configuration (DVB-CISSA).
    pub(crate) fn with_properties(props: BlockCipherProperties) -> Self {
        Self {
            core: CipherCore::new(props),
            algo: P::new(),
        }
    }
}

impl<P: Primitive> Default for Cbc<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Cbc<P> {
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
        let (iv, work) = self.core.iv_and_work();
        cbc_encrypt_blocks(&self.algo, bsize, iv, work, data)
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let (iv, work) = self.core.iv_and_work();
        cbc_decrypt_blocks(&self.algo, bsize, iv, work, data)
    }
}

/// CBC-encrypt a whole-block region in place.
///
/// `work` must hold at least one block of scratch.
pub(crate) fn cbc_encrypt_blocks<P: Primitive>(
    algo: &P,
    bsize: usize,
    iv: &[u8],
    work: &mut [u8],
    data: &mut [u8],
) -> Result<(), CipherError> {
    let mut off = 0;
    while off < data.len() {
        {
            let (done, rest) = data.split_at_mut(off);
            let prev: &[u8] = if off == 0 { iv } else { &done[off - bsize..] };
            for i in 0..bsize {
                work[i] = prev[i] ^ rest[i];
            }
        }
        algo.encrypt_block(&work[..bsize], &mut data[off..off + bsize])?;
        off += bsize;
    }
    Ok(())
}

/// CBC-decrypt a whole-block region in place.
///
/// `work` must hold at least three blocks of scratch. Each cipher block is
/// saved before being overwritten by its plain text. On return,
/// `work[bsize..2 * bsize]` holds the last cipher block of the region, or
/// the IV when the region was empty; residue-handling modes read it back.
pub(crate) fn cbc_decrypt_blocks<P: Primitive>(
    algo: &P,
    bsize: usize,
    iv: &[u8],
    work: &mut [u8],
    data: &mut [u8],
) -> Result<(), CipherError> {
    let (w1, rest) = work.split_at_mut(bsize);
    let (w2, w3) = rest.split_at_mut(bsize);
    let w3 = &mut w3[..bsize];
    w2.copy_from_slice(iv);
    let mut off = 0;
    while off < data.len() {
        algo.decrypt_block(&data[off..off + bsize], w1)?;
        w3.copy_from_slice(&data[off..off + bsize]);
        for i in 0..bsize {
            data[off + i] = w2[i] ^ w1[i];
        }
        w2.copy_from_slice(w3);
        off += bsize;
    }
    Ok(())
}
