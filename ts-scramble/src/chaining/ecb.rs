use crate::{
    CipherError,
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Electronic Code Book (ECB) mode.
///
/// No padding is performed. The plain text and cipher text sizes must be
/// multiples of the block size of the base algorithm.
pub struct Ecb<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Ecb<P> {
    /// Properties of ECB over `P`.
    pub const PROPS: BlockCipherProperties =
        BlockCipherProperties::chained(P::PROPS, "ECB", false, P::PROPS.block_size, 0, 0);

    pub fn new() -> Self {
        Self {
            core: CipherCore::new(Self::PROPS),
            algo: P::new(),
        }
    }
}

impl<P: Primitive> Default for Ecb<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Ecb<P> {
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
        ecb_encrypt_in_place(&self.algo, data)
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        ecb_decrypt_in_place(&self.algo, data)
    }
}

/// Encrypt every whole block of `data` independently. A trailing residue,
/// if the caller left one, is not touched.
pub(crate) fn ecb_encrypt_in_place<P: Primitive>(
    algo: &P,
    data: &mut [u8],
) -> Result<(), CipherError> {
    for block in data.chunks_exact_mut(P::PROPS.block_size) {
        algo.encrypt_block_in_place(block)?;
    }
    Ok(())
}

/// Decrypt every whole block of `data` independently.
pub(crate) fn ecb_decrypt_in_place<P: Primitive>(
    algo: &P,
    data: &mut [u8],
) -> Result<(), CipherError> {
    for block in data.chunks_exact_mut(P::PROPS.block_size) {
        algo.decrypt_block_in_place(block)?;
    }
    Ok(())
}
