//! Base block-cipher algorithms.
//!
//! The one-block operations are delegated to the provider crates of the
//! RustCrypto project (`aes`, `des`, `sm4`); this module only normalizes
//! them behind the [`Primitive`] contract consumed by the chaining modes.

use cipher::{Block, BlockDecrypt, BlockEncrypt, KeyInit};

use crate::{
    CipherError, bail,
    chaining::{ecb_decrypt_in_place, ecb_encrypt_in_place},
    cipher::{BlockCipher, CipherCore},
    props::BlockCipherProperties,
};

/// Contract of a base block cipher: a keyed permutation on one fixed-size
/// block. Chaining modes are generic over this trait and use nothing else.
pub trait Primitive {
    /// Properties of the algorithm (`chaining = false`).
    const PROPS: BlockCipherProperties;

    /// New instance, no key scheduled.
    fn new() -> Self;

    /// Schedule a new key.
    fn rekey(&mut self, key: &[u8]) -> Result<(), CipherError>;

    /// Encrypt exactly one block.
    fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError>;

    /// Decrypt exactly one block.
    fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError>;

    /// Encrypt exactly one block in place.
    fn encrypt_block_in_place(&self, block: &mut [u8]) -> Result<(), CipherError>;

    /// Decrypt exactly one block in place.
    fn decrypt_block_in_place(&self, block: &mut [u8]) -> Result<(), CipherError>;
}

macro_rules! impl_primitive {
    ($( $(#[$doc:meta])* $ty:ident => ($provider:ty, $name:literal, $block:literal, $key:literal) ),*$(,)?) => {
        $(
            $(#[$doc])*
            pub struct $ty {
                ctx: Option<$provider>,
            }

            impl Primitive for $ty {
                const PROPS: BlockCipherProperties =
                    BlockCipherProperties::base($name, $block, $key);

                fn new() -> Self {
                    Self { ctx: None }
                }

                fn rekey(&mut self, key: &[u8]) -> Result<(), CipherError> {
                    self.ctx = Some(
                        <$provider as KeyInit>::new_from_slice(key)
                            .map_err(|_| CipherError::BadKeySize)?,
                    );
                    Ok(())
                }

                fn encrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
                    let ctx = self.ctx.as_ref().ok_or(CipherError::KeyNotSet)?;
                    bail!(
                        input.len() != $block || output.len() != $block,
                        CipherError::BadMessageSize
                    );
                    ctx.encrypt_block_b2b(
                        Block::<$provider>::from_slice(input),
                        Block::<$provider>::from_mut_slice(output),
                    );
                    Ok(())
                }

                fn decrypt_block(&self, input: &[u8], output: &mut [u8]) -> Result<(), CipherError> {
                    let ctx = self.ctx.as_ref().ok_or(CipherError::KeyNotSet)?;
                    bail!(
                        input.len() != $block || output.len() != $block,
                        CipherError::BadMessageSize
                    );
                    ctx.decrypt_block_b2b(
                        Block::<$provider>::from_slice(input),
                        Block::<$provider>::from_mut_slice(output),
                    );
                    Ok(())
                }

                fn encrypt_block_in_place(&self, block: &mut [u8]) -> Result<(), CipherError> {
                    let ctx = self.ctx.as_ref().ok_or(CipherError::KeyNotSet)?;
                    bail!(block.len() != $block, CipherError::BadMessageSize);
                    ctx.encrypt_block(Block::<$provider>::from_mut_slice(block));
                    Ok(())
                }

                fn decrypt_block_in_place(&self, block: &mut [u8]) -> Result<(), CipherError> {
                    let ctx = self.ctx.as_ref().ok_or(CipherError::KeyNotSet)?;
                    bail!(block.len() != $block, CipherError::BadMessageSize);
                    ctx.decrypt_block(Block::<$provider>::from_mut_slice(block));
                    Ok(())
                }
            }
        )*
    };
}

impl_primitive! {
    /// AES with a 128-bit key.
    Aes128 => (aes::Aes128, "AES-128", 16, 16),
    /// AES with a 256-bit key.
    Aes256 => (aes::Aes256, "AES-256", 16, 32),
    /// Single DES. Legacy, kept for SCTE 52.
    Des => (des::Des, "DES", 8, 8),
    /// Triple DES with three independent subkeys (EDE3).
    TripleDes => (des::TdesEde3, "TDES", 8, 24),
    /// SM4 block cipher (GB/T 32907).
    Sm4 => (sm4::Sm4, "SM4", 16, 16),
}

/// A base algorithm used directly, without a chaining wrapper.
///
/// Multi-block input is processed block by block (ECB semantics) and no IV
/// is accepted.
pub struct Raw<P: Primitive> {
    core: CipherCore,
    algo: P,
}

impl<P: Primitive> Raw<P> {
    pub fn new() -> Self {
        Self {
            core: CipherCore::new(P::PROPS),
            algo: P::new(),
        }
    }
}

impl<P: Primitive> Default for Raw<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Raw<P> {
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
