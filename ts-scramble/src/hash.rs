//! Cryptographic hash functions.
//!
//! Digest computation is delegated to the provider crates (`sha1`, `sha2`);
//! this module normalizes them behind the incremental [`Hash`] contract.

use digest::{Digest, FixedOutputReset};

use crate::{CipherError, bail};

/// Incremental hash computation: `init`, any number of `add`, `get_hash`,
/// then possibly `init` again.
pub trait Hash {
    /// Algorithm name (informational only).
    fn name(&self) -> &'static str;

    /// Size in bytes of the resulting hash.
    fn hash_size(&self) -> usize;

    /// Reinitialize the computation.
    fn init(&mut self);

    /// Add some part of the message to hash.
    fn add(&mut self, data: &[u8]);

    /// Write the resulting hash value into `hash` and reinitialize the
    /// context. Returns the hash size.
    fn get_hash(&mut self, hash: &mut [u8]) -> Result<usize, CipherError>;

    /// Compute a hash in one operation, same as init + add + get_hash.
    fn hash(&mut self, data: &[u8], hash: &mut [u8]) -> Result<usize, CipherError> {
        self.init();
        self.add(data);
        self.get_hash(hash)
    }
}

macro_rules! impl_hash {
    ($( $(#[$doc:meta])* $ty:ident => ($provider:ty, $name:literal, $size:literal) ),*$(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Default)]
            pub struct $ty {
                ctx: $provider,
            }

            impl $ty {
                pub const HASH_SIZE: usize = $size;

                pub fn new() -> Self {
                    Self::default()
                }
            }

            impl Hash for $ty {
                fn name(&self) -> &'static str {
                    $name
                }

                fn hash_size(&self) -> usize {
                    $size
                }

                fn init(&mut self) {
                    Digest::reset(&mut self.ctx);
                }

                fn add(&mut self, data: &[u8]) {
                    Digest::update(&mut self.ctx, data);
                }

                fn get_hash(&mut self, hash: &mut [u8]) -> Result<usize, CipherError> {
                    bail!(hash.len() < $size, CipherError::OutputBufferTooSmall);
                    let digest = FixedOutputReset::finalize_fixed_reset(&mut self.ctx);
                    hash[..$size].copy_from_slice(digest.as_slice());
                    Ok($size)
                }
            }
        )*
    };
}

impl_hash! {
    /// SHA-1 hash (FIPS 180-1). Legacy, kept for older CAS protocols.
    Sha1 => (sha1::Sha1, "SHA-1", 20),
    /// SHA-256 hash (FIPS 180-2).
    Sha256 => (sha2::Sha256, "SHA-256", 32),
    /// SHA-512 hash (FIPS 180-2).
    Sha512 => (sha2::Sha512, "SHA-512", 64),
}
