//! # TS-Scramble
//!
//! This crate is the cryptographic core of a broadcast MPEG transport-stream
//! toolkit. It provides:
//!
//! - A catalog of base block ciphers ([`Aes128`], [`Aes256`], [`Des`],
//!   [`TripleDes`], [`Sm4`]), delegated to the RustCrypto provider crates.
//! - Cipher chaining modes generic over any base algorithm: [`Ecb`],
//!   [`Cbc`], [`Ctr`], the four incompatible ciphertext-stealing variants
//!   [`Cts1`]..[`Cts4`] and [`Dvs042`].
//! - The TS scrambling standards: [`DvbCsa2`] (a bespoke block/stream
//!   composite), [`DvbCissa`], [`AtisIdsa`], [`Scte52_2003`] and
//!   [`Scte52_2008`].
//! - Hash functions [`Sha1`], [`Sha256`], [`Sha512`].
//! - The [`TsScrambling`] controller, driving the even/odd control-word
//!   lifecycle over 188-byte TS packets.
//! - Pseudo-random generators, including a fully deterministic one and an
//!   entropy-mixing one with a persistent seed file.
//!
//! Every cipher, base algorithm or chaining mode alike, exposes the same
//! [`BlockCipher`] contract: key and IV management, in-place and
//! out-of-place operation, key-use accounting and alert dispatch.
//!
//! ## Example
//!
//! ```rust
//! use ts_scramble::{Aes128, BlockCipher, Cbc, CipherError};
//!
//! fn main() -> Result<(), CipherError> {
//!     let mut cipher = Cbc::<Aes128>::new();
//!     cipher.set_key_iv(&[0x42; 16], &[0x07; 16])?;
//!
//!     let mut data = *b"a message of exactly 32 bytes...";
//!     cipher.encrypt_in_place(&mut data)?;
//!     assert_ne!(&data, b"a message of exactly 32 bytes...");
//!
//!     cipher.decrypt_in_place(&mut data)?;
//!     assert_eq!(&data, b"a message of exactly 32 bytes...");
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub use crate::{
    chaining::{Cbc, Ctr, Cts1, Cts2, Cts3, Cts4, Dvs042, Ecb},
    cipher::{
        AlertInfo, AlertReason, BlockCipher, BlockCipherAlert, CipherCore, SharedAlert, UNLIMITED,
    },
    cissa::DvbCissa,
    csa2::{DvbCsa2, EntropyMode},
    hash::{Hash, Sha1, Sha256, Sha512},
    idsa::AtisIdsa,
    packet::{PKT_SIZE, SC_CLEAR, SC_EVEN_KEY, SC_ODD_KEY, SC_RESERVED, SYNC_BYTE, TsPacket},
    primitive::{Aes128, Aes256, Des, Primitive, Raw, Sm4, TripleDes},
    props::BlockCipherProperties,
    random::{
        BetterSystemRandomGenerator, RandomGenerator, ReproducibleRandomGenerator,
        SystemRandomGenerator,
    },
    scrambling::{ScramblingMode, TsScrambling},
    scte52::{Scte52_2003, Scte52_2008},
};

mod chaining;
mod cipher;
mod cissa;
mod csa2;
mod hash;
mod idsa;
mod packet;
mod primitive;
mod props;
mod random;
mod scrambling;
mod scte52;

#[cfg(test)]
mod tests;

/// Errors returned by the ciphers, hashes, scrambler and random
/// generators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CipherError {
    #[error("[TS-Scramble] invalid key size")]
    BadKeySize,
    #[error("[TS-Scramble] invalid initialization vector size")]
    BadIvSize,
    #[error("[TS-Scramble] invalid message size")]
    BadMessageSize,
    #[error("[TS-Scramble] output buffer too small")]
    OutputBufferTooSmall,
    #[error("[TS-Scramble] key not set")]
    KeyNotSet,
    #[error("[TS-Scramble] packet is already scrambled")]
    AlreadyScrambled,
    #[error("[TS-Scramble] key use limit exceeded")]
    UseLimitExceeded,
    #[error("[TS-Scramble] cryptographic provider failure")]
    ProviderFailure,
    #[error("[TS-Scramble] insufficient initial seed")]
    SeedInsufficient,
    #[error("[TS-Scramble] unable to parse hex string: {0}")]
    ParseHex(#[from] hex::FromHexError),
    #[error("[TS-Scramble] i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CipherError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Helper macro to bail out early with a [`CipherError`]
/// if any condition is true.
#[macro_export]
macro_rules! bail {
    ($expression:expr, $err:expr) => {
        if $expression {
            return Err($err);
        }
    };
    ( $( $cond:expr , $err:expr ),+ $(,)? ) => {
        $(
            if $cond {
                return Err($err);
            }
        )+
    };
}
