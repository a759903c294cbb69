//! Cipher chaining modes, generic over any base algorithm implementing
//! [`Primitive`](crate::Primitive).
//!
//! Each mode owns its base cipher and exposes the same
//! [`BlockCipher`](crate::BlockCipher) contract, so modes and base
//! algorithms are interchangeable from the caller's point of view.

mod cbc;
mod ctr;
mod cts1;
mod cts2;
mod cts3;
mod cts4;
mod dvs042;
mod ecb;

pub use cbc::Cbc;
pub use ctr::Ctr;
pub use cts1::Cts1;
pub use cts2::Cts2;
pub use cts3::Cts3;
pub use cts4::Cts4;
pub use dvs042::Dvs042;
pub use ecb::Ecb;

pub(crate) use cbc::{cbc_decrypt_blocks, cbc_encrypt_blocks};
pub(crate) use ecb::{ecb_decrypt_in_place, ecb_encrypt_in_place};
