use crate::{
    chaining::Dvs042,
    cipher::delegate_block_cipher,
    primitive::Aes128,
    props::BlockCipherProperties,
};

// The IV is defined by the standard and not modifiable.
const IDSA_IV: [u8; 16] = [0; 16];

/// ATIS-0800006 AES-based TS packet encryption (ATIS-IDSA).
///
/// Concretely DVS 042 over AES-128 with an all-zero IV and the short-IV
/// facility suppressed: the long IV is used for every message size.
pub struct AtisIdsa {
    inner: Dvs042<Aes128>,
}

impl AtisIdsa {
    const PROPS: BlockCipherProperties =
        BlockCipherProperties::named(Dvs042::<Aes128>::PROPS, "ATIS-IDSA", Some(&IDSA_IV));

    pub fn new() -> Self {
        Self {
            inner: Dvs042::with_properties(Self::PROPS, true),
        }
    }
}

impl Default for AtisIdsa {
    fn default() -> Self {
        Self::new()
    }
}

delegate_block_cipher!(AtisIdsa, inner);
