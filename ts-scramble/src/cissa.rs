use crate::{
    chaining::Cbc,
    cipher::delegate_block_cipher,
    primitive::Aes128,
    props::BlockCipherProperties,
};

// The IV is defined by the standard and not modifiable.
const CISSA_IV: [u8; 16] = [
    0x44, 0x56, 0x42, 0x54, 0x4d, 0x43, 0x50, 0x54, 0x41, 0x45, 0x53, 0x43, 0x49, 0x53, 0x53, 0x41,
];

/// DVB-CISSA AES-based TS packet encryption
/// (CISSA = Common IPTV Software-oriented Scrambling Algorithm).
///
/// Concretely AES-128-CBC with a constant, standard-mandated IV.
/// See ETSI TS 103 127, chapter 6.
pub struct DvbCissa {
    inner: Cbc<Aes128>,
}

impl DvbCissa {
    const PROPS: BlockCipherProperties =
        BlockCipherProperties::named(Cbc::<Aes128>::PROPS, "DVB-CISSA", Some(&CISSA_IV));

    pub fn new() -> Self {
        Self {
            inner: Cbc::with_properties(Self::PROPS),
        }
    }
}

impl Default for DvbCissa {
    fn default() -> Self {
        Self::new()
    }
}

delegate_block_cipher!(DvbCissa, inner);
