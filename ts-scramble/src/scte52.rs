use crate::{
    chaining::Dvs042,
    cipher::delegate_block_cipher,
    primitive::Des,
    props::BlockCipherProperties,
};

/// ANSI/SCTE 52 2003 DES-based TS packet encryption.
///
/// DVS 042 has been renamed as "ANSI/SCTE 52 2003". The only difference
/// with the 2008 revision is the handling of messages shorter than the
/// block size: the 2003 version reuses the standard IV (the "whitener"),
/// so the short IV is ignored here.
pub struct Scte52_2003 {
    inner: Dvs042<Des>,
}

impl Scte52_2003 {
    const PROPS: BlockCipherProperties =
        BlockCipherProperties::named(Dvs042::<Des>::PROPS, "ANSI/SCTE 52 (2003)", None);

    pub fn new() -> Self {
        Self {
            inner: Dvs042::with_properties(Self::PROPS, true),
        }
    }

    /// Rejected in the 2003 profile, the standard IV covers every message
    /// size.
    pub fn set_short_iv(&mut self, iv: &[u8]) -> Result<(), crate::CipherError> {
        self.inner.set_short_iv(iv)
    }
}

impl Default for Scte52_2003 {
    fn default() -> Self {
        Self::new()
    }
}

delegate_block_cipher!(Scte52_2003, inner);

/// ANSI/SCTE 52 2008 DES-based TS packet encryption.
///
/// The 2008 revision requires a distinct "whitener2" for messages shorter
/// than the block size, installed with [`Scte52_2008::set_short_iv`].
pub struct Scte52_2008 {
    inner: Dvs042<Des>,
}

impl Scte52_2008 {
    const PROPS: BlockCipherProperties =
        BlockCipherProperties::named(Dvs042::<Des>::PROPS, "ANSI/SCTE 52 (2008)", None);

    pub fn new() -> Self {
        Self {
            inner: Dvs042::with_properties(Self::PROPS, false),
        }
    }

    /// Install the IV used for messages shorter than one block.
    pub fn set_short_iv(&mut self, iv: &[u8]) -> Result<(), crate::CipherError> {
        self.inner.set_short_iv(iv)
    }
}

impl Default for Scte52_2008 {
    fn default() -> Self {
        Self::new()
    }
}

delegate_block_cipher!(Scte52_2008, inner);
