use std::cell::RefCell;
use std::rc::Rc;

use zeroize::Zeroizing;

use crate::{CipherError, bail, props::BlockCipherProperties};

/// A key may be used an unlimited number of times.
pub const UNLIMITED: usize = usize::MAX;

/// Reasons for an alert notification from a block cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertReason {
    /// First encryption with a new key, informational.
    FirstEncryption,
    /// First decryption with a new key, informational.
    FirstDecryption,
    /// The maximum number of encryptions with the key is exceeded.
    EncryptionExceeded,
    /// The maximum number of decryptions with the key is exceeded.
    DecryptionExceeded,
}

impl AlertReason {
    /// True for the informational first-use reasons.
    pub fn is_first_use(self) -> bool {
        matches!(self, Self::FirstEncryption | Self::FirstDecryption)
    }
}

/// Snapshot of a cipher instance, passed to alert handlers.
pub struct AlertInfo<'a> {
    pub reason: AlertReason,
    /// Application-defined cipher id, zero by default.
    pub cipher_id: i32,
    /// Display name of the cipher raising the alert.
    pub name: String,
    /// Current key of the cipher raising the alert.
    pub key: &'a [u8],
}

/// Handler notified when a cipher raises an alert.
///
/// For the `*Exceeded` reasons, returning `true` confirms the alert and the
/// operation fails; returning `false` cancels the alert and the operation
/// proceeds. For the first-use reasons the return value is ignored.
pub trait BlockCipherAlert {
    fn handle_block_cipher_alert(&mut self, info: AlertInfo<'_>) -> bool;
}

/// Non-owning, shareable reference to an alert handler.
pub type SharedAlert = Rc<RefCell<dyn BlockCipherAlert>>;

/// Mutable state common to every block-cipher instance: current key and IV,
/// key-usage accounting and the scratch buffer of the chaining mode.
pub struct CipherCore {
    props: BlockCipherProperties,
    key: Zeroizing<Vec<u8>>,
    iv: Vec<u8>,
    key_set: bool,
    cipher_id: i32,
    enc_count: usize,
    dec_count: usize,
    enc_max: usize,
    dec_max: usize,
    alert: Option<SharedAlert>,
    pub(crate) work: Vec<u8>,
}

impl CipherCore {
    pub fn new(props: BlockCipherProperties) -> Self {
        Self {
            key: Zeroizing::new(Vec::new()),
            iv: props.fixed_iv.map(<[u8]>::to_vec).unwrap_or_default(),
            key_set: false,
            cipher_id: 0,
            enc_count: 0,
            dec_count: 0,
            enc_max: UNLIMITED,
            dec_max: UNLIMITED,
            alert: None,
            work: vec![0; props.work_blocks * props.block_size],
            props,
        }
    }

    pub fn properties(&self) -> &BlockCipherProperties {
        &self.props
    }

    pub fn current_key(&self) -> &[u8] {
        self.key.as_slice()
    }

    pub fn current_iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn has_key(&self) -> bool {
        self.key_set
    }

    pub(crate) fn has_key_material(&self) -> bool {
        !self.key.is_empty()
    }

    pub(crate) fn store_key(&mut self, key: &[u8]) {
        self.key.clear();
        self.key.extend_from_slice(key);
    }

    pub(crate) fn store_iv(&mut self, iv: &[u8]) {
        self.iv.clear();
        self.iv.extend_from_slice(iv);
    }

    pub(crate) fn set_key_flag(&mut self, set: bool) {
        self.key_set = set;
    }

    pub(crate) fn reset_counters(&mut self) {
        self.enc_count = 0;
        self.dec_count = 0;
    }

    /// Current IV and scratch buffer, borrowed together for the chaining
    /// mode implementations.
    pub(crate) fn iv_and_work(&mut self) -> (&[u8], &mut [u8]) {
        (&self.iv, &mut self.work)
    }

    fn dispatch_alert(&self, reason: AlertReason) -> bool {
        match self.alert.clone() {
            Some(handler) => handler.borrow_mut().handle_block_cipher_alert(AlertInfo {
                reason,
                cipher_id: self.cipher_id,
                name: self.props.display_name(),
                key: self.key.as_slice(),
            }),
            None => true,
        }
    }

    /// Pre-encryption policy: key and IV present, use ceiling honored,
    /// first-use notification, counter increment.
    pub(crate) fn allow_encrypt(&mut self) -> Result<(), CipherError> {
        bail!(!self.key_set, CipherError::KeyNotSet);
        bail!(
            self.iv.len() < self.props.min_iv_size || self.iv.len() > self.props.max_iv_size,
            CipherError::BadIvSize
        );
        if self.enc_count >= self.enc_max && self.dispatch_alert(AlertReason::EncryptionExceeded) {
            return Err(CipherError::UseLimitExceeded);
        }
        if self.enc_count == 0 {
            self.dispatch_alert(AlertReason::FirstEncryption);
        }
        self.enc_count += 1;
        Ok(())
    }

    /// Pre-decryption policy, symmetric to [`Self::allow_encrypt`].
    pub(crate) fn allow_decrypt(&mut self) -> Result<(), CipherError> {
        bail!(!self.key_set, CipherError::KeyNotSet);
        bail!(
            self.iv.len() < self.props.min_iv_size || self.iv.len() > self.props.max_iv_size,
            CipherError::BadIvSize
        );
        if self.dec_count >= self.dec_max && self.dispatch_alert(AlertReason::DecryptionExceeded) {
            return Err(CipherError::UseLimitExceeded);
        }
        if self.dec_count == 0 {
            self.dispatch_alert(AlertReason::FirstDecryption);
        }
        self.dec_count += 1;
        Ok(())
    }
}

/// The uniform contract of all ciphers of this crate, base algorithms and
/// chaining modes alike.
///
/// Implementations provide the key schedule and the in-place transformation
/// of one logical message; everything else (key/IV management, use
/// accounting, alert dispatch, out-of-place operation) is provided here.
///
/// Since two Rust slices cannot alias, in-place operation is the primary
/// code path and the out-of-place [`BlockCipher::encrypt`]/
/// [`BlockCipher::decrypt`] first copy the input into the output buffer.
pub trait BlockCipher {
    /// Common cipher state.
    fn core(&self) -> &CipherCore;

    /// Common cipher state, mutable.
    fn core_mut(&mut self) -> &mut CipherCore;

    /// Algorithm-specific key schedule. The key, and the IV when one is
    /// used, are already stored in the core.
    fn schedule_key(&mut self) -> Result<(), CipherError>;

    /// Algorithm-specific encryption of one message, in place. The message
    /// size has already been validated.
    fn encrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError>;

    /// Algorithm-specific decryption of one message, in place. The message
    /// size has already been validated.
    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError>;

    /// Properties of the algorithm and chaining mode.
    fn properties(&self) -> &BlockCipherProperties {
        self.core().properties()
    }

    /// Display name, including the chaining suffix if any.
    fn name(&self) -> String {
        self.properties().display_name()
    }

    fn block_size(&self) -> usize {
        self.properties().block_size
    }

    fn min_key_size(&self) -> usize {
        self.properties().min_key_size
    }

    fn max_key_size(&self) -> usize {
        self.properties().max_key_size
    }

    fn min_iv_size(&self) -> usize {
        self.properties().min_iv_size
    }

    fn max_iv_size(&self) -> usize {
        self.properties().max_iv_size
    }

    fn min_message_size(&self) -> usize {
        self.properties().min_message_size
    }

    fn residue_allowed(&self) -> bool {
        self.properties().residue_allowed
    }

    fn has_chaining_mode(&self) -> bool {
        self.properties().chaining
    }

    fn is_valid_key_size(&self, size: usize) -> bool {
        let p = self.properties();
        size >= p.min_key_size && size <= p.max_key_size
    }

    fn is_valid_iv_size(&self, size: usize) -> bool {
        let p = self.properties();
        if !p.chaining || p.fixed_iv.is_some() {
            // No explicit IV is allowed.
            size == 0
        } else {
            size >= p.min_iv_size && size <= p.max_iv_size
        }
    }

    /// Validate a message size against the properties. Overridable for
    /// algorithms with additional constraints.
    fn is_valid_message_size(&self, size: usize) -> bool {
        let p = self.properties();
        size >= p.min_message_size && (p.residue_allowed || size % p.block_size == 0)
    }

    /// Schedule a new key. When the mode needs an IV and none is set yet,
    /// the schedule is deferred to the next [`BlockCipher::set_iv`] call and
    /// the cipher is not usable in between.
    fn set_key(&mut self, key: &[u8]) -> Result<(), CipherError> {
        install_key(self, key, None)
    }

    /// Schedule a new key and install a new IV in one call.
    fn set_key_iv(&mut self, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
        install_key(self, key, Some(iv))
    }

    /// Install a new IV without changing the key. When a key was already
    /// provided, it is re-scheduled against the new IV. On validation
    /// failure the current IV is left unchanged.
    fn set_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        bail!(!self.is_valid_iv_size(iv.len()), CipherError::BadIvSize);
        self.core_mut().store_iv(iv);
        if self.core().has_key_material() {
            let scheduled = self.schedule_key();
            self.core_mut().set_key_flag(scheduled.is_ok());
            scheduled
        } else {
            Ok(())
        }
    }

    /// Encrypt one message in place.
    fn encrypt_in_place(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        bail!(!self.is_valid_message_size(data.len()), CipherError::BadMessageSize);
        self.core_mut().allow_encrypt()?;
        self.encrypt_in_place_impl(data)
    }

    /// Decrypt one message in place.
    fn decrypt_in_place(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        bail!(!self.is_valid_message_size(data.len()), CipherError::BadMessageSize);
        self.core_mut().allow_decrypt()?;
        self.decrypt_in_place_impl(data)
    }

    /// Encrypt one message into a separate buffer. Returns the size of the
    /// cipher text, always equal to the plain-text size (no padding).
    fn encrypt(&mut self, plain: &[u8], cipher: &mut [u8]) -> Result<usize, CipherError> {
        bail!(!self.is_valid_message_size(plain.len()), CipherError::BadMessageSize);
        bail!(cipher.len() < plain.len(), CipherError::OutputBufferTooSmall);
        self.core_mut().allow_encrypt()?;
        cipher[..plain.len()].copy_from_slice(plain);
        self.encrypt_in_place_impl(&mut cipher[..plain.len()])?;
        Ok(plain.len())
    }

    /// Decrypt one message into a separate buffer. Returns the size of the
    /// plain text, always equal to the cipher-text size.
    fn decrypt(&mut self, cipher: &[u8], plain: &mut [u8]) -> Result<usize, CipherError> {
        bail!(!self.is_valid_message_size(cipher.len()), CipherError::BadMessageSize);
        bail!(plain.len() < cipher.len(), CipherError::OutputBufferTooSmall);
        self.core_mut().allow_decrypt()?;
        plain[..cipher.len()].copy_from_slice(cipher);
        self.decrypt_in_place_impl(&mut plain[..cipher.len()])?;
        Ok(cipher.len())
    }

    /// Number of encryptions performed with the current key.
    fn encryption_count(&self) -> usize {
        self.core().enc_count
    }

    /// Number of decryptions performed with the current key.
    fn decryption_count(&self) -> usize {
        self.core().dec_count
    }

    /// Maximum number of encryptions with one key, [`UNLIMITED`] by default.
    fn set_encryption_max(&mut self, count: usize) {
        self.core_mut().enc_max = count;
    }

    /// Maximum number of decryptions with one key, [`UNLIMITED`] by default.
    fn set_decryption_max(&mut self, count: usize) {
        self.core_mut().dec_max = count;
    }

    fn encryption_max(&self) -> usize {
        self.core().enc_max
    }

    fn decryption_max(&self) -> usize {
        self.core().dec_max
    }

    /// Install or remove the alert handler. Only one handler at a time.
    fn set_alert_handler(&mut self, handler: Option<SharedAlert>) {
        self.core_mut().alert = handler;
    }

    /// Application-defined id, stored but never interpreted.
    fn set_cipher_id(&mut self, id: i32) {
        self.core_mut().cipher_id = id;
    }

    fn cipher_id(&self) -> i32 {
        self.core().cipher_id
    }
}

// Shared body of set_key / set_key_iv.
fn install_key<C: BlockCipher + ?Sized>(
    cipher: &mut C,
    key: &[u8],
    iv: Option<&[u8]>,
) -> Result<(), CipherError> {
    if !cipher.is_valid_key_size(key.len()) {
        cipher.core_mut().set_key_flag(false);
        return Err(CipherError::BadKeySize);
    }
    if let Some(iv) = iv {
        if !cipher.is_valid_iv_size(iv.len()) {
            cipher.core_mut().set_key_flag(false);
            return Err(CipherError::BadIvSize);
        }
    }
    {
        let core = cipher.core_mut();
        core.reset_counters();
        core.store_key(key);
        if let Some(iv) = iv {
            if core.properties().fixed_iv.is_none() {
                core.store_iv(iv);
            }
        }
    }
    let wait_for_iv = {
        let core = cipher.core();
        core.properties().min_iv_size > 0 && core.current_iv().is_empty()
    };
    if wait_for_iv {
        // The key is kept, the schedule happens when an IV arrives.
        cipher.core_mut().set_key_flag(false);
        return Ok(());
    }
    let scheduled = cipher.schedule_key();
    cipher.core_mut().set_key_flag(scheduled.is_ok());
    scheduled
}

/// Implement [`BlockCipher`] by delegation to an inner field. Used by the
/// named standards which are fixed configurations of a generic mode.
macro_rules! delegate_block_cipher {
    ($ty:ty, $field:tt) => {
        impl $crate::BlockCipher for $ty {
            fn core(&self) -> &$crate::CipherCore {
                self.$field.core()
            }

            fn core_mut(&mut self) -> &mut $crate::CipherCore {
                self.$field.core_mut()
            }

            fn schedule_key(&mut self) -> Result<(), $crate::CipherError> {
                self.$field.schedule_key()
            }

            fn encrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), $crate::CipherError> {
                self.$field.encrypt_in_place_impl(data)
            }

            fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), $crate::CipherError> {
                self.$field.decrypt_in_place_impl(data)
            }
        }
    };
}

pub(crate) use delegate_block_cipher;
