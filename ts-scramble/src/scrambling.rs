//! Transport-stream scrambling using multiple algorithms, with the dual
//! control-word (even/odd parity) lifecycle.

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error};

use crate::{
    CipherError, bail,
    chaining::{Cbc, Ctr},
    cipher::{AlertInfo, BlockCipher, BlockCipherAlert, SharedAlert},
    cissa::DvbCissa,
    csa2::{DvbCsa2, EntropyMode},
    idsa::AtisIdsa,
    packet::{SC_CLEAR, SC_EVEN_KEY, SC_ODD_KEY, TsPacket},
    primitive::{Aes128, Primitive},
};

const AES_BLOCK_SIZE: usize = Aes128::PROPS.block_size;

/// Scrambling algorithm selector.
///
/// DVB-CSA2, DVB-CISSA and ATIS-IDSA are standard TS scrambling
/// algorithms. AES-CBC and AES-CTR are non-standard modes: with AES-CBC
/// the residue is left clear, with AES-CTR it is included in the
/// scrambling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScramblingMode {
    #[default]
    DvbCsa2,
    DvbCissa,
    AtisIdsa,
    AesCbc,
    AesCtr,
}

// Alert handler shared by the two parity slots: reports each control word
// the first time it is used and records it in the output CW file.
#[derive(Default)]
struct CwLogger {
    file: Option<File>,
}

impl BlockCipherAlert for CwLogger {
    fn handle_block_cipher_alert(&mut self, info: AlertInfo<'_>) -> bool {
        if info.reason.is_first_use() && !info.key.is_empty() {
            let parity = if info.cipher_id == 0 { "even" } else { "odd" };
            debug!("starting using CW {} ({parity})", hex::encode(info.key));
            if let Some(file) = self.file.as_mut() {
                if let Err(err) = writeln!(file, "{}", hex::encode(info.key)) {
                    error!("error writing CW file: {err}");
                }
            }
        }
        // Confirm every alert; use ceilings are not overridden here.
        true
    }
}

/// Transport-stream scrambler/descrambler.
///
/// Owns two cipher instances indexed by the control-word parity bit (slot
/// 0 even, slot 1 odd).
///
/// With a fixed control-word list:
/// - for encryption, the next CW is installed each time
///   [`TsScrambling::set_encrypt_parity`] selects a new parity;
/// - for decryption, the next CW is installed each time a new
///   scrambling-control value is observed in the TS packet headers;
/// - the list wraps around at the end.
pub struct TsScrambling {
    mode: ScramblingMode,
    iv: Vec<u8>,
    ctr_counter_bits: usize,
    entropy_mode: EntropyMode,
    cw_list: Vec<Vec<u8>>,
    next_cw: Option<usize>,
    encrypt_scv: u8,
    decrypt_scv: u8,
    slots: [Box<dyn BlockCipher>; 2],
    logger: Rc<RefCell<CwLogger>>,
    out_cw_file: Option<PathBuf>,
}

impl TsScrambling {
    pub fn new(mode: ScramblingMode) -> Result<Self, CipherError> {
        let logger = Rc::new(RefCell::new(CwLogger::default()));
        let iv = vec![0; AES_BLOCK_SIZE];
        let slots = [
            build_slot(mode, &iv, 0, EntropyMode::default(), &logger, 0)?,
            build_slot(mode, &iv, 0, EntropyMode::default(), &logger, 1)?,
        ];
        Ok(Self {
            mode,
            iv,
            ctr_counter_bits: 0,
            entropy_mode: EntropyMode::default(),
            cw_list: Vec::new(),
            next_cw: None,
            encrypt_scv: SC_CLEAR,
            decrypt_scv: SC_CLEAR,
            slots,
            logger,
            out_cw_file: None,
        })
    }

    fn rebuild_slots(&mut self) -> Result<(), CipherError> {
        for (id, slot) in self.slots.iter_mut().enumerate() {
            *slot = build_slot(
                self.mode,
                &self.iv,
                self.ctr_counter_bits,
                self.entropy_mode,
                &self.logger,
                id as i32,
            )?;
        }
        Ok(())
    }

    /// Change the scrambling algorithm. Installed keys are discarded.
    pub fn set_mode(&mut self, mode: ScramblingMode) -> Result<(), CipherError> {
        self.mode = mode;
        self.rebuild_slots()
    }

    pub fn mode(&self) -> ScramblingMode {
        self.mode
    }

    /// Fixed IV for the AES-CBC and AES-CTR modes, all zeroes by default.
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        bail!(iv.len() != AES_BLOCK_SIZE, CipherError::BadIvSize);
        self.iv = iv.to_vec();
        self.rebuild_slots()
    }

    /// Size in bits of the counter part of the IV with AES-CTR. Zero
    /// selects the default, half the IV.
    pub fn set_counter_bits(&mut self, bits: usize) -> Result<(), CipherError> {
        self.ctr_counter_bits = bits;
        self.rebuild_slots()
    }

    /// DVB-CSA2 control-word entropy mode.
    pub fn set_entropy_mode(&mut self, mode: EntropyMode) -> Result<(), CipherError> {
        self.entropy_mode = mode;
        self.rebuild_slots()
    }

    /// DVB-CSA2 entropy mode; always FullCw when the current algorithm is
    /// not DVB-CSA2.
    pub fn entropy_mode(&self) -> EntropyMode {
        if self.mode == ScramblingMode::DvbCsa2 {
            self.entropy_mode
        } else {
            EntropyMode::FullCw
        }
    }

    /// Scrambling algorithm name.
    pub fn algo_name(&self) -> String {
        self.slots[0].name()
    }

    /// Required control-word size in bytes.
    pub fn cw_size(&self) -> usize {
        self.slots[0].min_key_size()
    }

    /// Install a single fixed control word used for all packets.
    pub fn set_fixed_cw(&mut self, cw: &[u8]) -> Result<(), CipherError> {
        self.set_cw_list(&[cw.to_vec()])
    }

    /// Install an ordered list of control words, used in sequence at each
    /// parity or scrambling-control transition.
    pub fn set_cw_list(&mut self, list: &[Vec<u8>]) -> Result<(), CipherError> {
        for cw in list {
            bail!(cw.len() != self.cw_size(), CipherError::BadKeySize);
        }
        self.cw_list = list.to_vec();
        self.next_cw = None;
        Ok(())
    }

    /// Load a control-word list from a text file: one hex-encoded CW per
    /// non-empty line, surrounding whitespace ignored.
    pub fn load_cw_file(&mut self, path: &Path) -> Result<(), CipherError> {
        let text = std::fs::read_to_string(path)?;
        let mut list = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            list.push(hex::decode(line)?);
        }
        self.set_cw_list(&list)?;
        debug!("loaded {} control words", self.cw_list.len());
        Ok(())
    }

    /// Check if fixed control words were configured.
    pub fn has_fixed_cw(&self) -> bool {
        !self.cw_list.is_empty()
    }

    /// Number of configured fixed control words.
    pub fn fixed_cw_count(&self) -> usize {
        self.cw_list.len()
    }

    /// File recording every control word the first time it is used.
    pub fn set_output_cw_file(&mut self, path: Option<PathBuf>) {
        self.out_cw_file = path;
    }

    /// Restart the fixed control-word list from the beginning.
    pub fn rewind_fixed_cw(&mut self) {
        self.next_cw = None;
        self.encrypt_scv = SC_CLEAR;
        self.decrypt_scv = SC_CLEAR;
    }

    /// Start a scrambling session: rewind the CW list and create the
    /// output CW file when one is configured.
    pub fn start(&mut self) -> Result<(), CipherError> {
        self.rewind_fixed_cw();
        self.logger.borrow_mut().file = match &self.out_cw_file {
            Some(path) => Some(File::create(path)?),
            None => None,
        };
        Ok(())
    }

    /// Stop the scrambling session and close the output CW file.
    pub fn stop(&mut self) {
        self.logger.borrow_mut().file = None;
    }

    /// Install a control word into the slot of the given parity.
    pub fn set_cw(&mut self, cw: &[u8], parity: u8) -> Result<(), CipherError> {
        let slot = &mut self.slots[usize::from(parity & 1)];
        match slot.set_key(cw) {
            Ok(()) => {
                debug!("using scrambling key {}", hex::encode(cw));
                Ok(())
            }
            Err(err) => {
                error!("error setting {}-byte key to {}", cw.len(), slot.name());
                Err(err)
            }
        }
    }

    // Advance to the next fixed control word, wrapping at the end of the
    // list, and install it into the slot of the given parity.
    fn set_next_fixed_cw(&mut self, parity: u8) -> Result<(), CipherError> {
        bail!(self.cw_list.is_empty(), CipherError::KeyNotSet);
        let index = match self.next_cw {
            Some(current) => (current + 1) % self.cw_list.len(),
            None => 0,
        };
        self.next_cw = Some(index);
        let cw = self.cw_list[index].clone();
        self.set_cw(&cw, parity)
    }

    /// Select the parity of all subsequent encryptions. With fixed control
    /// words, a parity change installs the next CW of the list.
    pub fn set_encrypt_parity(&mut self, parity: u8) -> Result<(), CipherError> {
        let previous = self.encrypt_scv;
        self.encrypt_scv = SC_EVEN_KEY | (parity & 1);
        if self.has_fixed_cw() && self.encrypt_scv != previous {
            self.set_next_fixed_cw(self.encrypt_scv)?;
        }
        Ok(())
    }

    /// Encrypt a TS packet with the current parity and corresponding CW.
    /// An already scrambled packet is an error.
    pub fn encrypt_packet(&mut self, pkt: &mut TsPacket) -> Result<(), CipherError> {
        if pkt.is_scrambled() {
            error!("try to scramble an already scrambled packet");
            return Err(CipherError::AlreadyScrambled);
        }

        // Silently pass packets without payload.
        if pkt.payload_size() == 0 {
            return Ok(());
        }

        // If no parity was selected yet, start with the even key.
        if self.encrypt_scv == SC_CLEAR {
            self.set_encrypt_parity(SC_EVEN_KEY)?;
        }

        let scv = self.encrypt_scv;
        let algo = &mut self.slots[usize::from(scv & 1)];

        // When the algorithm cannot process a residue, it is left clear.
        let mut psize = pkt.payload_size();
        if !algo.residue_allowed() {
            psize -= psize % algo.block_size();
        }

        // A payload shorter than the minimum message stays clear, but the
        // packet is still marked as scrambled.
        if psize >= algo.min_message_size() && psize > 0 {
            if let Err(err) = algo.encrypt_in_place(&mut pkt.payload_mut()[..psize]) {
                error!("packet encryption error using {}", algo.name());
                return Err(err);
            }
        }
        pkt.set_scrambling(scv);
        Ok(())
    }

    /// Decrypt a TS packet with the CW corresponding to the parity in its
    /// header. A clear packet is not an error.
    pub fn decrypt_packet(&mut self, pkt: &mut TsPacket) -> Result<(), CipherError> {
        // Clear or invalid packets are silently accepted.
        let scv = pkt.scrambling();
        if scv != SC_EVEN_KEY && scv != SC_ODD_KEY {
            return Ok(());
        }

        // With fixed control words, a transition of the observed
        // scrambling control installs the next CW of the list.
        let previous = self.decrypt_scv;
        self.decrypt_scv = scv;
        if self.has_fixed_cw() && previous != scv {
            self.set_next_fixed_cw(scv)?;
        }

        let algo = &mut self.slots[usize::from(scv & 1)];

        let mut psize = pkt.payload_size();
        if !algo.residue_allowed() {
            psize -= psize % algo.block_size();
        }

        if psize >= algo.min_message_size() && psize > 0 {
            if let Err(err) = algo.decrypt_in_place(&mut pkt.payload_mut()[..psize]) {
                error!("packet decryption error using {}", algo.name());
                return Err(err);
            }
        }
        pkt.set_scrambling(SC_CLEAR);
        Ok(())
    }
}

fn build_slot(
    mode: ScramblingMode,
    iv: &[u8],
    ctr_counter_bits: usize,
    entropy_mode: EntropyMode,
    logger: &Rc<RefCell<CwLogger>>,
    id: i32,
) -> Result<Box<dyn BlockCipher>, CipherError> {
    let mut slot: Box<dyn BlockCipher> = match mode {
        ScramblingMode::DvbCsa2 => Box::new(DvbCsa2::new(entropy_mode)),
        ScramblingMode::DvbCissa => Box::new(DvbCissa::new()),
        ScramblingMode::AtisIdsa => Box::new(AtisIdsa::new()),
        ScramblingMode::AesCbc => {
            let mut cbc = Cbc::<Aes128>::new();
            cbc.set_iv(iv)?;
            Box::new(cbc)
        }
        ScramblingMode::AesCtr => {
            let mut ctr = Ctr::<Aes128>::new();
            ctr.set_counter_bits(ctr_counter_bits);
            ctr.set_iv(iv)?;
            Box::new(ctr)
        }
    };
    slot.set_alert_handler(Some(logger.clone() as SharedAlert));
    slot.set_cipher_id(id);
    Ok(slot)
}
