//! Pseudo-random number generators.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use rand::RngCore;
use rand::rngs::OsRng;

use crate::{
    CipherError, bail,
    hash::{Hash, Sha256},
    primitive::{Aes128, Primitive},
};

/// Contract of all PRNG's: seed with entropy, then read random data.
pub trait RandomGenerator {
    /// Algorithm name (informational only).
    fn name(&self) -> &'static str;

    /// Add entropy to the generator.
    fn seed(&mut self, data: &[u8]) -> Result<(), CipherError>;

    /// Check if the generator is ready. If not, it must be seeded again.
    fn ready(&self) -> bool;

    /// Fill `buffer` with random data.
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), CipherError>;

    /// Get random data in a new vector.
    fn read_vec(&mut self, size: usize) -> Result<Vec<u8>, CipherError> {
        let mut data = vec![0; size];
        self.read(&mut data)?;
        Ok(data)
    }
}

/// The system entropy source, always ready. Seeding is accepted and
/// ignored, the operating system manages its own entropy.
#[derive(Default)]
pub struct SystemRandomGenerator;

impl RandomGenerator for SystemRandomGenerator {
    fn name(&self) -> &'static str {
        "SystemRandomGenerator"
    }

    fn seed(&mut self, _data: &[u8]) -> Result<(), CipherError> {
        Ok(())
    }

    fn ready(&self) -> bool {
        true
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), CipherError> {
        OsRng
            .try_fill_bytes(buffer)
            .map_err(|_| CipherError::ProviderFailure)
    }
}

const STATE_SIZE: usize = Sha256::HASH_SIZE;
const STATE1_SIZE: usize = STATE_SIZE / 2;

/// Reproducible PRNG based on the seed only.
///
/// There is no external source of entropy: the same sequence of `seed` and
/// `read` calls always returns the same pseudo-random data.
///
/// The state is 32 bytes, `state = state1 || state2`:
/// - initial step: accumulate at least [`ReproducibleRandomGenerator::MIN_SEED_SIZE`]
///   seed bytes, then `state = SHA-256(seed)`;
/// - generation: `state1 = AES-128[key=state2](state1)`, deliver bytes from
///   `state1`, and when exhausted `state = SHA-256(state)`;
/// - re-seed: `state = SHA-256(seed || state)` and rewind the generation.
pub struct ReproducibleRandomGenerator {
    ready: bool,
    init_seed_size: usize,
    sha: Sha256,
    state: [u8; STATE_SIZE],
    next: usize,
}

impl ReproducibleRandomGenerator {
    /// Minimum accumulated initial seed size (the SHA-256 block size).
    pub const MIN_SEED_SIZE: usize = 64;

    pub fn new() -> Self {
        Self {
            ready: false,
            init_seed_size: 0,
            sha: Sha256::new(),
            state: [0; STATE_SIZE],
            next: 0,
        }
    }

    /// Return to the initial state, not seeded.
    pub fn reset(&mut self) {
        self.ready = false;
        self.init_seed_size = 0;
        self.next = 0;
        self.sha.init();
    }
}

impl Default for ReproducibleRandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomGenerator for ReproducibleRandomGenerator {
    fn name(&self) -> &'static str {
        "ReproducibleRandomGenerator"
    }

    fn seed(&mut self, data: &[u8]) -> Result<(), CipherError> {
        if !self.ready {
            // Initial phase: accumulate seed data.
            self.sha.add(data);
            self.init_seed_size += data.len();
            if self.init_seed_size >= Self::MIN_SEED_SIZE {
                self.sha.get_hash(&mut self.state)?;
                self.next = STATE1_SIZE;
                self.ready = true;
            }
        } else {
            // Re-seed after the initial phase, folding the old state in.
            let state = self.state;
            self.sha.init();
            self.sha.add(data);
            self.sha.add(&state);
            self.sha.get_hash(&mut self.state)?;
            self.next = STATE1_SIZE;
        }
        Ok(())
    }

    fn ready(&self) -> bool {
        self.ready
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), CipherError> {
        bail!(!self.ready, CipherError::SeedInsufficient);

        let mut out = 0;
        while out < buffer.len() {
            // state1 = AES-128[key=state2](state1)
            if self.next >= STATE1_SIZE {
                let mut aes = Aes128::new();
                aes.rekey(&self.state[STATE1_SIZE..])?;
                aes.encrypt_block_in_place(&mut self.state[..STATE1_SIZE])?;
                self.next = 0;
            }

            let chunk = (buffer.len() - out).min(STATE1_SIZE - self.next);
            buffer[out..out + chunk].copy_from_slice(&self.state[self.next..self.next + chunk]);
            out += chunk;
            self.next += chunk;

            // When state1 is fully delivered, state = SHA-256(state).
            if self.next >= STATE1_SIZE {
                let state = self.state;
                self.sha.init();
                self.sha.add(&state);
                self.sha.get_hash(&mut self.state)?;
            }
        }
        Ok(())
    }
}

// Fixed AES-128 post-processing key, embedded in the binary.
const POST_PROCESS_KEY: [u8; 16] = [
    0xa1, 0x6f, 0x3c, 0x58, 0xc2, 0x9d, 0x07, 0xee, 0x14, 0xb0, 0x49, 0x86, 0x5b, 0x2a, 0xd3, 0x71,
];

const ENTROPY_SIZE: usize = 16;

struct BetterState {
    initialized: bool,
    state: [u8; ENTROPY_SIZE],
    aes: Aes128,
    sha: Sha256,
    pool: [u8; ENTROPY_SIZE],
    index: usize,
    state_file: PathBuf,
}

/// Improved system PRNG: the system entropy source with AES-based
/// post-processing, available as a process-wide thread-safe singleton.
///
/// A 16-byte entropy state is persisted in `$HOME/.tsseed` (16 raw octets,
/// no header). On first use the state is loaded from this file, or from
/// the system PRNG when the file does not exist.
///
/// Post-processing of each output block, with the fixed embedded AES-128
/// key `K`:
/// 1. `R1` = system PRNG
/// 2. `R2 = AES-128[K](R1)`
/// 3. `R3 = R2 xor state`
/// 4. `R4 = AES-128[K](R3)`, emitted to the output pool
/// 5. `R5` = system PRNG
/// 6. `state = SHA-256(R5 xor R4 xor state)`, truncated to 16 bytes
/// 7. the state file is rewritten
///
/// Known limitations: rewriting the state file after every 16-byte block
/// hurts throughput, and concurrent processes sharing the file race on
/// writes.
pub struct BetterSystemRandomGenerator {
    inner: Mutex<BetterState>,
}

impl BetterSystemRandomGenerator {
    /// The process-wide instance, using the default state file location.
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<BetterSystemRandomGenerator> = OnceLock::new();
        INSTANCE.get_or_init(|| Self::with_state_file(default_state_file()))
    }

    /// An independent generator persisting its state at `state_file`.
    pub fn with_state_file(state_file: PathBuf) -> Self {
        Self {
            inner: Mutex::new(BetterState {
                initialized: false,
                state: [0; ENTROPY_SIZE],
                aes: Aes128::new(),
                sha: Sha256::new(),
                pool: [0; ENTROPY_SIZE],
                index: ENTROPY_SIZE,
                state_file,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        "BetterSystemRandomGenerator"
    }

    pub fn ready(&self) -> bool {
        true
    }

    /// Fill `buffer` with post-processed random data.
    pub fn read(&self, buffer: &mut [u8]) -> Result<(), CipherError> {
        let mut inner = self.inner.lock().map_err(|_| CipherError::ProviderFailure)?;
        inner.init()?;
        let mut out = 0;
        while out < buffer.len() {
            if inner.index >= ENTROPY_SIZE {
                inner.update_pool()?;
            }
            let chunk = (buffer.len() - out).min(ENTROPY_SIZE - inner.index);
            buffer[out..out + chunk]
                .copy_from_slice(&inner.pool[inner.index..inner.index + chunk]);
            out += chunk;
            inner.index += chunk;
        }
        Ok(())
    }
}

impl RandomGenerator for &BetterSystemRandomGenerator {
    fn name(&self) -> &'static str {
        BetterSystemRandomGenerator::name(*self)
    }

    fn seed(&mut self, _data: &[u8]) -> Result<(), CipherError> {
        // The entropy state evolves with every block, external seeding is
        // accepted and ignored.
        Ok(())
    }

    fn ready(&self) -> bool {
        BetterSystemRandomGenerator::ready(*self)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), CipherError> {
        BetterSystemRandomGenerator::read(*self, buffer)
    }
}

impl BetterState {
    fn init(&mut self) -> Result<(), CipherError> {
        if self.initialized {
            return Ok(());
        }
        match fs::read(&self.state_file) {
            Ok(data) if data.len() == ENTROPY_SIZE => {
                self.state.copy_from_slice(&data);
            }
            _ => {
                // No usable state file, start from the system PRNG.
                SystemRandomGenerator.read(&mut self.state)?;
                self.write_state()?;
            }
        }
        self.aes.rekey(&POST_PROCESS_KEY)?;
        self.initialized = true;
        Ok(())
    }

    fn write_state(&self) -> Result<(), CipherError> {
        fs::write(&self.state_file, self.state).map_err(CipherError::from)
    }

    // Generate one 16-byte block into the pool and evolve the state.
    fn update_pool(&mut self) -> Result<(), CipherError> {
        let mut sys = SystemRandomGenerator;

        // R1, R2
        let mut r = [0u8; ENTROPY_SIZE];
        sys.read(&mut r)?;
        self.aes.encrypt_block_in_place(&mut r)?;
        // R3
        for i in 0..ENTROPY_SIZE {
            r[i] ^= self.state[i];
        }
        // R4, the output block.
        self.aes.encrypt_block_in_place(&mut r)?;
        self.pool = r;
        self.index = 0;

        // R5, next state.
        let mut r5 = [0u8; ENTROPY_SIZE];
        sys.read(&mut r5)?;
        for i in 0..ENTROPY_SIZE {
            r5[i] ^= r[i] ^ self.state[i];
        }
        let mut digest = [0u8; Sha256::HASH_SIZE];
        self.sha.hash(&r5, &mut digest)?;
        self.state.copy_from_slice(&digest[..ENTROPY_SIZE]);
        self.write_state()
    }
}

fn default_state_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".tsseed")
}
