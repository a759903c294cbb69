/// Immutable description of a block-cipher algorithm, shared by every
/// instance of the same (algorithm, chaining mode) pair.
///
/// Properties are plain constants attached to cipher types and never change
/// for the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct BlockCipherProperties {
    /// Base algorithm name, e.g. `"AES-128"`.
    pub name: &'static str,
    /// Size in bytes of one cipher block.
    pub block_size: usize,
    /// Minimum key size in bytes.
    pub min_key_size: usize,
    /// Maximum key size in bytes.
    pub max_key_size: usize,
    /// True when the object layers a chaining mode over a base algorithm.
    pub chaining: bool,
    /// Suffix appended to the base name, e.g. `"CBC"`.
    pub chaining_name: &'static str,
    /// True when trailing bytes shorter than a block can be processed.
    pub residue_allowed: bool,
    /// Smallest message the mode accepts.
    pub min_message_size: usize,
    /// Minimum initialization vector size in bytes.
    pub min_iv_size: usize,
    /// Maximum initialization vector size in bytes.
    pub max_iv_size: usize,
    /// Constant IV mandated by the algorithm. When set, the IV is not
    /// user-settable.
    pub fixed_iv: Option<&'static [u8]>,
    /// Number of scratch blocks the mode requires.
    pub work_blocks: usize,
}

impl BlockCipherProperties {
    /// Properties of a base algorithm with a single valid key size and no
    /// chaining mode.
    pub const fn base(name: &'static str, block_size: usize, key_size: usize) -> Self {
        Self {
            name,
            block_size,
            min_key_size: key_size,
            max_key_size: key_size,
            chaining: false,
            chaining_name: "",
            residue_allowed: false,
            min_message_size: block_size,
            min_iv_size: 0,
            max_iv_size: 0,
            fixed_iv: None,
            work_blocks: 0,
        }
    }

    /// Properties of a chaining mode layered over a base algorithm.
    pub const fn chained(
        base: Self,
        chaining_name: &'static str,
        residue_allowed: bool,
        min_message_size: usize,
        work_blocks: usize,
        iv_size: usize,
    ) -> Self {
        Self {
            name: base.name,
            block_size: base.block_size,
            min_key_size: base.min_key_size,
            max_key_size: base.max_key_size,
            chaining: true,
            chaining_name,
            residue_allowed,
            min_message_size,
            min_iv_size: iv_size,
            max_iv_size: iv_size,
            fixed_iv: None,
            work_blocks,
        }
    }

    /// Properties of a standard built from an existing combination, with its
    /// own display name and, possibly, a constant standard-mandated IV.
    pub const fn named(base: Self, name: &'static str, fixed_iv: Option<&'static [u8]>) -> Self {
        Self {
            name,
            chaining_name: "",
            fixed_iv,
            ..base
        }
    }

    /// Display name including the chaining suffix, e.g. `"AES-128-CBC"`.
    pub fn display_name(&self) -> String {
        if self.chaining && !self.chaining_name.is_empty() {
            format!("{}-{}", self.name, self.chaining_name)
        } else {
            self.name.to_string()
        }
    }
}
