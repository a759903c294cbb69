use crate::{
    CipherError,
    cipher::{BlockCipher, CipherCore},
    primitive::Primitive,
    props::BlockCipherProperties,
};

/// Counter (CTR) mode.
///
/// CTR can process a residue: the plain text and cipher text can have any
/// size. The IV is split into a fixed nonce part and a counter part; the
/// counter occupies the least significant bits of the IV seen as a
/// big-endian integer.
pub struct Ctr<P: Primitive> {
    core: CipherCore,
    algo: P,
    counter_bits: usize,
}

impl<P: Primitive> Ctr<P> {
    /// Properties of CTR over `P`. Two scratch blocks: the counter and the
    /// encrypted counter.
    pub const PROPS: BlockCipherProperties =
        BlockCipherProperties::chained(P::PROPS, "CTR", true, 0, 2, P::PROPS.block_size);

    pub fn new() -> Self {
        let mut ctr = Self {
            core: CipherCore::new(Self::PROPS),
            algo: P::new(),
            counter_bits: 0,
        };
        ctr.set_counter_bits(0);
        ctr
    }

    /// Set the size in bits of the counter part of the IV. Zero selects the
    /// default, half the block size; larger values are clamped to the whole
    /// block.
    pub fn set_counter_bits(&mut self, bits: usize) {
        let bsize = self.core.properties().block_size;
        self.counter_bits = if bits == 0 { bsize * 4 } else { bits.min(bsize * 8) };
    }

    pub fn counter_bits(&self) -> usize {
        self.counter_bits
    }

    // With CTR, encryption and decryption are the same operation.
    fn crypt(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let bsize = self.core.properties().block_size;
        let (iv, work) = self.core.iv_and_work();
        let (counter, keystream) = work.split_at_mut(bsize);
        counter.copy_from_slice(iv);
        let mut off = 0;
        while off < data.len() {
            self.algo.encrypt_block(counter, &mut keystream[..bsize])?;
            let size = bsize.min(data.len() - off);
            for i in 0..size {
                data[off + i] ^= keystream[i];
            }
            increment_counter(counter, self.counter_bits);
            off += size;
        }
        Ok(())
    }
}

impl<P: Primitive> Default for Ctr<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Primitive> BlockCipher for Ctr<P> {
    fn core(&self) -> &CipherCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CipherCore {
        &mut self.core
    }

    fn schedule_key(&mut self) -> Result<(), CipherError> {
        self.algo.rekey(self.core.current_key())
    }

    fn encrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        self.crypt(data)
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        self.crypt(data)
    }
}

// Increment the low `bits` of the counter block, big-endian, leaving the
// nonce part untouched.
fn increment_counter(counter: &mut [u8], mut bits: usize) {
    let mut carry = true;
    for b in counter.iter_mut().rev() {
        if !carry || bits == 0 {
            break;
        }
        let nbits = bits.min(8);
        let mask = 0xffu8 >> (8 - nbits);
        let low = (*b & mask).wrapping_add(1) & mask;
        *b = (*b & !mask) | low;
        carry = low == 0;
        bits -= nbits;
    }
}

#[cfg(test)]
mod tests {
    use super::increment_counter;

    #[test]
    fn increment_within_counter_bits() {
        let mut ctr = [0x00, 0x00, 0x00, 0xff];
        increment_counter(&mut ctr, 8);
        assert_eq!(ctr, [0x00, 0x00, 0x00, 0x00]); // wraps inside 8 bits

        let mut ctr = [0x00, 0x00, 0x00, 0xff];
        increment_counter(&mut ctr, 16);
        assert_eq!(ctr, [0x00, 0x00, 0x01, 0x00]); // carry crosses one byte

        let mut ctr = [0xab, 0xff, 0xff, 0xff];
        increment_counter(&mut ctr, 24);
        assert_eq!(ctr, [0xab, 0x00, 0x00, 0x00]); // nonce byte preserved
    }

    #[test]
    fn increment_partial_byte() {
        // 4-bit counter: only the low nibble of the last byte moves.
        let mut ctr = [0x12, 0x3f];
        increment_counter(&mut ctr, 4);
        assert_eq!(ctr, [0x12, 0x30]);
    }
}
