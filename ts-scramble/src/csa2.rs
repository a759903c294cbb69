//! DVB-CSA2 (Digital Video Broadcasting Common Scrambling Algorithm).
//!
//! A composite of a bespoke block cipher and a bespoke stream cipher, not
//! reducible to a chaining mode over a base algorithm. The S-boxes and the
//! key permutation table are fixed by the algorithm and not derivable from
//! first principles.

use crate::{
    CipherError, bail,
    cipher::{BlockCipher, CipherCore},
    props::BlockCipherProperties,
};

const KEY_SIZE: usize = 8;
const BLOCK_SIZE: usize = 8;

// Messages are MPEG-2 TS packet payloads, 184 bytes at most. PES-level
// scrambling splits the PES payload into super-blocks of 184 bytes, so
// longer messages never occur.
const MAX_NBLOCKS: usize = 184 / 8;

/// Control word entropy handling.
///
/// Entropy reduction makes two bytes of the 8-byte control word derivable
/// from the others, reducing the effective entropy from 64 to 48 bits. A
/// regulatory constraint, not a security feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntropyMode {
    /// Use the full 64-bit control word.
    FullCw,
    /// Reduce the control word to 48 bits of entropy before scheduling.
    #[default]
    ReduceEntropy,
}

// Stream cipher S-boxes: 7 boxes, 5 input bits, 2 output bits.

const STREAM_SBOX1: [u8; 32] = [
    2, 0, 1, 1, 2, 3, 3, 0, 3, 2, 2, 0, 1, 1, 0, 3, 0, 3, 3, 0, 2, 2, 1, 1, 2, 2, 0, 3, 1, 1, 3, 0,
];

const STREAM_SBOX2: [u8; 32] = [
    3, 1, 0, 2, 2, 3, 3, 0, 1, 3, 2, 1, 0, 0, 1, 2, 3, 1, 0, 3, 3, 2, 0, 2, 0, 0, 1, 2, 2, 1, 3, 1,
];

const STREAM_SBOX3: [u8; 32] = [
    2, 0, 1, 2, 2, 3, 3, 1, 1, 1, 0, 3, 3, 0, 2, 0, 1, 3, 0, 1, 3, 0, 2, 2, 2, 0, 1, 2, 0, 3, 3, 1,
];

const STREAM_SBOX4: [u8; 32] = [
    3, 1, 2, 3, 0, 2, 1, 2, 1, 2, 0, 1, 3, 0, 0, 3, 1, 0, 3, 1, 2, 3, 0, 3, 0, 3, 2, 0, 1, 2, 2, 1,
];

const STREAM_SBOX5: [u8; 32] = [
    2, 0, 0, 1, 3, 2, 3, 2, 0, 1, 3, 3, 1, 0, 2, 1, 2, 3, 2, 0, 0, 3, 1, 1, 1, 0, 3, 2, 3, 1, 0, 2,
];

const STREAM_SBOX6: [u8; 32] = [
    0, 1, 2, 3, 1, 2, 2, 0, 0, 1, 3, 0, 2, 3, 1, 3, 2, 3, 0, 2, 3, 0, 1, 1, 2, 1, 1, 2, 0, 3, 3, 0,
];

const STREAM_SBOX7: [u8; 32] = [
    0, 3, 2, 2, 3, 0, 0, 1, 3, 0, 1, 3, 1, 2, 2, 1, 1, 0, 3, 3, 0, 1, 1, 2, 2, 3, 1, 0, 2, 3, 0, 2,
];

// Block cipher key permutation.

const KEY_PERM: [u8; 64] = [
    0x12, 0x24, 0x09, 0x07, 0x2A, 0x31, 0x1D, 0x15, 0x1C, 0x36, 0x3E, 0x32, 0x13, 0x21, 0x3B, 0x40,
    0x18, 0x14, 0x25, 0x27, 0x02, 0x35, 0x1B, 0x01, 0x22, 0x04, 0x0D, 0x0E, 0x39, 0x28, 0x1A, 0x29,
    0x33, 0x23, 0x34, 0x0C, 0x16, 0x30, 0x1E, 0x3A, 0x2D, 0x1F, 0x08, 0x19, 0x17, 0x2F, 0x3D, 0x11,
    0x3C, 0x05, 0x38, 0x2B, 0x0B, 0x06, 0x0A, 0x2C, 0x20, 0x3F, 0x2E, 0x0F, 0x03, 0x26, 0x10, 0x37,
];

// Block cipher S-box.

const BLOCK_SBOX: [u8; 256] = [
    0x3A, 0xEA, 0x68, 0xFE, 0x33, 0xE9, 0x88, 0x1A, 0x83, 0xCF, 0xE1, 0x7F, 0xBA, 0xE2, 0x38, 0x12,
    0xE8, 0x27, 0x61, 0x95, 0x0C, 0x36, 0xE5, 0x70, 0xA2, 0x06, 0x82, 0x7C, 0x17, 0xA3, 0x26, 0x49,
    0xBE, 0x7A, 0x6D, 0x47, 0xC1, 0x51, 0x8F, 0xF3, 0xCC, 0x5B, 0x67, 0xBD, 0xCD, 0x18, 0x08, 0xC9,
    0xFF, 0x69, 0xEF, 0x03, 0x4E, 0x48, 0x4A, 0x84, 0x3F, 0xB4, 0x10, 0x04, 0xDC, 0xF5, 0x5C, 0xC6,
    0x16, 0xAB, 0xAC, 0x4C, 0xF1, 0x6A, 0x2F, 0x3C, 0x3B, 0xD4, 0xD5, 0x94, 0xD0, 0xC4, 0x63, 0x62,
    0x71, 0xA1, 0xF9, 0x4F, 0x2E, 0xAA, 0xC5, 0x56, 0xE3, 0x39, 0x93, 0xCE, 0x65, 0x64, 0xE4, 0x58,
    0x6C, 0x19, 0x42, 0x79, 0xDD, 0xEE, 0x96, 0xF6, 0x8A, 0xEC, 0x1E, 0x85, 0x53, 0x45, 0xDE, 0xBB,
    0x7E, 0x0A, 0x9A, 0x13, 0x2A, 0x9D, 0xC2, 0x5E, 0x5A, 0x1F, 0x32, 0x35, 0x9C, 0xA8, 0x73, 0x30,
    0x29, 0x3D, 0xE7, 0x92, 0x87, 0x1B, 0x2B, 0x4B, 0xA5, 0x57, 0x97, 0x40, 0x15, 0xE6, 0xBC, 0x0E,
    0xEB, 0xC3, 0x34, 0x2D, 0xB8, 0x44, 0x25, 0xA4, 0x1C, 0xC7, 0x23, 0xED, 0x90, 0x6E, 0x50, 0x00,
    0x99, 0x9E, 0x4D, 0xD9, 0xDA, 0x8D, 0x6F, 0x5F, 0x3E, 0xD7, 0x21, 0x74, 0x86, 0xDF, 0x6B, 0x05,
    0x8E, 0x5D, 0x37, 0x11, 0xD2, 0x28, 0x75, 0xD6, 0xA7, 0x77, 0x24, 0xBF, 0xF0, 0xB0, 0x02, 0xB7,
    0xF8, 0xFC, 0x81, 0x09, 0xB1, 0x01, 0x76, 0x91, 0x7D, 0x0F, 0xC8, 0xA0, 0xF2, 0xCB, 0x78, 0x60,
    0xD1, 0xF7, 0xE0, 0xB5, 0x98, 0x22, 0xB3, 0x20, 0x1D, 0xA6, 0xDB, 0x7B, 0x59, 0x9F, 0xAE, 0x31,
    0xFB, 0xD3, 0xB6, 0xCA, 0x43, 0x72, 0x07, 0xF4, 0xD8, 0x41, 0x14, 0x55, 0x0D, 0x54, 0x8B, 0xB9,
    0xAD, 0x46, 0x0B, 0xAF, 0x80, 0x52, 0x2C, 0xFA, 0x8C, 0x89, 0x66, 0xFD, 0xB2, 0xA9, 0x9B, 0xC0,
];

// Block cipher bit permutation, tabulated per byte.

const BLOCK_PERM: [u8; 256] = [
    0x00, 0x02, 0x80, 0x82, 0x20, 0x22, 0xA0, 0xA2, 0x10, 0x12, 0x90, 0x92, 0x30, 0x32, 0xB0, 0xB2,
    0x04, 0x06, 0x84, 0x86, 0x24, 0x26, 0xA4, 0xA6, 0x14, 0x16, 0x94, 0x96, 0x34, 0x36, 0xB4, 0xB6,
    0x40, 0x42, 0xC0, 0xC2, 0x60, 0x62, 0xE0, 0xE2, 0x50, 0x52, 0xD0, 0xD2, 0x70, 0x72, 0xF0, 0xF2,
    0x44, 0x46, 0xC4, 0xC6, 0x64, 0x66, 0xE4, 0xE6, 0x54, 0x56, 0xD4, 0xD6, 0x74, 0x76, 0xF4, 0xF6,
    0x01, 0x03, 0x81, 0x83, 0x21, 0x23, 0xA1, 0xA3, 0x11, 0x13, 0x91, 0x93, 0x31, 0x33, 0xB1, 0xB3,
    0x05, 0x07, 0x85, 0x87, 0x25, 0x27, 0xA5, 0xA7, 0x15, 0x17, 0x95, 0x97, 0x35, 0x37, 0xB5, 0xB7,
    0x41, 0x43, 0xC1, 0xC3, 0x61, 0x63, 0xE1, 0xE3, 0x51, 0x53, 0xD1, 0xD3, 0x71, 0x73, 0xF1, 0xF3,
    0x45, 0x47, 0xC5, 0xC7, 0x65, 0x67, 0xE5, 0xE7, 0x55, 0x57, 0xD5, 0xD7, 0x75, 0x77, 0xF5, 0xF7,
    0x08, 0x0A, 0x88, 0x8A, 0x28, 0x2A, 0xA8, 0xAA, 0x18, 0x1A, 0x98, 0x9A, 0x38, 0x3A, 0xB8, 0xBA,
    0x0C, 0x0E, 0x8C, 0x8E, 0x2C, 0x2E, 0xAC, 0xAE, 0x1C, 0x1E, 0x9C, 0x9E, 0x3C, 0x3E, 0xBC, 0xBE,
    0x48, 0x4A, 0xC8, 0xCA, 0x68, 0x6A, 0xE8, 0xEA, 0x58, 0x5A, 0xD8, 0xDA, 0x78, 0x7A, 0xF8, 0xFA,
    0x4C, 0x4E, 0xCC, 0xCE, 0x6C, 0x6E, 0xEC, 0xEE, 0x5C, 0x5E, 0xDC, 0xDE, 0x7C, 0x7E, 0xFC, 0xFE,
    0x09, 0x0B, 0x89, 0x8B, 0x29, 0x2B, 0xA9, 0xAB, 0x19, 0x1B, 0x99, 0x9B, 0x39, 0x3B, 0xB9, 0xBB,
    0x0D, 0x0F, 0x8D, 0x8F, 0x2D, 0x2F, 0xAD, 0xAF, 0x1D, 0x1F, 0x9D, 0x9F, 0x3D, 0x3F, 0xBD, 0xBF,
    0x49, 0x4B, 0xC9, 0xCB, 0x69, 0x6B, 0xE9, 0xEB, 0x59, 0x5B, 0xD9, 0xDB, 0x79, 0x7B, 0xF9, 0xFB,
    0x4D, 0x4F, 0xCD, 0xCF, 0x6D, 0x6F, 0xED, 0xEF, 0x5D, 0x5F, 0xDD, 0xDF, 0x7D, 0x7F, 0xFD, 0xFF,
];

// Stream cipher state: 107 bits in nibble and bit registers.
// A[1..10] and B[1..10] are nibbles, index 0 unused.
#[derive(Clone, Copy, Default)]
struct StreamCipher {
    a: [u8; 11],
    b: [u8; 11],
    x: u8,
    y: u8,
    z: u8,
    d: u8,
    e: u8,
    f: u8,
    p: u8,
    q: u8,
    r: u8,
}

impl StreamCipher {
    // Load the first 32 bits of the key into A[1..8], the last 32 bits
    // into B[1..8], everything else zero.
    fn init(&mut self, key: &[u8; 8]) {
        *self = Self::default();
        for i in 0..4 {
            self.a[1 + 2 * i] = (key[i] >> 4) & 0x0f;
            self.a[2 + 2 * i] = key[i] & 0x0f;
            self.b[1 + 2 * i] = (key[4 + i] >> 4) & 0x0f;
            self.b[2 + 2 * i] = key[4 + i] & 0x0f;
        }
    }

    // One round: 8 output bytes. With `sb` set, this is the initialization
    // pass and the input bytes are fed back unchanged.
    fn cipher(&mut self, sb: Option<&[u8; 8]>, cb: &mut [u8; 8]) {
        for i in 0..8 {
            let (in1, in2) = match sb {
                Some(s) => ((s[i] >> 4) & 0x0f, s[i] & 0x0f),
                None => (0, 0),
            };
            let mut op: u8 = 0;

            // 2 bits per iteration.
            for j in 0..4 {
                // 35 bits of A[1..10] select the inputs of 7 s-boxes,
                // 5 input bits and 2 output bits each.
                let s1 = STREAM_SBOX1[usize::from(
                    ((self.a[4] & 1) << 4)
                        | (((self.a[1] >> 2) & 1) << 3)
                        | (((self.a[6] >> 1) & 1) << 2)
                        | (((self.a[7] >> 3) & 1) << 1)
                        | (self.a[9] & 1),
                )];
                let s2 = STREAM_SBOX2[usize::from(
                    (((self.a[2] >> 1) & 1) << 4)
                        | (((self.a[3] >> 2) & 1) << 3)
                        | (((self.a[6] >> 3) & 1) << 2)
                        | ((self.a[7] & 1) << 1)
                        | ((self.a[9] >> 1) & 1),
                )];
                let s3 = STREAM_SBOX3[usize::from(
                    (((self.a[1] >> 3) & 1) << 4)
                        | ((self.a[2] & 1) << 3)
                        | (((self.a[5] >> 1) & 1) << 2)
                        | (((self.a[5] >> 3) & 1) << 1)
                        | ((self.a[6] >> 2) & 1),
                )];
                let s4 = STREAM_SBOX4[usize::from(
                    (((self.a[3] >> 3) & 1) << 4)
                        | (((self.a[1] >> 1) & 1) << 3)
                        | (((self.a[2] >> 3) & 1) << 2)
                        | (((self.a[4] >> 2) & 1) << 1)
                        | (self.a[8] & 1),
                )];
                let s5 = STREAM_SBOX5[usize::from(
                    (((self.a[5] >> 2) & 1) << 4)
                        | (((self.a[4] >> 3) & 1) << 3)
                        | ((self.a[6] & 1) << 2)
                        | (((self.a[8] >> 1) & 1) << 1)
                        | ((self.a[9] >> 2) & 1),
                )];
                let s6 = STREAM_SBOX6[usize::from(
                    (((self.a[3] >> 1) & 1) << 4)
                        | (((self.a[4] >> 1) & 1) << 3)
                        | ((self.a[5] & 1) << 2)
                        | (((self.a[7] >> 2) & 1) << 1)
                        | ((self.a[9] >> 3) & 1),
                )];
                let s7 = STREAM_SBOX7[usize::from(
                    (((self.a[2] >> 2) & 1) << 4)
                        | ((self.a[3] & 1) << 3)
                        | (((self.a[7] >> 1) & 1) << 2)
                        | (((self.a[8] >> 2) & 1) << 1)
                        | ((self.a[8] >> 3) & 1),
                )];

                // 4x4 xor producing the extra nibble for T3.
                let extra_b = (((self.b[3] & 1) << 3)
                    ^ ((self.b[6] & 2) << 2)
                    ^ ((self.b[7] & 4) << 1)
                    ^ (self.b[9] & 8))
                    | (((self.b[6] & 1) << 2)
                        ^ ((self.b[8] & 2) << 1)
                        ^ ((self.b[3] & 8) >> 1)
                        ^ (self.b[4] & 4))
                    | (((self.b[5] & 8) >> 2)
                        ^ ((self.b[8] & 4) >> 1)
                        ^ ((self.b[4] & 1) << 1)
                        ^ (self.b[5] & 2))
                    | (((self.b[9] & 4) >> 2)
                        ^ ((self.b[6] & 8) >> 3)
                        ^ ((self.b[3] & 2) >> 1)
                        ^ (self.b[8] & 1));

                // T1: in1, in2 and D enter only during initialization.
                let mut next_a1 = self.a[10] ^ self.x;
                if sb.is_some() {
                    next_a1 ^= self.d ^ if j % 2 == 1 { in2 } else { in1 };
                }

                // T2, rotated left when p is set.
                let mut next_b1 = self.b[7] ^ self.b[10] ^ self.y;
                if sb.is_some() {
                    next_b1 ^= if j % 2 == 1 { in1 } else { in2 };
                }
                if self.p != 0 {
                    next_b1 = ((next_b1 << 1) | ((next_b1 >> 3) & 1)) & 0x0f;
                }

                // T3.
                self.d = self.e ^ self.z ^ extra_b;

                // T4: sum and carry of Z + E + r.
                let next_e = self.f;
                if self.q != 0 {
                    let sum = self.z + self.e + self.r;
                    self.r = (sum >> 4) & 1;
                    self.f = sum & 0x0f;
                } else {
                    self.f = self.e;
                }
                self.e = next_e;

                for k in (2..=10).rev() {
                    self.a[k] = self.a[k - 1];
                }
                self.a[1] = next_a1;
                for k in (2..=10).rev() {
                    self.b[k] = self.b[k - 1];
                }
                self.b[1] = next_b1;

                self.x = ((s4 & 1) << 3) | ((s3 & 1) << 2) | (s2 & 2) | ((s1 & 2) >> 1);
                self.y = ((s6 & 1) << 3) | ((s5 & 1) << 2) | (s4 & 2) | ((s3 & 2) >> 1);
                self.z = ((s2 & 1) << 3) | ((s1 & 1) << 2) | (s6 & 2) | ((s5 & 2) >> 1);
                self.p = (s7 & 2) >> 1;
                self.q = s7 & 1;

                // 2 output bits from the 4 bits of D, xored 2 by 2.
                let dd = self.d ^ (self.d >> 1);
                op = (op << 2) ^ (((dd >> 1) & 2) | (dd & 1));
            }
            // The input data is returned unchanged during initialization.
            cb[i] = match sb {
                Some(s) => s[i],
                None => op,
            };
        }
    }
}

// Block cipher: 56 scheduled subkeys, kk[1..56], index 0 unused.
#[derive(Clone)]
struct CsaBlockCipher {
    kk: [u8; 57],
}

impl Default for CsaBlockCipher {
    fn default() -> Self {
        Self { kk: [0; 57] }
    }
}

impl CsaBlockCipher {
    // Derive the 56 subkeys from the control word.
    fn init(&mut self, key: &[u8; 8]) {
        let mut kb = [[0u8; 9]; 8];
        let mut newbit = [0u8; 64];

        for j in 0..8 {
            kb[7][1 + j] = key[j];
        }

        // kb[6] down to kb[0], one 64-bit permutation each.
        for i in 0..7 {
            for j in 0..8 {
                for k in 0..8 {
                    let bit = (kb[7 - i][1 + j] >> (7 - k)) & 1;
                    newbit[usize::from(KEY_PERM[j * 8 + k]) - 1] = bit;
                }
            }
            for j in 0..8 {
                kb[6 - i][1 + j] = 0;
                for k in 0..8 {
                    kb[6 - i][1 + j] |= newbit[j * 8 + k] << (7 - k);
                }
            }
        }

        // Xor the row index in to give kk.
        for i in 0..7 {
            for j in 0..8 {
                self.kk[1 + i * 8 + j] = kb[1 + i][1 + j] ^ (i as u8);
            }
        }
    }

    fn encipher(&self, bd: &[u8; 8], ib: &mut [u8; 8]) {
        let mut r = [0u8; 9];
        r[1..9].copy_from_slice(bd);

        // Loop over kk[1]..kk[56].
        for i in 1..=56 {
            let sbox_out = BLOCK_SBOX[usize::from(self.kk[i] ^ r[8])];
            let perm_out = BLOCK_PERM[usize::from(sbox_out)];
            let next_r1 = r[2];
            r[2] = r[3] ^ r[1];
            r[3] = r[4] ^ r[1];
            r[4] = r[5] ^ r[1];
            r[5] = r[6];
            r[6] = r[7] ^ perm_out;
            r[7] = r[8];
            r[8] = r[1] ^ sbox_out;
            r[1] = next_r1;
        }

        ib.copy_from_slice(&r[1..9]);
    }

    fn decipher(&self, ib: &[u8; 8], bd: &mut [u8; 8]) {
        let mut r = [0u8; 9];
        r[1..9].copy_from_slice(ib);

        // Loop over kk[56]..kk[1].
        for i in (1..=56).rev() {
            let sbox_out = BLOCK_SBOX[usize::from(self.kk[i] ^ r[7])];
            let perm_out = BLOCK_PERM[usize::from(sbox_out)];
            let next_r8 = r[7];
            r[7] = r[6] ^ perm_out;
            r[6] = r[5];
            r[5] = r[4] ^ r[8] ^ sbox_out;
            r[4] = r[3] ^ r[8] ^ sbox_out;
            r[3] = r[2] ^ r[8] ^ sbox_out;
            r[2] = r[1];
            r[1] = r[8] ^ sbox_out;
            r[8] = next_r8;
        }

        bd.copy_from_slice(&r[1..9]);
    }
}

/// DVB-CSA2 scrambling.
///
/// Key (control word) is 8 bytes, there is no IV, any residue is
/// processed, and messages shorter than 8 bytes are left clear.
pub struct DvbCsa2 {
    core: CipherCore,
    mode: EntropyMode,
    block: CsaBlockCipher,
    stream: StreamCipher,
}

impl DvbCsa2 {
    const PROPS: BlockCipherProperties = BlockCipherProperties {
        name: "DVB-CSA2",
        block_size: BLOCK_SIZE,
        min_key_size: KEY_SIZE,
        max_key_size: KEY_SIZE,
        chaining: false,
        chaining_name: "",
        residue_allowed: true,
        min_message_size: 0,
        min_iv_size: 0,
        max_iv_size: 0,
        fixed_iv: None,
        work_blocks: 0,
    };

    pub fn new(mode: EntropyMode) -> Self {
        Self {
            core: CipherCore::new(Self::PROPS),
            mode,
            block: CsaBlockCipher::default(),
            stream: StreamCipher::default(),
        }
    }

    /// Entropy mode applied at the next key schedule.
    pub fn set_entropy_mode(&mut self, mode: EntropyMode) {
        self.mode = mode;
    }

    pub fn entropy_mode(&self) -> EntropyMode {
        self.mode
    }

    /// Perform entropy reduction on a control word in place.
    pub fn reduce_cw(cw: &mut [u8]) {
        cw[3] = cw[0].wrapping_add(cw[1]).wrapping_add(cw[2]);
        cw[7] = cw[4].wrapping_add(cw[5]).wrapping_add(cw[6]);
    }

    /// Check if a control word is entropy-reduced.
    pub fn is_reduced_cw(cw: &[u8]) -> bool {
        cw[3] == cw[0].wrapping_add(cw[1]).wrapping_add(cw[2])
            && cw[7] == cw[4].wrapping_add(cw[5]).wrapping_add(cw[6])
    }
}

impl Default for DvbCsa2 {
    fn default() -> Self {
        Self::new(EntropyMode::default())
    }
}

fn block8(data: &[u8]) -> [u8; 8] {
    let mut b = [0u8; 8];
    b.copy_from_slice(&data[..8]);
    b
}

impl BlockCipher for DvbCsa2 {
    fn core(&self) -> &CipherCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CipherCore {
        &mut self.core
    }

    fn is_valid_message_size(&self, size: usize) -> bool {
        size / BLOCK_SIZE <= MAX_NBLOCKS
    }

    fn schedule_key(&mut self) -> Result<(), CipherError> {
        let mut cw = block8(self.core.current_key());
        if self.mode == EntropyMode::ReduceEntropy {
            Self::reduce_cw(&mut cw);
        }
        self.block.init(&cw);
        self.stream.init(&cw);
        Ok(())
    }

    fn encrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let size = data.len();
        let nblocks = size / 8;
        let rsize = size % 8;
        bail!(nblocks > MAX_NBLOCKS, CipherError::BadMessageSize);

        // Messages smaller than 8 bytes are left clear.
        if size < 8 {
            return Ok(());
        }

        // Block cipher in reverse CBC mode. The block after the last one
        // plays the role of an all-zero initialization vector.
        let mut ib = [[0u8; 8]; MAX_NBLOCKS + 1];
        for i in (0..nblocks).rev() {
            let mut iblock = [0u8; 8];
            for j in 0..8 {
                iblock[j] = data[8 * i + j] ^ ib[i + 1][j];
            }
            let mut out = [0u8; 8];
            self.block.encipher(&iblock, &mut out);
            ib[i] = out;
        }

        // The first block is scrambled by the block cipher only. Its
        // scrambled value seeds the stream cipher.
        data[..8].copy_from_slice(&ib[0]);
        let mut stream = self.stream;
        let mut ostream = [0u8; 8];
        stream.cipher(Some(&ib[0]), &mut ostream);

        // Stream cipher over the remaining blocks.
        for i in 1..nblocks {
            stream.cipher(None, &mut ostream);
            for j in 0..8 {
                data[8 * i + j] = ib[i][j] ^ ostream[j];
            }
        }

        // Cipher the residue, if any.
        if rsize > 0 {
            stream.cipher(None, &mut ostream);
            for j in 0..rsize {
                data[8 * nblocks + j] ^= ostream[j];
            }
        }

        Ok(())
    }

    fn decrypt_in_place_impl(&mut self, data: &mut [u8]) -> Result<(), CipherError> {
        let size = data.len();
        let nblocks = size / 8;
        let rsize = size % 8;
        bail!(nblocks > MAX_NBLOCKS, CipherError::BadMessageSize);

        // Messages smaller than 8 bytes are left clear.
        if size < 8 {
            return Ok(());
        }

        // The first block was scrambled by the block cipher only and seeds
        // the stream cipher.
        let mut stream = self.stream;
        let mut ib = [0u8; 8];
        let first = block8(data);
        stream.cipher(Some(&first), &mut ib);

        // Decipher all blocks except the last one.
        let mut ostream = [0u8; 8];
        let mut oblock = [0u8; 8];
        for i in 1..nblocks {
            self.block.decipher(&ib, &mut oblock);
            stream.cipher(None, &mut ostream);
            for j in 0..8 {
                ib[j] = data[8 * i + j] ^ ostream[j];
            }
            for j in 0..8 {
                data[8 * (i - 1) + j] = ib[j] ^ oblock[j];
            }
        }

        // Last block: the next input block is the all-zero IV, so the
        // deciphered value goes out unchanged.
        let mut last = [0u8; 8];
        self.block.decipher(&ib, &mut last);
        data[8 * (nblocks - 1)..8 * nblocks].copy_from_slice(&last);

        // Decipher the residue, if any.
        if rsize > 0 {
            stream.cipher(None, &mut ostream);
            for j in 0..rsize {
                data[8 * nblocks + j] ^= ostream[j];
            }
        }

        Ok(())
    }
}
