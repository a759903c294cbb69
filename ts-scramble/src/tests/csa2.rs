//! DVB-CSA2 behavior: entropy reduction, residue handling, short-message
//! passthrough.

use crate::{BlockCipher, CipherError, DvbCsa2, EntropyMode};

fn pattern(len: usize, mul: u8, add: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(mul).wrapping_add(add)).collect()
}

const CW: [u8; 8] = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];

#[test]
fn entropy_reduction_is_idempotent() {
    let mut cw = CW;
    DvbCsa2::reduce_cw(&mut cw);
    assert!(DvbCsa2::is_reduced_cw(&cw));
    assert_eq!(cw[3], cw[0].wrapping_add(cw[1]).wrapping_add(cw[2]));
    assert_eq!(cw[7], cw[4].wrapping_add(cw[5]).wrapping_add(cw[6]));

    let again = {
        let mut c = cw;
        DvbCsa2::reduce_cw(&mut c);
        c
    };
    assert_eq!(cw, again);
    assert!(!DvbCsa2::is_reduced_cw(&CW));
}

#[test]
fn round_trips_across_sizes() -> Result<(), CipherError> {
    for mode in [EntropyMode::ReduceEntropy, EntropyMode::FullCw] {
        for size in [8, 16, 100, 183, 184] {
            let mut csa = DvbCsa2::new(mode);
            csa.set_key(&CW)?;

            let plain = pattern(size, 7, 13);
            let mut data = plain.clone();
            csa.encrypt_in_place(&mut data)?;
            assert_ne!(data, plain, "no scrambling on {size} bytes");
            csa.decrypt_in_place(&mut data)?;
            assert_eq!(data, plain, "round trip failed on {size} bytes");
        }
    }
    Ok(())
}

#[test]
fn short_messages_stay_clear() -> Result<(), CipherError> {
    let mut csa = DvbCsa2::new(EntropyMode::ReduceEntropy);
    csa.set_key(&CW)?;

    let plain = pattern(7, 7, 13);
    let mut data = plain.clone();
    csa.encrypt_in_place(&mut data)?;
    assert_eq!(data, plain);
    csa.decrypt_in_place(&mut data)?;
    assert_eq!(data, plain);
    Ok(())
}

#[test]
fn oversized_messages_are_rejected() -> Result<(), CipherError> {
    let mut csa = DvbCsa2::new(EntropyMode::ReduceEntropy);
    csa.set_key(&CW)?;

    // 23 whole blocks plus residue is the ceiling.
    let mut data = vec![0u8; 191];
    csa.encrypt_in_place(&mut data)?;

    let mut data = vec![0u8; 192];
    assert_eq!(csa.encrypt_in_place(&mut data), Err(CipherError::BadMessageSize));
    Ok(())
}

#[test]
fn scrambling_is_deterministic_across_instances() -> Result<(), CipherError> {
    let plain = pattern(184, 7, 13);

    let mut a = DvbCsa2::new(EntropyMode::ReduceEntropy);
    a.set_key(&CW)?;
    let mut x = plain.clone();
    a.encrypt_in_place(&mut x)?;

    let mut b = DvbCsa2::new(EntropyMode::ReduceEntropy);
    b.set_key(&CW)?;
    let mut y = plain.clone();
    b.encrypt_in_place(&mut y)?;

    assert_eq!(x, y);
    Ok(())
}

#[test]
fn reduced_cw_equals_full_cw_of_the_reduction() -> Result<(), CipherError> {
    let plain = pattern(64, 7, 13);

    // Scheduling an unreduced CW in REDUCE_ENTROPY mode is the same as
    // scheduling its reduction in FULL_CW mode.
    let mut reduced = DvbCsa2::new(EntropyMode::ReduceEntropy);
    reduced.set_key(&CW)?;
    let mut x = plain.clone();
    reduced.encrypt_in_place(&mut x)?;

    let mut cw = CW;
    DvbCsa2::reduce_cw(&mut cw);
    let mut full = DvbCsa2::new(EntropyMode::FullCw);
    full.set_key(&cw)?;
    let mut y = plain.clone();
    full.encrypt_in_place(&mut y)?;

    assert_eq!(x, y);

    // With the unreduced CW, FULL_CW mode scrambles differently.
    let mut other = DvbCsa2::new(EntropyMode::FullCw);
    other.set_key(&CW)?;
    let mut z = plain.clone();
    other.encrypt_in_place(&mut z)?;
    assert_ne!(x, z);
    Ok(())
}

#[test]
fn key_size_is_fixed() -> Result<(), CipherError> {
    let mut csa = DvbCsa2::new(EntropyMode::ReduceEntropy);
    assert_eq!(csa.name(), "DVB-CSA2");
    assert_eq!(csa.block_size(), 8);
    assert_eq!(csa.set_key(&[0; 16]), Err(CipherError::BadKeySize));
    csa.set_key(&CW)?;
    Ok(())
}
