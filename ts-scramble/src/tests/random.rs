//! Pseudo-random generator behavior.

use std::path::PathBuf;

use crate::{
    BetterSystemRandomGenerator, CipherError, RandomGenerator, ReproducibleRandomGenerator,
    SystemRandomGenerator,
};

#[test]
fn system_generator_is_always_ready() -> Result<(), CipherError> {
    let mut prng = SystemRandomGenerator;
    assert!(prng.ready());
    prng.seed(&[1, 2, 3])?;

    let a = prng.read_vec(16)?;
    let b = prng.read_vec(16)?;
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn reproducible_generator_needs_a_full_seed() -> Result<(), CipherError> {
    let mut prng = ReproducibleRandomGenerator::new();
    assert!(!prng.ready());

    let mut buf = [0u8; 4];
    assert_eq!(prng.read(&mut buf), Err(CipherError::SeedInsufficient));

    prng.seed(&[7; 63])?;
    assert!(!prng.ready());
    prng.seed(&[7; 1])?;
    assert!(prng.ready());
    prng.read(&mut buf)?;
    Ok(())
}

#[test]
fn identical_seeds_give_identical_streams() -> Result<(), CipherError> {
    let seed: Vec<u8> = (0..64u8).collect();

    // One seed call on one side, split calls on the other.
    let mut a = ReproducibleRandomGenerator::new();
    a.seed(&seed)?;
    let mut b = ReproducibleRandomGenerator::new();
    b.seed(&seed[..32])?;
    b.seed(&seed[32..])?;

    // Different read granularities deliver the same stream.
    let stream_a = a.read_vec(100)?;
    let mut stream_b = Vec::new();
    for chunk in [10, 1, 5, 16, 32, 36] {
        stream_b.extend(b.read_vec(chunk)?);
    }
    assert_eq!(stream_a, stream_b);

    // And the streams keep agreeing afterwards.
    assert_eq!(a.read_vec(40)?, b.read_vec(40)?);
    Ok(())
}

#[test]
fn reseed_diverges_from_the_unseeded_stream() -> Result<(), CipherError> {
    let seed: Vec<u8> = (0..64u8).collect();

    let mut a = ReproducibleRandomGenerator::new();
    a.seed(&seed)?;
    let mut b = ReproducibleRandomGenerator::new();
    b.seed(&seed)?;

    // Same history, then one side re-seeds.
    assert_eq!(a.read_vec(16)?, b.read_vec(16)?);
    a.seed(b"extra entropy")?;
    assert_ne!(a.read_vec(16)?, b.read_vec(16)?);

    // A re-seed with the same history is reproducible.
    let mut c = ReproducibleRandomGenerator::new();
    c.seed(&seed)?;
    c.read_vec(16)?;
    c.seed(b"extra entropy")?;
    let mut a2 = ReproducibleRandomGenerator::new();
    a2.seed(&seed)?;
    a2.read_vec(16)?;
    a2.seed(b"extra entropy")?;
    assert_eq!(c.read_vec(48)?, a2.read_vec(48)?);
    Ok(())
}

#[test]
fn reset_returns_to_the_unseeded_state() -> Result<(), CipherError> {
    let mut prng = ReproducibleRandomGenerator::new();
    prng.seed(&[9; 64])?;
    assert!(prng.ready());
    prng.reset();
    assert!(!prng.ready());

    let mut buf = [0u8; 4];
    assert_eq!(prng.read(&mut buf), Err(CipherError::SeedInsufficient));
    Ok(())
}

fn temp_state_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(".tsseed-test-{tag}-{}", std::process::id()))
}

#[test]
fn better_generator_persists_its_state() -> Result<(), CipherError> {
    let path = temp_state_file("persist");
    let _ = std::fs::remove_file(&path);

    let prng = BetterSystemRandomGenerator::with_state_file(path.clone());
    let mut a = [0u8; 40];
    prng.read(&mut a)?;

    // 16 raw octets, no header.
    let state = std::fs::read(&path)?;
    assert_eq!(state.len(), 16);

    let mut b = [0u8; 40];
    prng.read(&mut b)?;
    assert_ne!(a, b);

    // The state file keeps evolving.
    assert_ne!(std::fs::read(&path)?, state);

    std::fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn better_generator_singleton_reads_through_the_trait() -> Result<(), CipherError> {
    let mut prng = BetterSystemRandomGenerator::instance();
    assert!(RandomGenerator::ready(&prng));
    let a = prng.read_vec(16)?;
    let b = prng.read_vec(16)?;
    assert_ne!(a, b);
    Ok(())
}
