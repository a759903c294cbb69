//! Hash function vectors and the incremental contract.

use crate::{CipherError, Hash, Sha1, Sha256, Sha512};

macro_rules! hash_vectors {
    ($( $fn_name:ident: ($hash:expr, $message:literal, $expect:literal) ),*$(,)?) => {
        $(
            #[test]
            fn $fn_name() -> Result<(), CipherError> {
                let mut algo = $hash;
                let mut digest = vec![0u8; algo.hash_size()];

                let written = algo.hash($message, &mut digest)?;
                assert_eq!(written, algo.hash_size());
                assert_eq!(hex::encode(&digest), $expect);

                // Incremental computation gives the same digest.
                algo.init();
                for byte in $message.iter() {
                    algo.add(std::slice::from_ref(byte));
                }
                let mut incremental = vec![0u8; algo.hash_size()];
                algo.get_hash(&mut incremental)?;
                assert_eq!(incremental, digest);
                Ok(())
            }
        )*
    };
}

hash_vectors! {
    sha1_abc: (
        Sha1::new(),
        b"abc",
        "a9993e364706816aba3e25717850c26c9cd0d89d"
    ),
    sha1_empty: (
        Sha1::new(),
        b"",
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    ),
    sha256_abc: (
        Sha256::new(),
        b"abc",
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    ),
    sha256_empty: (
        Sha256::new(),
        b"",
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    ),
    sha512_abc: (
        Sha512::new(),
        b"abc",
        "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
         2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
    ),
}

#[test]
fn names_and_sizes() {
    assert_eq!(Sha1::new().name(), "SHA-1");
    assert_eq!(Sha1::new().hash_size(), 20);
    assert_eq!(Sha256::new().name(), "SHA-256");
    assert_eq!(Sha256::new().hash_size(), 32);
    assert_eq!(Sha512::new().name(), "SHA-512");
    assert_eq!(Sha512::new().hash_size(), 64);
}

#[test]
fn short_output_buffer_is_rejected() -> Result<(), CipherError> {
    let mut sha = Sha256::new();
    sha.add(b"some data");
    let mut small = [0u8; 16];
    assert_eq!(sha.get_hash(&mut small), Err(CipherError::OutputBufferTooSmall));

    // The context survives the failed read.
    let mut full = [0u8; 32];
    sha.get_hash(&mut full)?;

    let mut reference = Sha256::new();
    let mut expected = [0u8; 32];
    reference.hash(b"some data", &mut expected)?;
    assert_eq!(full, expected);
    Ok(())
}

#[test]
fn context_resets_after_get_hash() -> Result<(), CipherError> {
    let mut sha = Sha1::new();
    let mut first = [0u8; 20];
    sha.hash(b"first message", &mut first)?;

    // No explicit init: get_hash left a fresh context.
    sha.add(b"abc");
    let mut second = [0u8; 20];
    sha.get_hash(&mut second)?;
    assert_eq!(hex::encode(second), "a9993e364706816aba3e25717850c26c9cd0d89d");
    Ok(())
}
