//! Published test vectors for the base algorithms and chaining modes.

use crate::{Aes128, Aes256, BlockCipher, Cbc, CipherError, Ctr, Des, Ecb, Raw, Sm4};

macro_rules! cipher_vectors {
    ($( $fn_name:ident: ($cipher:expr, $key:literal, $iv:expr, $plain:literal, $expect:literal) ),*$(,)?) => {
        $(
            #[test]
            fn $fn_name() -> Result<(), CipherError> {
                let mut cipher = $cipher;
                let key = hex::decode($key)?;
                let iv: Option<&str> = $iv;
                match iv {
                    Some(iv) => cipher.set_key_iv(&key, &hex::decode(iv)?)?,
                    None => cipher.set_key(&key)?,
                }

                let plain = hex::decode($plain)?;
                let mut out = vec![0u8; plain.len()];
                let written = cipher.encrypt(&plain, &mut out)?;
                assert_eq!(written, plain.len());
                assert_eq!(hex::encode(&out), $expect);

                // Determinism: a second encryption yields the same bytes.
                let mut again = vec![0u8; plain.len()];
                cipher.encrypt(&plain, &mut again)?;
                assert_eq!(again, out);

                let mut back = vec![0u8; out.len()];
                cipher.decrypt(&out, &mut back)?;
                assert_eq!(back, plain);

                // In-place operation produces the same bytes.
                let mut data = plain.clone();
                cipher.encrypt_in_place(&mut data)?;
                assert_eq!(hex::encode(&data), $expect);
                cipher.decrypt_in_place(&mut data)?;
                assert_eq!(data, plain);

                Ok(())
            }
        )*
    };
}

// AES vectors from NIST SP 800-38A, DES from the classical FIPS 46
// walkthrough, SM4 from GB/T 32907 appendix A.
cipher_vectors! {
    aes128_single_block: (
        Raw::<Aes128>::new(),
        "2b7e151628aed2a6abf7158809cf4f3c",
        None,
        "6bc1bee22e409f96e93d7e117393172a",
        "3ad77bb40d7a3660a89ecaf32466ef97"
    ),
    aes128_ecb_two_blocks: (
        Ecb::<Aes128>::new(),
        "2b7e151628aed2a6abf7158809cf4f3c",
        None,
        "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51",
        "3ad77bb40d7a3660a89ecaf32466ef97f5d3d58503b9699de785895a96fdbaaf"
    ),
    aes128_cbc_two_blocks: (
        Cbc::<Aes128>::new(),
        "2b7e151628aed2a6abf7158809cf4f3c",
        Some("000102030405060708090a0b0c0d0e0f"),
        "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51",
        "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2"
    ),
    aes128_ctr_with_residue: (
        Ctr::<Aes128>::new(),
        "2b7e151628aed2a6abf7158809cf4f3c",
        Some("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff"),
        "6bc1bee22e409f96e93d7e117393172aae2d8a57",
        "874d6191b620e3261bef6864990db6ce9806f66b"
    ),
    aes256_single_block: (
        Raw::<Aes256>::new(),
        "603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4",
        None,
        "6bc1bee22e409f96e93d7e117393172a",
        "f3eed1bdb5d2a03c064b5a7e3db181f8"
    ),
    des_single_block: (
        Raw::<Des>::new(),
        "133457799bbcdff1",
        None,
        "0123456789abcdef",
        "85e813540f0ab405"
    ),
    sm4_single_block: (
        Raw::<Sm4>::new(),
        "0123456789abcdeffedcba9876543210",
        None,
        "0123456789abcdeffedcba9876543210",
        "681edf34d206965e86b3e94f536e4246"
    ),
}
