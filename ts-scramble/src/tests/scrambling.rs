//! End-to-end behavior of the TS scrambling controller.

use std::path::PathBuf;

use crate::{
    CipherError, EntropyMode, PKT_SIZE, SC_CLEAR, SC_EVEN_KEY, SC_ODD_KEY, ScramblingMode,
    SYNC_BYTE, TsPacket, TsScrambling,
};

fn payload_packet(seed: u8) -> TsPacket {
    let mut raw = [0u8; PKT_SIZE];
    raw[0] = SYNC_BYTE;
    raw[1] = 0x01;
    raw[2] = 0x42;
    raw[3] = 0x10; // payload, clear
    for (i, b) in raw[4..].iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(31).wrapping_add(seed);
    }
    TsPacket::from_bytes(&raw).unwrap()
}

fn cw_list(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|n| (0..size).map(|i| (i as u8).wrapping_mul(17).wrapping_add(n as u8)).collect())
        .collect()
}

// Scramble 10 packets with alternating parity and a rotating CW list,
// then descramble them with an independent controller observing the same
// transitions.
fn parity_rotation_round_trip(mode: ScramblingMode) -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(mode)?;
    let cws = cw_list(3, scrambler.cw_size());
    scrambler.set_cw_list(&cws)?;
    scrambler.start()?;

    let clear: Vec<TsPacket> = (0..10).map(|i| payload_packet(i as u8)).collect();
    let mut scrambled = clear.clone();
    for (i, pkt) in scrambled.iter_mut().enumerate() {
        scrambler.set_encrypt_parity(i as u8 & 1)?;
        scrambler.encrypt_packet(pkt)?;
        let expected = if i & 1 == 0 { SC_EVEN_KEY } else { SC_ODD_KEY };
        assert_eq!(pkt.scrambling(), expected);
        assert_ne!(pkt.payload(), clear[i].payload(), "packet {i} left clear");
    }
    scrambler.stop();

    let mut descrambler = TsScrambling::new(mode)?;
    descrambler.set_cw_list(&cws)?;
    descrambler.start()?;
    for (i, pkt) in scrambled.iter_mut().enumerate() {
        descrambler.decrypt_packet(pkt)?;
        assert_eq!(pkt.scrambling(), SC_CLEAR);
        assert_eq!(pkt.payload(), clear[i].payload(), "packet {i} not recovered");
    }
    Ok(())
}

#[test]
fn parity_rotation_dvb_csa2() -> Result<(), CipherError> {
    parity_rotation_round_trip(ScramblingMode::DvbCsa2)
}

#[test]
fn parity_rotation_dvb_cissa() -> Result<(), CipherError> {
    parity_rotation_round_trip(ScramblingMode::DvbCissa)
}

#[test]
fn parity_rotation_atis_idsa() -> Result<(), CipherError> {
    parity_rotation_round_trip(ScramblingMode::AtisIdsa)
}

#[test]
fn parity_rotation_aes_cbc() -> Result<(), CipherError> {
    parity_rotation_round_trip(ScramblingMode::AesCbc)
}

#[test]
fn parity_rotation_aes_ctr() -> Result<(), CipherError> {
    parity_rotation_round_trip(ScramblingMode::AesCtr)
}

#[test]
fn double_scrambling_is_rejected() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::DvbCsa2)?;
    scrambler.set_fixed_cw(&[7; 8])?;
    scrambler.start()?;

    let mut pkt = payload_packet(1);
    scrambler.encrypt_packet(&mut pkt)?;
    assert_eq!(
        scrambler.encrypt_packet(&mut pkt),
        Err(CipherError::AlreadyScrambled)
    );
    Ok(())
}

#[test]
fn descrambling_a_clear_packet_is_a_no_op() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::DvbCsa2)?;
    scrambler.set_fixed_cw(&[7; 8])?;
    scrambler.start()?;

    let clear = payload_packet(1);
    let mut pkt = clear;
    scrambler.decrypt_packet(&mut pkt)?;
    assert_eq!(pkt, clear);
    Ok(())
}

#[test]
fn packets_without_payload_pass_through() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::DvbCsa2)?;
    scrambler.set_fixed_cw(&[7; 8])?;
    scrambler.start()?;

    // Adaptation field only, no payload flag.
    let mut raw = [0u8; PKT_SIZE];
    raw[0] = SYNC_BYTE;
    raw[3] = 0x20;
    raw[4] = 183;
    let clear = TsPacket::from_bytes(&raw).unwrap();
    let mut pkt = clear;
    scrambler.encrypt_packet(&mut pkt)?;
    assert_eq!(pkt, clear); // not even marked scrambled
    Ok(())
}

#[test]
fn aes_cbc_leaves_the_residue_clear() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::AesCbc)?;
    scrambler.set_fixed_cw(&[7; 16])?;
    scrambler.start()?;

    let clear = payload_packet(1);
    let mut pkt = clear;
    scrambler.encrypt_packet(&mut pkt)?;

    // 184 = 11 * 16 + 8: the last 8 bytes are not scrambled.
    assert_ne!(pkt.payload()[..176], clear.payload()[..176]);
    assert_eq!(pkt.payload()[176..], clear.payload()[176..]);

    let mut descrambler = TsScrambling::new(ScramblingMode::AesCbc)?;
    descrambler.set_fixed_cw(&[7; 16])?;
    descrambler.start()?;
    descrambler.decrypt_packet(&mut pkt)?;
    assert_eq!(pkt.payload(), clear.payload());
    Ok(())
}

#[test]
fn short_payloads_stay_clear_but_are_marked() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::AesCbc)?;
    scrambler.set_fixed_cw(&[7; 16])?;
    scrambler.start()?;

    // Adaptation field leaving a 10-byte payload, shorter than one AES
    // block once the residue is trimmed.
    let mut raw = [0u8; PKT_SIZE];
    raw[0] = SYNC_BYTE;
    raw[3] = 0x30;
    raw[4] = 172;
    for (i, b) in raw[178..].iter_mut().enumerate() {
        *b = i as u8 + 1;
    }
    let clear = TsPacket::from_bytes(&raw).unwrap();
    assert_eq!(clear.payload_size(), 11);

    let mut pkt = clear;
    scrambler.encrypt_packet(&mut pkt)?;
    assert_eq!(pkt.scrambling(), SC_EVEN_KEY);
    assert_eq!(pkt.payload(), clear.payload());

    let mut descrambler = TsScrambling::new(ScramblingMode::AesCbc)?;
    descrambler.set_fixed_cw(&[7; 16])?;
    descrambler.start()?;
    descrambler.decrypt_packet(&mut pkt)?;
    assert_eq!(pkt.scrambling(), SC_CLEAR);
    assert_eq!(pkt.payload(), clear.payload());
    Ok(())
}

fn temp_cw_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ts-scramble-cw-{tag}-{}", std::process::id()))
}

#[test]
fn output_cw_file_records_first_use() -> Result<(), CipherError> {
    let out_path = temp_cw_file("out");
    let _ = std::fs::remove_file(&out_path);

    let mut scrambler = TsScrambling::new(ScramblingMode::DvbCissa)?;
    let cws = cw_list(2, scrambler.cw_size());
    scrambler.set_cw_list(&cws)?;
    scrambler.set_output_cw_file(Some(out_path.clone()));
    scrambler.start()?;

    let mut even = payload_packet(1);
    let mut odd = payload_packet(2);
    scrambler.set_encrypt_parity(0)?;
    scrambler.encrypt_packet(&mut even)?;
    scrambler.set_encrypt_parity(1)?;
    scrambler.encrypt_packet(&mut odd)?;
    scrambler.stop();

    let text = std::fs::read_to_string(&out_path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec![hex::encode(&cws[0]), hex::encode(&cws[1])]);

    // The recorded file feeds back as a CW list.
    let mut reloaded = TsScrambling::new(ScramblingMode::DvbCissa)?;
    reloaded.load_cw_file(&out_path)?;
    assert_eq!(reloaded.fixed_cw_count(), 2);

    std::fs::remove_file(&out_path)?;
    Ok(())
}

#[test]
fn cw_list_sizes_are_validated() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::DvbCsa2)?;
    assert_eq!(scrambler.cw_size(), 8);
    assert_eq!(scrambler.algo_name(), "DVB-CSA2");
    assert_eq!(
        scrambler.set_fixed_cw(&[7; 16]),
        Err(CipherError::BadKeySize)
    );
    assert!(!scrambler.has_fixed_cw());

    scrambler.set_mode(ScramblingMode::AtisIdsa)?;
    assert_eq!(scrambler.cw_size(), 16);
    assert_eq!(scrambler.algo_name(), "ATIS-IDSA");
    scrambler.set_fixed_cw(&[7; 16])?;
    Ok(())
}

#[test]
fn entropy_mode_reported_per_algorithm() -> Result<(), CipherError> {
    let mut scrambler = TsScrambling::new(ScramblingMode::DvbCsa2)?;
    assert_eq!(scrambler.entropy_mode(), EntropyMode::ReduceEntropy);
    scrambler.set_entropy_mode(EntropyMode::FullCw)?;
    assert_eq!(scrambler.entropy_mode(), EntropyMode::FullCw);

    scrambler.set_mode(ScramblingMode::DvbCissa)?;
    assert_eq!(scrambler.entropy_mode(), EntropyMode::FullCw);
    Ok(())
}
