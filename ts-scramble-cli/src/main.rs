use std::fs;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ts_scramble::{EntropyMode, PKT_SIZE, TsPacket, TsScrambling};

use crate::opts::{Action, Opts};

mod opts;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let mut scrambling = configure(&opts)?;

    let data = fs::read(&opts.input)
        .with_context(|| format!("error reading {}", opts.input.display()))?;
    anyhow::ensure!(
        data.len() % PKT_SIZE == 0,
        "input size is not a multiple of {PKT_SIZE} bytes"
    );

    scrambling.start()?;
    let mut out = Vec::with_capacity(data.len());
    let mut processed = 0usize;
    for (index, chunk) in data.chunks_exact(PKT_SIZE).enumerate() {
        let mut pkt = TsPacket::from_bytes(chunk).context("invalid packet size")?;
        anyhow::ensure!(pkt.has_sync(), "packet {index}: missing sync byte");
        match opts.action {
            Action::Scramble => scrambling
                .encrypt_packet(&mut pkt)
                .with_context(|| format!("packet {index}"))?,
            Action::Descramble => scrambling
                .decrypt_packet(&mut pkt)
                .with_context(|| format!("packet {index}"))?,
        }
        out.extend_from_slice(pkt.bytes());
        processed += 1;
    }
    scrambling.stop();

    let output = opts.output_path();
    fs::write(&output, &out).with_context(|| format!("error writing {}", output.display()))?;
    info!(
        "{processed} packets processed with {} into {}",
        scrambling.algo_name(),
        output.display()
    );
    Ok(())
}

fn configure(opts: &Opts) -> anyhow::Result<TsScrambling> {
    let mut scrambling = TsScrambling::new(opts.mode()?)?;

    if opts.no_entropy_reduction {
        scrambling.set_entropy_mode(EntropyMode::FullCw)?;
    }
    if let Some(iv) = &opts.iv {
        let iv = hex::decode(iv).context("invalid --iv hex string")?;
        scrambling.set_iv(&iv).context("invalid --iv size")?;
    }
    if let Some(bits) = opts.ctr_counter_bits {
        scrambling.set_counter_bits(bits)?;
    }

    anyhow::ensure!(
        !(opts.cw.is_some() && opts.cw_file.is_some()),
        "--cw and --cw-file are mutually exclusive"
    );
    if let Some(cw) = &opts.cw {
        let cw = hex::decode(cw).context("invalid --cw hex string")?;
        scrambling.set_fixed_cw(&cw).with_context(|| {
            format!("invalid control word, specify {} hex digits", 2 * scrambling.cw_size())
        })?;
    } else if let Some(path) = &opts.cw_file {
        scrambling
            .load_cw_file(path)
            .with_context(|| format!("error loading {}", path.display()))?;
    } else {
        anyhow::bail!("no control word, use --cw or --cw-file");
    }

    scrambling.set_output_cw_file(opts.output_cw_file.clone());
    Ok(scrambling)
}
