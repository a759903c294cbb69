use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use ts_scramble::ScramblingMode;

const ABOUT: &str = "A command-line MPEG-TS scrambler/descrambler";
const LONG_ABOUT: &str = "\
ts-scramble-cli scrambles or descrambles files of raw 188-byte MPEG transport-stream \
packets using DVB-CSA2 (the default), DVB-CISSA, ATIS-IDSA, AES-CBC or AES-CTR. \
Control words come from a fixed value or from a text file, one hexadecimal CW per \
line; the next CW of the list is used at each scrambling-control transition.";

#[derive(Parser, Debug)]
#[command(name = "ts-scramble-cli", version, about = ABOUT, long_about = LONG_ABOUT)]
pub struct Opts {
    /// Input file of raw 188-byte TS packets.
    #[clap(short, long)]
    pub input: PathBuf,

    /// Output file. Defaults to "processed.ts" in the current directory.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// What action to perform, either to scramble or to
    /// descramble the input.
    #[clap(short, long)]
    pub action: Action,

    /// Use DVB-CSA2 scrambling. This is the default.
    #[clap(long)]
    pub dvb_csa2: bool,

    /// Use DVB-CISSA scrambling instead of DVB-CSA2.
    /// Control words are 16 bytes long instead of 8.
    #[clap(long)]
    pub dvb_cissa: bool,

    /// Use ATIS-IDSA scrambling instead of DVB-CSA2.
    /// Control words are 16 bytes long instead of 8.
    #[clap(long)]
    pub atis_idsa: bool,

    /// Use AES-CBC scrambling instead of DVB-CSA2 (non-standard).
    /// The residue of each payload is left clear.
    #[clap(long)]
    pub aes_cbc: bool,

    /// Use AES-CTR scrambling instead of DVB-CSA2 (non-standard).
    /// The residue is included in the scrambling.
    #[clap(long)]
    pub aes_ctr: bool,

    /// Fixed control word for all packets, as a hex string.
    #[clap(short, long)]
    pub cw: Option<String>,

    /// Text file with the list of control words to apply, one
    /// hex-encoded CW per line.
    #[clap(short = 'f', long)]
    pub cw_file: Option<PathBuf>,

    /// Text file to create, recording every control word the first
    /// time it is used. Can be fed back with --cw-file.
    #[clap(long)]
    pub output_cw_file: Option<PathBuf>,

    /// With --aes-cbc or --aes-ctr, fixed initialization vector for all
    /// packets, as a string of 32 hex digits. All zeroes by default.
    #[clap(long)]
    pub iv: Option<String>,

    /// With --aes-ctr, size in bits of the counter part of the IV.
    /// The default is half the IV, 64 bits.
    #[clap(long)]
    pub ctr_counter_bits: Option<usize>,

    /// With DVB-CSA2, keep full 64-bit control words instead of
    /// reducing their entropy to 48 bits.
    #[clap(short = 'n', long)]
    pub no_entropy_reduction: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Action {
    Scramble,
    Descramble,
}

impl Opts {
    /// The selected scrambling algorithm; the selectors are mutually
    /// exclusive.
    pub fn mode(&self) -> anyhow::Result<ScramblingMode> {
        let selected = [
            self.dvb_csa2,
            self.dvb_cissa,
            self.atis_idsa,
            self.aes_cbc,
            self.aes_ctr,
        ];
        anyhow::ensure!(
            selected.iter().filter(|&&on| on).count() <= 1,
            "--dvb-csa2, --dvb-cissa, --atis-idsa, --aes-cbc, --aes-ctr are mutually exclusive"
        );
        Ok(if self.dvb_cissa {
            ScramblingMode::DvbCissa
        } else if self.atis_idsa {
            ScramblingMode::AtisIdsa
        } else if self.aes_cbc {
            ScramblingMode::AesCbc
        } else if self.aes_ctr {
            ScramblingMode::AesCtr
        } else {
            ScramblingMode::DvbCsa2
        })
    }

    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.output {
            return path.clone();
        }

        let mut path = PathBuf::new();
        path.push("./");
        path.push("processed.ts");

        path
    }
}
