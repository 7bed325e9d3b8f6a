use clap::Args;
use fates_bin::castle_join::CastleJoin;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::commands::{read_bin, write_file};

#[derive(Args)]
pub struct CastleJoinArgs {
    /// A castle_join.bin to export or a text file to pack
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file, next to the input when omitted
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Allow overwriting the output
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl CastleJoinArgs {
    pub fn handle(&self) -> Result<()> {
        let extension = self.input.extension().and_then(|e| e.to_str());
        match extension {
            Some("bin") => {
                let bin = read_bin(&self.input)?;
                let join = CastleJoin::from_bin(&bin).context("reading castle join entries")?;
                info!("exporting {} entries", join.entries.len());

                let output = self.output_or("castle_join.txt");
                write_file(&output, join.to_text().as_bytes(), self.overwrite)
            }
            Some("txt") => {
                let text = std::fs::read_to_string(&self.input)
                    .into_diagnostic()
                    .context(format!("reading {}", self.input.display()))?;
                let join = CastleJoin::from_text(&text).context("parsing castle join text")?;
                info!("packing {} entries", join.entries.len());

                let bin = join.to_bin()?;
                let output = self.output_or("castle_join.bin");
                write_file(&output, &bin.to_bytes()?, self.overwrite)
            }
            _ => Err(miette!(
                help = "use a .bin file to export or a .txt file to pack",
                "unsupported input {}",
                self.input.display()
            )),
        }
    }

    fn output_or(&self, name: &str) -> PathBuf {
        match &self.output {
            Some(output) => output.clone(),
            None => self
                .input
                .parent()
                .unwrap_or(Path::new(""))
                .join(name),
        }
    }
}
