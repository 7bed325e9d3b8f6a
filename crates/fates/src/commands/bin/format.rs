use clap::Args;
use miette::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::commands::{output_target, read_bin, write_file};

#[derive(Args)]
pub struct FormatArgs {
    /// An input bin file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Where to write the result, the input file when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow replacing an existing output file
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl FormatArgs {
    pub fn handle(&self) -> Result<()> {
        let mut bin = read_bin(&self.file)?;
        let before = bin.len();

        bin.format()
            .context(format!("formatting {}", self.file.display()))?;
        info!("formatted {} bytes into {}", before, bin.len());

        let (output, overwrite) = output_target(&self.file, self.output.as_deref(), self.overwrite);
        write_file(output, &bin.to_bytes()?, overwrite)
    }
}
