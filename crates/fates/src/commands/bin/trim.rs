use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

use crate::commands::write_file;

#[derive(Args)]
pub struct TrimArgs {
    /// Bin files to trim
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

impl TrimArgs {
    pub fn handle(&self) -> Result<()> {
        for path in &self.files {
            let bytes = std::fs::read(path)
                .into_diagnostic()
                .context(format!("reading {}", path.display()))?;
            let trimmed = fates_bin::trim(&bytes).context(format!("trimming {}", path.display()))?;

            if trimmed.len() == bytes.len() {
                info!("{} has no padding", path.display());
                continue;
            }
            info!(
                "removing {} bytes of padding from {}",
                bytes.len() - trimmed.len(),
                path.display()
            );
            write_file(path, trimmed, true)?;
        }

        Ok(())
    }
}
