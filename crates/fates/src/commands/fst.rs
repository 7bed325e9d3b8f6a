use clap::Args;
use itertools::Itertools;
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::commands::write_file;

#[derive(Args)]
pub struct FstArgs {
    /// The romfs directory to list
    #[arg(short, long, value_name = "DIR")]
    dir: PathBuf,
}

impl FstArgs {
    pub fn handle(&self) -> Result<()> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.into_diagnostic()?;
            if !entry.file_type().is_file() || entry.file_name() == fates_bin::fst::FILE_NAME {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.dir)
                .into_diagnostic()
                .context(format!("listing {}", entry.path().display()))?;
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .join("/");
            debug!("listing {path}");
            paths.push(path);
        }
        info!("listing {} files", paths.len());

        let bin = fates_bin::fst::build(&paths).context("building file list")?;
        write_file(
            &self.dir.join(fates_bin::fst::FILE_NAME),
            &bin.to_bytes()?,
            true,
        )
    }
}
