pub mod bin;
pub mod castle_join;
pub mod fst;
pub mod gamedata;

use fates_bin::BinFile;
use miette::{Context, IntoDiagnostic, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Inspect and canonicalize any bin container
    Bin {
        #[command(subcommand)]
        command: bin::BinCommands,
    },
    /// Add entries to GameData.bin
    Gamedata {
        #[command(subcommand)]
        command: gamedata::GameDataCommands,
    },
    /// Convert castle_join.bin to text and back
    CastleJoin(castle_join::CastleJoinArgs),
    /// Generate the fst.bin file list of a DLC romfs
    Fst(fst::FstArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Bin { command } => command.handle(),
            Commands::Gamedata { command } => command.handle(),
            Commands::CastleJoin(castle_join) => castle_join.handle(),
            Commands::Fst(fst) => fst.handle(),
        }
    }
}

pub(crate) fn read_bin(path: &Path) -> Result<BinFile> {
    let bytes = std::fs::read(path)
        .into_diagnostic()
        .context(format!("reading {}", path.display()))?;

    BinFile::parse(&bytes).context(format!("parsing {}", path.display()))
}

/// Target of a command that rewrites its input unless `-o` names another file.
///
/// Writing back over the input needs no `--overwrite`.
pub(crate) fn output_target<'a>(
    input: &'a Path,
    output: Option<&'a Path>,
    overwrite: bool,
) -> (&'a Path, bool) {
    match output {
        Some(output) => (output, overwrite),
        None => (input, true),
    }
}

/// Write `bytes` to `path`, refusing to replace an existing file unless `overwrite` is set
pub(crate) fn write_file(path: &Path, bytes: &[u8], overwrite: bool) -> Result<()> {
    info!("writing {}", path.display());

    let mut out = if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))?
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))?
    };

    out.write_all(bytes)
        .into_diagnostic()
        .context(format!("writing {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn in_place_output_overwrites() {
        let input = Path::new("GameData.bin");
        let output = Path::new("out.bin");

        assert_eq!(output_target(input, None, false), (input, true));
        assert_eq!(output_target(input, Some(output), false), (output, false));
        assert_eq!(output_target(input, Some(output), true), (output, true));
    }
}
