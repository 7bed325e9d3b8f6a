use clap::Args;
use fates_bin::{CharacterAppend, GameData};
use miette::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::commands::gamedata::parse_entries;
use crate::commands::{output_target, read_bin, write_file};

#[derive(Args)]
pub struct AppendCharacterArgs {
    /// The GameData.bin to extend
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A new character, as its id and the name its labels are built from
    #[arg(short, long, num_args = 2, value_names = ["ID", "NAME"], required = true)]
    entry: Vec<String>,

    /// Partner counts of fresh support blocks, given to the first characters in order
    #[arg(short, long, value_name = "N", num_args = 1..)]
    support: Vec<u16>,

    /// Leave the attack stance pointer of new characters empty
    #[arg(long, default_value_t = false)]
    no_attack: bool,

    /// Leave the defense stance pointer of new characters empty
    #[arg(long, default_value_t = false)]
    no_defense: bool,

    /// Where to write the result, the input file when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow replacing an existing output file
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl AppendCharacterArgs {
    pub fn handle(&self) -> Result<()> {
        let options = CharacterAppend::builder()
            .characters(parse_entries(&self.entry)?)
            .supports(self.support.clone())
            .attack(!self.no_attack)
            .defense(!self.no_defense)
            .build();
        let mut gamedata = GameData::new(read_bin(&self.file)?);

        gamedata
            .append_characters(&options)
            .context("appending characters")?;
        gamedata.format().context("formatting")?;
        info!(
            "appended {} characters and {} support blocks",
            options.characters.len(),
            options.supports.len()
        );

        let (output, overwrite) = output_target(&self.file, self.output.as_deref(), self.overwrite);
        write_file(output, &gamedata.to_bytes()?, overwrite)
    }
}
