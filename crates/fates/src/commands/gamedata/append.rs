use clap::{Args, ValueEnum};
use fates_bin::{GameData, TableKind};
use miette::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::commands::gamedata::parse_entries;
use crate::commands::{output_target, read_bin, write_file};

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Chapter,
    Class,
    Skill,
    Stat,
    Army,
    Item,
    Tutorial,
}

impl From<Kind> for TableKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Chapter => TableKind::Chapter,
            Kind::Class => TableKind::Class,
            Kind::Skill => TableKind::Skill,
            Kind::Stat => TableKind::Stat,
            Kind::Army => TableKind::Army,
            Kind::Item => TableKind::Item,
            Kind::Tutorial => TableKind::Tutorial,
        }
    }
}

#[derive(Args)]
pub struct AppendArgs {
    /// The GameData.bin to extend
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Table receiving the rows, support blocks are added with `append-character --support`
    #[arg(short, long, value_enum)]
    kind: Kind,

    /// A new row, as its id and the name its labels are built from
    #[arg(short, long, num_args = 2, value_names = ["ID", "NAME"], required = true)]
    entry: Vec<String>,

    /// Where to write the result, the input file when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow replacing an existing output file
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl AppendArgs {
    pub fn handle(&self) -> Result<()> {
        let kind = TableKind::from(self.kind);
        let entries = parse_entries(&self.entry)?;
        let mut gamedata = GameData::new(read_bin(&self.file)?);

        gamedata
            .append(kind, &entries)
            .context(format!("appending to the {kind} table"))?;
        gamedata.format().context("formatting")?;
        info!("appended {} {kind} rows", entries.len());

        let (output, overwrite) = output_target(&self.file, self.output.as_deref(), self.overwrite);
        write_file(output, &gamedata.to_bytes()?, overwrite)
    }
}
