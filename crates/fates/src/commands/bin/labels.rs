use clap::Args;
use itertools::Itertools;
use miette::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::commands::read_bin;

#[derive(Args)]
pub struct LabelsArgs {
    /// An input bin file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Also list the labels tagged through pointer-2
    #[arg(long, default_value_t = false)]
    tags: bool,
}

impl LabelsArgs {
    pub fn handle(&self) -> Result<()> {
        let bin = read_bin(&self.file)?;
        let labels = bin.label_map().context("collecting labels")?;

        for (offset, label) in labels.iter().sorted_by_key(|(offset, _)| **offset) {
            println!("{:#010x}\t{}", offset.dimmed(), label);
        }

        if self.tags {
            for tag in bin.pointer2() {
                let label = bin.tag_label(tag).context("reading tag label")?;
                println!("{:#010x}\t{}", tag.target.dimmed(), label.cyan());
            }
        }

        Ok(())
    }
}
