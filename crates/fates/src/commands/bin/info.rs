use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use crate::commands::read_bin;

#[derive(Args)]
pub struct InfoArgs {
    /// An input bin file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let bin = read_bin(&self.file)?;
        let header = bin.header()?;

        println!("{}", self.file.display().bold());
        println!("  size:        {:#x}", header.size);
        println!("  data:        {:#x}", header.data_length);
        println!("  pointer-1:   {}", header.pointer1_count);
        println!("  pointer-2:   {}", header.pointer2_count);
        println!("  label base:  {:#x}", bin.label_base());
        println!("  label bytes: {}", bin.labels().len());

        Ok(())
    }
}
