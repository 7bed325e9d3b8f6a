pub mod format;
pub mod info;
pub mod labels;
pub mod trim;

#[derive(clap::Subcommand)]
pub enum BinCommands {
    /// Show the header and region sizes of a bin file
    Info(info::InfoArgs),
    /// List every label referenced from the data region
    Labels(labels::LabelsArgs),
    /// Rewrite pointers and labels into canonical order
    Format(format::FormatArgs),
    /// Cut the padding after the declared end of bin files, in place
    Trim(trim::TrimArgs),
}

impl BinCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            BinCommands::Info(info) => info.handle(),
            BinCommands::Labels(labels) => labels.handle(),
            BinCommands::Format(format) => format.handle(),
            BinCommands::Trim(trim) => trim.handle(),
        }
    }
}
