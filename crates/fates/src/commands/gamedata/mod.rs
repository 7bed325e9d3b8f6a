pub mod append;
pub mod append_character;

use miette::{miette, Result};

#[derive(clap::Subcommand)]
pub enum GameDataCommands {
    /// Append rows to one of the fixed size tables
    Append(append::AppendArgs),
    /// Append characters together with their stances and support blocks
    AppendCharacter(append_character::AppendCharacterArgs),
}

impl GameDataCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            GameDataCommands::Append(append) => append.handle(),
            GameDataCommands::AppendCharacter(append) => append.handle(),
        }
    }
}

/// Parse a decimal or `0x` prefixed id
pub(crate) fn parse_id(text: &str) -> Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| miette!("invalid id {text:?}: {e}"))
}

/// Pair up the flat `ID NAME ID NAME ...` values of a repeated two value argument
pub(crate) fn parse_entries(values: &[String]) -> Result<Vec<fates_bin::NewEntry>> {
    use itertools::Itertools;

    if values.len() % 2 != 0 {
        return Err(miette!("every entry needs an id and a name"));
    }
    values
        .iter()
        .tuples()
        .map(|(id, name)| Ok(fates_bin::NewEntry::new(parse_id(id)?, name.as_str())))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ids() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert_eq!(parse_id("0x1F").unwrap(), 0x1F);
        assert!(parse_id("PID").is_err());
    }

    #[test]
    fn entries() {
        let values = ["0x10", "Foo", "17", "Bar"].map(String::from);
        let entries = parse_entries(&values).unwrap();

        assert_eq!(
            entries,
            vec![
                fates_bin::NewEntry::new(0x10, "Foo"),
                fates_bin::NewEntry::new(17, "Bar")
            ]
        );
        assert!(parse_entries(&values[..3]).is_err());
    }
}
