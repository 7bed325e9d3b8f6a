//! `castle_join.bin`: which characters join at which chapter of each route.
//!
//! The data region holds a `u32` count followed by that many 0x20 byte entries.

use tracing::{debug, instrument};

use fates_table::{record, KeySet, Keyed, Label, Record, Table};

use crate::error::{FormatError, Result};
use crate::read::BinFile;

/// The three routes of the game
pub struct Route;

impl KeySet for Route {
    const KEYS: &'static [&'static str] = &["A", "B", "C"];
}

record! {
    /// One character joining the castle
    pub struct JoinEntry {
        pub index: u32,
        pub pid: Label,
        /// Chapter in which the character joins, per route
        pub cids: Keyed<Label, Route>,
        pub buildings: [u32; 3] => Hex,
    }
}

impl JoinEntry {
    pub fn new(pid: impl Into<Label>, cids: [&str; 3], buildings: [u32; 3]) -> Result<Self> {
        Ok(JoinEntry {
            index: 0,
            pid: pid.into(),
            cids: Keyed::new(cids.into_iter().map(Label::from).collect())?,
            buildings,
        })
    }
}

/// Contents of a `castle_join.bin` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CastleJoin {
    pub entries: Vec<JoinEntry>,
}

impl CastleJoin {
    #[instrument(skip_all, err)]
    pub fn from_bin(bin: &BinFile) -> Result<Self> {
        let count = bin.read_u32(0)?;
        let row_size = JoinEntry::SCHEMA.size();
        if 4 + row_size * count as usize != bin.data().len() {
            return Err(FormatError::RowCount {
                count,
                row_size,
                len: bin.data().len() - 4,
            }
            .into());
        }

        let entries = bin.extract_records(4, count as usize)?;
        debug!(count, "loaded castle join entries");
        Ok(CastleJoin { entries })
    }

    /// Build a formatted container, numbering the entries in order
    #[instrument(skip_all, err, fields(entries = self.entries.len()))]
    pub fn to_bin(&self) -> Result<BinFile> {
        let entries: Vec<JoinEntry> = self
            .entries
            .iter()
            .zip(0..)
            .map(|(entry, index)| JoinEntry {
                index,
                ..entry.clone()
            })
            .collect();

        let count = entries.len() as u32;
        let mut bin = BinFile::from_parts(count.to_le_bytes().to_vec(), vec![], vec![], vec![]);
        bin.repack(&Table::from_records(&entries), 4)?;
        bin.format()?;
        Ok(bin)
    }

    /// Tab separated text, starting with a line of column names
    pub fn to_text(&self) -> String {
        let header = JoinEntry::SCHEMA.header().join("\t");
        let table = Table::from_records(&self.entries);
        if table.is_empty() {
            return header;
        }
        format!("{header}\n{}", table.to_text())
    }

    /// Parse text written by [`CastleJoin::to_text`]; the first line is skipped
    pub fn from_text(text: &str) -> Result<Self> {
        let body = text.split_once('\n').map(|(_, rest)| rest).unwrap_or_default();
        let table = Table::from_text(JoinEntry::SCHEMA, body)?;
        Ok(CastleJoin {
            entries: table.to_records()?,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::{assert_eq, assert_str_eq};
    use tracing_test::traced_test;

    use crate::castle_join::{CastleJoin, JoinEntry};
    use crate::error::{Error, FormatError, Result};
    use crate::read::BinFile;

    fn sample() -> Result<CastleJoin> {
        Ok(CastleJoin {
            entries: vec![
                JoinEntry::new("PID_A", ["NULL", "CID_X", "NULL"], [1, 2, 0xFFFF_FFFF])?,
                JoinEntry::new("PID_B", ["CID_X", "NULL", "NULL"], [0, 0, 0])?,
            ],
        })
    }

    #[traced_test]
    #[test]
    fn pack() -> Result<()> {
        let bin = sample()?.to_bin()?;

        assert_eq!(bin.data().len(), 4 + 2 * 0x20);
        assert_eq!(bin.read_u32(0)?, 2);
        assert_eq!(bin.read_u32(0x24)?, 1);
        assert_eq!(bin.pointer1(), &[0x8, 0x10, 0x2C, 0x28]);
        assert!(bin.pointer2().is_empty());
        assert_eq!(bin.labels(), b"PID_A\0CID_X\0PID_B\0");
        assert_eq!(bin.read_u32(0x8)?, 0x54);
        assert_eq!(bin.read_u32(0xC)?, 0);
        assert_eq!(bin.read_u32(0x10)?, 0x5A);
        assert_eq!(bin.read_u32(0x2C)?, 0x5A);
        assert_eq!(bin.read_u32(0x20)?, 0xFFFF_FFFF);

        let loaded = CastleJoin::from_bin(&BinFile::parse(&bin.to_bytes()?)?)?;
        assert_eq!(loaded.entries[1].index, 1);
        assert_eq!(loaded.to_bin()?, bin);

        Ok(())
    }

    #[test]
    fn text() -> Result<()> {
        let join = sample()?;
        let text = join.to_text();

        assert_str_eq!(
            text,
            "index\tpid\tcids.A\tcids.B\tcids.C\tbuildings[0]\tbuildings[1]\tbuildings[2]\n\
             0\tPID_A\tNULL\tCID_X\tNULL\t0x00000001\t0x00000002\t0xFFFFFFFF\n\
             0\tPID_B\tCID_X\tNULL\tNULL\t0x00000000\t0x00000000\t0x00000000"
        );
        assert_eq!(CastleJoin::from_text(&text)?, join);
        assert_eq!(CastleJoin::from_text(&CastleJoin::default().to_text())?, CastleJoin::default());

        Ok(())
    }

    #[test]
    fn count_must_fill_data() -> Result<()> {
        let mut bin = sample()?.to_bin()?;
        bin.write_u32(0, 3)?;

        assert!(matches!(
            CastleJoin::from_bin(&bin),
            Err(Error::Format(FormatError::RowCount { count: 3, .. }))
        ));

        Ok(())
    }
}
