//! Canonical ordering of pointer tables and labels.

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::error::{FormatError, Result};
use crate::labels::LabelPool;
use crate::read::BinFile;

impl BinFile {
    /// Rewrite the pointer regions and the label pool into canonical order.
    ///
    /// Pointer-1 entries that do not reference a label come first, in their
    /// current order. Entries referencing a label follow, grouped by label. Groups
    /// are ordered by the storage offset of their first member. Pointer-2 is
    /// sorted by data offset. Labels are then rebuilt from pointer-2 first and
    /// pointer-1 second, each distinct text stored once, and unreferenced labels
    /// are dropped.
    ///
    /// Formatting is idempotent.
    #[instrument(skip(self), err)]
    pub fn format(&mut self) -> Result<()> {
        let base = self.label_base();

        let mut plain = Vec::new();
        let mut groups: IndexMap<Vec<u8>, Vec<u32>> = IndexMap::new();
        for location in &self.pointer1 {
            let target = self.read_u32(*location)?;
            if target < base {
                plain.push(*location);
                continue;
            }

            let label = self
                .label_bytes(target - base)
                .ok_or(FormatError::UnterminatedLabel(target))?;
            groups.entry(label.to_vec()).or_default().push(*location);
        }
        groups.sort_by(|_, a, _, b| a[0].cmp(&b[0]));

        let mut pointer2 = self.pointer2.clone();
        pointer2.sort_by_key(|tag| tag.target);

        let mut pool = LabelPool::new();
        for tag in &mut pointer2 {
            let label = self
                .label_bytes(tag.label)
                .ok_or(FormatError::UnterminatedLabel(base + tag.label))?;
            tag.label = pool.intern_bytes(label);
        }

        let mut patches = Vec::with_capacity(self.pointer1.len() - plain.len());
        for (label, locations) in &groups {
            let offset = base + pool.intern_bytes(label);
            patches.extend(locations.iter().map(|location| (*location, offset)));
        }

        debug!(
            plain = plain.len(),
            groups = groups.len(),
            tags = pointer2.len(),
            labels = pool.len(),
            "formatted pointer regions"
        );

        for (location, target) in patches {
            self.write_u32(location, target)?;
        }
        self.pointer1 = plain
            .into_iter()
            .chain(groups.into_values().flatten())
            .collect();
        self.pointer2 = pointer2;
        self.labels = pool.into_bytes();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::Result;
    use crate::read::BinFile;
    use crate::types::LabelTag;

    /// Pointer-1 out of order, a duplicated label, an orphaned label and
    /// pointer-2 out of order.
    #[rustfmt::skip]
    fn unformatted() -> BinFile {
        BinFile::from_parts(
            vec![
                0x0C, 0x00, 0x00, 0x00,
                0x37, 0x00, 0x00, 0x00,
                0x39, 0x00, 0x00, 0x00,
                0x3B, 0x00, 0x00, 0x00,
            ],
            vec![8, 12, 0, 4],
            vec![LabelTag::new(12, 13), LabelTag::new(4, 9)],
            b"ORPHAN\0B\0A\0B\0T\0".to_vec(),
        )
    }

    #[traced_test]
    #[test]
    fn canonical_order() -> Result<()> {
        let mut bin = unformatted();
        assert_eq!(bin.label_base(), 0x30);

        bin.format()?;

        #[rustfmt::skip]
        let expected = BinFile::from_parts(
            vec![
                0x0C, 0x00, 0x00, 0x00,
                0x34, 0x00, 0x00, 0x00,
                0x30, 0x00, 0x00, 0x00,
                0x34, 0x00, 0x00, 0x00,
            ],
            vec![0, 8, 12, 4],
            vec![LabelTag::new(4, 0), LabelTag::new(12, 2)],
            b"A\0T\0B\0".to_vec(),
        );
        assert_eq!(bin, expected);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn idempotent() -> Result<()> {
        let mut bin = unformatted();
        bin.format()?;
        let once = bin.to_bytes()?;

        bin.format()?;
        assert_eq!(bin.to_bytes()?, once);

        Ok(())
    }

    #[test]
    fn labels_are_deduplicated() -> Result<()> {
        let mut bin = unformatted();
        bin.format()?;

        let mut referenced = bin
            .pointer1()
            .iter()
            .map(|location| bin.read_u32(*location))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|target| *target >= bin.label_base())
            .map(|target| bin.get_label(target))
            .chain(bin.pointer2().iter().map(|tag| bin.tag_label(tag)))
            .collect::<Result<Vec<_>>>()?;
        referenced.sort();
        referenced.dedup();

        let stored = bin.labels().split(|b| *b == 0).filter(|l| !l.is_empty()).count();
        assert_eq!(referenced, ["A", "B", "T"]);
        assert_eq!(stored, referenced.len());

        Ok(())
    }

    #[test]
    fn empty_container() -> Result<()> {
        let mut bin = BinFile::new();
        bin.format()?;
        assert_eq!(bin, BinFile::new());

        Ok(())
    }
}
