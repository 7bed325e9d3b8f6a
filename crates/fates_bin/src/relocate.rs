//! Inserting data while keeping every pointer valid.
//!
//! New bytes are spliced into the data region as one or more zones. Every
//! existing pointer-1 location and target, and every pointer-2 target, that lies
//! at or after a zone moves by the length of that zone. Targets inside the label
//! pool additionally move by the growth of the two pointer regions.

use bon::Builder;
use byteorder::{ByteOrder, LittleEndian};
use derive_more::Display;
use tracing::{debug, instrument, trace};

use fates_table::{Cell, CellType};

use crate::error::{Error, FormatError, Result};
use crate::labels::LabelPool;
use crate::read::BinFile;
use crate::types::LabelTag;

/// Width of an unsigned integer stored in the data region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IntWidth {
    #[display("u8")]
    U8,
    #[display("u16")]
    U16,
    #[display("u32")]
    U32,
}

impl IntWidth {
    pub const fn size(self) -> u32 {
        match self {
            IntWidth::U8 => 1,
            IntWidth::U16 => 2,
            IntWidth::U32 => 4,
        }
    }

    const fn cell_type(self) -> CellType {
        match self {
            IntWidth::U8 => CellType::U8,
            IntWidth::U16 => CellType::U16,
            IntWidth::U32 => CellType::U32,
        }
    }
}

/// An unsigned integer at a fixed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntField {
    pub offset: u32,
    pub width: IntWidth,
}

impl IntField {
    pub const fn new(offset: u32, width: IntWidth) -> Self {
        IntField { offset, width }
    }
}

/// A label pointer inside a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelField {
    /// Offset of the pointer from the start of the row
    pub offset: u32,
    /// Text put in front of the entry name, joined with `_`
    pub prefix: Option<String>,
}

impl LabelField {
    pub fn new(offset: u32, prefix: impl Into<String>) -> Self {
        LabelField {
            offset,
            prefix: Some(prefix.into()),
        }
    }

    /// A field whose label is the entry name itself
    pub fn bare(offset: u32) -> Self {
        LabelField {
            offset,
            prefix: None,
        }
    }

    pub fn label_for(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}_{name}"),
            None => name.to_string(),
        }
    }
}

/// Where a table lives and how its rows are shaped
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct TableLayout {
    /// Offset of the first row
    pub offset: u32,

    /// Field holding the number of rows
    pub count: IntField,

    /// Size of one row, unknown for tables of variable sized entries
    pub row_size: Option<u32>,

    /// Numeric id inside each row
    pub id: Option<IntField>,

    /// Label pointers inside each row, the first one names the row
    #[builder(default)]
    pub labels: Vec<LabelField>,
}

/// A row to append: its numeric id and the name its labels are built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub id: u32,
    pub name: String,
}

impl NewEntry {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        NewEntry {
            id,
            name: name.into(),
        }
    }
}

/// Planned insertion of zones into the data region of one container.
///
/// Zones are `(offset, length)` pairs in the coordinates of the unmodified data
/// region and must be given in ascending order of offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    zones: Vec<(u32, u32)>,
    old_label_base: u32,
    added_pointer1: usize,
    added_pointer2: usize,
    data_diff: u32,
    label_diff: u32,
}

impl Relocation {
    pub fn new(
        bin: &BinFile,
        zones: Vec<(u32, u32)>,
        added_pointer1: usize,
        added_pointer2: usize,
    ) -> Self {
        let data_diff: u32 = zones.iter().map(|(_, len)| len).sum();
        let label_diff =
            data_diff + 4 * added_pointer1 as u32 + LabelTag::SIZE as u32 * added_pointer2 as u32;

        trace!(?zones, data_diff, label_diff, "planned relocation");
        Relocation {
            zones,
            old_label_base: bin.label_base(),
            added_pointer1,
            added_pointer2,
            data_diff,
            label_diff,
        }
    }

    pub fn zones(&self) -> &[(u32, u32)] {
        &self.zones
    }

    /// Growth of the data region
    pub fn data_diff(&self) -> u32 {
        self.data_diff
    }

    /// Growth of everything in front of the label pool
    pub fn label_diff(&self) -> u32 {
        self.label_diff
    }

    /// Label base once the relocation has been applied
    pub fn label_base(&self) -> u32 {
        self.old_label_base + self.label_diff
    }

    /// Final offset of the first new byte of `zone`
    pub fn position(&self, zone: usize) -> u32 {
        let before: u32 = self.zones[..zone].iter().map(|(_, len)| len).sum();
        self.zones[zone].0 + before
    }

    /// New offset of data that was at `offset`
    pub fn shift(&self, offset: u32) -> u32 {
        let moved: u32 = self
            .zones
            .iter()
            .filter(|(at, _)| *at <= offset)
            .map(|(_, len)| len)
            .sum();
        offset + moved
    }

    /// New value of a stored pointer
    pub fn target(&self, target: u32) -> u32 {
        if target == 0 {
            0
        } else if target >= self.old_label_base {
            target + self.label_diff
        } else {
            self.shift(target)
        }
    }
}

/// Store `value` into `buffer`, rejecting values that do not fit `width`
pub(crate) fn put_int(buffer: &mut [u8], offset: u32, width: IntWidth, value: u32) -> Result<()> {
    Cell::from_int(width.cell_type(), value as i64)?;

    let size = buffer.len();
    let slot = buffer
        .get_mut(offset as usize..(offset + width.size()) as usize)
        .ok_or(FormatError::OutOfBounds {
            offset,
            len: width.size() as usize,
            size,
        })?;
    match width {
        IntWidth::U8 => slot[0] = value as u8,
        IntWidth::U16 => LittleEndian::write_u16(slot, value as u16),
        IntWidth::U32 => LittleEndian::write_u32(slot, value),
    }
    Ok(())
}

impl BinFile {
    pub fn read_int(&self, field: IntField) -> Result<u32> {
        Ok(match field.width {
            IntWidth::U8 => self.read_u8(field.offset)? as u32,
            IntWidth::U16 => self.read_u16(field.offset)? as u32,
            IntWidth::U32 => self.read_u32(field.offset)?,
        })
    }

    pub fn write_int(&mut self, field: IntField, value: u32) -> Result<()> {
        put_int(&mut self.data, field.offset, field.width, value)
    }

    /// End of `count` entries of `size` bytes at `offset`, which must fit the data region
    pub(crate) fn region_end(&self, offset: u32, size: u32, count: u32) -> Result<u32> {
        let len = size as u64 * count as u64;
        let end = offset as u64 + len;
        if end > self.data.len() as u64 {
            return Err(FormatError::OutOfBounds {
                offset,
                len: len as usize,
                size: self.data.len(),
            }
            .into());
        }
        Ok(end as u32)
    }

    /// Apply `relocation`, inserting one block per zone.
    ///
    /// `pointer1` and `pointer2` are appended to the pointer regions and `labels`
    /// to the label pool. They must already be expressed in the relocated layout.
    #[instrument(skip_all, err, fields(zones = relocation.zones.len(), data_diff = relocation.data_diff))]
    pub fn splice(
        &mut self,
        relocation: &Relocation,
        blocks: Vec<Vec<u8>>,
        pointer1: Vec<u32>,
        pointer2: Vec<LabelTag>,
        labels: Vec<u8>,
    ) -> Result<()> {
        if relocation.old_label_base != self.label_base() {
            return Err(Error::InvalidArgument(
                "relocation was planned for a different container".to_string(),
            ));
        }
        if blocks.len() != relocation.zones.len()
            || blocks
                .iter()
                .zip(&relocation.zones)
                .any(|(block, (_, len))| block.len() != *len as usize)
        {
            return Err(Error::InvalidArgument(
                "inserted blocks do not match the planned zones".to_string(),
            ));
        }
        if pointer1.len() != relocation.added_pointer1
            || pointer2.len() != relocation.added_pointer2
        {
            return Err(Error::InvalidArgument(format!(
                "expected {} pointer-1 and {} pointer-2 entries, got {} and {}",
                relocation.added_pointer1,
                relocation.added_pointer2,
                pointer1.len(),
                pointer2.len()
            )));
        }
        let mut previous = 0;
        for (at, _) in &relocation.zones {
            if *at < previous || *at as usize > self.data.len() {
                return Err(Error::InvalidArgument(format!(
                    "zone at {at:#x} is out of order or outside the data region"
                )));
            }
            previous = *at;
        }

        let mut patches = Vec::with_capacity(self.pointer1.len());
        let mut locations = Vec::with_capacity(self.pointer1.len() + pointer1.len());
        for location in &self.pointer1 {
            let target = self.read_u32(*location)?;
            patches.push((*location, relocation.target(target)));
            locations.push(relocation.shift(*location));
        }
        for (location, target) in patches {
            self.write_u32(location, target)?;
        }

        let mut data = Vec::with_capacity(self.data.len() + relocation.data_diff as usize);
        let mut cursor = 0;
        for ((at, _), block) in relocation.zones.iter().zip(blocks) {
            data.extend_from_slice(&self.data[cursor..*at as usize]);
            data.extend(block);
            cursor = *at as usize;
        }
        data.extend_from_slice(&self.data[cursor..]);

        for tag in &mut self.pointer2 {
            tag.target = relocation.shift(tag.target);
        }

        self.data = data;
        locations.extend(pointer1);
        self.pointer1 = locations;
        self.pointer2.extend(pointer2);
        self.labels.extend(labels);

        debug!(
            data = self.data.len(),
            pointer1 = self.pointer1.len(),
            pointer2 = self.pointer2.len(),
            labels = self.labels.len(),
            "spliced zones"
        );
        Ok(())
    }

    /// Append rows to the end of a table.
    ///
    /// Each row gets one fresh label per label field, its id and a pointer-2 entry
    /// naming it after its first label. The count field is raised accordingly.
    #[instrument(skip(self, layout, entries), err, fields(rows = entries.len(), offset = layout.offset))]
    pub fn append_rows(&mut self, layout: &TableLayout, entries: &[NewEntry]) -> Result<()> {
        if entries.is_empty() {
            return Err(Error::InvalidArgument("no rows to append".to_string()));
        }
        let row_size = layout.row_size.ok_or_else(|| {
            Error::InvalidArgument(format!(
                "table at {:#x} has no fixed row size",
                layout.offset
            ))
        })?;

        let old_count = self.read_int(layout.count)?;
        let count = entries.len() as u32;
        let end = self.region_end(layout.offset, row_size, old_count)?;
        let named = !layout.labels.is_empty();

        let relocation = Relocation::new(
            self,
            vec![(end, row_size * count)],
            layout.labels.len() * entries.len(),
            if named { entries.len() } else { 0 },
        );
        let base = relocation.label_base();

        let mut rows = vec![0; (row_size * count) as usize];
        let mut pool = LabelPool::starting_at(self.labels.len() as u32);
        let mut pointer1 = Vec::with_capacity(relocation.added_pointer1);
        let mut pointer2 = Vec::with_capacity(relocation.added_pointer2);
        for (i, entry) in entries.iter().enumerate() {
            let row = i as u32 * row_size;

            let mut primary = None;
            for field in &layout.labels {
                let label = pool.push(&field.label_for(&entry.name))?;
                primary.get_or_insert(label);
                put_int(&mut rows, row + field.offset, IntWidth::U32, base + label)?;
                pointer1.push(end + row + field.offset);
            }
            if let Some(id) = layout.id {
                put_int(&mut rows, row + id.offset, id.width, entry.id)?;
            }
            if let Some(label) = primary {
                pointer2.push(LabelTag::new(end + row, label));
            }
        }

        debug!(old_count, end, label_diff = relocation.label_diff, "appending rows");
        self.write_int(layout.count, old_count + count)?;
        self.splice(
            &relocation,
            vec![rows],
            pointer1,
            pointer2,
            pool.into_bytes(),
        )
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::{Error, FormatError, Result};
    use crate::read::BinFile;
    use crate::relocate::{IntField, IntWidth, LabelField, NewEntry, Relocation, TableLayout};
    use crate::types::LabelTag;

    /// One row naming `A`, followed by a pointer to a later sub table
    #[rustfmt::skip]
    fn single_row() -> BinFile {
        BinFile::from_parts(
            vec![
                0x01, 0x00, 0x00, 0x00,
                0x20, 0x00, 0x00, 0x00,
                0x0C, 0x00, 0x00, 0x00,
                0xDD, 0xCC, 0xBB, 0xAA,
            ],
            vec![4, 8],
            vec![LabelTag::new(12, 0)],
            b"A\0".to_vec(),
        )
    }

    fn single_row_layout() -> TableLayout {
        TableLayout::builder()
            .offset(4)
            .count(IntField::new(0, IntWidth::U32))
            .row_size(4)
            .labels(vec![LabelField::bare(0)])
            .build()
    }

    #[test]
    fn relocation_offsets() {
        let bin = BinFile::from_parts(vec![0; 0x40], vec![], vec![], vec![]);
        let relocation = Relocation::new(&bin, vec![(0x10, 4), (0x20, 8), (0x20, 0), (0x30, 2)], 3, 2);

        assert_eq!(relocation.data_diff(), 14);
        assert_eq!(relocation.label_diff(), 14 + 12 + 16);
        assert_eq!(relocation.label_base(), 0x40 + 42);

        assert_eq!(relocation.position(0), 0x10);
        assert_eq!(relocation.position(1), 0x24);
        assert_eq!(relocation.position(3), 0x3C);

        assert_eq!(relocation.shift(0x0F), 0x0F);
        assert_eq!(relocation.shift(0x10), 0x14);
        assert_eq!(relocation.shift(0x20), 0x2C);
        assert_eq!(relocation.shift(0x3F), 0x4D);

        assert_eq!(relocation.target(0), 0);
        assert_eq!(relocation.target(0x38), 0x46);
        assert_eq!(relocation.target(0x40), 0x40 + 42);
    }

    #[traced_test]
    #[test]
    fn append_relocates_later_data() -> Result<()> {
        let mut bin = single_row();
        assert_eq!(bin.label_base(), 0x20);

        bin.append_rows(&single_row_layout(), &[NewEntry::new(0, "B")])?;

        #[rustfmt::skip]
        let expected = BinFile::from_parts(
            vec![
                0x02, 0x00, 0x00, 0x00,
                0x30, 0x00, 0x00, 0x00,
                0x32, 0x00, 0x00, 0x00,
                0x10, 0x00, 0x00, 0x00,
                0xDD, 0xCC, 0xBB, 0xAA,
            ],
            vec![4, 12, 8],
            vec![LabelTag::new(16, 0), LabelTag::new(8, 2)],
            b"A\0B\0".to_vec(),
        );
        assert_eq!(bin, expected);
        assert_eq!(bin.label_base(), 0x30);
        assert_eq!(bin.get_label(bin.read_u32(8)?)?, "B");

        Ok(())
    }

    #[traced_test]
    #[test]
    fn append_prefixed_labels_and_ids() -> Result<()> {
        let mut bin = BinFile::from_parts(vec![0, 0, 0, 0], vec![], vec![], vec![]);
        let layout = TableLayout::builder()
            .offset(4)
            .count(IntField::new(0, IntWidth::U16))
            .row_size(0xC)
            .id(IntField::new(8, IntWidth::U16))
            .labels(vec![LabelField::new(0, "PID"), LabelField::new(4, "MPID")])
            .build();

        bin.append_rows(&layout, &[NewEntry::new(0x1234, "X"), NewEntry::new(1, "X")])?;

        assert_eq!(bin.read_u16(0)?, 2);
        assert_eq!(bin.data().len(), 4 + 2 * 0xC);
        assert_eq!(bin.pointer1(), &[4, 8, 0x10, 0x14]);
        assert_eq!(bin.pointer2(), &[LabelTag::new(4, 0), LabelTag::new(0x10, 13)]);
        assert_eq!(bin.labels(), b"PID_X\0MPID_X\0PID_X\0MPID_X\0");
        assert_eq!(bin.read_u16(0xC)?, 0x1234);
        assert_eq!(bin.read_u16(0x18)?, 1);
        assert_eq!(bin.get_label(bin.read_u32(0x14)?)?, "MPID_X");

        Ok(())
    }

    #[test]
    fn append_rejects_out_of_range_ids() {
        let mut bin = BinFile::from_parts(vec![0, 0, 0, 0], vec![], vec![], vec![]);
        let layout = TableLayout::builder()
            .offset(4)
            .count(IntField::new(0, IntWidth::U32))
            .row_size(4)
            .id(IntField::new(0, IntWidth::U8))
            .build();

        assert!(matches!(
            bin.append_rows(&layout, &[NewEntry::new(256, "X")]),
            Err(Error::Table(fates_table::error::Error::Range { .. }))
        ));
    }

    #[test]
    fn append_rejects_bad_arguments() {
        let mut bin = single_row();

        assert!(matches!(
            bin.append_rows(&single_row_layout(), &[]),
            Err(Error::InvalidArgument(_))
        ));

        let mut layout = single_row_layout();
        layout.row_size = None;
        assert!(matches!(
            bin.append_rows(&layout, &[NewEntry::new(0, "B")]),
            Err(Error::InvalidArgument(_))
        ));

        assert_eq!(bin, single_row());
    }

    #[test]
    fn append_rejects_counts_past_the_data() {
        let mut bin = single_row();
        bin.data[0] = 0xFF;
        bin.data[3] = 0xFF;
        let before = bin.clone();

        assert!(matches!(
            bin.append_rows(&single_row_layout(), &[NewEntry::new(0, "B")]),
            Err(Error::Format(FormatError::OutOfBounds { offset: 4, .. }))
        ));
        assert_eq!(bin, before);
    }

    #[test]
    fn splice_checks_blocks() {
        let mut bin = single_row();
        let relocation = Relocation::new(&bin, vec![(4, 4)], 0, 0);

        assert!(matches!(
            bin.splice(&relocation, vec![vec![0; 8]], vec![], vec![], vec![]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            bin.splice(&relocation, vec![vec![0; 4]], vec![4], vec![], vec![]),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(bin, single_row());
    }

    #[test]
    fn int_fields() -> Result<()> {
        let mut bin = BinFile::from_parts(vec![0; 4], vec![], vec![], vec![]);

        bin.write_int(IntField::new(1, IntWidth::U16), 0xBEEF)?;
        assert_eq!(bin.data(), &[0x00, 0xEF, 0xBE, 0x00]);
        assert_eq!(bin.read_int(IntField::new(1, IntWidth::U16))?, 0xBEEF);
        assert_eq!(bin.read_int(IntField::new(2, IntWidth::U8))?, 0xBE);

        assert!(bin.write_int(IntField::new(0, IntWidth::U8), 0x100).is_err());
        assert!(bin.write_int(IntField::new(2, IntWidth::U32), 1).is_err());

        Ok(())
    }
}
