//! Types for reading bin containers
//!

use binrw::BinRead;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::ops::Range;
use tracing::{debug, instrument};

use crate::error::{FormatError, Result};
use crate::labels::decode_label;
use crate::types::{BinHeader, LabelTag, HEADER_SIZE};
use fates_table::Label;

/// Absolute label offset to label text, as found through pointer-1
pub type LabelMap = HashMap<u32, String>;

/// An in-memory bin container
///
/// The container owns its four regions: the data blob, the pointer-1 list of data
/// offsets that hold a relocatable `u32`, the pointer-2 list of labelled data
/// offsets and the pool of NUL terminated Shift-JIS labels.
///
/// ```no_run
/// fn list_labels(path: &str) -> fates_bin::error::Result<()> {
///     let bin = fates_bin::BinFile::parse(&std::fs::read(path)?)?;
///
///     for (offset, label) in bin.label_map()? {
///         println!("{offset:#x}: {label}");
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinFile {
    pub(crate) data: Vec<u8>,
    pub(crate) pointer1: Vec<u32>,
    pub(crate) pointer2: Vec<LabelTag>,
    pub(crate) labels: Vec<u8>,
}

impl BinFile {
    /// An empty container
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        data: Vec<u8>,
        pointer1: Vec<u32>,
        pointer2: Vec<LabelTag>,
        labels: Vec<u8>,
    ) -> Self {
        BinFile {
            data,
            pointer1,
            pointer2,
            labels,
        }
    }

    /// Read a whole container from `reader`
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Parse a container, which must span exactly the whole of `bytes`.
    #[instrument(skip_all, err, fields(len = bytes.len()))]
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            }
            .into());
        }

        let header = BinHeader::read(&mut Cursor::new(bytes))?;
        if header.size as usize != bytes.len() {
            return Err(FormatError::SizeMismatch {
                declared: header.size,
                actual: bytes.len(),
            }
            .into());
        }

        let body = &bytes[HEADER_SIZE..];
        let data_length = header.data_length as usize;
        let pointers_end = data_length as u64
            + header.pointer1_count as u64 * 4
            + header.pointer2_count as u64 * LabelTag::SIZE as u64;
        if pointers_end > body.len() as u64 {
            return Err(FormatError::Truncated {
                expected: HEADER_SIZE + pointers_end as usize,
                actual: bytes.len(),
            }
            .into());
        }
        let pointers_end = pointers_end as usize;

        let mut reader = Cursor::new(&body[data_length..pointers_end]);
        let pointer1 = (0..header.pointer1_count)
            .map(|_| reader.read_u32::<LittleEndian>())
            .collect::<std::io::Result<Vec<_>>>()?;
        let pointer2 = (0..header.pointer2_count)
            .map(|_| LabelTag::read(&mut reader))
            .collect::<binrw::BinResult<Vec<_>>>()?;

        debug!(
            data = data_length,
            pointer1 = pointer1.len(),
            pointer2 = pointer2.len(),
            labels = body.len() - pointers_end,
            "parsed bin regions"
        );

        Ok(BinFile {
            data: body[..data_length].to_vec(),
            pointer1,
            pointer2,
            labels: body[pointers_end..].to_vec(),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pointer1(&self) -> &[u32] {
        &self.pointer1
    }

    pub fn pointer2(&self) -> &[LabelTag] {
        &self.pointer2
    }

    /// Raw bytes of the label pool
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Absolute offset of the first label: everything before it is data and pointers
    pub fn label_base(&self) -> u32 {
        (self.data.len() + self.pointer1.len() * 4 + self.pointer2.len() * LabelTag::SIZE) as u32
    }

    /// Serialized size of the container, header excluded
    pub fn body_len(&self) -> usize {
        self.label_base() as usize + self.labels.len()
    }

    pub(crate) fn span(&self, offset: u32, len: usize) -> Result<Range<usize>> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(FormatError::OutOfBounds {
                offset,
                len,
                size: self.data.len(),
            }
            .into()),
        }
    }

    pub fn read_u8(&self, offset: u32) -> Result<u8> {
        let span = self.span(offset, 1)?;
        Ok(self.data[span.start])
    }

    pub fn read_u16(&self, offset: u32) -> Result<u16> {
        let span = self.span(offset, 2)?;
        Ok(LittleEndian::read_u16(&self.data[span]))
    }

    pub fn read_u32(&self, offset: u32) -> Result<u32> {
        let span = self.span(offset, 4)?;
        Ok(LittleEndian::read_u32(&self.data[span]))
    }

    pub fn write_u8(&mut self, offset: u32, value: u8) -> Result<()> {
        let span = self.span(offset, 1)?;
        self.data[span.start] = value;
        Ok(())
    }

    pub fn write_u16(&mut self, offset: u32, value: u16) -> Result<()> {
        let span = self.span(offset, 2)?;
        LittleEndian::write_u16(&mut self.data[span], value);
        Ok(())
    }

    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<()> {
        let span = self.span(offset, 4)?;
        LittleEndian::write_u32(&mut self.data[span], value);
        Ok(())
    }

    /// Encoded bytes of the label starting `relative` bytes into the pool, without its terminator
    pub(crate) fn label_bytes(&self, relative: u32) -> Option<&[u8]> {
        let rest = self.labels.get(relative as usize..)?;
        let end = rest.iter().position(|b| *b == 0)?;
        Some(&rest[..end])
    }

    /// Text of the label a pointer refers to.
    ///
    /// Offset zero is the `NULL` sentinel.
    pub fn get_label(&self, offset: u32) -> Result<String> {
        if offset == 0 {
            return Ok(Label::NULL.to_string());
        }

        let base = self.label_base();
        if offset < base {
            return Err(FormatError::InvalidLabel(offset).into());
        }

        self.label_bytes(offset - base)
            .map(decode_label)
            .ok_or_else(|| FormatError::UnterminatedLabel(offset).into())
    }

    /// Text of a label referenced by a pointer-2 entry
    pub fn tag_label(&self, tag: &LabelTag) -> Result<String> {
        self.label_bytes(tag.label)
            .map(decode_label)
            .ok_or_else(|| FormatError::UnterminatedLabel(self.label_base() + tag.label).into())
    }

    /// Every label referenced through pointer-1, keyed by absolute offset.
    ///
    /// Offset zero always maps to `NULL`.
    #[instrument(skip(self), err)]
    pub fn label_map(&self) -> Result<LabelMap> {
        let base = self.label_base();
        let mut labels = LabelMap::with_capacity(self.pointer1.len() + 1);
        labels.insert(0, Label::NULL.to_string());

        for location in &self.pointer1 {
            let target = self.read_u32(*location)?;
            if target < base || labels.contains_key(&target) {
                continue;
            }
            labels.insert(target, self.get_label(target)?);
        }

        debug!(count = labels.len(), "collected labels");
        Ok(labels)
    }
}

/// Cut off any padding that follows the end declared in the header
pub fn trim(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let size = LittleEndian::read_u32(&bytes[..4]);
    bytes.get(..size as usize).ok_or_else(|| {
        FormatError::SizeMismatch {
            declared: size,
            actual: bytes.len(),
        }
        .into()
    })
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use crate::error::{Error, FormatError, Result};
    use crate::read::{trim, BinFile};
    use crate::types::LabelTag;

    #[rustfmt::skip]
    fn sample() -> Vec<u8> {
        vec![
            // header
            0x44, 0x00, 0x00, 0x00,
            0x0C, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // data: count, two label pointers
            0x02, 0x00, 0x00, 0x00,
            0x1C, 0x00, 0x00, 0x00,
            0x1E, 0x00, 0x00, 0x00,
            // pointer-1
            0x04, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            // pointer-2
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            // labels
            b'A', 0x00, b'B', 0x00, b'T', b'B', b'L', 0x00,
        ]
    }

    #[traced_test]
    #[test]
    fn parse_regions() -> Result<()> {
        let bin = BinFile::parse(&sample())?;

        assert_eq!(bin.data(), &[2, 0, 0, 0, 0x1C, 0, 0, 0, 0x1E, 0, 0, 0]);
        assert_eq!(bin.pointer1(), &[4, 8]);
        assert_eq!(bin.pointer2(), &[LabelTag::new(0, 4)]);
        assert_eq!(bin.labels(), b"A\0B\0TBL\0");
        assert_eq!(bin.label_base(), 0x1C);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn labels() -> Result<()> {
        let bin = BinFile::parse(&sample())?;

        assert_eq!(bin.get_label(0)?, "NULL");
        assert_eq!(bin.get_label(0x1C)?, "A");
        assert_eq!(bin.get_label(0x1E)?, "B");
        assert_eq!(bin.tag_label(&bin.pointer2()[0])?, "TBL");
        assert!(matches!(
            bin.get_label(8),
            Err(Error::Format(FormatError::InvalidLabel(8)))
        ));
        assert!(matches!(
            bin.get_label(0x40),
            Err(Error::Format(FormatError::UnterminatedLabel(0x40)))
        ));

        let map = bin.label_map()?;
        assert_eq!(map.len(), 3);
        assert_eq!(map[&0], "NULL");
        assert_eq!(map[&0x1E], "B");

        Ok(())
    }

    #[test]
    fn size_must_match_input() {
        let mut input = sample();
        input[0] = 0x50;

        assert!(matches!(
            BinFile::parse(&input),
            Err(Error::Format(FormatError::SizeMismatch {
                declared: 0x50,
                actual: 0x44
            }))
        ));
        assert!(matches!(
            BinFile::parse(&input[..0x10]),
            Err(Error::Format(FormatError::Truncated { .. }))
        ));
    }

    #[test]
    fn regions_must_fit() {
        let mut input = sample();
        input[8] = 0x20;

        assert!(matches!(
            BinFile::parse(&input),
            Err(Error::Format(FormatError::Truncated { .. }))
        ));
    }

    #[test]
    fn trim_padding() -> Result<()> {
        let mut input = sample();
        input.extend_from_slice(&[0; 0x10]);

        assert!(BinFile::parse(&input).is_err());
        assert_eq!(trim(&input)?, &sample()[..]);
        assert!(BinFile::parse(trim(&input)?).is_ok());

        Ok(())
    }

    #[test]
    fn unterminated_labels_are_rejected() -> Result<()> {
        let mut input = sample();
        input.pop();
        input[0] = 0x43;

        let bin = BinFile::parse(&input)?;
        assert_eq!(bin.get_label(0x1C)?, "A");
        assert!(matches!(
            bin.tag_label(&bin.pointer2()[0]),
            Err(Error::Format(FormatError::UnterminatedLabel(_)))
        ));

        Ok(())
    }
}
