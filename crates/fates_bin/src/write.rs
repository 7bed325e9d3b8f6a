//! Types for writing bin containers
//!

use binrw::BinWrite;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Cursor, Seek, Write};
use tracing::{instrument, Level};

use crate::error::{Error, Result};
use crate::read::BinFile;
use crate::types::{BinHeader, HEADER_SIZE};

impl BinFile {
    /// Header describing the current regions
    pub fn header(&self) -> Result<BinHeader> {
        let size = u32::try_from(HEADER_SIZE + self.body_len()).map_err(|_| {
            Error::InvalidArgument(format!(
                "container of {} bytes does not fit a 32 bit size",
                HEADER_SIZE + self.body_len()
            ))
        })?;

        Ok(BinHeader {
            size,
            data_length: self.data.len() as u32,
            pointer1_count: self.pointer1.len() as u32,
            pointer2_count: self.pointer2.len() as u32,
            ..Default::default()
        })
    }

    /// Serialized size of the container
    pub fn len(&self) -> usize {
        HEADER_SIZE + self.body_len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
            && self.pointer1.is_empty()
            && self.pointer2.is_empty()
            && self.labels.is_empty()
    }

    /// Write the header followed by the data, pointer-1, pointer-2 and label regions
    #[instrument(skip_all, err, fields(size = self.len()))]
    pub fn write<W: Write + Seek>(&self, mut writer: W) -> Result<()> {
        self.header()?.write(&mut writer)?;
        writer.write_all(&self.data)?;
        for location in &self.pointer1 {
            writer.write_u32::<LittleEndian>(*location)?;
        }
        for tag in &self.pointer2 {
            tag.write(&mut writer)?;
        }
        writer.write_all(&self.labels)?;
        Ok(())
    }

    #[instrument(skip_all, err, ret(level = Level::TRACE), fields(size = self.len()))]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.len()));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::{assert_eq, assert_str_eq};
    use tracing_test::traced_test;

    use crate::error::Result;
    use crate::read::BinFile;
    use crate::types::LabelTag;

    #[traced_test]
    #[test]
    fn empty_write() -> Result<()> {
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x20, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let actual = BinFile::new().to_bytes()?;
        assert_str_eq!(format!("{:02X?}", actual), format!("{:02X?}", expected));

        Ok(())
    }

    #[traced_test]
    #[test]
    fn regions_write() -> Result<()> {
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x3C, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // data
            0x01, 0x00, 0x00, 0x00,
            0x14, 0x00, 0x00, 0x00,
            // pointer-1
            0x04, 0x00, 0x00, 0x00,
            // pointer-2
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            // labels
            b'T', b'B', b'L', 0x00,
            b'F', b'O', b'O', 0x00,
        ];

        let bin = BinFile::from_parts(
            vec![1, 0, 0, 0, 0x14, 0, 0, 0],
            vec![4],
            vec![LabelTag::new(0, 0)],
            b"TBL\0FOO\0".to_vec(),
        );
        assert_eq!(bin.label_base(), 0x14);
        assert_eq!(bin.get_label(0x14)?, "TBL");

        let actual = bin.to_bytes()?;
        assert_str_eq!(format!("{:02X?}", actual), format!("{:02X?}", expected));
        assert_eq!(BinFile::parse(&actual)?, bin);
        assert_eq!(BinFile::parse(&actual)?.to_bytes()?, actual);

        Ok(())
    }
}
