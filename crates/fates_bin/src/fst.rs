//! `fst.bin`: the file list of a DLC romfs.

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::labels::LabelPool;
use crate::read::BinFile;

/// File name of the list inside the romfs; it never lists itself
pub const FILE_NAME: &str = "fst.bin";

/// Build a file list container.
///
/// The data region is a `u32` count followed by one label pointer per path.
/// Paths are stored in the given order, `/` separated and relative to the romfs
/// root.
#[instrument(skip_all, err, fields(paths = paths.len()))]
pub fn build<S: AsRef<str>>(paths: &[S]) -> Result<BinFile> {
    let count = paths.len() as u32;
    let base = 4 + 8 * count;

    let mut data = Vec::with_capacity(4 + 4 * paths.len());
    let mut pool = LabelPool::new();
    data.write_u32::<LittleEndian>(count)?;
    for path in paths {
        data.write_u32::<LittleEndian>(base + pool.push(path.as_ref())?)?;
    }

    let pointer1 = (0..count).map(|i| 4 + 4 * i).collect();
    debug!(labels = pool.len(), "built file list");
    Ok(BinFile::from_parts(data, pointer1, vec![], pool.into_bytes()))
}

#[cfg(test)]
mod test {
    use pretty_assertions::{assert_eq, assert_str_eq};

    use crate::error::Result;
    use crate::fst::build;

    #[test]
    fn file_list() -> Result<()> {
        let bin = build(&["a.bin", "data/b.bin"])?;

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x45, 0x00, 0x00, 0x00,
            0x0C, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // data
            0x02, 0x00, 0x00, 0x00,
            0x14, 0x00, 0x00, 0x00,
            0x1A, 0x00, 0x00, 0x00,
            // pointer-1
            0x04, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x00, 0x00,
            // labels
            b'a', b'.', b'b', b'i', b'n', 0x00,
            b'd', b'a', b't', b'a', b'/', b'b', b'.', b'b', b'i', b'n', 0x00,
        ];

        let actual = bin.to_bytes()?;
        assert_str_eq!(format!("{:02X?}", actual), format!("{:02X?}", expected));
        assert_eq!(bin.get_label(0x1A)?, "data/b.bin");

        Ok(())
    }

    #[test]
    fn empty_list() -> Result<()> {
        let bin = build::<&str>(&[])?;

        assert_eq!(bin.data(), &[0, 0, 0, 0]);
        assert!(bin.pointer1().is_empty());
        assert!(bin.labels().is_empty());

        Ok(())
    }
}
