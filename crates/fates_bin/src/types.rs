//! Base types for structure of bin file.

use binrw::{BinRead, BinWrite};

/// Size of [`BinHeader`] on disk
pub const HEADER_SIZE: usize = 0x20;

/// Bin file header
///
/// Four region sizes followed by 16 reserved bytes, which are always written as zero.
/// All data is stored in little endian format
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[brw(little)]
pub struct BinHeader {
    /// Total size of the file, header included
    pub size: u32,

    /// Size of the data region
    pub data_length: u32,

    /// Number of entries in the pointer-1 region
    pub pointer1_count: u32,

    /// Number of entries in the pointer-2 region
    pub pointer2_count: u32,

    /// Unused, zero on write
    pub reserved: [u8; 16],
}

/// Pointer-2 entry
///
/// Tags a location in the data region with a label, without an in-place pointer.
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[brw(little)]
pub struct LabelTag {
    /// Offset into the data region
    pub target: u32,

    /// Offset of the label from the start of the label pool
    pub label: u32,
}

impl LabelTag {
    pub const SIZE: usize = 8;

    pub fn new(target: u32, label: u32) -> Self {
        LabelTag { target, label }
    }
}
