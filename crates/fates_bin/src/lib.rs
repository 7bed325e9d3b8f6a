//! This library handles reading, editing and creating the relocatable **.bin** containers used by
//! *Fire Emblem Fates* for its game resource tables.
//!
//! # Bin Container Format
//!
//! A container is a header followed by four regions. Any `u32` in the data region that holds an
//! offset is listed in pointer-1, so the regions can be rebuilt and everything they point to can
//! be moved around.
//!
//! ## File Structure
//!
//! | Offset (bytes) | Field              | Description                                              |
//! |----------------|--------------------|----------------------------------------------------------|
//! | 0x0000         | Size               | 4 bytes: Total size of the file, header included         |
//! | 0x0004         | Data Length        | 4 bytes: Size of the data region                         |
//! | 0x0008         | Pointer-1 Count    | 4 bytes: Number of pointer-1 entries                     |
//! | 0x000C         | Pointer-2 Count    | 4 bytes: Number of pointer-2 entries                     |
//! | 0x0010         | Reserved           | 16 bytes: Zero on write                                  |
//! | 0x0020         | Data               | Table rows, counts and sub tables                        |
//!
//! All offsets stored in the regions are relative to the end of the header.
//!
//! ### Data
//!
//! Opaque bytes. Tables are arrays of fixed size rows, preceded somewhere by a row count.
//!
//! ### Pointer-1
//!
//! `4 × count` bytes: offsets into the data region of every `u32` that holds an offset. The offset
//! either addresses more data or a label. The value `0` stands for the label `NULL` and is never
//! stored in the label pool.
//!
//! ### Pointer-2
//!
//! `8 × count` bytes of `(target, label)` pairs tagging a data offset with a label. The label
//! offset is relative to the start of the label pool.
//!
//! ### Labels
//!
//! The remainder of the file: NUL terminated Shift-JIS strings. The first label starts at
//! `data length + 4 × pointer-1 count + 8 × pointer-2 count`, the label base.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.bin`
//! - **Endianness**: Little-endian for all multi-byte integers
//! - **Label encoding**: Shift-JIS
//!

pub mod castle_join;
pub mod error;
pub mod extract;
pub mod format;
pub mod fst;
pub mod gamedata;
pub mod labels;
pub mod read;
pub mod relocate;
pub mod types;
pub mod write;

pub use gamedata::{CharacterAppend, GameData, TableKind};
pub use read::{trim, BinFile};
pub use relocate::{IntField, IntWidth, LabelField, NewEntry, TableLayout};
