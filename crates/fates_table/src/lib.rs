//! Typed model for the resource tables stored in *Fire Emblem Fates* `.bin` files.
//!
//! Tables in these files are arrays of fixed-size records. This crate describes
//! those records without knowing anything about the container they live in:
//!
//! - [`cell`]: fixed-width integers (`u8`, `s8`, `u16`, `s16`, `u32`, `s32`) and
//!   4 byte label references, with range checking on construction.
//! - [`schema`]: the ordered list of `(name, type, format)` fields of a row. The
//!   same schema drives the binary layout and the tab separated text layout.
//! - [`row`] and [`table`]: dynamically typed rows and tables of one schema.
//! - [`record`]: statically typed structs generated with [`record!`].
//!
//! ## Field types
//!
//! | Type                 | Size (bytes)       | Text columns     |
//! |----------------------|--------------------|------------------|
//! | `u8` / `s8`          | 1                  | 1                |
//! | `u16` / `s16`        | 2                  | 1                |
//! | `u32` / `s32`        | 4                  | 1                |
//! | label                | 4 (pointer)        | 1                |
//! | array of `N` cells   | `N` × cell size    | `N`              |
//! | dictionary           | keys × cell size   | one per key      |
//! | nested row           | 4 (pointer)        | nested row width |
//!
//! Arrays and dictionaries have a fixed arity. Their elements can be replaced but
//! they can never grow or shrink.
//!

pub mod cell;
pub mod error;
pub mod record;
pub mod row;
pub mod schema;
#[cfg(feature = "serde")]
mod serde;
pub mod table;
pub mod value;

pub use cell::{Cell, CellType, Label};
pub use record::{KeySet, Keyed, Record};
pub use row::Row;
pub use schema::{FieldDef, FieldType, Format, Schema};
pub use table::Table;
pub use value::{RawValue, Value};
