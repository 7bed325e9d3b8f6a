//! Ordered row schemas shared by the binary and text codecs.

use crate::cell::CellType;
use crate::error::{Error, Result};

/// How a field is written in the tab separated text form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Str,
    Hex,
}

/// Shape of one field in a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A single primitive cell
    Cell(CellType),

    /// A fixed number of cells of one type
    Array(CellType, usize),

    /// One cell of the same type for each of a fixed set of keys
    Dict(CellType, &'static [&'static str]),

    /// Another row, reached through a 4 byte pointer
    Row(&'static Schema),
}

impl FieldType {
    /// Number of bytes the field occupies inside its row
    pub const fn size(&self) -> usize {
        match self {
            FieldType::Cell(ty) => ty.size(),
            FieldType::Array(ty, len) => ty.size() * *len,
            FieldType::Dict(ty, keys) => ty.size() * keys.len(),
            FieldType::Row(_) => 4,
        }
    }

    /// Number of primitive cells the field flattens to
    pub fn text_width(&self) -> usize {
        match self {
            FieldType::Cell(_) => 1,
            FieldType::Array(_, len) => *len,
            FieldType::Dict(_, keys) => keys.len(),
            FieldType::Row(schema) => schema.text_width(),
        }
    }
}

/// A named field of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
    pub format: Format,
}

/// The ordered list of fields making up a row.
///
/// Schemas are usually declared as `static` values or generated by the
/// [`record!`](crate::record!) macro.
///
/// ```
/// use fates_table::cell::CellType;
/// use fates_table::schema::{FieldDef, FieldType, Format, Schema};
///
/// static ARMY: Schema = Schema {
///     name: "Army",
///     fields: &[
///         FieldDef { name: "id", ty: FieldType::Cell(CellType::U8), format: Format::Str },
///         FieldDef { name: "bid", ty: FieldType::Cell(CellType::Label), format: Format::Str },
///     ],
/// };
///
/// assert_eq!(ARMY.size(), 5);
/// assert_eq!(ARMY.field_names().collect::<Vec<_>>(), ["id", "bid"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl Schema {
    /// Size of one row in bytes
    pub fn size(&self) -> usize {
        self.fields.iter().map(|f| f.ty.size()).sum()
    }

    /// Number of primitive cells a row flattens to
    pub fn text_width(&self) -> usize {
        self.fields.iter().map(|f| f.ty.text_width()).sum()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    pub fn field(&self, name: &str) -> Result<&FieldDef> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    /// Byte offset of a field from the start of the row
    pub fn offset_of(&self, name: &str) -> Result<usize> {
        let index = self.index_of(name)?;
        Ok(self.fields[..index].iter().map(|f| f.ty.size()).sum())
    }

    /// Whether no field is a nested row
    pub fn is_flat(&self) -> bool {
        !self
            .fields
            .iter()
            .any(|f| matches!(f.ty, FieldType::Row(_)))
    }

    /// Column names of the flattened text form
    pub fn header(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.text_width());
        self.push_columns("", &mut columns);
        columns
    }

    fn push_columns(&self, prefix: &str, columns: &mut Vec<String>) {
        for field in self.fields {
            let name = format!("{prefix}{}", field.name);
            match field.ty {
                FieldType::Cell(_) => columns.push(name),
                FieldType::Array(_, len) => columns.extend((0..len).map(|i| format!("{name}[{i}]"))),
                FieldType::Dict(_, keys) => {
                    columns.extend(keys.iter().map(|key| format!("{name}.{key}")))
                }
                FieldType::Row(schema) => schema.push_columns(&format!("{name}."), columns),
            }
        }
    }
}
