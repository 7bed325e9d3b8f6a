//! Field values, including the fixed-arity collections.

use crate::cell::{Cell, CellType};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::FieldType;

/// The value held by one field of a row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Cell(Cell),
    Array(FixedArray),
    Dict(FixedDict),
    Row(Box<Row>),
}

impl Value {
    /// Whether this value has the shape declared by `ty`
    pub fn conforms_to(&self, ty: &FieldType) -> bool {
        match (self, ty) {
            (Value::Cell(cell), FieldType::Cell(ty)) => cell.cell_type() == *ty,
            (Value::Array(array), FieldType::Array(ty, len)) => {
                array.cell_type() == *ty && array.len() == *len
            }
            (Value::Dict(dict), FieldType::Dict(ty, keys)) => {
                dict.cell_type() == *ty && dict.keys() == *keys
            }
            (Value::Row(row), FieldType::Row(schema)) => row.schema() == *schema,
            _ => false,
        }
    }

    /// Zeroed value of a field type, nested rows included
    pub fn zero(ty: &FieldType) -> Value {
        match ty {
            FieldType::Cell(ty) => Value::Cell(Cell::zero(*ty)),
            FieldType::Array(ty, len) => Value::Array(FixedArray::filled(*ty, *len)),
            FieldType::Dict(ty, keys) => Value::Dict(FixedDict::filled(*ty, keys)),
            FieldType::Row(schema) => Value::Row(Box::new(Row::zeroed(schema))),
        }
    }

    pub fn as_cell(&self) -> Option<&Cell> {
        match self {
            Value::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            Value::Row(row) => Some(row),
            _ => None,
        }
    }

    /// Append the primitive cells of this value in declaration order
    pub(crate) fn flatten_into(&self, cells: &mut Vec<Cell>) {
        match self {
            Value::Cell(cell) => cells.push(cell.clone()),
            Value::Array(array) => cells.extend(array.iter().cloned()),
            Value::Dict(dict) => cells.extend(dict.values().iter().cloned()),
            Value::Row(row) => cells.extend(row.flatten()),
        }
    }
}

impl From<Cell> for Value {
    fn from(value: Cell) -> Self {
        Value::Cell(value)
    }
}

impl From<Row> for Value {
    fn from(value: Row) -> Self {
        Value::Row(Box::new(value))
    }
}

fn check_type(ty: CellType, cell: &Cell) -> Result<()> {
    if cell.cell_type() == ty {
        Ok(())
    } else {
        Err(Error::StructureMismatch(format!(
            "expected a {ty} cell, got {}",
            cell.cell_type()
        )))
    }
}

/// A fixed-length sequence of cells of one type.
///
/// The length is set at construction and never changes: elements can be read and
/// replaced, but not added or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedArray {
    ty: CellType,
    cells: Box<[Cell]>,
}

impl FixedArray {
    pub fn new(ty: CellType, cells: Vec<Cell>) -> Result<Self> {
        for cell in &cells {
            check_type(ty, cell)?;
        }
        Ok(FixedArray {
            ty,
            cells: cells.into_boxed_slice(),
        })
    }

    pub(crate) fn from_cells_unchecked(ty: CellType, cells: Vec<Cell>) -> Self {
        FixedArray {
            ty,
            cells: cells.into_boxed_slice(),
        }
    }

    pub fn filled(ty: CellType, len: usize) -> Self {
        FixedArray {
            ty,
            cells: vec![Cell::zero(ty); len].into_boxed_slice(),
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    pub fn set(&mut self, index: usize, cell: Cell) -> Result<()> {
        check_type(self.ty, &cell)?;
        let len = self.cells.len();
        let slot = self
            .cells
            .get_mut(index)
            .ok_or_else(|| Error::UnknownField(format!("[{index}] of array with length {len}")))?;
        *slot = cell;
        Ok(())
    }

    /// Replace every element at once; the new contents must have the same length.
    pub fn assign(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.cells.len() {
            return Err(Error::Unsupported(format!(
                "array length is fixed at {}, cannot hold {} cells",
                self.cells.len(),
                cells.len()
            )));
        }
        *self = FixedArray::new(self.ty, cells)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FixedArray {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One cell for each key of a fixed key set
#[derive(Debug, Clone, PartialEq)]
pub struct FixedDict {
    ty: CellType,
    keys: &'static [&'static str],
    cells: Box<[Cell]>,
}

impl FixedDict {
    /// Build a dictionary from cells given in key order
    pub fn new(ty: CellType, keys: &'static [&'static str], cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != keys.len() {
            return Err(Error::StructureMismatch(format!(
                "expected {} values for keys {keys:?}, got {}",
                keys.len(),
                cells.len()
            )));
        }
        for cell in &cells {
            check_type(ty, cell)?;
        }
        Ok(FixedDict {
            ty,
            keys,
            cells: cells.into_boxed_slice(),
        })
    }

    pub(crate) fn from_cells_unchecked(
        ty: CellType,
        keys: &'static [&'static str],
        cells: Vec<Cell>,
    ) -> Self {
        FixedDict {
            ty,
            keys,
            cells: cells.into_boxed_slice(),
        }
    }

    pub fn filled(ty: CellType, keys: &'static [&'static str]) -> Self {
        FixedDict {
            ty,
            keys,
            cells: vec![Cell::zero(ty); keys.len()].into_boxed_slice(),
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.ty
    }

    pub fn keys(&self) -> &'static [&'static str] {
        self.keys
    }

    /// Cells in key order
    pub fn values(&self) -> &[Cell] {
        &self.cells
    }

    fn position(&self, key: &str) -> Result<usize> {
        self.keys
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| Error::UnknownField(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<&Cell> {
        self.position(key).map(|i| &self.cells[i])
    }

    pub fn set(&mut self, key: &str, cell: Cell) -> Result<()> {
        check_type(self.ty, &cell)?;
        let index = self.position(key)?;
        self.cells[index] = cell;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Cell)> + '_ {
        self.keys.iter().copied().zip(self.cells.iter())
    }

    /// Replace every value at once; the new contents must cover exactly the key set.
    pub fn assign(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.keys.len() {
            return Err(Error::Unsupported(format!(
                "dictionary keys are fixed to {:?}, cannot hold {} values",
                self.keys,
                cells.len()
            )));
        }
        *self = FixedDict::new(self.ty, self.keys, cells)?;
        Ok(())
    }
}

/// Untyped input for [`Row::from_raw`]
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Int(i64),
    Text(String),
    List(Vec<RawValue>),
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(value: Vec<T>) -> Self {
        RawValue::List(value.into_iter().map(Into::into).collect())
    }
}
