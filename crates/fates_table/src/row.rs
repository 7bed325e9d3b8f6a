//! Rows: ordered, schema-checked field values and their text form.

use serde_json::{Map, Number, Value as JsonValue};
use tracing::trace;

use crate::cell::{Cell, CellType};
use crate::error::{Error, Result};
use crate::schema::{FieldDef, FieldType, Format, Schema};
use crate::value::{FixedArray, FixedDict, RawValue, Value};

/// One record: a value for every field of its schema, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: &'static Schema,
    values: Vec<Value>,
}

impl Row {
    /// Build a row, checking that `values` matches `schema` in count and shape.
    pub fn new(schema: &'static Schema, values: Vec<Value>) -> Result<Row> {
        if values.len() != schema.fields.len() {
            return Err(Error::StructureMismatch(format!(
                "{} has {} fields, got {} values",
                schema.name,
                schema.fields.len(),
                values.len()
            )));
        }

        for (field, value) in schema.fields.iter().zip(&values) {
            if !value.conforms_to(&field.ty) {
                return Err(Error::StructureMismatch(format!(
                    "field {} of {} expects {:?}",
                    field.name, schema.name, field.ty
                )));
            }
        }

        Ok(Row { schema, values })
    }

    /// Build a row from values already known to match the schema.
    #[doc(hidden)]
    pub fn from_values_unchecked(schema: &'static Schema, values: Vec<Value>) -> Row {
        debug_assert_eq!(values.len(), schema.fields.len());
        Row { schema, values }
    }

    /// A row with every cell zeroed and every label `NULL`
    pub fn zeroed(schema: &'static Schema) -> Row {
        Row {
            schema,
            values: schema.fields.iter().map(|f| Value::zero(&f.ty)).collect(),
        }
    }

    /// Build a row from untyped values, one per field.
    ///
    /// Text is parsed with the field's output format, lists fill arrays,
    /// dictionaries (in key order) and nested rows.
    pub fn from_raw(schema: &'static Schema, raw: Vec<RawValue>) -> Result<Row> {
        if raw.len() != schema.fields.len() {
            return Err(Error::StructureMismatch(format!(
                "{} has {} fields, got {} values",
                schema.name,
                schema.fields.len(),
                raw.len()
            )));
        }

        let values = schema
            .fields
            .iter()
            .zip(raw)
            .map(|(field, raw)| value_from_raw(field, raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Row { schema, values })
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Fail unless this row was built from `schema`
    pub fn expect_schema(&self, schema: &Schema) -> Result<()> {
        if self.schema == schema {
            Ok(())
        } else {
            Err(Error::StructureMismatch(format!(
                "expected a {} row, got {}",
                schema.name, self.schema.name
            )))
        }
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// The primitive cell of a field
    pub fn cell(&self, name: &str) -> Result<&Cell> {
        self.get(name)?.as_cell().ok_or_else(|| {
            Error::StructureMismatch(format!("field {name} is not a single cell"))
        })
    }

    /// Replace the value of a field.
    ///
    /// Collections keep their declared arity, so a replacement array or dictionary
    /// of a different size is rejected.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.schema.index_of(name)?;
        let field = &self.schema.fields[index];
        let value = value.into();

        if !value.conforms_to(&field.ty) {
            let resized = match (&value, &field.ty) {
                (Value::Array(array), FieldType::Array(ty, len)) => {
                    array.cell_type() == *ty && array.len() != *len
                }
                (Value::Dict(dict), FieldType::Dict(ty, keys)) => {
                    dict.cell_type() == *ty && dict.keys().len() != keys.len()
                }
                _ => false,
            };
            return Err(if resized {
                Error::Unsupported(format!("field {name} has a fixed size"))
            } else {
                Error::StructureMismatch(format!("field {name} expects {:?}", field.ty))
            });
        }

        self.values[index] = value;
        Ok(())
    }

    /// Primitive cells in schema order, recursing into collections and nested rows
    pub fn flatten(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(self.schema.text_width());
        for value in &self.values {
            value.flatten_into(&mut cells);
        }
        cells
    }

    /// Tab separated text form, each cell written with its field's format
    pub fn to_text(&self) -> String {
        let mut columns = Vec::with_capacity(self.schema.text_width());
        self.push_columns(&mut columns);
        columns.join("\t")
    }

    fn push_columns(&self, columns: &mut Vec<String>) {
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            match value {
                Value::Cell(cell) => columns.push(cell.to_text(field.format)),
                Value::Array(array) => {
                    columns.extend(array.iter().map(|c| c.to_text(field.format)))
                }
                Value::Dict(dict) => {
                    columns.extend(dict.values().iter().map(|c| c.to_text(field.format)))
                }
                Value::Row(row) => row.push_columns(columns),
            }
        }
    }

    /// Parse the tab separated text form produced by [`Row::to_text`]
    pub fn from_text(schema: &'static Schema, line: &str) -> Result<Row> {
        let line = line.trim_end_matches(['\r', '\n']);
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != schema.text_width() {
            return Err(Error::StructureMismatch(format!(
                "{} rows have {} columns, got {}",
                schema.name,
                schema.text_width(),
                columns.len()
            )));
        }

        trace!(schema = schema.name, columns = columns.len(), "parsing row");
        Row::parse_columns(schema, &mut columns.into_iter())
    }

    fn parse_columns<'a>(
        schema: &'static Schema,
        columns: &mut impl Iterator<Item = &'a str>,
    ) -> Result<Row> {
        let mut values = Vec::with_capacity(schema.fields.len());
        for field in schema.fields {
            let mut next = |ty: CellType| -> Result<Cell> {
                let text = columns.next().ok_or_else(|| {
                    Error::StructureMismatch(format!("missing column for {}", field.name))
                })?;
                Cell::parse(ty, text, field.format)
            };

            let value = match field.ty {
                FieldType::Cell(ty) => Value::Cell(next(ty)?),
                FieldType::Array(ty, len) => Value::Array(FixedArray::new(
                    ty,
                    (0..len).map(|_| next(ty)).collect::<Result<_>>()?,
                )?),
                FieldType::Dict(ty, keys) => Value::Dict(FixedDict::new(
                    ty,
                    keys,
                    keys.iter().map(|_| next(ty)).collect::<Result<_>>()?,
                )?),
                FieldType::Row(nested) => Value::from(Row::parse_columns(nested, columns)?),
            };
            values.push(value);
        }

        Ok(Row { schema, values })
    }

    /// Hierarchical view of the row keyed by field name, in schema order
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.values.len());
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            map.insert(field.name.to_string(), value_to_json(value));
        }
        JsonValue::Object(map)
    }
}

fn cell_to_json(cell: &Cell) -> JsonValue {
    match (cell.as_int(), cell) {
        (Some(value), _) => JsonValue::Number(Number::from(value)),
        (None, Cell::Label(label)) => JsonValue::String(label.to_string()),
        (None, _) => JsonValue::Null,
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Cell(cell) => cell_to_json(cell),
        Value::Array(array) => JsonValue::Array(array.iter().map(cell_to_json).collect()),
        Value::Dict(dict) => JsonValue::Object(
            dict.iter()
                .map(|(key, cell)| (key.to_string(), cell_to_json(cell)))
                .collect(),
        ),
        Value::Row(row) => row.to_json(),
    }
}

fn cell_from_raw(ty: CellType, raw: RawValue, format: Format) -> Result<Cell> {
    match raw {
        RawValue::Int(value) => Cell::from_int(ty, value),
        RawValue::Text(text) => Cell::parse(ty, &text, format),
        RawValue::List(_) => Err(Error::StructureMismatch(format!(
            "expected a single {ty} value, got a list"
        ))),
    }
}

fn value_from_raw(field: &FieldDef, raw: RawValue) -> Result<Value> {
    let cells = |ty: CellType, items: Vec<RawValue>| {
        items
            .into_iter()
            .map(|item| cell_from_raw(ty, item, field.format))
            .collect::<Result<Vec<_>>>()
    };

    match (field.ty, raw) {
        (FieldType::Cell(ty), raw) => cell_from_raw(ty, raw, field.format).map(Value::Cell),
        (FieldType::Array(ty, len), RawValue::List(items)) => {
            if items.len() != len {
                return Err(Error::StructureMismatch(format!(
                    "field {} holds {len} values, got {}",
                    field.name,
                    items.len()
                )));
            }
            Ok(Value::Array(FixedArray::new(ty, cells(ty, items)?)?))
        }
        (FieldType::Dict(ty, keys), RawValue::List(items)) => {
            Ok(Value::Dict(FixedDict::new(ty, keys, cells(ty, items)?)?))
        }
        (FieldType::Row(schema), RawValue::List(items)) => {
            Row::from_raw(schema, items).map(Value::from)
        }
        (_, other) => Err(Error::StructureMismatch(format!(
            "field {} expects a list, got {other:?}",
            field.name
        ))),
    }
}
