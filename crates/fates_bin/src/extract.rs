//! Binary codec between typed rows and the data region.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use tracing::{debug, instrument};

use fates_table::error::Error as TableError;
use fates_table::schema::{FieldType, Schema};
use fates_table::value::{FixedArray, FixedDict};
use fates_table::{Cell, CellType, Label, Record, Row, Table, Value};

use crate::error::Result;
use crate::labels::LabelPool;
use crate::read::{BinFile, LabelMap};

impl BinFile {
    /// Decode one row of `schema` stored at `offset`.
    ///
    /// Labels are looked up in `labels` when given and read from the pool otherwise.
    /// Nested rows are followed through their pointer.
    pub fn extract(
        &self,
        schema: &'static Schema,
        offset: u32,
        labels: Option<&LabelMap>,
    ) -> Result<Row> {
        let span = self.span(offset, schema.size())?;
        let mut reader = Cursor::new(&self.data[span]);

        let mut values = Vec::with_capacity(schema.fields.len());
        for field in schema.fields {
            let value = match field.ty {
                FieldType::Cell(ty) => Value::Cell(self.read_cell(&mut reader, ty, labels)?),
                FieldType::Array(ty, len) => Value::Array(FixedArray::new(
                    ty,
                    (0..len)
                        .map(|_| self.read_cell(&mut reader, ty, labels))
                        .collect::<Result<_>>()?,
                )?),
                FieldType::Dict(ty, keys) => Value::Dict(FixedDict::new(
                    ty,
                    keys,
                    keys.iter()
                        .map(|_| self.read_cell(&mut reader, ty, labels))
                        .collect::<Result<_>>()?,
                )?),
                FieldType::Row(nested) => {
                    let pointer = reader.read_u32::<LittleEndian>()?;
                    Value::from(self.extract(nested, pointer, labels)?)
                }
            };
            values.push(value);
        }

        Ok(Row::new(schema, values)?)
    }

    fn read_cell(
        &self,
        reader: &mut Cursor<&[u8]>,
        ty: CellType,
        labels: Option<&LabelMap>,
    ) -> Result<Cell> {
        Ok(match ty {
            CellType::U8 => Cell::U8(reader.read_u8()?),
            CellType::S8 => Cell::S8(reader.read_i8()?),
            CellType::U16 => Cell::U16(reader.read_u16::<LittleEndian>()?),
            CellType::S16 => Cell::S16(reader.read_i16::<LittleEndian>()?),
            CellType::U32 => Cell::U32(reader.read_u32::<LittleEndian>()?),
            CellType::S32 => Cell::S32(reader.read_i32::<LittleEndian>()?),
            CellType::Label => {
                let pointer = reader.read_u32::<LittleEndian>()?;
                let text = match labels.and_then(|map| map.get(&pointer)) {
                    Some(text) => text.clone(),
                    None => self.get_label(pointer)?,
                };
                Cell::Label(Label::from(text))
            }
        })
    }

    /// Decode `count` consecutive rows of `schema` starting at `offset`
    #[instrument(skip(self, schema), err, fields(schema = schema.name))]
    pub fn extract_multiple(
        &self,
        schema: &'static Schema,
        offset: u32,
        count: usize,
    ) -> Result<Table> {
        let labels = self.label_map()?;
        let size = schema.size() as u32;

        let rows = (0..count as u32)
            .map(|i| self.extract(schema, offset + i * size, Some(&labels)))
            .collect::<Result<Vec<_>>>()?;

        debug!(rows = rows.len(), "extracted table");
        Ok(Table::from_rows(schema, rows)?)
    }

    pub fn extract_record<R: Record>(&self, offset: u32) -> Result<R> {
        let row = self.extract(R::SCHEMA, offset, None)?;
        Ok(R::from_row(&row)?)
    }

    pub fn extract_records<R: Record>(&self, offset: u32, count: usize) -> Result<Vec<R>> {
        let table = self.extract_multiple(R::SCHEMA, offset, count)?;
        Ok(table.to_records()?)
    }

    /// Replace everything after `offset` in the data region with the rows of `table`.
    ///
    /// Only flat tables can be written. The bytes before `offset` are kept, the
    /// pointer regions and label pool are rebuilt from the table alone: one
    /// pointer-1 entry per label cell, no pointer-2 entries, and labels stored once
    /// each in order of first use. `NULL` labels are written as zero and are not
    /// registered as pointers.
    #[instrument(skip(self, table), err, fields(schema = table.schema().name, rows = table.len()))]
    pub fn repack(&mut self, table: &Table, offset: u32) -> Result<()> {
        let schema = table.schema();
        if !schema.is_flat() {
            return Err(TableError::StructureMismatch(format!(
                "{} contains nested rows and cannot be repacked",
                schema.name
            ))
            .into());
        }
        if offset as usize > self.data.len() {
            return Err(crate::error::FormatError::OutOfBounds {
                offset,
                len: 0,
                size: self.data.len(),
            }
            .into());
        }

        let mut data = self.data[..offset as usize].to_vec();
        data.reserve(schema.size() * table.len());

        let mut pool = LabelPool::new();
        let mut references = Vec::new();
        for row in table.iter() {
            for cell in row.flatten() {
                match cell {
                    Cell::U8(v) => data.write_u8(v)?,
                    Cell::S8(v) => data.write_i8(v)?,
                    Cell::U16(v) => data.write_u16::<LittleEndian>(v)?,
                    Cell::S16(v) => data.write_i16::<LittleEndian>(v)?,
                    Cell::U32(v) => data.write_u32::<LittleEndian>(v)?,
                    Cell::S32(v) => data.write_i32::<LittleEndian>(v)?,
                    Cell::Label(label) => {
                        if !label.is_null() {
                            references.push((data.len() as u32, pool.intern(&label)?));
                        }
                        data.write_u32::<LittleEndian>(0)?;
                    }
                }
            }
        }

        self.data = data;
        self.pointer1 = references.iter().map(|(location, _)| *location).collect();
        self.pointer2.clear();
        let base = self.label_base();
        for (location, label) in references {
            self.write_u32(location, base + label)?;
        }
        self.labels = pool.into_bytes();

        debug!(
            pointers = self.pointer1.len(),
            labels = self.labels.len(),
            "repacked table"
        );
        Ok(())
    }
}
