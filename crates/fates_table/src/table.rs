//! Tables: ordered rows restricted to a single schema.

use derive_more::derive::{Deref, IntoIterator};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::row::Row;
use crate::schema::Schema;

/// A sequence of rows which all share one schema
#[derive(Debug, Clone, PartialEq, Deref, IntoIterator)]
pub struct Table {
    schema: &'static Schema,
    #[deref]
    #[into_iterator(owned, ref)]
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: &'static Schema) -> Self {
        Table {
            schema,
            rows: Vec::new(),
        }
    }

    /// Build a table, checking every row against `schema`
    pub fn from_rows(schema: &'static Schema, rows: Vec<Row>) -> Result<Self> {
        for row in &rows {
            row.expect_schema(schema)?;
        }
        Ok(Table { schema, rows })
    }

    pub fn from_records<R: Record>(records: &[R]) -> Self {
        Table {
            schema: R::SCHEMA,
            rows: records.iter().map(Record::to_row).collect(),
        }
    }

    pub fn to_records<R: Record>(&self) -> Result<Vec<R>> {
        if self.schema != R::SCHEMA {
            return Err(Error::StructureMismatch(format!(
                "expected a table of {}, got {}",
                R::SCHEMA.name,
                self.schema.name
            )));
        }
        self.rows.iter().map(R::from_row).collect()
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn push(&mut self, row: Row) -> Result<()> {
        row.expect_schema(self.schema)?;
        self.rows.push(row);
        Ok(())
    }

    pub fn insert(&mut self, index: usize, row: Row) -> Result<()> {
        row.expect_schema(self.schema)?;
        if index > self.rows.len() {
            return Err(Error::StructureMismatch(format!(
                "cannot insert at {index} in a table of {} rows",
                self.rows.len()
            )));
        }
        self.rows.insert(index, row);
        Ok(())
    }

    /// Replace the row at `index`
    pub fn set(&mut self, index: usize, row: Row) -> Result<()> {
        row.expect_schema(self.schema)?;
        let len = self.rows.len();
        let slot = self.rows.get_mut(index).ok_or_else(|| {
            Error::StructureMismatch(format!("no row {index} in a table of {len} rows"))
        })?;
        *slot = row;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Append every row of another table of the same schema
    pub fn extend(&mut self, other: Table) -> Result<()> {
        if other.schema != self.schema {
            return Err(Error::StructureMismatch(format!(
                "cannot extend a table of {} with rows of {}",
                self.schema.name, other.schema.name
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn flatten(&self) -> Vec<Vec<Cell>> {
        self.rows.iter().map(Row::flatten).collect()
    }

    /// One line of tab separated text per row
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(Row::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse newline separated rows; blank lines are skipped
    pub fn from_text(schema: &'static Schema, text: &str) -> Result<Self> {
        let rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Row::from_text(schema, line))
            .collect::<Result<Vec<_>>>()?;

        debug!(schema = schema.name, rows = rows.len(), "parsed table text");
        Ok(Table { schema, rows })
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.rows.iter().map(Row::to_json).collect())
    }
}
