//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::cell::CellType;

/// Error type for library
#[derive(Error, Diagnostic, Debug, PartialEq)]
pub enum Error {
    /// value does not fit the declared cell width
    #[error("value {value} is out of range for {ty} ({min}..={max})")]
    Range {
        value: String,
        ty: CellType,
        min: i64,
        max: i64,
    },

    /// text could not be read as a number
    #[error("unable to parse {0:?} as a number")]
    InvalidNumber(String),

    /// a value or row does not have the declared shape
    #[error("structure mismatch: {0}")]
    StructureMismatch(String),

    /// a fixed-arity collection was asked to change size
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// no field or key with this name is declared
    #[error("unknown field {0:?}")]
    UnknownField(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
