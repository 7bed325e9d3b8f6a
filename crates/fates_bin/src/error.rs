//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

use crate::gamedata::TableKind;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for errors of the typed table model
    #[error(transparent)]
    #[diagnostic(transparent)]
    Table(#[from] fates_table::error::Error),

    /// file is not a valid bin container
    #[error("file is not a valid bin container")]
    Format(#[from] FormatError),

    /// label text cannot be stored in the label pool
    #[error("label {0:?} cannot be encoded as Shift-JIS")]
    Encoding(String),

    /// {0}
    #[error("{0}")]
    InvalidArgument(String),

    /// table has no fixed row layout
    #[error("rows cannot be appended to the {0} table")]
    UnsupportedTable(TableKind),
}

/// Error type to provide further information about a malformed container
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// header size does not match the input
    #[error("header declares {declared} bytes but the input has {actual}")]
    SizeMismatch { declared: u32, actual: usize },

    /// input ends before the regions the header declares
    #[error("input of {actual} bytes is too short, {expected} bytes are needed")]
    Truncated { expected: usize, actual: usize },

    /// label scan ran past the end of the pool
    #[error("label at offset {0:#x} is not terminated")]
    UnterminatedLabel(u32),

    /// offset does not address the label pool
    #[error("offset {0:#x} does not address a label")]
    InvalidLabel(u32),

    /// read or write past the end of the data region
    #[error("{len} bytes at {offset:#x} fall outside the data region of {size} bytes")]
    OutOfBounds { offset: u32, len: usize, size: usize },

    /// declared row count does not fill the data region
    #[error("{count} rows of {row_size} bytes do not fill a data region of {len} bytes")]
    RowCount {
        count: u32,
        row_size: usize,
        len: usize,
    },
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
