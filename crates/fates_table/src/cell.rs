//! Primitive cells: fixed-width integers and label references.

use derive_more::derive::{Deref, Display, From};
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::Format;

/// The primitive types a cell can hold
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    #[display("u8")]
    U8,
    #[display("s8")]
    S8,
    #[display("u16")]
    U16,
    #[display("s16")]
    S16,
    #[display("u32")]
    U32,
    #[display("s32")]
    S32,
    /// A 4 byte pointer into the label pool
    #[display("label")]
    Label,
}

impl CellType {
    /// Width of the cell in bytes
    pub const fn size(self) -> usize {
        match self {
            CellType::U8 | CellType::S8 => 1,
            CellType::U16 | CellType::S16 => 2,
            CellType::U32 | CellType::S32 | CellType::Label => 4,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, CellType::S8 | CellType::S16 | CellType::S32)
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, CellType::Label)
    }

    /// Inclusive value range of an integer cell type
    pub const fn bounds(self) -> Option<(i64, i64)> {
        match self {
            CellType::U8 => Some((0, u8::MAX as i64)),
            CellType::S8 => Some((i8::MIN as i64, i8::MAX as i64)),
            CellType::U16 => Some((0, u16::MAX as i64)),
            CellType::S16 => Some((i16::MIN as i64, i16::MAX as i64)),
            CellType::U32 => Some((0, u32::MAX as i64)),
            CellType::S32 => Some((i32::MIN as i64, i32::MAX as i64)),
            CellType::Label => None,
        }
    }

    fn out_of_range(self, value: impl fmt::Display) -> Error {
        let (min, max) = self.bounds().unwrap_or((0, 0));
        Error::Range {
            value: value.to_string(),
            ty: self,
            min,
            max,
        }
    }
}

/// Text stored in the label pool.
///
/// The label `NULL` is the sentinel for a pointer value of zero and is never
/// stored in a file.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, From)]
pub struct Label(String);

impl Label {
    /// Text of the sentinel label
    pub const NULL: &'static str = "NULL";

    pub fn new(text: impl Into<String>) -> Self {
        Label(text.into())
    }

    pub fn null() -> Self {
        Label(Self::NULL.to_string())
    }

    pub fn is_null(&self) -> bool {
        self.0 == Self::NULL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Default for Label {
    fn default() -> Self {
        Label::null()
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label(value.to_string())
    }
}

/// A single typed value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    Label(Label),
}

impl Cell {
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::U8(_) => CellType::U8,
            Cell::S8(_) => CellType::S8,
            Cell::U16(_) => CellType::U16,
            Cell::S16(_) => CellType::S16,
            Cell::U32(_) => CellType::U32,
            Cell::S32(_) => CellType::S32,
            Cell::Label(_) => CellType::Label,
        }
    }

    /// Zero value (or `NULL` label) of a type
    pub fn zero(ty: CellType) -> Cell {
        match ty {
            CellType::U8 => Cell::U8(0),
            CellType::S8 => Cell::S8(0),
            CellType::U16 => Cell::U16(0),
            CellType::S16 => Cell::S16(0),
            CellType::U32 => Cell::U32(0),
            CellType::S32 => Cell::S32(0),
            CellType::Label => Cell::Label(Label::null()),
        }
    }

    /// Build an integer cell, checking that `value` fits the width and signedness of `ty`.
    pub fn from_int(ty: CellType, value: i64) -> Result<Cell> {
        let range = |_| ty.out_of_range(value);
        Ok(match ty {
            CellType::U8 => Cell::U8(u8::try_from(value).map_err(range)?),
            CellType::S8 => Cell::S8(i8::try_from(value).map_err(range)?),
            CellType::U16 => Cell::U16(u16::try_from(value).map_err(range)?),
            CellType::S16 => Cell::S16(i16::try_from(value).map_err(range)?),
            CellType::U32 => Cell::U32(u32::try_from(value).map_err(range)?),
            CellType::S32 => Cell::S32(i32::try_from(value).map_err(range)?),
            CellType::Label => {
                return Err(Error::StructureMismatch(format!(
                    "cannot build a label from integer {value}"
                )))
            }
        })
    }

    /// Parse a cell from text.
    ///
    /// Integers accept an optional `0x` prefix, and are always read as hex when
    /// `format` is [`Format::Hex`]. Hex text for a signed type is the unsigned bit
    /// pattern of the cell, so `FF` parses as `-1` for an `s8`.
    pub fn parse(ty: CellType, text: &str, format: Format) -> Result<Cell> {
        let text = text.trim();
        if ty == CellType::Label {
            return Ok(Cell::Label(Label::from(text)));
        }

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (radix, digits) = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => (16, hex),
            None if format == Format::Hex => (16, digits),
            None => (10, digits),
        };

        let magnitude = u64::from_str_radix(digits, radix)
            .map_err(|_| Error::InvalidNumber(text.to_string()))?;
        let magnitude = i64::try_from(magnitude).map_err(|_| ty.out_of_range(text))?;
        let mut value = if negative { -magnitude } else { magnitude };

        if radix == 16 && !negative && ty.is_signed() {
            let bits = ty.size() as u32 * 8;
            if value >= 1 << bits {
                return Err(ty.out_of_range(text));
            }
            if value >= 1 << (bits - 1) {
                value -= 1 << bits;
            }
        }

        Cell::from_int(ty, value)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::U8(v) => Some(*v as i64),
            Cell::S8(v) => Some(*v as i64),
            Cell::U16(v) => Some(*v as i64),
            Cell::S16(v) => Some(*v as i64),
            Cell::U32(v) => Some(*v as i64),
            Cell::S32(v) => Some(*v as i64),
            Cell::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Cell::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Hex form of an integer cell, zero padded to its width (`255u8` is `0xFF`).
    ///
    /// Labels are returned as their text.
    pub fn to_hex(&self) -> String {
        match (self.as_int(), self) {
            (Some(value), _) => {
                let width = self.cell_type().size() * 2;
                let mask = (1u64 << (width * 4)) - 1;
                format!("0x{:0width$X}", value as u64 & mask, width = width)
            }
            (None, Cell::Label(label)) => label.to_string(),
            (None, _) => String::new(),
        }
    }

    pub fn to_text(&self, format: Format) -> String {
        match format {
            Format::Hex => self.to_hex(),
            Format::Str => self.to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Label(label) => write!(f, "{label}"),
            other => match other.as_int() {
                Some(value) => write!(f, "{value}"),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::cell::{Cell, CellType, Label};
    use crate::error::{Error, Result};
    use crate::schema::Format;

    #[test]
    fn u8_width_is_enforced() -> Result<()> {
        assert!(matches!(
            Cell::from_int(CellType::U8, 256),
            Err(Error::Range { ty: CellType::U8, .. })
        ));

        let cell = Cell::from_int(CellType::U8, 255)?;
        assert_eq!(cell, Cell::U8(255));
        assert_eq!(cell.to_hex(), "0xFF");

        Ok(())
    }

    #[test]
    fn negative_values_need_signed_types() {
        assert!(matches!(
            Cell::from_int(CellType::U16, -1),
            Err(Error::Range { .. })
        ));
        assert_eq!(Cell::from_int(CellType::S16, -1), Ok(Cell::S16(-1)));
        assert!(Cell::from_int(CellType::S8, -129).is_err());
    }

    #[test]
    fn signed_hex_is_a_bit_pattern() -> Result<()> {
        assert_eq!(Cell::parse(CellType::S8, "FF", Format::Hex)?, Cell::S8(-1));
        assert_eq!(Cell::parse(CellType::S8, "0x7F", Format::Str)?, Cell::S8(127));
        assert_eq!(
            Cell::parse(CellType::S32, "0xFFFFFFFF", Format::Str)?,
            Cell::S32(-1)
        );
        assert!(Cell::parse(CellType::S8, "0x100", Format::Str).is_err());

        assert_eq!(Cell::S8(-1).to_hex(), "0xFF");
        assert_eq!(Cell::S16(-2).to_hex(), "0xFFFE");
        assert_eq!(Cell::U32(0x1234).to_hex(), "0x00001234");

        Ok(())
    }

    #[test]
    fn decimal_text() -> Result<()> {
        assert_eq!(Cell::parse(CellType::U16, " 513 ", Format::Str)?, Cell::U16(513));
        assert_eq!(Cell::parse(CellType::S16, "-300", Format::Str)?, Cell::S16(-300));
        assert_eq!(
            Cell::parse(CellType::U8, "abc", Format::Str),
            Err(Error::InvalidNumber("abc".to_string()))
        );
        assert!(matches!(
            Cell::parse(CellType::U8, "300", Format::Str),
            Err(Error::Range { .. })
        ));

        Ok(())
    }

    #[test]
    fn labels() -> Result<()> {
        let cell = Cell::parse(CellType::Label, "PID_FOO", Format::Hex)?;
        assert_eq!(cell, Cell::Label(Label::from("PID_FOO")));
        assert_eq!(cell.to_text(Format::Hex), "PID_FOO");

        assert!(Label::default().is_null());
        assert_eq!(Cell::zero(CellType::Label).to_string(), "NULL");
        assert!(Cell::from_int(CellType::Label, 0).is_err());

        Ok(())
    }
}
