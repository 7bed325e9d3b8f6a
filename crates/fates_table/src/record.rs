//! Statically typed records generated from a schema declaration.
//!
//! The [`record!`](crate::record!) macro declares a plain struct together with
//! the [`Schema`] describing its binary and text layout. Field types must
//! implement [`Field`]: the integer primitives, [`Label`], `[T; N]` arrays of
//! primitives, [`Keyed`] dictionaries and `Box<R>` for a nested record.
//!
//! ```
//! use fates_table::cell::Label;
//! use fates_table::record::{Keyed, KeySet, Record};
//!
//! pub struct Route;
//!
//! impl KeySet for Route {
//!     const KEYS: &'static [&'static str] = &["A", "B", "C"];
//! }
//!
//! fates_table::record! {
//!     pub struct Join {
//!         pub pid: Label,
//!         pub cids: Keyed<Label, Route>,
//!         pub buildings: [u32; 3] => Hex,
//!     }
//! }
//!
//! assert_eq!(Join::SCHEMA.size(), 4 + 12 + 12);
//! assert_eq!(Join::SCHEMA.field_names().collect::<Vec<_>>(), ["pid", "cids", "buildings"]);
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::cell::{Cell, CellType, Label};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::{FieldType, Schema};
use crate::value::{FixedArray, FixedDict, Value};

/// A struct whose layout is described by a static schema
pub trait Record: Sized {
    const SCHEMA: &'static Schema;

    fn to_row(&self) -> Row;

    fn from_row(row: &Row) -> Result<Self>;
}

/// A Rust type usable as a record field
pub trait Field: Sized {
    const TYPE: FieldType;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self>;
}

/// A Rust type stored as a single cell
pub trait Primitive: Sized {
    const CELL: CellType;

    fn to_cell(&self) -> Cell;

    fn from_cell(cell: &Cell) -> Result<Self>;
}

/// The fixed key set of a [`Keyed`] field
pub trait KeySet {
    const KEYS: &'static [&'static str];
}

fn mismatch(expected: impl fmt::Display, found: impl fmt::Debug) -> Error {
    Error::StructureMismatch(format!("expected {expected}, got {found:?}"))
}

macro_rules! integer_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const CELL: CellType = CellType::$variant;

                fn to_cell(&self) -> Cell {
                    Cell::$variant(*self)
                }

                fn from_cell(cell: &Cell) -> Result<Self> {
                    match cell {
                        Cell::$variant(value) => Ok(*value),
                        other => Err(mismatch(Self::CELL, other)),
                    }
                }
            }

            impl Field for $ty {
                const TYPE: FieldType = FieldType::Cell(CellType::$variant);

                fn to_value(&self) -> Value {
                    Value::Cell(self.to_cell())
                }

                fn from_value(value: &Value) -> Result<Self> {
                    match value {
                        Value::Cell(cell) => Self::from_cell(cell),
                        other => Err(mismatch(Self::CELL, other)),
                    }
                }
            }
        )*
    };
}

integer_primitive!(u8 => U8, i8 => S8, u16 => U16, i16 => S16, u32 => U32, i32 => S32);

impl Primitive for Label {
    const CELL: CellType = CellType::Label;

    fn to_cell(&self) -> Cell {
        Cell::Label(self.clone())
    }

    fn from_cell(cell: &Cell) -> Result<Self> {
        match cell {
            Cell::Label(label) => Ok(label.clone()),
            other => Err(mismatch(Self::CELL, other)),
        }
    }
}

impl Field for Label {
    const TYPE: FieldType = FieldType::Cell(CellType::Label);

    fn to_value(&self) -> Value {
        Value::Cell(self.to_cell())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Cell(cell) => Self::from_cell(cell),
            other => Err(mismatch(Self::CELL, other)),
        }
    }
}

impl<T: Primitive, const N: usize> Field for [T; N] {
    const TYPE: FieldType = FieldType::Array(T::CELL, N);

    fn to_value(&self) -> Value {
        Value::Array(FixedArray::from_cells_unchecked(
            T::CELL,
            self.iter().map(Primitive::to_cell).collect(),
        ))
    }

    fn from_value(value: &Value) -> Result<Self> {
        let Value::Array(array) = value else {
            return Err(mismatch(format_args!("an array of {}", N), value));
        };
        let items = array
            .iter()
            .map(T::from_cell)
            .collect::<Result<Vec<T>>>()?;
        let len = items.len();
        items
            .try_into()
            .map_err(|_| mismatch(format_args!("an array of {}", N), format_args!("{} items", len)))
    }
}

impl<R: Record> Field for Box<R> {
    const TYPE: FieldType = FieldType::Row(R::SCHEMA);

    fn to_value(&self) -> Value {
        Value::Row(Box::new(self.as_ref().to_row()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Row(row) => R::from_row(row).map(Box::new),
            other => Err(mismatch(R::SCHEMA.name, other)),
        }
    }
}

/// A dictionary with one value for every key of `K`.
///
/// The key set is part of the type, so entries can be read and replaced but
/// never added or removed.
pub struct Keyed<T, K> {
    values: Box<[T]>,
    keys: PhantomData<fn() -> K>,
}

impl<T, K: KeySet> Keyed<T, K> {
    /// Build from values given in key order
    pub fn new(values: Vec<T>) -> Result<Self> {
        if values.len() != K::KEYS.len() {
            return Err(Error::StructureMismatch(format!(
                "expected {} values for keys {:?}, got {}",
                K::KEYS.len(),
                K::KEYS,
                values.len()
            )));
        }
        Ok(Keyed {
            values: values.into_boxed_slice(),
            keys: PhantomData,
        })
    }

    fn position(key: &str) -> Result<usize> {
        K::KEYS
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| Error::UnknownField(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<&T> {
        Self::position(key).map(|i| &self.values[i])
    }

    pub fn set(&mut self, key: &str, value: T) -> Result<()> {
        let index = Self::position(key)?;
        self.values[index] = value;
        Ok(())
    }

    /// Values in key order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> + '_ {
        K::KEYS.iter().copied().zip(self.values.iter())
    }
}

impl<T: Default, K: KeySet> Default for Keyed<T, K> {
    fn default() -> Self {
        Keyed {
            values: K::KEYS.iter().map(|_| T::default()).collect(),
            keys: PhantomData,
        }
    }
}

impl<T: fmt::Debug, K: KeySet> fmt::Debug for Keyed<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T: Clone, K> Clone for Keyed<T, K> {
    fn clone(&self) -> Self {
        Keyed {
            values: self.values.clone(),
            keys: PhantomData,
        }
    }
}

impl<T: PartialEq, K> PartialEq for Keyed<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<T: Primitive, K: KeySet> Field for Keyed<T, K> {
    const TYPE: FieldType = FieldType::Dict(T::CELL, K::KEYS);

    fn to_value(&self) -> Value {
        Value::Dict(FixedDict::from_cells_unchecked(
            T::CELL,
            K::KEYS,
            self.values.iter().map(Primitive::to_cell).collect(),
        ))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Dict(dict) if dict.keys() == K::KEYS => Keyed::new(
                dict.values()
                    .iter()
                    .map(T::from_cell)
                    .collect::<Result<Vec<T>>>()?,
            ),
            other => Err(mismatch(format_args!("a dictionary of {:?}", K::KEYS), other)),
        }
    }
}

/// Declare a struct together with its [`Record`] implementation.
///
/// Every field is written in its decimal text form unless followed by
/// `=> Hex`. The generated struct derives `Debug`, `Clone` and `PartialEq`.
#[macro_export]
macro_rules! record {
    (@format) => {
        $crate::schema::Format::Str
    };
    (@format $format:ident) => {
        $crate::schema::Format::$format
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $format:ident)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::record::Record for $name {
            const SCHEMA: &'static $crate::schema::Schema = &$crate::schema::Schema {
                name: stringify!($name),
                fields: &[
                    $(
                        $crate::schema::FieldDef {
                            name: stringify!($field),
                            ty: <$ty as $crate::record::Field>::TYPE,
                            format: $crate::record!(@format $($format)?),
                        },
                    )*
                ],
            };

            fn to_row(&self) -> $crate::row::Row {
                $crate::row::Row::from_values_unchecked(
                    <Self as $crate::record::Record>::SCHEMA,
                    vec![$($crate::record::Field::to_value(&self.$field)),*],
                )
            }

            fn from_row(row: &$crate::row::Row) -> $crate::error::Result<Self> {
                row.expect_schema(<Self as $crate::record::Record>::SCHEMA)?;
                Ok(Self {
                    $(
                        $field: <$ty as $crate::record::Field>::from_value(
                            row.get(stringify!($field))?,
                        )?,
                    )*
                })
            }
        }
    };
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::cell::{CellType, Label};
    use crate::error::{Error, Result};
    use crate::record::{KeySet, Keyed, Record};
    use crate::row::Row;
    use crate::schema::{FieldType, Format};
    use crate::value::RawValue;

    struct Stat;

    impl KeySet for Stat {
        const KEYS: &'static [&'static str] = &["hp", "str", "mag"];
    }

    crate::record! {
        struct Stance {
            hit: i8,
            avoid: i8,
        }
    }

    crate::record! {
        /// A cut-down character entry
        struct Person {
            pid: Label,
            id: u16 => Hex,
            growths: Keyed<u8, Stat>,
            bases: [i8; 2],
            stance: Box<Stance>,
        }
    }

    fn person() -> Result<Person> {
        Ok(Person {
            pid: Label::from("PID_FOO"),
            id: 0x12,
            growths: Keyed::new(vec![45, 30, 5])?,
            bases: [-1, 3],
            stance: Box::new(Stance { hit: 10, avoid: -5 }),
        })
    }

    #[test]
    fn generated_schema() {
        let schema = Person::SCHEMA;

        assert_eq!(schema.name, "Person");
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            ["pid", "id", "growths", "bases", "stance"]
        );
        assert_eq!(schema.fields[1].format, Format::Hex);
        assert_eq!(schema.fields[2].ty, FieldType::Dict(CellType::U8, Stat::KEYS));
        assert_eq!(schema.fields[4].ty, FieldType::Row(Stance::SCHEMA));
        assert_eq!(schema.size(), 4 + 2 + 3 + 2 + 4);
    }

    #[test]
    fn row_round_trip() -> Result<()> {
        let person = person()?;
        let row = person.to_row();

        assert_eq!(row.to_text(), "PID_FOO\t0x0012\t45\t30\t5\t-1\t3\t10\t-5");
        assert_eq!(Person::from_row(&row)?, person);
        assert_eq!(Person::from_row(&Row::from_text(Person::SCHEMA, &row.to_text())?)?, person);

        Ok(())
    }

    #[test]
    fn keyed_fields() -> Result<()> {
        let mut person = person()?;
        person.growths.set("mag", 10)?;

        assert_eq!(person.growths.get("mag")?, &10);
        assert_eq!(
            person.growths.get("spd"),
            Err(Error::UnknownField("spd".to_string()))
        );
        assert!(matches!(
            Keyed::<u8, Stat>::new(vec![1, 2]),
            Err(Error::StructureMismatch(_))
        ));

        Ok(())
    }

    #[test]
    fn wrong_schema_is_rejected() -> Result<()> {
        let stance = Row::from_raw(
            Stance::SCHEMA,
            vec![RawValue::from(1i64), RawValue::from(2i64)],
        )?;

        assert!(matches!(
            Person::from_row(&stance),
            Err(Error::StructureMismatch(_))
        ));
        assert_eq!(Stance::from_row(&stance)?, Stance { hit: 1, avoid: 2 });

        Ok(())
    }
}
