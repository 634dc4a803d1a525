//! High level abstraction over a DICOM data element's value,
//! which may be primitive, a sequence of nested data sets,
//! or a sequence of encapsulated pixel data fragments.

use crate::header::{HasLength, Length};
use num_traits::NumCast;
use std::borrow::Cow;
use std::str::FromStr;

pub mod deserialize;
mod primitive;
pub mod serialize;

pub use self::primitive::{
    CastValueError, ConvertValueError, MultiplicityError, PrimitiveValue, ValueType, C,
};

/// Type alias for an in-memory compressed pixel data fragment.
pub type InMemFragment = Vec<u8>;

/// A trait for a value that maps to a DICOM element data value.
pub trait DicomValueType: HasLength {
    /// Retrieve the specific type of this value.
    fn value_type(&self) -> ValueType;

    /// Retrieve the number of individual values contained.
    /// In a sequence value, this is the number of items.
    fn cardinality(&self) -> usize;
}

/// Representation of a full DICOM value, which may be either primitive or
/// a nested data set.
///
/// `I` is the type of the items in a sequence value,
/// which should usually implement [`HasLength`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value<I> {
    /// Primitive value.
    Primitive(PrimitiveValue),
    /// A complex sequence of items.
    Sequence {
        /// Item collection.
        items: C<I>,
        /// The size in bytes (can be undefined, in which case the
        /// sequence is encoded in delimited form).
        size: Length,
    },
    /// An encapsulated pixel data sequence:
    /// a basic offset table followed by compressed fragments.
    PixelSequence {
        /// The value contents of the offset table.
        offset_table: C<u32>,
        /// The compressed fragments.
        fragments: C<InMemFragment>,
    },
}

impl<I> Value<I> {
    /// Create a new DICOM value from a primitive value.
    pub fn new(value: PrimitiveValue) -> Self {
        Value::Primitive(value)
    }

    /// Obtain the number of individual values.
    /// In a primitive, this is the multiplicity;
    /// in a sequence, the number of items.
    pub fn multiplicity(&self) -> u32 {
        match self {
            Value::Primitive(v) => v.multiplicity(),
            Value::Sequence { items, .. } => items.len() as u32,
            Value::PixelSequence { fragments, .. } => fragments.len() as u32,
        }
    }

    /// Gets a reference to the primitive value.
    pub fn primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(v) => Some(v),
            _ => None,
        }
    }

    /// Gets a reference to the items of a sequence.
    ///
    /// Returns `None` if the value is not a data set sequence.
    pub fn items(&self) -> Option<&[I]> {
        match self {
            Value::Sequence { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Gets a mutable reference to the items of a sequence,
    /// resetting the recorded sequence size to undefined,
    /// since any change may invalidate it.
    pub fn items_mut(&mut self) -> Option<&mut C<I>> {
        match self {
            Value::Sequence { items, size } => {
                *size = Length::UNDEFINED;
                Some(items)
            }
            _ => None,
        }
    }

    /// Gets a reference to the item at the given index of a sequence.
    pub fn item(&self, index: usize) -> Option<&I> {
        match self {
            Value::Sequence { items, .. } => items.get(index),
            _ => None,
        }
    }

    /// Retrieves the primitive value, discarding the rest.
    pub fn into_primitive(self) -> Option<PrimitiveValue> {
        match self {
            Value::Primitive(v) => Some(v),
            _ => None,
        }
    }

    /// Retrieve the full value as a single trimmed string.
    ///
    /// Returns an error if the value is not primitive.
    pub fn to_str(&self) -> Result<Cow<str>, CastValueError> {
        match self {
            Value::Primitive(prim) => Ok(prim.to_str()),
            _ => Err(CastValueError {
                requested: "string",
                got: self.value_type(),
            }),
        }
    }

    /// Retrieve the full value as a sequence of strings.
    ///
    /// Returns an error if the value is not primitive.
    pub fn to_multi_str(&self) -> Result<Cow<[String]>, CastValueError> {
        match self {
            Value::Primitive(prim) => Ok(prim.to_multi_str()),
            _ => Err(CastValueError {
                requested: "strings",
                got: self.value_type(),
            }),
        }
    }

    /// Convert the full primitive value into raw bytes.
    ///
    /// Returns an error if the value is not primitive.
    pub fn to_bytes(&self) -> Result<Cow<[u8]>, CastValueError> {
        match self {
            Value::Primitive(prim) => Ok(prim.to_bytes()),
            _ => Err(CastValueError {
                requested: "bytes",
                got: self.value_type(),
            }),
        }
    }

    /// Get a single string slice from the value.
    ///
    /// Returns an error if the value is not primitive or not textual.
    pub fn string(&self) -> Result<&str, CastValueError> {
        match self {
            Value::Primitive(prim) => prim.string(),
            _ => Err(CastValueError {
                requested: "str",
                got: self.value_type(),
            }),
        }
    }

    /// Retrieve and convert the value into an integer.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: Clone,
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        match self {
            Value::Primitive(prim) => prim.to_int(),
            _ => Err(ConvertValueError {
                requested: "integer",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Retrieve and convert the value into a double-precision number.
    pub fn to_float64(&self) -> Result<f64, ConvertValueError> {
        match self {
            Value::Primitive(prim) => prim.to_float64(),
            _ => Err(ConvertValueError {
                requested: "float64",
                original: self.value_type(),
                cause: None,
            }),
        }
    }
}

impl<I> HasLength for Value<I> {
    fn length(&self) -> Length {
        match self {
            Value::Primitive(v) => v.length(),
            Value::Sequence { size, .. } => *size,
            Value::PixelSequence { .. } => Length::UNDEFINED,
        }
    }
}

impl<I> DicomValueType for Value<I> {
    fn value_type(&self) -> ValueType {
        match self {
            Value::Primitive(v) => v.value_type(),
            // sequences have no primitive type; report them as raw items
            Value::Sequence { .. } => ValueType::Empty,
            Value::PixelSequence { .. } => ValueType::U8,
        }
    }

    fn cardinality(&self) -> usize {
        self.multiplicity() as usize
    }
}

impl<I> From<PrimitiveValue> for Value<I> {
    fn from(v: PrimitiveValue) -> Self {
        Value::Primitive(v)
    }
}

impl<I> From<&str> for Value<I> {
    fn from(v: &str) -> Self {
        Value::Primitive(v.into())
    }
}

impl<I> From<String> for Value<I> {
    fn from(v: String) -> Self {
        Value::Primitive(v.into())
    }
}

impl<I> Value<I> {
    /// Construct a sequence value from its items,
    /// in delimited (undefined length) form.
    pub fn from_items<T>(items: T) -> Self
    where
        T: Into<C<I>>,
    {
        Value::Sequence {
            items: items.into(),
            size: Length::UNDEFINED,
        }
    }
}

/// A macro for the construction of primitive values with less verbosity,
/// naming the variant first and the contents after.
///
/// ```
/// # use dcmio_core::dcmio_value;
/// # use dcmio_core::value::PrimitiveValue;
/// let value = dcmio_value!(U16, [256, 0, 16]);
/// assert_eq!(value.multiplicity(), 3);
/// let value = dcmio_value!(Strs, ["DERIVED", "PRIMARY"]);
/// let value = dcmio_value!(F64, 1.25);
/// ```
#[macro_export]
macro_rules! dcmio_value {
    () => { $crate::value::PrimitiveValue::Empty };
    (Str, $elem: expr) => {
        $crate::value::PrimitiveValue::Str(String::from($elem))
    };
    (Strs, [ $($elem: expr),+ $(,)? ]) => {
        $crate::value::PrimitiveValue::Strs(
            [$(String::from($elem)),+].into_iter().collect()
        )
    };
    ($typ: ident, [ $($elem: expr),+ $(,)? ]) => {
        $crate::value::PrimitiveValue::$typ(
            [$($elem),+].into_iter().collect()
        )
    };
    ($typ: ident, $elem: expr) => {
        $crate::value::PrimitiveValue::$typ($crate::value::C::from_elem($elem, 1))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::DataElementHeader;
    use crate::VR;

    #[test]
    fn sequence_value_access() {
        let item = DataElementHeader::new((0x0008, 0x1150), VR::UI, Length(0));
        let value: Value<DataElementHeader> = Value::from_items(vec![item]);
        assert_eq!(value.multiplicity(), 1);
        assert!(value.length().is_undefined());
        assert_eq!(value.item(0), Some(&item));
        assert_eq!(value.item(1), None);
        assert!(value.to_str().is_err());
    }

    #[test]
    fn items_mut_invalidates_size() {
        let item = DataElementHeader::new((0x0008, 0x1150), VR::UI, Length(0));
        let mut value: Value<DataElementHeader> = Value::Sequence {
            items: C::from_vec(vec![item]),
            size: Length(24),
        };
        assert_eq!(value.length(), Length(24));
        value.items_mut().unwrap().clear();
        assert!(value.length().is_undefined());
    }

    #[test]
    fn value_macro() {
        let value = dcmio_value!(U16, [256, 0, 16]);
        assert_eq!(value, PrimitiveValue::U16([256, 0, 16].into_iter().collect()));
        let value = dcmio_value!(F64, 1.25);
        assert_eq!(value.to_float64().unwrap(), 1.25);
        let value = dcmio_value!(Strs, ["DERIVED", "PRIMARY"]);
        assert_eq!(value.multiplicity(), 2);
        let value = dcmio_value!();
        assert_eq!(value, PrimitiveValue::Empty);
    }
}
