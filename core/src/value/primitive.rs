//! Declaration and implementation of a DICOM primitive value.
//!
//! See [`PrimitiveValue`](./enum.PrimitiveValue.html).

use crate::header::{HasLength, Length, Tag};
use crate::value::deserialize;
use crate::value::serialize;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use itertools::Itertools;
use num_traits::NumCast;
use safe_transmute::to_bytes::transmute_to_bytes;
use smallvec::SmallVec;
use snafu::Snafu;
use std::borrow::Cow;
use std::str::FromStr;

/// An aggregation of one or more elements in a value.
pub type C<T> = SmallVec<[T; 2]>;

/// An error triggered when a value reading attempt fails because the
/// stored variant is incompatible with the requested type.
#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display("bad value cast: requested {} but value is {:?}", requested, got))]
pub struct CastValueError {
    /// The name of the requested type
    pub requested: &'static str,
    /// The type of the value stored
    pub got: ValueType,
}

/// An error triggered when a value conversion attempt fails,
/// either because the stored variant cannot represent the requested type
/// or because parsing the stored text failed.
#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display(
    "could not convert {:?} to a {}: {}",
    original,
    requested,
    cause.as_deref().unwrap_or("cast unsupported")
))]
pub struct ConvertValueError {
    /// The name of the requested type
    pub requested: &'static str,
    /// The type of the value stored
    pub original: ValueType,
    /// The underlying parse failure, if any
    pub cause: Option<String>,
}

/// A malformed-value condition: the multiplicity implied by a value
/// disagrees with its recorded byte length.
#[derive(Debug, PartialEq, Eq, Snafu)]
#[snafu(display(
    "value of {} bytes does not hold a whole number of {}-byte elements",
    len,
    stride
))]
pub struct MultiplicityError {
    /// The recorded byte length
    pub len: u32,
    /// The fixed stride of the value representation
    pub stride: usize,
}

/// The enumeration of the supported variants of a primitive value,
/// without its contents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueType {
    /// No data.
    Empty,
    /// A sequence of strings.
    Strs,
    /// A single string.
    Str,
    /// A sequence of attribute tags.
    Tags,
    /// A sequence of unsigned 8-bit integers (or raw bytes).
    U8,
    /// A sequence of signed 16-bit integers.
    I16,
    /// A sequence of unsigned 16-bit integers.
    U16,
    /// A sequence of signed 32-bit integers.
    I32,
    /// A sequence of unsigned 32-bit integers.
    U32,
    /// A sequence of signed 64-bit integers.
    I64,
    /// A sequence of unsigned 64-bit integers.
    U64,
    /// A sequence of 32-bit floating point numbers.
    F32,
    /// A sequence of 64-bit floating point numbers.
    F64,
    /// A sequence of dates.
    Date,
    /// A sequence of times.
    Time,
    /// A sequence of date-times.
    DateTime,
}

/// A primitive value from a DICOM element.
/// The result of decoding an element's data value
/// may be one of the enumerated types
/// depending on its content and value representation.
///
/// Multiple values are contained in a [`smallvec`] vector,
/// conveniently aliased to the type [`C`].
#[derive(Debug, PartialEq, Clone)]
pub enum PrimitiveValue {
    /// No data. Usually employed for zero-lengthed values.
    Empty,

    /// A sequence of strings.
    /// Used for AE, AS, PN, SH, CS, LO, UI and UC.
    /// Can also be used for IS, DS, DA, DT and TM when decoding
    /// with format preservation.
    Strs(C<String>),

    /// A single string.
    /// Used for ST, LT, UT and UR, which are never multi-valued.
    Str(String),

    /// A sequence of attribute tags.
    /// Used specifically for AT.
    Tags(C<Tag>),

    /// A sequence of unsigned 8-bit integers.
    /// Used for OB and UN.
    U8(C<u8>),

    /// A sequence of signed 16-bit integers.
    /// Used for SS.
    I16(C<i16>),

    /// A sequence of unsigned 16-bit integers.
    /// Used for US and OW.
    U16(C<u16>),

    /// A sequence of signed 32-bit integers.
    /// Used for SL and IS.
    I32(C<i32>),

    /// A sequence of unsigned 32-bit integers.
    /// Used for UL and OL.
    U32(C<u32>),

    /// A sequence of signed 64-bit integers.
    /// Used for SV.
    I64(C<i64>),

    /// A sequence of unsigned 64-bit integers.
    /// Used for UV and OV.
    U64(C<u64>),

    /// A sequence of 32-bit floating point numbers.
    /// Used for OF and FL.
    F32(C<f32>),

    /// A sequence of 64-bit floating point numbers.
    /// Used for OD, FD and DS.
    F64(C<f64>),

    /// A sequence of complete dates.
    /// Used for the DA representation.
    Date(C<NaiveDate>),

    /// A sequence of complete times.
    /// Used for the TM representation.
    Time(C<NaiveTime>),

    /// A sequence of complete date-time values.
    /// Used for the DT representation.
    DateTime(C<DateTime<FixedOffset>>),
}

/// A utility macro for implementing the conversion from a core type into a
/// DICOM primitive value with a single element.
macro_rules! impl_from_for_primitive {
    ($typ: ty, $variant: ident) => {
        impl From<$typ> for PrimitiveValue {
            fn from(value: $typ) -> Self {
                PrimitiveValue::$variant(C::from_elem(value, 1))
            }
        }
    };
}

impl_from_for_primitive!(u8, U8);
impl_from_for_primitive!(u16, U16);
impl_from_for_primitive!(i16, I16);
impl_from_for_primitive!(u32, U32);
impl_from_for_primitive!(i32, I32);
impl_from_for_primitive!(u64, U64);
impl_from_for_primitive!(i64, I64);
impl_from_for_primitive!(f32, F32);
impl_from_for_primitive!(f64, F64);
impl_from_for_primitive!(Tag, Tags);

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::Str(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::Str(value.to_owned())
    }
}

impl From<Vec<u8>> for PrimitiveValue {
    fn from(value: Vec<u8>) -> Self {
        PrimitiveValue::U8(C::from_vec(value))
    }
}

impl From<&[u8]> for PrimitiveValue {
    fn from(value: &[u8]) -> Self {
        PrimitiveValue::U8(C::from_slice(value))
    }
}

impl From<NaiveDate> for PrimitiveValue {
    fn from(value: NaiveDate) -> Self {
        PrimitiveValue::Date(C::from_elem(value, 1))
    }
}

impl From<NaiveTime> for PrimitiveValue {
    fn from(value: NaiveTime) -> Self {
        PrimitiveValue::Time(C::from_elem(value, 1))
    }
}

/// Build a multi-valued string value.
impl From<Vec<String>> for PrimitiveValue {
    fn from(value: Vec<String>) -> Self {
        PrimitiveValue::Strs(C::from_vec(value))
    }
}

impl PrimitiveValue {
    /// Create a value of multiple strings from an iterator.
    pub fn strs<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        PrimitiveValue::Strs(values.into_iter().map(Into::into).collect())
    }

    /// Obtain the variant of this value without its contents.
    pub fn value_type(&self) -> ValueType {
        use PrimitiveValue::*;
        match self {
            Empty => ValueType::Empty,
            Strs(_) => ValueType::Strs,
            Str(_) => ValueType::Str,
            Tags(_) => ValueType::Tags,
            U8(_) => ValueType::U8,
            I16(_) => ValueType::I16,
            U16(_) => ValueType::U16,
            I32(_) => ValueType::I32,
            U32(_) => ValueType::U32,
            I64(_) => ValueType::I64,
            U64(_) => ValueType::U64,
            F32(_) => ValueType::F32,
            F64(_) => ValueType::F64,
            Date(_) => ValueType::Date,
            Time(_) => ValueType::Time,
            DateTime(_) => ValueType::DateTime,
        }
    }

    /// Retrieve the number of individual values in this value.
    pub fn multiplicity(&self) -> u32 {
        use PrimitiveValue::*;
        match self {
            Empty => 0,
            Str(_) => 1,
            Strs(c) => c.len() as u32,
            Tags(c) => c.len() as u32,
            U8(c) => c.len() as u32,
            I16(c) => c.len() as u32,
            U16(c) => c.len() as u32,
            I32(c) => c.len() as u32,
            U32(c) => c.len() as u32,
            I64(c) => c.len() as u32,
            U64(c) => c.len() as u32,
            F32(c) => c.len() as u32,
            F64(c) => c.len() as u32,
            Date(c) => c.len() as u32,
            Time(c) => c.len() as u32,
            DateTime(c) => c.len() as u32,
        }
    }

    /// Determine the number of bytes that this value would occupy in an
    /// encoded stream, without the trailing padding byte.
    /// Textual values assume UTF-8; the actual length under a different
    /// character set is computed at encoding time.
    pub fn calculate_byte_len(&self) -> usize {
        use PrimitiveValue::*;
        match self {
            Empty => 0,
            Str(s) => s.len(),
            Strs(c) => c.iter().map(|s| s.len() + 1).sum::<usize>().saturating_sub(1),
            Tags(c) => c.len() * 4,
            U8(c) => c.len(),
            I16(c) => c.len() * 2,
            U16(c) => c.len() * 2,
            I32(c) => c.len() * 4,
            U32(c) => c.len() * 4,
            I64(c) => c.len() * 8,
            U64(c) => c.len() * 8,
            F32(c) => c.len() * 4,
            F64(c) => c.len() * 8,
            // DA is always an 8 character date
            Date(c) => c.len() * 9 - 1,
            // HHMMSS.FFFFFF
            Time(c) => c.len() * 14 - 1,
            // YYYYMMDDHHMMSS.FFFFFF+HHMM
            DateTime(c) => c.len() * 27 - 1,
        }
    }

    /// Check that the given byte length holds a whole number of values
    /// of the given stride. This is the malformed-value check applied
    /// to fixed-stride binary representations.
    pub fn check_stride(len: u32, stride: usize) -> Result<(), MultiplicityError> {
        if stride == 0 || len as usize % stride != 0 {
            return Err(MultiplicityError { len, stride });
        }
        Ok(())
    }

    /// Get a single string value.
    ///
    /// If the value contains multiple strings, only the first is returned.
    /// An error is returned if the variant is not textual.
    pub fn string(&self) -> Result<&str, CastValueError> {
        use PrimitiveValue::*;
        match self {
            Str(s) => Ok(s),
            Strs(c) if !c.is_empty() => Ok(&c[0]),
            _ => Err(CastValueError {
                requested: "str",
                got: self.value_type(),
            }),
        }
    }

    /// Get the sequence of string values,
    /// if the variant is either `Str` or `Strs`.
    pub fn strings(&self) -> Result<&[String], CastValueError> {
        use PrimitiveValue::*;
        match self {
            Strs(c) => Ok(c),
            Str(s) => Ok(std::slice::from_ref(s)),
            _ => Err(CastValueError {
                requested: "strings",
                got: self.value_type(),
            }),
        }
    }

    /// Retrieve the full value as a single string,
    /// with multiple values joined by a backslash
    /// and trailing whitespace removed.
    pub fn to_str(&self) -> Cow<str> {
        use PrimitiveValue::*;
        match self {
            Empty => Cow::from(""),
            Str(s) => Cow::from(s.trim_end_matches([' ', '\0'])),
            Strs(c) if c.len() == 1 => Cow::from(c[0].trim_end_matches([' ', '\0'])),
            other => Cow::from(other.render()),
        }
    }

    /// Retrieve the full value as a sequence of strings.
    ///
    /// If the value is a string or sequence of strings, it is returned
    /// (borrowed) as is. Otherwise, every individual value is rendered
    /// in its canonical textual form.
    pub fn to_multi_str(&self) -> Cow<[String]> {
        use PrimitiveValue::*;

        fn render_all<T: std::fmt::Display>(values: &[T]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }

        match self {
            Strs(c) => Cow::from(&c[..]),
            Str(s) => Cow::from(std::slice::from_ref(s)),
            Empty => Cow::from(&[][..]),
            Tags(c) => Cow::Owned(render_all(c)),
            U8(c) => Cow::Owned(render_all(c)),
            I16(c) => Cow::Owned(render_all(c)),
            U16(c) => Cow::Owned(render_all(c)),
            I32(c) => Cow::Owned(render_all(c)),
            U32(c) => Cow::Owned(render_all(c)),
            I64(c) => Cow::Owned(render_all(c)),
            U64(c) => Cow::Owned(render_all(c)),
            F32(c) => Cow::Owned(c.iter().map(|v| serialize::encode_decimal(<f64 as From<_>>::from(*v))).collect()),
            F64(c) => Cow::Owned(c.iter().map(|v| serialize::encode_decimal(*v)).collect()),
            Date(c) => Cow::Owned(c.iter().map(serialize::encode_date).collect()),
            Time(c) => Cow::Owned(c.iter().map(serialize::encode_time).collect()),
            DateTime(c) => Cow::Owned(c.iter().map(serialize::encode_datetime).collect()),
        }
    }

    /// Render the value into a single string,
    /// multiple values joined by a backslash.
    fn render(&self) -> String {
        self.to_multi_str().iter().join("\\")
    }

    /// Retrieve the full value as raw bytes.
    ///
    /// Binary numeric values are provided in the native byte order.
    /// String values are provided in UTF-8.
    pub fn to_bytes(&self) -> Cow<[u8]> {
        use PrimitiveValue::*;
        match self {
            Empty => Cow::from(&[][..]),
            U8(c) => Cow::from(&c[..]),
            I16(c) => Cow::from(transmute_to_bytes(c)),
            U16(c) => Cow::from(transmute_to_bytes(c)),
            I32(c) => Cow::from(transmute_to_bytes(c)),
            U32(c) => Cow::from(transmute_to_bytes(c)),
            I64(c) => Cow::from(transmute_to_bytes(c)),
            U64(c) => Cow::from(transmute_to_bytes(c)),
            F32(c) => Cow::from(transmute_to_bytes(c)),
            F64(c) => Cow::from(transmute_to_bytes(c)),
            Str(s) => Cow::from(s.as_bytes()),
            other => Cow::Owned(other.render().into_bytes()),
        }
    }

    /// Retrieve and convert the value into an integer.
    ///
    /// If the value is textual, the first string token is parsed
    /// with a fixed, locale-independent notation.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: Clone,
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        use PrimitiveValue::*;

        fn cast<T: NumCast, V: Copy + num_traits::ToPrimitive>(
            v: V,
            original: ValueType,
        ) -> Result<T, ConvertValueError> {
            NumCast::from(v).ok_or(ConvertValueError {
                requested: "integer",
                original,
                cause: Some("out of range".into()),
            })
        }

        match self {
            Str(s) => {
                deserialize::parse_integer(s.trim()).map_err(|e| ConvertValueError {
                    requested: "integer",
                    original: self.value_type(),
                    cause: Some(e.to_string()),
                })
            }
            Strs(c) if !c.is_empty() => {
                deserialize::parse_integer(c[0].trim()).map_err(|e| ConvertValueError {
                    requested: "integer",
                    original: self.value_type(),
                    cause: Some(e.to_string()),
                })
            }
            U8(c) if !c.is_empty() => cast(c[0], self.value_type()),
            I16(c) if !c.is_empty() => cast(c[0], self.value_type()),
            U16(c) if !c.is_empty() => cast(c[0], self.value_type()),
            I32(c) if !c.is_empty() => cast(c[0], self.value_type()),
            U32(c) if !c.is_empty() => cast(c[0], self.value_type()),
            I64(c) if !c.is_empty() => cast(c[0], self.value_type()),
            U64(c) if !c.is_empty() => cast(c[0], self.value_type()),
            _ => Err(ConvertValueError {
                requested: "integer",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Retrieve and convert the value into a sequence of integers.
    pub fn to_multi_int<T>(&self) -> Result<Vec<T>, ConvertValueError>
    where
        T: Clone,
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        use PrimitiveValue::*;

        fn cast_all<T: NumCast, V: Copy + num_traits::ToPrimitive>(
            values: &[V],
            original: ValueType,
        ) -> Result<Vec<T>, ConvertValueError> {
            values
                .iter()
                .map(|v| {
                    NumCast::from(*v).ok_or(ConvertValueError {
                        requested: "integer",
                        original,
                        cause: Some("out of range".into()),
                    })
                })
                .collect()
        }

        match self {
            Empty => Ok(Vec::new()),
            Strs(c) => c
                .iter()
                .map(|s| {
                    deserialize::parse_integer(s.trim()).map_err(|e| ConvertValueError {
                        requested: "integer",
                        original: self.value_type(),
                        cause: Some(e.to_string()),
                    })
                })
                .collect(),
            Str(s) => Ok(vec![deserialize::parse_integer(s.trim()).map_err(|e| {
                ConvertValueError {
                    requested: "integer",
                    original: self.value_type(),
                    cause: Some(e.to_string()),
                }
            })?]),
            U8(c) => cast_all(c, self.value_type()),
            I16(c) => cast_all(c, self.value_type()),
            U16(c) => cast_all(c, self.value_type()),
            I32(c) => cast_all(c, self.value_type()),
            U32(c) => cast_all(c, self.value_type()),
            I64(c) => cast_all(c, self.value_type()),
            U64(c) => cast_all(c, self.value_type()),
            _ => Err(ConvertValueError {
                requested: "integer",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Retrieve and convert the value
    /// into a single-precision floating point number.
    pub fn to_float32(&self) -> Result<f32, ConvertValueError> {
        self.to_float64().map(|v| v as f32)
    }

    /// Retrieve and convert the value
    /// into a double-precision floating point number.
    ///
    /// If the value is textual, the first string token is parsed
    /// with a fixed, locale-independent notation.
    pub fn to_float64(&self) -> Result<f64, ConvertValueError> {
        use PrimitiveValue::*;
        let parse = |s: &str| {
            deserialize::parse_decimal(s.trim()).map_err(|e| ConvertValueError {
                requested: "float64",
                original: self.value_type(),
                cause: Some(e.to_string()),
            })
        };
        match self {
            F64(c) if !c.is_empty() => Ok(c[0]),
            F32(c) if !c.is_empty() => Ok(<f64 as From<_>>::from(c[0])),
            Str(s) => parse(s),
            Strs(c) if !c.is_empty() => parse(&c[0]),
            U8(c) if !c.is_empty() => Ok(<f64 as From<_>>::from(c[0])),
            I16(c) if !c.is_empty() => Ok(<f64 as From<_>>::from(c[0])),
            U16(c) if !c.is_empty() => Ok(<f64 as From<_>>::from(c[0])),
            I32(c) if !c.is_empty() => Ok(<f64 as From<_>>::from(c[0])),
            U32(c) if !c.is_empty() => Ok(<f64 as From<_>>::from(c[0])),
            _ => Err(ConvertValueError {
                requested: "float64",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Retrieve and convert the value into a sequence of
    /// double-precision floating point numbers.
    pub fn to_multi_float64(&self) -> Result<Vec<f64>, ConvertValueError> {
        use PrimitiveValue::*;
        let parse = |s: &String| {
            deserialize::parse_decimal(s.trim()).map_err(|e| ConvertValueError {
                requested: "float64",
                original: self.value_type(),
                cause: Some(e.to_string()),
            })
        };
        match self {
            Empty => Ok(Vec::new()),
            F64(c) => Ok(c.to_vec()),
            F32(c) => Ok(c.iter().map(|v| <f64 as From<_>>::from(*v)).collect()),
            Strs(c) => c.iter().map(parse).collect(),
            Str(s) => Ok(vec![parse(s)?]),
            U8(c) => Ok(c.iter().map(|v| <f64 as From<_>>::from(*v)).collect()),
            I16(c) => Ok(c.iter().map(|v| <f64 as From<_>>::from(*v)).collect()),
            U16(c) => Ok(c.iter().map(|v| <f64 as From<_>>::from(*v)).collect()),
            I32(c) => Ok(c.iter().map(|v| <f64 as From<_>>::from(*v)).collect()),
            U32(c) => Ok(c.iter().map(|v| <f64 as From<_>>::from(*v)).collect()),
            _ => Err(ConvertValueError {
                requested: "float64",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Retrieve and convert the value into a date.
    ///
    /// Textual values are parsed as DICOM `YYYYMMDD` dates.
    pub fn to_date(&self) -> Result<NaiveDate, ConvertValueError> {
        use PrimitiveValue::*;
        let parse = |s: &str| {
            deserialize::parse_date(s.trim_end().as_bytes()).map_err(|e| ConvertValueError {
                requested: "date",
                original: self.value_type(),
                cause: Some(e.to_string()),
            })
        };
        match self {
            Date(c) if !c.is_empty() => Ok(c[0]),
            Str(s) => parse(s),
            Strs(c) if !c.is_empty() => parse(&c[0]),
            _ => Err(ConvertValueError {
                requested: "date",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Retrieve and convert the value into a time.
    ///
    /// Textual values are parsed as DICOM `HHMMSS.FFFFFF` times.
    pub fn to_time(&self) -> Result<NaiveTime, ConvertValueError> {
        use PrimitiveValue::*;
        let parse = |s: &str| {
            deserialize::parse_time(s.trim_end().as_bytes()).map_err(|e| ConvertValueError {
                requested: "time",
                original: self.value_type(),
                cause: Some(e.to_string()),
            })
        };
        match self {
            Time(c) if !c.is_empty() => Ok(c[0]),
            Str(s) => parse(s),
            Strs(c) if !c.is_empty() => parse(&c[0]),
            _ => Err(ConvertValueError {
                requested: "time",
                original: self.value_type(),
                cause: None,
            }),
        }
    }
}

/// Macro for implementing numeric slice getters,
/// to be placed inside `PrimitiveValue`'s impl block.
macro_rules! impl_slice_getter {
    ($name_single: ident, $name_multi: ident, $variant: ident, $ret: ty) => {
        /// Get a single value of the requested type.
        ///
        /// If it contains multiple values, only the first one is returned.
        /// An error is returned if the variant is not compatible.
        pub fn $name_single(&self) -> Result<$ret, CastValueError> {
            match self {
                PrimitiveValue::$variant(c) if !c.is_empty() => Ok(c[0]),
                other => Err(CastValueError {
                    requested: stringify!($name_single),
                    got: other.value_type(),
                }),
            }
        }

        /// Get a reference to the values of the requested type
        /// without copying.
        ///
        /// An error is returned if the variant is not compatible.
        pub fn $name_multi(&self) -> Result<&[$ret], CastValueError> {
            match self {
                PrimitiveValue::$variant(c) => Ok(&c[..]),
                other => Err(CastValueError {
                    requested: stringify!($name_multi),
                    got: other.value_type(),
                }),
            }
        }
    };
}

impl PrimitiveValue {
    impl_slice_getter!(tag, tags, Tags, Tag);
    impl_slice_getter!(uint8, uint8_slice, U8, u8);
    impl_slice_getter!(int16, int16_slice, I16, i16);
    impl_slice_getter!(uint16, uint16_slice, U16, u16);
    impl_slice_getter!(int32, int32_slice, I32, i32);
    impl_slice_getter!(uint32, uint32_slice, U32, u32);
    impl_slice_getter!(int64, int64_slice, I64, i64);
    impl_slice_getter!(uint64, uint64_slice, U64, u64);
    impl_slice_getter!(float32, float32_slice, F32, f32);
    impl_slice_getter!(float64, float64_slice, F64, f64);
}

impl HasLength for PrimitiveValue {
    fn length(&self) -> Length {
        Length(self.calculate_byte_len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn value_multiplicity() {
        assert_eq!(PrimitiveValue::Empty.multiplicity(), 0);
        assert_eq!(PrimitiveValue::from("Doe^John").multiplicity(), 1);
        assert_eq!(
            PrimitiveValue::strs(["DERIVED", "PRIMARY"]).multiplicity(),
            2
        );
        assert_eq!(PrimitiveValue::U16(smallvec![1, 2, 3]).multiplicity(), 3);
    }

    #[test]
    fn to_str_trims_padding() {
        assert_eq!(PrimitiveValue::from("TITLE ").to_str(), "TITLE");
        assert_eq!(PrimitiveValue::from("1.2.840.10008\0").to_str(), "1.2.840.10008");
    }

    #[test]
    fn render_joins_with_backslash() {
        let v = PrimitiveValue::U16(smallvec![256, 0, 16]);
        assert_eq!(v.to_str(), "256\\0\\16");
    }

    #[test]
    fn numeric_conversions() {
        let v = PrimitiveValue::from("1234567 ");
        assert_eq!(v.to_int::<i32>().unwrap(), 1234567);

        let v = PrimitiveValue::from("1.70");
        assert_eq!(v.to_float64().unwrap(), 1.70);

        let v = PrimitiveValue::U16(smallvec![512]);
        assert_eq!(v.to_int::<u64>().unwrap(), 512);

        let v = PrimitiveValue::strs(["1", "2", "3"]);
        assert_eq!(v.to_multi_int::<u8>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn conversion_failures_are_reported() {
        let v = PrimitiveValue::from("not a number");
        assert!(v.to_int::<i32>().is_err());

        let v = PrimitiveValue::F32(smallvec![0.5]);
        assert_eq!(
            v.string(),
            Err(CastValueError {
                requested: "str",
                got: ValueType::F32,
            })
        );
    }

    #[test]
    fn date_conversion() {
        let v = PrimitiveValue::from("19941012");
        assert_eq!(
            v.to_date().unwrap(),
            NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()
        );
    }

    #[test]
    fn byte_lengths() {
        assert_eq!(PrimitiveValue::from("Doe^John").calculate_byte_len(), 8);
        assert_eq!(
            PrimitiveValue::strs(["DERIVED", "PRIMARY"]).calculate_byte_len(),
            15
        );
        assert_eq!(
            PrimitiveValue::U16(smallvec![1, 2, 3]).calculate_byte_len(),
            6
        );
        assert_eq!(PrimitiveValue::Empty.calculate_byte_len(), 0);
    }

    #[test]
    fn stride_check() {
        assert!(PrimitiveValue::check_stride(6, 2).is_ok());
        assert!(PrimitiveValue::check_stride(6, 4).is_err());
    }
}
