//! Interpretation of DICOM data sets as streams of tokens.
//!
//! A data set is read or written as a linear sequence of [`DataToken`]s:
//! element headers and values at the leaf level,
//! with sequence and item boundaries marking the tree structure.

use dcmio_core::header::{DataElementHeader, Length};
use dcmio_core::value::DicomValueType;
use dcmio_core::{PrimitiveValue, Tag};
use std::fmt;

pub mod read;
pub mod write;

pub use self::read::DataSetReader;
pub use self::write::DataSetWriter;

/// A token of a DICOM data set stream.
///
/// The `offset` fields carry the number of bytes read from the start
/// of the data set up to the first byte of the respective header.
/// They are informative (consumed by streaming termination policies)
/// and are disregarded in token comparisons.
#[derive(Debug, Clone)]
pub enum DataToken {
    /// A data element header, of a primitive value.
    ElementHeader {
        /// the element header
        header: DataElementHeader,
        /// offset of the header's first byte
        offset: u64,
    },
    /// The beginning of a sequence element.
    SequenceStart {
        /// the sequence tag
        tag: Tag,
        /// the specified length (may be undefined)
        len: Length,
        /// offset of the header's first byte
        offset: u64,
    },
    /// The beginning of an encapsulated pixel data element.
    PixelSequenceStart {
        /// offset of the header's first byte
        offset: u64,
    },
    /// The ending delimiter of a sequence.
    SequenceEnd,
    /// The beginning of a new item in the sequence.
    ItemStart {
        /// the specified length (may be undefined)
        len: Length,
    },
    /// The ending delimiter of an item.
    ItemEnd,
    /// A primitive data element value.
    PrimitiveValue(PrimitiveValue),
    /// A raw item value within an encapsulated pixel data sequence.
    ItemValue(Vec<u8>),
    /// The basic offset table of an encapsulated pixel data sequence.
    OffsetTable(Vec<u32>),
}

impl fmt::Display for DataToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataToken::PrimitiveValue(ref v) => write!(f, "PrimitiveValue({:?})", v.value_type()),
            other => write!(f, "{:?}", other),
        }
    }
}

/// This implementation treats undefined lengths as equal
/// and disregards byte offsets.
impl PartialEq<Self> for DataToken {
    fn eq(&self, other: &Self) -> bool {
        use DataToken::*;
        match (self, other) {
            (
                ElementHeader {
                    header: header1, ..
                },
                ElementHeader {
                    header: header2, ..
                },
            ) => {
                header1.tag == header2.tag
                    && header1.vr == header2.vr
                    && header1.len.inner_eq(header2.len)
            }
            (
                SequenceStart {
                    tag: tag1,
                    len: len1,
                    ..
                },
                SequenceStart {
                    tag: tag2,
                    len: len2,
                    ..
                },
            ) => tag1 == tag2 && len1.inner_eq(*len2),
            (PixelSequenceStart { .. }, PixelSequenceStart { .. }) => true,
            (ItemStart { len: len1 }, ItemStart { len: len2 }) => len1.inner_eq(*len2),
            (PrimitiveValue(v1), PrimitiveValue(v2)) => v1 == v2,
            (ItemValue(v1), ItemValue(v2)) => v1 == v2,
            (OffsetTable(v1), OffsetTable(v2)) => v1 == v2,
            (ItemEnd, ItemEnd) | (SequenceEnd, SequenceEnd) => true,
            _ => false,
        }
    }
}

/// The type of delimiter: sequence or item.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SeqTokenType {
    Sequence,
    Item,
}

/// Conversion of a data structure into an ordered stream of tokens,
/// suitable for feeding a [`DataSetWriter`].
pub trait IntoTokens {
    /// Convert the value into tokens, in data set order.
    fn into_tokens(self) -> Vec<DataToken>;
}
