//! This is the core DICOM library for the dcmio project.
//!
//! It contains the concepts for addressing and describing data elements:
//! attribute tags, value representations, primitive and nested values,
//! and the data dictionary interface through which implicit VR typing
//! is resolved.
//!
//! The crate holds no I/O logic; byte-level encoding and decoding
//! live in `dcmio-encoding` and `dcmio-parser`.
pub mod dictionary;
pub mod header;
pub mod value;

pub use crate::header::{
    DataElement, DataElementHeader, HasLength, Header, Length, SequenceItemHeader, Tag, ValueClass,
    VR,
};
pub use crate::value::{DicomValueType, PrimitiveValue, Value};
