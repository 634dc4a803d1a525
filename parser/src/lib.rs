//! This crate works on top of `dcmio-encoding` to provide a middle-level
//! abstraction for reading and writing DICOM data sets:
//! stateful decoders and encoders which track their position and the
//! active character set, and a token-based reader and writer through
//! which whole data sets stream in document order.
pub mod dataset;
pub mod stateful;

pub use crate::dataset::{DataSetReader, DataSetWriter, DataToken};
pub use crate::stateful::decode::{StatefulDecode, StatefulDecoder};
pub use crate::stateful::encode::StatefulEncoder;
