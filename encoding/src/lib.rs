//! This crate contains the DICOM encoding and decoding primitives
//! for the dcmio project:
//! byte-level data element decoders and encoders for the supported
//! transfer syntaxes, text codecs for the specific character sets
//! (including ISO 2022 code extensions), interpretation of raw value
//! buffers, and the run-length codec used by RLE pixel segments.
pub mod decode;
pub mod encode;
pub mod rle;
pub mod text;
pub mod transfer_syntax;

pub use crate::decode::{BasicDecode, Decode, DecodeFrom};
pub use crate::encode::{BasicEncode, Encode, EncodeTo};
pub use crate::text::{CharacterSetList, SpecificCharacterSet, TextCodec};
pub use crate::transfer_syntax::TransferSyntax;
