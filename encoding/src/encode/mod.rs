//! This module contains all DICOM data element encoding logic.

use byteordered::Endianness;
use dcmio_core::{DataElementHeader, PrimitiveValue, Tag};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

pub mod basic;
pub mod explicit_be;
pub mod explicit_le;
pub mod implicit_le;

pub use self::basic::BasicEncoder;
pub use self::explicit_be::ExplicitVRBigEndianEncoder;
pub use self::explicit_le::ExplicitVRLittleEndianEncoder;
pub use self::implicit_le::ImplicitVRLittleEndianEncoder;

/// Module-level error type:
/// for failures while encoding headers or values into a writer.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("failed to write the element tag: {}", source))]
    WriteTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("failed to write the value representation code: {}", source))]
    WriteVr {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("failed to write the reserved header bytes: {}", source))]
    WriteReserved {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("failed to write the element length field: {}", source))]
    WriteLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("failed to write the item header: {}", source))]
    WriteItemHeader {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("failed to write value data: {}", source))]
    WriteValueData {
        backtrace: Backtrace,
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Type trait for an encoder of basic data properties.
/// Unlike `Encode` (and similar to `BasicDecode`), this trait is not
/// object safe because it's better to just provide a dynamic implementation.
pub trait BasicEncode {
    /// Retrieve the encoder's endianness.
    fn endianness(&self) -> Endianness;

    /// Encode an unsigned short value to the given writer.
    fn encode_us<W>(&self, to: W, value: u16) -> io::Result<()>
    where
        W: Write;

    /// Encode an unsigned long value to the given writer.
    fn encode_ul<W>(&self, to: W, value: u32) -> io::Result<()>
    where
        W: Write;

    /// Encode an unsigned very long value to the given writer.
    fn encode_uv<W>(&self, to: W, value: u64) -> io::Result<()>
    where
        W: Write;

    /// Encode a signed short value to the given writer.
    fn encode_ss<W>(&self, to: W, value: i16) -> io::Result<()>
    where
        W: Write;

    /// Encode a signed long value to the given writer.
    fn encode_sl<W>(&self, to: W, value: i32) -> io::Result<()>
    where
        W: Write;

    /// Encode a signed very long value to the given writer.
    fn encode_sv<W>(&self, to: W, value: i64) -> io::Result<()>
    where
        W: Write;

    /// Encode a single precision float value to the given writer.
    fn encode_fl<W>(&self, to: W, value: f32) -> io::Result<()>
    where
        W: Write;

    /// Encode a double precision float value to the given writer.
    fn encode_fd<W>(&self, to: W, value: f64) -> io::Result<()>
    where
        W: Write;

    /// Encode a primitive value to the given writer.
    /// The default implementation delegates to the other encoding methods,
    /// and writes string values in UTF-8,
    /// joining multiple values with a backslash.
    /// Returns the number of bytes written.
    fn encode_primitive<W>(&self, mut to: W, value: &PrimitiveValue) -> Result<usize>
    where
        W: Write,
    {
        use PrimitiveValue::*;
        match value {
            Empty => Ok(0),
            U8(values) => {
                to.write_all(values).context(WriteValueDataSnafu)?;
                Ok(values.len())
            }
            I16(values) => {
                for v in values {
                    self.encode_ss(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 2)
            }
            U16(values) => {
                for v in values {
                    self.encode_us(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 2)
            }
            I32(values) => {
                for v in values {
                    self.encode_sl(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 4)
            }
            U32(values) => {
                for v in values {
                    self.encode_ul(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 4)
            }
            I64(values) => {
                for v in values {
                    self.encode_sv(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 8)
            }
            U64(values) => {
                for v in values {
                    self.encode_uv(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 8)
            }
            F32(values) => {
                for v in values {
                    self.encode_fl(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 4)
            }
            F64(values) => {
                for v in values {
                    self.encode_fd(&mut to, *v).context(WriteValueDataSnafu)?;
                }
                Ok(values.len() * 8)
            }
            Tags(tags) => {
                for tag in tags {
                    self.encode_us(&mut to, tag.group())
                        .context(WriteValueDataSnafu)?;
                    self.encode_us(&mut to, tag.element())
                        .context(WriteValueDataSnafu)?;
                }
                Ok(tags.len() * 4)
            }
            other => {
                // textual forms, including rendered dates and numbers
                let text = other.to_multi_str().join("\\");
                to.write_all(text.as_bytes())
                    .context(WriteValueDataSnafu)?;
                Ok(text.len())
            }
        }
    }
}

/** Type trait for encoding data element headers to a destination.
 * See [`EncodeTo`] for the object safe flavour.
 */
pub trait Encode {
    /// Encode and write an element tag.
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write;

    /// Encode and write a data element header to the given destination.
    /// Returns the number of bytes effectively written on success.
    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write;

    /// Encode and write a DICOM sequence item header to the given destination.
    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write;

    /// Encode and write a DICOM sequence item delimiter.
    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a DICOM sequence delimiter.
    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a primitive value in this encoder's byte order.
    /// Returns the number of bytes written, without padding.
    fn encode_primitive_value<W>(&self, to: W, value: &PrimitiveValue) -> Result<usize>
    where
        W: Write;
}

/** Type trait for encoding to a specific writer type.
 * Unlike [`Encode`], this trait is object safe.
 */
pub trait EncodeTo<W: ?Sized> {
    /// Encode and write an element tag.
    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()>;

    /// Encode and write a data element header.
    /// Returns the number of bytes effectively written on success.
    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize>;

    /// Encode and write a DICOM sequence item header.
    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()>;

    /// Encode and write a DICOM sequence item delimiter.
    fn encode_item_delimiter(&self, to: &mut W) -> Result<()>;

    /// Encode and write a DICOM sequence delimiter.
    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()>;

    /// Encode and write a primitive value in this encoder's byte order.
    fn encode_primitive_value(&self, to: &mut W, value: &PrimitiveValue) -> Result<usize>;
}

impl<T, W: ?Sized> EncodeTo<W> for Box<T>
where
    T: EncodeTo<W> + ?Sized,
{
    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()> {
        (**self).encode_tag(to, tag)
    }

    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize> {
        (**self).encode_element_header(to, de)
    }

    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()> {
        (**self).encode_item_header(to, len)
    }

    fn encode_item_delimiter(&self, to: &mut W) -> Result<()> {
        (**self).encode_item_delimiter(to)
    }

    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()> {
        (**self).encode_sequence_delimiter(to)
    }

    fn encode_primitive_value(&self, to: &mut W, value: &PrimitiveValue) -> Result<usize> {
        (**self).encode_primitive_value(to, value)
    }
}

/// Type alias for a dynamically dispatched data element encoder.
pub type DynEncoder<W> = Box<dyn EncodeTo<W>>;
