//! Module holding a stateful DICOM data encoding abstraction.
//!
//! The stateful encoder knows how to write text values under the
//! active character set and applies the padding necessary to keep
//! every value at an even length.

use dcmio_core::header::Header;
use dcmio_core::{DataElementHeader, Length, PrimitiveValue, Tag, ValueClass};
use dcmio_encoding::encode::{DynEncoder, EncodeTo};
use dcmio_encoding::text::{CharacterSetList, EncodeTextError, TextCodec};
use dcmio_encoding::TransferSyntax;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("failed to encode a data piece at position {}", position))]
    EncodeData {
        position: u64,
        #[snafu(backtrace)]
        source: dcmio_encoding::encode::Error,
    },
    #[snafu(display("could not encode text at position {}", position))]
    EncodeText {
        position: u64,
        #[snafu(backtrace)]
        source: EncodeTextError,
    },
    #[snafu(display("could not write value data at position {}", position))]
    WriteValueData {
        position: u64,
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Also called a printer, this encoder type provides a stateful
/// mid-level abstraction for writing DICOM content.
/// Unlike the raw `Encode` implementations, the stateful encoder
/// applies the active character set to text
/// and keeps track of how many bytes were written.
/// `W` is the write target and `E` the element encoder.
#[derive(Debug)]
pub struct StatefulEncoder<W, E> {
    to: W,
    encoder: E,
    text: CharacterSetList,
    bytes_written: u64,
}

/// Alias for a dynamically dispatched stateful encoder.
pub type DynStatefulEncoder<W> = StatefulEncoder<W, DynEncoder<W>>;

impl<W, E> StatefulEncoder<W, E> {
    /// Create a new stateful encoder from its parts,
    /// with the default character repertoire.
    pub fn new(to: W, encoder: E) -> Self {
        StatefulEncoder {
            to,
            encoder,
            text: CharacterSetList::default(),
            bytes_written: 0,
        }
    }

    /// Replace the active character set list.
    pub fn set_character_set(&mut self, text: CharacterSetList) {
        self.text = text;
    }

    /// Retrieve the number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl<W> DynStatefulEncoder<W>
where
    W: Write,
{
    /// Create a stateful encoder writing under the given transfer syntax.
    pub fn from_transfer_syntax(to: W, ts: &TransferSyntax) -> Self {
        StatefulEncoder::new(to, ts.encoder())
    }
}

impl<W, E> StatefulEncoder<W, E>
where
    W: Write,
    E: EncodeTo<W>,
{
    /// Encode and write a data element header,
    /// rounding any defined length up to the next even number.
    pub fn encode_element_header(&mut self, mut de: DataElementHeader) -> Result<()> {
        if let Some(len) = de.len.get() {
            de.len = Length((len + 1) & !1);
        }
        let bytes = self
            .encoder
            .encode_element_header(&mut self.to, de)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += bytes as u64;
        Ok(())
    }

    /// Encode and write an item header with the given length
    /// (`0xFFFF_FFFF` for delimited items).
    pub fn encode_item_header(&mut self, len: u32) -> Result<()> {
        self.encoder
            .encode_item_header(&mut self.to, len)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += 8;
        Ok(())
    }

    /// Encode and write an item delimiter.
    pub fn encode_item_delimiter(&mut self) -> Result<()> {
        self.encoder
            .encode_item_delimiter(&mut self.to)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += 8;
        Ok(())
    }

    /// Encode and write a sequence delimiter.
    pub fn encode_sequence_delimiter(&mut self) -> Result<()> {
        self.encoder
            .encode_sequence_delimiter(&mut self.to)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += 8;
        Ok(())
    }

    /// Encode and write a bare primitive value (no header)
    /// in the element encoder's byte order.
    pub fn write_primitive_value(&mut self, value: &PrimitiveValue) -> Result<()> {
        let bytes = self
            .encoder
            .encode_primitive_value(&mut self.to, value)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += bytes as u64;
        Ok(())
    }

    /// Write a raw byte buffer as-is.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.to.write_all(bytes).context(WriteValueDataSnafu {
            position: self.bytes_written,
        })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Encode and write a primitive data element in full:
    /// header and value data, with the length field recomputed
    /// from the encoded form and even-length padding applied.
    ///
    /// Writing the _Specific Character Set_ element also switches
    /// the character set used for subsequent text values.
    pub fn encode_primitive_element(
        &mut self,
        de: &DataElementHeader,
        value: &PrimitiveValue,
    ) -> Result<()> {
        match de.vr().value_class() {
            ValueClass::Text => self.encode_text_element(de, value),
            _ => self.encode_binary_element(de, value),
        }
    }

    fn encode_text_element(
        &mut self,
        de: &DataElementHeader,
        value: &PrimitiveValue,
    ) -> Result<()> {
        let mut encoded = match value {
            PrimitiveValue::Str(text) => {
                self.text.encode(text).context(EncodeTextSnafu {
                    position: self.bytes_written,
                })?
            }
            other => {
                let tokens = other.to_multi_str();
                let segments: Vec<&str> = tokens.iter().map(|s| s.as_str()).collect();
                self.text
                    .encode_multi(&segments)
                    .context(EncodeTextSnafu {
                        position: self.bytes_written,
                    })?
            }
        };
        if encoded.len() % 2 == 1 {
            encoded.push(de.vr().padding());
        }

        self.encode_element_header(DataElementHeader {
            tag: de.tag(),
            vr: de.vr(),
            len: Length(encoded.len() as u32),
        })?;
        self.write_bytes(&encoded)?;

        if de.tag() == Tag(0x0008, 0x0005) {
            if let Some(charsets) =
                CharacterSetList::from_codes(value.to_multi_str().iter().map(|s| s.as_str()))
            {
                self.text = charsets;
            }
        }
        Ok(())
    }

    fn encode_binary_element(
        &mut self,
        de: &DataElementHeader,
        value: &PrimitiveValue,
    ) -> Result<()> {
        // binary lengths are fully determined by the value,
        // so the header can be written before the data
        let len = value.calculate_byte_len();
        self.encode_element_header(DataElementHeader {
            tag: de.tag(),
            vr: de.vr(),
            len: Length(len as u32),
        })?;

        let bytes = self
            .encoder
            .encode_primitive_value(&mut self.to, value)
            .context(EncodeDataSnafu {
                position: self.bytes_written,
            })?;
        self.bytes_written += bytes as u64;
        if bytes % 2 == 1 {
            let pad = [de.vr().padding()];
            self.to.write_all(&pad).context(WriteValueDataSnafu {
                position: self.bytes_written,
            })?;
            self.bytes_written += 1;
        }
        Ok(())
    }
}
