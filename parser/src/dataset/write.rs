//! A mid-level abstraction for writing DICOM content sequentially:
//! the mirror of the data set reader, consuming tokens and producing
//! encoded bytes.

use crate::dataset::{DataToken, SeqTokenType};
use crate::stateful::encode::{DynStatefulEncoder, Error as EncoderError, StatefulEncoder};
use dcmio_core::header::{DataElementHeader, Length, VR};
use dcmio_core::value::C;
use dcmio_core::PrimitiveValue;
use dcmio_encoding::encode::{DynEncoder, EncodeTo};
use dcmio_encoding::TransferSyntax;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not encode data set content"))]
    EncodeData {
        #[snafu(backtrace)]
        source: EncoderError,
    },
    #[snafu(display("primitive value token appeared without an element header"))]
    UnpairedPrimitiveValue { backtrace: Backtrace },
    #[snafu(display("item value token appeared outside of a pixel sequence item"))]
    UnpairedItemValue { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A token representing a sequence or item start, for length bookkeeping.
#[derive(Debug)]
struct SeqToken {
    /// Whether it is the start of a sequence or the start of an item.
    typ: SeqTokenType,
    /// The length of the value, as indicated by the starting element;
    /// can be undefined.
    len: Length,
}

/// A stateful device for writing a DICOM data set in sequential order.
/// This is analogous to the `DataSetReader` type for converting data
/// set tokens to bytes.
///
/// Explicit length sequences and items do not print their respective
/// delimiters; undefined length encoding is chosen exactly where the
/// incoming tokens carry an undefined length, as is always the case
/// for encapsulated pixel data fragments.
#[derive(Debug)]
pub struct DataSetWriter<W, E> {
    encoder: StatefulEncoder<W, E>,
    seq_tokens: Vec<SeqToken>,
    last_de: Option<DataElementHeader>,
}

impl<W> DataSetWriter<W, DynEncoder<W>>
where
    W: Write,
{
    /// Create a data set writer for the given transfer syntax.
    pub fn with_ts(to: W, ts: &TransferSyntax) -> Self {
        DataSetWriter::from_stateful(DynStatefulEncoder::from_transfer_syntax(to, ts))
    }
}

impl<W, E> DataSetWriter<W, E> {
    /// Create a data set writer over the given stateful encoder.
    pub fn from_stateful(encoder: StatefulEncoder<W, E>) -> Self {
        DataSetWriter {
            encoder,
            seq_tokens: Vec::new(),
            last_de: None,
        }
    }
}

impl<W, E> DataSetWriter<W, E>
where
    W: Write,
    E: EncodeTo<W>,
{
    /// Create a data set writer over a raw element encoder.
    pub fn new(to: W, encoder: E) -> Self {
        DataSetWriter::from_stateful(StatefulEncoder::new(to, encoder))
    }

    /// Feed the given sequence of tokens, which are part of the same
    /// data set, writing them in order.
    pub fn write_sequence<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = DataToken>,
    {
        for token in tokens {
            self.write(token)?;
        }
        Ok(())
    }

    /// Feed a single data set token for writing.
    pub fn write(&mut self, token: DataToken) -> Result<()> {
        match token {
            DataToken::SequenceStart { tag, len, .. } => {
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Sequence,
                    len,
                });
                self.encoder
                    .encode_element_header(DataElementHeader::new(tag, VR::SQ, len))
                    .context(EncodeDataSnafu)
            }
            DataToken::PixelSequenceStart { .. } => {
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Sequence,
                    len: Length::UNDEFINED,
                });
                self.encoder
                    .encode_element_header(DataElementHeader::new(
                        (0x7FE0, 0x0010),
                        VR::OB,
                        Length::UNDEFINED,
                    ))
                    .context(EncodeDataSnafu)
            }
            DataToken::ItemStart { len } => {
                self.seq_tokens.push(SeqToken {
                    typ: SeqTokenType::Item,
                    len,
                });
                self.encoder.encode_item_header(len.0).context(EncodeDataSnafu)
            }
            DataToken::ItemEnd => {
                // only write the delimiter for undefined length items
                if let Some(seq_start) = self.seq_tokens.pop() {
                    if seq_start.typ == SeqTokenType::Item && seq_start.len.is_undefined() {
                        self.encoder.encode_item_delimiter().context(EncodeDataSnafu)?;
                    }
                }
                Ok(())
            }
            DataToken::SequenceEnd => {
                // only write the delimiter for undefined length sequences
                if let Some(seq_start) = self.seq_tokens.pop() {
                    if seq_start.typ == SeqTokenType::Sequence && seq_start.len.is_undefined() {
                        self.encoder
                            .encode_sequence_delimiter()
                            .context(EncodeDataSnafu)?;
                    }
                }
                Ok(())
            }
            DataToken::ElementHeader { header, .. } => {
                // deferred until the value arrives,
                // so that the length can be derived from the encoded form
                self.last_de = Some(header);
                Ok(())
            }
            DataToken::PrimitiveValue(value) => {
                let de = match self.last_de.take() {
                    Some(de) => de,
                    None => return UnpairedPrimitiveValueSnafu.fail(),
                };
                self.encoder
                    .encode_primitive_element(&de, &value)
                    .context(EncodeDataSnafu)
            }
            DataToken::ItemValue(data) => {
                self.encoder.write_bytes(&data).context(EncodeDataSnafu)
            }
            DataToken::OffsetTable(table) => {
                let value = PrimitiveValue::U32(C::from_vec(table));
                self.encoder
                    .write_primitive_value(&value)
                    .context(EncodeDataSnafu)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::{PrimitiveValue, Tag};
    use dcmio_encoding::encode::ExplicitVRLittleEndianEncoder;

    fn validate_dataset_writer<I>(tokens: I, ground_truth: &[u8])
    where
        I: IntoIterator<Item = DataToken>,
    {
        let mut raw_out: Vec<u8> = vec![];
        let encoder = ExplicitVRLittleEndianEncoder::default();
        let mut dset_writer = DataSetWriter::new(&mut raw_out, encoder);

        dset_writer.write_sequence(tokens).unwrap();

        assert_eq!(raw_out, ground_truth);
    }

    #[test]
    fn write_elements_with_padding() {
        let tokens = vec![
            DataToken::ElementHeader {
                header: DataElementHeader::new((0x0008, 0x0060), VR::CS, Length(2)),
                offset: 0,
            },
            DataToken::PrimitiveValue(PrimitiveValue::from("MR")),
            DataToken::ElementHeader {
                header: DataElementHeader::new((0x0020, 0x0013), VR::IS, Length(2)),
                offset: 0,
            },
            // odd length: the writer pads with a space
            DataToken::PrimitiveValue(PrimitiveValue::from("5")),
        ];
        #[rustfmt::skip]
        let ground_truth: &[u8] = &[
            0x08, 0x00, 0x60, 0x00,
                b'C', b'S', 0x02, 0x00,
                b'M', b'R',
            0x20, 0x00, 0x13, 0x00,
                b'I', b'S', 0x02, 0x00,
                b'5', b' ',
        ];
        validate_dataset_writer(tokens, ground_truth);
    }

    #[test]
    fn write_delimited_sequence() {
        let tokens = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1115),
                len: Length::UNDEFINED,
                offset: 0,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader {
                header: DataElementHeader::new((0x0008, 0x1150), VR::UI, Length(4)),
                offset: 0,
            },
            DataToken::PrimitiveValue(PrimitiveValue::from("1.2")),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];
        #[rustfmt::skip]
        let ground_truth: &[u8] = &[
            0x08, 0x00, 0x15, 0x11,
                b'S', b'Q', 0x00, 0x00,
                0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0,
                0xFF, 0xFF, 0xFF, 0xFF,
            0x08, 0x00, 0x50, 0x11,
                b'U', b'I', 0x04, 0x00,
                b'1', b'.', b'2', b'\0',
            0xFE, 0xFF, 0x0D, 0xE0,
                0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0,
                0x00, 0x00, 0x00, 0x00,
        ];
        validate_dataset_writer(tokens, ground_truth);
    }

    #[test]
    fn explicit_length_structures_write_no_delimiters() {
        let tokens = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1115),
                len: Length(20),
                offset: 0,
            },
            DataToken::ItemStart { len: Length(12) },
            DataToken::ElementHeader {
                header: DataElementHeader::new((0x0008, 0x1150), VR::UI, Length(4)),
                offset: 0,
            },
            DataToken::PrimitiveValue(PrimitiveValue::from("1.2")),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
        ];
        #[rustfmt::skip]
        let ground_truth: &[u8] = &[
            0x08, 0x00, 0x15, 0x11,
                b'S', b'Q', 0x00, 0x00,
                0x14, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0,
                0x0C, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x50, 0x11,
                b'U', b'I', 0x04, 0x00,
                b'1', b'.', b'2', b'\0',
        ];
        validate_dataset_writer(tokens, ground_truth);
    }
}
