//! A mid-level abstraction for reading DICOM content sequentially.
//!
//! The rest of the crate is used to obtain DICOM element headers and values.
//! At this level, headers and values are treated as tokens which can be used
//! to form a syntax tree of a full data set.

use crate::stateful::decode::{DynStatefulDecoder, Error as DecoderError, StatefulDecode};
use dcmio_core::dictionary::DataDictionary;
use dcmio_core::header::{DataElementHeader, Header, Length, SequenceItemHeader};
use dcmio_core::{Tag, VR};
use dcmio_encoding::decode::primitive_value::ValueReadStrategy;
use dcmio_encoding::TransferSyntax;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Read;

use super::{DataToken, SeqTokenType};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not read item header"))]
    ReadItemHeader {
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("could not read element header"))]
    ReadHeader {
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("could not read value for element tagged {}", tag))]
    ReadValue {
        tag: Tag,
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("could not read {} bytes of an item value", len))]
    ReadItemValue {
        len: u32,
        #[snafu(backtrace)]
        source: DecoderError,
    },
    #[snafu(display("unexpected item tag {} while reading pixel sequence", tag))]
    UnexpectedItemTag { tag: Tag, backtrace: Backtrace },
    /// Undefined length in an encapsulated pixel data item
    #[snafu(display("undefined pixel data item length"))]
    UndefinedItemLength { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A reader-specific token representing a sequence or item start.
#[derive(Debug, Copy, Clone, PartialEq)]
struct SeqToken {
    /// Whether it is the start of a sequence or the start of an item.
    typ: SeqTokenType,
    /// The length of the value, as indicated by the starting element;
    /// can be undefined.
    len: Length,
    /// Whether this token is part of an encapsulated pixel data.
    pixel_data: bool,
    /// The number of bytes the parser had read when it reached the
    /// beginning of this sequence or item's value data.
    base_offset: u64,
}

/// The set of options for the data set reader.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct DataSetReaderOptions {
    /// The value reading strategy.
    pub value_read: ValueReadStrategy,
}

/// A higher-level reader for retrieving structure in a DICOM data set
/// from an arbitrary data source, as an iterator of [`DataToken`]s.
#[derive(Debug)]
pub struct DataSetReader<S> {
    /// the stateful decoder
    parser: S,
    /// the options of this reader
    options: DataSetReaderOptions,
    /// whether the reader is expecting an item header next
    /// (or a sequence delimiter)
    in_sequence: bool,
    /// whether the reader is expecting the first item value
    /// of a pixel sequence next (the offset table)
    offset_table_next: bool,
    /// whether a check for a sequence or item delimitation is pending
    delimiter_check_pending: bool,
    /// a stack of delimiters
    seq_delimiters: Vec<SeqToken>,
    /// fuse the iteration process if true
    hard_break: bool,
    /// last decoded header
    last_header: Option<DataElementHeader>,
}

impl<S> DataSetReader<DynStatefulDecoder<S>>
where
    S: Read,
{
    /// Creates a new token reader over the given source,
    /// considering the given transfer syntax
    /// and resolving implicit VRs through the given dictionary.
    pub fn new_with_dict<D>(
        source: S,
        dict: D,
        ts: &TransferSyntax,
        options: DataSetReaderOptions,
    ) -> Self
    where
        D: DataDictionary + 'static,
    {
        Self::new(DynStatefulDecoder::new_with_dict(source, ts, dict), options)
    }
}

impl<S> DataSetReader<S> {
    /// Create a new token reader over the given stateful decoder.
    pub fn new(decoder: S, options: DataSetReaderOptions) -> Self {
        DataSetReader {
            parser: decoder,
            options,
            seq_delimiters: Vec::new(),
            delimiter_check_pending: false,
            offset_table_next: false,
            in_sequence: false,
            hard_break: false,
            last_header: None,
        }
    }

    /// Retrieve the inner stateful decoder.
    pub fn parser(&self) -> &S {
        &self.parser
    }
}

impl<S> Iterator for DataSetReader<S>
where
    S: StatefulDecode,
{
    type Item = Result<DataToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.hard_break {
            return None;
        }

        // item or sequence delimitation logic for explicit lengths
        if self.delimiter_check_pending {
            if let Some(token) = self.update_seq_delimiters() {
                return Some(Ok(token));
            }
        }

        if self.in_sequence {
            // at sequence level, expecting an item header
            match self.parser.decode_item_header() {
                Ok(SequenceItemHeader::Item { len }) => {
                    // entered a new item
                    self.in_sequence = false;
                    let pixel_data = self
                        .seq_delimiters
                        .last()
                        .map(|t| t.pixel_data)
                        .unwrap_or(false);
                    self.push_sequence_token(SeqTokenType::Item, len, pixel_data);
                    // items can be empty
                    if len == Length(0) {
                        self.delimiter_check_pending = true;
                    }
                    Some(Ok(DataToken::ItemStart { len }))
                }
                Ok(SequenceItemHeader::ItemDelimiter) => {
                    // closed an item
                    self.seq_delimiters.pop();
                    self.in_sequence = true;
                    // sequences can end after an item delimiter
                    self.delimiter_check_pending = true;
                    Some(Ok(DataToken::ItemEnd))
                }
                Ok(SequenceItemHeader::SequenceDelimiter) => {
                    // closed a sequence
                    self.seq_delimiters.pop();
                    self.in_sequence = false;
                    // items can end after a nested sequence ends
                    self.delimiter_check_pending = true;
                    Some(Ok(DataToken::SequenceEnd))
                }
                Err(e) => {
                    self.hard_break = true;
                    Some(Err(e).context(ReadItemHeaderSnafu))
                }
            }
        } else if let Some(SeqToken {
            typ: SeqTokenType::Item,
            pixel_data: true,
            len,
            ..
        }) = self.seq_delimiters.last()
        {
            // a pixel sequence item value is expected
            let len = match len.get() {
                Some(len) => len,
                None => {
                    self.hard_break = true;
                    return Some(UndefinedItemLengthSnafu.fail());
                }
            };

            // the item needs to be popped on the next iteration
            self.delimiter_check_pending = true;

            if self.offset_table_next {
                self.offset_table_next = false;
                let mut offset_table = Vec::with_capacity(len as usize / 4);
                Some(
                    match self.parser.read_u32_to_vec(len, &mut offset_table) {
                        Ok(()) => Ok(DataToken::OffsetTable(offset_table)),
                        Err(e) => {
                            self.hard_break = true;
                            Err(e).context(ReadItemValueSnafu { len })
                        }
                    },
                )
            } else {
                let mut value = Vec::with_capacity(len as usize);
                Some(match self.parser.read_to_vec(len, &mut value) {
                    Ok(()) => Ok(DataToken::ItemValue(value)),
                    Err(e) => {
                        self.hard_break = true;
                        Err(e).context(ReadItemValueSnafu { len })
                    }
                })
            }
        } else if let Some(header) = self.last_header {
            if header.is_encapsulated_pixeldata() {
                self.push_sequence_token(SeqTokenType::Sequence, Length::UNDEFINED, true);
                self.last_header = None;

                // expecting the offset table item
                match self.parser.decode_item_header() {
                    Ok(SequenceItemHeader::Item { len }) => {
                        self.in_sequence = false;
                        self.push_sequence_token(SeqTokenType::Item, len, true);
                        if len == Length(0) {
                            self.delimiter_check_pending = true;
                        } else {
                            self.offset_table_next = true;
                        }
                        Some(Ok(DataToken::ItemStart { len }))
                    }
                    Ok(SequenceItemHeader::SequenceDelimiter) => {
                        // empty pixel data
                        self.seq_delimiters.pop();
                        self.in_sequence = false;
                        Some(Ok(DataToken::SequenceEnd))
                    }
                    Ok(item) => {
                        self.hard_break = true;
                        Some(UnexpectedItemTagSnafu { tag: item.tag() }.fail())
                    }
                    Err(e) => {
                        self.hard_break = true;
                        Some(Err(e).context(ReadItemHeaderSnafu))
                    }
                }
            } else {
                // a plain element header was read, so a value is expected
                let value = match self.read_value(&header) {
                    Ok(v) => v,
                    Err(e) => {
                        self.hard_break = true;
                        self.last_header = None;
                        return Some(Err(e));
                    }
                };

                self.last_header = None;

                // sequences can end after this token
                self.delimiter_check_pending = true;

                Some(Ok(DataToken::PrimitiveValue(value)))
            }
        } else {
            // a data element header or item delimiter is expected
            let offset = self.parser.position();
            match self.parser.decode_header() {
                Ok(DataElementHeader {
                    tag,
                    vr: VR::SQ,
                    len,
                }) => {
                    self.in_sequence = true;
                    self.push_sequence_token(SeqTokenType::Sequence, len, false);

                    // sequences can end right after they start
                    if len == Length(0) {
                        self.delimiter_check_pending = true;
                    }

                    Some(Ok(DataToken::SequenceStart { tag, len, offset }))
                }
                Ok(DataElementHeader {
                    tag: Tag(0xFFFE, 0xE00D),
                    ..
                }) if self.seq_delimiters.is_empty() => {
                    // ignore delimiter, we are not in a sequence
                    tracing::warn!(
                        "item delimiter outside of a sequence at position {}",
                        self.parser.position()
                    );
                    self.next()
                }
                Ok(DataElementHeader {
                    tag: Tag(0xFFFE, 0xE00D),
                    ..
                }) => {
                    self.in_sequence = true;
                    // pop item delimiter
                    self.seq_delimiters.pop();
                    // sequences can end after this token
                    self.delimiter_check_pending = true;
                    Some(Ok(DataToken::ItemEnd))
                }
                Ok(header) if header.is_encapsulated_pixeldata() => {
                    // save it for the next step
                    self.last_header = Some(header);
                    Some(Ok(DataToken::PixelSequenceStart { offset }))
                }
                Ok(header) if header.len.is_undefined() => {
                    // treat other undefined length elements as data set
                    // sequences, discarding the VR in the process
                    self.in_sequence = true;

                    let DataElementHeader { tag, len, .. } = header;
                    self.push_sequence_token(SeqTokenType::Sequence, len, false);

                    Some(Ok(DataToken::SequenceStart { tag, len, offset }))
                }
                Ok(header) => {
                    // save it for the next step
                    self.last_header = Some(header);
                    Some(Ok(DataToken::ElementHeader { header, offset }))
                }
                Err(DecoderError::DecodeElementHeader {
                    source: dcmio_encoding::decode::Error::ReadHeaderTag { ref source, .. },
                    ..
                }) if source.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // if the end of input was reached while trying to read
                    // an element tag, the end of the DICOM object was
                    // reached gracefully
                    self.hard_break = true;
                    None
                }
                Err(e) => {
                    self.hard_break = true;
                    Some(Err(e).context(ReadHeaderSnafu))
                }
            }
        }
    }
}

impl<S> DataSetReader<S>
where
    S: StatefulDecode,
{
    fn update_seq_delimiters(&mut self) -> Option<DataToken> {
        if let Some(sq) = self.seq_delimiters.last() {
            if sq.len.is_defined() && self.parser.position() >= sq.base_offset + u64::from(sq.len.0)
            {
                let token = match sq.typ {
                    SeqTokenType::Item => {
                        // closed an explicit length item:
                        // expect more items or the end of the sequence
                        self.in_sequence = true;
                        DataToken::ItemEnd
                    }
                    SeqTokenType::Sequence => {
                        self.in_sequence = false;
                        DataToken::SequenceEnd
                    }
                };
                self.seq_delimiters.pop();
                // the enclosing structure may end at the same position
                self.delimiter_check_pending = true;
                return Some(token);
            }
        }
        self.delimiter_check_pending = false;
        None
    }

    fn push_sequence_token(&mut self, typ: SeqTokenType, len: Length, pixel_data: bool) {
        self.seq_delimiters.push(SeqToken {
            typ,
            len,
            pixel_data,
            base_offset: self.parser.position(),
        })
    }

    fn read_value(&mut self, header: &DataElementHeader) -> Result<dcmio_core::PrimitiveValue> {
        match self.options.value_read {
            ValueReadStrategy::Interpreted => self.parser.read_value(header),
            ValueReadStrategy::Preserved => self.parser.read_value_preserved(header),
            ValueReadStrategy::Raw => self.parser.read_value_bytes(header),
        }
        .context(ReadValueSnafu { tag: header.tag })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::dictionary::StandardDataDictionary;
    use dcmio_core::PrimitiveValue;
    use dcmio_encoding::transfer_syntax::{
        EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
    };

    fn collect_tokens(data: &[u8], ts: &TransferSyntax) -> Vec<DataToken> {
        let reader = DataSetReader::new_with_dict(
            data,
            StandardDataDictionary,
            ts,
            DataSetReaderOptions::default(),
        );
        reader.map(|t| t.expect("token")).collect()
    }

    #[test]
    fn read_flat_data_set() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0x08, 0x00, 0x60, 0x00, // (0008,0060) Modality
                b'C', b'S', 0x02, 0x00,
                b'M', b'R',
            0x10, 0x00, 0x10, 0x00, // (0010,0010) Patient Name
                b'P', b'N', 0x08, 0x00,
                b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
        ];
        let tokens = collect_tokens(raw, &EXPLICIT_VR_LITTLE_ENDIAN);
        assert_eq!(tokens.len(), 4);
        assert_eq!(
            tokens[1],
            DataToken::PrimitiveValue(PrimitiveValue::strs(["MR"]))
        );
        assert_eq!(
            tokens[3],
            DataToken::PrimitiveValue(PrimitiveValue::strs(["Doe^John"]))
        );
        // header tokens carry their byte offsets
        match (&tokens[0], &tokens[2]) {
            (
                DataToken::ElementHeader { offset: o1, .. },
                DataToken::ElementHeader { offset: o2, .. },
            ) => {
                assert_eq!(*o1, 0);
                assert_eq!(*o2, 10);
            }
            other => panic!("unexpected tokens: {:?}", other),
        }
    }

    #[test]
    fn read_delimited_sequence() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0x08, 0x00, 0x15, 0x11, // (0008,1115) Referenced Series Sequence
                b'S', b'Q', 0x00, 0x00,
                0xFF, 0xFF, 0xFF, 0xFF, // undefined length
            0xFE, 0xFF, 0x00, 0xE0, // item
                0xFF, 0xFF, 0xFF, 0xFF, // undefined length
            0x08, 0x00, 0x50, 0x11, // (0008,1150) Referenced SOP Class UID
                b'U', b'I', 0x04, 0x00,
                b'1', b'.', b'2', b'\0',
            0xFE, 0xFF, 0x0D, 0xE0, // item delimiter
                0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0, // sequence delimiter
                0x00, 0x00, 0x00, 0x00,
        ];
        let tokens = collect_tokens(raw, &EXPLICIT_VR_LITTLE_ENDIAN);
        assert_eq!(
            tokens,
            vec![
                DataToken::SequenceStart {
                    tag: Tag(0x0008, 0x1115),
                    len: Length::UNDEFINED,
                    offset: 0,
                },
                DataToken::ItemStart {
                    len: Length::UNDEFINED
                },
                DataToken::ElementHeader {
                    header: DataElementHeader::new((0x0008, 0x1150), VR::UI, Length(4)),
                    offset: 20,
                },
                DataToken::PrimitiveValue(PrimitiveValue::strs(["1.2"])),
                DataToken::ItemEnd,
                DataToken::SequenceEnd,
            ]
        );
    }

    #[test]
    fn read_explicit_length_sequence_in_implicit_vr() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0x08, 0x00, 0x15, 0x11, // (0008,1115) Referenced Series Sequence
                0x14, 0x00, 0x00, 0x00, // length: 20
            0xFE, 0xFF, 0x00, 0xE0, // item
                0x0C, 0x00, 0x00, 0x00, // length: 12
            0x08, 0x00, 0x50, 0x11, // (0008,1150)
                0x04, 0x00, 0x00, 0x00, // length: 4
                b'1', b'.', b'2', b'\0',
            0x10, 0x00, 0x10, 0x00, // (0010,0010) after the sequence
                0x04, 0x00, 0x00, 0x00,
                b'A', b'^', b'B', b' ',
        ];
        let tokens = collect_tokens(raw, &IMPLICIT_VR_LITTLE_ENDIAN);
        assert_eq!(
            tokens,
            vec![
                DataToken::SequenceStart {
                    tag: Tag(0x0008, 0x1115),
                    len: Length(20),
                    offset: 0,
                },
                DataToken::ItemStart { len: Length(12) },
                DataToken::ElementHeader {
                    header: DataElementHeader::new((0x0008, 0x1150), VR::UI, Length(4)),
                    offset: 16,
                },
                DataToken::PrimitiveValue(PrimitiveValue::strs(["1.2"])),
                DataToken::ItemEnd,
                DataToken::SequenceEnd,
                DataToken::ElementHeader {
                    header: DataElementHeader::new((0x0010, 0x0010), VR::PN, Length(4)),
                    offset: 28,
                },
                DataToken::PrimitiveValue(PrimitiveValue::strs(["A^B"])),
            ]
        );
    }

    #[test]
    fn read_encapsulated_pixel_data() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0xE0, 0x7F, 0x10, 0x00, // (7FE0,0010) Pixel Data
                b'O', b'B', 0x00, 0x00,
                0xFF, 0xFF, 0xFF, 0xFF, // undefined length
            0xFE, 0xFF, 0x00, 0xE0, // item: offset table
                0x04, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0x00, 0xE0, // item: one fragment
                0x04, 0x00, 0x00, 0x00,
                0x99, 0x88, 0x77, 0x66,
            0xFE, 0xFF, 0xDD, 0xE0, // sequence delimiter
                0x00, 0x00, 0x00, 0x00,
        ];
        let tokens = collect_tokens(raw, &EXPLICIT_VR_LITTLE_ENDIAN);
        assert_eq!(
            tokens,
            vec![
                DataToken::PixelSequenceStart { offset: 0 },
                DataToken::ItemStart { len: Length(4) },
                DataToken::OffsetTable(vec![0]),
                DataToken::ItemEnd,
                DataToken::ItemStart { len: Length(4) },
                DataToken::ItemValue(vec![0x99, 0x88, 0x77, 0x66]),
                DataToken::ItemEnd,
                DataToken::SequenceEnd,
            ]
        );
    }

    #[test]
    fn malformed_stream_is_surfaced() {
        // element header declares 8 bytes but only 4 are available
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0x10, 0x00, 0x10, 0x00,
                b'P', b'N', 0x08, 0x00,
                b'D', b'o', b'e', b'^',
        ];
        let reader = DataSetReader::new_with_dict(
            raw,
            StandardDataDictionary,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            DataSetReaderOptions::default(),
        );
        let tokens: Vec<_> = reader.collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].is_ok());
        assert!(matches!(tokens[1], Err(Error::ReadValue { .. })));
    }
}
