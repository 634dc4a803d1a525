//! A stateful abstraction for the full DICOM content reading process.
//!
//! The decoder owns the byte source and the codecs chosen by the
//! transfer syntax, keeps track of how many bytes were consumed,
//! and applies the character set switching mandated by the
//! _Specific Character Set_ element as it is encountered.

use dcmio_core::dictionary::DataDictionary;
use dcmio_core::header::{DataElementHeader, SequenceItemHeader};
use dcmio_core::{PrimitiveValue, Tag, VR};
use dcmio_encoding::decode::basic::BasicDecoder;
use dcmio_encoding::decode::primitive_value::{self, ValueReadStrategy};
use dcmio_encoding::decode::{BasicDecode, DecodeFrom, DynDecoder};
use dcmio_encoding::text::CharacterSetList;
use dcmio_encoding::TransferSyntax;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::Read;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not decode element header at position {}", position))]
    DecodeElementHeader {
        position: u64,
        #[snafu(backtrace)]
        source: dcmio_encoding::decode::Error,
    },
    #[snafu(display("could not decode item header at position {}", position))]
    DecodeItemHeader {
        position: u64,
        #[snafu(backtrace)]
        source: dcmio_encoding::decode::Error,
    },
    #[snafu(display(
        "could not read value data of {} bytes at position {}",
        len,
        position
    ))]
    ReadValueData {
        position: u64,
        len: u32,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("could not interpret value of element tagged {}", tag))]
    InterpretValue {
        tag: Tag,
        #[snafu(backtrace)]
        source: primitive_value::Error,
    },
    #[snafu(display(
        "undefined value length of element tagged {} at position {}",
        tag,
        position
    ))]
    UndefinedValueLength {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },
    #[snafu(display("cannot read the value of a sequence element tagged {}", tag))]
    ValueIsSequence { tag: Tag, backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Interface of a stateful DICOM content reader.
pub trait StatefulDecode {
    /// Decode the next data element header from the bound source.
    fn decode_header(&mut self) -> Result<DataElementHeader>;

    /// Decode the next sequence item header from the bound source.
    fn decode_item_header(&mut self) -> Result<SequenceItemHeader>;

    /// Eagerly read the following data as a primitive value,
    /// converting textual numbers and date-time values
    /// into their binary forms.
    fn read_value(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue>;

    /// Eagerly read the following data as a primitive value,
    /// preserving the original textual form of numbers
    /// and date-time values.
    fn read_value_preserved(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue>;

    /// Eagerly read the following data as a raw byte buffer,
    /// regardless of the value representation.
    fn read_value_bytes(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue>;

    /// Read `length` raw bytes into the given vector.
    fn read_to_vec(&mut self, length: u32, vec: &mut Vec<u8>) -> Result<()>;

    /// Read `length` bytes as a sequence of unsigned 32-bit integers
    /// in the stream's byte order, as found in basic offset tables.
    fn read_u32_to_vec(&mut self, length: u32, vec: &mut Vec<u32>) -> Result<()>;

    /// Retrieve the number of bytes read so far from the source.
    fn position(&self) -> u64;
}

/// A stateful abstraction for the full DICOM content reading process.
/// `D` is the element decoder chosen by the transfer syntax
/// and `S` is the byte source.
#[derive(Debug)]
pub struct StatefulDecoder<D, S> {
    from: S,
    decoder: D,
    basic: BasicDecoder,
    text: CharacterSetList,
    buffer: Vec<u8>,
    position: u64,
}

/// Alias for a dynamically resolved DICOM stateful decoder.
pub type DynStatefulDecoder<S> = StatefulDecoder<DynDecoder<S>, S>;

/// The initial capacity of the value reading buffer.
const PARSER_BUFFER_CAPACITY: usize = 2048;

impl<S> DynStatefulDecoder<S>
where
    S: Read,
{
    /// Create a new stateful decoder for the given transfer syntax,
    /// resolving implicit value representations through `dict`.
    pub fn new_with_dict<D>(from: S, ts: &TransferSyntax, dict: D) -> Self
    where
        D: DataDictionary + 'static,
    {
        StatefulDecoder::new(from, ts.decoder_with_dict(dict), ts.basic_decoder())
    }
}

impl<D, S> StatefulDecoder<D, S> {
    /// Create a new stateful decoder from its parts,
    /// with the default character repertoire.
    pub fn new(from: S, decoder: D, basic: BasicDecoder) -> Self {
        StatefulDecoder {
            from,
            decoder,
            basic,
            text: CharacterSetList::default(),
            buffer: Vec::with_capacity(PARSER_BUFFER_CAPACITY),
            position: 0,
        }
    }

    /// Replace the active character set list.
    pub fn set_character_set(&mut self, text: CharacterSetList) {
        self.text = text;
    }

    /// The character set list currently in effect.
    pub fn character_set(&self) -> &CharacterSetList {
        &self.text
    }
}

impl<D, S> StatefulDecoder<D, S>
where
    D: DecodeFrom<S>,
    S: Read,
{
    fn require_known_length(&self, header: &DataElementHeader) -> Result<usize> {
        header
            .len
            .get()
            .map(|len| len as usize)
            .ok_or_else(|| {
                UndefinedValueLengthSnafu {
                    tag: header.tag,
                    position: self.position,
                }
                .build()
            })
    }

    fn fill_buffer(&mut self, len: usize) -> Result<()> {
        self.buffer.clear();
        self.buffer.resize(len, 0);
        self.from
            .read_exact(&mut self.buffer)
            .context(ReadValueDataSnafu {
                position: self.position,
                len: len as u32,
            })?;
        self.position += len as u64;
        Ok(())
    }

    /// If the freshly read element is _Specific Character Set_,
    /// switch the active text decoder accordingly.
    /// An unsupported designator keeps the previous character set.
    fn maybe_switch_charset(&mut self, header: &DataElementHeader, value: &PrimitiveValue) {
        if header.tag != Tag(0x0008, 0x0005) {
            return;
        }
        let codes = value.to_multi_str();
        match CharacterSetList::from_codes(codes.iter().map(|c| c.as_str())) {
            Some(charsets) => self.text = charsets,
            None => tracing::warn!(
                "unsupported specific character set {:?}, keeping the previous one",
                codes
            ),
        }
    }

    fn read_value_with(
        &mut self,
        header: &DataElementHeader,
        strategy: ValueReadStrategy,
    ) -> Result<PrimitiveValue> {
        if header.vr() == VR::SQ {
            return ValueIsSequenceSnafu { tag: header.tag }.fail();
        }
        let len = self.require_known_length(header)?;
        self.fill_buffer(len)?;
        let value = primitive_value::interpret_value(
            &self.buffer,
            header.vr(),
            self.basic.endianness(),
            &self.text,
            strategy,
        )
        .context(InterpretValueSnafu { tag: header.tag })?;
        self.maybe_switch_charset(header, &value);
        Ok(value)
    }
}

impl<D, S> StatefulDecode for StatefulDecoder<D, S>
where
    D: DecodeFrom<S>,
    S: Read,
{
    fn decode_header(&mut self) -> Result<DataElementHeader> {
        let (header, bytes_read) =
            self.decoder
                .decode_header(&mut self.from)
                .context(DecodeElementHeaderSnafu {
                    position: self.position,
                })?;
        self.position += bytes_read as u64;
        Ok(header)
    }

    fn decode_item_header(&mut self) -> Result<SequenceItemHeader> {
        let header = self
            .decoder
            .decode_item_header(&mut self.from)
            .context(DecodeItemHeaderSnafu {
                position: self.position,
            })?;
        self.position += 8;
        Ok(header)
    }

    fn read_value(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue> {
        self.read_value_with(header, ValueReadStrategy::Interpreted)
    }

    fn read_value_preserved(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue> {
        self.read_value_with(header, ValueReadStrategy::Preserved)
    }

    fn read_value_bytes(&mut self, header: &DataElementHeader) -> Result<PrimitiveValue> {
        self.read_value_with(header, ValueReadStrategy::Raw)
    }

    fn read_to_vec(&mut self, length: u32, vec: &mut Vec<u8>) -> Result<()> {
        let start = vec.len();
        vec.resize(start + length as usize, 0);
        self.from
            .read_exact(&mut vec[start..])
            .context(ReadValueDataSnafu {
                position: self.position,
                len: length,
            })?;
        self.position += u64::from(length);
        Ok(())
    }

    fn read_u32_to_vec(&mut self, length: u32, vec: &mut Vec<u32>) -> Result<()> {
        self.fill_buffer(length as usize)?;
        vec.reserve(length as usize / 4);
        for chunk in self.buffer.chunks_exact(4) {
            // offset tables are always little endian in practice,
            // but honor the stream's byte order for consistency
            let v = self
                .basic
                .decode_ul(chunk)
                .context(ReadValueDataSnafu {
                    position: self.position,
                    len: length,
                })?;
            vec.push(v);
        }
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::dictionary::StandardDataDictionary;
    use dcmio_core::{Length, PrimitiveValue};
    use dcmio_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN;

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x08, 0x00, 0x05, 0x00,     // (0008,0005) Specific Character Set
            b'C', b'S',
            0x0A, 0x00,             // Length: 10
                b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'9', b'2',
        0x10, 0x00, 0x10, 0x00,     // (0010,0010) Patient Name
            b'P', b'N',
            0x10, 0x00,             // Length: 16
                0xC3, 0x84, b'n', b'e', b'a', b's', b'^', b'R',
                0xC3, 0xBC, b'd', b'i', b'g', b'e', b'r', b' ',
    ];

    #[test]
    fn charset_switches_mid_read() {
        let mut decoder = DynStatefulDecoder::new_with_dict(
            RAW,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StandardDataDictionary,
        );

        let header = decoder.decode_header().unwrap();
        assert_eq!(header.tag, Tag(0x0008, 0x0005));
        let value = decoder.read_value_preserved(&header).unwrap();
        assert_eq!(value.string().unwrap(), "ISO_IR 192");

        let header = decoder.decode_header().unwrap();
        assert_eq!(header.tag, Tag(0x0010, 0x0010));
        assert_eq!(header.len, Length(16));
        let value = decoder.read_value_preserved(&header).unwrap();
        assert_eq!(value.string().unwrap(), "Äneas^Rüdiger");

        assert_eq!(decoder.position(), RAW.len() as u64);
    }

    #[test]
    fn sequence_values_are_rejected() {
        let mut decoder = DynStatefulDecoder::new_with_dict(
            RAW,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StandardDataDictionary,
        );
        let header = DataElementHeader::new((0x0008, 0x1115), VR::SQ, Length::UNDEFINED);
        assert!(matches!(
            decoder.read_value_preserved(&header),
            Err(Error::ValueIsSequence { .. })
        ));
    }

    #[test]
    fn truncated_value_is_a_hard_error() {
        let mut decoder = DynStatefulDecoder::new_with_dict(
            &RAW[..12],
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StandardDataDictionary,
        );
        let header = decoder.decode_header().unwrap();
        assert!(matches!(
            decoder.read_value_preserved(&header),
            Err(Error::ReadValueData { .. })
        ));
    }

    #[test]
    fn raw_strategy_keeps_bytes() {
        let mut decoder = DynStatefulDecoder::new_with_dict(
            RAW,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StandardDataDictionary,
        );
        let header = decoder.decode_header().unwrap();
        let value = decoder.read_value_bytes(&header).unwrap();
        assert_eq!(
            value,
            PrimitiveValue::from(&b"ISO_IR 192"[..])
        );
    }
}
