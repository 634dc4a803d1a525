//! Implicit VR Little Endian transfer syntax decoding.
//!
//! Since the data stream does not carry value representations,
//! the decoder resolves them through a data dictionary,
//! falling back to the unknown VR when the attribute is not listed.

use crate::decode::basic::LittleEndianBasicDecoder;
use crate::decode::{
    BadSequenceHeaderSnafu, BasicDecode, Decode, DecodeFrom, ReadHeaderTagSnafu,
    ReadItemHeaderSnafu, ReadLengthSnafu, ReadTagSnafu, Result,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmio_core::dictionary::{DataDictionary, DictionaryEntry, StandardDataDictionary};
use dcmio_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmio_core::{Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// A data element decoder for the Implicit VR Little Endian transfer syntax,
/// using the data dictionary `D` for value representation resolution.
#[derive(Debug, Clone)]
pub struct ImplicitVRLittleEndianDecoder<D = StandardDataDictionary> {
    basic: LittleEndianBasicDecoder,
    dict: D,
}

impl Default for ImplicitVRLittleEndianDecoder<StandardDataDictionary> {
    fn default() -> Self {
        ImplicitVRLittleEndianDecoder::with_dict(StandardDataDictionary)
    }
}

impl<D> ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    /// Retrieve this decoder using a custom data dictionary.
    pub fn with_dict(dict: D) -> Self {
        ImplicitVRLittleEndianDecoder {
            basic: LittleEndianBasicDecoder,
            dict,
        }
    }

    /// Resolve the value representation of the given tag.
    ///
    /// Group length elements are always UL and private creators LO;
    /// everything else is resolved through the dictionary,
    /// defaulting to the unknown VR. In particular, private data
    /// elements stay unknown until a creator registration re-types them.
    fn resolve_vr(&self, tag: Tag) -> VR {
        if tag.element() == 0x0000 {
            return VR::UL;
        }
        if tag.is_private_creator() {
            return VR::LO;
        }
        self.dict
            .get_by_tag(tag)
            .map(|entry| entry.vr())
            .unwrap_or(VR::UN)
    }
}

impl<D> Decode for ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    fn decode_header<S>(&self, mut source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let tag = self
            .basic
            .decode_tag(&mut source)
            .context(ReadHeaderTagSnafu)?;

        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadLengthSnafu)?;
        let len = LittleEndian::read_u32(&buf);

        // sequence delimiters are items, not data elements
        let vr = if tag.group() == 0xFFFE {
            VR::UN
        } else if len == 0xFFFF_FFFF {
            // an undefined length can only introduce item structure,
            // regardless of what the dictionary claims
            VR::SQ
        } else {
            self.resolve_vr(tag)
        };

        Ok((DataElementHeader::new(tag, vr, Length(len)), 8))
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf).context(ReadItemHeaderSnafu)?;
        let group = LittleEndian::read_u16(&buf[0..2]);
        let element = LittleEndian::read_u16(&buf[2..4]);
        let len = LittleEndian::read_u32(&buf[4..8]);

        SequenceItemHeader::new((group, element), Length(len)).context(BadSequenceHeaderSnafu)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadTagSnafu)?;
        Ok(Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        ))
    }
}

impl<S: ?Sized, D> DecodeFrom<S> for ImplicitVRLittleEndianDecoder<D>
where
    S: Read,
    D: DataDictionary,
{
    #[inline]
    fn decode_header(&self, source: &mut S) -> Result<(DataElementHeader, usize)> {
        Decode::decode_header(self, source)
    }

    #[inline]
    fn decode_item_header(&self, source: &mut S) -> Result<SequenceItemHeader> {
        Decode::decode_item_header(self, source)
    }

    #[inline]
    fn decode_tag(&self, source: &mut S) -> Result<Tag> {
        Decode::decode_tag(self, source)
    }
}

#[cfg(test)]
mod tests {
    use super::ImplicitVRLittleEndianDecoder;
    use crate::decode::Decode;
    use dcmio_core::dictionary::StubDataDictionary;
    use dcmio_core::header::{HasLength, Header, Length};
    use dcmio_core::{Tag, VR};
    use std::io::Cursor;

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x10, 0x00, 0x10, 0x00, // (0010,0010) Patient Name
        0x08, 0x00, 0x00, 0x00, // Length: 8
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
        0x09, 0x00, 0x10, 0x00, // (0009,0010) private creator
        0x08, 0x00, 0x00, 0x00, // Length: 8
            b'A', b'C', b'M', b'E', b' ', b'1', b'.', b'0',
        0x09, 0x00, 0x01, 0x10, // (0009,1001) private data element
        0x02, 0x00, 0x00, 0x00, // Length: 2
            0x12, 0x34,
    ];

    #[test]
    fn decode_with_standard_dictionary() {
        let dec = ImplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(RAW);

        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0010, 0x0010));
        assert_eq!(elem.vr(), VR::PN);
        assert_eq!(elem.length(), Length(8));
        assert_eq!(bytes_read, 8);
        cursor.set_position(cursor.position() + 8);

        // private creator resolves to LO
        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0009, 0x0010));
        assert_eq!(elem.vr(), VR::LO);
        cursor.set_position(cursor.position() + 8);

        // private data element stays unknown
        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0009, 0x1001));
        assert_eq!(elem.vr(), VR::UN);
    }

    #[test]
    fn unlisted_attributes_default_to_unknown() {
        let dec = ImplicitVRLittleEndianDecoder::with_dict(StubDataDictionary);
        let mut cursor = Cursor::new(RAW);
        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0010, 0x0010));
        assert_eq!(elem.vr(), VR::UN);
    }
}
