//! Explicit VR Little Endian transfer syntax decoding.

use crate::decode::basic::LittleEndianBasicDecoder;
use crate::decode::{
    BadSequenceHeaderSnafu, BasicDecode, Decode, DecodeFrom, InvalidVrSnafu, ReadHeaderTagSnafu,
    ReadItemHeaderSnafu, ReadItemLengthSnafu, ReadLengthSnafu, ReadReservedSnafu, ReadTagSnafu,
    ReadVrSnafu, Result,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmio_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmio_core::{Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// A data element decoder for the Explicit VR Little Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianDecoder {
    basic: LittleEndianBasicDecoder,
}

impl Decode for ExplicitVRLittleEndianDecoder {
    fn decode_header<S>(&self, mut source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let tag = self
            .basic
            .decode_tag(&mut source)
            .context(ReadHeaderTagSnafu)?;

        let mut buf = [0u8; 4];
        if tag.group() == 0xFFFE {
            // item delimiters do not have VR or reserved field
            source.read_exact(&mut buf).context(ReadItemLengthSnafu)?;
            let len = LittleEndian::read_u32(&buf);
            return Ok((
                DataElementHeader::new(tag, VR::UN, Length(len)),
                8, // tag + len
            ));
        }

        // retrieve explicit VR
        source.read_exact(&mut buf[0..2]).context(ReadVrSnafu)?;
        let vr = match VR::from_binary([buf[0], buf[1]]) {
            Some(vr) => vr,
            None => {
                return InvalidVrSnafu {
                    tag,
                    value: [buf[0], buf[1]],
                }
                .fail()
            }
        };

        // retrieve data length, in the form dictated by the VR
        let (len, bytes_read) = if vr.is_short_form() {
            // 2 bytes for the data length
            source.read_exact(&mut buf[0..2]).context(ReadLengthSnafu)?;
            (u32::from(LittleEndian::read_u16(&buf[0..2])), 8)
        } else {
            // 2 reserved bytes, then 4 bytes for the data length
            source
                .read_exact(&mut buf[0..2])
                .context(ReadReservedSnafu)?;
            source.read_exact(&mut buf).context(ReadLengthSnafu)?;
            (LittleEndian::read_u32(&buf), 12)
        };

        Ok((DataElementHeader::new(tag, vr, Length(len)), bytes_read))
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

impl<S: ?Sized> DecodeFrom<S> for ExplicitVRLittleEndianDecoder
where
    S: Read,
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
    use super::ExplicitVRLittleEndianDecoder;
    use crate::decode::{Decode, Error};
    use dcmio_core::header::{HasLength, Header, Length};
    use dcmio_core::{Tag, VR};
    use std::io::{Cursor, Seek, SeekFrom};

    // manually crafting some DICOM data elements
    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x02, 0x00, 0x02, 0x00,     // (0002,0002) Media Storage SOP Class UID
            b'U', b'I',             // VR: UI
            0x1A, 0x00,             // Length: 26 bytes
                b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
                b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.', b'1', b'.', b'1',
                0x00,               // padding to make length even
        0x10, 0x00, 0x20, 0x10,     // (0010,1020) Patient's Size
            b'D', b'S',             // VR: DS
            0x04, 0x00,             // Length: 4 bytes
                b'1', b'.', b'7', b'0',
        0x40, 0x00, 0x25, 0x92,     // (0040,9225) Real World Value Slope
            b'F', b'D',             // VR: FD
            0x08, 0x00,             // Length: 8 bytes
                // 3.141592653589793
                0x18, 0x2D, 0x44, 0x54, 0xFB, 0x21, 0x09, 0x40,
        0x08, 0x00, 0x1B, 0x04,     // (0008,041B) Record Key
            b'O', b'B',             // VR: OB
            0x00, 0x00,             // reserved
            0x02, 0x00, 0x00, 0x00, // Length: 2 bytes
                0x12, 0x34,
        0x01, 0xC0, 0x34, 0x12,     // (C001,1234) private data element
            b'U', b'N',             // VR: UN
            0x00, 0x00,             // reserved
            0x06, 0x00, 0x00, 0x00, // Length: 6 bytes
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
    ];

    fn read_n<'a>(cursor: &mut Cursor<&'a [u8]>, n: usize) -> &'a [u8] {
        let pos = cursor.position() as usize;
        let slice = &cursor.get_ref()[pos..pos + n];
        cursor.set_position((pos + n) as u64);
        slice
    }

    #[test]
    fn decode_data_elements() {
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(RAW);

        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0002, 0x0002));
        assert_eq!(elem.vr(), VR::UI);
        assert_eq!(elem.length(), Length(26));
        assert_eq!(bytes_read, 8);
        // read only half of the value data
        let buffer = read_n(&mut cursor, 13);
        assert_eq!(buffer, b"1.2.840.10008");
        // skip the rest (there is no automatic skipping)
        cursor.seek(SeekFrom::Current(13)).unwrap();

        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0010, 0x1020));
        assert_eq!(elem.vr(), VR::DS);
        assert_eq!(elem.length(), Length(4));
        assert_eq!(bytes_read, 8);
        assert_eq!(read_n(&mut cursor, 4), b"1.70");

        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0040, 0x9225));
        assert_eq!(elem.vr(), VR::FD);
        assert_eq!(elem.length(), Length(8));
        assert_eq!(
            read_n(&mut cursor, 8),
            &[0x18, 0x2D, 0x44, 0x54, 0xFB, 0x21, 0x09, 0x40]
        );

        // long form header
        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0008, 0x041B));
        assert_eq!(elem.vr(), VR::OB);
        assert_eq!(elem.length(), Length(2));
        assert_eq!(bytes_read, 12);
        assert_eq!(read_n(&mut cursor, 2), &[0x12, 0x34]);

        // private data element comes out as UN
        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0xC001, 0x1234));
        assert_eq!(elem.vr(), VR::UN);
        assert_eq!(elem.length(), Length(6));
    }

    #[test]
    fn invalid_vr_is_a_hard_error() {
        #[rustfmt::skip]
        let raw: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, // (0010,0010)
            0x00, 0x41,             // not a valid VR code
            0x02, 0x00,
            b'A', b'B',
        ];
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(raw);
        match dec.decode_header(&mut cursor) {
            Err(Error::InvalidVr { tag, value, .. }) => {
                assert_eq!(tag, Tag(0x0010, 0x0010));
                assert_eq!(value, [0x00, 0x41]);
            }
            other => panic!("expected invalid VR error, got {:?}", other),
        }
    }

    #[test]
    fn truncated_header_is_a_hard_error() {
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(&RAW[0..6]);
        assert!(matches!(
            dec.decode_header(&mut cursor),
            Err(Error::ReadLength { .. })
        ));
    }

    // manually crafting some DICOM sequence and item delimiters
    const RAW_SEQUENCE_ITEMS: &[u8] = &[
        0x08, 0x00, 0x3F, 0x10, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0x00,
        0xE0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, 0xFE, 0xFF,
        0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn decode_items() {
        let dec = ExplicitVRLittleEndianDecoder::default();
        let mut cursor = Cursor::new(RAW_SEQUENCE_ITEMS);

        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element header");
        assert_eq!(elem.tag(), Tag(0x0008, 0x103F));
        assert_eq!(elem.vr(), VR::SQ);
        assert!(elem.length().is_undefined());
        assert_eq!(bytes_read, 12);

        let elem = dec
            .decode_item_header(&mut cursor)
            .expect("should find an item header");
        assert!(elem.is_item());
        assert!(elem.length().is_undefined());

        let elem = dec
            .decode_item_header(&mut cursor)
            .expect("should find an item delimiter");
        assert!(elem.is_item_delimiter());

        let elem = dec
            .decode_item_header(&mut cursor)
            .expect("should find a sequence delimiter");
        assert!(elem.is_sequence_delimiter());
    }
}
