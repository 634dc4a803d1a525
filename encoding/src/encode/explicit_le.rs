//! Explicit VR Little Endian transfer syntax encoding.

use crate::encode::basic::LittleEndianBasicEncoder;
use crate::encode::{
    BasicEncode, Encode, EncodeTo, Result, WriteItemHeaderSnafu, WriteLengthSnafu,
    WriteReservedSnafu, WriteTagSnafu, WriteVrSnafu,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmio_core::{DataElementHeader, PrimitiveValue, Tag};
use snafu::ResultExt;
use std::io::Write;

/// A data element encoder for the Explicit VR Little Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianEncoder {
    basic: LittleEndianBasicEncoder,
}

impl Encode for ExplicitVRLittleEndianEncoder {
    fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u16(&mut buf[0..2], tag.group());
        LittleEndian::write_u16(&mut buf[2..4], tag.element());
        to.write_all(&buf).context(WriteTagSnafu)
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        Encode::encode_tag(self, &mut to, de.tag)?;
        to.write_all(&de.vr.to_bytes()).context(WriteVrSnafu)?;

        if de.vr.is_short_form() {
            let mut buf = [0u8; 2];
            LittleEndian::write_u16(&mut buf, de.len.0 as u16);
            to.write_all(&buf).context(WriteLengthSnafu)?;
            Ok(8)
        } else {
            to.write_all(&[0u8; 2]).context(WriteReservedSnafu)?;
            let mut buf = [0u8; 4];
            LittleEndian::write_u32(&mut buf, de.len.0);
            to.write_all(&buf).context(WriteLengthSnafu)?;
            Ok(12)
        }
    }

    fn encode_item_header<W>(&self, mut to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..4], 0xE000);
        LittleEndian::write_u32(&mut buf[4..8], len);
        to.write_all(&buf).context(WriteItemHeaderSnafu)
    }

    fn encode_item_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..4], 0xE00D);
        to.write_all(&buf).context(WriteItemHeaderSnafu)
    }

    fn encode_sequence_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..4], 0xE0DD);
        to.write_all(&buf).context(WriteItemHeaderSnafu)
    }

    fn encode_primitive_value<W>(&self, to: W, value: &PrimitiveValue) -> Result<usize>
    where
        W: Write,
    {
        self.basic.encode_primitive(to, value)
    }
}

impl<W: ?Sized> EncodeTo<W> for ExplicitVRLittleEndianEncoder
where
    W: Write,
{
    fn encode_tag(&self, to: &mut W, tag: Tag) -> Result<()> {
        Encode::encode_tag(self, to, tag)
    }

    fn encode_element_header(&self, to: &mut W, de: DataElementHeader) -> Result<usize> {
        Encode::encode_element_header(self, to, de)
    }

    fn encode_item_header(&self, to: &mut W, len: u32) -> Result<()> {
        Encode::encode_item_header(self, to, len)
    }

    fn encode_item_delimiter(&self, to: &mut W) -> Result<()> {
        Encode::encode_item_delimiter(self, to)
    }

    fn encode_sequence_delimiter(&self, to: &mut W) -> Result<()> {
        Encode::encode_sequence_delimiter(self, to)
    }

    fn encode_primitive_value(&self, to: &mut W, value: &PrimitiveValue) -> Result<usize> {
        Encode::encode_primitive_value(self, to, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::{Length, VR};

    #[test]
    fn short_form_header() {
        let enc = ExplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        let de = DataElementHeader::new((0x0010, 0x0010), VR::PN, Length(8));
        let bytes = Encode::encode_element_header(&enc, &mut out, de).unwrap();
        assert_eq!(bytes, 8);
        assert_eq!(
            out,
            [0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00]
        );
    }

    #[test]
    fn long_form_header() {
        let enc = ExplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        let de = DataElementHeader::new((0x0008, 0x041B), VR::OB, Length(2));
        let bytes = Encode::encode_element_header(&enc, &mut out, de).unwrap();
        assert_eq!(bytes, 12);
        assert_eq!(
            out,
            [0x08, 0x00, 0x1B, 0x04, b'O', b'B', 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn delimiters() {
        let enc = ExplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        Encode::encode_item_header(&enc, &mut out, 0xFFFF_FFFF).unwrap();
        Encode::encode_item_delimiter(&enc, &mut out).unwrap();
        Encode::encode_sequence_delimiter(&enc, &mut out).unwrap();
        assert_eq!(
            out,
            [
                0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF, // item
                0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, // item delimiter
                0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // sequence delimiter
            ]
        );
    }
}
