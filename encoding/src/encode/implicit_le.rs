//! Implicit VR Little Endian transfer syntax encoding.
//!
//! The VR is not written to the stream; every header takes 8 bytes.

use crate::encode::basic::LittleEndianBasicEncoder;
use crate::encode::{
    BasicEncode, Encode, EncodeTo, Result, WriteItemHeaderSnafu, WriteLengthSnafu, WriteTagSnafu,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmio_core::{DataElementHeader, PrimitiveValue, Tag};
use snafu::ResultExt;
use std::io::Write;

/// A data element encoder for the Implicit VR Little Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ImplicitVRLittleEndianEncoder {
    basic: LittleEndianBasicEncoder,
}

impl Encode for ImplicitVRLittleEndianEncoder {
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
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, de.len.0);
        to.write_all(&buf).context(WriteLengthSnafu)?;
        Ok(8)
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

impl<W: ?Sized> EncodeTo<W> for ImplicitVRLittleEndianEncoder
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
    fn all_headers_are_eight_bytes() {
        let enc = ImplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        let de = DataElementHeader::new((0x0010, 0x0010), VR::PN, Length(8));
        let bytes = Encode::encode_element_header(&enc, &mut out, de).unwrap();
        assert_eq!(bytes, 8);
        assert_eq!(out, [0x10, 0x00, 0x10, 0x00, 0x08, 0x00, 0x00, 0x00]);

        let mut out = Vec::new();
        let de = DataElementHeader::new((0x7FE0, 0x0010), VR::OW, Length(4));
        let bytes = Encode::encode_element_header(&enc, &mut out, de).unwrap();
        assert_eq!(bytes, 8);
        assert_eq!(out, [0xE0, 0x7F, 0x10, 0x00, 0x04, 0x00, 0x00, 0x00]);
    }
}
