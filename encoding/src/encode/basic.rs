//! This module provides implementations for basic encoders:
//! little endian and big endian.

use super::BasicEncode;
use byteordered::{ByteOrdered, Endianness};
use std::io::Write;

type Result<T> = std::io::Result<T>;

/// A basic encoder of DICOM primitive values in little endian.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LittleEndianBasicEncoder;

impl BasicEncode for LittleEndianBasicEncoder {
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }

    fn encode_us<W>(&self, to: W, value: u16) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_u16(value)
    }

    fn encode_ul<W>(&self, to: W, value: u32) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_u32(value)
    }

    fn encode_uv<W>(&self, to: W, value: u64) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_u64(value)
    }

    fn encode_ss<W>(&self, to: W, value: i16) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_i16(value)
    }

    fn encode_sl<W>(&self, to: W, value: i32) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_i32(value)
    }

    fn encode_sv<W>(&self, to: W, value: i64) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_i64(value)
    }

    fn encode_fl<W>(&self, to: W, value: f32) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_f32(value)
    }

    fn encode_fd<W>(&self, to: W, value: f64) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::le(to).write_f64(value)
    }
}

/// A basic encoder of DICOM primitive values in big endian.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BigEndianBasicEncoder;

impl BasicEncode for BigEndianBasicEncoder {
    fn endianness(&self) -> Endianness {
        Endianness::Big
    }

    fn encode_us<W>(&self, to: W, value: u16) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_u16(value)
    }

    fn encode_ul<W>(&self, to: W, value: u32) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_u32(value)
    }

    fn encode_uv<W>(&self, to: W, value: u64) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_u64(value)
    }

    fn encode_ss<W>(&self, to: W, value: i16) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_i16(value)
    }

    fn encode_sl<W>(&self, to: W, value: i32) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_i32(value)
    }

    fn encode_sv<W>(&self, to: W, value: i64) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_i64(value)
    }

    fn encode_fl<W>(&self, to: W, value: f32) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_f32(value)
    }

    fn encode_fd<W>(&self, to: W, value: f64) -> Result<()>
    where
        W: Write,
    {
        ByteOrdered::be(to).write_f64(value)
    }
}

/// A basic encoder with support for both little endian and big endian
/// encoding, decided at run-time.
#[derive(Debug, Clone)]
pub enum BasicEncoder {
    /// Encode in little endian
    LE(LittleEndianBasicEncoder),
    /// Encode in big endian
    BE(BigEndianBasicEncoder),
}

impl BasicEncoder {
    /// Create a basic encoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        match endianness {
            Endianness::Little => BasicEncoder::LE(LittleEndianBasicEncoder),
            Endianness::Big => BasicEncoder::BE(BigEndianBasicEncoder),
        }
    }
}

impl From<Endianness> for BasicEncoder {
    fn from(endianness: Endianness) -> Self {
        BasicEncoder::new(endianness)
    }
}

macro_rules! for_both {
    ($s: expr, |$e: ident| $f: expr) => {
        match *$s {
            BasicEncoder::LE(ref $e) => $f,
            BasicEncoder::BE(ref $e) => $f,
        }
    };
}

impl BasicEncode for BasicEncoder {
    fn endianness(&self) -> Endianness {
        match self {
            BasicEncoder::LE(_) => Endianness::Little,
            BasicEncoder::BE(_) => Endianness::Big,
        }
    }

    fn encode_us<W>(&self, to: W, value: u16) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_us(to, value))
    }

    fn encode_ul<W>(&self, to: W, value: u32) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_ul(to, value))
    }

    fn encode_uv<W>(&self, to: W, value: u64) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_uv(to, value))
    }

    fn encode_ss<W>(&self, to: W, value: i16) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_ss(to, value))
    }

    fn encode_sl<W>(&self, to: W, value: i32) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_sl(to, value))
    }

    fn encode_sv<W>(&self, to: W, value: i64) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_sv(to, value))
    }

    fn encode_fl<W>(&self, to: W, value: f32) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_fl(to, value))
    }

    fn encode_fd<W>(&self, to: W, value: f64) -> Result<()>
    where
        W: Write,
    {
        for_both!(self, |e| e.encode_fd(to, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::BasicEncode;
    use dcmio_core::PrimitiveValue;
    use smallvec::smallvec;

    #[test]
    fn encode_both_endiannesses() {
        let mut out = Vec::new();
        LittleEndianBasicEncoder.encode_us(&mut out, 0x0201).unwrap();
        BigEndianBasicEncoder.encode_us(&mut out, 0x0102).unwrap();
        assert_eq!(out, [0x01, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn encode_primitive_values() {
        let enc = BasicEncoder::new(byteordered::Endianness::Little);

        let mut out = Vec::new();
        let bytes = enc
            .encode_primitive(&mut out, &PrimitiveValue::U16(smallvec![256, 0, 16]))
            .unwrap();
        assert_eq!(bytes, 6);
        assert_eq!(out, [0x00, 0x01, 0x00, 0x00, 0x10, 0x00]);

        let mut out = Vec::new();
        let bytes = enc
            .encode_primitive(&mut out, &PrimitiveValue::strs(["DERIVED", "PRIMARY"]))
            .unwrap();
        assert_eq!(bytes, 15);
        assert_eq!(out, b"DERIVED\\PRIMARY");
    }
}
