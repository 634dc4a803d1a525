//! Interpretation of raw value buffers as primitive values.
//!
//! The functions here are stateless: they take the value bytes as
//! already read from a stream, plus the byte order and character set
//! in effect, and build the corresponding [`PrimitiveValue`].
//! Keeping this logic independent from the stream means that a value
//! retained in its raw form (such as one with an unknown VR) can be
//! re-interpreted later without touching the source again.

use crate::text::{CharacterSetList, DecodeTextError, TextCodec};
use byteordered::byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use chrono::FixedOffset;
use dcmio_core::value::{deserialize, MultiplicityError, C};
use dcmio_core::{PrimitiveValue, Tag, ValueClass, VR};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not decode text value: {}", source))]
    DecodeText { source: DecodeTextError },
    #[snafu(display("could not parse {} value: {}", vr, source))]
    ParseValue {
        vr: VR,
        source: deserialize::Error,
    },
    #[snafu(display("malformed value: {}", source))]
    BadMultiplicity { source: MultiplicityError },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// How textual values are mapped to primitive values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ValueReadStrategy {
    /// Dates, times and textual numbers are parsed
    /// into their binary forms. Parsing failures fail the read.
    Interpreted,
    /// Every textual value is kept as a string,
    /// in its original form minus trailing padding.
    #[default]
    Preserved,
    /// Values are kept as raw byte buffers.
    Raw,
}

/// Interpret the given value bytes under the given value representation,
/// byte order and character set.
pub fn interpret_value(
    bytes: &[u8],
    vr: VR,
    endianness: Endianness,
    charsets: &CharacterSetList,
    strategy: ValueReadStrategy,
) -> Result<PrimitiveValue> {
    if bytes.is_empty() {
        return Ok(PrimitiveValue::Empty);
    }
    if strategy == ValueReadStrategy::Raw {
        return Ok(PrimitiveValue::U8(C::from_slice(bytes)));
    }
    match vr.value_class() {
        ValueClass::Text => interpret_text(bytes, vr, charsets, strategy),
        ValueClass::Binary => interpret_binary(bytes, vr, endianness),
        // unknown and sequence-like values stay as raw bytes
        ValueClass::Unknown | ValueClass::Sequence => {
            Ok(PrimitiveValue::U8(C::from_slice(bytes)))
        }
    }
}

fn interpret_text(
    bytes: &[u8],
    vr: VR,
    charsets: &CharacterSetList,
    strategy: ValueReadStrategy,
) -> Result<PrimitiveValue> {
    if !vr.is_multi_text() {
        // ST, LT, UT and UR admit no backslash splitting
        let text = charsets.decode(bytes).context(DecodeTextSnafu)?;
        return Ok(PrimitiveValue::Str(
            text.trim_end_matches([' ', '\0']).to_owned(),
        ));
    }

    let mut tokens: C<String> = charsets
        .decode_multi(bytes)
        .context(DecodeTextSnafu)?
        .into_iter()
        .collect();
    for token in &mut tokens {
        let trimmed = token.trim_end_matches([' ', '\0']).len();
        token.truncate(trimmed);
    }

    if strategy == ValueReadStrategy::Interpreted {
        match vr {
            VR::DA => {
                let dates = tokens
                    .iter()
                    .map(|t| deserialize::parse_date(t.as_bytes()))
                    .collect::<Result<C<_>, _>>()
                    .context(ParseValueSnafu { vr })?;
                return Ok(PrimitiveValue::Date(dates));
            }
            VR::TM => {
                let times = tokens
                    .iter()
                    .map(|t| deserialize::parse_time(t.as_bytes()))
                    .collect::<Result<C<_>, _>>()
                    .context(ParseValueSnafu { vr })?;
                return Ok(PrimitiveValue::Time(times));
            }
            VR::DT => {
                let default_offset = FixedOffset::east_opt(0).unwrap();
                let datetimes = tokens
                    .iter()
                    .map(|t| deserialize::parse_datetime(t.as_bytes(), default_offset))
                    .collect::<Result<C<_>, _>>()
                    .context(ParseValueSnafu { vr })?;
                return Ok(PrimitiveValue::DateTime(datetimes));
            }
            VR::IS => {
                let numbers = tokens
                    .iter()
                    .map(|t| deserialize::parse_integer(t.trim()))
                    .collect::<Result<C<i32>, _>>()
                    .context(ParseValueSnafu { vr })?;
                return Ok(PrimitiveValue::I32(numbers));
            }
            VR::DS => {
                let numbers = tokens
                    .iter()
                    .map(|t| deserialize::parse_decimal(t.trim()))
                    .collect::<Result<C<f64>, _>>()
                    .context(ParseValueSnafu { vr })?;
                return Ok(PrimitiveValue::F64(numbers));
            }
            _ => {}
        }
    }

    Ok(PrimitiveValue::Strs(tokens))
}

fn interpret_binary(bytes: &[u8], vr: VR, endianness: Endianness) -> Result<PrimitiveValue> {
    let stride = vr.stride().unwrap_or(1);
    PrimitiveValue::check_stride(bytes.len() as u32, stride).context(BadMultiplicitySnafu)?;
    let n = bytes.len() / stride;

    macro_rules! read_all {
        ($variant: ident, $typ: ty, $read: ident) => {{
            let mut values: C<$typ> = smallvec::smallvec![Default::default(); n];
            match endianness {
                Endianness::Little => LittleEndian::$read(bytes, &mut values),
                Endianness::Big => BigEndian::$read(bytes, &mut values),
            }
            Ok(PrimitiveValue::$variant(values))
        }};
    }

    match vr {
        VR::OB => Ok(PrimitiveValue::U8(C::from_slice(bytes))),
        VR::SS => read_all!(I16, i16, read_i16_into),
        VR::US | VR::OW => read_all!(U16, u16, read_u16_into),
        VR::SL => read_all!(I32, i32, read_i32_into),
        VR::UL | VR::OL => read_all!(U32, u32, read_u32_into),
        VR::SV => read_all!(I64, i64, read_i64_into),
        VR::UV | VR::OV => read_all!(U64, u64, read_u64_into),
        VR::FL | VR::OF => read_all!(F32, f32, read_f32_into),
        VR::FD | VR::OD => read_all!(F64, f64, read_f64_into),
        VR::AT => {
            let mut tags: C<Tag> = C::with_capacity(n);
            for chunk in bytes.chunks_exact(4) {
                let (g, e) = match endianness {
                    Endianness::Little => (
                        LittleEndian::read_u16(&chunk[0..2]),
                        LittleEndian::read_u16(&chunk[2..4]),
                    ),
                    Endianness::Big => (
                        BigEndian::read_u16(&chunk[0..2]),
                        BigEndian::read_u16(&chunk[2..4]),
                    ),
                };
                tags.push(Tag(g, e));
            }
            Ok(PrimitiveValue::Tags(tags))
        }
        _ => Ok(PrimitiveValue::U8(C::from_slice(bytes))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use smallvec::smallvec;

    fn default_cs() -> CharacterSetList {
        CharacterSetList::default()
    }

    #[test]
    fn binary_values_follow_byte_order() {
        let bytes = [0x00, 0x01, 0x10, 0x00];
        let value = interpret_value(
            &bytes,
            VR::US,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Preserved,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::U16(smallvec![256, 16]));

        let value = interpret_value(
            &bytes,
            VR::US,
            Endianness::Big,
            &default_cs(),
            ValueReadStrategy::Preserved,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::U16(smallvec![1, 0x1000]));
    }

    #[test]
    fn stride_mismatch_is_malformed() {
        let bytes = [0x00, 0x01, 0x10];
        assert!(matches!(
            interpret_value(
                &bytes,
                VR::US,
                Endianness::Little,
                &default_cs(),
                ValueReadStrategy::Preserved,
            ),
            Err(Error::BadMultiplicity { .. })
        ));
    }

    #[test]
    fn text_values_split_and_trim() {
        let value = interpret_value(
            b"DERIVED\\PRIMARY ",
            VR::CS,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Preserved,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::strs(["DERIVED", "PRIMARY"]));

        // single text VRs never split
        let value = interpret_value(
            b"no\\split here",
            VR::LT,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Preserved,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::Str("no\\split here".into()));
    }

    #[test]
    fn interpreted_strategy_parses_dates_and_numbers() {
        let value = interpret_value(
            b"19941012",
            VR::DA,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Interpreted,
        )
        .unwrap();
        assert_eq!(
            value,
            PrimitiveValue::Date(smallvec![NaiveDate::from_ymd_opt(1994, 10, 12).unwrap()])
        );

        let value = interpret_value(
            b"1.70",
            VR::DS,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Interpreted,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::F64(smallvec![1.70]));

        assert!(interpret_value(
            b"19941301",
            VR::DA,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Interpreted,
        )
        .is_err());
    }

    #[test]
    fn values_round_trip_through_encoding() {
        use crate::encode::{BasicEncode, BasicEncoder};

        let cases: Vec<(VR, PrimitiveValue)> = vec![
            (VR::US, PrimitiveValue::U16(smallvec![0, 65535])),
            (VR::SS, PrimitiveValue::I16(smallvec![-32768, 0, 32767])),
            (VR::UL, PrimitiveValue::U32(smallvec![0, 4_294_967_295])),
            (VR::SL, PrimitiveValue::I32(smallvec![-2_147_483_648, 1])),
            (VR::UV, PrimitiveValue::U64(smallvec![u64::MAX])),
            (VR::SV, PrimitiveValue::I64(smallvec![i64::MIN, 42])),
            // including subnormal floating point values
            (VR::FL, PrimitiveValue::F32(smallvec![0.0, -1.5, 1e-40])),
            (VR::FD, PrimitiveValue::F64(smallvec![0.0, -2.5, 5e-324])),
            (VR::AT, PrimitiveValue::Tags(smallvec![Tag(0x0028, 0x2110)])),
            (VR::OB, PrimitiveValue::U8(smallvec![1, 2, 3])),
            // a long string at the 64 character limit of LO
            (VR::LO, PrimitiveValue::strs(["X".repeat(64)])),
            (VR::PN, PrimitiveValue::strs(["Doe^John", "Roe^Jane"])),
        ];

        for endianness in [Endianness::Little, Endianness::Big] {
            let enc = BasicEncoder::new(endianness);
            for (vr, value) in &cases {
                let mut bytes = Vec::new();
                enc.encode_primitive(&mut bytes, value).unwrap();
                let back = interpret_value(
                    &bytes,
                    *vr,
                    endianness,
                    &default_cs(),
                    ValueReadStrategy::Preserved,
                )
                .unwrap();
                assert_eq!(&back, value, "VR {} under {:?}", vr, endianness);
            }
        }
    }

    #[test]
    fn unknown_vr_keeps_raw_bytes() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let value = interpret_value(
            &bytes,
            VR::UN,
            Endianness::Little,
            &default_cs(),
            ValueReadStrategy::Preserved,
        )
        .unwrap();
        assert_eq!(value, PrimitiveValue::U8(C::from_slice(&bytes)));
    }
}
