//! Reusable components for encoding and decoding text in DICOM
//! data structures, including support for character repertoires
//! and ISO 2022 code extensions.
//!
//! A data set designates its text encoding through the
//! _Specific Character Set_ element (0008,0005):
//! an ordered list of character set designators,
//! where the first entry is the default repertoire
//! and the remaining ones are switched in and out
//! through escape sequences embedded in the text.
//! [`CharacterSetList`] models that designator list;
//! [`SpecificCharacterSet`] enumerates the individual repertoires.

use encoding::all::{
    EUC_JP, GB18030, ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, UTF_8,
    WINDOWS_949,
};
use encoding::{DecoderTrap, EncoderTrap, Encoding, RawDecoder, StringWriter};
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;

/// The escape byte starting an ISO 2022 designation sequence.
const ESC: u8 = 0x1B;

/// An error type for text encoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeTextError {
    /// A custom error message,
    /// for when the underlying error type does not encode error semantics
    /// into type variants.
    #[snafu(display("{}", message))]
    EncodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// The designated character sets cannot represent a portion
    /// of the given text.
    #[snafu(display("no designated character set can encode `{}`", text))]
    Unmappable {
        /// The text run that could not be encoded.
        text: String,
        backtrace: Backtrace,
    },
}

/// An error type for text decoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeTextError {
    /// A custom error message,
    /// for when the underlying error type does not encode error semantics
    /// into type variants.
    #[snafu(display("{}", message))]
    DecodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
    /// An escape sequence does not designate any of the
    /// character sets declared for the data set.
    #[snafu(display("escape sequence {:?} matches no designated character set", sequence))]
    UnknownEscapeSequence {
        /// The bytes following the escape character.
        sequence: Vec<u8>,
        backtrace: Backtrace,
    },
}

type EncodeResult<T> = Result<T, EncodeTextError>;
type DecodeResult<T> = Result<T, DecodeTextError>;

/// A holder of encoding and decoding mechanisms for text in DICOM content,
/// which according to the standard, depends on the specific character set.
pub trait TextCodec {
    /// Obtain the defined term (unique name) of the text encoding,
    /// which may be used as the value of a
    /// Specific Character Set (0008,0005) element to refer to this codec.
    ///
    /// Should contain no leading or trailing spaces.
    fn name(&self) -> &'static str;

    /// Decode the given byte buffer as a single string. The resulting string
    /// _may_ contain backslash characters ('\') to delimit individual values,
    /// and should be split later on if required.
    fn decode(&self, text: &[u8]) -> DecodeResult<String>;

    /// Encode a text value into a byte vector. The input string can
    /// feature multiple text values by using the backslash character ('\')
    /// as the value delimiter.
    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>>;
}

impl<T: ?Sized> TextCodec for Box<T>
where
    T: TextCodec,
{
    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        self.as_ref().decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        self.as_ref().encode(text)
    }
}

impl<'a, T: ?Sized> TextCodec for &'a T
where
    T: TextCodec,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        (**self).decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        (**self).encode(text)
    }
}

/// An enum type for all supported character repertoires.
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SpecificCharacterSet {
    /// **ISO-IR 6**: the default character repertoire.
    Default,
    /// **ISO-IR 100** (ISO-8859-1): Latin alphabet no. 1,
    /// the Western Europe character set.
    IsoIr100,
    /// **ISO-IR 101** (ISO-8859-2): Latin alphabet no. 2,
    /// the Central/Eastern Europe character set.
    IsoIr101,
    /// **ISO-IR 109** (ISO-8859-3): Latin alphabet no. 3,
    /// the South Europe character set.
    IsoIr109,
    /// **ISO-IR 110** (ISO-8859-4): Latin alphabet no. 4,
    /// the North Europe character set.
    IsoIr110,
    /// **ISO-IR 144** (ISO-8859-5): the Latin/Cyrillic character set.
    IsoIr144,
    /// **ISO-IR 87** (JIS X 0208): the Japanese multi-byte character set,
    /// usable only through ISO 2022 code extensions.
    IsoIr87,
    /// **ISO-IR 149** (KS X 1001): the Korean multi-byte character set,
    /// usable only through ISO 2022 code extensions.
    IsoIr149,
    /// **ISO-IR 192**: the Unicode character set in UTF-8.
    IsoIr192,
    /// **GB18030**: the Simplified Chinese character set.
    Gb18030,
}

impl Default for SpecificCharacterSet {
    fn default() -> Self {
        SpecificCharacterSet::Default
    }
}

impl SpecificCharacterSet {
    /// Obtain the specific character set identified by the given code string.
    ///
    /// Supported code strings include the possible values
    /// of the elements in _Specific Character Set_ (0008,0005).
    /// An empty code resolves to the default repertoire.
    pub fn from_code(code: &str) -> Option<Self> {
        use self::SpecificCharacterSet::*;
        match code.trim_end() {
            "" | "ISO_IR_6" | "ISO_IR 6" | "ISO 2022 IR 6" => Some(Default),
            "ISO_IR_100" | "ISO_IR 100" | "ISO 2022 IR 100" => Some(IsoIr100),
            "ISO_IR_101" | "ISO_IR 101" | "ISO 2022 IR 101" => Some(IsoIr101),
            "ISO_IR_109" | "ISO_IR 109" | "ISO 2022 IR 109" => Some(IsoIr109),
            "ISO_IR_110" | "ISO_IR 110" | "ISO 2022 IR 110" => Some(IsoIr110),
            "ISO_IR_144" | "ISO_IR 144" | "ISO 2022 IR 144" => Some(IsoIr144),
            "ISO_IR_87" | "ISO_IR 87" | "ISO 2022 IR 87" => Some(IsoIr87),
            "ISO_IR_149" | "ISO_IR 149" | "ISO 2022 IR 149" => Some(IsoIr149),
            "ISO_IR_192" | "ISO_IR 192" => Some(IsoIr192),
            "GB18030" => Some(Gb18030),
            _ => None,
        }
    }

    /// The ISO 2022 designation sequence of this character set,
    /// excluding the leading escape byte.
    /// Returns `None` for the repertoires which do not take part
    /// in code extensions (UTF-8 and GB18030).
    fn escape_sequence(self) -> Option<&'static [u8]> {
        use self::SpecificCharacterSet::*;
        match self {
            Default => Some(b"(B"),
            IsoIr100 => Some(b"-A"),
            IsoIr101 => Some(b"-B"),
            IsoIr109 => Some(b"-C"),
            IsoIr110 => Some(b"-D"),
            IsoIr144 => Some(b"-L"),
            IsoIr87 => Some(b"$B"),
            IsoIr149 => Some(b"$)C"),
            IsoIr192 | Gb18030 => None,
        }
    }

    /// Whether this character set designates the G0 code element
    /// when switched in, requiring a return to the default repertoire
    /// before subsequent ASCII text.
    fn designates_g0(self) -> bool {
        matches!(
            self,
            SpecificCharacterSet::Default | SpecificCharacterSet::IsoIr87
        )
    }
}

impl TextCodec for SpecificCharacterSet {
    fn name(&self) -> &'static str {
        match self {
            SpecificCharacterSet::Default => "ISO_IR 6",
            SpecificCharacterSet::IsoIr100 => "ISO_IR 100",
            SpecificCharacterSet::IsoIr101 => "ISO_IR 101",
            SpecificCharacterSet::IsoIr109 => "ISO_IR 109",
            SpecificCharacterSet::IsoIr110 => "ISO_IR 110",
            SpecificCharacterSet::IsoIr144 => "ISO_IR 144",
            SpecificCharacterSet::IsoIr87 => "ISO 2022 IR 87",
            SpecificCharacterSet::IsoIr149 => "ISO 2022 IR 149",
            SpecificCharacterSet::IsoIr192 => "ISO_IR 192",
            SpecificCharacterSet::Gb18030 => "GB18030",
        }
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        match self {
            SpecificCharacterSet::Default => DefaultCharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr100 => IsoIr100CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr101 => IsoIr101CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr109 => IsoIr109CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr110 => IsoIr110CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr144 => IsoIr144CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr87 => JisX0208CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr149 => KsX1001CharacterSetCodec.decode(text),
            SpecificCharacterSet::IsoIr192 => Utf8CharacterSetCodec.decode(text),
            SpecificCharacterSet::Gb18030 => Gb18030CharacterSetCodec.decode(text),
        }
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        match self {
            SpecificCharacterSet::Default => DefaultCharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr100 => IsoIr100CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr101 => IsoIr101CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr109 => IsoIr109CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr110 => IsoIr110CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr144 => IsoIr144CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr87 => JisX0208CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr149 => KsX1001CharacterSetCodec.encode(text),
            SpecificCharacterSet::IsoIr192 => Utf8CharacterSetCodec.encode(text),
            SpecificCharacterSet::Gb18030 => Gb18030CharacterSetCodec.encode(text),
        }
    }
}

fn decode_text_trap(
    _decoder: &mut dyn RawDecoder,
    input: &[u8],
    output: &mut dyn StringWriter,
) -> bool {
    let c = input[0];
    let o0 = c & 7;
    let o1 = (c & 56) >> 3;
    let o2 = (c & 192) >> 6;
    output.write_char('\\');
    output.write_char((o2 + b'0') as char);
    output.write_char((o1 + b'0') as char);
    output.write_char((o0 + b'0') as char);
    true
}

/// Create and implement a character set type using the `encoding` crate.
macro_rules! decl_character_set {
    ($typ: ident, $term: literal, $val: expr) => {
        #[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
        #[doc = "Data type for the "]
        #[doc = $term]
        #[doc = "character set encoding."]
        pub struct $typ;

        impl TextCodec for $typ {
            fn name(&self) -> &'static str {
                $term
            }

            fn decode(&self, text: &[u8]) -> DecodeResult<String> {
                $val.decode(text, DecoderTrap::Call(decode_text_trap))
                    .map_err(|message| DecodeCustomSnafu { message }.build())
            }

            fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
                $val.encode(text, EncoderTrap::Strict)
                    .map_err(|message| EncodeCustomSnafu { message }.build())
            }
        }
    };
}

/// Data type representing the default character repertoire.
///
/// Non-ASCII input is passed through as UTF-8 on encoding,
/// so that host-native text survives a round trip even when
/// no extended character set was designated.
/// On decoding, valid UTF-8 is interpreted as such,
/// and anything else falls back to Latin-1.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct DefaultCharacterSetCodec;

impl TextCodec for DefaultCharacterSetCodec {
    fn name(&self) -> &'static str {
        "ISO_IR 6"
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        match std::str::from_utf8(text) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => ISO_8859_1
                .decode(text, DecoderTrap::Call(decode_text_trap))
                .map_err(|message| DecodeCustomSnafu { message }.build()),
        }
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

decl_character_set!(IsoIr100CharacterSetCodec, "ISO_IR 100", ISO_8859_1);
decl_character_set!(IsoIr101CharacterSetCodec, "ISO_IR 101", ISO_8859_2);
decl_character_set!(IsoIr109CharacterSetCodec, "ISO_IR 109", ISO_8859_3);
decl_character_set!(IsoIr110CharacterSetCodec, "ISO_IR 110", ISO_8859_4);
decl_character_set!(IsoIr144CharacterSetCodec, "ISO_IR 144", ISO_8859_5);
decl_character_set!(Utf8CharacterSetCodec, "ISO_IR 192", UTF_8);
decl_character_set!(Gb18030CharacterSetCodec, "GB18030", GB18030);

/// Data type for the JIS X 0208 (ISO-IR 87) character set encoding.
///
/// The wire form is the 7-bit double-byte form used within ISO 2022
/// designations. The codec maps it through EUC-JP by toggling the
/// high bit of each byte.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct JisX0208CharacterSetCodec;

impl TextCodec for JisX0208CharacterSetCodec {
    fn name(&self) -> &'static str {
        "ISO 2022 IR 87"
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        let euc: Vec<u8> = text.iter().map(|b| b | 0x80).collect();
        EUC_JP
            .decode(&euc, DecoderTrap::Strict)
            .map_err(|message| DecodeCustomSnafu { message }.build())
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        let euc = EUC_JP
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| EncodeCustomSnafu { message }.build())?;
        // only the double-byte codes have a 7-bit form
        if euc.iter().any(|b| *b < 0xA1) {
            return UnmappableSnafu { text }.fail();
        }
        Ok(euc.iter().map(|b| b & 0x7F).collect())
    }
}

/// Data type for the KS X 1001 (ISO-IR 149) character set encoding,
/// in its G1 (high bit set) wire form.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct KsX1001CharacterSetCodec;

impl TextCodec for KsX1001CharacterSetCodec {
    fn name(&self) -> &'static str {
        "ISO 2022 IR 149"
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        WINDOWS_949
            .decode(text, DecoderTrap::Strict)
            .map_err(|message| DecodeCustomSnafu { message }.build())
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        let bytes = WINDOWS_949
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| EncodeCustomSnafu { message }.build())?;
        if bytes.iter().any(|b| *b < 0xA1) {
            return UnmappableSnafu { text }.fail();
        }
        Ok(bytes)
    }
}

/// The ordered list of character sets designated by a
/// _Specific Character Set_ (0008,0005) element.
///
/// The first entry is the default repertoire of the data set;
/// the following entries are reachable through ISO 2022 escape
/// sequences embedded in text values. Decoding splits multi-valued
/// text on the backslash delimiter _before_ interpreting any
/// multi-byte encoding, so a delimiter byte is never mistaken
/// for the trailing byte of a multi-byte character.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CharacterSetList {
    sets: Vec<SpecificCharacterSet>,
}

impl Default for CharacterSetList {
    fn default() -> Self {
        CharacterSetList {
            sets: vec![SpecificCharacterSet::Default],
        }
    }
}

impl From<SpecificCharacterSet> for CharacterSetList {
    fn from(set: SpecificCharacterSet) -> Self {
        CharacterSetList { sets: vec![set] }
    }
}

impl CharacterSetList {
    /// Build the designator list from the values of the
    /// _Specific Character Set_ element.
    ///
    /// An empty first value stands for the default repertoire,
    /// as in `["", "ISO 2022 IR 87"]`. An empty list is equivalent
    /// to the default repertoire alone.
    /// Returns `None` if any designator is not supported.
    pub fn from_codes<'a, I>(codes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let sets = codes
            .into_iter()
            .map(SpecificCharacterSet::from_code)
            .collect::<Option<Vec<_>>>()?;
        if sets.is_empty() {
            return Some(CharacterSetList::default());
        }
        Some(CharacterSetList { sets })
    }

    /// The default repertoire of the data set.
    pub fn primary(&self) -> SpecificCharacterSet {
        self.sets[0]
    }

    /// The designator values to record in the
    /// _Specific Character Set_ element for this list.
    /// The degenerate ASCII-only case maps to a single empty string.
    pub fn designators(&self) -> Vec<&'static str> {
        if self.sets == [SpecificCharacterSet::Default] {
            return vec![""];
        }
        self.sets
            .iter()
            .map(|s| match (s, self.sets.len()) {
                // within a multi-valued list, the default repertoire
                // is referred to by its code extension term
                (SpecificCharacterSet::Default, n) if n > 1 => "ISO 2022 IR 6",
                (s, _) => s.name(),
            })
            .collect()
    }

    /// Decode a complete (possibly multi-valued) text value,
    /// producing one string per backslash-delimited segment.
    pub fn decode_multi(&self, text: &[u8]) -> DecodeResult<Vec<String>> {
        text.split(|b| *b == b'\\')
            .map(|segment| self.decode_segment(segment))
            .collect()
    }

    /// Decode one backslash-free segment, honoring embedded
    /// escape sequences. Each segment starts over in the default
    /// repertoire of the list.
    fn decode_segment(&self, segment: &[u8]) -> DecodeResult<String> {
        let mut active = self.primary();
        let mut out = String::new();
        let mut rest = segment;
        while !rest.is_empty() {
            if rest[0] == ESC {
                let (set, used) = self.match_escape(&rest[1..])?;
                active = set;
                rest = &rest[1 + used..];
                continue;
            }
            let end = rest
                .iter()
                .position(|b| *b == ESC)
                .unwrap_or(rest.len());
            out.push_str(&active.decode(&rest[..end])?);
            rest = &rest[end..];
        }
        Ok(out)
    }

    /// Resolve the escape sequence at the start of `rest`
    /// (the escape byte already consumed) against the designated sets.
    /// The return sequences to the default repertoire are always accepted.
    fn match_escape(&self, rest: &[u8]) -> DecodeResult<(SpecificCharacterSet, usize)> {
        // ESC ( B and ESC ( J return to the default/romaji G0 set
        for ret in [&b"(B"[..], &b"(J"[..]] {
            if rest.starts_with(ret) {
                return Ok((SpecificCharacterSet::Default, ret.len()));
            }
        }
        for set in &self.sets {
            if let Some(seq) = set.escape_sequence() {
                if rest.starts_with(seq) {
                    return Ok((*set, seq.len()));
                }
            }
        }
        UnknownEscapeSequenceSnafu {
            sequence: rest[..rest.len().min(3)].to_vec(),
        }
        .fail()
    }

    /// Encode the given segments into a single value buffer,
    /// joined by the backslash delimiter.
    pub fn encode_multi(&self, segments: &[&str]) -> EncodeResult<Vec<u8>> {
        let mut out = Vec::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push(b'\\');
            }
            out.extend(self.encode_segment(segment)?);
        }
        Ok(out)
    }

    /// Encode one backslash-free segment,
    /// switching in the designated extension sets where necessary.
    fn encode_segment(&self, text: &str) -> EncodeResult<Vec<u8>> {
        // without extensions, the primary repertoire takes the whole segment
        if self.sets.len() == 1 {
            return self.primary().encode(text);
        }
        if text.is_ascii() {
            return Ok(text.as_bytes().to_vec());
        }

        let mut out = Vec::new();
        let mut g0_shifted = false;
        let mut chars = text.chars().peekable();
        while let Some(&c) = chars.peek() {
            if c.is_ascii() {
                let mut run = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii() {
                        break;
                    }
                    run.push(c);
                    chars.next();
                }
                if g0_shifted {
                    out.push(ESC);
                    out.extend(b"(B");
                    g0_shifted = false;
                }
                out.extend(run.as_bytes());
            } else {
                let mut run = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii() {
                        break;
                    }
                    run.push(c);
                    chars.next();
                }
                // the default repertoire is excluded: its encoder passes
                // non-ASCII through, which only the primary may do
                let (set, seq, bytes) = self
                    .sets
                    .iter()
                    .filter(|s| **s != SpecificCharacterSet::Default)
                    .filter_map(|s| s.escape_sequence().map(|seq| (*s, seq)))
                    .find_map(|(s, seq)| s.encode(&run).ok().map(|b| (s, seq, b)))
                    .ok_or_else(|| UnmappableSnafu { text: run.clone() }.build())?;
                out.push(ESC);
                out.extend(seq);
                out.extend(bytes);
                g0_shifted = set.designates_g0();
            }
        }
        if g0_shifted {
            out.push(ESC);
            out.extend(b"(B");
        }
        Ok(out)
    }
}

impl TextCodec for CharacterSetList {
    fn name(&self) -> &'static str {
        self.primary().name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        Ok(self.decode_multi(text)?.join("\\"))
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        let segments: Vec<&str> = text.split('\\').collect();
        self.encode_multi(&segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec<T>(codec: T, string: &str, bytes: &[u8])
    where
        T: TextCodec,
    {
        assert_eq!(codec.encode(string).expect("encoding"), bytes);
        assert_eq!(codec.decode(bytes).expect("decoding"), string);
    }

    #[test]
    fn iso_ir_6_baseline() {
        let codec = SpecificCharacterSet::Default;
        test_codec(codec, "Smith^John", b"Smith^John");
    }

    #[test]
    fn iso_ir_6_keeps_host_text() {
        // non-ASCII input passes through as UTF-8 and round-trips
        let codec = SpecificCharacterSet::Default;
        test_codec(codec, "Äneas^Rüdiger", "Äneas^Rüdiger".as_bytes());
    }

    #[test]
    fn iso_ir_192_baseline() {
        let codec = SpecificCharacterSet::IsoIr192;
        test_codec(&codec, "Simões^John", "Simões^John".as_bytes());
        test_codec(codec, "Иванков^Андрей", "Иванков^Андрей".as_bytes());
    }

    #[test]
    fn iso_ir_100_baseline() {
        let codec = SpecificCharacterSet::IsoIr100;
        test_codec(&codec, "Simões^João", b"Sim\xF5es^Jo\xE3o");
        test_codec(codec, "Günther^Hans", b"G\xfcnther^Hans");
    }

    #[test]
    fn iso_ir_144_baseline() {
        let codec = SpecificCharacterSet::IsoIr144;
        test_codec(
            codec,
            "Иванков^Андрей",
            b"\xb8\xd2\xd0\xdd\xda\xde\xd2^\xb0\xdd\xd4\xe0\xd5\xd9",
        );
    }

    #[test]
    fn designator_round_trip() {
        let cs = CharacterSetList::default();
        assert_eq!(cs.designators(), vec![""]);

        let cs = CharacterSetList::from_codes(["ISO_IR 192"]).unwrap();
        assert_eq!(cs.designators(), vec!["ISO_IR 192"]);

        let cs = CharacterSetList::from_codes(["", "ISO 2022 IR 87"]).unwrap();
        assert_eq!(cs.designators(), vec!["ISO 2022 IR 6", "ISO 2022 IR 87"]);

        assert!(CharacterSetList::from_codes(["ISO_IR 13"]).is_none());
    }

    #[test]
    fn multi_valued_text_splits_before_decoding() {
        let cs = CharacterSetList::from_codes(["", "ISO 2022 IR 87"]).unwrap();
        // two person name values, each with its own escape switching
        let raw: &[u8] = &[
            0x1B, 0x24, 0x42, 0x3B, 0x33, 0x45, 0x44, 0x1B, 0x28, 0x42, // 山田
            b'\\', // value delimiter
            0x1B, 0x24, 0x42, 0x42, 0x40, 0x4F, 0x3A, 0x1B, 0x28, 0x42, // 太郎
        ];
        let values = cs.decode_multi(raw).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "山田");
        assert_eq!(values[1], "太郎");
    }

    #[test]
    fn iso_2022_ir_87_round_trip() {
        let cs = CharacterSetList::from_codes(["", "ISO 2022 IR 87"]).unwrap();
        let text = "Yamada^Tarou=山田^太郎";
        let encoded = cs.encode(text).unwrap();
        // kanji runs are wrapped in designation sequences
        assert!(encoded.windows(3).any(|w| w == [0x1B, 0x24, 0x42]));
        assert!(encoded.windows(3).any(|w| w == [0x1B, 0x28, 0x42]));
        assert_eq!(cs.decode(&encoded).unwrap(), text);
    }

    #[test]
    fn iso_2022_ir_149_round_trip() {
        let cs = CharacterSetList::from_codes(["", "ISO 2022 IR 149"]).unwrap();
        let text = "Hong^Gildong=洪^吉洞=홍^길동";
        let encoded = cs.encode(text).unwrap();
        assert!(encoded.windows(4).any(|w| w == [0x1B, 0x24, 0x29, 0x43]));
        assert_eq!(cs.decode(&encoded).unwrap(), text);
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let cs = CharacterSetList::from_codes(["", "ISO 2022 IR 87"]).unwrap();
        let raw: &[u8] = &[0x1B, 0x25, 0x47, 0x41];
        assert!(matches!(
            cs.decode(raw),
            Err(DecodeTextError::UnknownEscapeSequence { .. })
        ));
    }

    #[test]
    fn latin_extension_switching() {
        let cs = CharacterSetList::from_codes(["", "ISO 2022 IR 100"]).unwrap();
        // "Günther" with the umlaut under the G1 Latin-1 designation
        let raw: &[u8] = &[b'G', 0x1B, 0x2D, 0x41, 0xFC, b'n', b't', b'h', b'e', b'r'];
        assert_eq!(cs.decode(raw).unwrap(), "Günther");
    }
}
