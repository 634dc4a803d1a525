//! Basic types for addressing and describing DICOM data elements:
//! the attribute tag, the value representation, element lengths,
//! and the element header and composite element types built from them.

use crate::value::{CastValueError, ConvertValueError, PrimitiveValue, Value};
use num_traits::NumCast;
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::{from_utf8, FromStr};

/// Error type for issues constructing a sequence item header.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum SequenceItemHeaderError {
    /// Unexpected header tag.
    /// Only Item (0xFFFE, 0xE000),
    /// Item Delimiter (0xFFFE, 0xE00D),
    /// or Sequence Delimiter (0xFFFE, 0xE0DD)
    /// are admitted.
    #[snafu(display("unexpected tag {}", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },
    /// Unexpected delimiter value length.
    /// Must be zero for item and sequence delimiters.
    #[snafu(display("unexpected delimiter length {}", len))]
    UnexpectedDelimiterLength { len: Length, backtrace: Backtrace },
}

type Result<T, E = SequenceItemHeaderError> = std::result::Result<T, E>;

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// The identifier of a single data element: a (group, element) pair
/// of 16-bit numbers. The total order is by group, then element.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Getter for the tag's group number.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element number.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Whether this tag lives in a private (odd-numbered, non-standard)
    /// group. Groups 0x0001, 0x0003, 0x0005, 0x0007 and 0xFFFF are not
    /// usable for private data and are excluded.
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 & 1 == 1 && self.0 > 0x0007 && self.0 != 0xFFFF
    }

    /// Whether this tag identifies a private creator
    /// (element 0x0010 through 0x00FF of a private group).
    #[inline]
    pub fn is_private_creator(self) -> bool {
        self.is_private() && (0x0010..=0x00FF).contains(&self.1)
    }

    /// The reserved sub-block number of a private data element tag,
    /// that is, the high byte of its element number.
    /// Meaningful for private tags with an element number above 0x00FF.
    #[inline]
    pub fn private_block(self) -> u8 {
        (self.1 >> 8) as u8
    }

    /// The tag of the private creator element which reserves
    /// this private data element's sub-block.
    pub fn private_creator_tag(self) -> Option<Tag> {
        if !self.is_private() || self.1 <= 0x00FF {
            return None;
        }
        Some(Tag(self.0, <u16 as From<_>>::from(self.private_block())))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<[u16; 2]> for Tag {
    #[inline]
    fn from(value: [u16; 2]) -> Tag {
        Tag(value[0], value[1])
    }
}

/// A data set content length, in bytes.
/// The internal value `0xFFFF_FFFF` stands for an undefined length,
/// which is resolved by traversing the content until the matching
/// delimiter. This changes comparison semantics:
/// two undefined lengths are never equal,
/// and any comparison against an undefined length is `false`.
#[derive(Clone, Copy)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// A length that is undefined.
    pub const UNDEFINED: Self = Length(UNDEFINED_LEN);

    /// Create a new length value from its internal representation.
    #[inline]
    pub fn new(len: u32) -> Self {
        Length(len)
    }

    /// Create a new length with the given number of bytes.
    ///
    /// # Panic
    ///
    /// Panics if `len` is the undefined length sentinel.
    #[inline]
    pub fn defined(len: u32) -> Self {
        assert_ne!(len, UNDEFINED_LEN);
        Length(len)
    }

    /// Check whether this length is undefined (unknown).
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// Check whether this length is well defined (not undefined).
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Fetch the concrete length value, if defined.
    #[inline]
    pub fn get(self) -> Option<u32> {
        match self.0 {
            UNDEFINED_LEN => None,
            v => Some(v),
        }
    }

    /// Check whether the length has the same internal representation
    /// as another length. Unlike `PartialEq`, two undefined lengths
    /// are considered equivalent by this method.
    #[inline]
    pub fn inner_eq(self, other: Length) -> bool {
        self.0 == other.0
    }
}

impl From<u32> for Length {
    #[inline]
    fn from(o: u32) -> Self {
        Length(o)
    }
}

impl PartialEq<Length> for Length {
    fn eq(&self, rhs: &Length) -> bool {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => false,
            (l1, l2) => l1 == l2,
        }
    }
}

impl PartialOrd<Length> for Length {
    fn partial_cmp(&self, rhs: &Length) -> Option<Ordering> {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => None,
            (l1, l2) => Some(l1.cmp(&l2)),
        }
    }
}

impl std::ops::Add<Length> for Length {
    type Output = Self;

    fn add(self, rhs: Length) -> Self::Output {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => Length::UNDEFINED,
            (l1, l2) => {
                let o = l1 + l2;
                debug_assert!(
                    o != UNDEFINED_LEN,
                    "integer overflow (0xFFFF_FFFF reserved for undefined length)"
                );
                Length(o)
            }
        }
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("Length(Undefined)"),
            l => f.debug_tuple("Length").field(&l).finish(),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("U/L"),
            l => write!(f, "{}", &l),
        }
    }
}

/// The coarse classification of a value representation,
/// which decides how a raw value buffer is interpreted.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ValueClass {
    /// Character data, decoded through the active character set.
    Text,
    /// Fixed-stride binary data in stream byte order.
    Binary,
    /// A list of nested data set items.
    Sequence,
    /// Opaque bytes, kept as-is until the element is re-typed.
    Unknown,
}

/// An enum type for a DICOM value representation.
///
/// Rather than dispatching behaviour through per-VR types, each code
/// carries its encoding facts as methods:
/// the length-field width under explicit VR typing,
/// the padding byte for odd-lengthed values,
/// the value class, and the byte stride of binary values.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Locator
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Retrieve a string representation of this VR.
    pub fn to_string(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns two alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// Whether the length field of this VR takes the short (2-byte) form
    /// under explicit VR typing. All other VRs use 2 reserved bytes
    /// followed by a 4-byte length field.
    pub fn is_short_form(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | AT | CS | DA | DS | DT | FL | FD | IS | LO | LT | PN | SH | SL | SS | ST
                | TM | UI | UL | US
        )
    }

    /// The byte used to pad a value of this VR to even length.
    /// UIDs and all binary values are padded with NUL,
    /// textual values with a space.
    pub fn padding(self) -> u8 {
        use VR::*;
        match self {
            UI => 0,
            _ if self.value_class() == ValueClass::Text => b' ',
            _ => 0,
        }
    }

    /// The coarse classification of this value representation.
    pub fn value_class(self) -> ValueClass {
        use VR::*;
        match self {
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT => {
                ValueClass::Text
            }
            AT | FL | FD | OB | OD | OF | OL | OV | OW | SL | SS | SV | UL | US | UV => {
                ValueClass::Binary
            }
            SQ => ValueClass::Sequence,
            UN => ValueClass::Unknown,
        }
    }

    /// The number of bytes of a single element of a binary value,
    /// or `None` for text, sequence and unknown VRs.
    pub fn stride(self) -> Option<usize> {
        use VR::*;
        match self {
            OB => Some(1),
            SS | US | OW => Some(2),
            AT | SL | UL | FL | OF | OL => Some(4),
            SV | UV | FD | OD | OV => Some(8),
            _ => None,
        }
    }

    /// Whether values of this VR may hold multiple values
    /// delimited by a backslash. The long text representations
    /// (ST, LT, UT) and URIs are always single-valued.
    pub fn is_multi_text(self) -> bool {
        use VR::*;
        self.value_class() == ValueClass::Text && !matches!(self, ST | LT | UT | UR)
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters
/// in upper case, otherwise no match is made.
impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OD" => Ok(OD),
            "OF" => Ok(OF),
            "OL" => Ok(OL),
            "OV" => Ok(OV),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "SV" => Ok(SV),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            "UV" => Ok(UV),
            _ => Err("no such value representation"),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

/// Trait for any DICOM entity (element or item) which may have a length.
pub trait HasLength {
    /// Retrieve the value data's length as specified by the data element
    /// or item, in bytes. May be undefined for sequences and
    /// delimited items.
    fn length(&self) -> Length;

    /// Check whether the value is empty (0 length).
    fn is_empty(&self) -> bool {
        self.length() == Length(0)
    }
}

/// A trait for a data type containing a DICOM header.
pub trait Header: HasLength {
    /// Retrieve the element's tag as a `(group, element)` tuple.
    fn tag(&self) -> Tag;

    /// Check whether this is the header of an item.
    fn is_item(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE000)
    }

    /// Check whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE00D)
    }

    /// Check whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE0DD)
    }

    /// Check whether this is the header of an encapsulated pixel data
    /// element.
    fn is_encapsulated_pixeldata(&self) -> bool {
        self.tag() == Tag(0x7FE0, 0x0010) && self.length().is_undefined()
    }
}

/// A data structure for a data element header, containing
/// a tag, value representation and specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DataElementHeader {
    /// DICOM tag
    pub tag: Tag,
    /// Value Representation
    pub vr: VR,
    /// Element length
    pub len: Length,
}

impl HasLength for DataElementHeader {
    #[inline]
    fn length(&self) -> Length {
        self.len
    }
}

impl Header for DataElementHeader {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl DataElementHeader {
    /// Create a new data element header with the given properties.
    #[inline]
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> DataElementHeader {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }

    /// Retrieve the element's value representation, which can be unknown.
    #[inline]
    pub fn vr(&self) -> VR {
        self.vr
    }

    /// Check whether the header suggests the value to be a sequence value:
    /// if the value representation is SQ or the length is undefined.
    #[inline]
    pub fn is_non_primitive(&self) -> bool {
        self.vr == VR::SQ || self.length().is_undefined()
    }
}

impl From<SequenceItemHeader> for DataElementHeader {
    fn from(value: SequenceItemHeader) -> DataElementHeader {
        DataElementHeader {
            tag: value.tag(),
            vr: VR::UN,
            len: value.length(),
        }
    }
}

/// Data type for describing a sequence item data element.
/// If the element represents an item, it will also contain
/// the specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SequenceItemHeader {
    /// The cursor contains an item.
    Item {
        /// the length of the item in bytes (undefined if delimited)
        len: Length,
    },
    /// The cursor read an item delimiter.
    ItemDelimiter,
    /// The cursor read a sequence delimiter.
    SequenceDelimiter,
}

impl SequenceItemHeader {
    /// Create a sequence item header using the element's raw properties.
    /// An error is raised if the given properties do not relate to
    /// an item, an item delimiter or a sequence delimiter.
    pub fn new<T: Into<Tag>>(tag: T, len: Length) -> Result<SequenceItemHeader> {
        match tag.into() {
            Tag(0xFFFE, 0xE000) => Ok(SequenceItemHeader::Item { len }),
            Tag(0xFFFE, 0xE00D) => {
                // delimiters should not have a positive length
                if len != Length(0) {
                    UnexpectedDelimiterLengthSnafu { len }.fail()
                } else {
                    Ok(SequenceItemHeader::ItemDelimiter)
                }
            }
            Tag(0xFFFE, 0xE0DD) => Ok(SequenceItemHeader::SequenceDelimiter),
            tag => UnexpectedTagSnafu { tag }.fail(),
        }
    }
}

impl HasLength for SequenceItemHeader {
    #[inline]
    fn length(&self) -> Length {
        match *self {
            SequenceItemHeader::Item { len } => len,
            SequenceItemHeader::ItemDelimiter | SequenceItemHeader::SequenceDelimiter => Length(0),
        }
    }
}

impl Header for SequenceItemHeader {
    #[inline]
    fn tag(&self) -> Tag {
        match *self {
            SequenceItemHeader::Item { .. } => Tag(0xFFFE, 0xE000),
            SequenceItemHeader::ItemDelimiter => Tag(0xFFFE, 0xE00D),
            SequenceItemHeader::SequenceDelimiter => Tag(0xFFFE, 0xE0DD),
        }
    }
}

/// A data type that represents and owns a DICOM data element,
/// where sequence items are of type `I`.
#[derive(Debug, PartialEq, Clone)]
pub struct DataElement<I> {
    header: DataElementHeader,
    value: Value<I>,
}

impl<I> HasLength for DataElement<I> {
    #[inline]
    fn length(&self) -> Length {
        self.header.length()
    }
}

impl<I> Header for DataElement<I> {
    #[inline]
    fn tag(&self) -> Tag {
        self.header.tag()
    }
}

impl<I> DataElement<I> {
    /// Create an empty data element.
    pub fn empty(tag: Tag, vr: VR) -> Self {
        DataElement {
            header: DataElementHeader {
                tag,
                vr,
                len: Length(0),
            },
            value: PrimitiveValue::Empty.into(),
        }
    }

    /// Retrieve the element header.
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// Retrieve the value representation, which may be unknown.
    pub fn vr(&self) -> VR {
        self.header.vr()
    }

    /// Retrieve the borrowed data value.
    pub fn value(&self) -> &Value<I> {
        &self.value
    }

    /// Obtain a mutable reference to the element's value.
    ///
    /// The recorded length is reset to undefined,
    /// since any mutation may invalidate it;
    /// encoders derive the actual length from the value at write time.
    pub fn value_mut(&mut self) -> &mut Value<I> {
        self.header.len = Length::UNDEFINED;
        &mut self.value
    }

    /// Move the data value out of the element, discarding the rest.
    pub fn into_value(self) -> Value<I> {
        self.value
    }

    /// Split the element into its header and value parts.
    pub fn into_parts(self) -> (DataElementHeader, Value<I>) {
        (self.header, self.value)
    }
}

impl<I> DataElement<I>
where
    I: HasLength,
{
    /// Create a data element from the given parts,
    /// where the length is inferred from the value's byte length
    /// (assuming UTF-8 for textual values).
    ///
    /// This method will not check whether the value representation is
    /// compatible with the given value.
    pub fn new<T>(tag: Tag, vr: VR, value: T) -> Self
    where
        T: Into<Value<I>>,
    {
        let value = value.into();
        DataElement {
            header: DataElementHeader {
                tag,
                vr,
                len: value.length(),
            },
            value,
        }
    }

    /// Create a data element from the given parts, with an explicit length.
    ///
    /// This method will not check whether the length accurately represents
    /// the given value's byte length, nor whether the value representation
    /// is compatible with the value.
    pub fn new_with_len<T>(tag: Tag, vr: VR, length: Length, value: T) -> Self
    where
        T: Into<Value<I>>,
    {
        let value = value.into();
        DataElement {
            header: DataElementHeader {
                tag,
                vr,
                len: length,
            },
            value,
        }
    }

    /// Replace the element's value, recomputing the recorded length.
    /// Any length obtained from the original stream is discarded.
    pub fn update_value<T>(&mut self, value: T)
    where
        T: Into<Value<I>>,
    {
        self.value = value.into();
        self.header.len = self.value.length();
    }

    /// The byte length of the value padded to the next even boundary,
    /// as it would occupy in an encoded stream. Undefined lengths are
    /// returned unchanged.
    pub fn padded_length(&self) -> Length {
        match self.header.len.get() {
            Some(len) => Length((len + 1) & !1),
            None => Length::UNDEFINED,
        }
    }

    /// Retrieve the element's value as a single trimmed string.
    ///
    /// Returns an error if the value is not primitive.
    pub fn to_str(&self) -> Result<Cow<str>, CastValueError> {
        self.value.to_str()
    }

    /// Convert the full primitive value into raw bytes.
    ///
    /// String values are provided in UTF-8.
    /// Returns an error if the value is not primitive.
    pub fn to_bytes(&self) -> Result<Cow<[u8]>, CastValueError> {
        self.value().to_bytes()
    }

    /// Convert the full value of the data element into a sequence of strings.
    ///
    /// Returns an error if the value is not primitive.
    pub fn to_multi_str(&self) -> Result<Cow<[String]>, CastValueError> {
        self.value().to_multi_str()
    }

    /// Retrieve and convert the value of the data element into an integer.
    ///
    /// Returns an error if the value is not primitive
    /// or does not convert to an integer.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: Clone,
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        self.value().to_int()
    }

    /// Retrieve and convert the value of the data element
    /// into a double-precision floating point number.
    ///
    /// Returns an error if the value is not primitive
    /// or does not convert to a number.
    pub fn to_float64(&self) -> Result<f64, ConvertValueError> {
        self.value().to_float64()
    }

    /// Retrieve the element's value as a single string slice,
    /// or `None` if the value is missing or not textual.
    ///
    /// This is the non-failing accessor for the common case of
    /// optional string attributes.
    pub fn string_or_none(&self) -> Option<&str> {
        self.value.string().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ordering_and_parts() {
        let t = Tag::from((0x0010u16, 0x0020u16));
        assert_eq!(0x0010u16, t.group());
        assert_eq!(0x0020u16, t.element());
        assert!(Tag(0x0008, 0x0018) < Tag(0x0010, 0x0010));
        assert!(Tag(0x0010, 0x0010) < Tag(0x0010, 0x0020));
    }

    #[test]
    fn private_tags() {
        assert!(Tag(0x0009, 0x0010).is_private());
        assert!(Tag(0x0009, 0x0010).is_private_creator());
        assert!(!Tag(0x0008, 0x0005).is_private());
        assert!(!Tag(0x0007, 0x0010).is_private());

        let tag = Tag(0x0009, 0x1002);
        assert!(!tag.is_private_creator());
        assert_eq!(tag.private_block(), 0x10);
        assert_eq!(tag.private_creator_tag(), Some(Tag(0x0009, 0x0010)));
        assert_eq!(Tag(0x0009, 0x0010).private_creator_tag(), None);
    }

    #[test]
    fn length_undefined_semantics() {
        assert_ne!(Length::UNDEFINED, Length::UNDEFINED);
        assert!((Length(64) + Length::UNDEFINED).is_undefined());
        assert!(Length(16) < Length(64));
        assert!(!(Length::UNDEFINED < Length(64)));
        assert!(!(Length::UNDEFINED > Length(64)));
        assert!(Length::UNDEFINED.inner_eq(Length::UNDEFINED));
    }

    #[test]
    fn vr_behavior_table() {
        assert!(VR::DA.is_short_form());
        assert!(VR::US.is_short_form());
        assert!(!VR::OB.is_short_form());
        assert!(!VR::UN.is_short_form());
        assert!(!VR::SQ.is_short_form());
        assert!(!VR::UT.is_short_form());

        assert_eq!(VR::PN.padding(), b' ');
        assert_eq!(VR::UI.padding(), 0);
        assert_eq!(VR::OB.padding(), 0);

        assert_eq!(VR::LO.value_class(), ValueClass::Text);
        assert_eq!(VR::FD.value_class(), ValueClass::Binary);
        assert_eq!(VR::SQ.value_class(), ValueClass::Sequence);
        assert_eq!(VR::UN.value_class(), ValueClass::Unknown);

        assert_eq!(VR::US.stride(), Some(2));
        assert_eq!(VR::FD.stride(), Some(8));
        assert_eq!(VR::AT.stride(), Some(4));
        assert_eq!(VR::LO.stride(), None);

        assert!(VR::PN.is_multi_text());
        assert!(!VR::LT.is_multi_text());
    }

    #[test]
    fn vr_binary_round_trip() {
        for vr in [VR::AE, VR::OB, VR::SQ, VR::UN, VR::PN, VR::UV] {
            assert_eq!(VR::from_binary(vr.to_bytes()), Some(vr));
        }
        assert_eq!(VR::from_binary([0x00, 0x41]), None);
    }

    #[test]
    fn item_headers() {
        let item = SequenceItemHeader::new((0xFFFE, 0xE000), Length(20)).unwrap();
        assert!(item.is_item());
        assert_eq!(item.length(), Length(20));

        let delim = SequenceItemHeader::new((0xFFFE, 0xE0DD), Length(0)).unwrap();
        assert!(delim.is_sequence_delimiter());

        assert!(SequenceItemHeader::new((0xFFFE, 0xE00D), Length(2)).is_err());
        assert!(SequenceItemHeader::new((0x0008, 0x0005), Length(0)).is_err());
    }
}
