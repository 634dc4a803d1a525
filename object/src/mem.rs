//! This module contains the implementation for an in-memory DICOM object.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::stop::{ReadAll, ReadStop};
use crate::{
    MissingElementValueSnafu, NoSuchAttributeNameSnafu, NoSuchDataElementTagSnafu,
    PrintDataSetSnafu, ReadTokenSnafu, Result, UnexpectedTokenSnafu,
};
use dcmio_core::dictionary::{DataDictionary, DictionaryEntry, StandardDataDictionary};
use dcmio_core::header::{HasLength, Header};
use dcmio_core::value::{Value, C};
use dcmio_core::{DataElement, Length, Tag, VR};
use dcmio_encoding::text::CharacterSetList;
use dcmio_encoding::TransferSyntax;
use dcmio_parser::dataset::read::DataSetReaderOptions;
use dcmio_parser::dataset::{DataSetReader, DataSetWriter, DataToken, IntoTokens};
use itertools::Itertools;
use snafu::{OptionExt, ResultExt};

/// A full in-memory DICOM data element.
pub type InMemElement<D = StandardDataDictionary> = DataElement<InMemDicomObject<D>>;

type ParserResult<T> = std::result::Result<T, dcmio_parser::dataset::read::Error>;

/// A DICOM data set that is fully contained in memory:
/// an ordered, tag-keyed collection of data elements,
/// where sequence elements own their nested items as further
/// objects of the same type.
#[derive(Debug, Clone)]
pub struct InMemDicomObject<D = StandardDataDictionary> {
    /// the element map
    pub(crate) entries: BTreeMap<Tag, InMemElement<D>>,
    /// the data dictionary
    pub(crate) dict: D,
    /// The length of the data set in bytes.
    /// It is usually undefined, unless the object was read as an item
    /// of known size in a sequence.
    pub(crate) len: Length,
}

impl<D> PartialEq for InMemDicomObject<D> {
    // this implementation ignores the data dictionary
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<D> HasLength for InMemDicomObject<D> {
    fn length(&self) -> Length {
        self.len
    }
}

impl InMemDicomObject<StandardDataDictionary> {
    /// Create a new empty DICOM object.
    pub fn new_empty() -> Self {
        Self::new_empty_with_dict(StandardDataDictionary)
    }

    /// Construct a DICOM object from a non-fallible source
    /// of structured elements.
    pub fn from_element_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = InMemElement<StandardDataDictionary>>,
    {
        Self::from_iter_with_dict(iter, StandardDataDictionary)
    }

    /// Read an object from a data set byte source
    /// (with no file meta group), under the given transfer syntax.
    pub fn read_dataset_with_ts<S>(from: S, ts: &TransferSyntax) -> Result<Self>
    where
        S: Read,
    {
        Self::read_dataset_with_dict_ts(from, StandardDataDictionary, ts)
    }
}

impl<D> InMemDicomObject<D>
where
    D: DataDictionary,
    D: Clone,
{
    /// Create a new empty object, using the given dictionary
    /// for name lookup.
    pub fn new_empty_with_dict(dict: D) -> Self {
        InMemDicomObject {
            entries: BTreeMap::new(),
            dict,
            len: Length::UNDEFINED,
        }
    }

    /// Construct a DICOM object from an iterator of structured elements.
    pub fn from_iter_with_dict<I>(iter: I, dict: D) -> Self
    where
        I: IntoIterator<Item = InMemElement<D>>,
    {
        InMemDicomObject {
            entries: iter.into_iter().map(|e| (e.tag(), e)).collect(),
            dict,
            len: Length::UNDEFINED,
        }
    }

    /// Construct a DICOM object from a fallible source
    /// of structured elements.
    pub fn from_element_source_with_dict<I>(iter: I, dict: D) -> Result<Self>
    where
        I: IntoIterator<Item = Result<InMemElement<D>>>,
    {
        let entries: Result<_> = iter.into_iter().map_ok(|e| (e.tag(), e)).collect();
        Ok(InMemDicomObject {
            entries: entries?,
            dict,
            len: Length::UNDEFINED,
        })
    }

    /// Retrieve a particular DICOM element by its tag.
    /// An error is raised if the element is absent;
    /// see [`get`](Self::get) for the non-failing flavour.
    pub fn element(&self, tag: Tag) -> Result<&InMemElement<D>> {
        self.entries
            .get(&tag)
            .context(NoSuchDataElementTagSnafu { tag })
    }

    /// Retrieve a particular DICOM element by its tag,
    /// or `None` if it is not present.
    /// Absence of an element is a normal outcome,
    /// not an error condition.
    pub fn get(&self, tag: Tag) -> Option<&InMemElement<D>> {
        self.entries.get(&tag)
    }

    /// Retrieve a particular DICOM element by its attribute name.
    pub fn element_by_name(&self, name: &str) -> Result<&InMemElement<D>> {
        let tag = self.lookup_name(name)?;
        self.element(tag)
    }

    /// Insert a data element into the object, replacing (and returning)
    /// any previous element of the same tag.
    pub fn put(&mut self, elt: InMemElement<D>) -> Option<InMemElement<D>> {
        self.entries.insert(elt.tag(), elt)
    }

    /// Remove the DICOM element of the given tag,
    /// reporting whether it was present.
    pub fn remove_element(&mut self, tag: Tag) -> bool {
        self.entries.remove(&tag).is_some()
    }

    /// Remove and retrieve the DICOM element of the given tag.
    /// An error is raised if the element is absent.
    pub fn take_element(&mut self, tag: Tag) -> Result<InMemElement<D>> {
        self.entries
            .remove(&tag)
            .context(NoSuchDataElementTagSnafu { tag })
    }

    /// Iterate over the elements of this object, in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &InMemElement<D>> {
        self.entries.values()
    }

    /// Iterate over the element tags of this object, in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.entries.keys().copied()
    }

    /// The number of top-level elements in the object.
    pub fn element_count(&self) -> usize {
        self.entries.len()
    }

    /// Remove every element matching the given predicate,
    /// recursing into the items of sequence elements.
    /// Returns the number of elements removed.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&InMemElement<D>) -> bool) -> usize {
        self.remove_all_impl(&mut predicate)
    }

    fn remove_all_impl(&mut self, predicate: &mut dyn FnMut(&InMemElement<D>) -> bool) -> usize {
        let doomed: Vec<Tag> = self
            .entries
            .values()
            .filter(|e| predicate(e))
            .map(|e| e.tag())
            .collect();
        let mut count = doomed.len();
        for tag in doomed {
            self.entries.remove(&tag);
        }
        for elt in self.entries.values_mut() {
            if let Some(items) = value_items_mut(elt) {
                for item in items {
                    count += item.remove_all_impl(predicate);
                }
            }
        }
        count
    }

    /// The character set list governing the text elements of this object,
    /// as designated by _Specific Character Set_.
    /// Falls back to the default repertoire when the element is absent
    /// or carries an unsupported designator.
    pub fn charsets(&self) -> CharacterSetList {
        let codes = match self.get(Tag(0x0008, 0x0005)).and_then(|e| e.to_multi_str().ok()) {
            Some(codes) => codes.into_owned(),
            None => return CharacterSetList::default(),
        };
        match CharacterSetList::from_codes(codes.iter().map(|c| c.as_str())) {
            Some(charsets) => charsets,
            None => {
                tracing::warn!(
                    "unsupported specific character set {:?}, assuming the default repertoire",
                    codes
                );
                CharacterSetList::default()
            }
        }
    }

    fn lookup_name(&self, name: &str) -> Result<Tag> {
        self.dict
            .get_by_name(name)
            .map(|e| e.tag())
            .context(NoSuchAttributeNameSnafu { name })
    }

    /// Read an object from a data set byte source
    /// (with no file meta group), under the given transfer syntax.
    pub fn read_dataset_with_dict_ts<S>(from: S, dict: D, ts: &TransferSyntax) -> Result<Self>
    where
        S: Read,
        D: 'static,
    {
        Self::read_dataset_with_dict_ts_stop(from, dict, ts, ReadAll)
    }

    /// Read an object from a data set byte source,
    /// consulting the given termination policy before each
    /// top-level element.
    pub fn read_dataset_with_dict_ts_stop<S, P>(
        from: S,
        dict: D,
        ts: &TransferSyntax,
        stop: P,
    ) -> Result<Self>
    where
        S: Read,
        D: 'static,
        P: ReadStop<D>,
    {
        let mut dataset =
            DataSetReader::new_with_dict(from, dict.clone(), ts, DataSetReaderOptions::default());
        InMemDicomObject::build_object(
            &mut dataset,
            dict,
            false,
            Length::UNDEFINED,
            Some(&stop),
        )
    }

    /// Write this object's data set into the given writer,
    /// under the given transfer syntax,
    /// without preamble, magic code, or file meta group.
    pub fn write_dataset_with_ts<W>(&self, to: W, ts: &TransferSyntax) -> Result<()>
    where
        W: Write,
    {
        let mut dset_writer = DataSetWriter::with_ts(to, ts);
        dset_writer
            .write_sequence(self.into_tokens())
            .context(PrintDataSetSnafu)?;
        Ok(())
    }

    // private methods

    /// Build an object by consuming a data set token stream.
    /// The termination policy is only present for the top-level object;
    /// sequence items are always read whole.
    pub(crate) fn build_object<I, P>(
        dataset: &mut I,
        dict: D,
        in_item: bool,
        len: Length,
        stop: Option<&P>,
    ) -> Result<Self>
    where
        I: ?Sized + Iterator<Item = ParserResult<DataToken>>,
        P: ?Sized + ReadStop<D>,
    {
        let mut obj = InMemDicomObject {
            entries: BTreeMap::new(),
            dict: dict.clone(),
            len,
        };

        while let Some(token) = dataset.next() {
            let elem = match token.context(ReadTokenSnafu)? {
                DataToken::ElementHeader { header, offset } => {
                    if let Some(stop) = stop {
                        if stop.stop_before(&obj, header.tag, offset) {
                            break;
                        }
                    }

                    // fetch respective value, place it in the entries
                    let next_token = dataset.next().context(MissingElementValueSnafu)?;
                    match next_token.context(ReadTokenSnafu)? {
                        DataToken::PrimitiveValue(v) => InMemElement::new_with_len(
                            header.tag,
                            header.vr,
                            header.len,
                            Value::Primitive(v),
                        ),
                        token => {
                            return UnexpectedTokenSnafu { token }.fail();
                        }
                    }
                }
                DataToken::SequenceStart { tag, len, offset } => {
                    if let Some(stop) = stop {
                        if stop.stop_before(&obj, tag, offset) {
                            break;
                        }
                    }

                    // delegate sequence building to another function
                    let items = Self::build_sequence(dataset, &dict)?;
                    InMemElement::new_with_len(
                        tag,
                        VR::SQ,
                        len,
                        Value::Sequence { items, size: len },
                    )
                }
                DataToken::PixelSequenceStart { offset } => {
                    let tag = Tag(0x7FE0, 0x0010);
                    if let Some(stop) = stop {
                        if stop.stop_before(&obj, tag, offset) {
                            break;
                        }
                    }
                    let value = Self::build_encapsulated_data(&mut *dataset)?;
                    InMemElement::new_with_len(tag, VR::OB, Length::UNDEFINED, value)
                }
                DataToken::ItemEnd if in_item => {
                    // end of item, leave now
                    return Ok(obj);
                }
                token => return UnexpectedTokenSnafu { token }.fail(),
            };
            obj.entries.insert(elem.tag(), elem);
        }

        Ok(obj)
    }

    /// Build a sequence value by consuming tokens
    /// until the sequence's end.
    fn build_sequence<I>(dataset: &mut I, dict: &D) -> Result<C<InMemDicomObject<D>>>
    where
        I: ?Sized + Iterator<Item = ParserResult<DataToken>>,
    {
        let mut items = C::new();
        while let Some(token) = dataset.next() {
            match token.context(ReadTokenSnafu)? {
                DataToken::ItemStart { len } => {
                    items.push(Self::build_object(
                        &mut *dataset,
                        dict.clone(),
                        true,
                        len,
                        None::<&ReadAll>,
                    )?);
                }
                DataToken::SequenceEnd => {
                    return Ok(items);
                }
                token => return UnexpectedTokenSnafu { token }.fail(),
            }
        }

        // iterator fused before the end of the sequence:
        // the reader has already flagged the underlying problem
        Ok(items)
    }

    /// Build an encapsulated pixel data value by collecting
    /// the offset table and all fragments.
    fn build_encapsulated_data<I>(dataset: &mut I) -> Result<Value<InMemDicomObject<D>>>
    where
        I: ?Sized + Iterator<Item = ParserResult<DataToken>>,
    {
        let mut offset_table = C::new();
        let mut fragments = C::new();

        for token in dataset {
            match token.context(ReadTokenSnafu)? {
                DataToken::OffsetTable(table) => {
                    offset_table.extend(table);
                }
                DataToken::ItemValue(data) => {
                    fragments.push(data);
                }
                DataToken::ItemStart { .. } | DataToken::ItemEnd => { /* no-op */ }
                DataToken::SequenceEnd => break,
                token => return UnexpectedTokenSnafu { token }.fail(),
            }
        }

        Ok(Value::PixelSequence {
            offset_table,
            fragments,
        })
    }
}

/// Access the mutable items of a sequence element.
/// Non-sequence elements are left untouched.
fn value_items_mut<D>(elt: &mut InMemElement<D>) -> Option<&mut C<InMemDicomObject<D>>> {
    if elt.value().items().is_none() {
        return None;
    }
    elt.value_mut().items_mut()
}

impl<'a, D> IntoTokens for &'a InMemDicomObject<D> {
    fn into_tokens(self) -> Vec<DataToken> {
        let mut tokens = Vec::with_capacity(self.entries.len() * 2);
        push_object_tokens(self, &mut tokens);
        tokens
    }
}

fn push_object_tokens<D>(obj: &InMemDicomObject<D>, out: &mut Vec<DataToken>) {
    for elt in obj.entries.values() {
        push_element_tokens(elt, out);
    }
}

fn push_element_tokens<D>(elt: &InMemElement<D>, out: &mut Vec<DataToken>) {
    match elt.value() {
        Value::Primitive(value) => {
            out.push(DataToken::ElementHeader {
                header: *elt.header(),
                offset: 0,
            });
            out.push(DataToken::PrimitiveValue(value.clone()));
        }
        Value::Sequence { items, size } => {
            out.push(DataToken::SequenceStart {
                tag: elt.tag(),
                len: *size,
                offset: 0,
            });
            for item in items {
                out.push(DataToken::ItemStart {
                    len: item.length(),
                });
                push_object_tokens(item, out);
                out.push(DataToken::ItemEnd);
            }
            out.push(DataToken::SequenceEnd);
        }
        Value::PixelSequence {
            offset_table,
            fragments,
        } => {
            out.push(DataToken::PixelSequenceStart { offset: 0 });
            out.push(DataToken::ItemStart {
                len: Length((offset_table.len() * 4) as u32),
            });
            out.push(DataToken::OffsetTable(offset_table.to_vec()));
            out.push(DataToken::ItemEnd);
            for fragment in fragments {
                out.push(DataToken::ItemStart {
                    len: Length(fragment.len() as u32),
                });
                out.push(DataToken::ItemValue(fragment.clone()));
                out.push(DataToken::ItemEnd);
            }
            out.push(DataToken::SequenceEnd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::{StopAtGroup, StopAtOffset, StopAtTag};
    use dcmio_core::dcmio_value;
    use dcmio_core::PrimitiveValue;
    use dcmio_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN;

    fn patient_element(name: &str) -> InMemElement {
        InMemElement::new(Tag(0x0010, 0x0010), VR::PN, PrimitiveValue::from(name))
    }

    #[test]
    fn put_get_remove() {
        let mut obj = InMemDicomObject::new_empty();
        assert!(obj.get(Tag(0x0010, 0x0010)).is_none());
        assert!(obj.element(Tag(0x0010, 0x0010)).is_err());

        assert!(obj.put(patient_element("Doe^John")).is_none());
        // re-putting a tag replaces the prior element
        let old = obj.put(patient_element("Doe^Jane")).unwrap();
        assert_eq!(old.to_str().unwrap(), "Doe^John");
        assert_eq!(obj.element_count(), 1);
        assert_eq!(
            obj.element(Tag(0x0010, 0x0010)).unwrap().to_str().unwrap(),
            "Doe^Jane"
        );
        assert_eq!(
            obj.element_by_name("PatientName").unwrap().to_str().unwrap(),
            "Doe^Jane"
        );

        assert!(obj.remove_element(Tag(0x0010, 0x0010)));
        assert!(!obj.remove_element(Tag(0x0010, 0x0010)));
    }

    #[test]
    fn iteration_is_in_tag_order() {
        let obj = InMemDicomObject::from_element_iter(vec![
            InMemElement::new(Tag(0x0020, 0x0013), VR::IS, PrimitiveValue::from("1")),
            patient_element("Doe^John"),
            InMemElement::new(Tag(0x0008, 0x0060), VR::CS, PrimitiveValue::from("MR")),
        ]);
        let tags: Vec<Tag> = obj.tags().collect();
        assert_eq!(
            tags,
            vec![Tag(0x0008, 0x0060), Tag(0x0010, 0x0010), Tag(0x0020, 0x0013)]
        );
    }

    #[test]
    fn remove_all_recurses_into_sequences() {
        let item = InMemDicomObject::from_element_iter(vec![
            InMemElement::new(Tag(0x0008, 0x1150), VR::UI, PrimitiveValue::from("1.2")),
            InMemElement::new(Tag(0x0008, 0x1155), VR::UI, PrimitiveValue::from("1.2.3")),
        ]);
        let mut obj = InMemDicomObject::from_element_iter(vec![
            patient_element("Doe^John"),
            InMemElement::new(
                Tag(0x0008, 0x1115),
                VR::SQ,
                Value::from_items(vec![item]),
            ),
        ]);

        let removed = obj.remove_all(|e| e.tag() == Tag(0x0008, 0x1155));
        assert_eq!(removed, 1);
        let seq = obj.element(Tag(0x0008, 0x1115)).unwrap();
        let items = seq.value().items().unwrap();
        assert_eq!(items[0].element_count(), 1);
        assert!(items[0].get(Tag(0x0008, 0x1155)).is_none());
    }

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x08, 0x00, 0x60, 0x00, // (0008,0060) Modality
            b'C', b'S', 0x02, 0x00,
            b'M', b'R',                 // ends at offset 10
        0x10, 0x00, 0x10, 0x00, // (0010,0010) Patient Name
            b'P', b'N', 0x08, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n', // ends at 26
        0x20, 0x00, 0x13, 0x00, // (0020,0013) Instance Number
            b'I', b'S', 0x02, 0x00,
            b'1', b' ',
    ];

    #[test]
    fn read_dataset_round_trip() {
        let obj = InMemDicomObject::read_dataset_with_ts(RAW, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        assert_eq!(obj.element_count(), 3);
        assert_eq!(
            obj.element(Tag(0x0010, 0x0010)).unwrap().to_str().unwrap(),
            "Doe^John"
        );

        let mut out = Vec::new();
        obj.write_dataset_with_ts(&mut out, &EXPLICIT_VR_LITTLE_ENDIAN)
            .unwrap();
        assert_eq!(out, RAW);
    }

    #[test]
    fn stop_at_tag() {
        let obj = InMemDicomObject::read_dataset_with_dict_ts_stop(
            RAW,
            StandardDataDictionary,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StopAtTag(Tag(0x0010, 0x0010)),
        )
        .unwrap();
        let tags: Vec<Tag> = obj.tags().collect();
        assert_eq!(tags, vec![Tag(0x0008, 0x0060)]);
    }

    #[test]
    fn stop_at_group() {
        let obj = InMemDicomObject::read_dataset_with_dict_ts_stop(
            RAW,
            StandardDataDictionary,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StopAtGroup(0x0020),
        )
        .unwrap();
        let tags: Vec<Tag> = obj.tags().collect();
        assert_eq!(tags, vec![Tag(0x0008, 0x0060), Tag(0x0010, 0x0010)]);
    }

    #[test]
    fn stop_at_offset() {
        // the instance number element starts at offset 26
        let obj = InMemDicomObject::read_dataset_with_dict_ts_stop(
            RAW,
            StandardDataDictionary,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            StopAtOffset(25),
        )
        .unwrap();
        let tags: Vec<Tag> = obj.tags().collect();
        assert_eq!(tags, vec![Tag(0x0008, 0x0060), Tag(0x0010, 0x0010)]);
    }

    #[test]
    fn stop_with_a_closure() {
        let obj = InMemDicomObject::read_dataset_with_dict_ts_stop(
            RAW,
            StandardDataDictionary,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            |so_far: &InMemDicomObject, _tag: Tag, _offset: u64| so_far.element_count() >= 2,
        )
        .unwrap();
        assert_eq!(obj.element_count(), 2);
    }

    #[test]
    fn charsets_from_element() {
        let mut obj = InMemDicomObject::new_empty();
        assert_eq!(obj.charsets(), CharacterSetList::default());
        obj.put(InMemElement::new(
            Tag(0x0008, 0x0005),
            VR::CS,
            dcmio_value!(Str, "ISO_IR 192"),
        ));
        assert_eq!(
            obj.charsets(),
            CharacterSetList::from_codes(["ISO_IR 192"]).unwrap()
        );
    }
}
