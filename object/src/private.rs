//! Support for private (vendor-specific) data elements.
//!
//! Private tags live in odd-numbered groups and are scoped by a
//! creator string: the creator element at `(gggg,00bb)` reserves the
//! block `bb`, and every data element `(gggg,bbxx)` in that block
//! belongs to that creator. The resolution table is not global state;
//! it is the set of creator elements present in each data set,
//! consulted on demand.
//!
//! An element read with an unknown VR keeps its raw bytes, so once
//! its creator is known it can be re-typed in place without another
//! pass over the source stream.

use crate::mem::{InMemDicomObject, InMemElement};
use crate::{
    MissingPrivateCreatorSnafu, NoFreePrivateBlockSnafu, NoSuchDataElementTagSnafu,
    NotAPrivateTagSnafu, Result, RetypeNonRawSnafu, RetypeValueSnafu,
};
use byteordered::Endianness;
use dcmio_core::dictionary::DataDictionary;
use dcmio_core::header::Header;
use dcmio_core::value::{Value, ValueType};
use dcmio_core::{DataElement, PrimitiveValue, Tag, VR};
use dcmio_encoding::decode::primitive_value::{self, ValueReadStrategy};
use snafu::{ensure, IntoError, OptionExt};
use std::collections::{HashMap, HashSet};

/// Classification of private attributes which are known to be safe
/// from identifying information, consumed by de-identification logic.
pub trait PrivateAttributeSafety {
    /// Whether the private tag, under the given creator,
    /// is known to carry no identifying information.
    fn is_safe(&self, creator: &str, tag: Tag) -> bool;
}

/// A table-driven [`PrivateAttributeSafety`] implementation:
/// an explicit allow-list of (creator, group, element) entries.
/// Anything not listed is considered unsafe.
#[derive(Debug, Default, Clone)]
pub struct SafePrivateTable {
    /// maps creator to the known safe (group, element low byte) pairs
    allowed: HashMap<String, HashSet<(u16, u8)>>,
}

impl SafePrivateTable {
    /// Create an empty safety table.
    pub fn new() -> Self {
        SafePrivateTable::default()
    }

    /// Register the given elements of a private group as safe
    /// for the given creator.
    pub fn allow(&mut self, creator: &str, group: u16, elements: &[u8]) {
        let set = self.allowed.entry(creator.to_string()).or_default();
        for element in elements {
            set.insert((group, *element));
        }
    }
}

impl PrivateAttributeSafety for SafePrivateTable {
    fn is_safe(&self, creator: &str, tag: Tag) -> bool {
        self.allowed
            .get(creator)
            .map(|set| set.contains(&(tag.group(), (tag.element() & 0xFF) as u8)))
            .unwrap_or(false)
    }
}

impl<D> InMemDicomObject<D>
where
    D: DataDictionary,
    D: Clone,
{
    /// Resolve the creator string which reserves the sub-block
    /// of the given private data element tag.
    /// Returns `None` when the tag is not a private data element
    /// or no creator element is registered for its block.
    pub fn private_creator(&self, tag: Tag) -> Option<&str> {
        let creator_tag = tag.private_creator_tag()?;
        self.get(creator_tag)
            .and_then(|e| e.value().string().ok())
            .map(|s| s.trim_end_matches([' ', '\0']))
    }

    /// Find the block number reserved for the given creator
    /// within the given private group, if any.
    pub fn find_private_block(&self, group: u16, creator: &str) -> Option<u8> {
        (0x10..=0xFF_u16).find_map(|block| {
            let elem = self.get(Tag(group, block))?;
            let value = elem.value().string().ok()?;
            if value.trim_end_matches([' ', '\0']) == creator {
                Some(block as u8)
            } else {
                None
            }
        })
    }

    /// Retrieve a private data element by its group, creator
    /// and element number within the creator's block.
    pub fn private_element(&self, group: u16, creator: &str, element: u8) -> Option<&InMemElement<D>> {
        let block = self.find_private_block(group, creator)?;
        self.get(Tag(group, (u16::from(block) << 8) | u16::from(element)))
    }

    /// Insert a private data element under the given creator,
    /// reserving a new block for the creator if it has none yet.
    /// Returns the tag effectively given to the element.
    pub fn put_private(
        &mut self,
        group: u16,
        creator: &str,
        element: u8,
        vr: VR,
        value: PrimitiveValue,
    ) -> Result<Tag> {
        ensure!(
            Tag(group, 0x0010).is_private(),
            NotAPrivateTagSnafu {
                tag: Tag(group, u16::from(element)),
            }
        );

        let block = match self.find_private_block(group, creator) {
            Some(block) => block,
            None => {
                let free = (0x10..=0xFF_u16)
                    .find(|block| self.get(Tag(group, *block)).is_none())
                    .context(NoFreePrivateBlockSnafu { group, creator })?;
                self.put(InMemElement::new(
                    Tag(group, free),
                    VR::LO,
                    PrimitiveValue::from(creator),
                ));
                free as u8
            }
        };

        let tag = Tag(group, (u16::from(block) << 8) | u16::from(element));
        self.put(InMemElement::new(tag, vr, value));
        Ok(tag)
    }

    /// Re-type a private element which was read with an unknown VR,
    /// re-interpreting its retained raw bytes under the given VR
    /// and the object's character set. The source stream is not touched.
    ///
    /// A creator element must be registered for the tag's block;
    /// without one, the element's type cannot be trusted
    /// and it stays unknown.
    /// Binary re-interpretation assumes little endian byte order.
    pub fn retype_private(&mut self, tag: Tag, vr: VR) -> Result<()> {
        ensure!(
            tag.is_private() && tag.element() > 0x00FF,
            NotAPrivateTagSnafu { tag }
        );
        ensure!(
            self.private_creator(tag).is_some(),
            MissingPrivateCreatorSnafu { tag }
        );

        let charsets = self.charsets();
        let elem = self
            .entries
            .get(&tag)
            .context(NoSuchDataElementTagSnafu { tag })?;
        let bytes = match elem.value() {
            Value::Primitive(PrimitiveValue::U8(bytes)) => bytes.clone(),
            Value::Primitive(PrimitiveValue::Empty) => Default::default(),
            other => {
                return RetypeNonRawSnafu {
                    tag,
                    current: other
                        .primitive()
                        .map(|p| p.value_type())
                        .unwrap_or(ValueType::Empty),
                }
                .fail()
            }
        };

        let value = primitive_value::interpret_value(
            &bytes,
            vr,
            Endianness::Little,
            &charsets,
            ValueReadStrategy::Preserved,
        )
        .map_err(|e| {
            RetypeValueSnafu { tag }.into_error(e)
        })?;

        self.entries
            .insert(tag, DataElement::new(tag, vr, Value::Primitive(value)));
        Ok(())
    }

    /// Remove every private data element which is not known-safe
    /// under the given classification, recursing into sequence items.
    ///
    /// Creator elements are always retained, even when every data
    /// element of their block is removed, so that the block
    /// reservation survives for the elements that stay.
    /// Returns the number of elements removed.
    pub fn remove_unsafe_private(&mut self, safety: &impl PrivateAttributeSafety) -> usize {
        self.remove_unsafe_private_impl(safety)
    }

    fn remove_unsafe_private_impl(&mut self, safety: &dyn PrivateAttributeSafety) -> usize {
        let doomed: Vec<Tag> = self
            .entries
            .values()
            .filter(|e| {
                let tag = e.tag();
                if !tag.is_private() || tag.is_private_creator() {
                    return false;
                }
                match self.private_creator(tag) {
                    Some(creator) => !safety.is_safe(creator, tag),
                    // a private element with no registered creator
                    // cannot be vouched for
                    None => true,
                }
            })
            .map(|e| e.tag())
            .collect();
        let mut count = doomed.len();
        for tag in doomed {
            self.entries.remove(&tag);
        }
        for elt in self.entries.values_mut() {
            if elt.value().items().is_none() {
                continue;
            }
            if let Some(items) = elt.value_mut().items_mut() {
                for item in items {
                    count += item.remove_unsafe_private_impl(safety);
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::dcmio_value;

    fn private_object() -> InMemDicomObject {
        let mut obj = InMemDicomObject::new_empty();
        obj.put_private(
            0x0009,
            "ACME 1.0",
            0x01,
            VR::LO,
            PrimitiveValue::from("analysis mode 3"),
        )
        .unwrap();
        obj.put_private(
            0x0009,
            "ACME 1.0",
            0x02,
            VR::DS,
            PrimitiveValue::from("1.5"),
        )
        .unwrap();
        obj.put_private(
            0x0009,
            "OTHER VENDOR",
            0x01,
            VR::LO,
            PrimitiveValue::from("operator notes"),
        )
        .unwrap();
        obj
    }

    #[test]
    fn creator_blocks_are_allocated_and_reused() {
        let obj = private_object();

        // two creators, two blocks
        assert_eq!(obj.find_private_block(0x0009, "ACME 1.0"), Some(0x10));
        assert_eq!(obj.find_private_block(0x0009, "OTHER VENDOR"), Some(0x11));
        assert_eq!(obj.find_private_block(0x0009, "NOBODY"), None);

        // elements landed in their creators' blocks
        assert!(obj.get(Tag(0x0009, 0x1001)).is_some());
        assert!(obj.get(Tag(0x0009, 0x1002)).is_some());
        assert!(obj.get(Tag(0x0009, 0x1101)).is_some());

        // creator resolution from a data element tag
        assert_eq!(obj.private_creator(Tag(0x0009, 0x1001)), Some("ACME 1.0"));
        assert_eq!(
            obj.private_creator(Tag(0x0009, 0x1101)),
            Some("OTHER VENDOR")
        );
        assert_eq!(obj.private_creator(Tag(0x0009, 0x1201)), None);

        // access by creator and element number
        assert_eq!(
            obj.private_element(0x0009, "ACME 1.0", 0x01)
                .unwrap()
                .to_str()
                .unwrap(),
            "analysis mode 3"
        );
    }

    #[test]
    fn put_private_rejects_standard_groups() {
        let mut obj = InMemDicomObject::new_empty();
        assert!(obj
            .put_private(0x0008, "ACME 1.0", 0x01, VR::LO, PrimitiveValue::from("x"))
            .is_err());
    }

    #[test]
    fn retype_unknown_elements_from_raw_bytes() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            Tag(0x0009, 0x0010),
            VR::LO,
            PrimitiveValue::from("ACME 1.0"),
        ));
        obj.put(InMemElement::new(
            Tag(0x0009, 0x1001),
            VR::UN,
            dcmio_value!(U8, [b'm', b'o', b'd', b'e', b' ', b'3', b' ', b' ']),
        ));

        obj.retype_private(Tag(0x0009, 0x1001), VR::LO).unwrap();
        let elem = obj.get(Tag(0x0009, 0x1001)).unwrap();
        assert_eq!(elem.vr(), VR::LO);
        assert_eq!(elem.to_str().unwrap(), "mode 3");
    }

    #[test]
    fn retype_requires_a_creator_registration() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            Tag(0x0009, 0x1001),
            VR::UN,
            dcmio_value!(U8, [0x01, 0x02]),
        ));
        assert!(matches!(
            obj.retype_private(Tag(0x0009, 0x1001), VR::LO),
            Err(crate::Error::MissingPrivateCreator { .. })
        ));

        assert!(matches!(
            obj.retype_private(Tag(0x0008, 0x0060), VR::CS),
            Err(crate::Error::NotAPrivateTag { .. })
        ));
    }

    #[test]
    fn unsafe_removal_retains_creators_and_safe_elements() {
        let mut obj = private_object();

        let mut safety = SafePrivateTable::new();
        safety.allow("ACME 1.0", 0x0009, &[0x02]);

        let removed = obj.remove_unsafe_private(&safety);
        assert_eq!(removed, 2);

        // both creators are retained
        assert!(obj.get(Tag(0x0009, 0x0010)).is_some());
        assert!(obj.get(Tag(0x0009, 0x0011)).is_some());
        // the safe element is retained with its value intact
        assert_eq!(
            obj.get(Tag(0x0009, 0x1002)).unwrap().to_str().unwrap(),
            "1.5"
        );
        // the unsafe ones are gone
        assert!(obj.get(Tag(0x0009, 0x1001)).is_none());
        assert!(obj.get(Tag(0x0009, 0x1101)).is_none());
    }

    #[test]
    fn unsafe_removal_recurses_into_sequences() {
        let mut item = InMemDicomObject::new_empty();
        item.put_private(
            0x0009,
            "ACME 1.0",
            0x01,
            VR::LO,
            PrimitiveValue::from("secret"),
        )
        .unwrap();
        let mut obj = InMemDicomObject::new_empty();
        obj.put(InMemElement::new(
            Tag(0x0008, 0x1115),
            VR::SQ,
            Value::from_items(vec![item]),
        ));

        let safety = SafePrivateTable::new();
        let removed = obj.remove_unsafe_private(&safety);
        assert_eq!(removed, 1);

        let seq = obj.get(Tag(0x0008, 0x1115)).unwrap();
        let items = seq.value().items().unwrap();
        assert!(items[0].get(Tag(0x0009, 0x0010)).is_some());
        assert!(items[0].get(Tag(0x0009, 0x1001)).is_none());
    }
}
