//! Streaming termination policies for sequential data set reading.
//!
//! A [`ReadStop`] is consulted by the read loop immediately before each
//! top-level data element is consumed. Returning `true` stops the read,
//! leaving the object populated with everything read so far and the
//! stream at the not-yet-consumed element. The policy is never consulted
//! inside nested sequence items, which are always read whole.

use crate::mem::InMemDicomObject;
use dcmio_core::Tag;

/// A decision procedure for stopping a sequential data set read early.
pub trait ReadStop<D> {
    /// Decide whether to stop reading before consuming the element
    /// with the given tag.
    ///
    /// `object` holds every element read so far and `offset` is the
    /// number of bytes consumed from the start of the data set
    /// up to this element's header.
    fn stop_before(&self, object: &InMemDicomObject<D>, tag: Tag, offset: u64) -> bool;
}

/// The policy which never stops: the whole data set is read.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ReadAll;

impl<D> ReadStop<D> for ReadAll {
    fn stop_before(&self, _object: &InMemDicomObject<D>, _tag: Tag, _offset: u64) -> bool {
        false
    }
}

/// Stop before the first element whose tag is at or past the given tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StopAtTag(pub Tag);

impl<D> ReadStop<D> for StopAtTag {
    fn stop_before(&self, _object: &InMemDicomObject<D>, tag: Tag, _offset: u64) -> bool {
        tag >= self.0
    }
}

/// Stop before the first element whose group number
/// reaches or exceeds the given group number.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StopAtGroup(pub u16);

impl<D> ReadStop<D> for StopAtGroup {
    fn stop_before(&self, _object: &InMemDicomObject<D>, tag: Tag, _offset: u64) -> bool {
        tag.group() >= self.0
    }
}

/// Stop before the first element whose byte offset
/// exceeds the given number of bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StopAtOffset(pub u64);

impl<D> ReadStop<D> for StopAtOffset {
    fn stop_before(&self, _object: &InMemDicomObject<D>, tag: Tag, offset: u64) -> bool {
        let _ = tag;
        offset > self.0
    }
}

/// Any compatible closure may serve as a termination policy.
impl<D, F> ReadStop<D> for F
where
    F: Fn(&InMemDicomObject<D>, Tag, u64) -> bool,
{
    fn stop_before(&self, object: &InMemDicomObject<D>, tag: Tag, offset: u64) -> bool {
        (self)(object, tag, offset)
    }
}
