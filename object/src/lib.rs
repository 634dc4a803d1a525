//! This crate contains a high-level abstraction for reading and
//! manipulating DICOM data sets as in-memory objects.
//!
//! The [`InMemDicomObject`] is an ordered, tag-keyed collection of data
//! elements, built by reading a byte stream under a transfer syntax
//! or element by element through the API.
//! A [`FileDicomObject`] additionally carries the file meta group,
//! giving access to whole-file reading and writing
//! (128-byte preamble, `DICM` magic code, meta group, main data set).

use dcmio_core::Tag;
use snafu::{Backtrace, Snafu};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

pub mod file;
pub mod mem;
pub mod meta;
pub mod private;
pub mod stop;

pub use crate::file::ReadPreamble;
pub use crate::mem::{InMemDicomObject, InMemElement};
pub use crate::meta::{FileMetaTable, FileMetaTableBuilder};
pub use crate::private::{PrivateAttributeSafety, SafePrivateTable};
pub use crate::stop::{ReadAll, ReadStop, StopAtGroup, StopAtOffset, StopAtTag};

/// The default implementation class UID advertised in file meta groups
/// written by this library.
pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.10.1204.1";

/// The default implementation version name advertised in file meta groups
/// written by this library.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMIO 0.1";

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not open file `{}`: {}", filename.display(), source))]
    OpenFile {
        filename: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("could not create file `{}`: {}", filename.display(), source))]
    CreateFile {
        filename: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("could not read from file `{}`: {}", filename.display(), source))]
    ReadFile {
        filename: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("could not read preamble bytes: {}", source))]
    ReadPreambleBytes {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("could not write to destination: {}", source))]
    WriteData {
        backtrace: Backtrace,
        source: std::io::Error,
    },
    #[snafu(display("could not parse file meta group"))]
    ParseMetaDataSet {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },
    #[snafu(display("could not write file meta group"))]
    WriteMetaDataSet {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },
    #[snafu(display("could not build file meta group"))]
    BuildMetaTable {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },
    #[snafu(display("unsupported transfer syntax `{}`", uid))]
    UnsupportedTransferSyntax { uid: String, backtrace: Backtrace },
    #[snafu(display("could not read data set token"))]
    ReadToken {
        #[snafu(backtrace)]
        source: dcmio_parser::dataset::read::Error,
    },
    #[snafu(display("could not write data set"))]
    PrintDataSet {
        #[snafu(backtrace)]
        source: dcmio_parser::dataset::write::Error,
    },
    #[snafu(display("missing element value after header token"))]
    MissingElementValue { backtrace: Backtrace },
    #[snafu(display("unexpected token {} in data set", token))]
    UnexpectedToken {
        token: dcmio_parser::DataToken,
        backtrace: Backtrace,
    },
    #[snafu(display("no such data element with tag {}", tag))]
    NoSuchDataElementTag { tag: Tag, backtrace: Backtrace },
    #[snafu(display("no such attribute named `{}`", name))]
    NoSuchAttributeName { name: String, backtrace: Backtrace },
    #[snafu(display("{} is not a private data element tag", tag))]
    NotAPrivateTag { tag: Tag, backtrace: Backtrace },
    #[snafu(display("no private creator registered for the block of {}", tag))]
    MissingPrivateCreator { tag: Tag, backtrace: Backtrace },
    #[snafu(display(
        "no free private block in group {:#06X} for creator `{}`",
        group,
        creator
    ))]
    NoFreePrivateBlock {
        group: u16,
        creator: String,
        backtrace: Backtrace,
    },
    #[snafu(display("cannot re-type element {} holding a {:?} value", tag, current))]
    RetypeNonRaw {
        tag: Tag,
        current: dcmio_core::value::ValueType,
        backtrace: Backtrace,
    },
    #[snafu(display("could not re-interpret the value of {}", tag))]
    RetypeValue {
        tag: Tag,
        #[snafu(backtrace)]
        source: dcmio_encoding::decode::primitive_value::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A DICOM object paired with the file meta group
/// that introduces it in the file encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDicomObject<O> {
    pub(crate) meta: FileMetaTable,
    pub(crate) obj: O,
}

impl<O> FileDicomObject<O> {
    /// Retrieve the file meta group table.
    pub fn meta(&self) -> &FileMetaTable {
        &self.meta
    }

    /// Retrieve the inner data set, discarding the file meta group.
    pub fn into_inner(self) -> O {
        self.obj
    }
}

impl<O> Deref for FileDicomObject<O> {
    type Target = O;

    fn deref(&self) -> &Self::Target {
        &self.obj
    }
}

impl<O> DerefMut for FileDicomObject<O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.obj
    }
}
