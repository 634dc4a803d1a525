//! Whole-file reading and writing of DICOM objects:
//! 128-byte preamble, `DICM` magic code, file meta group,
//! and the main data set under the announced transfer syntax.

use crate::mem::InMemDicomObject;
use crate::meta::{FileMetaTable, FileMetaTableBuilder};
use crate::stop::{ReadAll, ReadStop};
use crate::{
    BuildMetaTableSnafu, CreateFileSnafu, FileDicomObject, OpenFileSnafu, ParseMetaDataSetSnafu,
    ReadFileSnafu, ReadPreambleBytesSnafu, Result, UnsupportedTransferSyntaxSnafu, WriteDataSnafu,
    WriteMetaDataSetSnafu,
};
use dcmio_core::dictionary::{DataDictionary, StandardDataDictionary};
use dcmio_core::Tag;
use dcmio_encoding::TransferSyntax;
use snafu::{OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Whether to expect the 128-byte preamble
/// when reading an object from a source.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ReadPreamble {
    /// Expect a preamble when reading from a file,
    /// but not from a plain byte source.
    #[default]
    Auto,
    /// Always read and discard 128 bytes first.
    Always,
    /// Assume that the magic code comes first.
    Never,
}

impl FileDicomObject<InMemDicomObject<StandardDataDictionary>> {
    /// Create a DICOM object by reading from a file.
    ///
    /// This function assumes the standard file encoding structure:
    /// 128-byte preamble, file meta group, and the main data set.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_file_with_dict(path, StandardDataDictionary)
    }

    /// Create a DICOM object by reading from a byte source,
    /// assuming the file meta group comes first (no preamble).
    pub fn from_reader<S>(src: S) -> Result<Self>
    where
        S: Read,
    {
        Self::from_reader_with_dict(src, StandardDataDictionary)
    }
}

impl<D> FileDicomObject<InMemDicomObject<D>>
where
    D: DataDictionary,
    D: Clone + 'static,
{
    /// Create a DICOM object by reading from a file,
    /// using the given dictionary for implicit VR resolution.
    pub fn open_file_with_dict<P: AsRef<Path>>(path: P, dict: D) -> Result<Self> {
        Self::open_file_with_all_options(path, dict, ReadPreamble::Auto, ReadAll)
    }

    /// Create a DICOM object by reading from a file,
    /// consulting the given termination policy before each
    /// top-level element of the main data set.
    pub fn open_file_with_stop<P, T>(path: P, dict: D, stop: T) -> Result<Self>
    where
        P: AsRef<Path>,
        T: ReadStop<D>,
    {
        Self::open_file_with_all_options(path, dict, ReadPreamble::Auto, stop)
    }

    fn open_file_with_all_options<P, T>(
        path: P,
        dict: D,
        read_preamble: ReadPreamble,
        stop: T,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        T: ReadStop<D>,
    {
        let path = path.as_ref();
        let mut file =
            BufReader::new(File::open(path).with_context(|_| OpenFileSnafu { filename: path })?);

        if read_preamble != ReadPreamble::Never {
            let mut buf = [0u8; 128];
            // skip the preamble
            file.read_exact(&mut buf)
                .with_context(|_| ReadFileSnafu { filename: path })?;
        }

        Self::from_open_source(file, dict, stop)
    }

    /// Create a DICOM object by reading from a byte source,
    /// assuming the file meta group comes first (no preamble).
    pub fn from_reader_with_dict<S>(src: S, dict: D) -> Result<Self>
    where
        S: Read,
    {
        Self::from_reader_with_all_options(src, dict, ReadPreamble::Never, ReadAll)
    }

    /// Create a DICOM object by reading from a byte source,
    /// consulting the given termination policy before each
    /// top-level element of the main data set.
    pub fn from_reader_with_stop<S, T>(src: S, dict: D, stop: T) -> Result<Self>
    where
        S: Read,
        T: ReadStop<D>,
    {
        Self::from_reader_with_all_options(src, dict, ReadPreamble::Never, stop)
    }

    fn from_reader_with_all_options<S, T>(
        src: S,
        dict: D,
        read_preamble: ReadPreamble,
        stop: T,
    ) -> Result<Self>
    where
        S: Read,
        T: ReadStop<D>,
    {
        let mut src = src;
        if read_preamble == ReadPreamble::Always {
            let mut buf = [0u8; 128];
            src.read_exact(&mut buf).context(ReadPreambleBytesSnafu)?;
        }

        Self::from_open_source(src, dict, stop)
    }

    fn from_open_source<S, T>(mut src: S, dict: D, stop: T) -> Result<Self>
    where
        S: Read,
        T: ReadStop<D>,
    {
        // read the meta group, then the rest of the data set
        // under the transfer syntax it announces
        let meta = FileMetaTable::from_reader(&mut src).context(ParseMetaDataSetSnafu)?;

        let ts = TransferSyntax::from_uid(&meta.transfer_syntax).with_context(|| {
            UnsupportedTransferSyntaxSnafu {
                uid: meta.transfer_syntax.clone(),
            }
        })?;

        let obj = InMemDicomObject::read_dataset_with_dict_ts_stop(src, dict, ts, stop)?;
        Ok(FileDicomObject { meta, obj })
    }

    /// Write the complete file encoding to the given destination:
    /// preamble, magic code, file meta group and data set.
    pub fn write_all<W: Write>(&self, to: W) -> Result<()> {
        let mut to = to;
        let preamble = [0u8; 128];
        to.write_all(&preamble).context(WriteDataSnafu)?;
        self.write_all_no_preamble(to)
    }

    /// Write the file meta group and data set to the given destination,
    /// without the 128-byte preamble.
    pub fn write_all_no_preamble<W: Write>(&self, to: W) -> Result<()> {
        let mut to = to;
        self.meta.write(&mut to).context(WriteMetaDataSetSnafu)?;

        let ts = TransferSyntax::from_uid(&self.meta.transfer_syntax).with_context(|| {
            UnsupportedTransferSyntaxSnafu {
                uid: self.meta.transfer_syntax.clone(),
            }
        })?;
        self.obj.write_dataset_with_ts(to, ts)
    }

    /// Write the complete file encoding to a new file at the given path.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = BufWriter::new(
            File::create(path).with_context(|_| CreateFileSnafu { filename: path })?,
        );
        self.write_all(file)
    }
}

impl<D> InMemDicomObject<D>
where
    D: DataDictionary,
    D: Clone,
{
    /// Encapsulate this object with a file meta group
    /// created through the given builder.
    ///
    /// When not set in the builder, the media storage SOP class
    /// and instance UIDs are taken from the _SOPClassUID_ and
    /// _SOPInstanceUID_ elements of the object.
    pub fn with_meta(self, mut meta: FileMetaTableBuilder) -> Result<FileDicomObject<Self>> {
        if meta.media_storage_sop_class_uid.is_none() {
            if let Some(elem) = self.get(Tag(0x0008, 0x0016)) {
                if let Ok(uid) = elem.to_str() {
                    meta = meta.media_storage_sop_class_uid(uid.to_string());
                }
            }
        }
        if meta.media_storage_sop_instance_uid.is_none() {
            if let Some(elem) = self.get(Tag(0x0008, 0x0018)) {
                if let Ok(uid) = elem.to_str() {
                    meta = meta.media_storage_sop_instance_uid(uid.to_string());
                }
            }
        }
        Ok(FileDicomObject {
            meta: meta.build().context(BuildMetaTableSnafu)?,
            obj: self,
        })
    }

    /// Encapsulate this object with the given file meta group, as-is.
    pub fn with_exact_meta(self, meta: FileMetaTable) -> FileDicomObject<Self> {
        FileDicomObject { meta, obj: self }
    }
}
