//! Module containing data structures and readers of DICOM file meta
//! information tables.
//!
//! The file meta group precedes the main data set in the file encoding
//! and is always encoded in Explicit VR Little Endian,
//! regardless of the transfer syntax it announces.

use crate::{IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmio_core::header::{DataElementHeader, HasLength, Header};
use dcmio_core::{Length, Tag, VR};
use dcmio_encoding::decode::explicit_le::ExplicitVRLittleEndianDecoder;
use dcmio_encoding::decode::Decode;
use dcmio_encoding::encode::explicit_le::ExplicitVRLittleEndianEncoder;
use dcmio_encoding::encode::Encode;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Write};

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The magic code `DICM` could not be read from the source.
    #[snafu(display("could not start reading DICOM data: {}", source))]
    ReadMagicCode {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// Invalid DICOM data, detected from checking the `DICM` code.
    #[snafu(display("invalid DICOM file (magic code check failed)"))]
    NotDicom { backtrace: Backtrace },

    /// An issue occurred while decoding the next data element
    /// in the file meta data set.
    #[snafu(display("could not decode data element"))]
    DecodeElement {
        #[snafu(backtrace)]
        source: dcmio_encoding::decode::Error,
    },

    /// The file meta group parser could not fetch the value
    /// of a data element from its source.
    #[snafu(display("could not read data value: {}", source))]
    ReadValueData {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// A data element value is not valid text.
    #[snafu(display("data element {} does not hold valid text", tag))]
    DecodeText { tag: Tag, backtrace: Backtrace },

    /// A data element with an unexpected tag appeared
    /// before the file meta group could start.
    #[snafu(display("unexpected data element tagged {}", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },

    /// The value length of a data element in the file meta group
    /// was unexpected.
    #[snafu(display("unexpected length {} for data element tagged {}", length, tag))]
    UnexpectedDataValueLength {
        tag: Tag,
        length: Length,
        backtrace: Backtrace,
    },

    /// A required file meta data element is missing.
    #[snafu(display("missing data element `{}`", alias))]
    MissingElement {
        alias: &'static str,
        backtrace: Backtrace,
    },

    /// The file meta group data set could not be written.
    #[snafu(display("could not write file meta group data set"))]
    WriteSet {
        #[snafu(backtrace)]
        source: dcmio_encoding::encode::Error,
    },

    /// Raw data could not be written to the destination.
    #[snafu(display("could not write file meta group data: {}", source))]
    WriteData {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// DICOM File Meta Information Table.
///
/// This data type contains the relevant parts of the file meta
/// information table, which announces the transfer syntax of the
/// main data set among other identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaTable {
    /// File Meta Information Group Length
    pub information_group_length: u32,
    /// File Meta Information Version
    pub information_version: [u8; 2],
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax: String,
    /// Implementation Class UID
    pub implementation_class_uid: String,
    /// Implementation Version Name
    pub implementation_version_name: Option<String>,
    /// Source Application Entity Title
    pub source_application_entity_title: Option<String>,
}

impl FileMetaTable {
    /// Construct a file meta table by reading the magic code and
    /// meta group from the given source. The 128-byte preamble,
    /// if present, must have been consumed beforehand.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buff = [0u8; 4];
        reader.read_exact(&mut buff).context(ReadMagicCodeSnafu)?;
        if buff != DICM_MAGIC_CODE {
            return NotDicomSnafu.fail();
        }

        let decoder = ExplicitVRLittleEndianDecoder::default();

        // the group length element dictates how many bytes follow
        let (header, _) = decoder
            .decode_header(&mut reader)
            .context(DecodeElementSnafu)?;
        if header.tag != Tag(0x0002, 0x0000) {
            return UnexpectedTagSnafu { tag: header.tag }.fail();
        }
        if header.len != Length(4) {
            return UnexpectedDataValueLengthSnafu {
                tag: header.tag,
                length: header.len,
            }
            .fail();
        }
        let mut buff = [0u8; 4];
        reader.read_exact(&mut buff).context(ReadValueDataSnafu)?;
        let information_group_length = LittleEndian::read_u32(&buff);

        let mut group = vec![0u8; information_group_length as usize];
        reader.read_exact(&mut group).context(ReadValueDataSnafu)?;

        Self::from_group_data(information_group_length, &group)
    }

    fn from_group_data(information_group_length: u32, mut data: &[u8]) -> Result<Self> {
        let decoder = ExplicitVRLittleEndianDecoder::default();

        let mut information_version = None;
        let mut media_storage_sop_class_uid = None;
        let mut media_storage_sop_instance_uid = None;
        let mut transfer_syntax = None;
        let mut implementation_class_uid = None;
        let mut implementation_version_name = None;
        let mut source_application_entity_title = None;

        fn read_str_value(data: &mut &[u8], header: &DataElementHeader) -> Result<String> {
            let len = header.length().get().context(UnexpectedDataValueLengthSnafu {
                tag: header.tag(),
                length: header.length(),
            })? as usize;
            if len > data.len() {
                return UnexpectedDataValueLengthSnafu {
                    tag: header.tag(),
                    length: header.length(),
                }
                .fail();
            }
            let (value, rest) = data.split_at(len);
            *data = rest;
            let text = std::str::from_utf8(value)
                .ok()
                .context(DecodeTextSnafu { tag: header.tag() })?;
            Ok(text.trim_end_matches(['\0', ' ']).to_string())
        }

        while !data.is_empty() {
            let (header, _) = decoder
                .decode_header(&mut data)
                .context(DecodeElementSnafu)?;
            match header.tag {
                Tag(0x0002, 0x0001) => {
                    if header.len != Length(2) {
                        return UnexpectedDataValueLengthSnafu {
                            tag: header.tag,
                            length: header.len,
                        }
                        .fail();
                    }
                    let mut buff = [0u8; 2];
                    (&mut data).read_exact(&mut buff).context(ReadValueDataSnafu)?;
                    information_version = Some(buff);
                }
                Tag(0x0002, 0x0002) => {
                    media_storage_sop_class_uid = Some(read_str_value(&mut data, &header)?);
                }
                Tag(0x0002, 0x0003) => {
                    media_storage_sop_instance_uid = Some(read_str_value(&mut data, &header)?);
                }
                Tag(0x0002, 0x0010) => {
                    transfer_syntax = Some(read_str_value(&mut data, &header)?);
                }
                Tag(0x0002, 0x0012) => {
                    implementation_class_uid = Some(read_str_value(&mut data, &header)?);
                }
                Tag(0x0002, 0x0013) => {
                    implementation_version_name = Some(read_str_value(&mut data, &header)?);
                }
                Tag(0x0002, 0x0016) => {
                    source_application_entity_title = Some(read_str_value(&mut data, &header)?);
                }
                _ => {
                    // unknown meta element, skip its value
                    let len = header.len.get().context(UnexpectedDataValueLengthSnafu {
                        tag: header.tag,
                        length: header.len,
                    })? as usize;
                    if len > data.len() {
                        return UnexpectedDataValueLengthSnafu {
                            tag: header.tag,
                            length: header.len,
                        }
                        .fail();
                    }
                    data = &data[len..];
                }
            }
        }

        Ok(FileMetaTable {
            information_group_length,
            information_version: information_version.context(MissingElementSnafu {
                alias: "FileMetaInformationVersion",
            })?,
            media_storage_sop_class_uid: media_storage_sop_class_uid.context(
                MissingElementSnafu {
                    alias: "MediaStorageSOPClassUID",
                },
            )?,
            media_storage_sop_instance_uid: media_storage_sop_instance_uid.context(
                MissingElementSnafu {
                    alias: "MediaStorageSOPInstanceUID",
                },
            )?,
            transfer_syntax: transfer_syntax.context(MissingElementSnafu {
                alias: "TransferSyntaxUID",
            })?,
            implementation_class_uid: implementation_class_uid.context(MissingElementSnafu {
                alias: "ImplementationClassUID",
            })?,
            implementation_version_name,
            source_application_entity_title,
        })
    }

    /// Write the magic code and the complete meta group
    /// to the given destination.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let encoder = ExplicitVRLittleEndianEncoder::default();

        writer.write_all(&DICM_MAGIC_CODE).context(WriteDataSnafu)?;

        let mut write_str = |writer: &mut W,
                             tag: Tag,
                             vr: VR,
                             value: &str|
         -> Result<()> {
            let mut bytes = value.as_bytes().to_vec();
            if bytes.len() % 2 == 1 {
                bytes.push(vr.padding());
            }
            encoder
                .encode_element_header(
                    &mut *writer,
                    DataElementHeader::new(tag, vr, Length(bytes.len() as u32)),
                )
                .context(WriteSetSnafu)?;
            writer.write_all(&bytes).context(WriteDataSnafu)?;
            Ok(())
        };

        // (0002,0000) File Meta Information Group Length
        encoder
            .encode_element_header(
                &mut writer,
                DataElementHeader::new(Tag(0x0002, 0x0000), VR::UL, Length(4)),
            )
            .context(WriteSetSnafu)?;
        let mut buff = [0u8; 4];
        LittleEndian::write_u32(&mut buff, self.information_group_length);
        writer.write_all(&buff).context(WriteDataSnafu)?;

        // (0002,0001) File Meta Information Version
        encoder
            .encode_element_header(
                &mut writer,
                DataElementHeader::new(Tag(0x0002, 0x0001), VR::OB, Length(2)),
            )
            .context(WriteSetSnafu)?;
        writer
            .write_all(&self.information_version)
            .context(WriteDataSnafu)?;

        write_str(
            &mut writer,
            Tag(0x0002, 0x0002),
            VR::UI,
            &self.media_storage_sop_class_uid,
        )?;
        write_str(
            &mut writer,
            Tag(0x0002, 0x0003),
            VR::UI,
            &self.media_storage_sop_instance_uid,
        )?;
        write_str(&mut writer, Tag(0x0002, 0x0010), VR::UI, &self.transfer_syntax)?;
        write_str(
            &mut writer,
            Tag(0x0002, 0x0012),
            VR::UI,
            &self.implementation_class_uid,
        )?;
        if let Some(ref name) = self.implementation_version_name {
            write_str(&mut writer, Tag(0x0002, 0x0013), VR::SH, name)?;
        }
        if let Some(ref title) = self.source_application_entity_title {
            write_str(&mut writer, Tag(0x0002, 0x0016), VR::AE, title)?;
        }

        Ok(())
    }

    /// Create a builder for a new file meta table.
    pub fn builder() -> FileMetaTableBuilder {
        FileMetaTableBuilder::default()
    }
}

fn padded_len(value: &str) -> u32 {
    (value.len() as u32 + 1) & !1
}

/// A builder for a [`FileMetaTable`],
/// which validates the required attributes
/// and computes the group length on `build`.
#[derive(Debug, Default, Clone)]
pub struct FileMetaTableBuilder {
    pub(crate) media_storage_sop_class_uid: Option<String>,
    pub(crate) media_storage_sop_instance_uid: Option<String>,
    pub(crate) transfer_syntax: Option<String>,
    pub(crate) implementation_class_uid: Option<String>,
    pub(crate) implementation_version_name: Option<String>,
    pub(crate) source_application_entity_title: Option<String>,
}

impl FileMetaTableBuilder {
    /// Define the media storage SOP class UID.
    pub fn media_storage_sop_class_uid<T: Into<String>>(mut self, value: T) -> Self {
        self.media_storage_sop_class_uid = Some(value.into());
        self
    }

    /// Define the media storage SOP instance UID.
    pub fn media_storage_sop_instance_uid<T: Into<String>>(mut self, value: T) -> Self {
        self.media_storage_sop_instance_uid = Some(value.into());
        self
    }

    /// Define the transfer syntax UID of the main data set.
    pub fn transfer_syntax<T: Into<String>>(mut self, value: T) -> Self {
        self.transfer_syntax = Some(value.into());
        self
    }

    /// Define the implementation class UID.
    pub fn implementation_class_uid<T: Into<String>>(mut self, value: T) -> Self {
        self.implementation_class_uid = Some(value.into());
        self
    }

    /// Define the implementation version name.
    pub fn implementation_version_name<T: Into<String>>(mut self, value: T) -> Self {
        self.implementation_version_name = Some(value.into());
        self
    }

    /// Define the source application entity title.
    pub fn source_application_entity_title<T: Into<String>>(mut self, value: T) -> Self {
        self.source_application_entity_title = Some(value.into());
        self
    }

    /// Build the file meta table, validating the required attributes
    /// and computing the group length.
    pub fn build(self) -> Result<FileMetaTable> {
        let media_storage_sop_class_uid =
            self.media_storage_sop_class_uid.context(MissingElementSnafu {
                alias: "MediaStorageSOPClassUID",
            })?;
        let media_storage_sop_instance_uid =
            self.media_storage_sop_instance_uid
                .context(MissingElementSnafu {
                    alias: "MediaStorageSOPInstanceUID",
                })?;
        let transfer_syntax = self.transfer_syntax.context(MissingElementSnafu {
            alias: "TransferSyntaxUID",
        })?;
        let implementation_class_uid = self
            .implementation_class_uid
            .unwrap_or_else(|| IMPLEMENTATION_CLASS_UID.to_string());
        let implementation_version_name = Some(
            self.implementation_version_name
                .unwrap_or_else(|| IMPLEMENTATION_VERSION_NAME.to_string()),
        );

        // group length: every element after (0002,0000),
        // with 12-byte headers for OB and 8-byte headers otherwise
        let mut len = 12 + 2; // information version
        len += 8 + padded_len(&media_storage_sop_class_uid);
        len += 8 + padded_len(&media_storage_sop_instance_uid);
        len += 8 + padded_len(&transfer_syntax);
        len += 8 + padded_len(&implementation_class_uid);
        if let Some(ref name) = implementation_version_name {
            len += 8 + padded_len(name);
        }
        if let Some(ref title) = self.source_application_entity_title {
            len += 8 + padded_len(title);
        }

        Ok(FileMetaTable {
            information_group_length: len,
            information_version: [0, 1],
            media_storage_sop_class_uid,
            media_storage_sop_instance_uid,
            transfer_syntax,
            implementation_class_uid,
            implementation_version_name,
            source_application_entity_title: self.source_application_entity_title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> FileMetaTable {
        FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.3.4.5.6")
            .transfer_syntax("1.2.840.10008.1.2.1")
            .build()
            .unwrap()
    }

    #[test]
    fn meta_table_round_trip() {
        let table = sample_table();

        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        assert_eq!(&out[0..4], b"DICM");

        let read_back = FileMetaTable::from_reader(&out[..]).unwrap();
        assert_eq!(read_back, table);
    }

    #[test]
    fn group_length_matches_encoded_size() {
        let table = sample_table();

        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        // magic (4) + group length element (12) + the group itself
        assert_eq!(
            out.len(),
            4 + 12 + table.information_group_length as usize
        );
    }

    #[test]
    fn missing_magic_code_is_not_dicom() {
        let data = b"NOPExxxxxxxx";
        assert!(matches!(
            FileMetaTable::from_reader(&data[..]),
            Err(Error::NotDicom { .. })
        ));
    }

    #[test]
    fn builder_requires_transfer_syntax() {
        let err = FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.3.4.5.6")
            .build();
        assert!(matches!(err, Err(Error::MissingElement { .. })));
    }
}
