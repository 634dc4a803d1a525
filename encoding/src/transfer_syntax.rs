//! Descriptors for the supported transfer syntaxes:
//! the combination of byte order and explicit/implicit VR typing
//! under which a data set is serialized,
//! plus factories for the matching decoders and encoders.

use crate::decode::{
    BasicDecoder, DynDecoder, ExplicitVRBigEndianDecoder, ExplicitVRLittleEndianDecoder,
    ImplicitVRLittleEndianDecoder,
};
use crate::encode::{
    BasicEncoder, DynEncoder, ExplicitVRBigEndianEncoder, ExplicitVRLittleEndianEncoder,
    ImplicitVRLittleEndianEncoder,
};
use byteordered::Endianness;
use dcmio_core::dictionary::DataDictionary;
use std::io::{Read, Write};

/// A descriptor of how a data set is serialized to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSyntax {
    /// The unique identifier registered for this transfer syntax.
    uid: &'static str,
    /// The published name of this transfer syntax.
    name: &'static str,
    /// The byte order of binary values.
    endianness: Endianness,
    /// Whether value representations are present in the stream.
    explicit_vr: bool,
}

/// Implicit VR Little Endian: the default transfer syntax.
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2",
    name: "Implicit VR Little Endian",
    endianness: Endianness::Little,
    explicit_vr: false,
};

/// Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.1",
    name: "Explicit VR Little Endian",
    endianness: Endianness::Little,
    explicit_vr: true,
};

/// Explicit VR Big Endian (retired in the standard, still encountered).
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax {
    uid: "1.2.840.10008.1.2.2",
    name: "Explicit VR Big Endian",
    endianness: Endianness::Big,
    explicit_vr: true,
};

impl TransferSyntax {
    /// Obtain the transfer syntax registered under the given UID.
    /// Trailing padding characters are ignored.
    pub fn from_uid(uid: &str) -> Option<&'static TransferSyntax> {
        match uid.trim_end_matches(['\0', ' ']) {
            "1.2.840.10008.1.2" => Some(&IMPLICIT_VR_LITTLE_ENDIAN),
            "1.2.840.10008.1.2.1" => Some(&EXPLICIT_VR_LITTLE_ENDIAN),
            "1.2.840.10008.1.2.2" => Some(&EXPLICIT_VR_BIG_ENDIAN),
            _ => None,
        }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the published name of this transfer syntax.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The byte order of binary values under this transfer syntax.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Whether value representations are written to the stream.
    pub fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Obtain a basic decoder in this transfer syntax' byte order.
    pub fn basic_decoder(&self) -> BasicDecoder {
        BasicDecoder::new(self.endianness)
    }

    /// Obtain a basic encoder in this transfer syntax' byte order.
    pub fn basic_encoder(&self) -> BasicEncoder {
        BasicEncoder::new(self.endianness)
    }

    /// Obtain a data element decoder for this transfer syntax,
    /// resolving implicit value representations
    /// through the given dictionary.
    pub fn decoder_with_dict<S, D>(&self, dict: D) -> DynDecoder<S>
    where
        S: ?Sized + Read,
        D: DataDictionary + 'static,
    {
        match (self.explicit_vr, self.endianness) {
            (true, Endianness::Little) => Box::new(ExplicitVRLittleEndianDecoder::default()),
            (true, Endianness::Big) => Box::new(ExplicitVRBigEndianDecoder::default()),
            (false, _) => Box::new(ImplicitVRLittleEndianDecoder::with_dict(dict)),
        }
    }

    /// Obtain a data element encoder for this transfer syntax.
    pub fn encoder<W>(&self) -> DynEncoder<W>
    where
        W: ?Sized + Write,
    {
        match (self.explicit_vr, self.endianness) {
            (true, Endianness::Little) => Box::new(ExplicitVRLittleEndianEncoder::default()),
            (true, Endianness::Big) => Box::new(ExplicitVRBigEndianEncoder::default()),
            (false, _) => Box::new(ImplicitVRLittleEndianEncoder::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_lookup() {
        let ts = TransferSyntax::from_uid("1.2.840.10008.1.2.1").unwrap();
        assert_eq!(ts, &EXPLICIT_VR_LITTLE_ENDIAN);
        assert!(ts.is_explicit_vr());
        assert_eq!(ts.endianness(), Endianness::Little);

        // padded UIDs resolve as well
        let ts = TransferSyntax::from_uid("1.2.840.10008.1.2\0").unwrap();
        assert_eq!(ts, &IMPLICIT_VR_LITTLE_ENDIAN);
        assert!(!ts.is_explicit_vr());

        assert!(TransferSyntax::from_uid("1.2.840.10008.1.2.4.50").is_none());
    }
}
