//! RDP server certificate and licensing PDUs
//!
//! This crate describes the certificate structures exchanged during RDP
//! connection setup (MS-RDPBCGR 2.2.1.4.3.1) and the licensing PDUs
//! (MS-RDPELE 2.2.2) on top of the declarative codec in [`rdp_codec`].
//!
//! # Example
//!
//! ```
//! use rdp_pdu::lic::{ErrorCode, LicensePacket, LicensingErrorMessage, LicensingMessage, StateTransition};
//! use rdp_pdu::{CodecConfig, PduCodec};
//!
//! let codec = PduCodec::new(CodecConfig::default());
//! let message = LicensingErrorMessage::new(ErrorCode::ValidClient, StateTransition::NoTransition, Vec::new());
//! let packet = LicensePacket::new(LicensingMessage::ErrorAlert(message));
//!
//! let bytes = codec.encode_license_packet(&packet).unwrap();
//! let decoded = codec.decode_license_packet(&bytes).unwrap();
//! assert_eq!(decoded.msg_size().unwrap() as usize, bytes.len());
//! ```

/// Typed wrapper around a [`rdp_codec::Structure`] built by a template function
macro_rules! structure_wrapper {
    ($(#[$meta:meta])* $ty:ident, $name:expr, $template:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $ty(rdp_codec::Structure);

        impl $ty {
            /// Decode from the stream's current position
            pub fn decode(stream: &mut rdp_codec::ByteStream) -> $crate::PduResult<Self> {
                let mut structure = $template;
                structure.decode(stream)?;
                Ok(Self(structure))
            }

            pub fn encode(&self, stream: &mut rdp_codec::ByteStream) -> $crate::PduResult<()> {
                Ok(self.0.encode(stream)?)
            }

            pub fn size(&self) -> $crate::PduResult<usize> {
                Ok(self.0.size()?)
            }

            pub fn to_bytes(&self) -> $crate::PduResult<bytes::Bytes> {
                Ok(self.0.to_bytes()?)
            }

            pub fn as_structure(&self) -> &rdp_codec::Structure {
                &self.0
            }

            pub fn into_structure(self) -> rdp_codec::Structure {
                self.0
            }

            /// Wrap a structure built by this type's template
            pub fn from_structure(structure: rdp_codec::Structure) -> $crate::PduResult<Self> {
                if structure.name() != $name {
                    return Err($crate::PduError::WrongStructure {
                        expected: $name,
                        found: structure.name(),
                    });
                }
                Ok(Self(structure))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub mod cert;
pub mod codec;
pub mod error;
pub mod lic;
pub mod logging;
pub mod x509;

pub use codec::{CodecConfig, PduCodec, DEFAULT_MAX_PDU_SIZE};
pub use error::{BoxError, PduError, PduResult};
pub use logging::{LogLevel, Logger};

pub use cert::{
    CertBlob, Certificate, CertificateData, CertificateType, ProprietaryCertificate, RsaPublicKey,
    X509CertificateChain,
};
pub use lic::{
    BlobType, ErrorCode, LicenseBinaryBlob, LicensePacket, LicensingErrorMessage, LicensingMessage,
    MessageType, StateTransition,
};
pub use x509::{CertificateDecoder, CertificateDocument, EncodingRules, RsaPublicKeyDecoder};

/// Re-export the codec for convenience
pub use rdp_codec;
