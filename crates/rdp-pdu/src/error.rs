//! Error types for RDP certificate and licensing PDUs

use crate::cert::{CERTIFICATE, RSA_PUBLIC_KEY};
use crate::lic::LICENSE_PACKET;
use rdp_codec::CodecError;
use thiserror::Error;

/// Boxed error returned by external decoders
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// PDU error types
#[derive(Debug, Error)]
pub enum PduError {
    #[error("invalid RSA public key magic: 0x{0:08x}")]
    BadRsaMagic(u32),

    #[error("invalid certificate type: 0x{0:08x}")]
    InvalidCertificateType(u32),

    #[error("unhandled license message type: 0x{0:02x}")]
    UnhandledMessageType(u8),

    #[error("certificate chain holds no certificate")]
    EmptyCertificateChain,

    #[error("certificate decoder: {0}")]
    CertificateDecoder(#[source] BoxError),

    #[error("RSA key decoder: {0}")]
    RsaKeyDecoder(#[source] BoxError),

    #[error("expected structure {expected}, found {found}")]
    WrongStructure {
        expected: &'static str,
        found: &'static str,
    },

    #[error("PDU too large: {size} bytes exceeds maximum {max}")]
    PduTooLarge { size: usize, max: usize },

    #[error(transparent)]
    Codec(CodecError),
}

impl From<CodecError> for PduError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Format {
                structure: RSA_PUBLIC_KEY,
                field: "magic",
                found,
                ..
            } => PduError::BadRsaMagic(found),
            CodecError::UnsupportedVariant {
                structure: CERTIFICATE,
                discriminant,
                ..
            } => PduError::InvalidCertificateType(discriminant),
            CodecError::UnsupportedVariant {
                structure: LICENSE_PACKET,
                discriminant,
                ..
            } => PduError::UnhandledMessageType(discriminant as u8),
            other => PduError::Codec(other),
        }
    }
}

pub type PduResult<T> = std::result::Result<T, PduError>;
