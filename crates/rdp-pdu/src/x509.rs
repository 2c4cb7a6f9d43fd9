//! Boundary to the external certificate and RSA key decoders
//!
//! Neither ASN.1 nor RSA is implemented here. A chain hands the raw bytes of
//! its last certificate to a [`CertificateDecoder`], and the subject public
//! key it exposes to an [`RsaPublicKeyDecoder`].

use crate::error::BoxError;

/// ASN.1 encoding rules requested from an external decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingRules {
    Ber,
    Der,
}

/// Decoded certificate document
pub trait CertificateDocument {
    /// `tbsCertificate.subjectPublicKeyInfo.subjectPublicKey` as raw bytes
    fn subject_public_key(&self) -> &[u8];
}

/// Decoder for standard (X.509) certificate documents
pub trait CertificateDecoder {
    type Document: CertificateDocument;

    fn decode(&self, bytes: &[u8], rules: EncodingRules) -> Result<Self::Document, BoxError>;
}

/// Decoder for an `RSAPublicKey` structure
pub trait RsaPublicKeyDecoder {
    type Key;

    fn decode(&self, bytes: &[u8], rules: EncodingRules) -> Result<Self::Key, BoxError>;
}
