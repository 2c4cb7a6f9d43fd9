//! Server certificate structures (MS-RDPBCGR 2.2.1.4.3.1)
//!
//! ```text
//! Certificate
//! +-- dw_version (u32, low 31 bits select the variant, top bit = temporary)
//! +-- cert_data
//!     +-- CERT_CHAIN_VERSION_1: ProprietaryCertificate
//!     |     sig/key algorithm ids, RSA public key blob, signature blob
//!     +-- CERT_CHAIN_VERSION_2: X509CertificateChain
//!           num_cert_blobs, cert blobs, 8 + 4 * count bytes padding
//! ```

use crate::error::{PduError, PduResult};
use crate::x509::{CertificateDecoder, CertificateDocument, EncodingRules, RsaPublicKeyDecoder};
use bytes::Bytes;
use rdp_codec::{
    checked_len, to_u32, CodecError, CodecResult, ScalarField, Structure, StructureList, VariableBlob,
    VariantSelector, Width,
};

pub(crate) const RSA_PUBLIC_KEY: &str = "rsa_public_key";
pub(crate) const PROPRIETARY_CERTIFICATE: &str = "proprietary_certificate";
pub(crate) const CERT_BLOB: &str = "cert_blob";
pub(crate) const X509_CERTIFICATE_CHAIN: &str = "x509_certificate_chain";
pub(crate) const CERTIFICATE: &str = "certificate";

/// RSA public key magic ("RSA1")
pub const RSA_MAGIC: u32 = 0x3141_5352;
/// SIGNATURE_ALG_RSA
pub const SIGNATURE_ALG_RSA: u32 = 0x0000_0001;
/// KEY_EXCHANGE_ALG_RSA
pub const KEY_EXCHANGE_ALG_RSA: u32 = 0x0000_0001;
/// BB_RSA_KEY_BLOB
pub const BB_RSA_KEY_BLOB: u32 = 0x0006;
/// BB_RSA_SIGNATURE_BLOB
pub const BB_RSA_SIGNATURE_BLOB: u32 = 0x0008;

/// Zero padding trailing the modulus and the signature
pub const PADDING_LEN: usize = 8;

/// Bits of `dw_version` that select the certificate type
pub const CERT_TYPE_MASK: u32 = 0x7FFF_FFFF;
/// Top bit of `dw_version`: the certificate is temporary
pub const CERT_TEMPORARY_FLAG: u32 = 0x8000_0000;

/// Certificate chain version, the low 31 bits of `dw_version`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CertificateType {
    /// Proprietary certificate
    ChainVersion1 = 0x0000_0001,
    /// X.509 certificate chain
    ChainVersion2 = 0x0000_0002,
}

impl CertificateType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x0000_0001 => Some(Self::ChainVersion1),
            0x0000_0002 => Some(Self::ChainVersion2),
            _ => None,
        }
    }
}

fn times(field: &'static str, value: u32, factor: u32) -> CodecResult<u32> {
    value.checked_mul(factor).ok_or_else(|| CodecError::InvalidLength {
        field,
        reason: format!("{} * {} overflows", value, factor),
    })
}

fn rsa_public_key(pub_exp: u32, modulus: Option<Bytes>) -> Structure {
    let mut s = Structure::new(RSA_PUBLIC_KEY);
    s.push("magic", ScalarField::constant(Width::U32, RSA_MAGIC));
    let keylen = s.push("keylen", ScalarField::computed(Width::U32));
    let bitlen = s.push("bitlen", ScalarField::computed(Width::U32));
    let datalen = s.push("datalen", ScalarField::computed(Width::U32));
    s.push("pub_exp", ScalarField::literal(Width::U32, pub_exp));
    let modulus = s.push("modulus", modulus.map_or_else(VariableBlob::new, VariableBlob::from_bytes));
    let padding = s.push("padding", VariableBlob::zeroed(PADDING_LEN));

    s.bind(keylen, move |sc| to_u32(sc.size(modulus)? + sc.size(padding)?));
    s.bind(bitlen, move |sc| times("bitlen", checked_len("bitlen", sc.value(keylen)?, 8)?, 8));
    s.bind(datalen, move |sc| checked_len("datalen", sc.value(bitlen)? / 8, 1));
    s.bind(modulus, move |sc| checked_len("modulus", sc.value(keylen)?, 8));
    s
}

structure_wrapper!(
    /// RSA public key blob (MS-RDPBCGR 2.2.1.4.3.1.1.1)
    ///
    /// `keylen`, `bitlen` and `datalen` follow the modulus; only the public
    /// exponent and the modulus are set by the caller.
    RsaPublicKey,
    RSA_PUBLIC_KEY,
    rsa_public_key(0, None)
);

impl RsaPublicKey {
    pub fn new(public_exponent: u32, modulus: impl Into<Bytes>) -> Self {
        Self(rsa_public_key(public_exponent, Some(modulus.into())))
    }

    pub fn magic(&self) -> PduResult<u32> {
        Ok(self.0.value("magic")?)
    }

    /// Modulus length plus padding
    pub fn keylen(&self) -> PduResult<u32> {
        Ok(self.0.value("keylen")?)
    }

    pub fn bitlen(&self) -> PduResult<u32> {
        Ok(self.0.value("bitlen")?)
    }

    /// Maximum number of bytes that can be encoded with the key
    pub fn datalen(&self) -> PduResult<u32> {
        Ok(self.0.value("datalen")?)
    }

    pub fn public_exponent(&self) -> PduResult<u32> {
        Ok(self.0.value("pub_exp")?)
    }

    /// Little-endian modulus
    pub fn modulus(&self) -> PduResult<&Bytes> {
        Ok(self.0.bytes("modulus")?)
    }
}

fn proprietary_certificate(public_key: Option<Structure>, signature: Option<Bytes>) -> Structure {
    let mut s = Structure::new(PROPRIETARY_CERTIFICATE).with_tag(CertificateType::ChainVersion1 as u32);
    s.push("sig_alg_id", ScalarField::constant(Width::U32, SIGNATURE_ALG_RSA));
    s.push("key_alg_id", ScalarField::constant(Width::U32, KEY_EXCHANGE_ALG_RSA));
    s.push("public_key_blob_type", ScalarField::constant(Width::U16, BB_RSA_KEY_BLOB));
    let key_len = s.push("public_key_blob_len", ScalarField::computed(Width::U16));
    let key = s.push(
        "public_key_blob",
        public_key.unwrap_or_else(|| rsa_public_key(0, None)),
    );
    s.push("signature_blob_type", ScalarField::constant(Width::U16, BB_RSA_SIGNATURE_BLOB));
    let sig_len = s.push("signature_blob_len", ScalarField::computed(Width::U16));
    let sig = s.push(
        "signature_blob",
        signature.map_or_else(VariableBlob::new, VariableBlob::from_bytes),
    );
    let padding = s.push("padding", VariableBlob::zeroed(PADDING_LEN));

    s.bind(key_len, move |sc| to_u32(sc.size(key)?));
    s.bind(key, move |sc| sc.value(key_len));
    s.bind(sig_len, move |sc| to_u32(sc.size(sig)? + sc.size(padding)?));
    s.bind(sig, move |sc| {
        checked_len("signature_blob", sc.value(sig_len)?, to_u32(sc.size(padding)?)?)
    });
    s
}

structure_wrapper!(
    /// Proprietary server certificate (MS-RDPBCGR 2.2.1.4.3.1.1)
    ProprietaryCertificate,
    PROPRIETARY_CERTIFICATE,
    proprietary_certificate(None, None)
);

impl ProprietaryCertificate {
    pub fn new(public_key: RsaPublicKey, signature: impl Into<Bytes>) -> Self {
        Self(proprietary_certificate(
            Some(public_key.into_structure()),
            Some(signature.into()),
        ))
    }

    pub fn public_key(&self) -> PduResult<RsaPublicKey> {
        RsaPublicKey::from_structure(self.0.child("public_key_blob")?.clone())
    }

    pub fn public_key_blob_len(&self) -> PduResult<u32> {
        Ok(self.0.value("public_key_blob_len")?)
    }

    /// Signature without its trailing padding
    pub fn signature(&self) -> PduResult<&Bytes> {
        Ok(self.0.bytes("signature_blob")?)
    }

    /// Signature length including the 8 bytes of padding
    pub fn signature_blob_len(&self) -> PduResult<u32> {
        Ok(self.0.value("signature_blob_len")?)
    }
}

fn cert_blob(cert: Option<Bytes>) -> Structure {
    let mut s = Structure::new(CERT_BLOB);
    let cb_cert = s.push("cb_cert", ScalarField::computed(Width::U32));
    let ab_cert = s.push("ab_cert", cert.map_or_else(VariableBlob::new, VariableBlob::from_bytes));
    s.bind(cb_cert, move |sc| to_u32(sc.size(ab_cert)?));
    s.bind(ab_cert, move |sc| sc.value(cb_cert));
    s
}

structure_wrapper!(
    /// One element of an X.509 certificate chain (MS-RDPBCGR 2.2.1.4.2)
    ///
    /// The payload is an encoded certificate document; it is not decoded here.
    CertBlob,
    CERT_BLOB,
    cert_blob(None)
);

impl CertBlob {
    pub fn new(cert: impl Into<Bytes>) -> Self {
        Self(cert_blob(Some(cert.into())))
    }

    pub fn cert(&self) -> PduResult<&Bytes> {
        Ok(self.0.bytes("ab_cert")?)
    }

    pub fn cb_cert(&self) -> PduResult<u32> {
        Ok(self.0.value("cb_cert")?)
    }
}

fn x509_certificate_chain(blobs: Vec<Structure>) -> Structure {
    let mut s = Structure::new(X509_CERTIFICATE_CHAIN).with_tag(CertificateType::ChainVersion2 as u32);
    let count = s.push("num_cert_blobs", ScalarField::computed(Width::U32));
    let mut list = StructureList::new(|| cert_blob(None));
    for blob in blobs {
        list.push(blob);
    }
    let array = s.push("cert_blob_array", list);
    let padding = s.push("padding", VariableBlob::new());

    s.bind(count, move |sc| to_u32(sc.len(array)?));
    s.bind(array, move |sc| sc.value(count));
    // Not verified against captured traffic
    s.bind(padding, move |sc| {
        times("padding", sc.value(count)?, 4)?
            .checked_add(8)
            .ok_or_else(|| CodecError::InvalidLength {
                field: "padding",
                reason: "padding length overflows".to_string(),
            })
    });
    s
}

structure_wrapper!(
    /// X.509 certificate chain (MS-RDPBCGR 2.2.1.4.3.1.2)
    ///
    /// The trailing padding is read as `8 + 4 * count` bytes without
    /// validating its content.
    X509CertificateChain,
    X509_CERTIFICATE_CHAIN,
    x509_certificate_chain(Vec::new())
);

impl X509CertificateChain {
    pub fn new(blobs: impl IntoIterator<Item = CertBlob>) -> Self {
        Self(x509_certificate_chain(
            blobs.into_iter().map(CertBlob::into_structure).collect(),
        ))
    }

    pub fn push(&mut self, blob: CertBlob) -> PduResult<()> {
        Ok(self.0.push_item("cert_blob_array", blob.into_structure())?)
    }

    pub fn num_cert_blobs(&self) -> PduResult<u32> {
        Ok(self.0.value("num_cert_blobs")?)
    }

    /// Certificate documents in chain order
    pub fn certificates(&self) -> PduResult<Vec<Bytes>> {
        let mut certs = Vec::new();
        for item in self.0.items("cert_blob_array")? {
            certs.push(item.bytes("ab_cert")?.clone());
        }
        Ok(certs)
    }

    /// Size of the trailing padding region
    pub fn padding_len(&self) -> PduResult<usize> {
        Ok(self.0.field_size("padding")?)
    }

    /// RSA public key of the last certificate in the chain
    ///
    /// The certificate is handed to `certs`; the subject public key it
    /// exposes is handed to `keys`.
    pub fn public_key<C, R>(&self, certs: &C, keys: &R) -> PduResult<R::Key>
    where
        C: CertificateDecoder,
        R: RsaPublicKeyDecoder,
    {
        let items = self.0.items("cert_blob_array")?;
        let last = items.last().ok_or(PduError::EmptyCertificateChain)?;
        let document = certs
            .decode(last.bytes("ab_cert")?, EncodingRules::Ber)
            .map_err(PduError::CertificateDecoder)?;
        keys.decode(document.subject_public_key(), EncodingRules::Ber)
            .map_err(PduError::RsaKeyDecoder)
    }
}

fn certificate_registry(discriminant: u32) -> Option<Structure> {
    match CertificateType::from_u32(discriminant)? {
        CertificateType::ChainVersion1 => Some(proprietary_certificate(None, None)),
        CertificateType::ChainVersion2 => Some(x509_certificate_chain(Vec::new())),
    }
}

fn certificate(data: Option<Structure>) -> Structure {
    let mut s = Structure::new(CERTIFICATE);
    let version = s.push("dw_version", ScalarField::computed(Width::U32));
    let selector = match data {
        Some(data) => VariantSelector::resolved(certificate_registry, data),
        None => VariantSelector::new(certificate_registry),
    };
    let cert_data = s.push("cert_data", selector);

    // Keep the temporary flag of a decoded certificate
    s.bind(version, move |sc| {
        let flag = sc.decoded(version).unwrap_or(0) & CERT_TEMPORARY_FLAG;
        Ok(sc.tag(cert_data)? | flag)
    });
    s.bind(cert_data, move |sc| Ok(sc.value(version)? & CERT_TYPE_MASK));
    s
}

/// Concrete certificate carried by a [`Certificate`]
#[derive(Debug, Clone)]
pub enum CertificateData {
    Proprietary(ProprietaryCertificate),
    X509Chain(X509CertificateChain),
}

impl CertificateData {
    pub fn certificate_type(&self) -> CertificateType {
        match self {
            CertificateData::Proprietary(_) => CertificateType::ChainVersion1,
            CertificateData::X509Chain(_) => CertificateType::ChainVersion2,
        }
    }

    fn into_structure(self) -> Structure {
        match self {
            CertificateData::Proprietary(cert) => cert.into_structure(),
            CertificateData::X509Chain(chain) => chain.into_structure(),
        }
    }
}

structure_wrapper!(
    /// Server certificate envelope
    Certificate,
    CERTIFICATE,
    certificate(None)
);

impl Certificate {
    pub fn new(data: CertificateData) -> Self {
        Self(certificate(Some(data.into_structure())))
    }

    /// Raw `dw_version`, including the temporary flag
    pub fn version(&self) -> PduResult<u32> {
        Ok(self.0.value("dw_version")?)
    }

    pub fn certificate_type(&self) -> PduResult<CertificateType> {
        let version = self.version()? & CERT_TYPE_MASK;
        CertificateType::from_u32(version).ok_or(PduError::InvalidCertificateType(version))
    }

    pub fn is_temporary(&self) -> PduResult<bool> {
        Ok(self.version()? & CERT_TEMPORARY_FLAG != 0)
    }

    pub fn data(&self) -> PduResult<CertificateData> {
        let data = self.0.child("cert_data")?.clone();
        match data.tag().and_then(CertificateType::from_u32) {
            Some(CertificateType::ChainVersion1) => {
                Ok(CertificateData::Proprietary(ProprietaryCertificate::from_structure(data)?))
            }
            Some(CertificateType::ChainVersion2) => {
                Ok(CertificateData::X509Chain(X509CertificateChain::from_structure(data)?))
            }
            None => Err(PduError::InvalidCertificateType(data.tag().unwrap_or(0))),
        }
    }
}
