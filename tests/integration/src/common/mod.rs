//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::time::Duration;

use bytes::Bytes;
use rdp_pdu::{
    BoxError, CertBlob, Certificate, CertificateData, CertificateDecoder, CertificateDocument,
    EncodingRules, ProprietaryCertificate, RsaPublicKey, RsaPublicKeyDecoder, X509CertificateChain,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize test logging once per process
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub const PUBLIC_EXPONENT: u32 = 0x0001_0001;

/// 64-byte modulus 0x01..=0x40
pub fn modulus() -> Vec<u8> {
    (1u8..=64).collect()
}

pub fn rsa_key() -> RsaPublicKey {
    RsaPublicKey::new(PUBLIC_EXPONENT, modulus())
}

pub fn proprietary_certificate() -> Certificate {
    let cert = ProprietaryCertificate::new(rsa_key(), vec![0xC5u8; 64]);
    Certificate::new(CertificateData::Proprietary(cert))
}

pub fn x509_certificate(blobs: &[&[u8]]) -> Certificate {
    let chain = X509CertificateChain::new(blobs.iter().map(|b| CertBlob::new(b.to_vec())));
    Certificate::new(CertificateData::X509Chain(chain))
}

/// Hand-assembled proprietary certificate, independent of the encoder
pub fn proprietary_certificate_wire() -> Vec<u8> {
    let mut key = Vec::new();
    key.extend_from_slice(b"RSA1");
    key.extend_from_slice(&72u32.to_le_bytes());
    key.extend_from_slice(&512u32.to_le_bytes());
    key.extend_from_slice(&63u32.to_le_bytes());
    key.extend_from_slice(&PUBLIC_EXPONENT.to_le_bytes());
    key.extend_from_slice(&modulus());
    key.extend_from_slice(&[0u8; 8]);

    let mut out = Vec::new();
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&6u16.to_le_bytes());
    out.extend_from_slice(&(key.len() as u16).to_le_bytes());
    out.extend_from_slice(&key);
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&72u16.to_le_bytes());
    out.extend_from_slice(&[0xC5u8; 64]);
    out.extend_from_slice(&[0u8; 8]);
    out
}

/// Fake certificate document: `b"CERT"` followed by the subject public key
pub fn fake_certificate(public_key: &[u8]) -> Vec<u8> {
    let mut out = b"CERT".to_vec();
    out.extend_from_slice(public_key);
    out
}

#[derive(Debug)]
pub struct MockDocument {
    public_key: Vec<u8>,
}

impl CertificateDocument for MockDocument {
    fn subject_public_key(&self) -> &[u8] {
        &self.public_key
    }
}

/// Certificate decoder understanding [`fake_certificate`] documents
#[derive(Debug, Default)]
pub struct MockCertificateDecoder {
    pub calls: RefCell<Vec<(Bytes, EncodingRules)>>,
}

impl CertificateDecoder for MockCertificateDecoder {
    type Document = MockDocument;

    fn decode(&self, bytes: &[u8], rules: EncodingRules) -> Result<MockDocument, BoxError> {
        self.calls
            .borrow_mut()
            .push((Bytes::copy_from_slice(bytes), rules));
        match bytes.strip_prefix(b"CERT") {
            Some(key) => Ok(MockDocument {
                public_key: key.to_vec(),
            }),
            None => Err("not a certificate".into()),
        }
    }
}

/// RSA key decoder returning the raw bytes it was handed
#[derive(Debug, Default)]
pub struct MockRsaDecoder {
    pub calls: RefCell<Vec<EncodingRules>>,
}

impl RsaPublicKeyDecoder for MockRsaDecoder {
    type Key = Vec<u8>;

    fn decode(&self, bytes: &[u8], rules: EncodingRules) -> Result<Vec<u8>, BoxError> {
        self.calls.borrow_mut().push(rules);
        Ok(bytes.to_vec())
    }
}

/// RSA key decoder that rejects every key
#[derive(Debug, Default)]
pub struct RejectingRsaDecoder;

impl RsaPublicKeyDecoder for RejectingRsaDecoder {
    type Key = Vec<u8>;

    fn decode(&self, _bytes: &[u8], _rules: EncodingRules) -> Result<Vec<u8>, BoxError> {
        Err("unsupported key encoding".into())
    }
}

/// Outcome of one harness category
#[derive(Debug, Clone)]
pub struct CategoryResult {
    pub name: &'static str,
    pub success: bool,
    pub duration: Duration,
    pub summary: String,
}

/// Aggregated harness results
#[derive(Debug, Default)]
pub struct TestSuiteResults {
    pub categories: Vec<CategoryResult>,
}

impl TestSuiteResults {
    pub fn push(&mut self, result: CategoryResult) {
        self.categories.push(result);
    }

    pub fn passed(&self) -> usize {
        self.categories.iter().filter(|c| c.success).count()
    }

    pub fn failed(&self) -> usize {
        self.categories.len() - self.passed()
    }

    pub fn total_duration(&self) -> Duration {
        self.categories.iter().map(|c| c.duration).sum()
    }
}
