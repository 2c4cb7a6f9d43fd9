//! Certificate Tests - Server Certificate Scenarios
//!
//! These tests exercise the server certificate structures:
//! - Proprietary certificates against a hand-assembled capture
//! - X.509 chains and their trailing padding
//! - Version dispatch and the temporary flag
//! - Public key extraction through external decoders

mod common;

use common::*;
use rdp_codec::{ByteStream, CodecError};
use rdp_pdu::{
    CertBlob, Certificate, CertificateData, CertificateType, CodecConfig, EncodingRules, Logger,
    PduCodec, PduError, RsaPublicKey, X509CertificateChain,
};

fn codec() -> PduCodec {
    PduCodec::with_logger(CodecConfig::default(), Logger::disabled())
}

fn chain_of(cert: &Certificate) -> X509CertificateChain {
    match cert.data().unwrap() {
        CertificateData::X509Chain(chain) => chain,
        other => panic!("expected X.509 chain, got {:?}", other.certificate_type()),
    }
}

#[test]
fn test_proprietary_matches_capture() {
    init_logging();

    let mut wire = 1u32.to_le_bytes().to_vec();
    wire.extend_from_slice(&proprietary_certificate_wire());

    let encoded = proprietary_certificate().to_bytes().unwrap();
    assert_eq!(encoded.as_ref(), &wire[..]);

    let decoded = codec().decode_certificate(&wire).unwrap();
    assert_eq!(decoded.certificate_type().unwrap(), CertificateType::ChainVersion1);
    let CertificateData::Proprietary(cert) = decoded.data().unwrap() else {
        panic!("expected proprietary certificate");
    };
    let key = cert.public_key().unwrap();
    assert_eq!(key.modulus().unwrap().as_ref(), &modulus()[..]);
    assert_eq!(key.public_exponent().unwrap(), PUBLIC_EXPONENT);
    assert_eq!(key.datalen().unwrap(), 63);
    assert_eq!(cert.signature().unwrap().as_ref(), &[0xC5u8; 64][..]);
}

#[test]
fn test_public_key_blob_trailing_bytes_skipped() {
    init_logging();

    // Declare a key blob four bytes longer than the key itself
    let mut wire = proprietary_certificate_wire();
    let key_len = u16::from_le_bytes([wire[10], wire[11]]);
    wire[10..12].copy_from_slice(&(key_len + 4).to_le_bytes());
    let key_end = 12 + key_len as usize;
    wire.splice(key_end..key_end, [0xEEu8; 4]);

    let mut envelope = 1u32.to_le_bytes().to_vec();
    envelope.extend_from_slice(&wire);

    let decoded = codec().decode_certificate(&envelope).unwrap();
    let CertificateData::Proprietary(cert) = decoded.data().unwrap() else {
        panic!("expected proprietary certificate");
    };
    assert_eq!(cert.public_key().unwrap().modulus().unwrap().as_ref(), &modulus()[..]);
    assert_eq!(cert.signature().unwrap().len(), 64);
}

#[test]
fn test_chain_roundtrip() {
    init_logging();

    let der = vec![0x30u8, 0x82, 0x01, 0x0A, 0x02, 0x01];
    let cert = x509_certificate(&[&der[..]]);
    let bytes = codec().encode_certificate(&cert).unwrap();
    assert_eq!(&bytes[..4], &2u32.to_le_bytes());
    assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
    assert_eq!(bytes.len(), 4 + 4 + 4 + der.len() + 12);
    assert!(bytes[bytes.len() - 12..].iter().all(|b| *b == 0));

    let decoded = codec().decode_certificate(&bytes).unwrap();
    let chain = chain_of(&decoded);
    assert_eq!(chain.num_cert_blobs().unwrap(), 1);
    assert_eq!(chain.padding_len().unwrap(), 12);
    let certs = chain.certificates().unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].as_ref(), &der[..]);
}

#[test]
fn test_chain_padding_grows_with_count() {
    for count in 0..5usize {
        let blobs: Vec<Vec<u8>> = (0..count).map(|i| vec![i as u8; i + 1]).collect();
        let refs: Vec<&[u8]> = blobs.iter().map(Vec::as_slice).collect();
        let chain = chain_of(&x509_certificate(&refs));
        assert_eq!(chain.padding_len().unwrap(), 8 + 4 * count);
    }
}

#[test]
fn test_chain_push() {
    let mut chain = X509CertificateChain::new(Vec::new());
    chain.push(CertBlob::new(vec![1u8])).unwrap();
    chain.push(CertBlob::new(vec![2u8, 2])).unwrap();
    assert_eq!(chain.num_cert_blobs().unwrap(), 2);
    assert_eq!(chain.size().unwrap(), 4 + 5 + 6 + 16);
}

#[test]
fn test_temporary_flag_dispatch() {
    init_logging();

    let mut bytes = proprietary_certificate().to_bytes().unwrap().to_vec();
    bytes[3] = 0x80;

    let decoded = codec().decode_certificate(&bytes).unwrap();
    assert!(decoded.is_temporary().unwrap());
    assert_eq!(decoded.version().unwrap(), 0x8000_0001);
    assert_eq!(decoded.certificate_type().unwrap(), CertificateType::ChainVersion1);
    assert_eq!(decoded.to_bytes().unwrap().as_ref(), &bytes[..]);
}

#[test]
fn test_unknown_versions_rejected() {
    init_logging();

    for version in [0u32, 3, 0x8000_0000, 0x8000_0003, 0x7FFF_FFFF] {
        let err = codec().decode_certificate(&version.to_le_bytes()).unwrap_err();
        assert!(
            matches!(err, PduError::InvalidCertificateType(v) if v == version & 0x7FFF_FFFF),
            "version {:#x} gave {:?}",
            version,
            err
        );
    }
}

#[test]
fn test_bad_rsa_magic() {
    let mut bytes = rsa_key().to_bytes().unwrap().to_vec();
    bytes[..4].copy_from_slice(b"RSA2");
    let mut stream = ByteStream::from(bytes);
    let err = RsaPublicKey::decode(&mut stream).unwrap_err();
    assert!(matches!(err, PduError::BadRsaMagic(0x3241_5352)));
    assert_eq!(stream.position(), 4);
}

#[test]
fn test_rsa_key_empty_modulus() {
    let key = RsaPublicKey::new(PUBLIC_EXPONENT, Vec::new());
    assert_eq!(key.keylen().unwrap(), 8);
    assert_eq!(key.bitlen().unwrap(), 0);
    assert!(matches!(
        key.to_bytes().unwrap_err(),
        PduError::Codec(CodecError::InvalidLength { field: "datalen", .. })
    ));
}

#[test]
fn test_public_key_uses_last_blob() {
    init_logging();

    let root = fake_certificate(b"root-key");
    let leaf = fake_certificate(b"leaf-key");
    let cert = x509_certificate(&[&root[..], &leaf[..]]);
    let bytes = cert.to_bytes().unwrap();
    let chain = chain_of(&codec().decode_certificate(&bytes).unwrap());

    let certs = MockCertificateDecoder::default();
    let keys = MockRsaDecoder::default();
    let key = chain.public_key(&certs, &keys).unwrap();

    assert_eq!(key, b"leaf-key".to_vec());
    let calls = certs.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_ref(), &leaf[..]);
    assert_eq!(calls[0].1, EncodingRules::Ber);
    assert_eq!(*keys.calls.borrow(), vec![EncodingRules::Ber]);
}

#[test]
fn test_public_key_errors() {
    let certs = MockCertificateDecoder::default();
    let keys = MockRsaDecoder::default();

    let empty = X509CertificateChain::new(Vec::new());
    assert!(matches!(
        empty.public_key(&certs, &keys).unwrap_err(),
        PduError::EmptyCertificateChain
    ));

    let garbage = X509CertificateChain::new(vec![CertBlob::new(vec![0xFFu8; 4])]);
    assert!(matches!(
        garbage.public_key(&certs, &keys).unwrap_err(),
        PduError::CertificateDecoder(_)
    ));
    assert!(keys.calls.borrow().is_empty());
}

#[test]
fn test_rsa_key_decoder_failure() {
    let leaf = fake_certificate(b"leaf-key");
    let chain = X509CertificateChain::new(vec![CertBlob::new(leaf)]);

    let certs = MockCertificateDecoder::default();
    let err = chain.public_key(&certs, &RejectingRsaDecoder).unwrap_err();
    assert!(matches!(err, PduError::RsaKeyDecoder(_)), "got {:?}", err);
    assert_eq!(err.to_string(), "RSA key decoder: unsupported key encoding");
    assert_eq!(certs.calls.borrow().len(), 1);
}

#[test]
fn test_truncated_certificate() {
    let bytes = proprietary_certificate().to_bytes().unwrap();
    for cut in [0usize, 3, 4, 11, 20, 100, bytes.len() - 1] {
        let err = codec().decode_certificate(&bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, PduError::Codec(CodecError::Underrun { .. })),
            "cut at {} gave {:?}",
            cut,
            err
        );
    }
}
