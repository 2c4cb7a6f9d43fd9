//! Configured entry points for decoding and encoding whole PDUs

use crate::cert::Certificate;
use crate::error::{PduError, PduResult};
use crate::lic::LicensePacket;
use crate::logging::{LogLevel, Logger};
use bytes::Bytes;
use rdp_codec::ByteStream;
use tracing::debug;

/// Largest PDU accepted by default
pub const DEFAULT_MAX_PDU_SIZE: usize = 65535;

/// Codec configuration
#[derive(Debug, Clone)]
pub struct CodecConfig {
    pub log_level: LogLevel,
    pub max_pdu_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
        }
    }
}

impl CodecConfig {
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_max_pdu_size(mut self, max: usize) -> Self {
        self.max_pdu_size = max;
        self
    }
}

/// Decoder/encoder for certificate and licensing PDUs
#[derive(Debug, Clone)]
pub struct PduCodec {
    config: CodecConfig,
    logger: Logger,
}

impl PduCodec {
    /// Codec logging to stderr at `config.log_level`
    pub fn new(config: CodecConfig) -> Self {
        let logger = Logger::new(config.log_level);
        Self { config, logger }
    }

    /// Codec reporting to an existing logger
    pub fn with_logger(config: CodecConfig, logger: Logger) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    fn check_size(&self, size: usize) -> PduResult<()> {
        if size > self.config.max_pdu_size {
            return Err(PduError::PduTooLarge {
                size,
                max: self.config.max_pdu_size,
            });
        }
        Ok(())
    }

    fn decode_with<T>(
        &self,
        data: &[u8],
        kind: &'static str,
        decode: impl FnOnce(&mut ByteStream) -> PduResult<T>,
    ) -> PduResult<T> {
        self.check_size(data.len())?;
        self.logger.scope(|| {
            let mut stream = ByteStream::from(data);
            let value = decode(&mut stream)?;
            if stream.remaining() > 0 {
                debug!(kind, trailing = stream.remaining(), "trailing bytes after PDU");
            }
            debug!(kind, size = data.len(), "decoded PDU");
            Ok(value)
        })
    }

    /// Decode a server certificate
    pub fn decode_certificate(&self, data: &[u8]) -> PduResult<Certificate> {
        self.decode_with(data, "certificate", Certificate::decode)
    }

    /// Decode a license packet
    pub fn decode_license_packet(&self, data: &[u8]) -> PduResult<LicensePacket> {
        self.decode_with(data, "license_packet", LicensePacket::decode)
    }

    pub fn encode_certificate(&self, certificate: &Certificate) -> PduResult<Bytes> {
        self.check_size(certificate.size()?)?;
        self.logger.scope(|| certificate.to_bytes())
    }

    pub fn encode_license_packet(&self, packet: &LicensePacket) -> PduResult<Bytes> {
        self.check_size(packet.size()?)?;
        self.logger.scope(|| packet.to_bytes())
    }
}

impl Default for PduCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}
