//! Licensing PDUs (MS-RDPELE 2.2.2)
//!
//! Only the error alert message is modelled; a packet carrying any other
//! message type fails to decode with [`PduError::UnhandledMessageType`].

use crate::error::{PduError, PduResult};
use bytes::Bytes;
use rdp_codec::{to_u32, ByteStream, ScalarField, Structure, VariableBlob, VariantSelector, Width};

pub(crate) const LICENSE_BINARY_BLOB: &str = "license_binary_blob";
pub(crate) const LICENSING_ERROR_MESSAGE: &str = "licensing_error_message";
pub(crate) const LICENSE_PACKET: &str = "license_packet";

/// Preamble flag values (MS-RDPELE 2.2.1.12.1)
pub mod preamble {
    pub const PREAMBLE_VERSION_2_0: u8 = 0x02;
    pub const PREAMBLE_VERSION_3_0: u8 = 0x03;
    pub const LICENSE_PROTOCOL_VERSION_MASK: u8 = 0x0F;
    pub const EXTENDED_ERROR_MSG_SUPPORTED: u8 = 0x80;
}

/// License packet message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    LicenseRequest = 0x01,
    PlatformChallenge = 0x02,
    NewLicense = 0x03,
    UpgradeLicense = 0x04,
    LicenseInfo = 0x12,
    NewLicenseRequest = 0x13,
    PlatformChallengeResponse = 0x15,
    ErrorAlert = 0xFF,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::LicenseRequest),
            0x02 => Some(Self::PlatformChallenge),
            0x03 => Some(Self::NewLicense),
            0x04 => Some(Self::UpgradeLicense),
            0x12 => Some(Self::LicenseInfo),
            0x13 => Some(Self::NewLicenseRequest),
            0x15 => Some(Self::PlatformChallengeResponse),
            0xFF => Some(Self::ErrorAlert),
            _ => None,
        }
    }
}

/// Licensing error code (MS-RDPELE 2.2.1.12.1.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    InvalidServerCertificate = 0x0000_0001,
    NoLicense = 0x0000_0002,
    InvalidMac = 0x0000_0003,
    InvalidScope = 0x0000_0004,
    NoLicenseServer = 0x0000_0006,
    ValidClient = 0x0000_0007,
    InvalidClient = 0x0000_0008,
    InvalidProductId = 0x0000_000B,
    InvalidMessageLen = 0x0000_000C,
}

impl ErrorCode {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x01 => Some(Self::InvalidServerCertificate),
            0x02 => Some(Self::NoLicense),
            0x03 => Some(Self::InvalidMac),
            0x04 => Some(Self::InvalidScope),
            0x06 => Some(Self::NoLicenseServer),
            0x07 => Some(Self::ValidClient),
            0x08 => Some(Self::InvalidClient),
            0x0B => Some(Self::InvalidProductId),
            0x0C => Some(Self::InvalidMessageLen),
            _ => None,
        }
    }
}

/// Licensing state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StateTransition {
    TotalAbort = 0x0000_0001,
    NoTransition = 0x0000_0002,
    ResetPhaseToStart = 0x0000_0003,
    ResendLastMessage = 0x0000_0004,
}

impl StateTransition {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x01 => Some(Self::TotalAbort),
            0x02 => Some(Self::NoTransition),
            0x03 => Some(Self::ResetPhaseToStart),
            0x04 => Some(Self::ResendLastMessage),
            _ => None,
        }
    }
}

/// License binary blob type
///
/// `Any` is not a wire value: a blob declared with it accepts whatever type
/// the peer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BlobType {
    Any = 0x0000,
    Data = 0x0001,
    Random = 0x0002,
    Certificate = 0x0003,
    Error = 0x0004,
    EncryptedData = 0x0009,
    KeyExchangeAlg = 0x000D,
    Scope = 0x000E,
    ClientUserName = 0x000F,
    ClientMachineName = 0x0010,
}

impl BlobType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0000 => Some(Self::Any),
            0x0001 => Some(Self::Data),
            0x0002 => Some(Self::Random),
            0x0003 => Some(Self::Certificate),
            0x0004 => Some(Self::Error),
            0x0009 => Some(Self::EncryptedData),
            0x000D => Some(Self::KeyExchangeAlg),
            0x000E => Some(Self::Scope),
            0x000F => Some(Self::ClientUserName),
            0x0010 => Some(Self::ClientMachineName),
            _ => None,
        }
    }
}

fn license_binary_blob(blob_type: BlobType, data: Option<Bytes>) -> Structure {
    let mut s = Structure::new(LICENSE_BINARY_BLOB);
    let type_field = match blob_type {
        BlobType::Any => ScalarField::literal(Width::U16, BlobType::Any as u32),
        other => ScalarField::constant(Width::U16, other as u32),
    };
    s.push("blob_type", type_field);
    let blob_len = s.push("blob_len", ScalarField::computed(Width::U16));
    let blob_data = s.push("blob_data", data.map_or_else(VariableBlob::new, VariableBlob::from_bytes));
    s.bind(blob_len, move |sc| to_u32(sc.size(blob_data)?));
    s.bind(blob_data, move |sc| sc.value(blob_len));
    s
}

structure_wrapper!(
    /// Length-prefixed typed payload (MS-RDPELE 2.2.2.3)
    LicenseBinaryBlob,
    LICENSE_BINARY_BLOB,
    license_binary_blob(BlobType::Any, None)
);

impl LicenseBinaryBlob {
    /// Blob with an explicit type; `BlobType::Any` writes a zero type
    pub fn new(blob_type: BlobType, data: impl Into<Bytes>) -> Self {
        Self(license_binary_blob(blob_type, Some(data.into())))
    }

    /// Decode a blob whose type must equal `blob_type`
    pub fn decode_expecting(stream: &mut ByteStream, blob_type: BlobType) -> PduResult<Self> {
        let mut structure = license_binary_blob(blob_type, None);
        structure.decode(stream)?;
        Ok(Self(structure))
    }

    pub fn blob_type(&self) -> PduResult<Option<BlobType>> {
        let raw = self.0.value("blob_type")?;
        Ok(u16::try_from(raw).ok().and_then(BlobType::from_u16))
    }

    pub fn blob_len(&self) -> PduResult<u32> {
        Ok(self.0.value("blob_len")?)
    }

    pub fn data(&self) -> PduResult<&Bytes> {
        Ok(self.0.bytes("blob_data")?)
    }
}

fn licensing_error_message(code: u32, transition: u32, info: Option<Structure>) -> Structure {
    let mut s = Structure::new(LICENSING_ERROR_MESSAGE).with_tag(MessageType::ErrorAlert as u32);
    s.push("error_code", ScalarField::literal(Width::U32, code));
    s.push("state_transition", ScalarField::literal(Width::U32, transition));
    s.push(
        "error_info",
        info.unwrap_or_else(|| license_binary_blob(BlobType::Any, None)),
    );
    s
}

structure_wrapper!(
    /// Licensing error message (MS-RDPELE 2.2.1.12.1.3)
    LicensingErrorMessage,
    LICENSING_ERROR_MESSAGE,
    licensing_error_message(0, 0, None)
);

impl LicensingErrorMessage {
    /// Error message whose `error_info` blob carries `info` with type `Any`
    pub fn new(code: ErrorCode, transition: StateTransition, info: impl Into<Bytes>) -> Self {
        let blob = license_binary_blob(BlobType::Any, Some(info.into()));
        Self(licensing_error_message(code as u32, transition as u32, Some(blob)))
    }

    pub fn with_blob(code: ErrorCode, transition: StateTransition, info: LicenseBinaryBlob) -> Self {
        Self(licensing_error_message(
            code as u32,
            transition as u32,
            Some(info.into_structure()),
        ))
    }

    pub fn error_code(&self) -> PduResult<Option<ErrorCode>> {
        Ok(ErrorCode::from_u32(self.error_code_raw()?))
    }

    pub fn error_code_raw(&self) -> PduResult<u32> {
        Ok(self.0.value("error_code")?)
    }

    pub fn state_transition(&self) -> PduResult<Option<StateTransition>> {
        Ok(StateTransition::from_u32(self.state_transition_raw()?))
    }

    pub fn state_transition_raw(&self) -> PduResult<u32> {
        Ok(self.0.value("state_transition")?)
    }

    pub fn error_info(&self) -> PduResult<LicenseBinaryBlob> {
        LicenseBinaryBlob::from_structure(self.0.child("error_info")?.clone())
    }
}

fn license_registry(discriminant: u32) -> Option<Structure> {
    let message_type = u8::try_from(discriminant).ok().and_then(MessageType::from_u8)?;
    match message_type {
        MessageType::ErrorAlert => Some(licensing_error_message(0, 0, None)),
        MessageType::LicenseRequest
        | MessageType::PlatformChallenge
        | MessageType::NewLicense
        | MessageType::UpgradeLicense
        | MessageType::LicenseInfo
        | MessageType::NewLicenseRequest
        | MessageType::PlatformChallengeResponse => None,
    }
}

fn license_packet(message: Option<Structure>) -> Structure {
    let mut s = Structure::new(LICENSE_PACKET);
    let msg_type = s.push("msg_type", ScalarField::computed(Width::U8));
    s.push(
        "flags",
        ScalarField::literal(Width::U8, preamble::PREAMBLE_VERSION_3_0 as u32),
    );
    let msg_size = s.push("msg_size", ScalarField::computed(Width::U16));
    let selector = match message {
        Some(message) => VariantSelector::resolved(license_registry, message),
        None => VariantSelector::new(license_registry),
    };
    let body = s.push("licensing_message", selector);

    s.bind(msg_type, move |sc| sc.tag(body));
    s.bind(msg_size, move |sc| to_u32(sc.total_size()?));
    s.bind(body, move |sc| sc.value(msg_type));
    s
}

/// Message carried by a [`LicensePacket`]
#[derive(Debug, Clone)]
pub enum LicensingMessage {
    ErrorAlert(LicensingErrorMessage),
}

impl LicensingMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            LicensingMessage::ErrorAlert(_) => MessageType::ErrorAlert,
        }
    }

    fn into_structure(self) -> Structure {
        match self {
            LicensingMessage::ErrorAlert(message) => message.into_structure(),
        }
    }
}

structure_wrapper!(
    /// License packet envelope with its preamble (MS-RDPELE 2.2.2)
    LicensePacket,
    LICENSE_PACKET,
    license_packet(None)
);

impl LicensePacket {
    pub fn new(message: LicensingMessage) -> Self {
        Self(license_packet(Some(message.into_structure())))
    }

    pub fn msg_type(&self) -> PduResult<u8> {
        let raw = self.0.value("msg_type")?;
        Ok(raw as u8)
    }

    pub fn message_type(&self) -> PduResult<MessageType> {
        let raw = self.msg_type()?;
        MessageType::from_u8(raw).ok_or(PduError::UnhandledMessageType(raw))
    }

    pub fn flags(&self) -> PduResult<u8> {
        Ok(self.0.value("flags")? as u8)
    }

    /// Set the preamble flags, e.g. `PREAMBLE_VERSION_3_0 | EXTENDED_ERROR_MSG_SUPPORTED`
    pub fn set_flags(&mut self, flags: u8) -> PduResult<()> {
        Ok(self.0.set_value("flags", flags as u32)?)
    }

    pub fn msg_size(&self) -> PduResult<u32> {
        Ok(self.0.value("msg_size")?)
    }

    pub fn message(&self) -> PduResult<LicensingMessage> {
        let body = self.0.child("licensing_message")?.clone();
        match self.message_type()? {
            MessageType::ErrorAlert => Ok(LicensingMessage::ErrorAlert(
                LicensingErrorMessage::from_structure(body)?,
            )),
            other => Err(PduError::UnhandledMessageType(other as u8)),
        }
    }
}
