//! Codec error types

use thiserror::Error;

/// Errors raised while sizing, encoding or decoding a structure
#[derive(Debug, Error)]
pub enum CodecError {
    /// Stream exhausted before a field's bytes were available
    #[error("stream underrun: needed {needed} bytes, have {have}")]
    Underrun { needed: usize, have: usize },

    /// Constant field read a value other than the expected one
    #[error("{structure}.{field}: expected constant 0x{expected:x}, found 0x{found:x}")]
    Format {
        structure: &'static str,
        field: &'static str,
        expected: u32,
        found: u32,
    },

    /// Discriminant not present in a variant's closed registry
    #[error("{structure}.{field}: unsupported variant discriminant 0x{discriminant:x}")]
    UnsupportedVariant {
        structure: &'static str,
        field: &'static str,
        discriminant: u32,
    },

    /// Value does not fit the scalar's wire width
    #[error("value {value} does not fit in a {width}-byte field")]
    ValueOutOfRange { value: u64, width: usize },

    /// Length expression produced an impossible length
    #[error("invalid length for {field}: {reason}")]
    InvalidLength { field: &'static str, reason: String },

    /// Field has no value, expression or resolved variant yet
    #[error("field {0} is not resolved")]
    Unresolved(&'static str),

    /// Variant was resolved a second time
    #[error("variant {0} is already resolved")]
    AlreadyResolved(&'static str),

    /// No field with that name or handle
    #[error("no field named {0}")]
    UnknownField(String),

    /// Field exists but has a different kind than requested
    #[error("field {field} is not a {expected}")]
    WrongFieldKind {
        field: &'static str,
        expected: &'static str,
    },

    /// Expression read the field it is being evaluated for, directly or
    /// through a cycle of siblings that are all still unset
    #[error("field {0} depends on its own value")]
    SelfReference(&'static str),
}

/// Broad classification of a [`CodecError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wire content violates a constant
    Format,
    /// Discriminant selects no known shape
    UnsupportedVariant,
    /// Input truncated or misframed
    Underrun,
    /// Structure misused by the caller or malformed length arithmetic
    Usage,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Format { .. } => ErrorKind::Format,
            CodecError::UnsupportedVariant { .. } => ErrorKind::UnsupportedVariant,
            CodecError::Underrun { .. } => ErrorKind::Underrun,
            _ => ErrorKind::Usage,
        }
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Convert a byte count to a 32-bit field value
pub fn to_u32(value: usize) -> CodecResult<u32> {
    u32::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
        value: value as u64,
        width: 4,
    })
}

/// Subtract a fixed amount from a length value, failing instead of wrapping
pub fn checked_len(field: &'static str, value: u32, minus: u32) -> CodecResult<u32> {
    value.checked_sub(minus).ok_or_else(|| CodecError::InvalidLength {
        field,
        reason: format!("{} is smaller than {}", value, minus),
    })
}
