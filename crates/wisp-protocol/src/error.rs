/// Protocol-level errors for Wisp outgoing messages.
///
/// `Validation` is raised at construction time and always points at a
/// caller bug. `Encoding` means a built message cannot be put on the wire.
/// Neither is ever retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl ProtocolError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether this error was raised while constructing a message.
    pub fn is_validation(&self) -> bool {
        matches!(self, ProtocolError::Validation { .. })
    }
}

impl From<rmp_serde::encode::Error> for ProtocolError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        ProtocolError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for ProtocolError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        ProtocolError::Deserialization(e.to_string())
    }
}

/// Check a fixed-size binary field.
pub(crate) fn expect_len(
    field: &'static str,
    bytes: &[u8],
    expected: usize,
) -> Result<(), ProtocolError> {
    if bytes.len() != expected {
        return Err(ProtocolError::validation(
            field,
            format!("expected {expected} bytes, got {}", bytes.len()),
        ));
    }
    Ok(())
}

/// Check a required string field.
pub(crate) fn expect_non_empty(field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::validation(field, "must not be empty"));
    }
    Ok(())
}
