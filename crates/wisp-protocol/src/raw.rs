/// Conversion of a built message into the record handed to the transport.
use bytes::Bytes;

use crate::error::ProtocolError;
use crate::messages::ContentMessage;
use crate::types::Namespace;

/// Network-ready message: opaque payload plus routing metadata.
///
/// Produced once per send attempt and owned by the caller afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutgoingMessage {
    pub identifier: String,
    pub encoded: Bytes,
    pub destination: String,
    pub ttl_ms: u64,
    pub network_timestamp_created: u64,
    pub namespace: Namespace,
}

impl RawOutgoingMessage {
    /// Size of the encoded payload in bytes.
    pub fn size(&self) -> usize {
        self.encoded.len()
    }
}

/// Encode `message` and attach routing metadata.
///
/// Pure: fails only when `encode()` fails.
pub fn to_raw_message<M>(
    destination: impl Into<String>,
    message: &M,
    namespace: Namespace,
) -> Result<RawOutgoingMessage, ProtocolError>
where
    M: ContentMessage + ?Sized,
{
    let encoded = message.encode()?;
    Ok(RawOutgoingMessage {
        identifier: message.identifier().to_owned(),
        encoded: Bytes::from(encoded),
        destination: destination.into(),
        ttl_ms: message.time_to_live(),
        network_timestamp_created: message.created_at_network_timestamp(),
        namespace,
    })
}
