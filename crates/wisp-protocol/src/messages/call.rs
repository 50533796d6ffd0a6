use crate::content::{self, Content, ContentPayload};
use crate::error::{expect_non_empty, ProtocolError};
use crate::messages::{disappearing_content, ContentMessage, Expirable, Message};
use crate::types::{ExpirationPolicy, MessageIdentity, TTL_CALL_MESSAGE_MS};

/// WebRTC call signaling.
///
/// Every type except pre-offer and end-call must carry at least one SDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMessage {
    identity: MessageIdentity,
    expiration: ExpirationPolicy,
    signal: content::CallMessage,
}

impl CallMessage {
    pub fn new(
        identity: MessageIdentity,
        expiration: ExpirationPolicy,
        signal: content::CallMessage,
    ) -> Result<Self, ProtocolError> {
        expect_non_empty("call uuid", &signal.uuid)?;
        if signal.sdps.is_empty() && !signal.call_type.allows_empty_sdps() {
            return Err(ProtocolError::validation(
                "call sdps",
                format!("{:?} requires at least one sdp", signal.call_type),
            ));
        }
        Ok(Self {
            identity,
            expiration,
            signal,
        })
    }

    pub fn signal(&self) -> &content::CallMessage {
        &self.signal
    }
}

impl Message for CallMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for CallMessage {
    fn time_to_live(&self) -> u64 {
        TTL_CALL_MESSAGE_MS
    }

    fn build_content(&self) -> Content {
        disappearing_content(
            &self.identity,
            self.expiration,
            ContentPayload::Call(self.signal.clone()),
        )
    }
}

impl Expirable for CallMessage {
    fn expiration(&self) -> ExpirationPolicy {
        self.expiration
    }
}
