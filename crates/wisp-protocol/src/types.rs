use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{Content, ExpirationType};
use crate::error::{expect_non_empty, ProtocolError};

// ── Time-to-live defaults ────────────────────────────────────────────────

const SECOND_MS: u64 = 1_000;
const DAY_MS: u64 = 24 * 60 * 60 * SECOND_MS;

/// Default TTL for content messages (14 days).
pub const TTL_CONTENT_MESSAGE_MS: u64 = 14 * DAY_MS;

/// TTL for typing notifications (20 seconds).
pub const TTL_TYPING_MESSAGE_MS: u64 = 20 * SECOND_MS;

/// TTL for call signaling (5 minutes).
pub const TTL_CALL_MESSAGE_MS: u64 = 5 * 60 * SECOND_MS;

// ── MessageIdentity ──────────────────────────────────────────────────────

/// Identity carried by every outgoing message.
///
/// `created_at_network_timestamp` is part of the signed content and must
/// match what recipients verify against. `identifier` ties the in-memory
/// message to its persisted record for retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageIdentity {
    created_at_network_timestamp: u64,
    identifier: String,
}

impl MessageIdentity {
    pub fn new(
        created_at_network_timestamp: u64,
        identifier: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        if created_at_network_timestamp == 0 {
            return Err(ProtocolError::validation(
                "network timestamp",
                "must be greater than 0",
            ));
        }
        let identifier = identifier.into();
        expect_non_empty("message identifier", &identifier)?;
        Ok(Self {
            created_at_network_timestamp,
            identifier,
        })
    }

    /// Identity with a fresh UUID v4 identifier.
    pub fn generate(created_at_network_timestamp: u64) -> Result<Self, ProtocolError> {
        Self::new(
            created_at_network_timestamp,
            uuid::Uuid::new_v4().to_string(),
        )
    }

    pub fn created_at_network_timestamp(&self) -> u64 {
        self.created_at_network_timestamp
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

// ── ExpirationPolicy ─────────────────────────────────────────────────────

/// Disappearing-message mode of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisappearingMode {
    #[default]
    None,
    DeleteAfterSend,
    DeleteAfterRead,
}

/// Expiration mode plus timer (seconds) applied to an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExpirationPolicy {
    pub mode: DisappearingMode,
    pub timer_seconds: u32,
}

impl ExpirationPolicy {
    /// No disappearing behaviour.
    pub const NONE: ExpirationPolicy = ExpirationPolicy {
        mode: DisappearingMode::None,
        timer_seconds: 0,
    };

    pub fn delete_after_send(timer_seconds: u32) -> Self {
        Self {
            mode: DisappearingMode::DeleteAfterSend,
            timer_seconds,
        }
    }

    pub fn delete_after_read(timer_seconds: u32) -> Self {
        Self {
            mode: DisappearingMode::DeleteAfterRead,
            timer_seconds,
        }
    }

    pub fn is_none(&self) -> bool {
        self.mode == DisappearingMode::None
    }

    /// Network TTL for a message sent under this policy.
    ///
    /// Only delete-after-send shortens the TTL. A delete-after-read
    /// countdown starts when the message is read, so at send time it keeps
    /// the content default.
    pub fn time_to_live(&self) -> u64 {
        match self.mode {
            DisappearingMode::DeleteAfterSend if self.timer_seconds > 0 => {
                u64::from(self.timer_seconds) * SECOND_MS
            }
            _ => TTL_CONTENT_MESSAGE_MS,
        }
    }

    /// Write expiration type and timer into `content`. No-op for `None`.
    pub fn apply_to(&self, content: &mut Content) {
        let expiration_type = match self.mode {
            DisappearingMode::None => return,
            DisappearingMode::DeleteAfterSend => ExpirationType::DeleteAfterSend,
            DisappearingMode::DeleteAfterRead => ExpirationType::DeleteAfterRead,
        };
        content.expiration_type = Some(expiration_type);
        content.expiration_timer = Some(self.timer_seconds);
    }
}

// ── Namespace ────────────────────────────────────────────────────────────

/// Storage-network mailbox a message is stored under.
///
/// Opaque to this layer: the caller picks it and it is carried as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace(pub i16);

impl Namespace {
    pub const DEFAULT: Namespace = Namespace(0);
    pub const USER_PROFILE: Namespace = Namespace(2);
    pub const USER_CONTACTS: Namespace = Namespace(3);
    pub const CONVO_INFO_VOLATILE: Namespace = Namespace(4);
    pub const USER_GROUPS: Namespace = Namespace(5);
    pub const CLOSED_GROUP_MESSAGES: Namespace = Namespace(11);
    pub const CLOSED_GROUP_KEYS: Namespace = Namespace(12);
    pub const CLOSED_GROUP_INFO: Namespace = Namespace(13);
    pub const CLOSED_GROUP_MEMBERS: Namespace = Namespace(14);
    pub const CLOSED_GROUP_REVOKED_RETRIEVABLE_MESSAGES: Namespace = Namespace(-11);
    pub const LEGACY_CLOSED_GROUP: Namespace = Namespace(-10);

    pub fn value(self) -> i16 {
        self.0
    }
}

impl From<i16> for Namespace {
    fn from(v: i16) -> Self {
        Self(v)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── SwarmTarget ──────────────────────────────────────────────────────────

/// Where a group-control message is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwarmTarget {
    /// The group's shared mailbox.
    Group,
    /// A single recipient's own mailbox.
    OneToOne,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rejects_zero_timestamp() {
        let err = MessageIdentity::new(0, "id").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn identity_rejects_empty_identifier() {
        let err = MessageIdentity::new(1, "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid message identifier: must not be empty"
        );
    }

    #[test]
    fn generate_draws_unique_identifiers() {
        let a = MessageIdentity::generate(1).expect("valid");
        let b = MessageIdentity::generate(1).expect("valid");
        assert_ne!(a.identifier(), b.identifier());
        assert_eq!(a.created_at_network_timestamp(), 1);
    }

    #[test]
    fn ttl_delete_after_send_uses_timer() {
        let policy = ExpirationPolicy::delete_after_send(60);
        assert_eq!(policy.time_to_live(), 60_000);
    }

    #[test]
    fn ttl_delete_after_send_zero_timer_falls_back() {
        let policy = ExpirationPolicy::delete_after_send(0);
        assert_eq!(policy.time_to_live(), TTL_CONTENT_MESSAGE_MS);
    }

    #[test]
    fn ttl_delete_after_read_keeps_default() {
        let policy = ExpirationPolicy::delete_after_read(60);
        assert_eq!(policy.time_to_live(), TTL_CONTENT_MESSAGE_MS);
    }

    #[test]
    fn ttl_none_keeps_default() {
        assert_eq!(ExpirationPolicy::NONE.time_to_live(), TTL_CONTENT_MESSAGE_MS);
        assert!(ExpirationPolicy::default().is_none());
    }

    #[test]
    fn namespace_roundtrip_msgpack() {
        for ns in [
            Namespace::DEFAULT,
            Namespace::USER_CONTACTS,
            Namespace::CLOSED_GROUP_MESSAGES,
            Namespace::CLOSED_GROUP_REVOKED_RETRIEVABLE_MESSAGES,
        ] {
            let bytes = rmp_serde::to_vec(&ns).expect("serialize");
            let decoded: Namespace = rmp_serde::from_slice(&bytes).expect("deserialize");
            assert_eq!(ns, decoded);
        }
    }

    #[test]
    fn namespace_display() {
        assert_eq!(Namespace::LEGACY_CLOSED_GROUP.to_string(), "-10");
        assert_eq!(Namespace::from(3), Namespace::USER_CONTACTS);
    }
}
