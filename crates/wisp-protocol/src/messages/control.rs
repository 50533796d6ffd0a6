use crate::content::{
    self, Content, ContentPayload, DataExtractionNotification, DataExtractionType,
    ReceiptMessage, ReceiptType, TypingAction, UnsendRequest,
};
use crate::error::{expect_non_empty, ProtocolError};
use crate::messages::{
    disappearing_content, plain_content, CarriesProfile, ContentMessage, Expirable, Message,
    ProfileAttachment,
};
use crate::profile::OutgoingUserProfile;
use crate::types::{ExpirationPolicy, MessageIdentity, TTL_TYPING_MESSAGE_MS};

// ── Typing ───────────────────────────────────────────────────────────────

/// Typing indicator. Short-lived and never disappearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingMessage {
    identity: MessageIdentity,
    is_typing: bool,
}

impl TypingMessage {
    pub fn new(identity: MessageIdentity, is_typing: bool) -> Self {
        Self {
            identity,
            is_typing,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }
}

impl Message for TypingMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for TypingMessage {
    fn time_to_live(&self) -> u64 {
        TTL_TYPING_MESSAGE_MS
    }

    fn build_content(&self) -> Content {
        let action = if self.is_typing {
            TypingAction::Started
        } else {
            TypingAction::Stopped
        };
        plain_content(
            &self.identity,
            ContentPayload::Typing(content::TypingMessage {
                timestamp: self.identity.created_at_network_timestamp(),
                action,
            }),
        )
    }
}

// ── Read receipt ─────────────────────────────────────────────────────────

/// Tells the sender which of its messages were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceiptMessage {
    identity: MessageIdentity,
    timestamps: Vec<u64>,
}

impl ReadReceiptMessage {
    /// `timestamps` are sent in the order given.
    pub fn new(identity: MessageIdentity, timestamps: Vec<u64>) -> Self {
        Self {
            identity,
            timestamps,
        }
    }

    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }
}

impl Message for ReadReceiptMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for ReadReceiptMessage {
    fn build_content(&self) -> Content {
        plain_content(
            &self.identity,
            ContentPayload::Receipt(ReceiptMessage {
                receipt_type: ReceiptType::Read,
                timestamps: self.timestamps.clone(),
            }),
        )
    }
}

// ── Unsend ───────────────────────────────────────────────────────────────

/// Request to delete a previously sent message everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsendMessage {
    identity: MessageIdentity,
    referenced_timestamp: u64,
    author: String,
}

impl UnsendMessage {
    /// `referenced_timestamp` comes from stored message rows, which use a
    /// signed column; negative values are rejected.
    pub fn new(
        identity: MessageIdentity,
        referenced_timestamp: i64,
        author: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let referenced_timestamp = u64::try_from(referenced_timestamp)
            .map_err(|_| ProtocolError::validation("unsend timestamp", "must not be negative"))?;
        let author = author.into();
        expect_non_empty("unsend author", &author)?;
        Ok(Self {
            identity,
            referenced_timestamp,
            author,
        })
    }

    pub fn referenced_timestamp(&self) -> u64 {
        self.referenced_timestamp
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

impl Message for UnsendMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for UnsendMessage {
    fn build_content(&self) -> Content {
        plain_content(
            &self.identity,
            ContentPayload::Unsend(UnsendRequest {
                timestamp: self.referenced_timestamp,
                author: self.author.clone(),
            }),
        )
    }
}

// ── Data extraction notification ─────────────────────────────────────────

/// Tells the other side that a screenshot was taken or media was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataExtractionNotificationMessage {
    identity: MessageIdentity,
    expiration: ExpirationPolicy,
    extraction_type: DataExtractionType,
    referenced_timestamp: u64,
}

impl DataExtractionNotificationMessage {
    pub fn new(
        identity: MessageIdentity,
        expiration: ExpirationPolicy,
        extraction_type: DataExtractionType,
        referenced_timestamp: u64,
    ) -> Result<Self, ProtocolError> {
        if referenced_timestamp == 0 {
            return Err(ProtocolError::validation(
                "data extraction timestamp",
                "must be greater than 0",
            ));
        }
        Ok(Self {
            identity,
            expiration,
            extraction_type,
            referenced_timestamp,
        })
    }

    pub fn extraction_type(&self) -> DataExtractionType {
        self.extraction_type
    }
}

impl Message for DataExtractionNotificationMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for DataExtractionNotificationMessage {
    fn time_to_live(&self) -> u64 {
        self.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        disappearing_content(
            &self.identity,
            self.expiration,
            ContentPayload::DataExtraction(DataExtractionNotification {
                extraction_type: self.extraction_type,
                timestamp: self.referenced_timestamp,
            }),
        )
    }
}

impl Expirable for DataExtractionNotificationMessage {
    fn expiration(&self) -> ExpirationPolicy {
        self.expiration
    }
}

// ── Message request response ─────────────────────────────────────────────

/// Accepts a message request. Declining is silent, so this is always an
/// approval. Carries the accepting user's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequestResponseMessage {
    identity: MessageIdentity,
    sender: ProfileAttachment,
}

impl MessageRequestResponseMessage {
    pub fn new(identity: MessageIdentity, sender: ProfileAttachment) -> Self {
        Self { identity, sender }
    }
}

impl Message for MessageRequestResponseMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for MessageRequestResponseMessage {
    fn build_content(&self) -> Content {
        let details = self.sender.profile_details();
        let mut content = plain_content(
            &self.identity,
            ContentPayload::MessageRequestResponse(content::MessageRequestResponse {
                is_approved: true,
                profile: details.profile,
                profile_key: details.profile_key,
            }),
        );
        self.sender.attach_pro(&mut content);
        content
    }
}

impl CarriesProfile for MessageRequestResponseMessage {
    fn user_profile(&self) -> Option<&OutgoingUserProfile> {
        self.sender.user_profile()
    }

    fn pro_message(&self) -> Option<&content::ProMessage> {
        self.sender.pro_message()
    }
}
