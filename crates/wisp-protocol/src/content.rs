/// Content envelope: the encoded protocol payload of a message.
///
/// Serialized as MessagePack. Exactly one payload kind is populated, which
/// `ContentPayload` enforces by being an enum. Expiration fields and the
/// pro proof ride alongside the payload.
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

// ── Content ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Network timestamp the sender signs over. Required to encode.
    pub sig_timestamp: Option<u64>,
    pub payload: ContentPayload,
    pub expiration_type: Option<ExpirationType>,
    /// Seconds. Written whenever `expiration_type` is.
    pub expiration_timer: Option<u32>,
    pub pro_message: Option<ProMessage>,
}

impl Content {
    /// Content with a signing timestamp and no expiration or pro proof.
    pub fn new(sig_timestamp: u64, payload: ContentPayload) -> Self {
        Self {
            sig_timestamp: Some(sig_timestamp),
            payload,
            expiration_type: None,
            expiration_timer: None,
            pro_message: None,
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec(self).map_err(Into::into)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        rmp_serde::from_slice(data).map_err(Into::into)
    }

    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }

    pub fn has_expiration(&self) -> bool {
        self.expiration_type.is_some() || self.expiration_timer.is_some()
    }

    pub fn data_message(&self) -> Option<&DataMessage> {
        match &self.payload {
            ContentPayload::Data(m) => Some(m),
            _ => None,
        }
    }

    pub fn typing_message(&self) -> Option<&TypingMessage> {
        match &self.payload {
            ContentPayload::Typing(m) => Some(m),
            _ => None,
        }
    }

    pub fn receipt_message(&self) -> Option<&ReceiptMessage> {
        match &self.payload {
            ContentPayload::Receipt(m) => Some(m),
            _ => None,
        }
    }

    pub fn unsend_request(&self) -> Option<&UnsendRequest> {
        match &self.payload {
            ContentPayload::Unsend(m) => Some(m),
            _ => None,
        }
    }

    pub fn call_message(&self) -> Option<&CallMessage> {
        match &self.payload {
            ContentPayload::Call(m) => Some(m),
            _ => None,
        }
    }

    pub fn data_extraction_notification(&self) -> Option<&DataExtractionNotification> {
        match &self.payload {
            ContentPayload::DataExtraction(m) => Some(m),
            _ => None,
        }
    }

    pub fn message_request_response(&self) -> Option<&MessageRequestResponse> {
        match &self.payload {
            ContentPayload::MessageRequestResponse(m) => Some(m),
            _ => None,
        }
    }

    /// The group update carried inside the data message, if any.
    pub fn group_update_message(&self) -> Option<&GroupUpdateMessage> {
        self.data_message()
            .and_then(|d| d.group_update_message.as_ref())
    }
}

/// The one populated payload of a `Content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentPayload {
    Data(DataMessage),
    Typing(TypingMessage),
    Receipt(ReceiptMessage),
    Unsend(UnsendRequest),
    Call(CallMessage),
    DataExtraction(DataExtractionNotification),
    MessageRequestResponse(MessageRequestResponse),
}

impl ContentPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            ContentPayload::Data(d) if d.group_update_message.is_some() => "group_update",
            ContentPayload::Data(_) => "data",
            ContentPayload::Typing(_) => "typing",
            ContentPayload::Receipt(_) => "receipt",
            ContentPayload::Unsend(_) => "unsend",
            ContentPayload::Call(_) => "call",
            ContentPayload::DataExtraction(_) => "data_extraction",
            ContentPayload::MessageRequestResponse(_) => "message_request_response",
        }
    }
}

/// Wire values for the disappearing-message mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpirationType {
    Unknown = 0,
    DeleteAfterRead = 1,
    DeleteAfterSend = 2,
}

// ── Control payloads ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypingAction {
    Started = 0,
    Stopped = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingMessage {
    pub timestamp: u64,
    pub action: TypingAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    Delivery = 0,
    Read = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptMessage {
    pub receipt_type: ReceiptType,
    /// Timestamps of the referenced messages, in the order given.
    pub timestamps: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsendRequest {
    /// Timestamp of the message to delete.
    pub timestamp: u64,
    /// Author of the message to delete.
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    PreOffer,
    Offer,
    Answer,
    ProvisionalAnswer,
    IceCandidates,
    EndCall,
}

impl CallType {
    /// Signaling types that legitimately carry no SDP.
    pub fn allows_empty_sdps(self) -> bool {
        matches!(self, CallType::PreOffer | CallType::EndCall)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMessage {
    pub call_type: CallType,
    pub sdps: Vec<String>,
    pub sdp_m_line_indexes: Vec<u32>,
    pub sdp_mids: Vec<String>,
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataExtractionType {
    Screenshot,
    MediaSaved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataExtractionNotification {
    pub extraction_type: DataExtractionType,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequestResponse {
    pub is_approved: bool,
    pub profile: Option<LokiProfile>,
    pub profile_key: Option<Vec<u8>>,
}

// ── Data message ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMessage {
    pub body: Option<String>,
    pub attachments: Vec<AttachmentPointer>,
    pub quote: Option<Quote>,
    pub reaction: Option<Reaction>,
    pub preview: Vec<Preview>,
    pub profile: Option<LokiProfile>,
    pub profile_key: Option<Vec<u8>>,
    pub open_group_invitation: Option<OpenGroupInvitation>,
    pub group_update_message: Option<GroupUpdateMessage>,
    /// Recipient of the original message when this is a sync copy.
    pub sync_target: Option<String>,
}

/// Sender profile embedded in data messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LokiProfile {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
    pub last_profile_update_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Timestamp of the quoted message.
    pub id: u64,
    pub author: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionAction {
    React = 0,
    Remove = 1,
}

/// Emoji reaction to an earlier message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Timestamp of the message reacted to.
    pub id: u64,
    /// Author of the message reacted to.
    pub author: String,
    pub emoji: String,
    pub action: ReactionAction,
}

/// Link preview shown under a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub url: String,
    pub title: Option<String>,
    pub image: Option<AttachmentPointer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPointer {
    pub url: String,
    pub content_type: Option<String>,
    pub key: Option<Vec<u8>>,
    pub size: Option<u32>,
    pub digest: Option<Vec<u8>>,
    pub file_name: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGroupInvitation {
    pub url: String,
    pub name: String,
}

// ── Group updates ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupUpdateMessage {
    Invite(GroupUpdateInvite),
    Promote(GroupUpdatePromote),
    MemberLeft,
    MemberLeftNotification,
    InviteResponse(GroupUpdateInviteResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdateInvite {
    pub group_session_id: String,
    pub name: String,
    pub member_auth_data: Vec<u8>,
    pub admin_signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdatePromote {
    pub group_identity_seed: Vec<u8>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdateInviteResponse {
    pub is_approved: bool,
}

// ── Pro proof ────────────────────────────────────────────────────────────

/// Feature bitset plus the signed proof that the sender may use them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProMessage {
    pub features: u64,
    pub proof: ProProof,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProProof {
    pub version: u32,
    pub gen_index_hash: Vec<u8>,
    pub rotating_public_key: Vec<u8>,
    pub expire_at_ms: u64,
    pub sig: Vec<u8>,
}
