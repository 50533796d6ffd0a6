/// Outgoing message types.
///
/// Each concrete message is a plain struct implementing the capability
/// traits it needs:
///
/// - [`Message`]: identity (network timestamp + durable identifier).
/// - [`ContentMessage`]: TTL, content building, encoding.
/// - [`Expirable`]: disappearing-message policy.
/// - [`CarriesProfile`]: sender profile and pro proof.
/// - [`GroupUpdate`]: group public key and swarm routing.
///
/// Messages are immutable once built. Validation happens in constructors,
/// so a message that exists is a message that can be encoded.
mod call;
mod control;
mod group;
mod visible;

pub use call::CallMessage;
pub use control::{
    DataExtractionNotificationMessage, MessageRequestResponseMessage, ReadReceiptMessage,
    TypingMessage, UnsendMessage,
};
pub use group::{
    GroupUpdateBase, GroupUpdateInviteMessage, GroupUpdateInviteResponseMessage,
    GroupUpdateMemberLeftMessage, GroupUpdateMemberLeftNotificationMessage,
    GroupUpdatePromoteMessage, ADMIN_SIGNATURE_LEN, GROUP_IDENTITY_SEED_LEN, MEMBER_AUTH_DATA_LEN,
};
pub use visible::{CommunityInvitationMessage, VisibleMessage, VisibleMessageBuilder};

use crate::content::{Content, ContentPayload, DataMessage, ProMessage};
use crate::error::ProtocolError;
use crate::profile::{resolve_pro, OutgoingUserProfile, ProMessageSource, ProfileDetails};
use crate::types::{ExpirationPolicy, MessageIdentity, SwarmTarget, TTL_CONTENT_MESSAGE_MS};

// ── Capability traits ────────────────────────────────────────────────────

pub trait Message {
    fn identity(&self) -> &MessageIdentity;

    fn created_at_network_timestamp(&self) -> u64 {
        self.identity().created_at_network_timestamp()
    }

    fn identifier(&self) -> &str {
        self.identity().identifier()
    }
}

/// A message that produces a content envelope.
pub trait ContentMessage: Message {
    /// Network TTL in milliseconds.
    fn time_to_live(&self) -> u64 {
        TTL_CONTENT_MESSAGE_MS
    }

    /// Build the content envelope for this message.
    fn build_content(&self) -> Content;

    /// Canonical serialized content.
    ///
    /// Fails with `Encoding` if the built content has no signing timestamp.
    fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        encode_content(&self.build_content())
    }
}

/// A message that honours the conversation's disappearing-message policy.
pub trait Expirable: ContentMessage {
    fn expiration(&self) -> ExpirationPolicy;
}

/// A message that embeds the sender profile and pro proof.
pub trait CarriesProfile {
    fn user_profile(&self) -> Option<&OutgoingUserProfile>;

    fn pro_message(&self) -> Option<&ProMessage>;

    fn profile_details(&self) -> ProfileDetails {
        self.user_profile()
            .map(OutgoingUserProfile::to_details)
            .unwrap_or_default()
    }
}

/// A group-control message.
pub trait GroupUpdate: ContentMessage {
    /// Mailbox this kind of message is delivered to.
    const SWARM: SwarmTarget;

    fn group_public_key(&self) -> &str;

    fn is_for_group_swarm(&self) -> bool {
        Self::SWARM == SwarmTarget::Group
    }

    fn is_for_one_to_one_swarm(&self) -> bool {
        Self::SWARM == SwarmTarget::OneToOne
    }
}

// ── Shared building blocks ───────────────────────────────────────────────

pub(crate) fn encode_content(content: &Content) -> Result<Vec<u8>, ProtocolError> {
    if content.sig_timestamp.is_none() {
        return Err(ProtocolError::Encoding(format!(
            "{} content is missing its signing timestamp",
            content.kind()
        )));
    }
    let bytes = content.to_bytes()?;
    tracing::trace!(kind = content.kind(), size = bytes.len(), "content encoded");
    Ok(bytes)
}

/// Content that never disappears.
pub(crate) fn plain_content(identity: &MessageIdentity, payload: ContentPayload) -> Content {
    Content::new(identity.created_at_network_timestamp(), payload)
}

/// Content carrying the expiration fields of `policy` (none for `None`).
pub(crate) fn disappearing_content(
    identity: &MessageIdentity,
    policy: ExpirationPolicy,
    payload: ContentPayload,
) -> Content {
    let mut content = plain_content(identity, payload);
    policy.apply_to(&mut content);
    content
}

/// Sender profile plus resolved pro proof, shared by the "with profile"
/// message kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileAttachment {
    user_profile: Option<OutgoingUserProfile>,
    pro_message: Option<ProMessage>,
}

impl ProfileAttachment {
    /// Resolve the pro source once; malformed proofs fail here.
    pub fn new(
        user_profile: Option<OutgoingUserProfile>,
        pro: Option<ProMessageSource>,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            user_profile,
            pro_message: resolve_pro(pro)?,
        })
    }

    /// No profile, no pro proof.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_profile(user_profile: OutgoingUserProfile) -> Self {
        Self {
            user_profile: Some(user_profile),
            pro_message: None,
        }
    }

    /// Write profile fields into a data message.
    pub(crate) fn fill_data(&self, data: &mut DataMessage) {
        let details = self.profile_details();
        data.profile = details.profile;
        data.profile_key = details.profile_key;
    }

    pub(crate) fn attach_pro(&self, content: &mut Content) {
        content.pro_message = self.pro_message.clone();
    }
}

impl CarriesProfile for ProfileAttachment {
    fn user_profile(&self) -> Option<&OutgoingUserProfile> {
        self.user_profile.as_ref()
    }

    fn pro_message(&self) -> Option<&ProMessage> {
        self.pro_message.as_ref()
    }
}

// ── OutgoingMessage ──────────────────────────────────────────────────────

/// Any concrete outgoing message, for code that handles them uniformly.
#[derive(Debug, Clone)]
pub enum OutgoingMessage {
    Visible(VisibleMessage),
    CommunityInvitation(CommunityInvitationMessage),
    Typing(TypingMessage),
    ReadReceipt(ReadReceiptMessage),
    Unsend(UnsendMessage),
    Call(CallMessage),
    DataExtraction(DataExtractionNotificationMessage),
    MessageRequestResponse(MessageRequestResponseMessage),
    GroupInvite(GroupUpdateInviteMessage),
    GroupPromote(GroupUpdatePromoteMessage),
    GroupMemberLeft(GroupUpdateMemberLeftMessage),
    GroupMemberLeftNotification(GroupUpdateMemberLeftNotificationMessage),
    GroupInviteResponse(GroupUpdateInviteResponseMessage),
}

impl OutgoingMessage {
    fn inner(&self) -> &dyn ContentMessage {
        match self {
            OutgoingMessage::Visible(m) => m,
            OutgoingMessage::CommunityInvitation(m) => m,
            OutgoingMessage::Typing(m) => m,
            OutgoingMessage::ReadReceipt(m) => m,
            OutgoingMessage::Unsend(m) => m,
            OutgoingMessage::Call(m) => m,
            OutgoingMessage::DataExtraction(m) => m,
            OutgoingMessage::MessageRequestResponse(m) => m,
            OutgoingMessage::GroupInvite(m) => m,
            OutgoingMessage::GroupPromote(m) => m,
            OutgoingMessage::GroupMemberLeft(m) => m,
            OutgoingMessage::GroupMemberLeftNotification(m) => m,
            OutgoingMessage::GroupInviteResponse(m) => m,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutgoingMessage::Visible(_) => "visible",
            OutgoingMessage::CommunityInvitation(_) => "community_invitation",
            OutgoingMessage::Typing(_) => "typing",
            OutgoingMessage::ReadReceipt(_) => "read_receipt",
            OutgoingMessage::Unsend(_) => "unsend",
            OutgoingMessage::Call(_) => "call",
            OutgoingMessage::DataExtraction(_) => "data_extraction",
            OutgoingMessage::MessageRequestResponse(_) => "message_request_response",
            OutgoingMessage::GroupInvite(_) => "group_invite",
            OutgoingMessage::GroupPromote(_) => "group_promote",
            OutgoingMessage::GroupMemberLeft(_) => "group_member_left",
            OutgoingMessage::GroupMemberLeftNotification(_) => "group_member_left_notification",
            OutgoingMessage::GroupInviteResponse(_) => "group_invite_response",
        }
    }

    /// Disappearing policy, or `None` for kinds that never disappear.
    pub fn expiration(&self) -> Option<ExpirationPolicy> {
        match self {
            OutgoingMessage::Visible(m) => Some(m.expiration()),
            OutgoingMessage::CommunityInvitation(m) => Some(m.expiration()),
            OutgoingMessage::Call(m) => Some(m.expiration()),
            OutgoingMessage::DataExtraction(m) => Some(m.expiration()),
            OutgoingMessage::GroupInvite(m) => Some(m.expiration()),
            OutgoingMessage::GroupPromote(m) => Some(m.expiration()),
            OutgoingMessage::GroupMemberLeft(m) => Some(m.expiration()),
            OutgoingMessage::GroupMemberLeftNotification(m) => Some(m.expiration()),
            OutgoingMessage::GroupInviteResponse(m) => Some(m.expiration()),
            OutgoingMessage::Typing(_)
            | OutgoingMessage::ReadReceipt(_)
            | OutgoingMessage::Unsend(_)
            | OutgoingMessage::MessageRequestResponse(_) => None,
        }
    }

    /// Mailbox routing for group-control kinds.
    pub fn swarm_target(&self) -> Option<SwarmTarget> {
        match self {
            OutgoingMessage::GroupInvite(_) => Some(GroupUpdateInviteMessage::SWARM),
            OutgoingMessage::GroupPromote(_) => Some(GroupUpdatePromoteMessage::SWARM),
            OutgoingMessage::GroupMemberLeft(_) => Some(GroupUpdateMemberLeftMessage::SWARM),
            OutgoingMessage::GroupMemberLeftNotification(_) => {
                Some(GroupUpdateMemberLeftNotificationMessage::SWARM)
            }
            OutgoingMessage::GroupInviteResponse(_) => {
                Some(GroupUpdateInviteResponseMessage::SWARM)
            }
            _ => None,
        }
    }
}

impl Message for OutgoingMessage {
    fn identity(&self) -> &MessageIdentity {
        self.inner().identity()
    }
}

impl ContentMessage for OutgoingMessage {
    fn time_to_live(&self) -> u64 {
        self.inner().time_to_live()
    }

    fn build_content(&self) -> Content {
        self.inner().build_content()
    }

    fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        self.inner().encode()
    }
}

macro_rules! impl_from_message {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for OutgoingMessage {
                fn from(m: $ty) -> Self {
                    OutgoingMessage::$variant(m)
                }
            }
        )*
    };
}

impl_from_message! {
    Visible => VisibleMessage,
    CommunityInvitation => CommunityInvitationMessage,
    Typing => TypingMessage,
    ReadReceipt => ReadReceiptMessage,
    Unsend => UnsendMessage,
    Call => CallMessage,
    DataExtraction => DataExtractionNotificationMessage,
    MessageRequestResponse => MessageRequestResponseMessage,
    GroupInvite => GroupUpdateInviteMessage,
    GroupPromote => GroupUpdatePromoteMessage,
    GroupMemberLeft => GroupUpdateMemberLeftMessage,
    GroupMemberLeftNotification => GroupUpdateMemberLeftNotificationMessage,
    GroupInviteResponse => GroupUpdateInviteResponseMessage,
}
