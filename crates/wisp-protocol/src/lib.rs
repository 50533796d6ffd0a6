//! Wisp outgoing message layer.
//!
//! Turns typed outgoing messages into signed-content envelopes and then into
//! network-ready raw messages. Concurrent sends of the same message are
//! deduplicated through `wisp-queue`.
//!
//! # Modules
//!
//! - [`types`]: message identity, expiration policy, namespaces, TTL constants
//! - [`content`]: wire content envelope (MessagePack)
//! - [`profile`]: sender profile and pro proof attachments
//! - [`messages`]: the message hierarchy and every concrete message kind
//! - [`raw`]: conversion to [`RawOutgoingMessage`]
//! - [`sending`]: [`MessageSender`] and the [`RawMessageSink`] boundary
//! - [`error`]: [`ProtocolError`]

pub mod content;
pub mod error;
pub mod messages;
pub mod profile;
pub mod raw;
pub mod sending;
pub mod types;

pub use error::ProtocolError;
pub use messages::{
    CallMessage, CarriesProfile, CommunityInvitationMessage, ContentMessage,
    DataExtractionNotificationMessage, Expirable, GroupUpdate, GroupUpdateBase,
    GroupUpdateInviteMessage, GroupUpdateInviteResponseMessage, GroupUpdateMemberLeftMessage,
    GroupUpdateMemberLeftNotificationMessage, GroupUpdatePromoteMessage, Message,
    MessageRequestResponseMessage, OutgoingMessage, ProfileAttachment, ReadReceiptMessage,
    TypingMessage, UnsendMessage, VisibleMessage,
};
pub use profile::{
    OutgoingProDetails, OutgoingUserProfile, ProMessageSource, ProProofDetails, ProfilePicture,
};
pub use raw::{to_raw_message, RawOutgoingMessage};
pub use sending::{MessageSender, RawMessageSink, SendError, SenderConfig};
pub use types::{
    DisappearingMode, ExpirationPolicy, MessageIdentity, Namespace, SwarmTarget,
    TTL_CALL_MESSAGE_MS, TTL_CONTENT_MESSAGE_MS, TTL_TYPING_MESSAGE_MS,
};

pub use wisp_queue::{JobError, KeyedJobQueue};
