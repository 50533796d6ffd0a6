use crate::content::{
    AttachmentPointer, Content, ContentPayload, DataMessage, OpenGroupInvitation, Preview,
    ProMessage, Quote, Reaction,
};
use crate::error::{expect_non_empty, ProtocolError};
use crate::messages::{
    disappearing_content, CarriesProfile, ContentMessage, Expirable, Message, ProfileAttachment,
};
use crate::profile::OutgoingUserProfile;
use crate::types::{ExpirationPolicy, MessageIdentity};

// ── VisibleMessage ───────────────────────────────────────────────────────

/// A user-visible chat message: text, attachments, link previews, or a
/// reaction to an earlier message, optionally quoting one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleMessage {
    identity: MessageIdentity,
    expiration: ExpirationPolicy,
    body: Option<String>,
    attachments: Vec<AttachmentPointer>,
    quote: Option<Quote>,
    reaction: Option<Reaction>,
    previews: Vec<Preview>,
    sync_target: Option<String>,
    sender: ProfileAttachment,
}

impl VisibleMessage {
    pub fn builder(identity: MessageIdentity) -> VisibleMessageBuilder {
        VisibleMessageBuilder::new(identity)
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn attachments(&self) -> &[AttachmentPointer] {
        &self.attachments
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn reaction(&self) -> Option<&Reaction> {
        self.reaction.as_ref()
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    /// Recipient of the original message when this is a copy sent to our
    /// own other devices.
    pub fn sync_target(&self) -> Option<&str> {
        self.sync_target.as_deref()
    }
}

impl Message for VisibleMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for VisibleMessage {
    fn time_to_live(&self) -> u64 {
        self.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        let mut data = DataMessage {
            body: self.body.clone(),
            attachments: self.attachments.clone(),
            quote: self.quote.clone(),
            reaction: self.reaction.clone(),
            preview: self.previews.clone(),
            sync_target: self.sync_target.clone(),
            ..Default::default()
        };
        self.sender.fill_data(&mut data);

        let mut content =
            disappearing_content(&self.identity, self.expiration, ContentPayload::Data(data));
        self.sender.attach_pro(&mut content);
        content
    }
}

impl Expirable for VisibleMessage {
    fn expiration(&self) -> ExpirationPolicy {
        self.expiration
    }
}

impl CarriesProfile for VisibleMessage {
    fn user_profile(&self) -> Option<&OutgoingUserProfile> {
        self.sender.user_profile()
    }

    fn pro_message(&self) -> Option<&ProMessage> {
        self.sender.pro_message()
    }
}

/// Builder for [`VisibleMessage`].
///
/// ```ignore
/// let message = VisibleMessage::builder(identity)
///     .body("hello")
///     .expiration(ExpirationPolicy::delete_after_send(3600))
///     .sender(profile)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct VisibleMessageBuilder {
    identity: MessageIdentity,
    expiration: ExpirationPolicy,
    body: Option<String>,
    attachments: Vec<AttachmentPointer>,
    quote: Option<Quote>,
    reaction: Option<Reaction>,
    previews: Vec<Preview>,
    sync_target: Option<String>,
    sender: ProfileAttachment,
}

impl VisibleMessageBuilder {
    pub fn new(identity: MessageIdentity) -> Self {
        Self {
            identity,
            expiration: ExpirationPolicy::NONE,
            body: None,
            attachments: Vec::new(),
            quote: None,
            reaction: None,
            previews: Vec::new(),
            sync_target: None,
            sender: ProfileAttachment::none(),
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn attachment(mut self, attachment: AttachmentPointer) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn quote(mut self, quote: Quote) -> Self {
        self.quote = Some(quote);
        self
    }

    pub fn reaction(mut self, reaction: Reaction) -> Self {
        self.reaction = Some(reaction);
        self
    }

    pub fn preview(mut self, preview: Preview) -> Self {
        self.previews.push(preview);
        self
    }

    pub fn sync_target(mut self, recipient: impl Into<String>) -> Self {
        self.sync_target = Some(recipient.into());
        self
    }

    pub fn expiration(mut self, expiration: ExpirationPolicy) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn sender(mut self, sender: ProfileAttachment) -> Self {
        self.sender = sender;
        self
    }

    /// Fails unless the message has a non-empty body, an attachment, a link
    /// preview or a reaction.
    pub fn build(self) -> Result<VisibleMessage, ProtocolError> {
        let body = self.body.filter(|b| !b.is_empty());
        if body.is_none()
            && self.attachments.is_empty()
            && self.previews.is_empty()
            && self.reaction.is_none()
        {
            return Err(ProtocolError::validation(
                "visible message",
                "needs a body, an attachment, a preview or a reaction",
            ));
        }
        let preview_images = self.previews.iter().filter_map(|p| p.image.as_ref());
        if let Some(attachment) = self
            .attachments
            .iter()
            .chain(preview_images)
            .find(|a| a.url.is_empty())
        {
            return Err(ProtocolError::validation(
                "attachment url",
                format!(
                    "must not be empty ({})",
                    attachment.file_name.as_deref().unwrap_or("unnamed")
                ),
            ));
        }
        for preview in &self.previews {
            expect_non_empty("preview url", &preview.url)?;
        }
        if let Some(quote) = &self.quote {
            expect_non_empty("quote author", &quote.author)?;
        }
        if let Some(reaction) = &self.reaction {
            expect_non_empty("reaction author", &reaction.author)?;
            expect_non_empty("reaction emoji", &reaction.emoji)?;
        }

        Ok(VisibleMessage {
            identity: self.identity,
            expiration: self.expiration,
            body,
            attachments: self.attachments,
            quote: self.quote,
            reaction: self.reaction,
            previews: self.previews,
            sync_target: self.sync_target,
            sender: self.sender,
        })
    }
}

// ── CommunityInvitationMessage ───────────────────────────────────────────

/// Invitation to a public community, identified by URL and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityInvitationMessage {
    identity: MessageIdentity,
    expiration: ExpirationPolicy,
    url: String,
    name: String,
    sender: ProfileAttachment,
}

impl CommunityInvitationMessage {
    pub fn new(
        identity: MessageIdentity,
        expiration: ExpirationPolicy,
        url: impl Into<String>,
        name: impl Into<String>,
        sender: ProfileAttachment,
    ) -> Result<Self, ProtocolError> {
        let url = url.into();
        let name = name.into();
        expect_non_empty("community url", &url)?;
        expect_non_empty("community name", &name)?;
        Ok(Self {
            identity,
            expiration,
            url,
            name,
            sender,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Message for CommunityInvitationMessage {
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }
}

impl ContentMessage for CommunityInvitationMessage {
    fn time_to_live(&self) -> u64 {
        self.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        let mut data = DataMessage {
            open_group_invitation: Some(OpenGroupInvitation {
                url: self.url.clone(),
                name: self.name.clone(),
            }),
            ..Default::default()
        };
        self.sender.fill_data(&mut data);

        let mut content =
            disappearing_content(&self.identity, self.expiration, ContentPayload::Data(data));
        self.sender.attach_pro(&mut content);
        content
    }
}

impl Expirable for CommunityInvitationMessage {
    fn expiration(&self) -> ExpirationPolicy {
        self.expiration
    }
}

impl CarriesProfile for CommunityInvitationMessage {
    fn user_profile(&self) -> Option<&OutgoingUserProfile> {
        self.sender.user_profile()
    }

    fn pro_message(&self) -> Option<&ProMessage> {
        self.sender.pro_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ExpirationType, ReactionAction};
    use crate::profile::{pro_features, OutgoingProDetails, ProMessageSource, ProProofDetails};
    use base64::Engine;

    fn identity() -> MessageIdentity {
        MessageIdentity::new(1708000000000, "visible-1").expect("valid identity")
    }

    fn pro_source() -> ProMessageSource {
        ProMessageSource::FromDetails(OutgoingProDetails {
            features: pro_features::BADGE,
            proof: Some(ProProofDetails {
                version: 1,
                expiry_ms: 1_800_000_000_000,
                gen_index_hash_b64: base64::engine::general_purpose::STANDARD.encode([7u8; 32]),
                rotating_pubkey_hex: hex::encode([1u8; 32]),
                signature_hex: hex::encode([2u8; 64]),
            }),
        })
    }

    #[test]
    fn empty_visible_message_is_rejected() {
        let err = VisibleMessage::builder(identity()).body("").build().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn reaction_only_is_accepted() {
        let message = VisibleMessage::builder(identity())
            .reaction(Reaction {
                id: 1707000000000,
                author: "05beef".into(),
                emoji: "🔥".into(),
                action: ReactionAction::React,
            })
            .build()
            .expect("valid");
        assert_eq!(message.body(), None);

        let content = Content::from_bytes(&message.encode().expect("encode")).expect("decode");
        let data = content.data_message().expect("data payload");
        let reaction = data.reaction.as_ref().expect("reaction");
        assert_eq!(reaction.emoji, "🔥");
        assert_eq!(reaction.action, ReactionAction::React);
        assert_eq!(data.body, None);
    }

    #[test]
    fn reaction_without_emoji_is_rejected() {
        let err = VisibleMessage::builder(identity())
            .reaction(Reaction {
                id: 1,
                author: "05beef".into(),
                emoji: String::new(),
                action: ReactionAction::Remove,
            })
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid reaction emoji: must not be empty");
    }

    #[test]
    fn preview_survives_encoding() {
        let preview = Preview {
            url: "https://example.org/post".into(),
            title: Some("A post".into()),
            image: Some(AttachmentPointer {
                url: "http://filev2.example.org/file/thumb".into(),
                content_type: Some("image/jpeg".into()),
                ..Default::default()
            }),
        };
        let message = VisibleMessage::builder(identity())
            .body("look https://example.org/post")
            .preview(preview.clone())
            .build()
            .expect("valid");
        assert_eq!(message.previews(), &[preview.clone()]);

        let content = Content::from_bytes(&message.encode().expect("encode")).expect("decode");
        assert_eq!(
            content.data_message().map(|d| d.preview.clone()),
            Some(vec![preview])
        );
    }

    #[test]
    fn preview_image_without_url_is_rejected() {
        let err = VisibleMessage::builder(identity())
            .preview(Preview {
                url: "https://example.org/post".into(),
                title: None,
                image: Some(AttachmentPointer {
                    file_name: Some("thumb.jpg".into()),
                    ..Default::default()
                }),
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid attachment url: must not be empty (thumb.jpg)"
        );
    }

    #[test]
    fn attachment_only_is_accepted() {
        let message = VisibleMessage::builder(identity())
            .attachment(AttachmentPointer {
                url: "http://filev2.example.org/file/1".into(),
                ..Default::default()
            })
            .build()
            .expect("valid");
        assert_eq!(message.body(), None);
        assert_eq!(message.attachments().len(), 1);
    }

    #[test]
    fn attachment_without_url_is_rejected() {
        let err = VisibleMessage::builder(identity())
            .body("see file")
            .attachment(AttachmentPointer {
                file_name: Some("cat.png".into()),
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid attachment url: must not be empty (cat.png)"
        );
    }

    #[test]
    fn visible_content_carries_everything() {
        let sender = ProfileAttachment::new(
            Some(OutgoingUserProfile::new("Jane", 9, None)),
            Some(pro_source()),
        )
        .expect("valid pro");
        let message = VisibleMessage::builder(identity())
            .body("hello")
            .quote(Quote {
                id: 1707000000000,
                author: "05beef".into(),
            })
            .sync_target("05cafe")
            .expiration(ExpirationPolicy::delete_after_send(3600))
            .sender(sender)
            .build()
            .expect("valid");

        assert_eq!(message.time_to_live(), 3_600_000);
        let content = message.build_content();
        let data = content.data_message().expect("data payload");
        assert_eq!(data.body.as_deref(), Some("hello"));
        assert_eq!(data.quote.as_ref().map(|q| q.id), Some(1707000000000));
        assert_eq!(data.sync_target.as_deref(), Some("05cafe"));
        assert_eq!(
            data.profile.as_ref().and_then(|p| p.display_name.as_deref()),
            Some("Jane")
        );
        assert_eq!(content.expiration_type, Some(ExpirationType::DeleteAfterSend));
        assert_eq!(content.expiration_timer, Some(3600));
        assert_eq!(
            content.pro_message.as_ref().map(|p| p.features),
            Some(pro_features::BADGE)
        );
        assert!(message.pro_message().is_some());
    }

    #[test]
    fn community_invitation_requires_url_and_name() {
        let sender = ProfileAttachment::none();
        assert!(CommunityInvitationMessage::new(
            identity(),
            ExpirationPolicy::NONE,
            "",
            "Rust",
            sender.clone()
        )
        .is_err());
        assert!(CommunityInvitationMessage::new(
            identity(),
            ExpirationPolicy::NONE,
            "https://community.example.org/rust",
            "",
            sender
        )
        .is_err());
    }

    #[test]
    fn community_invitation_content() {
        let message = CommunityInvitationMessage::new(
            identity(),
            ExpirationPolicy::NONE,
            "https://community.example.org/rust?public_key=abc",
            "Rust",
            ProfileAttachment::with_profile(OutgoingUserProfile::new("Jane", 1, None)),
        )
        .expect("valid");

        let content = message.build_content();
        let invitation = content
            .data_message()
            .and_then(|d| d.open_group_invitation.as_ref())
            .expect("invitation");
        assert_eq!(invitation.name, "Rust");
        assert!(!content.has_expiration());
        assert!(content.pro_message.is_none());
        assert_eq!(message.profile_details().profile_key, None);
    }
}
