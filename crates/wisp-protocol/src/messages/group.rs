/// Group-control messages.
///
/// All of them travel inside a data message as a `GroupUpdateMessage`.
/// Invite and promote go to the recipient's own mailbox (they are not a
/// member yet, or not an admin yet). Everything else goes to the group's
/// shared mailbox.
use crate::content::{
    Content, ContentPayload, DataMessage, GroupUpdateInvite, GroupUpdateInviteResponse,
    GroupUpdateMessage, GroupUpdatePromote, ProMessage,
};
use crate::error::{expect_len, expect_non_empty, ProtocolError};
use crate::messages::{
    disappearing_content, CarriesProfile, ContentMessage, Expirable, GroupUpdate, Message,
    ProfileAttachment,
};
use crate::profile::OutgoingUserProfile;
use crate::types::{ExpirationPolicy, MessageIdentity, SwarmTarget};

/// Admin signature over the invite.
pub const ADMIN_SIGNATURE_LEN: usize = 64;
/// Member authentication data handed to an invitee.
pub const MEMBER_AUTH_DATA_LEN: usize = 100;
/// Group identity seed handed to a promoted admin.
pub const GROUP_IDENTITY_SEED_LEN: usize = 32;

// ── Common part ──────────────────────────────────────────────────────────

/// Fields every group update shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdateBase {
    identity: MessageIdentity,
    expiration: ExpirationPolicy,
    group_public_key: String,
}

impl GroupUpdateBase {
    pub fn new(
        identity: MessageIdentity,
        expiration: ExpirationPolicy,
        group_public_key: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let group_public_key = group_public_key.into();
        expect_non_empty("group public key", &group_public_key)?;
        Ok(Self {
            identity,
            expiration,
            group_public_key,
        })
    }

    fn content(&self, update: GroupUpdateMessage, sender: Option<&ProfileAttachment>) -> Content {
        let mut data = DataMessage {
            group_update_message: Some(update),
            ..Default::default()
        };
        if let Some(sender) = sender {
            sender.fill_data(&mut data);
        }

        let mut content =
            disappearing_content(&self.identity, self.expiration, ContentPayload::Data(data));
        if let Some(sender) = sender {
            sender.attach_pro(&mut content);
        }
        content
    }
}

/// Implements the traits every group update shares on a struct with a
/// `base: GroupUpdateBase` field.
macro_rules! group_update_impls {
    ($ty:ty, $swarm:expr) => {
        impl Message for $ty {
            fn identity(&self) -> &MessageIdentity {
                &self.base.identity
            }
        }

        impl Expirable for $ty {
            fn expiration(&self) -> ExpirationPolicy {
                self.base.expiration
            }
        }

        impl GroupUpdate for $ty {
            const SWARM: SwarmTarget = $swarm;

            fn group_public_key(&self) -> &str {
                &self.base.group_public_key
            }
        }
    };
}

macro_rules! carries_profile_impl {
    ($ty:ty) => {
        impl CarriesProfile for $ty {
            fn user_profile(&self) -> Option<&OutgoingUserProfile> {
                self.sender.user_profile()
            }

            fn pro_message(&self) -> Option<&ProMessage> {
                self.sender.pro_message()
            }
        }
    };
}

// ── Invite ───────────────────────────────────────────────────────────────

/// Invites a user into a group. Sent to the invitee's own mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdateInviteMessage {
    base: GroupUpdateBase,
    name: String,
    member_auth_data: Vec<u8>,
    admin_signature: Vec<u8>,
    sender: ProfileAttachment,
}

impl GroupUpdateInviteMessage {
    pub fn new(
        base: GroupUpdateBase,
        name: impl Into<String>,
        member_auth_data: Vec<u8>,
        admin_signature: Vec<u8>,
        sender: ProfileAttachment,
    ) -> Result<Self, ProtocolError> {
        let name = name.into();
        expect_non_empty("group name", &name)?;
        expect_len("admin signature", &admin_signature, ADMIN_SIGNATURE_LEN)?;
        expect_len("member auth data", &member_auth_data, MEMBER_AUTH_DATA_LEN)?;
        Ok(Self {
            base,
            name,
            member_auth_data,
            admin_signature,
            sender,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

group_update_impls!(GroupUpdateInviteMessage, SwarmTarget::OneToOne);
carries_profile_impl!(GroupUpdateInviteMessage);

impl ContentMessage for GroupUpdateInviteMessage {
    fn time_to_live(&self) -> u64 {
        self.base.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        self.base.content(
            GroupUpdateMessage::Invite(GroupUpdateInvite {
                group_session_id: self.base.group_public_key.clone(),
                name: self.name.clone(),
                member_auth_data: self.member_auth_data.clone(),
                admin_signature: self.admin_signature.clone(),
            }),
            Some(&self.sender),
        )
    }
}

// ── Promote ──────────────────────────────────────────────────────────────

/// Hands admin rights to a member. Sent to the member's own mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdatePromoteMessage {
    base: GroupUpdateBase,
    group_identity_seed: Vec<u8>,
    name: String,
}

impl GroupUpdatePromoteMessage {
    pub fn new(
        base: GroupUpdateBase,
        group_identity_seed: Vec<u8>,
        name: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let name = name.into();
        expect_len(
            "group identity seed",
            &group_identity_seed,
            GROUP_IDENTITY_SEED_LEN,
        )?;
        expect_non_empty("group name", &name)?;
        Ok(Self {
            base,
            group_identity_seed,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

group_update_impls!(GroupUpdatePromoteMessage, SwarmTarget::OneToOne);

impl ContentMessage for GroupUpdatePromoteMessage {
    fn time_to_live(&self) -> u64 {
        self.base.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        self.base.content(
            GroupUpdateMessage::Promote(GroupUpdatePromote {
                group_identity_seed: self.group_identity_seed.clone(),
                name: self.name.clone(),
            }),
            None,
        )
    }
}

// ── Member left ──────────────────────────────────────────────────────────

/// Sent by a member leaving the group, for the admins to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdateMemberLeftMessage {
    base: GroupUpdateBase,
}

impl GroupUpdateMemberLeftMessage {
    pub fn new(base: GroupUpdateBase) -> Self {
        Self { base }
    }
}

group_update_impls!(GroupUpdateMemberLeftMessage, SwarmTarget::Group);

impl ContentMessage for GroupUpdateMemberLeftMessage {
    fn time_to_live(&self) -> u64 {
        self.base.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        self.base.content(GroupUpdateMessage::MemberLeft, None)
    }
}

/// Sent alongside [`GroupUpdateMemberLeftMessage`] so other members can
/// show a control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdateMemberLeftNotificationMessage {
    base: GroupUpdateBase,
}

impl GroupUpdateMemberLeftNotificationMessage {
    pub fn new(base: GroupUpdateBase) -> Self {
        Self { base }
    }
}

group_update_impls!(GroupUpdateMemberLeftNotificationMessage, SwarmTarget::Group);

impl ContentMessage for GroupUpdateMemberLeftNotificationMessage {
    fn time_to_live(&self) -> u64 {
        self.base.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        self.base.content(GroupUpdateMessage::MemberLeftNotification, None)
    }
}

// ── Invite response ──────────────────────────────────────────────────────

/// An invitee's answer, posted to the group so members learn its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpdateInviteResponseMessage {
    base: GroupUpdateBase,
    is_approved: bool,
    sender: ProfileAttachment,
}

impl GroupUpdateInviteResponseMessage {
    pub fn new(base: GroupUpdateBase, is_approved: bool, sender: ProfileAttachment) -> Self {
        Self {
            base,
            is_approved,
            sender,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }
}

group_update_impls!(GroupUpdateInviteResponseMessage, SwarmTarget::Group);
carries_profile_impl!(GroupUpdateInviteResponseMessage);

impl ContentMessage for GroupUpdateInviteResponseMessage {
    fn time_to_live(&self) -> u64 {
        self.base.expiration.time_to_live()
    }

    fn build_content(&self) -> Content {
        self.base.content(
            GroupUpdateMessage::InviteResponse(GroupUpdateInviteResponse {
                is_approved: self.is_approved,
            }),
            Some(&self.sender),
        )
    }
}
