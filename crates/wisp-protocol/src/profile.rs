/// Sender profile and pro-feature attachments for outgoing messages.
///
/// Both are supplied by the caller. Messages that carry a profile embed it
/// into their data payload; the pro proof is attached to the content.
use base64::Engine;

use crate::content::{LokiProfile, ProMessage, ProProof};
use crate::error::{expect_len, ProtocolError};

/// Rotating public key length of a pro proof.
pub const PRO_ROTATING_KEY_LEN: usize = 32;

/// Signature length of a pro proof.
pub const PRO_SIGNATURE_LEN: usize = 64;

/// Bits of the pro feature bitset.
pub mod pro_features {
    pub const INCREASED_MESSAGE_LENGTH: u64 = 1 << 0;
    pub const BADGE: u64 = 1 << 1;
    pub const ANIMATED_DISPLAY_PICTURE: u64 = 1 << 2;
}

// ── OutgoingUserProfile ──────────────────────────────────────────────────

/// Avatar location and the key it is encrypted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePicture {
    pub url: String,
    pub key: Vec<u8>,
}

/// The local user's profile as shared with recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingUserProfile {
    display_name: String,
    updated_at_seconds: u64,
    picture: Option<ProfilePicture>,
}

/// Profile fields ready to be placed into a data message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub profile: Option<LokiProfile>,
    pub profile_key: Option<Vec<u8>>,
}

impl OutgoingUserProfile {
    /// A picture with an empty url or key is dropped: one is useless
    /// without the other.
    pub fn new(
        display_name: impl Into<String>,
        updated_at_seconds: u64,
        picture: Option<ProfilePicture>,
    ) -> Self {
        let picture = picture.filter(|p| !p.url.is_empty() && !p.key.is_empty());
        Self {
            display_name: display_name.into(),
            updated_at_seconds,
            picture,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn updated_at_seconds(&self) -> u64 {
        self.updated_at_seconds
    }

    pub fn picture(&self) -> Option<&ProfilePicture> {
        self.picture.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty() && self.picture.is_none()
    }

    /// `{profile, profile_key}` when a picture is set, `{profile}` alone
    /// otherwise, nothing for an empty profile.
    pub fn to_details(&self) -> ProfileDetails {
        if self.is_empty() {
            return ProfileDetails::default();
        }

        let mut profile = LokiProfile {
            display_name: None,
            profile_picture: None,
            last_profile_update_seconds: Some(self.updated_at_seconds),
        };
        if !self.display_name.is_empty() {
            profile.display_name = Some(self.display_name.clone());
        }

        match &self.picture {
            Some(picture) => {
                profile.profile_picture = Some(picture.url.clone());
                ProfileDetails {
                    profile: Some(profile),
                    profile_key: Some(picture.key.clone()),
                }
            }
            None => ProfileDetails {
                profile: Some(profile),
                profile_key: None,
            },
        }
    }
}

// ── Pro proof ────────────────────────────────────────────────────────────

/// Pro proof as stored in the user's config: base64 / hex encoded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProProofDetails {
    pub version: u32,
    pub expiry_ms: u64,
    pub gen_index_hash_b64: String,
    pub rotating_pubkey_hex: String,
    pub signature_hex: String,
}

/// What the sender knows about its pro status when building a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingProDetails {
    pub features: u64,
    pub proof: Option<ProProofDetails>,
}

impl OutgoingProDetails {
    /// Decode into a wire `ProMessage`.
    ///
    /// Returns `Ok(None)` when no feature is used or no proof is held.
    pub fn to_pro_message(&self) -> Result<Option<ProMessage>, ProtocolError> {
        let Some(proof) = &self.proof else {
            return Ok(None);
        };
        if self.features == 0 {
            tracing::debug!("pro proof present but no feature used, not attaching it");
            return Ok(None);
        }

        let gen_index_hash = base64::engine::general_purpose::STANDARD
            .decode(&proof.gen_index_hash_b64)
            .map_err(|e| ProtocolError::validation("pro gen index hash", e.to_string()))?;
        let rotating_public_key = hex::decode(&proof.rotating_pubkey_hex)
            .map_err(|e| ProtocolError::validation("pro rotating public key", e.to_string()))?;
        let sig = hex::decode(&proof.signature_hex)
            .map_err(|e| ProtocolError::validation("pro signature", e.to_string()))?;

        expect_len(
            "pro rotating public key",
            &rotating_public_key,
            PRO_ROTATING_KEY_LEN,
        )?;
        expect_len("pro signature", &sig, PRO_SIGNATURE_LEN)?;

        Ok(Some(ProMessage {
            features: self.features,
            proof: ProProof {
                version: proof.version,
                gen_index_hash,
                rotating_public_key,
                expire_at_ms: proof.expiry_ms,
                sig,
            },
        }))
    }
}

/// Pro attachment input: fresh details when sending, or the already
/// encoded proof when re-syncing a message that was sent before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProMessageSource {
    AlreadyEncoded(ProMessage),
    FromDetails(OutgoingProDetails),
}

impl ProMessageSource {
    /// Resolve to the proof to attach, if any.
    pub fn resolve(self) -> Result<Option<ProMessage>, ProtocolError> {
        match self {
            ProMessageSource::AlreadyEncoded(message) => Ok(Some(message)),
            ProMessageSource::FromDetails(details) => details.to_pro_message(),
        }
    }
}

/// Resolve an optional source; absence is valid.
pub(crate) fn resolve_pro(
    source: Option<ProMessageSource>,
) -> Result<Option<ProMessage>, ProtocolError> {
    source.map_or(Ok(None), ProMessageSource::resolve)
}
