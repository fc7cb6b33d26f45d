//! User record.

use serde::{Deserialize, Serialize};

use docstore_identity_core::UserId;

/// Identity attributes of a user.
///
/// The identifier is assigned by the store when the user is created and is
/// never set by the caller. Normalized names are computed by the identity
/// framework; the store only persists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,
    #[serde(default)]
    pub(crate) user_name: Option<String>,
    #[serde(default)]
    pub(crate) normalized_user_name: Option<String>,
    #[serde(default)]
    pub(crate) password_hash: Option<String>,
    #[serde(default)]
    pub(crate) email: Option<String>,
    #[serde(default)]
    pub(crate) email_confirmed: bool,
    #[serde(default)]
    pub(crate) normalized_email: Option<String>,
}

impl UserRecord {
    /// Create an unsaved user with a display name and email.
    #[must_use]
    pub fn new(user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Store-assigned identifier, `None` until the user is created.
    #[must_use]
    pub const fn id(&self) -> Option<UserId> {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// Normalized lookup name.
    #[must_use]
    pub fn normalized_user_name(&self) -> Option<&str> {
        self.normalized_user_name.as_deref()
    }

    /// Opaque password hash, `None` when no password is set.
    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Whether the email has been confirmed.
    #[must_use]
    pub const fn email_confirmed(&self) -> bool {
        self.email_confirmed
    }

    /// Normalized email used for lookups.
    #[must_use]
    pub fn normalized_email(&self) -> Option<&str> {
        self.normalized_email.as_deref()
    }

    pub(crate) const fn assign_id(&mut self, id: UserId) {
        self.id = Some(id);
    }
}
