//! Role record.

use serde::{Deserialize, Serialize};

use docstore_identity_core::RoleId;

/// Identity attributes of a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<RoleId>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) normalized_name: Option<String>,
}

impl RoleRecord {
    /// Create an unsaved role.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Store-assigned identifier, `None` until the role is created.
    #[must_use]
    pub const fn id(&self) -> Option<RoleId> {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Normalized lookup name.
    #[must_use]
    pub fn normalized_name(&self) -> Option<&str> {
        self.normalized_name.as_deref()
    }

    pub(crate) const fn assign_id(&mut self, id: RoleId) {
        self.id = Some(id);
    }
}
