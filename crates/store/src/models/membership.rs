//! Membership record, the join between users and roles.

use serde::{Deserialize, Serialize};

use docstore_identity_core::{MembershipId, RoleId, UserId};

/// Records that a user holds a role.
///
/// Nothing prevents two memberships for the same pair; `add_to_role` appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    #[serde(rename = "_id")]
    id: MembershipId,
    user_id: UserId,
    role_id: RoleId,
}

impl MembershipRecord {
    pub(crate) fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            id: MembershipId::generate(),
            user_id,
            role_id,
        }
    }

    /// Identifier of this membership.
    #[must_use]
    pub const fn id(&self) -> MembershipId {
        self.id
    }

    /// The member.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The role held.
    #[must_use]
    pub const fn role_id(&self) -> RoleId {
        self.role_id
    }
}
