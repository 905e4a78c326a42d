//! Ownership-or-admin authorization policy shared by every host-scoped route.

use crate::models::{Profile, ProfileRole};

/// The authenticated caller as seen by the policy.
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    pub user_id: &'a str,
    pub role: ProfileRole,
}

impl<'a> Caller<'a> {
    /// Builds a caller from its identity and (possibly missing) profile.
    ///
    /// A caller without a profile is treated as a plain host.
    pub fn new(user_id: &'a str, profile: Option<&Profile>) -> Self {
        Self {
            user_id,
            role: profile.map(|p| p.role).unwrap_or_default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Returns true if `caller` may read or modify a resource owned by `owner_id`.
pub fn can_manage(caller: &Caller<'_>, owner_id: &str) -> bool {
    caller.is_admin() || caller.user_id == owner_id
}
