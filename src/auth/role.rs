use serde::Serialize;

use super::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Encoder,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Maps authenticated identities to roles.
///
/// Entries are either identity ids (matched exactly) or emails (matched
/// case-insensitively). Anything not listed is an encoder.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    admins: Vec<String>,
}

impl RoleMap {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admins = admins
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        RoleMap { admins }
    }

    pub fn role_of(&self, identity: &Identity) -> Role {
        let listed = self.admins.iter().any(|entry| {
            entry == &identity.id
                || identity
                    .email
                    .as_deref()
                    .is_some_and(|email| entry.eq_ignore_ascii_case(email))
        });
        if listed { Role::Admin } else { Role::Encoder }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.role_of(identity).is_admin()
    }
}
