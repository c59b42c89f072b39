use std::collections::{BTreeMap, BTreeSet};

/// Role required for every mutating operation.
pub const MANAGER_ROLE: &str = "manager";

/// The account acting on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Principal {
            username: username.into(),
        }
    }
}

pub trait AccessPolicy {
    fn has_role(&self, principal: &Principal, role: &str) -> bool;
}

/// Static role membership. Superusers hold every role.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    members: BTreeMap<String, BTreeSet<String>>,
    superusers: BTreeSet<String>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, role: &str, username: &str) {
        self.members
            .entry(role.to_string())
            .or_default()
            .insert(username.to_string());
    }

    pub fn add_superuser(&mut self, username: &str) {
        self.superusers.insert(username.to_string());
    }
}

impl AccessPolicy for RoleTable {
    fn has_role(&self, principal: &Principal, role: &str) -> bool {
        if self.superusers.contains(&principal.username) {
            return true;
        }
        self.members
            .get(role)
            .is_some_and(|users| users.contains(&principal.username))
    }
}
