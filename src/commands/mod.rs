pub mod department;
pub mod employee;
pub mod init;
pub mod project;
pub mod report;
pub mod task;

use anyhow::{bail, Result};

use timesheet::policy::{AccessPolicy, Principal, MANAGER_ROLE};

/// The principal running a command together with the policy that decides
/// what they may do.
pub struct Actor<'a> {
    pub principal: Principal,
    pub policy: &'a dyn AccessPolicy,
}

impl<'a> Actor<'a> {
    pub fn new(principal: Principal, policy: &'a dyn AccessPolicy) -> Self {
        Actor { principal, policy }
    }

    pub fn is_manager(&self) -> bool {
        self.policy.has_role(&self.principal, MANAGER_ROLE)
    }

    pub fn require_manager(&self) -> Result<()> {
        if !self.is_manager() {
            bail!(
                "Permission denied: '{}' is not in the {} role",
                self.principal.username,
                MANAGER_ROLE
            );
        }
        Ok(())
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}
