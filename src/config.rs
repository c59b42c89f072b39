use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use timesheet::policy::RoleTable;
use timesheet::tree::DeletePolicy;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub delete_policy: DeletePolicy,
    /// Role name -> usernames holding it
    pub roles: BTreeMap<String, Vec<String>>,
    pub superusers: Vec<String>,
}

impl Config {
    /// Reads `config.json` from the project directory, falling back to
    /// defaults when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn role_table(&self) -> RoleTable {
        let mut table = RoleTable::new();
        for (role, users) in &self.roles {
            for user in users {
                table.grant(role, user);
            }
        }
        for user in &self.superusers {
            table.add_superuser(user);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use timesheet::policy::{AccessPolicy, Principal, MANAGER_ROLE};

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.delete_policy, DeletePolicy::Reparent);
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
                "delete_policy": "reject",
                "roles": { "manager": ["ann", "bob"] },
                "superusers": ["root"]
            }"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Reject);
        assert_eq!(config.roles["manager"], vec!["ann", "bob"]);

        let table = config.role_table();
        assert!(table.has_role(&Principal::new("bob"), MANAGER_ROLE));
        assert!(table.has_role(&Principal::new("root"), MANAGER_ROLE));
        assert!(!table.has_role(&Principal::new("eve"), MANAGER_ROLE));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{ "superusers": ["root"] }"#).unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Reparent);
        assert!(config.roles.is_empty());
    }

    #[test]
    fn test_load_invalid_policy_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{ "delete_policy": "cascade" }"#).unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }
}
