use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{Config, CONFIG_FILE};
use timesheet::db::Database;
use timesheet::policy::MANAGER_ROLE;

pub const TIMESHEET_DIR: &str = ".timesheet";
pub const DB_FILE: &str = "timesheet.db";

// Default config shipped with the binary
const DEFAULT_CONFIG: &str = include_str!("../../resources/config.json");

/// Creates `.timesheet/` with an empty database and a config file. With
/// `manager`, that username is granted the manager role in the new config.
pub fn run(path: &Path, force: bool, manager: Option<&str>) -> Result<()> {
    let dir = path.join(TIMESHEET_DIR);
    let config_path = dir.join(CONFIG_FILE);

    let dir_exists = dir.exists();
    let config_exists = config_path.exists();

    if dir_exists && config_exists && !force {
        println!("Already initialized at {}", path.display());
        println!("Use --force to reset {} to the defaults.", CONFIG_FILE);
        return Ok(());
    }

    if !dir_exists {
        fs::create_dir_all(&dir).context("Failed to create .timesheet directory")?;
        println!("Created {}", dir.display());
    }

    // Opening runs the schema migration
    Database::open(&dir.join(DB_FILE))?;

    let mut config: Config =
        serde_json::from_str(DEFAULT_CONFIG).context("Embedded default config is invalid")?;
    if let Some(username) = manager {
        config
            .roles
            .entry(MANAGER_ROLE.to_string())
            .or_default()
            .push(username.to_string());
    }
    let raw = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, raw + "\n")
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    if force && config_exists {
        println!("Reset {}", config_path.display());
    } else {
        println!("Created {}", config_path.display());
    }

    println!("Timesheet initialized successfully!");
    println!("\nNext steps:");
    println!("  timesheet dept add \"Development\"   # Create a department");
    println!("  timesheet employee add <username> --department <id>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use timesheet::policy::{AccessPolicy, Principal};
    use timesheet::tree::DeletePolicy;

    #[test]
    fn test_run_fresh_init() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path(), false, None).is_ok());

        assert!(dir.path().join(".timesheet").exists());
        assert!(dir.path().join(".timesheet/timesheet.db").exists());
        assert!(dir.path().join(".timesheet/config.json").exists());
    }

    #[test]
    fn test_run_writes_default_config() {
        let dir = tempdir().unwrap();
        run(dir.path(), false, None).unwrap();

        let config = Config::load(&dir.path().join(TIMESHEET_DIR)).unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Reparent);
        assert!(config.roles[MANAGER_ROLE].is_empty());
    }

    #[test]
    fn test_run_grants_manager() {
        let dir = tempdir().unwrap();
        run(dir.path(), false, Some("boss")).unwrap();

        let config = Config::load(&dir.path().join(TIMESHEET_DIR)).unwrap();
        let table = config.role_table();
        assert!(table.has_role(&Principal::new("boss"), MANAGER_ROLE));
        assert!(!table.has_role(&Principal::new("user100"), MANAGER_ROLE));
    }

    #[test]
    fn test_run_already_initialized_no_force() {
        let dir = tempdir().unwrap();
        run(dir.path(), false, None).unwrap();

        let config_path = dir.path().join(".timesheet/config.json");
        fs::write(&config_path, r#"{ "delete_policy": "reject" }"#).unwrap();

        // Second init without force keeps the edited config
        assert!(run(dir.path(), false, None).is_ok());
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("reject"));
    }

    #[test]
    fn test_run_force_resets_config() {
        let dir = tempdir().unwrap();
        run(dir.path(), false, None).unwrap();

        let config_path = dir.path().join(".timesheet/config.json");
        fs::write(&config_path, r#"{ "delete_policy": "reject" }"#).unwrap();

        run(dir.path(), true, None).unwrap();
        let config = Config::load(&dir.path().join(TIMESHEET_DIR)).unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Reparent);
    }

    #[test]
    fn test_run_keeps_existing_data() {
        let dir = tempdir().unwrap();
        run(dir.path(), false, None).unwrap();

        let db_path = dir.path().join(".timesheet/timesheet.db");
        let db = Database::open(&db_path).unwrap();
        let id = db.create_department("Dev", None, None).unwrap();
        drop(db);

        run(dir.path(), true, None).unwrap();
        let db = Database::open(&db_path).unwrap();
        assert!(db.get_department(id).unwrap().is_some());
    }

    #[test]
    fn test_run_partial_init_dir_only() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".timesheet")).unwrap();

        assert!(run(dir.path(), false, None).is_ok());
        assert!(dir.path().join(".timesheet/config.json").exists());
    }

    #[test]
    fn test_embedded_config_parses() {
        let config: Config = serde_json::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Reparent);
    }
}
