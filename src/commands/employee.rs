use anyhow::{bail, Result};
use tracing::info;

use super::{truncate, Actor};
use timesheet::db::Database;
use timesheet::models::{Employee, EmployeeFields};
use timesheet::{Entity, Error};

fn require_department(db: &Database, id: i64) -> Result<String> {
    match db.get_department(id)? {
        Some(d) => Ok(d.name),
        None => Err(Error::not_found(Entity::Department, id).into()),
    }
}

fn require_employee(db: &Database, id: i64) -> Result<Employee> {
    match db.get_employee(id)? {
        Some(e) => Ok(e),
        None => Err(Error::not_found(Entity::Employee, id).into()),
    }
}

pub fn add(
    db: &Database,
    actor: &Actor<'_>,
    fields: &EmployeeFields<'_>,
) -> Result<()> {
    actor.require_manager()?;
    if fields.username.trim().is_empty() {
        bail!("Username must not be empty");
    }
    require_department(db, fields.department_id)?;

    let id = db.create_employee(fields)?;
    info!(user = %actor.principal.username, employee = id, "created employee");
    println!("Created employee #{} {}", id, fields.username);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    db: &Database,
    actor: &Actor<'_>,
    id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
    department_id: Option<i64>,
) -> Result<()> {
    actor.require_manager()?;
    if username.is_none()
        && first_name.is_none()
        && last_name.is_none()
        && email.is_none()
        && department_id.is_none()
    {
        bail!(
            "Nothing to update. Use --username, --first-name, --last-name, --email, or --department"
        );
    }
    if username.is_some_and(|u| u.trim().is_empty()) {
        bail!("Username must not be empty");
    }

    let current = require_employee(db, id)?;
    let department_id = department_id.unwrap_or(current.department_id);
    require_department(db, department_id)?;

    let fields = EmployeeFields {
        username: username.unwrap_or(&current.username),
        first_name: first_name.unwrap_or(&current.first_name),
        last_name: last_name.unwrap_or(&current.last_name),
        email: email.unwrap_or(&current.email),
        department_id,
    };
    db.update_employee(id, &fields)?;
    info!(user = %actor.principal.username, employee = id, "updated employee");
    println!("Updated employee #{}", id);
    Ok(())
}

/// Removes the account together with its tasks and reports.
pub fn delete(db: &Database, actor: &Actor<'_>, id: i64) -> Result<()> {
    actor.require_manager()?;
    let employee = require_employee(db, id)?;

    if !db.delete_employee(id)? {
        bail!("Failed to delete employee #{}", id);
    }
    info!(user = %actor.principal.username, employee = id, "deleted employee");
    println!("Deleted employee #{} {}", id, employee.username);
    Ok(())
}

pub fn list(db: &Database) -> Result<()> {
    let employees = db.list_employees()?;

    if employees.is_empty() {
        println!("No employees found.");
        return Ok(());
    }

    for employee in employees {
        let department = db
            .get_department(employee.department_id)?
            .map(|d| d.name)
            .unwrap_or_else(|| "(none)".to_string());
        println!(
            "#{:<4} {:<16} {:<30} {}",
            employee.id,
            truncate(&employee.username, 16),
            truncate(&employee.full_name(), 30),
            department
        );
    }

    Ok(())
}

/// Shows, and optionally edits, the acting principal's own record. The
/// department is read-only here.
pub fn profile(
    db: &Database,
    actor: &Actor<'_>,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    let mut employee = match db.find_employee_by_username(&actor.principal.username)? {
        Some(e) => e,
        None => bail!("No employee record for '{}'", actor.principal.username),
    };

    if first_name.is_some() || last_name.is_some() || email.is_some() {
        let fields = EmployeeFields {
            username: &employee.username,
            first_name: first_name.unwrap_or(&employee.first_name),
            last_name: last_name.unwrap_or(&employee.last_name),
            email: email.unwrap_or(&employee.email),
            department_id: employee.department_id,
        };
        db.update_employee(employee.id, &fields)?;
        info!(user = %actor.principal.username, "updated own profile");
        employee = require_employee(db, employee.id)?;
    }

    let department = require_department(db, employee.department_id)?;
    println!("Username:   {}", employee.username);
    println!("First name: {}", employee.first_name);
    println!("Last name:  {}", employee.last_name);
    println!("Email:      {}", employee.email);
    println!("Department: {}", department);
    if actor.is_manager() {
        println!("Role:       manager");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{roles, setup_test_db};
    use timesheet::policy::Principal;

    fn fields(username: &str, department_id: i64) -> EmployeeFields<'_> {
        EmployeeFields {
            username,
            first_name: "",
            last_name: "",
            email: "",
            department_id,
        }
    }

    #[test]
    fn test_add_employee() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();

        add(&db, &actor, &fields("user100", dev)).unwrap();
        let employee = db.find_employee_by_username("user100").unwrap().unwrap();
        assert_eq!(employee.department_id, dev);
    }

    #[test]
    fn test_add_requires_manager() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("user100"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();

        assert!(add(&db, &actor, &fields("someone", dev)).is_err());
        assert!(db.list_employees().unwrap().is_empty());
    }

    #[test]
    fn test_add_unknown_department() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let err = add(&db, &actor, &fields("user100", 77)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_add_duplicate_username() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        add(&db, &actor, &fields("user100", dev)).unwrap();
        let err = add(&db, &actor, &fields("user100", dev)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_edit_moves_department() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        let qa = db.create_department("QA", None, None).unwrap();
        let id = db.create_employee(&fields("user100", dev)).unwrap();

        edit(&db, &actor, id, None, Some("John"), None, None, Some(qa)).unwrap();
        let employee = db.get_employee(id).unwrap().unwrap();
        assert_eq!(employee.first_name, "John");
        assert_eq!(employee.username, "user100");
        assert_eq!(employee.department_id, qa);
    }

    #[test]
    fn test_edit_renames_username() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        let id = db.create_employee(&fields("user100", dev)).unwrap();

        edit(&db, &actor, id, Some("user200"), None, None, None, None).unwrap();
        assert!(db.find_employee_by_username("user100").unwrap().is_none());
        let employee = db.find_employee_by_username("user200").unwrap().unwrap();
        assert_eq!(employee.id, id);
        assert_eq!(employee.department_id, dev);
    }

    #[test]
    fn test_edit_username_clash_fails() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        let id = db.create_employee(&fields("user100", dev)).unwrap();
        db.create_employee(&fields("user200", dev)).unwrap();

        let err = edit(&db, &actor, id, Some("user200"), None, None, None, None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let err = edit(&db, &actor, id, Some("  "), None, None, None, None).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
        assert_eq!(db.get_employee(id).unwrap().unwrap().username, "user100");
    }

    #[test]
    fn test_edit_nothing_fails() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        let id = db.create_employee(&fields("user100", dev)).unwrap();

        let err = edit(&db, &actor, id, None, None, None, None, None).unwrap_err();
        assert!(err.to_string().contains("Nothing to update"));
    }

    #[test]
    fn test_delete_employee() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("boss"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        let id = db.create_employee(&fields("user100", dev)).unwrap();

        delete(&db, &actor, id).unwrap();
        assert!(db.get_employee(id).unwrap().is_none());
        assert!(delete(&db, &actor, id).is_err());
    }

    #[test]
    fn test_list() {
        let (db, _dir) = setup_test_db();
        assert!(list(&db).is_ok());
        let dev = db.create_department("Dev", None, None).unwrap();
        db.create_employee(&fields("user100", dev)).unwrap();
        assert!(list(&db).is_ok());
    }

    #[test]
    fn test_profile_edits_own_fields() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("user100"), &roles);
        let dev = db.create_department("Dev", None, None).unwrap();
        let id = db.create_employee(&fields("user100", dev)).unwrap();

        profile(&db, &actor, Some("John"), Some("Smith"), Some("aaa@bbb.cc")).unwrap();

        let employee = db.get_employee(id).unwrap().unwrap();
        assert_eq!(employee.full_name(), "John Smith");
        assert_eq!(employee.email, "aaa@bbb.cc");
        assert_eq!(employee.department_id, dev);
    }

    #[test]
    fn test_profile_without_employee_fails() {
        let (db, _dir) = setup_test_db();
        let roles = roles();
        let actor = Actor::new(Principal::new("ghost"), &roles);
        let err = profile(&db, &actor, None, None, None).unwrap_err();
        assert!(err.to_string().contains("No employee record"));
    }
}
