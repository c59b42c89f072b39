use anyhow::Result;
use tracing::info;

use super::{truncate, Actor};
use timesheet::db::Database;
use timesheet::tree::{DeletePolicy, DepartmentTree};

pub fn add(
    db: &Database,
    actor: &Actor<'_>,
    name: &str,
    description: Option<&str>,
    parent: Option<i64>,
) -> Result<()> {
    actor.require_manager()?;
    let tree = DepartmentTree::new(db, DeletePolicy::default());
    let department = tree.create(name, description, parent)?;

    info!(user = %actor.principal.username, department = department.id, "created department");
    match parent {
        Some(parent_id) => println!(
            "Created department #{} {} under #{}",
            department.id, department.name, parent_id
        ),
        None => println!("Created department #{} {}", department.id, department.name),
    }
    Ok(())
}

/// Unset fields keep their current value; `to_root` clears the parent and
/// `clear_description` drops the description.
#[allow(clippy::too_many_arguments)]
pub fn edit(
    db: &Database,
    actor: &Actor<'_>,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
    clear_description: bool,
    parent: Option<i64>,
    to_root: bool,
) -> Result<()> {
    actor.require_manager()?;
    let tree = DepartmentTree::new(db, DeletePolicy::default());
    let current = tree.get(id)?;

    let name = name.unwrap_or(&current.name);
    let description = if clear_description {
        None
    } else {
        description.or(current.description.as_deref())
    };
    let parent = if to_root {
        None
    } else {
        parent.or(current.parent_id)
    };

    let updated = tree.update(id, name, description, parent)?;
    info!(user = %actor.principal.username, department = id, parent = ?updated.parent_id, "updated department");
    println!("Updated department #{}", id);
    Ok(())
}

pub fn delete(db: &Database, actor: &Actor<'_>, policy: DeletePolicy, id: i64) -> Result<()> {
    actor.require_manager()?;
    let tree = DepartmentTree::new(db, policy);
    let outcome = tree.delete(id)?;

    info!(
        user = %actor.principal.username,
        department = id,
        reparented = outcome.reparented.len(),
        "deleted department"
    );
    println!("Deleted department #{} {}", id, outcome.removed.name);
    if !outcome.reparented.is_empty() {
        let target = match outcome.removed.parent_id {
            Some(parent) => format!("#{}", parent),
            None => "the top level".to_string(),
        };
        let moved: Vec<String> = outcome
            .reparented
            .iter()
            .map(|c| format!("#{}", c))
            .collect();
        println!("Moved {} to {}", moved.join(", "), target);
    }
    Ok(())
}

pub fn list(db: &Database) -> Result<()> {
    let tree = DepartmentTree::new(db, DeletePolicy::default());
    let forest = tree.list_ordered()?;

    if forest.is_empty() {
        println!("No departments found.");
        return Ok(());
    }

    for entry in &forest {
        let department = entry.department;
        let employees = db.list_employees_in_department(department.id)?;
        let prefix = "  ".repeat(entry.depth);
        if employees.is_empty() {
            println!("{}#{} {}", prefix, department.id, department.name);
        } else {
            let usernames: Vec<&str> = employees.iter().map(|e| e.username.as_str()).collect();
            println!(
                "{}#{} {} ({})",
                prefix,
                department.id,
                department.name,
                usernames.join(", ")
            );
        }
    }

    Ok(())
}

pub fn show(db: &Database, id: i64) -> Result<()> {
    let tree = DepartmentTree::new(db, DeletePolicy::default());
    let forest = tree.list_ordered()?;
    let department = tree.get(id)?;

    println!("Department #{}: {}", department.id, department.name);
    let mut path: Vec<&str> = forest.ancestors(id).map(|d| d.name.as_str()).collect();
    path.reverse();
    if path.is_empty() {
        println!("Parent: (none)");
    } else {
        println!("Parent: {}", path.join(" / "));
    }

    if let Some(desc) = &department.description {
        if !desc.is_empty() {
            println!("\nDescription:");
            for line in desc.lines() {
                println!("  {}", line);
            }
        }
    }

    let children: Vec<String> = forest
        .children(id)
        .map(|d| format!("#{} {}", d.id, d.name))
        .collect();
    if !children.is_empty() {
        println!("\nSubdepartments:");
        for child in children {
            println!("  {}", child);
        }
    }

    let employees = db.list_employees_in_department(id)?;
    if !employees.is_empty() {
        println!("\nEmployees:");
        for employee in employees {
            println!("  #{:<4} {:<16} {}", employee.id, employee.username, employee.full_name());
        }
    }

    Ok(())
}

/// Departments that `excluding` could be moved under.
pub fn candidates(db: &Database, excluding: Option<i64>) -> Result<()> {
    let tree = DepartmentTree::new(db, DeletePolicy::default());
    if let Some(id) = excluding {
        tree.get(id)?;
    }
    let candidates = tree.candidates_for_parent(excluding)?;

    if candidates.is_empty() {
        println!("No candidate parents.");
        return Ok(());
    }

    for department in candidates {
        println!("#{:<4} {}", department.id, truncate(&department.name, 60));
    }
    Ok(())
}
