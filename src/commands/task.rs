use anyhow::{bail, Result};
use tracing::info;

use super::{truncate, Actor};
use timesheet::db::Database;
use timesheet::models::{Task, TaskFields};
use timesheet::{Entity, Error};

fn check_refs(db: &Database, fields: &TaskFields<'_>) -> Result<()> {
    if fields.task_name.trim().is_empty() {
        return Err(Error::EmptyName {
            entity: Entity::Task,
        }
        .into());
    }
    if db.get_employee(fields.employee_id)?.is_none() {
        return Err(Error::not_found(Entity::Employee, fields.employee_id).into());
    }
    if db.get_project(fields.project_id)?.is_none() {
        return Err(Error::not_found(Entity::Project, fields.project_id).into());
    }
    Ok(())
}

fn require_task(db: &Database, id: i64) -> Result<Task> {
    match db.get_task(id)? {
        Some(t) => Ok(t),
        None => Err(Error::not_found(Entity::Task, id).into()),
    }
}

pub fn add(db: &Database, actor: &Actor<'_>, fields: &TaskFields<'_>) -> Result<()> {
    actor.require_manager()?;
    check_refs(db, fields)?;

    let id = db.create_task(fields)?;
    info!(
        user = %actor.principal.username,
        task = id,
        employee = fields.employee_id,
        project = fields.project_id,
        "created task"
    );
    println!("Created task #{} {}", id, fields.task_name);
    Ok(())
}

/// Partial update of a task. `clear_description` drops the description.
#[allow(clippy::too_many_arguments)]
pub fn edit(
    db: &Database,
    actor: &Actor<'_>,
    id: i64,
    task_name: Option<&str>,
    description: Option<&str>,
    clear_description: bool,
    employee_id: Option<i64>,
    project_id: Option<i64>,
    resolved: Option<bool>,
) -> Result<()> {
    actor.require_manager()?;
    if task_name.is_none()
        && description.is_none()
        && !clear_description
        && employee_id.is_none()
        && project_id.is_none()
        && resolved.is_none()
    {
        bail!("Nothing to update. Use --name, --description, --employee, --project, or --resolved");
    }

    let current = require_task(db, id)?;
    let description = if clear_description {
        None
    } else {
        description.or(current.description.as_deref())
    };
    let fields = TaskFields {
        task_name: task_name.unwrap_or(&current.task_name),
        employee_id: employee_id.unwrap_or(current.employee_id),
        project_id: project_id.unwrap_or(current.project_id),
        description,
        resolved: resolved.unwrap_or(current.resolved),
    };
    check_refs(db, &fields)?;

    db.update_task(id, &fields)?;
    info!(user = %actor.principal.username, task = id, "updated task");
    println!("Updated task #{}", id);
    Ok(())
}

/// Lists tasks, optionally narrowed to one project or one employee.
pub fn list(db: &Database, project_id: Option<i64>, employee_id: Option<i64>) -> Result<()> {
    let tasks: Vec<Task> = match (project_id, employee_id) {
        (Some(p), Some(e)) => db
            .list_tasks_for_project(p)?
            .into_iter()
            .filter(|t| t.employee_id == e)
            .collect(),
        (Some(p), None) => db.list_tasks_for_project(p)?,
        (None, Some(e)) => db.list_tasks_for_employee(e)?,
        (None, None) => db.list_tasks()?,
    };

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for task in tasks {
        let marker = if task.resolved { "x" } else { " " };
        let owner = db
            .get_employee(task.employee_id)?
            .map(|e| e.username)
            .unwrap_or_else(|| "?".to_string());
        let hours: u64 = db
            .list_reports_for_task(task.id)?
            .iter()
            .map(|r| u64::from(r.elapsed_hours))
            .sum();
        println!(
            "#{:<4} [{}] {:<40} project #{:<4} {:<16} {:>5}h",
            task.id,
            marker,
            truncate(&task.task_name, 40),
            task.project_id,
            owner,
            hours
        );
    }
    Ok(())
}
