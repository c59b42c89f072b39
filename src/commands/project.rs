use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::io::{self, Write};
use tracing::info;

use super::{truncate, Actor};
use timesheet::aggregate;
use timesheet::db::Database;
use timesheet::models::{Project, ProjectFields, ProjectTimeSummary};
use timesheet::{Entity, Error};

fn require_project(db: &Database, id: i64) -> Result<Project> {
    match db.get_project(id)? {
        Some(p) => Ok(p),
        None => Err(Error::not_found(Entity::Project, id).into()),
    }
}

fn check_name(fields: &ProjectFields<'_>) -> Result<()> {
    if fields.name.trim().is_empty() {
        return Err(Error::EmptyName {
            entity: Entity::Project,
        }
        .into());
    }
    Ok(())
}

pub fn add(db: &Database, actor: &Actor<'_>, fields: &ProjectFields<'_>) -> Result<()> {
    actor.require_manager()?;
    check_name(fields)?;

    let id = db.create_project(fields)?;
    info!(user = %actor.principal.username, project = id, "created project");
    println!("Created project #{} {}", id, fields.name);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    db: &Database,
    actor: &Actor<'_>,
    id: i64,
    name: Option<&str>,
    description: Option<&str>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    resolved: Option<bool>,
) -> Result<()> {
    actor.require_manager()?;
    if name.is_none()
        && description.is_none()
        && start_date.is_none()
        && end_date.is_none()
        && resolved.is_none()
    {
        bail!("Nothing to update. Use --name, --description, --start, --end, or --resolved");
    }

    let current = require_project(db, id)?;
    let fields = ProjectFields {
        name: name.unwrap_or(&current.name),
        description: description.unwrap_or(&current.description),
        start_date: start_date.unwrap_or(current.start_date),
        end_date: end_date.unwrap_or(current.end_date),
        resolved: resolved.unwrap_or(current.resolved),
    };
    check_name(&fields)?;

    db.update_project(id, &fields)?;
    info!(user = %actor.principal.username, project = id, "updated project");
    println!("Updated project #{}", id);
    Ok(())
}

/// Deleting a project removes its tasks and their reports.
pub fn delete(db: &Database, actor: &Actor<'_>, id: i64) -> Result<()> {
    actor.require_manager()?;
    let project = require_project(db, id)?;

    if !db.delete_project(id)? {
        bail!("Failed to delete project #{}", id);
    }
    info!(user = %actor.principal.username, project = id, "deleted project");
    println!("Deleted project #{} {}", id, project.name);
    Ok(())
}

pub fn list(db: &Database) -> Result<()> {
    let projects = db.list_projects()?;

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    for project in projects {
        let marker = if project.resolved { "x" } else { " " };
        println!(
            "#{:<4} [{}] {:<40} {} .. {}",
            project.id,
            marker,
            truncate(&project.name, 40),
            project.start_date,
            project.end_date
        );
    }
    Ok(())
}

pub fn show(db: &Database, id: i64) -> Result<()> {
    let project = require_project(db, id)?;

    println!("Project #{}: {}", project.id, project.name);
    println!("Period: {} .. {}", project.start_date, project.end_date);
    println!("Resolved: {}", if project.resolved { "yes" } else { "no" });

    if !project.description.is_empty() {
        println!("\nDescription:");
        for line in project.description.lines() {
            println!("  {}", line);
        }
    }

    let tasks = db.list_tasks_for_project(id)?;
    if !tasks.is_empty() {
        println!("\nTasks:");
        for task in tasks {
            let marker = if task.resolved { "x" } else { " " };
            println!("  #{:<4} [{}] {}", task.id, marker, task.task_name);
        }
    }
    Ok(())
}

/// Hours logged per task of the project.
pub fn report(db: &Database, actor: &Actor<'_>, id: i64, json: bool) -> Result<()> {
    actor.require_manager()?;
    let summary = aggregate::project_time_summary(db, id)?;

    let mut stdout = io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        write_summary(&mut stdout, &summary)?;
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, summary: &ProjectTimeSummary) -> Result<()> {
    writeln!(out, "Project #{}: {}", summary.project_id, summary.project_name)?;
    if summary.tasks.is_empty() {
        writeln!(out, "No tasks.")?;
    }
    for task in &summary.tasks {
        writeln!(out, "  {:<40} {:>6}h", truncate(&task.task_name, 40), task.hours)?;
    }
    writeln!(out, "  {:<40} {:>6}h", "Total", summary.total)?;
    Ok(())
}
