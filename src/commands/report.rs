use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::io::{self, Write};
use tracing::info;

use super::Actor;
use timesheet::aggregate;
use timesheet::db::Database;
use timesheet::models::{Employee, EmployeeTimeSummary, Report};
use timesheet::{Entity, Error};

fn own_employee(db: &Database, actor: &Actor<'_>) -> Result<Employee> {
    match db.find_employee_by_username(&actor.principal.username)? {
        Some(e) => Ok(e),
        None => bail!("No employee record for '{}'", actor.principal.username),
    }
}

/// Logs hours against one of the acting principal's own tasks.
pub fn add(db: &Database, actor: &Actor<'_>, task_id: i64, date: NaiveDate, hours: u32) -> Result<()> {
    actor.require_manager()?;

    let employee = own_employee(db, actor)?;
    let task = match db.get_task(task_id)? {
        Some(t) => t,
        None => return Err(Error::not_found(Entity::Task, task_id).into()),
    };
    if task.employee_id != employee.id {
        bail!(
            "Task #{} is not assigned to '{}'",
            task_id,
            actor.principal.username
        );
    }

    let id = db.create_report(task_id, date, hours)?;
    info!(user = %actor.principal.username, report = id, task = task_id, %date, hours, "logged hours");
    println!("Logged {}h on task #{} for {}", hours, task_id, date);
    Ok(())
}

/// Every report the acting principal has filed.
pub fn mine(db: &Database, actor: &Actor<'_>) -> Result<()> {
    let employee = own_employee(db, actor)?;
    let reports = aggregate::reports_for_employee_all(db, employee.id)?;

    let mut stdout = io::stdout().lock();
    write_reports(db, &mut stdout, &reports)?;
    Ok(())
}

/// Per-task hours for an employee between `from` and `to`, both exclusive.
pub fn stats(
    db: &Database,
    actor: &Actor<'_>,
    employee_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    json: bool,
) -> Result<()> {
    actor.require_manager()?;
    let summary = aggregate::employee_time_summary(db, employee_id, from, to)?;

    let mut stdout = io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    let reports = aggregate::reports_for_employee(db, employee_id, from, to)?;
    write_reports(db, &mut stdout, &reports)?;
    if !reports.is_empty() {
        writeln!(stdout)?;
    }
    write_summary(&mut stdout, &summary)?;
    Ok(())
}

fn write_reports(db: &Database, out: &mut impl Write, reports: &[Report]) -> Result<()> {
    if reports.is_empty() {
        writeln!(out, "No reports found.")?;
        return Ok(());
    }
    for report in reports {
        let task = db
            .get_task(report.task_id)?
            .map(|t| t.task_name)
            .unwrap_or_else(|| format!("#{}", report.task_id));
        writeln!(out, "{}  {:>3}h  {}", report.date, report.elapsed_hours, task)?;
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, summary: &EmployeeTimeSummary) -> Result<()> {
    writeln!(
        out,
        "Employee #{} between {} and {}",
        summary.employee_id, summary.start, summary.end
    )?;
    for task in &summary.tasks {
        writeln!(out, "  {:<40} {:>6}h", task.task_name, task.hours)?;
    }
    writeln!(out, "  {:<40} {:>6}h", "Total", summary.total)?;
    Ok(())
}
