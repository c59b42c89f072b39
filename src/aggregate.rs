//! Time aggregation over daily reports.
//!
//! Date windows are exclusive on both ends: a report dated exactly `start`
//! or `end` is left out.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::db::Database;
use crate::error::{Entity, Error, Result};
use crate::models::{EmployeeTimeSummary, ProjectTimeSummary, Report, Task, TaskHours};

/// Reports on the employee's tasks dated strictly between `start` and `end`.
pub fn reports_for_employee(
    db: &Database,
    employee_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Report>> {
    if start >= end {
        return Ok(Vec::new());
    }
    db.list_reports_for_employee(employee_id, Some((start, end)))
}

pub fn reports_for_employee_all(db: &Database, employee_id: i64) -> Result<Vec<Report>> {
    db.list_reports_for_employee(employee_id, None)
}

/// Hours per task of the project, in task creation order, plus the total.
pub fn project_time_summary(db: &Database, project_id: i64) -> Result<ProjectTimeSummary> {
    let project = db
        .get_project(project_id)?
        .ok_or_else(|| Error::not_found(Entity::Project, project_id))?;

    let tasks = db.list_tasks_for_project(project_id)?;
    let reports = db.list_reports_for_project(project_id)?;
    let (tasks, total) = sum_by_task(&tasks, &reports);

    Ok(ProjectTimeSummary {
        project_id,
        project_name: project.name,
        tasks,
        total,
    })
}

/// Hours per task for one employee within the exclusive `(start, end)` window.
/// Tasks without reports in the window are left out.
pub fn employee_time_summary(
    db: &Database,
    employee_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<EmployeeTimeSummary> {
    if db.get_employee(employee_id)?.is_none() {
        return Err(Error::not_found(Entity::Employee, employee_id));
    }

    let reports = reports_for_employee(db, employee_id, start, end)?;
    let tasks: Vec<Task> = db
        .list_tasks_for_employee(employee_id)?
        .into_iter()
        .filter(|t| reports.iter().any(|r| r.task_id == t.id))
        .collect();
    let (tasks, total) = sum_by_task(&tasks, &reports);

    Ok(EmployeeTimeSummary {
        employee_id,
        start,
        end,
        tasks,
        total,
    })
}

fn sum_by_task(tasks: &[Task], reports: &[Report]) -> (Vec<TaskHours>, u64) {
    let mut per_task: HashMap<i64, u64> = HashMap::new();
    for report in reports {
        *per_task.entry(report.task_id).or_insert(0) += u64::from(report.elapsed_hours);
    }

    let rows: Vec<TaskHours> = tasks
        .iter()
        .map(|task| TaskHours {
            task_id: task.id,
            task_name: task.task_name.clone(),
            hours: per_task.get(&task.id).copied().unwrap_or(0),
        })
        .collect();
    let total = rows.iter().map(|row| row.hours).sum();

    (rows, total)
}
