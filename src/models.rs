use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: i64,
}

impl Employee {
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub task_name: String,
    pub employee_id: i64,
    pub project_id: i64,
    pub description: Option<String>,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub task_id: i64,
    pub date: NaiveDate,
    pub elapsed_hours: u32,
}

/// Field values for creating or replacing a project.
#[derive(Debug, Clone)]
pub struct ProjectFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub resolved: bool,
}

/// Field values for creating or replacing a task.
#[derive(Debug, Clone)]
pub struct TaskFields<'a> {
    pub task_name: &'a str,
    pub employee_id: i64,
    pub project_id: i64,
    pub description: Option<&'a str>,
    pub resolved: bool,
}

/// Field values for creating or replacing an employee.
#[derive(Debug, Clone)]
pub struct EmployeeFields<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub department_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHours {
    pub task_id: i64,
    pub task_name: String,
    pub hours: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTimeSummary {
    pub project_id: i64,
    pub project_name: String,
    pub tasks: Vec<TaskHours>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeTimeSummary {
    pub employee_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub tasks: Vec<TaskHours>,
    pub total: u64,
}
