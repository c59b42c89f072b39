use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Department,
    Employee,
    Project,
    Task,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Department => "Department",
            Entity::Employee => "Employee",
            Entity::Project => "Project",
            Entity::Task => "Task",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} #{id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("{entity} '{name}' already exists")]
    DuplicateName { entity: Entity, name: String },

    #[error("Department #{id} cannot be moved under #{parent}: that would create a cycle")]
    Cycle { id: i64, parent: i64 },

    #[error("Department #{id} still has {children} child department(s)")]
    HasChildren { id: i64, children: usize },

    #[error("Department #{id} still has {employees} employee(s)")]
    HasEmployees { id: i64, employees: usize },

    #[error("Task #{task} already has a report for {date}")]
    DuplicateReport { task: i64, date: NaiveDate },

    #[error("{entity} name must not be empty")]
    EmptyName { entity: Entity },

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Elapsed hours must be at least 1")]
    InvalidHours,

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Error::NotFound { entity, id }
    }

    /// True for errors the caller should surface as "no such record".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
