use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use crate::error::{Entity, Error, Result};
use crate::models::{
    Department, Employee, EmployeeFields, Project, ProjectFields, Report, Task, TaskFields,
};

const SCHEMA_VERSION: i32 = 1;

const DEPARTMENT_COLUMNS: &str = "id, name, description, parent_id";
const EMPLOYEE_COLUMNS: &str = "id, username, first_name, last_name, email, department_id";
const PROJECT_COLUMNS: &str = "id, name, description, start_date, end_date, resolved";
const TASK_COLUMNS: &str = "id, task_name, employee_id, project_id, description, resolved";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory store, used by tests and the fuzz harness.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap_or(0);

        if version < SCHEMA_VERSION {
            debug!(from = version, to = SCHEMA_VERSION, "migrating schema");
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS departments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    description TEXT,
                    parent_id INTEGER,
                    FOREIGN KEY (parent_id) REFERENCES departments(id) ON DELETE RESTRICT
                );

                -- Dates are day numbers (0001-01-01 is day 1)

                -- One row per account; username is the account identity
                CREATE TABLE IF NOT EXISTS employees (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    first_name TEXT NOT NULL DEFAULT '',
                    last_name TEXT NOT NULL DEFAULT '',
                    email TEXT NOT NULL DEFAULT '',
                    department_id INTEGER NOT NULL,
                    FOREIGN KEY (department_id) REFERENCES departments(id) ON DELETE RESTRICT
                );

                CREATE TABLE IF NOT EXISTS projects (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    start_date INTEGER NOT NULL,
                    end_date INTEGER NOT NULL,
                    resolved INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_name TEXT NOT NULL UNIQUE,
                    employee_id INTEGER NOT NULL,
                    project_id INTEGER NOT NULL,
                    description TEXT,
                    resolved INTEGER NOT NULL DEFAULT 0,
                    FOREIGN KEY (employee_id) REFERENCES employees(id) ON DELETE CASCADE,
                    FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
                );

                CREATE TABLE IF NOT EXISTS reports (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_id INTEGER NOT NULL,
                    date INTEGER NOT NULL,
                    elapsed_hours INTEGER NOT NULL CHECK (elapsed_hours > 0),
                    UNIQUE (task_id, date),
                    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
                );

                CREATE INDEX IF NOT EXISTS idx_departments_parent ON departments(parent_id);
                CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_employee ON tasks(employee_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
                CREATE INDEX IF NOT EXISTS idx_reports_date ON reports(date);
                "#,
            )?;

            self.conn
                .execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
        }

        self.conn.execute("PRAGMA foreign_keys = ON", [])?;

        Ok(())
    }

    // Departments
    pub fn create_department(
        &self,
        name: &str,
        description: Option<&str>,
        parent_id: Option<i64>,
    ) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO departments (name, description, parent_id) VALUES (?1, ?2, ?3)",
                params![name, description, parent_id],
            )
            .map_err(|e| unique_as_duplicate(e, Entity::Department, name))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_department(&self, id: i64) -> Result<Option<Department>> {
        let department = self
            .conn
            .query_row(
                &format!("SELECT {} FROM departments WHERE id = ?1", DEPARTMENT_COLUMNS),
                [id],
                department_from_row,
            )
            .optional()?;
        Ok(department)
    }

    pub fn find_department_by_name(&self, name: &str) -> Result<Option<Department>> {
        let department = self
            .conn
            .query_row(
                &format!("SELECT {} FROM departments WHERE name = ?1", DEPARTMENT_COLUMNS),
                [name],
                department_from_row,
            )
            .optional()?;
        Ok(department)
    }

    pub fn list_departments(&self) -> Result<Vec<Department>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM departments ORDER BY name, id",
            DEPARTMENT_COLUMNS
        ))?;
        let departments = stmt
            .query_map([], department_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(departments)
    }

    pub fn update_department(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        parent_id: Option<i64>,
    ) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE departments SET name = ?1, description = ?2, parent_id = ?3 WHERE id = ?4",
                params![name, description, parent_id, id],
            )
            .map_err(|e| unique_as_duplicate(e, Entity::Department, name))?;
        Ok(rows > 0)
    }

    pub fn department_child_count(&self, id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM departments WHERE parent_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn department_employee_count(&self, id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM employees WHERE department_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn delete_department(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM departments WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Moves the direct children of `id` under `new_parent` and deletes `id`
    /// in one transaction. Returns the ids of the moved children.
    pub fn delete_department_reparenting(
        &self,
        id: i64,
        new_parent: Option<i64>,
    ) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;

        let children = {
            let mut stmt =
                tx.prepare("SELECT id FROM departments WHERE parent_id = ?1 ORDER BY name, id")?;
            let ids = stmt
                .query_map([id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            ids
        };

        tx.execute(
            "UPDATE departments SET parent_id = ?1 WHERE parent_id = ?2",
            params![new_parent, id],
        )?;
        let rows = tx.execute("DELETE FROM departments WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(Error::not_found(Entity::Department, id));
        }

        tx.commit()?;
        debug!(department = id, moved = children.len(), "reparented children");
        Ok(children)
    }

    // Employees
    pub fn create_employee(&self, fields: &EmployeeFields<'_>) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO employees (username, first_name, last_name, email, department_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    fields.username,
                    fields.first_name,
                    fields.last_name,
                    fields.email,
                    fields.department_id
                ],
            )
            .map_err(|e| unique_as_duplicate(e, Entity::Employee, fields.username))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_employee(&self, id: i64) -> Result<Option<Employee>> {
        let employee = self
            .conn
            .query_row(
                &format!("SELECT {} FROM employees WHERE id = ?1", EMPLOYEE_COLUMNS),
                [id],
                employee_from_row,
            )
            .optional()?;
        Ok(employee)
    }

    pub fn find_employee_by_username(&self, username: &str) -> Result<Option<Employee>> {
        let employee = self
            .conn
            .query_row(
                &format!("SELECT {} FROM employees WHERE username = ?1", EMPLOYEE_COLUMNS),
                [username],
                employee_from_row,
            )
            .optional()?;
        Ok(employee)
    }

    pub fn list_employees(&self) -> Result<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM employees ORDER BY username",
            EMPLOYEE_COLUMNS
        ))?;
        let employees = stmt
            .query_map([], employee_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    pub fn list_employees_in_department(&self, department_id: i64) -> Result<Vec<Employee>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM employees WHERE department_id = ?1 ORDER BY username",
            EMPLOYEE_COLUMNS
        ))?;
        let employees = stmt
            .query_map([department_id], employee_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    pub fn update_employee(&self, id: i64, fields: &EmployeeFields<'_>) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE employees SET username = ?1, first_name = ?2, last_name = ?3, email = ?4, department_id = ?5 WHERE id = ?6",
                params![
                    fields.username,
                    fields.first_name,
                    fields.last_name,
                    fields.email,
                    fields.department_id,
                    id
                ],
            )
            .map_err(|e| unique_as_duplicate(e, Entity::Employee, fields.username))?;
        Ok(rows > 0)
    }

    pub fn delete_employee(&self, id: i64) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM employees WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    // Projects
    pub fn create_project(&self, fields: &ProjectFields<'_>) -> Result<i64> {
        check_date_range(fields)?;
        self.conn.execute(
            "INSERT INTO projects (name, description, start_date, end_date, resolved) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.name,
                fields.description,
                day_number(fields.start_date),
                day_number(fields.end_date),
                fields.resolved
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let project = self
            .conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                [id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn update_project(&self, id: i64, fields: &ProjectFields<'_>) -> Result<bool> {
        check_date_range(fields)?;
        let rows = self.conn.execute(
            "UPDATE projects SET name = ?1, description = ?2, start_date = ?3, end_date = ?4, resolved = ?5 WHERE id = ?6",
            params![
                fields.name,
                fields.description,
                day_number(fields.start_date),
                day_number(fields.end_date),
                fields.resolved,
                id
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    // Tasks
    pub fn create_task(&self, fields: &TaskFields<'_>) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO tasks (task_name, employee_id, project_id, description, resolved) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    fields.task_name,
                    fields.employee_id,
                    fields.project_id,
                    fields.description,
                    fields.resolved
                ],
            )
            .map_err(|e| unique_as_duplicate(e, Entity::Task, fields.task_name))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                [id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS))?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn list_tasks_for_project(&self, project_id: i64) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map([project_id], task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn list_tasks_for_employee(&self, employee_id: i64) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE employee_id = ?1 ORDER BY id",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map([employee_id], task_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn update_task(&self, id: i64, fields: &TaskFields<'_>) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE tasks SET task_name = ?1, employee_id = ?2, project_id = ?3, description = ?4, resolved = ?5 WHERE id = ?6",
                params![
                    fields.task_name,
                    fields.employee_id,
                    fields.project_id,
                    fields.description,
                    fields.resolved,
                    id
                ],
            )
            .map_err(|e| unique_as_duplicate(e, Entity::Task, fields.task_name))?;
        Ok(rows > 0)
    }

    // Reports
    pub fn create_report(&self, task_id: i64, date: NaiveDate, elapsed_hours: u32) -> Result<i64> {
        if elapsed_hours == 0 {
            return Err(Error::InvalidHours);
        }
        self.conn
            .execute(
                "INSERT INTO reports (task_id, date, elapsed_hours) VALUES (?1, ?2, ?3)",
                params![task_id, day_number(date), elapsed_hours],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::DuplicateReport {
                        task: task_id,
                        date,
                    }
                } else {
                    Error::Storage(e)
                }
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_reports_for_task(&self, task_id: i64) -> Result<Vec<Report>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, date, elapsed_hours FROM reports WHERE task_id = ?1 ORDER BY date",
        )?;
        let reports = stmt
            .query_map([task_id], report_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    pub fn list_reports_for_project(&self, project_id: i64) -> Result<Vec<Report>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.id, r.task_id, r.date, r.elapsed_hours
            FROM reports r
            JOIN tasks t ON r.task_id = t.id
            WHERE t.project_id = ?1
            ORDER BY r.task_id, r.date
            "#,
        )?;
        let reports = stmt
            .query_map([project_id], report_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    /// Reports on the employee's tasks, optionally limited to dates strictly
    /// inside `(start, end)`.
    pub fn list_reports_for_employee(
        &self,
        employee_id: i64,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Report>> {
        let mut sql = String::from(
            "SELECT r.id, r.task_id, r.date, r.elapsed_hours FROM reports r JOIN tasks t ON r.task_id = t.id WHERE t.employee_id = ?1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(employee_id)];

        if let Some((start, end)) = window {
            sql.push_str(" AND r.date > ?2 AND r.date < ?3");
            params_vec.push(Box::new(day_number(start)));
            params_vec.push(Box::new(day_number(end)));
        }

        sql.push_str(" ORDER BY r.date, r.task_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let reports = stmt
            .query_map(params_refs.as_slice(), report_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }
}

fn department_from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        department_id: row.get(5)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        start_date: date_column(row, 3)?,
        end_date: date_column(row, 4)?,
        resolved: row.get(5)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        task_name: row.get(1)?,
        employee_id: row.get(2)?,
        project_id: row.get(3)?,
        description: row.get(4)?,
        resolved: row.get(5)?,
    })
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        task_id: row.get(1)?,
        date: date_column(row, 2)?,
        elapsed_hours: row.get(3)?,
    })
}

fn day_number(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let days: i32 = row.get(idx)?;
    NaiveDate::from_num_days_from_ce_opt(days)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, i64::from(days)))
}

fn check_date_range(fields: &ProjectFields<'_>) -> Result<()> {
    if fields.start_date > fields.end_date {
        return Err(Error::InvalidDateRange {
            start: fields.start_date,
            end: fields.end_date,
        });
    }
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn unique_as_duplicate(err: rusqlite::Error, entity: Entity, name: &str) -> Error {
    if is_unique_violation(&err) {
        Error::DuplicateName {
            entity,
            name: name.to_string(),
        }
    } else {
        Error::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        (db, dir)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_task(db: &Database) -> i64 {
        let dep = db.create_department("Dev", None, None).unwrap();
        let emp = db
            .create_employee(&EmployeeFields {
                username: "alice",
                first_name: "Alice",
                last_name: "Smith",
                email: "alice@example.com",
                department_id: dep,
            })
            .unwrap();
        let prj = db
            .create_project(&ProjectFields {
                name: "Apollo",
                description: "",
                start_date: date(2024, 1, 1),
                end_date: date(2024, 12, 31),
                resolved: false,
            })
            .unwrap();
        db.create_task(&TaskFields {
            task_name: "Design",
            employee_id: emp,
            project_id: prj,
            description: None,
            resolved: false,
        })
        .unwrap()
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        {
            let db = Database::open(&db_path).unwrap();
            db.create_department("Dev", Some("Developers"), None).unwrap();
        }
        let db = Database::open(&db_path).unwrap();
        let dep = db.find_department_by_name("Dev").unwrap().unwrap();
        assert_eq!(dep.description.as_deref(), Some("Developers"));
    }

    #[test]
    fn test_department_name_unique() {
        let (db, _dir) = setup_test_db();
        db.create_department("Dev", None, None).unwrap();
        let err = db.create_department("Dev", None, None).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateName {
                entity: Entity::Department,
                ..
            }
        ));
    }

    #[test]
    fn test_department_parent_must_exist() {
        let (db, _dir) = setup_test_db();
        let err = db.create_department("Orphan", None, Some(999)).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_get_missing_department() {
        let (db, _dir) = setup_test_db();
        assert!(db.get_department(1).unwrap().is_none());
    }

    #[test]
    fn test_department_child_count() {
        let (db, _dir) = setup_test_db();
        let root = db.create_department("Root", None, None).unwrap();
        db.create_department("Zebra", None, Some(root)).unwrap();
        db.create_department("Apple", None, Some(root)).unwrap();
        assert_eq!(db.department_child_count(root).unwrap(), 2);
        assert_eq!(db.department_child_count(999).unwrap(), 0);
    }

    #[test]
    fn test_delete_department_with_children_is_restricted() {
        let (db, _dir) = setup_test_db();
        let root = db.create_department("Root", None, None).unwrap();
        db.create_department("Child", None, Some(root)).unwrap();
        assert!(db.delete_department(root).is_err());
        assert!(db.get_department(root).unwrap().is_some());
    }

    #[test]
    fn test_delete_department_reparenting() {
        let (db, _dir) = setup_test_db();
        let top = db.create_department("Top", None, None).unwrap();
        let mid = db.create_department("Mid", None, Some(top)).unwrap();
        let leaf = db.create_department("Leaf", None, Some(mid)).unwrap();

        let moved = db.delete_department_reparenting(mid, Some(top)).unwrap();
        assert_eq!(moved, vec![leaf]);
        assert!(db.get_department(mid).unwrap().is_none());
        assert_eq!(db.get_department(leaf).unwrap().unwrap().parent_id, Some(top));
    }

    #[test]
    fn test_delete_department_reparenting_missing_rolls_back() {
        let (db, _dir) = setup_test_db();
        let err = db.delete_department_reparenting(77, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_employee_username_unique() {
        let (db, _dir) = setup_test_db();
        let dep = db.create_department("Dev", None, None).unwrap();
        let fields = EmployeeFields {
            username: "bob",
            first_name: "",
            last_name: "",
            email: "",
            department_id: dep,
        };
        db.create_employee(&fields).unwrap();
        let err = db.create_employee(&fields).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateName {
                entity: Entity::Employee,
                ..
            }
        ));
        assert_eq!(db.department_employee_count(dep).unwrap(), 1);
    }

    #[test]
    fn test_report_task_date_unique() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        db.create_report(task, date(2024, 2, 1), 4).unwrap();
        let err = db.create_report(task, date(2024, 2, 1), 2).unwrap_err();
        assert!(matches!(err, Error::DuplicateReport { task: t, .. } if t == task));

        // Another day is fine
        db.create_report(task, date(2024, 2, 2), 2).unwrap();
        assert_eq!(db.list_reports_for_task(task).unwrap().len(), 2);
    }

    #[test]
    fn test_report_rejects_zero_hours() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        let err = db.create_report(task, date(2024, 2, 1), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidHours));
        assert!(db.list_reports_for_task(task).unwrap().is_empty());
    }

    #[test]
    fn test_report_date_roundtrip() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        db.create_report(task, date(2024, 2, 29), 8).unwrap();
        let reports = db.list_reports_for_task(task).unwrap();
        assert_eq!(reports[0].date, date(2024, 2, 29));
        assert_eq!(reports[0].elapsed_hours, 8);
    }

    #[test]
    fn test_project_rejects_inverted_dates() {
        let (db, _dir) = setup_test_db();
        let mut fields = ProjectFields {
            name: "Apollo",
            description: "",
            start_date: date(2024, 12, 31),
            end_date: date(2024, 1, 1),
            resolved: false,
        };
        let err = db.create_project(&fields).unwrap_err();
        assert!(matches!(err, Error::InvalidDateRange { .. }));
        assert!(db.list_projects().unwrap().is_empty());

        fields.start_date = date(2024, 1, 1);
        let id = db.create_project(&fields).unwrap();
        fields.end_date = date(2023, 6, 1);
        let err = db.update_project(id, &fields).unwrap_err();
        assert!(matches!(err, Error::InvalidDateRange { .. }));
        assert_eq!(db.get_project(id).unwrap().unwrap().end_date, date(2024, 1, 1));
    }

    #[test]
    fn test_dates_order_beyond_four_digit_years() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        db.create_report(task, date(2024, 5, 5), 2).unwrap();
        db.create_report(task, date(12000, 1, 1), 3).unwrap();
        let emp = db.find_employee_by_username("alice").unwrap().unwrap();

        let window = db
            .list_reports_for_employee(emp.id, Some((date(2024, 1, 1), date(10000, 1, 1))))
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].date, date(2024, 5, 5));

        let all = db.list_reports_for_employee(emp.id, None).unwrap();
        assert_eq!(all.last().unwrap().date, date(12000, 1, 1));
    }

    #[test]
    fn test_delete_employee_cascades_tasks_and_reports() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        db.create_report(task, date(2024, 2, 1), 3).unwrap();
        let emp = db.find_employee_by_username("alice").unwrap().unwrap();

        assert!(db.delete_employee(emp.id).unwrap());
        assert!(db.get_task(task).unwrap().is_none());
        assert!(db.list_reports_for_task(task).unwrap().is_empty());
    }

    #[test]
    fn test_delete_project_cascades_tasks() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        let project_id = db.get_task(task).unwrap().unwrap().project_id;
        assert!(db.delete_project(project_id).unwrap());
        assert!(db.get_task(task).unwrap().is_none());
    }

    #[test]
    fn test_task_name_unique() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        let existing = db.get_task(task).unwrap().unwrap();
        let err = db
            .create_task(&TaskFields {
                task_name: "Design",
                employee_id: existing.employee_id,
                project_id: existing.project_id,
                description: None,
                resolved: false,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateName {
                entity: Entity::Task,
                ..
            }
        ));
    }

    #[test]
    fn test_reports_for_employee_window_is_exclusive() {
        let (db, _dir) = setup_test_db();
        let task = seed_task(&db);
        db.create_report(task, date(2024, 3, 1), 1).unwrap();
        db.create_report(task, date(2024, 3, 2), 2).unwrap();
        db.create_report(task, date(2024, 3, 3), 3).unwrap();
        let emp = db.find_employee_by_username("alice").unwrap().unwrap();

        let inside = db
            .list_reports_for_employee(emp.id, Some((date(2024, 3, 1), date(2024, 3, 3))))
            .unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].date, date(2024, 3, 2));

        let all = db.list_reports_for_employee(emp.id, None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_sql_injection_in_department_name() {
        let (db, _dir) = setup_test_db();
        let malicious = "'; DROP TABLE departments; --";
        let id = db.create_department(malicious, None, None).unwrap();
        assert_eq!(db.get_department(id).unwrap().unwrap().name, malicious);
        assert_eq!(db.list_departments().unwrap().len(), 1);
    }
}
