mod commands;
mod config;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;

use commands::init::{DB_FILE, TIMESHEET_DIR};
use commands::Actor;
use config::Config;
use timesheet::db::Database;
use timesheet::models::{EmployeeFields, ProjectFields, TaskFields};
use timesheet::policy::{Principal, RoleTable};

#[derive(Parser)]
#[command(name = "timesheet")]
#[command(about = "Department tree and project time tracking")]
#[command(version)]
struct Cli {
    /// Acting username
    #[arg(short, long, global = true, env = "TIMESHEET_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a timesheet in the current directory
    Init {
        /// Reset config.json to the defaults
        #[arg(short, long)]
        force: bool,
        /// Grant this username the manager role
        #[arg(long)]
        manager: Option<String>,
    },

    /// Department tree
    Dept {
        #[command(subcommand)]
        action: DeptCommands,
    },

    /// Employee accounts
    Employee {
        #[command(subcommand)]
        action: EmployeeCommands,
    },

    /// Show or edit your own employee record
    Profile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Projects
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },

    /// Tasks within projects
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },

    /// Daily hour reports
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },
}

#[derive(Subcommand)]
enum DeptCommands {
    /// Create a department
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Parent department ID
        #[arg(short, long)]
        parent: Option<i64>,
    },
    /// Rename, redescribe, or move a department
    Edit {
        id: i64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        /// New parent department ID
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<i64>,
        /// Move to the top level
        #[arg(long)]
        root: bool,
    },
    /// Delete a department
    Delete { id: i64 },
    /// Show the department tree
    List,
    /// List departments a department could be moved under
    Candidates {
        /// Department being moved
        id: Option<i64>,
    },
    /// Show department details
    Show { id: i64 },
}

#[derive(Subcommand)]
enum EmployeeCommands {
    /// Create an employee account
    Add {
        username: String,
        /// Department ID
        #[arg(short, long)]
        department: i64,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Edit an employee account
    Edit {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(short, long)]
        department: Option<i64>,
    },
    /// Delete an employee with their tasks and reports
    Delete { id: i64 },
    /// List employees
    List,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a project
    Add {
        name: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Edit a project
    Edit {
        id: i64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        resolved: Option<bool>,
    },
    /// Delete a project with its tasks and reports
    Delete { id: i64 },
    /// List projects
    List,
    /// Show project details
    Show { id: i64 },
    /// Hours per task
    Report {
        id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Create a task
    Add {
        name: String,
        /// Project ID
        #[arg(short, long)]
        project: i64,
        /// Assigned employee ID
        #[arg(short, long)]
        employee: i64,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit a task
    Edit {
        id: i64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(short, long)]
        employee: Option<i64>,
        #[arg(short, long)]
        project: Option<i64>,
        #[arg(long)]
        resolved: Option<bool>,
    },
    /// List tasks
    List {
        #[arg(short, long)]
        project: Option<i64>,
        #[arg(short, long)]
        employee: Option<i64>,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Log hours on one of your tasks
    Add {
        task: i64,
        /// Day worked (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
        #[arg(long)]
        hours: u32,
    },
    /// List your reports
    Mine,
    /// Hours per task for an employee between two dates, both exclusive
    Stats {
        employee: i64,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long)]
        json: bool,
    },
}

/// Log filter from `TIMESHEET_LOG` (default `warn`), JSON output when
/// `TIMESHEET_LOG_FORMAT=json`. Logs go to stderr so stdout stays parseable.
fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TIMESHEET_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))
        .context("Failed to create log filter")?;

    let json = env::var("TIMESHEET_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
    Ok(())
}

fn find_timesheet_dir() -> Result<PathBuf> {
    let mut current = env::current_dir()?;

    loop {
        let candidate = current.join(TIMESHEET_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a timesheet directory (or any parent). Run 'timesheet init' first.");
        }
    }
}

struct Workspace {
    db: Database,
    config: Config,
    roles: RoleTable,
}

fn open_workspace() -> Result<Workspace> {
    let dir = find_timesheet_dir()?;
    let db = Database::open(&dir.join(DB_FILE)).context("Failed to open database")?;
    let config = Config::load(&dir)?;
    let roles = config.role_table();
    Ok(Workspace { db, config, roles })
}

fn principal(user: Option<&str>) -> Result<Principal> {
    match user.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(Principal::new(name)),
        _ => bail!("No user given. Pass --user or set TIMESHEET_USER."),
    }
}

fn actor<'a>(user: Option<&str>, roles: &'a RoleTable) -> Result<Actor<'a>> {
    Ok(Actor::new(principal(user)?, roles))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    if let Commands::Init { force, manager } = &cli.command {
        let cwd = env::current_dir()?;
        return commands::init::run(&cwd, *force, manager.as_deref());
    }

    let ws = open_workspace()?;
    let db = &ws.db;
    let user = cli.user.as_deref();
    let acting = || actor(user, &ws.roles);

    match cli.command {
        Commands::Init { .. } => Ok(()),

        Commands::Dept { action } => match action {
            DeptCommands::Add {
                name,
                description,
                parent,
            } => commands::department::add(db, &acting()?, &name, description.as_deref(), parent),
            DeptCommands::Edit {
                id,
                name,
                description,
                clear_description,
                parent,
                root,
            } => commands::department::edit(
                db,
                &acting()?,
                id,
                name.as_deref(),
                description.as_deref(),
                clear_description,
                parent,
                root,
            ),
            DeptCommands::Delete { id } => {
                commands::department::delete(db, &acting()?, ws.config.delete_policy, id)
            }
            DeptCommands::List => commands::department::list(db),
            DeptCommands::Candidates { id } => commands::department::candidates(db, id),
            DeptCommands::Show { id } => commands::department::show(db, id),
        },

        Commands::Employee { action } => match action {
            EmployeeCommands::Add {
                username,
                department,
                first_name,
                last_name,
                email,
            } => commands::employee::add(
                db,
                &acting()?,
                &EmployeeFields {
                    username: &username,
                    first_name: &first_name,
                    last_name: &last_name,
                    email: &email,
                    department_id: department,
                },
            ),
            EmployeeCommands::Edit {
                id,
                username,
                first_name,
                last_name,
                email,
                department,
            } => commands::employee::edit(
                db,
                &acting()?,
                id,
                username.as_deref(),
                first_name.as_deref(),
                last_name.as_deref(),
                email.as_deref(),
                department,
            ),
            EmployeeCommands::Delete { id } => commands::employee::delete(db, &acting()?, id),
            EmployeeCommands::List => commands::employee::list(db),
        },

        Commands::Profile {
            first_name,
            last_name,
            email,
        } => commands::employee::profile(
            db,
            &acting()?,
            first_name.as_deref(),
            last_name.as_deref(),
            email.as_deref(),
        ),

        Commands::Project { action } => match action {
            ProjectCommands::Add {
                name,
                start,
                end,
                description,
            } => commands::project::add(
                db,
                &acting()?,
                &ProjectFields {
                    name: &name,
                    description: &description,
                    start_date: start,
                    end_date: end,
                    resolved: false,
                },
            ),
            ProjectCommands::Edit {
                id,
                name,
                description,
                start,
                end,
                resolved,
            } => commands::project::edit(
                db,
                &acting()?,
                id,
                name.as_deref(),
                description.as_deref(),
                start,
                end,
                resolved,
            ),
            ProjectCommands::Delete { id } => commands::project::delete(db, &acting()?, id),
            ProjectCommands::List => commands::project::list(db),
            ProjectCommands::Show { id } => commands::project::show(db, id),
            ProjectCommands::Report { id, json } => {
                commands::project::report(db, &acting()?, id, json)
            }
        },

        Commands::Task { action } => match action {
            TaskCommands::Add {
                name,
                project,
                employee,
                description,
            } => commands::task::add(
                db,
                &acting()?,
                &TaskFields {
                    task_name: &name,
                    employee_id: employee,
                    project_id: project,
                    description: description.as_deref(),
                    resolved: false,
                },
            ),
            TaskCommands::Edit {
                id,
                name,
                description,
                clear_description,
                employee,
                project,
                resolved,
            } => commands::task::edit(
                db,
                &acting()?,
                id,
                name.as_deref(),
                description.as_deref(),
                clear_description,
                employee,
                project,
                resolved,
            ),
            TaskCommands::List { project, employee } => commands::task::list(db, project, employee),
        },

        Commands::Report { action } => match action {
            ReportCommands::Add { task, date, hours } => {
                commands::report::add(db, &acting()?, task, date, hours)
            }
            ReportCommands::Mine => commands::report::mine(db, &acting()?),
            ReportCommands::Stats {
                employee,
                from,
                to,
                json,
            } => commands::report::stats(db, &acting()?, employee, from, to, json),
        },
    }
}
