//! Command implementations for the CLI interface.
//!
//! Every handler works on an open `Store`, prints its result and saves when
//! it changed something. Errors bubble up to `main`.

use std::collections::BTreeSet;

use clap::Subcommand;
use clap_complete::{generate, Shell};

use chrono::Local;

use crate::analytics::{current_month_period, Period};
use crate::api::{self, EmployeeRemoval};
use crate::auth::Session;
use crate::db::*;
use crate::error::{AppError, Result};
use crate::fields::*;
use crate::filter::{filter_tasks, sort_tasks, TaskQuery};
use crate::notify::frequency_for;
use crate::project::ProjectDraft;
use crate::selection::TaskForm;
use crate::staff::{DepartmentDraft, EmployeeDraft};
use crate::task::{Task, TaskPatch};
use crate::tree::{employee_names, group_by_department, search_employees, ProjectTree};
use crate::validate::{is_valid_time, validate_task};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive console (the default).
    Ui,

    /// Show the administrator this session runs as.
    Whoami,

    /// Create, list and change tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage the project tree.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage departments.
    Dept {
        #[command(subcommand)]
        action: DeptAction,
    },

    /// Manage employees.
    Employee {
        #[command(subcommand)]
        action: EmployeeAction,
    },

    /// Task statistics for a deadline period (default: this month).
    Analytics {
        /// Period start: dd.mm.yyyy, yyyy-mm-dd, "today" or "tomorrow".
        #[arg(long)]
        from: Option<String>,
        /// Period end, inclusive.
        #[arg(long)]
        to: Option<String>,
    },

    /// Notification settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Replace the data file with the demo dataset.
    Seed {
        /// Overwrite an existing data file.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Project ids, comma-separated.
        #[arg(long, value_delimiter = ',')]
        project: Vec<u64>,
        /// Attach the task to every project.
        #[arg(long)]
        all_projects: bool,
        /// Assignee employee ids, comma-separated.
        #[arg(long, value_delimiter = ',')]
        assignee: Vec<u64>,
        /// Assign whole departments (their active members), comma-separated.
        #[arg(long, value_delimiter = ',')]
        dept: Vec<u64>,
        /// Deadline date: dd.mm.yyyy, yyyy-mm-dd, "today" or "tomorrow".
        #[arg(long)]
        date: String,
        /// Deadline time, HH:MM.
        #[arg(long)]
        time: String,
        #[arg(long, value_enum, default_value_t = Priority::Normal)]
        priority: Priority,
    },

    /// List tasks with optional filters.
    List {
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        /// Match title or description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_delimiter = ',')]
        project: Vec<u64>,
        #[arg(long, value_delimiter = ',')]
        employee: Vec<u64>,
        /// Earliest deadline date.
        #[arg(long)]
        from: Option<String>,
        /// Latest deadline date.
        #[arg(long)]
        to: Option<String>,
        /// Only overdue tasks.
        #[arg(long)]
        overdue: bool,
        #[arg(long, value_enum, default_value_t = SortKey::CreatedAt)]
        sort: SortKey,
        #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
        order: SortOrder,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one task.
    Show { id: u64 },

    /// Update fields on a task.
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_delimiter = ',')]
        project: Option<Vec<u64>>,
        #[arg(long, value_delimiter = ',')]
        assignee: Option<Vec<u64>>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Turn reminders on or off.
        #[arg(long)]
        reminders: Option<bool>,
    },

    /// Change the status of a task.
    Status {
        id: u64,
        #[arg(value_enum)]
        status: TaskStatus,
    },

    /// Delete one or more tasks.
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    Add {
        name: String,
        /// Parent project id.
        #[arg(long)]
        parent: Option<u64>,
        #[arg(long)]
        desc: Option<String>,
        /// Colour as #RRGGBB; a free palette colour is picked otherwise.
        #[arg(long)]
        color: Option<String>,
    },
    List {
        /// Indent children under their parents.
        #[arg(long)]
        tree: bool,
        /// Keep matching projects and their ancestors.
        #[arg(long)]
        search: Option<String>,
    },
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "root")]
        parent: Option<u64>,
        /// Move the project to the top level.
        #[arg(long)]
        root: bool,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete projects. With --cascade, sub-projects go too.
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
        #[arg(long)]
        cascade: bool,
    },
}

#[derive(Subcommand)]
pub enum DeptAction {
    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
    },
    List,
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Manager employee id; 0 clears it.
        #[arg(long)]
        manager: Option<u64>,
    },
    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum EmployeeAction {
    Add {
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: String,
        /// Department id.
        #[arg(long)]
        dept: u64,
        #[arg(long)]
        position: String,
        #[arg(long)]
        phone: Option<String>,
    },
    List {
        /// Only this department.
        #[arg(long)]
        dept: Option<u64>,
        /// Match name, email or position.
        #[arg(long)]
        search: Option<String>,
        /// Include inactive employees.
        #[arg(long)]
        all: bool,
    },
    Edit {
        id: u64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        dept: Option<u64>,
        #[arg(long)]
        position: Option<String>,
        /// New phone; an empty value removes it.
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete employees; those on active tasks are deactivated instead.
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        email_enabled: Option<bool>,
        #[arg(long)]
        host_enabled: Option<bool>,
        #[arg(long)]
        notify_complete: Option<bool>,
        #[arg(long)]
        notify_deadline: Option<bool>,
        #[arg(long)]
        notify_overdue: Option<bool>,
        /// Host chat ids to notify, comma-separated.
        #[arg(long, value_delimiter = ',')]
        host_chats: Option<Vec<i64>>,
    },
    AddEmail { email: String },
    RmEmail { email: String },
}

fn date_arg(s: &str) -> Result<chrono::NaiveDate> {
    parse_date_input(s).ok_or_else(|| AppError::Validation(format!("Invalid date: {s}")))
}

fn time_arg(s: &str) -> Result<chrono::NaiveTime> {
    if !is_valid_time(s.trim()) {
        return Err(AppError::Validation("Invalid time format".into()));
    }
    parse_time_input(s).ok_or_else(|| AppError::Validation("Invalid time format".into()))
}

fn opt_date(s: &Option<String>) -> Result<Option<chrono::NaiveDate>> {
    s.as_deref().map(date_arg).transpose()
}

pub fn cmd_whoami(session: &Session) {
    println!("Admin:    {}", session.admin.name);
    println!("Host id:  {}", session.admin.host_user_id);
    if session.impersonated {
        println!("(dev mode: no host user, acting as the first admin)");
    }
}

pub fn cmd_task(store: &mut Store, session: &Session, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Add { title, desc, project, all_projects, assignee, dept, date, time, priority } => {
            let db = &store.db;
            let mut form = TaskForm {
                title,
                description: desc.unwrap_or_default(),
                priority,
                scheduled_date: parse_date_input(&date),
                scheduled_time: parse_time_input(&time),
                ..TaskForm::default()
            };
            if all_projects {
                form.toggle_all_projects();
            } else {
                form.selected_projects = project.into_iter().collect();
            }
            form.selected_employees = assignee.into_iter().collect();
            for d in dept {
                db.department(d).ok_or_else(|| AppError::not_found("Department", d))?;
                form.toggle_department_all(db, d, true);
            }
            validate_task(&form, &time, Local::now().date_naive()).into_result()?;
            let draft = form
                .to_draft(db)
                .ok_or_else(|| AppError::Validation("Choose a date and time".into()))?;
            let id = api::create_task(&mut store.db, draft, Some(session.user.id))?;
            store.save()?;
            println!("Added task {id}");
        }
        TaskAction::List { status, search, project, employee, from, to, overdue, sort, order, limit } => {
            let q = TaskQuery {
                query: search,
                status,
                date_from: opt_date(&from)?,
                date_to: opt_date(&to)?,
                project_ids: project,
                employee_ids: employee,
            };
            let now = Local::now().naive_local();
            let mut tasks = filter_tasks(&store.db.tasks, &q);
            if overdue {
                tasks.retain(|t| t.is_overdue_at(now));
            }
            sort_tasks(&mut tasks, sort, order);
            if let Some(n) = limit {
                tasks.truncate(n);
            }
            if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                print_task_table(&tasks, &store.db);
            }
        }
        TaskAction::Show { id } => {
            let task = store.db.task(id).ok_or_else(|| AppError::not_found("Task", id))?;
            print_task(task, &store.db);
        }
        TaskAction::Edit { id, title, desc, project, assignee, date, time, priority, reminders } => {
            let patch = TaskPatch {
                title,
                description: desc,
                project_ids: project,
                assignee_ids: assignee,
                scheduled_date: opt_date(&date)?,
                scheduled_time: time.as_deref().map(time_arg).transpose()?,
                priority,
                status: None,
                reminders_enabled: reminders,
            };
            api::update_task(&mut store.db, id, patch)?;
            store.save()?;
            println!("Updated task {id}");
        }
        TaskAction::Status { id, status } => {
            api::set_task_status(&mut store.db, id, status)?;
            store.save()?;
            println!("Task {id} is now {}", format_status(status));
        }
        TaskAction::Delete { ids } => {
            if let Some(missing) = ids.iter().find(|id| store.db.task(**id).is_none()) {
                return Err(AppError::not_found("Task", *missing));
            }
            let n = if ids.len() == 1 {
                api::delete_task(&mut store.db, ids[0])?;
                1
            } else {
                api::delete_tasks(&mut store.db, &ids)
            };
            store.save()?;
            println!("Deleted {}.", pluralize(n, "task", "tasks"));
        }
    }
    Ok(())
}

fn print_task(task: &Task, db: &Database) {
    let today = Local::now().date_naive();
    let tree = ProjectTree::new(&db.projects);
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}{}", format_status(task.status), if task.is_overdue() { " (overdue)" } else { "" });
    println!("Priority:     {}", format_priority(task.priority));
    println!(
        "Deadline:     {} ({})",
        format_deadline(task),
        format_relative_date(task.scheduled_date, today)
    );
    println!("Projects:");
    for &pid in &task.project_ids {
        let path: Vec<&str> = tree.path(pid).iter().map(|p| p.name.as_str()).collect();
        if path.is_empty() {
            println!("  - Unknown project (#{pid})");
        } else {
            println!("  - {} (#{pid})", path.join(" / "));
        }
    }
    println!("Assignees:    {}", employee_names(db, &task.assignee_ids).join(", "));
    println!("Creator:      {}", task.creator_id.map(|c| c.to_string()).unwrap_or_else(|| "-".into()));
    let reminders = match frequency_for(task, &db.rules, today) {
        Some(Frequency::Daily) => "daily",
        Some(Frequency::Weekly) => "weekly",
        None if task.reminders_enabled => "none (finished)",
        None => "off",
    };
    println!("Reminders:    {reminders}");
    if let Some(ts) = task.last_reminder_utc {
        println!("Last sent:    {}", format_timestamp(ts));
    }
    if let Some(ts) = task.completed_at_utc {
        println!("Completed:    {}", format_timestamp(ts));
    }
    println!("Created:      {}", format_timestamp(task.created_at_utc));
    println!("Updated:      {}", format_timestamp(task.updated_at_utc));
    println!("Description:\n{}\n", if task.description.is_empty() { "-" } else { &task.description });
}

pub fn cmd_project(store: &mut Store, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add { name, parent, desc, color } => {
            let id = api::create_project(
                &mut store.db,
                ProjectDraft { parent_id: parent, name, description: desc.unwrap_or_default(), color },
            )?;
            store.save()?;
            println!("Added project {id}");
        }
        ProjectAction::List { tree: as_tree, search } => list_projects(&store.db, as_tree, search.as_deref()),
        ProjectAction::Edit { id, name, parent, root, desc, color } => {
            let current = store.db.project(id).ok_or_else(|| AppError::not_found("Project", id))?;
            let draft = ProjectDraft {
                parent_id: if root { None } else { parent.or(current.parent_id) },
                name: name.unwrap_or_else(|| current.name.clone()),
                description: desc.unwrap_or_else(|| current.description.clone()),
                color,
            };
            api::update_project(&mut store.db, id, draft)?;
            store.save()?;
            println!("Updated project {id}");
        }
        ProjectAction::Delete { ids, cascade } => {
            let n = if cascade || ids.len() > 1 {
                api::delete_projects(&mut store.db, &ids)?
            } else {
                api::delete_project(&mut store.db, ids[0])?;
                1
            };
            store.save()?;
            println!("Deleted {}.", pluralize(n, "project", "projects"));
        }
    }
    Ok(())
}

fn list_projects(db: &Database, as_tree: bool, search: Option<&str>) {
    let tree = ProjectTree::new(&db.projects);
    let keep = search.map(|q| tree.search(q));
    let rows: Vec<(u64, usize)> = tree
        .flatten()
        .into_iter()
        .filter(|(id, _)| keep.as_ref().map_or(true, |k| k.contains(id)))
        .collect();
    if rows.is_empty() {
        println!("No projects found.");
        return;
    }
    println!("{:<5} {:<8} {:<6} {}", "ID", "Color", "Tasks", "Name");
    for (id, depth) in rows {
        let Some(p) = tree.get(id) else { continue };
        let tasks = db.tasks.iter().filter(|t| t.project_ids.contains(&id)).count();
        let indent = if as_tree { "  ".repeat(depth) } else { String::new() };
        let name = if as_tree {
            p.name.clone()
        } else {
            tree.path(id).iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(" / ")
        };
        println!("{:<5} {:<8} {:<6} {indent}{name}", p.id, p.color, tasks);
    }
}

pub fn cmd_dept(store: &mut Store, action: DeptAction) -> Result<()> {
    match action {
        DeptAction::Add { name, desc } => {
            let id = api::create_department(
                &mut store.db,
                DepartmentDraft { name, description: desc.unwrap_or_default() },
            )?;
            store.save()?;
            println!("Added department {id}");
        }
        DeptAction::List => {
            let mut depts: Vec<_> = store.db.departments.iter().collect();
            depts.sort_by_key(|d| (d.order, d.id));
            println!("{:<5} {:<20} {:<8} {:<20} {}", "ID", "Name", "People", "Manager", "Description");
            for d in depts {
                let people = store.db.active_members(d.id).len();
                let manager = d
                    .manager_id
                    .and_then(|m| store.db.employee(m))
                    .map(|e| e.full_name())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:<5} {:<20} {:<8} {:<20} {}",
                    d.id,
                    truncate(&d.name, 20),
                    people,
                    truncate(&manager, 20),
                    d.description
                );
            }
        }
        DeptAction::Edit { id, name, desc, manager } => {
            let current = store.db.department(id).ok_or_else(|| AppError::not_found("Department", id))?;
            let draft = DepartmentDraft {
                name: name.unwrap_or_else(|| current.name.clone()),
                description: desc.unwrap_or_else(|| current.description.clone()),
            };
            api::update_department(&mut store.db, id, draft)?;
            if let Some(m) = manager {
                api::set_department_manager(&mut store.db, id, (m != 0).then_some(m))?;
            }
            store.save()?;
            println!("Updated department {id}");
        }
        DeptAction::Delete { id } => {
            api::delete_department(&mut store.db, id)?;
            store.save()?;
            println!("Deleted department {id}");
        }
    }
    Ok(())
}

pub fn cmd_employee(store: &mut Store, action: EmployeeAction) -> Result<()> {
    match action {
        EmployeeAction::Add { first_name, last_name, email, dept, position, phone } => {
            let draft = EmployeeDraft { department_id: Some(dept), first_name, last_name, email, phone, position };
            let id = api::create_employee(&mut store.db, draft)?;
            store.save()?;
            println!("Added employee {id}");
        }
        EmployeeAction::List { dept, search, all } => {
            let db = &store.db;
            let found = search_employees(&db.employees, search.as_deref().unwrap_or(""));
            let shown: Vec<_> = found
                .into_iter()
                .filter(|e| all || e.is_active)
                .filter(|e| dept.map_or(true, |d| e.department_id == d))
                .collect();
            if shown.is_empty() {
                println!("No employees found.");
                return Ok(());
            }
            let groups = group_by_department(&shown, &db.departments);
            for (department, people) in groups.into_iter().filter(|(_, people)| !people.is_empty()) {
                println!("{} ({})", department.name, pluralize(people.len(), "person", "people"));
                for e in people {
                    println!(
                        "  {:<4} {:<3} {:<24} {:<22} {}{}",
                        e.id,
                        e.initials(),
                        truncate(&e.full_name(), 24),
                        truncate(&e.position, 22),
                        e.email,
                        if e.is_active { "" } else { " (inactive)" }
                    );
                }
            }
        }
        EmployeeAction::Edit { id, first_name, last_name, email, dept, position, phone, active } => {
            let current = store.db.employee(id).ok_or_else(|| AppError::not_found("Employee", id))?;
            let draft = EmployeeDraft {
                department_id: Some(dept.unwrap_or(current.department_id)),
                first_name: first_name.unwrap_or_else(|| current.first_name.clone()),
                last_name: last_name.unwrap_or_else(|| current.last_name.clone()),
                email: email.unwrap_or_else(|| current.email.clone()),
                phone: phone.or_else(|| current.phone.clone()),
                position: position.unwrap_or_else(|| current.position.clone()),
            };
            api::update_employee(&mut store.db, id, draft)?;
            if let Some(a) = active {
                api::set_employee_active(&mut store.db, id, a)?;
            }
            store.save()?;
            println!("Updated employee {id}");
        }
        EmployeeAction::Delete { ids } => {
            if ids.len() == 1 {
                match api::delete_employee(&mut store.db, ids[0])? {
                    EmployeeRemoval::Removed => println!("Deleted employee {}", ids[0]),
                    EmployeeRemoval::Deactivated => {
                        println!("Employee {} has active tasks and was deactivated", ids[0])
                    }
                }
            } else {
                let (removed, deactivated) = api::delete_employees(&mut store.db, &ids)?;
                println!(
                    "Deleted {}, deactivated {}.",
                    pluralize(removed, "employee", "employees"),
                    deactivated
                );
            }
            store.save()?;
        }
    }
    Ok(())
}

fn print_period(period: Period) -> String {
    let side = |d: Option<chrono::NaiveDate>| d.map(format_date).unwrap_or_else(|| "...".into());
    format!("{} - {}", side(period.from), side(period.to))
}

pub fn cmd_analytics(db: &Database, from: Option<String>, to: Option<String>) -> Result<()> {
    let period = if from.is_none() && to.is_none() {
        current_month_period(Local::now().date_naive())
    } else {
        Period { from: opt_date(&from)?, to: opt_date(&to)? }
    };
    let report = api::analytics(db, period);
    let o = &report.overview;
    println!("Period:       {}", print_period(report.period));
    println!("Tasks:        {}", o.total);
    println!("Completed:    {} ({}%)", o.completed, o.completion_rate);
    println!("In progress:  {}", o.in_progress);
    println!("Pending:      {}", o.pending);
    println!("Overdue:      {}", o.overdue);
    if !report.by_status.is_empty() {
        let parts: Vec<String> = report
            .by_status
            .iter()
            .map(|(s, n)| format!("{} {n}", format_status(*s)))
            .collect();
        println!("By status:    {}", parts.join(", "));
    }

    if !report.employees.is_empty() {
        println!("\n{:<24} {:<16} {:>5} {:>5} {:>5} {:>7}", "Employee", "Department", "Tasks", "Done", "Busy", "Overdue");
        for r in &report.employees {
            println!(
                "{:<24} {:<16} {:>5} {:>5} {:>5} {:>7}",
                truncate(&r.name, 24),
                truncate(&r.department, 16),
                r.total,
                r.completed,
                r.in_progress,
                r.overdue
            );
        }
    }
    if !report.projects.is_empty() {
        println!("\n{:<28} {:>5} {:>5} {:>9}", "Project", "Tasks", "Done", "Progress");
        for r in &report.projects {
            println!("{:<28} {:>5} {:>5} {:>8}%", truncate(&r.name, 28), r.total, r.completed, r.progress);
        }
    }
    Ok(())
}

pub fn cmd_settings(store: &mut Store, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let s = &store.db.settings;
            let on = |b: bool| if b { "on" } else { "off" };
            println!("Email:            {}", on(s.email_enabled));
            println!("Host messages:    {}", on(s.host_enabled));
            println!("Emails:           {}", if s.emails.is_empty() { "-".into() } else { s.emails.join(", ") });
            let chats: Vec<String> = s.host_chat_ids.iter().map(|c| c.to_string()).collect();
            println!("Host chats:       {}", if chats.is_empty() { "-".into() } else { chats.join(", ") });
            println!("On complete:      {}", on(s.notify_on_complete));
            println!("On deadline:      {}", on(s.notify_on_deadline));
            println!("On overdue:       {}", on(s.notify_on_overdue));
            println!("Rules:");
            for r in &store.db.rules {
                println!("  - {}", r.describe());
            }
        }
        SettingsAction::Set { email_enabled, host_enabled, notify_complete, notify_deadline, notify_overdue, host_chats } => {
            let mut s = store.db.settings.clone();
            s.email_enabled = email_enabled.unwrap_or(s.email_enabled);
            s.host_enabled = host_enabled.unwrap_or(s.host_enabled);
            s.notify_on_complete = notify_complete.unwrap_or(s.notify_on_complete);
            s.notify_on_deadline = notify_deadline.unwrap_or(s.notify_on_deadline);
            s.notify_on_overdue = notify_overdue.unwrap_or(s.notify_on_overdue);
            if let Some(chats) = host_chats {
                s.host_chat_ids = chats.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
            }
            api::update_settings(&mut store.db, s)?;
            store.save()?;
            println!("Settings saved.");
        }
        SettingsAction::AddEmail { email } => {
            if api::add_notification_email(&mut store.db, &email)? {
                store.save()?;
                println!("Added {email}");
            } else {
                println!("{email} is already on the list");
            }
        }
        SettingsAction::RmEmail { email } => {
            if api::remove_notification_email(&mut store.db, &email) {
                store.save()?;
                println!("Removed {email}");
            } else {
                println!("{email} was not on the list");
            }
        }
    }
    Ok(())
}

/// Write the demo dataset to `store`'s file.
pub fn cmd_seed(store: &mut Store, force: bool) -> Result<()> {
    let Some(path) = store.path().map(|p| p.to_path_buf()) else {
        println!("Demo mode works on the demo dataset already.");
        return Ok(());
    };
    let has_data = !store.db.tasks.is_empty() || !store.db.projects.is_empty() || !store.db.employees.is_empty();
    if has_data && !force {
        return Err(AppError::Conflict(format!(
            "{} already holds data; pass --force to replace it",
            path.display()
        )));
    }
    store.db = crate::seed::demo_database(Local::now().date_naive());
    store.save()?;
    println!("Seeded {}", path.display());
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
