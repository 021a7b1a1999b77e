//! Database storage and display helpers.
//!
//! This module provides the `Database` struct holding every record the
//! console manages, along with utility functions for date parsing,
//! formatting and table output.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fields::*;
use crate::notify::{default_rules, NotificationRule, NotificationSettings, Reminder};
use crate::project::Project;
use crate::seed::demo_database;
use crate::staff::{Department, Employee};
use crate::task::Task;

/// In-memory dataset: every entity held in a flat list, related by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub settings: NotificationSettings,
    #[serde(default = "default_rules")]
    pub rules: Vec<NotificationRule>,
}

impl Default for Database {
    fn default() -> Self {
        Database {
            tasks: Vec::new(),
            projects: Vec::new(),
            departments: Vec::new(),
            employees: Vec::new(),
            reminders: Vec::new(),
            settings: NotificationSettings::default(),
            rules: default_rules(),
        }
    }
}

impl Database {
    /// Load database from a JSON file, returning an empty database if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let db = serde_json::from_str(&buf)?;
        log::debug!("loaded dataset from {}", path.display());
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        log::debug!("saved dataset to {}", path.display());
        Ok(())
    }

    pub fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    pub fn next_project_id(&self) -> u64 {
        self.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    pub fn next_department_id(&self) -> u64 {
        self.departments.iter().map(|d| d.id).max().unwrap_or(0) + 1
    }

    pub fn next_employee_id(&self) -> u64 {
        self.employees.iter().map(|e| e.id).max().unwrap_or(0) + 1
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn project(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_mut(&mut self, id: u64) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn department(&self, id: u64) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    pub fn department_mut(&mut self, id: u64) -> Option<&mut Department> {
        self.departments.iter_mut().find(|d| d.id == id)
    }

    pub fn employee(&self, id: u64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn employee_mut(&mut self, id: u64) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|e| e.id == id)
    }

    /// Ids of the active employees of a department.
    pub fn active_members(&self, department_id: u64) -> Vec<u64> {
        self.employees
            .iter()
            .filter(|e| e.department_id == department_id && e.is_active)
            .map(|e| e.id)
            .collect()
    }

    /// Remove tasks by ids.
    pub fn remove_task_ids(&mut self, ids: &HashSet<u64>) {
        self.tasks.retain(|t| !ids.contains(&t.id));
        self.reminders.retain(|r| !ids.contains(&r.task_id));
    }
}

/// A dataset and where it is saved. Demo stores have no path and never write.
#[derive(Debug)]
pub struct Store {
    pub db: Database,
    path: Option<PathBuf>,
}

impl Store {
    /// Open the data file, seeding it with the demo dataset when it does not
    /// exist yet and `seed` is set.
    pub fn open(path: &Path, seed: bool) -> Result<Self> {
        if !path.exists() && seed {
            let store = Store { db: demo_database(Local::now().date_naive()), path: Some(path.to_path_buf()) };
            store.save()?;
            log::info!("seeded {}", path.display());
            return Ok(store);
        }
        Ok(Store { db: Database::load(path)?, path: Some(path.to_path_buf()) })
    }

    pub fn in_memory(db: Database) -> Self {
        Store { db, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(p) => self.db.save(p),
            None => Ok(()),
        }
    }
}

/// Current UTC time as unix seconds.
pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// Parse a date typed by the user: `dd.mm.yyyy`, `yyyy-mm-dd`, "today" or "tomorrow".
pub fn parse_date_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }
    NaiveDate::parse_from_str(&s, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
        .ok()
}

/// Parse `H:MM` or `HH:MM`.
pub fn parse_time_input(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Parse a filter bound: `dd.mm.yyyy hh:mm` or `dd.mm.yyyy`. A bare date is
/// the start of the day, or its last minute when `end_of_day` is set.
pub fn parse_date_time_input(s: &str, end_of_day: bool) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%d.%m.%Y %H:%M") {
        return Some(dt);
    }
    let date = parse_date_input(s)?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)?
    } else {
        NaiveTime::MIN
    };
    Some(date.and_time(time))
}

/// Whole days from `today` until `date`; negative when in the past.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// "Today", "Tomorrow", "Yesterday", "in 3d", "3d ago", or the date itself past a week.
pub fn format_relative_date(date: NaiveDate, today: NaiveDate) -> String {
    match days_until(date, today) {
        0 => "Today".into(),
        1 => "Tomorrow".into(),
        -1 => "Yesterday".into(),
        d @ 2..=7 => format!("in {d}d"),
        d @ -7..=-2 => format!("{}d ago", -d),
        _ => format_date(date),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_deadline(task: &Task) -> String {
    format!("{} {}", format_date(task.scheduled_date), task.scheduled_time.format("%H:%M"))
}

/// Format a unix timestamp in local time.
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%d.%m.%Y %H:%M").to_string(),
        None => "-".into(),
    }
}

pub fn format_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Pending => "Pending",
        TaskStatus::InProgress => "In progress",
        TaskStatus::Completed => "Completed",
        TaskStatus::Cancelled => "Cancelled",
    }
}

pub fn format_status_key(k: StatusKey) -> &'static str {
    match k.status() {
        Some(s) => format_status(s),
        None => "Overdue",
    }
}

pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Normal => "Normal",
        Priority::High => "High",
        Priority::Urgent => "Urgent",
    }
}

/// English plural for a count: `pluralize(2, "task", "tasks")` -> "2 tasks".
pub fn pluralize(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

/// Print tasks in a formatted table.
pub fn print_task_table(tasks: &[&Task], db: &Database) {
    println!(
        "{:<5} {:<12} {:<7} {:<17} {:<20} {}",
        "ID", "Status", "Pri", "Deadline", "Projects", "Title"
    );
    let now = Local::now().naive_local();
    for t in tasks {
        let projects: Vec<&str> = t
            .project_ids
            .iter()
            .filter_map(|id| db.project(*id).map(|p| p.name.as_str()))
            .collect();
        let flag = if t.is_overdue_at(now) { " (overdue)" } else { "" };
        println!(
            "{:<5} {:<12} {:<7} {:<17} {:<20} {}{}",
            t.id,
            format_status(t.status),
            format_priority(t.priority),
            format_deadline(t),
            truncate(&projects.join(","), 20),
            t.title,
            flag
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("staffdesk.json");
        let db = demo_database(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        db.save(&path).unwrap();

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.tasks, db.tasks);
        assert_eq!(loaded.projects.len(), db.projects.len());
        assert_eq!(loaded.rules, db.rules);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("absent.json")).unwrap();
        assert!(db.tasks.is_empty());
        assert_eq!(db.rules.len(), 3);
    }

    #[test]
    fn test_store_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staffdesk.json");
        let mut store = Store::open(&path, true).unwrap();
        assert!(path.exists());
        store.db.tasks.clear();
        store.save().unwrap();
        let reopened = Store::open(&path, true).unwrap();
        assert!(reopened.db.tasks.is_empty());
        assert!(Store::in_memory(Database::default()).path().is_none());
    }

    #[test]
    fn test_relative_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        assert_eq!(format_relative_date(day(10), today), "Today");
        assert_eq!(format_relative_date(day(11), today), "Tomorrow");
        assert_eq!(format_relative_date(day(9), today), "Yesterday");
        assert_eq!(format_relative_date(day(14), today), "in 4d");
        assert_eq!(format_relative_date(day(5), today), "5d ago");
        assert_eq!(format_relative_date(day(28), today), "28.03.2025");
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(parse_date_input("05.03.2025"), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_date_input("2025-03-05"), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_time_input("9:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time_input("24:00"), None);
        let end = parse_date_time_input("05.03.2025", true).unwrap();
        assert_eq!(end.time(), NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        let exact = parse_date_time_input("05.03.2025 14:30", true).unwrap();
        assert_eq!(exact.time(), NaiveTime::from_hms_opt(14, 30, 0).unwrap());
    }
}
