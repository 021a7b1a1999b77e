//! Task data structure and related functionality.
//!
//! A task is scheduled for a date and time, belongs to one or more projects
//! and is assigned to one or more employees.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// A unit of work handed out to employees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_ids: Vec<u64>,
    #[serde(default)]
    pub assignee_ids: Vec<u64>,
    /// Host user id of the admin who created the task.
    #[serde(default)]
    pub creator_id: Option<i64>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    #[serde(default = "default_true")]
    pub reminders_enabled: bool,
    #[serde(default)]
    pub last_reminder_utc: Option<i64>,
    #[serde(default)]
    pub next_reminder_utc: Option<i64>,
    #[serde(default)]
    pub completed_at_utc: Option<i64>,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

fn default_true() -> bool {
    true
}

impl Task {
    /// Scheduled date and time combined.
    pub fn deadline(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }

    /// A task is overdue once its deadline has passed while it is still active.
    pub fn is_overdue_at(&self, now: NaiveDateTime) -> bool {
        !self.status.is_terminal() && self.deadline() < now
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Local::now().naive_local())
    }
}

/// Fields supplied when creating or editing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub project_ids: Vec<u64>,
    pub assignee_ids: Vec<u64>,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub priority: Priority,
}

/// Partial update for a task; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_ids: Option<Vec<u64>>,
    pub assignee_ids: Option<Vec<u64>>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub reminders_enabled: Option<bool>,
}

impl From<TaskDraft> for TaskPatch {
    fn from(d: TaskDraft) -> Self {
        TaskPatch {
            title: Some(d.title),
            description: Some(d.description),
            project_ids: Some(d.project_ids),
            assignee_ids: Some(d.assignee_ids),
            scheduled_date: Some(d.scheduled_date),
            scheduled_time: Some(d.scheduled_time),
            priority: Some(d.priority),
            status: None,
            reminders_enabled: None,
        }
    }
}
