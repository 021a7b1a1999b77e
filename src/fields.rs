//! Enumerations and field types for the console.
//!
//! This module defines the structured data types used to classify tasks and
//! drive filtering, sorting, theming and notification rules.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[serde(alias = "new")]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Completed and cancelled tasks no longer need attention.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];
}

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Normal, Priority::High, Priority::Urgent];
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    ScheduledDate,
    Priority,
    Status,
    Title,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Keys of the tri-state status filter. `Overdue` is derived, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKey {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Overdue,
}

impl StatusKey {
    pub const ALL: [StatusKey; 5] = [
        StatusKey::Pending,
        StatusKey::InProgress,
        StatusKey::Completed,
        StatusKey::Cancelled,
        StatusKey::Overdue,
    ];

    /// The stored status this key stands for, if any.
    pub fn status(self) -> Option<TaskStatus> {
        match self {
            StatusKey::Pending => Some(TaskStatus::Pending),
            StatusKey::InProgress => Some(TaskStatus::InProgress),
            StatusKey::Completed => Some(TaskStatus::Completed),
            StatusKey::Cancelled => Some(TaskStatus::Cancelled),
            StatusKey::Overdue => None,
        }
    }
}

/// A filter chip cycles neutral -> include -> exclude -> neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mark {
    #[default]
    Neutral,
    Include,
    Exclude,
}

impl Mark {
    pub fn cycle(self) -> Mark {
        match self {
            Mark::Neutral => Mark::Include,
            Mark::Include => Mark::Exclude,
            Mark::Exclude => Mark::Neutral,
        }
    }
}

/// Colour scheme requested from the host.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

/// How often reminders go out for a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Daily,
    Weekly,
}

/// Unit of a notification rule threshold.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RuleUnit {
    #[default]
    Days,
}

/// When a notification rule applies, relative to the task deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCondition {
    /// Deadline is at most `value` days away.
    AtMost,
    /// Deadline is more than `value` days away.
    MoreThan,
    Overdue,
}

/// Delivery channel of a reminder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Email,
    Host,
}

/// Outcome of a reminder delivery attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}
