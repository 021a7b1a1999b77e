//! Notification settings, reminder rules and the reminder log.
//!
//! Nothing is delivered from here; the rules only decide how often an active
//! task should be chased.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::task::Task;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    pub email_enabled: bool,
    pub host_enabled: bool,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub host_chat_ids: Vec<i64>,
    pub notify_on_complete: bool,
    pub notify_on_deadline: bool,
    pub notify_on_overdue: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            email_enabled: true,
            host_enabled: false,
            emails: Vec::new(),
            host_chat_ids: Vec::new(),
            notify_on_complete: true,
            notify_on_deadline: true,
            notify_on_overdue: true,
        }
    }
}

/// One line of the reminder schedule, e.g. "deadline within 7 days, remind daily".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRule {
    pub condition: RuleCondition,
    /// Threshold; ignored for `Overdue`.
    pub value: i64,
    #[serde(default)]
    pub unit: RuleUnit,
    pub frequency: Frequency,
}

impl NotificationRule {
    /// `days_left` is negative once the deadline has passed.
    pub fn matches(&self, days_left: i64) -> bool {
        match self.condition {
            RuleCondition::Overdue => days_left < 0,
            RuleCondition::AtMost => days_left >= 0 && days_left <= self.value,
            RuleCondition::MoreThan => days_left > self.value,
        }
    }

    fn unit_label(&self) -> &'static str {
        match (self.unit, self.value) {
            (RuleUnit::Days, 1) => "day",
            (RuleUnit::Days, _) => "days",
        }
    }

    pub fn describe(&self) -> String {
        let when = match self.condition {
            RuleCondition::AtMost => format!("Deadline <= {} {}", self.value, self.unit_label()),
            RuleCondition::MoreThan => format!("Deadline > {} {}", self.value, self.unit_label()),
            RuleCondition::Overdue => "Overdue".to_string(),
        };
        let how = match self.frequency {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        };
        format!("{when} -> {how}")
    }
}

pub fn default_rules() -> Vec<NotificationRule> {
    vec![
        NotificationRule { condition: RuleCondition::AtMost, value: 7, unit: RuleUnit::Days, frequency: Frequency::Daily },
        NotificationRule { condition: RuleCondition::MoreThan, value: 7, unit: RuleUnit::Days, frequency: Frequency::Weekly },
        NotificationRule { condition: RuleCondition::Overdue, value: 0, unit: RuleUnit::Days, frequency: Frequency::Daily },
    ]
}

/// A reminder that was sent (or failed) for one assignee of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: u64,
    pub task_id: u64,
    pub employee_id: u64,
    pub channel: Channel,
    pub status: DeliveryStatus,
    pub sent_at_utc: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at_utc: i64,
}

/// Reminder frequency for a task, decided by the first matching rule.
pub fn frequency_for(task: &Task, rules: &[NotificationRule], today: NaiveDate) -> Option<Frequency> {
    if task.status.is_terminal() || !task.reminders_enabled {
        return None;
    }
    let days_left = (task.scheduled_date - today).num_days();
    rules.iter().find(|r| r.matches(days_left)).map(|r| r.frequency)
}
