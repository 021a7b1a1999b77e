//! Task statistics over a deadline period.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::db::Database;
use crate::fields::TaskStatus;
use crate::filter::count_by_status;
use crate::task::Task;
use crate::tree::ProjectTree;

/// Inclusive deadline range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Period {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Period {
    pub fn contains(&self, deadline: NaiveDateTime) -> bool {
        if self.from.is_some_and(|f| deadline < f.and_time(NaiveTime::MIN)) {
            return false;
        }
        match self.to.and_then(|t| t.and_hms_opt(23, 59, 59)) {
            Some(end) => deadline <= end,
            None => true,
        }
    }
}

/// The calendar month `today` falls in.
pub fn current_month_period(today: NaiveDate) -> Period {
    let first = today.with_day(1);
    let next_month = first.and_then(|f| {
        if f.month() == 12 {
            NaiveDate::from_ymd_opt(f.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(f.year(), f.month() + 1, 1)
        }
    });
    Period {
        from: first,
        to: next_month.and_then(|n| n.pred_opt()),
    }
}

pub fn filter_by_period(tasks: &[Task], period: Period) -> Vec<&Task> {
    tasks.iter().filter(|t| period.contains(t.deadline())).collect()
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((part as f64 / total as f64) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Rounded percentage of completed tasks.
    pub completion_rate: u32,
}

pub fn overview(tasks: &[&Task], now: NaiveDateTime) -> OverviewStats {
    let count = |s: TaskStatus| tasks.iter().filter(|t| t.status == s).count();
    let completed = count(TaskStatus::Completed);
    OverviewStats {
        total: tasks.len(),
        completed,
        in_progress: count(TaskStatus::InProgress),
        pending: count(TaskStatus::Pending),
        overdue: tasks.iter().filter(|t| t.is_overdue_at(now)).count(),
        completion_rate: percent(completed, tasks.len()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub employee_id: u64,
    pub name: String,
    pub department: String,
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub task_ids: Vec<u64>,
}

/// One row per active employee matching `search`, busiest first.
pub fn employee_rows(db: &Database, tasks: &[&Task], search: &str, now: NaiveDateTime) -> Vec<EmployeeRow> {
    let q = search.trim().to_lowercase();
    let mut rows: Vec<EmployeeRow> = db
        .employees
        .iter()
        .filter(|e| e.is_active)
        .filter(|e| q.is_empty() || e.full_name().to_lowercase().contains(&q))
        .map(|e| {
            let mine: Vec<&&Task> = tasks.iter().filter(|t| t.assignee_ids.contains(&e.id)).collect();
            EmployeeRow {
                employee_id: e.id,
                name: e.full_name(),
                department: db.department(e.department_id).map(|d| d.name.clone()).unwrap_or_default(),
                total: mine.len(),
                completed: mine.iter().filter(|t| t.status == TaskStatus::Completed).count(),
                in_progress: mine.iter().filter(|t| t.status == TaskStatus::InProgress).count(),
                overdue: mine.iter().filter(|t| t.is_overdue_at(now)).count(),
                task_ids: mine.iter().map(|t| t.id).collect(),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    pub project_id: u64,
    pub name: String,
    pub color: String,
    pub total: usize,
    pub completed: usize,
    pub progress: u32,
    pub task_ids: Vec<u64>,
}

/// One row per root project matching `search`. A task counts towards a root
/// when any of its projects lies in that root's subtree.
pub fn project_rows(db: &Database, tasks: &[&Task], search: &str) -> Vec<ProjectRow> {
    let tree = ProjectTree::new(&db.projects);
    let q = search.trim().to_lowercase();
    let mut rows: Vec<ProjectRow> = tree
        .roots()
        .iter()
        .filter_map(|&id| tree.get(id))
        .filter(|p| q.is_empty() || p.name.to_lowercase().contains(&q))
        .map(|p| {
            let mut subtree: BTreeSet<u64> = tree.descendants(p.id).into_iter().collect();
            subtree.insert(p.id);
            let mine: Vec<&&Task> = tasks
                .iter()
                .filter(|t| t.project_ids.iter().any(|id| subtree.contains(id)))
                .collect();
            let completed = mine.iter().filter(|t| t.status == TaskStatus::Completed).count();
            ProjectRow {
                project_id: p.id,
                name: p.name.clone(),
                color: p.color.clone(),
                total: mine.len(),
                completed,
                progress: percent(completed, mine.len()),
                task_ids: mine.iter().map(|t| t.id).collect(),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

/// Everything the `analytics` command prints.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub period: Period,
    pub overview: OverviewStats,
    pub by_status: BTreeMap<TaskStatus, usize>,
    pub employees: Vec<EmployeeRow>,
    pub projects: Vec<ProjectRow>,
}

pub fn build_report(db: &Database, period: Period, now: NaiveDateTime) -> Report {
    let tasks = filter_by_period(&db.tasks, period);
    Report {
        period,
        overview: overview(&tasks, now),
        by_status: count_by_status(tasks.iter().copied()),
        employees: employee_rows(db, &tasks, "", now).into_iter().filter(|r| r.total > 0).collect(),
        projects: project_rows(db, &tasks, "").into_iter().filter(|r| r.total > 0).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn noon() -> NaiveDateTime {
        today().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_current_month_bounds() {
        let p = current_month_period(NaiveDate::from_ymd_opt(2024, 12, 17).unwrap());
        assert_eq!(p.from, NaiveDate::from_ymd_opt(2024, 12, 1));
        assert_eq!(p.to, NaiveDate::from_ymd_opt(2024, 12, 31));
        let p = current_month_period(NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
        assert_eq!(p.to, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_period_end_is_inclusive() {
        let p = Period { from: None, to: Some(today()) };
        assert!(p.contains(today().and_hms_opt(23, 59, 0).unwrap()));
        assert!(!p.contains(today().succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_overview_rates() {
        let db = demo_database(today());
        let all: Vec<&Task> = db.tasks.iter().collect();
        let stats = overview(&all, noon());
        assert_eq!(stats.total, 8);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 3);
        assert_eq!(stats.pending, 4);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 13);
        assert_eq!(overview(&[], noon()).completion_rate, 0);
    }

    #[test]
    fn test_rows_skip_inactive_and_roll_up_subprojects() {
        let db = demo_database(today());
        let all: Vec<&Task> = db.tasks.iter().collect();
        let people = employee_rows(&db, &all, "", noon());
        assert!(people.iter().all(|r| r.employee_id != 10));
        assert_eq!(people[0].employee_id, 2);
        assert_eq!(people[0].total, 3);

        let projects = project_rows(&db, &all, "");
        let acme = projects.iter().find(|r| r.project_id == 1).unwrap();
        // Tasks 1, 2, 3, 5 and 7 sit somewhere under Acme.
        assert_eq!(acme.total, 5);
        assert_eq!(projects[0].project_id, 1);
        assert_eq!(project_rows(&db, &all, "intern").len(), 1);
    }

    #[test]
    fn test_report_drops_empty_rows() {
        let db = demo_database(today());
        let period = Period { from: Some(today()), to: Some(today()) };
        let report = build_report(&db, period, noon());
        // Only "Meet the client" is due today.
        assert_eq!(report.overview.total, 1);
        assert_eq!(report.employees.len(), 2);
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.by_status.get(&TaskStatus::InProgress), Some(&1));
    }
}
