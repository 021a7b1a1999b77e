//! Task filtering and sorting.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};

use crate::fields::*;
use crate::selection::FilterPicks;
use crate::task::Task;

/// Plain filter used by the CLI `task list` command.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub query: Option<String>,
    pub status: Option<TaskStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub project_ids: Vec<u64>,
    pub employee_ids: Vec<u64>,
}

fn matches_text(task: &Task, query: &str) -> bool {
    let q = query.to_lowercase();
    task.title.to_lowercase().contains(&q) || task.description.to_lowercase().contains(&q)
}

fn shares_any(ids: &[u64], wanted: impl Fn(&u64) -> bool) -> bool {
    ids.iter().any(wanted)
}

pub fn filter_tasks<'a>(tasks: &'a [Task], q: &TaskQuery) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| q.status.map_or(true, |s| t.status == s))
        .filter(|t| q.query.as_deref().map_or(true, |s| s.is_empty() || matches_text(t, s)))
        .filter(|t| q.date_from.map_or(true, |d| t.scheduled_date >= d))
        .filter(|t| q.date_to.map_or(true, |d| t.scheduled_date <= d))
        .filter(|t| q.project_ids.is_empty() || shares_any(&t.project_ids, |id| q.project_ids.contains(id)))
        .filter(|t| q.employee_ids.is_empty() || shares_any(&t.assignee_ids, |id| q.employee_ids.contains(id)))
        .collect()
}

/// Filters of the task list page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilters {
    pub statuses: BTreeMap<StatusKey, Mark>,
    pub date_from: Option<NaiveDateTime>,
    pub date_to: Option<NaiveDateTime>,
    pub picks: FilterPicks,
}

impl TaskFilters {
    pub fn mark(&self, key: StatusKey) -> Mark {
        self.statuses.get(&key).copied().unwrap_or_default()
    }

    pub fn cycle_status(&mut self, key: StatusKey) {
        let next = self.mark(key).cycle();
        if next == Mark::Neutral {
            self.statuses.remove(&key);
        } else {
            self.statuses.insert(key, next);
        }
    }

    pub fn clear(&mut self) {
        *self = TaskFilters::default();
    }

    fn has_status_marks(&self) -> bool {
        self.statuses.values().any(|m| *m != Mark::Neutral)
    }

    pub fn has_active_filters(&self) -> bool {
        self.has_status_marks() || self.date_from.is_some() || self.date_to.is_some() || !self.picks.is_empty()
    }

    /// Number of active filter groups: statuses, dates, projects, people.
    pub fn count_active_filters(&self) -> usize {
        let p = &self.picks;
        [
            self.has_status_marks(),
            self.date_from.is_some() || self.date_to.is_some(),
            !p.project_ids.is_empty(),
            !p.department_ids.is_empty() || !p.employee_ids.is_empty(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count()
    }

    fn status_allows(&self, task: &Task, now: NaiveDateTime) -> bool {
        let overdue = task.is_overdue_at(now);
        let is = |key: StatusKey| match key.status() {
            Some(s) => task.status == s,
            None => overdue,
        };
        let mut any_included = false;
        let mut matched = false;
        for (&key, &mark) in &self.statuses {
            match mark {
                Mark::Exclude if is(key) => return false,
                Mark::Include => {
                    any_included = true;
                    matched |= is(key);
                }
                _ => {}
            }
        }
        !any_included || matched
    }

    pub fn allows(&self, task: &Task, now: NaiveDateTime) -> bool {
        let deadline = task.deadline();
        if self.date_from.is_some_and(|from| deadline < from) || self.date_to.is_some_and(|to| deadline > to) {
            return false;
        }
        if !self.status_allows(task, now) {
            return false;
        }
        let p = &self.picks;
        if !p.project_ids.is_empty() && !shares_any(&task.project_ids, |id| p.project_ids.contains(id)) {
            return false;
        }
        p.employee_ids.is_empty() || shares_any(&task.assignee_ids, |id| p.employee_ids.contains(id))
    }
}

/// Task list filters plus the free-text search box.
pub fn apply_task_filters<'a>(
    tasks: &'a [Task],
    filters: &TaskFilters,
    search: &str,
    now: NaiveDateTime,
) -> Vec<&'a Task> {
    let search = search.trim();
    tasks
        .iter()
        .filter(|t| search.is_empty() || matches_text(t, search))
        .filter(|t| filters.allows(t, now))
        .collect()
}

fn priority_rank(p: Priority) -> u8 {
    match p {
        Priority::Urgent => 0,
        Priority::High => 1,
        Priority::Normal => 2,
        Priority::Low => 3,
    }
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at_utc.cmp(&b.created_at_utc),
        SortKey::ScheduledDate => a.deadline().cmp(&b.deadline()),
        SortKey::Priority => priority_rank(a.priority).cmp(&priority_rank(b.priority)),
        SortKey::Status => a.status.cmp(&b.status),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}

/// Stable sort; ties keep their current order in both directions.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey, order: SortOrder) {
    tasks.sort_by(|a, b| {
        let c = compare(a, b, key);
        match order {
            SortOrder::Asc => c,
            SortOrder::Desc => c.reverse(),
        }
    });
}

pub fn count_by_status<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> BTreeMap<TaskStatus, usize> {
    let mut counts = BTreeMap::new();
    for t in tasks {
        *counts.entry(t.status).or_insert(0) += 1;
    }
    counts
}

/// Ids of the tasks referencing any of `project_ids`.
pub fn tasks_in_projects(tasks: &[Task], project_ids: &BTreeSet<u64>) -> Vec<u64> {
    tasks
        .iter()
        .filter(|t| t.project_ids.iter().any(|p| project_ids.contains(p)))
        .map(|t| t.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;
    use chrono::NaiveTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn noon() -> NaiveDateTime {
        today().and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_include_and_exclude_marks() {
        let db = demo_database(today());
        let mut f = TaskFilters::default();
        f.cycle_status(StatusKey::Completed);
        let done = apply_task_filters(&db.tasks, &f, "", noon());
        assert!(!done.is_empty());
        assert!(done.iter().all(|t| t.status == TaskStatus::Completed));

        f.cycle_status(StatusKey::Completed);
        assert_eq!(f.mark(StatusKey::Completed), Mark::Exclude);
        let rest = apply_task_filters(&db.tasks, &f, "", noon());
        assert_eq!(rest.len() + done.len(), db.tasks.len());

        f.cycle_status(StatusKey::Completed);
        assert!(!f.has_active_filters());
    }

    #[test]
    fn test_overdue_key_is_derived() {
        let db = demo_database(today());
        let mut f = TaskFilters::default();
        f.statuses.insert(StatusKey::Overdue, Mark::Include);
        let late = apply_task_filters(&db.tasks, &f, "", noon());
        assert!(!late.is_empty());
        assert!(late.iter().all(|t| t.is_overdue_at(noon())));

        f.statuses.insert(StatusKey::Overdue, Mark::Exclude);
        let on_time = apply_task_filters(&db.tasks, &f, "", noon());
        assert_eq!(on_time.len() + late.len(), db.tasks.len());
    }

    #[test]
    fn test_dates_people_and_search() {
        let db = demo_database(today());
        let mut f = TaskFilters::default();
        f.date_from = Some(noon());
        let upcoming = apply_task_filters(&db.tasks, &f, "", noon());
        assert!(upcoming.iter().all(|t| t.deadline() >= noon()));

        f.clear();
        f.picks.toggle_filter_employee(1, true);
        let mine = apply_task_filters(&db.tasks, &f, "", noon());
        assert!(mine.iter().all(|t| t.assignee_ids.contains(&1)));
        assert_eq!(f.count_active_filters(), 1);

        let first = &db.tasks[0];
        let word = first.title.split_whitespace().next().unwrap().to_uppercase();
        let found = apply_task_filters(&db.tasks, &TaskFilters::default(), &word, noon());
        assert!(ids(&found).contains(&first.id));
    }

    #[test]
    fn test_sort_by_priority_and_title() {
        let db = demo_database(today());
        let mut tasks: Vec<&Task> = db.tasks.iter().collect();
        sort_tasks(&mut tasks, SortKey::Priority, SortOrder::Asc);
        let ranks: Vec<u8> = tasks.iter().map(|t| priority_rank(t.priority)).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));

        sort_tasks(&mut tasks, SortKey::Title, SortOrder::Desc);
        let titles: Vec<String> = tasks.iter().map(|t| t.title.to_lowercase()).collect();
        assert!(titles.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_query_and_counts() {
        let db = demo_database(today());
        let q = TaskQuery { status: Some(TaskStatus::InProgress), ..Default::default() };
        let active = filter_tasks(&db.tasks, &q);
        let counts = count_by_status(&db.tasks);
        assert_eq!(counts.get(&TaskStatus::InProgress).copied().unwrap_or(0), active.len());
        assert_eq!(counts.values().sum::<usize>(), db.tasks.len());

        let q = TaskQuery { project_ids: vec![404], ..Default::default() };
        assert!(filter_tasks(&db.tasks, &q).is_empty());
    }
}
