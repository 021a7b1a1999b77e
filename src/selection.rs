//! Selection state for the task form and the task list filters.
//!
//! The project picker keeps parents and children consistent: a node is
//! selected together with its whole subtree, and an ancestor is selected
//! exactly when all of its descendants are.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};

use crate::db::Database;
use crate::fields::Priority;
use crate::task::{Task, TaskDraft};
use crate::tree::ProjectTree;

/// Toggle one node of a project forest and return the new selection.
///
/// Unknown ids leave the selection unchanged.
pub fn toggle(tree: &ProjectTree, selected: &BTreeSet<u64>, id: u64, checked: bool) -> BTreeSet<u64> {
    if !tree.contains(id) {
        return selected.clone();
    }
    let mut next = selected.clone();
    let subtree = tree.descendants(id);
    if checked {
        next.insert(id);
        next.extend(subtree.iter().copied());
        for ancestor in tree.ancestors(id) {
            if tree.descendants(ancestor).iter().all(|d| next.contains(d)) {
                next.insert(ancestor);
            }
        }
    } else {
        next.remove(&id);
        for d in &subtree {
            next.remove(d);
        }
        for ancestor in tree.ancestors(id) {
            if !tree.descendants(ancestor).iter().all(|d| next.contains(d)) {
                next.remove(&ancestor);
            }
        }
    }
    next
}

/// Checkbox state of a node in the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Checked,
    Partial,
    Unchecked,
}

pub fn check_state(tree: &ProjectTree, selected: &BTreeSet<u64>, id: u64) -> Check {
    if selected.contains(&id) {
        return Check::Checked;
    }
    if tree.descendants(id).iter().any(|d| selected.contains(d)) {
        Check::Partial
    } else {
        Check::Unchecked
    }
}

/// One removable entry of the form summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip {
    AllProjects,
    Project(u64),
    Department(u64),
    Employee(u64),
}

/// State of the task creation / editing form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub selected_projects: BTreeSet<u64>,
    pub selected_employees: BTreeSet<u64>,
    pub all_projects: bool,
    /// Departments picked as a whole; resolved to their active members on save.
    pub departments_all: BTreeSet<u64>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub editing_task_id: Option<u64>,
}

impl TaskForm {
    pub fn reset(&mut self) {
        *self = TaskForm::default();
    }

    pub fn is_editing(&self) -> bool {
        self.editing_task_id.is_some()
    }

    /// Populate the form for editing an existing task.
    pub fn load_task(task: &Task) -> Self {
        TaskForm {
            selected_projects: task.project_ids.iter().copied().collect(),
            selected_employees: task.assignee_ids.iter().copied().collect(),
            all_projects: false,
            departments_all: BTreeSet::new(),
            scheduled_date: Some(task.scheduled_date),
            scheduled_time: Some(task.scheduled_time),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            editing_task_id: Some(task.id),
        }
    }

    pub fn toggle_project(&mut self, tree: &ProjectTree, id: u64, checked: bool) {
        self.selected_projects = toggle(tree, &self.selected_projects, id, checked);
        if checked {
            self.all_projects = false;
        }
    }

    /// Selecting "all projects" drops the individual picks.
    pub fn toggle_all_projects(&mut self) {
        self.all_projects = !self.all_projects;
        if self.all_projects {
            self.selected_projects.clear();
        }
    }

    pub fn clear_projects(&mut self) {
        self.selected_projects.clear();
        self.all_projects = false;
    }

    /// Drop a project together with the subprojects it implies.
    pub fn remove_project(&mut self, tree: &ProjectTree, id: u64) {
        self.selected_projects.remove(&id);
        for d in tree.descendants(id) {
            self.selected_projects.remove(&d);
        }
    }

    pub fn toggle_employee(&mut self, id: u64, checked: bool) {
        if checked {
            self.selected_employees.insert(id);
        } else {
            self.selected_employees.remove(&id);
        }
    }

    pub fn remove_employee(&mut self, id: u64) {
        self.selected_employees.remove(&id);
    }

    /// Add or remove every active member of a department individually.
    pub fn toggle_department(&mut self, db: &Database, department_id: u64, checked: bool) {
        let members = db.active_members(department_id);
        if checked {
            self.selected_employees.extend(members);
        } else {
            for m in members {
                self.selected_employees.remove(&m);
            }
        }
    }

    /// Pick a whole department as one assignee entry. Individually picked
    /// members of that department are folded into it.
    pub fn toggle_department_all(&mut self, db: &Database, department_id: u64, checked: bool) {
        if checked {
            self.departments_all.insert(department_id);
            for m in db.active_members(department_id) {
                self.selected_employees.remove(&m);
            }
        } else {
            self.departments_all.remove(&department_id);
        }
    }

    pub fn remove_department(&mut self, department_id: u64) {
        self.departments_all.remove(&department_id);
    }

    pub fn clear_employees(&mut self) {
        self.selected_employees.clear();
        self.departments_all.clear();
    }

    pub fn has_projects(&self) -> bool {
        self.all_projects || !self.selected_projects.is_empty()
    }

    pub fn has_assignees(&self) -> bool {
        !self.departments_all.is_empty() || !self.selected_employees.is_empty()
    }

    pub fn resolved_project_ids(&self, db: &Database) -> Vec<u64> {
        if self.all_projects {
            db.projects.iter().map(|p| p.id).collect()
        } else {
            self.selected_projects.iter().copied().collect()
        }
    }

    /// Individual picks plus the active members of departments picked as a whole.
    pub fn resolved_assignee_ids(&self, db: &Database) -> Vec<u64> {
        let mut ids: BTreeSet<u64> = self.selected_employees.clone();
        for &d in &self.departments_all {
            ids.extend(db.active_members(d));
        }
        ids.into_iter().collect()
    }

    /// "All projects", or the topmost picks; their subprojects are implied.
    pub fn project_chips(&self, db: &Database) -> Vec<Chip> {
        if self.all_projects {
            return vec![Chip::AllProjects];
        }
        let selected = &self.selected_projects;
        selected
            .iter()
            .copied()
            .filter(|id| {
                db.project(*id)
                    .and_then(|p| p.parent_id)
                    .map_or(true, |parent| !selected.contains(&parent))
            })
            .map(Chip::Project)
            .collect()
    }

    /// Departments picked as a whole, then individuals outside them.
    pub fn assignee_chips(&self, db: &Database) -> Vec<Chip> {
        let mut chips: Vec<Chip> = self
            .departments_all
            .iter()
            .filter(|d| db.department(**d).is_some())
            .map(|d| Chip::Department(*d))
            .collect();
        for &e in &self.selected_employees {
            if let Some(emp) = db.employee(e) {
                if !self.departments_all.contains(&emp.department_id) {
                    chips.push(Chip::Employee(e));
                }
            }
        }
        chips
    }

    pub fn chip_label(db: &Database, chip: Chip) -> String {
        match chip {
            Chip::AllProjects => "All projects".to_string(),
            Chip::Project(id) => crate::tree::project_names(db, &[id]).into_iter().next().unwrap_or_default(),
            Chip::Department(id) => match db.department(id) {
                Some(dept) => format!("{} ({} people)", dept.name, db.active_members(id).len()),
                None => "Unknown department".to_string(),
            },
            Chip::Employee(id) => crate::tree::employee_names(db, &[id]).into_iter().next().unwrap_or_default(),
        }
    }

    pub fn remove_chip(&mut self, tree: &ProjectTree, chip: Chip) {
        match chip {
            Chip::AllProjects => self.all_projects = false,
            Chip::Project(id) => self.remove_project(tree, id),
            Chip::Department(id) => self.remove_department(id),
            Chip::Employee(id) => self.remove_employee(id),
        }
    }

    /// Assignee summary: departments as "Name (N people)", then individuals
    /// outside those departments.
    pub fn assignee_labels(&self, db: &Database) -> Vec<String> {
        self.assignee_chips(db)
            .into_iter()
            .map(|c| Self::chip_label(db, c))
            .collect()
    }

    /// Turn a validated form into a draft. Callers validate first; missing
    /// date or time yields `None`.
    pub fn to_draft(&self, db: &Database) -> Option<TaskDraft> {
        Some(TaskDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            project_ids: self.resolved_project_ids(db),
            assignee_ids: self.resolved_assignee_ids(db),
            scheduled_date: self.scheduled_date?,
            scheduled_time: self.scheduled_time?,
            priority: self.priority,
        })
    }
}

/// Project, department and employee picks of the task list filter panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPicks {
    pub project_ids: BTreeSet<u64>,
    pub department_ids: BTreeSet<u64>,
    pub employee_ids: BTreeSet<u64>,
}

impl FilterPicks {
    pub fn toggle_filter_project(&mut self, id: u64, checked: bool) {
        if checked {
            self.project_ids.insert(id);
        } else {
            self.project_ids.remove(&id);
        }
    }

    /// A department pick brings its active members along.
    pub fn toggle_filter_department(&mut self, db: &Database, department_id: u64, checked: bool) {
        let members = db.active_members(department_id);
        if checked {
            self.department_ids.insert(department_id);
            self.employee_ids.extend(members);
        } else {
            self.department_ids.remove(&department_id);
            for m in members {
                self.employee_ids.remove(&m);
            }
        }
    }

    pub fn toggle_filter_employee(&mut self, id: u64, checked: bool) {
        if checked {
            self.employee_ids.insert(id);
        } else {
            self.employee_ids.remove(&id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.project_ids.is_empty() && self.department_ids.is_empty() && self.employee_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;
    use crate::tree::tests::forest;

    fn set(ids: &[u64]) -> BTreeSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_checking_parent_selects_subtree() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let sel = toggle(&tree, &BTreeSet::new(), 4, true);
        assert_eq!(sel, set(&[4, 7, 8]));
    }

    #[test]
    fn test_ancestor_selected_only_when_all_descendants_are() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let sel = toggle(&tree, &BTreeSet::new(), 7, true);
        assert_eq!(sel, set(&[7]));
        let sel = toggle(&tree, &sel, 8, true);
        // Website is complete now; Acme still misses 5 and 6.
        assert_eq!(sel, set(&[4, 7, 8]));
        let sel = toggle(&tree, &sel, 5, true);
        let sel = toggle(&tree, &sel, 6, true);
        assert_eq!(sel, set(&[1, 4, 5, 6, 7, 8]));
    }

    #[test]
    fn test_unchecking_leaf_drops_incomplete_ancestors() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let all_acme = toggle(&tree, &BTreeSet::new(), 1, true);
        let sel = toggle(&tree, &all_acme, 8, false);
        assert_eq!(sel, set(&[5, 6, 7]));
    }

    #[test]
    fn test_toggle_on_then_off_restores_selection() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let start = set(&[9, 2, 3]);
        for id in [1, 4, 5, 7] {
            let on = toggle(&tree, &start, id, true);
            let off = toggle(&tree, &on, id, false);
            assert_eq!(off, start, "toggling {id}");
        }
    }

    #[test]
    fn test_leaf_never_selects_sibling_subtree() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let sel = toggle(&tree, &BTreeSet::new(), 5, true);
        assert_eq!(sel, set(&[5]));
        assert_eq!(check_state(&tree, &sel, 1), Check::Partial);
        assert_eq!(check_state(&tree, &sel, 4), Check::Unchecked);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let projects = forest();
        let tree = ProjectTree::new(&projects);
        let start = set(&[3]);
        assert_eq!(toggle(&tree, &start, 404, true), start);
        assert_eq!(toggle(&tree, &start, 404, false), start);
    }

    #[test]
    fn test_department_as_unit_resolves_active_members() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let db = demo_database(today);
        let mut form = TaskForm::default();
        // Sales: 8 and 9 active, 10 inactive.
        form.toggle_employee(8, true);
        form.toggle_employee(2, true);
        form.toggle_department_all(&db, 4, true);
        assert!(!form.selected_employees.contains(&8));
        assert_eq!(form.resolved_assignee_ids(&db), vec![2, 8, 9]);
        assert_eq!(form.assignee_labels(&db)[0], "Sales (2 people)");

        form.remove_department(4);
        assert_eq!(form.resolved_assignee_ids(&db), vec![2]);
    }

    #[test]
    fn test_all_projects_clears_individual_picks() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let db = demo_database(today);
        let tree = ProjectTree::new(&db.projects);
        let mut form = TaskForm::default();
        form.toggle_project(&tree, 4, true);
        form.toggle_all_projects();
        assert!(form.selected_projects.is_empty());
        assert!(form.has_projects());
        assert_eq!(form.resolved_project_ids(&db).len(), db.projects.len());
        form.toggle_project(&tree, 9, true);
        assert!(!form.all_projects);
    }

    #[test]
    fn test_chips_show_top_picks_and_remove_subtrees() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let db = demo_database(today);
        let tree = ProjectTree::new(&db.projects);
        let mut form = TaskForm::default();
        form.toggle_project(&tree, 4, true);
        form.toggle_project(&tree, 5, true);
        assert_eq!(form.selected_projects, set(&[4, 5, 7, 8]));
        assert_eq!(form.project_chips(&db), vec![Chip::Project(4), Chip::Project(5)]);

        form.remove_chip(&tree, Chip::Project(4));
        assert_eq!(form.selected_projects, set(&[5]));

        form.toggle_department_all(&db, 2, true);
        form.toggle_employee(1, true);
        form.toggle_employee(5, true);
        // Novikov is covered by the whole Design department.
        assert_eq!(form.assignee_chips(&db), vec![Chip::Department(2), Chip::Employee(1)]);
        form.remove_chip(&tree, Chip::Employee(1));
        form.remove_chip(&tree, Chip::Department(2));
        assert_eq!(form.resolved_assignee_ids(&db), vec![5]);

        form.toggle_all_projects();
        assert_eq!(form.project_chips(&db), vec![Chip::AllProjects]);
        form.remove_chip(&tree, Chip::AllProjects);
        assert!(!form.has_projects());
    }

    #[test]
    fn test_filter_department_pick_brings_members() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let db = demo_database(today);
        let mut picks = FilterPicks::default();
        picks.toggle_filter_department(&db, 1, true);
        assert_eq!(picks.employee_ids, set(&[1, 2, 3]));
        picks.toggle_filter_employee(5, true);
        picks.toggle_filter_department(&db, 1, false);
        assert_eq!(picks.employee_ids, set(&[5]));
        assert!(picks.department_ids.is_empty());
    }
}
