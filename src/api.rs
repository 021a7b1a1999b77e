//! Operations shared by the CLI and the TUI.
//!
//! Each call validates its input, enforces the pre-delete checks and then
//! mutates the `Database` in place. Callers decide when to save.

use std::collections::{BTreeSet, HashSet};

use chrono::{Local, NaiveDateTime};

use crate::analytics::{build_report, Period, Report};
use crate::db::{now_utc, Database};
use crate::error::{AppError, Result};
use crate::fields::TaskStatus;
use crate::filter::tasks_in_projects;
use crate::notify::NotificationSettings;
use crate::project::{parse_hex_color, random_unused_color, Project, ProjectDraft};
use crate::staff::{Department, DepartmentDraft, Employee, EmployeeDraft};
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::tree::ProjectTree;
use crate::validate::{is_valid_email, validate_department, validate_employee, validate_project, validate_task_fields};

fn check_references(db: &Database, project_ids: &[u64], assignee_ids: &[u64]) -> Result<()> {
    if let Some(id) = project_ids.iter().find(|id| db.project(**id).is_none()) {
        return Err(AppError::not_found("Project", *id));
    }
    if let Some(id) = assignee_ids.iter().find(|id| db.employee(**id).is_none()) {
        return Err(AppError::not_found("Employee", *id));
    }
    Ok(())
}

fn dedup(ids: Vec<u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// ----- tasks -----

pub fn create_task(db: &mut Database, draft: TaskDraft, creator_id: Option<i64>) -> Result<u64> {
    let project_ids = dedup(draft.project_ids);
    let assignee_ids = dedup(draft.assignee_ids);
    validate_task_fields(&draft.title, &draft.description, &project_ids, &assignee_ids).into_result()?;
    check_references(db, &project_ids, &assignee_ids)?;

    let id = db.next_task_id();
    let now = now_utc();
    db.tasks.push(Task {
        id,
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        project_ids,
        assignee_ids,
        creator_id,
        status: TaskStatus::Pending,
        priority: draft.priority,
        scheduled_date: draft.scheduled_date,
        scheduled_time: draft.scheduled_time,
        reminders_enabled: true,
        last_reminder_utc: None,
        next_reminder_utc: None,
        completed_at_utc: None,
        created_at_utc: now,
        updated_at_utc: now,
    });
    log::info!("created task {id}");
    Ok(id)
}

fn apply_status(task: &mut Task, status: TaskStatus, now: i64) {
    if status == TaskStatus::Completed && task.status != TaskStatus::Completed {
        task.completed_at_utc = Some(now);
    } else if status != TaskStatus::Completed {
        task.completed_at_utc = None;
    }
    task.status = status;
}

pub fn update_task(db: &mut Database, id: u64, patch: TaskPatch) -> Result<()> {
    let current = db.task(id).ok_or_else(|| AppError::not_found("Task", id))?;
    let mut next = current.clone();
    if let Some(title) = patch.title {
        next.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
        next.description = description.trim().to_string();
    }
    if let Some(ids) = patch.project_ids {
        next.project_ids = dedup(ids);
    }
    if let Some(ids) = patch.assignee_ids {
        next.assignee_ids = dedup(ids);
    }
    if let Some(date) = patch.scheduled_date {
        next.scheduled_date = date;
    }
    if let Some(time) = patch.scheduled_time {
        next.scheduled_time = time;
    }
    if let Some(priority) = patch.priority {
        next.priority = priority;
    }
    if let Some(enabled) = patch.reminders_enabled {
        next.reminders_enabled = enabled;
    }
    validate_task_fields(&next.title, &next.description, &next.project_ids, &next.assignee_ids).into_result()?;
    check_references(db, &next.project_ids, &next.assignee_ids)?;

    let now = now_utc();
    if let Some(status) = patch.status {
        apply_status(&mut next, status, now);
    }
    next.updated_at_utc = now;
    if let Some(task) = db.task_mut(id) {
        *task = next;
    }
    log::info!("updated task {id}");
    Ok(())
}

/// Completing a task stamps `completed_at_utc`; any other status clears it.
pub fn set_task_status(db: &mut Database, id: u64, status: TaskStatus) -> Result<()> {
    let task = db.task_mut(id).ok_or_else(|| AppError::not_found("Task", id))?;
    let now = now_utc();
    apply_status(task, status, now);
    task.updated_at_utc = now;
    log::info!("task {id} is now {status:?}");
    Ok(())
}

pub fn delete_task(db: &mut Database, id: u64) -> Result<()> {
    if db.task(id).is_none() {
        return Err(AppError::not_found("Task", id));
    }
    db.remove_task_ids(&HashSet::from([id]));
    log::info!("deleted task {id}");
    Ok(())
}

/// Remove every listed task that exists; returns how many went.
pub fn delete_tasks(db: &mut Database, ids: &[u64]) -> usize {
    let ids: HashSet<u64> = ids.iter().copied().collect();
    let before = db.tasks.len();
    db.remove_task_ids(&ids);
    before - db.tasks.len()
}

// ----- projects -----

fn check_color(color: &str) -> Result<()> {
    match parse_hex_color(color) {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!("Invalid colour {color}, expected #RRGGBB"))),
    }
}

pub fn create_project(db: &mut Database, draft: ProjectDraft) -> Result<u64> {
    validate_project(&draft).into_result()?;
    if let Some(parent) = draft.parent_id {
        db.project(parent).ok_or_else(|| AppError::not_found("Project", parent))?;
    }
    let color = match draft.color {
        Some(c) => {
            check_color(&c)?;
            c.to_uppercase()
        }
        None => random_unused_color(&db.projects),
    };
    let order = db
        .projects
        .iter()
        .filter(|p| p.parent_id == draft.parent_id)
        .map(|p| p.order)
        .max()
        .unwrap_or(0)
        + 1;
    let id = db.next_project_id();
    let now = now_utc();
    db.projects.push(Project {
        id,
        parent_id: draft.parent_id,
        name: draft.name.trim().to_string(),
        color,
        description: draft.description.trim().to_string(),
        order,
        created_at_utc: now,
        updated_at_utc: now,
    });
    log::info!("created project {id}");
    Ok(id)
}

/// Replace name, description, colour and parent. Moving a project under
/// itself or one of its descendants is refused.
pub fn update_project(db: &mut Database, id: u64, draft: ProjectDraft) -> Result<()> {
    validate_project(&draft).into_result()?;
    db.project(id).ok_or_else(|| AppError::not_found("Project", id))?;
    if let Some(parent) = draft.parent_id {
        db.project(parent).ok_or_else(|| AppError::not_found("Project", parent))?;
        let tree = ProjectTree::new(&db.projects);
        if parent == id || tree.is_descendant_of(parent, id) {
            return Err(AppError::Conflict("A project cannot be moved under itself".into()));
        }
    }
    if let Some(c) = &draft.color {
        check_color(c)?;
    }
    let project = db.project_mut(id).ok_or_else(|| AppError::not_found("Project", id))?;
    project.name = draft.name.trim().to_string();
    project.description = draft.description.trim().to_string();
    project.parent_id = draft.parent_id;
    if let Some(c) = draft.color {
        project.color = c.to_uppercase();
    }
    project.updated_at_utc = now_utc();
    log::info!("updated project {id}");
    Ok(())
}

pub fn delete_project(db: &mut Database, id: u64) -> Result<()> {
    db.project(id).ok_or_else(|| AppError::not_found("Project", id))?;
    if db.projects.iter().any(|p| p.parent_id == Some(id)) {
        return Err(AppError::Conflict("Delete the sub-projects first".into()));
    }
    if db.tasks.iter().any(|t| t.project_ids.contains(&id)) {
        return Err(AppError::Conflict("The project still has tasks".into()));
    }
    db.projects.retain(|p| p.id != id);
    log::info!("deleted project {id}");
    Ok(())
}

/// Delete projects together with their whole subtrees. Refused when any
/// task references a project in the set.
pub fn delete_projects(db: &mut Database, ids: &[u64]) -> Result<usize> {
    let tree = ProjectTree::new(&db.projects);
    let mut doomed = BTreeSet::new();
    for &id in ids {
        if !tree.contains(id) {
            return Err(AppError::not_found("Project", id));
        }
        doomed.insert(id);
        doomed.extend(tree.descendants(id));
    }
    let blocking = tasks_in_projects(&db.tasks, &doomed);
    if !blocking.is_empty() {
        return Err(AppError::Conflict(format!(
            "{} still reference these projects",
            crate::db::pluralize(blocking.len(), "task", "tasks")
        )));
    }
    db.projects.retain(|p| !doomed.contains(&p.id));
    log::info!("deleted {} projects", doomed.len());
    Ok(doomed.len())
}

// ----- departments -----

pub fn create_department(db: &mut Database, draft: DepartmentDraft) -> Result<u64> {
    validate_department(&draft.name).into_result()?;
    let id = db.next_department_id();
    let now = now_utc();
    let order = db.departments.iter().map(|d| d.order).max().unwrap_or(0) + 1;
    db.departments.push(Department {
        id,
        name: draft.name.trim().to_string(),
        description: draft.description.trim().to_string(),
        manager_id: None,
        order,
        created_at_utc: now,
        updated_at_utc: now,
    });
    log::info!("created department {id}");
    Ok(id)
}

pub fn update_department(db: &mut Database, id: u64, draft: DepartmentDraft) -> Result<()> {
    validate_department(&draft.name).into_result()?;
    let dept = db.department_mut(id).ok_or_else(|| AppError::not_found("Department", id))?;
    dept.name = draft.name.trim().to_string();
    dept.description = draft.description.trim().to_string();
    dept.updated_at_utc = now_utc();
    Ok(())
}

pub fn set_department_manager(db: &mut Database, id: u64, manager_id: Option<u64>) -> Result<()> {
    if let Some(m) = manager_id {
        let emp = db.employee(m).ok_or_else(|| AppError::not_found("Employee", m))?;
        if emp.department_id != id {
            return Err(AppError::Validation("The manager must belong to the department".into()));
        }
    }
    let dept = db.department_mut(id).ok_or_else(|| AppError::not_found("Department", id))?;
    dept.manager_id = manager_id;
    dept.updated_at_utc = now_utc();
    Ok(())
}

pub fn delete_department(db: &mut Database, id: u64) -> Result<()> {
    db.department(id).ok_or_else(|| AppError::not_found("Department", id))?;
    if db.employees.iter().any(|e| e.department_id == id) {
        return Err(AppError::Conflict("Cannot delete a department that has employees".into()));
    }
    db.departments.retain(|d| d.id != id);
    log::info!("deleted department {id}");
    Ok(())
}

// ----- employees -----

fn department_of(db: &Database, draft: &EmployeeDraft) -> Result<u64> {
    let id = draft
        .department_id
        .ok_or_else(|| AppError::Validation("Choose a department".into()))?;
    db.department(id).ok_or_else(|| AppError::not_found("Department", id))?;
    Ok(id)
}

fn clean_phone(phone: &Option<String>) -> Option<String> {
    phone.as_deref().map(str::trim).filter(|p| !p.is_empty()).map(str::to_string)
}

pub fn create_employee(db: &mut Database, draft: EmployeeDraft) -> Result<u64> {
    validate_employee(&draft, &db.employees, None).into_result()?;
    let department_id = department_of(db, &draft)?;
    let id = db.next_employee_id();
    let now = now_utc();
    db.employees.push(Employee {
        id,
        department_id,
        first_name: draft.first_name.trim().to_string(),
        last_name: draft.last_name.trim().to_string(),
        email: draft.email.trim().to_string(),
        phone: clean_phone(&draft.phone),
        position: draft.position.trim().to_string(),
        is_active: true,
        created_at_utc: now,
        updated_at_utc: now,
    });
    log::info!("created employee {id}");
    Ok(id)
}

pub fn update_employee(db: &mut Database, id: u64, draft: EmployeeDraft) -> Result<()> {
    let previous = db.employee(id).ok_or_else(|| AppError::not_found("Employee", id))?.department_id;
    validate_employee(&draft, &db.employees, Some(id)).into_result()?;
    let department_id = department_of(db, &draft)?;
    if previous != department_id {
        // A manager who moves out no longer heads the old department.
        for dept in db
            .departments
            .iter_mut()
            .filter(|d| d.id == previous && d.manager_id == Some(id))
        {
            dept.manager_id = None;
        }
    }
    let emp = db.employee_mut(id).ok_or_else(|| AppError::not_found("Employee", id))?;
    emp.department_id = department_id;
    emp.first_name = draft.first_name.trim().to_string();
    emp.last_name = draft.last_name.trim().to_string();
    emp.email = draft.email.trim().to_string();
    emp.phone = clean_phone(&draft.phone);
    emp.position = draft.position.trim().to_string();
    emp.updated_at_utc = now_utc();
    Ok(())
}

pub fn set_employee_active(db: &mut Database, id: u64, active: bool) -> Result<()> {
    let emp = db.employee_mut(id).ok_or_else(|| AppError::not_found("Employee", id))?;
    emp.is_active = active;
    emp.updated_at_utc = now_utc();
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeRemoval {
    Removed,
    /// Still assigned to active tasks, so only marked inactive.
    Deactivated,
}

pub fn delete_employee(db: &mut Database, id: u64) -> Result<EmployeeRemoval> {
    db.employee(id).ok_or_else(|| AppError::not_found("Employee", id))?;
    let busy = db
        .tasks
        .iter()
        .any(|t| !t.status.is_terminal() && t.assignee_ids.contains(&id));
    if busy {
        set_employee_active(db, id, false)?;
        log::info!("deactivated employee {id}");
        return Ok(EmployeeRemoval::Deactivated);
    }
    db.employees.retain(|e| e.id != id);
    for dept in db.departments.iter_mut().filter(|d| d.manager_id == Some(id)) {
        dept.manager_id = None;
    }
    log::info!("deleted employee {id}");
    Ok(EmployeeRemoval::Removed)
}

/// Apply `delete_employee` to each id; returns (removed, deactivated).
pub fn delete_employees(db: &mut Database, ids: &[u64]) -> Result<(usize, usize)> {
    if let Some(id) = ids.iter().find(|id| db.employee(**id).is_none()) {
        return Err(AppError::not_found("Employee", *id));
    }
    let mut counts = (0, 0);
    for &id in ids {
        match delete_employee(db, id)? {
            EmployeeRemoval::Removed => counts.0 += 1,
            EmployeeRemoval::Deactivated => counts.1 += 1,
        }
    }
    Ok(counts)
}

// ----- settings -----

pub fn update_settings(db: &mut Database, settings: NotificationSettings) -> Result<()> {
    if let Some(bad) = settings.emails.iter().find(|e| !is_valid_email(e)) {
        return Err(AppError::Validation(format!("Invalid email {bad}")));
    }
    db.settings = settings;
    Ok(())
}

/// Add a notification address; `false` when it is already listed.
pub fn add_notification_email(db: &mut Database, email: &str) -> Result<bool> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email format".into()));
    }
    if db.settings.emails.iter().any(|e| e.eq_ignore_ascii_case(email)) {
        return Ok(false);
    }
    db.settings.emails.push(email.to_string());
    Ok(true)
}

/// Remove a notification address; `false` when it was not listed.
pub fn remove_notification_email(db: &mut Database, email: &str) -> bool {
    let before = db.settings.emails.len();
    db.settings.emails.retain(|e| !e.eq_ignore_ascii_case(email.trim()));
    before != db.settings.emails.len()
}

// ----- analytics -----

pub fn analytics(db: &Database, period: Period) -> Report {
    analytics_at(db, period, Local::now().naive_local())
}

pub fn analytics_at(db: &Database, period: Period, now: NaiveDateTime) -> Report {
    build_report(db, period, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::seed::demo_database;
    use chrono::{NaiveDate, NaiveTime};

    fn db() -> Database {
        demo_database(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: String::new(),
            project_ids: vec![5, 5],
            assignee_ids: vec![1],
            scheduled_date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            priority: Priority::High,
        }
    }

    fn employee(email: &str) -> EmployeeDraft {
        EmployeeDraft {
            department_id: Some(2),
            first_name: "Nina".into(),
            last_name: "Orlova".into(),
            email: email.into(),
            phone: None,
            position: "Designer".into(),
        }
    }

    #[test]
    fn test_create_task_assigns_next_id_and_pending() {
        let mut db = db();
        let id = create_task(&mut db, draft("  Write release notes "), Some(42)).unwrap();
        assert_eq!(id, 9);
        let task = db.task(id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.title, "Write release notes");
        assert_eq!(task.project_ids, vec![5]);
        assert_eq!(task.creator_id, Some(42));
    }

    #[test]
    fn test_create_task_rejects_bad_input() {
        let mut db = db();
        assert!(matches!(create_task(&mut db, draft("ab"), None), Err(AppError::Validation(_))));
        let mut d = draft("Valid title");
        d.assignee_ids = vec![404];
        assert!(matches!(create_task(&mut db, d, None), Err(AppError::NotFound { entity: "Employee", id: 404 })));
        assert_eq!(db.tasks.len(), 8);
    }

    #[test]
    fn test_status_change_stamps_completion() {
        let mut db = db();
        set_task_status(&mut db, 1, TaskStatus::Completed).unwrap();
        assert!(db.task(1).unwrap().completed_at_utc.is_some());
        set_task_status(&mut db, 1, TaskStatus::InProgress).unwrap();
        assert!(db.task(1).unwrap().completed_at_utc.is_none());
        assert!(set_task_status(&mut db, 99, TaskStatus::Completed).is_err());
    }

    #[test]
    fn test_update_task_patch() {
        let mut db = db();
        let patch = TaskPatch { title: Some("Build OAuth login".into()), status: Some(TaskStatus::Cancelled), ..Default::default() };
        update_task(&mut db, 1, patch).unwrap();
        let t = db.task(1).unwrap();
        assert_eq!(t.title, "Build OAuth login");
        assert_eq!(t.status, TaskStatus::Cancelled);
        assert_eq!(t.assignee_ids, vec![1, 2]);

        let bad = TaskPatch { project_ids: Some(vec![]), ..Default::default() };
        assert!(update_task(&mut db, 1, bad).is_err());
        assert_eq!(db.task(1).unwrap().project_ids, vec![5]);
    }

    #[test]
    fn test_delete_tasks_drops_reminders() {
        let mut db = db();
        assert_eq!(delete_tasks(&mut db, &[3, 7, 404]), 2);
        assert!(db.reminders.is_empty());
        assert!(matches!(delete_task(&mut db, 3), Err(AppError::NotFound { .. })));
    }

    #[test]
    fn test_project_pre_delete_checks() {
        let mut db = db();
        assert!(matches!(delete_project(&mut db, 4), Err(AppError::Conflict(_))));
        assert!(matches!(delete_project(&mut db, 11), Err(AppError::Conflict(_))));
        delete_project(&mut db, 10).unwrap();
        assert!(db.project(10).is_none());
    }

    #[test]
    fn test_bulk_project_delete_cascades() {
        let mut db = db();
        assert!(matches!(delete_projects(&mut db, &[4]), Err(AppError::Conflict(_))));
        delete_tasks(&mut db, &[2, 3, 5]);
        assert_eq!(delete_projects(&mut db, &[4]).unwrap(), 3);
        assert!(db.project(7).is_none());
        assert!(db.project(8).is_none());
    }

    #[test]
    fn test_project_cannot_move_under_descendant() {
        let mut db = db();
        let d = ProjectDraft { parent_id: Some(7), name: "Company website".into(), ..Default::default() };
        assert!(matches!(update_project(&mut db, 4, d), Err(AppError::Conflict(_))));
        let d = ProjectDraft { parent_id: Some(2), name: "Company website".into(), ..Default::default() };
        update_project(&mut db, 4, d).unwrap();
        assert_eq!(db.project(4).unwrap().parent_id, Some(2));
    }

    #[test]
    fn test_create_project_order_and_color() {
        let mut db = db();
        let d = ProjectDraft { parent_id: Some(3), name: "Hiring".into(), color: Some("#aabbcc".into()), ..Default::default() };
        let id = create_project(&mut db, d).unwrap();
        let p = db.project(id).unwrap();
        assert_eq!(p.order, 3);
        assert_eq!(p.color, "#AABBCC");
        let d = ProjectDraft { name: "Bad colour".into(), color: Some("blue".into()), ..Default::default() };
        assert!(create_project(&mut db, d).is_err());
    }

    #[test]
    fn test_department_with_employees_is_kept() {
        let mut db = db();
        assert!(matches!(delete_department(&mut db, 1), Err(AppError::Conflict(_))));
        let id = create_department(&mut db, DepartmentDraft { name: "Support".into(), description: String::new() }).unwrap();
        delete_department(&mut db, id).unwrap();
    }

    #[test]
    fn test_busy_employee_is_deactivated() {
        let mut db = db();
        assert_eq!(delete_employee(&mut db, 2).unwrap(), EmployeeRemoval::Deactivated);
        assert!(!db.employee(2).unwrap().is_active);

        let id = create_employee(&mut db, employee("nina.orlova@company.example")).unwrap();
        assert_eq!(delete_employee(&mut db, id).unwrap(), EmployeeRemoval::Removed);
        assert!(db.employee(id).is_none());
    }

    #[test]
    fn test_bulk_employee_delete_counts() {
        let mut db = db();
        // 10 is inactive with no tasks; 8 is on an active task.
        assert_eq!(delete_employees(&mut db, &[10, 8]).unwrap(), (1, 1));
        assert!(db.department(4).unwrap().manager_id == Some(8));
    }

    #[test]
    fn test_employee_email_must_be_unique() {
        let mut db = db();
        let dup = employee("IVAN.PETROV@company.example");
        assert!(matches!(create_employee(&mut db, dup.clone()), Err(AppError::Validation(_))));
        update_employee(&mut db, 1, EmployeeDraft { department_id: Some(1), ..dup }).unwrap();
        assert_eq!(db.employee(1).unwrap().first_name, "Nina");
    }

    fn draft_of(db: &Database, id: u64) -> EmployeeDraft {
        let e = db.employee(id).unwrap();
        EmployeeDraft {
            department_id: Some(e.department_id),
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            email: e.email.clone(),
            phone: e.phone.clone(),
            position: e.position.clone(),
        }
    }

    #[test]
    fn test_seeded_employee_edit_keeps_phone() {
        let mut db = db();
        let draft = EmployeeDraft { position: "Principal".into(), ..draft_of(&db, 1) };
        update_employee(&mut db, 1, draft).unwrap();
        let e = db.employee(1).unwrap();
        assert_eq!(e.position, "Principal");
        assert_eq!(e.phone.as_deref(), Some("+7 (999) 123-45-67"));
    }

    #[test]
    fn test_empty_phone_clears_it() {
        let mut db = db();
        let draft = EmployeeDraft { phone: Some("  ".into()), ..draft_of(&db, 2) };
        update_employee(&mut db, 2, draft).unwrap();
        assert_eq!(db.employee(2).unwrap().phone, None);
    }

    #[test]
    fn test_moving_manager_clears_old_department() {
        let mut db = db();
        assert_eq!(db.department(1).unwrap().manager_id, Some(1));
        let draft = EmployeeDraft { department_id: Some(2), ..draft_of(&db, 1) };
        update_employee(&mut db, 1, draft).unwrap();
        assert_eq!(db.department(1).unwrap().manager_id, None);
        assert_eq!(db.department(2).unwrap().manager_id, Some(4));

        // Staying in the same department keeps the role.
        let draft = EmployeeDraft { position: "Art Director".into(), ..draft_of(&db, 4) };
        update_employee(&mut db, 4, draft).unwrap();
        assert_eq!(db.department(2).unwrap().manager_id, Some(4));
    }

    #[test]
    fn test_notification_emails() {
        let mut db = db();
        assert!(!add_notification_email(&mut db, "ADMIN@company.example").unwrap());
        assert!(add_notification_email(&mut db, "ops@company.example").unwrap());
        assert!(add_notification_email(&mut db, "nope").is_err());
        assert!(remove_notification_email(&mut db, "admin@company.example"));
        assert!(!remove_notification_email(&mut db, "admin@company.example"));
        assert_eq!(db.settings.emails, vec!["ops@company.example".to_string()]);
    }
}
