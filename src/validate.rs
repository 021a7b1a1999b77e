//! Form validation.
//!
//! Validators collect every failing field in order; the UI only ever shows
//! the first message.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::project::ProjectDraft;
use crate::selection::TaskForm;
use crate::staff::{Employee, EmployeeDraft};

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static PHONE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[+]?[0-9]{7,15}$").ok());

static TIME_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").ok());

fn matches(re: &LazyLock<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

pub fn is_valid_email(email: &str) -> bool {
    !email.is_empty() && matches(&EMAIL_RE, email)
}

/// No other employee uses this address, ignoring case.
pub fn is_email_unique(email: &str, employees: &[Employee], exclude_id: Option<u64>) -> bool {
    let email = email.to_lowercase();
    !employees
        .iter()
        .any(|e| e.email.to_lowercase() == email && Some(e.id) != exclude_id)
}

/// Phone is optional. Spaces, dashes, dots and brackets are separators; what
/// remains must be 7 to 15 digits with an optional leading `+`.
pub fn is_valid_phone(phone: &str) -> bool {
    if phone.trim().is_empty() {
        return true;
    }
    if phone.matches('(').count() != phone.matches(')').count() {
        return false;
    }
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-' | '.'))
        .collect();
    matches(&PHONE_RE, &compact)
}

pub fn is_valid_time(time: &str) -> bool {
    matches(&TIME_RE, time)
}

pub fn is_valid_future_date(date: NaiveDate, today: NaiveDate, allow_today: bool) -> bool {
    if allow_today {
        date >= today
    } else {
        date > today
    }
}

/// Ordered list of `(field, message)` failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    errors: Vec<(&'static str, String)>,
}

impl Validation {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.errors.first().map(|(_, m)| m.as_str())
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|(f, _)| *f == field).map(|(_, m)| m.as_str())
    }

    pub fn errors(&self) -> &[(&'static str, String)] {
        &self.errors
    }

    /// Convert into the error the API layer returns.
    pub fn into_result(self) -> crate::error::Result<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some((_, msg)) => Err(crate::error::AppError::Validation(msg)),
        }
    }
}

fn check_name(v: &mut Validation, field: &'static str, value: &str, what: &str, min: usize, max: usize) {
    let len = value.trim().chars().count();
    if len == 0 {
        v.fail(field, format!("Enter a {what}"));
    } else if len < min {
        v.fail(field, format!("The {what} must be at least {min} characters"));
    } else if len > max {
        v.fail(field, format!("The {what} must be at most {max} characters"));
    }
}

fn check_title_and_description(v: &mut Validation, title: &str, description: &str) {
    check_name(v, "title", title, "task title", 3, 200);
    if description.chars().count() > 2000 {
        v.fail("description", "The description must be at most 2000 characters");
    }
}

/// Validate the task form. `time_input` is the time exactly as typed.
/// New tasks cannot be scheduled before `today`; edits keep their date.
pub fn validate_task(form: &TaskForm, time_input: &str, today: NaiveDate) -> Validation {
    let mut v = Validation::default();
    check_title_and_description(&mut v, &form.title, &form.description);
    if !form.has_projects() {
        v.fail("projects", "Select at least one project");
    }
    if !form.has_assignees() {
        v.fail("employees", "Select at least one assignee");
    }
    match form.scheduled_date {
        None => v.fail("scheduled_date", "Choose a date"),
        Some(date) if !form.is_editing() && !is_valid_future_date(date, today, true) => {
            v.fail("scheduled_date", "The date cannot be in the past")
        }
        Some(_) => {}
    }
    let time_input = time_input.trim();
    if time_input.is_empty() {
        v.fail("scheduled_time", "Choose a time");
    } else if !is_valid_time(time_input) {
        v.fail("scheduled_time", "Invalid time format");
    }
    v
}

/// Checks shared by every path that stores a task, the form included.
pub fn validate_task_fields(title: &str, description: &str, project_ids: &[u64], assignee_ids: &[u64]) -> Validation {
    let mut v = Validation::default();
    check_title_and_description(&mut v, title, description);
    if project_ids.is_empty() {
        v.fail("projects", "Select at least one project");
    }
    if assignee_ids.is_empty() {
        v.fail("employees", "Select at least one assignee");
    }
    v
}

pub fn validate_project(draft: &ProjectDraft) -> Validation {
    let mut v = Validation::default();
    check_name(&mut v, "name", &draft.name, "project name", 2, 100);
    if draft.description.chars().count() > 500 {
        v.fail("description", "The description must be at most 500 characters");
    }
    v
}

pub fn validate_department(name: &str) -> Validation {
    let mut v = Validation::default();
    check_name(&mut v, "name", name, "department name", 2, 100);
    v
}

pub fn validate_employee(draft: &EmployeeDraft, employees: &[Employee], exclude_id: Option<u64>) -> Validation {
    let mut v = Validation::default();
    for (field, value, what) in [
        ("first_name", &draft.first_name, "first name"),
        ("last_name", &draft.last_name, "last name"),
    ] {
        let len = value.trim().chars().count();
        if len == 0 {
            v.fail(field, format!("Enter a {what}"));
        } else if len < 2 {
            v.fail(field, format!("The {what} must be at least 2 characters"));
        }
    }

    let email = draft.email.trim();
    if email.is_empty() {
        v.fail("email", "Enter an email");
    } else if !is_valid_email(email) {
        v.fail("email", "Invalid email format");
    } else if !is_email_unique(email, employees, exclude_id) {
        v.fail("email", "This email is already in use");
    }

    if let Some(phone) = &draft.phone {
        if !is_valid_phone(phone) {
            v.fail("phone", "Invalid phone format");
        }
    }
    if draft.department_id.is_none() {
        v.fail("department_id", "Choose a department");
    }
    if draft.position.trim().is_empty() {
        v.fail("position", "Enter a position");
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn employee_draft() -> EmployeeDraft {
        EmployeeDraft {
            department_id: Some(1),
            first_name: "Olga".into(),
            last_name: "Smirnova".into(),
            email: "olga.smirnova@company.example".into(),
            phone: Some("+7 (999) 123-45-67".into()),
            position: "Analyst".into(),
        }
    }

    #[test]
    fn test_email_and_phone_patterns() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(is_valid_phone(""));
        assert!(is_valid_phone("+7 999 123 45 67"));
        assert!(is_valid_phone("+7 (999) 123-45-67"));
        assert!(is_valid_phone("8.999.123.45.67"));
        assert!(!is_valid_phone("+7 (999 123-45-67"));
        assert!(!is_valid_phone("12-34"));
        assert!(!is_valid_phone("7+9991234567"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_seeded_employees_pass_validation() {
        let db = demo_database(today());
        for e in &db.employees {
            let draft = EmployeeDraft {
                department_id: Some(e.department_id),
                first_name: e.first_name.clone(),
                last_name: e.last_name.clone(),
                email: e.email.clone(),
                phone: e.phone.clone(),
                position: e.position.clone(),
            };
            let v = validate_employee(&draft, &db.employees, Some(e.id));
            assert!(v.is_valid(), "{}: {:?}", e.full_name(), v.errors());
        }
    }

    #[test]
    fn test_time_pattern() {
        assert!(is_valid_time("9:05"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("noon"));
    }

    #[test]
    fn test_future_date() {
        let t = today();
        assert!(is_valid_future_date(t, t, true));
        assert!(!is_valid_future_date(t, t, false));
        assert!(!is_valid_future_date(t.pred_opt().unwrap(), t, true));
    }

    #[test]
    fn test_email_uniqueness_ignores_case_and_excluded_id() {
        let db = demo_database(today());
        let taken = db.employees[0].email.to_uppercase();
        assert!(!is_email_unique(&taken, &db.employees, None));
        assert!(is_email_unique(&taken, &db.employees, Some(db.employees[0].id)));

        let mut draft = employee_draft();
        draft.email = taken;
        let v = validate_employee(&draft, &db.employees, None);
        assert_eq!(v.first(), Some("This email is already in use"));
    }

    #[test]
    fn test_employee_report_keeps_field_order() {
        let mut draft = employee_draft();
        draft.first_name = "O".into();
        draft.department_id = None;
        let v = validate_employee(&draft, &[], None);
        assert!(!v.is_valid());
        assert_eq!(v.errors().len(), 2);
        assert_eq!(v.first(), Some("The first name must be at least 2 characters"));
        assert_eq!(v.field("department_id"), Some("Choose a department"));
        assert!(validate_employee(&employee_draft(), &[], None).is_valid());
    }

    #[test]
    fn test_task_form_rules() {
        let mut form = TaskForm::default();
        let v = validate_task(&form, "", today());
        assert_eq!(v.first(), Some("Enter a task title"));
        assert_eq!(v.errors().len(), 5);

        form.title = "Prepare the quarterly report".into();
        form.all_projects = true;
        form.selected_employees.insert(1);
        form.scheduled_date = Some(today());
        assert_eq!(validate_task(&form, "25:00", today()).first(), Some("Invalid time format"));
        assert!(validate_task(&form, "18:00", today()).is_valid());

        form.title = "ab".into();
        assert_eq!(
            validate_task(&form, "18:00", today()).first(),
            Some("The task title must be at least 3 characters")
        );
    }

    #[test]
    fn test_new_task_date_not_in_past() {
        let mut form = TaskForm {
            title: "Prepare the quarterly report".into(),
            all_projects: true,
            scheduled_date: today().pred_opt(),
            ..TaskForm::default()
        };
        form.selected_employees.insert(1);
        assert_eq!(
            validate_task(&form, "18:00", today()).field("scheduled_date"),
            Some("The date cannot be in the past")
        );
        form.editing_task_id = Some(3);
        assert!(validate_task(&form, "18:00", today()).is_valid());
    }

    #[test]
    fn test_project_and_department_names() {
        let draft = ProjectDraft { name: "X".into(), ..Default::default() };
        assert!(!validate_project(&draft).is_valid());
        let draft = ProjectDraft { name: "Mobile app".into(), description: "d".repeat(501), ..Default::default() };
        assert_eq!(validate_project(&draft).field("description"), Some("The description must be at most 500 characters"));
        assert!(validate_department("HR").is_valid());
        assert_eq!(validate_department(&"x".repeat(101)).first(), Some("The department name must be at most 100 characters"));
    }
}
