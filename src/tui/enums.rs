//! Enumerations for TUI state management.

use crate::db::{Database, Store};
use crate::error::{AppError, Result};
use crate::fields::Theme;

/// Top-level pages, in tab order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Page {
    TaskForm,
    TaskList,
    Projects,
    Employees,
    Analytics,
    Settings,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::TaskForm,
        Page::TaskList,
        Page::Projects,
        Page::Employees,
        Page::Analytics,
        Page::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::TaskForm => "New task",
            Page::TaskList => "Tasks",
            Page::Projects => "Projects",
            Page::Employees => "Employees",
            Page::Analytics => "Analytics",
            Page::Settings => "Settings",
        }
    }

    pub fn index(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    /// Neighbouring tab, wrapping around.
    pub fn step(self, forward: bool) -> Page {
        let len = Page::ALL.len();
        let i = self.index();
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        Page::ALL[next]
    }

    /// Page bound to function key `n` (F1 is the task form).
    pub fn from_function_key(n: u8) -> Option<Page> {
        Page::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A destructive operation waiting for a yes/no answer.
#[derive(Clone, PartialEq, Debug)]
pub enum ConfirmOp {
    DeleteTask(u64),
    DeleteProject(u64),
    DeleteDepartment(u64),
    DeleteEmployee(u64),
    RemoveEmail(String),
    ResetDemo,
}

impl ConfirmOp {
    /// Question shown in the overlay.
    pub fn describe(&self, db: &Database) -> String {
        match self {
            ConfirmOp::DeleteTask(id) => match db.task(*id) {
                Some(t) => format!("Delete task \"{}\"?", t.title),
                None => format!("Delete task {id}?"),
            },
            ConfirmOp::DeleteProject(id) => match db.project(*id) {
                Some(p) => format!("Delete project \"{}\"?", p.name),
                None => format!("Delete project {id}?"),
            },
            ConfirmOp::DeleteDepartment(id) => match db.department(*id) {
                Some(d) => format!("Delete department \"{}\"?", d.name),
                None => format!("Delete department {id}?"),
            },
            ConfirmOp::DeleteEmployee(id) => match db.employee(*id) {
                Some(e) => format!("Delete employee {}?", e.full_name()),
                None => format!("Delete employee {id}?"),
            },
            ConfirmOp::RemoveEmail(email) => format!("Stop sending notifications to {email}?"),
            ConfirmOp::ResetDemo => "Replace all data with the demo dataset?".to_string(),
        }
    }
}

/// What a page asks the app to do after handling a key.
#[derive(Debug)]
pub enum Action {
    /// Key consumed, nothing else to do.
    None,
    /// Key not used by the page; the app may apply its global binding.
    Unhandled,
    Notice(ToastKind, String),
    Fail(AppError),
    Confirm(ConfirmOp),
    Goto(Page),
    EditTask(u64),
    SetTheme(Theme),
    /// A pick changed; only feedback is needed.
    Selection,
    /// Several actions, applied in order.
    Batch(Vec<Action>),
}

impl Action {
    /// Save after a mutation and turn the outcome into a toast.
    pub fn commit<T>(store: &Store, result: Result<T>, success: impl Into<String>) -> Action {
        match result.and_then(|_| store.save()) {
            Ok(()) => Action::Notice(ToastKind::Success, success.into()),
            Err(e) => Action::Fail(e),
        }
    }

    pub fn info(msg: impl Into<String>) -> Action {
        Action::Notice(ToastKind::Info, msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Action {
        Action::Fail(AppError::Validation(msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_navigation_helpers() {
        assert_eq!(Page::TaskForm.step(false), Page::Settings);
        assert_eq!(Page::Settings.step(true), Page::TaskForm);
        assert_eq!(Page::from_function_key(2), Some(Page::TaskList));
        assert_eq!(Page::from_function_key(0), None);
        assert_eq!(Page::from_function_key(7), None);
    }

    #[test]
    fn test_commit_on_memory_store() {
        let store = Store::in_memory(Database::default());
        assert!(matches!(Action::commit(&store, Ok(()), "Saved"), Action::Notice(ToastKind::Success, m) if m == "Saved"));
        let failed: Result<()> = Err(AppError::Conflict("busy".into()));
        assert!(matches!(Action::commit(&store, failed, "Saved"), Action::Fail(AppError::Conflict(_))));
    }
}
