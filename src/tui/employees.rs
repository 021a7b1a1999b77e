//! Employees page: the staff directory grouped by department, with editors
//! for employees and departments.

use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::api;
use crate::db::{pluralize, Database, Store};
use crate::error::AppError;
use crate::staff::{DepartmentDraft, EmployeeDraft};
use crate::tree::{group_by_department, search_employees};
use crate::tui::colors::{GOLD, MUTED};
use crate::tui::enums::{Action, ConfirmOp};
use crate::tui::input::InputField;
use crate::tui::utils::{centered_rect, clamp_cursor, step_cursor};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Row {
    Department(u64),
    Employee(u64),
}

/// Text fields of the employee editor; the department is picked separately.
const EMPLOYEE_LABELS: [&str; 5] = ["First name", "Last name", "Email", "Phone", "Position"];

enum Editor {
    Employee {
        editing: Option<u64>,
        fields: [InputField; 5],
        department_id: Option<u64>,
        /// 0..=4 are text fields, 5 is the department.
        focus: usize,
    },
    Department {
        editing: Option<u64>,
        name: InputField,
        description: InputField,
        focus: usize,
    },
}

impl Editor {
    fn new_employee(department_id: Option<u64>) -> Self {
        let mut fields: [InputField; 5] = Default::default();
        fields[0].active = true;
        Editor::Employee { editing: None, fields, department_id, focus: 0 }
    }

    fn edit_employee(db: &Database, id: u64) -> Option<Self> {
        let e = db.employee(id)?;
        let mut fields = [
            InputField::with_value(&e.first_name),
            InputField::with_value(&e.last_name),
            InputField::with_value(&e.email),
            InputField::with_value(e.phone.as_deref().unwrap_or("")),
            InputField::with_value(&e.position),
        ];
        fields[0].active = true;
        Some(Editor::Employee { editing: Some(id), fields, department_id: Some(e.department_id), focus: 0 })
    }

    fn new_department() -> Self {
        Editor::Department {
            editing: None,
            name: InputField { active: true, ..InputField::new() },
            description: InputField::new(),
            focus: 0,
        }
    }

    fn edit_department(db: &Database, id: u64) -> Option<Self> {
        let d = db.department(id)?;
        Some(Editor::Department {
            editing: Some(id),
            name: InputField { active: true, ..InputField::with_value(&d.name) },
            description: InputField::with_value(&d.description),
            focus: 0,
        })
    }

    fn save(&self, db: &mut Database) -> crate::error::Result<&'static str> {
        match self {
            Editor::Employee { editing, fields, department_id, .. } => {
                let phone = fields[3].value.trim();
                let draft = EmployeeDraft {
                    department_id: *department_id,
                    first_name: fields[0].value.clone(),
                    last_name: fields[1].value.clone(),
                    email: fields[2].value.clone(),
                    phone: (!phone.is_empty()).then(|| phone.to_string()),
                    position: fields[4].value.clone(),
                };
                match editing {
                    Some(id) => api::update_employee(db, *id, draft).map(|_| "Employee updated"),
                    None => api::create_employee(db, draft).map(|_| "Employee added"),
                }
            }
            Editor::Department { editing, name, description, .. } => {
                let draft = DepartmentDraft { name: name.value.clone(), description: description.value.clone() };
                match editing {
                    Some(id) => api::update_department(db, *id, draft).map(|_| "Department updated"),
                    None => api::create_department(db, draft).map(|_| "Department created"),
                }
            }
        }
    }

    fn field_count(&self) -> usize {
        match self {
            Editor::Employee { .. } => EMPLOYEE_LABELS.len() + 1,
            Editor::Department { .. } => 2,
        }
    }

    fn focus(&self) -> usize {
        match self {
            Editor::Employee { focus, .. } | Editor::Department { focus, .. } => *focus,
        }
    }

    fn set_focus(&mut self, to: usize) {
        match self {
            Editor::Employee { fields, focus, .. } => {
                *focus = to;
                for (i, f) in fields.iter_mut().enumerate() {
                    f.active = i == to;
                }
            }
            Editor::Department { name, description, focus, .. } => {
                *focus = to;
                name.active = to == 0;
                description.active = to == 1;
            }
        }
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self {
            Editor::Employee { fields, focus, .. } => fields.get_mut(*focus),
            Editor::Department { name, focus: 0, .. } => Some(name),
            Editor::Department { description, .. } => Some(description),
        }
    }
}

#[derive(Default)]
pub struct EmployeesPage {
    cursor: usize,
    search: InputField,
    collapsed: HashSet<u64>,
    hide_inactive: bool,
    editor: Option<Editor>,
}

impl EmployeesPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capturing_input(&self) -> bool {
        self.search.active || self.editor.is_some()
    }

    fn rows(&self, db: &Database) -> Vec<Row> {
        let people: Vec<_> = search_employees(&db.employees, &self.search.value)
            .into_iter()
            .filter(|e| e.is_active || !self.hide_inactive)
            .collect();
        let searching = !self.search.is_empty();
        let mut rows = Vec::new();
        for (dept, members) in group_by_department(&people, &db.departments) {
            if searching && members.is_empty() {
                continue;
            }
            rows.push(Row::Department(dept.id));
            if searching || !self.collapsed.contains(&dept.id) {
                rows.extend(members.iter().map(|e| Row::Employee(e.id)));
            }
        }
        rows
    }

    fn selected(&mut self, db: &Database) -> Option<Row> {
        let rows = self.rows(db);
        self.cursor = clamp_cursor(self.cursor, rows.len());
        rows.get(self.cursor).copied()
    }

    /// Department of the selected row, for new employees.
    fn selected_department(&mut self, db: &Database) -> Option<u64> {
        match self.selected(db)? {
            Row::Department(id) => Some(id),
            Row::Employee(id) => db.employee(id).map(|e| e.department_id),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Action {
        if self.editor.is_some() {
            return self.handle_editor_key(key, store);
        }
        if self.search.active {
            match key.code {
                KeyCode::Esc => {
                    self.search.clear();
                    self.search.active = false;
                }
                KeyCode::Enter => self.search.active = false,
                KeyCode::Backspace => self.search.handle_backspace(),
                KeyCode::Char(c) => self.search.handle_char(c),
                _ => {}
            }
            self.cursor = 0;
            return Action::None;
        }

        let len = self.rows(&store.db).len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = step_cursor(self.cursor, len, false);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = step_cursor(self.cursor, len, true);
                Action::None
            }
            KeyCode::Enter | KeyCode::Left | KeyCode::Right => {
                if let Some(Row::Department(id)) = self.selected(&store.db) {
                    let fold = match key.code {
                        KeyCode::Left => true,
                        KeyCode::Right => false,
                        _ => !self.collapsed.contains(&id),
                    };
                    if fold {
                        self.collapsed.insert(id);
                    } else {
                        self.collapsed.remove(&id);
                    }
                }
                Action::None
            }
            KeyCode::Char('/') => {
                self.search.active = true;
                Action::None
            }
            KeyCode::Char('h') => {
                self.hide_inactive = !self.hide_inactive;
                Action::Selection
            }
            KeyCode::Char('a') => {
                let dept = self.selected_department(&store.db);
                self.editor = Some(Editor::new_employee(dept));
                Action::None
            }
            KeyCode::Char('A') => {
                self.editor = Some(Editor::new_department());
                Action::None
            }
            KeyCode::Char('e') => {
                self.editor = match self.selected(&store.db) {
                    Some(Row::Employee(id)) => Editor::edit_employee(&store.db, id),
                    Some(Row::Department(id)) => Editor::edit_department(&store.db, id),
                    None => None,
                };
                Action::None
            }
            KeyCode::Char('v') => match self.selected(&store.db) {
                Some(Row::Employee(id)) => {
                    let active = store.db.employee(id).is_some_and(|e| e.is_active);
                    let result = api::set_employee_active(&mut store.db, id, !active);
                    Action::commit(store, result, if active { "Employee deactivated" } else { "Employee reactivated" })
                }
                _ => Action::None,
            },
            KeyCode::Char('m') => match self.selected(&store.db) {
                Some(Row::Employee(id)) => {
                    let db = &store.db;
                    let Some(dept) = db.employee(id).and_then(|e| db.department(e.department_id)) else {
                        return Action::None;
                    };
                    let (dept_id, was_manager) = (dept.id, dept.manager_id == Some(id));
                    let manager = if was_manager { None } else { Some(id) };
                    let result = api::set_department_manager(&mut store.db, dept_id, manager);
                    Action::commit(store, result, if was_manager { "Manager removed" } else { "Manager assigned" })
                }
                _ => Action::None,
            },
            KeyCode::Char('d') | KeyCode::Delete => match self.selected(&store.db) {
                Some(Row::Employee(id)) => Action::Confirm(ConfirmOp::DeleteEmployee(id)),
                Some(Row::Department(id)) if store.db.employees.iter().any(|e| e.department_id == id) => {
                    Action::Fail(AppError::Conflict("Cannot delete a department that has employees".into()))
                }
                Some(Row::Department(id)) => Action::Confirm(ConfirmOp::DeleteDepartment(id)),
                None => Action::None,
            },
            _ => Action::Unhandled,
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent, store: &mut Store) -> Action {
        let Some(editor) = self.editor.as_mut() else {
            return Action::Unhandled;
        };
        let save = key.code == KeyCode::Enter
            || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL));
        if save {
            return match editor.save(&mut store.db) {
                Ok(msg) => {
                    self.editor = None;
                    Action::commit(store, Ok(()), msg)
                }
                Err(e) => Action::Fail(e),
            };
        }
        let count = editor.field_count();
        match key.code {
            KeyCode::Esc => self.editor = None,
            KeyCode::Tab | KeyCode::Down => editor.set_focus(step_cursor(editor.focus(), count, true)),
            KeyCode::BackTab | KeyCode::Up => editor.set_focus(step_cursor(editor.focus(), count, false)),
            KeyCode::Left | KeyCode::Right if matches!(editor, Editor::Employee { focus: 5, .. }) => {
                if let Editor::Employee { department_id, .. } = editor {
                    let mut ids: Vec<(i32, u64)> = store.db.departments.iter().map(|d| (d.order, d.id)).collect();
                    ids.sort();
                    let ids: Vec<u64> = ids.into_iter().map(|(_, id)| id).collect();
                    let i = department_id.and_then(|d| ids.iter().position(|x| *x == d));
                    *department_id = match i {
                        Some(i) => ids.get(step_cursor(i, ids.len(), key.code == KeyCode::Right)).copied(),
                        None => ids.first().copied(),
                    };
                }
            }
            code => {
                if let Some(input) = editor.active_input() {
                    match code {
                        KeyCode::Char(c) => input.handle_char(c),
                        KeyCode::Backspace => input.handle_backspace(),
                        KeyCode::Delete => input.handle_delete(),
                        KeyCode::Left => input.move_cursor_left(),
                        KeyCode::Right => input.move_cursor_right(),
                        _ => {}
                    }
                }
            }
        }
        Action::None
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let rows = self.rows(db);
        self.cursor = clamp_cursor(self.cursor, rows.len());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let search = if self.search.active || !self.search.value.is_empty() {
            Span::raw(self.search.display())
        } else {
            Span::styled("Press / to search by name, email or position", Style::default().fg(MUTED))
        };
        f.render_widget(
            Paragraph::new(search).block(Block::default().title("Search").borders(Borders::ALL)),
            chunks[0],
        );

        let items: Vec<ListItem> = rows
            .iter()
            .filter_map(|row| match *row {
                Row::Department(id) => {
                    let d = db.department(id)?;
                    let count = db.employees.iter().filter(|e| e.department_id == id && e.is_active).count();
                    let manager = d
                        .manager_id
                        .and_then(|m| db.employee(m))
                        .map(|m| format!(", head: {}", m.full_name()))
                        .unwrap_or_default();
                    let glyph = if self.collapsed.contains(&id) && self.search.is_empty() { "▸" } else { "▾" };
                    Some(ListItem::new(Line::from(vec![
                        Span::raw(format!("{glyph} ")),
                        Span::styled(d.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(
                            format!("  {}{manager}", pluralize(count, "person", "people")),
                            Style::default().fg(MUTED),
                        ),
                    ])))
                }
                Row::Employee(id) => {
                    let e = db.employee(id)?;
                    let name_style = if e.is_active { Style::default() } else { Style::default().fg(MUTED) };
                    let mut spans = vec![
                        Span::styled(format!("    {} ", e.initials()), Style::default().fg(GOLD)),
                        Span::styled(e.full_name(), name_style),
                        Span::styled(format!("  {}  {}", e.position, e.email), Style::default().fg(MUTED)),
                    ];
                    if let Some(phone) = &e.phone {
                        spans.push(Span::styled(format!("  {phone}"), Style::default().fg(MUTED)));
                    }
                    if !e.is_active {
                        spans.push(Span::styled("  inactive", Style::default().fg(Color::Red)));
                    }
                    Some(ListItem::new(Line::from(spans)))
                }
            })
            .collect();
        let active = db.employees.iter().filter(|e| e.is_active).count();
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Employees ({active} active, {} departments)", db.departments.len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        let mut state = ListState::default().with_selected(Some(self.cursor));
        f.render_stateful_widget(list, chunks[1], &mut state);

        f.render_widget(
            Paragraph::new(Span::styled(
                "a add employee  A add department  e edit  d delete  v (de)activate  m head of department  h hide inactive",
                Style::default().fg(MUTED),
            )),
            chunks[2],
        );

        if let Some(editor) = &self.editor {
            render_editor(f, area, db, editor);
        }
    }
}

fn render_editor(f: &mut Frame, area: Rect, db: &Database, editor: &Editor) {
    let focused = |on: bool| if on { Style::default().fg(GOLD) } else { Style::default() };
    match editor {
        Editor::Employee { editing, fields, department_id, focus } => {
            let area = centered_rect(60, 80, area);
            f.render_widget(Clear, area);
            let outer = Block::default()
                .title(if editing.is_some() { "Edit employee" } else { "New employee" })
                .title_bottom("Tab next  ←/→ department  Enter save  Esc cancel")
                .borders(Borders::ALL);
            let inner = outer.inner(area);
            f.render_widget(outer, area);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3); 6])
                .split(inner);
            for (i, (field, label)) in fields.iter().zip(EMPLOYEE_LABELS).enumerate() {
                f.render_widget(
                    Paragraph::new(field.display())
                        .block(Block::default().title(label).borders(Borders::ALL).border_style(focused(*focus == i))),
                    parts[i],
                );
            }
            let dept = department_id
                .and_then(|id| db.department(id))
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "(choose with ←/→)".to_string());
            f.render_widget(
                Paragraph::new(dept)
                    .block(Block::default().title("Department").borders(Borders::ALL).border_style(focused(*focus == 5))),
                parts[5],
            );
        }
        Editor::Department { editing, name, description, focus } => {
            let area = centered_rect(50, 40, area);
            f.render_widget(Clear, area);
            let outer = Block::default()
                .title(if editing.is_some() { "Edit department" } else { "New department" })
                .title_bottom("Tab next  Enter save  Esc cancel")
                .borders(Borders::ALL);
            let inner = outer.inner(area);
            f.render_widget(outer, area);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(3)])
                .split(inner);
            f.render_widget(
                Paragraph::new(name.display())
                    .block(Block::default().title("Name").borders(Borders::ALL).border_style(focused(*focus == 0))),
                parts[0],
            );
            f.render_widget(
                Paragraph::new(description.display()).block(
                    Block::default().title("Description").borders(Borders::ALL).border_style(focused(*focus == 1)),
                ),
                parts[1],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;
    use chrono::Local;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn store() -> Store {
        Store::in_memory(demo_database(Local::now().date_naive()))
    }

    fn type_text(page: &mut EmployeesPage, store: &mut Store, text: &str) {
        for c in text.chars() {
            page.handle_key(key(KeyCode::Char(c)), store);
        }
    }

    #[test]
    fn test_rows_group_and_fold() {
        let store = store();
        let mut page = EmployeesPage::new();
        assert_eq!(page.rows(&store.db).len(), 4 + 10);
        page.collapsed.insert(1);
        assert_eq!(page.rows(&store.db).len(), 4 + 7);
        page.hide_inactive = true;
        assert_eq!(page.rows(&store.db).len(), 4 + 6);
    }

    #[test]
    fn test_add_employee_in_selected_department() {
        let mut store = store();
        let mut page = EmployeesPage::new();
        page.handle_key(key(KeyCode::Char('a')), &mut store);
        type_text(&mut page, &mut store, "Olga");
        page.handle_key(key(KeyCode::Tab), &mut store);
        type_text(&mut page, &mut store, "Orlova");
        page.handle_key(key(KeyCode::Tab), &mut store);
        type_text(&mut page, &mut store, "olga.orlova@company.example");
        page.handle_key(key(KeyCode::Tab), &mut store);
        page.handle_key(key(KeyCode::Tab), &mut store);
        type_text(&mut page, &mut store, "Tester");
        let action = page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(matches!(action, Action::Notice(..)), "{action:?}");
        let olga = store.db.employees.iter().find(|e| e.last_name == "Orlova").unwrap();
        assert_eq!(olga.department_id, 1);
        assert_eq!(olga.phone, None);
    }

    #[test]
    fn test_duplicate_email_keeps_editor_open() {
        let mut store = store();
        let mut page = EmployeesPage::new();
        // Development is sorted by last name: Kozlov, Petrov, Sidorova.
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Char('e')), &mut store);
        if let Some(Editor::Employee { fields, .. }) = page.editor.as_mut() {
            fields[2].set("MARIA.SIDOROVA@company.example");
        }
        let action = page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(matches!(action, Action::Fail(AppError::Validation(_))), "{action:?}");
        assert!(page.editor.is_some());
        assert_eq!(store.db.employee(3).unwrap().email, "alexey.kozlov@company.example");
    }

    #[test]
    fn test_department_with_staff_is_not_deleted() {
        let mut store = store();
        let mut page = EmployeesPage::new();
        assert!(matches!(
            page.handle_key(key(KeyCode::Char('d')), &mut store),
            Action::Fail(AppError::Conflict(_))
        ));
        page.handle_key(key(KeyCode::Down), &mut store);
        assert!(matches!(
            page.handle_key(key(KeyCode::Char('d')), &mut store),
            Action::Confirm(ConfirmOp::DeleteEmployee(_))
        ));
    }

    #[test]
    fn test_toggle_manager() {
        let mut store = store();
        let mut page = EmployeesPage::new();
        page.handle_key(key(KeyCode::Down), &mut store);
        assert_eq!(page.selected(&store.db), Some(Row::Employee(3)));
        page.handle_key(key(KeyCode::Char('m')), &mut store);
        assert_eq!(store.db.department(1).unwrap().manager_id, Some(3));
        page.handle_key(key(KeyCode::Char('m')), &mut store);
        assert_eq!(store.db.department(1).unwrap().manager_id, None);
    }

    #[test]
    fn test_search_hides_empty_departments() {
        let mut store = store();
        let mut page = EmployeesPage::new();
        page.handle_key(key(KeyCode::Char('/')), &mut store);
        type_text(&mut page, &mut store, "designer");
        assert_eq!(page.rows(&store.db), vec![Row::Department(2), Row::Employee(5), Row::Employee(4)]);
    }
}
