//! Task form handling for the terminal user interface.
//!
//! The form collects a title, description, project and assignee picks, a
//! deadline and a priority. Projects are picked from the tree with parent and
//! child checkboxes kept consistent; assignees are picked per person or as a
//! whole department.

use std::collections::{BTreeSet, HashSet};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::api;
use crate::db::{format_priority, parse_date_input, parse_time_input, Database, Store};
use crate::fields::Priority;
use crate::selection::{check_state, Check, Chip, TaskForm};
use crate::task::Task;
use crate::tree::{find_node, flatten_nodes, group_by_department, search_employees, Node, ProjectTree};
use crate::tui::colors::{priority_color, project_color, GOLD, MUTED};
use crate::tui::enums::{Action, Page, ToastKind};
use crate::tui::input::InputField;
use crate::tui::utils::{centered_rect, checkbox, clamp_cursor, step_cursor};
use crate::validate::validate_task;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    Title,
    Description,
    Projects,
    Assignees,
    Date,
    Time,
    Priority,
}

impl Field {
    const ORDER: [Field; 7] = [
        Field::Title,
        Field::Description,
        Field::Projects,
        Field::Assignees,
        Field::Date,
        Field::Time,
        Field::Priority,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Projects => "Projects",
            Field::Assignees => "Assignees",
            Field::Date => "Date (dd.mm.yyyy)",
            Field::Time => "Time (hh:mm)",
            Field::Priority => "Priority",
        }
    }

    fn is_text(self) -> bool {
        matches!(self, Field::Title | Field::Description | Field::Date | Field::Time)
    }

    fn step(self, forward: bool) -> Field {
        let i = Field::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Field::ORDER[step_cursor(i, Field::ORDER.len(), forward)]
    }
}

/// A row of the assignee picker.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum AssigneeRow {
    Department(u64),
    Employee(u64),
}

enum Picker {
    /// Without a search, row 0 is "All projects" and the rest follow the
    /// visible tree.
    Projects { cursor: usize, expanded: HashSet<u64>, search: InputField },
    Assignees { cursor: usize, search: InputField },
}

pub struct TaskFormPage {
    pub form: TaskForm,
    title: InputField,
    description: InputField,
    date: InputField,
    time: InputField,
    focus: Field,
    /// Highlighted entry of the Projects or Assignees summary.
    chip: usize,
    picker: Option<Picker>,
    creator_id: Option<i64>,
}

/// Projects matching the query by name or description, with their ancestors.
fn project_matches<'a>(tree: &ProjectTree<'a>, query: &str) -> Vec<Node<'a>> {
    let q = query.trim().to_lowercase();
    tree.filter(|p| p.name.to_lowercase().contains(&q) || p.description.to_lowercase().contains(&q))
}

/// Picker rows. A search shows every match unfolded.
fn project_rows(tree: &ProjectTree, expanded: &HashSet<u64>, query: &str) -> Vec<Option<(u64, usize)>> {
    if query.trim().is_empty() {
        return std::iter::once(None)
            .chain(tree.flatten_visible(expanded).into_iter().map(Some))
            .collect();
    }
    flatten_nodes(&project_matches(tree, query))
        .into_iter()
        .map(|p| Some((p.id, tree.depth(p.id))))
        .collect()
}

fn assignee_rows(db: &Database, search: &str) -> Vec<AssigneeRow> {
    let active: Vec<_> = search_employees(&db.employees, search)
        .into_iter()
        .filter(|e| e.is_active)
        .collect();
    let searching = !search.trim().is_empty();
    let mut rows = Vec::new();
    for (dept, members) in group_by_department(&active, &db.departments) {
        if searching && members.is_empty() {
            continue;
        }
        rows.push(AssigneeRow::Department(dept.id));
        rows.extend(members.iter().map(|e| AssigneeRow::Employee(e.id)));
    }
    rows
}

fn check_marker(check: Check) -> &'static str {
    match check {
        Check::Checked => "[x]",
        Check::Partial => "[-]",
        Check::Unchecked => "[ ]",
    }
}

impl TaskFormPage {
    pub fn new(creator_id: Option<i64>) -> Self {
        let mut page = TaskFormPage {
            form: TaskForm::default(),
            title: InputField::new(),
            description: InputField::new(),
            date: InputField::new(),
            time: InputField::new(),
            focus: Field::Title,
            chip: 0,
            picker: None,
            creator_id,
        };
        page.focus_field(Field::Title);
        page
    }

    fn focus_field(&mut self, field: Field) {
        self.focus = field;
        self.chip = 0;
        self.title.active = field == Field::Title;
        self.description.active = field == Field::Description;
        self.date.active = field == Field::Date;
        self.time.active = field == Field::Time;
    }

    fn input_mut(&mut self, field: Field) -> Option<&mut InputField> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::Date => Some(&mut self.date),
            Field::Time => Some(&mut self.time),
            _ => None,
        }
    }

    /// Fill the form from an existing task.
    pub fn load(&mut self, task: &Task) {
        self.form = TaskForm::load_task(task);
        self.title.set(&task.title);
        self.description.set(&task.description);
        self.date.set(&task.scheduled_date.format("%d.%m.%Y").to_string());
        self.time.set(&task.scheduled_time.format("%H:%M").to_string());
        self.picker = None;
        self.focus_field(Field::Title);
    }

    pub fn reset(&mut self) {
        self.form.reset();
        for f in [&mut self.title, &mut self.description, &mut self.date, &mut self.time] {
            f.clear();
        }
        self.picker = None;
        self.focus_field(Field::Title);
    }

    pub fn is_editing(&self) -> bool {
        self.form.is_editing()
    }

    pub fn main_button_label(&self) -> &'static str {
        if self.is_editing() {
            "Save changes"
        } else {
            "Create task"
        }
    }

    /// Whether printable keys belong to this page.
    pub fn capturing_input(&self) -> bool {
        self.picker.is_some() || self.focus.is_text()
    }

    fn sync_form(&mut self) {
        self.form.title = self.title.value.clone();
        self.form.description = self.description.value.clone();
        self.form.scheduled_date = parse_date_input(&self.date.value);
        self.form.scheduled_time = parse_time_input(&self.time.value);
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Action {
        if self.picker.is_some() {
            return self.handle_picker_key(key, &store.db);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return self.submit(store),
            KeyCode::Char('r') if ctrl => {
                self.reset();
                return Action::info("Form cleared");
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus_field(self.focus.step(true));
                return Action::None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_field(self.focus.step(false));
                return Action::None;
            }
            KeyCode::Esc if self.is_editing() => {
                self.reset();
                return Action::Batch(vec![Action::info("Editing cancelled"), Action::Goto(Page::TaskList)]);
            }
            KeyCode::Esc => return Action::Unhandled,
            _ => {}
        }

        let focus = self.focus;
        if let Some(input) = self.input_mut(focus) {
            match key.code {
                KeyCode::Char(c) if !ctrl => input.handle_char(c),
                KeyCode::Backspace => input.handle_backspace(),
                KeyCode::Delete => input.handle_delete(),
                KeyCode::Left => input.move_cursor_left(),
                KeyCode::Right => input.move_cursor_right(),
                KeyCode::Home => input.move_home(),
                KeyCode::End => input.move_end(),
                KeyCode::Enter => self.focus_field(focus.step(true)),
                _ => return Action::Unhandled,
            }
            return Action::None;
        }

        match (focus, key.code) {
            (Field::Projects, KeyCode::Enter | KeyCode::Char(' ')) => {
                let expanded = store.db.projects.iter().map(|p| p.id).collect();
                let search = InputField { active: true, ..InputField::new() };
                self.picker = Some(Picker::Projects { cursor: 0, expanded, search });
                Action::None
            }
            (Field::Assignees, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.picker = Some(Picker::Assignees { cursor: 0, search: InputField { active: true, ..InputField::new() } });
                Action::None
            }
            (Field::Projects | Field::Assignees, KeyCode::Left | KeyCode::Right) => {
                let n = self.chips(&store.db).len();
                self.chip = step_cursor(clamp_cursor(self.chip, n), n, key.code == KeyCode::Right);
                Action::None
            }
            (Field::Projects | Field::Assignees, KeyCode::Char('x')) => {
                let chips = self.chips(&store.db);
                let Some(&chip) = chips.get(clamp_cursor(self.chip, chips.len())) else {
                    return Action::None;
                };
                let tree = ProjectTree::new(&store.db.projects);
                self.form.remove_chip(&tree, chip);
                self.chip = clamp_cursor(self.chip, chips.len() - 1);
                Action::Selection
            }
            (Field::Projects, KeyCode::Backspace | KeyCode::Delete) => {
                self.form.clear_projects();
                Action::Selection
            }
            (Field::Assignees, KeyCode::Backspace | KeyCode::Delete) => {
                self.form.clear_employees();
                Action::Selection
            }
            (Field::Priority, KeyCode::Left | KeyCode::Right) => {
                let i = Priority::ALL.iter().position(|p| *p == self.form.priority).unwrap_or(1);
                let next = step_cursor(i, Priority::ALL.len(), key.code == KeyCode::Right);
                self.form.priority = Priority::ALL[next];
                Action::Selection
            }
            (Field::Priority, KeyCode::Enter) => self.submit(store),
            _ => Action::Unhandled,
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent, db: &Database) -> Action {
        let tree = ProjectTree::new(&db.projects);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
            self.picker = None;
            return Action::None;
        }
        let form = &mut self.form;
        match &mut self.picker {
            None => Action::Unhandled,
            Some(Picker::Projects { cursor, expanded, search }) => {
                let rows = project_rows(&tree, expanded, &search.value);
                *cursor = clamp_cursor(*cursor, rows.len());
                let current = rows.get(*cursor).copied().flatten();
                match key.code {
                    KeyCode::Up | KeyCode::Down => {
                        *cursor = step_cursor(*cursor, rows.len(), key.code == KeyCode::Down);
                        Action::None
                    }
                    KeyCode::Char(' ') => {
                        match current {
                            None => form.toggle_all_projects(),
                            Some((id, _)) => {
                                let on = check_state(&tree, &form.selected_projects, id) != Check::Checked;
                                form.toggle_project(&tree, id, on);
                            }
                        }
                        Action::Selection
                    }
                    KeyCode::Right => {
                        if let Some((id, _)) = current {
                            expanded.insert(id);
                        }
                        Action::None
                    }
                    KeyCode::Left => {
                        if let Some((id, _)) = current {
                            expanded.remove(&id);
                        }
                        Action::None
                    }
                    KeyCode::Delete => {
                        form.clear_projects();
                        Action::Selection
                    }
                    KeyCode::Char(c) if !ctrl => {
                        search.handle_char(c);
                        *cursor = 0;
                        Action::None
                    }
                    KeyCode::Backspace => {
                        search.handle_backspace();
                        *cursor = 0;
                        Action::None
                    }
                    _ => Action::None,
                }
            }
            Some(Picker::Assignees { cursor, search }) => {
                let rows = assignee_rows(db, &search.value);
                *cursor = clamp_cursor(*cursor, rows.len());
                let current = rows.get(*cursor).copied();
                match (key.code, current) {
                    (KeyCode::Up | KeyCode::Down, _) => {
                        *cursor = step_cursor(*cursor, rows.len(), key.code == KeyCode::Down);
                        Action::None
                    }
                    (KeyCode::Char('a'), Some(AssigneeRow::Department(id))) if ctrl => {
                        let on = !form.departments_all.contains(&id);
                        form.toggle_department_all(db, id, on);
                        Action::Selection
                    }
                    (KeyCode::Char(' '), Some(AssigneeRow::Department(id))) => {
                        if form.departments_all.contains(&id) {
                            form.remove_department(id);
                        } else {
                            let on = department_check(form, db, id) != Check::Checked;
                            form.toggle_department(db, id, on);
                        }
                        Action::Selection
                    }
                    (KeyCode::Char(' '), Some(AssigneeRow::Employee(id))) => {
                        let on = !form.selected_employees.contains(&id);
                        form.toggle_employee(id, on);
                        Action::Selection
                    }
                    (KeyCode::Char(c), _) if !ctrl && c != ' ' => {
                        search.handle_char(c);
                        *cursor = 0;
                        Action::None
                    }
                    (KeyCode::Backspace, _) => {
                        search.handle_backspace();
                        *cursor = 0;
                        Action::None
                    }
                    _ => Action::None,
                }
            }
        }
    }

    fn submit(&mut self, store: &mut Store) -> Action {
        self.sync_form();
        if !self.date.is_empty() && self.form.scheduled_date.is_none() {
            return Action::invalid("Invalid date format");
        }
        let report = validate_task(&self.form, &self.time.value, Local::now().date_naive());
        if let Some(msg) = report.first() {
            return Action::invalid(msg);
        }
        let Some(draft) = self.form.to_draft(&store.db) else {
            return Action::invalid("Choose a date");
        };
        let editing = self.form.editing_task_id;
        let result = match editing {
            Some(id) => api::update_task(&mut store.db, id, draft.into()),
            None => api::create_task(&mut store.db, draft, self.creator_id).map(|_| ()),
        };
        if let Err(e) = result.and_then(|_| store.save()) {
            return Action::Fail(e);
        }
        self.reset();
        match editing {
            Some(_) => Action::Batch(vec![
                Action::Notice(ToastKind::Success, "Task updated".into()),
                Action::Goto(Page::TaskList),
            ]),
            None => Action::Notice(ToastKind::Success, "Task created".into()),
        }
    }

    fn chips(&self, db: &Database) -> Vec<Chip> {
        match self.focus {
            Field::Projects => self.form.project_chips(db),
            Field::Assignees => self.form.assignee_chips(db),
            _ => Vec::new(),
        }
    }

    /// Summary chips, with the highlighted one marked while the field has focus.
    fn chip_line(&self, db: &Database, field: Field) -> Line<'static> {
        let chips = match field {
            Field::Projects => self.form.project_chips(db),
            _ => self.form.assignee_chips(db),
        };
        if chips.is_empty() {
            return Line::from(Span::styled("Enter to choose", Style::default().fg(MUTED)));
        }
        let current = (self.focus == field).then(|| clamp_cursor(self.chip, chips.len()));
        let mut spans = Vec::new();
        for (i, chip) in chips.into_iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(", "));
            }
            let style = if current == Some(i) {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            spans.push(Span::styled(TaskForm::chip_label(db, chip), style));
        }
        Line::from(spans)
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let heading = match self.form.editing_task_id {
            Some(id) => format!("Editing task #{id}"),
            None => "New task".to_string(),
        };
        f.render_widget(
            Paragraph::new(Span::styled(heading, Style::default().add_modifier(Modifier::BOLD))),
            chunks[0],
        );

        let block = |field: Field, focus: Field| {
            let style = if field == focus { Style::default().fg(GOLD) } else { Style::default() };
            Block::default().title(field.label()).borders(Borders::ALL).border_style(style)
        };
        f.render_widget(
            Paragraph::new(self.title.display()).block(block(Field::Title, self.focus)),
            chunks[1],
        );
        f.render_widget(
            Paragraph::new(self.description.display())
                .wrap(Wrap { trim: false })
                .block(block(Field::Description, self.focus)),
            chunks[2],
        );
        f.render_widget(
            Paragraph::new(self.chip_line(db, Field::Projects)).block(block(Field::Projects, self.focus)),
            chunks[3],
        );
        f.render_widget(
            Paragraph::new(self.chip_line(db, Field::Assignees)).block(block(Field::Assignees, self.focus)),
            chunks[4],
        );

        let when = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[5]);
        f.render_widget(Paragraph::new(self.date.display()).block(block(Field::Date, self.focus)), when[0]);
        f.render_widget(Paragraph::new(self.time.display()).block(block(Field::Time, self.focus)), when[1]);

        let priorities: Vec<Span> = Priority::ALL
            .iter()
            .flat_map(|p| {
                let style = if *p == self.form.priority {
                    Style::default().fg(priority_color(*p)).add_modifier(Modifier::REVERSED)
                } else {
                    Style::default().fg(MUTED)
                };
                [Span::styled(format!(" {} ", format_priority(*p)), style), Span::raw(" ")]
            })
            .collect();
        f.render_widget(
            Paragraph::new(Line::from(priorities)).block(block(Field::Priority, self.focus)),
            chunks[6],
        );

        let chip_keys = if matches!(self.focus, Field::Projects | Field::Assignees) {
            "  ←/→ pick  x remove"
        } else {
            ""
        };
        let hint = format!(
            "Tab next field{chip_keys}  Ctrl+S {}  Ctrl+R clear{}",
            self.main_button_label().to_lowercase(),
            if self.is_editing() { "  Esc cancel editing" } else { "" }
        );
        f.render_widget(Paragraph::new(Span::styled(hint, Style::default().fg(MUTED))), chunks[7]);

        self.render_picker(f, area, db);
    }

    fn render_picker(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let tree = ProjectTree::new(&db.projects);
        let area = centered_rect(60, 70, area);
        match &mut self.picker {
            None => {}
            Some(Picker::Projects { cursor, expanded, search }) => {
                let rows = project_rows(&tree, expanded, &search.value);
                *cursor = clamp_cursor(*cursor, rows.len());
                let searching = !search.value.trim().is_empty();
                let found = if searching { project_matches(&tree, &search.value) } else { Vec::new() };
                let items: Vec<ListItem> = rows
                    .iter()
                    .map(|row| match row {
                        None => ListItem::new(format!("{} All projects", checkbox(self.form.all_projects))),
                        Some((id, depth)) => {
                            let Some(p) = tree.get(*id) else {
                                return ListItem::new("");
                            };
                            let glyph = if searching {
                                match find_node(&found, *id) {
                                    Some(node) if !node.children.is_empty() => "▾",
                                    _ => " ",
                                }
                            } else if !tree.has_children(*id) {
                                " "
                            } else if expanded.contains(id) {
                                "▾"
                            } else {
                                "▸"
                            };
                            ListItem::new(Line::from(vec![
                                Span::raw(format!(
                                    "{}{} {} ",
                                    "  ".repeat(*depth),
                                    check_marker(check_state(&tree, &self.form.selected_projects, *id)),
                                    glyph
                                )),
                                Span::styled("● ", Style::default().fg(project_color(&p.color))),
                                Span::raw(p.name.clone()),
                            ]))
                        }
                    })
                    .collect();
                f.render_widget(Clear, area);
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(0)])
                    .split(area);
                f.render_widget(
                    Paragraph::new(search.display()).block(Block::default().title("Search").borders(Borders::ALL)),
                    parts[0],
                );
                let title = if searching && rows.is_empty() {
                    "No projects found"
                } else {
                    "Projects  Space toggle  ←/→ fold  Del clear  Enter done"
                };
                let list = List::new(items)
                    .block(Block::default().title(title).borders(Borders::ALL))
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
                let mut state = ListState::default().with_selected(Some(*cursor));
                f.render_stateful_widget(list, parts[1], &mut state);
            }
            Some(Picker::Assignees { cursor, search }) => {
                let rows = assignee_rows(db, &search.value);
                *cursor = clamp_cursor(*cursor, rows.len());
                let items: Vec<ListItem> = rows
                    .iter()
                    .map(|row| match *row {
                        AssigneeRow::Department(id) => {
                            let name = db.department(id).map(|d| d.name.clone()).unwrap_or_default();
                            let unit = if self.form.departments_all.contains(&id) { "  (whole department)" } else { "" };
                            ListItem::new(Line::from(vec![
                                Span::raw(format!("{} ", check_marker(department_check(&self.form, db, id)))),
                                Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                                Span::styled(
                                    format!(" {}{unit}", db.active_members(id).len()),
                                    Style::default().fg(MUTED),
                                ),
                            ]))
                        }
                        AssigneeRow::Employee(id) => {
                            let Some(e) = db.employee(id) else {
                                return ListItem::new("");
                            };
                            let picked = self.form.selected_employees.contains(&id)
                                || self.form.departments_all.contains(&e.department_id);
                            ListItem::new(Line::from(vec![
                                Span::raw(format!("    {} {}", checkbox(picked), e.full_name())),
                                Span::styled(format!("  {}", e.position), Style::default().fg(MUTED)),
                            ]))
                        }
                    })
                    .collect();
                f.render_widget(Clear, area);
                let parts = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(3), Constraint::Min(0)])
                    .split(area);
                f.render_widget(
                    Paragraph::new(search.display()).block(Block::default().title("Search").borders(Borders::ALL)),
                    parts[0],
                );
                let list = List::new(items)
                    .block(
                        Block::default()
                            .title("Assignees  Space toggle  Ctrl+A whole department  Enter done")
                            .borders(Borders::ALL),
                    )
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
                let mut state = ListState::default().with_selected(Some(*cursor));
                f.render_stateful_widget(list, parts[1], &mut state);
            }
        }
    }
}

/// Checkbox state of a department row: picked as a unit, or by its members.
fn department_check(form: &TaskForm, db: &Database, department_id: u64) -> Check {
    if form.departments_all.contains(&department_id) {
        return Check::Checked;
    }
    let members: BTreeSet<u64> = db.active_members(department_id).into_iter().collect();
    let picked = members.iter().filter(|m| form.selected_employees.contains(m)).count();
    match picked {
        0 => Check::Unchecked,
        n if n == members.len() => Check::Checked,
        _ => Check::Partial,
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

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(page: &mut TaskFormPage, store: &mut Store, text: &str) {
        for c in text.chars() {
            page.handle_key(key(KeyCode::Char(c)), store);
        }
    }

    fn store() -> Store {
        Store::in_memory(demo_database(Local::now().date_naive()))
    }

    #[test]
    fn test_submit_reports_first_error() {
        let mut store = store();
        let mut page = TaskFormPage::new(Some(1));
        match page.handle_key(ctrl('s'), &mut store) {
            Action::Fail(e) => assert_eq!(e.to_string(), "Enter a task title"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_create_task_through_keys() {
        let mut store = store();
        let before = store.db.tasks.len();
        let mut page = TaskFormPage::new(Some(123456789));
        type_text(&mut page, &mut store, "Prepare the budget");
        page.handle_key(key(KeyCode::Tab), &mut store);
        page.handle_key(key(KeyCode::Tab), &mut store);

        // Projects picker: first tree row after "All projects" is Acme Ltd.
        page.handle_key(key(KeyCode::Enter), &mut store);
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Char(' ')), &mut store);
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(page.form.selected_projects.contains(&1));
        assert!(page.form.selected_projects.contains(&7));

        page.handle_key(key(KeyCode::Tab), &mut store);
        page.handle_key(key(KeyCode::Enter), &mut store);
        page.handle_key(ctrl('a'), &mut store);
        page.handle_key(key(KeyCode::Esc), &mut store);
        assert_eq!(page.form.departments_all.len(), 1);

        page.handle_key(key(KeyCode::Tab), &mut store);
        type_text(&mut page, &mut store, "tomorrow");
        page.handle_key(key(KeyCode::Tab), &mut store);
        type_text(&mut page, &mut store, "9:30");

        let action = page.handle_key(ctrl('s'), &mut store);
        assert!(matches!(action, Action::Notice(ToastKind::Success, _)), "{action:?}");
        assert_eq!(store.db.tasks.len(), before + 1);
        let task = store.db.tasks.last().unwrap();
        assert_eq!(task.creator_id, Some(123456789));
        assert_eq!(task.assignee_ids, store.db.active_members(1));
        assert!(page.form.title.is_empty());
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let mut store = store();
        let mut page = TaskFormPage::new(None);
        page.focus_field(Field::Date);
        type_text(&mut page, &mut store, "31.02.2025");
        match page.handle_key(ctrl('s'), &mut store) {
            Action::Fail(e) => assert_eq!(e.to_string(), "Invalid date format"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_edit_round_trip_returns_to_list() {
        let mut store = store();
        let task = store.db.task(2).cloned().unwrap();
        let mut page = TaskFormPage::new(None);
        page.load(&task);
        assert_eq!(page.main_button_label(), "Save changes");
        type_text(&mut page, &mut store, " v2");
        let action = page.handle_key(ctrl('s'), &mut store);
        assert!(matches!(action, Action::Batch(ref a) if matches!(a[1], Action::Goto(Page::TaskList))));
        assert_eq!(store.db.task(2).unwrap().title, format!("{} v2", task.title));
        assert!(!page.is_editing());
    }

    #[test]
    fn test_project_search_and_chip_removal() {
        let mut store = store();
        let mut page = TaskFormPage::new(None);
        page.focus_field(Field::Projects);
        page.handle_key(key(KeyCode::Enter), &mut store);
        type_text(&mut page, &mut store, "seo");
        let Some(Picker::Projects { expanded, search, .. }) = &page.picker else {
            panic!("project picker is closed");
        };
        let tree = ProjectTree::new(&store.db.projects);
        let rows: Vec<u64> = project_rows(&tree, expanded, &search.value)
            .into_iter()
            .flatten()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(rows, vec![1, 4, 8]);
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Char(' ')), &mut store);
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert_eq!(page.form.selected_projects, BTreeSet::from([8]));

        page.handle_key(key(KeyCode::Enter), &mut store);
        type_text(&mut page, &mut store, "store");
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Char(' ')), &mut store);
        page.handle_key(key(KeyCode::Enter), &mut store);
        // Online store is the only child of Sidorov Trading, so the parent joins.
        assert_eq!(page.form.selected_projects, BTreeSet::from([2, 8, 9]));
        assert_eq!(page.form.project_chips(&store.db), vec![Chip::Project(2), Chip::Project(8)]);

        page.handle_key(key(KeyCode::Right), &mut store);
        page.handle_key(key(KeyCode::Char('x')), &mut store);
        assert_eq!(page.form.selected_projects, BTreeSet::from([2, 9]));
        page.handle_key(key(KeyCode::Char('x')), &mut store);
        assert!(!page.form.has_projects());
    }

    #[test]
    fn test_assignee_chip_removal() {
        let mut store = store();
        let mut page = TaskFormPage::new(None);
        page.focus_field(Field::Assignees);
        page.handle_key(key(KeyCode::Enter), &mut store);
        type_text(&mut page, &mut store, "volkova");
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Char(' ')), &mut store);
        page.handle_key(key(KeyCode::Esc), &mut store);
        assert_eq!(page.form.assignee_chips(&store.db), vec![Chip::Employee(4)]);
        page.handle_key(key(KeyCode::Char('x')), &mut store);
        assert!(!page.form.has_assignees());
        assert!(matches!(page.handle_key(key(KeyCode::Char('x')), &mut store), Action::None));
    }

    #[test]
    fn test_department_check_counts_active_members() {
        let db = demo_database(Local::now().date_naive());
        let mut form = TaskForm::default();
        assert_eq!(department_check(&form, &db, 4), Check::Unchecked);
        form.toggle_employee(8, true);
        assert_eq!(department_check(&form, &db, 4), Check::Partial);
        // #10 is inactive, so 8 and 9 make the department complete.
        form.toggle_employee(9, true);
        assert_eq!(department_check(&form, &db, 4), Check::Checked);
    }
}
