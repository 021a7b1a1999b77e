//! Task list page: search, tri-state status chips, filter panel and sorting.

use chrono::{Local, NaiveDateTime};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::api;
use crate::db::{
    format_priority, format_relative_date, format_status, format_status_key, format_timestamp, parse_date_time_input,
    truncate, Database, Store,
};
use crate::fields::{Mark, SortKey, SortOrder, StatusKey, TaskStatus};
use crate::filter::{apply_task_filters, sort_tasks, TaskFilters};
use crate::task::Task;
use crate::tree::{employee_names, group_by_department, project_names, ProjectTree};
use crate::tui::colors::{priority_color, project_color, status_color, GOLD, MUTED};
use crate::tui::enums::{Action, ConfirmOp, Page};
use crate::tui::input::InputField;
use crate::tui::utils::{centered_rect, checkbox, clamp_cursor, step_cursor};

const SORT_KEYS: [SortKey; 5] = [
    SortKey::CreatedAt,
    SortKey::ScheduledDate,
    SortKey::Priority,
    SortKey::Status,
    SortKey::Title,
];

fn sort_label(key: SortKey) -> &'static str {
    match key {
        SortKey::CreatedAt => "Created",
        SortKey::ScheduledDate => "Deadline",
        SortKey::Priority => "Priority",
        SortKey::Status => "Status",
        SortKey::Title => "Title",
    }
}

fn status_key_for(c: char) -> Option<StatusKey> {
    match c {
        'p' => Some(StatusKey::Pending),
        'i' => Some(StatusKey::InProgress),
        'c' => Some(StatusKey::Completed),
        'x' => Some(StatusKey::Cancelled),
        'o' => Some(StatusKey::Overdue),
        _ => None,
    }
}

fn next_status(status: TaskStatus) -> TaskStatus {
    let i = TaskStatus::ALL.iter().position(|s| *s == status).unwrap_or(0);
    TaskStatus::ALL[step_cursor(i, TaskStatus::ALL.len(), true)]
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Section {
    Projects,
    People,
    Dates,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PanelRow {
    Project(u64, usize),
    Department(u64),
    Employee(u64),
}

struct FilterPanel {
    section: Section,
    cursor: usize,
    date_from: InputField,
    date_to: InputField,
}

impl FilterPanel {
    fn open(filters: &TaskFilters) -> Self {
        let show = |dt: Option<NaiveDateTime>| dt.map(|d| d.format("%d.%m.%Y %H:%M").to_string()).unwrap_or_default();
        let mut date_from = InputField::with_value(&show(filters.date_from));
        date_from.active = true;
        FilterPanel {
            section: Section::Projects,
            cursor: 0,
            date_from,
            date_to: InputField::with_value(&show(filters.date_to)),
        }
    }

    fn rows(&self, db: &Database) -> Vec<PanelRow> {
        match self.section {
            Section::Projects => ProjectTree::new(&db.projects)
                .flatten()
                .into_iter()
                .map(|(id, depth)| PanelRow::Project(id, depth))
                .collect(),
            Section::People => {
                let everyone: Vec<_> = db.employees.iter().collect();
                group_by_department(&everyone, &db.departments)
                    .into_iter()
                    .flat_map(|(d, members)| {
                        std::iter::once(PanelRow::Department(d.id))
                            .chain(members.into_iter().map(|e| PanelRow::Employee(e.id)))
                    })
                    .collect()
            }
            Section::Dates => Vec::new(),
        }
    }

    fn active_date(&mut self) -> &mut InputField {
        if self.date_to.active {
            &mut self.date_to
        } else {
            &mut self.date_from
        }
    }

    /// Parse both bounds; an empty field clears its bound.
    fn dates(&self) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), &'static str> {
        let parse = |f: &InputField, end: bool| {
            if f.is_empty() {
                Ok(None)
            } else {
                parse_date_time_input(&f.value, end).map(Some).ok_or("Invalid date format")
            }
        };
        let from = parse(&self.date_from, false)?;
        let to = parse(&self.date_to, true)?;
        if let (Some(a), Some(b)) = (from, to) {
            if a > b {
                return Err("The start date is after the end date");
            }
        }
        Ok((from, to))
    }
}

pub struct TaskListPage {
    search: InputField,
    pub filters: TaskFilters,
    sort_key: SortKey,
    sort_order: SortOrder,
    table: TableState,
    expanded: Option<u64>,
    panel: Option<FilterPanel>,
}

impl Default for TaskListPage {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskListPage {
    pub fn new() -> Self {
        TaskListPage {
            search: InputField::new(),
            filters: TaskFilters::default(),
            sort_key: SortKey::CreatedAt,
            sort_order: SortOrder::Desc,
            table: TableState::default().with_selected(Some(0)),
            expanded: None,
            panel: None,
        }
    }

    pub fn capturing_input(&self) -> bool {
        self.search.active || self.panel.is_some()
    }

    /// Visible tasks in display order.
    pub fn rows<'a>(&self, db: &'a Database, now: NaiveDateTime) -> Vec<&'a Task> {
        let mut tasks = apply_task_filters(&db.tasks, &self.filters, &self.search.value, now);
        sort_tasks(&mut tasks, self.sort_key, self.sort_order);
        tasks
    }

    fn selected_id(&mut self, db: &Database) -> Option<u64> {
        let rows = self.rows(db, Local::now().naive_local());
        let idx = clamp_cursor(self.table.selected().unwrap_or(0), rows.len());
        self.table.select(Some(idx));
        rows.get(idx).map(|t| t.id)
    }

    fn move_selection(&mut self, db: &Database, down: bool) {
        let len = self.rows(db, Local::now().naive_local()).len();
        let idx = step_cursor(self.table.selected().unwrap_or(0), len, down);
        self.table.select(Some(idx));
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Action {
        if self.panel.is_some() {
            return self.handle_panel_key(key, &store.db);
        }
        if self.search.active {
            match key.code {
                KeyCode::Esc => {
                    self.search.clear();
                    self.search.active = false;
                }
                KeyCode::Enter => self.search.active = false,
                KeyCode::Backspace => self.search.handle_backspace(),
                KeyCode::Left => self.search.move_cursor_left(),
                KeyCode::Right => self.search.move_cursor_right(),
                KeyCode::Char(c) => self.search.handle_char(c),
                _ => {}
            }
            self.table.select(Some(0));
            return Action::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('r') if ctrl => {
                self.filters.clear();
                self.search.clear();
                Action::info("Filters cleared")
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(&store.db, false);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(&store.db, true);
                Action::None
            }
            KeyCode::Char('/') => {
                self.search.active = true;
                Action::None
            }
            KeyCode::Char('f') => {
                self.panel = Some(FilterPanel::open(&self.filters));
                Action::None
            }
            KeyCode::Char('s') => {
                let i = SORT_KEYS.iter().position(|k| *k == self.sort_key).unwrap_or(0);
                self.sort_key = SORT_KEYS[step_cursor(i, SORT_KEYS.len(), true)];
                Action::Selection
            }
            KeyCode::Char('r') => {
                self.sort_order = match self.sort_order {
                    SortOrder::Asc => SortOrder::Desc,
                    SortOrder::Desc => SortOrder::Asc,
                };
                Action::Selection
            }
            KeyCode::Char('n') => Action::Goto(Page::TaskForm),
            KeyCode::Char(c) if status_key_for(c).is_some() => {
                if let Some(k) = status_key_for(c) {
                    self.filters.cycle_status(k);
                }
                self.table.select(Some(0));
                Action::Selection
            }
            KeyCode::Enter => {
                let id = self.selected_id(&store.db);
                self.expanded = if self.expanded == id { None } else { id };
                Action::None
            }
            KeyCode::Char(' ') => match self.selected_id(&store.db).and_then(|id| store.db.task(id)) {
                Some(task) => {
                    let (id, status) = (task.id, next_status(task.status));
                    let result = api::set_task_status(&mut store.db, id, status);
                    Action::commit(store, result, format!("Status changed to {}", format_status(status)))
                }
                None => Action::None,
            },
            KeyCode::Char('e') => match self.selected_id(&store.db) {
                Some(id) => Action::EditTask(id),
                None => Action::None,
            },
            KeyCode::Char('d') | KeyCode::Delete => match self.selected_id(&store.db) {
                Some(id) => Action::Confirm(ConfirmOp::DeleteTask(id)),
                None => Action::None,
            },
            _ => Action::Unhandled,
        }
    }

    fn handle_panel_key(&mut self, key: KeyEvent, db: &Database) -> Action {
        let Some(panel) = self.panel.as_mut() else {
            return Action::Unhandled;
        };
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
            self.filters.clear();
            self.panel = None;
            return Action::info("Filters cleared");
        }
        match key.code {
            KeyCode::Esc => {
                self.panel = None;
                return Action::None;
            }
            KeyCode::Enter => {
                return match panel.dates() {
                    Ok((from, to)) => {
                        self.filters.date_from = from;
                        self.filters.date_to = to;
                        self.panel = None;
                        self.table.select(Some(0));
                        Action::None
                    }
                    Err(msg) => Action::invalid(msg),
                };
            }
            KeyCode::Tab | KeyCode::BackTab => {
                panel.section = match (panel.section, key.code == KeyCode::Tab) {
                    (Section::Projects, true) | (Section::Dates, false) => Section::People,
                    (Section::People, true) | (Section::Projects, false) => Section::Dates,
                    (Section::Dates, true) | (Section::People, false) => Section::Projects,
                };
                panel.cursor = 0;
                return Action::None;
            }
            _ => {}
        }

        if panel.section == Section::Dates {
            match key.code {
                KeyCode::Up | KeyCode::Down => {
                    let to = !panel.date_to.active;
                    panel.date_to.active = to;
                    panel.date_from.active = !to;
                }
                KeyCode::Backspace => panel.active_date().handle_backspace(),
                KeyCode::Delete => panel.active_date().clear(),
                KeyCode::Left => panel.active_date().move_cursor_left(),
                KeyCode::Right => panel.active_date().move_cursor_right(),
                KeyCode::Char(c) => panel.active_date().handle_char(c),
                _ => {}
            }
            return Action::None;
        }

        let rows = panel.rows(db);
        panel.cursor = clamp_cursor(panel.cursor, rows.len());
        match key.code {
            KeyCode::Up | KeyCode::Down => {
                panel.cursor = step_cursor(panel.cursor, rows.len(), key.code == KeyCode::Down);
                Action::None
            }
            KeyCode::Char(' ') => {
                let picks = &mut self.filters.picks;
                match rows.get(panel.cursor) {
                    Some(PanelRow::Project(id, _)) => {
                        let on = !picks.project_ids.contains(id);
                        picks.toggle_filter_project(*id, on);
                    }
                    Some(PanelRow::Department(id)) => {
                        let on = !picks.department_ids.contains(id);
                        picks.toggle_filter_department(db, *id, on);
                    }
                    Some(PanelRow::Employee(id)) => {
                        let on = !picks.employee_ids.contains(id);
                        picks.toggle_filter_employee(*id, on);
                    }
                    None => return Action::None,
                }
                self.table.select(Some(0));
                Action::Selection
            }
            _ => Action::None,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let now = Local::now().naive_local();
        let today = now.date();
        let tasks = self.rows(db, now);
        let idx = clamp_cursor(self.table.selected().unwrap_or(0), tasks.len());
        self.table.select(Some(idx));
        let expanded = self.expanded.filter(|id| tasks.get(idx).is_some_and(|t| t.id == *id));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(if expanded.is_some() { 8 } else { 0 }),
                Constraint::Length(1),
            ])
            .split(area);

        let mut chips: Vec<Span> = Vec::new();
        for key in StatusKey::ALL {
            let count = db
                .tasks
                .iter()
                .filter(|t| match key.status() {
                    Some(s) => t.status == s,
                    None => t.is_overdue_at(now),
                })
                .count();
            let label = format!("{} {}", format_status_key(key), count);
            let span = match self.filters.mark(key) {
                Mark::Neutral => Span::styled(format!(" {label} "), Style::default().fg(MUTED)),
                Mark::Include => Span::styled(format!("+{label} "), Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Mark::Exclude => Span::styled(
                    format!("-{label} "),
                    Style::default().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT),
                ),
            };
            chips.push(span);
            chips.push(Span::raw(" "));
        }
        let active = self.filters.count_active_filters();
        if active > 0 {
            chips.push(Span::styled(format!("Filters: {active}"), Style::default().fg(GOLD)));
        }
        f.render_widget(Paragraph::new(Line::from(chips)), chunks[0]);

        let search = if self.search.active || !self.search.value.is_empty() {
            Span::raw(self.search.display())
        } else {
            Span::styled("Press / to search by title or description", Style::default().fg(MUTED))
        };
        f.render_widget(
            Paragraph::new(search).block(Block::default().title("Search").borders(Borders::ALL)),
            chunks[1],
        );

        let header = Row::new(vec!["#", "Status", "Priority", "Deadline", "Projects", "Assignees", "Title"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = tasks
            .iter()
            .map(|t| {
                let overdue = t.is_overdue_at(now);
                let deadline = format!(
                    "{} {}",
                    format_relative_date(t.scheduled_date, today),
                    t.scheduled_time.format("%H:%M")
                );
                Row::new(vec![
                    Cell::from(t.id.to_string()),
                    Cell::from(format_status(t.status)).style(Style::default().fg(status_color(t.status))),
                    Cell::from(format_priority(t.priority)).style(Style::default().fg(priority_color(t.priority))),
                    Cell::from(deadline).style(if overdue { Style::default().fg(Color::Red) } else { Style::default() }),
                    Cell::from(truncate(&project_names(db, &t.project_ids).join(", "), 22)),
                    Cell::from(truncate(&employee_names(db, &t.assignee_ids).join(", "), 22)),
                    Cell::from(t.title.clone()),
                ])
                .style(if t.status.is_terminal() { Style::default().fg(Color::DarkGray) } else { Style::default() })
            })
            .collect();
        let widths = [
            Constraint::Length(4),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(16),
            Constraint::Length(23),
            Constraint::Length(23),
            Constraint::Min(20),
        ];
        let order = match self.sort_order {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{})  Sort: {} {}",
                tasks.len(),
                db.tasks.len(),
                sort_label(self.sort_key),
                order
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, chunks[2], &mut self.table);

        if let Some(task) = expanded.and_then(|id| db.task(id)) {
            render_details(f, chunks[3], db, task);
        }

        let hint = if tasks.is_empty() && self.filters.has_active_filters() {
            "Nothing matches the filters  Ctrl+R clear filters"
        } else {
            "Enter details  Space next status  e edit  d delete  p/i/c/x/o status chips  f filters  s/r sort  n new"
        };
        f.render_widget(Paragraph::new(Span::styled(hint, Style::default().fg(MUTED))), chunks[4]);

        self.render_panel(f, area, db);
    }

    fn render_panel(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        let area = centered_rect(70, 80, area);
        f.render_widget(Clear, area);
        let tabs = [(Section::Projects, "Projects"), (Section::People, "People"), (Section::Dates, "Dates")];
        let title: Vec<Span> = tabs
            .iter()
            .map(|(s, name)| {
                let style = if *s == panel.section {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Span::styled(format!(" {name} "), style)
            })
            .collect();
        let block = Block::default()
            .title(Line::from(title))
            .title_bottom("Tab section  Space toggle  Enter apply  Esc close  Ctrl+R reset")
            .borders(Borders::ALL);

        if panel.section == Section::Dates {
            let inner = block.inner(area);
            f.render_widget(block, area);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
                .split(inner);
            f.render_widget(
                Paragraph::new(panel.date_from.display())
                    .block(Block::default().title("From (dd.mm.yyyy [hh:mm])").borders(Borders::ALL)),
                parts[0],
            );
            f.render_widget(
                Paragraph::new(panel.date_to.display())
                    .block(Block::default().title("To (dd.mm.yyyy [hh:mm])").borders(Borders::ALL)),
                parts[1],
            );
            return;
        }

        let picks = &self.filters.picks;
        let rows = panel.rows(db);
        panel.cursor = clamp_cursor(panel.cursor, rows.len());
        let items: Vec<ListItem> = rows
            .iter()
            .map(|row| match *row {
                PanelRow::Project(id, depth) => {
                    let (name, color) = db
                        .project(id)
                        .map(|p| (p.name.clone(), project_color(&p.color)))
                        .unwrap_or_else(|| (String::new(), MUTED));
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{}{} ", "  ".repeat(depth), checkbox(picks.project_ids.contains(&id)))),
                        Span::styled("● ", Style::default().fg(color)),
                        Span::raw(name),
                    ]))
                }
                PanelRow::Department(id) => {
                    let name = db.department(id).map(|d| d.name.clone()).unwrap_or_default();
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{} ", checkbox(picks.department_ids.contains(&id)))),
                        Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
                    ]))
                }
                PanelRow::Employee(id) => {
                    let (name, active) = db.employee(id).map(|e| (e.full_name(), e.is_active)).unwrap_or_default();
                    let style = if active { Style::default() } else { Style::default().fg(MUTED) };
                    ListItem::new(Span::styled(
                        format!("    {} {}", checkbox(picks.employee_ids.contains(&id)), name),
                        style,
                    ))
                }
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(panel.cursor));
        f.render_stateful_widget(list, area, &mut state);
    }
}

fn render_details(f: &mut Frame, area: Rect, db: &Database, task: &Task) {
    let label = |s: &'static str| Span::styled(s, Style::default().fg(MUTED));
    let mut lines = vec![
        Line::from(vec![label("Projects:   "), Span::raw(project_names(db, &task.project_ids).join(", "))]),
        Line::from(vec![label("Assignees:  "), Span::raw(employee_names(db, &task.assignee_ids).join(", "))]),
        Line::from(vec![label("Created:    "), Span::raw(format_timestamp(task.created_at_utc))]),
    ];
    if let Some(done) = task.completed_at_utc {
        lines.push(Line::from(vec![label("Completed:  "), Span::raw(format_timestamp(done))]));
    }
    if !task.description.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(task.description.clone()));
    }
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(task.title.clone()).borders(Borders::ALL)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn store() -> Store {
        Store::in_memory(demo_database(Local::now().date_naive()))
    }

    fn visible(page: &TaskListPage, store: &Store) -> Vec<u64> {
        page.rows(&store.db, Local::now().naive_local()).iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_status_chip_cycles_include_exclude() {
        let mut store = store();
        let mut page = TaskListPage::new();
        page.handle_key(key(KeyCode::Char('c')), &mut store);
        assert_eq!(visible(&page, &store), vec![6]);
        page.handle_key(key(KeyCode::Char('c')), &mut store);
        assert!(!visible(&page, &store).contains(&6));
        assert_eq!(visible(&page, &store).len(), 7);
        page.handle_key(key(KeyCode::Char('c')), &mut store);
        assert_eq!(visible(&page, &store).len(), 8);
    }

    #[test]
    fn test_search_narrows_rows() {
        let mut store = store();
        let mut page = TaskListPage::new();
        page.handle_key(key(KeyCode::Char('/')), &mut store);
        assert!(page.capturing_input());
        for c in "client".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(!page.capturing_input());
        assert!(!visible(&page, &store).is_empty());
        assert!(visible(&page, &store).len() < 8);
    }

    #[test]
    fn test_space_advances_status_and_delete_asks_first() {
        let mut store = store();
        let mut page = TaskListPage::new();
        page.sort_key = SortKey::Title;
        page.sort_order = SortOrder::Asc;
        let first = visible(&page, &store)[0];
        let before = store.db.task(first).unwrap().status;
        let action = page.handle_key(key(KeyCode::Char(' ')), &mut store);
        assert!(matches!(action, Action::Notice(..)));
        assert_eq!(store.db.task(first).unwrap().status, next_status(before));
        assert!(matches!(
            page.handle_key(key(KeyCode::Char('d')), &mut store),
            Action::Confirm(ConfirmOp::DeleteTask(id)) if id == first
        ));
    }

    #[test]
    fn test_panel_dates_validate() {
        let mut store = store();
        let mut page = TaskListPage::new();
        page.handle_key(key(KeyCode::Char('f')), &mut store);
        page.handle_key(key(KeyCode::BackTab), &mut store);
        for c in "31.13.2025".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        assert!(matches!(page.handle_key(key(KeyCode::Enter), &mut store), Action::Fail(_)));
        page.handle_key(key(KeyCode::Delete), &mut store);
        for c in "01.01.2000".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(page.panel.is_none());
        assert!(page.filters.date_from.is_some());
        assert_eq!(page.filters.count_active_filters(), 1);
    }

    #[test]
    fn test_panel_department_pick_filters_by_members() {
        let mut store = store();
        let mut page = TaskListPage::new();
        page.handle_key(key(KeyCode::Char('f')), &mut store);
        page.handle_key(key(KeyCode::Tab), &mut store);
        page.handle_key(key(KeyCode::Char(' ')), &mut store);
        page.handle_key(key(KeyCode::Esc), &mut store);
        let members = store.db.active_members(1);
        let rows = page.rows(&store.db, Local::now().naive_local());
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|t| t.assignee_ids.iter().any(|a| members.contains(a))));
    }
}
