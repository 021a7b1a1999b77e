//! Analytics page: overview of tasks due in a period, broken down by
//! employee or by root project.

use chrono::{Datelike, Local, Months, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Row, Table, TableState, Tabs},
    Frame,
};

use crate::analytics::{self, current_month_period, filter_by_period, Period};
use crate::db::{format_date, format_deadline, format_status, parse_date_input, Database, Store};
use crate::tui::colors::{project_color, status_color, DARK_GREEN, DARK_RED, GOLD, MUTED};
use crate::tui::enums::Action;
use crate::tui::input::InputField;
use crate::tui::utils::{centered_rect, clamp_cursor, step_cursor};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Breakdown {
    Employees,
    Projects,
}

/// Row of the current breakdown, reduced to what the table shows.
struct BreakdownRow {
    name: String,
    detail: String,
    numbers: String,
    task_ids: Vec<u64>,
    color: Color,
}

struct RangeEditor {
    from: InputField,
    to: InputField,
    on_to: bool,
}

pub struct AnalyticsPage {
    pub period: Period,
    pub breakdown: Breakdown,
    search: InputField,
    table: TableState,
    expanded: bool,
    range: Option<RangeEditor>,
}

impl AnalyticsPage {
    pub fn new() -> Self {
        Self::starting(Local::now().date_naive())
    }

    pub fn starting(today: NaiveDate) -> Self {
        Self {
            period: current_month_period(today),
            breakdown: Breakdown::Employees,
            search: InputField::new(),
            table: TableState::default().with_selected(Some(0)),
            expanded: false,
            range: None,
        }
    }

    pub fn capturing_input(&self) -> bool {
        self.search.active || self.range.is_some()
    }

    fn lines(&self, db: &Database) -> Vec<BreakdownRow> {
        let now = Local::now().naive_local();
        let tasks = filter_by_period(&db.tasks, self.period);
        match self.breakdown {
            Breakdown::Employees => analytics::employee_rows(db, &tasks, &self.search.value, now)
                .into_iter()
                .map(|r| BreakdownRow {
                    name: r.name,
                    detail: r.department,
                    numbers: format!(
                        "{} total  {} done  {} in progress  {} overdue",
                        r.total, r.completed, r.in_progress, r.overdue
                    ),
                    color: if r.overdue > 0 { Color::Red } else { Color::Reset },
                    task_ids: r.task_ids,
                })
                .collect(),
            Breakdown::Projects => analytics::project_rows(db, &tasks, &self.search.value)
                .into_iter()
                .map(|r| BreakdownRow {
                    detail: format!("{}%", r.progress),
                    numbers: format!("{} of {} done", r.completed, r.total),
                    color: project_color(&r.color),
                    name: r.name,
                    task_ids: r.task_ids,
                })
                .collect(),
        }
    }

    /// Move a month-long period one month back or forward.
    fn shift_month(&mut self, forward: bool) {
        let anchor = self
            .period
            .from
            .or(self.period.to)
            .unwrap_or_else(|| Local::now().date_naive())
            .with_day(1);
        let moved = anchor.and_then(|a| {
            if forward {
                a.checked_add_months(Months::new(1))
            } else {
                a.checked_sub_months(Months::new(1))
            }
        });
        if let Some(day) = moved {
            self.period = current_month_period(day);
        }
    }

    fn select(&mut self, row: usize) {
        self.table.select(Some(row));
        self.expanded = false;
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Action {
        if self.range.is_some() {
            return self.handle_range_key(key);
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
            self.select(0);
            return Action::None;
        }

        let len = self.lines(&store.db).len();
        let cursor = self.table.selected().unwrap_or(0);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.select(step_cursor(cursor, len, false)),
            KeyCode::Down | KeyCode::Char('j') => self.select(step_cursor(cursor, len, true)),
            KeyCode::Enter => self.expanded = !self.expanded,
            KeyCode::Tab | KeyCode::BackTab => {
                self.breakdown = match self.breakdown {
                    Breakdown::Employees => Breakdown::Projects,
                    Breakdown::Projects => Breakdown::Employees,
                };
                self.select(0);
                return Action::Selection;
            }
            KeyCode::Left => self.shift_month(false),
            KeyCode::Right => self.shift_month(true),
            KeyCode::Char('m') => self.period = current_month_period(Local::now().date_naive()),
            KeyCode::Char('a') => self.period = Period::default(),
            KeyCode::Char('p') => {
                let text = |d: Option<NaiveDate>| d.map(format_date).unwrap_or_default();
                self.range = Some(RangeEditor {
                    from: InputField { active: true, ..InputField::with_value(&text(self.period.from)) },
                    to: InputField::with_value(&text(self.period.to)),
                    on_to: false,
                });
            }
            KeyCode::Char('/') => self.search.active = true,
            _ => return Action::Unhandled,
        }
        Action::None
    }

    fn handle_range_key(&mut self, key: KeyEvent) -> Action {
        let Some(range) = self.range.as_mut() else {
            return Action::Unhandled;
        };
        match key.code {
            KeyCode::Esc => self.range = None,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                range.on_to = !range.on_to;
                range.from.active = !range.on_to;
                range.to.active = range.on_to;
            }
            KeyCode::Enter => {
                let parse = |field: &InputField| {
                    let text = field.value.trim();
                    if text.is_empty() {
                        Ok(None)
                    } else {
                        parse_date_input(text).map(Some).ok_or(())
                    }
                };
                let (Ok(from), Ok(to)) = (parse(&range.from), parse(&range.to)) else {
                    return Action::invalid("Invalid date format");
                };
                if let (Some(f), Some(t)) = (from, to) {
                    if f > t {
                        return Action::invalid("The start date is after the end date");
                    }
                }
                self.period = Period { from, to };
                self.range = None;
                self.select(0);
            }
            code => {
                let field = if range.on_to { &mut range.to } else { &mut range.from };
                match code {
                    KeyCode::Char(c) => field.handle_char(c),
                    KeyCode::Backspace => field.handle_backspace(),
                    KeyCode::Delete => field.handle_delete(),
                    KeyCode::Left => field.move_cursor_left(),
                    KeyCode::Right => field.move_cursor_right(),
                    _ => {}
                }
            }
        }
        Action::None
    }

    pub fn describe_period(&self) -> String {
        match (self.period.from, self.period.to) {
            (None, None) => "All time".to_string(),
            (Some(f), Some(t)) if f.day() == 1 && Some(t) == current_month_period(f).to => {
                f.format("%B %Y").to_string()
            }
            (f, t) => format!(
                "{} to {}",
                f.map(format_date).unwrap_or_else(|| "…".into()),
                t.map(format_date).unwrap_or_else(|| "…".into())
            ),
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let now = Local::now().naive_local();
        let tasks = filter_by_period(&db.tasks, self.period);
        let stats = analytics::overview(&tasks, now);
        let lines = self.lines(db);
        let cursor = clamp_cursor(self.table.selected().unwrap_or(0), lines.len());
        self.table.select(Some(cursor));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(if self.search.active || !self.search.value.is_empty() { 3 } else { 0 }),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[0]);
        let counts = Line::from(vec![
            Span::styled(format!("{} tasks  ", stats.total), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("{} done  ", stats.completed), Style::default().fg(DARK_GREEN)),
            Span::styled(format!("{} in progress  ", stats.in_progress), Style::default().fg(GOLD)),
            Span::raw(format!("{} pending  ", stats.pending)),
            Span::styled(format!("{} overdue", stats.overdue), Style::default().fg(DARK_RED)),
        ]);
        f.render_widget(
            Paragraph::new(counts).block(Block::default().title(self.describe_period()).borders(Borders::ALL)),
            top[0],
        );
        f.render_widget(
            Gauge::default()
                .block(Block::default().title("Completion").borders(Borders::ALL))
                .gauge_style(Style::default().fg(DARK_GREEN))
                .percent(stats.completion_rate.min(100) as u16),
            top[1],
        );

        let tabs = Tabs::new(["Employees", "Projects"])
            .select(match self.breakdown {
                Breakdown::Employees => 0,
                Breakdown::Projects => 1,
            })
            .block(Block::default().borders(Borders::ALL).title("Breakdown (Tab)"))
            .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, chunks[1]);

        f.render_widget(
            Paragraph::new(Span::styled(
                "←/→ month  m this month  a all time  p custom period  / search  Enter tasks",
                Style::default().fg(MUTED),
            )),
            chunks[2],
        );

        if chunks[3].height > 0 {
            f.render_widget(
                Paragraph::new(self.search.display()).block(Block::default().title("Search").borders(Borders::ALL)),
                chunks[3],
            );
        }

        let (body, details) = if self.expanded {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(chunks[4]);
            (parts[0], Some(parts[1]))
        } else {
            (chunks[4], None)
        };

        let header = match self.breakdown {
            Breakdown::Employees => ["Employee", "Department", "Tasks"],
            Breakdown::Projects => ["Project", "Progress", "Tasks"],
        };
        let rows: Vec<Row> = lines
            .iter()
            .map(|l| {
                Row::new(vec![
                    Span::styled(l.name.clone(), Style::default().fg(l.color)),
                    Span::raw(l.detail.clone()),
                    Span::raw(l.numbers.clone()),
                ])
            })
            .collect();
        let empty = rows.is_empty();
        let table = Table::new(rows, [Constraint::Percentage(30), Constraint::Percentage(25), Constraint::Percentage(45)])
            .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(Block::default().borders(Borders::ALL))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, body, &mut self.table);
        if empty {
            let inner = centered_rect(60, 30, body);
            f.render_widget(Clear, inner);
            f.render_widget(
                Paragraph::new(Span::styled("No tasks in this period", Style::default().fg(MUTED))),
                inner,
            );
        }

        if let (Some(area), Some(line)) = (details, lines.get(cursor)) {
            let items: Vec<Line> = line
                .task_ids
                .iter()
                .filter_map(|id| db.task(*id))
                .map(|t| {
                    Line::from(vec![
                        Span::styled(format!("{:<12} ", format_status(t.status)), Style::default().fg(status_color(t.status))),
                        Span::raw(t.title.clone()),
                        Span::styled(format!("  {}", format_deadline(t)), Style::default().fg(MUTED)),
                    ])
                })
                .collect();
            f.render_widget(
                Paragraph::new(items).block(Block::default().title(line.name.clone()).borders(Borders::ALL)),
                area,
            );
        }

        if let Some(range) = &self.range {
            let popup = centered_rect(40, 30, area);
            f.render_widget(Clear, popup);
            let outer = Block::default()
                .title("Period (YYYY-MM-DD or DD.MM.YYYY, empty for open)")
                .title_bottom("Tab switch  Enter apply  Esc cancel")
                .borders(Borders::ALL);
            let inner = outer.inner(popup);
            f.render_widget(outer, popup);
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(3)])
                .split(inner);
            let border = |on: bool| if on { Style::default().fg(GOLD) } else { Style::default() };
            f.render_widget(
                Paragraph::new(range.from.display())
                    .block(Block::default().title("From").borders(Borders::ALL).border_style(border(!range.on_to))),
                parts[0],
            );
            f.render_widget(
                Paragraph::new(range.to.display())
                    .block(Block::default().title("To").borders(Borders::ALL).border_style(border(range.on_to))),
                parts[1],
            );
        }
    }
}

impl Default for AnalyticsPage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_database;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_navigation_crosses_years() {
        let mut store = Store::in_memory(demo_database(day(2025, 1, 15)));
        let mut page = AnalyticsPage::starting(day(2025, 1, 15));
        assert_eq!(page.describe_period(), "January 2025");
        page.handle_key(key(KeyCode::Left), &mut store);
        assert_eq!(page.period, Period { from: Some(day(2024, 12, 1)), to: Some(day(2024, 12, 31)) });
        page.handle_key(key(KeyCode::Right), &mut store);
        page.handle_key(key(KeyCode::Right), &mut store);
        assert_eq!(page.period.to, Some(day(2025, 2, 28)));
        page.handle_key(key(KeyCode::Char('a')), &mut store);
        assert_eq!(page.describe_period(), "All time");
    }

    #[test]
    fn test_custom_period() {
        let mut store = Store::in_memory(demo_database(day(2025, 3, 10)));
        let mut page = AnalyticsPage::starting(day(2025, 3, 10));
        page.handle_key(key(KeyCode::Char('p')), &mut store);
        assert!(page.capturing_input());
        if let Some(range) = page.range.as_mut() {
            range.from.set("2025-03-20");
            range.to.set("2025-03-05");
        }
        assert!(matches!(page.handle_key(key(KeyCode::Enter), &mut store), Action::Fail(_)));
        if let Some(range) = page.range.as_mut() {
            range.to.set("");
        }
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(!page.capturing_input());
        assert_eq!(page.period, Period { from: Some(day(2025, 3, 20)), to: None });
    }

    #[test]
    fn test_breakdown_switch_and_search() {
        let mut store = Store::in_memory(demo_database(Local::now().date_naive()));
        let mut page = AnalyticsPage::starting(Local::now().date_naive());
        page.handle_key(key(KeyCode::Char('a')), &mut store);
        assert_eq!(page.lines(&store.db).len(), 9);
        assert!(matches!(page.handle_key(key(KeyCode::Tab), &mut store), Action::Selection));
        assert_eq!(page.breakdown, Breakdown::Projects);
        assert_eq!(page.lines(&store.db).len(), 3);
        page.handle_key(key(KeyCode::Char('/')), &mut store);
        for c in "acme".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        let lines = page.lines(&store.db);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].task_ids.is_empty());
    }
}
