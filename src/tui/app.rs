//! Main application logic for the terminal user interface.
//!
//! `App` owns the store and the host bridge, routes keys to the current
//! page, applies the actions pages hand back, and draws the frame around
//! them (tabs, toasts, confirm prompt, help).

use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};

use crate::api;
use crate::auth::{DenyReason, Session};
use crate::db::Store;
use crate::error::AppError;
use crate::fields::Theme;
use crate::host::{Haptic, HostBridge};
use crate::seed::demo_database;
use crate::tui::{
    analytics::AnalyticsPage,
    colors::{background_color, text_color, ACCENT, DARK_GREEN, DARK_RED, GOLD},
    employees::EmployeesPage,
    enums::{Action, ConfirmOp, Page, ToastKind},
    projects::ProjectsPage,
    settings::SettingsPage,
    task_form::TaskFormPage,
    task_list::TaskListPage,
    utils::centered_rect,
};

const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    fn expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_TTL
    }
}

/// Main application state for the terminal user interface.
pub struct App {
    store: Store,
    session: Result<Session, DenyReason>,
    host: Box<dyn HostBridge>,
    theme: Theme,
    page: Page,
    history: Vec<Page>,
    max_history: usize,
    toast: Option<Toast>,
    confirm: Option<ConfirmOp>,
    show_help: bool,
    task_form: TaskFormPage,
    task_list: TaskListPage,
    projects: ProjectsPage,
    employees: EmployeesPage,
    analytics: AnalyticsPage,
    settings: SettingsPage,
    quit: bool,
}

impl App {
    pub fn new(store: Store, session: Result<Session, DenyReason>, mut host: Box<dyn HostBridge>) -> Self {
        host.ready();
        host.expand();
        let theme = host.theme();
        let creator = session.as_ref().ok().map(|s| s.user.id);
        let mut app = App {
            store,
            session,
            host,
            theme,
            page: Page::TaskForm,
            history: Vec::new(),
            max_history: 10,
            toast: None,
            confirm: None,
            show_help: false,
            task_form: TaskFormPage::new(creator),
            task_list: TaskListPage::new(),
            projects: ProjectsPage::new(),
            employees: EmployeesPage::new(),
            analytics: AnalyticsPage::new(),
            settings: SettingsPage::new(theme),
            quit: false,
        };
        app.sync_host();
        app
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Switch pages, remembering where we came from.
    fn push_page(&mut self, page: Page) {
        if page == self.page {
            return;
        }
        self.history.push(self.page);
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }
        self.page = page;
        self.show_help = false;
        self.host.haptic(Haptic::Light);
    }

    fn go_back(&mut self) -> bool {
        match self.history.pop() {
            Some(page) => {
                self.page = page;
                self.host.haptic(Haptic::Light);
                true
            }
            None => false,
        }
    }

    fn has_navigation_history(&self) -> bool {
        !self.history.is_empty()
    }

    fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
        let haptic = match kind {
            ToastKind::Success => Some(Haptic::Success),
            ToastKind::Error => Some(Haptic::Error),
            ToastKind::Warning => Some(Haptic::Warning),
            ToastKind::Info => None,
        };
        if let Some(h) = haptic {
            self.host.haptic(h);
        }
        self.toast = Some(Toast { kind, message: message.into(), shown_at: Instant::now() });
    }

    fn report_error(&mut self, err: AppError) {
        if err.is_user_facing() {
            log::debug!("{err}");
            self.notify(ToastKind::Error, err.to_string());
        } else {
            log::error!("{err}");
            self.notify(ToastKind::Error, "Something went wrong");
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None | Action::Unhandled => {}
            Action::Notice(kind, message) => self.notify(kind, message),
            Action::Fail(err) => self.report_error(err),
            Action::Confirm(op) => {
                self.host.haptic(Haptic::Warning);
                self.confirm = Some(op);
            }
            Action::Goto(page) => self.push_page(page),
            Action::EditTask(id) => match self.store.db.task(id) {
                Some(task) => {
                    self.task_form.load(task);
                    self.host.haptic(Haptic::Medium);
                    self.push_page(Page::TaskForm);
                    self.notify(ToastKind::Info, "Editing task");
                }
                None => self.report_error(AppError::not_found("Task", id)),
            },
            Action::SetTheme(theme) => {
                self.theme = theme;
                self.settings.theme = theme;
                self.host.set_theme(theme);
                self.host.haptic(Haptic::Selection);
            }
            Action::Selection => self.host.haptic(Haptic::Selection),
            Action::Batch(actions) => {
                for a in actions {
                    self.apply(a);
                }
            }
        }
    }

    fn run_confirmed(&mut self, op: ConfirmOp) {
        self.host.haptic(Haptic::Heavy);
        let db = &mut self.store.db;
        let outcome = match &op {
            ConfirmOp::DeleteTask(id) => api::delete_task(db, *id).map(|_| "Task deleted".to_string()),
            ConfirmOp::DeleteProject(id) => api::delete_project(db, *id).map(|_| "Project deleted".to_string()),
            ConfirmOp::DeleteDepartment(id) => {
                api::delete_department(db, *id).map(|_| "Department deleted".to_string())
            }
            ConfirmOp::DeleteEmployee(id) => api::delete_employee(db, *id).map(|r| match r {
                api::EmployeeRemoval::Removed => "Employee deleted".to_string(),
                api::EmployeeRemoval::Deactivated => "Employee has active tasks and was deactivated".to_string(),
            }),
            ConfirmOp::RemoveEmail(email) => Ok(if api::remove_notification_email(db, email) {
                "Email removed".to_string()
            } else {
                "Email was not in the list".to_string()
            }),
            ConfirmOp::ResetDemo => {
                *db = demo_database(Local::now().date_naive());
                self.task_form.reset();
                Ok("Demo data restored".to_string())
            }
        };
        // A task being edited may just have been deleted.
        if let ConfirmOp::DeleteTask(id) = op {
            if self.task_form.form.editing_task_id == Some(id) {
                self.task_form.reset();
            }
        }
        let action = match outcome {
            Ok(msg) => Action::commit(&self.store, Ok(()), msg),
            Err(e) => Action::Fail(e),
        };
        self.apply(action);
    }

    fn page_capturing_input(&self) -> bool {
        match self.page {
            Page::TaskForm => self.task_form.capturing_input(),
            Page::TaskList => self.task_list.capturing_input(),
            Page::Projects => self.projects.capturing_input(),
            Page::Employees => self.employees.capturing_input(),
            Page::Analytics => self.analytics.capturing_input(),
            Page::Settings => self.settings.capturing_input(),
        }
    }

    fn sync_host(&mut self) {
        let back = self.has_navigation_history();
        self.host.set_back_button(back);
        let label = (self.session.is_ok() && self.page == Page::TaskForm).then(|| self.task_form.main_button_label());
        self.host.set_main_button(label);
    }

    /// Route one key press. Exposed so tests can drive the app without a terminal.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }
        if self.toast.as_ref().is_some_and(Toast::expired) {
            self.toast = None;
        }
        if self.session.is_err() {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter) {
                self.quit = true;
            }
            return;
        }

        if let Some(op) = self.confirm.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.run_confirmed(op),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.notify(ToastKind::Info, "Cancelled"),
                _ => self.confirm = Some(op),
            }
            self.sync_host();
            return;
        }
        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::F(n) => {
                if let Some(page) = Page::from_function_key(n) {
                    self.push_page(page);
                    self.sync_host();
                    return;
                }
            }
            KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => {
                self.go_back();
                self.sync_host();
                return;
            }
            _ => {}
        }

        let store = &mut self.store;
        let action = match self.page {
            Page::TaskForm => self.task_form.handle_key(key, store),
            Page::TaskList => self.task_list.handle_key(key, store),
            Page::Projects => self.projects.handle_key(key, store),
            Page::Employees => self.employees.handle_key(key, store),
            Page::Analytics => self.analytics.handle_key(key, store),
            Page::Settings => self.settings.handle_key(key, store),
        };
        match action {
            Action::Unhandled if !self.page_capturing_input() => self.handle_global_key(key),
            Action::Unhandled if key.code == KeyCode::Esc => {
                self.go_back();
            }
            other => self.apply(other),
        }
        self.sync_host();
    }

    fn handle_global_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Esc => {
                self.go_back();
            }
            KeyCode::Tab => self.push_page(self.page.step(true)),
            KeyCode::BackTab => self.push_page(self.page.step(false)),
            KeyCode::Char(c @ '1'..='6') => {
                let n = c as u8 - b'0';
                if let Some(page) = Page::from_function_key(n) {
                    self.push_page(page);
                }
            }
            _ => {}
        }
    }

    /// Handle user input events.
    fn handle_input(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        if self.toast.as_ref().is_some_and(Toast::expired) {
            self.toast = None;
        }
        Ok(())
    }

    fn render_header(&self, f: &mut Frame, area: Rect, session: &Session) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(32)])
            .split(area);
        let titles: Vec<Line> = Page::ALL
            .iter()
            .enumerate()
            .map(|(i, p)| Line::from(format!("F{} {}", i + 1, p.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.page.index())
            .block(Block::default().borders(Borders::ALL).title("staffdesk"))
            .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, chunks[0]);

        let who = if session.impersonated {
            format!("{} (dev)", session.admin.name)
        } else {
            session.admin.name.clone()
        };
        f.render_widget(
            Paragraph::new(who)
                .alignment(Alignment::Right)
                .block(Block::default().borders(Borders::ALL).title("Signed in")),
            chunks[1],
        );
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect, op: &ConfirmOp) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(op.describe(&self.store.db), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        f.render_widget(
            Paragraph::new(text).block(block).alignment(Alignment::Center).wrap(Wrap { trim: true }),
            area,
        );
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let heading = |s: &'static str| Line::from(Span::styled(s, Style::default().add_modifier(Modifier::BOLD)));
        let help_text = vec![
            heading("Everywhere"),
            Line::from("  F1-F6        Switch page"),
            Line::from("  Alt+Left     Back to the previous page"),
            Line::from("  Ctrl+C       Quit"),
            Line::from("  1-6, Tab     Switch page (outside text fields)"),
            Line::from("  Esc          Back   q Quit   ? This help"),
            Line::from(""),
            heading("New task"),
            Line::from("  Tab/Up/Down  Move between fields"),
            Line::from("  Enter        Open the project or assignee picker"),
            Line::from("  Space        Toggle an entry in a picker, Ctrl+A a whole department"),
            Line::from("  Typing       Search inside a picker"),
            Line::from("  Left/Right   Pick a project or assignee in the summary   x remove it"),
            Line::from("  Ctrl+S       Create or save the task   Ctrl+R clear the form"),
            Line::from(""),
            heading("Tasks"),
            Line::from("  p i c x o    Status chips   / search   f filters   s/r sort"),
            Line::from("  Enter        Details   Space next status   e edit   d delete   n new"),
            Line::from(""),
            heading("Projects and employees"),
            Line::from("  a add   s add sub-project   A add department   e edit   d delete"),
            Line::from("  v (de)activate employee   m head of department   Left/Right fold"),
            Line::from(""),
            heading("Analytics"),
            Line::from("  Left/Right month   m this month   a all time   p custom period   Tab breakdown"),
            Line::from(""),
            heading("Date formats"),
            Line::from("  DD.MM.YYYY, YYYY-MM-DD, today, tomorrow; times as HH:MM"),
        ];
        let area = centered_rect(70, 80, area);
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(help_text)
                .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, bg, fg) = match &self.toast {
            Some(t) => {
                let bg = match t.kind {
                    ToastKind::Success => DARK_GREEN,
                    ToastKind::Error => DARK_RED,
                    ToastKind::Warning => GOLD,
                    ToastKind::Info => ACCENT,
                };
                let fg = if bg == GOLD { Color::Rgb(20, 20, 20) } else { Color::White };
                (t.message.clone(), bg, fg)
            }
            None => {
                let mut hint = format!("{} | ? help", self.page.title());
                if self.has_navigation_history() {
                    hint.push_str(" | Alt+← Back");
                }
                if self.page == Page::TaskForm {
                    hint.push_str(&format!(" | Ctrl+S {}", self.task_form.main_button_label()));
                }
                (hint, ACCENT, Color::White)
            }
        };
        f.render_widget(Paragraph::new(text).style(Style::default().bg(bg).fg(fg)), area);
    }

    fn render_denied(&self, f: &mut Frame, reason: &DenyReason) {
        let area = centered_rect(60, 40, f.area());
        let text = vec![
            Line::from(Span::styled(reason.title(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(capitalize(&reason.to_string())),
            Line::from(""),
            Line::from(Span::styled(reason.hint(), Style::default().fg(GOLD))),
            Line::from(""),
            Line::from("Press q to exit"),
        ];
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).style(Style::default().bg(DARK_RED))),
            area,
        );
    }

    /// Main render function that dispatches to the current page.
    fn render(&mut self, f: &mut Frame) {
        f.render_widget(
            Block::default().style(Style::default().bg(background_color(self.theme)).fg(text_color(self.theme))),
            f.area(),
        );
        let session = match &self.session {
            Ok(s) => s.clone(),
            Err(reason) => {
                self.render_denied(f, reason);
                return;
            }
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        self.render_header(f, chunks[0], &session);

        let db = &self.store.db;
        let body = chunks[1];
        match self.page {
            Page::TaskForm => self.task_form.render(f, body, db),
            Page::TaskList => self.task_list.render(f, body, db),
            Page::Projects => self.projects.render(f, body, db),
            Page::Employees => self.employees.render(f, body, db),
            Page::Analytics => self.analytics.render(f, body, db),
            Page::Settings => {
                let file = self
                    .store
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "in memory (not saved)".to_string());
                self.settings.render(f, body, db, &file)
            }
        }

        if let Some(op) = &self.confirm {
            self.render_confirm(f, body, op);
        }
        if self.show_help {
            self.render_help(f, body);
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop for the TUI application.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.quit {
            terminal.draw(|f| self.render(f))?;
            self.handle_input()?;
        }
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Admin, HostUser};
    use crate::host::NullHost;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Host that remembers every haptic it was asked for.
    struct RecordingHost(Rc<RefCell<Vec<Haptic>>>);

    impl HostBridge for RecordingHost {
        fn is_available(&self) -> bool {
            true
        }
        fn ready(&mut self) {}
        fn expand(&mut self) {}
        fn init_data(&self) -> Option<String> {
            None
        }
        fn theme(&self) -> Theme {
            Theme::Dark
        }
        fn set_theme(&mut self, _theme: Theme) {}
        fn set_back_button(&mut self, _visible: bool) {}
        fn set_main_button(&mut self, _label: Option<&str>) {}
        fn haptic(&mut self, kind: Haptic) {
            self.0.borrow_mut().push(kind);
        }
    }

    fn session() -> Session {
        Session {
            user: HostUser { id: 123456789, first_name: "Chief".into(), ..HostUser::default() },
            admin: Admin { host_user_id: 123456789, name: "Chief Administrator".into() },
            impersonated: false,
        }
    }

    fn app() -> App {
        let store = Store::in_memory(demo_database(Local::now().date_naive()));
        App::new(store, Ok(session()), Box::new(NullHost))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_function_keys_and_back() {
        let mut app = app();
        assert_eq!(app.page(), Page::TaskForm);
        app.handle_key(key(KeyCode::F(3)));
        app.handle_key(key(KeyCode::F(4)));
        assert_eq!(app.page(), Page::Employees);
        app.handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT));
        assert_eq!(app.page(), Page::Projects);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.page(), Page::TaskForm);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.page(), Page::TaskForm);
    }

    #[test]
    fn test_digits_switch_pages_outside_text_fields() {
        let mut app = app();
        app.handle_key(key(KeyCode::F(2)));
        app.handle_key(key(KeyCode::Char('6')));
        assert_eq!(app.page(), Page::Settings);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut app = app();
        for i in 0..30u8 {
            app.handle_key(key(KeyCode::F(i % 6 + 1)));
        }
        assert!(app.history.len() <= 10);
    }

    #[test]
    fn test_confirm_delete_task() {
        let mut app = app();
        app.handle_key(key(KeyCode::F(2)));
        let before = app.store().db.tasks.len();
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.confirm.is_some());
        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.confirm.is_some());
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.store().db.tasks.len(), before);
        app.handle_key(key(KeyCode::Char('d')));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(app.store().db.tasks.len(), before - 1);
        assert_eq!(app.toast().map(|t| t.kind), Some(ToastKind::Success));
    }

    #[test]
    fn test_haptics_follow_actions() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let store = Store::in_memory(demo_database(Local::now().date_naive()));
        let mut app = App::new(store, Ok(session()), Box::new(RecordingHost(Rc::clone(&log))));
        let id = app.store().db.tasks[0].id;

        app.apply(Action::EditTask(id));
        assert_eq!(log.borrow()[0], Haptic::Medium);

        log.borrow_mut().clear();
        app.apply(Action::Confirm(ConfirmOp::DeleteTask(id)));
        app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(*log.borrow(), vec![Haptic::Warning, Haptic::Heavy, Haptic::Success]);
        assert!(!app.task_form.is_editing());
    }

    #[test]
    fn test_edit_task_opens_form() {
        let mut app = app();
        let id = app.store().db.tasks[0].id;
        app.apply(Action::EditTask(id));
        assert_eq!(app.page(), Page::TaskForm);
        assert!(app.task_form.is_editing());
        app.apply(Action::EditTask(9999));
        assert_eq!(app.toast().map(|t| t.kind), Some(ToastKind::Error));
    }

    #[test]
    fn test_denied_session_only_quits() {
        let store = Store::in_memory(demo_database(Local::now().date_naive()));
        let mut app = App::new(store, Err(DenyReason::NotAllowed(42)), Box::new(NullHost));
        app.handle_key(key(KeyCode::F(2)));
        assert_eq!(app.page(), Page::TaskForm);
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let mut app = app();
        app.report_error(AppError::Io(io::Error::other("disk on fire")));
        assert_eq!(app.toast().map(|t| t.message.as_str()), Some("Something went wrong"));
        app.report_error(AppError::Validation("Enter a title".into()));
        assert_eq!(app.toast().map(|t| t.message.as_str()), Some("Enter a title"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("account 1 has no access"), "Account 1 has no access");
        assert_eq!(capitalize(""), "");
    }
}
