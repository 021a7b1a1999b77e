//! Settings page: notification switches, recipient list, reminder rules and
//! interface theme.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::api;
use crate::db::{pluralize, Database, Store};
use crate::fields::{DeliveryStatus, Theme};
use crate::notify::NotificationSettings;
use crate::tui::colors::{GOLD, MUTED};
use crate::tui::enums::{Action, ConfirmOp, ToastKind};
use crate::tui::input::InputField;
use crate::tui::utils::{checkbox, clamp_cursor, step_cursor};

const SWITCHES: [&str; 5] = [
    "Email notifications",
    "Notifications in the messenger",
    "When a task is completed",
    "When a deadline is near",
    "When a task is overdue",
];

#[derive(Clone, PartialEq, Eq, Debug)]
enum Item {
    Switch(usize),
    Theme,
    Email(String),
    AddEmail,
    ResetDemo,
}

fn switch_mut(settings: &mut NotificationSettings, i: usize) -> Option<&mut bool> {
    match i {
        0 => Some(&mut settings.email_enabled),
        1 => Some(&mut settings.host_enabled),
        2 => Some(&mut settings.notify_on_complete),
        3 => Some(&mut settings.notify_on_deadline),
        4 => Some(&mut settings.notify_on_overdue),
        _ => None,
    }
}

fn switch_value(settings: &NotificationSettings, i: usize) -> bool {
    match i {
        0 => settings.email_enabled,
        1 => settings.host_enabled,
        2 => settings.notify_on_complete,
        3 => settings.notify_on_deadline,
        _ => settings.notify_on_overdue,
    }
}

pub fn next_theme(theme: Theme) -> Theme {
    match theme {
        Theme::Auto => Theme::Light,
        Theme::Light => Theme::Dark,
        Theme::Dark => Theme::Auto,
    }
}

fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Auto => "auto",
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

pub struct SettingsPage {
    /// Mirrors the app theme for display.
    pub theme: Theme,
    cursor: usize,
    new_email: Option<InputField>,
}

impl SettingsPage {
    pub fn new(theme: Theme) -> Self {
        Self { theme, cursor: 0, new_email: None }
    }

    pub fn capturing_input(&self) -> bool {
        self.new_email.is_some()
    }

    fn items(db: &Database) -> Vec<Item> {
        let mut items: Vec<Item> = (0..SWITCHES.len()).map(Item::Switch).collect();
        items.push(Item::Theme);
        items.extend(db.settings.emails.iter().cloned().map(Item::Email));
        items.push(Item::AddEmail);
        items.push(Item::ResetDemo);
        items
    }

    fn selected(&mut self, db: &Database) -> Option<Item> {
        let items = Self::items(db);
        self.cursor = clamp_cursor(self.cursor, items.len());
        items.get(self.cursor).cloned()
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Action {
        if let Some(input) = self.new_email.as_mut() {
            match key.code {
                KeyCode::Esc => self.new_email = None,
                KeyCode::Enter => {
                    let email = input.value.trim().to_string();
                    return match api::add_notification_email(&mut store.db, &email) {
                        Ok(true) => {
                            self.new_email = None;
                            Action::commit(store, Ok(()), "Email added")
                        }
                        Ok(false) => Action::Notice(ToastKind::Warning, "Email already added".into()),
                        Err(e) => Action::Fail(e),
                    };
                }
                KeyCode::Char(c) => input.handle_char(c),
                KeyCode::Backspace => input.handle_backspace(),
                KeyCode::Delete => input.handle_delete(),
                KeyCode::Left => input.move_cursor_left(),
                KeyCode::Right => input.move_cursor_right(),
                KeyCode::Home => input.move_home(),
                KeyCode::End => input.move_end(),
                _ => {}
            }
            return Action::None;
        }

        let len = Self::items(&store.db).len();
        match (key.code, self.selected(&store.db)) {
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                self.cursor = step_cursor(self.cursor, len, false);
                Action::None
            }
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                self.cursor = step_cursor(self.cursor, len, true);
                Action::None
            }
            (KeyCode::Char(' ') | KeyCode::Enter, Some(Item::Switch(i))) => {
                let mut settings = store.db.settings.clone();
                if let Some(flag) = switch_mut(&mut settings, i) {
                    *flag = !*flag;
                }
                let result = api::update_settings(&mut store.db, settings);
                Action::commit(store, result, "Settings saved")
            }
            (KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right, Some(Item::Theme)) => {
                self.theme = next_theme(self.theme);
                Action::SetTheme(self.theme)
            }
            (KeyCode::Char('a'), _) | (KeyCode::Enter, Some(Item::AddEmail)) => {
                self.new_email = Some(InputField { active: true, ..InputField::new() });
                Action::None
            }
            (KeyCode::Char('d') | KeyCode::Delete, Some(Item::Email(email))) => {
                Action::Confirm(ConfirmOp::RemoveEmail(email))
            }
            (KeyCode::Char('R'), _) | (KeyCode::Enter, Some(Item::ResetDemo)) => Action::Confirm(ConfirmOp::ResetDemo),
            _ => Action::Unhandled,
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database, data_file: &str) {
        let entries = Self::items(db);
        self.cursor = clamp_cursor(self.cursor, entries.len());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let section = |text: &str| ListItem::new(Span::styled(text.to_string(), Style::default().fg(MUTED)));
        let mut items = Vec::new();
        let mut selected = None;
        for (i, entry) in entries.iter().enumerate() {
            match entry {
                Item::Switch(0) => items.push(section("Notifications")),
                Item::Theme => items.push(section("Appearance")),
                Item::Email(_) | Item::AddEmail if !matches!(entries.get(i.wrapping_sub(1)), Some(Item::Email(_))) => {
                    items.push(section("Email recipients"))
                }
                Item::ResetDemo => items.push(section("Data")),
                _ => {}
            }
            if i == self.cursor {
                selected = Some(items.len());
            }
            let line = match entry {
                Item::Switch(n) => {
                    let on = switch_value(&db.settings, *n);
                    // Event switches only matter while some channel is on.
                    let live = *n < 2 || db.settings.email_enabled || db.settings.host_enabled;
                    let style = if live { Style::default() } else { Style::default().fg(MUTED) };
                    Line::from(Span::styled(format!("{} {}", checkbox(on), SWITCHES[*n]), style))
                }
                Item::Theme => Line::from(vec![
                    Span::raw("Theme: "),
                    Span::styled(theme_name(self.theme), Style::default().fg(GOLD)),
                    Span::styled("  (Enter to change)", Style::default().fg(MUTED)),
                ]),
                Item::Email(email) => Line::from(format!("  {email}")),
                Item::AddEmail => Line::from(Span::styled("  + Add email", Style::default().fg(GOLD))),
                Item::ResetDemo => Line::from(Span::styled("Reset to demo data", Style::default().fg(Color::Red))),
            };
            items.push(ListItem::new(line));
        }
        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        let mut state = ListState::default().with_selected(selected);
        f.render_stateful_widget(list, columns[0], &mut state);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if self.new_email.is_some() { 3 } else { 0 }),
                Constraint::Length(db.rules.len() as u16 + 2),
                Constraint::Min(5),
            ])
            .split(columns[1]);

        if let Some(input) = &self.new_email {
            f.render_widget(
                Paragraph::new(input.display()).block(
                    Block::default()
                        .title("New email (Enter add, Esc cancel)")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(GOLD)),
                ),
                right[0],
            );
        }

        let rules: Vec<Line> = db.rules.iter().map(|r| Line::from(r.describe())).collect();
        f.render_widget(
            Paragraph::new(rules).block(Block::default().title("Reminder schedule").borders(Borders::ALL)),
            right[1],
        );

        let failed = db.reminders.iter().filter(|r| r.status == DeliveryStatus::Failed).count();
        let mut info = vec![
            Line::from(vec![
                Span::styled("Reminders sent: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(pluralize(db.reminders.len() - failed, "reminder", "reminders")),
            ]),
            Line::from(format!("Failed deliveries: {failed}")),
            Line::from(format!(
                "Messenger chats: {}",
                pluralize(db.settings.host_chat_ids.len(), "chat", "chats")
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Data file: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(data_file.to_string(), Style::default().fg(MUTED)),
            ]),
        ];
        info.push(Line::from(Span::styled(
            "a add email  d remove email  R reset demo data",
            Style::default().fg(MUTED),
        )));
        f.render_widget(
            Paragraph::new(info).block(Block::default().title("Delivery").borders(Borders::ALL)),
            right[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_toggle_switch_saves() {
        let mut store = Store::in_memory(Database::default());
        let mut page = SettingsPage::new(Theme::Auto);
        let action = page.handle_key(key(KeyCode::Char(' ')), &mut store);
        assert!(matches!(action, Action::Notice(ToastKind::Success, _)));
        assert!(!store.db.settings.email_enabled);
        page.handle_key(key(KeyCode::Down), &mut store);
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(store.db.settings.host_enabled);
    }

    #[test]
    fn test_theme_cycles() {
        let mut store = Store::in_memory(Database::default());
        let mut page = SettingsPage::new(Theme::Dark);
        page.cursor = 5;
        assert!(matches!(page.handle_key(key(KeyCode::Enter), &mut store), Action::SetTheme(Theme::Auto)));
        assert!(matches!(page.handle_key(key(KeyCode::Enter), &mut store), Action::SetTheme(Theme::Light)));
    }

    #[test]
    fn test_add_and_remove_email() {
        let mut store = Store::in_memory(Database::default());
        let mut page = SettingsPage::new(Theme::Auto);
        page.handle_key(key(KeyCode::Char('a')), &mut store);
        assert!(page.capturing_input());
        for c in "ops@company.example".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        page.handle_key(key(KeyCode::Enter), &mut store);
        assert_eq!(store.db.settings.emails, vec!["ops@company.example".to_string()]);
        assert!(!page.capturing_input());

        page.handle_key(key(KeyCode::Char('a')), &mut store);
        for c in "OPS@company.example".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        let action = page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(matches!(action, Action::Notice(ToastKind::Warning, _)));
        page.handle_key(key(KeyCode::Esc), &mut store);

        page.cursor = 6;
        let action = page.handle_key(key(KeyCode::Char('d')), &mut store);
        assert!(matches!(action, Action::Confirm(ConfirmOp::RemoveEmail(e)) if e == "ops@company.example"));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let mut store = Store::in_memory(Database::default());
        let mut page = SettingsPage::new(Theme::Auto);
        page.handle_key(key(KeyCode::Char('a')), &mut store);
        for c in "not-an-email".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        assert!(matches!(page.handle_key(key(KeyCode::Enter), &mut store), Action::Fail(_)));
        assert!(page.capturing_input());
        assert!(store.db.settings.emails.is_empty());
    }
}
