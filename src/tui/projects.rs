//! Projects page: the project tree with folding, search and an editor overlay.

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
use crate::project::{cycle_color, random_unused_color, ProjectDraft};
use crate::tree::ProjectTree;
use crate::tui::colors::{project_color, GOLD, MUTED};
use crate::tui::enums::{Action, ConfirmOp};
use crate::tui::input::InputField;
use crate::tui::utils::{centered_rect, clamp_cursor, step_cursor};

/// Fields of the editor, in tab order.
const NAME: usize = 0;
const DESCRIPTION: usize = 1;
const COLOR: usize = 2;
const PARENT: usize = 3;
const FIELD_COUNT: usize = 4;

struct ProjectEditor {
    editing: Option<u64>,
    name: InputField,
    description: InputField,
    color: String,
    parent_id: Option<u64>,
    focus: usize,
}

impl ProjectEditor {
    fn create(db: &Database, parent_id: Option<u64>) -> Self {
        let mut editor = ProjectEditor {
            editing: None,
            name: InputField::new(),
            description: InputField::new(),
            color: random_unused_color(&db.projects),
            parent_id,
            focus: NAME,
        };
        editor.focus_field(NAME);
        editor
    }

    fn edit(db: &Database, id: u64) -> Option<Self> {
        let p = db.project(id)?;
        let mut editor = ProjectEditor {
            editing: Some(id),
            name: InputField::with_value(&p.name),
            description: InputField::with_value(&p.description),
            color: p.color.clone(),
            parent_id: p.parent_id,
            focus: NAME,
        };
        editor.focus_field(NAME);
        Some(editor)
    }

    fn focus_field(&mut self, field: usize) {
        self.focus = field;
        self.name.active = field == NAME;
        self.description.active = field == DESCRIPTION;
    }

    /// Possible parents: none, or any project outside the edited subtree.
    fn parent_options(&self, tree: &ProjectTree) -> Vec<Option<u64>> {
        let mut banned: HashSet<u64> = HashSet::new();
        if let Some(id) = self.editing {
            banned.insert(id);
            banned.extend(tree.descendants(id));
        }
        std::iter::once(None)
            .chain(
                tree.flatten()
                    .into_iter()
                    .map(|(id, _)| id)
                    .filter(|id| !banned.contains(id))
                    .map(Some),
            )
            .collect()
    }

    fn draft(&self) -> ProjectDraft {
        ProjectDraft {
            parent_id: self.parent_id,
            name: self.name.value.clone(),
            description: self.description.value.clone(),
            color: Some(self.color.clone()),
        }
    }
}

#[derive(Default)]
pub struct ProjectsPage {
    cursor: usize,
    /// Folded nodes; everything else is shown expanded.
    collapsed: HashSet<u64>,
    search: InputField,
    editor: Option<ProjectEditor>,
}

impl ProjectsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capturing_input(&self) -> bool {
        self.search.active || self.editor.is_some()
    }

    /// Visible `(id, depth)` rows. A search shows matches with their ancestors.
    fn rows(&self, tree: &ProjectTree) -> Vec<(u64, usize)> {
        if self.search.is_empty() {
            let expanded: HashSet<u64> = tree
                .flatten()
                .into_iter()
                .map(|(id, _)| id)
                .filter(|id| !self.collapsed.contains(id))
                .collect();
            tree.flatten_visible(&expanded)
        } else {
            let hits = tree.search(&self.search.value);
            tree.flatten().into_iter().filter(|(id, _)| hits.contains(id)).collect()
        }
    }

    fn selected(&mut self, db: &Database) -> Option<u64> {
        let tree = ProjectTree::new(&db.projects);
        let rows = self.rows(&tree);
        self.cursor = clamp_cursor(self.cursor, rows.len());
        rows.get(self.cursor).map(|(id, _)| *id)
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

        let db = &store.db;
        let tree = ProjectTree::new(&db.projects);
        let len = self.rows(&tree).len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = step_cursor(self.cursor, len, false);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = step_cursor(self.cursor, len, true);
                Action::None
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Enter => {
                if let Some(id) = self.selected(db).filter(|id| tree.has_children(*id)) {
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
            KeyCode::Char('a') => {
                self.editor = Some(ProjectEditor::create(db, None));
                Action::None
            }
            KeyCode::Char('s') => match self.selected(db) {
                Some(parent) => {
                    self.collapsed.remove(&parent);
                    self.editor = Some(ProjectEditor::create(db, Some(parent)));
                    Action::None
                }
                None => Action::None,
            },
            KeyCode::Char('e') => {
                self.editor = self.selected(db).and_then(|id| ProjectEditor::edit(db, id));
                Action::None
            }
            KeyCode::Char('d') | KeyCode::Delete => match self.selected(db) {
                Some(id) if tree.has_children(id) || db.tasks.iter().any(|t| t.project_ids.contains(&id)) => {
                    Action::Fail(AppError::Conflict("Delete the sub-projects and tasks first".into()))
                }
                Some(id) => Action::Confirm(ConfirmOp::DeleteProject(id)),
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
            let draft = editor.draft();
            let result = match editor.editing {
                Some(id) => api::update_project(&mut store.db, id, draft).map(|_| "Project updated"),
                None => api::create_project(&mut store.db, draft).map(|_| "Project created"),
            };
            return match result {
                Ok(msg) => {
                    self.editor = None;
                    Action::commit(store, Ok(()), msg)
                }
                Err(e) => Action::Fail(e),
            };
        }
        match key.code {
            KeyCode::Esc => self.editor = None,
            KeyCode::Tab | KeyCode::Down => editor.focus_field(step_cursor(editor.focus, FIELD_COUNT, true)),
            KeyCode::BackTab | KeyCode::Up => editor.focus_field(step_cursor(editor.focus, FIELD_COUNT, false)),
            KeyCode::Left | KeyCode::Right if editor.focus == COLOR => {
                editor.color = cycle_color(&editor.color, key.code == KeyCode::Right);
            }
            KeyCode::Left | KeyCode::Right if editor.focus == PARENT => {
                let tree = ProjectTree::new(&store.db.projects);
                let options = editor.parent_options(&tree);
                let i = options.iter().position(|o| *o == editor.parent_id).unwrap_or(0);
                editor.parent_id = options[step_cursor(i, options.len(), key.code == KeyCode::Right)];
            }
            code => {
                let input = if editor.focus == NAME {
                    &mut editor.name
                } else if editor.focus == DESCRIPTION {
                    &mut editor.description
                } else {
                    return Action::None;
                };
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
        Action::None
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let tree = ProjectTree::new(&db.projects);
        let rows = self.rows(&tree);
        self.cursor = clamp_cursor(self.cursor, rows.len());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let search = if self.search.active || !self.search.value.is_empty() {
            Span::raw(self.search.display())
        } else {
            Span::styled("Press / to search by name or description", Style::default().fg(MUTED))
        };
        f.render_widget(
            Paragraph::new(search).block(Block::default().title("Search").borders(Borders::ALL)),
            chunks[0],
        );

        let items: Vec<ListItem> = rows
            .iter()
            .filter_map(|(id, depth)| {
                let p = tree.get(*id)?;
                let glyph = match (tree.has_children(*id), self.collapsed.contains(id) && self.search.is_empty()) {
                    (false, _) => "  ",
                    (true, true) => "▸ ",
                    (true, false) => "▾ ",
                };
                let tasks = db.tasks.iter().filter(|t| t.project_ids.contains(id)).count();
                let subs = tree.children(*id).len();
                let mut meta = pluralize(tasks, "task", "tasks");
                if subs > 0 {
                    meta.push_str(&format!(", {}", pluralize(subs, "sub-project", "sub-projects")));
                }
                Some(ListItem::new(Line::from(vec![
                    Span::raw(format!("{}{glyph}", "  ".repeat(*depth))),
                    Span::styled("● ", Style::default().fg(project_color(&p.color))),
                    Span::styled(p.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {meta}"), Style::default().fg(MUTED)),
                ])))
            })
            .collect();
        let title = if tree.is_empty() {
            "Projects - none yet, press a to add one".to_string()
        } else {
            format!("Projects ({})", tree.len())
        };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        let mut state = ListState::default().with_selected(Some(self.cursor));
        f.render_stateful_widget(list, chunks[1], &mut state);

        f.render_widget(
            Paragraph::new(Span::styled(
                "←/→ fold  a add  s add sub-project  e edit  d delete  / search",
                Style::default().fg(MUTED),
            )),
            chunks[2],
        );

        if let Some(editor) = &self.editor {
            render_editor(f, area, db, editor);
        }
    }
}

fn render_editor(f: &mut Frame, area: Rect, db: &Database, editor: &ProjectEditor) {
    let area = centered_rect(60, 60, area);
    f.render_widget(Clear, area);
    let title = if editor.editing.is_some() { "Edit project" } else { "New project" };
    let outer = Block::default()
        .title(title)
        .title_bottom("Tab next  ←/→ change  Enter save  Esc cancel")
        .borders(Borders::ALL);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); FIELD_COUNT])
        .split(inner);
    let block = |label: &'static str, field: usize| {
        let style = if editor.focus == field { Style::default().fg(GOLD) } else { Style::default() };
        Block::default().title(label).borders(Borders::ALL).border_style(style)
    };
    f.render_widget(Paragraph::new(editor.name.display()).block(block("Name", NAME)), parts[0]);
    f.render_widget(
        Paragraph::new(editor.description.display()).block(block("Description", DESCRIPTION)),
        parts[1],
    );
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("■■■ ", Style::default().fg(project_color(&editor.color))),
            Span::raw(editor.color.clone()),
        ]))
        .block(block("Colour", COLOR)),
        parts[2],
    );
    let parent = match editor.parent_id.and_then(|id| db.project(id)) {
        Some(p) => p.name.clone(),
        None => "(top level)".to_string(),
    };
    f.render_widget(Paragraph::new(parent).block(block("Parent", PARENT)), parts[3]);
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

    #[test]
    fn test_fold_hides_children() {
        let store = store();
        let mut page = ProjectsPage::new();
        let tree = ProjectTree::new(&store.db.projects);
        let all = page.rows(&tree).len();
        assert_eq!(all, 11);
        page.collapsed.insert(1);
        assert_eq!(page.rows(&tree).len(), all - 5);
    }

    #[test]
    fn test_search_keeps_ancestors() {
        let mut store = store();
        let mut page = ProjectsPage::new();
        page.handle_key(key(KeyCode::Char('/')), &mut store);
        for c in "seo".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        let tree = ProjectTree::new(&store.db.projects);
        let ids: Vec<u64> = page.rows(&tree).iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 4, 8]);
    }

    #[test]
    fn test_add_sub_project_under_selection() {
        let mut store = store();
        let mut page = ProjectsPage::new();
        page.handle_key(key(KeyCode::Char('s')), &mut store);
        for c in "Landing".chars() {
            page.handle_key(key(KeyCode::Char(c)), &mut store);
        }
        let action = page.handle_key(key(KeyCode::Enter), &mut store);
        assert!(matches!(action, Action::Notice(..)), "{action:?}");
        let created = store.db.projects.iter().find(|p| p.name == "Landing").unwrap();
        assert_eq!(created.parent_id, Some(1));
    }

    #[test]
    fn test_delete_is_refused_before_asking() {
        let mut store = store();
        let mut page = ProjectsPage::new();
        assert!(matches!(
            page.handle_key(key(KeyCode::Char('d')), &mut store),
            Action::Fail(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_parent_options_exclude_own_subtree() {
        let db = demo_database(Local::now().date_naive());
        let tree = ProjectTree::new(&db.projects);
        let editor = ProjectEditor::edit(&db, 4).unwrap();
        let options = editor.parent_options(&tree);
        assert_eq!(options[0], None);
        assert!(!options.contains(&Some(4)));
        assert!(!options.contains(&Some(7)));
        assert!(options.contains(&Some(1)));
    }
}
