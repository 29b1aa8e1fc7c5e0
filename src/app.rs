use crate::kanban_board::Column;
use crate::storage::KeyValueStore;
use crate::store::BoardStore;
use crate::task::Task;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Adding,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Column,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Title => Field::Description,
            Field::Description => Field::Column,
            Field::Column => Field::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Title => Field::Column,
            Field::Description => Field::Title,
            Field::Column => Field::Description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub column: usize,
    pub field: Field,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            column: 0,
            field: Field::Title,
        }
    }
}

/// An add request waiting out the submit delay.
#[derive(Debug, Clone)]
pub struct PendingTask {
    pub column_id: String,
    pub title: String,
    pub description: String,
    pub ready_at: Instant,
}

/// What is being carried between pick-up and drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub task_id: String,
    pub from_column: String,
}

pub struct App<S: KeyValueStore> {
    store: BoardStore<S>,
    submit_delay: Duration,
    pub mode: Mode,
    pub selected_column: usize,
    pub selected_task: usize,
    pub form: TaskForm,
    pub pending: Option<PendingTask>,
    pub drag: Option<DragPayload>,
    pub drop_target: usize,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: BoardStore<S>, submit_delay: Duration) -> Self {
        Self {
            store,
            submit_delay,
            mode: Mode::Normal,
            selected_column: 0,
            selected_task: 0,
            form: TaskForm::default(),
            pending: None,
            drag: None,
            drop_target: 0,
            status: None,
            should_quit: false,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.store.board().columns
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.columns()
            .get(self.selected_column)
            .and_then(|c| c.tasks.get(self.selected_task))
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode {
            Mode::Normal => self.handle_normal(key.code),
            Mode::Adding => self.handle_adding(key.code, now),
            Mode::Dragging => self.handle_dragging(key.code),
        }
    }

    /// Completes a pending add once its delay has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.pending.as_ref().is_some_and(|p| now >= p.ready_at) {
            if let Some(pending) = self.pending.take() {
                self.complete_submission(pending);
            }
        }
    }

    fn handle_normal(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('a') => self.open_form(),
            KeyCode::Left | KeyCode::Char('h') => {
                self.focus_column(self.selected_column.saturating_sub(1))
            }
            KeyCode::Right | KeyCode::Char('l') => self.focus_column(self.selected_column + 1),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_task += 1;
                self.clamp_selection();
            }
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Char(' ') => self.start_drag(),
            // shortcut: push the task one column to the right
            KeyCode::Enter => {
                if let Some(payload) = self.payload_for_selected() {
                    let to = self.selected_column + 1;
                    self.drop_on(payload, to);
                }
            }
            _ => {}
        }
    }

    fn handle_adding(&mut self, code: KeyCode, now: Instant) {
        let column_count = self.columns().len();
        match code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Tab => self.form.field = self.form.field.next(),
            KeyCode::BackTab => self.form.field = self.form.field.prev(),
            KeyCode::Enter => self.submit(now),
            KeyCode::Left if self.form.field == Field::Column => {
                self.form.column = self.form.column.saturating_sub(1);
            }
            KeyCode::Right if self.form.field == Field::Column => {
                if self.form.column + 1 < column_count {
                    self.form.column += 1;
                }
            }
            KeyCode::Backspace => {
                if let Some(text) = self.form_text() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = self.form_text() {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_dragging(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.drop_target = self.drop_target.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.drop_target + 1 < self.columns().len() {
                    self.drop_target += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(payload) = self.drag.take() {
                    let to = self.drop_target;
                    self.drop_on(payload, to);
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => self.end_drag(),
            _ => {}
        }
    }

    fn form_text(&mut self) -> Option<&mut String> {
        match self.form.field {
            Field::Title => Some(&mut self.form.title),
            Field::Description => Some(&mut self.form.description),
            Field::Column => None,
        }
    }

    fn open_form(&mut self) {
        if !self.is_submitting() {
            self.form.column = self.selected_column;
        }
        self.form.field = Field::Title;
        self.mode = Mode::Adding;
    }

    fn submit(&mut self, now: Instant) {
        if self.form.title.trim().is_empty() || self.is_submitting() {
            return;
        }
        let Some(column_id) = self.columns().get(self.form.column).map(|c| c.id.clone()) else {
            return;
        };

        self.pending = Some(PendingTask {
            column_id,
            title: self.form.title.clone(),
            description: self.form.description.clone(),
            ready_at: now + self.submit_delay,
        });
        self.tick(now);
    }

    fn complete_submission(&mut self, pending: PendingTask) {
        match self
            .store
            .add_task(&pending.column_id, &pending.title, &pending.description)
        {
            Ok(_) => self.status = None,
            Err(err) => self.report(err),
        }

        self.form.title.clear();
        self.form.description.clear();
        if self.mode == Mode::Adding {
            self.mode = Mode::Normal;
        }
        self.clamp_selection();
    }

    fn delete_selected(&mut self) {
        let Some(payload) = self.payload_for_selected() else {
            return;
        };
        if let Err(err) = self.store.delete_task(&payload.from_column, &payload.task_id) {
            self.report(err);
        }
        self.clamp_selection();
    }

    fn start_drag(&mut self) {
        if let Some(payload) = self.payload_for_selected() {
            self.drag = Some(payload);
            self.drop_target = self.selected_column;
            self.mode = Mode::Dragging;
        }
    }

    fn end_drag(&mut self) {
        self.drag = None;
        self.mode = Mode::Normal;
    }

    fn drop_on(&mut self, payload: DragPayload, to: usize) {
        let Some(to_column) = self.columns().get(to).map(|c| c.id.clone()) else {
            return;
        };

        match self
            .store
            .move_task(&payload.from_column, &to_column, &payload.task_id)
        {
            Ok(true) => {
                self.selected_column = to;
                self.selected_task = self.columns()[to].tasks.len().saturating_sub(1);
            }
            Ok(false) => {}
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn payload_for_selected(&self) -> Option<DragPayload> {
        let task_id = self.selected_task()?.id.clone();
        Some(DragPayload {
            task_id,
            from_column: self.columns()[self.selected_column].id.clone(),
        })
    }

    fn focus_column(&mut self, index: usize) {
        if index < self.columns().len() {
            self.selected_column = index;
            self.clamp_selection();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self
            .columns()
            .get(self.selected_column)
            .map_or(0, |c| c.tasks.len());
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    fn report(&mut self, err: crate::error::Error) {
        log::error!("Failed to save board: {}", err);
        self.status = Some(format!("Failed to save board: {}", err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kanban_board::{Board, DONE, IN_PROGRESS, TODO};
    use crate::storage::MemoryStorage;
    use crate::store::DEFAULT_KEY;

    fn app(delay_ms: u64) -> App<MemoryStorage> {
        let store = BoardStore::load(MemoryStorage::new(), DEFAULT_KEY);
        App::new(store, Duration::from_millis(delay_ms))
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode, now: Instant) {
        app.handle_key(KeyEvent::from(code), now);
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str, now: Instant) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), now);
        }
    }

    fn add(app: &mut App<MemoryStorage>, title: &str, description: &str) {
        let now = Instant::now();
        press(app, KeyCode::Char('a'), now);
        type_text(app, title, now);
        press(app, KeyCode::Tab, now);
        type_text(app, description, now);
        press(app, KeyCode::Enter, now);
    }

    fn titles(app: &App<MemoryStorage>, column_id: &str) -> Vec<String> {
        app.store
            .board()
            .column(column_id)
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    #[test]
    fn test_add_task_through_form() {
        let mut app = app(0);

        add(&mut app, "Design API", "Sketch endpoints");

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(titles(&app, TODO), vec!["Design API"]);
        let task = app.selected_task().unwrap();
        assert_eq!(task.description, "Sketch endpoints");
        assert!(app.form.title.is_empty());
        assert!(app.form.description.is_empty());
    }

    #[test]
    fn test_form_targets_chosen_column() {
        let mut app = app(0);
        let now = Instant::now();

        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Char('a'), now);
        assert_eq!(app.form.column, 1);
        type_text(&mut app, "Ship it", now);
        press(&mut app, KeyCode::BackTab, now);
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(titles(&app, DONE), vec!["Ship it"]);
        assert!(titles(&app, IN_PROGRESS).is_empty());
    }

    #[test]
    fn test_blank_title_is_ignored() {
        let mut app = app(0);

        add(&mut app, "   ", "no title");

        assert_eq!(app.mode, Mode::Adding);
        assert_eq!(app.store.board(), &Board::default());
    }

    #[test]
    fn test_pending_submission_completes_on_tick() {
        let mut app = app(500);
        let start = Instant::now();

        press(&mut app, KeyCode::Char('a'), start);
        type_text(&mut app, "Slow", start);
        press(&mut app, KeyCode::Enter, start);
        assert!(app.is_submitting());

        // a second submit while the first is in flight does nothing
        press(&mut app, KeyCode::Enter, start);
        app.tick(start + Duration::from_millis(100));
        assert!(titles(&app, TODO).is_empty());
        assert_eq!(app.mode, Mode::Adding);

        app.tick(start + Duration::from_millis(500));
        assert!(!app.is_submitting());
        assert_eq!(titles(&app, TODO), vec!["Slow"]);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_closing_form_keeps_pending_submission() {
        let mut app = app(500);
        let start = Instant::now();

        press(&mut app, KeyCode::Char('a'), start);
        type_text(&mut app, "Still lands", start);
        press(&mut app, KeyCode::Enter, start);
        press(&mut app, KeyCode::Esc, start);
        assert_eq!(app.mode, Mode::Normal);

        press(&mut app, KeyCode::Right, start);
        assert_eq!(app.selected_column, 1);

        app.tick(start + Duration::from_secs(1));
        assert_eq!(titles(&app, TODO), vec!["Still lands"]);
    }

    #[test]
    fn test_drag_and_drop() {
        let mut app = app(0);
        add(&mut app, "First", "");
        add(&mut app, "Second", "");
        let now = Instant::now();

        press(&mut app, KeyCode::Up, now);
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(app.mode, Mode::Dragging);
        assert_eq!(app.drag.as_ref().unwrap().from_column, TODO);

        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Right, now);
        assert_eq!(app.drop_target, 2);
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(app.mode, Mode::Normal);
        assert!(app.drag.is_none());
        assert_eq!(titles(&app, TODO), vec!["Second"]);
        assert_eq!(titles(&app, DONE), vec!["First"]);
        assert_eq!(app.selected_column, 2);
        assert_eq!(app.store.board().task_count(), 2);
    }

    #[test]
    fn test_drop_on_source_column_and_cancel() {
        let mut app = app(0);
        add(&mut app, "Stay", "");
        let now = Instant::now();

        press(&mut app, KeyCode::Char(' '), now);
        press(&mut app, KeyCode::Char(' '), now);
        assert_eq!(titles(&app, TODO), vec!["Stay"]);

        press(&mut app, KeyCode::Char(' '), now);
        press(&mut app, KeyCode::Right, now);
        press(&mut app, KeyCode::Esc, now);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(titles(&app, TODO), vec!["Stay"]);
    }

    #[test]
    fn test_enter_moves_to_next_column() {
        let mut app = app(0);
        add(&mut app, "Step", "");
        let now = Instant::now();

        press(&mut app, KeyCode::Enter, now);
        assert_eq!(titles(&app, IN_PROGRESS), vec!["Step"]);
        press(&mut app, KeyCode::Enter, now);
        press(&mut app, KeyCode::Enter, now);
        assert_eq!(titles(&app, DONE), vec!["Step"]);
    }

    #[test]
    fn test_delete_selected() {
        let mut app = app(0);
        add(&mut app, "One", "");
        add(&mut app, "Two", "");
        let now = Instant::now();

        press(&mut app, KeyCode::Down, now);
        press(&mut app, KeyCode::Char('d'), now);
        assert_eq!(titles(&app, TODO), vec!["One"]);
        assert_eq!(app.selected_task, 0);

        press(&mut app, KeyCode::Delete, now);
        press(&mut app, KeyCode::Delete, now);
        assert_eq!(app.store.board(), &Board::default());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app(0);
        let now = Instant::now();

        press(&mut app, KeyCode::Char('a'), now);
        press(&mut app, KeyCode::Char('q'), now);
        assert!(!app.should_quit);
        assert_eq!(app.form.title, "q");

        press(&mut app, KeyCode::Esc, now);
        press(&mut app, KeyCode::Char('q'), now);
        assert!(app.should_quit);
    }
}
