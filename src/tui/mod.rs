use std::error::Error;
use std::io;

use crate::app::TodoApp;
use crate::task::{DEFAULT_TIME, Task, format_due_time, parse_due_time};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::error;

#[derive(Debug, PartialEq)]
enum AppMode {
    Selection,
    Add,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Text,
    Time,
    Image,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Text => Field::Time,
            Field::Time => Field::Image,
            Field::Image => Field::Text,
        }
    }

    fn previous(self) -> Self {
        match self {
            Field::Text => Field::Image,
            Field::Time => Field::Text,
            Field::Image => Field::Time,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Text => "Task ",
            Field::Time => "Time ",
            Field::Image => "Image",
        }
    }
}

/// Transient input of the add form.
#[derive(Debug)]
struct AddForm {
    text: String,
    time: String,
    image: String,
    focus: Field,
    cursor: usize, // Character position, not byte position
}

impl AddForm {
    fn new() -> Self {
        AddForm {
            text: String::new(),
            time: DEFAULT_TIME.to_string(),
            image: String::new(),
            focus: Field::Text,
            cursor: 0,
        }
    }

    fn field(&self, field: Field) -> &str {
        match field {
            Field::Text => &self.text,
            Field::Time => &self.time,
            Field::Image => &self.image,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Text => &mut self.text,
            Field::Time => &mut self.time,
            Field::Image => &mut self.image,
        }
    }

    fn focus_on(&mut self, field: Field) {
        self.focus = field;
        self.cursor = self.field(field).chars().count();
    }

    /// Moves the due time by `minutes`, wrapping around midnight. Unparseable
    /// input is left alone.
    fn shift_time(&mut self, minutes: i64) {
        if let Ok(time) = parse_due_time(&self.time) {
            let (shifted, _) = time.overflowing_add_signed(chrono::Duration::minutes(minutes));
            self.time = format_due_time(shifted);
            self.cursor = self.time.chars().count();
        }
    }
}

struct App {
    todo_app: TodoApp,
    selected_index: usize,
    mode: AppMode,
    form: AddForm,
    status: Option<String>,
    should_quit: bool,
}

const CURSOR: char = '|';
const ARMED: char = '*';
const TIME_STEP_MINUTES: i64 = 5;

impl App {
    fn new(todo_app: TodoApp) -> Self {
        App {
            selected_index: 0,
            mode: AppMode::Selection,
            form: AddForm::new(),
            status: None,
            should_quit: false,
            todo_app,
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        self.todo_app.tasks().get(self.selected_index)
    }

    fn handle_key_event(&mut self, key: KeyCode) -> Result<(), Box<dyn Error>> {
        match self.mode {
            AppMode::Selection => self.handle_selection_mode_key(key)?,
            AppMode::Add => self.handle_add_mode_key(key)?,
            AppMode::Delete => self.handle_delete_mode_key(key)?,
        }
        Ok(())
    }

    fn handle_selection_mode_key(&mut self, key: KeyCode) -> Result<(), Box<dyn Error>> {
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_index + 1 < self.todo_app.tasks().len() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Char('a') | KeyCode::Char('i') => {
                self.form = AddForm::new();
                self.status = None;
                self.mode = AppMode::Add;
            }
            KeyCode::Char('d') => {
                if self.selected_task().is_some() {
                    self.mode = AppMode::Delete;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_add_mode_key(&mut self, key: KeyCode) -> Result<(), Box<dyn Error>> {
        match key {
            KeyCode::Esc => {
                self.form = AddForm::new();
                self.mode = AppMode::Selection;
            }
            KeyCode::Enter => {
                let added =
                    self.todo_app
                        .add_task(&self.form.text, &self.form.time, &self.form.image)?;
                match added {
                    Some(id) => {
                        if let Some(task) = self.todo_app.tasks().iter().find(|t| t.id == id) {
                            self.status = Some(if self.todo_app.has_reminder(id) {
                                format!("Added \"{}\", reminder at {}", task.text, task.time)
                            } else {
                                format!("Added \"{}\" without reminder (invalid time)", task.text)
                            });
                        }
                        self.selected_index = self.todo_app.tasks().len().saturating_sub(1);
                        self.form = AddForm::new();
                        self.mode = AppMode::Selection;
                    }
                    None => {
                        self.status = Some("Task text is empty".to_string());
                        self.form.focus_on(Field::Text);
                    }
                }
            }
            KeyCode::Tab => {
                let next = self.form.focus.next();
                self.form.focus_on(next);
            }
            KeyCode::BackTab => {
                let previous = self.form.focus.previous();
                self.form.focus_on(previous);
            }
            KeyCode::Up if self.form.focus == Field::Time => {
                self.form.shift_time(TIME_STEP_MINUTES);
            }
            KeyCode::Down if self.form.focus == Field::Time => {
                self.form.shift_time(-TIME_STEP_MINUTES);
            }
            KeyCode::Left => {
                if self.form.cursor > 0 {
                    self.form.cursor -= 1;
                }
            }
            KeyCode::Right => {
                if self.form.cursor < self.form.field(self.form.focus).chars().count() {
                    self.form.cursor += 1;
                }
            }
            KeyCode::Backspace => {
                if self.form.cursor > 0 {
                    self.form.cursor -= 1;
                    let cursor = self.form.cursor;
                    Self::remove_char_at(self.form.focused_mut(), cursor);
                }
            }
            KeyCode::Delete => {
                let cursor = self.form.cursor;
                Self::remove_char_at(self.form.focused_mut(), cursor);
            }
            KeyCode::Home => {
                self.form.cursor = 0;
            }
            KeyCode::End => {
                self.form.cursor = self.form.field(self.form.focus).chars().count();
            }
            KeyCode::Char(c) => {
                let cursor = self.form.cursor;
                let text = self.form.focused_mut();
                // Convert character position to byte position for insertion
                let byte_pos = text
                    .char_indices()
                    .nth(cursor)
                    .map(|(pos, _)| pos)
                    .unwrap_or(text.len());

                text.insert(byte_pos, c);
                self.form.cursor += 1;
            }
            _ => {}
        }
        Ok(())
    }

    fn remove_char_at(text: &mut String, char_index: usize) -> bool {
        let char_indices: Vec<_> = text.char_indices().collect();
        if let Some(&(byte_pos, _)) = char_indices.get(char_index) {
            let next_byte_pos = char_indices
                .get(char_index + 1)
                .map(|(pos, _)| *pos)
                .unwrap_or(text.len());

            text.drain(byte_pos..next_byte_pos).count() > 0
        } else {
            false
        }
    }

    fn handle_delete_mode_key(&mut self, key: KeyCode) -> Result<(), Box<dyn Error>> {
        match key {
            KeyCode::Char('y') => {
                self.mode = AppMode::Selection;
                let deleted = match self.selected_task().map(|t| t.id) {
                    Some(id) => self.todo_app.delete_task_by_id(id).map(|_| ()),
                    None => Ok(()),
                };
                // The task leaves memory even when the save fails
                if self.selected_index >= self.todo_app.tasks().len() {
                    self.selected_index = self.selected_index.saturating_sub(1);
                }
                deleted?;
            }
            KeyCode::Esc => {
                self.mode = AppMode::Selection;
            }
            _ => {}
        }
        Ok(())
    }

    /// Fires due reminders and echoes them in the status bar.
    fn check_reminders(&mut self) {
        let fired = self.todo_app.tick();
        let texts: Vec<&str> = fired
            .iter()
            .filter_map(|id| self.todo_app.tasks().iter().find(|t| t.id == *id))
            .map(|t| t.text.as_str())
            .collect();
        if !texts.is_empty() {
            self.status = Some(format!("Time for: {}", texts.join(", ")));
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}

// Helper function to wrap a task row based on available width
fn wrap_task_text(task: &Task, armed: bool, available_width: usize) -> Vec<(String, bool)> {
    let marker = if armed { ARMED } else { ' ' };
    let prefix = format!("{} {} ", task.time, marker);
    let prefix_len = prefix.chars().count();

    let text = match task.image() {
        Some(image) => format!("{} [{}]", task.text, image),
        None => task.text.clone(),
    };

    if available_width <= prefix_len {
        return vec![(format!("{}{}", prefix, text), true)];
    }

    let text_width = available_width - prefix_len;
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        return vec![(prefix, true)];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in words {
        let word_len = word.chars().count();
        let current_len = current_line.chars().count();
        if word_len > text_width {
            // Break very long words into width-sized chunks
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(text_width).peekable();
            while let Some(chunk) = chunks.next() {
                let chunk: String = chunk.iter().collect();
                if chunks.peek().is_some() {
                    lines.push(chunk);
                } else {
                    current_line = chunk;
                }
            }
        } else if current_len + word_len + usize::from(current_len > 0) > text_width {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
        } else {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    let continuation_prefix = " ".repeat(prefix_len);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                (format!("{}{}", prefix, line), true)
            } else {
                (format!("{}{}", continuation_prefix, line), false)
            }
        })
        .collect()
}

fn form_line(form: &AddForm, field: Field) -> Line<'static> {
    let mut value = form.field(field).to_string();
    if form.focus == field {
        let byte_pos = value
            .char_indices()
            .nth(form.cursor)
            .map(|(pos, _)| pos)
            .unwrap_or(value.len());
        value.insert(byte_pos, CURSOR);
    }
    let style = if form.focus == field {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Line::styled(format!("{}: {}", field.label(), value), style)
}

fn ui(f: &mut Frame, app: &App) {
    let form_height = if app.mode == AppMode::Add { 5 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(0),
                Constraint::Length(form_height),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let list_area = chunks[0];
    let form_area = chunks[1];
    let status_area = chunks[2];

    let title = match app.todo_app.next_reminder_at() {
        Some(at) => format!("Tasks | next reminder {}", at.format("%a %I:%M %p")),
        None => "Tasks".to_string(),
    };

    // 2 for borders, 2 for padding
    let available_width = list_area.width.saturating_sub(4) as usize;

    let mut display_items = Vec::new();
    let mut selected_display_index = None;

    if app.todo_app.tasks().is_empty() {
        display_items.push(ListItem::new("No tasks"));
    } else {
        for (index, task) in app.todo_app.tasks().iter().enumerate() {
            let is_selected = index == app.selected_index;
            let is_delete_mode = app.mode == AppMode::Delete && is_selected;
            let armed = app.todo_app.has_reminder(task.id);

            if is_selected {
                selected_display_index = Some(display_items.len());
            }

            for (line_text, is_main_line) in wrap_task_text(task, armed, available_width) {
                let style = if is_delete_mode && is_main_line {
                    Style::default().bg(Color::Red).fg(Color::White)
                } else if is_selected && is_main_line {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else if !armed {
                    Style::default().fg(Color::Gray)
                } else {
                    Style::default()
                };
                display_items.push(ListItem::new(line_text).style(style));
            }
        }
    }

    let task_list = List::new(display_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut list_state = ListState::default();
    list_state.select(selected_display_index);

    f.render_stateful_widget(task_list, list_area, &mut list_state);

    if app.mode == AppMode::Add {
        let lines = vec![
            form_line(&app.form, Field::Text),
            form_line(&app.form, Field::Time),
            form_line(&app.form, Field::Image),
        ];
        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("New task"));
        f.render_widget(form, form_area);
    }

    let help = match app.mode {
        AppMode::Selection => {
            if app.todo_app.tasks().is_empty() {
                "Sel | a:Add | q:Quit"
            } else {
                "Sel | ↑k:Up | ↓j:Down | a:Add | d:Delete | q:Quit"
            }
        }
        AppMode::Add => "Add | Enter:Confirm | Esc:Cancel | Tab:Next field | ↑↓:Adjust time",
        AppMode::Delete => "Delete | y:Confirm Delete | Esc:Cancel",
    };
    let status_text = match &app.status {
        Some(status) => format!("{} | {}", status, help),
        None => help.to_string(),
    };

    let status_paragraph = Paragraph::new(status_text)
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(status_paragraph, status_area);
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        app.check_reminders();
        terminal.draw(|f| ui(f, app))?;

        // Sleep until input arrives or the next reminder is due
        if event::poll(app.todo_app.wait_timeout())? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(err) = app.handle_key_event(key.code) {
                        error!(error = %err, "key handling failed");
                        app.status = Some(format!("Error: {}", err));
                    }
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

pub fn run_tui(todo_app: TodoApp) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(todo_app);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    app.todo_app.shutdown()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::fs;

    use crossterm::event::KeyCode;

    use crate::app::{AppConfig, TodoApp, tests::Harness};
    use crate::reminder::tests::at;
    use crate::task::Task;

    use super::{App, AppMode, CURSOR, Field, form_line, wrap_task_text};

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key_event(KeyCode::Char(c)).unwrap();
        }
    }

    #[test]
    fn test_wrap_task_text_short() {
        let task = Task::new("Buy milk".to_string(), "02:30 PM".to_string(), None);
        let wrapped = wrap_task_text(&task, true, 50);

        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].0, "02:30 PM * Buy milk");
        assert_eq!(wrapped[0].1, true);
    }

    #[test]
    fn test_wrap_task_text_long() {
        let task = Task::new(
            "This is a very long task that should wrap".to_string(),
            "09:00 AM".to_string(),
            None,
        );
        let wrapped = wrap_task_text(&task, false, 25);

        assert!(wrapped.len() > 1);
        assert!(wrapped[0].0.starts_with("09:00 AM   This"));
        assert!(wrapped[1].0.starts_with("           ")); // continuation aligns with text
        assert_eq!(wrapped[1].1, false);
    }

    #[test]
    fn test_wrap_task_text_breaks_long_unicode_words() {
        let task = Task::new("Übermäßigkeitsprüfung".to_string(), "09:00 AM".to_string(), None);
        let wrapped = wrap_task_text(&task, false, 16);

        assert!(wrapped.len() > 1);
        let rejoined: String = wrapped
            .iter()
            .map(|(line, _)| line.chars().skip(11).collect::<String>())
            .collect();
        assert_eq!(rejoined, "Übermäßigkeitsprüfung");
    }

    #[test]
    fn test_wrap_task_text_shows_image() {
        let task = Task::new(
            "Water plants".to_string(),
            "08:00 AM".to_string(),
            Some("plants.png".to_string()),
        );
        let wrapped = wrap_task_text(&task, true, 80);

        assert_eq!(wrapped[0].0, "08:00 AM * Water plants [plants.png]");
    }

    #[test]
    fn test_add_task_workflow() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('a')).unwrap();
        assert_eq!(app.mode, AppMode::Add);
        type_text(&mut app, "Buy milk");
        app.handle_key_event(KeyCode::Tab).unwrap();
        assert_eq!(app.form.focus, Field::Time);
        app.handle_key_event(KeyCode::Enter).unwrap();

        assert_eq!(app.mode, AppMode::Selection);
        assert_eq!(app.todo_app.tasks().len(), 1);
        assert_eq!(app.todo_app.tasks()[0].text, "Buy milk");
        assert_eq!(app.todo_app.tasks()[0].time, "12:00 AM");
        assert_eq!(app.form.text, ""); // inputs cleared
    }

    #[test]
    fn test_add_with_blank_text_stays_in_form() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "   ");
        app.handle_key_event(KeyCode::Enter).unwrap();

        assert_eq!(app.mode, AppMode::Add);
        assert!(app.todo_app.tasks().is_empty());
        assert_eq!(app.status.as_deref(), Some("Task text is empty"));
    }

    #[test]
    fn test_time_field_adjusts_in_steps() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('a')).unwrap();
        app.handle_key_event(KeyCode::Tab).unwrap();
        app.handle_key_event(KeyCode::Up).unwrap();
        assert_eq!(app.form.time, "12:05 AM");

        app.handle_key_event(KeyCode::Down).unwrap();
        app.handle_key_event(KeyCode::Down).unwrap();
        assert_eq!(app.form.time, "11:55 PM");
    }

    #[test]
    fn test_typed_time_and_image() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Call mom");
        app.handle_key_event(KeyCode::Tab).unwrap();
        for _ in 0..8 {
            app.handle_key_event(KeyCode::Backspace).unwrap();
        }
        type_text(&mut app, "09:45 AM");
        app.handle_key_event(KeyCode::Tab).unwrap();
        type_text(&mut app, "mom.jpg");
        app.handle_key_event(KeyCode::Enter).unwrap();

        let task = &app.todo_app.tasks()[0];
        assert_eq!(task.time, "09:45 AM");
        assert_eq!(task.image(), Some("mom.jpg"));
        assert!(app.todo_app.has_reminder(task.id));
    }

    #[test]
    fn test_unicode_editing_in_form() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Hällö Wörld");
        app.form.cursor = 5;

        app.handle_key_event(KeyCode::Backspace).unwrap();
        assert_eq!(app.form.text, "Häll Wörld");
        assert_eq!(app.form.cursor, 4);

        app.form.cursor = 7;
        app.handle_key_event(KeyCode::Delete).unwrap();
        assert_eq!(app.form.text, "Häll Wöld");

        app.handle_key_event(KeyCode::Home).unwrap();
        app.handle_key_event(KeyCode::Char('ü')).unwrap();
        assert_eq!(app.form.text, "üHäll Wöld");
        assert_eq!(app.form.cursor, 1);
    }

    #[test]
    fn test_form_line_shows_cursor_on_focused_field() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());
        app.handle_key_event(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Hallö");
        app.form.cursor = 4;

        let focused = form_line(&app.form, Field::Text).to_string();
        assert!(focused.contains(&format!("Hall{}ö", CURSOR)));
        let other = form_line(&app.form, Field::Time).to_string();
        assert!(!other.contains(CURSOR));
    }

    #[test]
    fn test_escape_discards_form() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('a')).unwrap();
        type_text(&mut app, "Never mind");
        app.handle_key_event(KeyCode::Esc).unwrap();

        assert_eq!(app.mode, AppMode::Selection);
        assert!(app.todo_app.tasks().is_empty());
        assert_eq!(app.form.text, "");
    }

    #[test]
    fn test_delete_mode_transitions() {
        let harness = Harness::new();
        let mut todo_app = harness.start();
        todo_app.add_task("Test item", "10:00 AM", "").unwrap();
        let mut app = App::new(todo_app);

        assert_eq!(app.mode, AppMode::Selection);
        app.handle_key_event(KeyCode::Char('d')).unwrap();
        assert_eq!(app.mode, AppMode::Delete);

        app.handle_key_event(KeyCode::Esc).unwrap();
        assert_eq!(app.mode, AppMode::Selection);
        assert_eq!(app.todo_app.tasks().len(), 1);
    }

    #[test]
    fn test_delete_with_no_tasks_does_nothing() {
        let harness = Harness::new();
        let mut app = App::new(harness.start());

        app.handle_key_event(KeyCode::Char('d')).unwrap();
        assert_eq!(app.mode, AppMode::Selection);
    }

    #[test]
    fn test_delete_selected_duplicate_only() {
        let harness = Harness::new();
        let mut todo_app = harness.start();
        todo_app.add_task("Call mom", "09:00 AM", "").unwrap();
        let second = todo_app.add_task("Call mom", "09:00 AM", "").unwrap().unwrap();
        let mut app = App::new(todo_app);

        app.handle_key_event(KeyCode::Char('j')).unwrap();
        app.handle_key_event(KeyCode::Char('d')).unwrap();
        app.handle_key_event(KeyCode::Char('y')).unwrap();

        assert_eq!(app.todo_app.tasks().len(), 1);
        assert_ne!(app.todo_app.tasks()[0].id, second);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_failed_delete_still_clamps_selection() {
        let harness = Harness::new();
        let subdir = harness.dir.path().join("data");
        fs::create_dir(&subdir).unwrap();
        let config = AppConfig {
            task_file: subdir.join("tasks.json"),
            rearm_on_startup: true,
        };
        let mut todo_app =
            TodoApp::startup(config, harness.notifier.clone(), harness.clock.clone()).unwrap();
        todo_app.add_task("One", "10:00 AM", "").unwrap();
        todo_app.add_task("Two", "11:00 AM", "").unwrap();
        let mut app = App::new(todo_app);
        fs::remove_dir_all(&subdir).unwrap();

        app.handle_key_event(KeyCode::Char('j')).unwrap();
        app.handle_key_event(KeyCode::Char('d')).unwrap();
        assert!(app.handle_key_event(KeyCode::Char('y')).is_err());

        assert_eq!(app.mode, AppMode::Selection);
        assert_eq!(app.todo_app.tasks().len(), 1);
        assert_eq!(app.selected_index, 0);
        assert!(app.selected_task().is_some());
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let harness = Harness::new();
        let mut todo_app = harness.start();
        todo_app.add_task("One", "10:00 AM", "").unwrap();
        todo_app.add_task("Two", "11:00 AM", "").unwrap();
        let mut app = App::new(todo_app);

        app.handle_key_event(KeyCode::Up).unwrap();
        assert_eq!(app.selected_index, 0);
        app.handle_key_event(KeyCode::Down).unwrap();
        app.handle_key_event(KeyCode::Down).unwrap();
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_check_reminders_reports_fired_task() {
        let harness = Harness::new();
        let mut todo_app = harness.start();
        todo_app.add_task("Buy milk", "09:30 AM", "").unwrap();
        let mut app = App::new(todo_app);

        app.check_reminders();
        assert_eq!(app.status, None);

        harness.clock.set(at(9, 30, 0));
        app.check_reminders();
        assert_eq!(app.status.as_deref(), Some("Time for: Buy milk"));
        assert_eq!(harness.notifier.sent.borrow().len(), 1);
    }
}
