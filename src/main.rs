use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use jed::session::{EditorSession, GutterLine};
use jed::syntax::{self, Token, TokenKind};
use jed::ui::Viewport;
use jed::validate::{ItemCount, ValidationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
}

struct App {
    should_quit: bool,
    session: EditorSession,
    viewport: Viewport,
    input_mode: InputMode,
    query_draft: String,
    message: Option<String>,
}

impl App {
    fn new() -> Self {
        Self {
            should_quit: false,
            session: EditorSession::new(),
            viewport: Viewport::new(0, 40),
            input_mode: InputMode::Normal,
            query_draft: String::new(),
            message: None,
        }
    }

    fn load_file(&mut self, path: &str) -> Result<()> {
        self.session.load_file(path)?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            match self.input_mode {
                InputMode::Normal => self.handle_normal_key(key),
                InputMode::Search => self.handle_search_key(key),
            }
        }
        Ok(())
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        self.message = None;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('j') | KeyCode::Down => self.viewport.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.viewport.scroll_up(),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.viewport.scroll_down_page()
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.viewport.scroll_up_page()
            }
            KeyCode::Char('f') => {
                if !self.session.format() {
                    self.message = Some("cannot format invalid JSON".into());
                }
            }
            KeyCode::Char('c') => {
                if !self.session.compress() {
                    self.message = Some("cannot compress invalid JSON".into());
                }
            }
            KeyCode::Char('x') => {
                self.session.try_fix();
                if self.session.validation().is_valid() {
                    self.message = Some("repaired".into());
                } else {
                    self.message = Some("repair applied, still invalid".into());
                }
            }
            KeyCode::Char('u') => {
                if !self.session.undo() {
                    self.message = Some("nothing to undo".into());
                }
            }
            KeyCode::Char('r') => {
                if !self.session.redo() {
                    self.message = Some("nothing to redo".into());
                }
            }
            KeyCode::Char('z') => self.toggle_fold_at_top(),
            KeyCode::Char('e') => self.session.expand_all(),
            KeyCode::Char('w') => self.session.collapse_all(),
            KeyCode::Char('g') => self.go_to_error(),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.query_draft.clear();
            }
            KeyCode::Char('n') => self.jump_to_match(1),
            KeyCode::Char('N') => self.jump_to_match(-1),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.query_draft.clear();
                self.session.set_query("", Instant::now());
            }
            KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.query_draft.pop();
                let draft = self.query_draft.clone();
                self.session.set_query(&draft, Instant::now());
            }
            KeyCode::Char(ch) => {
                self.query_draft.push(ch);
                let draft = self.query_draft.clone();
                self.session.set_query(&draft, Instant::now());
            }
            _ => {}
        }
    }

    /// Fold the first foldable line at or below the top of the window.
    fn toggle_fold_at_top(&mut self) {
        let target = self
            .session
            .gutter()
            .iter()
            .skip(self.viewport.start_line)
            .find(|l| l.foldable && !l.hidden)
            .map(|l| l.number - 1);
        if let Some(line) = target {
            self.session.toggle_fold(line);
        }
    }

    fn go_to_error(&mut self) {
        let target = self.session.error().map(|e| (e.line_index(), e.offset));
        if let Some((line, offset)) = target {
            self.session.set_cursor(offset);
            self.viewport.center_on(line);
        } else {
            self.message = Some("no error".into());
        }
    }

    fn jump_to_match(&mut self, delta: isize) {
        let hit = if delta >= 0 {
            self.session.next_match()
        } else {
            self.session.prev_match()
        };
        match hit {
            Some(m) => {
                self.session.set_cursor(m.start);
                let line = self.session.buffer().byte_offset_to_line(m.start);
                self.viewport.center_on(line);
            }
            None => self.message = Some("no matches".into()),
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.show_cursor()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn token_style(token: &Token) -> Style {
    const BRACKET_CYCLE: [Color; 4] = [Color::Blue, Color::Yellow, Color::Magenta, Color::Cyan];

    let color = match token.kind {
        TokenKind::Key => Color::Red,
        TokenKind::Str => Color::Green,
        TokenKind::Number => Color::Yellow,
        TokenKind::Bool => Color::Cyan,
        TokenKind::Null => Color::Gray,
        TokenKind::Colon => Color::Magenta,
        TokenKind::Comma => Color::White,
        TokenKind::Plain => Color::White,
        _ => BRACKET_CYCLE[token.depth as usize % 4],
    };
    Style::default().fg(color)
}

/// Tokenize the whole display text once and fan the styled pieces out into
/// per-line spans; string tokens may cross line boundaries.
fn highlight_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();

    for token in syntax::tokens(text) {
        let style = token_style(&token);
        let lexeme = &text[token.start..token.end];
        let mut parts = lexeme.split('\n');

        if let Some(first) = parts.next() {
            if !first.is_empty() {
                current.push(Span::styled(first.to_string(), style));
            }
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(&mut current)));
            if !part.is_empty() {
                current.push(Span::styled(part.to_string(), style));
            }
        }
    }
    lines.push(Line::from(current));

    lines
}

fn gutter_cell(entry: &GutterLine) -> Span<'static> {
    let marker = if entry.errored {
        "!"
    } else if entry.folded {
        "+"
    } else if entry.foldable {
        "-"
    } else {
        " "
    };
    let style = if entry.errored {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("{:>4} {} ", entry.number, marker), style)
}

fn render_ui(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(size);

        let main_block = Block::default().borders(Borders::ALL).title("jed");
        let inner_area = main_block.inner(chunks[0]);
        frame.render_widget(main_block, chunks[0]);

        app.viewport.height = inner_area.height as usize;
        let display = app.session.display_text();
        let highlighted = highlight_lines(&display);
        let gutter = app.session.gutter();
        let visible_entries: Vec<&GutterLine> = gutter.iter().filter(|l| !l.hidden).collect();
        app.viewport.clamp(visible_entries.len());

        let rows: Vec<Line> = visible_entries
            .into_iter()
            .zip(highlighted)
            .skip(app.viewport.start_line)
            .take(app.viewport.height)
            .map(|(entry, line)| {
                let mut spans = vec![gutter_cell(entry)];
                spans.extend(line.spans);
                Line::from(spans)
            })
            .collect();

        frame.render_widget(Paragraph::new(rows), inner_area);

        // Status bar
        let status_text = if app.input_mode == InputMode::Search {
            let count = app.session.search().matches().len();
            format!(" /{} ({} matches) | Enter: keep | Esc: cancel", app.query_draft, count)
        } else {
            let file_name = app
                .session
                .buffer()
                .path()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("<scratch>");
            let file_size = format_size(app.session.buffer().len_bytes());

            let validity = match app.session.validation() {
                ValidationStatus::Empty => "Empty".to_string(),
                ValidationStatus::Valid { bytes, items, .. } => match items {
                    ItemCount::Items(n) => {
                        format!("Valid JSON | {} | {} items", format_size(*bytes), n)
                    }
                    ItemCount::Primitive => {
                        format!("Valid JSON | {} | primitive value", format_size(*bytes))
                    }
                },
                ValidationStatus::Invalid(err) => {
                    format!("Invalid JSON | line {}, col {}", err.line, err.column)
                }
            };

            let (line, col) = app.session.cursor().display_position();
            let note = app
                .message
                .as_deref()
                .map(|m| format!(" | {}", m))
                .unwrap_or_default();

            format!(
                " {} ({}) | {} | {}:{}{} | f:fmt c:min x:fix u:undo r:redo z:fold /:search",
                file_name, file_size, validity, line, col, note
            )
        };

        let status =
            Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(status, chunks[1]);
    })?;

    Ok(())
}

fn run(mut app: App, mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    loop {
        app.session.tick(Instant::now());
        render_ui(&mut terminal, &mut app)?;

        if app.should_quit {
            break;
        }

        // Poll for events with timeout to maintain ~60fps
        if event::poll(Duration::from_millis(16))? {
            let event = event::read()?;
            app.handle_event(event)?;
        }
    }

    restore_terminal(terminal)
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    // The terminal belongs to the TUI; logs go to a file instead.
    let appender = tracing_appender::rolling::never(std::env::temp_dir(), "jed.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

fn main() -> Result<()> {
    // Set up panic hook to restore terminal
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
        default_panic(info);
    }));

    let _guard = init_tracing();

    let mut app = App::new();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        app.load_file(&args[1])?;
    }

    let terminal = setup_terminal()?;
    run(app, terminal)
}
