pub mod debounce;

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;

use crate::buffer::{Buffer, Cursor};
use crate::fold::{FoldIndex, FoldState};
use crate::history::History;
use crate::repair;
use crate::search::{SearchMatch, SearchOptions, SearchState};
use crate::syntax;
use crate::validate::{validate, ParseError, ValidationStatus};
use self::debounce::Debouncer;

/// Quiet period before a typing burst is snapshotted into history.
pub const HISTORY_DEBOUNCE: Duration = Duration::from_millis(500);
/// Quiet period before a query edit re-runs the search.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// One gutter row. Hidden rows keep their entry (flagged, not removed) so a
/// rendering surface can keep stable per-line targets across folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterLine {
    /// 1-based label.
    pub number: usize,
    pub foldable: bool,
    pub folded: bool,
    pub hidden: bool,
    pub errored: bool,
}

/// One editor instance: the buffer plus every piece of derived and
/// interactive state, with no rendering surface attached. All operations
/// run synchronously on the caller's thread; the only delayed work is the
/// pair of trailing-edge debouncers driven through [`EditorSession::tick`].
pub struct EditorSession {
    buffer: Buffer,
    cursor: Cursor,
    history: History,
    fold_index: FoldIndex,
    folds: FoldState,
    search: SearchState,
    validation: ValidationStatus,
    history_debounce: Debouncer,
    search_debounce: Debouncer,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::with_text("")
    }

    pub fn with_text(text: &str) -> Self {
        let mut session = Self {
            buffer: Buffer::from_str(text),
            cursor: Cursor::new(),
            history: History::new(),
            fold_index: FoldIndex::new(),
            folds: FoldState::new(),
            search: SearchState::new(),
            validation: ValidationStatus::Empty,
            history_debounce: Debouncer::new(HISTORY_DEBOUNCE),
            search_debounce: Debouncer::new(SEARCH_DEBOUNCE),
        };
        session.refresh();
        session.history.push(&session.buffer.text());
        session
    }

    pub fn load_file(&mut self, path: &str) -> Result<()> {
        self.buffer.load_file(path)?;
        self.refresh();
        self.history.push(&self.buffer.text());
        debug!(path, bytes = self.buffer.len_bytes(), "loaded file");
        Ok(())
    }

    /// Re-derive every view of the buffer. Runs after each mutation so the
    /// highlight, fold, validation and search state never lag the text.
    fn refresh(&mut self) {
        let text = self.buffer.text();
        self.fold_index = FoldIndex::scan(&text);
        self.folds.retain_valid(&self.fold_index);
        self.validation = validate(&text);
        self.search.run(&text);
        self.cursor.clamp(&self.buffer);
    }

    /// Programmatic whole-buffer replacement; snapshots synchronously.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.refresh();
        self.history.push(text);
    }

    /// The free-typing path: the new buffer value takes effect and every
    /// view updates now, but the history snapshot waits for a quiet period.
    pub fn apply_input(&mut self, text: &str, now: Instant) {
        self.buffer.set_text(text);
        self.refresh();
        self.history_debounce.schedule(now);
    }

    /// Fire any due debouncers. Call periodically from the event loop.
    pub fn tick(&mut self, now: Instant) {
        if self.history_debounce.fire(now) {
            self.history.push(&self.buffer.text());
        }
        if self.search_debounce.fire(now) {
            let text = self.buffer.text();
            self.search.run(&text);
        }
    }

    // --- Document actions ---

    /// Pretty-print with a two-space indent. No-op unless the buffer
    /// currently validates; returns whether it applied.
    pub fn format(&mut self) -> bool {
        let pretty = match self.validation.value() {
            Some(value) => serde_json::to_string_pretty(value).ok(),
            None => None,
        };
        match pretty {
            Some(text) => {
                self.set_text(&text);
                true
            }
            None => false,
        }
    }

    /// Collapse to the compact single-line serialization. No-op unless the
    /// buffer currently validates.
    pub fn compress(&mut self) -> bool {
        let compact = match self.validation.value() {
            Some(value) => serde_json::to_string(value).ok(),
            None => None,
        };
        match compact {
            Some(text) => {
                self.set_text(&text);
                true
            }
            None => false,
        }
    }

    /// Run the heuristic repair pass over the buffer. Always rewrites; the
    /// result may still be invalid, so the caller reads `validation()`
    /// afterwards.
    pub fn try_fix(&mut self) {
        let fixed = repair::repair(&self.buffer.text());
        debug!(bytes = fixed.len(), "repair pass applied");
        self.set_text(&fixed);
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    // --- History ---

    /// A pending typing snapshot is committed before the cursor moves, so
    /// an undo immediately after a burst does not lose it.
    fn flush_pending_snapshot(&mut self) {
        if self.history_debounce.pending() {
            self.history_debounce.cancel();
            self.history.push(&self.buffer.text());
        }
    }

    pub fn undo(&mut self) -> bool {
        self.flush_pending_snapshot();
        let snapshot = self.history.undo().map(str::to_string);
        match snapshot {
            Some(text) => {
                self.buffer.set_text(&text);
                self.refresh();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending_snapshot();
        let snapshot = self.history.redo().map(str::to_string);
        match snapshot {
            Some(text) => {
                self.buffer.set_text(&text);
                self.refresh();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Folding ---

    pub fn toggle_fold(&mut self, line: usize) -> bool {
        self.folds.toggle(line, &self.fold_index)
    }

    pub fn expand_all(&mut self) {
        self.folds.expand_all();
    }

    pub fn collapse_all(&mut self) {
        // Re-derive so a stale index never decides what gets folded.
        self.fold_index = FoldIndex::scan(&self.buffer.text());
        self.folds.collapse_all(&self.fold_index);
    }

    // --- Search & replace ---

    /// Update the query; the match list refreshes after the search
    /// debounce, mirroring incremental query typing.
    pub fn set_query(&mut self, query: &str, now: Instant) {
        self.search.set_query(query);
        self.search_debounce.schedule(now);
    }

    /// Option toggles re-run the search immediately.
    pub fn set_search_options(&mut self, options: SearchOptions) {
        self.search.set_options(options);
        let text = self.buffer.text();
        self.search.run(&text);
    }

    pub fn next_match(&mut self) -> Option<SearchMatch> {
        self.search.navigate(1)
    }

    pub fn prev_match(&mut self) -> Option<SearchMatch> {
        self.search.navigate(-1)
    }

    pub fn replace_current(&mut self, replacement: &str) -> bool {
        let text = self.buffer.text();
        match self.search.replace_current(&text, replacement) {
            Some(new_text) => {
                // refresh() re-runs the search over the new offsets.
                self.set_text(&new_text);
                true
            }
            None => false,
        }
    }

    pub fn replace_all(&mut self, replacement: &str) -> bool {
        let text = self.buffer.text();
        match self.search.replace_all(&text, replacement) {
            Some(new_text) => {
                self.set_text(&new_text);
                true
            }
            None => false,
        }
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    // --- Cursor ---

    pub fn set_cursor(&mut self, byte_offset: usize) {
        self.cursor.set_byte_offset(byte_offset, &self.buffer);
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    // --- Views ---

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn validation(&self) -> &ValidationStatus {
        &self.validation
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.validation.error()
    }

    pub fn fold_index(&self) -> &FoldIndex {
        &self.fold_index
    }

    /// Markup over the whole buffer.
    pub fn markup(&self) -> String {
        syntax::to_markup(&self.buffer.text())
    }

    /// The fold-collapsed projection of the buffer.
    pub fn display_text(&self) -> String {
        self.folds.collapsed_text(&self.buffer.text(), &self.fold_index)
    }

    /// Markup over the collapsed projection.
    pub fn display_markup(&self) -> String {
        syntax::to_markup(&self.display_text())
    }

    /// One entry per buffer line. At most one line is flagged errored.
    pub fn gutter(&self) -> Vec<GutterLine> {
        let hidden = self.folds.hidden_lines(&self.fold_index);
        let error_line = self.error().map(|e| e.line_index());

        (0..self.buffer.line_count())
            .map(|i| GutterLine {
                number: i + 1,
                foldable: self.fold_index.is_foldable(i),
                folded: self.folds.is_folded(i),
                hidden: hidden.contains(&i),
                errored: error_line == Some(i),
            })
            .collect()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ItemCount;

    #[test]
    fn test_format_then_compress_round_trip() {
        let input = r#"{"a":1,"b":[1,2,3]}"#;
        let mut session = EditorSession::with_text(input);

        assert!(session.format());
        assert_eq!(
            session.text(),
            "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2,\n    3\n  ]\n}"
        );

        assert!(session.compress());
        assert_eq!(session.text(), input);
    }

    #[test]
    fn test_format_noop_on_invalid() {
        let mut session = EditorSession::with_text("{oops");
        assert!(!session.format());
        assert_eq!(session.text(), "{oops");
    }

    #[test]
    fn test_typing_snapshots_after_quiet_period() {
        let t0 = Instant::now();
        let mut session = EditorSession::new();

        session.apply_input("{", t0);
        session.apply_input("{\"a\"", t0 + Duration::from_millis(100));
        session.apply_input("{\"a\":1}", t0 + Duration::from_millis(200));

        // Still inside the burst: nothing snapshotted yet.
        session.tick(t0 + Duration::from_millis(400));
        assert!(!session.can_undo());

        // Quiet period elapsed: exactly the final value is snapshotted.
        session.tick(t0 + Duration::from_millis(701));
        assert!(session.can_undo());
        assert!(session.undo());
        assert_eq!(session.text(), "");
        assert!(session.redo());
        assert_eq!(session.text(), "{\"a\":1}");
    }

    #[test]
    fn test_undo_flushes_pending_burst() {
        let t0 = Instant::now();
        let mut session = EditorSession::new();

        session.apply_input("{\"a\":1}", t0);
        // Undo before the debounce fires: the burst is committed first,
        // then undone, and redo can reach it again.
        assert!(session.undo());
        assert_eq!(session.text(), "");
        assert!(session.redo());
        assert_eq!(session.text(), "{\"a\":1}");
    }

    #[test]
    fn test_try_fix_repairs_bare_keys_and_trailing_comma() {
        let mut session = EditorSession::with_text("{a:1, b:2,}");
        assert!(!session.validation().is_valid());

        session.try_fix();
        assert_eq!(session.text(), r#"{"a":1, "b":2}"#);
        assert!(session.validation().is_valid());

        // The pre-repair text is one undo away.
        assert!(session.undo());
        assert_eq!(session.text(), "{a:1, b:2,}");
    }

    #[test]
    fn test_validation_tracks_buffer() {
        let mut session = EditorSession::with_text(r#"{"a":1"#);
        let err = session.error().cloned().unwrap();
        assert_eq!(err.line, 1);

        session.try_fix();
        assert!(session.error().is_none());
        match session.validation() {
            ValidationStatus::Valid { items, .. } => {
                assert_eq!(*items, ItemCount::Items(1));
            }
            other => panic!("expected Valid, got {:?}", other),
        }
    }

    #[test]
    fn test_gutter_flags() {
        let text = "{\n  \"a\": [\n    1\n  ]\n}";
        let mut session = EditorSession::with_text(text);
        session.toggle_fold(1);

        let gutter = session.gutter();
        assert_eq!(gutter.len(), 5);
        assert!(gutter[0].foldable && !gutter[0].folded);
        assert!(gutter[1].foldable && gutter[1].folded);
        assert!(gutter[2].hidden && gutter[3].hidden);
        assert!(!gutter[4].hidden);
        assert_eq!(gutter[4].number, 5);
    }

    #[test]
    fn test_errored_gutter_line_is_single() {
        let session = EditorSession::with_text("{\n  \"a\": oops\n}");
        let gutter = session.gutter();
        assert_eq!(gutter.iter().filter(|l| l.errored).count(), 1);
        assert!(gutter[1].errored);
    }

    #[test]
    fn test_folds_survive_edits_but_stale_ones_drop() {
        let text = "{\n  \"a\": [\n    1\n  ]\n}";
        let mut session = EditorSession::with_text(text);
        session.toggle_fold(1);
        assert!(session.gutter()[1].folded);

        // Same structure, new content: the fold stays.
        session.set_text("{\n  \"b\": [\n    2\n  ]\n}");
        assert!(session.gutter()[1].folded);

        // Structure gone: the fold is dropped.
        session.set_text(r#"{"b": [2]}"#);
        assert!(!session.gutter()[0].folded);
    }

    #[test]
    fn test_display_text_collapses_folds() {
        let text = "{\n  \"a\": [\n    1\n  ],\n  \"b\": 2\n}";
        let mut session = EditorSession::with_text(text);
        session.toggle_fold(1);
        assert_eq!(session.display_text(), "{\n  \"a\": [...]\n  \"b\": 2\n}");

        session.expand_all();
        assert_eq!(session.display_text(), text);
    }

    #[test]
    fn test_collapse_all_folds_every_range() {
        let text = "{\n  \"a\": [\n    1\n  ]\n}";
        let mut session = EditorSession::with_text(text);
        session.collapse_all();
        assert_eq!(session.display_text(), "{...}");
    }

    #[test]
    fn test_search_query_debounced() {
        let t0 = Instant::now();
        let mut session = EditorSession::with_text("foo bar foo");

        session.set_query("foo", t0);
        assert!(session.search().matches().is_empty());

        session.tick(t0 + Duration::from_millis(301));
        assert_eq!(session.search().matches().len(), 2);
    }

    #[test]
    fn test_replace_all_rewrites_every_match() {
        let t0 = Instant::now();
        let mut session = EditorSession::with_text("foo bar foo");
        session.set_query("foo", t0);
        session.tick(t0 + Duration::from_millis(301));

        assert!(session.replace_all("baz"));
        assert_eq!(session.text(), "baz bar baz");
    }

    #[test]
    fn test_replace_current_only_touches_selection() {
        let t0 = Instant::now();
        let mut session = EditorSession::with_text("foo bar foo");
        session.set_query("foo", t0);
        session.tick(t0 + Duration::from_millis(301));
        session.next_match();

        assert!(session.replace_current("baz"));
        assert_eq!(session.text(), "foo bar baz");
        // Search re-ran against the new text.
        assert_eq!(session.search().matches().len(), 1);
    }

    #[test]
    fn test_clear_resets_to_empty_status() {
        let mut session = EditorSession::with_text(r#"{"a":1}"#);
        session.clear();
        assert!(matches!(session.validation(), ValidationStatus::Empty));
        assert!(session.can_undo());
    }

    #[test]
    fn test_cursor_display_position() {
        let mut session = EditorSession::with_text("{\n  \"a\": 1\n}");
        session.set_cursor(4);
        assert_eq!(session.cursor().display_position(), (2, 3));
    }
}
