pub mod cursor;

use anyhow::Result;
use ropey::Rope;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

pub use cursor::Cursor;

/// The canonical text state of an editor session. Every derived view
/// (markup, fold index, line numbers, validation) is a function of this.
pub struct Buffer {
    rope: Rope,
    path: Option<PathBuf>,
    modified: bool,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            path: None,
            modified: false,
        }
    }

    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            path: None,
            modified: false,
        }
    }

    pub fn load_file(&mut self, path: &str) -> Result<()> {
        self.rope = Rope::from_reader(BufReader::new(File::open(path)?))?;
        self.path = Some(PathBuf::from(path));
        self.modified = false;

        Ok(())
    }

    /// Replace the entire contents, keeping any associated path.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.modified = true;
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line content including its trailing newline, if any.
    pub fn get_line(&self, line_idx: usize) -> String {
        if line_idx >= self.rope.len_lines() {
            return String::new();
        }

        self.rope.line(line_idx).to_string()
    }

    pub fn get_visible_lines(&self, start_line: usize, count: usize) -> String {
        let mut result = String::new();
        let max_line = self.line_count();

        for i in 0..count {
            let line_idx = start_line + i;
            if line_idx >= max_line {
                break;
            }
            result.push_str(&self.get_line(line_idx));
        }

        result
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Convert byte offset to line number
    pub fn byte_offset_to_line(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_line(byte_offset.min(self.rope.len_bytes()))
    }

    /// Convert line number to byte offset
    pub fn line_to_byte_offset(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_bytes();
        }
        self.rope.line_to_byte(line)
    }

    /// Convert a byte offset to a 0-indexed (line, column) pair.
    pub fn offset_to_line_col(&self, byte_offset: usize) -> (usize, usize) {
        let line = self.byte_offset_to_line(byte_offset);
        let col = byte_offset
            .min(self.rope.len_bytes())
            .saturating_sub(self.line_to_byte_offset(line));
        (line, col)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Insert text at the given byte offset
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        let offset = offset.min(self.rope.len_bytes());
        let char_idx = self.rope.byte_to_char(offset);
        self.rope.insert(char_idx, text);
        self.modified = true;
        Ok(())
    }

    /// Delete text in the given range [start, end)
    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        let start = start.min(self.rope.len_bytes());
        let end = end.min(self.rope.len_bytes());
        if start < end {
            let start_char = self.rope.byte_to_char(start);
            let end_char = self.rope.byte_to_char(end);
            self.rope.remove(start_char..end_char);
            self.modified = true;
        }
        Ok(())
    }

    /// Replace text in range [start, end) with new_text
    pub fn replace(&mut self, start: usize, end: usize, new_text: &str) -> Result<()> {
        self.delete(start, end)?;
        self.insert(start, new_text)?;
        Ok(())
    }

    /// Get a slice of text from the buffer
    pub fn slice(&self, range: std::ops::Range<usize>) -> String {
        let start = range.start.min(self.rope.len_bytes());
        let end = range.end.min(self.rope.len_bytes());
        if start >= end {
            return String::new();
        }
        self.rope.byte_slice(start..end).to_string()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}
