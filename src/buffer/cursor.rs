use super::Buffer;

/// Cursor position in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Byte offset in buffer
    pub byte_offset: usize,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed)
    pub col: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self {
            byte_offset: 0,
            line: 0,
            col: 0,
        }
    }

    /// Move to a byte offset and recompute line/col from the buffer.
    pub fn set_byte_offset(&mut self, offset: usize, buffer: &Buffer) {
        self.byte_offset = offset.min(buffer.len_bytes());
        let (line, col) = buffer.offset_to_line_col(self.byte_offset);
        self.line = line;
        self.col = col;
    }

    /// Clamp the cursor back into a buffer that may have shrunk.
    pub fn clamp(&mut self, buffer: &Buffer) {
        if self.byte_offset > buffer.len_bytes() {
            self.set_byte_offset(buffer.len_bytes(), buffer);
        }
    }

    /// 1-based (line, column) as shown in the status bar.
    pub fn display_position(&self) -> (usize, usize) {
        (self.line + 1, self.col + 1)
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
