use serde_json::Value;
use thiserror::Error;

/// Structured parse failure, never thrown past this module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    /// 1-based line of the failure.
    pub line: usize,
    /// 1-based column of the failure.
    pub column: usize,
    /// Byte offset into the buffer, 0 when it cannot be recovered.
    pub offset: usize,
}

impl ParseError {
    /// 0-based line index for the gutter marker.
    pub fn line_index(&self) -> usize {
        self.line.saturating_sub(1)
    }
}

/// Top-level item count of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCount {
    /// Array length or object key count.
    Items(usize),
    /// Scalars have no items to count.
    Primitive,
}

#[derive(Debug, Clone)]
pub enum ValidationStatus {
    /// Whitespace-only buffer; neither valid nor an error.
    Empty,
    Valid {
        value: Value,
        /// UTF-8 byte length of the compact serialization.
        bytes: usize,
        items: ItemCount,
    },
    Invalid(ParseError),
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid { .. })
    }

    pub fn error(&self) -> Option<&ParseError> {
        match self {
            ValidationStatus::Invalid(err) => Some(err),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ValidationStatus::Valid { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Attempt a full-document parse of the buffer.
///
/// Whitespace-only text reports `Empty`. The parse itself runs over the
/// untrimmed buffer (leading whitespace is legal JSON) so diagnostic
/// positions always line up with the editor gutter.
pub fn validate(text: &str) -> ValidationStatus {
    if text.trim().is_empty() {
        return ValidationStatus::Empty;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => {
            let bytes = serde_json::to_string(&value)
                .map(|s| s.len())
                .unwrap_or(0);
            let items = match &value {
                Value::Array(arr) => ItemCount::Items(arr.len()),
                Value::Object(map) => ItemCount::Items(map.len()),
                _ => ItemCount::Primitive,
            };
            ValidationStatus::Valid {
                value,
                bytes,
                items,
            }
        }
        Err(err) => {
            let line = err.line();
            let column = err.column();
            ValidationStatus::Invalid(ParseError {
                message: err.to_string(),
                line,
                column,
                offset: offset_of(text, line, column),
            })
        }
    }
}

/// Byte offset of a 1-based (line, column) diagnostic; 0 when the position
/// falls outside the text.
fn offset_of(text: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let mut line_start = 0usize;
    let mut current = 1usize;
    for (idx, ch) in text.char_indices() {
        if current == line {
            break;
        }
        if ch == '\n' {
            current += 1;
            line_start = idx + 1;
        }
    }
    if current != line {
        return 0;
    }
    (line_start + column.saturating_sub(1)).min(text.len())
}
