pub mod buffer;
pub mod fold;
pub mod history;
pub mod repair;
pub mod search;
pub mod session;
pub mod syntax;
pub mod ui;
pub mod validate;

pub use buffer::{Buffer, Cursor};
pub use fold::{BracketKind, FoldIndex, FoldState};
pub use history::History;
pub use search::{SearchMatch, SearchOptions, SearchState};
pub use session::{EditorSession, GutterLine};
pub use syntax::{Token, TokenKind, Tokenizer};
pub use validate::{ItemCount, ParseError, ValidationStatus};
