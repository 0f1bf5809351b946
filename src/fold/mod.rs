pub mod index;
pub mod state;

pub use index::{BracketKind, FoldIndex};
pub use state::FoldState;
