//! Memos and columns, the two kinds of posts a user owns.

mod model;
mod repository;

pub use model::{Column, Memo};
pub use repository::{ColumnRepository, MemoRepository};
