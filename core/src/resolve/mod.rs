//! Cursor-position resolution: enclosing block, token under the cursor and the
//! tabular column a token belongs to.

mod context;
mod recarray;

pub use context::{CursorToken, LineToken, enclosing_block, token_at, tokenize_line};
pub use recarray::{GridType, expand_columns, resolve_column};
