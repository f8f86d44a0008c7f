//! Terminal presentation helpers

pub mod highlight;
pub mod spinner;
pub mod tool_table;

pub use highlight::{highlight_code, render_markdown};
pub use spinner::Spinner;
pub use tool_table::render_tool_table;
