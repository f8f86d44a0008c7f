//! Terminal output and path-filtering helpers

pub mod ansi;
pub mod gitignore;
