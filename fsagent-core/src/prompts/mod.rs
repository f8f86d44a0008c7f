pub mod system;

pub use system::{resolve_system_prompt, system_prompt};
