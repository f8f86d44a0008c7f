pub mod openrouter;

pub use openrouter::OpenRouterProvider;
