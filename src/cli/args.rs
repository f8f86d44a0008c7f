//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Command line options for fsagent
#[derive(Parser, Debug)]
#[command(
    name = "fsagent",
    version,
    about = "Terminal assistant for refactoring and managing files with OpenRouter models"
)]
pub struct Cli {
    /// Focus directory; tools resolve paths against it and cannot leave it
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Saved conversation to resume before the first prompt
    #[arg(long, value_name = "FILE")]
    pub load: Option<String>,

    /// OpenRouter model ID, e.g. google/gemini-2.5-flash-preview
    #[arg(long)]
    pub model: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Disable color output
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_all_options() {
        let cli = Cli::parse_from([
            "fsagent",
            "--path",
            "project",
            "--load",
            "session",
            "--model",
            "openai/gpt-4o",
            "--no-color",
        ]);
        assert_eq!(cli.path, Some(PathBuf::from("project")));
        assert_eq!(cli.load.as_deref(), Some("session"));
        assert_eq!(cli.model.as_deref(), Some("openai/gpt-4o"));
        assert_eq!(cli.log_level, "warn");
        assert!(cli.no_color);
        assert!(cli.config.is_none());
    }
}
