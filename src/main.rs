//! fsagent: a terminal assistant that lets an OpenRouter model work on local
//! files through a set of sandboxed tools.

mod agent;
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use fsagent_core::config::{ConfigManager, load_dotenv, resolve_api_key};
use fsagent_core::core::agent::{AgentRunner, RunnerSettings};
use fsagent_core::llm::OpenRouterProvider;
use fsagent_core::prompts::resolve_system_prompt;
use fsagent_core::tools::{RegistryOptions, ToolRegistry};
use fsagent_core::workspace::WorkspaceScope;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level);
    load_dotenv();

    let scope = WorkspaceScope::from_current_dir(args.path.clone())?;
    let mut manager = ConfigManager::load(args.config.as_deref(), scope.base_dir())?;
    if let Some(model) = args.model.clone() {
        manager.config_mut().agent.model = model;
    }
    if let Some(path) = manager.config_path() {
        info!(path = %path.display(), "loaded configuration");
    }
    let config = manager.into_config();

    let api_key = resolve_api_key(&config.agent.api_key_env)?;
    let provider = OpenRouterProvider::from_config(
        api_key,
        Some(config.agent.model.clone()),
        Some(config.agent.api_base.clone()),
        Duration::from_secs(config.agent.request_timeout_secs),
    )
    .context("Failed to create OpenRouter client")?;

    let mut registry = ToolRegistry::with_options(
        scope.clone(),
        RegistryOptions {
            enable_git: config.tools.enable_git,
            model: config.agent.model.clone(),
        },
    );
    let custom_tools = scope.base_dir().join(&config.tools.custom_tools_dir);
    let discovered = registry.discover(&custom_tools);
    debug!(discovered, total = registry.len(), "tool registry ready");

    let system_prompt = resolve_system_prompt(config.agent.system_prompt.as_deref(), scope.focus());
    let settings = RunnerSettings {
        max_history_items: config.agent.max_history_items,
        max_tool_rounds: config.agent.max_tool_rounds,
        max_tokens: config.agent.max_tokens,
        temperature: config.agent.temperature,
        ..RunnerSettings::new(config.agent.model.clone())
    };
    let runner = AgentRunner::new(provider, registry, system_prompt, settings);

    agent::runloop::run_session(runner, &config, &scope, args.load.as_deref(), args.no_color).await
}
