//! The one command: resolve everything, then run a session.

use std::sync::Arc;

use taskpilot_agent::{PlanExecutor, Planner, Session, SessionLimits, SessionState};
use taskpilot_config::{AppConfig, ConfigError};
use taskpilot_core::console::{Block, Console};
use taskpilot_core::error::{Error, ProviderError, Result};
use taskpilot_core::secret::SecretStore;
use taskpilot_security::{CredentialResolver, DotenvStore, EnvStore, RedactingConsole};
use tracing::info;

use crate::Cli;
use crate::terminal::TerminalConsole;

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let terminal = TerminalConsole::new();

    terminal.show(Block::Banner {
        title: "Local AI Task Agent".into(),
        subtitle: "Use AI to automate tasks on your computer".into(),
    });

    let credential = resolve_credential(&config, &terminal)?;
    let console = RedactingConsole::new(&terminal, credential.iter().cloned().collect());

    let router = taskpilot_providers::router::build_from_config(&config, credential.as_deref());
    let provider = router
        .default()
        .ok_or_else(|| ProviderError::NotConfigured(config.default_provider.clone()))?;

    let model = config.model_for_default_provider();
    info!(provider = %config.default_provider, model = %model, "Using model");

    let mut planner = Planner::new(provider, model, config.default_temperature)
        .with_max_tokens(config.default_max_tokens);
    if let Some(prompt) = &config.session.system_prompt {
        planner = planner.with_system_prompt(prompt);
    }
    if let Some(secret) = &credential {
        planner = planner.with_redacted(secret);
    }

    let executor = PlanExecutor::new(Arc::new(taskpilot_tools::step_registry()));
    let session =
        Session::new(planner, executor).with_limits(SessionLimits::from(&config.session));

    let task = if cli.task.is_empty() {
        console.input("Enter the task you want to perform")?
    } else {
        cli.task.join(" ")
    };
    let task = task.trim();
    if task.is_empty() {
        console.show(Block::Warning("No task given. Exiting.".into()));
        return Ok(());
    }

    let report = session.run(task, &console).await?;
    match &report.outcome {
        SessionState::Done => info!(refinements = report.refinements, "Session finished"),
        SessionState::Aborted { reason } => info!(reason, "Session aborted"),
        other => info!(state = %other, "Session stopped"),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path).map_err(config_error)?;
            config.apply_env_overrides();
            config
        }
        None => AppConfig::load().map_err(config_error)?,
    };

    if let Some(provider) = &cli.provider {
        config.default_provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        config.default_model = model.clone();
    }
    if let Some(max) = cli.max_refinements {
        config.session.max_refinements = max;
    }

    config.validate().map_err(config_error)?;
    Ok(config)
}

fn config_error(e: ConfigError) -> Error {
    Error::Config {
        message: e.to_string(),
    }
}

/// `None` for providers that need no key.
fn resolve_credential(config: &AppConfig, console: &dyn Console) -> Result<Option<String>> {
    if let Some(key) = config.configured_api_key() {
        return Ok(Some(key));
    }
    let Some(name) = config.credential_name() else {
        return Ok(None);
    };

    let stores: Vec<Arc<dyn SecretStore>> = vec![
        Arc::new(EnvStore),
        Arc::new(DotenvStore::new(&config.credential.env_file)),
    ];
    let resolver = CredentialResolver::new(stores).with_persist(config.credential.persist);

    let resolved = resolver.resolve(&name, Some(console)).inspect_err(|e| {
        console.show(Block::Failure(format!("Failed to initialize AI: {e}")));
    })?;
    info!(credential = %name, source = %resolved.source, "Credential resolved");
    Ok(Some(resolved.value))
}
