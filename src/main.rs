use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use patchpilot_core::BotConfig;
use patchpilot_review::github::GitHubClient;
use patchpilot_review::handler::{EventHandler, PullRequestEvent};

#[derive(Parser)]
#[command(
    name = "patchpilot",
    version,
    about = "LLM-backed pull-request review bot",
    long_about = "PatchPilot reviews pull requests with an LLM and posts the verdict as a comment.\n\n\
                   It is designed to run inside a GitHub Actions workflow: the pull_request event\n\
                   payload is read from GITHUB_EVENT_PATH and all behavior is driven by environment\n\
                   variables (OPENAI_API_KEY, MODEL, IGNORE_PATTERNS, TARGET_LABEL, ...).\n\n\
                   Examples:\n  \
                     patchpilot run                      Handle the event from GITHUB_EVENT_PATH\n  \
                     patchpilot run --event-path pr.json Handle a specific event payload\n  \
                     patchpilot doctor                   Check which configuration keys are set"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle a pull_request event and post the review comment
    Run {
        /// Path to the event payload JSON (default: $GITHUB_EVENT_PATH)
        #[arg(long)]
        event_path: Option<PathBuf>,
    },
    /// Check setup and environment
    Doctor,
}

/// Actions this bot reviews. Everything else (closed, labeled, ...) is
/// ignored before any client is constructed.
const REVIEW_ACTIONS: &[&str] = &["opened", "synchronize"];

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let config = BotConfig::from_env();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run { event_path } => run(event_path, config).await,
        Command::Doctor => run_doctor(&config),
    }
}

async fn run(event_path: Option<PathBuf>, config: BotConfig) -> Result<()> {
    let path = match event_path {
        Some(path) => path,
        None => std::env::var("GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .into_diagnostic()
            .wrap_err("no --event-path given and GITHUB_EVENT_PATH is not set")?,
    };

    let payload = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read event payload from {}", path.display()))?;
    let event: PullRequestEvent = serde_json::from_str(&payload)
        .into_diagnostic()
        .wrap_err("event payload is not a pull_request event")?;

    if !REVIEW_ACTIONS.contains(&event.action.as_str()) {
        tracing::info!(action = %event.action, "ignoring action");
        println!("ignored: action '{}' does not trigger review", event.action);
        return Ok(());
    }

    let github = GitHubClient::new(config.github_token.as_deref())?;
    let handler = EventHandler::new(github, config);

    let status = handler.handle(&event).await;
    tracing::info!(%status, number = event.pull_request.number, "done");
    println!("{status}");
    Ok(())
}

fn run_doctor(config: &BotConfig) -> Result<()> {
    let entry = |name: &str, set: bool, detail: &str| {
        let mark = if set { "ok  " } else { "miss" };
        println!("[{mark}] {name:<20} {detail}");
    };

    entry(
        "GITHUB_TOKEN",
        config.github_token.is_some(),
        "required to talk to GitHub",
    );
    entry(
        "OPENAI_API_KEY",
        config.llm.api_key.is_some(),
        "falls back to the repo Actions variable when unset",
    );
    entry(
        "OPENAI_API_ENDPOINT",
        config.llm.endpoint.is_some(),
        "default: https://api.openai.com",
    );
    entry(
        "AZURE_*",
        config.llm.azure.is_some(),
        "AZURE_API_VERSION + AZURE_DEPLOYMENT select the Azure variant",
    );
    entry("MODEL", true, &config.llm.model);
    entry(
        "TARGET_LABEL",
        config.target_label.is_some(),
        config.target_label.as_deref().unwrap_or("review every PR"),
    );
    entry(
        "MAX_PATCH_LENGTH",
        config.max_patch_length.is_some(),
        &config
            .max_patch_length
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".into()),
    );

    let rules = &config.rules;
    println!(
        "rules: {} exact ignores, {} ignore patterns, {} include patterns{}",
        rules.ignore_list.len(),
        rules.ignore_patterns.len(),
        rules.include_patterns.len(),
        if rules.include_patterns.is_empty() {
            ""
        } else {
            " (include takes precedence)"
        }
    );
    Ok(())
}
