//! CLI argument parsing for flow enablement.
//!
//! The CLI is thin: it loads inputs, drives one controller session, and
//! prints the settled state.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "flowctl",
    version,
    about = "Enable or disable integration syncs and actions",
    after_help = "Examples:\n  flowctl init-config --out ~/.config/flowctl/config.json\n  flowctl status --flow contacts.json --listing flows.json\n  flowctl toggle --flow contacts.json --provider hubspot --provider-config-key hubspot-prod --connections connections.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Path to config.json (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    InitConfig(InitConfigArgs),
    Status(StatusArgs),
    Toggle(ToggleArgs),
}

/// Write a default config file.
#[derive(Parser, Debug)]
#[command(about = "Write a default flowctl config")]
pub struct InitConfigArgs {
    /// Destination path (defaults to the per-user config directory)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

/// Inputs describing the flow to inspect or toggle.
#[derive(Parser, Debug)]
pub struct FlowArgs {
    /// Flow descriptor JSON (a sync or action from the integration listing)
    #[arg(long, value_name = "PATH")]
    pub flow: PathBuf,

    /// Currently-configured flows JSON ({"syncs": [...], "actions": [...]})
    #[arg(long, value_name = "PATH")]
    pub listing: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Show the resolved enablement state without calling the backend")]
pub struct StatusArgs {
    #[command(flatten)]
    pub flow: FlowArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Toggle a flow on or off")]
pub struct ToggleArgs {
    #[command(flatten)]
    pub flow: FlowArgs,

    /// Provider name (overrides the descriptor)
    #[arg(long)]
    pub provider: Option<String>,

    /// Integration key (overrides the descriptor)
    #[arg(long)]
    pub provider_config_key: Option<String>,

    /// Public route override; defaults to the provider name
    #[arg(long)]
    pub raw_name: Option<String>,

    /// Connections JSON for the integration; disabling applies to all of them
    #[arg(long, value_name = "PATH")]
    pub connections: Option<PathBuf>,

    /// Confirm prompts without asking
    #[arg(long)]
    pub yes: bool,

    /// API base URL (overrides FLOWCTL_API_URL and config)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Environment name (overrides FLOWCTL_ENV and config)
    #[arg(long, value_name = "ENV")]
    pub env: Option<String>,
}
