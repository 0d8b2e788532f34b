use anyhow::{anyhow, Context, Result};
use clap::Parser;
use flowctl::config::{self, ClientConfig};
use flowctl::connection::{Connection, ConnectionLister};
use flowctl::controller::{EnablementController, Resolution, ToggleContext, ToggleEffect};
use flowctl::flow::{FlowDescriptor, FlowListing};
use flowctl::notify::StderrNotifier;
use flowctl::{EnablementClient, HttpEnablementClient, Outcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Command, FlowArgs, InitConfigArgs, RootArgs, StatusArgs, ToggleArgs};

const LOG_ENV: &str = "FLOWCTL_LOG";

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::InitConfig(cmd) => cmd_init_config(args.config, cmd),
        Command::Status(cmd) => cmd_status(cmd),
        Command::Toggle(cmd) => cmd_toggle(args.config.as_deref(), cmd),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_init_config(global: Option<PathBuf>, args: InitConfigArgs) -> Result<()> {
    let path = args
        .out
        .or(global)
        .or_else(config::default_config_path)
        .ok_or_else(|| anyhow!("no config directory on this platform; pass --out"))?;
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &ClientConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_status(args: StatusArgs) -> Result<()> {
    let flow = load_flow(&args.flow)?;
    print_flow(&flow, None, args.flow.json)
}

fn cmd_toggle(config_path: Option<&Path>, args: ToggleArgs) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    config::apply_overrides(&mut config, args.api_url.as_deref(), args.env.as_deref())?;

    let mut flow = load_flow(&args.flow)?;
    if let Some(provider) = args.provider {
        flow.provider = provider;
    }
    if let Some(key) = args.provider_config_key {
        flow.provider_config_key = key;
    }
    let connections: Vec<Connection> = match args.connections.as_deref() {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let context = ToggleContext {
        raw_name: args.raw_name,
        connection_ids: connections.connection_ids(&flow.provider_config_key),
    };

    let name = flow.name.clone();
    let client = HttpEnablementClient::new(&config);
    let mut controller = EnablementController::new(
        flow,
        context,
        client,
        Box::new(StderrNotifier),
        Box::new(|| tracing::info!("flow state changed; refresh the integration listing")),
    );

    let immediate = match controller.toggle()? {
        ToggleEffect::Completed(outcome) => Some(outcome),
        ToggleEffect::Prompted => None,
    };
    // Actions skip confirmation but can still raise the quota prompt.
    let prompted = drive_prompts(&mut controller, args.yes)?;
    let outcome = prompted.or(immediate);

    print_flow(controller.flow(), outcome.as_ref(), args.flow.json)?;
    match outcome {
        Some(outcome) if !outcome.is_success() => {
            Err(anyhow!("toggle of {name} did not complete ({})", outcome.label()))
        }
        _ => Ok(()),
    }
}

/// Answer prompts until the modal closes. Returns the last remote outcome,
/// or `None` when no call was made here.
fn drive_prompts<C: EnablementClient>(
    controller: &mut EnablementController<C>,
    assume_yes: bool,
) -> Result<Option<Outcome>> {
    let mut outcome = None;
    while controller.modal().is_visible() {
        let modal = controller.modal().state().clone();
        eprintln!("{}\n{}", modal.title, modal.body);
        let accepted = assume_yes || ask(&modal.ok_label, &modal.cancel_label)?;
        if !accepted {
            if let Some(link) = controller.cancel() {
                eprintln!("{}: {link}", modal.cancel_label);
            }
            break;
        }
        match controller.confirm()? {
            Resolution::Completed(settled) => outcome = Some(settled),
            Resolution::Navigate(link) => {
                eprintln!("{}: {link}", modal.ok_label);
                if let Some(docs) = controller.cancel() {
                    eprintln!("{}: {docs}", modal.cancel_label);
                }
            }
        }
    }
    Ok(outcome)
}

fn ask(ok_label: &str, cancel_label: &str) -> Result<bool> {
    eprint!("{ok_label}? [y/N] (N = {cancel_label}) ");
    std::io::stderr().flush().context("flush prompt")?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

fn load_flow(args: &FlowArgs) -> Result<FlowDescriptor> {
    let mut flow: FlowDescriptor = read_json(&args.flow)?;
    if let Some(path) = args.listing.as_deref() {
        let listing: FlowListing = read_json(path)?;
        flow.apply_live_state(&listing)?;
    }
    Ok(flow)
}

#[derive(Serialize)]
struct FlowReport<'a> {
    name: &'a str,
    kind: &'a str,
    id: Option<u64>,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'static str>,
}

fn print_flow(flow: &FlowDescriptor, outcome: Option<&Outcome>, json: bool) -> Result<()> {
    let report = FlowReport {
        name: &flow.name,
        kind: flow.kind.as_str(),
        id: flow.identity().map(|id| id.0),
        enabled: flow.enabled,
        outcome: outcome.map(Outcome::label),
    };
    if json {
        let text = serde_json::to_string_pretty(&report).context("serialize flow report")?;
        println!("{text}");
        return Ok(());
    }
    let state = if report.enabled { "enabled" } else { "disabled" };
    match report.id {
        Some(id) => println!("{} ({}) #{id}: {state}", report.name, report.kind),
        None => println!("{} ({}): {state}", report.name, report.kind),
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value =
        serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
