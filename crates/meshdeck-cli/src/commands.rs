use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::debug;

use crate::display::{AutostartRow, NetworkInfo, NetworkRow};
use crate::logging::{self, LogFormat};
use crate::output::{self, OutputFormat};
use crate::settings::Settings;
use crate::ui;

use meshdeck_core::config::AuthMode;
use meshdeck_core::network::NetworkStatus;
use meshdeck_core::time;
use meshdeck_engine::{EngineError, InstanceFeed, LocalEngine};
use meshdeck_registry::{
    Dispatch, FileStore, InstanceRegistry, KvStore, LifecycleController, StatusChange, autostart,
    poller,
};

#[derive(Parser)]
#[command(
    name = "meshdeck",
    version,
    about = "Manage mesh overlay network instances and watch their telemetry"
)]
struct Cli {
    /// Output format: table, json
    #[arg(long, short = 'o', global = true, default_value = "table")]
    output: String,

    /// Settings file (default: $MESHDECK_HOME/meshdeck.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log format (overrides the settings file)
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured networks
    List {
        /// Only show networks whose name or id contains this text
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },
    /// Add a network with default settings
    Add {
        /// Display name (default: generated)
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a network
    Remove {
        /// Network id
        id: String,
    },
    /// Show one network's configuration
    Show {
        /// Network id (default: first network)
        id: Option<String>,
    },
    /// Edit a network's configuration
    Set(SetArgs),
    /// Print the engine configuration rendered for a network
    Render {
        /// Network id
        id: String,
    },
    /// Dry-run a network through the engine and print the wire config it receives
    Check {
        /// Network id
        id: String,
    },
    /// Manage networks started by `run --autostart`
    Autostart {
        #[command(subcommand)]
        action: AutostartCmd,
    },
    /// Run networks on the in-process engine and print live telemetry
    Run {
        /// Start the networks listed in the autostart config
        #[arg(long)]
        autostart: bool,
        /// Network id to start. Repeatable.
        #[arg(long, short = 's')]
        start: Vec<String>,
        /// Network whose metrics are printed (default: first network)
        #[arg(long, short = 'n')]
        network: Option<String>,
        /// Stop after this many polls (default: until Ctrl-C)
        #[arg(long)]
        ticks: Option<u64>,
        /// JSON file of routes, peers and errors keyed by network id, fed to
        /// the started networks
        #[arg(long)]
        telemetry: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct SetArgs {
    /// Network id
    id: String,
    /// Display name
    #[arg(long)]
    name: Option<String>,
    /// Authentication mode: token, shared-secret
    #[arg(long)]
    auth: Option<String>,
    /// Network token (token mode)
    #[arg(long)]
    token: Option<String>,
    /// Network name (shared-secret mode)
    #[arg(long)]
    network_name: Option<String>,
    /// Network secret (shared-secret mode)
    #[arg(long)]
    network_secret: Option<String>,
    /// Obtain the virtual address via DHCP
    #[arg(long)]
    dhcp: Option<bool>,
    /// Static virtual IPv4 address (used when DHCP is off)
    #[arg(long)]
    ipv4: Option<String>,
    /// Hostname announced to peers
    #[arg(long)]
    hostname: Option<String>,
    /// Peer url, replaces the list. Repeatable.
    #[arg(long)]
    peer: Vec<String>,
    /// Listener url, replaces the list. Repeatable.
    #[arg(long)]
    listener: Vec<String>,
    /// Subnet proxied to the network, replaces the list. Repeatable.
    #[arg(long)]
    proxy_cidr: Vec<String>,
    /// VPN portal client network address (a /24 is assumed)
    #[arg(long)]
    vpn_portal_addr: Option<String>,
    /// VPN portal WireGuard port
    #[arg(long)]
    vpn_portal_port: Option<u16>,
    /// Engine RPC port
    #[arg(long)]
    rpc_port: Option<u16>,
}

#[derive(Subcommand)]
enum AutostartCmd {
    /// Start listed networks on `run --autostart`
    Enable,
    /// Disable autostart (the list is kept)
    Disable,
    /// Add a network to the autostart list
    Add {
        /// Network id
        id: String,
    },
    /// Remove a network from the autostart list
    Remove {
        /// Network id
        id: String,
    },
    /// Show the autostart config
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    logging::init(cli.log_format.unwrap_or(settings.log_format));

    let out_fmt = OutputFormat::from_str_arg(&cli.output);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "Failed to create tokio runtime")?;

    runtime.block_on(async move {
        let registry = open_registry(&settings).await?;
        match cli.command {
            Commands::List { filter } => cmd_list(&registry, filter.as_deref(), out_fmt).await,
            Commands::Add { name } => cmd_add(&registry, name).await,
            Commands::Remove { id } => cmd_remove(&registry, &id).await,
            Commands::Show { id } => cmd_show(&registry, id.as_deref(), out_fmt).await,
            Commands::Set(args) => cmd_set(&registry, args).await,
            Commands::Render { id } => cmd_render(registry, &id).await,
            Commands::Check { id } => cmd_check(registry, &id).await,
            Commands::Autostart { action } => cmd_autostart(&registry, action, out_fmt).await,
            Commands::Run {
                autostart,
                start,
                network,
                ticks,
                telemetry,
            } => {
                cmd_run(
                    registry,
                    &settings,
                    RunOptions {
                        autostart,
                        start,
                        network,
                        ticks,
                        telemetry,
                    },
                    out_fmt,
                )
                .await
            }
        }
    })
}

async fn open_registry(settings: &Settings) -> Result<Arc<InstanceRegistry>> {
    let dir = settings.data_dir()?;
    debug!(data_dir = %dir.display(), "Opening network store");
    let store: Arc<dyn KvStore> = Arc::new(FileStore::new(&dir));
    let registry = InstanceRegistry::load_with_capacity(store, settings.history_capacity)
        .await
        .with_context(|| format!("Failed to load network list from {}", dir.display()))?;
    Ok(Arc::new(registry))
}

fn controller(registry: Arc<InstanceRegistry>) -> (LifecycleController, Arc<LocalEngine>) {
    let engine = Arc::new(LocalEngine::new());
    (LifecycleController::new(registry, engine.clone()), engine)
}

// ============================================================================
// Network list
// ============================================================================

async fn cmd_list(
    registry: &InstanceRegistry,
    filter: Option<&str>,
    out_fmt: OutputFormat,
) -> Result<()> {
    if let Some(filter) = filter {
        registry.set_filter(filter).await;
    }
    let networks = registry.filtered_networks().await;

    if out_fmt == OutputFormat::Table && networks.is_empty() {
        ui::info("No networks found.");
        return Ok(());
    }
    let rows: Vec<NetworkRow> = networks.iter().map(NetworkRow::from_network).collect();
    output::render_list(&rows, out_fmt)?;
    Ok(())
}

async fn cmd_add(registry: &InstanceRegistry, name: Option<String>) -> Result<()> {
    let network = registry.add_network().await?;
    if let Some(name) = name {
        registry
            .update_network(network.id(), |n| n.name = Some(name))
            .await?;
    }
    ui::success(&format!("Network '{}' added.", network.id()));
    Ok(())
}

async fn cmd_remove(registry: &InstanceRegistry, id: &str) -> Result<()> {
    if !registry.remove_network(id).await? {
        anyhow::bail!("Network '{}' not found", id);
    }
    let mut app = registry.app_config().await?;
    if app.remove_autostart(id) {
        registry.set_app_config(&app).await?;
    }
    ui::success(&format!("Network '{}' removed.", id));
    Ok(())
}

async fn cmd_show(registry: &InstanceRegistry, id: Option<&str>, out_fmt: OutputFormat) -> Result<()> {
    if let Some(id) = id {
        registry.select(id).await;
    }
    let Some(network) = registry.current_network().await else {
        match id {
            Some(id) => anyhow::bail!("Network '{}' not found", id),
            None => anyhow::bail!("No networks configured. Run 'meshdeck add' first."),
        }
    };
    output::render_one(&NetworkInfo::from_network(&network), out_fmt)?;
    Ok(())
}

fn parse_auth_mode(s: &str) -> Result<AuthMode> {
    match s.to_lowercase().as_str() {
        "token" => Ok(AuthMode::Token),
        "shared-secret" | "secret" => Ok(AuthMode::SharedSecret),
        _ => anyhow::bail!("Unknown auth mode '{}' (expected token or shared-secret)", s),
    }
}

async fn cmd_set(registry: &InstanceRegistry, args: SetArgs) -> Result<()> {
    let auth = args.auth.as_deref().map(parse_auth_mode).transpose()?;
    let id = args.id.clone();

    let found = registry
        .update_network(&id, move |n| {
            let cfg = &mut n.config;
            if let Some(name) = args.name {
                n.name = Some(name);
            }
            if let Some(mode) = auth {
                n.other_config.set_auth_mode(mode);
            }
            if args.token.is_some() {
                cfg.token = args.token;
            }
            if args.network_name.is_some() {
                cfg.network_name = args.network_name;
            }
            if args.network_secret.is_some() {
                cfg.network_secret = args.network_secret;
            }
            if let Some(dhcp) = args.dhcp {
                cfg.dhcp = dhcp;
            }
            if args.ipv4.is_some() {
                cfg.ipv4 = args.ipv4;
            }
            if args.hostname.is_some() {
                cfg.device_name = args.hostname;
            }
            if !args.peer.is_empty() {
                cfg.peer_urls = args.peer;
            }
            if !args.listener.is_empty() {
                cfg.listener_urls = args.listener;
            }
            if !args.proxy_cidr.is_empty() {
                cfg.proxy_cidrs = Some(args.proxy_cidr);
            }
            if args.vpn_portal_addr.is_some() {
                cfg.vpn_portal_addr = args.vpn_portal_addr;
            }
            if args.vpn_portal_port.is_some() {
                cfg.vpn_portal_port = args.vpn_portal_port;
            }
            if args.rpc_port.is_some() {
                cfg.rpc_port = args.rpc_port;
            }
        })
        .await?;

    if !found {
        anyhow::bail!("Network '{}' not found", id);
    }
    ui::success(&format!("Network '{}' updated.", id));
    Ok(())
}

async fn cmd_render(registry: Arc<InstanceRegistry>, id: &str) -> Result<()> {
    let (ctl, _engine) = controller(registry);
    let rendered = ctl
        .render_network(Some(id))
        .await
        .with_context(|| format!("Network '{}' has an invalid configuration", id))?
        .with_context(|| format!("Network '{}' not found", id))?;
    print!("{}", rendered);
    Ok(())
}

async fn cmd_check(registry: Arc<InstanceRegistry>, id: &str) -> Result<()> {
    let (ctl, _engine) = controller(registry);
    let config = ctl
        .test_network(Some(id))
        .await
        .with_context(|| format!("Network '{}' has an invalid configuration", id))?
        .with_context(|| format!("Network '{}' not found", id))?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

// ============================================================================
// Autostart
// ============================================================================

async fn cmd_autostart(
    registry: &InstanceRegistry,
    action: AutostartCmd,
    out_fmt: OutputFormat,
) -> Result<()> {
    let mut app = registry.app_config().await?;

    match action {
        AutostartCmd::Enable => {
            app.autostart.enable = true;
            registry.set_app_config(&app).await?;
            ui::success("Autostart enabled.");
        }
        AutostartCmd::Disable => {
            app.autostart.enable = false;
            registry.set_app_config(&app).await?;
            ui::success("Autostart disabled.");
        }
        AutostartCmd::Add { id } => {
            if registry.network(&id).await.is_none() {
                anyhow::bail!("Network '{}' not found", id);
            }
            if app.add_autostart(&id) {
                registry.set_app_config(&app).await?;
                ui::success(&format!("Network '{}' will autostart.", id));
            } else {
                ui::info(&format!("Network '{}' is already in the autostart list.", id));
            }
        }
        AutostartCmd::Remove { id } => {
            if app.remove_autostart(&id) {
                registry.set_app_config(&app).await?;
                ui::success(&format!("Network '{}' removed from autostart.", id));
            } else {
                ui::warn(&format!("Network '{}' is not in the autostart list.", id));
            }
        }
        AutostartCmd::Show => {
            let mut rows = Vec::new();
            for id in &app.autostart.network {
                let name = match registry.network(id).await {
                    Some(n) => n.label().to_string(),
                    None => "(removed)".to_string(),
                };
                rows.push(AutostartRow {
                    id: id.clone(),
                    name,
                });
            }
            if out_fmt == OutputFormat::Table {
                let state = if app.autostart.enable { "enabled" } else { "disabled" };
                ui::status_line("Autostart", state);
            }
            output::render_list(&rows, out_fmt)?;
        }
    }
    Ok(())
}

// ============================================================================
// Run loop
// ============================================================================

struct RunOptions {
    autostart: bool,
    start: Vec<String>,
    network: Option<String>,
    ticks: Option<u64>,
    telemetry: Option<PathBuf>,
}

fn load_feed(path: &Path) -> Result<BTreeMap<String, InstanceFeed>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read telemetry file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse telemetry file: {}", path.display()))
}

async fn cmd_run(
    registry: Arc<InstanceRegistry>,
    settings: &Settings,
    opts: RunOptions,
    out_fmt: OutputFormat,
) -> Result<()> {
    let feed = opts.telemetry.as_deref().map(load_feed).transpose()?;
    let (ctl, engine) = controller(Arc::clone(&registry));

    if let Some(id) = &opts.network {
        registry.select(id).await;
    }

    if opts.autostart {
        let app = registry.app_config().await?;
        autostart::run(&ctl, &app).await;
    }
    for id in &opts.start {
        let outcome = ctl
            .start_network(Some(id), |e| {
                ui::error(&format!("Failed to start '{}': {}", id, e));
            })
            .await;
        if outcome == Dispatch::NotFound {
            ui::warn(&format!("Network '{}' not found, skipped.", id));
        }
    }
    for (id, entry) in feed.into_iter().flatten() {
        if !engine.apply_feed(&id, entry).await {
            ui::warn(&format!("Network '{}' is not running, telemetry skipped.", id));
        }
    }

    if out_fmt == OutputFormat::Table {
        let interval = format!("Polling every {}s, Ctrl-C to stop", settings.poll_interval_secs);
        ui::banner(&["meshdeck run", &interval]);
    }

    if opts.ticks != Some(0) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ui::info("Received shutdown signal, stopping...");
                let _ = shutdown_tx.send(true);
            }
        });

        let mut seen = 0u64;
        poller::run(
            &registry,
            engine.as_ref(),
            settings.poll_interval(),
            shutdown_rx,
            |outcome| {
                seen += 1;
                let done = opts.ticks.is_some_and(|limit| seen >= limit);
                let registry = Arc::clone(&registry);
                async move {
                    if let Err(e) = report_tick(&registry, outcome, out_fmt).await {
                        ui::error(&format!("Failed to write telemetry: {}", e));
                        return ControlFlow::Break(());
                    }
                    if done {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                }
            },
        )
        .await;
        signal.abort();
    }

    for network in registry.networks().await {
        if matches!(network.status, NetworkStatus::Running | NetworkStatus::Error) {
            ctl.stop_network(Some(network.id()), |e| {
                ui::error(&format!("Failed to stop '{}': {}", network.id(), e));
            })
            .await;
        }
    }

    if out_fmt == OutputFormat::Table {
        let history = registry.current_history().await;
        if !history.is_empty() {
            ui::info("History for the current network:");
            output::render_history(&history, out_fmt)?;
        }
    }
    Ok(())
}

async fn report_tick(
    registry: &InstanceRegistry,
    outcome: Result<Vec<StatusChange>, EngineError>,
    out_fmt: OutputFormat,
) -> std::io::Result<()> {
    match outcome {
        Ok(changes) => {
            for change in changes {
                ui::info(&format!("{}: {} -> {}", change.id, change.from, change.to));
            }
        }
        Err(e) => ui::warn(&format!("Telemetry poll failed: {}", e)),
    }

    if out_fmt == OutputFormat::Table {
        let label = match registry.current_network().await {
            Some(n) => format!("{} ({})", n.label(), n.status),
            None => "no network selected".to_string(),
        };
        ui::info(&format!("[{}] {}", time::clock_label_now(), label));
    }
    output::render_metrics(&registry.current_data().await, out_fmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_auth_mode() {
        assert_eq!(parse_auth_mode("token").unwrap(), AuthMode::Token);
        assert_eq!(
            parse_auth_mode("Shared-Secret").unwrap(),
            AuthMode::SharedSecret
        );
        assert!(parse_auth_mode("password").is_err());
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "meshdeck", "run", "--autostart", "-s", "a", "-s", "b", "--ticks", "3",
        ])
        .unwrap();
        let Commands::Run {
            autostart,
            start,
            network,
            ticks,
            telemetry,
        } = cli.command
        else {
            panic!("expected run");
        };
        assert!(autostart);
        assert_eq!(start, vec!["a", "b"]);
        assert!(network.is_none());
        assert_eq!(ticks, Some(3));
        assert!(telemetry.is_none());
    }

    #[test]
    fn test_parse_log_format_flag() {
        let cli = Cli::try_parse_from(["meshdeck", "--log-format", "json", "list"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(Cli::try_parse_from(["meshdeck", "--log-format", "yaml", "list"]).is_err());
    }

    #[test]
    fn test_load_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(
            &path,
            r#"{"abc": {"routes": [{"peer_id": 1, "hostname": "gw"}], "error": "down"}}"#,
        )
        .unwrap();
        let feed = load_feed(&path).unwrap();
        assert_eq!(feed["abc"].routes[0].hostname, "gw");
        assert!(feed["abc"].peers.is_empty());
        assert_eq!(feed["abc"].error.as_deref(), Some("down"));

        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(load_feed(&path).is_err());
    }

    #[test]
    fn test_parse_set_lists() {
        let cli = Cli::try_parse_from([
            "meshdeck",
            "set",
            "abc",
            "--peer",
            "tcp://a:1",
            "--peer",
            "tcp://b:2",
            "--dhcp",
            "false",
        ])
        .unwrap();
        let Commands::Set(args) = cli.command else {
            panic!("expected set");
        };
        assert_eq!(args.id, "abc");
        assert_eq!(args.peer.len(), 2);
        assert_eq!(args.dhcp, Some(false));
    }
}
