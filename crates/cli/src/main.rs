#![forbid(unsafe_code)]

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use netpulse_core::{PushEvent, Status};
use netpulse_live::{spawn_live, Command, Dashboard, LiveConfig, PageLayout, ViewSnapshot};
use netpulse_persist::{KvStore, MemoryKv, PersistenceBridge, SqliteKv, FILTER_KEY, TAB_KEY};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "netpulsectl", version, about = "Drive the netpulse live dashboard core from recorded or piped push streams")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// SQLite file holding the reload handoff state
    #[arg(long = "db", env = "NETPULSE_DB_PATH", global = true)]
    db: Option<String>,

    /// Keep handoff state in memory only
    #[arg(long = "memory", action = ArgAction::SetTrue, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a JSON-lines file of push envelopes to a page layout and print the result
    Replay {
        /// Page layout JSON (tabs, summary slots, rows)
        layout: String,
        /// Push envelopes, one JSON object per line
        events: String,
        /// Simulated time between consecutive events
        #[arg(long = "step-ms", default_value_t = 1000)]
        step_ms: u64,
        /// Filter to click before replaying (up, down, error, unknown)
        #[arg(long = "filter")]
        filter: Option<String>,
        /// Fire every pending timer before printing
        #[arg(long = "settle", action = ArgAction::SetTrue)]
        settle: bool,
        /// Hand the final filter and tab over to the next load
        #[arg(long = "refresh", action = ArgAction::SetTrue)]
        refresh: bool,
    },
    /// Run the live loop over envelopes read from stdin; lines starting with ':' are user commands
    Watch {
        /// Page layout JSON (tabs, summary slots, rows)
        layout: String,
    },
    /// Show the pending reload handoff without consuming it
    Handoff,
}

fn init_tracing() {
    let env = std::env::var("NETPULSE_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("NETPULSE_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid NETPULSE_METRICS_ADDR; expected host:port");
        }
    }
}

fn open_store(cli: &Cli) -> Result<Arc<dyn KvStore>> {
    if cli.memory {
        return Ok(Arc::new(MemoryKv::new()));
    }
    let store = match cli.db.as_deref() {
        Some(path) => SqliteKv::open(path)?,
        None => SqliteKv::open_default()?,
    };
    Ok(Arc::new(store))
}

fn read_layout(path: &str) -> Result<PageLayout> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading layout {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing layout {}", path))
}

fn parse_status(s: &str) -> Result<Status> {
    Ok(s.parse::<Status>()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let store = open_store(&cli)?;
    let cfg = LiveConfig::from_env();

    match &cli.command {
        Commands::Replay { layout, events, step_ms, filter, settle, refresh } => {
            let layout = read_layout(layout)?;
            let text = std::fs::read_to_string(events).with_context(|| format!("reading events {}", events))?;
            let mut now = 0u64;
            let mut dash = Dashboard::load(layout, PersistenceBridge::new(store.clone()), &cfg, now);
            // let the deferred restore land before any user click
            now += cfg.restore_delay_ms;
            dash.tick(now);
            if let Some(f) = filter {
                dash.apply_filter(parse_status(f)?);
            }
            let mut applied = 0usize;
            for (lineno, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match PushEvent::from_envelope(line) {
                    Ok(ev) => {
                        now += step_ms;
                        dash.tick(now);
                        dash.handle_push(ev, now);
                        applied += 1;
                    }
                    Err(e) => warn!(line = lineno + 1, error = %e, "replay: skipping malformed envelope"),
                }
            }
            if *settle {
                while let Some(due) = dash.next_timer_due() {
                    now = now.max(due);
                    dash.tick(now);
                }
            }
            let rendered = dash.address_counts();
            info!(
                applied,
                sim_ms = now,
                addresses = ?rendered.total,
                up = ?rendered.up,
                down = ?rendered.down,
                error = ?rendered.error,
                unknown = ?rendered.unknown,
                "replay finished"
            );
            if *refresh {
                dash.refresh();
            }
            print_snapshot(&dash.snapshot(applied as u64), cli.output)?;
        }
        Commands::Watch { layout } => {
            let layout = read_layout(layout)?;
            let dash = Dashboard::load(layout, PersistenceBridge::new(store.clone()), &cfg, 0);
            let (handle, task) = spawn_live(dash, &cfg);

            let printer = tokio::spawn({
                let handle = handle.clone();
                let output = cli.output;
                async move {
                    let mut rx = handle.subscribe_epoch();
                    while rx.changed().await.is_ok() {
                        if let Err(e) = print_snapshot(&handle.current(), output) {
                            warn!(error = %e, "watch: failed to print snapshot");
                        }
                    }
                }
            });

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let Some(line) = line.context("reading stdin")? else {
                            info!("stdin closed; stopping watch");
                            break;
                        };
                        let Some(cmd) = parse_watch_line(&line) else { continue };
                        let refresh = matches!(cmd, Command::Refresh);
                        if !handle.send(cmd).await || refresh {
                            break;
                        }
                    }
                    _ = signal::ctrl_c() => {
                        info!("Ctrl-C received; shutting down watch loop");
                        break;
                    }
                }
            }
            // printer holds a sender clone; drop it before waiting on the loop
            printer.abort();
            let _ = printer.await;
            drop(handle);
            let dash = task.await.context("live loop panicked")?;
            print_snapshot(&dash.snapshot(u64::MAX), cli.output)?;
        }
        Commands::Handoff => {
            let filter = store.get(FILTER_KEY)?;
            let tab = store.get(TAB_KEY)?;
            match cli.output {
                Output::Human => {
                    println!("{:<14} {}", FILTER_KEY, filter.as_deref().unwrap_or("-"));
                    println!("{:<14} {}", TAB_KEY, tab.as_deref().unwrap_or("-"));
                }
                Output::Json => {
                    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ FILTER_KEY: filter, TAB_KEY: tab }))?);
                }
            }
        }
    }

    Ok(())
}

/// `:filter <status>`, `:clear`, `:tab <id>`, `:dismiss <toast id>`, `:scroll <px>`, `:refresh`; anything else is an envelope.
fn parse_watch_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return match PushEvent::from_envelope(line) {
            Ok(ev) => Some(Command::Push(ev)),
            Err(e) => {
                warn!(error = %e, "watch: skipping malformed envelope");
                None
            }
        };
    };
    let mut parts = rest.split_whitespace();
    let cmd = match (parts.next(), parts.next()) {
        (Some("filter"), Some(s)) => Status::parse(s).map(Command::ApplyFilter),
        (Some("clear"), None) => Some(Command::ClearFilter),
        (Some("tab"), Some(t)) => Some(Command::ActivateTab(t.to_string())),
        (Some("dismiss"), Some(n)) => n.parse().ok().map(|n| Command::DismissToast(netpulse_live::ToastId(n))),
        (Some("scroll"), Some(n)) => n.parse().ok().map(Command::Scroll),
        (Some("refresh"), None) => Some(Command::Refresh),
        _ => None,
    };
    if cmd.is_none() {
        warn!(line, "watch: unknown command");
    }
    cmd
}

fn print_snapshot(snap: &ViewSnapshot, output: Output) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string(snap)?),
        Output::Human => {
            let filter = snap.filter.map(|f| f.as_str()).unwrap_or("-");
            println!("FILTER {}   TAB {}   UPDATING {}", filter, snap.active_tab.as_deref().unwrap_or("-"), snap.updating);
            if let Some(b) = &snap.banner {
                println!("  [{}] ({})", b.text, b.clear_label);
            }
            let summary: Vec<String> = snap
                .summary
                .iter()
                .map(|c| format!("{:?}={}", c.slot, if c.text.is_empty() { "-" } else { c.text.as_str() }))
                .collect();
            println!("SUMMARY {}", summary.join(" "));
            println!("TABLE      ID     ADDRESS          STATUS   LAST SEEN");
            for r in snap.visible_rows() {
                println!(
                    "{:<10} {:<6} {:<16} {:<8} {}{}",
                    r.table,
                    r.id,
                    r.ip_address,
                    r.badge.label,
                    r.last_seen.as_deref().unwrap_or("-"),
                    if r.pulsing { " *" } else { "" }
                );
            }
            for t in &snap.toasts {
                println!("TOAST #{} {:?}: {}", t.id.0, t.kind, t.text);
            }
        }
    }
    Ok(())
}
