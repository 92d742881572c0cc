//! # CarbonAware CLI
//!
//! Run a task at the greenest moment inside its window.
//!
//! Usage:
//!   carbonaware run -w 120 -d 45 -z aws:us-east-1 -- ./nightly.sh   # Defer, then run
//!   carbonaware run -w 60 -d 30 --no-wait                            # Park the task and exit
//!   carbonaware resume --wait                                        # Resume parked tasks when due
//!   carbonaware list                                                 # Show parked tasks
//!   carbonaware cancel <id>                                          # Retract a deferral
//!   carbonaware prune                                                # Drop finished tasks
//!   carbonaware info                                                 # Provider metadata

use anyhow::{Context, Result, bail};
use carbonaware_client::{EnvZoneDetector, HttpSchedulerClient};
use carbonaware_core::{CarbonAwareConfig, OperatorConfig, SystemClock, Zone, ZoneSpec};
use carbonaware_scheduler::{SchedulerEngine, TaskStatus, TaskStore};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "carbonaware",
    version,
    about = "🌱 CarbonAware — run tasks when the grid is greenest",
    long_about = "Asks a carbon-aware scheduling service for the lowest-carbon start time inside\nan execution window, then runs immediately or sleeps until that time."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide when to run a task, wait for it, then run the downstream command
    Run {
        /// Execution window in minutes
        #[arg(short, long)]
        window: Option<u32>,

        /// Expected task duration in minutes
        #[arg(short, long)]
        duration: Option<u32>,

        /// Zone as provider:region (repeatable); omit to auto-detect
        #[arg(short, long)]
        zone: Vec<String>,

        /// Task id for logs and the task store
        #[arg(long)]
        task_id: Option<String>,

        /// Park the task and exit instead of waiting in-process
        #[arg(long)]
        no_wait: bool,

        /// Downstream command to run once cleared
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Resume parked tasks whose wake time has passed
    Resume {
        /// Keep running until no deferred tasks remain
        #[arg(long)]
        wait: bool,
    },

    /// List tasks in the store
    List,

    /// Cancel a deferred task
    Cancel {
        id: String,
    },

    /// Remove completed, failed and cancelled tasks from the store
    Prune,

    /// Show provider metadata
    Info,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "carbonaware=debug,carbonaware_core=debug,carbonaware_client=debug,carbonaware_operator=debug,carbonaware_scheduler=debug"
    } else {
        "carbonaware=info,carbonaware_operator=info,carbonaware_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        CarbonAwareConfig::load_from(std::path::Path::new(path))?
    } else {
        CarbonAwareConfig::load()?
    };

    match cli.command {
        Commands::Run { window, duration, zone, task_id, no_wait, command } => {
            let operator = operator_from_args(&config, window, duration, &zone, task_id)?;
            let mut engine = build_engine(&config)?;

            let task = engine.submit(operator).await?;
            let task = match task.status {
                TaskStatus::Deferred if no_wait => {
                    println!("⏸️  Task {} deferred until {}", task.id, format_wake(&task));
                    println!("   Run `carbonaware resume --wait` to pick it up.");
                    return Ok(());
                }
                TaskStatus::Deferred => {
                    println!("⏸️  Waiting until {} (task {})", format_wake(&task), task.id);
                    engine.wait_for(&task.id).await?
                }
                _ => task,
            };

            if task.status != TaskStatus::Completed {
                bail!("task {} ended as {}", task.id, task.status);
            }
            println!("▶️  Cleared to run");

            if !command.is_empty() {
                let output = carbonaware_scheduler::run_downstream(&command, None).await?;
                print!("{}", output.stdout);
                eprint!("{}", output.stderr);
                if !output.success() {
                    std::process::exit(output.exit_code);
                }
            }
        }

        Commands::Resume { wait } => {
            let mut engine = build_engine(&config)?;
            let settled = if wait {
                engine.run_until_idle().await?
            } else {
                engine.run_due().await?
            };
            for task in &settled {
                println!("  {} {:<12} {}", task.id, task.status, task.operator.task_id);
            }
            println!("✅ {} task(s) resumed", settled.len());
        }

        Commands::List => {
            let store = TaskStore::open(&config.host.state_path())?;
            if store.list().is_empty() {
                println!("No tasks in {}", store.path().display());
            }
            for task in store.list() {
                println!(
                    "  {} {:<10} {:<20} wake={}",
                    task.id,
                    task.status,
                    task.operator.task_id,
                    format_wake(task)
                );
            }
        }

        Commands::Cancel { id } => {
            let mut engine = build_engine(&config)?;
            let task = engine.cancel(&id)?;
            println!("🚫 Cancelled {}", task.id);
        }

        Commands::Prune => {
            let mut engine = build_engine(&config)?;
            let pruned = engine.prune()?;
            for task in &pruned {
                println!("  {} {:<10} {}", task.id, task.status, task.operator.task_id);
            }
            println!("🧹 Removed {} finished task(s)", pruned.len());
        }

        Commands::Info => {
            let info = carbonaware_core::provider_info();
            println!("🌱 {} v{}", info.name, env!("CARGO_PKG_VERSION"));
            println!("   Package:    {}", info.package_name);
            println!("   {}", info.description);
            for conn in &info.connection_types {
                println!("   Connection: {} ({})", conn.connection_type, conn.client);
            }
            println!("   Scheduler:  {}", config.scheduler.base_url);
            println!("   Store:      {}", config.host.state_path().display());
            println!("   Platform:   {}/{}", std::env::consts::OS, std::env::consts::ARCH);
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let mut shown = config.clone();
                if shown.scheduler.api_key.is_some() {
                    shown.scheduler.api_key = Some("••••••••".into());
                }
                println!("{}", toml::to_string_pretty(&shown)?);
            }
            ConfigAction::Path => {
                println!("{}", CarbonAwareConfig::default_path().display());
            }
        },
    }

    Ok(())
}

fn build_engine(config: &CarbonAwareConfig) -> Result<SchedulerEngine> {
    let scheduler = HttpSchedulerClient::new(&config.scheduler)?;
    let store = TaskStore::open(&config.host.state_path())?;
    Ok(SchedulerEngine::new(
        store,
        Arc::new(scheduler),
        Arc::new(EnvZoneDetector::new()),
        Arc::new(SystemClock),
    )
    .with_poll_interval(Duration::from_secs(config.host.poll_interval_secs.max(1))))
}

/// CLI flags first, then `[operator]` from the config file.
fn operator_from_args(
    config: &CarbonAwareConfig,
    window: Option<u32>,
    duration: Option<u32>,
    zones: &[String],
    task_id: Option<String>,
) -> Result<OperatorConfig> {
    let base = config.operator.as_ref();
    let window = window
        .or(base.map(|o| o.execution_window_minutes))
        .context("--window is required (or set operator.execution_window_minutes)")?;
    let duration = duration
        .or(base.map(|o| o.task_duration_minutes))
        .context("--duration is required (or set operator.task_duration_minutes)")?;

    let zone = match zones {
        [] => base.and_then(|o| o.zone.clone()),
        [one] => Some(ZoneSpec::One(parse_zone(one)?)),
        many => Some(ZoneSpec::Many(many.iter().map(|z| parse_zone(z)).collect::<Result<_>>()?)),
    };
    let task_id = task_id
        .or(base.map(|o| o.task_id.clone()))
        .unwrap_or_else(|| "carbon_aware".into());

    Ok(OperatorConfig::new(task_id, window, duration, zone)?)
}

fn parse_zone(raw: &str) -> Result<Zone> {
    match raw.split_once(':') {
        Some((provider, region)) if !provider.is_empty() && !region.is_empty() => {
            Ok(Zone::new(provider, region))
        }
        _ => bail!("invalid zone '{raw}', expected provider:region (e.g. aws:us-east-1)"),
    }
}

fn format_wake(task: &carbonaware_scheduler::Task) -> String {
    task.wake_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".into())
}
