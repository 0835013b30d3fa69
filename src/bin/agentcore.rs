//! agentcore — the tick-driven cognitive core.
//!
//! Usage:
//!   agentcore                        → run the tick loop until Ctrl-C
//!   agentcore --config core.json     → load RuntimeConfig from a file
//!   agentcore --tick-hz 4            → CLI flags override the file

use agentcore::runtime::{CoreLoop, RuntimeConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "agentcore",
    about = "Tick-driven layered processing core for a long-lived agent",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// RuntimeConfig JSON document; CLI flags below override its contents.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to roll daily log files into; stderr-only when unset.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory holding the recipient registry snapshot and other on-disk state.
    #[arg(long, default_value = "./agentcore-state")]
    state_dir: PathBuf,

    /// Exit non-zero if the recipient snapshot exists but can't be read.
    #[arg(long, default_value_t = false)]
    strict: bool,

    #[arg(long)]
    tick_hz: Option<f64>,

    #[arg(long)]
    queue_max_age_ms: Option<i64>,
    #[arg(long)]
    queue_emergency_threshold: Option<usize>,

    #[arg(long, num_args = 3, value_names = ["WARN_MS", "DEGRADED_MS", "CRITICAL_MS"])]
    stress_lag_thresholds_ms: Option<Vec<f64>>,
    #[arg(long, num_args = 3, value_names = ["WARN_PCT", "DEGRADED_PCT", "CRITICAL_PCT"])]
    stress_cpu_thresholds_pct: Option<Vec<f64>>,
    #[arg(long)]
    stress_recovery_delay_ms: Option<u64>,

    #[arg(long)]
    wake_contact_pressure_threshold: Option<f64>,
    #[arg(long)]
    wake_social_debt_threshold: Option<f64>,
    #[arg(long)]
    wake_low_energy_multiplier: Option<f64>,
    #[arg(long)]
    wake_low_energy_level: Option<f64>,
    #[arg(long)]
    wake_ack_override_delta: Option<f64>,

    #[arg(long)]
    max_fires_per_tick: Option<u32>,

    #[arg(long)]
    plugin_max_schedules: Option<u32>,
    #[arg(long)]
    plugin_max_storage_mb: Option<f64>,
    #[arg(long)]
    plugin_signals_per_minute: Option<u32>,

    #[arg(long)]
    primary_recipient_id: Option<String>,
}

fn apply_overrides(mut config: RuntimeConfig, cli: &Cli) -> RuntimeConfig {
    if let Some(hz) = cli.tick_hz {
        config.tick.hz = hz;
    }
    if let Some(max_age_ms) = cli.queue_max_age_ms {
        config.queue.prune.max_age_ms = max_age_ms;
    }
    if let Some(threshold) = cli.queue_emergency_threshold {
        config.queue.prune.emergency_threshold = Some(threshold);
    }
    if let Some(triple) = &cli.stress_lag_thresholds_ms {
        config.stress.lag_thresholds_ms = [triple[0], triple[1], triple[2]];
    }
    if let Some(triple) = &cli.stress_cpu_thresholds_pct {
        config.stress.cpu_thresholds_pct = [triple[0], triple[1], triple[2]];
    }
    if let Some(delay) = cli.stress_recovery_delay_ms {
        config.stress.recovery_delay_ms = delay;
    }
    if let Some(v) = cli.wake_contact_pressure_threshold {
        config.wake.contact_pressure_threshold = v;
    }
    if let Some(v) = cli.wake_social_debt_threshold {
        config.wake.social_debt_threshold = v;
    }
    if let Some(v) = cli.wake_low_energy_multiplier {
        config.wake.low_energy_multiplier = v;
    }
    if let Some(v) = cli.wake_low_energy_level {
        config.wake.low_energy_level = v;
    }
    if let Some(v) = cli.wake_ack_override_delta {
        config.wake.ack_override_delta = v;
    }
    if let Some(v) = cli.max_fires_per_tick {
        config.scheduler.max_fires_per_tick = v;
    }
    if let Some(v) = cli.plugin_max_schedules {
        config.plugins.max_schedules = v;
    }
    if let Some(v) = cli.plugin_max_storage_mb {
        config.plugins.max_storage_mb = v;
    }
    if let Some(v) = cli.plugin_signals_per_minute {
        config.plugins.signals_per_minute = v;
    }
    if cli.primary_recipient_id.is_some() {
        config.recipients.primary_recipient_id = cli.primary_recipient_id.clone();
    }
    config
}

fn init_tracing(log_dir: Option<&PathBuf>, log_level: &str) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = format!("agentcore={log_level}");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.as_str().into());
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agentcore.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).json())
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_ref(), &cli.log_level);

    let config = match RuntimeConfig::load(cli.config.as_deref()) {
        Ok(config) => apply_overrides(config, &cli),
        Err(err) => {
            tracing::error!(%err, "failed to load runtime config");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = std::fs::create_dir_all(&cli.state_dir) {
        tracing::error!(%err, dir = %cli.state_dir.display(), "failed to create state directory");
        return ExitCode::FAILURE;
    }
    let recipient_snapshot_path = cli.state_dir.join("recipients.json");
    if cli.strict && recipient_snapshot_path.exists() {
        if let Err(err) = std::fs::read_to_string(&recipient_snapshot_path) {
            tracing::error!(%err, "recipient snapshot unreadable under --strict");
            return ExitCode::FAILURE;
        }
    }
    let plugin_snapshot_path = cli.state_dir.join("plugin-state.json");

    let cancel = CancellationToken::new();
    let mut core = CoreLoop::new(config.clone(), recipient_snapshot_path, plugin_snapshot_path, cancel.clone()).await;

    let tick_period = std::time::Duration::from_secs_f64(1.0 / config.tick.hz.max(0.001));
    let mut ticker = tokio::time::interval(tick_period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(hz = config.tick.hz, "agentcore starting tick loop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                core.tick().await;
            }
        }
    }

    cancel.cancel();
    if let Err(err) = core.shutdown().await {
        tracing::error!(%err, "failed to flush recipient registry on shutdown");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
