use anyhow::{Context, anyhow};
use clap::Parser;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use weather_station::config::DEFAULT_LOG_FILE;
use weather_station::sample_buffer::DEFAULT_CAPACITY;
use weather_station::stats::SnapshotSummary;
use weather_station::{
    DurableLogger, RandomWalk, SampleBuffer, SampleGenerator, StationConfig, StopSignal,
    describe_trend,
};

#[derive(Parser, Debug)]
#[command(version, about = "Simulated weather station", long_about = None)]
struct Args {
    /// CSV file readings are appended to
    #[arg(short = 'o', long, default_value = DEFAULT_LOG_FILE)]
    log_path: PathBuf,

    /// Number of readings kept in memory
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Milliseconds between generated readings
    #[arg(long, default_value_t = 1000)]
    sample_ms: u64,

    /// Milliseconds between durable log writes
    #[arg(long, default_value_t = 5000)]
    log_ms: u64,

    /// Milliseconds between console refreshes
    #[arg(long, default_value_t = 1000)]
    refresh_ms: u64,

    /// Stop after this many seconds
    #[arg(long)]
    run_for: Option<u64>,
}

impl From<Args> for StationConfig {
    fn from(args: Args) -> Self {
        Self {
            log_path: args.log_path,
            capacity: args.capacity,
            sample_period: Duration::from_millis(args.sample_ms),
            log_period: Duration::from_millis(args.log_ms),
            refresh_period: Duration::from_millis(args.refresh_ms),
            run_for: args.run_for.map(Duration::from_secs),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StationConfig::from(Args::parse());
    config.validate().context("invalid configuration")?;

    let stop = StopSignal::new();
    stop.listen_for_termination()
        .context("failed to register signal handlers")?;

    let logger = DurableLogger::open(&config.log_path).context("failed to prepare durable log")?;
    let buffer = SampleBuffer::new(config.capacity);

    thread::scope(|scope| -> anyhow::Result<()> {
        let generator = thread::Builder::new()
            .name("generator".into())
            .spawn_scoped(scope, || {
                SampleGenerator::new(RandomWalk::from_entropy(), config.sample_period)
                    .run(&buffer, &stop)
            })
            .context("failed to start generator thread")?;

        let logging = thread::Builder::new()
            .name("logger".into())
            .spawn_scoped(scope, || {
                let result = logger.run(&buffer, &stop, config.log_period);
                if result.is_err() {
                    stop.set();
                }
                result
            })
            .inspect_err(|_| stop.set())
            .context("failed to start logger thread")?;

        display_loop(&buffer, &stop, &config);
        stop.set();

        let produced = generator
            .join()
            .map_err(|_| anyhow!("generator thread panicked"))?;
        let written = logging
            .join()
            .map_err(|_| anyhow!("logger thread panicked"))?
            .context("durable logging failed")?;

        info!(produced, written, "station stopped");
        Ok(())
    })
}

// Console stand-in for the chart: trend sentence plus per-quantity summary.
fn display_loop(buffer: &SampleBuffer, stop: &StopSignal, config: &StationConfig) {
    // A run time past the clock's range means no deadline at all.
    let deadline = config
        .run_for
        .and_then(|run_for| Instant::now().checked_add(run_for));

    info!("starting display update loop");
    loop {
        let history = buffer.snapshot();
        match SnapshotSummary::of(&history) {
            Some(summary) => info!(
                samples = history.len(),
                temperature = %summary.temperature,
                humidity = %summary.humidity,
                pressure = %summary.pressure,
                "{}",
                describe_trend(&history)
            ),
            None => info!("waiting for data"),
        }

        let mut wait = config.refresh_period;
        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                info!("run time elapsed");
                stop.set();
                break;
            }
            wait = wait.min(remaining);
        }

        if stop.wait_timeout(wait) {
            break;
        }
    }
    info!("stopping display update loop");
}
