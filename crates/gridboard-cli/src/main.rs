//! Control board bootstrap.
//!
//! Opens the serial link to the relay, runs the control loop on the main
//! thread and a panel refresh loop on a second thread. The game-server
//! client and the knob drivers are replaced by the mocks seeded from the
//! `[demo]` table of the configuration file.

mod demo;

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use gridboard_control::{Board, DisplayModel, SharedState};
use gridboard_core::BoardConfig;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::demo::DemoConfig;

/// Serial read timeout; bounds the control loop period.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// How often the mock server data is re-read, like a server poll.
const REMOTE_REFRESH: Duration = Duration::from_secs(1);

const STATS_INTERVAL: Duration = Duration::from_secs(30);

const PANEL_REFRESH: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "gridboard", about = "Exhibit control board for the relay link")]
struct Cli {
    /// Serial device connected to the relay station.
    #[arg(long, env = "GRIDBOARD_PORT")]
    port: String,

    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Board configuration (TOML). Defaults apply when omitted.
    #[arg(long, env = "GRIDBOARD_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let (config, demo) = match &cli.config {
        Some(path) => (
            BoardConfig::from_path(path)
                .with_context(|| format!("loading board config {}", path.display()))?,
            DemoConfig::from_path(path)?,
        ),
        None => (BoardConfig::default(), DemoConfig::default()),
    };

    let remote = demo.remote();
    let analog = demo.analog(&config);
    let blink_interval = config.blink_interval();

    let mut board = Board::new(config).context("invalid board config")?;
    spawn_panel(board.shared(), blink_interval)?;

    let mut port = serialport::new(&cli.port, cli.baud)
        .timeout(READ_TIMEOUT)
        .open()
        .with_context(|| format!("opening serial port {}", cli.port))?;
    info!(port = %cli.port, baud = cli.baud, "serial link open");

    let mut buf = [0u8; 256];
    let mut last_refresh: Option<Instant> = None;
    let mut last_stats = Instant::now();

    loop {
        match port.read(&mut buf) {
            Ok(n) => {
                board.on_bytes(&buf[..n], Instant::now());
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e).context("serial read failed"),
        }

        if last_refresh.is_none_or(|at| at.elapsed() >= REMOTE_REFRESH) {
            board.refresh_remote(&remote);
            last_refresh = Some(Instant::now());
        }
        board.sample_inputs(&analog);
        board.tick(Instant::now(), &mut port);

        if last_stats.elapsed() >= STATS_INTERVAL {
            let production = board.production_report();
            info!(
                stats = %board.decoder_stats(),
                production = production.total_production,
                consumption = production.total_consumption,
                "link statistics"
            );
            last_stats = Instant::now();
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

/// Panel refresh loop. Only reads the shared atomics; the hardware writes
/// are stood in for by debug logs.
fn spawn_panel(shared: Arc<SharedState>, blink_interval: Duration) -> Result<()> {
    thread::Builder::new()
        .name("panel".to_string())
        .spawn(move || {
            let mut model = DisplayModel::new(blink_interval);
            loop {
                let snapshot = model.snapshot(&shared, Instant::now());
                for channel in snapshot.channels.iter().filter(|c| c.enabled) {
                    debug!(
                        kind = %channel.kind,
                        power = channel.power,
                        bargraph = channel.bargraph,
                        "panel channel"
                    );
                }
                debug!(
                    production = ?snapshot.production,
                    consumption = ?snapshot.consumption,
                    link = snapshot.link_connected,
                    "panel aggregates"
                );
                thread::sleep(PANEL_REFRESH);
            }
        })
        .context("spawning panel thread")?;
    Ok(())
}
