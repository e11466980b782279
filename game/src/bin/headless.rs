use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

use isotet::agent::{IsoTetGame, RandomAgent};
use isotet::settings::{GameSettings, SettingsStore};
use isotet::tileset::TilesetEvent;
use isotet_engine::HeadlessRunner;
use isotet_engine::profiling::{Profiler, StepTimings};
use isotet_engine::regression::state_sha256_hex;

#[derive(Debug, Parser)]
#[command(name = "isotet-headless")]
#[command(about = "Play a seeded isotet session without a window and report the outcome")]
struct Cli {
    /// Seed for both the piece generator and the random player.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 500)]
    steps: usize,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Settings file; defaults to the usual config location.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the final board snapshot as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print the sha256 digest of the final state.
    #[arg(long, default_value_t = false)]
    digest: bool,

    /// Collect per-step timings and print percentiles.
    #[arg(long, default_value_t = false)]
    profile: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[derive(Debug, Clone, Copy)]
struct Stats {
    n: usize,
    avg: f64,
    p50: f64,
    p95: f64,
    max: f64,
}

impl Stats {
    fn from_samples(xs: &mut [f64]) -> Option<Self> {
        if xs.is_empty() {
            return None;
        }
        xs.sort_by(|a, b| a.total_cmp(b));
        let n = xs.len();
        let percentile = |p: f64| xs[(((n - 1) as f64 * p).round() as usize).min(n - 1)];
        Some(Self {
            n,
            avg: xs.iter().sum::<f64>() / n as f64,
            p50: percentile(0.50),
            p95: percentile(0.95),
            max: xs[n - 1],
        })
    }
}

#[derive(Debug, Default)]
struct StepCollector {
    step: Vec<f64>,
    total: Vec<f64>,
    events: usize,
}

impl Profiler for StepCollector {
    fn on_step(&mut self, _frame: usize, timings: StepTimings) {
        self.step.push(ms(timings.step));
        self.total.push(ms(timings.total));
        self.events += timings.events;
    }
}

fn print_stats(label: &str, xs: &mut [f64]) {
    let Some(s) = Stats::from_samples(xs) else {
        println!("{label:<8} no samples");
        return;
    };
    println!(
        "{label:<8} n={n:<6} avg={avg:>7.3}ms p50={p50:>7.3}ms p95={p95:>7.3}ms max={max:>7.3}ms",
        n = s.n,
        avg = s.avg,
        p50 = s.p50,
        p95 = s.p95,
        max = s.max
    );
}

fn load_settings(cli: &Cli) -> GameSettings {
    let store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::from_env(),
    };
    let mut settings = store.load();
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if let Some(width) = cli.width {
        settings.map_width = width;
    }
    if let Some(height) = cli.height {
        settings.map_height = height;
    }
    settings.sanitized()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = cli.verbose.saturating_add(2).clamp(1, 5);
    let level = Level::from_str(verbosity.to_string().as_str())
        .with_context(|| format!("invalid log verbosity {verbosity}"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();

    let settings = load_settings(&cli);
    info!(
        seed = settings.seed,
        width = settings.map_width,
        height = settings.map_height,
        steps = cli.steps,
        "starting headless session"
    );

    let game = IsoTetGame::new(&settings).context("failed to build the board")?;
    let mut runner = HeadlessRunner::new(game);
    let mut agent = RandomAgent::new(settings.seed);
    let mut collector = StepCollector::default();

    let mut placed = 0usize;
    let mut layers = 0usize;
    for _ in 0..cli.steps {
        let command = agent.next_command();
        if cli.profile {
            runner.step_profiled(command, &mut collector);
        } else {
            runner.step(command);
        }
        for event in runner.drain_events() {
            match event {
                TilesetEvent::Placed { .. } => placed += 1,
                TilesetEvent::LayerCleared { layer } => {
                    layers += 1;
                    info!(layer, "layer cleared");
                }
                TilesetEvent::GameOver => info!(frame = runner.frame(), "game over"),
                TilesetEvent::ScoreChanged { .. } => {}
            }
        }
        if runner.state().is_game_over() {
            break;
        }
    }

    let tileset = runner.state().tileset();
    println!(
        "frames={} score={} placed={} layers_cleared={} game_over={}",
        runner.frame(),
        tileset.score(),
        placed,
        layers,
        tileset.is_game_over()
    );

    if cli.profile {
        println!("(ms) lower is better, {} events", collector.events);
        print_stats("step", &mut collector.step);
        print_stats("engine", &mut collector.total);
    }

    if cli.digest {
        let digest = state_sha256_hex(runner.state()).context("failed to hash final state")?;
        println!("sha256={digest}");
    }

    if cli.json {
        let json = tileset.to_json().context("failed to serialize the board")?;
        println!("{json}");
    }

    Ok(())
}
