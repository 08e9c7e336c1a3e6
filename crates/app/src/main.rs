use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use sortscope_core::{ScopeConfig, ScopeError, Visualizer};
use tracing_subscriber::EnvFilter;

mod demo;

use demo::Algorithm;

fn main() -> sortscope_core::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScopeConfig::from_path(path)?,
        None => ScopeConfig::default(),
    };
    init_tracing(&config);

    match cli.command {
        Commands::Play {
            trace,
            headless,
            no_hold,
        } => run_play(config, &trace, headless, !no_hold),
        Commands::Tones { values, output } => run_tones(config, &values, &output),
        Commands::Demo {
            algorithm,
            len,
            seed,
            headless,
            no_hold,
        } => run_demo(config, algorithm, len, seed, headless, !no_hold),
    }
}

fn run_play(config: ScopeConfig, trace: &Path, headless: bool, hold: bool) -> sortscope_core::Result<()> {
    tracing::info!(?trace, headless, "replaying trace");

    let frames = read_trace(trace)?;
    let mut vis = open(config, headless)?;

    for frame in &frames {
        vis.update(&frame.values, frame.invert, frame.inverse_delta);
    }

    // Nothing can close a headless surface, so holding it would never return.
    let hold = hold && !headless;
    vis.release(frames.last().map(|frame| frame.values.as_slice()), true, hold);
    tracing::info!(
        iterations = vis.session().iterations(),
        redraws = vis.session().redraws(),
        finish_time = ?vis.finish_time(),
        "trace finished"
    );
    Ok(())
}

fn run_demo(
    mut config: ScopeConfig,
    algorithm: Algorithm,
    len: usize,
    seed: Option<u64>,
    headless: bool,
    hold: bool,
) -> sortscope_core::Result<()> {
    if config.caption == ScopeConfig::default().caption {
        config.caption = algorithm.title().to_string();
    }
    config.algorithm_name.get_or_insert_with(|| algorithm.title().to_string());
    tracing::info!(?algorithm, len, seed, "running demo");

    let mut values = demo::random_values(len, DEMO_LOW, DEMO_HIGH, seed);
    let mut vis = open(config, headless)?;
    vis.preprocess(&values)?;

    algorithm.run(&mut values, |snapshot, backward| {
        vis.update(snapshot, false, backward);
    });

    let hold = hold && !headless;
    vis.release(Some(values.as_slice()), true, hold);
    tracing::info!(finish_time = ?vis.finish_time(), "array sorted");
    Ok(())
}

fn run_tones(config: ScopeConfig, values: &[u32], output: &Path) -> sortscope_core::Result<()> {
    tracing::info!(count = values.len(), ?output, "rendering tones");
    fs::create_dir_all(output)?;

    let mut vis = Visualizer::headless(config)?;
    for (value, tone) in vis.preprocess(values)? {
        let path = output.join(format!("{value}.pcm"));
        fs::write(&path, tone)?;
        tracing::debug!(?path, bytes = tone.len(), "tone written");
    }
    vis.release(None, false, false);
    Ok(())
}

#[cfg(feature = "native")]
fn open(config: ScopeConfig, headless: bool) -> sortscope_core::Result<Visualizer> {
    if headless {
        Visualizer::headless(config)
    } else {
        Visualizer::open(config)
    }
}

#[cfg(not(feature = "native"))]
fn open(config: ScopeConfig, headless: bool) -> sortscope_core::Result<Visualizer> {
    if !headless {
        tracing::warn!("built without the `native` feature, running headless");
    }
    Visualizer::headless(config)
}

/// Range of the random values sorted by `demo`, in Hz.
const DEMO_LOW: u32 = 110;
const DEMO_HIGH: u32 = 440;

/// One line of a trace file: either a bare array or an object carrying the
/// per-update drawing flags.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceLine {
    Values(Vec<u32>),
    Frame(Frame),
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    invert: bool,
    #[serde(default)]
    inverse_delta: bool,
    values: Vec<u32>,
}

impl From<TraceLine> for Frame {
    fn from(line: TraceLine) -> Self {
        match line {
            TraceLine::Values(values) => Frame {
                invert: false,
                inverse_delta: false,
                values,
            },
            TraceLine::Frame(frame) => frame,
        }
    }
}

fn read_trace(path: &Path) -> sortscope_core::Result<Vec<Frame>> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: TraceLine = serde_json::from_str(&line).map_err(|err| {
            ScopeError::msg(format!("{}:{}: {err}", path.display(), number + 1))
        })?;
        frames.push(parsed.into());
    }
    tracing::debug!(frames = frames.len(), "trace loaded");
    Ok(frames)
}

fn init_tracing(config: &ScopeConfig) {
    let (level, _) = config.resolve_log_level();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive())),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Bar-chart animation and sonification of sorting traces", long_about = None)]
struct Cli {
    /// JSON file with display and audio settings.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Animate a JSON-lines trace of array snapshots.
    Play {
        /// One snapshot per line, either `[..]` or `{"values": [..], ...}`.
        trace: PathBuf,
        /// Draw into memory instead of opening a window.
        #[arg(long)]
        headless: bool,
        /// Release as soon as the final pass is drawn.
        #[arg(long)]
        no_hold: bool,
    },
    /// Synthesize the tone for each value and write it as raw PCM.
    Tones {
        /// Frequencies in Hz.
        #[arg(required = true)]
        values: Vec<u32>,
        /// Directory receiving one `<value>.pcm` per value.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Sort a random array with a built-in algorithm and animate every pass.
    Demo {
        #[arg(value_enum)]
        algorithm: Algorithm,
        /// Number of elements to sort.
        #[arg(long, default_value_t = 100)]
        len: usize,
        /// Seed for a reproducible array.
        #[arg(long)]
        seed: Option<u64>,
        /// Draw into memory instead of opening a window.
        #[arg(long)]
        headless: bool,
        /// Release as soon as the final pass is drawn.
        #[arg(long)]
        no_hold: bool,
    },
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_both_trace_line_shapes() {
        let dir = std::env::temp_dir().join(format!("sortscope-trace-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trace.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "[3, 1, 2]").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"invert": true, "values": [1, 2, 3]}}"#).unwrap();
        drop(file);

        let frames = read_trace(&path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].values, vec![3, 1, 2]);
        assert!(!frames[0].invert);
        assert!(frames[1].invert);
        assert!(!frames[1].inverse_delta);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reports_the_offending_line() {
        let dir = std::env::temp_dir().join(format!("sortscope-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trace.jsonl");
        fs::write(&path, "[1, 2]\n[1, \"x\"]\n").unwrap();

        let err = read_trace(&path).unwrap_err().to_string();
        assert!(err.contains("trace.jsonl:2:"), "{err}");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cli_accepts_global_config() {
        let cli = Cli::try_parse_from(["sortscope", "play", "t.jsonl", "--headless", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(cli.command, Commands::Play { headless: true, no_hold: false, .. }));
    }

    #[test]
    fn cli_parses_demo_algorithm() {
        let cli = Cli::try_parse_from(["sortscope", "demo", "cocktail", "--len", "20", "--seed", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Demo { algorithm: Algorithm::Cocktail, len: 20, seed: Some(3), .. }
        ));
    }

    #[test]
    fn headless_demo_sorts_and_releases() {
        let config = ScopeConfig {
            frame_rate: 1000,
            ..Default::default()
        };
        run_demo(config, Algorithm::Insertion, 16, Some(1), true, true).unwrap();
    }
}
