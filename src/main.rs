use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lsystem_flora::{PlacementEvent, PlacementSink, PlantError, PlantSpec, Preset};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lsystem-flora", version, about = "Grow plant skeletons from L-System grammars")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the expanded symbol sequence.
    Expand {
        #[command(flatten)]
        target: Target,
    },
    /// Stream placement events as JSON lines.
    Interpret {
        #[command(flatten)]
        target: Target,
        /// Print a skeleton summary instead of individual events.
        #[arg(long)]
        summary: bool,
        /// Ignore the configured delay between events.
        #[arg(long)]
        no_delay: bool,
    },
    /// List the built-in presets.
    Presets,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// TOML plant description.
    #[arg(long)]
    spec: Option<PathBuf>,
    /// Built-in preset name.
    #[arg(long)]
    preset: Option<Preset>,
}

#[derive(Args)]
struct Target {
    #[command(flatten)]
    source: Source,
    /// Seed for stochastic rules, overriding the spec.
    #[arg(long)]
    seed: Option<u64>,
}

impl Target {
    fn load(&self) -> Result<PlantSpec> {
        let mut spec = match (&self.source.spec, self.source.preset) {
            (Some(path), _) => PlantSpec::load(path)
                .with_context(|| format!("load spec {}", path.display()))?,
            (None, Some(preset)) => preset.spec(),
            (None, None) => unreachable!("clap enforces one source"),
        };
        if self.seed.is_some() {
            spec.seed = self.seed;
        }
        Ok(spec)
    }
}

/// Writes each event as one JSON object per line.
struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> PlacementSink for JsonLines<W> {
    fn place(&mut self, event: PlacementEvent) -> Result<(), PlantError> {
        serde_json::to_writer(&mut self.out, &event).map_err(io::Error::from)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr).compact())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Expand { target } => {
            let spec = target.load()?;
            let sequence = spec.expand().context("expand grammar")?;
            info!(symbols = sequence.chars().count(), "expanded");
            println!("{sequence}");
        }
        Command::Interpret {
            target,
            summary,
            no_delay,
        } => {
            let mut spec = target.load()?;
            if no_delay {
                spec.geometry.step_delay_secs = 0.0;
            }
            let sequence = spec.expand().context("expand grammar")?;
            debug!(symbols = sequence.chars().count(), "expanded");
            let interpreter = spec.interpreter().context("configure turtle")?;

            if summary {
                let skeleton = interpreter
                    .build_skeleton(&sequence)
                    .context("interpret sequence")?;
                let bounds = skeleton.bounds();
                println!(
                    "{}",
                    serde_json::json!({
                        "segments": skeleton.segments.len(),
                        "leaves": skeleton.leaves.len(),
                        "blossoms": skeleton.blossoms.len(),
                        "max_level": skeleton.max_level,
                        "total_length": skeleton.total_length(),
                        "bounds": bounds,
                    })
                );
            } else {
                let mut sink = JsonLines {
                    out: BufWriter::new(io::stdout().lock()),
                };
                let placed = interpreter
                    .drive(&sequence, &mut sink)
                    .context("interpret sequence")?;
                info!(placed, "interpretation finished");
            }
        }
        Command::Presets => {
            for preset in Preset::ALL {
                let spec = preset.spec();
                println!(
                    "{:<18} axiom={} depth={} rules={}",
                    preset.name(),
                    spec.axiom,
                    spec.depth,
                    spec.rules.len()
                );
            }
        }
    }
    Ok(())
}
