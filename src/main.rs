use std::{
    io::{self, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use canopy::{
    report::{self, StepRecord},
    scenario::{ScenarioLoader, WeatherSetting},
    Engine, StepSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Rainforest ecosystem simulator")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/rainforest.yaml")]
    scenario: PathBuf,

    /// Override step count (uses scenario default when omitted)
    #[arg(long)]
    steps: Option<u64>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Pin the weather (random, sunny, rainy, foggy, stormy)
    #[arg(long)]
    weather: Option<WeatherSetting>,

    /// Pause between steps in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Output format for per-step records
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    init_tracing(&scenario.logging.level);

    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    if let Some(weather) = cli.weather {
        scenario.clock.weather = weather;
    }
    let steps = scenario.steps(cli.steps);
    let pacing = Duration::from_millis(cli.pacing_ms.unwrap_or(scenario.pacing_ms));

    info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        steps,
        "starting run"
    );
    let mut engine = Engine::from_scenario(&scenario);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.format == OutputFormat::Csv {
        writeln!(out, "{}", report::csv_header())?;
    }

    let mut write_error = None;
    let summary = engine.run_with_hook(steps, |summary, _| {
        if write_error.is_some() {
            return;
        }
        let written = write_record(&mut out, cli.format, summary).and_then(|()| {
            if !pacing.is_zero() {
                out.flush()?;
                thread::sleep(pacing);
            }
            Ok(())
        });
        if let Err(err) = written {
            write_error = Some(err);
        }
    });
    if let Some(err) = write_error {
        return Err(err);
    }
    out.flush()?;

    let census = engine.world().census();
    info!(
        scenario = %scenario.name,
        steps_run = summary.steps_run,
        stopped_early = summary.stopped_early,
        survivors = census.total(),
        species = census.living_species(),
        "run finished"
    );
    Ok(())
}

fn write_record(out: &mut impl Write, format: OutputFormat, summary: &StepSummary) -> Result<()> {
    match format {
        OutputFormat::Csv => writeln!(out, "{}", report::csv_row(summary))?,
        OutputFormat::Json => {
            let line = StepRecord::from_summary(summary)
                .to_json()
                .context("Failed to encode step record")?;
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
