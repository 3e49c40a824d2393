use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pixel_world::{SimulationConfig, SpeciesSummary, World};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pixel-world")]
#[command(about = "Headless pixel creature simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Advance independent worlds and report the most populous species.
    Run {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 1000)]
        ticks: u64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 1)]
        trials: u64,
        #[arg(long, default_value_t = 5)]
        top: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Debug, Serialize)]
struct TrialReport {
    seed: u64,
    time: u64,
    population: usize,
    victim_units: u64,
    species: usize,
    top_species: Vec<SpeciesSummary>,
}

fn run_trial(config: SimulationConfig, seed: u64, ticks: u64, top: usize) -> Result<TrialReport> {
    let mut world = World::spawn(config, seed)?;
    for _ in 0..ticks {
        world
            .update()
            .with_context(|| format!("tick {} failed (seed {seed})", world.time()))?;
    }
    world.check_invariants()?;

    Ok(TrialReport {
        seed,
        time: world.time(),
        population: world.organism_count(),
        victim_units: world.victims().unit_count(),
        species: world.species_counts().len(),
        top_species: world
            .top_species(top)
            .iter()
            .map(|entry| entry.summary())
            .collect(),
    })
}

fn print_pretty(report: &TrialReport) {
    println!(
        "seed {}: t={} population={} victims={} species={}",
        report.seed, report.time, report.population, report.victim_units, report.species
    );
    for (rank, summary) in report.top_species.iter().enumerate() {
        println!(
            "  #{} count={} generation={} mass={} cells={}",
            rank + 1,
            summary.count,
            summary.generation,
            summary.mass,
            summary.body.len()
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            ticks,
            seed,
            trials,
            top,
            format,
        } => {
            let config = match config {
                Some(path) => SimulationConfig::from_json_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SimulationConfig::from_env(),
            };

            let started = Instant::now();
            let reports: Vec<TrialReport> = (0..trials)
                .into_par_iter()
                .map(|trial| run_trial(config.clone(), seed.wrapping_add(trial), ticks, top))
                .collect::<Result<_>>()?;
            info!(
                trials,
                ticks,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "simulation finished"
            );

            match format {
                OutputFormat::Pretty => reports.iter().for_each(print_pretty),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
            }
        }
    }
    Ok(())
}
