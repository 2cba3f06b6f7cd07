//! Framesift: trust-level frame selection from MD trajectories.
//!
//! Provides one subcommand per operator task:
//!
//! - `select`  -- classify, select a bounded candidate set, assemble and
//!   persist the output dataset
//! - `report`  -- classify and aggregate only, print the exploration report
//! - `inspect` -- print column statistics of one model-deviation file

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use framesift::conf::ConfFormat;
use framesift::config::{SelectConfig, SiftConfig, TrustLevel};
use framesift::devi::ModelDevi;
use framesift::report::ExplorationReport;
use framesift::select::{ConfFilters, FrameSelector, MinDistanceFilter, TrajSource};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Framesift: trust-level frame selection from MD trajectories.
#[derive(Parser)]
#[command(name = "framesift", version, about)]
struct Cli {
    /// Path to a JSON configuration file (flags override its values).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Input sources shared by `select` and `report`.
#[derive(Args)]
struct InputArgs {
    /// Trajectory file, one per trajectory (repeatable).
    #[arg(long = "traj", required = true)]
    trajs: Vec<PathBuf>,

    /// Model-deviation file, one per trajectory, same order (repeatable).
    #[arg(long = "devi", required = true)]
    devis: Vec<PathBuf>,

    /// Trajectory file format ("lammps/dump" or "xyz").
    #[arg(long, default_value = "lammps/dump")]
    fmt: String,

    /// Species names shared by all trajectories, e.g. "O,H".
    #[arg(long, value_delimiter = ',', required = true)]
    type_map: Vec<String>,
}

/// Trust-level overrides shared by `select` and `report`.
#[derive(Args)]
struct TrustArgs {
    /// Lower force-deviation threshold.
    #[arg(long)]
    force_lo: Option<f64>,

    /// Upper force-deviation threshold.
    #[arg(long)]
    force_hi: Option<f64>,

    /// Lower virial-deviation threshold (needs --virial-hi).
    #[arg(long)]
    virial_lo: Option<f64>,

    /// Upper virial-deviation threshold (needs --virial-lo).
    #[arg(long)]
    virial_hi: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify, select a bounded candidate set, and persist it.
    Select {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        trust: TrustArgs,

        /// Output directory for the assembled dataset.
        #[arg(long, default_value = "confs")]
        out: PathBuf,

        /// Cap on the number of selected candidates.
        #[arg(long)]
        max_sel: Option<i64>,

        /// Seed for the bounded subsampling draw.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Drop selected frames with interatomic distances below this value.
        #[arg(long)]
        min_dist: Option<f64>,
    },

    /// Classify and aggregate only; print the exploration report.
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        trust: TrustArgs,
    },

    /// Print column statistics of a model-deviation file.
    Inspect {
        /// Path to the model-deviation file.
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load or create configuration.
    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str::<SiftConfig>(&text)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        }
        None => SiftConfig::default(),
    };

    match cli.command {
        Commands::Select {
            input,
            trust,
            out,
            max_sel,
            seed,
            min_dist,
        } => cmd_select(&config, &input, &trust, &out, max_sel, seed, min_dist),
        Commands::Report { input, trust } => cmd_report(&config, &input, &trust),
        Commands::Inspect { path } => cmd_inspect(&path),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_select(
    config: &SiftConfig,
    input: &InputArgs,
    trust: &TrustArgs,
    out: &PathBuf,
    max_sel: Option<i64>,
    seed: u64,
    min_dist: Option<f64>,
) -> Result<()> {
    let trust = merge_trust(&config.trust, trust)?;
    let select = merge_select(&config.select, max_sel, seed)?;
    let sources = build_sources(input)?;

    tracing::info!(
        trajs = sources.len(),
        max_sel = ?select.max_sel,
        seed = select.seed,
        "starting selection run"
    );

    let mut selector = FrameSelector::new(trust, select);
    if let Some(d) = min_dist {
        selector = selector.with_filters(ConfFilters::new().with(MinDistanceFilter::new(d)));
    }

    let (out_path, report) = selector.select(&sources, &input.type_map, out)?;

    print_report(&report);
    println!("Selected configurations written to {}", out_path.display());
    Ok(())
}

fn cmd_report(config: &SiftConfig, input: &InputArgs, trust: &TrustArgs) -> Result<()> {
    let trust = merge_trust(&config.trust, trust)?;
    let sources = build_sources(input)?;

    let selector = FrameSelector::new(trust, config.select.clone());
    let report = selector.survey(&sources, &input.type_map)?;

    println!("Per-trajectory breakdown:");
    for tr in report.traj_reports() {
        let c = tr.counts();
        println!(
            "  traj {:>4}: {:>6} frames  accurate {:>6}  candidate {:>6}  failed {:>6}",
            tr.traj_index(),
            tr.nframes(),
            c.accurate,
            c.candidate,
            c.failed
        );
    }
    println!();
    print_report(&report);
    Ok(())
}

fn cmd_inspect(path: &PathBuf) -> Result<()> {
    let devi = ModelDevi::load(path)?;

    println!("Model deviations: {}", path.display());
    println!("  Frames: {}", devi.nframes());
    print_stats("max_devi_f", &devi.force_max);
    print_stats("max_devi_v", &devi.virial_max);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Pair up trajectory and deviation paths into explicit per-trajectory
/// handles, refusing mismatched list lengths.
fn build_sources(input: &InputArgs) -> Result<Vec<TrajSource>> {
    if input.trajs.len() != input.devis.len() {
        bail!(
            "got {} trajectories but {} deviation files",
            input.trajs.len(),
            input.devis.len()
        );
    }
    let fmt = ConfFormat::from_str(&input.fmt)?;
    Ok(input
        .trajs
        .iter()
        .zip(&input.devis)
        .map(|(conf, devi)| TrajSource {
            conf: conf.clone(),
            fmt,
            devi: devi.clone(),
        })
        .collect())
}

fn merge_trust(base: &TrustLevel, args: &TrustArgs) -> Result<TrustLevel> {
    Ok(TrustLevel::new(
        args.force_lo.unwrap_or(base.force_lo),
        args.force_hi.unwrap_or(base.force_hi),
        args.virial_lo.or(base.virial_lo),
        args.virial_hi.or(base.virial_hi),
    )?)
}

fn merge_select(base: &SelectConfig, max_sel: Option<i64>, seed: u64) -> Result<SelectConfig> {
    let merged = SelectConfig::new(max_sel, seed)?;
    Ok(SelectConfig {
        max_sel: merged.max_sel.or(base.max_sel),
        seed: merged.seed,
    })
}

fn print_report(report: &ExplorationReport) {
    let totals = report.totals();
    println!("Exploration report:");
    println!("  Trajectories: {}", totals.trajs);
    println!("  Frames:       {}", totals.frames);
    println!(
        "  Accurate:     {:>6}  ({:.1}%)",
        totals.accurate,
        totals.accurate_ratio() * 100.0
    );
    println!(
        "  Candidate:    {:>6}  ({:.1}%)",
        totals.candidate,
        totals.candidate_ratio() * 100.0
    );
    println!(
        "  Failed:       {:>6}  ({:.1}%)",
        totals.failed,
        totals.failed_ratio() * 100.0
    );
}

fn print_stats(name: &str, values: &[f64]) {
    if values.is_empty() {
        println!("  {name}: no data");
        return;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    println!("  {name}: min {min:.6}  max {max:.6}  mean {mean:.6}");
}
