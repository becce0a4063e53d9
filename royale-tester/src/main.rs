mod assets;
mod reports;
mod seeds;
mod simulation;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use royale_engine::MatchReport;
use std::io::Write;
use std::path::PathBuf;

use assets::{AssetPaths, TesterAssets};
use reports::ReportFormat;
use seeds::{expand_iterations, resolve_seeds, split_csv};
use simulation::{BatchSummary, run_and_summarize};

#[derive(Debug, Parser)]
#[command(name = "royale-tester", version = "0.1.0")]
#[command(about = "Batch simulation and balance QA for the royale engine")]
struct Args {
    /// Roster JSON file (defaults to the embedded fixture)
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Item catalog JSON file (defaults to the embedded fixture)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Flavor template JSON file (defaults to the embedded fixture)
    #[arg(long)]
    flavor: Option<PathBuf>,

    /// Ruleset JSON file (defaults to the embedded fixture)
    #[arg(long)]
    ruleset: Option<PathBuf>,

    /// Seeds to run (comma-separated, decimal, 0x-hex or `random`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Matches per seed; each iteration uses the next consecutive seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Phase cap per match (0 uses the engine default)
    #[arg(long, default_value_t = 0)]
    max_phases: u32,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Include full match transcripts in the report
    #[arg(long)]
    transcript: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.report == ReportFormat::Console {
        announce_banner();
    }

    let assets = TesterAssets::load(&asset_paths(&args)).context("loading match inputs")?;
    let base_seeds = resolve_seeds(&split_csv(&args.seeds))?;
    let match_seeds = expand_iterations(&base_seeds, args.iterations);
    log::debug!(
        "running {} matches for {} actors",
        match_seeds.len(),
        assets.roster_size()
    );

    let (reports, summary) =
        run_and_summarize(&assets, &match_seeds, args.max_phases, args.verbose)?;
    write_reports(&args, &summary, &reports)?;

    if summary.capped > 0 {
        log::warn!("{} matches stopped at the phase cap", summary.capped);
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "⚔️  Royale Batch Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn asset_paths(args: &Args) -> AssetPaths {
    AssetPaths {
        roster: args.roster.clone(),
        catalog: args.catalog.clone(),
        flavor: args.flavor.clone(),
        ruleset: args.ruleset.clone(),
    }
}

fn write_reports(args: &Args, summary: &BatchSummary, reports: &[MatchReport]) -> Result<()> {
    let mut out = reports::open_output(args.output.as_deref())?;
    reports::write_batch(out.as_mut(), args.report, summary, reports, args.transcript)?;
    out.flush()?;
    Ok(())
}
