use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use royale_engine::MatchReport;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::Path;

use crate::simulation::BatchSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Machine-readable summary (plus transcripts when requested)
    Json,
    /// Markdown tables
    Markdown,
}

/// Buffered destination for a batch report: the given file, or stdout.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(stdout()))),
    }
}

/// Render the batch in `format`, with per-match transcripts when requested.
pub fn write_batch(
    out: &mut dyn Write,
    format: ReportFormat,
    summary: &BatchSummary,
    reports: &[MatchReport],
    transcripts: bool,
) -> Result<()> {
    match format {
        ReportFormat::Console => generate_console_report(out, summary, reports, transcripts),
        ReportFormat::Json => generate_json_report(out, summary, reports, transcripts),
        ReportFormat::Markdown => generate_markdown_report(out, summary, reports, transcripts),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a BatchSummary,
    matches: Vec<&'a MatchReport>,
}

fn ranked(summary: &BatchSummary) -> Vec<(&String, &crate::simulation::ActorTally)> {
    let mut actors: Vec<_> = summary.actors.iter().collect();
    actors.sort_by(|a, b| b.1.wins.cmp(&a.1.wins).then_with(|| b.1.kills.cmp(&a.1.kills)));
    actors
}

pub fn generate_console_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    reports: &[MatchReport],
    transcripts: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Match Batch Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;
    writeln!(out, "Ruleset: {}", summary.ruleset_id)?;
    writeln!(out, "Matches: {}", summary.matches)?;
    writeln!(out, "Finished: {}", summary.finished.to_string().green())?;
    writeln!(out, "Capped: {}", summary.capped.to_string().yellow())?;
    writeln!(out, "No survivor: {}", summary.no_survivor.to_string().red())?;
    writeln!(
        out,
        "Average: {:.1} phases, {:.1} days, {:.1} kills",
        summary.average_phases, summary.average_days, summary.average_kills
    )?;
    writeln!(out, "Elapsed: {:?}", summary.elapsed)?;
    writeln!(out)?;

    if !summary.causes.is_empty() {
        writeln!(out, "{}", "☠️  Casualty causes".bright_yellow().bold())?;
        for (cause, count) in &summary.causes {
            writeln!(out, "   {cause:15} {count}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", "🏆 Leaderboard".bright_yellow().bold())?;
    for (id, tally) in ranked(summary) {
        writeln!(
            out,
            "   {:20} wins {:>4} ({:>5.1}%)  kills {:>4}  avg place {:.2}",
            format!("{} ({id})", tally.name).bold(),
            tally.wins,
            summary.win_rate(id) * 100.0,
            tally.kills,
            tally.average_placement
        )?;
    }

    if transcripts {
        for report in reports {
            writeln!(out)?;
            writeln!(out, "{}", format!("📜 Seed {}", report.seed).bright_cyan())?;
            for line in &report.transcript {
                writeln!(out, "   {line}")?;
            }
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    reports: &[MatchReport],
    transcripts: bool,
) -> Result<()> {
    let matches = if transcripts {
        reports.iter().collect()
    } else {
        Vec::new()
    };
    let json_output = serde_json::to_string_pretty(&JsonReport { summary, matches })?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    reports: &[MatchReport],
    transcripts: bool,
) -> Result<()> {
    writeln!(out, "# Royale Match Batch Results\n")?;

    if summary.matches == 0 {
        writeln!(out, "_No matches executed._")?;
        return Ok(());
    }

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Ruleset**: {}", summary.ruleset_id)?;
    writeln!(out, "- **Matches**: {}", summary.matches)?;
    writeln!(out, "- **Finished**: {}", summary.finished)?;
    writeln!(out, "- **Capped**: {}", summary.capped)?;
    writeln!(out, "- **Average phases**: {:.1}", summary.average_phases)?;
    writeln!(out, "- **Average kills**: {:.1}\n", summary.average_kills)?;

    writeln!(out, "## Leaderboard\n")?;
    writeln!(out, "| Actor | Wins | Win rate | Kills | Avg placement |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for (id, tally) in ranked(summary) {
        writeln!(
            out,
            "| {} | {} | {:.1}% | {} | {:.2} |",
            tally.name,
            tally.wins,
            summary.win_rate(id) * 100.0,
            tally.kills,
            tally.average_placement
        )?;
    }

    if !summary.causes.is_empty() {
        writeln!(out, "\n## Casualty causes\n")?;
        for (cause, count) in &summary.causes {
            writeln!(out, "- **{cause}**: {count}")?;
        }
    }

    if transcripts {
        for report in reports {
            writeln!(out, "\n### Seed {}\n", report.seed)?;
            for line in &report.transcript {
                writeln!(out, "- {line}")?;
            }
        }
    }
    Ok(())
}
