use anyhow::{Context, Result};
use royale_engine::{CasualtyCause, MatchEngine, MatchReport, MatchSink};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::{Duration, Instant};

use crate::assets::TesterAssets;

/// Sink that keeps every submitted report in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: RefCell<Vec<MatchReport>>,
}

impl CollectingSink {
    pub fn take(&self) -> Vec<MatchReport> {
        self.reports.take()
    }
}

impl MatchSink for CollectingSink {
    type Error = Infallible;

    fn submit(&self, report: &MatchReport) -> Result<(), Self::Error> {
        log::debug!(
            "seed {} finished={} winner={:?} after {} phases",
            report.seed,
            report.finished,
            report.winner,
            report.phases
        );
        self.reports.borrow_mut().push(report.clone());
        Ok(())
    }
}

/// Per-actor tallies across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActorTally {
    pub name: String,
    pub wins: u32,
    pub kills: u32,
    pub average_placement: f64,
}

/// Aggregated outcome of a batch of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub ruleset_id: String,
    pub matches: usize,
    pub finished: usize,
    pub capped: usize,
    pub no_survivor: usize,
    pub average_phases: f64,
    pub average_days: f64,
    pub average_kills: f64,
    /// Casualty counts keyed by cause label.
    pub causes: BTreeMap<String, u32>,
    pub actors: BTreeMap<String, ActorTally>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn win_rate(&self, id: &str) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        self.actors
            .get(id)
            .map_or(0.0, |tally| f64::from(tally.wins) / count_f64(self.matches))
    }
}

/// Run one match per seed through the engine and collect the reports.
pub fn run_batch(
    assets: &TesterAssets,
    seeds: &[u64],
    max_phases: u32,
    verbose: bool,
) -> Result<Vec<MatchReport>> {
    let engine = MatchEngine::new(assets.clone(), CollectingSink::default());
    for (index, seed) in seeds.iter().enumerate() {
        let report = engine
            .run_match(*seed, max_phases)
            .with_context(|| format!("match with seed {seed} failed"))?;
        if verbose {
            println!(
                "  [{}/{}] seed {seed}: {} in {} phases",
                index + 1,
                seeds.len(),
                report.winner_name.as_deref().unwrap_or("no winner"),
                report.phases
            );
        }
        if !report.finished {
            log::warn!("seed {seed} hit the phase cap of {max_phases}");
        }
    }
    Ok(engine.sink().take())
}

pub fn summarize(reports: &[MatchReport], elapsed: Duration) -> BatchSummary {
    let mut summary = BatchSummary {
        ruleset_id: reports
            .first()
            .map(|report| report.ruleset_id.clone())
            .unwrap_or_default(),
        matches: reports.len(),
        elapsed,
        ..BatchSummary::default()
    };
    if reports.is_empty() {
        return summary;
    }

    let mut placement_sums: BTreeMap<String, (usize, u32)> = BTreeMap::new();
    let mut phases = 0.0;
    let mut days = 0.0;
    let mut kills = 0.0;
    for report in reports {
        if report.finished {
            summary.finished += 1;
            if report.winner.is_none() {
                summary.no_survivor += 1;
            }
        } else {
            summary.capped += 1;
        }
        phases += f64::from(report.phases);
        days += f64::from(report.days);
        kills += f64::from(report.total_kills());

        for casualty in &report.casualties {
            *summary.causes.entry(cause_label(&casualty.cause).to_string()).or_default() += 1;
            let tally = summary.actors.entry(casualty.id.clone()).or_default();
            tally.name.clone_from(&casualty.name);
        }
        if let (Some(id), Some(name)) = (&report.winner, &report.winner_name) {
            let tally = summary.actors.entry(id.clone()).or_default();
            tally.name.clone_from(name);
            tally.wins += 1;
        }
        for (id, count) in &report.kills {
            summary.actors.entry(id.clone()).or_default().kills += count;
            if let Some(place) = report.placement(id) {
                let entry = placement_sums.entry(id.clone()).or_default();
                entry.0 += place;
                entry.1 += 1;
            }
        }
    }

    for (id, (sum, samples)) in placement_sums {
        if let Some(tally) = summary.actors.get_mut(&id) {
            tally.average_placement = count_f64(sum) / f64::from(samples.max(1));
        }
    }
    let matches = count_f64(reports.len());
    summary.average_phases = phases / matches;
    summary.average_days = days / matches;
    summary.average_kills = kills / matches;
    summary
}

pub fn run_and_summarize(
    assets: &TesterAssets,
    seeds: &[u64],
    max_phases: u32,
    verbose: bool,
) -> Result<(Vec<MatchReport>, BatchSummary)> {
    let start = Instant::now();
    let reports = run_batch(assets, seeds, max_phases, verbose)?;
    let summary = summarize(&reports, start.elapsed());
    Ok((reports, summary))
}

pub const fn cause_label(cause: &CasualtyCause) -> &'static str {
    match cause {
        CasualtyCause::Wounds => "wounds",
        CasualtyCause::StatusEffects => "status_effects",
        CasualtyCause::Zone => "zone",
        CasualtyCause::Battle { .. } => "battle",
        CasualtyCause::Event { .. } => "event",
    }
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(value: usize) -> f64 {
    value as f64
}
