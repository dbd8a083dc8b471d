//! Cycle aggregation.
//!
//! Folds the rows of one hiring cycle into a [`CycleReport`] in a single
//! pass. Rows are consumed as the source yields them; the input is never
//! collected up front.

use crate::analysis::classifier::classify;
use crate::models::{
    ApplicationRow, ApplicationStatus, CycleReport, HiringOutcome, Phase, RawRow,
};
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// In-progress state of a cycle fold.
#[derive(Debug, Default)]
pub struct CycleAccumulator {
    hiring: HiringOutcome,
    companies: BTreeSet<String>,
    phase_counts: BTreeMap<ApplicationStatus, usize>,
    /// Parent id -> index into `paths`.
    path_index: HashMap<String, usize>,
    paths: Vec<Vec<Phase>>,
    total: usize,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    skipped: usize,
}

impl CycleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a row and fold it in. Rows that fail classification are
    /// logged and skipped.
    pub fn push(&mut self, raw: &RawRow) {
        match classify(raw) {
            Ok(ApplicationRow::Phase(phase)) => self.push_phase(phase),
            Ok(ApplicationRow::Application(app)) => {
                *self.phase_counts.entry(app.status).or_insert(0) += 1;

                if app.status == ApplicationStatus::Signed {
                    self.hiring = HiringOutcome::Hired {
                        company: app.company.clone(),
                        role: app.role,
                        team: app.team,
                    };
                }

                self.start_date = Some(match self.start_date {
                    Some(current) => current.min(app.created),
                    None => app.created,
                });
                self.companies.insert(app.company);
                self.total += 1;
            }
            Err(e) => {
                warn!("Skipping row {}: {}", raw.id, e);
                self.skipped += 1;
            }
        }
    }

    fn push_phase(&mut self, phase: Phase) {
        *self.phase_counts.entry(phase.status).or_insert(0) += 1;

        if phase.status == ApplicationStatus::Signed {
            // Last signed phase wins, even when it has no date.
            self.end_date = phase.date;
        }

        let index = match self.path_index.get(&phase.parent_id) {
            Some(&index) => index,
            None => {
                self.paths.push(Vec::new());
                let index = self.paths.len() - 1;
                self.path_index.insert(phase.parent_id.clone(), index);
                index
            }
        };
        self.paths[index].push(phase);
    }

    /// Build the final report.
    pub fn finish(self) -> CycleReport {
        debug!(
            "Folded {} applications, {} phase paths, {} skipped rows",
            self.total,
            self.paths.len(),
            self.skipped
        );

        CycleReport {
            hiring: self.hiring,
            companies: self.companies.into_iter().collect(),
            phase_counts: self.phase_counts,
            paths: self.paths,
            total: self.total,
            start_date: self.start_date,
            end_date: self.end_date,
            skipped: self.skipped,
        }
    }
}

/// Aggregate a stream of rows into a cycle report.
///
/// Source errors abort the pass and are returned unchanged.
pub async fn aggregate<S, E>(rows: S) -> Result<CycleReport, E>
where
    S: Stream<Item = Result<RawRow, E>>,
{
    let mut rows = std::pin::pin!(rows);
    let mut acc = CycleAccumulator::new();

    while let Some(raw) = rows.try_next().await? {
        acc.push(&raw);
    }

    Ok(acc.finish())
}

/// Aggregate rows that are already in memory.
#[allow(dead_code)] // Synchronous entry point for in-memory inputs
pub fn aggregate_rows<I>(rows: I) -> CycleReport
where
    I: IntoIterator<Item = RawRow>,
{
    let mut acc = CycleAccumulator::new();
    for raw in rows {
        acc.push(&raw);
    }
    acc.finish()
}
