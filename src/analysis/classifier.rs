//! Row classification.
//!
//! Turns a raw database row into either an application or a phase.

use crate::models::{Application, ApplicationRow, ApplicationStatus, Phase, RawRow};
use thiserror::Error;

/// Why a row could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Application {id} has no company.")]
    MissingCompany { id: String },
    #[error("Application {id} has no role.")]
    MissingRole { id: String },
}

/// Classify a raw row.
///
/// Rows that relate to a parent application are phases; the first relation
/// is the parent. All other rows are applications and need both a company
/// and a role. A blank company counts as missing.
pub fn classify(raw: &RawRow) -> Result<ApplicationRow, ClassificationError> {
    let status = ApplicationStatus::from_label(&raw.status)
        .ok_or_else(|| ClassificationError::InvalidStatus(raw.status.clone()))?;

    if let Some(parent_id) = raw.parent_ids.first() {
        let date = raw.deadline.map(|range| range.end.unwrap_or(range.start));

        return Ok(ApplicationRow::Phase(Phase {
            parent_id: parent_id.clone(),
            status,
            date,
        }));
    }

    let company = raw
        .company
        .clone()
        .filter(|company| !company.trim().is_empty())
        .ok_or_else(|| ClassificationError::MissingCompany { id: raw.id.clone() })?;
    let role = raw
        .role
        .clone()
        .ok_or_else(|| ClassificationError::MissingRole { id: raw.id.clone() })?;

    Ok(ApplicationRow::Application(Application {
        id: raw.id.clone(),
        status,
        company,
        role,
        team: raw.team.clone(),
        created: raw.created,
    }))
}
