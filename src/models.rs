//! Data models for the application tracker.
//!
//! This module contains the row shapes read from the applications
//! database, their classified forms, and the reports built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status of an application or of one of its phases.
///
/// Variants are declared in pipeline order, which is also their `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    #[serde(rename = "OA")]
    Oa,
    #[serde(rename = "Phone Screen")]
    PhoneScreen,
    #[serde(rename = "Hiring Manager Call")]
    HiringManagerCall,
    #[serde(rename = "Technical Interview")]
    TechnicalInterview,
    #[serde(rename = "Verbal Offer")]
    VerbalOffer,
    #[serde(rename = "Formal Offer")]
    FormalOffer,
    #[serde(rename = "Rejected After Interview")]
    RejectedAfterInterview,
    Rejected,
    Archived,
    /// Terminal status: the offer was accepted.
    Signed,
}

impl ApplicationStatus {
    /// Every status, in pipeline order.
    pub const ALL: [ApplicationStatus; 11] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Oa,
        ApplicationStatus::PhoneScreen,
        ApplicationStatus::HiringManagerCall,
        ApplicationStatus::TechnicalInterview,
        ApplicationStatus::VerbalOffer,
        ApplicationStatus::FormalOffer,
        ApplicationStatus::RejectedAfterInterview,
        ApplicationStatus::Rejected,
        ApplicationStatus::Archived,
        ApplicationStatus::Signed,
    ];

    /// The label used for this status in the Notion database.
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Oa => "OA",
            ApplicationStatus::PhoneScreen => "Phone Screen",
            ApplicationStatus::HiringManagerCall => "Hiring Manager Call",
            ApplicationStatus::TechnicalInterview => "Technical Interview",
            ApplicationStatus::VerbalOffer => "Verbal Offer",
            ApplicationStatus::FormalOffer => "Formal Offer",
            ApplicationStatus::RejectedAfterInterview => "Rejected After Interview",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Archived => "Archived",
            ApplicationStatus::Signed => "Signed",
        }
    }

    /// Look up a status by its exact label. Matching is case-sensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == label)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A start/end date range as stored on a date property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// A row from the applications database before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Page identifier.
    pub id: String,
    /// When the page was created.
    pub created: DateTime<Utc>,
    /// Status label as written in the database; may not be a known status.
    pub status: String,
    /// Company title, if the row has one.
    pub company: Option<String>,
    /// Role select, if set.
    pub role: Option<String>,
    /// Team select, if set.
    pub team: Option<String>,
    /// Related parent applications. Non-empty only for phase rows.
    pub parent_ids: Vec<String>,
    /// Next deadline, if set.
    pub deadline: Option<DateRange>,
}

/// A top-level tracked job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub status: ApplicationStatus,
    pub company: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub created: DateTime<Utc>,
}

/// A status update belonging to one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub parent_id: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// A classified row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApplicationRow {
    Application(Application),
    Phase(Phase),
}

/// Whether the cycle ended in a signed offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HiringOutcome {
    #[default]
    NotHired,
    Hired {
        company: String,
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        team: Option<String>,
    },
}

impl HiringOutcome {
    pub fn is_hired(&self) -> bool {
        matches!(self, HiringOutcome::Hired { .. })
    }
}

/// Summary of one hiring cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Outcome of the last signed application seen.
    pub hiring: HiringOutcome,
    /// Distinct company names, sorted ascending.
    pub companies: Vec<String>,
    /// Occurrences of each status across applications and phases.
    pub phase_counts: BTreeMap<ApplicationStatus, usize>,
    /// Phases grouped per parent application, in first-seen parent order.
    pub paths: Vec<Vec<Phase>>,
    /// Number of application rows (phases excluded).
    pub total: usize,
    /// Earliest application creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Date of the last signed phase seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Rows the classifier rejected.
    pub skipped: usize,
}

impl CycleReport {
    /// Occurrences of a single status.
    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.phase_counts.get(&status).copied().unwrap_or(0)
    }

    /// Number of source rows folded into this report, skipped rows included.
    pub fn rows_seen(&self) -> usize {
        self.total + self.paths.iter().map(Vec::len).sum::<usize>() + self.skipped
    }
}

/// A row from the subscriptions database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub price: f64,
    pub frequency_months: f64,
}

/// Cost totals over the subscriptions database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionTotals {
    pub monthly: f64,
    pub yearly: f64,
    /// Subscriptions included in the totals.
    pub counted: usize,
    /// Subscriptions left out because of an unusable frequency.
    pub skipped: usize,
}
