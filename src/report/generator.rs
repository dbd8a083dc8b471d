//! Report generation.
//!
//! This module renders cycle reports as terminal text, Markdown or JSON,
//! and formats subscription totals.

use crate::models::{ApplicationStatus, CycleReport, HiringOutcome, Phase, SubscriptionTotals};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Generate the terminal summary of a cycle.
pub fn generate_text_summary(cycle: &str, report: &CycleReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("📋 Cycle: {}", cycle));
    lines.push(format!("   Outcome: {}", describe_outcome(&report.hiring)));
    lines.push(format!("   Applications: {}", report.total));
    lines.push(format!("   Companies: {}", report.companies.len()));
    lines.push(format!(
        "   Rejections: {}",
        report.count(ApplicationStatus::Rejected)
            + report.count(ApplicationStatus::RejectedAfterInterview)
    ));
    lines.push(format!("   Started: {}", format_date(report.start_date)));
    lines.push(format!("   Signed: {}", format_date(report.end_date)));
    if let Some(days) = cycle_length_days(report) {
        lines.push(format!("   Length: {} days", days));
    }
    if report.skipped > 0 {
        lines.push(format!("   ⚠️  Skipped rows: {}", report.skipped));
    }

    if !report.phase_counts.is_empty() {
        lines.push(String::new());
        lines.push("📊 By status:".to_string());
        for (status, count) in &report.phase_counts {
            lines.push(format!("   - {}: {}", status, count));
        }
    }

    lines.join("\n")
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(cycle: &str, report: &CycleReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Cycle Review: {}\n\n", cycle));
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_status_section(report));
    output.push_str(&generate_companies_section(&report.companies));
    output.push_str(&generate_paths_section(&report.paths));

    output
}

/// Generate the summary section.
fn generate_summary_section(report: &CycleReport) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "- **Outcome:** {}\n",
        describe_outcome(&report.hiring)
    ));
    section.push_str(&format!("- **Applications:** {}\n", report.total));
    section.push_str(&format!("- **Companies:** {}\n", report.companies.len()));
    section.push_str(&format!(
        "- **Started:** {}\n",
        format_date(report.start_date)
    ));
    section.push_str(&format!("- **Signed:** {}\n", format_date(report.end_date)));
    if let Some(days) = cycle_length_days(report) {
        section.push_str(&format!("- **Length:** {} days\n", days));
    }
    if report.skipped > 0 {
        section.push_str(&format!("- **Skipped Rows:** {}\n", report.skipped));
    }
    section.push('\n');

    section
}

/// Generate the status breakdown table.
fn generate_status_section(report: &CycleReport) -> String {
    if report.phase_counts.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Status Breakdown\n\n");
    section.push_str("| Status | Count |\n");
    section.push_str("|:---|:---:|\n");
    for (status, count) in &report.phase_counts {
        section.push_str(&format!("| {} | {} |\n", status, count));
    }
    section.push('\n');

    section
}

/// Generate the company list.
fn generate_companies_section(companies: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Companies\n\n");
    if companies.is_empty() {
        section.push_str("No applications in this cycle.\n\n");
        return section;
    }

    for company in companies {
        section.push_str(&format!("- {}\n", company));
    }
    section.push('\n');

    section
}

/// Generate the per-application phase paths.
fn generate_paths_section(paths: &[Vec<Phase>]) -> String {
    if paths.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Application Paths\n\n");
    for path in paths {
        let Some(first) = path.first() else {
            continue;
        };
        let steps: Vec<String> = path.iter().map(describe_phase).collect();
        section.push_str(&format!("- `{}`: {}\n", first.parent_id, steps.join(" → ")));
    }
    section.push('\n');

    section
}

#[derive(Serialize)]
struct CycleDocument<'a> {
    cycle: &'a str,
    #[serde(flatten)]
    report: &'a CycleReport,
}

/// Generate a JSON report.
pub fn generate_json_report(cycle: &str, report: &CycleReport) -> Result<String> {
    let document = CycleDocument { cycle, report };
    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Generate the subscription cost summary.
pub fn generate_subscription_summary(totals: &SubscriptionTotals) -> String {
    let mut lines = vec![
        format!("Total monthly cost: {}", format_usd(totals.monthly)),
        format!("Total yearly cost: {}", format_usd(totals.yearly)),
    ];
    if totals.skipped > 0 {
        lines.push(format!(
            "⚠️  {} subscription(s) skipped due to invalid frequency",
            totals.skipped
        ));
    }
    lines.join("\n")
}

/// Format an amount as US dollars, e.g. `$1,234.56`.
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

fn describe_outcome(hiring: &HiringOutcome) -> String {
    match hiring {
        HiringOutcome::NotHired => "Not hired".to_string(),
        HiringOutcome::Hired {
            company,
            role,
            team: Some(team),
        } => format!("Hired at {} as {} ({})", company, role, team),
        HiringOutcome::Hired { company, role, .. } => {
            format!("Hired at {} as {}", company, role)
        }
    }
}

fn describe_phase(phase: &Phase) -> String {
    match phase.date {
        Some(date) => format!("{} ({})", phase.status, date.format("%Y-%m-%d")),
        None => phase.status.to_string(),
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn cycle_length_days(report: &CycleReport) -> Option<i64> {
    match (report.start_date, report.end_date) {
        (Some(start), Some(end)) => Some((end - start).num_days()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_report() -> CycleReport {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();

        CycleReport {
            hiring: HiringOutcome::Hired {
                company: "Acme".to_string(),
                role: "Engineer".to_string(),
                team: Some("Infra".to_string()),
            },
            companies: vec!["Acme".to_string(), "Globex".to_string()],
            phase_counts: [
                (ApplicationStatus::Applied, 2),
                (ApplicationStatus::Signed, 1),
            ]
            .into_iter()
            .collect(),
            paths: vec![vec![
                Phase {
                    parent_id: "app-1".to_string(),
                    status: ApplicationStatus::PhoneScreen,
                    date: None,
                },
                Phase {
                    parent_id: "app-1".to_string(),
                    status: ApplicationStatus::Signed,
                    date: Some(end),
                },
            ]],
            total: 2,
            start_date: Some(start),
            end_date: Some(end),
            skipped: 1,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report("Post Grad 2022-2023", &create_test_report());

        assert!(markdown.contains("# Cycle Review: Post Grad 2022-2023"));
        assert!(markdown.contains("Hired at Acme as Engineer (Infra)"));
        assert!(!markdown.contains("| Phone Screen |"));
        assert!(markdown.contains("| Applied | 2 |"));
        assert!(markdown.contains("- Globex"));
        assert!(markdown.contains("`app-1`: Phone Screen → Signed (2023-06-01)"));
        assert!(markdown.contains("**Length:** 151 days"));
        assert!(markdown.contains("**Skipped Rows:** 1"));
    }

    #[test]
    fn test_markdown_status_table_in_pipeline_order() {
        let markdown = generate_markdown_report("c", &create_test_report());
        let applied = markdown.find("| Applied |").unwrap();
        let signed = markdown.find("| Signed |").unwrap();
        assert!(applied < signed);
    }

    #[test]
    fn test_empty_report() {
        let markdown = generate_markdown_report("Empty", &CycleReport::default());

        assert!(markdown.contains("Not hired"));
        assert!(markdown.contains("No applications in this cycle."));
        assert!(!markdown.contains("## Status Breakdown"));
        assert!(!markdown.contains("## Application Paths"));
    }

    #[test]
    fn test_generate_text_summary() {
        let text = generate_text_summary("Post Grad 2022-2023", &create_test_report());

        assert!(text.contains("Cycle: Post Grad 2022-2023"));
        assert!(text.contains("Applications: 2"));
        assert!(text.contains("Rejections: 0"));
        assert!(text.contains("Started: 2023-01-01"));
        assert!(text.contains("Signed: 2023-06-01"));
        assert!(text.contains("- Signed: 1"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report("Post Grad 2022-2023", &create_test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["cycle"], "Post Grad 2022-2023");
        assert_eq!(value["total"], 2);
        assert_eq!(value["hiring"]["outcome"], "hired");
        assert_eq!(value["phase_counts"]["Applied"], 2);
        assert_eq!(value["companies"][1], "Globex");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(9.5), "$9.50");
        assert_eq!(format_usd(1234.567), "$1,234.57");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(-42.1), "-$42.10");
    }

    #[test]
    fn test_subscription_summary() {
        let totals = SubscriptionTotals {
            monthly: 20.0,
            yearly: 240.0,
            counted: 2,
            skipped: 0,
        };
        let text = generate_subscription_summary(&totals);

        assert!(text.contains("Total monthly cost: $20.00"));
        assert!(text.contains("Total yearly cost: $240.00"));
        assert!(!text.contains("skipped"));
    }
}
