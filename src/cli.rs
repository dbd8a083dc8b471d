//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// notion-review - summaries of personal Notion databases
///
/// Review a job-application cycle, list every company applied to, total
/// subscription costs, or move rich-text notes into their page bodies.
///
/// Examples:
///   notion-review review --cycle "Post Grad 2022-2023"
///   notion-review review --cycle "Post Grad 2022-2023" --format markdown -o cycle.md
///   notion-review companies
///   notion-review subscriptions
///   notion-review migrate-notes --dry-run
///   notion-review --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Notion integration token
    ///
    /// Internal integration secrets start with `secret_` or `ntn_`.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Applications database ID
    #[arg(long, value_name = "ID", env = "APPLICATION_DATABASE_ID", global = true)]
    pub applications_db: Option<String>,

    /// Subscriptions database ID
    #[arg(long, value_name = "ID", env = "SUBSCRIPTION_DATABASE_ID", global = true)]
    pub subscriptions_db: Option<String>,

    /// Notion API base URL
    #[arg(long, value_name = "URL", env = "NOTION_API_URL", global = true)]
    pub notion_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .notion-review.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .notion-review.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Report to produce.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Summarise one job-application cycle
    Review(ReviewArgs),
    /// List every company in the applications database
    Companies,
    /// Total monthly and yearly subscription costs
    Subscriptions,
    /// Append each page's notes property to its body as paragraphs
    MigrateNotes(MigrateNotesArgs),
}

/// Options for the `review` command.
#[derive(clap::Args, Debug, Clone)]
pub struct ReviewArgs {
    /// Cycle to review, e.g. "Post Grad 2022-2023"
    ///
    /// Defaults to `review.default_cycle` from the config file.
    #[arg(long, value_name = "NAME")]
    pub cycle: Option<String>,

    /// Output format (text, markdown, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Options for the `migrate-notes` command.
#[derive(clap::Args, Debug, Clone)]
pub struct MigrateNotesArgs {
    /// Notes database ID
    ///
    /// Defaults to `databases.notes`, then to a search for `databases.notes_title`.
    #[arg(long, value_name = "ID", env = "NOTES_DATABASE_ID")]
    pub database: Option<String>,

    /// Pages migrated at the same time
    #[arg(long, default_value_t = 4, value_name = "N")]
    pub concurrency: usize,

    /// Convert the notes and report counts without writing to Notion
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format for the cycle report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Terminal summary (default)
    #[default]
    Text,
    /// Markdown document
    Markdown,
    /// JSON document
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("No command given. Use --help to list commands".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(Command::MigrateNotes(ref migrate)) = self.command {
            if migrate.concurrency == 0 {
                return Err("Concurrency must be at least 1".to_string());
            }
        }

        if let Some(ref url) = self.notion_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Notion URL must start with 'http://' or 'https://'".to_string());
            }
        }

        match self.token.as_deref() {
            None | Some("") => {
                return Err("Missing Notion token. Set NOTION_TOKEN or pass --token".to_string())
            }
            Some(token) if !token.starts_with("secret_") && !token.starts_with("ntn_") => {
                return Err("Notion token must start with 'secret_' or 'ntn_'".to_string());
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
