//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.notion-review.toml` files. Secrets are never read from or written to
//! the file; the token comes from the command line or `NOTION_TOKEN`.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".notion-review.toml";

/// Largest page Notion returns from a database query.
pub const MAX_PAGE_SIZE: usize = 100;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Notion API settings.
    #[serde(default)]
    pub notion: NotionConfig,

    /// Database IDs.
    #[serde(default)]
    pub databases: DatabaseConfig,

    /// Property names used by the databases.
    #[serde(default)]
    pub properties: PropertiesConfig,

    /// Cycle review settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

/// Notion API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Value of the `Notion-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Results requested per page (Notion allows at most 100).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_version: default_api_version(),
            timeout_seconds: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.notion.com".to_string()
}

fn default_api_version() -> String {
    "2022-06-28".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

/// Database IDs. Usually supplied through the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Job applications database.
    #[serde(default)]
    pub applications: Option<String>,

    /// Subscriptions database.
    #[serde(default)]
    pub subscriptions: Option<String>,

    /// Title searched for when no applications database ID is set.
    #[serde(default = "default_applications_title")]
    pub applications_title: String,

    /// Database whose notes `migrate-notes` moves.
    #[serde(default)]
    pub notes: Option<String>,

    /// Title searched for when no notes database ID is set.
    #[serde(default = "default_notes_title")]
    pub notes_title: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            applications: None,
            subscriptions: None,
            applications_title: default_applications_title(),
            notes: None,
            notes_title: default_notes_title(),
        }
    }
}

fn default_applications_title() -> String {
    "Applications".to_string()
}

fn default_notes_title() -> String {
    "Leetcode".to_string()
}

/// Names of the database properties that are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesConfig {
    /// Status property of applications and phases.
    pub status: String,
    /// Title property holding the company name.
    pub company: String,
    /// Role select.
    pub role: String,
    /// Team select.
    pub team: String,
    /// Relation from a phase to its application.
    pub application: String,
    /// Deadline date of a phase.
    pub deadline: String,
    /// Select used to filter a cycle.
    pub cycle: String,
    /// Subscription price.
    pub price: String,
    /// Subscription billing period in months.
    pub frequency: String,
    /// Subscription title.
    pub name: String,
    /// Rich-text notes moved into the page body by `migrate-notes`.
    pub notes: String,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            status: "Status".to_string(),
            company: "Company".to_string(),
            role: "Role".to_string(),
            team: "Team".to_string(),
            application: "Application".to_string(),
            deadline: "Next Deadline".to_string(),
            cycle: "Cycle".to_string(),
            price: "Price".to_string(),
            frequency: "Frequency (Months)".to_string(),
            name: "Name".to_string(),
            notes: "Notes".to_string(),
        }
    }
}

/// Cycle review settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Cycle reviewed when `--cycle` is not given.
    #[serde(default)]
    pub default_cycle: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Reject settings every Notion request would fail with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_PAGE_SIZE).contains(&self.notion.page_size),
            "notion.page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE,
            self.notion.page_size
        );
        ensure!(
            self.notion.timeout_seconds > 0,
            "notion.timeout_seconds must be at least 1"
        );
        Ok(())
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.notion-review.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence over
    /// config file settings, but only when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.notion_url {
            self.notion.api_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.notion.timeout_seconds = timeout;
        }
        if let Some(ref id) = args.applications_db {
            self.databases.applications = Some(id.clone());
        }
        if let Some(ref id) = args.subscriptions_db {
            self.databases.subscriptions = Some(id.clone());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
