//! Notion data source.
//!
//! HTTP client, cursor pagination and page decoding.

pub mod client;
pub mod page;
pub mod pagination;

pub use client::{rich_text_not_empty, select_equals, ClientConfig, NotionClient};
