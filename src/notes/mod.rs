//! Moving notes out of a rich-text property into the page body.

pub mod blocks;
pub mod migrate;

pub use blocks::{split_paragraphs, ParagraphBlock, RichText};
pub use migrate::migrate_pages;
