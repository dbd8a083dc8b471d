//! Analysis modules.
//!
//! Classification and folding of database rows into reports.

pub mod aggregator;
pub mod classifier;
pub mod companies;
pub mod subscriptions;

pub use aggregator::aggregate;
pub use companies::collect_companies;
