//! Subscription cost totals.

use crate::models::{SubscriptionRow, SubscriptionTotals};
use futures::{Stream, TryStreamExt};
use tracing::warn;

impl SubscriptionTotals {
    /// Add one subscription's monthly share. Returns false when the row was
    /// skipped because its billing frequency is unusable.
    pub fn add(&mut self, row: &SubscriptionRow) -> bool {
        if !(row.frequency_months.is_finite() && row.frequency_months > 0.0) {
            warn!(
                "Skipping subscription {}: invalid frequency {}",
                row.name.as_deref().unwrap_or("<unnamed>"),
                row.frequency_months
            );
            self.skipped += 1;
            return false;
        }

        self.monthly += row.price / row.frequency_months;
        self.yearly = self.monthly * 12.0;
        self.counted += 1;
        true
    }

    /// Sum a stream of subscription rows.
    pub async fn accumulate<S, E>(rows: S) -> Result<Self, E>
    where
        S: Stream<Item = Result<SubscriptionRow, E>>,
    {
        let mut rows = std::pin::pin!(rows);
        let mut totals = Self::default();

        while let Some(row) = rows.try_next().await? {
            totals.add(&row);
        }

        Ok(totals)
    }
}
