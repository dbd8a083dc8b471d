//! Concurrent per-page note migration.

use futures::{FutureExt, Stream, TryStreamExt};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Outcome of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Pages whose notes were written (or would be, in a dry run).
    pub migrated: usize,
    /// Paragraph blocks appended across all pages.
    pub blocks: usize,
    /// Pages that failed and were left untouched.
    pub failed: usize,
}

/// Run `migrate` for every page of the stream, up to `concurrency` at a
/// time.
///
/// `migrate` returns the number of blocks written for a page. A page that
/// fails is logged and counted, and the remaining pages still run. A fault
/// of the page stream itself stops the run and is returned unchanged.
pub async fn migrate_pages<S, P, E, F, Fut, M>(
    pages: S,
    concurrency: usize,
    mut migrate: F,
) -> Result<MigrationSummary, E>
where
    S: Stream<Item = Result<P, E>>,
    F: FnMut(P) -> Fut,
    Fut: Future<Output = Result<usize, M>>,
    M: Display,
{
    let outcomes = pages
        .map_ok(move |page| migrate(page).map(Ok::<_, E>))
        .try_buffer_unordered(concurrency.max(1));
    let mut outcomes = std::pin::pin!(outcomes);
    let mut summary = MigrationSummary::default();

    while let Some(outcome) = outcomes.try_next().await? {
        match outcome {
            Ok(blocks) => {
                summary.migrated += 1;
                summary.blocks += blocks;
            }
            Err(e) => {
                warn!("Skipping page: {:#}", e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{future, stream};
    use std::cell::Cell;

    #[test]
    fn test_migrates_every_page() {
        let pages = stream::iter(vec![Ok::<_, String>(2usize), Ok(3), Ok(0)]);

        let summary = tokio_test::block_on(migrate_pages(pages, 2, |blocks| {
            future::ready(Ok::<_, String>(blocks))
        }))
        .unwrap();

        assert_eq!(
            summary,
            MigrationSummary {
                migrated: 3,
                blocks: 5,
                failed: 0,
            }
        );
    }

    #[test]
    fn test_failed_page_does_not_stop_the_rest() {
        let pages = stream::iter(vec![Ok::<_, String>("a"), Ok("bad"), Ok("c")]);

        let summary = tokio_test::block_on(migrate_pages(pages, 4, |page| {
            future::ready(if page == "bad" {
                Err(format!("page {} has unsupported notes", page))
            } else {
                Ok(1)
            })
        }))
        .unwrap();

        assert_eq!(summary.migrated, 2);
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_stream_fault_stops_the_run() {
        let pages = stream::iter(vec![
            Ok(1usize),
            Err("cursor expired".to_string()),
            Ok(1),
        ]);
        let calls = Cell::new(0);

        let result = tokio_test::block_on(migrate_pages(pages, 1, |blocks| {
            calls.set(calls.get() + 1);
            future::ready(Ok::<_, String>(blocks))
        }));

        assert_eq!(result, Err("cursor expired".to_string()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_concurrency_still_runs() {
        let pages = stream::iter(vec![Ok::<_, String>(1usize)]);

        let summary = tokio_test::block_on(migrate_pages(pages, 0, |blocks| {
            future::ready(Ok::<_, String>(blocks))
        }))
        .unwrap();

        assert_eq!(summary.migrated, 1);
    }
}
