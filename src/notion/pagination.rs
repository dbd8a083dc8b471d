//! Cursor pagination as a lazy stream.
//!
//! The next page is only requested once every result of the current page
//! has been yielded.

use futures::{stream, Stream};
use serde::Deserialize;
use std::collections::VecDeque;
use std::future::Future;
use tracing::debug;

/// One page of a paginated list response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

struct Cursor<T, F> {
    fetch: F,
    buffer: VecDeque<T>,
    next: Option<String>,
    pages: usize,
    exhausted: bool,
}

/// Turn a page fetcher into a stream of results.
///
/// `fetch` receives the cursor to start from (`None` for the first page).
/// The first error ends the stream.
pub fn paginate<T, E, F, Fut>(fetch: F) -> impl Stream<Item = Result<T, E>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let cursor = Cursor {
        fetch,
        buffer: VecDeque::new(),
        next: None,
        pages: 0,
        exhausted: false,
    };

    stream::try_unfold(cursor, next_result::<T, E, F, Fut>)
}

async fn next_result<T, E, F, Fut>(
    mut cursor: Cursor<T, F>,
) -> Result<Option<(T, Cursor<T, F>)>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    loop {
        if let Some(item) = cursor.buffer.pop_front() {
            return Ok(Some((item, cursor)));
        }
        if cursor.exhausted {
            return Ok(None);
        }

        let page = (cursor.fetch)(cursor.next.take()).await?;
        cursor.pages += 1;
        debug!(
            "Fetched page {} ({} results, has_more: {})",
            cursor.pages,
            page.results.len(),
            page.has_more
        );

        cursor.exhausted = !page.has_more || page.next_cursor.is_none();
        cursor.next = page.next_cursor;
        cursor.buffer.extend(page.results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{future, StreamExt, TryStreamExt};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page(results: &[u32], next_cursor: Option<&str>) -> Page<u32> {
        Page {
            results: results.to_vec(),
            has_more: next_cursor.is_some(),
            next_cursor: next_cursor.map(String::from),
        }
    }

    /// Serves `pages` in order and records the cursor of every request.
    fn fake_source(
        pages: Vec<Result<Page<u32>, String>>,
    ) -> (
        Rc<RefCell<Vec<Option<String>>>>,
        impl FnMut(Option<String>) -> future::Ready<Result<Page<u32>, String>>,
    ) {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let seen = requests.clone();
        let mut pages = pages.into_iter();

        let fetch = move |cursor: Option<String>| {
            seen.borrow_mut().push(cursor);
            future::ready(pages.next().unwrap_or_else(|| Err("no more pages".to_string())))
        };

        (requests, fetch)
    }

    #[tokio::test]
    async fn test_follows_cursors_until_exhausted() {
        let (requests, fetch) = fake_source(vec![
            Ok(page(&[1, 2], Some("c1"))),
            Ok(page(&[3], Some("c2"))),
            Ok(page(&[4], None)),
        ]);

        let items: Vec<u32> = paginate(fetch).try_collect().await.unwrap();

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(
            *requests.borrow(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_fetches_lazily() {
        let (requests, fetch) = fake_source(vec![
            Ok(page(&[1, 2], Some("c1"))),
            Ok(page(&[3], None)),
        ]);

        let mut stream = std::pin::pin!(paginate(fetch));
        assert_eq!(stream.next().await, Some(Ok(1)));
        assert_eq!(stream.next().await, Some(Ok(2)));
        assert_eq!(requests.borrow().len(), 1);

        assert_eq!(stream.next().await, Some(Ok(3)));
        assert_eq!(requests.borrow().len(), 2);
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_error_ends_stream_after_earlier_results() {
        let (_, fetch) = fake_source(vec![
            Ok(page(&[1], Some("c1"))),
            Err("unauthorized".to_string()),
        ]);

        let items: Vec<Result<u32, String>> = paginate(fetch).collect().await;
        assert_eq!(items, vec![Ok(1), Err("unauthorized".to_string())]);
    }

    #[tokio::test]
    async fn test_skips_empty_pages() {
        let (_, fetch) = fake_source(vec![
            Ok(page(&[], Some("c1"))),
            Ok(page(&[7], None)),
        ]);

        let items: Vec<u32> = paginate(fetch).try_collect().await.unwrap();
        assert_eq!(items, vec![7]);
    }

    #[tokio::test]
    async fn test_stops_when_cursor_missing() {
        let (requests, fetch) = fake_source(vec![Ok(Page {
            results: vec![1],
            has_more: true,
            next_cursor: None,
        })]);

        let items: Vec<u32> = paginate(fetch).try_collect().await.unwrap();
        assert_eq!(items, vec![1]);
        assert_eq!(requests.borrow().len(), 1);
    }

    #[test]
    fn test_page_deserialize_defaults() {
        let page: Page<u32> = serde_json::from_str(r#"{"results": [1, 2]}"#).unwrap();
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }
}
