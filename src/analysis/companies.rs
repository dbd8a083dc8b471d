//! Distinct company names across the applications database.

use futures::{Stream, TryStreamExt};
use std::collections::BTreeSet;

/// Collect the distinct, non-blank company titles from a stream, sorted
/// ascending. Rows without a title are ignored.
pub async fn collect_companies<S, E>(titles: S) -> Result<Vec<String>, E>
where
    S: Stream<Item = Result<Option<String>, E>>,
{
    let mut titles = std::pin::pin!(titles);
    let mut companies = BTreeSet::new();

    while let Some(title) = titles.try_next().await? {
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            companies.insert(title);
        }
    }

    Ok(companies.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_collect_companies_dedups_and_sorts() {
        let titles = vec![
            Ok::<_, String>(Some("Zeta".to_string())),
            Ok(None),
            Ok(Some("Acme".to_string())),
            Ok(Some("  ".to_string())),
            Ok(Some("Zeta".to_string())),
        ];

        let companies = collect_companies(stream::iter(titles)).await.unwrap();
        assert_eq!(companies, vec!["Acme", "Zeta"]);
    }

    #[tokio::test]
    async fn test_collect_companies_propagates_error() {
        let titles = vec![Ok(Some("Acme".to_string())), Err("boom".to_string())];

        let result = collect_companies(stream::iter(titles)).await;
        assert_eq!(result, Err("boom".to_string()));
    }
}
