use crate::error::AppResult;
use crate::models::Thread;
use crate::services::providers::SearchProvider;

/// Fixed phrase appended to every provider query to bias results toward
/// recommendation threads on Reddit
const SEARCH_INTENT_SUFFIX: &str = "product recommendations site:reddit.com";

/// Organic results requested per discovery search
const SEARCH_RESULT_COUNT: u32 = 10;

/// Substring a result link must contain to count as a discussion thread
const THREAD_URL_MARKER: &str = "reddit.com/r/";

/// Placeholder when no subreddit can be parsed from a thread link
const UNKNOWN_SUBREDDIT: &str = "reddit";

/// Finds candidate discussion threads for a normalized query.
///
/// Results that are not Reddit threads are expected noise and dropped
/// silently. Provider ranking order is preserved; nothing is re-scored.
pub async fn discover_threads(
    provider: &dyn SearchProvider,
    query: &str,
) -> AppResult<Vec<Thread>> {
    let provider_query = format!("{} {}", query, SEARCH_INTENT_SUFFIX);
    let results = provider.search(&provider_query, SEARCH_RESULT_COUNT).await?;

    let threads: Vec<Thread> = results
        .into_iter()
        .filter(|result| result.link.contains(THREAD_URL_MARKER))
        .map(|result| {
            let subreddit = subreddit_from_url(&result.link);
            Thread {
                title: result.title,
                url: result.link,
                subreddit,
                score: 0,
                num_comments: 0,
            }
        })
        .collect();

    tracing::info!(query = %query, threads = threads.len(), "Thread discovery completed");
    Ok(threads)
}

/// Parses the forum name from the path segment after `/r/`
fn subreddit_from_url(url: &str) -> String {
    url.split_once("/r/")
        .and_then(|(_, rest)| rest.split('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| UNKNOWN_SUBREDDIT.to_string())
}
