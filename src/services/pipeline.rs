use std::sync::Arc;

use crate::db::SearchCache;
use crate::error::AppResult;
use crate::models::{Recommendation, Thread};
use crate::services::aggregate::aggregate;
use crate::services::discovery::discover_threads;
use crate::services::extractor::RecommendationExtractor;
use crate::services::providers::{extract_post_id, CommentProvider, SearchProvider};

/// Fan-out ceiling: discussion threads processed per query
const MAX_THREADS_PER_QUERY: usize = 5;

/// Final recommendation list paired with the threads that produced it
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<Recommendation>,
    pub threads: Vec<Thread>,
}

/// The recommendation pipeline: cache gating, thread discovery, per-thread
/// comment retrieval and extraction, aggregation, and write-through.
pub struct SearchPipeline {
    search: Arc<dyn SearchProvider>,
    comments: Arc<dyn CommentProvider>,
    extractor: Arc<RecommendationExtractor>,
    cache: Arc<dyn SearchCache>,
}

impl SearchPipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        comments: Arc<dyn CommentProvider>,
        extractor: Arc<RecommendationExtractor>,
        cache: Arc<dyn SearchCache>,
    ) -> Self {
        Self {
            search,
            comments,
            extractor,
            cache,
        }
    }

    /// Runs the full pipeline for a normalized query.
    ///
    /// A cached result with any recommendations is returned unchanged.
    /// Otherwise collaborator failures inside a single thread's task degrade
    /// that thread to an empty contribution; only failures before fan-out
    /// begins surface to the caller.
    pub async fn run(&self, query: &str) -> AppResult<SearchOutcome> {
        match self.cache.lookup(query).await {
            Ok(Some(hit)) if !hit.recommendations.is_empty() => {
                tracing::info!(query = %query, results = hit.recommendations.len(), "Cache hit");
                return Ok(SearchOutcome {
                    results: hit.recommendations,
                    threads: hit.threads,
                });
            }
            Ok(_) => {}
            // A broken cache downgrades to a live computation.
            Err(e) => tracing::error!(error = %e, "Cache lookup failed"),
        }

        let threads = discover_threads(self.search.as_ref(), query).await?;

        let mut tasks = Vec::new();
        for thread in threads.iter().take(MAX_THREADS_PER_QUERY).cloned() {
            let comments = Arc::clone(&self.comments);
            let extractor = Arc::clone(&self.extractor);
            let query = query.to_string();

            tasks.push(tokio::spawn(async move {
                process_thread(comments, extractor, &query, thread).await
            }));
        }

        let mut flattened: Vec<Recommendation> = Vec::new();
        for task in tasks {
            match task.await {
                Ok(contribution) => flattened.extend(contribution),
                Err(e) => tracing::error!(error = %e, "Thread task join error"),
            }
        }

        tracing::info!(query = %query, raw_results = flattened.len(), "Fan-out completed");

        let results = aggregate(flattened);

        if let Err(e) = self.cache.write_through(query, &threads, &results).await {
            // Never delays or fails the response.
            tracing::error!(error = %e, "Cache write-through failed");
        }

        Ok(SearchOutcome { results, threads })
    }
}

/// Retrieves and extracts one thread. Any failure here is this thread's own
/// and converts to an empty contribution; siblings are never affected.
async fn process_thread(
    comments: Arc<dyn CommentProvider>,
    extractor: Arc<RecommendationExtractor>,
    query: &str,
    thread: Thread,
) -> Vec<Recommendation> {
    let Some(post_id) = extract_post_id(&thread.url) else {
        tracing::warn!(thread_url = %thread.url, "Skipping thread without a post id");
        return Vec::new();
    };

    let bodies = match comments.fetch_comments(&post_id).await {
        Ok(bodies) => bodies,
        Err(e) => {
            tracing::warn!(thread_url = %thread.url, error = %e, "Comment retrieval failed");
            return Vec::new();
        }
    };

    if bodies.is_empty() {
        tracing::debug!(thread_url = %thread.url, "No usable comments");
        return Vec::new();
    }

    match extractor.extract(query, &thread, &bodies).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(thread_url = %thread.url, error = %e, "Extraction failed");
            Vec::new()
        }
    }
}
