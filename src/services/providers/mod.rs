/// External collaborator abstractions
///
/// Every outbound dependency of the pipeline sits behind a small trait so the
/// orchestration can be exercised against mocks. The live implementations are
/// thin reqwest clients; none of them retry, and all of them carry a request
/// timeout so a stalled upstream cannot hold a task forever.
use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::SerpResult;

#[cfg(test)]
use mockall::automock;

pub mod openai;
pub mod reddit;
pub mod serpapi;

pub use openai::OpenAiChatProvider;
pub use reddit::{extract_post_id, RedditCommentProvider, RedditTokenClient};
pub use serpapi::SerpApiProvider;

/// Organic web search used for thread discovery
///
/// Treated as best-effort; partial or empty result lists are valid.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs a search and returns the provider's ranked organic results
    async fn search(&self, query: &str, num: u32) -> AppResult<Vec<SerpResult>>;
}

/// Source of raw discussion text for a single thread
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommentProvider: Send + Sync {
    /// Fetches qualifying comment bodies for a post, in response order
    async fn fetch_comments(&self, post_id: &str) -> AppResult<Vec<String>>;
}

/// Chat-style text model used to turn comments into structured output
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one system + user exchange and returns the raw model text
    async fn complete(&self, system: &str, user: &str) -> AppResult<String>;
}
