use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Reddit discussion thread matched as relevant to a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub title: String,
    pub url: String,
    /// Parsed from the path segment after `/r/`; `"reddit"` when absent
    pub subreddit: String,
    /// Reserved; the search provider does not report thread scores
    #[serde(default)]
    pub score: i64,
    /// Reserved; the search provider does not report comment counts
    #[serde(default)]
    pub num_comments: i64,
}

/// A product recommendation extracted from thread comments and returned to
/// the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub product: String,
    pub reason: String,
    pub endorsement_score: Option<f64>,
    /// Thread the recommendation was extracted from
    #[serde(rename = "redditUrl")]
    pub reddit_url: String,
    /// Generated marketplace search link
    #[serde(rename = "amazonUrl")]
    pub amazon_url: String,
}

impl Recommendation {
    /// Score used for ranking and merging; a missing score counts as zero
    pub fn ranking_score(&self) -> f64 {
        self.endorsement_score.unwrap_or(0.0)
    }
}

/// Record stored in the query cache after a live computation.
///
/// Records are insert-only; several may exist for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSearch {
    pub query: String,
    pub threads: Vec<Thread>,
    pub recommendations: Vec<Recommendation>,
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// SerpAPI Types
// ============================================================================

/// One organic result from a SerpAPI search
#[derive(Debug, Clone, Deserialize)]
pub struct SerpResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// Response envelope from GET /search.json
#[derive(Debug, Default, Deserialize)]
pub struct SerpSearchResponse {
    #[serde(default)]
    pub organic_results: Vec<SerpResult>,
}

// ============================================================================
// Reddit API Types
// ============================================================================

/// One element of the two-listing payload returned by /comments/{id}.
///
/// The first listing describes the post, the second holds the comments;
/// both share this shape and only the comment fields are retained.
#[derive(Debug, Deserialize)]
pub struct RedditListing {
    #[serde(default)]
    pub data: RedditListingData,
}

#[derive(Debug, Default, Deserialize)]
pub struct RedditListingData {
    #[serde(default)]
    pub children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
pub struct RedditChild {
    #[serde(default)]
    pub data: RedditCommentData,
}

#[derive(Debug, Default, Deserialize)]
pub struct RedditCommentData {
    #[serde(default)]
    pub body: Option<String>,
}

/// Response from the password-grant token exchange
#[derive(Debug, Deserialize)]
pub struct RedditTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

// ============================================================================
// Extraction Model Types
// ============================================================================

/// Chat-completions request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions response; only the first choice's content is used
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Item shape the extraction model is instructed to emit
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedItem {
    pub product: String,
    pub reason: String,
    #[serde(default)]
    pub endorsement_score: Option<f64>,
}
