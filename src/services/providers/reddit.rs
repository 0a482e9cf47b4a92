use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client as HttpClient;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{RedditListing, RedditTokenResponse};

use super::CommentProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens are refreshed this long before their declared expiry
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(10);

/// Comment bodies at or under this length are dropped before extraction
const MIN_COMMENT_CHARS: usize = 20;

/// Per-thread ceiling on comments handed to the extraction model
const MAX_COMMENTS_PER_THREAD: usize = 15;

static POST_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Extracts the post id from a thread URL: the path segment following the
/// `comments/` marker. Threads without one contribute nothing downstream.
pub fn extract_post_id(url: &str) -> Option<String> {
    let pattern =
        POST_ID_PATTERN.get_or_init(|| Regex::new(r"comments/(\w+)").expect("valid pattern"));

    pattern
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

struct TokenState {
    value: String,
    expires_at: Instant,
}

/// Process-wide bearer token for the Reddit read API.
///
/// Fetched lazily via the password grant and cached until shortly before
/// expiry. Refresh is idempotent, so concurrent tasks may race to refresh;
/// the last writer wins and every racer still holds a usable token.
pub struct RedditTokenClient {
    http_client: HttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    user_agent: String,
    state: RwLock<Option<TokenState>>,
}

impl RedditTokenClient {
    pub fn new(config: &Config) -> Self {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            token_url: config.reddit_token_url.clone(),
            client_id: config.reddit_client_id.clone(),
            client_secret: config.reddit_client_secret.clone(),
            username: config.reddit_username.clone(),
            password: config.reddit_password.clone(),
            user_agent: config.reddit_user_agent.clone(),
            state: RwLock::new(None),
        }
    }

    /// Returns a bearer token, refreshing it when missing or near expiry
    pub async fn token(&self) -> AppResult<String> {
        if let Some(state) = self.state.read().await.as_ref() {
            if Instant::now() < state.expires_at {
                return Ok(state.value.clone());
            }
        }

        let token: RedditTokenResponse = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let ttl = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        let value = token.access_token;

        *self.state.write().await = Some(TokenState {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(expires_in = token.expires_in, "Reddit access token refreshed");
        Ok(value)
    }
}

/// Authenticated comment fetcher for single threads
pub struct RedditCommentProvider {
    http_client: HttpClient,
    api_url: String,
    user_agent: String,
    tokens: Arc<RedditTokenClient>,
}

impl RedditCommentProvider {
    pub fn new(config: &Config, tokens: Arc<RedditTokenClient>) -> Self {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_url: config.reddit_api_url.clone(),
            user_agent: config.reddit_user_agent.clone(),
            tokens,
        }
    }
}

#[async_trait]
impl CommentProvider for RedditCommentProvider {
    async fn fetch_comments(&self, post_id: &str) -> AppResult<Vec<String>> {
        let token = self.tokens.token().await?;
        let url = format!("{}/comments/{}", self.api_url, post_id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Reddit fetch failed with status {}",
                response.status()
            )));
        }

        let listings: Vec<RedditListing> = response.json().await?;
        let bodies = qualifying_bodies(&listings);

        tracing::debug!(post_id = %post_id, comments = bodies.len(), "Fetched thread comments");
        Ok(bodies)
    }
}

/// Pulls comment bodies out of the two-listing payload, keeping only
/// substantive ones, in response order
fn qualifying_bodies(listings: &[RedditListing]) -> Vec<String> {
    let Some(comment_listing) = listings.get(1) else {
        return Vec::new();
    };

    comment_listing
        .data
        .children
        .iter()
        .filter_map(|child| child.data.body.as_deref())
        .filter(|body| body.chars().count() > MIN_COMMENT_CHARS)
        .map(str::to_owned)
        .take(MAX_COMMENTS_PER_THREAD)
        .collect()
}
