use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::db::PostgresCache;
use crate::services::extractor::{ExtractorOptions, RecommendationExtractor};
use crate::services::pipeline::SearchPipeline;
use crate::services::providers::{
    OpenAiChatProvider, RedditCommentProvider, RedditTokenClient, SerpApiProvider,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SearchPipeline>,
}

impl AppState {
    /// Wires the live collaborators from configuration
    pub fn new(config: &Config, pool: PgPool) -> Self {
        let tokens = Arc::new(RedditTokenClient::new(config));

        let search = Arc::new(SerpApiProvider::new(
            config.serpapi_key.clone(),
            config.serpapi_url.clone(),
        ));
        let comments = Arc::new(RedditCommentProvider::new(config, tokens));
        let model = Arc::new(OpenAiChatProvider::new(
            config.openai_api_key.clone(),
            config.openai_api_url.clone(),
            config.extraction_model.clone(),
        ));

        let extractor = Arc::new(RecommendationExtractor::new(
            model,
            ExtractorOptions {
                affiliate_tag: config.amazon_affiliate_tag.clone(),
                broaden_vague_products: config.broaden_vague_products,
            },
        ));
        let cache = Arc::new(PostgresCache::new(pool));

        let pipeline = SearchPipeline::new(search, comments, extractor, cache);

        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Builds state around an already-assembled pipeline; integration tests
    /// use this to substitute stub collaborators
    pub fn with_pipeline(pipeline: SearchPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
