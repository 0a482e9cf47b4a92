use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{ExtractedItem, Recommendation, Thread};
use crate::services::providers::CompletionProvider;

/// System instruction for the extraction model
const EXTRACTION_SYSTEM_PROMPT: &str = "You extract product recommendations from Reddit comments. \
    Return ONLY valid JSON. No markdown, no explanation, no text before or after the array.";

const AMAZON_SEARCH_URL: &str = "https://www.amazon.com/s";

/// Limits under which a product name is too generic to search for on its own
const VAGUE_NAME_MAX_WORDS: usize = 2;
const VAGUE_NAME_MAX_CHARS: usize = 20;

/// Knobs for turning parsed model output into final recommendations
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Affiliate tag appended to generated search links
    pub affiliate_tag: String,
    /// Append the query to searches for short, generic product names
    pub broaden_vague_products: bool,
}

/// Turns one thread's comments into structured recommendations via the
/// extraction model
pub struct RecommendationExtractor {
    model: Arc<dyn CompletionProvider>,
    options: ExtractorOptions,
}

impl RecommendationExtractor {
    pub fn new(model: Arc<dyn CompletionProvider>, options: ExtractorOptions) -> Self {
        Self { model, options }
    }

    /// Extracts endorsed recommendations from one thread's comments.
    ///
    /// The model's reply is untrusted; a reply that cannot be parsed
    /// degrades this thread to an empty contribution rather than failing
    /// the request.
    pub async fn extract(
        &self,
        query: &str,
        thread: &Thread,
        comments: &[String],
    ) -> AppResult<Vec<Recommendation>> {
        let prompt = build_prompt(query, comments);
        let raw = self.model.complete(EXTRACTION_SYSTEM_PROMPT, &prompt).await?;

        let items = match parse_item_array(&raw) {
            Some(items) => items,
            None => {
                tracing::warn!(
                    thread_url = %thread.url,
                    raw_prefix = %raw.chars().take(300).collect::<String>(),
                    "Discarding unparseable extraction output"
                );
                return Ok(Vec::new());
            }
        };

        tracing::debug!(thread_url = %thread.url, items = items.len(), "Extraction parsed");

        Ok(items
            .into_iter()
            .map(|item| self.enrich(item, thread, query))
            .collect())
    }

    fn enrich(&self, item: ExtractedItem, thread: &Thread, query: &str) -> Recommendation {
        let amazon_url = self.amazon_search_link(&item.product, query);
        Recommendation {
            product: item.product,
            reason: item.reason,
            endorsement_score: item.endorsement_score,
            reddit_url: thread.url.clone(),
            amazon_url,
        }
    }

    /// Builds the marketplace search link for a product, broadening overly
    /// generic names with the original query
    fn amazon_search_link(&self, product: &str, query: &str) -> String {
        let term = if self.options.broaden_vague_products && is_vague_name(product, query) {
            format!("{} {}", product, query)
        } else {
            product.to_string()
        };

        let params = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("k", &term)
            .append_pair("tag", &self.options.affiliate_tag)
            .finish();

        format!("{}?{}", AMAZON_SEARCH_URL, params)
    }
}

/// A name is vague when it is short (at most 2 words and 20 characters) and
/// does not already mention the query
fn is_vague_name(product: &str, query: &str) -> bool {
    let name = product.trim();
    name.split_whitespace().count() <= VAGUE_NAME_MAX_WORDS
        && name.chars().count() <= VAGUE_NAME_MAX_CHARS
        && !name.to_lowercase().contains(&query.to_lowercase())
}

/// Numbers each comment and embeds the block in the extraction instruction
fn build_prompt(query: &str, comments: &[String]) -> String {
    let comment_block = comments
        .iter()
        .enumerate()
        .map(|(i, comment)| format!("{}. {}", i + 1, comment))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are an assistant extracting only **clearly endorsed product recommendations** from Reddit comments about "{query}".

Only include products that are explicitly recommended or praised as something the commenter has personally used or strongly supports.

Skip vague mentions, jokes, comparisons, speculation, or off-topic products. It is perfectly acceptable to return an empty list if no clear recommendations are found.

For each recommendation, return:
- "product": The name of the product being recommended.
- "reason": A brief explanation of why users recommended that specific product.
  - The reason MUST be tailored to that product, not a generic sentence reused for multiple items.
  - If a single comment mentions several products, create separate entries and make the reason specific to each item.
  - Include one or two direct quotes from Reddit users in the reason when possible. Wrap quotes in curly smart quotes ({left_quote} and {right_quote}).
- "endorsement_score": A number from 0 to 1 representing the strength of the endorsement:
  - 0.81-1.00 = Strong, repeated, enthusiastic endorsements by multiple users
  - 0.51-0.80 = Recommended clearly by at least one user
  - 0.21-0.50 = Mentioned with some endorsement but less certainty or consensus
  - 0.00-0.20 = Do not include these

Very important:
- Do NOT reuse the exact same "reason" text for different products.
- Each "reason" must mention at least one detail or benefit that applies uniquely or concretely to that specific product.

Output must be valid JSON with no markdown, no intro, and no trailing comments. Return only the array.

Comments:
{comment_block}"#,
        left_quote = '\u{201C}',
        right_quote = '\u{201D}',
    )
}

/// Pulls the lone JSON array out of untrusted model text.
///
/// The reply may wrap the array in prose or code fences; everything between
/// the first `[` and the last `]` is treated as the payload. Either stage
/// failing yields `None`.
fn parse_item_array(raw: &str) -> Option<Vec<ExtractedItem>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }

    serde_json::from_str(&raw[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockCompletionProvider;

    fn thread() -> Thread {
        Thread {
            title: "What pond liner do you trust?".to_string(),
            url: "https://www.reddit.com/r/ponds/comments/a1/what_pond_liner/".to_string(),
            subreddit: "ponds".to_string(),
            score: 0,
            num_comments: 0,
        }
    }

    fn extractor_with_reply(reply: &str) -> RecommendationExtractor {
        let reply = reply.to_string();
        let mut model = MockCompletionProvider::new();
        model
            .expect_complete()
            .returning(move |_, _| Ok(reply.clone()));

        RecommendationExtractor::new(
            Arc::new(model),
            ExtractorOptions {
                affiliate_tag: "askred-20".to_string(),
                broaden_vague_products: true,
            },
        )
    }

    #[test]
    fn test_parse_item_array_plain() {
        let items = parse_item_array(
            r#"[{"product": "Firestone Pond Liner", "reason": "durable", "endorsement_score": 0.9}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product, "Firestone Pond Liner");
    }

    #[test]
    fn test_parse_item_array_strips_fences_and_prose() {
        let raw = "Sure! Here you go:\n```json\n[{\"product\": \"Pond Armor\", \"reason\": \"seals well\"}]\n```\nHope that helps.";
        let items = parse_item_array(raw).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].endorsement_score.is_none());
    }

    #[test]
    fn test_parse_item_array_rejects_garbage() {
        assert!(parse_item_array("no recommendations here").is_none());
        assert!(parse_item_array("] backwards [").is_none());
        assert!(parse_item_array("[{\"product\": }]").is_none());
    }

    #[test]
    fn test_build_prompt_numbers_comments_and_names_query() {
        let prompt = build_prompt(
            "pond liner",
            &["first comment".to_string(), "second comment".to_string()],
        );

        assert!(prompt.contains("\"pond liner\""));
        assert!(prompt.contains("1. first comment"));
        assert!(prompt.contains("2. second comment"));
        assert!(prompt.contains("Return only the array."));
    }

    #[test]
    fn test_vague_name_is_broadened_with_query() {
        let extractor = extractor_with_reply("[]");
        let link = extractor.amazon_search_link("liner", "pond");
        assert!(link.contains("k=liner+pond"));
        assert!(link.contains("tag=askred-20"));
    }

    #[test]
    fn test_specific_name_is_used_as_is() {
        let extractor = extractor_with_reply("[]");
        let link = extractor.amazon_search_link("Firestone FPL-4545 Pond Liner", "pond");
        assert!(link.contains("k=Firestone+FPL-4545+Pond+Liner"));
    }

    #[test]
    fn test_name_containing_query_is_not_broadened() {
        let extractor = extractor_with_reply("[]");
        let link = extractor.amazon_search_link("pond pump", "pond");
        assert!(link.contains("k=pond+pump"));
        assert!(!link.contains("k=pond+pump+pond"));
    }

    #[test]
    fn test_broadening_can_be_disabled() {
        let mut extractor = extractor_with_reply("[]");
        extractor.options.broaden_vague_products = false;
        let link = extractor.amazon_search_link("liner", "pond");
        assert!(link.contains("k=liner&"));
    }

    #[tokio::test]
    async fn test_extract_enriches_items_with_links() {
        let extractor = extractor_with_reply(
            r#"[{"product": "Firestone Pond Liner", "reason": "durable", "endorsement_score": 0.9}]"#,
        );

        let recs = extractor
            .extract("pond liner", &thread(), &["a comment".to_string()])
            .await
            .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].reddit_url, thread().url);
        assert!(recs[0].amazon_url.starts_with("https://www.amazon.com/s?k="));
    }

    #[tokio::test]
    async fn test_extract_degrades_on_unparseable_reply() {
        let extractor = extractor_with_reply("I could not find any recommendations, sorry!");

        let recs = extractor
            .extract("pond liner", &thread(), &["a comment".to_string()])
            .await
            .unwrap();

        assert!(recs.is_empty());
    }
}
