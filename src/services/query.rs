use url::Url;

/// Host substring that marks a marketplace product link
const MARKETPLACE_HOST_MARKER: &str = "amazon.";

/// Path segment adjacent to the product slug in marketplace product URLs
const PRODUCT_DETAIL_SEGMENT: &str = "dp";

/// Canonicalizes a raw user query: unwraps Amazon product links into their
/// human-readable keywords, then trims and lowercases.
///
/// Returns `None` when nothing usable remains.
pub fn normalize_query(raw: &str) -> Option<String> {
    let text = keywords_from_marketplace_url(raw).unwrap_or_else(|| raw.to_string());

    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Recovers a searchable product title from an Amazon product URL.
///
/// Prefers the slug next to the `dp` path segment (the one before it, or,
/// for bare `/dp/<slug>` links, the one after) with `-`/`_` turned into
/// spaces; falls back to the `keywords` query parameter with `%`/`+` turned
/// into spaces. Returns `None` for anything that is not an Amazon link.
fn keywords_from_marketplace_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !parsed.host_str()?.contains(MARKETPLACE_HOST_MARKER) {
        return None;
    }

    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    let title = segments
        .iter()
        .position(|segment| *segment == PRODUCT_DETAIL_SEGMENT)
        .and_then(|marker| segments[..marker].last().or_else(|| segments.get(marker + 1)))
        .map(|slug| slug.replace(['-', '_'], " "))
        .filter(|slug| !slug.trim().is_empty());

    let keywords = parsed
        .query_pairs()
        .find(|(key, _)| key == "keywords")
        .map(|(_, value)| value.replace(['%', '+'], " "))
        .filter(|value| !value.trim().is_empty());

    title.or(keywords)
}
