use std::collections::HashMap;

use crate::models::Recommendation;

/// Hard cap on recommendations returned to a caller
pub const MAX_RESULTS: usize = 12;

/// Deduplicates, ranks, and caps the flattened per-thread results.
///
/// Input order is thread order, then within-thread extraction order. A key
/// collision keeps the incumbent unless the challenger has a strictly higher
/// endorsement score (missing scores count as zero) or an equal score with a
/// strictly longer reason. Survivors are sorted by score descending; the
/// sort is stable, so equal scores keep first-encountered order.
pub fn aggregate(flattened: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut winners: Vec<Recommendation> = Vec::new();
    let mut slot_by_key: HashMap<String, usize> = HashMap::new();

    for item in flattened {
        let key = dedup_key(&item);
        match slot_by_key.get(&key) {
            None => {
                slot_by_key.insert(key, winners.len());
                winners.push(item);
            }
            Some(&slot) => {
                if beats(&item, &winners[slot]) {
                    winners[slot] = item;
                }
            }
        }
    }

    winners.sort_by(|a, b| b.ranking_score().total_cmp(&a.ranking_score()));
    winners.truncate(MAX_RESULTS);
    winners
}

fn beats(challenger: &Recommendation, incumbent: &Recommendation) -> bool {
    let challenger_score = challenger.ranking_score();
    let incumbent_score = incumbent.ranking_score();

    challenger_score > incumbent_score
        || (challenger_score == incumbent_score
            && challenger.reason.chars().count() > incumbent.reason.chars().count())
}

/// Composite identity for merging duplicates: the normalized product name,
/// plus the lowercased marketplace link when present
pub fn dedup_key(item: &Recommendation) -> String {
    let mut key = normalize_name(&item.product);
    if !item.amazon_url.is_empty() {
        key.push_str("::");
        key.push_str(&item.amazon_url.to_lowercase());
    }
    key
}

/// Lowercases and collapses non-alphanumeric runs to single spaces
fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_space = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.push(ch);
        } else {
            pending_space = true;
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(product: &str, score: Option<f64>, reason: &str) -> Recommendation {
        Recommendation {
            product: product.to_string(),
            reason: reason.to_string(),
            endorsement_score: score,
            reddit_url: "https://www.reddit.com/r/ponds/comments/a1/liners/".to_string(),
            amazon_url: format!(
                "https://www.amazon.com/s?k={}&tag=askred-20",
                product.to_lowercase().replace(' ', "+")
            ),
        }
    }

    #[test]
    fn test_name_variants_collapse_to_one_key() {
        let a = rec("Firestone Pond Liner", Some(0.9), "durable");
        let b = rec("firestone   pond-liner!!", Some(0.8), "cheap");

        // Same name modulo punctuation; force identical links so only the
        // name normalization is under test.
        let mut b = b;
        b.amazon_url = a.amazon_url.clone();

        assert_eq!(dedup_key(&a), dedup_key(&b));
    }

    #[test]
    fn test_differing_links_keep_items_distinct() {
        let a = rec("Pond Armor", Some(0.5), "seals well");
        let mut b = rec("Pond Armor", Some(0.6), "easy to apply");
        b.amazon_url = "https://www.amazon.com/s?k=pond+armor+epoxy&tag=askred-20".to_string();

        assert_ne!(dedup_key(&a), dedup_key(&b));
        assert_eq!(aggregate(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_collision_prefers_higher_score() {
        let weak = rec("Firestone Pond Liner", Some(0.4), "mentioned once");
        let strong = rec("Firestone Pond Liner", Some(0.9), "praised repeatedly");

        let merged = aggregate(vec![weak, strong]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].endorsement_score, Some(0.9));
    }

    #[test]
    fn test_collision_on_equal_score_prefers_longer_reason() {
        let short = rec("Firestone Pond Liner", Some(0.7), "good");
        let long = rec(
            "Firestone Pond Liner",
            Some(0.7),
            "good, UV-resistant, and fish-safe per several owners",
        );

        let merged = aggregate(vec![short, long]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].reason.len() > 10);
    }

    #[test]
    fn test_collision_keeps_incumbent_on_full_tie() {
        let first = rec("Firestone Pond Liner", Some(0.7), "solid");
        let second = rec("Firestone Pond Liner", Some(0.7), "great");

        let merged = aggregate(vec![first, second]);
        assert_eq!(merged[0].reason, "solid");
    }

    #[test]
    fn test_missing_score_ranks_as_zero() {
        let unscored = rec("Mystery Liner", None, "someone linked it");
        let scored = rec("Firestone Pond Liner", Some(0.3), "weak mention");

        let ranked = aggregate(vec![unscored, scored]);
        assert_eq!(ranked[0].product, "Firestone Pond Liner");
        assert_eq!(ranked[1].product, "Mystery Liner");
    }

    #[test]
    fn test_sorted_descending_and_capped() {
        let input: Vec<Recommendation> = (0..15)
            .map(|i| rec(&format!("Liner {}", i), Some(f64::from(i) / 20.0), "fine"))
            .collect();

        let ranked = aggregate(input);
        assert_eq!(ranked.len(), MAX_RESULTS);

        for pair in ranked.windows(2) {
            assert!(pair[0].ranking_score() >= pair[1].ranking_score());
        }
        // The three weakest items fell off the end.
        assert!(ranked.iter().all(|r| r.ranking_score() >= 3.0 / 20.0));
    }

    #[test]
    fn test_equal_scores_keep_first_encountered_order() {
        let first = rec("Pond Armor", Some(0.5), "seals well");
        let second = rec("Aquascape Liner", Some(0.5), "flexible");

        let ranked = aggregate(vec![first, second]);
        assert_eq!(ranked[0].product, "Pond Armor");
        assert_eq!(ranked[1].product, "Aquascape Liner");
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let input = vec![
            rec("Firestone Pond Liner", Some(0.9), "durable"),
            rec("firestone pond liner", Some(0.4), "okay"),
            rec("Pond Armor", None, "linked"),
            rec("Aquascape Liner", Some(0.6), "flexible"),
        ];

        let once = aggregate(input);
        let twice = aggregate(once.clone());
        assert_eq!(once, twice);
    }
}
