//! Deterministic narrative summary assembled from review statistics and
//! theme exemplars.

use crate::review::{ReviewRecord, Sentiment};
use crate::themes::{self, AspectExemplars, ThemeEvidence};

pub const NO_REVIEWS_MESSAGE: &str = "No reviews found for analysis.";
pub const ELLIPSIS: &str = "...";
/// Source characters kept from the neutral highlight review.
pub const HIGHLIGHT_CHARS: usize = 150;

/// Aggregate numbers over every collected review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewStats {
    pub total: usize,
    pub mean_rating: f64,
    pub positive_percent: f64,
    pub negative_percent: f64,
}

impl ReviewStats {
    pub fn from_reviews(reviews: &[ReviewRecord]) -> Option<Self> {
        if reviews.is_empty() {
            return None;
        }
        let total = reviews.len();
        let count = |s: Sentiment| reviews.iter().filter(|r| r.sentiment() == s).count();

        Some(Self {
            total,
            mean_rating: reviews.iter().map(ReviewRecord::rating).sum::<f64>() / total as f64,
            positive_percent: count(Sentiment::Positive) as f64 * 100.0 / total as f64,
            negative_percent: count(Sentiment::Negative) as f64 * 100.0 / total as f64,
        })
    }
}

/// Overall tone label for the opening sentence.
pub fn sentiment_descriptor(positive_percent: f64, negative_percent: f64) -> &'static str {
    if positive_percent >= 80.0 {
        "overwhelmingly positive"
    } else if positive_percent >= 70.0 {
        "largely positive"
    } else if positive_percent >= 60.0 {
        "generally positive"
    } else if negative_percent >= 60.0 {
        "generally negative"
    } else {
        "mixed"
    }
}

/// Which closing sentence the summary ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Strong,
    Balanced,
    WeighCarefully,
}

impl Recommendation {
    /// Both the rating and the positive share must clear each bar.
    pub fn for_stats(stats: &ReviewStats) -> Self {
        if stats.mean_rating >= 4.0 && stats.positive_percent >= 70.0 {
            Recommendation::Strong
        } else if stats.mean_rating >= 3.5 && stats.positive_percent >= 60.0 {
            Recommendation::Balanced
        } else {
            Recommendation::WeighCarefully
        }
    }
}

/// Composes the full summary paragraph for `title` from `reviews`.
pub fn compose(reviews: &[ReviewRecord], title: &str) -> String {
    let Some(stats) = ReviewStats::from_reviews(reviews) else {
        return NO_REVIEWS_MESSAGE.to_string();
    };
    let evidence = themes::extract(reviews);

    let mut sentences = vec![format!(
        "Based on a detailed analysis of {} customer reviews, the {} has received {} reviews with an average rating of {:.1} out of 5 stars.",
        stats.total,
        title,
        sentiment_descriptor(stats.positive_percent, stats.negative_percent),
        stats.mean_rating,
    )];

    if let Some(praise) = aspect_clause(&evidence.positive) {
        sentences.push(format!("The standout features praised by customers include {praise}."));
    }
    if let Some(excerpt) = neutral_highlight(reviews) {
        sentences.push(format!("A balanced perspective from users notes that {excerpt}"));
    }
    if let Some(concerns) = aspect_clause(&evidence.negative) {
        sentences.push(format!("However, some users have expressed concerns about {concerns}."));
    }
    sentences.push(closing(&stats, &evidence));

    sentences.join(" ")
}

/// "the {aspect} ({longest exemplar})" for every aspect present, joined as a list.
fn aspect_clause(exemplars: &AspectExemplars) -> Option<String> {
    let points: Vec<String> = exemplars
        .iter()
        .filter_map(|(aspect, items)| {
            longest_first(items.iter().map(String::as_str))
                .map(|example| format!("the {} ({})", aspect.as_str(), example))
        })
        .collect();
    join_list(&points)
}

/// Longest string by char count; ties go to the earliest.
fn longest_first<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    items.fold(None::<&'a str>, |best, item| match best {
        Some(b) if b.chars().count() >= item.chars().count() => Some(b),
        _ => Some(item),
    })
}

fn join_list(points: &[String]) -> Option<String> {
    match points {
        [] => None,
        [only] => Some(only.clone()),
        [head @ .., last] => Some(format!("{}, and {}", head.join(", "), last)),
    }
}

/// Longest detailed Neutral review, cut to [`HIGHLIGHT_CHARS`] plus the ellipsis.
fn neutral_highlight(reviews: &[ReviewRecord]) -> Option<String> {
    let longest = longest_first(
        reviews
            .iter()
            .filter(|r| r.sentiment() == Sentiment::Neutral && themes::is_detailed(r))
            .map(ReviewRecord::text),
    )?;
    let excerpt: String = longest.chars().take(HIGHLIGHT_CHARS).collect();
    Some(format!("{excerpt}{ELLIPSIS}"))
}

fn closing(stats: &ReviewStats, evidence: &ThemeEvidence) -> String {
    match Recommendation::for_stats(stats) {
        Recommendation::Strong => {
            let valued: Vec<&str> = evidence
                .positive
                .iter()
                .take(2)
                .map(|(aspect, _)| aspect.as_str())
                .collect();
            let mut sentence = String::from(
                "Given the substantial positive feedback and high average rating, this product comes highly recommended by the majority of users",
            );
            if !valued.is_empty() {
                sentence.push_str(", particularly for those valuing ");
                sentence.push_str(&valued.join(" and "));
            }
            sentence.push('.');
            sentence
        }
        Recommendation::Balanced => "While most users are satisfied with their purchase, potential buyers should weigh the praised aspects against the reported limitations to ensure it meets their specific needs.".to_string(),
        Recommendation::WeighCarefully => "Given the mixed feedback, potential buyers should carefully consider these varied experiences and whether the reported issues might affect their intended use of the product.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POSITIVE: &str = "Great product, I love it.";
    const NEGATIVE: &str = "Terrible product, I hate it.";
    const NEUTRAL: &str = "It arrived on Tuesday in a cardboard box.";

    fn filler() -> String {
        " The package arrived on a Tuesday and the box had a label on it".repeat(4)
    }

    fn review(text: &str, rating: f64) -> ReviewRecord {
        ReviewRecord::new(text, rating).unwrap()
    }

    fn batch(spec: &[(&str, f64)]) -> Vec<ReviewRecord> {
        spec.iter().map(|(t, r)| review(t, *r)).collect()
    }

    #[test]
    fn test_no_reviews_short_circuits() {
        assert_eq!(compose(&[], "Widget"), NO_REVIEWS_MESSAGE);
        assert!(ReviewStats::from_reviews(&[]).is_none());
    }

    #[test]
    fn test_descriptor_thresholds() {
        assert_eq!(sentiment_descriptor(80.0, 0.0), "overwhelmingly positive");
        assert_eq!(sentiment_descriptor(79.9, 0.0), "largely positive");
        assert_eq!(sentiment_descriptor(70.0, 0.0), "largely positive");
        assert_eq!(sentiment_descriptor(60.0, 40.0), "generally positive");
        assert_eq!(sentiment_descriptor(10.0, 60.0), "generally negative");
        assert_eq!(sentiment_descriptor(50.0, 50.0), "mixed");
    }

    #[test]
    fn test_stats_cover_all_reviews() {
        let reviews = batch(&[(POSITIVE, 5.0), (NEGATIVE, 1.0), (NEUTRAL, 3.0), (POSITIVE, 4.0)]);
        let stats = ReviewStats::from_reviews(&reviews).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.mean_rating, 3.25);
        assert_eq!(stats.positive_percent, 50.0);
        assert_eq!(stats.negative_percent, 25.0);
    }

    #[test]
    fn test_high_share_but_low_rating_is_not_strong() {
        // 7 of 10 positive, mean rating 3.9
        let reviews = batch(&[
            (POSITIVE, 5.0), (POSITIVE, 5.0), (POSITIVE, 5.0), (POSITIVE, 4.0),
            (POSITIVE, 4.0), (POSITIVE, 4.0), (POSITIVE, 3.0),
            (NEUTRAL, 3.0), (NEUTRAL, 3.0), (NEUTRAL, 3.0),
        ]);
        let stats = ReviewStats::from_reviews(&reviews).unwrap();
        assert_eq!(stats.positive_percent, 70.0);
        assert!((stats.mean_rating - 3.9).abs() < 1e-9);
        assert_eq!(sentiment_descriptor(stats.positive_percent, stats.negative_percent), "largely positive");
        assert_eq!(Recommendation::for_stats(&stats), Recommendation::Balanced);

        let summary = compose(&reviews, "Widget");
        assert!(summary.contains("has received largely positive reviews with an average rating of 3.9 out of 5 stars."));
        assert!(!summary.contains("highly recommended"));
    }

    #[test]
    fn test_high_rating_but_low_share_is_not_strong() {
        let stats = ReviewStats {
            total: 10,
            mean_rating: 4.8,
            positive_percent: 50.0,
            negative_percent: 0.0,
        };
        assert_eq!(Recommendation::for_stats(&stats), Recommendation::WeighCarefully);
    }

    #[test]
    fn test_full_summary_layout() {
        let praise_a = format!("Great build quality, I love it. Excellent{}", filler());
        let praise_b = format!("Great build quality and the material is great, I love it. Excellent{}", filler());
        let praise_c = format!("The price is great, I love it. Excellent{}", filler());
        let complaint = format!("Terrible warranty, I hate it. Awful{}", filler());
        let neutral = format!("It came with a manual{}", filler());
        let reviews = batch(&[
            (&praise_a, 5.0),
            (&praise_b, 5.0),
            (&praise_c, 4.0),
            (POSITIVE, 5.0),
            (&complaint, 1.0),
            (&neutral, 5.0),
        ]);
        let highlight: String = neutral.chars().take(150).collect();

        let expected = format!(
            "Based on a detailed analysis of 6 customer reviews, the Widget has received generally positive reviews with an average rating of 4.2 out of 5 stars. \
             The standout features praised by customers include the quality (great build quality and the material is great, i love it), and the value (the price is great, i love it). \
             A balanced perspective from users notes that {highlight}... \
             However, some users have expressed concerns about the support (terrible warranty, i hate it). \
             While most users are satisfied with their purchase, potential buyers should weigh the praised aspects against the reported limitations to ensure it meets their specific needs."
        );
        assert_eq!(compose(&reviews, "Widget"), expected);
    }

    #[test]
    fn test_strong_recommendation_names_first_two_aspects() {
        let praise = format!("Great support and excellent design and a fair price, I love it{}", filler());
        let reviews = batch(&[(&praise, 5.0), (POSITIVE, 5.0), (POSITIVE, 4.0), (POSITIVE, 4.0)]);
        let summary = compose(&reviews, "Widget");
        assert!(summary.ends_with("particularly for those valuing value and design."));
    }

    #[test]
    fn test_strong_recommendation_without_aspects() {
        let reviews = batch(&[(POSITIVE, 5.0), (POSITIVE, 5.0)]);
        let summary = compose(&reviews, "Widget");
        assert!(summary.ends_with("comes highly recommended by the majority of users."));
    }

    #[test]
    fn test_single_clause_has_no_conjunction() {
        let points = vec!["the quality (solid)".to_string()];
        assert_eq!(join_list(&points).unwrap(), "the quality (solid)");
        let points = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(join_list(&points).unwrap(), "a, b, and c");
    }

    #[test]
    fn test_longest_exemplar_ties_keep_first() {
        let items = ["abc", "xyz", "ab"];
        assert_eq!(longest_first(items.into_iter()), Some("abc"));
    }

    #[test]
    fn test_neutral_highlight_is_bounded() {
        let long_neutral = "word ".repeat(100);
        let reviews = batch(&[(&long_neutral, 3.0)]);
        let highlight = neutral_highlight(&reviews).unwrap();
        assert!(highlight.ends_with(ELLIPSIS));
        assert_eq!(highlight.chars().count(), HIGHLIGHT_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_highlight_picks_longest_neutral_review() {
        let shorter = format!("It came with a manual{}", filler());
        let longer = format!("It came with a manual and a spare charging cable{}", filler());
        let reviews = batch(&[(&shorter, 3.0), (POSITIVE, 5.0), (&longer, 4.0), (NEUTRAL, 3.0)]);
        let excerpt: String = longer.chars().take(HIGHLIGHT_CHARS).collect();

        let summary = compose(&reviews, "Widget");
        assert!(summary.contains(&format!("A balanced perspective from users notes that {excerpt}... ")));
    }

    #[test]
    fn test_short_neutral_reviews_are_not_highlighted() {
        let reviews = batch(&[(NEUTRAL, 3.0)]);
        assert!(neutral_highlight(&reviews).is_none());
    }
}
