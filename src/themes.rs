//! Keyword-taxonomy theme extraction.
//!
//! Detailed reviews (more than [`DETAIL_THRESHOLD`] characters) from the
//! positive and negative buckets are scanned for the eight product aspects.
//! For each aspect a review mentions, the first sentence fragment containing
//! one of the aspect's keywords becomes that review's exemplar.

use crate::review::{ReviewRecord, Sentiment};

/// Minimum text length (in chars, exclusive) for a review to be themed.
pub const DETAIL_THRESHOLD: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aspect {
    Quality,
    Value,
    Performance,
    Features,
    Design,
    Usability,
    Reliability,
    Support,
}

/// The aspect taxonomy in declared order. Output order follows this table.
pub const TAXONOMY: [(Aspect, &[&str]); 8] = [
    (Aspect::Quality, &["quality", "build", "material", "durability", "construction"]),
    (Aspect::Value, &["price", "value", "worth", "cost", "expensive", "cheap"]),
    (Aspect::Performance, &["performance", "speed", "fast", "slow", "efficient"]),
    (Aspect::Features, &["feature", "functionality", "options", "capabilities"]),
    (Aspect::Design, &["design", "look", "aesthetic", "style", "appearance"]),
    (Aspect::Usability, &["easy", "simple", "intuitive", "user-friendly", "difficult"]),
    (Aspect::Reliability, &["reliable", "consistent", "stable", "issues", "problems"]),
    (Aspect::Support, &["support", "customer service", "warranty", "help"]),
];

impl Aspect {
    pub fn as_str(self) -> &'static str {
        match self {
            Aspect::Quality => "quality",
            Aspect::Value => "value",
            Aspect::Performance => "performance",
            Aspect::Features => "features",
            Aspect::Design => "design",
            Aspect::Usability => "usability",
            Aspect::Reliability => "reliability",
            Aspect::Support => "support",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Exemplar fragments per aspect for one sentiment bucket, in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AspectExemplars {
    slots: [Vec<String>; 8],
}

impl AspectExemplars {
    pub fn get(&self, aspect: Aspect) -> &[String] {
        &self.slots[aspect.index()]
    }

    /// Aspects with at least one exemplar, in taxonomy order.
    pub fn iter(&self) -> impl Iterator<Item = (Aspect, &[String])> + '_ {
        TAXONOMY
            .iter()
            .map(move |(aspect, _)| (*aspect, self.get(*aspect)))
            .filter(|(_, exemplars)| !exemplars.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    fn push(&mut self, aspect: Aspect, exemplar: String) {
        self.slots[aspect.index()].push(exemplar);
    }
}

/// Theme exemplars kept separately for the positive and negative buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeEvidence {
    pub positive: AspectExemplars,
    pub negative: AspectExemplars,
}

/// Whether a review is long enough to contribute themes or a neutral highlight.
pub fn is_detailed(review: &ReviewRecord) -> bool {
    review.len_chars() > DETAIL_THRESHOLD
}

/// Builds theme evidence from classified reviews. Neutral reviews are ignored.
pub fn extract(reviews: &[ReviewRecord]) -> ThemeEvidence {
    ThemeEvidence {
        positive: extract_bucket(reviews, Sentiment::Positive),
        negative: extract_bucket(reviews, Sentiment::Negative),
    }
}

fn extract_bucket(reviews: &[ReviewRecord], bucket: Sentiment) -> AspectExemplars {
    let mut exemplars = AspectExemplars::default();

    for review in reviews
        .iter()
        .filter(|r| r.sentiment() == bucket && is_detailed(r))
    {
        let text = review.text().to_lowercase();
        for (aspect, keywords) in TAXONOMY.iter() {
            if let Some(fragment) = first_matching_fragment(&text, keywords) {
                exemplars.push(*aspect, fragment);
            }
        }
    }

    exemplars
}

/// First period-delimited fragment of `text` that mentions any keyword.
fn first_matching_fragment(text: &str, keywords: &[&str]) -> Option<String> {
    if !keywords.iter().any(|k| text.contains(k)) {
        return None;
    }
    text.split('.')
        .map(str::trim)
        .find(|fragment| !fragment.is_empty() && keywords.iter().any(|k| fragment.contains(k)))
        .map(str::to_string)
}
