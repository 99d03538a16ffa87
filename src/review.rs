use crate::sentiment;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Sentiment label attached to a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// One review pulled from a listing page.
///
/// Fields are private so the invariants hold for every record: the rating lies
/// in `[1.0, 5.0]` and the sentiment is always derived from the text.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    text: String,
    rating: f64,
    sentiment: Sentiment,
}

impl ReviewRecord {
    /// Builds a record, classifying the trimmed text. Returns `None` when the
    /// rating is out of range or not a number.
    pub fn new(text: &str, rating: f64) -> Option<Self> {
        if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return None;
        }
        let text = text.trim().to_string();
        let sentiment = sentiment::classify(&text);
        Some(Self {
            text,
            rating,
            sentiment,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    /// Character count of the review text.
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }
}
