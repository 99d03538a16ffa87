//! Lexicon-based sentiment classifier for review text.
//!
//! Each known word carries a polarity in `[-1, 1]`. A preceding intensifier
//! ("very", "extremely", ...) scales the word, and a negator within the two
//! previous tokens flips and dampens it. The text polarity is the mean over all
//! scored words. No external ML dependencies.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::review::Sentiment;

/// Polarity above which text is Positive; below the negation of it, Negative.
pub const POLARITY_THRESHOLD: f64 = 0.1;

const NEGATION_FACTOR: f64 = -0.5;
const NEGATION_WINDOW: usize = 2;

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    vec![
        // positive
        ("good", 0.7), ("great", 0.8), ("excellent", 1.0), ("amazing", 0.6),
        ("awesome", 1.0), ("wonderful", 1.0), ("fantastic", 0.4), ("superb", 1.0),
        ("outstanding", 0.5), ("brilliant", 0.9), ("love", 0.5), ("loved", 0.7),
        ("loves", 0.5), ("best", 1.0), ("better", 0.5), ("perfect", 1.0),
        ("perfectly", 1.0), ("happy", 0.8), ("pleased", 0.5), ("nice", 0.6),
        ("beautiful", 0.85), ("impressive", 1.0), ("impressed", 1.0),
        ("recommend", 0.4), ("recommended", 0.4), ("satisfied", 0.5),
        ("sturdy", 0.4), ("solid", 0.3), ("comfortable", 0.4), ("easy", 0.43),
        ("fast", 0.2), ("reliable", 0.4), ("helpful", 0.4), ("useful", 0.3),
        ("worth", 0.3), ("fine", 0.4), ("cool", 0.35), ("glad", 0.5),
        ("favorite", 0.5), ("incredible", 0.9), ("exceptional", 0.67),
        ("remarkable", 0.75), ("delightful", 1.0), ("pleasant", 0.73),
        ("smooth", 0.4), ("durable", 0.4), ("efficient", 0.4), ("effective", 0.6),
        ("intuitive", 0.4), ("enjoy", 0.4), ("enjoyed", 0.4), ("works", 0.2),
        // negative
        ("bad", -0.7), ("terrible", -1.0), ("awful", -1.0), ("horrible", -1.0),
        ("poor", -0.4), ("poorly", -0.4), ("worst", -1.0), ("worse", -0.4),
        ("hate", -0.8), ("hated", -0.9), ("disappointing", -0.6),
        ("disappointed", -0.75), ("disappointment", -0.6), ("useless", -0.5),
        ("waste", -0.5), ("broken", -0.4), ("broke", -0.4), ("flimsy", -0.5),
        ("defective", -0.6), ("faulty", -0.6), ("junk", -0.6), ("garbage", -0.7),
        ("annoying", -0.8), ("frustrating", -0.7), ("frustrated", -0.7),
        ("difficult", -0.5), ("slow", -0.3), ("expensive", -0.5),
        ("overpriced", -0.6), ("mediocre", -0.5), ("unreliable", -0.5),
        ("unstable", -0.4), ("problem", -0.3), ("problems", -0.3),
        ("issue", -0.2), ("issues", -0.2), ("wrong", -0.5), ("fail", -0.5),
        ("failed", -0.5), ("fails", -0.5), ("sad", -0.5), ("angry", -0.5),
        ("uncomfortable", -0.5), ("pathetic", -1.0), ("ridiculous", -0.33),
        ("unfortunately", -0.5), ("sadly", -0.5), ("cheaply", -0.4),
        ("avoid", -0.4), ("refund", -0.2),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    vec![
        ("very", 1.3), ("really", 1.2), ("extremely", 1.5), ("super", 1.3),
        ("so", 1.2), ("incredibly", 1.5), ("absolutely", 1.4), ("highly", 1.3),
        ("quite", 1.1), ("totally", 1.3),
    ]
    .into_iter()
    .collect()
});

const NEGATORS: &[&str] = &["not", "no", "never", "nothing", "hardly", "neither", "nor", "cannot"];

fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token) || token.ends_with("n't")
}

/// Punctuation that ends an intensifier or negation scope.
const CLAUSE_BREAKS: &[char] = &[',', '.', '!', '?', ';', ':'];

fn clauses(text: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    text.split(CLAUSE_BREAKS)
        .map(tokenize)
        .filter(|tokens| !tokens.is_empty())
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphabetic() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Polarity of `text` in `[-1, 1]`. Text without any known word scores `0.0`.
pub fn polarity(text: &str) -> f64 {
    let mut scores = Vec::new();
    for tokens in clauses(text) {
        score_clause(&tokens, &mut scores);
    }

    if scores.is_empty() {
        return 0.0;
    }
    (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
}

/// Scores every known word of one clause. Modifiers never look past the
/// start of the clause.
fn score_clause(tokens: &[String], scores: &mut Vec<f64>) {
    for (i, token) in tokens.iter().enumerate() {
        let Some(&base) = LEXICON.get(token.as_str()) else {
            continue;
        };

        let mut score = base;
        if i > 0 {
            if let Some(&factor) = INTENSIFIERS.get(tokens[i - 1].as_str()) {
                score = (score * factor).clamp(-1.0, 1.0);
            }
        }
        if tokens[i.saturating_sub(NEGATION_WINDOW)..i]
            .iter()
            .any(|t| is_negator(t))
        {
            score *= NEGATION_FACTOR;
        }
        scores.push(score);
    }
}

/// Classifies review text. Blank text is Neutral and never scored.
pub fn classify(text: &str) -> Sentiment {
    let text = text.trim();
    if text.is_empty() {
        return Sentiment::Neutral;
    }

    let score = polarity(text);
    if score > POLARITY_THRESHOLD {
        Sentiment::Positive
    } else if score < -POLARITY_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
