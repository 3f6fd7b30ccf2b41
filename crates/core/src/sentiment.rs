//! Keyword sentiment classifier.
//!
//! Classification happens once at submission time and the result is stored
//! on the row, so re-tuning the word lists never rewrites history.

use std::cmp::Ordering;

use feedboard_db::entities::feedback::Sentiment;

const POSITIVE_WORDS: [&str; 8] = [
    "great",
    "excellent",
    "amazing",
    "love",
    "perfect",
    "awesome",
    "good",
    "fantastic",
];

const NEGATIVE_WORDS: [&str; 7] = [
    "bad",
    "terrible",
    "awful",
    "hate",
    "worst",
    "poor",
    "disappointing",
];

/// Classify a comment into a sentiment bucket.
///
/// Each keyword is counted at most once per comment (presence, not
/// frequency) and matches anywhere in the lowercased text. More positive
/// hits than negative wins positive, the reverse wins negative, and ties
/// (including no hits at all) fall back to neutral.
#[must_use]
pub fn classify(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();

    let positive = hits(&lowered, &POSITIVE_WORDS);
    let negative = hits(&lowered, &NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        Ordering::Greater => Sentiment::Positive,
        Ordering::Less => Sentiment::Negative,
        Ordering::Equal => Sentiment::Neutral,
    }
}

fn hits(lowered: &str, words: &[&str]) -> usize {
    words.iter().filter(|word| lowered.contains(**word)).count()
}
