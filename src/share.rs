//! Pre-filled share links for a finished reading.

use crate::models::{DreamInterpretation, GeneratedImage};

const TWEET_INTENT: &str = "https://twitter.com/intent/tweet";
const SNIPPET_CHARS: usize = 50;
const HASHTAGS: &str = "#DreamReading #AI";

#[derive(Debug, Clone, PartialEq)]
pub struct ShareLinks {
    pub image: String,
    pub interpretation: String,
    pub combined: String,
}

impl ShareLinks {
    pub fn build(image: &GeneratedImage, interpretation: &DreamInterpretation) -> Self {
        let symbolic = snippet(&interpretation.symbolic_meaning);
        let positive = snippet(&interpretation.positive_aspects);

        let image_link = format!(
            "{}?text={}&url={}",
            TWEET_INTENT,
            urlencoding::encode("AI turned my dream into an image!"),
            urlencoding::encode(&image.url)
        );

        let summary = format!(
            "I had my dream read by #AIDreamOracle!\n\n\
             Symbolic meaning: {}\n\n\
             Positive aspects: {}\n\n\
             {}",
            symbolic, positive, HASHTAGS
        );

        let combined = format!(
            "I had my dream read by #AIDreamOracle!\n\n\
             Symbolic meaning: {}\n\n\
             Image: {}\n\n\
             {}",
            symbolic, image.url, HASHTAGS
        );

        Self {
            image: image_link,
            interpretation: tweet_link(&summary),
            combined: tweet_link(&combined),
        }
    }
}

fn tweet_link(text: &str) -> String {
    format!("{}?text={}", TWEET_INTENT, urlencoding::encode(text))
}

/// First [`SNIPPET_CHARS`] characters followed by an ellipsis.
pub fn snippet(text: &str) -> String {
    let head: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", head)
}
