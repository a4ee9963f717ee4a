use serde::{Deserialize, Serialize};

/// Three-valued sentiment attached to every stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Glyph shown next to the message.
    pub fn emoji(self) -> &'static str {
        match self {
            Sentiment::Positive => "😃",
            Sentiment::Negative => "😠",
            Sentiment::Neutral => "😐",
        }
    }
}

/// Map a raw classifier label onto the three-valued scale.
///
/// Substring matching on purpose: the predict endpoint emits labels like
/// "POSITIVE" or "very negative tone", while the router endpoint names
/// its classes "LABEL_0" / "LABEL_2". Anything unrecognized is neutral.
pub fn parse_label(raw: &str) -> Sentiment {
    let lower = raw.to_lowercase();
    if lower.contains("pos") || lower.contains("label_2") {
        Sentiment::Positive
    } else if lower.contains("neg") || lower.contains("label_0") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}
