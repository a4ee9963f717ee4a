use serde::Deserialize;

/// The two endpoint generations never agreed on a response schema, so the
/// decode step is a union over every shape seen in the wild. Variants are
/// tried in order; a payload matching none of them is an attempt failure,
/// not a crash.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClassifierResponse {
    /// `{"data": [{"label": "POSITIVE", ...}]}`
    Labeled { data: Vec<LabeledPrediction> },
    /// `{"data": ["positive"]}`
    Plain { data: Vec<String> },
    /// `{"data": [[{"label": "LABEL_2", ...}]]}`
    NestedData { data: Vec<Vec<LabeledPrediction>> },
    /// `[[{"label": "LABEL_2", ...}]]`
    Nested(Vec<Vec<LabeledPrediction>>),
}

/// One prediction object. Extra fields (score, confidence) are ignored.
#[derive(Debug, Deserialize)]
pub struct LabeledPrediction {
    pub label: String,
}

impl ClassifierResponse {
    /// Raw label of the first prediction, if the payload carried one.
    /// The request always batches a single text, so the first entry is
    /// the only one that matters.
    pub fn first_label(&self) -> Option<&str> {
        match self {
            Self::Labeled { data } => data.first().map(|p| p.label.as_str()),
            Self::Plain { data } => data.first().map(String::as_str),
            Self::NestedData { data } => {
                data.first().and_then(|inner| inner.first()).map(|p| p.label.as_str())
            }
            Self::Nested(outer) => {
                outer.first().and_then(|inner| inner.first()).map(|p| p.label.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_label(json: &str) -> Option<String> {
        serde_json::from_str::<ClassifierResponse>(json)
            .ok()?
            .first_label()
            .map(str::to_string)
    }

    #[test]
    fn decodes_labeled_objects() {
        let label = first_label(r#"{"data":[{"label":"POSITIVE","score":0.98}]}"#);
        assert_eq!(label.as_deref(), Some("POSITIVE"));
    }

    #[test]
    fn decodes_plain_strings() {
        let label = first_label(r#"{"data":["negative"]}"#);
        assert_eq!(label.as_deref(), Some("negative"));
    }

    #[test]
    fn decodes_nested_arrays() {
        let label = first_label(r#"{"data":[[{"label":"LABEL_2","score":0.7}]]}"#);
        assert_eq!(label.as_deref(), Some("LABEL_2"));

        let bare = first_label(r#"[[{"label":"LABEL_0"}]]"#);
        assert_eq!(bare.as_deref(), Some("LABEL_0"));
    }

    #[test]
    fn empty_batches_yield_no_label() {
        assert_eq!(first_label(r#"{"data":[]}"#), None);
        assert_eq!(first_label(r#"{"data":[[]]}"#), None);
    }

    #[test]
    fn unrecognized_payloads_fail_to_decode() {
        assert!(serde_json::from_str::<ClassifierResponse>(r#"{"error":"overloaded"}"#).is_err());
        assert!(serde_json::from_str::<ClassifierResponse>("not json at all").is_err());
    }
}
