//! HTTP client for the external sentiment classifier.
//!
//! The classifier is best-effort by contract: [`SentimentClassifier::classify`]
//! always returns a label, degrading to [`Sentiment::Neutral`] when both
//! endpoints are down or keep answering garbage. Callers never see an error.

pub mod label;
pub mod response;
pub mod retry;

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

pub use label::{Sentiment, parse_label};

use response::ClassifierResponse;
use retry::{Attempt, AttemptFailure, Step, is_transient_status, next_step};

/// Endpoints and tuning for the classifier chain.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub primary_url: String,
    pub fallback_url: String,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// Sleep before the single primary retry after a transient failure.
    pub backoff: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://ozgur1-sentiment-analyzer.hf.space/api/predict".into(),
            fallback_url: "https://ozgur1-sentiment-analyzer.hf.space/run/predict".into(),
            timeout: Duration::from_secs(25),
            backoff: Duration::from_millis(2500),
        }
    }
}

pub struct SentimentClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl SentimentClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create reqwest client");

        Self { client, config }
    }

    /// Classify one text. Walks the attempt chain (primary, one backed-off
    /// primary retry on a transient status, then the fallback endpoint)
    /// and returns neutral once the chain is exhausted.
    pub async fn classify(&self, text: &str) -> Sentiment {
        let mut attempt = Attempt::Primary;

        loop {
            let url = match attempt {
                Attempt::Primary | Attempt::PrimaryRetry => &self.config.primary_url,
                Attempt::Fallback => &self.config.fallback_url,
            };

            let failure = match self.call(url, text).await {
                Ok(label) => return label,
                Err(failure) => failure,
            };
            warn!("Sentiment attempt {:?} failed ({:?})", attempt, failure);

            match next_step(attempt, failure) {
                Step::Proceed(next) => attempt = next,
                Step::BackoffThen(next) => {
                    tokio::time::sleep(self.config.backoff).await;
                    attempt = next;
                }
                Step::GiveUp => return Sentiment::Neutral,
            }
        }
    }

    /// One POST to one endpoint. The text rides as a single-element batch,
    /// which is what both endpoint generations expect.
    async fn call(&self, url: &str, text: &str) -> Result<Sentiment, AttemptFailure> {
        let resp = self
            .client
            .post(url)
            .json(&json!({ "data": [text] }))
            .send()
            .await
            .map_err(|e| {
                debug!("Classifier request to {} failed: {}", url, e);
                AttemptFailure::Permanent
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(if is_transient_status(status.as_u16()) {
                AttemptFailure::Transient
            } else {
                AttemptFailure::Permanent
            });
        }

        let parsed: ClassifierResponse = resp.json().await.map_err(|e| {
            debug!("Classifier response from {} undecodable: {}", url, e);
            AttemptFailure::Permanent
        })?;

        match parsed.first_label() {
            Some(raw) => Ok(parse_label(raw)),
            None => Err(AttemptFailure::Permanent),
        }
    }
}
