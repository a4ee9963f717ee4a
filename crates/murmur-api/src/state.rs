use std::sync::Arc;

use murmur_db::Database;
use murmur_sentiment::SentimentClassifier;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub classifier: SentimentClassifier,
}
