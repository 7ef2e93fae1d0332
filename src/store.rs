//! Saving analyses for later retrieval.
//!
//! Saved records expire 24 hours after they are written. The datastore is a
//! collaborator behind [`AnalysisStore`]; [`MemoryStore`] keeps records in
//! process memory and is what the server uses by default.

use crate::analysis::Analysis;
use crate::error::ClausewiseError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Lifetime of a saved analysis.
pub const SAVE_TTL_HOURS: i64 = 24;

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Loose email shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    RE_EMAIL.is_match(email)
}

/// Confirmation of a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAnalysisRecord {
    pub id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Persists analyses.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(
        &self,
        email: &str,
        analysis: &Analysis,
    ) -> Result<SavedAnalysisRecord, ClausewiseError>;
}

struct StoredAnalysis {
    record: SavedAnalysisRecord,
    analysis: Analysis,
}

/// In-process store. Expired records are dropped lazily on every save.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredAnalysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unexpired analysis by id.
    pub async fn get(&self, id: &str) -> Option<(SavedAnalysisRecord, Analysis)> {
        let records = self.records.read().await;
        records
            .get(id)
            .filter(|s| s.record.expires_at > Utc::now())
            .map(|s| (s.record.clone(), s.analysis.clone()))
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn save(
        &self,
        email: &str,
        analysis: &Analysis,
    ) -> Result<SavedAnalysisRecord, ClausewiseError> {
        let now = Utc::now();
        let record = SavedAnalysisRecord {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            expires_at: now + Duration::hours(SAVE_TTL_HOURS),
        };

        let mut records = self.records.write().await;
        records.retain(|_, s| s.record.expires_at > now);
        records.insert(
            record.id.clone(),
            StoredAnalysis {
                record: record.clone(),
                analysis: analysis.clone(),
            },
        );
        info!(id = %record.id, "Analysis saved");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackAnalyzer;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn save_assigns_id_and_24h_expiry() {
        let store = MemoryStore::new();
        let analysis = FallbackAnalyzer::default().analyze("lease", None);
        let before = Utc::now();
        let rec = store.save("jane@example.com", &analysis).await.unwrap();

        assert!(!rec.id.is_empty());
        let ttl = rec.expires_at - before;
        assert!(ttl >= Duration::hours(24));
        assert!(ttl < Duration::hours(24) + Duration::seconds(5));

        let (stored, stored_analysis) = store.get(&rec.id).await.unwrap();
        assert_eq!(stored.email, "jane@example.com");
        assert_eq!(stored_analysis, analysis);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = MemoryStore::new();
        let analysis = FallbackAnalyzer::default().analyze("nda", None);
        let a = store.save("a@b.co", &analysis).await.unwrap();
        let b = store.save("a@b.co", &analysis).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 2);
    }
}
