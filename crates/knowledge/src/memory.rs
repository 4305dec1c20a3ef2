//! In-process vector collection.

use crate::collection::{QueryResult, Record, VectorCollection};
use crate::embeddings::{cosine_distance, Embedder, TrigramEmbedder};
use crate::filter::Filter;
use std::sync::{Arc, RwLock};
use tutor_core::{AppError, AppResult};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: Record,
    embedding: Vec<f32>,
}

/// A collection held in memory and searched by brute-force cosine distance.
#[derive(Debug)]
pub struct InMemoryCollection {
    name: String,
    embedder: Arc<dyn Embedder>,
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryCollection {
    /// Create an empty collection with the given embedder.
    pub fn new(name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            name: name.into(),
            embedder,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty collection backed by trigram embeddings.
    pub fn with_trigrams(name: impl Into<String>, dimensions: usize) -> Self {
        Self::new(name, Arc::new(TrigramEmbedder::new(dimensions)))
    }

    fn poisoned(&self) -> AppError {
        AppError::RetrievalBackend(format!("Collection '{}' lock poisoned", self.name))
    }
}

#[async_trait::async_trait]
impl VectorCollection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        text: &str,
        filter: Option<&Filter>,
        n_results: usize,
    ) -> AppResult<QueryResult> {
        if n_results == 0 {
            return Ok(QueryResult::default());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let records = self.records.read().map_err(|_| self.poisoned())?;
        let mut scored: Vec<(&StoredRecord, f32)> = records
            .iter()
            .filter(|stored| filter.map_or(true, |f| f.matches(&stored.record.metadata)))
            .map(|stored| (stored, cosine_distance(&query_embedding, &stored.embedding)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(n_results);

        tracing::debug!(
            "Collection '{}' returned {} of {} records",
            self.name,
            scored.len(),
            records.len()
        );

        let mut result = QueryResult::default();
        for (stored, distance) in scored {
            result.ids.push(stored.record.id.clone());
            result.documents.push(stored.record.document.clone());
            result.metadata.push(stored.record.metadata.clone());
            result.distances.push(distance);
        }

        Ok(result)
    }

    async fn upsert(&self, records: Vec<Record>) -> AppResult<()> {
        let documents: Vec<String> = records.iter().map(|r| r.document.clone()).collect();
        let embeddings = self.embedder.embed_batch(&documents).await?;

        let mut stored = self.records.write().map_err(|_| self.poisoned())?;
        for (record, embedding) in records.into_iter().zip(embeddings) {
            let entry = StoredRecord { record, embedding };
            match stored.iter_mut().find(|s| s.record.id == entry.record.id) {
                Some(existing) => *existing = entry,
                None => stored.push(entry),
            }
        }

        Ok(())
    }

    async fn get_all(&self) -> AppResult<Vec<Record>> {
        let records = self.records.read().map_err(|_| self.poisoned())?;
        Ok(records.iter().map(|s| s.record.clone()).collect())
    }

    async fn count(&self) -> AppResult<usize> {
        let records = self.records.read().map_err(|_| self.poisoned())?;
        Ok(records.len())
    }
}
