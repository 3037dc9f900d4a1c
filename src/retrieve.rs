//! Query-time retrieval over a loaded index snapshot.

use anyhow::Result;
use std::sync::Arc;

use crate::embedding::{embed_query, Embedder};
use crate::index::VectorIndex;
use crate::models::RetrievedChunk;

pub struct Retriever {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Return up to `k` chunks nearest the query embedding, best first.
    /// An empty index yields an empty list, not an error.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = embed_query(self.embedder.as_ref(), query).await?;
        Ok(self.index.search(&query_vec, k))
    }
}
