pub mod embeddings;
pub mod keywords;
pub mod semantic_search;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::{AnalysisConfig, KeywordConfig, SearchConfig};
use crate::database::{DatabaseError, PaperGraph};
use std::sync::Arc;
use thiserror::Error;

pub use embeddings::{Embedder, FastEmbedder};
pub use keywords::KeywordExtractor;
pub use semantic_search::{cosine_similarity, SimilarityResult};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Model error: {0}")]
    Model(String),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// The embedding model and the keyphrase extractor built on top of it.
#[derive(Clone)]
pub struct Analysis {
    pub embedder: Arc<dyn Embedder>,
    pub keyword_extractor: KeywordExtractor,
}

impl Analysis {
    pub fn new(config: &AnalysisConfig) -> AnalysisResult<Self> {
        let embedder = FastEmbedder::new(config.model_cache.clone())?;
        Ok(Self::with_embedder(Arc::new(embedder), config.keywords.clone()))
    }

    pub fn with_embedder(embedder: Arc<dyn Embedder>, keywords: KeywordConfig) -> Self {
        let keyword_extractor = KeywordExtractor::new(Arc::clone(&embedder), keywords);
        Self {
            embedder,
            keyword_extractor,
        }
    }

    pub fn model(&self) -> &str {
        self.embedder.model_name()
    }

    pub async fn find_papers_by_similarity(
        &self,
        store: &dyn PaperGraph,
        query: &str,
        search: SearchConfig,
    ) -> AnalysisResult<Vec<SimilarityResult>> {
        semantic_search::find_papers_by_similarity(store, self.embedder.as_ref(), query, search)
            .await
    }
}
