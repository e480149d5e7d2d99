use super::{AnalysisError, AnalysisResult};
use crate::config::EMBEDDING_MODEL;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

pub const EMBEDDING_DIMENSION: usize = 384;

/// Sentence embedding model used for keyphrases, stored papers and queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> AnalysisResult<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> AnalysisResult<Vec<Vec<f32>>>;

    fn model_name(&self) -> &str;
}

#[derive(Clone)]
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Load all-MiniLM-L6-v2, downloading it into `cache_dir` on first use.
    pub fn new(cache_dir: Option<PathBuf>) -> AnalysisResult<Self> {
        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options)
            .map_err(|e| AnalysisError::Model(format!("Failed to load {}: {}", EMBEDDING_MODEL, e)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }

    async fn run(&self, texts: Vec<String>) -> AnalysisResult<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || {
            let mut model = model.lock();
            model.embed(texts, None)
        })
        .await
        .map_err(|e| AnalysisError::Embedding(format!("Embedding task failed: {}", e)))?
        .map_err(|e| AnalysisError::Embedding(e.to_string()))
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, text: &str) -> AnalysisResult<Vec<f32>> {
        self.run(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::Embedding("No embedding generated".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> AnalysisResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts.to_vec()).await
    }

    fn model_name(&self) -> &str {
        EMBEDDING_MODEL
    }
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &EMBEDDING_MODEL)
            .field("dimension", &EMBEDDING_DIMENSION)
            .finish()
    }
}
