use super::embeddings::Embedder;
use super::keywords::tokenize;
use super::{AnalysisError, AnalysisResult};
use crate::config::EMBEDDING_MODEL;
use async_trait::async_trait;

/// Deterministic bag-of-words embedder: one dimension per vocabulary word, valued
/// by how often the word occurs in the text.
pub struct WordEmbedder {
    vocabulary: Vec<String>,
    should_fail: bool,
}

impl WordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_string()).collect(),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            vocabulary: vec!["unused".to_string()],
            should_fail: true,
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        self.vocabulary
            .iter()
            .map(|word| tokens.iter().filter(|t| *t == word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for WordEmbedder {
    async fn embed(&self, text: &str) -> AnalysisResult<Vec<f32>> {
        if self.should_fail {
            return Err(AnalysisError::Embedding("Mock embedding failure".to_string()));
        }
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> AnalysisResult<Vec<Vec<f32>>> {
        if self.should_fail {
            return Err(AnalysisError::Embedding("Mock embedding failure".to_string()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        EMBEDDING_MODEL
    }
}
