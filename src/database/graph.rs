use super::DatabaseError;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// A paper as written to the store: node fields plus the authors and topics it links to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub filename: String,
    pub title: String,
    pub year: String,
    pub doi: String,
    pub authors: Vec<String>,
    pub topics: Vec<String>,
    pub embedding: Vec<f32>,
}

/// One row of a listing or keyword search. Columns a query does not return stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperRow {
    pub filename: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
    pub doi: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPaper {
    pub filename: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
    pub doi: Option<String>,
    pub embedding: Vec<f32>,
}

/// Paper, Author and Topic nodes joined by WROTE and HAS_TOPIC edges.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaperGraph: Send + Sync {
    async fn verify_connectivity(&self) -> Result<String, DatabaseError>;

    /// Merge the paper node, keeping existing fields, then its author and topic edges.
    async fn add_paper(&self, paper: &PaperRecord) -> Result<(), DatabaseError>;

    async fn list_papers(&self) -> Result<Vec<PaperRow>, DatabaseError>;

    async fn search_by_title(&self, value: &str) -> Result<Vec<PaperRow>, DatabaseError>;

    async fn search_by_author(&self, value: &str) -> Result<Vec<PaperRow>, DatabaseError>;

    /// One row per paper and author; `topic` is the first matching topic by name.
    async fn search_by_topic(&self, value: &str) -> Result<Vec<PaperRow>, DatabaseError>;

    async fn papers_with_embeddings(&self) -> Result<Vec<EmbeddedPaper>, DatabaseError>;
}
