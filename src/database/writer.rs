use super::graph::{PaperGraph, PaperRecord};
use crate::analysis::{AnalysisResult, Embedder};
use crate::document::Paper;

impl PaperRecord {
    pub fn from_paper(paper: &Paper, embedding: Vec<f32>) -> Self {
        Self {
            filename: paper.filename.clone(),
            title: paper.title.clone(),
            year: paper.year.clone(),
            doi: paper.doi.clone(),
            authors: if paper.author.is_empty() {
                Vec::new()
            } else {
                vec![paper.author.clone()]
            },
            topics: paper.topics.clone(),
            embedding,
        }
    }
}

/// Embed the paper's main keyphrase and merge it into the store.
pub async fn add_paper(
    store: &dyn PaperGraph,
    embedder: &dyn Embedder,
    paper: &Paper,
) -> AnalysisResult<()> {
    let embedding = embedder.embed(&paper.main_keyphrase).await?;
    store
        .add_paper(&PaperRecord::from_paper(paper, embedding))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::WordEmbedder;
    use crate::database::{GraphDatabase, MockPaperGraph};

    fn paper() -> Paper {
        Paper {
            filename: "graphs.pdf".to_string(),
            title: "Graph Learning".to_string(),
            author: "Ada Lovelace".to_string(),
            year: "2021".to_string(),
            topics: vec!["graph learning".to_string(), "message passing".to_string()],
            main_keyphrase: "graph learning".to_string(),
            doi: "https://doi.org/10.1000/graphs".to_string(),
            ..Paper::default()
        }
    }

    #[test]
    fn test_record_from_paper() {
        let record = PaperRecord::from_paper(&paper(), vec![1.0]);
        assert_eq!(record.filename, "graphs.pdf");
        assert_eq!(record.year, "2021");
        assert_eq!(record.authors, vec!["Ada Lovelace"]);
        assert_eq!(record.topics.len(), 2);

        let anonymous = Paper {
            author: String::new(),
            ..paper()
        };
        assert!(PaperRecord::from_paper(&anonymous, vec![]).authors.is_empty());
    }

    #[tokio::test]
    async fn test_add_paper_embeds_main_keyphrase() {
        let mut store = MockPaperGraph::new();
        store
            .expect_add_paper()
            .withf(|record| record.embedding == vec![1.0, 0.0] && record.year == "2021")
            .times(1)
            .returning(|_| Ok(()));
        let embedder = WordEmbedder::new(&["graph", "vision"]);

        add_paper(&store, &embedder, &paper()).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_paper_round_trips_through_store() {
        let db = GraphDatabase::open_in_memory().await.unwrap();
        let embedder = WordEmbedder::new(&["graph", "learning"]);

        add_paper(&db, &embedder, &paper()).await.unwrap();

        let stored = db.papers_with_embeddings().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].embedding, vec![1.0, 1.0]);
        assert_eq!(stored[0].year.as_deref(), Some("2021"));
    }

    #[tokio::test]
    async fn test_add_paper_embedding_failure_skips_write() {
        let mut store = MockPaperGraph::new();
        store.expect_add_paper().times(0);

        let result = add_paper(&store, &WordEmbedder::with_failure(), &paper()).await;
        assert!(result.is_err());
    }
}
