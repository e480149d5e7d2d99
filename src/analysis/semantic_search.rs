use super::embeddings::Embedder;
use super::AnalysisResult;
use crate::config::SearchConfig;
use crate::database::{EmbeddedPaper, PaperGraph};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const NO_DOI: &str = "No DOI";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub title: String,
    pub author: String,
    pub doi: String,
    pub similarity: f32,
}

/// Cosine similarity, 0.0 for zero vectors or mismatched lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Score stored papers against a query vector, keeping the `top_n` best at or
/// above `threshold`.
pub fn rank_by_similarity(
    query: &[f32],
    papers: Vec<EmbeddedPaper>,
    search: SearchConfig,
) -> Vec<SimilarityResult> {
    let mut results: Vec<SimilarityResult> = papers
        .into_iter()
        .filter_map(|paper| {
            if paper.embedding.is_empty() {
                return None;
            }
            if paper.embedding.len() != query.len() {
                warn!(
                    "Skipping {}: embedding has {} dimensions, query has {}",
                    paper.filename,
                    paper.embedding.len(),
                    query.len()
                );
                return None;
            }

            let similarity = cosine_similarity(query, &paper.embedding);
            if similarity < search.threshold {
                return None;
            }

            Some(SimilarityResult {
                title: non_empty(paper.title).unwrap_or_else(|| UNTITLED.to_string()),
                author: non_empty(paper.author).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                doi: non_empty(paper.doi).unwrap_or_else(|| NO_DOI.to_string()),
                similarity,
            })
        })
        .collect();

    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    results.truncate(search.top_n);
    results
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn find_papers_by_similarity(
    store: &dyn PaperGraph,
    embedder: &dyn Embedder,
    query: &str,
    search: SearchConfig,
) -> AnalysisResult<Vec<SimilarityResult>> {
    let papers = store.papers_with_embeddings().await?;
    if papers.is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder.embed(query).await?;
    let results = rank_by_similarity(&query_embedding, papers, search);
    debug!("Semantic search for '{}' matched {} papers", query, results.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::WordEmbedder;
    use crate::database::MockPaperGraph;

    fn stored(filename: &str, title: Option<&str>, embedding: Vec<f32>) -> EmbeddedPaper {
        EmbeddedPaper {
            filename: filename.to_string(),
            title: title.map(str::to_string),
            author: None,
            year: None,
            doi: None,
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_applies_threshold_and_defaults() {
        let papers = vec![
            stored("a.pdf", Some("Close"), vec![1.0, 0.1]),
            stored("b.pdf", None, vec![0.6, 0.8]),
            stored("c.pdf", Some("Far"), vec![0.0, 1.0]),
            stored("d.pdf", Some("Empty"), vec![]),
        ];
        let search = SearchConfig {
            top_n: 15,
            threshold: 0.2,
        };

        let results = rank_by_similarity(&[1.0, 0.0], papers, search);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Close");
        assert_eq!(results[1].title, UNTITLED);
        assert_eq!(results[1].author, UNKNOWN_AUTHOR);
        assert_eq!(results[1].doi, NO_DOI);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn test_rank_truncates_to_top_n() {
        let papers = (0..20)
            .map(|i| stored(&format!("{i}.pdf"), Some("Paper"), vec![1.0, i as f32 / 100.0]))
            .collect();
        let search = SearchConfig {
            top_n: 15,
            threshold: 0.2,
        };

        let results = rank_by_similarity(&[1.0, 0.0], papers, search);
        assert_eq!(results.len(), 15);
        assert!(results
            .windows(2)
            .all(|pair| pair[0].similarity >= pair[1].similarity));
    }

    #[test]
    fn test_rank_skips_mismatched_dimensions() {
        let papers = vec![stored("a.pdf", Some("Wrong"), vec![1.0, 0.0, 0.0])];
        let results = rank_by_similarity(&[1.0, 0.0], papers, SearchConfig::default());
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_find_papers_by_similarity() {
        let mut store = MockPaperGraph::new();
        store.expect_papers_with_embeddings().times(1).returning(|| {
            Ok(vec![
                stored("graphs.pdf", Some("Graph Search"), vec![1.0, 0.0]),
                stored("vision.pdf", Some("Image Models"), vec![0.0, 1.0]),
            ])
        });
        let embedder = WordEmbedder::new(&["graph", "image"]);

        let results =
            find_papers_by_similarity(&store, &embedder, "graph", SearchConfig::default())
                .await
                .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Graph Search");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_find_papers_with_empty_store() {
        let mut store = MockPaperGraph::new();
        store
            .expect_papers_with_embeddings()
            .returning(|| Ok(Vec::new()));
        let embedder = WordEmbedder::with_failure();

        let results =
            find_papers_by_similarity(&store, &embedder, "anything", SearchConfig::default())
                .await
                .unwrap();
        assert!(results.is_empty());
    }
}
