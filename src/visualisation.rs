use crate::analysis::SimilarityResult;
use crate::database::PaperRow;
use crate::document::loader::DOI_RESOLVER;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_OUTPUT_FILE: &str = "visualized_results.html";

const ROOT_COLOR: &str = "red";
const PAPER_COLOR: &str = "#97C2FC";
const ROOT_SIZE: u32 = 30;
const PAPER_SIZE: u32 = 20;
const DEFAULT_SIMILARITY: f32 = 0.5;

#[derive(Error, Debug)]
pub enum VisualisationError {
    #[error("Failed to write visualisation: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialise graph: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A search hit as drawn in the network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphPaper {
    pub title: Option<String>,
    pub doi: Option<String>,
    pub similarity: Option<f32>,
}

impl From<&PaperRow> for GraphPaper {
    fn from(row: &PaperRow) -> Self {
        Self {
            title: row.title.clone(),
            doi: row.doi.clone(),
            similarity: None,
        }
    }
}

impl From<&SimilarityResult> for GraphPaper {
    fn from(result: &SimilarityResult) -> Self {
        Self {
            title: Some(result.title.clone()),
            doi: Some(result.doi.clone()),
            similarity: Some(result.similarity),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisualiseOptions {
    pub output_file: PathBuf,
    pub use_similarity: bool,
    pub base_length: f32,
    pub scale: f32,
    pub open_browser: bool,
}

impl Default for VisualiseOptions {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            use_similarity: false,
            base_length: 50.0,
            scale: 200.0,
            open_browser: true,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct Node {
    id: String,
    label: String,
    title: String,
    size: u32,
    color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Edge {
    from: String,
    to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<f32>,
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn doi_link(doi: &str) -> Option<String> {
    if doi.is_empty() || doi == "No DOI" {
        None
    } else if doi.starts_with("http") {
        Some(doi.to_string())
    } else {
        Some(format!("{}{}", DOI_RESOLVER, doi))
    }
}

fn build_network(
    papers: &[GraphPaper],
    central_label: &str,
    options: &VisualiseOptions,
) -> (Vec<Node>, Vec<Edge>) {
    let mut nodes = vec![Node {
        id: central_label.to_string(),
        label: central_label.to_string(),
        title: "Search root".to_string(),
        size: ROOT_SIZE,
        color: ROOT_COLOR,
        shape: None,
        link: None,
    }];
    let mut edges = Vec::with_capacity(papers.len());

    for (idx, paper) in papers.iter().enumerate() {
        let id = format!("paper_{}", idx + 1);
        let title = paper.title.as_deref().unwrap_or("No title");
        let doi = paper.doi.as_deref().unwrap_or("No DOI");
        let similarity = options
            .use_similarity
            .then(|| paper.similarity.unwrap_or(DEFAULT_SIMILARITY));

        let mut tooltip = format!(
            "Title: {}<br>DOI: {}",
            escape_html(title),
            escape_html(doi)
        );
        if let Some(similarity) = similarity {
            tooltip.push_str(&format!("<br>Similarity: {:.2}", similarity));
        }

        nodes.push(Node {
            id: id.clone(),
            label: title.to_string(),
            title: tooltip,
            size: PAPER_SIZE,
            color: PAPER_COLOR,
            shape: Some("dot"),
            link: doi_link(doi),
        });
        edges.push(Edge {
            from: central_label.to_string(),
            to: id,
            length: similarity.map(|s| options.base_length + (1.0 - s) * options.scale),
        });
    }

    (nodes, edges)
}

fn script_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<script type="text/javascript" src="https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js"></script>
<style type="text/css">
  body { margin: 0; background-color: #222222; }
  #network { width: 100%; height: 750px; background-color: #222222; }
</style>
</head>
<body>
<div id="network"></div>
<script type="text/javascript">
  const rawNodes = __NODES__;
  const rawEdges = __EDGES__;
  rawNodes.forEach(function (node) {
    const tooltip = document.createElement("div");
    tooltip.innerHTML = node.title;
    node.title = tooltip;
  });
  const nodes = new vis.DataSet(rawNodes);
  const edges = new vis.DataSet(rawEdges);
  const options = {
    nodes: { font: { color: "white" } },
    edges: { color: { inherit: true } },
    physics: { enabled: true }
  };
  const network = new vis.Network(
    document.getElementById("network"),
    { nodes: nodes, edges: edges },
    options
  );
  network.on("click", function (params) {
    if (params.nodes.length === 0) {
      return;
    }
    const node = nodes.get(params.nodes[0]);
    if (node && node.link) {
      window.open(node.link, "_blank");
    }
  });
</script>
</body>
</html>
"#;

pub fn render_html(
    papers: &[GraphPaper],
    central_label: &str,
    options: &VisualiseOptions,
) -> Result<String, VisualisationError> {
    let (nodes, edges) = build_network(papers, central_label, options);
    Ok(TEMPLATE
        .replace("__TITLE__", &escape_html(central_label))
        .replace("__NODES__", &script_json(&nodes)?)
        .replace("__EDGES__", &script_json(&edges)?))
}

/// Write the search results as a vis-network page around a root node labelled
/// `central_label`, then open it in the browser if asked to.
pub fn visualise_output(
    papers: &[GraphPaper],
    central_label: &str,
    options: &VisualiseOptions,
) -> Result<PathBuf, VisualisationError> {
    let html = render_html(papers, central_label, options)?;
    write_file(&options.output_file, &html)?;
    info!(
        "Wrote visualisation of {} papers to {}",
        papers.len(),
        options.output_file.display()
    );

    if options.open_browser {
        let target = std::fs::canonicalize(&options.output_file)
            .unwrap_or_else(|_| options.output_file.clone());
        if let Err(e) = webbrowser::open(&target.to_string_lossy()) {
            warn!("Could not open browser for {}: {}", target.display(), e);
        }
    }

    Ok(options.output_file.clone())
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(dir: &Path, use_similarity: bool) -> VisualiseOptions {
        VisualiseOptions {
            output_file: dir.join("graph.html"),
            use_similarity,
            open_browser: false,
            ..VisualiseOptions::default()
        }
    }

    fn paper(title: &str, doi: Option<&str>, similarity: Option<f32>) -> GraphPaper {
        GraphPaper {
            title: Some(title.to_string()),
            doi: doi.map(str::to_string),
            similarity,
        }
    }

    #[test]
    fn test_default_options() {
        let options = VisualiseOptions::default();
        assert_eq!(options.output_file, PathBuf::from("visualized_results.html"));
        assert_eq!(options.base_length, 50.0);
        assert_eq!(options.scale, 200.0);
        assert!(options.open_browser);
        assert!(!options.use_similarity);
    }

    #[test]
    fn test_empty_results_still_write_a_file() {
        let dir = tempdir().unwrap();
        let path = visualise_output(&[], "quantum", &options(dir.path(), false)).unwrap();

        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("\"id\":\"quantum\""));
        assert!(html.contains("Search root"));
        assert!(!html.contains("paper_1"));
    }

    #[test]
    fn test_network_without_similarity() {
        let dir = tempdir().unwrap();
        let papers = vec![
            paper("Graph Search", Some("https://doi.org/10.1/abc"), None),
            paper("Bare DOI", Some("10.2/xyz"), None),
            paper("No Link", Some("No DOI"), None),
        ];

        let (nodes, edges) = build_network(&papers, "graph", &options(dir.path(), false));

        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].color, "red");
        assert_eq!(nodes[0].size, 30);
        assert_eq!(nodes[1].id, "paper_1");
        assert_eq!(nodes[1].color, "#97C2FC");
        assert_eq!(nodes[1].shape, Some("dot"));
        assert_eq!(nodes[1].title, "Title: Graph Search<br>DOI: https://doi.org/10.1/abc");
        assert_eq!(nodes[1].link.as_deref(), Some("https://doi.org/10.1/abc"));
        assert_eq!(nodes[2].link.as_deref(), Some("https://doi.org/10.2/xyz"));
        assert_eq!(nodes[3].link, None);
        assert!(edges.iter().all(|e| e.from == "graph" && e.length.is_none()));
    }

    #[test]
    fn test_network_with_similarity() {
        let dir = tempdir().unwrap();
        let papers = vec![
            paper("Close", None, Some(0.9)),
            paper("Unscored", None, None),
        ];

        let (nodes, edges) = build_network(&papers, "query", &options(dir.path(), true));

        assert_eq!(nodes[1].title, "Title: Close<br>DOI: No DOI<br>Similarity: 0.90");
        assert!((edges[0].length.unwrap() - 70.0).abs() < 1e-3);
        assert!((edges[1].length.unwrap() - 150.0).abs() < 1e-3);
        assert!(nodes[2].title.ends_with("Similarity: 0.50"));
    }

    #[test]
    fn test_html_escapes_markup() {
        let dir = tempdir().unwrap();
        let papers = vec![paper("<script>alert(1)</script>", None, None)];
        let html = render_html(&papers, "x", &options(dir.path(), false)).unwrap();

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_graph_paper_from_similarity_result() {
        let result = SimilarityResult {
            title: "T".to_string(),
            author: "A".to_string(),
            doi: "D".to_string(),
            similarity: 0.42,
        };
        let paper = GraphPaper::from(&result);
        assert_eq!(paper.similarity, Some(0.42));
        assert_eq!(paper.title.as_deref(), Some("T"));
    }
}
