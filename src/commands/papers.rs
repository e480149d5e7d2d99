use crate::analysis::Analysis;
use crate::database::{add_paper, PaperGraph};
use crate::document::loader::{expand_home, papers_load};
use crate::terminal::{papers_table, terminal_width, OutputSink};
use log::error;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub async fn list_papers(
    tokens: &[&str],
    store: &dyn PaperGraph,
    output: &dyn OutputSink,
) -> Result<(), String> {
    let words: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    if words != ["lp"] && words != ["list", "papers"] {
        output.write_line(&format!("Unknown command '{}'", tokens.join(" ")));
        return Ok(());
    }

    let rows = store
        .list_papers()
        .await
        .map_err(|e| format!("Database error: {}", e))?;
    if rows.is_empty() {
        output.write_line("No papers found.");
        return Ok(());
    }

    output.write_line(&format!("=== {} papers in the database ===", rows.len()));
    output.write_line(&papers_table(&rows, terminal_width()));
    Ok(())
}

/// Validate the directory and start loading it in the background. The returned
/// task reports its progress through `output`.
pub fn add_papers(
    tokens: &[&str],
    path: &str,
    store: Arc<dyn PaperGraph>,
    analysis: Arc<Analysis>,
    output: Arc<dyn OutputSink>,
) -> Option<JoinHandle<()>> {
    if tokens.len() <= 1 {
        output.write_line(&format!("Unknown command '{}'", tokens.join(" ")));
        return None;
    }

    let path = path.to_string();
    let dir = expand_home(&path);
    if !dir.exists() {
        output.write_line(&format!(
            "Error: Path-'{}' doesn't exist, please enter correct path!",
            path
        ));
        return None;
    }
    if !dir.is_dir() {
        output.write_line(&format!(
            "Error: Path-'{}' isn't a folder, please enter correct path!",
            path
        ));
        return None;
    }

    Some(tokio::spawn(async move {
        ingest(&path, store.as_ref(), &analysis, output.as_ref()).await;
    }))
}

async fn ingest(path: &str, store: &dyn PaperGraph, analysis: &Analysis, output: &dyn OutputSink) {
    let papers = papers_load(path, &analysis.keyword_extractor, output).await;
    if papers.is_empty() {
        output.write_line("No valid PDF file was found.");
        return;
    }

    for paper in &papers {
        output.write_line(&format!("Uploading file: {}", paper.filename));
        if let Err(e) = add_paper(store, analysis.embedder.as_ref(), paper).await {
            error!("Failed to store {}: {}", paper.filename, e);
            output.write_line(&format!("Failed to upload: {} ({})", paper.filename, e));
        }
    }

    output.write_line("Paper loading complete");
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::handler_with;
    use crate::database::{GraphDatabase, MockPaperGraph, PaperGraph, PaperRow};
    use crate::document::paper::tests::write_pdf;

    #[tokio::test]
    async fn test_list_papers_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MockPaperGraph::new();
        store.expect_list_papers().returning(|| Ok(Vec::new()));
        let (mut handler, sink) = handler_with(store, dir.path());

        handler.handle_command("list papers").await.unwrap();
        assert_eq!(sink.lines(), vec!["No papers found."]);
    }

    #[tokio::test]
    async fn test_list_papers_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MockPaperGraph::new();
        store.expect_list_papers().returning(|| {
            Ok(vec![
                PaperRow {
                    title: Some("Graph Learning".to_string()),
                    author: Some("No Author".to_string()),
                    year: Some("2020".to_string()),
                    ..PaperRow::default()
                },
                PaperRow {
                    title: Some("Vision".to_string()),
                    ..PaperRow::default()
                },
            ])
        });
        let (mut handler, sink) = handler_with(store, dir.path());

        handler.handle_command("lp").await.unwrap();

        let lines = sink.lines();
        assert_eq!(lines[0], "=== 2 papers in the database ===");
        assert!(lines[1].contains("Graph Learning"));
        assert!(lines[1].contains("--"));
    }

    #[tokio::test]
    async fn test_list_requires_exact_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MockPaperGraph::new();
        store.expect_list_papers().times(0);
        let (mut handler, sink) = handler_with(store, dir.path());

        handler.handle_command("list").await.unwrap();
        handler.handle_command("lp all").await.unwrap();
        handler.handle_command("list authors").await.unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "Unknown command 'list'",
                "Unknown command 'lp all'",
                "Unknown command 'list authors'",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_rejects_bad_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("paper.pdf");
        std::fs::write(&file, "x").unwrap();
        let (mut handler, sink) = handler_with(MockPaperGraph::new(), dir.path());

        handler.handle_command("add").await.unwrap();
        handler.handle_command("add /no/such/dir").await.unwrap();
        handler
            .handle_command(&format!("a {}", file.display()))
            .await
            .unwrap();
        handler.wait_for_ingest().await;

        assert_eq!(
            sink.lines(),
            vec![
                "Unknown command 'add'".to_string(),
                "Error: Path-'/no/such/dir' doesn't exist, please enter correct path!".to_string(),
                format!(
                    "Error: Path-'{}' isn't a folder, please enter correct path!",
                    file.display()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_with_no_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let papers = dir.path().join("papers");
        std::fs::create_dir(&papers).unwrap();
        std::fs::write(papers.join("readme.md"), "notes").unwrap();
        let (mut handler, sink) = handler_with(MockPaperGraph::new(), dir.path());

        handler
            .handle_command(&format!("add {}", papers.display()))
            .await
            .unwrap();
        handler.wait_for_ingest().await;

        assert_eq!(
            sink.lines(),
            vec![
                "Error: readme.md is not a PDF file. Skipping.",
                "No valid PDF file was found.",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_keeps_whitespace_in_path() {
        let dir = tempfile::tempdir().unwrap();
        let papers = dir.path().join("my  papers");
        std::fs::create_dir(&papers).unwrap();
        let (mut handler, sink) = handler_with(MockPaperGraph::new(), dir.path());

        handler
            .handle_command(&format!("add {}", papers.display()))
            .await
            .unwrap();
        handler.wait_for_ingest().await;

        assert_eq!(sink.lines(), vec!["No valid PDF file was found."]);
    }

    #[tokio::test]
    async fn test_add_loads_and_stores_papers() {
        let dir = tempfile::tempdir().unwrap();
        let papers = dir.path().join("my papers");
        std::fs::create_dir(&papers).unwrap();
        write_pdf(&papers.join("first.pdf"), None);
        write_pdf(&papers.join("second.pdf"), None);

        let db = GraphDatabase::open_in_memory().await.unwrap();
        let (mut handler, sink) = handler_with(db.clone(), dir.path());

        handler
            .handle_command(&format!("add {}", papers.display()))
            .await
            .unwrap();
        handler.wait_for_ingest().await;

        let lines = sink.lines();
        assert!(lines.contains(&"Uploading file: first.pdf".to_string()));
        assert!(lines.contains(&"Uploading file: second.pdf".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Paper loading complete"));

        let stored = db.papers_with_embeddings().await.unwrap();
        let filenames: Vec<&str> = stored.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(filenames, vec!["first.pdf", "second.pdf"]);
    }
}
