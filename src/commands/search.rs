use crate::analysis::Analysis;
use crate::config::SearchConfig;
use crate::database::{PaperGraph, PaperRow};
use crate::terminal::{papers_table, similarity_table, terminal_width, OutputSink};
use crate::visualisation::{visualise_output, GraphPaper, VisualiseOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Author,
    Topic,
}

impl SearchField {
    fn empty_message(self, value: &str) -> String {
        match self {
            SearchField::Title => format!("No papers found with title containing '{}'.", value),
            SearchField::Author => format!("No results found for author containing '{}'.", value),
            SearchField::Topic => format!("No papers found with topic containing '{}'.", value),
        }
    }

    fn header(self, value: &str) -> String {
        match self {
            SearchField::Title => format!("=== Papers with title containing '{}' ===", value),
            SearchField::Author => format!("=== Papers by author containing '{}' ===", value),
            SearchField::Topic => format!("=== Papers with topic containing '{}' ===", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub field: SearchField,
    pub value: String,
    pub visualise: bool,
}

/// Interpret `search`/`vsearch`/`vsh <type> <value>` and the `st`/`sa`/`sp <value>`
/// shorthands. `Err` carries the message to show the user.
pub fn parse_search(command: &str, tokens: &[&str]) -> Result<SearchRequest, String> {
    if tokens.len() < 2 {
        return Err(format!("Unknown command '{}'", tokens.join(" ")));
    }

    let visualise = matches!(command, "vsearch" | "vsh");
    let (field, value) = match command {
        "search" | "vsearch" | "vsh" => {
            if tokens.len() < 3 {
                return Err(format!("Usage: {} <title|author|topic> <value>", command));
            }
            let field = match tokens[1].to_lowercase().as_str() {
                "title" => SearchField::Title,
                "author" => SearchField::Author,
                "topic" => SearchField::Topic,
                _ => return Err("Unknown search type. Must be: title, author, or topic.".to_string()),
            };
            (field, tokens[2].to_string())
        }
        "st" => (SearchField::Title, tokens[1..].join(" ")),
        "sa" => (SearchField::Author, tokens[1..].join(" ")),
        "sp" => (SearchField::Topic, tokens[1..].join(" ")),
        _ => return Err(format!("Unknown command '{}'", command)),
    };

    Ok(SearchRequest {
        field,
        value,
        visualise,
    })
}

pub async fn keyword_search(
    command: &str,
    tokens: &[&str],
    store: &dyn PaperGraph,
    output: &dyn OutputSink,
    options: &VisualiseOptions,
) -> Result<(), String> {
    let request = match parse_search(command, tokens) {
        Ok(request) => request,
        Err(message) => {
            output.write_line(&message);
            return Ok(());
        }
    };

    let value = request.value.as_str();
    let rows: Vec<PaperRow> = match request.field {
        SearchField::Title => store.search_by_title(value).await,
        SearchField::Author => store.search_by_author(value).await,
        SearchField::Topic => store.search_by_topic(value).await,
    }
    .map_err(|e| format!("Database error: {}", e))?;

    if rows.is_empty() {
        output.write_line(&request.field.empty_message(value));
        return Ok(());
    }

    output.write_line(&request.field.header(value));
    output.write_line(&papers_table(&rows, terminal_width()));

    if request.visualise {
        let papers: Vec<GraphPaper> = rows.iter().map(GraphPaper::from).collect();
        visualise_output(&papers, value, options)
            .map_err(|e| format!("Visualisation failed: {}", e))?;
    }

    Ok(())
}

/// `simsearch`/`vsimsearch`: rank stored papers against the rest of the line.
/// Passing `visualise` also draws the results with similarity-weighted edges.
pub async fn similarity_search(
    tokens: &[&str],
    store: &dyn PaperGraph,
    analysis: &Analysis,
    search: SearchConfig,
    output: &dyn OutputSink,
    visualise: Option<&VisualiseOptions>,
) -> Result<(), String> {
    if tokens.len() < 2 {
        output.write_line(&format!("Unknown command '{}'", tokens.join(" ")));
        return Ok(());
    }

    let query = tokens[1..].join(" ");
    let results = analysis
        .find_papers_by_similarity(store, &query, search)
        .await
        .map_err(|e| format!("Semantic search failed: {}", e))?;

    if results.is_empty() {
        output.write_line("No papers found with embedding. Please ensure you stored them!");
        return Ok(());
    }

    output.write_line(&format!("=== Semantic Search Results for '{}' ===", query));
    output.write_line(&similarity_table(&results));

    if let Some(options) = visualise {
        let papers: Vec<GraphPaper> = results.iter().map(GraphPaper::from).collect();
        visualise_output(&papers, &query, options)
            .map_err(|e| format!("Visualisation failed: {}", e))?;
    }

    Ok(())
}
