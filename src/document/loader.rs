use super::paper::Paper;
use crate::analysis::keywords::KeywordExtractor;
use crate::terminal::OutputSink;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

pub const NO_DOI: &str = "NO PROVIDED DOI";
pub const DOI_RESOLVER: &str = "https://doi.org/";

lazy_static! {
    static ref DOI_PATTERN: Regex =
        Regex::new(r"(?i)(?:doi:\s*)?(10\.\d{4,9}/[-._;()/:a-zA-Z0-9_]+)")
            .expect("valid DOI regex");
}

const DOI_TRAILING: &[char] = &['.', ',', ';', '(', ')', '[', ']', '!', '?', '"', '\''];

/// Find a DOI in the body text, falling back to the title, as a resolver link.
pub fn extract_doi(text: &str, title: &str) -> String {
    [text, title]
        .iter()
        .find_map(|source| DOI_PATTERN.captures(source))
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}{}", DOI_RESOLVER, m.as_str().trim_end_matches(DOI_TRAILING)))
        .unwrap_or_else(|| NO_DOI.to_string())
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', std::path::MAIN_SEPARATOR]) => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', std::path::MAIN_SEPARATOR])),
        None => PathBuf::from(path),
    }
}

fn is_pdf(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

async fn sorted_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Load every PDF in a directory, attaching its DOI and keyphrase topics.
///
/// Files that are not PDFs or fail to parse are reported through `output` and
/// skipped. A path that does not exist yields no papers.
pub async fn papers_load(
    path: &str,
    extractor: &KeywordExtractor,
    output: &dyn OutputSink,
) -> Vec<Paper> {
    let dir = expand_home(path);
    if !dir.exists() {
        return Vec::new();
    }

    let names = match sorted_entries(&dir).await {
        Ok(names) => names,
        Err(e) => {
            warn!("Failed to read directory {}: {}", dir.display(), e);
            output.write_line(&format!("Failed to read directory: {}", dir.display()));
            return Vec::new();
        }
    };

    let mut papers = Vec::new();
    for name in names {
        if !is_pdf(&name) {
            output.write_line(&format!("Error: {} is not a PDF file. Skipping.", name));
            continue;
        }

        let file_path = dir.join(&name);
        output.write_line(&format!("Parsing file: {}", name));

        let load_path = file_path.clone();
        let loaded = tokio::task::spawn_blocking(move || Paper::load(load_path)).await;
        let mut paper = match loaded {
            Ok(Ok(paper)) => paper,
            Ok(Err(e)) => {
                warn!("Failed to load {}: {}", file_path.display(), e);
                output.write_line(&format!("Failed to load: {}", file_path.display()));
                continue;
            }
            Err(e) => {
                warn!("Loader task for {} failed: {}", file_path.display(), e);
                output.write_line(&format!("Failed to load: {}", file_path.display()));
                continue;
            }
        };

        output.write_line("Extracting DOI Link");
        paper.doi = extract_doi(&paper.text, &paper.title);
        output.write_line("DOI link extracted");

        output.write_line("Extracting Topics");
        match extractor.extract_keywords(&paper.text).await {
            Ok(keywords) if !keywords.is_empty() => {
                paper.topics = keywords.into_iter().map(|(phrase, _)| phrase).collect();
                paper.main_keyphrase = paper.topics[0].clone();
            }
            Ok(_) => {}
            Err(e) => warn!("Topic extraction failed for {}: {}", name, e),
        }
        output.write_line("Topics extracted");

        info!("Loaded {} with {} topics", name, paper.topics.len());
        papers.push(paper);
    }

    papers
}
