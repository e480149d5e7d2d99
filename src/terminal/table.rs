use crate::analysis::SimilarityResult;
use crate::database::PaperRow;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ColumnConstraint, ContentArrangement, Table, Width};

const MISSING: &str = "--";
const SIMILARITY_COLUMN_WIDTH: u16 = 50;

// Title, Author(s), Year, DOI
const PAPER_COLUMN_SHARES: [usize; 4] = [45, 20, 8, 27];

pub fn terminal_width() -> Option<usize> {
    term_size::dimensions().map(|(width, _)| width)
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn or_missing(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v,
        _ => MISSING,
    }
}

/// Column limits proportional to the usable width, leaving room for borders.
pub fn paper_column_widths(total_width: usize) -> [u16; 4] {
    let usable = total_width.saturating_sub(5);
    PAPER_COLUMN_SHARES.map(|share| ((usable * share / 100).max(4)).min(u16::MAX as usize) as u16)
}

/// Title, Author(s), Year and DOI for each row; empty cells show `--`.
pub fn papers_table(rows: &[PaperRow], width: Option<usize>) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Title", "Author(s)", "Year", "DOI"]));

    if let Some(width) = width {
        table.set_constraints(
            paper_column_widths(width)
                .into_iter()
                .map(|w| ColumnConstraint::UpperBoundary(Width::Fixed(w))),
        );
    }

    for row in rows {
        table.add_row(vec![
            Cell::new(or_missing(&row.title)),
            Cell::new(or_missing(&row.author)),
            Cell::new(or_missing(&row.year)),
            Cell::new(or_missing(&row.doi)),
        ]);
    }

    table.to_string()
}

pub fn similarity_table(results: &[SimilarityResult]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["Title", "Author", "DOI", "Similarity"]))
        .set_constraints(
            (0..4).map(|_| ColumnConstraint::UpperBoundary(Width::Fixed(SIMILARITY_COLUMN_WIDTH))),
        );

    for result in results {
        table.add_row(vec![
            Cell::new(&result.title),
            Cell::new(&result.author),
            Cell::new(&result.doi),
            Cell::new(format!("{:.4}", result.similarity)),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_column_widths() {
        assert_eq!(paper_column_widths(105), [45, 20, 8, 27]);
        assert_eq!(paper_column_widths(0), [4, 4, 4, 4]);
    }

    #[test]
    fn test_papers_table_shows_placeholders() {
        let rows = vec![
            PaperRow {
                title: Some("Graph Search".to_string()),
                author: Some("Ada Lovelace".to_string()),
                year: Some("2021".to_string()),
                doi: None,
                ..PaperRow::default()
            },
            PaperRow {
                title: Some(String::new()),
                ..PaperRow::default()
            },
        ];

        let output = papers_table(&rows, None);
        assert!(output.contains("Title"));
        assert!(output.contains("Author(s)"));
        assert!(output.contains("Graph Search"));
        assert!(output.contains("2021"));
        assert!(output.matches(MISSING).count() >= 5);
    }

    #[test]
    fn test_papers_table_with_width() {
        let rows = vec![PaperRow {
            title: Some("A rather long title about graph neural networks".to_string()),
            ..PaperRow::default()
        }];
        let output = papers_table(&rows, Some(80));
        assert!(output.contains("Title"));
    }

    #[test]
    fn test_similarity_table_formats_scores() {
        let results = vec![SimilarityResult {
            title: "Graph Search".to_string(),
            author: "Ada Lovelace".to_string(),
            doi: "https://doi.org/10.1/abc".to_string(),
            similarity: 0.876543,
        }];

        let output = similarity_table(&results);
        assert!(output.contains("Similarity"));
        assert!(output.contains("0.8765"));
        assert!(output.contains("Ada Lovelace"));
    }
}
