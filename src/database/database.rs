use super::graph::{EmbeddedPaper, PaperGraph, PaperRecord, PaperRow};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Row};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_rusqlite::Connection;

pub const NO_AUTHOR: &str = "No Author";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] tokio_rusqlite::Error),
    #[error("Database connection error: {0}")]
    Connection(String),
    #[error("Corrupt embedding for {filename}: {len} bytes")]
    CorruptEmbedding { filename: String, len: usize },
}

/// SQLite-backed paper graph. Nodes and edges live in plain tables; the
/// primary keys make every write an idempotent merge.
#[derive(Clone)]
pub struct GraphDatabase {
    conn: Arc<Connection>,
}

impl GraphDatabase {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        info!("Opened paper database at {}", path.display());
        Self::with_connection(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let db = Self {
            conn: Arc::new(conn),
        };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .call(|conn| {
                conn.create_scalar_function(
                    "contains_ci",
                    2,
                    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                    |ctx| {
                        let haystack = ctx.get::<Option<String>>(0)?;
                        let needle = ctx.get::<Option<String>>(1)?;
                        Ok(match (haystack, needle) {
                            (Some(haystack), Some(needle)) => contains_ci(&haystack, &needle),
                            _ => false,
                        })
                    },
                )?;

                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                    CREATE TABLE IF NOT EXISTS papers (
                        filename TEXT PRIMARY KEY,
                        title TEXT,
                        year TEXT,
                        doi TEXT,
                        embedding BLOB
                    );
                    CREATE TABLE IF NOT EXISTS authors (
                        name TEXT PRIMARY KEY
                    );
                    CREATE TABLE IF NOT EXISTS topics (
                        name TEXT PRIMARY KEY
                    );
                    CREATE TABLE IF NOT EXISTS wrote (
                        author TEXT NOT NULL REFERENCES authors(name),
                        paper TEXT NOT NULL REFERENCES papers(filename),
                        PRIMARY KEY (author, paper)
                    );
                    CREATE TABLE IF NOT EXISTS has_topic (
                        paper TEXT NOT NULL REFERENCES papers(filename),
                        topic TEXT NOT NULL REFERENCES topics(name),
                        PRIMARY KEY (paper, topic)
                    );",
                )
                .map_err(Into::into)
            })
            .await?;

        info!("Paper database initialized successfully");
        Ok(())
    }

    async fn query_rows(
        &self,
        sql: &'static str,
        value: Option<String>,
        read: fn(&Row<'_>) -> rusqlite::Result<PaperRow>,
    ) -> Result<Vec<PaperRow>, DatabaseError> {
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql)?;
                let mapped = match value {
                    Some(value) => stmt.query_map([value], read)?,
                    None => stmt.query_map([], read)?,
                };

                let mut rows = Vec::new();
                for row in mapped {
                    rows.push(row?);
                }
                Ok(rows)
            })
            .await?;

        Ok(rows)
    }
}

/// Case-insensitive substring test using full Unicode lowercasing.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

#[async_trait]
impl PaperGraph for GraphDatabase {
    async fn verify_connectivity(&self) -> Result<String, DatabaseError> {
        let message = self
            .conn
            .call(|conn| {
                conn.query_row("SELECT 'PaperSuRF connection successful'", [], |row| {
                    row.get::<_, String>(0)
                })
                .map_err(Into::into)
            })
            .await?;
        Ok(message)
    }

    async fn add_paper(&self, paper: &PaperRecord) -> Result<(), DatabaseError> {
        let paper = paper.clone();
        let filename = paper.filename.clone();

        let inserted = self
            .conn
            .call(move |conn| {
                let tx = conn.unchecked_transaction()?;

                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO papers (filename, title, year, doi, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        paper.filename,
                        paper.title,
                        paper.year,
                        paper.doi,
                        encode_embedding(&paper.embedding)
                    ],
                )?;

                for author in &paper.authors {
                    tx.execute("INSERT OR IGNORE INTO authors (name) VALUES (?1)", [author])?;
                    tx.execute(
                        "INSERT OR IGNORE INTO wrote (author, paper) VALUES (?1, ?2)",
                        [author, &paper.filename],
                    )?;
                }

                for topic in &paper.topics {
                    tx.execute("INSERT OR IGNORE INTO topics (name) VALUES (?1)", [topic])?;
                    tx.execute(
                        "INSERT OR IGNORE INTO has_topic (paper, topic) VALUES (?1, ?2)",
                        [&paper.filename, topic],
                    )?;
                }

                tx.commit()?;
                Ok(inserted > 0)
            })
            .await?;

        if inserted {
            info!("Stored paper {}", filename);
        } else {
            debug!("Paper {} already stored, merged relationships only", filename);
        }
        Ok(())
    }

    async fn list_papers(&self) -> Result<Vec<PaperRow>, DatabaseError> {
        self.query_rows(
            "SELECT COALESCE(w.author, 'No Author'), p.title, p.doi, p.year
             FROM papers p
             LEFT JOIN wrote w ON w.paper = p.filename
             ORDER BY p.year ASC, p.filename ASC, w.author ASC",
            None,
            |row| {
                Ok(PaperRow {
                    author: row.get(0)?,
                    title: row.get(1)?,
                    doi: row.get(2)?,
                    year: row.get(3)?,
                    ..PaperRow::default()
                })
            },
        )
        .await
    }

    async fn search_by_title(&self, value: &str) -> Result<Vec<PaperRow>, DatabaseError> {
        self.query_rows(
            "SELECT p.title, COALESCE(w.author, 'No Author'), p.doi, p.year
             FROM papers p
             LEFT JOIN wrote w ON w.paper = p.filename
             WHERE contains_ci(p.title, ?1)
             ORDER BY p.year ASC, p.filename ASC, w.author ASC",
            Some(value.to_string()),
            |row| {
                Ok(PaperRow {
                    title: row.get(0)?,
                    author: row.get(1)?,
                    doi: row.get(2)?,
                    year: row.get(3)?,
                    ..PaperRow::default()
                })
            },
        )
        .await
    }

    async fn search_by_author(&self, value: &str) -> Result<Vec<PaperRow>, DatabaseError> {
        self.query_rows(
            "SELECT w.author, p.filename, p.title, p.doi, p.year
             FROM wrote w
             JOIN papers p ON p.filename = w.paper
             WHERE contains_ci(w.author, ?1)
             ORDER BY p.year ASC, p.filename ASC, w.author ASC",
            Some(value.to_string()),
            |row| {
                Ok(PaperRow {
                    author: row.get(0)?,
                    filename: row.get(1)?,
                    title: row.get(2)?,
                    doi: row.get(3)?,
                    year: row.get(4)?,
                    ..PaperRow::default()
                })
            },
        )
        .await
    }

    async fn search_by_topic(&self, value: &str) -> Result<Vec<PaperRow>, DatabaseError> {
        self.query_rows(
            "SELECT p.filename, p.title, COALESCE(w.author, 'No Author'), p.doi,
                    MIN(h.topic), p.year
             FROM papers p
             JOIN has_topic h ON h.paper = p.filename
             LEFT JOIN wrote w ON w.paper = p.filename
             WHERE contains_ci(h.topic, ?1)
             GROUP BY p.filename, w.author
             ORDER BY p.year ASC, p.filename ASC, w.author ASC",
            Some(value.to_string()),
            |row| {
                Ok(PaperRow {
                    filename: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    doi: row.get(3)?,
                    topic: row.get(4)?,
                    year: row.get(5)?,
                })
            },
        )
        .await
    }

    async fn papers_with_embeddings(&self) -> Result<Vec<EmbeddedPaper>, DatabaseError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT p.filename, p.title, COALESCE(w.author, 'No Author'), p.year,
                            p.embedding, p.doi
                     FROM papers p
                     LEFT JOIN wrote w ON w.paper = p.filename
                     WHERE p.embedding IS NOT NULL
                     ORDER BY p.filename ASC, w.author ASC",
                )?;

                let mapped = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Vec<u8>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                    ))
                })?;

                let mut rows = Vec::new();
                for row in mapped {
                    rows.push(row?);
                }
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(filename, title, author, year, blob, doi)| {
                let embedding = decode_embedding(&blob).ok_or_else(|| {
                    DatabaseError::CorruptEmbedding {
                        filename: filename.clone(),
                        len: blob.len(),
                    }
                })?;
                Ok(EmbeddedPaper {
                    filename,
                    title,
                    author,
                    year,
                    doi,
                    embedding,
                })
            })
            .collect()
    }
}
