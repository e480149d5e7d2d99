pub mod database;
pub mod graph;
pub mod writer;

pub use database::{DatabaseError, GraphDatabase, NO_AUTHOR};
#[cfg(test)]
pub use graph::MockPaperGraph;
pub use graph::{EmbeddedPaper, PaperGraph, PaperRecord, PaperRow};
pub use writer::add_paper;
