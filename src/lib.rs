pub mod analysis;
pub mod commands;
pub mod config;
pub mod database;
pub mod document;
pub mod terminal;
pub mod visualisation;

// Re-export commonly used items
pub use analysis::Analysis;
pub use commands::{CommandHandler, Flow};
pub use config::Settings;
pub use database::{GraphDatabase, PaperGraph};
pub use document::Paper;
