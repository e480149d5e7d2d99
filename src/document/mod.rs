pub mod loader;
pub mod paper;

pub use loader::{extract_doi, papers_load};
pub use paper::{DocumentError, Paper};
