use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const APPLICATION_NAME: &str = "PaperSuRF";
pub const APPLICATION_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));
pub const APPLICATION_DESCRIPTION: &str = "Academic Paper Search Tool";
pub const ORGANISATION: &str = "Robinson Fuller Ltd";
pub const AUTHORS: [&str; 4] = [
    "Zakariya Oulhadj",
    "Frances Siu",
    "Husnulzaki Haryadi",
    "Jiajie Guan",
];

pub const EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const MAX_INPUT_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/papersurf.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    pub top_n: usize,
    pub ngram_range: (usize, usize),
    pub diversity: f32,
    pub use_mmr: bool,
    pub candidate_limit: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            ngram_range: (1, 7),
            diversity: 0.6,
            use_mmr: false,
            candidate_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub model_cache: Option<PathBuf>,
    pub keywords: KeywordConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_n: usize,
    pub threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_n: 15,
            threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualisationConfig {
    pub output_file: PathBuf,
    pub open_browser: bool,
}

impl Default for VisualisationConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("visualized_results.html"),
            open_browser: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub analysis: AnalysisConfig,
    pub search: SearchConfig,
    pub visualisation: VisualisationConfig,
    pub max_input_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            analysis: AnalysisConfig::default(),
            search: SearchConfig::default(),
            visualisation: VisualisationConfig::default(),
            max_input_length: MAX_INPUT_LENGTH,
        }
    }
}

impl Settings {
    /// Load settings from `PAPERSURF_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let keywords = defaults.analysis.keywords;

        let database = DatabaseConfig {
            path: env::var("PAPERSURF_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.database.path),
        };

        let keywords = KeywordConfig {
            top_n: parse_var("PAPERSURF_KEYWORDS_TOP_N", keywords.top_n),
            ngram_range: (
                keywords.ngram_range.0,
                parse_var("PAPERSURF_KEYWORDS_NGRAM_MAX", keywords.ngram_range.1),
            ),
            diversity: parse_var("PAPERSURF_KEYWORDS_DIVERSITY", keywords.diversity),
            use_mmr: parse_var("PAPERSURF_KEYWORDS_USE_MMR", keywords.use_mmr),
            candidate_limit: parse_var("PAPERSURF_KEYWORDS_CANDIDATES", keywords.candidate_limit),
        };

        let analysis = AnalysisConfig {
            model_cache: env::var("PAPERSURF_MODEL_CACHE").ok().map(PathBuf::from),
            keywords,
        };

        let search = SearchConfig {
            top_n: parse_var("PAPERSURF_SEARCH_TOP_N", defaults.search.top_n),
            threshold: parse_var("PAPERSURF_SEARCH_THRESHOLD", defaults.search.threshold),
        };

        let visualisation = VisualisationConfig {
            output_file: env::var("PAPERSURF_VISUALISATION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.visualisation.output_file),
            open_browser: parse_var("PAPERSURF_OPEN_BROWSER", defaults.visualisation.open_browser),
        };

        Self {
            database,
            analysis,
            search,
            visualisation,
            max_input_length: defaults.max_input_length,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
