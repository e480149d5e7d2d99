use crate::analysis::Analysis;
use crate::config::Settings;
use crate::database::PaperGraph;
use crate::terminal::OutputSink;
use crate::visualisation::VisualiseOptions;
use std::sync::Arc;
use tokio::task::JoinHandle;

mod papers;
mod search;
mod system;

pub use search::{parse_search, SearchField, SearchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Exit,
    Help,
    ListPapers,
    Search,
    SimilaritySearch,
    VisualSimilaritySearch,
    AddPapers,
}

/// Every command word, long forms first, then shorthands.
pub const COMMANDS: [(&str, CommandKind); 18] = [
    ("exit", CommandKind::Exit),
    ("help", CommandKind::Help),
    ("list", CommandKind::ListPapers),
    ("search", CommandKind::Search),
    ("vsearch", CommandKind::Search),
    ("simsearch", CommandKind::SimilaritySearch),
    ("vsimsearch", CommandKind::VisualSimilaritySearch),
    ("add", CommandKind::AddPapers),
    ("e", CommandKind::Exit),
    ("h", CommandKind::Help),
    ("lp", CommandKind::ListPapers),
    ("st", CommandKind::Search),
    ("sa", CommandKind::Search),
    ("sp", CommandKind::Search),
    ("ss", CommandKind::SimilaritySearch),
    ("vsh", CommandKind::Search),
    ("vss", CommandKind::VisualSimilaritySearch),
    ("a", CommandKind::AddPapers),
];

pub fn lookup(word: &str) -> Option<CommandKind> {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, kind)| *kind)
}

/// Split on whitespace into at most three tokens; the third keeps the rest of the line.
pub fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::with_capacity(3);
    let mut rest = input.trim();

    while !rest.is_empty() {
        if tokens.len() == 2 {
            tokens.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                tokens.push(&rest[..idx]);
                rest = rest[idx..].trim_start();
            }
            None => {
                tokens.push(rest);
                break;
            }
        }
    }

    tokens
}

/// Everything after the command word, with its inner whitespace untouched.
pub fn rest_of_line(input: &str) -> &str {
    let input = input.trim();
    input
        .find(char::is_whitespace)
        .map(|idx| input[idx..].trim_start())
        .unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct CommandHandler {
    store: Arc<dyn PaperGraph>,
    analysis: Arc<Analysis>,
    settings: Settings,
    output: Arc<dyn OutputSink>,
    ingest_tasks: Vec<JoinHandle<()>>,
}

impl CommandHandler {
    pub fn new(
        store: Arc<dyn PaperGraph>,
        analysis: Arc<Analysis>,
        settings: Settings,
        output: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            store,
            analysis,
            settings,
            output,
            ingest_tasks: Vec::new(),
        }
    }

    /// Run one line of input. User mistakes are reported through the output sink;
    /// failures of the store, model or visualiser come back as `Err`.
    pub async fn handle_command(&mut self, input: &str) -> Result<Flow, String> {
        let tokens = split_tokens(input);
        let Some(first) = tokens.first() else {
            return Ok(Flow::Continue);
        };

        let command = first.to_lowercase();
        let Some(kind) = lookup(&command) else {
            self.output
                .write_line(&format!("Unknown command '{}'", command));
            return Ok(Flow::Continue);
        };

        match kind {
            CommandKind::Exit => return Ok(system::exit(self.output.as_ref())),
            CommandKind::Help => system::help(self.output.as_ref()),
            CommandKind::ListPapers => {
                papers::list_papers(&tokens, self.store.as_ref(), self.output.as_ref()).await?
            }
            CommandKind::Search => {
                search::keyword_search(
                    &command,
                    &tokens,
                    self.store.as_ref(),
                    self.output.as_ref(),
                    &self.visualise_options(false),
                )
                .await?
            }
            CommandKind::SimilaritySearch | CommandKind::VisualSimilaritySearch => {
                let visualise = (kind == CommandKind::VisualSimilaritySearch)
                    .then(|| self.visualise_options(true));
                search::similarity_search(
                    &tokens,
                    self.store.as_ref(),
                    &self.analysis,
                    self.settings.search,
                    self.output.as_ref(),
                    visualise.as_ref(),
                )
                .await?
            }
            CommandKind::AddPapers => {
                self.ingest_tasks.retain(|task| !task.is_finished());
                if let Some(task) = papers::add_papers(
                    &tokens,
                    rest_of_line(input),
                    Arc::clone(&self.store),
                    Arc::clone(&self.analysis),
                    Arc::clone(&self.output),
                ) {
                    self.ingest_tasks.push(task);
                }
            }
        }

        Ok(Flow::Continue)
    }

    /// Wait for every background ingest started by `add`.
    pub async fn wait_for_ingest(&mut self) {
        for task in self.ingest_tasks.drain(..) {
            if let Err(e) = task.await {
                log::error!("Paper loading task failed: {}", e);
            }
        }
    }

    fn visualise_options(&self, use_similarity: bool) -> VisualiseOptions {
        VisualiseOptions {
            output_file: self.settings.visualisation.output_file.clone(),
            open_browser: self.settings.visualisation.open_browser,
            use_similarity,
            ..VisualiseOptions::default()
        }
    }
}
