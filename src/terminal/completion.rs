use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;

const SEARCH_TYPES: &[&str] = &["title", "author", "topic"];

const TOP_LEVEL: &[&str] = &[
    "list",
    "search",
    "vsearch",
    "simsearch",
    "vsimsearch",
    "exit",
    "add",
    "help",
];

fn sub_words(command: &str) -> &'static [&'static str] {
    match command {
        "list" => &["papers"],
        "search" | "vsearch" => SEARCH_TYPES,
        _ => &[],
    }
}

/// Completion candidates for the word under the cursor: top-level commands first,
/// then `papers` after `list` and the search types after `search`/`vsearch`.
pub fn complete_words(line: &str) -> (usize, Vec<&'static str>) {
    let prefix = line.rsplit(char::is_whitespace).next().unwrap_or("");
    let start = line.len() - prefix.len();
    let previous: Vec<&str> = line[..start].split_whitespace().collect();

    let options: &[&str] = match previous.as_slice() {
        [] => TOP_LEVEL,
        [command] => sub_words(command),
        _ => &[],
    };

    let matches = options
        .iter()
        .copied()
        .filter(|word| word.starts_with(prefix))
        .collect();
    (start, matches)
}

pub struct CommandHelper {
    hinter: HistoryHinter,
}

impl CommandHelper {
    pub fn new() -> Self {
        Self {
            hinter: HistoryHinter {},
        }
    }
}

impl Default for CommandHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = complete_words(&line[..pos]);
        let candidates = words
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: format!("{} ", word),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.dimmed().to_string())
    }
}

impl Validator for CommandHelper {}

impl Helper for CommandHelper {}
