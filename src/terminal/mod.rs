pub mod completion;
pub mod table;

use crate::config::{
    APPLICATION_DESCRIPTION, APPLICATION_NAME, APPLICATION_VERSION, AUTHORS, ORGANISATION,
};
use colored::Colorize;
use parking_lot::Mutex;

pub use completion::CommandHelper;
pub use table::{papers_table, similarity_table, terminal_width};

pub const WELCOME_MESSAGE: &str = r"
    ____                        _____       ____  ____
   / __ \____ _____  ___  _____/ ___/__  __/ __ \/ __/
  / /_/ / __ `/ __ \/ _ \/ ___/\__ \/ / / / /_/ / /_
 / ____/ /_/ / /_/ /  __/ /   ___/ / /_/ / _, _/ __/
/_/    \____/ .___/\___/_/   /____/\____/_/ |_/_/
           /_/

Enter the 'help' command to view the main help menu.
";

/// Destination for everything the command layer prints.
///
/// The background ingest task shares the sink with the REPL, so implementations
/// must be callable from any thread.
pub trait OutputSink: Send + Sync {
    fn write_line(&self, line: &str);
}

pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        println!("{}", line);
    }
}

/// Collects output in memory.
#[derive(Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contents(&self) -> String {
        self.lines.lock().join("\n")
    }
}

impl OutputSink for BufferSink {
    fn write_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

pub fn print_title() {
    println!(
        "      {}",
        format!("{} (c)", APPLICATION_NAME).truecolor(135, 206, 250).bold()
    );
    println!("      {}", APPLICATION_DESCRIPTION.truecolor(176, 176, 176));
    println!(
        "      {}    {}",
        ORGANISATION.truecolor(176, 176, 176),
        APPLICATION_VERSION.dimmed()
    );
    println!("      {}", authors_line().truecolor(176, 176, 176));
}

fn authors_line() -> String {
    format!("By {}", AUTHORS.join(", "))
}

pub fn print_welcome() {
    print_title();
    println!("{}", WELCOME_MESSAGE);
}

/// Truncate user input to at most `max_chars` characters.
pub fn limit_input(line: &str, max_chars: usize) -> &str {
    match line.char_indices().nth(max_chars) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_input() {
        assert_eq!(limit_input("list papers", 100), "list papers");
        assert_eq!(limit_input("abcdef", 3), "abc");
        assert_eq!(limit_input("ééééé", 2), "éé");
        assert_eq!(limit_input("", 5), "");
    }

    #[test]
    fn test_buffer_sink_collects_lines() {
        let sink = BufferSink::new();
        sink.write_line("first");
        sink.write_line("second");

        assert_eq!(sink.lines(), vec!["first", "second"]);
        assert_eq!(sink.contents(), "first\nsecond");
    }

    #[test]
    fn test_authors_line_names_everyone() {
        let line = authors_line();
        assert!(line.starts_with("By "));
        for author in AUTHORS {
            assert!(line.contains(author));
        }
    }
}
