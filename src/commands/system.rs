use super::Flow;
use crate::terminal::OutputSink;

pub const HELP_TEXT: &str = "Available commands:

----------------- General ------------------
 list papers                lp

----- Searching by semantic similarity -----
 simsearch  <text>          ss  <text>
 vsimsearch <text>          vss <text>

------ Searching by title/author/topic -----
 search  title  <title>     st  <title>
 search  author <name>      sa  <name>
 search  topic  <topic>     sp  <topic>
 vsearch <type> <text>      vsh <type> <text>

----------------- Database -----------------
 add <directory_path>       a <directory_path>

-------------- Miscellaneous ---------------
 help (this message)        h
 exit                       e
";

pub fn help(output: &dyn OutputSink) {
    output.write_line(HELP_TEXT);
}

pub fn exit(output: &dyn OutputSink) -> Flow {
    output.write_line("Goodbye!");
    Flow::Exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::handler_with;
    use crate::database::MockPaperGraph;

    #[tokio::test]
    async fn test_help_lists_every_category() {
        let dir = tempfile::tempdir().unwrap();
        let (mut handler, sink) = handler_with(MockPaperGraph::new(), dir.path());

        handler.handle_command("h").await.unwrap();
        let text = sink.contents();

        for section in ["General", "semantic similarity", "title/author/topic", "Database", "Miscellaneous"] {
            assert!(text.contains(section), "missing section {section}");
        }
        assert!(text.contains("vss <text>"));
        assert!(text.contains("a <directory_path>"));
    }
}
