use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use papersurf::analysis::Analysis;
use papersurf::commands::{CommandHandler, Flow};
use papersurf::config::Settings;
use papersurf::database::{GraphDatabase, PaperGraph};
use papersurf::terminal::{self, CommandHelper, OutputSink, StdoutSink};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the SQLite paper database
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory the embedding model is downloaded to
    #[arg(long)]
    model_cache: Option<PathBuf>,

    /// Write visualisations without opening a browser
    #[arg(long)]
    no_browser: bool,

    /// Log filter, e.g. `info` or `papersurf=debug`
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

fn settings_from(args: &Args) -> Settings {
    let mut settings = Settings::from_env();
    if let Some(path) = &args.database {
        settings.database.path = path.clone();
    }
    if let Some(dir) = &args.model_cache {
        settings.analysis.model_cache = Some(dir.clone());
    }
    if args.no_browser {
        settings.visualisation.open_browser = false;
    }
    settings
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize colored output
    colored::control::set_override(true);

    // Load environment variables
    dotenv().ok();

    let args = Args::parse();
    init_logging(args.log_level.as_deref());
    let settings = settings_from(&args);

    println!("{}", "Initializing...".dimmed());

    let store = GraphDatabase::open(&settings.database.path).await?;
    log::info!("{}", store.verify_connectivity().await?);

    let analysis = Analysis::new(&settings.analysis)?;
    log::info!("Loaded embedding model {}", analysis.model());

    let output: Arc<dyn OutputSink> = Arc::new(StdoutSink);
    let max_input_length = settings.max_input_length;
    let mut command_handler =
        CommandHandler::new(Arc::new(store), Arc::new(analysis), settings, output);

    terminal::print_welcome();

    let mut rl = Editor::<CommandHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(CommandHelper::new()));

    // Main input loop
    loop {
        match rl.readline("$ ") {
            Ok(line) => {
                let input = terminal::limit_input(line.trim(), max_input_length);
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match command_handler.handle_command(input).await {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    println!("{}", "Terminating...".dimmed());
    Ok(())
}
