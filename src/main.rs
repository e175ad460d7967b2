use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use paper_trail::config::{find_config_file, get_config, load_config, Config};
use paper_trail::library::{FileStore, LibraryStore};
use paper_trail::search::{
    format_date, SearchError, SearchOutcome, SearchRequest, SearchSession,
    SemanticScholarBackend, SUGGESTED_TAGS,
};
use paper_trail::ui::{self, OutputFormat};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Trail - search, triage, and keep a personal library of academic papers
#[derive(Parser, Debug)]
#[command(name = "paper-trail")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search, triage, and keep a personal library of academic papers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers
    Search {
        #[command(subcommand)]
        mode: SearchCommands,
    },

    /// Inspect and organize the library
    Library {
        #[command(subcommand)]
        action: LibraryCommands,
    },

    /// List the suggested tag vocabulary
    Tags,
}

#[derive(Subcommand, Debug)]
enum SearchCommands {
    /// Tag-only search; tags matching the suggested vocabulary also
    /// constrain by field of study
    Casual {
        /// Free-text tags (quote multi-word tags)
        #[arg(required = true)]
        tags: Vec<String>,

        /// Step through results one at a time, filing as you go
        #[arg(long)]
        triage: bool,
    },

    /// Filtered search over tags, authors, dates, citations and open access
    Advanced {
        /// Free-text tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Author names (repeatable)
        #[arg(long = "author")]
        authors: Vec<String>,

        /// Minimum citation count
        #[arg(long)]
        min_citations: Option<u32>,

        /// Start of the publication date range (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End of the publication date range (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Only papers with an open-access PDF
        #[arg(long)]
        open_access: bool,

        /// Step through results one at a time, filing as you go
        #[arg(long)]
        triage: bool,
    },
}

#[derive(Subcommand, Debug)]
enum LibraryCommands {
    /// List folders with member counts
    Folders,

    /// List favorited papers
    Favorites,

    /// Show the papers in a folder
    Show {
        /// Folder name
        name: String,
    },

    /// Create a folder
    AddFolder {
        /// Folder name
        name: String,
    },

    /// Select the folder that triage files into
    Select {
        /// Folder name
        name: String,
    },

    /// Rename a folder
    Rename {
        /// Current folder name
        name: String,
        /// New folder name
        new_name: String,
    },

    /// Remove a folder (favorites and seen-state of its papers are kept)
    Remove {
        /// Folder name
        name: String,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => match find_config_file() {
            Some(path) => load_config(&path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(get_config()),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;
    let store = Arc::new(FileStore::new(&config.storage_dir));
    let library = Arc::new(LibraryStore::open(store));

    let result = run(&cli, &config, &library).await;

    // Give queued library writes a chance to land before the process exits.
    library.flush();
    result
}

async fn run(cli: &Cli, config: &Config, library: &Arc<LibraryStore>) -> Result<()> {
    match &cli.command {
        Commands::Search { mode } => {
            let (request, triage) = match mode {
                SearchCommands::Casual { tags, triage } => {
                    (SearchRequest::casual(tags), *triage)
                }
                SearchCommands::Advanced {
                    tags,
                    authors,
                    min_citations,
                    from,
                    to,
                    open_access,
                    triage,
                } => {
                    let from = parse_date(from)?;
                    let to = parse_date(to)?;
                    (
                        SearchRequest::advanced(
                            tags,
                            authors,
                            *min_citations,
                            &format_date(from),
                            &format_date(to),
                            *open_access,
                        ),
                        *triage,
                    )
                }
            };

            let backend = Arc::new(SemanticScholarBackend::from_config(config));
            let session = SearchSession::new(backend);

            match session.run(request).await {
                Ok(SearchOutcome::Results(papers)) if papers.is_empty() => {
                    println!("No matches. Try broadening the search.");
                    Ok(())
                }
                Ok(SearchOutcome::Results(papers)) => {
                    if triage {
                        triage_papers(&papers, library)
                    } else {
                        ui::print_papers(&papers, library, cli.output);
                        for paper in &papers {
                            library.mark_seen(paper);
                        }
                        Ok(())
                    }
                }
                Ok(SearchOutcome::Superseded) => Ok(()),
                Err(SearchError::RateLimited) => {
                    eprintln!("The search service is throttling requests. Wait a moment and retry.");
                    std::process::exit(2);
                }
                Err(SearchError::InvalidQuery(reason)) => {
                    bail!("invalid search input ({reason}); adjust the tags or authors and retry")
                }
                Err(e) => Err(e).context("search failed"),
            }
        }

        Commands::Library { action } => run_library(action, library),

        Commands::Tags => {
            for tag in SUGGESTED_TAGS {
                println!("{tag}");
            }
            Ok(())
        }
    }
}

fn run_library(action: &LibraryCommands, library: &Arc<LibraryStore>) -> Result<()> {
    match action {
        LibraryCommands::Folders => {
            ui::print_folders(&library.folders(), &library.selected_folder());
        }
        LibraryCommands::Favorites => {
            let favorites = library.favorite_ids();
            if favorites.is_empty() {
                println!("No favorites yet.");
            }
            for id in favorites {
                match library.load_paper(&id) {
                    Some(paper) => ui::print_paper_card(&paper),
                    None => println!("{id} (no snapshot)"),
                }
            }
        }
        LibraryCommands::Show { name } => {
            let folder = named_folder(library, name)?;
            let papers = library.papers_in_folder(folder.id);
            if papers.is_empty() {
                println!("Folder '{name}' is empty.");
            }
            for paper in papers {
                ui::print_paper_card(&paper);
            }
        }
        LibraryCommands::AddFolder { name } => {
            library.add_folder(name);
            println!("Folder '{name}' ready.");
        }
        LibraryCommands::Select { name } => {
            let folder = named_folder(library, name)?;
            library.select_folder(folder.id);
            println!("Triage now files into '{name}'.");
        }
        LibraryCommands::Rename { name, new_name } => {
            let folder = named_folder(library, name)?;
            if !library.rename_folder(folder.id, new_name) {
                bail!("cannot rename '{name}': the default folder is fixed and names must be unique");
            }
            println!("Renamed '{name}' to '{new_name}'.");
        }
        LibraryCommands::Remove { name } => {
            let folder = named_folder(library, name)?;
            if !library.remove_folder(folder.id) {
                bail!("the default folder cannot be removed");
            }
            println!("Removed '{name}'.");
        }
    }
    Ok(())
}

/// Step through results one at a time, marking each seen as it is shown.
fn triage_papers(papers: &[paper_trail::Paper], library: &Arc<LibraryStore>) -> Result<()> {
    let stdin = std::io::stdin();
    for paper in papers {
        library.mark_seen(paper);
        println!();
        ui::print_paper_card(paper);

        print!(
            "[enter] skip  [f] favorite  [a] add to '{}'  [q] quit > ",
            library.selected_folder().name
        );
        std::io::stdout().flush()?;

        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        match line.trim() {
            "f" => library.favorite_and_mark_seen(paper),
            "a" => {
                if !library.add_to_selected_folder(paper) {
                    println!(
                        "The selected folder is gone; selection reset to '{}'. Paper not filed.",
                        library.selected_folder().name
                    );
                }
            }
            "q" => break,
            _ => {}
        }
    }
    Ok(())
}

fn named_folder(library: &Arc<LibraryStore>, name: &str) -> Result<paper_trail::PaperFolder> {
    library
        .folder_by_name(name)
        .with_context(|| format!("no folder named '{name}'"))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is not a date in YYYY-MM-DD form"))
}
