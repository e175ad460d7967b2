//! Terminal rendering of search results and library contents.
//!
//! Everything here is presentation only; nothing in this module mutates the
//! library or talks to the network.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::library::{LibraryStore, PaperFolder};
use crate::models::Paper;

/// Output format for results
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    /// Resolve `Auto` against the current stdout.
    pub fn resolve(self) -> OutputFormat {
        match self {
            OutputFormat::Auto => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Table
                } else {
                    OutputFormat::Json
                }
            }
            other => other,
        }
    }
}

/// Truncate to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Compact author line: first author plus "et al." when there are more.
pub fn format_authors(paper: &Paper) -> String {
    let names = paper.author_names();
    match names.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, ..] => format!("{} et al.", first),
    }
}

/// Print search results in the requested format, flagging papers already
/// favorited or seen.
pub fn print_papers(papers: &[Paper], library: &LibraryStore, format: OutputFormat) {
    match format.resolve() {
        OutputFormat::Json => {
            match serde_json::to_string_pretty(papers) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to render results as JSON"),
            }
        }
        OutputFormat::Plain => {
            for paper in papers {
                let title = paper.title.as_deref().unwrap_or("Untitled paper");
                let link = paper
                    .doi_url()
                    .map(|u| u.to_string())
                    .unwrap_or_default();
                println!("{} - {} ({})", title, format_authors(paper), link);
            }
        }
        _ => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "", "Title", "Authors", "Date", "Type"]);

            for (i, paper) in papers.iter().enumerate() {
                let id = paper.stable_id();
                let mut marks = String::new();
                if library.is_favorite(&id) {
                    marks.push('★');
                } else if library.has_seen(&id) {
                    marks.push('·');
                }

                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(marks),
                    Cell::new(truncate(paper.title.as_deref().unwrap_or("Untitled paper"), 60)),
                    Cell::new(truncate(&format_authors(paper), 28)),
                    Cell::new(paper.publication_date_formatted().unwrap_or_default()),
                    Cell::new(paper.primary_publication_type().unwrap_or_default()),
                ]);
            }
            println!("{table}");
        }
    }
}

/// Print one paper in full, the way a detail card would show it.
pub fn print_paper_card(paper: &Paper) {
    let title = paper.title.as_deref().unwrap_or("Untitled paper");
    if std::io::stdout().is_terminal() {
        println!("{}", title.bold());
    } else {
        println!("{title}");
    }
    let authors = format_authors(paper);
    if !authors.is_empty() {
        println!("  {authors}");
    }
    if let Some(date) = paper.publication_date_formatted() {
        println!("  {date}");
    }
    if let Some(tldr) = paper.tldr_text() {
        println!("  {}", truncate(tldr, 200));
    }
    if let Some(url) = paper.doi_url() {
        println!("  {url}");
    }
    if let Some(pdf) = paper.pdf_url() {
        println!("  PDF: {pdf}");
    }
}

/// Print the folder list with member counts, marking the selection.
pub fn print_folders(folders: &[PaperFolder], selected: &PaperFolder) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["", "Folder", "Papers"]);

    for folder in folders {
        let mark = if folder.id == selected.id { "›" } else { "" };
        table.add_row(vec![
            Cell::new(mark),
            Cell::new(&folder.name),
            Cell::new(folder.paper_ids.len()),
        ]);
    }
    println!("{table}");
}
