//! Core data models for papers and their persisted snapshots.

mod paper;
mod snapshot;

pub use paper::{Author, ExternalIds, OpenAccessPdf, Paper, SearchPage, Tldr};
pub use snapshot::PaperSnapshot;
