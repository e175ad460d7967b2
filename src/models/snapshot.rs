//! Flattened paper form persisted with the library.
//!
//! Folder contents must outlive the search results they came from, so every
//! paper added to the library is stored as a [`PaperSnapshot`] keyed by its
//! stable id. The snapshot keeps author names only (no author ids) and the
//! DOI only (no other registry ids); reconstruction restores exactly what
//! was flattened.

use serde::{Deserialize, Serialize};

use crate::models::paper::{Author, ExternalIds, OpenAccessPdf, Paper, Tldr};

/// Independently storable form of a [`Paper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSnapshot {
    pub paper_id: Option<String>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub pdf_url: String,
    pub fields_of_study: Option<Vec<String>>,
    pub publication_date: Option<String>,
    pub authors: Option<Vec<String>>,
    pub tldr: Option<String>,
    pub doi: Option<String>,
    pub publication_types: Option<Vec<String>>,
}

impl From<&Paper> for PaperSnapshot {
    fn from(paper: &Paper) -> Self {
        Self {
            paper_id: paper.paper_id.clone(),
            title: paper.title.clone(),
            abstract_text: paper.abstract_text.clone(),
            pdf_url: paper.open_access_pdf.url.clone(),
            fields_of_study: paper.fields_of_study.clone(),
            publication_date: paper.publication_date.clone(),
            authors: paper
                .authors
                .as_ref()
                .map(|authors| authors.iter().filter_map(|a| a.name.clone()).collect()),
            tldr: paper.tldr.as_ref().and_then(|t| t.text.clone()),
            doi: paper.external_ids.as_ref().and_then(|ids| ids.doi.clone()),
            publication_types: paper.publication_types.clone(),
        }
    }
}

impl PaperSnapshot {
    /// Rebuild a [`Paper`] from the flattened form.
    ///
    /// Authors come back without ids and external ids carry only the DOI;
    /// everything the snapshot holds is restored verbatim.
    pub fn to_paper(&self) -> Paper {
        Paper {
            paper_id: self.paper_id.clone(),
            title: self.title.clone(),
            abstract_text: self.abstract_text.clone(),
            open_access_pdf: OpenAccessPdf {
                url: self.pdf_url.clone(),
            },
            fields_of_study: self.fields_of_study.clone(),
            publication_date: self.publication_date.clone(),
            authors: self.authors.as_ref().map(|names| {
                names
                    .iter()
                    .map(|name| Author {
                        author_id: None,
                        name: Some(name.clone()),
                    })
                    .collect()
            }),
            tldr: self.tldr.clone().map(|text| Tldr { text: Some(text) }),
            external_ids: Some(ExternalIds {
                doi: self.doi.clone(),
                pub_med: None,
                ar_xiv: None,
            }),
            publication_types: self.publication_types.clone(),
        }
    }
}
