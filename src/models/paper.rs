//! Paper model matching the Semantic Scholar wire format.
//!
//! Every field the service may omit or null out is optional here; decoding a
//! paper object never fails. The one exception to plain optionality is
//! [`OpenAccessPdf`], whose missing URL collapses to the empty string so a
//! paper without a usable PDF link is still a perfectly good record.

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Response envelope returned by the paper search endpoint.
///
/// `data` may be absent or `null`, both of which mean zero results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// Total number of matches known to the service (may exceed what was returned)
    pub total: u64,

    /// The papers, in service order
    pub data: Option<Vec<Paper>>,
}

impl SearchPage {
    /// Consume the page, yielding the papers in service order.
    pub fn into_papers(self) -> Vec<Paper> {
        self.data.unwrap_or_default()
    }

    /// Number of papers actually present on this page.
    pub fn len(&self) -> usize {
        self.data.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// Whether the page carries no papers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A research paper as returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Service-assigned identifier
    #[serde(default)]
    pub paper_id: Option<String>,

    /// Paper title
    #[serde(default)]
    pub title: Option<String>,

    /// Abstract text
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,

    /// Open-access PDF link; an absent link is kept as an empty URL string
    #[serde(default, deserialize_with = "null_to_default")]
    pub open_access_pdf: OpenAccessPdf,

    /// Field-of-study tags
    #[serde(default)]
    pub fields_of_study: Option<Vec<String>>,

    /// Raw publication date: full ISO date, bare year, or free text
    #[serde(default)]
    pub publication_date: Option<String>,

    /// Author list
    #[serde(default)]
    pub authors: Option<Vec<Author>>,

    /// Machine-generated short summary
    #[serde(default)]
    pub tldr: Option<Tldr>,

    /// Identifiers in external registries
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,

    /// Publication type strings (e.g. "JournalArticle")
    #[serde(default)]
    pub publication_types: Option<Vec<String>>,
}

/// Open-access PDF location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAccessPdf {
    /// PDF URL; empty when the service had none to offer
    #[serde(default, deserialize_with = "null_to_default")]
    pub url: String,
}

/// A paper author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Service-assigned author identifier
    #[serde(default)]
    pub author_id: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Machine-generated summary container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tldr {
    #[serde(default)]
    pub text: Option<String>,
}

/// Identifiers in external registries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,

    #[serde(rename = "PubMed", default)]
    pub pub_med: Option<String>,

    #[serde(rename = "ArXiv", default)]
    pub ar_xiv: Option<String>,
}

/// Treat an explicit JSON `null` the same as an absent field.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Paper {
    /// The key under which this paper is tracked in the library.
    ///
    /// The service identifier wins when present; otherwise the title stands
    /// in, prefixed so it cannot collide with a real identifier. A paper
    /// with neither gets a freshly generated random token and cannot be
    /// deduplicated.
    pub fn stable_id(&self) -> String {
        if let Some(id) = &self.paper_id {
            if !id.is_empty() {
                return id.clone();
            }
        }
        if let Some(title) = &self.title {
            if !title.is_empty() {
                return format!("title::{}", title);
            }
        }
        uuid::Uuid::new_v4().to_string()
    }

    /// Author display names, in author order, skipping nameless entries.
    pub fn author_names(&self) -> Vec<&str> {
        self.authors
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|a| a.name.as_deref())
            .collect()
    }

    /// Human-readable publication date.
    ///
    /// A 10-character ISO date is re-rendered in medium style ("Jun 15,
    /// 2021"). A bare year, free text, or an unparseable 10-character
    /// string comes back unchanged. An empty or absent date yields `None`.
    pub fn publication_date_formatted(&self) -> Option<String> {
        let raw = self.publication_date.as_deref().filter(|s| !s.is_empty())?;

        if raw.len() == 10 {
            if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                return Some(date.format("%b %-d, %Y").to_string());
            }
        }

        Some(raw.to_string())
    }

    /// Display label for the first publication type, if any.
    pub fn primary_publication_type(&self) -> Option<String> {
        let raw = self.publication_types.as_deref()?.first()?.to_lowercase();

        let label = match raw.as_str() {
            "journalarticle" => "Article".to_string(),
            "book" => "Book".to_string(),
            "bookchapter" => "Chapter".to_string(),
            "thesis" => "Thesis".to_string(),
            _ => title_case(&raw),
        };

        Some(label)
    }

    /// Best external link for this paper.
    ///
    /// Priority: DOI, then PubMed, then arXiv, then the service permalink.
    /// The first registry with a non-empty id wins; later ones are never
    /// consulted.
    pub fn doi_url(&self) -> Option<Url> {
        if let Some(ids) = &self.external_ids {
            if let Some(doi) = ids.doi.as_deref().filter(|s| !s.is_empty()) {
                return Url::parse(&format!("https://doi.org/{}", doi)).ok();
            }
            if let Some(pmid) = ids.pub_med.as_deref().filter(|s| !s.is_empty()) {
                return Url::parse(&format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)).ok();
            }
            if let Some(arxiv) = ids.ar_xiv.as_deref().filter(|s| !s.is_empty()) {
                return Url::parse(&format!("https://arxiv.org/abs/{}", arxiv)).ok();
            }
        }

        if let Some(id) = self.paper_id.as_deref().filter(|s| !s.is_empty()) {
            return Url::parse(&format!("https://www.semanticscholar.org/p/{}", id)).ok();
        }

        None
    }

    /// Parsed open-access PDF link; malformed or empty links are dropped.
    pub fn pdf_url(&self) -> Option<Url> {
        if self.open_access_pdf.url.is_empty() {
            return None;
        }
        Url::parse(&self.open_access_pdf.url).ok()
    }

    /// The short summary text, if present and non-empty.
    pub fn tldr_text(&self) -> Option<&str> {
        self.tldr
            .as_ref()
            .and_then(|t| t.text.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Capitalize the first letter of each whitespace-separated word,
/// lowercasing the rest.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
