//! Search request construction.
//!
//! Both search modes are pure functions of their inputs. Casual mode takes
//! free-text tags only; advanced mode adds authors, a date range, and the
//! citation-count / open-access filters. The `fields` parameter is a fixed
//! contract with the paper model: every field named there is one the
//! decoder in [`crate::models`] knows how to take.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use url::Url;

use crate::search::SearchError;

/// Fixed cap on results per request.
pub const RESULT_LIMIT: usize = 50;

/// The fields requested from the service. Must stay in sync with the
/// `Paper` decoder.
pub const PAPER_FIELDS: &str = "paperId,title,abstract,openAccessPdf,fieldsOfStudy,publicationDate,authors,tldr,externalIds,publicationTypes";

/// Suggested tag vocabulary. A casual-search tag that exactly matches one
/// of these doubles as a field-of-study constraint.
pub const SUGGESTED_TAGS: &[&str] = &[
    "Computer Science",
    "Medicine",
    "Chemistry",
    "Biology",
    "Materials Science",
    "Physics",
    "Geology",
    "Psychology",
    "Art",
    "History",
    "Geography",
    "Sociology",
    "Business",
    "Political Science",
    "Economics",
    "Philosophy",
    "Mathematics",
    "Engineering",
    "Environmental Science",
    "Agricultural and Food Sciences",
    "Education",
    "Law",
    "Linguistics",
];

/// A fully-built search request, ready to be turned into a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// `+`-joined query term
    pub query: String,

    /// `start:end` publication-year constraint
    pub year: Option<String>,

    /// Minimum citation count constraint
    pub min_citation_count: Option<u32>,

    /// Restrict to papers with an open-access PDF
    pub open_access_only: bool,

    /// Comma-joined field-of-study constraint
    pub fields_of_study: Option<String>,

    /// Result cap
    pub limit: usize,
}

impl SearchRequest {
    /// Build a casual-mode request from free-text tags.
    ///
    /// Every tag is split on whitespace and all tokens are `+`-joined into
    /// the query term. Tags that exactly match the suggested vocabulary
    /// additionally constrain by field of study; when none match, no such
    /// constraint is added.
    pub fn casual<S: AsRef<str>>(tags: &[S]) -> Self {
        let matched: Vec<&str> = tags
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| SUGGESTED_TAGS.contains(t))
            .collect();

        Self {
            query: plus_join(tags),
            year: None,
            min_citation_count: None,
            open_access_only: false,
            fields_of_study: if matched.is_empty() {
                None
            } else {
                Some(matched.join(","))
            },
            limit: RESULT_LIMIT,
        }
    }

    /// Build an advanced-mode request.
    ///
    /// Tags and authors are tokenized and `+`-joined independently, then
    /// concatenated with a single `+`. The year range is always present;
    /// the citation-count and open-access constraints are independent of
    /// each other.
    pub fn advanced<S: AsRef<str>>(
        tags: &[S],
        authors: &[S],
        min_citation_count: Option<u32>,
        start_date: &str,
        end_date: &str,
        open_access_only: bool,
    ) -> Self {
        Self {
            query: format!("{}+{}", plus_join(tags), plus_join(authors)),
            year: Some(format!("{}:{}", start_date, end_date)),
            min_citation_count,
            open_access_only,
            fields_of_study: None,
            limit: RESULT_LIMIT,
        }
    }

    /// Render the request against a base endpoint.
    ///
    /// Fails with [`SearchError::InvalidQuery`] before any network attempt
    /// when the term is empty after tokenization, carries control
    /// characters, or the base cannot be parsed.
    pub fn to_url(&self, base: &str) -> Result<Url, SearchError> {
        if self.query.trim_matches('+').is_empty() {
            return Err(SearchError::InvalidQuery(
                "query term is empty after tokenization".to_string(),
            ));
        }
        if self.query.chars().any(char::is_control) {
            return Err(SearchError::InvalidQuery(
                "query term contains control characters".to_string(),
            ));
        }

        let mut url =
            Url::parse(base).map_err(|e| SearchError::InvalidQuery(format!("bad endpoint: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &self.query);
            if let Some(year) = &self.year {
                pairs.append_pair("year", year);
            }
            if let Some(fields_of_study) = &self.fields_of_study {
                pairs.append_pair("fieldsOfStudy", fields_of_study);
            }
            if self.open_access_only {
                pairs.append_key_only("openAccessPdf");
            }
            pairs.append_pair("fields", PAPER_FIELDS);
            if let Some(min) = self.min_citation_count {
                pairs.append_pair("minCitationCount", &min.to_string());
            }
            pairs.append_pair("limit", &self.limit.to_string());
        }

        Ok(url)
    }
}

/// Split every value on whitespace and join all tokens with `+`.
fn plus_join<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .flat_map(|v| v.as_ref().split_whitespace())
        .collect::<Vec<_>>()
        .join("+")
}

/// Render a date the way the service's `year` parameter expects it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Accumulator for user-entered tags and authors.
///
/// Holds the working sets behind a search form; both are ordered sets so
/// request construction stays deterministic.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    tags: BTreeSet<String>,
    authors: BTreeSet<String>,
}

impl SearchFilters {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag; duplicates are ignored.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Remove a tag if present.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    /// Add an author; duplicates are ignored.
    pub fn add_author(&mut self, author: impl Into<String>) {
        self.authors.insert(author.into());
    }

    /// Remove an author if present.
    pub fn remove_author(&mut self, author: &str) {
        self.authors.remove(author);
    }

    /// Current tags, in set order.
    pub fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Current authors, in set order.
    pub fn authors(&self) -> Vec<&str> {
        self.authors.iter().map(String::as_str).collect()
    }

    /// Build a casual request from the current tags.
    pub fn casual_request(&self) -> SearchRequest {
        SearchRequest::casual(&self.tags())
    }

    /// Build an advanced request from the current tags and authors.
    pub fn advanced_request(
        &self,
        min_citation_count: Option<u32>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        open_access_only: bool,
    ) -> SearchRequest {
        SearchRequest::advanced(
            &self.tags(),
            &self.authors(),
            min_citation_count,
            &format_date(start_date),
            &format_date(end_date),
            open_access_only,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casual_free_text_tag() {
        let request = SearchRequest::casual(&["deep learning"]);
        assert_eq!(request.query, "deep+learning");
        assert_eq!(request.fields_of_study, None);
        assert_eq!(request.limit, RESULT_LIMIT);
    }

    #[test]
    fn test_casual_suggested_tag_adds_field_of_study() {
        let request = SearchRequest::casual(&["Biology"]);
        assert_eq!(request.query, "Biology");
        assert_eq!(request.fields_of_study.as_deref(), Some("Biology"));
    }

    #[test]
    fn test_casual_mixed_tags() {
        let request = SearchRequest::casual(&["deep learning", "Biology", "Computer Science"]);
        assert_eq!(request.query, "deep+learning+Biology+Computer+Science");
        assert_eq!(
            request.fields_of_study.as_deref(),
            Some("Biology,Computer Science")
        );
    }

    #[test]
    fn test_advanced_request_shape() {
        let request = SearchRequest::advanced(
            &["graphs"],
            &["Jane Doe"],
            None,
            "2020-01-01",
            "2024-01-01",
            true,
        );
        assert_eq!(request.query, "graphs+Jane+Doe");
        assert_eq!(request.year.as_deref(), Some("2020-01-01:2024-01-01"));
        assert!(request.open_access_only);
        assert_eq!(request.min_citation_count, None);
    }

    #[test]
    fn test_advanced_constraints_are_orthogonal() {
        for (min, open) in [(None, false), (None, true), (Some(10), false), (Some(10), true)] {
            let request =
                SearchRequest::advanced(&["x"], &["y"], min, "2020-01-01", "2024-01-01", open);
            let url = request.to_url("https://example.com/search").unwrap();
            let has_pair = |key: &str| url.query_pairs().any(|(k, _)| k == key);
            assert_eq!(has_pair("minCitationCount"), min.is_some());
            assert_eq!(has_pair("openAccessPdf"), open);
        }
    }

    #[test]
    fn test_to_url_carries_fields_and_limit() {
        let request = SearchRequest::casual(&["Biology"]);
        let url = request.to_url("https://example.com/search").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("fields".to_string(), PAPER_FIELDS.to_string())));
        assert!(pairs.contains(&("limit".to_string(), "50".to_string())));
        assert!(pairs.contains(&("fieldsOfStudy".to_string(), "Biology".to_string())));
    }

    #[test]
    fn test_empty_term_is_invalid() {
        let request = SearchRequest::casual::<&str>(&[]);
        assert!(matches!(
            request.to_url("https://example.com/search"),
            Err(SearchError::InvalidQuery(_))
        ));

        // Advanced mode with nothing on either side joins to a bare "+"
        let request = SearchRequest::advanced::<&str>(&[], &[], None, "2020-01-01", "2024-01-01", false);
        assert!(matches!(
            request.to_url("https://example.com/search"),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_control_characters_are_invalid() {
        let request = SearchRequest::casual(&["bad\u{0}tag"]);
        assert!(matches!(
            request.to_url("https://example.com/search"),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_filters_accumulate_and_dedupe() {
        let mut filters = SearchFilters::new();
        filters.add_tag("graphs");
        filters.add_tag("graphs");
        filters.add_author("Jane Doe");
        assert_eq!(filters.tags(), vec!["graphs"]);

        filters.remove_tag("graphs");
        assert!(filters.tags().is_empty());
        assert_eq!(filters.authors(), vec!["Jane Doe"]);
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(format_date(date), "2020-01-01");
    }
}
