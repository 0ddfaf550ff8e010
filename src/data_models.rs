use serde::{Deserialize, Serialize};

/// Trimmed text typed into the search input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Trims `raw` and keeps it only if it is at least `min_len` characters.
    pub fn new(raw: &str, min_len: usize) -> Option<Query> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < min_len {
            return None;
        }
        Some(Query(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A query accepted by the client, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedQuery {
    pub query: Query,
    pub seq: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    #[serde(default)]
    pub pages: Vec<ResultItem>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<String>,
}

/// Failure classes, derived only from the HTTP status (0 when there was none).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    ServerError,
    NoConnection,
    Other(u16),
}

impl ErrorKind {
    pub fn from_status(status: u16) -> ErrorKind {
        match status {
            404 => ErrorKind::NotFound,
            403 => ErrorKind::Forbidden,
            500 => ErrorKind::ServerError,
            0 => ErrorKind::NoConnection,
            other => ErrorKind::Other(other),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "search API not found",
            ErrorKind::Forbidden => "access denied",
            ErrorKind::ServerError => "server error",
            ErrorKind::NoConnection => "no connection",
            ErrorKind::Other(_) => "search failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Success(SearchResponse),
    Failure(ErrorKind, u16),
    /// A newer query was submitted before this response arrived.
    Superseded,
}

impl SearchOutcome {
    pub fn failure(status: u16) -> SearchOutcome {
        SearchOutcome::Failure(ErrorKind::from_status(status), status)
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, SearchOutcome::Superseded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

#[test]
fn test_query_min_length_counts_chars() {
    assert!(Query::new("a", 2).is_none());
    assert!(Query::new("  a  ", 2).is_none());
    assert!(Query::new("", 2).is_none());
    // two cyrillic letters are four bytes but two characters
    assert_eq!(Query::new(" ав ", 2).unwrap().as_str(), "ав");
    assert_eq!(Query::new(" Mazda\t", 2).unwrap().as_str(), "Mazda");
}

#[test]
fn test_error_kind_from_status() {
    assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
    assert_eq!(ErrorKind::from_status(403), ErrorKind::Forbidden);
    assert_eq!(ErrorKind::from_status(500), ErrorKind::ServerError);
    assert_eq!(ErrorKind::from_status(0), ErrorKind::NoConnection);
    assert_eq!(ErrorKind::from_status(502), ErrorKind::Other(502));
    assert_eq!(ErrorKind::Other(502).message(), "search failed");
}

#[test]
fn test_response_tolerates_missing_fields() {
    let json = r#"{"pages":[{"url":"/p/1","name":"Mazda 3","price":"1 200 000 ₽"}]}"#;
    let res: SearchResponse = serde_json::from_str(json).unwrap();
    assert_eq!(res.pages.len(), 1);
    assert_eq!(res.pages[0].category, None);
    assert!(res.suggestions.is_empty());
    assert_eq!(res.total_results, 0);
}
