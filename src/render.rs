use std::fmt::Write;

use maud::{Markup, Render, html};

use crate::data_models::{ErrorKind, ResultItem, SearchOutcome, SearchResponse};
use crate::surface::{ResultsContainer, Surface};

pub const DEFAULT_ITEM_ICON: &str = "ri-car-line";

/// What the results container shows, independent of any markup.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayModel {
    NoResults {
        examples: Vec<SuggestionPick>,
    },
    Error {
        kind: ErrorKind,
        message: &'static str,
        status: u16,
    },
    Results {
        total: u64,
        rows: Vec<ResultRow>,
        suggestions: Vec<SuggestionPick>,
    },
}

impl DisplayModel {
    /// Entries that re-run the search when picked, in display order.
    pub fn picks(&self) -> &[SuggestionPick] {
        match self {
            DisplayModel::NoResults { examples } => examples,
            DisplayModel::Results { suggestions, .. } => suggestions,
            DisplayModel::Error { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub url: String,
    pub name: String,
    pub visual: RowVisual,
    /// Price, category and location joined with " • ".
    pub meta: String,
    pub badge: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowVisual {
    Image { src: String },
    Icon { class: String },
}

/// A clickable entry that puts `query` into the input and searches again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionPick {
    pub label: String,
    pub query: String,
}

impl SuggestionPick {
    fn example(text: &str) -> SuggestionPick {
        SuggestionPick {
            label: text.to_string(),
            query: text.to_string(),
        }
    }

    /// Suggestions search by their first whitespace-delimited token only.
    fn from_suggestion(suggestion: &str) -> SuggestionPick {
        SuggestionPick {
            label: suggestion.to_string(),
            query: suggestion
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Maps an outcome to its display model; `None` for superseded outcomes,
/// which must leave the surface untouched.
pub fn display_model(outcome: &SearchOutcome, examples: &[String]) -> Option<DisplayModel> {
    match outcome {
        SearchOutcome::Superseded => None,
        SearchOutcome::Failure(kind, status) => Some(DisplayModel::Error {
            kind: *kind,
            message: kind.message(),
            status: *status,
        }),
        SearchOutcome::Success(response) if response.pages.is_empty() => {
            Some(DisplayModel::NoResults {
                examples: examples.iter().map(|e| SuggestionPick::example(e)).collect(),
            })
        }
        SearchOutcome::Success(response) => Some(results_model(response)),
    }
}

fn results_model(response: &SearchResponse) -> DisplayModel {
    DisplayModel::Results {
        total: response.total_results,
        rows: response.pages.iter().map(result_row).collect(),
        suggestions: response
            .suggestions
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| SuggestionPick::from_suggestion(s))
            .collect(),
    }
}

fn result_row(item: &ResultItem) -> ResultRow {
    let visual = match item.photo.as_deref().filter(|p| !p.is_empty()) {
        Some(src) => RowVisual::Image {
            src: src.to_string(),
        },
        None => RowVisual::Icon {
            class: item
                .icon
                .clone()
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| DEFAULT_ITEM_ICON.to_string()),
        },
    };

    let meta = [
        Some(item.price.as_str()),
        item.category.as_deref(),
        item.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" • ");

    ResultRow {
        url: item.url.clone(),
        name: item.name.clone(),
        visual,
        meta,
        badge: item.profit.clone().filter(|p| !p.is_empty()),
    }
}

/// Writes `model` into the surface's results container, creating the
/// container on first use and showing it.
pub fn mount(surface: &mut Surface, model: DisplayModel) {
    let container = surface.results.get_or_insert_with(ResultsContainer::default);
    container.model = Some(model);
    container.visible = true;
}

/// `display_model` followed by `mount`. Returns the mounted model.
pub fn render(
    surface: &mut Surface,
    outcome: &SearchOutcome,
    examples: &[String],
) -> Option<DisplayModel> {
    let model = display_model(outcome, examples)?;
    mount(surface, model.clone());
    Some(model)
}

impl Render for DisplayModel {
    fn render(&self) -> Markup {
        match self {
            DisplayModel::NoResults { examples } => html! {
                div class="search-no-results" {
                    i class="ri-search-line ri-3x mb-3" {}
                    p class="mb-1" { "Nothing found" }
                    small class="text-muted" { "Try another query" }
                    div class="mt-3" {
                        small class="text-muted" { "Examples:" }
                        div class="d-flex flex-wrap gap-1 mt-1" {
                            @for pick in examples {
                                span class="badge bg-light text-dark" data-query=(pick.query) { (pick.label) }
                            }
                        }
                    }
                }
            },
            DisplayModel::Error {
                message, status, ..
            } => html! {
                div class="search-no-results" {
                    i class="ri-error-warning-line ri-3x mb-3 text-danger" {}
                    p class="mb-1" { strong { (message) } }
                    small class="text-muted" { "Status: " (status) }
                }
            },
            DisplayModel::Results {
                total,
                rows,
                suggestions,
            } => html! {
                div class="search-category" { "Found: " (total) " items" }
                @for row in rows {
                    (row)
                }
                @if !suggestions.is_empty() {
                    div class="search-category mt-2" { "Suggestions" }
                    @for pick in suggestions {
                        div class="search-suggestion" data-query=(pick.query) {
                            i class="ri-search-line me-2" {}
                            span { (pick.label) }
                        }
                    }
                }
            },
        }
    }
}

impl Render for ResultRow {
    fn render(&self) -> Markup {
        html! {
            a href=(self.url) class="search-result-item" {
                div class="d-flex align-items-center" {
                    div class="search-item-img me-2" {
                        @match &self.visual {
                            RowVisual::Image { src } => {
                                img src=(src) alt=(self.name) class="search-item-img";
                            }
                            RowVisual::Icon { class } => {
                                div class="search-item-icon" { i class=(class) {} }
                            }
                        }
                    }
                    div class="search-item-info flex-grow-1" {
                        h6 class="mb-1" { (self.name) }
                        div class="search-item-meta small text-muted mb-1" { (self.meta) }
                        @if let Some(badge) = &self.badge {
                            span class="badge bg-success" { (badge) }
                        }
                    }
                }
            }
        }
    }
}

/// Markup for the results container, using the dashboard's class names.
pub fn to_html(model: &DisplayModel) -> String {
    model.render().into_string()
}

/// Plain-text rendering for terminals. Picks are numbered from 1.
pub fn to_text(model: &DisplayModel) -> String {
    let mut out = String::new();
    match model {
        DisplayModel::NoResults { examples } => {
            out.push_str("Nothing found. Try another query.\n");
            if !examples.is_empty() {
                out.push_str("Examples:\n");
                for (i, pick) in examples.iter().enumerate() {
                    let _ = writeln!(out, "  [{}] {}", i + 1, pick.label);
                }
            }
        }
        DisplayModel::Error {
            message, status, ..
        } => {
            let _ = writeln!(out, "Search error: {message} (status {status})");
        }
        DisplayModel::Results {
            total,
            rows,
            suggestions,
        } => {
            let _ = writeln!(out, "Found: {total} items");
            for row in rows {
                let _ = writeln!(out, "  {}", row.name);
                let _ = writeln!(out, "    {}", row.meta);
                if let Some(badge) = &row.badge {
                    let _ = writeln!(out, "    [{badge}]");
                }
                let _ = writeln!(out, "    -> {}", row.url);
            }
            if !suggestions.is_empty() {
                out.push_str("Suggestions:\n");
                for (i, pick) in suggestions.iter().enumerate() {
                    let _ = writeln!(out, "  [{}] {}", i + 1, pick.label);
                }
            }
        }
    }
    out
}

#[test]
fn test_html_escapes_server_strings() {
    let model = DisplayModel::Error {
        kind: ErrorKind::Other(418),
        message: "<b>\"Kia\" & Rio</b>",
        status: 418,
    };
    let html = to_html(&model);
    assert!(html.contains("&lt;b&gt;&quot;Kia&quot; &amp; Rio&lt;/b&gt;"));
    assert!(html.contains("Status: 418"));
}

#[test]
fn test_suggestion_searches_first_token() {
    let pick = SuggestionPick::from_suggestion("Mazda CX-5 2021");
    assert_eq!(pick.label, "Mazda CX-5 2021");
    assert_eq!(pick.query, "Mazda");
}
