//! In-memory stand-in for the page the search widget is attached to: the
//! input wrapper, the input itself, the results container and the location
//! the page would navigate to.

use crate::render::{self, DisplayModel};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputField {
    pub text: String,
    pub focused: bool,
    /// Whole text selected, as after `input.select()`.
    pub selected: bool,
    /// Spinner shown while a request is outstanding.
    pub searching: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsContainer {
    pub model: Option<DisplayModel>,
    pub visible: bool,
}

impl ResultsContainer {
    pub fn html(&self) -> String {
        self.model.as_ref().map(render::to_html).unwrap_or_default()
    }

    pub fn text(&self) -> String {
        self.model.as_ref().map(render::to_text).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    pub wrapper_visible: bool,
    pub input: InputField,
    /// Created on first render, then reused.
    pub results: Option<ResultsContainer>,
    /// Set when the page navigates away (full results view).
    pub location: Option<String>,
}

impl Surface {
    pub fn hide_results(&mut self) {
        if let Some(results) = self.results.as_mut() {
            results.visible = false;
        }
    }

    pub fn results_visible(&self) -> bool {
        self.results.as_ref().is_some_and(|r| r.visible)
    }

    /// The model currently shown, if the container is visible.
    pub fn shown_model(&self) -> Option<&DisplayModel> {
        self.results
            .as_ref()
            .filter(|r| r.visible)
            .and_then(|r| r.model.as_ref())
    }
}
