use crate::data_models::PanelState;
use crate::surface::Surface;

/// Keyboard triggers the panel reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Global shortcut (Ctrl+/ or Cmd+/).
    Shortcut,
    Escape,
    Enter,
    Other,
}

/// What a trigger did to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Opened,
    Closed,
    /// Explicit submit: the page navigates to this location.
    Navigate(String),
    Ignored,
}

/// Open/closed state of the search surface.
#[derive(Debug, Clone)]
pub struct PanelController {
    state: PanelState,
    results_path: String,
}

impl PanelController {
    pub fn new(results_path: impl Into<String>) -> PanelController {
        PanelController {
            state: PanelState::Closed,
            results_path: results_path.into(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PanelState::Open
    }

    /// Icon click or shortcut.
    pub fn toggle(&mut self, surface: &mut Surface) -> PanelAction {
        match self.state {
            PanelState::Closed => self.open(surface),
            PanelState::Open => self.close(surface),
        }
    }

    pub fn open(&mut self, surface: &mut Surface) -> PanelAction {
        self.state = PanelState::Open;
        surface.wrapper_visible = true;
        surface.input.focused = true;
        surface.input.selected = !surface.input.text.is_empty();
        // old results stay hidden until the next commit renders
        surface.hide_results();
        log::debug!("search panel opened");
        PanelAction::Opened
    }

    /// Close icon, Escape, or a toggle while open. Hides the results
    /// container but keeps it around.
    pub fn close(&mut self, surface: &mut Surface) -> PanelAction {
        self.state = PanelState::Closed;
        surface.wrapper_visible = false;
        surface.input.text.clear();
        surface.input.focused = false;
        surface.input.selected = false;
        surface.hide_results();
        log::debug!("search panel closed");
        PanelAction::Closed
    }

    pub fn handle_key(&mut self, key: Key, surface: &mut Surface) -> PanelAction {
        match key {
            Key::Shortcut => self.toggle(surface),
            Key::Escape => self.close(surface),
            Key::Enter => match self.submit_location(&surface.input.text) {
                Some(location) => {
                    log::info!("navigating to {location}");
                    surface.location = Some(location.clone());
                    PanelAction::Navigate(location)
                }
                None => PanelAction::Ignored,
            },
            Key::Other => PanelAction::Ignored,
        }
    }

    /// Full results page for `text`, or `None` when it is blank.
    pub fn submit_location(&self, text: &str) -> Option<String> {
        let query = text.trim();
        if query.is_empty() {
            return None;
        }
        Some(format!(
            "{}?q={}",
            self.results_path,
            encode_uri_component(query)
        ))
    }
}

/// `encodeURIComponent`: like `urlencoding::encode` but leaves `!'()*` alone.
fn encode_uri_component(raw: &str) -> String {
    urlencoding::encode(raw)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}
