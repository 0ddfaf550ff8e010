use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::{HttpTransport, SearchClient, SearchTransport};
use crate::config::Config;
use crate::data_models::{CommittedQuery, PanelState};
use crate::debouncer::{DebounceSignal, Debouncer, InputEvent};
use crate::error::Result;
use crate::panel::{Key, PanelAction, PanelController};
use crate::render::{self, DisplayModel, SuggestionPick};
use crate::surface::Surface;

const EVENT_CAPACITY: usize = 64;

/// Notifications for whoever hosts the widget (the terminal front-end, tests).
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    Rendered(DisplayModel),
    Cleared,
    Navigated(String),
    Searching(bool),
}

struct WidgetState {
    surface: Surface,
    panel: PanelController,
}

/// Header search: debounced input, racing requests, rendering into one
/// results container.
pub struct SearchWidget<T: SearchTransport> {
    config: Config,
    state: Arc<Mutex<WidgetState>>,
    client: Arc<SearchClient<T>>,
    input_tx: mpsc::UnboundedSender<InputEvent>,
    events_tx: broadcast::Sender<WidgetEvent>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SearchWidget<HttpTransport> {
    /// Widget talking to `config.endpoint` over HTTP.
    pub fn connect(config: Config) -> Result<SearchWidget<HttpTransport>> {
        let transport = HttpTransport::new(&config.endpoint, config.request_timeout())?;
        Ok(SearchWidget::new(config, transport))
    }
}

impl<T: SearchTransport> SearchWidget<T> {
    /// Spawns the debouncer and driver tasks; needs a running tokio runtime.
    pub fn new(config: Config, transport: T) -> SearchWidget<T> {
        let state = Arc::new(Mutex::new(WidgetState {
            surface: Surface::default(),
            panel: PanelController::new(config.results_path.clone()),
        }));
        let client = Arc::new(SearchClient::new(transport));
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let shutdown = CancellationToken::new();

        let (input_tx, signals, debouncer) =
            Debouncer::new(config.debounce(), config.min_query_len).spawn();

        let driver = Driver {
            state: state.clone(),
            client: client.clone(),
            events_tx: events_tx.clone(),
            shutdown: shutdown.clone(),
            examples: Arc::new(config.example_queries.clone()),
        };
        let searching = tokio::spawn(driver.clone().mirror_searching(client.subscribe_in_flight()));
        let driving = tokio::spawn(driver.run(signals));

        log::info!("search widget ready, endpoint {}", config.endpoint);

        SearchWidget {
            config,
            state,
            client,
            input_tx,
            events_tx,
            shutdown,
            tasks: vec![debouncer, driving, searching],
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &SearchClient<T> {
        &self.client
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events_tx.subscribe()
    }

    pub async fn snapshot(&self) -> Surface {
        self.state.lock().await.surface.clone()
    }

    pub async fn panel_state(&self) -> PanelState {
        self.state.lock().await.panel.state()
    }

    /// Text-input change event carrying the full current value.
    pub async fn input(&self, text: &str) {
        {
            let mut state = self.state.lock().await;
            state.surface.input.text = text.to_string();
            state.surface.input.selected = false;
        }
        self.feed(InputEvent::from(text));
    }

    pub async fn key(&self, key: Key) -> PanelAction {
        let action = {
            let mut state = self.state.lock().await;
            let WidgetState { surface, panel } = &mut *state;
            panel.handle_key(key, surface)
        };
        self.after(&action);
        action
    }

    pub async fn click_toggle(&self) -> PanelAction {
        let action = {
            let mut state = self.state.lock().await;
            let WidgetState { surface, panel } = &mut *state;
            panel.toggle(surface)
        };
        self.after(&action);
        action
    }

    pub async fn click_close(&self) -> PanelAction {
        let action = {
            let mut state = self.state.lock().await;
            let WidgetState { surface, panel } = &mut *state;
            panel.close(surface)
        };
        self.after(&action);
        action
    }

    /// Example chip or suggestion click: put its query in the input and run
    /// the normal debounced pipeline.
    pub async fn pick(&self, pick: &SuggestionPick) {
        self.input(&pick.query).await;
    }

    /// Picks entry `index` (0-based) of the currently shown model.
    pub async fn pick_shown(&self, index: usize) -> Option<SuggestionPick> {
        let pick = {
            let state = self.state.lock().await;
            state.surface.shown_model()?.picks().get(index).cloned()?
        };
        self.pick(&pick).await;
        Some(pick)
    }

    /// Stops the background tasks. In-flight requests are left to finish
    /// but nothing is rendered afterwards.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        drop(self.input_tx);
        for task in self.tasks {
            if let Err(e) = task.await {
                log::error!("widget task failed: {e}");
            }
        }
        log::info!("search widget stopped");
    }

    fn after(&self, action: &PanelAction) {
        match action {
            // clearing the input clears results and supersedes in-flight requests
            PanelAction::Closed => self.feed(InputEvent::Reset),
            PanelAction::Navigate(location) => {
                // the page is leaving; a pending live search must not fire
                self.feed(InputEvent::Reset);
                let _ = self.events_tx.send(WidgetEvent::Navigated(location.clone()));
            }
            PanelAction::Opened | PanelAction::Ignored => {}
        }
    }

    fn feed(&self, event: InputEvent) {
        if let Err(e) = self.input_tx.send(event) {
            log::warn!("debouncer is gone, dropping input {:?}", e.0);
        }
    }
}

/// Background half of the widget: turns debounce signals into requests and
/// outcomes into rendered results.
struct Driver<T> {
    state: Arc<Mutex<WidgetState>>,
    client: Arc<SearchClient<T>>,
    events_tx: broadcast::Sender<WidgetEvent>,
    shutdown: CancellationToken,
    examples: Arc<Vec<String>>,
}

impl<T> Clone for Driver<T> {
    fn clone(&self) -> Self {
        Driver {
            state: self.state.clone(),
            client: self.client.clone(),
            events_tx: self.events_tx.clone(),
            shutdown: self.shutdown.clone(),
            examples: self.examples.clone(),
        }
    }
}

impl<T: SearchTransport> Driver<T> {
    async fn run(self, mut signals: mpsc::UnboundedReceiver<DebounceSignal>) {
        loop {
            let signal = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                signal = signals.recv() => match signal {
                    Some(signal) => signal,
                    None => break,
                },
            };

            match signal {
                DebounceSignal::Commit(query) => {
                    // numbered here, in commit order, before the requests race
                    let committed = self.client.commit(query);
                    tokio::spawn(self.clone().search(committed));
                }
                DebounceSignal::Clear => {
                    self.client.invalidate();
                    self.state.lock().await.surface.hide_results();
                    let _ = self.events_tx.send(WidgetEvent::Cleared);
                }
            }
        }
        log::debug!("widget driver stopped");
    }

    async fn search(self, committed: CommittedQuery) {
        let seq = committed.seq;
        let outcome = self.client.resolve(committed).await;
        if self.shutdown.is_cancelled() {
            return;
        }

        let mut state = self.state.lock().await;
        if !state.panel.is_open() {
            log::debug!("panel closed, not rendering outcome");
            return;
        }
        // a clear or newer commit may have landed while waiting for the lock
        if !outcome.is_superseded() && !self.client.is_current(seq) {
            log::debug!("search #{seq} superseded before rendering");
            return;
        }
        if let Some(model) = render::render(&mut state.surface, &outcome, &self.examples) {
            drop(state);
            let _ = self.events_tx.send(WidgetEvent::Rendered(model));
        }
    }

    async fn mirror_searching(self, mut in_flight: watch::Receiver<usize>) {
        let mut searching = false;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                changed = in_flight.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let now = *in_flight.borrow_and_update() > 0;
            if now != searching {
                searching = now;
                self.state.lock().await.surface.input.searching = now;
                let _ = self.events_tx.send(WidgetEvent::Searching(now));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchFailure;
    use crate::data_models::{Query, SearchResponse};

    struct Immediate;

    impl SearchTransport for Immediate {
        fn fetch(
            &self,
            _query: &str,
        ) -> impl Future<Output = std::result::Result<SearchResponse, FetchFailure>> + Send {
            async { Ok(SearchResponse::default()) }
        }
    }

    #[tokio::test]
    async fn test_outcome_superseded_while_waiting_for_lock_is_dropped() {
        let mut panel = PanelController::new("/search/");
        let mut surface = Surface::default();
        panel.open(&mut surface);
        let state = Arc::new(Mutex::new(WidgetState { surface, panel }));
        let (events_tx, mut events) = broadcast::channel(8);
        let client = Arc::new(SearchClient::new(Immediate));
        let driver = Driver {
            state: state.clone(),
            client: client.clone(),
            events_tx,
            shutdown: CancellationToken::new(),
            examples: Arc::new(Vec::new()),
        };

        let held = state.lock().await;
        let committed = client.commit(Query::new("Mazda", 2).unwrap());
        let search = tokio::spawn(driver.search(committed));
        // resolved while current, now parked on the state lock
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        client.invalidate();
        drop(held);
        search.await.unwrap();

        assert!(events.try_recv().is_err());
        assert!(state.lock().await.surface.results.is_none());
    }
}
