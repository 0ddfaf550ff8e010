use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::data_models::Query;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceSignal {
    /// The input went quiet for a full interval holding this query.
    Commit(Query),
    /// The input dropped below the minimum query length.
    Clear,
}

/// Raw events fed to the debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The input now holds this text.
    Changed(String),
    /// The input was emptied by the widget itself (close, submit). Always
    /// clears, whatever the minimum query length.
    Reset,
}

impl From<&str> for InputEvent {
    fn from(text: &str) -> Self {
        InputEvent::Changed(text.to_string())
    }
}

/// Timing filter between raw input events and the request client.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    min_query_len: usize,
}

impl Debouncer {
    pub fn new(quiet: Duration, min_query_len: usize) -> Debouncer {
        Debouncer {
            quiet,
            min_query_len,
        }
    }

    /// Spawns the debounce loop. Raw text goes into the returned sender and
    /// signals come out of the returned receiver. The task exits once every
    /// sender is dropped or the receiver is gone.
    pub fn spawn(
        self,
    ) -> (
        mpsc::UnboundedSender<InputEvent>,
        mpsc::UnboundedReceiver<DebounceSignal>,
        JoinHandle<()>,
    ) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(input_rx, signal_tx));
        (input_tx, signal_rx, handle)
    }

    pub async fn run(
        self,
        mut input_rx: mpsc::UnboundedReceiver<InputEvent>,
        signal_tx: mpsc::UnboundedSender<DebounceSignal>,
    ) {
        // At most one commit is ever scheduled; a new event replaces it.
        let mut pending: Option<(Query, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, at)| *at);

            tokio::select! {
                biased;

                event = input_rx.recv() => {
                    let query = match event {
                        Some(InputEvent::Changed(text)) => Query::new(&text, self.min_query_len),
                        Some(InputEvent::Reset) => None,
                        None => break,
                    };
                    match query {
                        Some(query) => {
                            log::debug!("scheduling commit for {query:?}");
                            pending = Some((query, Instant::now() + self.quiet));
                        }
                        None => {
                            pending = None;
                            if signal_tx.send(DebounceSignal::Clear).is_err() {
                                break;
                            }
                        }
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((query, _)) = pending.take() {
                        log::debug!("committing {query:?}");
                        if signal_tx.send(DebounceSignal::Commit(query)).is_err() {
                            break;
                        }
                    }
                }
            }
        }

        log::debug!("debouncer stopped");
    }
}
