#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use headsearch::client::{FetchFailure, SearchTransport};
use headsearch::data_models::{ResultItem, SearchResponse};

type Scripted = (Duration, Result<SearchResponse, FetchFailure>);

/// Transport answering from a fixed script after a per-query delay on the
/// tokio clock. Unscripted queries fail with 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<HashMap<String, Scripted>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, query: &str, delay_ms: u64, response: SearchResponse) -> Self {
        self.script.lock().unwrap().insert(
            query.to_string(),
            (Duration::from_millis(delay_ms), Ok(response)),
        );
        self
    }

    pub fn fail(self, query: &str, delay_ms: u64, status: u16) -> Self {
        self.script.lock().unwrap().insert(
            query.to_string(),
            (
                Duration::from_millis(delay_ms),
                Err(FetchFailure::new(status, "scripted failure")),
            ),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SearchTransport for ScriptedTransport {
    fn fetch(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<SearchResponse, FetchFailure>> + Send {
        self.calls.lock().unwrap().push(query.to_string());
        let (delay, result) = self
            .script
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or((Duration::ZERO, Err(FetchFailure::new(404, "unscripted"))));

        async move {
            tokio::time::sleep(delay).await;
            result
        }
    }
}

pub fn item(name: &str, price: &str) -> ResultItem {
    ResultItem {
        url: format!("/cars/{}/", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        price: price.to_string(),
        category: None,
        location: None,
        photo: None,
        icon: None,
        profit: None,
    }
}

pub fn response(items: Vec<ResultItem>, suggestions: &[&str]) -> SearchResponse {
    SearchResponse {
        total_results: items.len() as u64,
        pages: items,
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
    }
}
