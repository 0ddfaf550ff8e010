use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::ACCEPT;
use tokio::sync::watch;
use url::Url;

use crate::data_models::{CommittedQuery, Query, SearchOutcome, SearchResponse};
use crate::error::{HeadsearchError, Result};

/// Why a fetch produced no usable response. `status` is 0 when no HTTP
/// status was received (connection refused, timeout, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub status: u16,
    pub reason: String,
}

impl FetchFailure {
    pub fn new(status: u16, reason: impl Into<String>) -> FetchFailure {
        FetchFailure {
            status,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(e: reqwest::Error) -> Self {
        let status = if e.is_timeout() {
            0
        } else {
            e.status().map(|s| s.as_u16()).unwrap_or(0)
        };
        FetchFailure::new(status, e.to_string())
    }
}

/// One round-trip to the search endpoint.
pub trait SearchTransport: Send + Sync + 'static {
    fn fetch(
        &self,
        query: &str,
    ) -> impl Future<Output = std::result::Result<SearchResponse, FetchFailure>> + Send;
}

/// `GET <endpoint>?q=<query>` over reqwest, expecting a JSON body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<HttpTransport> {
        let endpoint = Url::parse(endpoint).map_err(|source| HeadsearchError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);
        url
    }
}

impl SearchTransport for HttpTransport {
    fn fetch(
        &self,
        query: &str,
    ) -> impl Future<Output = std::result::Result<SearchResponse, FetchFailure>> + Send {
        let request = self
            .http
            .get(self.request_url(query))
            .header(ACCEPT, "application/json");

        async move {
            let res = request.send().await?;
            let status = res.status();
            if !status.is_success() {
                return Err(FetchFailure::new(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unexpected status"),
                ));
            }

            let body = res.bytes().await?;
            // A 2xx body that is not JSON is still a failure, reported with its status.
            serde_json::from_slice(&body).map_err(|e| {
                FetchFailure::new(status.as_u16(), format!("invalid json body: {e}"))
            })
        }
    }
}

/// Issues searches and reconciles their out-of-order completion.
///
/// Every submission takes the next sequence number. A response that lands
/// after a newer submission (or an `invalidate`) resolves as
/// `SearchOutcome::Superseded` and must be discarded by the caller.
pub struct SearchClient<T> {
    transport: T,
    latest_seq: AtomicU64,
    in_flight: watch::Sender<usize>,
}

impl<T: SearchTransport> SearchClient<T> {
    pub fn new(transport: T) -> SearchClient<T> {
        let (in_flight, _) = watch::channel(0);
        SearchClient {
            transport,
            latest_seq: AtomicU64::new(0),
            in_flight,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tags `query` with the next sequence number.
    pub fn commit(&self, query: Query) -> CommittedQuery {
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        CommittedQuery { query, seq }
    }

    pub async fn submit(&self, query: Query) -> SearchOutcome {
        let committed = self.commit(query);
        self.resolve(committed).await
    }

    /// Runs an already committed query to its outcome.
    pub async fn resolve(&self, committed: CommittedQuery) -> SearchOutcome {
        let CommittedQuery { query, seq } = committed;
        let _guard = InFlight::enter(&self.in_flight);

        log::debug!("search #{seq}: {query:?}");
        let result = self.transport.fetch(query.as_str()).await;

        if !self.is_current(seq) {
            log::debug!("search #{seq} superseded, discarding response");
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(response) => {
                log::debug!(
                    "search #{seq}: {} items, {} total",
                    response.pages.len(),
                    response.total_results
                );
                SearchOutcome::Success(response)
            }
            Err(failure) => {
                log::warn!(
                    "search #{seq} failed with status {}: {}",
                    failure.status,
                    failure.reason
                );
                SearchOutcome::failure(failure.status)
            }
        }
    }

    /// Supersedes every outstanding request without issuing a new one.
    pub fn invalidate(&self) {
        self.latest_seq.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.latest_seq.load(Ordering::SeqCst) == seq
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq.load(Ordering::SeqCst)
    }

    /// True while at least one request is outstanding.
    pub fn is_searching(&self) -> bool {
        *self.in_flight.borrow() > 0
    }

    /// Number of outstanding requests; changes on every start and completion.
    pub fn subscribe_in_flight(&self) -> watch::Receiver<usize> {
        self.in_flight.subscribe()
    }
}

/// Counts a request as outstanding for as long as it lives, even if the
/// request future is dropped before completing.
struct InFlight<'a> {
    count: &'a watch::Sender<usize>,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a watch::Sender<usize>) -> InFlight<'a> {
        count.send_modify(|n| *n += 1);
        InFlight { count }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[test]
fn test_request_url_encodes_query() {
    let transport =
        HttpTransport::new("http://localhost:8000/api/search/header/", Duration::from_secs(5))
            .unwrap();
    let url = transport.request_url("Kia Rio & co");
    assert_eq!(
        url.as_str(),
        "http://localhost:8000/api/search/header/?q=Kia+Rio+%26+co"
    );
}

#[test]
fn test_invalid_endpoint_is_rejected() {
    let res = HttpTransport::new("not a url", Duration::from_secs(5));
    assert!(matches!(res, Err(HeadsearchError::InvalidEndpoint { .. })));
}
