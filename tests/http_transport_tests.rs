use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;

use headsearch::client::{HttpTransport, SearchClient};
use headsearch::config::Config;
use headsearch::data_models::{ErrorKind, SearchOutcome};
use headsearch::data_models::Query as SearchQuery;
use headsearch::render::DisplayModel;
use headsearch::widget::{SearchWidget, WidgetEvent};

const SEARCH_PATH: &str = "/api/search/header/";

mod test_helpers {
    use super::*;

    async fn header_search(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Response {
        let accepts_json = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !accepts_json {
            return StatusCode::NOT_ACCEPTABLE.into_response();
        }

        let q = params.get("q").cloned().unwrap_or_default();
        match q.as_str() {
            "missing" => StatusCode::NOT_FOUND.into_response(),
            "csrf" => StatusCode::FORBIDDEN.into_response(),
            "boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "teapot" => StatusCode::IM_A_TEAPOT.into_response(),
            "garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                axum::Json(json!({ "pages": [], "suggestions": [], "total_results": 0 }))
                    .into_response()
            }
            _ => axum::Json(json!({
                "pages": [{
                    "url": "/cars/1/",
                    "name": format!("{q} CX-5"),
                    "price": "2 450 000 ₽",
                    "category": "Crossover",
                    "location": "Kazan",
                    "profit": "+120 000"
                }],
                "suggestions": [format!("{q} CX-9")],
                "total_results": 1
            }))
            .into_response(),
        }
    }

    /// Serves the header search endpoint on an ephemeral local port.
    pub async fn spawn_search_server() -> Result<SocketAddr> {
        let app = Router::new().route(SEARCH_PATH, get(header_search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("test search server failed: {e}");
            }
        });
        Ok(addr)
    }

    pub fn endpoint(addr: SocketAddr) -> String {
        format!("http://{addr}{SEARCH_PATH}")
    }

    pub fn client(addr: SocketAddr, timeout: Duration) -> Result<SearchClient<HttpTransport>> {
        Ok(SearchClient::new(HttpTransport::new(&endpoint(addr), timeout)?))
    }

    pub fn q(text: &str) -> SearchQuery {
        SearchQuery::new(text, 2).unwrap()
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_success_parses_json_body() -> Result<()> {
    let addr = spawn_search_server().await?;
    let client = client(addr, Duration::from_secs(5))?;

    match client.submit(q("Mazda")).await {
        SearchOutcome::Success(res) => {
            assert_eq!(res.total_results, 1);
            assert_eq!(res.pages[0].name, "Mazda CX-5");
            assert_eq!(res.pages[0].location.as_deref(), Some("Kazan"));
            assert_eq!(res.pages[0].photo, None);
            assert_eq!(res.suggestions, vec!["Mazda CX-9".to_string()]);
        }
        other => panic!("expected success, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_query_with_spaces_round_trips() -> Result<()> {
    let addr = spawn_search_server().await?;
    let client = client(addr, Duration::from_secs(5))?;

    match client.submit(q("Kia Rio & co")).await {
        SearchOutcome::Success(res) => assert_eq!(res.pages[0].name, "Kia Rio & co CX-5"),
        other => panic!("expected success, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_http_statuses_are_classified() -> Result<()> {
    let addr = spawn_search_server().await?;
    let client = client(addr, Duration::from_secs(5))?;

    let cases = [
        ("missing", ErrorKind::NotFound, 404),
        ("csrf", ErrorKind::Forbidden, 403),
        ("boom", ErrorKind::ServerError, 500),
        ("teapot", ErrorKind::Other(418), 418),
    ];
    for (query, kind, status) in cases {
        assert_eq!(
            client.submit(q(query)).await,
            SearchOutcome::Failure(kind, status),
            "query {query}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_non_json_body_is_a_failure() -> Result<()> {
    let addr = spawn_search_server().await?;
    let client = client(addr, Duration::from_secs(5))?;

    assert_eq!(
        client.submit(q("garbage")).await,
        SearchOutcome::Failure(ErrorKind::Other(200), 200)
    );
    Ok(())
}

#[tokio::test]
async fn test_timeout_reports_no_connection() -> Result<()> {
    let addr = spawn_search_server().await?;
    let client = client(addr, Duration::from_millis(200))?;

    assert_eq!(
        client.submit(q("slow")).await,
        SearchOutcome::Failure(ErrorKind::NoConnection, 0)
    );
    assert!(!client.is_searching());
    Ok(())
}

#[tokio::test]
async fn test_refused_connection_reports_no_connection() -> Result<()> {
    // grab a free port and release it so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = client(addr, Duration::from_secs(5))?;
    assert_eq!(
        client.submit(q("Mazda")).await,
        SearchOutcome::Failure(ErrorKind::NoConnection, 0)
    );
    Ok(())
}

#[tokio::test]
async fn test_widget_end_to_end() -> Result<()> {
    let addr = spawn_search_server().await?;
    let config = Config {
        endpoint: endpoint(addr),
        debounce_ms: 20,
        ..Config::default()
    };
    let widget = SearchWidget::connect(config)?;
    let mut events = widget.subscribe();
    widget.click_toggle().await;

    widget.input("Mazda").await;
    let model = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(WidgetEvent::Rendered(model)) => return model,
                Ok(_) => continue,
                Err(e) => panic!("widget events ended: {e}"),
            }
        }
    })
    .await?;

    match &model {
        DisplayModel::Results { rows, suggestions, .. } => {
            assert_eq!(rows[0].meta, "2 450 000 ₽ • Crossover • Kazan");
            assert_eq!(rows[0].badge.as_deref(), Some("+120 000"));
            assert_eq!(suggestions[0].query, "Mazda");
        }
        other => panic!("expected results, got {other:?}"),
    }
    assert!(widget.snapshot().await.results_visible());

    widget.shutdown().await;
    Ok(())
}
