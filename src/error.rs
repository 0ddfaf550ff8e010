use thiserror::Error;

/// Errors raised while wiring a widget together. Search failures are not
/// errors: they are reported as `SearchOutcome::Failure`.
#[derive(Debug, Error)]
pub enum HeadsearchError {
    #[error("invalid configuration value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("invalid search endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, HeadsearchError>;
