use thiserror::Error;

/// A single admin-API request failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("api error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GateviewError {
    /// A pagination walk (or single fetch) against the admin API failed.
    /// `page` is 1-based; non-paginated fetches report page 1.
    #[error("fetching {path} (page {page}) failed: {source}")]
    Fetch {
        path: String,
        page: usize,
        #[source]
        source: FetchError,
    },
    /// A required sub-fetch inside a composite view failed.
    #[error("aggregating view `{view}` failed: {source}")]
    Aggregation {
        view: &'static str,
        #[source]
        source: Box<GateviewError>,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GateviewError {
    pub(crate) fn aggregation(view: &'static str, source: GateviewError) -> Self {
        GateviewError::Aggregation {
            view,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, GateviewError>;
