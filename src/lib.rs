mod aggregator;
mod cache;
mod client;
mod config;
mod error;
mod paginator;
mod types;
pub mod utils;

pub use aggregator::Aggregator;
pub use cache::{SharedCache, TtlCache};
pub use client::AdminClient;
pub use config::{AdminApiConfig, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PAGE_SIZE};
pub use error::{FetchError, GateviewError, Result};
pub use paginator::{Page, Paginator};
pub use types::{
    EntityCounts, HealthStatus, ServiceSummary, TargetRecord, UpstreamSummary,
};
