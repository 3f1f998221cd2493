use std::collections::{BTreeMap, HashMap};

use futures_util::{Stream, StreamExt, TryStreamExt, stream, try_join};

use crate::cache::SharedCache;
use crate::client::AdminClient;
use crate::config::{AdminApiConfig, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_PAGE_SIZE};
use crate::paginator::Paginator;
use crate::types::{
    EntityCounts, HealthSnapshot, HealthStatus, RawRoute, RawService, RawTarget, RawUpstream,
    ServiceSummary, TargetRecord, UpstreamSummary,
};
use crate::{GateviewError, Result};

const COUNTS_KEY: &str = "counts";
const SERVICES_KEY: &str = "servicesWithRoutes";
const UPSTREAMS_KEY: &str = "upstreamsWithHealth";
const ROUTES_BY_SERVICE_KEY: &str = "routesByService";

/// Bound on per-upstream (and per-service) joins running at once within a
/// single view computation, so large collections cannot overwhelm the
/// admin API.
const FAN_OUT_MAX_CONCURRENCY: usize = 8;

/// Assembles composite views from independent paginated admin-API
/// resources. Each view is cached under a fixed key for the configured
/// freshness window; a failed computation never touches the cache.
#[derive(Clone)]
pub struct Aggregator {
    client: AdminClient,
    paginator: Paginator,
    counts: SharedCache<EntityCounts>,
    services: SharedCache<Vec<ServiceSummary>>,
    upstreams: SharedCache<Vec<UpstreamSummary>>,
    routes_by_service: SharedCache<BTreeMap<String, usize>>,
}

impl Aggregator {
    pub fn new(client: AdminClient) -> Self {
        Self {
            paginator: Paginator::new(client.clone(), DEFAULT_PAGE_SIZE),
            client,
            counts: SharedCache::new(DEFAULT_CACHE_TTL_SECONDS),
            services: SharedCache::new(DEFAULT_CACHE_TTL_SECONDS),
            upstreams: SharedCache::new(DEFAULT_CACHE_TTL_SECONDS),
            routes_by_service: SharedCache::new(DEFAULT_CACHE_TTL_SECONDS),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.paginator = Paginator::new(self.client.clone(), page_size);
        self
    }

    /// One TTL shared by all views; the caches are independent instances,
    /// so entries never collide across views.
    pub fn with_cache_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.counts = SharedCache::new(ttl_seconds);
        self.services = SharedCache::new(ttl_seconds);
        self.upstreams = SharedCache::new(ttl_seconds);
        self.routes_by_service = SharedCache::new(ttl_seconds);
        self
    }

    pub fn from_config(config: &AdminApiConfig) -> Result<Self> {
        let client = AdminClient::from_config(config)?;
        Ok(Self::new(client)
            .with_page_size(config.page_size)
            .with_cache_ttl_seconds(config.cache_ttl_seconds))
    }

    /// Counts of services, routes and upstreams, the three walks running
    /// concurrently. Any failed walk fails the view; no partial counts.
    pub async fn entity_counts(&self) -> Result<EntityCounts> {
        self.counts
            .get_or_try_compute(COUNTS_KEY, || async {
                let (services, routes, upstreams) = try_join!(
                    self.paginator.count("/services"),
                    self.paginator.count("/routes"),
                    self.paginator.count("/upstreams"),
                )
                .map_err(|err| GateviewError::aggregation("entityCounts", err))?;
                Ok(EntityCounts {
                    services,
                    routes,
                    upstreams,
                })
            })
            .await
    }

    /// Services in `/services` page order, each carrying the number of
    /// routes pointing at it. Routes without a resolvable `service.id` are
    /// dropped from the join; services with no routes report zero.
    pub async fn services_with_route_counts(&self) -> Result<Vec<ServiceSummary>> {
        self.services
            .get_or_try_compute(SERVICES_KEY, || async {
                let (raw_services, raw_routes) = try_join!(
                    self.paginator.collect::<RawService>("/services"),
                    self.paginator.collect::<RawRoute>("/routes"),
                )
                .map_err(|err| GateviewError::aggregation("servicesWithRouteCounts", err))?;

                let mut routes_by_service = HashMap::<String, usize>::new();
                for route in raw_routes {
                    if let Some(service_id) = route.service_id() {
                        *routes_by_service.entry(service_id).or_insert(0) += 1;
                    }
                }

                Ok(raw_services
                    .into_iter()
                    .filter_map(RawService::into_summary)
                    .map(|mut summary| {
                        summary.route_count =
                            routes_by_service.get(&summary.id).copied().unwrap_or(0);
                        summary
                    })
                    .collect())
            })
            .await
    }

    /// Upstreams in `/upstreams` page order with per-target health tallied
    /// in. Target fetches for all upstreams run concurrently under
    /// [`FAN_OUT_MAX_CONCURRENCY`]; a required fetch failure aborts the
    /// view and drops in-flight siblings.
    pub async fn upstreams_with_health(&self) -> Result<Vec<UpstreamSummary>> {
        self.upstreams
            .get_or_try_compute(UPSTREAMS_KEY, || async {
                self.compute_upstreams_with_health()
                    .await
                    .map_err(|err| GateviewError::aggregation("upstreamsWithHealth", err))
            })
            .await
    }

    async fn compute_upstreams_with_health(&self) -> Result<Vec<UpstreamSummary>> {
        let raw: Vec<RawUpstream> = self.paginator.collect("/upstreams").await?;
        let seeds: Vec<(String, String)> = raw
            .into_iter()
            .filter_map(|upstream| Some((upstream.id?, upstream.name?)))
            .collect();

        // `buffered` keeps completion order aligned with the walk order.
        stream::iter(seeds)
            .map(|(id, name)| async move {
                let targets: Vec<TargetRecord> =
                    self.targets_for_upstream(&name).try_collect().await?;
                Ok(summarize_upstream(id, name, &targets))
            })
            .buffered(FAN_OUT_MAX_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Lazy target list for one named upstream with health joined in by
    /// target address, defaulting to `unknown`. The snapshot fetch is the
    /// single tolerated failure: any error there degrades to an empty
    /// snapshot instead of failing the stream.
    pub fn targets_for_upstream<'a>(
        &'a self,
        name: &str,
    ) -> impl Stream<Item = Result<TargetRecord>> + use<'a> {
        let name = name.to_string();
        stream::once(async move {
            let health_by_target = self.health_by_target(&name).await;
            let path = format!("/upstreams/{name}/targets");
            Ok(self
                .paginator
                .records::<RawTarget>(&path)
                .try_filter_map(move |raw| {
                    let record = raw.into_record(&health_by_target);
                    async move { Ok(record) }
                }))
        })
        .try_flatten()
    }

    async fn health_by_target(&self, name: &str) -> HashMap<String, String> {
        let path = format!("/upstreams/{name}/health");
        match self.client.get_json::<HealthSnapshot>(&path).await {
            Ok(snapshot) => snapshot.by_target(),
            Err(err) => {
                tracing::warn!(
                    upstream = %name,
                    error = %err,
                    "health snapshot unavailable, targets degrade to unknown"
                );
                HashMap::new()
            }
        }
    }

    /// Route count per service name, fetched through the per-service
    /// `/services/{name}/routes` collections with a bounded fan-out.
    pub async fn route_counts_by_service(&self) -> Result<BTreeMap<String, usize>> {
        self.routes_by_service
            .get_or_try_compute(ROUTES_BY_SERVICE_KEY, || async {
                self.compute_route_counts_by_service()
                    .await
                    .map_err(|err| GateviewError::aggregation("routesByService", err))
            })
            .await
    }

    async fn compute_route_counts_by_service(&self) -> Result<BTreeMap<String, usize>> {
        let raw: Vec<RawService> = self.paginator.collect("/services").await?;
        let names: Vec<String> = raw
            .into_iter()
            .filter_map(|service| service.name.or(service.id))
            .collect();

        stream::iter(names)
            .map(|name| async move {
                let path = format!("/services/{name}/routes");
                let count = self.paginator.count(&path).await?;
                Ok((name, count))
            })
            .buffered(FAN_OUT_MAX_CONCURRENCY)
            .try_collect()
            .await
    }
}

fn summarize_upstream(id: String, name: String, targets: &[TargetRecord]) -> UpstreamSummary {
    let tally =
        |status: HealthStatus| targets.iter().filter(|target| target.health == status).count();
    UpstreamSummary {
        target_count: targets.len(),
        healthy: tally(HealthStatus::Healthy),
        unhealthy: tally(HealthStatus::Unhealthy),
        dns_errored: tally(HealthStatus::DnsError),
        id,
        name,
    }
}
