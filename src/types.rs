use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Health of a single upstream target, joined in from the per-upstream
/// health snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    DnsError,
    Unknown,
}

impl HealthStatus {
    /// Case-insensitive parse; unrecognized values map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("healthy") {
            HealthStatus::Healthy
        } else if raw.eq_ignore_ascii_case("unhealthy") {
            HealthStatus::Unhealthy
        } else if raw.eq_ignore_ascii_case("dns_error") {
            HealthStatus::DnsError
        } else {
            HealthStatus::Unknown
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub services: usize,
    pub routes: usize,
    pub upstreams: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub route_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSummary {
    pub id: String,
    pub name: String,
    pub target_count: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub dns_errored: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub health: HealthStatus,
}

// Lenient projections of raw admin-API records. The admin API is not under
// our control, so every field is optional and malformed records are dropped
// during projection instead of failing the walk.

#[derive(Debug, Deserialize)]
pub(crate) struct RawService {
    pub id: Option<String>,
    pub name: Option<String>,
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
}

impl RawService {
    /// Records without an `id` cannot take part in the route join.
    pub(crate) fn into_summary(self) -> Option<ServiceSummary> {
        let id = self.id?;
        Some(ServiceSummary {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            host: self.host,
            protocol: self.protocol,
            port: self.port,
            route_count: 0,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRoute {
    pub service: Option<ServiceRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceRef {
    pub id: Option<String>,
}

impl RawRoute {
    pub(crate) fn service_id(self) -> Option<String> {
        self.service?.id
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUpstream {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTarget {
    pub target: Option<String>,
    pub weight: Option<u32>,
    pub id: Option<String>,
}

impl RawTarget {
    /// Joins the target against the health snapshot by exact address string,
    /// defaulting to `Unknown` when the snapshot has no entry for it.
    pub(crate) fn into_record(self, health_by_target: &HashMap<String, String>) -> Option<TargetRecord> {
        let target = self.target?;
        let health = health_by_target
            .get(&target)
            .map(|raw| HealthStatus::parse(raw))
            .unwrap_or(HealthStatus::Unknown);
        Some(TargetRecord {
            target,
            weight: self.weight,
            id: self.id,
            health,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthSnapshot {
    #[serde(default)]
    pub data: Vec<HealthNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthNode {
    pub target: Option<String>,
    pub health: Option<String>,
}

impl HealthSnapshot {
    pub(crate) fn by_target(self) -> HashMap<String, String> {
        self.data
            .into_iter()
            .filter_map(|node| Some((node.target?, node.health?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_parse_is_case_insensitive() {
        assert_eq!(HealthStatus::parse("Healthy"), HealthStatus::Healthy);
        assert_eq!(HealthStatus::parse("UNHEALTHY"), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::parse("DNS_Error"), HealthStatus::DnsError);
        assert_eq!(HealthStatus::parse("draining"), HealthStatus::Unknown);
    }

    #[test]
    fn health_status_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::DnsError).unwrap(),
            r#""dns_error""#
        );
    }

    #[test]
    fn service_without_id_is_dropped() {
        let raw: RawService = serde_json::from_value(serde_json::json!({
            "name": "orphan"
        }))
        .unwrap();
        assert!(raw.into_summary().is_none());
    }

    #[test]
    fn service_name_defaults_to_id() {
        let raw: RawService = serde_json::from_value(serde_json::json!({
            "id": "svc-1",
            "host": "example.com"
        }))
        .unwrap();
        let summary = raw.into_summary().unwrap();
        assert_eq!(summary.name, "svc-1");
        assert_eq!(summary.host.as_deref(), Some("example.com"));
        assert_eq!(summary.route_count, 0);
    }

    #[test]
    fn target_join_defaults_to_unknown() {
        let mut health = HashMap::new();
        health.insert("10.0.0.1:80".to_string(), "Healthy".to_string());

        let known: RawTarget = serde_json::from_value(serde_json::json!({
            "target": "10.0.0.1:80", "weight": 100
        }))
        .unwrap();
        assert_eq!(
            known.into_record(&health).unwrap().health,
            HealthStatus::Healthy
        );

        let absent: RawTarget = serde_json::from_value(serde_json::json!({
            "target": "10.0.0.2:80"
        }))
        .unwrap();
        assert_eq!(
            absent.into_record(&health).unwrap().health,
            HealthStatus::Unknown
        );
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = UpstreamSummary {
            id: "u1".to_string(),
            name: "up".to_string(),
            target_count: 2,
            healthy: 1,
            unhealthy: 0,
            dns_errored: 1,
        };
        let rendered = serde_json::to_value(&summary).unwrap();
        assert_eq!(rendered["targetCount"], 2);
        assert_eq!(rendered["dnsErrored"], 1);
    }
}
