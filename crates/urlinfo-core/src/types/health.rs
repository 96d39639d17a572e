use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Readiness reported by a single source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderStatus {
    /// Whether the source can currently answer queries
    pub ready: bool,

    /// Human-readable detail (endpoint, last error, skipped lines)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Number of indexed entries, for file-backed sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_loaded: Option<usize>,
}

impl LoaderStatus {
    /// A ready status
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            ready: true,
            detail: None,
            items_loaded: None,
        }
    }

    /// A not-ready status with an explanation
    #[must_use]
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            ready: false,
            detail: Some(detail.into()),
            items_loaded: None,
        }
    }

    /// Attach a detail message
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach an item count
    #[must_use]
    pub fn with_items(mut self, items: usize) -> Self {
        self.items_loaded = Some(items);
        self
    }
}

/// Overall service state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Initialized and every source is ready
    Healthy,
    /// Initialized, but at least one source is unavailable
    Degraded,
    /// Sources have not finished bootstrapping
    NotInitialized,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::NotInitialized => write!(f, "not_initialized"),
        }
    }
}

/// Per-source status keyed by source id
pub type HealthSnapshot = BTreeMap<String, LoaderStatus>;

impl ServiceStatus {
    /// Derive the service status from readiness and the source snapshot
    #[must_use]
    pub fn from_snapshot(initialized: bool, snapshot: &HealthSnapshot) -> Self {
        if !initialized {
            Self::NotInitialized
        } else if snapshot.values().all(|s| s.ready) {
            Self::Healthy
        } else {
            Self::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_status_from_snapshot() {
        let mut snapshot = HealthSnapshot::new();
        snapshot.insert("file-a".into(), LoaderStatus::ready().with_items(3));
        assert_eq!(ServiceStatus::from_snapshot(false, &snapshot), ServiceStatus::NotInitialized);
        assert_eq!(ServiceStatus::from_snapshot(true, &snapshot), ServiceStatus::Healthy);

        snapshot.insert("http-endpoint-0".into(), LoaderStatus::unavailable("connection refused"));
        assert_eq!(ServiceStatus::from_snapshot(true, &snapshot), ServiceStatus::Degraded);
    }

    #[test]
    fn test_loader_status_serialization_skips_empty() {
        let json = serde_json::to_string(&LoaderStatus::ready()).unwrap();
        assert_eq!(json, r#"{"ready":true}"#);
    }
}
