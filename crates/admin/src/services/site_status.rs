//! Public site status (online or under maintenance).
//!
//! The status is a setting read on every public page load, so it is memoized
//! with `moka` for a short TTL. Read failures are never cached and never
//! reported as online.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::db::RepositoryError;

/// Settings key holding the site status.
pub const SITE_STATUS_KEY: &str = "site_status";

/// Default memoization window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Status of the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteStatus {
    Online,
    Maintenance {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The status could not be read.
    Unknown,
}

impl SiteStatus {
    /// True if public pages should show the maintenance page.
    ///
    /// [`SiteStatus::Unknown`] blocks, like maintenance.
    #[must_use]
    pub const fn blocks_public(&self) -> bool {
        !matches!(self, Self::Online)
    }
}

/// Where the status comes from.
pub trait SiteStatusSource: Send + Sync {
    fn fetch_status(&self) -> impl Future<Output = Result<SiteStatus, RepositoryError>> + Send;
}

/// Memoizing reader for the site status.
pub struct SiteStatusService<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    source: S,
    cache: Cache<(), SiteStatus>,
}

impl<S> Clone for SiteStatusService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SiteStatusSource> SiteStatusService<S> {
    #[must_use]
    pub fn new(source: S, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            inner: Arc::new(Inner { source, cache }),
        }
    }

    /// The current status, from cache when fresh.
    pub async fn current(&self) -> SiteStatus {
        if let Some(status) = self.inner.cache.get(&()).await {
            debug!("Cache hit for site status");
            return status;
        }

        match self.inner.source.fetch_status().await {
            Ok(status) => {
                self.inner.cache.insert((), status.clone()).await;
                status
            }
            Err(e) => {
                error!(error = %e, "Failed to read site status");
                SiteStatus::Unknown
            }
        }
    }

    /// Drop the memoized status so the next read hits the source.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(&()).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicUsize,
        next: Mutex<Option<SiteStatus>>,
    }

    impl FakeSource {
        fn set(&self, status: Option<SiteStatus>) {
            *self.next.lock().unwrap() = status;
        }
    }

    impl SiteStatusSource for Arc<FakeSource> {
        async fn fetch_status(&self) -> Result<SiteStatus, RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.next
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RepositoryError::Unavailable("settings offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_memoizes_within_ttl() {
        let source = Arc::new(FakeSource::default());
        source.set(Some(SiteStatus::Online));
        let service = SiteStatusService::new(Arc::clone(&source), DEFAULT_TTL);

        assert_eq!(service.current().await, SiteStatus::Online);
        assert_eq!(service.current().await, SiteStatus::Online);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let source = Arc::new(FakeSource::default());
        source.set(Some(SiteStatus::Online));
        let service = SiteStatusService::new(Arc::clone(&source), DEFAULT_TTL);
        assert_eq!(service.current().await, SiteStatus::Online);

        let maintenance = SiteStatus::Maintenance {
            message: Some("Back after finals".to_string()),
        };
        source.set(Some(maintenance.clone()));
        service.invalidate().await;

        assert_eq!(service.current().await, maintenance);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_unknown_and_not_cached() {
        let source = Arc::new(FakeSource::default());
        let service = SiteStatusService::new(Arc::clone(&source), DEFAULT_TTL);

        let status = service.current().await;
        assert_eq!(status, SiteStatus::Unknown);
        assert!(status.blocks_public());

        source.set(Some(SiteStatus::Online));
        assert_eq!(service.current().await, SiteStatus::Online);
    }

    #[test]
    fn test_status_json() {
        let json = serde_json::to_value(SiteStatus::Maintenance { message: None }).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "maintenance" }));

        let parsed: SiteStatus = serde_json::from_str(r#"{"status":"online"}"#).unwrap();
        assert_eq!(parsed, SiteStatus::Online);
    }
}
