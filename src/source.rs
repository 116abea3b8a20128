//! Where hit series come from: a remote `/hits` endpoint or the local hit
//! log, optionally behind the single-entry response cache.

use crate::cache::ResponseCache;
use crate::errors::FetchError;
use crate::models::{DateWindow, HitRecord};
use crate::storage::HitStore;
use chrono::{Duration, Utc};
use reqwest::{Client, Url};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub trait HitSource: Send + Sync {
    fn fetch(
        &self,
        window: DateWindow,
    ) -> impl Future<Output = Result<Vec<HitRecord>, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    endpoint: Url,
    http: Client,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("hits")
            .map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!("hit_dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl HitSource for HttpSource {
    async fn fetch(&self, window: DateWindow) -> Result<Vec<HitRecord>, FetchError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("start-date", window.start().to_string()),
                ("end-date", window.end().to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone)]
pub struct LocalSource {
    store: Arc<HitStore>,
}

impl LocalSource {
    pub fn new(store: Arc<HitStore>) -> Self {
        Self { store }
    }
}

impl HitSource for LocalSource {
    async fn fetch(&self, window: DateWindow) -> Result<Vec<HitRecord>, FetchError> {
        Ok(self.store.query_range(window.start(), window.end()))
    }
}

/// The dashboard's configured source.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Remote(HttpSource),
    Local(LocalSource),
}

impl HitSource for SourceKind {
    async fn fetch(&self, window: DateWindow) -> Result<Vec<HitRecord>, FetchError> {
        match self {
            Self::Remote(source) => source.fetch(window).await,
            Self::Local(source) => source.fetch(window).await,
        }
    }
}

/// Serves a repeated request for the same window from the last response
/// while it is younger than the cache lifetime.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<ResponseCache>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(ResponseCache::new(ttl)),
        }
    }
}

impl<S: HitSource> HitSource for CachedSource<S> {
    async fn fetch(&self, window: DateWindow) -> Result<Vec<HitRecord>, FetchError> {
        if let Some(records) = self.cache.lock().await.lookup(window, Utc::now()) {
            debug!(%window, "serving hits from cache");
            return Ok(records.to_vec());
        }

        let records = self.inner.fetch(window).await?;
        self.cache
            .lock()
            .await
            .store(window, records.clone(), Utc::now());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{HitLog, StoredHit};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    struct Counting {
        calls: AtomicUsize,
    }

    impl HitSource for Counting {
        async fn fetch(&self, _window: DateWindow) -> Result<Vec<HitRecord>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let source = HttpSource::new("https://api.example.org/v1").unwrap();
        assert_eq!(source.endpoint().as_str(), "https://api.example.org/v1/hits");
        let source = HttpSource::new("http://127.0.0.1:8080").unwrap();
        assert_eq!(source.endpoint().as_str(), "http://127.0.0.1:8080/hits");
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        assert!(matches!(
            HttpSource::new("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn local_source_queries_store() {
        let store = HitStore::from_log(HitLog {
            hits: vec![StoredHit {
                state: "CO".into(),
                hit: 4,
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                timestamp: None,
            }],
        });
        let source = LocalSource::new(Arc::new(store));
        let records = source.fetch(window()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region_value("CO"), 4);
    }

    #[tokio::test]
    async fn cached_source_reuses_response_for_same_window() {
        let source = CachedSource::new(
            Counting {
                calls: AtomicUsize::new(0),
            },
            Duration::hours(1),
        );
        source.fetch(window()).await.unwrap();
        source.fetch(window()).await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);

        let other = window().with_end(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).unwrap();
        source.fetch(other).await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }
}
