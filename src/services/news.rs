use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rquest_util::Emulation;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::HttpClient;
use crate::config::NewsConfig;
use crate::error::{Error, Result};
use crate::models::NewsFeed;
use crate::utils::retry_with_backoff;

const MAX_RETRIES: u32 = 2;
const BASE_DELAY_MS: u64 = 500;

/// Upstream headline provider.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self) -> Result<NewsFeed>;
}

pub struct NewsApiClient {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    query: String,
    page_size: u32,
}

impl NewsApiClient {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(&config.headers, Emulation::Chrome133)?,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            query: config.query.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(&self) -> Result<NewsFeed> {
        let query = [
            ("q", self.query.clone()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", self.page_size.to_string()),
            ("apiKey", self.api_key.clone()),
        ];

        let feed: NewsFeed = retry_with_backoff(MAX_RETRIES, BASE_DELAY_MS, || {
            self.client.get_json(&self.endpoint, &query)
        })
        .await?;

        if feed.status == "error" {
            return Err(Error::Upstream("news API reported an error".to_string()));
        }
        debug!(articles = feed.articles.len(), total = feed.total_results, "Fetched headlines");
        Ok(feed)
    }
}

struct CachedFeed {
    fetched_at: DateTime<Utc>,
    feed: NewsFeed,
}

/// Headlines cached for a fixed TTL. A failed refresh falls back to the stale copy.
pub struct NewsService {
    source: Arc<dyn NewsSource>,
    ttl: Duration,
    cache: Mutex<Option<CachedFeed>>,
}

impl NewsService {
    pub fn new(source: Arc<dyn NewsSource>, ttl_secs: u64) -> Self {
        Self {
            source,
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            cache: Mutex::new(None),
        }
    }

    pub async fn headlines(&self, now: DateTime<Utc>) -> Result<NewsFeed> {
        // Held across the fetch so concurrent callers share one refresh.
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if now - cached.fetched_at < self.ttl {
                return Ok(cached.feed.clone());
            }
        }

        match self.source.fetch().await {
            Ok(feed) => {
                info!(articles = feed.articles.len(), "News cache refreshed");
                *cache = Some(CachedFeed { fetched_at: now, feed: feed.clone() });
                Ok(feed)
            }
            Err(e) => match cache.as_ref() {
                Some(stale) => {
                    warn!(error = %e, fetched_at = %stale.fetched_at, "News refresh failed, serving stale copy");
                    Ok(stale.feed.clone())
                }
                None => {
                    warn!(error = %e, "News refresh failed with nothing cached");
                    Err(Error::Upstream(format!("failed to fetch news: {e}")))
                }
            },
        }
    }
}
