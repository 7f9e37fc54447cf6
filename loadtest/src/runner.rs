use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use frame_relay_common::config::LoadTestConfig;
use reqwest::header::{HeaderValue, CONNECTION};
use reqwest::StatusCode;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum LoadTestError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A fixed number of GETs spread over a pool of workers.
pub struct LoadTest {
    client: reqwest::Client,
    url: String,
    total: u64,
    concurrency: u64,
}

#[derive(Default)]
struct Counters {
    issued: AtomicU64,
    succeeded: AtomicU64,
    bytes: AtomicU64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl Report {
    /// Percentage of requests that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.succeeded as f64 * 100.0 / self.total as f64
    }

    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total as f64 / secs
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Elapsed time: {:.3} sec", self.elapsed.as_secs_f64())?;
        writeln!(f, "Successful requests: {}", self.succeeded)?;
        writeln!(f, "Failed requests: {}", self.failed)?;
        writeln!(f, "Success rate: {:.2}%", self.success_rate())?;
        writeln!(f, "Requests/sec: {:.2}", self.requests_per_sec())?;
        write!(f, "Response body bytes: {}", self.bytes)
    }
}

impl LoadTest {
    /// Every request goes out on its own connection: idle pooling is off and
    /// each request asks the server to close.
    pub fn new(config: &LoadTestConfig) -> Result<Self, LoadTestError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            total: config.total_requests,
            concurrency: config.effective_concurrency(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn concurrency(&self) -> u64 {
        self.concurrency
    }

    pub async fn run(&self) -> Report {
        let counters = Arc::new(Counters::default());
        let started = Instant::now();

        let mut workers = JoinSet::new();
        for worker in 0..self.concurrency {
            let client = self.client.clone();
            let url = self.url.clone();
            let total = self.total;
            let counters = Arc::clone(&counters);
            workers.spawn(async move {
                while counters.issued.fetch_add(1, Ordering::Relaxed) < total {
                    match fetch_once(&client, &url).await {
                        Ok(bytes) => {
                            counters.succeeded.fetch_add(1, Ordering::Relaxed);
                            counters.bytes.fetch_add(bytes, Ordering::Relaxed);
                        }
                        Err(reason) => {
                            debug!(worker, reason = %reason, "request failed");
                        }
                    }
                }
            });
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "load test worker panicked");
            }
        }

        let succeeded = counters.succeeded.load(Ordering::Relaxed);
        Report {
            total: self.total,
            succeeded,
            // Requests lost to a panicked worker count as failures too.
            failed: self.total - succeeded,
            bytes: counters.bytes.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
        }
    }
}

/// One GET. Success means a 200 with at least one body byte; returns the
/// body length.
async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<u64, String> {
    let resp = client
        .get(url)
        .header(CONNECTION, HeaderValue::from_static("close"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    let body = resp.bytes().await.map_err(|e| e.to_string())?;
    if status != StatusCode::OK {
        return Err(format!("status {status}"));
    }
    if body.is_empty() {
        return Err("empty body".into());
    }
    Ok(body.len() as u64)
}
