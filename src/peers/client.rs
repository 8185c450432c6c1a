//! HTTP peer client.
//!
//! One `HttpPeerClient` fronts one remote peer. Calls are bounded by a
//! per-attempt timeout and retried a fixed number of times with exponential
//! backoff plus jitter; a non-success status after the final attempt surfaces
//! as `CacheError::Peer`.

use std::time::Duration;

use super::protocol::{ENDPOINT_PEER_GET, ENDPOINT_PEER_SET, SetRequest, SetResponse};
use super::{PeerClient, PeerFuture};
use crate::error::CacheError;

const RETRY_ATTEMPTS: usize = 3;

pub struct HttpPeerClient {
    /// `host:port` of the peer's HTTP server.
    addr: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpPeerClient {
    pub fn new(addr: String, timeout: Duration) -> Self {
        Self {
            addr,
            http: reqwest::Client::new(),
            timeout,
        }
    }

    async fn get_with_retry(&self, url: String) -> Result<reqwest::Response, CacheError> {
        let mut delay_ms = 150u64;

        for attempt in 0..RETRY_ATTEMPTS {
            let response = self.http.get(url.clone()).timeout(self.timeout).send().await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == RETRY_ATTEMPTS {
                        return Err(CacheError::Peer(format!("{}: {}", self.addr, e)));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(CacheError::Peer(format!("{}: retry attempts exhausted", self.addr)))
    }

    async fn post_with_retry(
        &self,
        url: String,
        payload: &SetRequest,
    ) -> Result<reqwest::Response, CacheError> {
        let mut delay_ms = 150u64;

        for attempt in 0..RETRY_ATTEMPTS {
            let response = self
                .http
                .post(url.clone())
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == RETRY_ATTEMPTS {
                        return Err(CacheError::Peer(format!("{}: {}", self.addr, e)));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(CacheError::Peer(format!("{}: retry attempts exhausted", self.addr)))
    }
}

impl PeerClient for HttpPeerClient {
    fn get<'a>(&'a self, group: &'a str, key: &'a str) -> PeerFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let url = format!("http://{}{}/{}/{}", self.addr, ENDPOINT_PEER_GET, group, key);
            let response = self.get_with_retry(url).await?;

            if !response.status().is_success() {
                return Err(CacheError::Peer(format!(
                    "peer {} returned {} for {}/{}",
                    self.addr,
                    response.status(),
                    group,
                    key
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| CacheError::Peer(format!("{}: {}", self.addr, e)))?;
            Ok(bytes.to_vec())
        })
    }

    fn set<'a>(
        &'a self,
        group: &'a str,
        key: &'a str,
        value: Vec<u8>,
        expire_unix: i64,
        is_hot: bool,
    ) -> PeerFuture<'a, ()> {
        Box::pin(async move {
            let url = format!("http://{}{}", self.addr, ENDPOINT_PEER_SET);
            let payload = SetRequest {
                group: group.to_string(),
                key: key.to_string(),
                value,
                expire_unix,
                is_hot,
            };
            let response = self.post_with_retry(url, &payload).await?;

            if !response.status().is_success() {
                return Err(CacheError::Peer(format!(
                    "peer {} returned {} for set {}/{}",
                    self.addr,
                    response.status(),
                    group,
                    key
                )));
            }

            let ack: SetResponse = response
                .json()
                .await
                .map_err(|e| CacheError::Peer(format!("{}: {}", self.addr, e)))?;
            if !ack.success {
                return Err(CacheError::Peer(format!(
                    "peer {} rejected set {}/{}",
                    self.addr, group, key
                )));
            }
            Ok(())
        })
    }
}
