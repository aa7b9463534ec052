//! Network fetch primitive
//!
//! The engine and the lifecycle coordinator fetch through the [`Fetcher`]
//! trait so tests can script network behavior deterministically.
//! [`HttpFetcher`] is the production implementation: a blocking `ureq`
//! agent driven from the blocking thread pool.

use crate::error::{FrescaError, FrescaResult};
use crate::http::{Method, RequestIdentity, ResponseSnapshot};
use async_trait::async_trait;
use std::time::Duration;
use ureq::Agent;

/// Max bytes read from a response body.
const MAX_BODY_BYTES: u64 = 50 * 1024 * 1024;

/// Global deadline for a single fetch, including the body read.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues a live network request for an identity.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the resource and capture it as a snapshot.
    ///
    /// Non-2xx statuses are still snapshots; only transport-level failures
    /// are errors.
    async fn fetch(&self, identity: &RequestIdentity) -> FrescaResult<ResponseSnapshot>;
}

/// HTTP fetcher over a shared `ureq` agent.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    /// Create a fetcher with the crate's default timeouts.
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(FETCH_TIMEOUT))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, identity: &RequestIdentity) -> FrescaResult<ResponseSnapshot> {
        let agent = self.agent.clone();
        let owned = identity.clone();

        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &owned))
            .await
            .map_err(|e| FrescaError::fetch(&identity.url, format!("fetch task failed: {e}")))?
    }
}

fn fetch_blocking(agent: &Agent, identity: &RequestIdentity) -> FrescaResult<ResponseSnapshot> {
    // The identity carries no request body, so only body-less methods can
    // be replayed against the network.
    let request = match identity.method {
        Method::Get => agent.get(&identity.url),
        Method::Head => agent.head(&identity.url),
        method => {
            return Err(FrescaError::fetch(
                &identity.url,
                format!("{method} requests cannot be replayed without a body"),
            ))
        }
    };

    let mut response = request
        .call()
        .map_err(|e| FrescaError::fetch(&identity.url, e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()
        .map_err(|e| FrescaError::fetch(&identity.url, format!("reading body: {e}")))?;

    Ok(ResponseSnapshot::new(&identity.url, status, headers, body))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted fetcher for driving lifecycle and race tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// What a scripted route does when fetched.
    pub(crate) enum Script {
        /// Resolve immediately with a 200 response carrying `body`.
        Ok(&'static str),
        /// Resolve immediately with `status` and `body`.
        Status(u16, &'static str),
        /// Fail with a transport error.
        Fail,
        /// Block until the gate is opened, then resolve with `body`.
        Gated(&'static str, Arc<Notify>),
    }

    /// Fetcher that replays a fixed script per URL and records calls.
    #[derive(Default)]
    pub(crate) struct ScriptedFetcher {
        routes: Mutex<HashMap<String, Script>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn route(self, url: impl Into<String>, script: Script) -> Self {
            self.routes
                .lock()
                .unwrap()
                .insert(url.into(), script);
            self
        }

        /// URLs fetched so far, in call order.
        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, identity: &RequestIdentity) -> FrescaResult<ResponseSnapshot> {
            self.calls.lock().unwrap().push(identity.url.clone());

            let (body, gate) = {
                let routes = self.routes.lock().unwrap();
                match routes.get(&identity.url) {
                    Some(Script::Ok(body)) => {
                        return Ok(ResponseSnapshot::new(
                            &identity.url,
                            200,
                            vec![],
                            body.as_bytes().to_vec(),
                        ))
                    }
                    Some(Script::Status(status, body)) => {
                        return Ok(ResponseSnapshot::new(
                            &identity.url,
                            *status,
                            vec![],
                            body.as_bytes().to_vec(),
                        ))
                    }
                    Some(Script::Fail) | None => {
                        return Err(FrescaError::fetch(&identity.url, "connection refused"))
                    }
                    Some(Script::Gated(body, gate)) => (body.to_string(), gate.clone()),
                }
            };

            gate.notified().await;
            Ok(ResponseSnapshot::new(
                &identity.url,
                200,
                vec![],
                body.into_bytes(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_methods_are_rejected() {
        let fetcher = HttpFetcher::new();
        let identity = RequestIdentity::new(Method::Post, "https://example.io/submit");

        let err = fetcher.fetch(&identity).await.unwrap_err();
        assert!(matches!(err, FrescaError::Fetch { .. }));
        assert!(err.to_string().contains("POST"));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let fetcher = HttpFetcher::new();
        // Reserved TLD, never resolves
        let identity = RequestIdentity::get("http://fresca.invalid/a");

        let err = fetcher.fetch(&identity).await.unwrap_err();
        assert!(matches!(err, FrescaError::Fetch { .. }));
    }
}
