//! Access to the origin registry
//!
//! The mirror core only talks to the origin through the [`Origin`] trait.
//! [`HttpOrigin`] is the blocking `ureq` implementation used in production;
//! callers on the async side run it on tokio's blocking pool.

use crate::config::schema::OriginConfig;
use crate::error::{MirrorError, MirrorResult};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, warn};
use ureq::http::header::CONTENT_TYPE;

const CHUNK_SIZE: usize = 8192;

/// A fully buffered origin response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl OriginResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Upstream registry access
pub trait Origin: Send + Sync {
    /// Fetch a document, returning whatever status the origin answered with
    ///
    /// Only transport failures are errors.
    fn fetch(&self, url: &str) -> MirrorResult<OriginResponse>;

    /// Stream a successful response body into `dest`
    ///
    /// Non-2xx answers fail with [`MirrorError::OriginStatus`]. Returns the
    /// number of bytes written.
    fn download(&self, url: &str, dest: &mut dyn Write) -> MirrorResult<u64>;
}

/// Blocking HTTP client for the origin registry
pub struct HttpOrigin {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpOrigin {
    /// Build a client from the origin configuration
    pub fn new(config: &OriginConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout_secs.map(Duration::from_secs))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            user_agent: config.user_agent.clone(),
        }
    }

    fn get(&self, url: &str) -> MirrorResult<ureq::http::Response<ureq::Body>> {
        debug!("GET {}", url);
        self.agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|e| {
                warn!("Origin request to {} failed: {}", url, e);
                MirrorError::origin(url, e)
            })
    }
}

impl Origin for HttpOrigin {
    fn fetch(&self, url: &str) -> MirrorResult<OriginResponse> {
        let mut response = self.get(url)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| MirrorError::origin(url, e))?;

        Ok(OriginResponse {
            status,
            content_type,
            body,
        })
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> MirrorResult<u64> {
        let mut response = self.get(url)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::OriginStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut reader = response.body_mut().with_config().limit(u64::MAX).reader();
        copy_chunks(url, &mut reader, dest)
    }
}

/// Copy a response body, attributing read errors to the origin and write
/// errors to the local filesystem
fn copy_chunks(url: &str, reader: &mut dyn Read, dest: &mut dyn Write) -> MirrorResult<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(MirrorError::origin(url, e)),
        };
        dest.write_all(&buf[..n])
            .map_err(|e| MirrorError::io(format!("writing download of {}", url), e))?;
        total += n as u64;
    }

    Ok(total)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory origin for tests

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeOrigin {
        responses: Mutex<HashMap<String, OriginResponse>>,
        hits: Mutex<HashMap<String, usize>>,
    }

    impl FakeOrigin {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(&self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) {
            self.responses.lock().insert(
                url.to_string(),
                OriginResponse {
                    status,
                    content_type: content_type.map(String::from),
                    body: body.to_vec(),
                },
            );
        }

        pub fn hits(&self, url: &str) -> usize {
            self.hits.lock().get(url).copied().unwrap_or(0)
        }
    }

    impl Origin for FakeOrigin {
        fn fetch(&self, url: &str) -> MirrorResult<OriginResponse> {
            *self.hits.lock().entry(url.to_string()).or_default() += 1;
            self.responses
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| MirrorError::origin(url, "connection refused"))
        }

        fn download(&self, url: &str, dest: &mut dyn Write) -> MirrorResult<u64> {
            let response = self.fetch(url)?;
            if !response.is_success() {
                return Err(MirrorError::OriginStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            copy_chunks(url, &mut response.body.as_slice(), dest)
        }
    }
}
