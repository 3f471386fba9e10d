//! External lookups for verification challenges

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Probe failure, reported back to the blogger as a human-readable reason
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// DNS lookup failed
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    /// HTTPS fetch failed
    #[error("fetch failed: {0}")]
    Http(String),
}

/// External checks the verification service performs.
///
/// Implementations must bound every call with a timeout; the service holds
/// no locks while a probe is in flight.
#[async_trait]
pub trait DomainProber: Send + Sync {
    /// Look up all TXT record values at `name`
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ProbeError>;

    /// Fetch the body at `url`
    async fn fetch(&self, url: &str) -> Result<String, ProbeError>;
}

/// Production prober: DNS-over-HTTPS for TXT lookups, plain HTTPS GETs for
/// file and homepage fetches, all user-agent-tagged.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
    doh_endpoint: String,
}

impl HttpProber {
    /// Create a new prober
    pub fn new(
        doh_endpoint: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Http(e.to_string()))?;

        Ok(Self {
            client,
            doh_endpoint: doh_endpoint.into(),
        })
    }
}

#[async_trait]
impl DomainProber for HttpProber {
    #[instrument(skip(self))]
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ProbeError> {
        debug!(name = %name, "Looking up TXT records");

        let response = self
            .client
            .get(&self.doh_endpoint)
            .query(&[("name", name), ("type", "TXT")])
            .header("accept", "application/dns-json")
            .send()
            .await
            .map_err(|e| ProbeError::Dns(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProbeError::Dns(format!(
                "resolver returned {}",
                response.status()
            )));
        }

        let answer: DnsJsonResponse = response
            .json()
            .await
            .map_err(|e| ProbeError::Dns(e.to_string()))?;

        let values = answer
            .answer
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.record_type == 16)
            .map(|r| r.data.trim_matches('"').to_string())
            .collect();

        Ok(values)
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, ProbeError> {
        debug!(url = %url, "Fetching verification URL");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProbeError::Http(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))
    }
}

// DNS-over-HTTPS JSON answer (RFC 8484 JSON form)
#[derive(Debug, Deserialize)]
struct DnsJsonResponse {
    #[serde(rename = "Answer")]
    answer: Option<Vec<DnsJsonRecord>>,
}

#[derive(Debug, Deserialize)]
struct DnsJsonRecord {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}
