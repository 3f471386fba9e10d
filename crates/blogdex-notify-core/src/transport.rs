//! Outbound email transport

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

/// Email transport error
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport rejected or failed to accept the message
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Transactional email transport
///
/// Accepts `(recipient, template id, structured payload)`; the provider
/// renders the template. No wire format beyond that is assumed.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one templated message
    async fn send(
        &self,
        recipient: &str,
        template_id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), TransportError>;
}

/// HTTP email transport posting to a transactional email provider
#[derive(Clone)]
pub struct HttpEmailTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailTransport {
    /// Create a new transport
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
    ) -> Self {
        // A hung provider must not stall lifecycle handlers.
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(
        &self,
        recipient: &str,
        template_id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), TransportError> {
        debug!(recipient = %recipient, template = %template_id, "Sending notification email");

        let body = json!({
            "from": self.from_address,
            "to": recipient,
            "template": template_id,
            "data": payload,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Email provider rejected message");
            return Err(TransportError::SendFailed(format!(
                "provider returned {status}"
            )));
        }

        Ok(())
    }
}
