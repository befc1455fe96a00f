use async_trait::async_trait;
use crl_types::ContentId;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::backend::{BackendError, ContentBackend};
use crate::config::GatewayConfig;

/// HTTP content gateway.
///
/// Objects are addressed as `{base_url}/objects/{hex}` with no directory
/// structure. An optional bearer token is attached per request; the
/// per-attempt timeout is enforced by the [`crate::ContentStore`], not
/// here, so a slow gateway cannot stall the fallback chain.
pub struct HttpGateway {
    name: String,
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpGateway {
    /// Create a gateway from an endpoint URL and optional credential.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    /// Build a gateway from its config entry.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.name.clone(), config.url.clone(), config.token.clone())
    }

    /// The gateway's endpoint URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn object_url(&self, id: &ContentId) -> String {
        format!("{}/objects/{}", self.base_url, id.to_hex())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ContentBackend for HttpGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, id: &ContentId) -> Result<Vec<u8>, BackendError> {
        let request = self.authorized(self.client.get(self.object_url(id)));
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::Missing),
            status if !status.is_success() => Err(BackendError::Http {
                status: status.as_u16(),
            }),
            _ => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| BackendError::Transport(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }

    async fn store(&self, id: &ContentId, bytes: &[u8]) -> Result<(), BackendError> {
        let request = self
            .authorized(self.client.put(self.object_url(id)))
            .body(bytes.to_vec());
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn contains(&self, id: &ContentId) -> Result<bool, BackendError> {
        let request = self.authorized(self.client.head(self.object_url(id)));
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(BackendError::Http {
                status: status.as_u16(),
            }),
        }
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}
