use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{AuthError, TokenVerifier, VerifiedUser};

/// Where and how to reach the token authority.
#[derive(Debug, Clone)]
pub struct HttpVerifierConfig {
    /// Endpoint receiving the token.
    pub verify_url: Url,
    /// Credential identifying this service to the authority, if it requires one.
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    user: Option<VerifiedUser>,
}

/// Verifies tokens by POSTing them to the authority's verification endpoint.
#[derive(Clone)]
pub struct HttpTokenVerifier {
    client: Client,
    config: Arc<HttpVerifierConfig>,
}

impl HttpTokenVerifier {
    /// Build the HTTP client used for every verification.
    pub fn new(config: HttpVerifierConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .build()
            .map_err(|source| AuthError::ClientBuilder { source })?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    async fn call(&self, token: &str) -> Result<Option<VerifiedUser>, AuthError> {
        let mut request = self
            .client
            .post(self.config.verify_url.clone())
            .json(&VerifyRequest { token });
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|source| AuthError::Transport { source })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let body = response
                    .json::<VerifyResponse>()
                    .await
                    .map_err(|source| AuthError::Decode { source })?;
                Ok(body.user)
            }
            status => Err(AuthError::UnexpectedStatus { status }),
        }
    }
}

impl TokenVerifier for HttpTokenVerifier {
    fn verify(&self, token: String) -> BoxFuture<'static, Result<Option<VerifiedUser>, AuthError>> {
        let verifier = self.clone();
        Box::pin(async move { verifier.call(&token).await })
    }
}
