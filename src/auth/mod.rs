//! Bearer-token identity resolution for the authenticated route group.
//!
//! Verification itself is delegated to an external authority behind the
//! [`TokenVerifier`] trait; this module only extracts the token and turns the
//! authority's answer into an [`AuthOutcome`].

mod http;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub use self::http::{HttpTokenVerifier, HttpVerifierConfig};

/// Identity returned by the token authority for a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedUser {
    /// Stable subject identifier; used as the storage user id.
    pub sub: String,
}

/// Result of resolving the caller of an authenticated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The token was verified; carries the subject identifier.
    Authorized(String),
    /// No token, or the authority did not recognise it.
    Unauthorized,
}

/// Failures talking to the token authority. These are infrastructure errors,
/// never a verdict on the token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Building the HTTP client failed.
    #[error("failed to build token verification client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The verification request could not be sent.
    #[error("token verification request failed")]
    Transport {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// The authority answered with a status that is neither success nor rejection.
    #[error("token authority responded with unexpected status {status}")]
    UnexpectedStatus {
        /// Status code returned by the server.
        status: reqwest::StatusCode,
    },
    /// The authority's answer could not be decoded.
    #[error("failed to decode token verification response")]
    Decode {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
}

/// External capability that checks a bearer token.
pub trait TokenVerifier: Send + Sync {
    /// Return the verified user, or `None` when the token is not valid.
    fn verify(&self, token: String) -> BoxFuture<'static, Result<Option<VerifiedUser>, AuthError>>;
}

/// Verifier installed when no authority is configured: every token is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAllVerifier;

impl TokenVerifier for RejectAllVerifier {
    fn verify(&self, _token: String) -> BoxFuture<'static, Result<Option<VerifiedUser>, AuthError>> {
        Box::pin(async { Ok(None) })
    }
}

/// Extract the token from an `Authorization: <scheme> <token>` header.
///
/// The scheme is not checked; the second space-separated segment is the token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
}

/// Resolve the caller identity. The verifier is only consulted when a token is present.
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    headers: &HeaderMap,
) -> Result<AuthOutcome, AuthError> {
    let Some(token) = bearer_token(headers) else {
        debug!("request carries no bearer token");
        return Ok(AuthOutcome::Unauthorized);
    };

    match verifier.verify(token.to_owned()).await? {
        Some(user) => Ok(AuthOutcome::Authorized(user.sub)),
        None => {
            debug!("token authority rejected bearer token");
            Ok(AuthOutcome::Unauthorized)
        }
    }
}
