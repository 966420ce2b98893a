use reqwest::Url;

use super::error::{CouchDaoError, CouchResult};

/// Runtime configuration describing how to reach the CouchDB database holding KV documents.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL without the database segment.
    pub base_url: Url,
    /// Database holding the KV documents.
    pub database: String,
    /// Basic auth user and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Validate the server URL and pair it with the database name.
    pub fn new(base_url: &str, database: impl Into<String>) -> CouchResult<Self> {
        let parsed =
            Url::parse(base_url.trim_end_matches('/')).map_err(|err| {
                CouchDaoError::InvalidBaseUrl {
                    url: base_url.to_owned(),
                    reason: err.to_string(),
                }
            })?;
        if parsed.cannot_be_a_base() {
            return Err(CouchDaoError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot carry path segments".into(),
            });
        }

        Ok(Self {
            base_url: parsed,
            database: database.into(),
            credentials: None,
        })
    }

    /// Attach basic-auth credentials to the configuration.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_ignored() {
        let config = CouchConfig::new("http://localhost:5984/", "kv").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5984/");
        assert_eq!(config.database, "kv");
        assert!(config.credentials.is_none());
    }

    #[test]
    fn rejects_urls_without_path() {
        assert!(matches!(
            CouchConfig::new("mailto:admin@example.com", "kv"),
            Err(CouchDaoError::InvalidBaseUrl { .. })
        ));
        assert!(CouchConfig::new("not a url", "kv").is_err());
    }
}
