use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Database used when the connection settings do not name one.
pub const DEFAULT_DATABASE: &str = "player_kv";

/// Parsed client options plus the database holding the `kv` collection.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options parsed from the connection URI.
    pub options: ClientOptions,
    /// Database that stores the `kv` collection.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`; `db_name` wins over the database named in the URI.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        // Fall back to the database embedded in the URI before the built-in default.
        let database_name = db_name
            .map(str::to_owned)
            .or_else(|| options.default_database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());

        Ok(Self {
            options,
            database_name,
        })
    }
}
