use thiserror::Error;

/// Result type used when resolving sessions from a store with error `SE`.
pub type Result<T, SE> = std::result::Result<T, Error<SE>>;

/// Errors that can occur while resolving a session record.
#[derive(Debug, Error)]
pub enum Error<SE>
where
    SE: std::error::Error + 'static,
{
    /// The underlying store failed.
    #[error("session store error: {0}")]
    Backend(#[source] SE),

    /// A stored record was not valid JSON for its expected shape.
    #[error("malformed session record under {0}: {1}")]
    Deserialize(&'static str, #[source] serde_json::Error),
}
