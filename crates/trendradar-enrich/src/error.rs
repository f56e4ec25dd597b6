use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("enrichment provider not configured: {provider}")]
    ConfigurationMissing { provider: String },

    #[error("provider quota exhausted: {provider}")]
    QuotaExceeded { provider: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {provider}")]
    UnexpectedStatus { provider: String, status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed completion from {provider}: {reason}")]
    MalformedCompletion { provider: String, reason: String },
}
