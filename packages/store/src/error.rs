use thiserror::Error;

/// Failures while reading configuration or translation resources.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid site configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialise site configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("invalid translation table: {0}")]
    Translations(#[from] serde_json::Error),

    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
}
