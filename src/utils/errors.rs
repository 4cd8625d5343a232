use thiserror::Error;

/// Unified error type for gateway startup and configuration
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing config key: {0}")]
    MissingKey(&'static str),

    #[error("Invalid setting {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, GatewayError>;
