use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// The file path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A config file is not valid TOML or does not fit the schema.
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// The file path, or a placeholder for in-memory sources.
        path: String,
        /// The underlying parse error.
        source: toml::de::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for {field}: {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong.
        message: String,
    },

    /// An environment override could not be applied.
    #[error("invalid environment variable {var}: {message}")]
    EnvError {
        /// The variable name.
        var: String,
        /// What is wrong.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
