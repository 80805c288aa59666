/// Errors from loading, saving or checking configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// A value parsed fine but is out of range.
    #[error("invalid config value `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// No platform config directory and none given on the command line.
    #[error("no config directory available; pass --config")]
    NoConfigDir,
}
