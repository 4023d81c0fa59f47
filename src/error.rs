use std::path::PathBuf;

/// Rejected placements. Both are recoverable: the caller keeps the prior
/// state and surfaces the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("position row={row} col={col} is already marked")]
    AlreadyMarked { row: i32, col: i32 },

    #[error("position row={row} col={col} is not a valid position")]
    InvalidLocation { row: i32, col: i32 },
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
