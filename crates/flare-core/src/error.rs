//! Error types for Flare

use thiserror::Error;

/// The main error type for Flare operations
#[derive(Debug, Error)]
pub enum FlareError {
    #[error("Texture not found: {0}")]
    TextureNotFound(String),

    #[error("All particle images must use the same source: expected source {expected}, got {found}")]
    TextureSourceMismatch { expected: u32, found: u32 },

    #[error("Empty texture list")]
    EmptyTextureList,

    #[error("Invalid config for behavior '{behavior}': {message}")]
    BehaviorConfig { behavior: String, message: String },

    #[error("Unknown spawn shape: {0}")]
    UnknownShape(String),

    #[error("Invalid config for shape '{shape}': {message}")]
    ShapeConfig { shape: String, message: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Ease parse error: {0}")]
    EaseParse(String),

    #[error("Path expression error: {0}")]
    PathExpression(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Flare operations
pub type Result<T> = std::result::Result<T, FlareError>;

impl From<serde_json::Error> for FlareError {
    fn from(err: serde_json::Error) -> Self {
        FlareError::ConfigParse(err.to_string())
    }
}

impl From<toml::de::Error> for FlareError {
    fn from(err: toml::de::Error) -> Self {
        FlareError::ConfigParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message() {
        let err = FlareError::TextureSourceMismatch {
            expected: 1,
            found: 2,
        };
        assert!(err.to_string().contains("same source"));
    }

    #[test]
    fn test_from_json_error() {
        let err: FlareError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, FlareError::ConfigParse(_)));
    }
}
