//! Error types for NeuroFusion.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Web error: {0}")]
    Web(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_convert_with_context() {
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json").into();
        assert_eq!(io.to_string(), "IO error: config.json");

        let json: Error = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(json, Error::Json(_)));
        assert!(json.to_string().starts_with("JSON error: "));
    }
}
