//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A provider failed to read or the merged document did not fit the schema.
    #[error("failed to load settings: {0}")]
    Load(#[source] Box<figment::Error>),
    /// A settings value was invalid.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

impl From<figment::Error> for SettingsError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("logging.level is empty".to_string());
        assert_eq!(
            err.to_string(),
            "invalid settings value: logging.level is empty"
        );
    }

    #[test]
    fn figment_error_converts() {
        let err: SettingsError = figment::Error::from("boom".to_string()).into();
        assert_matches!(err, SettingsError::Load(_));
        assert!(err.to_string().contains("boom"));
    }
}
