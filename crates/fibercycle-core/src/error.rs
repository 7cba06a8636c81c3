//! Error type shared by every fallible operation in the crate.

use std::fmt;

#[derive(Debug)]
pub enum SimError {
    /// The configured modulus is not prime.
    NonPrimeModulus(i64),
    /// Any other configuration constraint.
    InvalidConfig(String),
    /// Batch arrays are inconsistent with each other or with the config.
    InvalidBatch(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPrimeModulus(p) => write!(f, "modulus {p} is not prime"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidBatch(msg) => write!(f, "invalid batch: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_context() {
        assert_eq!(
            SimError::NonPrimeModulus(1_000_000_008).to_string(),
            "modulus 1000000008 is not prime"
        );
        let msg = SimError::InvalidBatch("expected 3 elements".into()).to_string();
        assert!(msg.starts_with("invalid batch"));
    }

    #[test]
    fn test_io_error_has_source() {
        let err: SimError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&SimError::NonPrimeModulus(9)).is_none());
    }
}
