//! Field-level checks applied when records are written.

use thiserror::Error;

/// A record rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("stars must be between 1 and 3, got {0}")]
    StarsOutOfRange(u8),

    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { field: &'static str, value: f64 },
}

/// Reject blank (or whitespace-only) text fields.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Reject percentages outside `[0, 100]`, including NaN.
pub(crate) fn require_percentage(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::PercentageOutOfRange { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Aria").is_ok());
        assert_eq!(
            require_text("name", "   "),
            Err(ValidationError::Empty { field: "name" })
        );
    }

    #[test]
    fn test_require_percentage_bounds() {
        assert!(require_percentage("p", 0.0).is_ok());
        assert!(require_percentage("p", 100.0).is_ok());
        assert!(require_percentage("p", 100.1).is_err());
        assert!(require_percentage("p", -0.5).is_err());
        assert!(require_percentage("p", f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::StarsOutOfRange(4).to_string(),
            "stars must be between 1 and 3, got 4"
        );
    }
}
