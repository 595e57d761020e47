/// Domain-specific error types for the pricing engine and its service.
/// Every error is deterministic for a given input and is returned to the
/// caller immediately. Nothing here is transient, so nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("invalid input: {field} must be {requirement}, got {value}")]
    InvalidInput {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("degenerate input: {0}")]
    Degenerate(String),

    #[error("malformed request: {0}")]
    Parse(String),

    #[error("invalid sweep: {0}")]
    InvalidSweep(String),

    #[error("config error: {0}")]
    Config(String),
}

impl PricingError {
    /// Degenerate arithmetic is caught by validation, so it counts as bad input.
    #[inline]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::Degenerate(_))
    }

    /// Short machine-readable tag used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::Degenerate(_) => "degenerate_input",
            Self::Parse(_) => "parse",
            Self::InvalidSweep(_) => "invalid_sweep",
            Self::Config(_) => "config",
        }
    }
}

pub type PricingResult<T> = Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_is_invalid_input() {
        let e = PricingError::Degenerate("sigma * sqrt(T) is zero".into());
        assert!(e.is_invalid_input());
        assert_eq!(e.kind(), "degenerate_input");
    }

    #[test]
    fn test_message_names_field() {
        let e = PricingError::InvalidInput {
            field: "volatility",
            requirement: "finite and > 0",
            value: 0.0,
        };
        let msg = e.to_string();
        assert!(msg.contains("volatility"), "message should name the field: {msg}");
        assert!(!PricingError::Config("x".into()).is_invalid_input());
        assert_eq!(PricingError::Parse("missing field".into()).kind(), "parse");
    }
}
