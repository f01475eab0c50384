//! Error types for system-identification operations

use thiserror::Error;

/// Result type alias for `sysid` operations
pub type Result<T, E = SysIdError> = std::result::Result<T, E>;

/// Errors raised while configuring or running a dynamic model
///
/// Every variant describes caller misuse; none of them is transient.
#[derive(Debug, Error)]
pub enum SysIdError {
    /// Model kind not known to the predictor factory
    #[error("Unsupported model: {name} (expected one of: mlp, tcn)")]
    UnsupportedModel {
        /// Requested model kind
        name: String,
    },

    /// Run mode not known to the dispatcher
    #[error("Unsupported run mode: {name} (expected one-step-ahead or free-run-simulation)")]
    UnsupportedMode {
        /// Requested mode
        name: String,
    },

    /// Activation not known to the predictors
    #[error("Unknown activation: {name} (valid options: relu, sigmoid, tanh, lecun_tanh)")]
    UnsupportedActivation {
        /// Requested activation
        name: String,
    },

    /// Dataset not known to the experiment loader
    #[error("Unsupported dataset: {name} (expected chen)")]
    UnsupportedDataset {
        /// Requested dataset
        name: String,
    },

    /// Configuration values that cannot describe a valid model or dataset
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for failure
        reason: String,
    },

    /// Sequence shapes disagree with each other or with the configuration
    #[error("Shape mismatch: {reason}")]
    ShapeMismatch {
        /// Reason for failure
        reason: String,
    },

    /// Autoregressive one-step-ahead prediction called without a reference output
    #[error("Missing reference output: autoregressive one-step-ahead prediction needs the measured output sequence")]
    MissingReference,

    /// Reference output with no variance, for which VAF is undefined
    #[error("Constant reference output on channel {channel}: variance accounted for is undefined")]
    ConstantReference {
        /// Output channel with zero variance
        channel: usize,
    },

    /// Tensor data could not be read back into host memory
    #[error("Tensor data error: {reason}")]
    TensorData {
        /// Reason for failure
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serde_json error
        #[from]
        source: serde_json::Error,
    },
}

impl SysIdError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            reason: reason.into(),
        }
    }

    /// Create a tensor data error
    pub fn tensor_data(reason: impl Into<String>) -> Self {
        Self::TensorData {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_positive(s: &str) -> Result<usize> {
        let n: usize = s
            .parse()
            .map_err(|_| SysIdError::invalid_config(format!("not a number: {}", s)))?;
        if n == 0 {
            return Err(SysIdError::invalid_config("must be positive"));
        }
        Ok(n)
    }

    #[test]
    fn test_result_alias_defaults_to_sysid_error() {
        assert_eq!(parse_positive("3").unwrap(), 3);
        assert!(matches!(
            parse_positive("0"),
            Err(SysIdError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_result_alias_accepts_other_errors() {
        let parsed: Result<u8, std::num::ParseIntError> = "300".parse();
        assert!(parsed.is_err());
    }

    #[test]
    fn test_error_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(SysIdError::from(io), SysIdError::Io { .. }));

        let json = serde_json::from_str::<usize>("nope").unwrap_err();
        let err = SysIdError::from(json);
        assert!(err.to_string().starts_with("JSON error"));
    }
}
