//! Run modes shared by the dynamic model and its predictor

use crate::error::SysIdError;
use std::fmt;
use std::str::FromStr;

/// Inference mode of a [`DynamicModel`](crate::dynamic_model::DynamicModel)
///
/// The mode is mirrored into the predictor so both agree on the operating
/// semantics of the next call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Open-loop prediction with measured past outputs as context (teacher forcing)
    #[default]
    OneStepAhead,
    /// Closed-loop rollout feeding predicted outputs back as context
    FreeRunSimulation,
}

impl RunMode {
    /// All modes, in dispatch order
    pub const ALL: [RunMode; 2] = [RunMode::OneStepAhead, RunMode::FreeRunSimulation];

    /// Canonical textual name, as accepted by [`RunMode::from_str`]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::OneStepAhead => "one-step-ahead",
            RunMode::FreeRunSimulation => "free-run-simulation",
        }
    }

    /// Compact code stored on predictor modules
    pub fn code(self) -> u8 {
        match self {
            RunMode::OneStepAhead => 0,
            RunMode::FreeRunSimulation => 1,
        }
    }

    /// Inverse of [`RunMode::code`]; unknown codes fall back to the default mode
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => RunMode::FreeRunSimulation,
            _ => RunMode::OneStepAhead,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = SysIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "one-step-ahead" | "osa" => Ok(RunMode::OneStepAhead),
            "free-run-simulation" | "free-run" => Ok(RunMode::FreeRunSimulation),
            _ => Err(SysIdError::UnsupportedMode {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_one_step_ahead() {
        assert_eq!(RunMode::default(), RunMode::OneStepAhead);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "one-step-ahead".parse::<RunMode>().unwrap(),
            RunMode::OneStepAhead
        );
        assert_eq!(
            "FREE_RUN_SIMULATION".parse::<RunMode>().unwrap(),
            RunMode::FreeRunSimulation
        );
        assert_eq!("free-run".parse::<RunMode>().unwrap(), RunMode::FreeRunSimulation);

        for mode in RunMode::ALL {
            assert_eq!(mode.to_string().parse::<RunMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_code_round_trip() {
        for mode in RunMode::ALL {
            assert_eq!(RunMode::from_code(mode.code()), mode);
        }
        assert_eq!(RunMode::from_code(7), RunMode::OneStepAhead);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = "closed-loop".parse::<RunMode>().unwrap_err();
        assert!(matches!(err, SysIdError::UnsupportedMode { ref name } if name == "closed-loop"));
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&RunMode::FreeRunSimulation).unwrap();
        assert_eq!(json, "\"free-run-simulation\"");
        let mode: RunMode = serde_json::from_str("\"one-step-ahead\"").unwrap();
        assert_eq!(mode, RunMode::OneStepAhead);
    }
}
