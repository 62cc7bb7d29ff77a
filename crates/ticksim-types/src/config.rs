//! # ticksim-types::config
//!
//! Strongly-typed configuration for a simulation run. `SimConfig` is the
//! `serde`-deserializable shape loaded from a TOML file by the CLI and then
//! overridden field-by-field by command-line flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The four escalating failure-control modes (plus the no-op baseline),
/// each transferring a bit more control from the RNG to an interactive
/// prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FailureMode {
    Nothing,
    Drop,
    Delay,
    Crash,
    Everything,
}

impl FailureMode {
    pub fn drops_via_rng(self) -> bool {
        matches!(self, FailureMode::Drop | FailureMode::Delay)
    }

    pub fn delays_via_rng(self) -> bool {
        matches!(self, FailureMode::Delay)
    }

    pub fn crashes_via_rng(self) -> bool {
        matches!(self, FailureMode::Crash)
    }

    pub fn is_interactive_drop_delay(self) -> bool {
        matches!(self, FailureMode::Crash | FailureMode::Everything)
    }

    pub fn is_interactive_crash(self) -> bool {
        matches!(self, FailureMode::Everything)
    }

    pub fn is_interactive_order(self) -> bool {
        matches!(self, FailureMode::Everything)
    }
}

/// Where the tick loop gets its tick-boundary-delimited commands from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Script(PathBuf),
    Interactive,
}

/// A wrapper for the RNG seed to make its purpose clear in config files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngSeed(pub u64);

/// Top-level configuration for a simulation run, matching the enumerated
/// options named by the external interface: mode, drop_rate, delay_rate,
/// failure_rate, recovery_rate, seed, input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub mode: FailureMode,
    #[serde(default)]
    pub drop_rate: f64,
    #[serde(default)]
    pub delay_rate: f64,
    #[serde(default)]
    pub failure_rate: f64,
    #[serde(default)]
    pub recovery_rate: f64,
    pub seed: Option<u64>,
    #[serde(default)]
    pub script: Option<PathBuf>,
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        for (field, value) in [
            ("drop_rate", self.drop_rate),
            ("delay_rate", self.delay_rate),
            ("failure_rate", self.failure_rate),
            ("recovery_rate", self.recovery_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::errors::ConfigError::RateOutOfRange { field, value });
            }
        }
        Ok(())
    }
}
