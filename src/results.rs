//! The record a finished run hands back.
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EpiError;
use crate::parameters::Parameters;

/// Why a run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No per-element event had a positive rate
    Equilibrium,
    /// The simulation clock reached `maxTime`
    TimeLimit,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Equilibrium => write!(f, "equilibrium"),
            StopReason::TimeLimit => write!(f, "time limit"),
        }
    }
}

/// The compartment sizes observed at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub counts: IndexMap<String, usize>,
}

impl Sample {
    /// Size of `compartment` in this sample, zero if the compartment is unknown.
    #[must_use]
    pub fn count(&self, compartment: &str) -> usize {
        self.counts.get(compartment).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub model: String,
    pub seed: u64,
    pub parameters: Parameters,
    /// Simulation time when the run ended
    pub final_time: f64,
    /// Total number of per-element events fired
    pub events: usize,
    pub events_by_name: IndexMap<String, usize>,
    /// Final compartment sizes
    pub counts: IndexMap<String, usize>,
    pub stop_reason: StopReason,
    /// Periodic samples of the compartment sizes, present for monitored models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeseries: Option<Vec<Sample>>,
}

impl RunResult {
    /// Final size of `compartment`, zero if the compartment is unknown.
    #[must_use]
    pub fn final_count(&self, compartment: &str) -> usize {
        self.counts.get(compartment).copied().unwrap_or(0)
    }

    /// # Errors
    ///
    /// `EpiError::JsonError` if serialization fails.
    pub fn to_json_string(&self) -> Result<String, EpiError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    ///
    /// `EpiError::JsonError` if the text is not a serialized `RunResult`.
    pub fn from_json_str(text: &str) -> Result<RunResult, EpiError> {
        Ok(serde_json::from_str(text)?)
    }
}
