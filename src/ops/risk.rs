//! Risk tiers and trust modes
//!
//! ```text
//!                      low    medium   high
//! training_wheels      auto   pending  pending
//! supervised           auto   auto     pending
//! autonomous           auto   auto     auto
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::LlmOperation;

/// Potential for unwanted effect of an operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Per-user setting controlling which risk tiers execute without approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    TrainingWheels,
    #[default]
    Supervised,
    Autonomous,
}

impl TrustMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustMode::TrainingWheels => "training_wheels",
            TrustMode::Supervised => "supervised",
            TrustMode::Autonomous => "autonomous",
        }
    }

    /// Highest risk tier this mode applies without approval
    pub fn ceiling(&self) -> RiskTier {
        match self {
            TrustMode::TrainingWheels => RiskTier::Low,
            TrustMode::Supervised => RiskTier::Medium,
            TrustMode::Autonomous => RiskTier::High,
        }
    }

    pub fn auto_applies(&self, risk: RiskTier) -> bool {
        risk <= self.ceiling()
    }
}

impl fmt::Display for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "training_wheels" => Ok(TrustMode::TrainingWheels),
            "supervised" => Ok(TrustMode::Supervised),
            "autonomous" => Ok(TrustMode::Autonomous),
            other => Err(format!(
                "Unknown trust mode '{}'. Valid values: training_wheels, supervised, autonomous",
                other
            )),
        }
    }
}

impl LlmOperation {
    pub fn risk(&self) -> RiskTier {
        match self {
            LlmOperation::Chat(_) => RiskTier::Low,
            LlmOperation::CreateTask(_)
            | LlmOperation::UpdateTaskStatus(_)
            | LlmOperation::LinkActionToTask(_)
            | LlmOperation::UpdateActionState(_) => RiskTier::Medium,
            LlmOperation::DeleteProject(_) | LlmOperation::DeleteTask(_) => RiskTier::High,
        }
    }
}
