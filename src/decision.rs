use serde::{Deserialize, Serialize};

use crate::scoring::ClassificationResult;

pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Label(String),
    Unknown,
}

impl Decision {
    pub fn message(&self) -> &str {
        match self {
            Self::Label(label) => label,
            Self::Unknown => UNKNOWN,
        }
    }
}

/// Confidence-margin rule turning a score vector into a label.
///
/// The top class is reported only when its score is strictly above
/// `confidence_threshold` and the spread between the highest and lowest
/// scores is at least `margin_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    pub confidence_threshold: f32,
    pub margin_threshold: f32,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            margin_threshold: 0.4,
        }
    }
}

impl DecisionPolicy {
    /// Margin gate alone, with the confidence gate disabled.
    pub fn margin_only(margin_threshold: f32) -> Self {
        Self {
            confidence_threshold: 0.0,
            margin_threshold,
        }
    }

    pub fn decide(&self, result: &ClassificationResult) -> Decision {
        let Some((_, label)) = result.top() else {
            return Decision::Unknown;
        };

        if result.confidence() > self.confidence_threshold
            && result.margin() >= self.margin_threshold
        {
            Decision::Label(label.to_string())
        } else {
            Decision::Unknown
        }
    }
}
