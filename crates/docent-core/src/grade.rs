//! Shared three-tier grading of `[0, 1]` ratios.
//!
//! Confidence badges and challenge scores bucket against the same 0.8/0.6
//! cutoffs. Classifying in one place keeps the two displays from drifting
//! apart.

use serde::{Deserialize, Serialize};

/// Display emphasis for a grade or a difficulty chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emphasis {
    Success,
    Warning,
    Error,
    /// Neutral fallback for labels outside the known set.
    Info,
}

/// Three-tier classification of a `[0, 1]` ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl Grade {
    /// Classifies a ratio against the fixed cutoffs: `>= 0.8` is High,
    /// `>= 0.6` is Medium, the rest is Low.
    pub fn from_ratio(ratio: f32) -> Self {
        if ratio >= 0.8 {
            Self::High
        } else if ratio >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Wording for a confidence badge.
    pub fn confidence_label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Wording for a challenge score.
    pub fn score_label(self) -> &'static str {
        match self {
            Self::High => "Excellent",
            Self::Medium => "Good",
            Self::Low => "Needs Improvement",
        }
    }

    /// Severity tier for rendering.
    pub fn emphasis(self) -> Emphasis {
        match self {
            Self::High => Emphasis::Success,
            Self::Medium => Emphasis::Warning,
            Self::Low => Emphasis::Error,
        }
    }
}
