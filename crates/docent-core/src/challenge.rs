//! Challenge quiz value types.

use crate::grade::Emphasis;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Difficulty label attached to a generated question.
///
/// Parsed case-insensitively from whatever string the backend sends. A
/// label outside the known three is kept verbatim in `Other` instead of
/// being rejected, so an unexpected backend label still renders.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(from = "String", into = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[strum(default)]
    Other(String),
}

impl Difficulty {
    /// Display emphasis for the difficulty chip.
    pub fn emphasis(&self) -> Emphasis {
        match self {
            Self::Easy => Emphasis::Success,
            Self::Medium => Emphasis::Warning,
            Self::Hard => Emphasis::Error,
            Self::Other(_) => Emphasis::Info,
        }
    }
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| Self::Other(value))
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.to_string()
    }
}

/// One generated quiz question; fixed for the lifetime of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeQuestion {
    pub question: String,
    pub difficulty: Difficulty,
}

/// Score and feedback for one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Grading in `[0, 1]`.
    pub score: f32,
    pub feedback: String,
}

/// A graded answer. Results are appended in question order; the sequence is
/// always a prefix of the question sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub question: String,
    pub user_answer: String,
    pub difficulty: Difficulty,
    pub evaluation: Evaluation,
}

/// Arithmetic mean of the result scores; `0.0` when nothing is graded yet.
pub fn aggregate_score(results: &[ChallengeResult]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f32 = results.iter().map(|result| result.evaluation.score).sum();
    total / results.len() as f32
}
