//! Threshold policy turning a sentiment result into a vote.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Percentage, ValidationError};

use super::VoteCode;

/// Output of the sentiment scorer. Both fields lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    score: f64,
    confidence: f64,
}

impl DecisionResult {
    /// Result used for an empty batch: neutral score, no confidence.
    pub const NEUTRAL: Self = Self {
        score: 0.5,
        confidence: 0.0,
    };

    /// Creates a result, rejecting NaN and values outside `[0, 1]`.
    pub fn new(score: f64, confidence: f64) -> Result<Self, ValidationError> {
        check_unit("score", score)?;
        check_unit("confidence", confidence)?;
        Ok(Self { score, confidence })
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Score as a whole percent for the ledger.
    pub fn scaled_score(&self) -> Percentage {
        Percentage::from_fraction(self.score)
    }

    /// Confidence as a whole percent for the ledger.
    pub fn scaled_confidence(&self) -> Percentage {
        Percentage::from_fraction(self.confidence)
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::invalid_format(
            field,
            format!("expected a number in [0, 1], got {}", value),
        ));
    }
    Ok(())
}

/// Decision thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Below this confidence the agent abstains.
    #[serde(default = "default_confidence_min")]
    pub confidence_min: f64,

    /// At or above this score the agent votes yes.
    #[serde(default = "default_score_min")]
    pub score_min: f64,
}

impl Thresholds {
    pub fn new(confidence_min: f64, score_min: f64) -> Result<Self, ValidationError> {
        let thresholds = Self {
            confidence_min,
            score_min,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_unit("confidence_min", self.confidence_min)?;
        check_unit("score_min", self.score_min)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confidence_min: default_confidence_min(),
            score_min: default_score_min(),
        }
    }
}

fn default_confidence_min() -> f64 {
    0.7
}

fn default_score_min() -> f64 {
    0.6
}

/// Maps a result to a vote. Confidence is checked first, so a low-confidence
/// result abstains whatever its score.
pub fn to_vote_code(result: &DecisionResult, thresholds: &Thresholds) -> VoteCode {
    if result.confidence() < thresholds.confidence_min {
        VoteCode::Abstain
    } else if result.score() >= thresholds.score_min {
        VoteCode::Yes
    } else {
        VoteCode::No
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(score: f64, confidence: f64) -> DecisionResult {
        DecisionResult::new(score, confidence).unwrap()
    }

    #[test]
    fn confident_positive_result_votes_yes_with_scaled_values() {
        let r = result(0.8, 0.9);
        assert_eq!(to_vote_code(&r, &Thresholds::default()), VoteCode::Yes);
        assert_eq!(r.scaled_score().value(), 80);
        assert_eq!(r.scaled_confidence().value(), 90);
    }

    #[test]
    fn score_exactly_at_threshold_votes_yes() {
        assert_eq!(
            to_vote_code(&result(0.6, 0.7), &Thresholds::default()),
            VoteCode::Yes
        );
    }

    #[test]
    fn confident_negative_result_votes_no() {
        assert_eq!(
            to_vote_code(&result(0.2, 0.95), &Thresholds::default()),
            VoteCode::No
        );
    }

    #[test]
    fn neutral_result_abstains() {
        assert_eq!(
            to_vote_code(&DecisionResult::NEUTRAL, &Thresholds::default()),
            VoteCode::Abstain
        );
    }

    #[test]
    fn new_rejects_nan_and_out_of_range() {
        assert!(DecisionResult::new(f64::NAN, 0.5).is_err());
        assert!(DecisionResult::new(0.5, 1.01).is_err());
        assert!(DecisionResult::new(-0.1, 0.5).is_err());
    }

    #[test]
    fn thresholds_validate_range() {
        assert!(Thresholds::new(0.7, 0.6).is_ok());
        assert!(Thresholds::new(1.5, 0.6).is_err());
    }

    proptest! {
        #[test]
        fn low_confidence_always_abstains(
            score in 0.0f64..=1.0,
            confidence in 0.0f64..0.7,
        ) {
            let r = result(score, confidence);
            prop_assert_eq!(to_vote_code(&r, &Thresholds::default()), VoteCode::Abstain);
        }

        #[test]
        fn confident_vote_splits_on_score_threshold(
            score in 0.0f64..=1.0,
            confidence in 0.7f64..=1.0,
        ) {
            let r = result(score, confidence);
            let expected = if score >= 0.6 { VoteCode::Yes } else { VoteCode::No };
            prop_assert_eq!(to_vote_code(&r, &Thresholds::default()), expected);
        }
    }
}
