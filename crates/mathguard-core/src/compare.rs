//! Side-by-side results of the two validation strategies.
//!
//! The strategies agree on well-formed input. On malformed input they can legitimately
//! differ: the segmented strategy never reports unclosed delimiters and stops looking
//! at the first one, and its positions are summed from segment lengths rather than
//! taken from the scan.

use crate::validator::{ValidationError, ValidationResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyDisagreement {
    /// Reported by the direct scan only.
    DirectOnly { error: ValidationError },
    /// Reported by the segmented strategy only.
    SegmentedOnly { error: ValidationError },
    /// Reported by both for the same excerpt, at different positions.
    PositionDrift {
        excerpt: String,
        direct: usize,
        segmented: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyComparison {
    pub direct: ValidationResult,
    pub segmented: ValidationResult,
}

impl StrategyComparison {
    pub fn new(direct: ValidationResult, segmented: ValidationResult) -> Self {
        Self { direct, segmented }
    }

    pub fn verdicts_agree(&self) -> bool {
        self.direct.is_valid == self.segmented.is_valid
    }

    /// Pairs errors by kind and excerpt, in order, and lists everything that does not
    /// line up.
    pub fn disagreements(&self) -> Vec<StrategyDisagreement> {
        let mut unmatched: Vec<&ValidationError> = self.segmented.errors.iter().collect();
        let mut disagreements = Vec::new();

        for error in &self.direct.errors {
            let partner = unmatched
                .iter()
                .position(|other| other.kind == error.kind && other.excerpt == error.excerpt);
            match partner {
                Some(index) => {
                    let other = unmatched.remove(index);
                    if other.position != error.position {
                        disagreements.push(StrategyDisagreement::PositionDrift {
                            excerpt: error.excerpt.clone(),
                            direct: error.position,
                            segmented: other.position,
                        });
                    }
                }
                None => disagreements.push(StrategyDisagreement::DirectOnly {
                    error: error.clone(),
                }),
            }
        }

        disagreements.extend(
            unmatched
                .into_iter()
                .map(|error| StrategyDisagreement::SegmentedOnly {
                    error: error.clone(),
                }),
        );
        disagreements
    }

    pub fn is_consistent(&self) -> bool {
        self.disagreements().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ErrorKind;

    fn error(kind: ErrorKind, position: usize, excerpt: &str) -> ValidationError {
        ValidationError {
            message: String::new(),
            position,
            length: excerpt.len(),
            excerpt: excerpt.to_string(),
            kind,
        }
    }

    #[test]
    fn test_identical_results_are_consistent() {
        let result = ValidationResult::from_errors(vec![error(
            ErrorKind::EngineSyntaxError,
            3,
            "x",
        )]);
        let comparison = StrategyComparison::new(result.clone(), result);
        assert!(comparison.verdicts_agree());
        assert!(comparison.is_consistent());
    }

    #[test]
    fn test_reports_each_kind_of_disagreement() {
        let direct = ValidationResult::from_errors(vec![
            error(ErrorKind::UnclosedDelimiter, 0, "a"),
            error(ErrorKind::EngineSyntaxError, 5, "b"),
        ]);
        let segmented = ValidationResult::from_errors(vec![
            error(ErrorKind::EngineSyntaxError, 9, "b"),
            error(ErrorKind::SegmentationFailure, 0, "c"),
        ]);
        let comparison = StrategyComparison::new(direct.clone(), segmented.clone());

        assert!(comparison.verdicts_agree());
        assert_eq!(
            comparison.disagreements(),
            vec![
                StrategyDisagreement::DirectOnly {
                    error: direct.errors[0].clone()
                },
                StrategyDisagreement::PositionDrift {
                    excerpt: "b".to_string(),
                    direct: 5,
                    segmented: 9,
                },
                StrategyDisagreement::SegmentedOnly {
                    error: segmented.errors[1].clone()
                },
            ]
        );
    }
}
