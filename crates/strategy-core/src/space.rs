//! Seam to the externally supplied preference model.
//!
//! The negotiation runtime owns the real utility space; the core only needs
//! the operations in `UtilitySpace`. `LinearAdditiveSpace` is a concrete
//! weighted-additive implementation used by the session harness and the test
//! suites.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{Bid, Domain, Issue, IssueId, Value};

use crate::rng::AgentRng;

#[derive(Debug)]
pub enum UtilityError {
    /// The bid has no value for an issue in the domain.
    MissingValue(IssueId),
    /// The bid's value kind does not match the issue kind.
    KindMismatch(IssueId),
    /// The domain has no issues to evaluate.
    EmptyDomain,
}

impl fmt::Display for UtilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue(id) => write!(f, "bid is missing a value for issue {id}"),
            Self::KindMismatch(id) => write!(f, "value kind does not match issue {id}"),
            Self::EmptyDomain => write!(f, "domain has no issues"),
        }
    }
}

impl std::error::Error for UtilityError {}

/// What the strategy core consumes from the preference model.
///
/// The additive accessors return `None` when the model is not additively
/// decomposable; callers must fall back to their documented defaults rather
/// than fail.
pub trait UtilitySpace {
    fn domain(&self) -> &Domain;

    /// Utility of a complete bid, in `[0, 1]`.
    fn utility_of(&self, bid: &Bid) -> Result<f64, UtilityError>;

    /// The bid maximizing this space's utility. May be expensive; callers
    /// cache it.
    fn max_utility_bid(&self) -> Result<Bid, UtilityError>;

    /// A uniformly random well-typed bid, used as a last-resort fallback.
    fn random_bid(&self, rng: &mut AgentRng) -> Bid;

    fn is_additive(&self) -> bool {
        false
    }

    /// Relative weight of an issue, normalized so weights sum to 1.
    fn issue_weight(&self, _issue: IssueId) -> Option<f64> {
        None
    }

    /// Evaluation of a discrete option in `[0, 1]`.
    fn evaluation_of(&self, _issue: IssueId, _option: &str) -> Option<f64> {
        None
    }
}

/// Per-issue scoring rule for `LinearAdditiveSpace`. Numeric issues score by
/// closeness to an ideal point; discrete issues by a per-option table.
#[derive(Debug, Clone)]
pub enum Evaluator {
    Discrete { evaluations: BTreeMap<String, f64> },
    Integer { ideal: i64 },
    Real { ideal: f64 },
}

/// Weighted-additive preference model over a domain.
#[derive(Debug, Clone)]
pub struct LinearAdditiveSpace {
    domain: Domain,
    weights: BTreeMap<IssueId, f64>,
    evaluators: BTreeMap<IssueId, Evaluator>,
}

impl LinearAdditiveSpace {
    /// Weights are normalized to sum to 1; missing or non-positive weight
    /// tables degrade to uniform.
    pub fn new(
        domain: Domain,
        weights: BTreeMap<IssueId, f64>,
        evaluators: BTreeMap<IssueId, Evaluator>,
    ) -> Self {
        let sum: f64 = domain
            .ids()
            .map(|id| weights.get(&id).copied().unwrap_or(0.0).max(0.0))
            .sum();
        let normalized = if sum > 0.0 {
            domain
                .ids()
                .map(|id| {
                    let weight = weights.get(&id).copied().unwrap_or(0.0).max(0.0);
                    (id, weight / sum)
                })
                .collect()
        } else {
            let uniform = 1.0 / domain.len().max(1) as f64;
            domain.ids().map(|id| (id, uniform)).collect()
        };
        Self {
            domain,
            weights: normalized,
            evaluators,
        }
    }

    fn evaluate(&self, id: IssueId, issue: &Issue, value: &Value) -> Result<f64, UtilityError> {
        match (issue, value) {
            (Issue::Discrete { .. }, Value::Discrete(option)) => {
                Ok(self.evaluation_of(id, option).unwrap_or(0.0))
            }
            (Issue::Integer { min, max }, Value::Integer(value)) => {
                let ideal = match self.evaluators.get(&id) {
                    Some(Evaluator::Integer { ideal }) => *ideal,
                    _ => *max,
                };
                let span = (max - min).max(1) as f64;
                Ok((1.0 - (*value as f64 - ideal as f64).abs() / span).max(0.0))
            }
            (Issue::Real { min, max }, Value::Real(value)) => {
                let ideal = match self.evaluators.get(&id) {
                    Some(Evaluator::Real { ideal }) => *ideal,
                    _ => *max,
                };
                let span = (max - min).abs().max(f64::MIN_POSITIVE);
                Ok((1.0 - (value - ideal).abs() / span).max(0.0))
            }
            _ => Err(UtilityError::KindMismatch(id)),
        }
    }
}

impl UtilitySpace for LinearAdditiveSpace {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn utility_of(&self, bid: &Bid) -> Result<f64, UtilityError> {
        if self.domain.is_empty() {
            return Err(UtilityError::EmptyDomain);
        }
        let mut utility = 0.0;
        for (id, issue) in self.domain.iter() {
            let value = bid.value(*id).ok_or(UtilityError::MissingValue(*id))?;
            let weight = self.weights.get(id).copied().unwrap_or(0.0);
            utility += weight * self.evaluate(*id, issue, value)?;
        }
        Ok(utility.clamp(0.0, 1.0))
    }

    fn max_utility_bid(&self) -> Result<Bid, UtilityError> {
        if self.domain.is_empty() {
            return Err(UtilityError::EmptyDomain);
        }
        let mut bid = Bid::default();
        for (id, issue) in self.domain.iter() {
            let value = match issue {
                Issue::Discrete { options } => {
                    let best = options
                        .iter()
                        .max_by(|a, b| {
                            let left = self.evaluation_of(*id, a).unwrap_or(0.0);
                            let right = self.evaluation_of(*id, b).unwrap_or(0.0);
                            left.total_cmp(&right)
                        })
                        .ok_or(UtilityError::MissingValue(*id))?;
                    Value::Discrete(best.clone())
                }
                Issue::Integer { min, max } => {
                    let ideal = match self.evaluators.get(id) {
                        Some(Evaluator::Integer { ideal }) => *ideal,
                        _ => *max,
                    };
                    Value::Integer(ideal.clamp(*min, *max))
                }
                Issue::Real { min, max } => {
                    let ideal = match self.evaluators.get(id) {
                        Some(Evaluator::Real { ideal }) => *ideal,
                        _ => *max,
                    };
                    Value::Real(ideal.clamp(*min, *max))
                }
            };
            bid.set(*id, value);
        }
        Ok(bid)
    }

    fn random_bid(&self, rng: &mut AgentRng) -> Bid {
        let mut bid = Bid::default();
        for (id, issue) in self.domain.iter() {
            let value = match issue {
                Issue::Discrete { options } => {
                    let index = rng.next_below(options.len() as u64) as usize;
                    Value::Discrete(options.get(index).cloned().unwrap_or_default())
                }
                Issue::Integer { min, max } => {
                    let span = max.saturating_sub(*min).max(0) as u64;
                    Value::Integer(min + rng.next_below(span.saturating_add(1)) as i64)
                }
                Issue::Real { min, max } => Value::Real(min + rng.roll(max - min)),
            };
            bid.set(*id, value);
        }
        bid
    }

    fn is_additive(&self) -> bool {
        true
    }

    fn issue_weight(&self, issue: IssueId) -> Option<f64> {
        self.weights.get(&issue).copied()
    }

    fn evaluation_of(&self, issue: IssueId, option: &str) -> Option<f64> {
        match self.evaluators.get(&issue) {
            Some(Evaluator::Discrete { evaluations }) => evaluations.get(option).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_issue_space() -> LinearAdditiveSpace {
        let domain = Domain::new(BTreeMap::from([
            (
                1,
                Issue::Discrete {
                    options: vec!["red".to_string(), "blue".to_string()],
                },
            ),
            (2, Issue::Integer { min: 0, max: 10 }),
        ]));
        LinearAdditiveSpace::new(
            domain,
            BTreeMap::from([(1, 3.0), (2, 1.0)]),
            BTreeMap::from([
                (
                    1,
                    Evaluator::Discrete {
                        evaluations: BTreeMap::from([
                            ("red".to_string(), 0.9),
                            ("blue".to_string(), 0.1),
                        ]),
                    },
                ),
                (2, Evaluator::Integer { ideal: 10 }),
            ]),
        )
    }

    #[test]
    fn weights_normalize_to_one() {
        let space = two_issue_space();
        let total: f64 = space.domain().ids().filter_map(|id| space.issue_weight(id)).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((space.issue_weight(1).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn max_utility_bid_picks_best_per_issue() {
        let space = two_issue_space();
        let bid = space.max_utility_bid().expect("max bid");
        assert_eq!(bid.value(1), Some(&Value::Discrete("red".to_string())));
        assert_eq!(bid.value(2), Some(&Value::Integer(10)));
        let utility = space.utility_of(&bid).expect("utility");
        assert!((utility - (0.75 * 0.9 + 0.25 * 1.0)).abs() < 1e-12);
    }

    #[test]
    fn utility_errors_on_incomplete_bid() {
        let space = two_issue_space();
        let bid = Bid::from_iter([(1, Value::Discrete("red".to_string()))]);
        assert!(matches!(
            space.utility_of(&bid),
            Err(UtilityError::MissingValue(2))
        ));
    }

    #[test]
    fn utility_errors_on_kind_mismatch() {
        let space = two_issue_space();
        let bid = Bid::from_iter([
            (1, Value::Integer(3)),
            (2, Value::Integer(10)),
        ]);
        assert!(matches!(
            space.utility_of(&bid),
            Err(UtilityError::KindMismatch(1))
        ));
    }

    #[test]
    fn random_bids_are_always_total_and_well_typed() {
        let space = two_issue_space();
        let mut rng = AgentRng::new(5);
        for _ in 0..200 {
            let bid = space.random_bid(&mut rng);
            assert!(bid.is_total_for(space.domain()));
        }
    }

    #[test]
    fn numeric_evaluation_peaks_at_ideal() {
        let space = two_issue_space();
        let at_ideal = Bid::from_iter([
            (1, Value::Discrete("blue".to_string())),
            (2, Value::Integer(10)),
        ]);
        let far = Bid::from_iter([
            (1, Value::Discrete("blue".to_string())),
            (2, Value::Integer(0)),
        ]);
        let near = space.utility_of(&at_ideal).expect("utility");
        let away = space.utility_of(&far).expect("utility");
        assert!(near > away);
    }
}
