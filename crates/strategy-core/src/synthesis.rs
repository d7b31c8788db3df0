//! Weighted-random bid synthesis ("roulette wheel").
//!
//! Numeric issues move by direct interpolation between the observed
//! consensus and our own best value. Discrete issues are re-sampled through
//! a two-level weighted wheel until the whole bid's utility lands in a band
//! around the willingness target, with a hard iteration budget so a turn
//! never runs away. The two-level draw is O(issues + options), never an
//! enumeration of the joint bid space.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{Bid, Issue, IssueId, PartyId, Value};

use crate::model::OpponentModel;
use crate::num::{lerp, within};
use crate::rng::AgentRng;
use crate::space::UtilitySpace;

/// Half-width of the utility band the convergence loop targets.
const TARGET_BAND: f64 = 0.1;
/// Evaluation used for options the preference model cannot score.
const DEFAULT_EVALUATION: f64 = 0.5;

#[derive(Debug)]
pub enum SynthesisError {
    EmptyDomain,
    /// Our own best bid has no value for a domain issue.
    MissingValue(IssueId),
    /// A bid value's kind does not match its issue.
    KindMismatch(IssueId),
}

impl fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDomain => write!(f, "cannot synthesize a bid for an empty domain"),
            Self::MissingValue(id) => write!(f, "own best bid is missing issue {id}"),
            Self::KindMismatch(id) => write!(f, "own best bid has the wrong kind for issue {id}"),
        }
    }
}

impl std::error::Error for SynthesisError {}

/// A synthesized candidate plus how many wheel spins it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub bid: Bid,
    pub wheel_spins: u32,
}

// ---------------------------------------------------------------------------
// Wheel structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct WheelSlot {
    score: f64,
    option: String,
}

/// Per-issue wheel: every option of one discrete issue with its fitness
/// score, plus the running max and total.
#[derive(Debug, Clone)]
struct InnerWheel {
    issue: IssueId,
    max: f64,
    total: f64,
    slots: Vec<WheelSlot>,
}

impl InnerWheel {
    fn new(issue: IssueId) -> Self {
        Self {
            issue,
            max: 0.0,
            total: 0.0,
            slots: Vec::new(),
        }
    }

    fn add_slot(&mut self, score: f64, option: String) {
        self.max = self.max.max(score);
        self.total += score;
        self.slots.push(WheelSlot { score, option });
    }
}

/// Outer wheel over all discrete issues: tracks the largest per-issue total
/// and the sum of all totals.
#[derive(Debug, Clone, Default)]
struct RouletteWheel {
    max: f64,
    total: f64,
    wheels: Vec<InnerWheel>,
}

impl RouletteWheel {
    fn add(&mut self, wheel: InnerWheel) {
        self.max = self.max.max(wheel.total);
        self.total += wheel.total;
        self.wheels.push(wheel);
    }

    fn is_empty(&self) -> bool {
        self.wheels.is_empty()
    }

    /// One two-level draw: pick an issue, then pick an option within it.
    /// The issue walk subtracts `global_max * bias - issue_max`, so at
    /// `bias = 1` the heaviest issue can never be selected for change.
    fn spin(&self, issue_bias: f64, rng: &mut AgentRng) -> Option<(IssueId, &str)> {
        let mut outer = rng.roll(self.total);
        for wheel in &self.wheels {
            outer -= self.max * issue_bias - wheel.max;
            if outer <= 0.0 {
                let mut inner = rng.roll(wheel.total);
                for slot in &wheel.slots {
                    inner -= slot.score;
                    if inner <= 0.0 {
                        return Some((wheel.issue, &slot.option));
                    }
                }
                return None;
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct BidSynthesizer;

impl BidSynthesizer {
    /// Produce one candidate bid for the given willingness target.
    ///
    /// `max_bid` is this party's own best bid; `weights` are the derived
    /// per-issue weights (1.0 where unknown). The result is always total
    /// and well-typed for the space's domain.
    #[allow(clippy::too_many_arguments)]
    pub fn synthesize(
        own_id: &PartyId,
        max_bid: &Bid,
        willingness: f64,
        issue_bias: f64,
        model: &OpponentModel,
        weights: &BTreeMap<IssueId, f64>,
        space: &dyn UtilitySpace,
        rng: &mut AgentRng,
    ) -> Result<Synthesis, SynthesisError> {
        let domain = space.domain();
        if domain.is_empty() {
            return Err(SynthesisError::EmptyDomain);
        }
        let issue_count = domain.len();
        let mut proposal = max_bid.clone();
        let mut wheel = RouletteWheel::default();

        for (id, issue) in domain.iter() {
            let own = max_bid.value(*id).ok_or(SynthesisError::MissingValue(*id))?;
            let weight = weights.get(id).copied().unwrap_or(1.0);

            match issue {
                Issue::Discrete { options } => {
                    // The wheel only makes sense when options can be scored
                    // individually; otherwise the own-best value stands.
                    if !space.is_additive() {
                        continue;
                    }
                    let mut inner = InnerWheel::new(*id);
                    for option in options {
                        let evaluation = space
                            .evaluation_of(*id, option)
                            .unwrap_or(DEFAULT_EVALUATION);
                        let frequency = model.frequency(*id, option, issue_count);
                        inner.add_slot(evaluation * frequency * weight, option.clone());
                    }
                    wheel.add(inner);
                }
                Issue::Integer { min, max } => {
                    let own = match own {
                        Value::Integer(value) => *value as f64,
                        _ => return Err(SynthesisError::KindMismatch(*id)),
                    };
                    let anchor = Self::numeric_consensus(own_id, model, *id, issue.kind(), own);
                    let target = lerp(anchor, own, willingness.powf(weight));
                    proposal.set(*id, Value::Integer((target.round() as i64).clamp(*min, *max)));
                }
                Issue::Real { min, max } => {
                    let own = match own {
                        Value::Real(value) => *value,
                        _ => return Err(SynthesisError::KindMismatch(*id)),
                    };
                    let anchor = Self::numeric_consensus(own_id, model, *id, issue.kind(), own);
                    let target = lerp(anchor, own, willingness.powf(weight));
                    proposal.set(*id, Value::Real(target.clamp(*min, *max)));
                }
            }
        }

        let wheel_spins = if space.is_additive() && !wheel.is_empty() {
            Self::converge(&mut proposal, &wheel, willingness, issue_bias, issue_count, space, rng)
        } else {
            0
        };

        Ok(Synthesis {
            bid: proposal,
            wheel_spins,
        })
    }

    /// Re-spin discrete issues until the candidate's utility lands in
    /// `[willingness - 0.1, willingness + 0.1]`. Budget: `10 x issues`
    /// spins, extended to `20 x issues` while the candidate is still below
    /// the band. On exhaustion the last candidate stands; a utility failure
    /// on a candidate counts as utility 0 and the loop continues.
    fn converge(
        proposal: &mut Bid,
        wheel: &RouletteWheel,
        willingness: f64,
        issue_bias: f64,
        issue_count: usize,
        space: &dyn UtilitySpace,
        rng: &mut AgentRng,
    ) -> u32 {
        let soft_budget = 10 * issue_count as u32;
        let hard_budget = 20 * issue_count as u32;
        let mut spins = 0;
        loop {
            let utility = space.utility_of(proposal).unwrap_or(0.0);
            let in_band = within(utility, willingness - TARGET_BAND, willingness + TARGET_BAND);
            let below_band = utility <= willingness - TARGET_BAND;
            let keep_spinning =
                (spins < soft_budget && !in_band) || (spins < hard_budget && below_band);
            if !keep_spinning {
                return spins;
            }
            if let Some((issue, option)) = wheel.spin(issue_bias, rng) {
                proposal.set(issue, Value::Discrete(option.to_string()));
            }
            spins += 1;
        }
    }

    /// Concession anchor for a numeric issue: the known agent value closest
    /// to our own best, falling back to the arithmetic mean over every
    /// known agent (our own seeded entry included), or to our own value
    /// when nothing has been observed.
    fn numeric_consensus(
        own_id: &PartyId,
        model: &OpponentModel,
        issue: IssueId,
        kind: contracts::IssueKind,
        own: f64,
    ) -> f64 {
        let mut sum = 0.0;
        let mut count = 0u64;
        let mut others = Vec::new();
        for (party, record) in model.agents() {
            let Some(value) = record.bid.value(issue) else {
                continue;
            };
            let numeric = match (kind, value) {
                (contracts::IssueKind::Integer, Value::Integer(v)) => *v as f64,
                (contracts::IssueKind::Real, Value::Real(v)) => *v,
                _ => continue,
            };
            sum += numeric;
            count += 1;
            if party != own_id {
                others.push(numeric);
            }
        }
        if count == 0 {
            return own;
        }
        let mean = sum / count as f64;
        let mut best = mean;
        let mut best_distance = (mean - own).abs();
        for value in others {
            let distance = (value - own).abs();
            if distance < best_distance {
                best_distance = distance;
                best = value;
            }
        }
        best
    }
}
