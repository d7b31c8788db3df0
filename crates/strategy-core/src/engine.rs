//! Round-by-round decision engine.
//!
//! The engine runs a small state machine: the first two rounds are "cold"
//! (too little data, re-offer our best bid), after which every round
//! synthesizes a candidate and compares the standing offer against the
//! profile's acceptance rule. The public entry point never fails: internal
//! errors degrade to re-offering the best bid we know.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{Bid, IssueId, NegotiationAction, PartyId};

use crate::model::OpponentModel;
use crate::profile::{AcceptPolicy, StrategyProfile};
use crate::rng::AgentRng;
use crate::schedule::ConcessionSchedule;
use crate::space::{UtilityError, UtilitySpace};
use crate::synthesis::{BidSynthesizer, SynthesisError};

/// Rounds spent observing before the model is trusted.
pub const COLD_ROUNDS: u64 = 2;

#[derive(Debug)]
pub enum EngineError {
    Utility(UtilityError),
    Synthesis(SynthesisError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utility(err) => write!(f, "utility evaluation failed: {err}"),
            Self::Synthesis(err) => write!(f, "bid synthesis failed: {err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<UtilityError> for EngineError {
    fn from(value: UtilityError) -> Self {
        Self::Utility(value)
    }
}

impl From<SynthesisError> for EngineError {
    fn from(value: SynthesisError) -> Self {
        Self::Synthesis(value)
    }
}

/// Why the engine chose what it chose, recorded every round for the
/// harness and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTrace {
    pub round: u64,
    pub willingness: f64,
    pub wheel_spins: u32,
    pub candidate_utility: f64,
    pub standing_utility: f64,
    pub accepted: bool,
    pub fell_back: bool,
}

pub struct DecisionEngine {
    id: PartyId,
    profile: StrategyProfile,
    schedule: ConcessionSchedule,
    model: OpponentModel,
    rng: AgentRng,
    round: u64,
    max_bid: Option<Bid>,
    weights: BTreeMap<IssueId, f64>,
    last_trace: Option<DecisionTrace>,
}

impl DecisionEngine {
    pub fn new(id: PartyId, profile: StrategyProfile, seed: u64) -> Self {
        let mut rng = AgentRng::new(seed);
        let schedule = ConcessionSchedule::from_profile(&profile, &mut rng);
        let model = OpponentModel::new(profile.history_capacity);
        Self {
            id,
            profile,
            schedule,
            model,
            rng,
            round: 0,
            max_bid: None,
            weights: BTreeMap::new(),
            last_trace: None,
        }
    }

    pub fn id(&self) -> &PartyId {
        &self.id
    }

    pub fn display_name(&self) -> String {
        self.profile.display_name(&self.id)
    }

    pub fn model(&self) -> &OpponentModel {
        &self.model
    }

    pub fn last_trace(&self) -> Option<&DecisionTrace> {
        self.last_trace.as_ref()
    }

    /// Inbound action from any party. Our own emitted actions are routed
    /// back through here so our offers count toward the model too.
    pub fn receive(&mut self, sender: &PartyId, action: &NegotiationAction) {
        // Accept and EndNegotiation carry no new preference information.
        if let NegotiationAction::Offer { bid } = action {
            self.model.observe(sender, bid, self.round);
        }
    }

    /// Choose this round's action given the normalized session time.
    /// Infallible by design: any internal error degrades to re-offering
    /// the best bid available, so the party always stays in the running.
    pub fn choose_action(&mut self, space: &dyn UtilitySpace, time: f64) -> NegotiationAction {
        self.round += 1;
        let action = match self.decide(space, time) {
            Ok(action) => action,
            Err(_) => {
                self.last_trace = Some(DecisionTrace {
                    round: self.round,
                    willingness: 0.0,
                    wheel_spins: 0,
                    candidate_utility: 0.0,
                    standing_utility: 0.0,
                    accepted: false,
                    fell_back: true,
                });
                let bid = match &self.max_bid {
                    Some(bid) => bid.clone(),
                    None => space.random_bid(&mut self.rng),
                };
                NegotiationAction::Offer { bid }
            }
        };
        let own_id = self.id.clone();
        self.receive(&own_id, &action);
        action
    }

    fn decide(&mut self, space: &dyn UtilitySpace, time: f64) -> Result<NegotiationAction, EngineError> {
        let max_bid = self.ensure_initialized(space);
        // The schedule advances every round, cold ones included, so the
        // spike timer keeps its cadence.
        let willingness = self.schedule.willingness(time, &mut self.rng);

        if self.round <= COLD_ROUNDS {
            self.last_trace = Some(DecisionTrace {
                round: self.round,
                willingness,
                wheel_spins: 0,
                candidate_utility: 1.0,
                standing_utility: 0.0,
                accepted: false,
                fell_back: false,
            });
            return Ok(NegotiationAction::Offer { bid: max_bid });
        }

        let last = match self.model.latest_offer() {
            Some(record) => record.bid.clone(),
            None => space.random_bid(&mut self.rng),
        };
        let synthesis = BidSynthesizer::synthesize(
            &self.id,
            &max_bid,
            willingness,
            self.profile.issue_bias,
            &self.model,
            &self.weights,
            space,
            &mut self.rng,
        )?;
        let standing_utility = space.utility_of(&last).unwrap_or(0.0);
        let candidate_utility = space.utility_of(&synthesis.bid).unwrap_or(0.0);
        let threshold = match self.profile.accept_policy {
            AcceptPolicy::AbsoluteWillingness => willingness,
            AcceptPolicy::RelativeToOwnBid => candidate_utility,
        };
        let accepted = standing_utility >= threshold;
        self.last_trace = Some(DecisionTrace {
            round: self.round,
            willingness,
            wheel_spins: synthesis.wheel_spins,
            candidate_utility,
            standing_utility,
            accepted,
            fell_back: false,
        });
        Ok(if accepted {
            NegotiationAction::Accept { bid: last }
        } else {
            NegotiationAction::Offer { bid: synthesis.bid }
        })
    }

    /// Lazy first-round setup: cache the max-utility bid (random valid bid
    /// if the space cannot produce one), derive issue weights, optionally
    /// seed frequency priors, and seed our own best bid into the model.
    fn ensure_initialized(&mut self, space: &dyn UtilitySpace) -> Bid {
        if let Some(bid) = &self.max_bid {
            return bid.clone();
        }
        let max_bid = space
            .max_utility_bid()
            .unwrap_or_else(|_| space.random_bid(&mut self.rng));
        let issue_count = space.domain().len();
        for id in space.domain().ids() {
            let weight = space
                .issue_weight(id)
                .map(|weight| weight * issue_count as f64)
                .unwrap_or(1.0);
            self.weights.insert(id, weight);
        }
        if self.profile.seed_priors {
            self.model.seed_priors(space.domain(), space);
        }
        self.model.observe(&self.id, &max_bid, self.round);
        self.max_bid = Some(max_bid.clone());
        max_bid
    }
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("id", &self.id)
            .field("round", &self.round)
            .field("initialized", &self.max_bid.is_some())
            .finish()
    }
}
