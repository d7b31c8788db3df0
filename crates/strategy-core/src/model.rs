//! Online model of every offer observed during a session.
//!
//! Three structures, all owned by one engine instance and mutated only on
//! `observe`: a bounded FIFO history of offer records, the latest offer per
//! party, and per-issue frequency counts for discrete options. Counters only
//! grow; the history is the single intentionally lossy piece of state.

use std::collections::{BTreeMap, VecDeque};

use contracts::{Bid, Domain, Issue, IssueId, OfferRecord, PartyId, Value};

use crate::space::UtilitySpace;

pub const DEFAULT_HISTORY_CAPACITY: usize = 250;

/// Time-ordered offers with FIFO eviction past capacity.
#[derive(Debug, Clone)]
pub struct OfferHistory {
    records: VecDeque<OfferRecord>,
    capacity: usize,
}

impl OfferHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: OfferRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn latest(&self) -> Option<&OfferRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OfferRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Observation counts for one discrete issue, plus the running total.
#[derive(Debug, Clone, Default)]
pub struct IssueFrequency {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl IssueFrequency {
    fn record(&mut self, option: &str) {
        *self.counts.entry(option.to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    fn seed(&mut self, option: &str, count: u64) {
        *self.counts.entry(option.to_string()).or_insert(0) += count;
        self.total += count;
    }

    pub fn count(&self, option: &str) -> Option<u64> {
        self.counts.get(option).copied()
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[derive(Debug, Clone)]
pub struct OpponentModel {
    history: OfferHistory,
    agents: BTreeMap<PartyId, OfferRecord>,
    frequencies: BTreeMap<IssueId, IssueFrequency>,
}

impl OpponentModel {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: OfferHistory::new(history_capacity),
            agents: BTreeMap::new(),
            frequencies: BTreeMap::new(),
        }
    }

    /// Record one incoming offer: append to history, overwrite the sender's
    /// latest entry, and count every discrete option in the bid. No
    /// deduplication: observing the same offer twice counts twice.
    pub fn observe(&mut self, sender: &PartyId, bid: &Bid, round: u64) {
        let record = OfferRecord {
            sender: sender.clone(),
            bid: bid.clone(),
            round,
        };
        for (id, value) in record.bid.iter() {
            if let Value::Discrete(option) = value {
                self.frequencies.entry(*id).or_default().record(option);
            }
        }
        self.agents.insert(sender.clone(), record.clone());
        self.history.push(record);
    }

    /// Preload discrete counts from the utility space's own evaluations
    /// (`ceil(10 * evaluation)` per option, 1 when unavailable) so early
    /// synthesized offers already reflect our preferences.
    pub fn seed_priors(&mut self, domain: &Domain, space: &dyn UtilitySpace) {
        for (id, issue) in domain.iter() {
            let Issue::Discrete { options } = issue else {
                continue;
            };
            let frequency = self.frequencies.entry(*id).or_default();
            for option in options {
                let count = match space.evaluation_of(*id, option) {
                    Some(evaluation) => (10.0 * evaluation).ceil() as u64,
                    None => 1,
                };
                frequency.seed(option, count);
            }
        }
    }

    /// Observed frequency of an option in `[0, 1]`, or the uniform prior
    /// `1 / issue_count` when the option has never been seen.
    pub fn frequency(&self, issue: IssueId, option: &str, issue_count: usize) -> f64 {
        let prior = 1.0 / issue_count.max(1) as f64;
        let Some(frequency) = self.frequencies.get(&issue) else {
            return prior;
        };
        match frequency.count(option) {
            Some(count) if frequency.total > 0 => count as f64 / frequency.total as f64,
            _ => prior,
        }
    }

    pub fn issue_frequency(&self, issue: IssueId) -> Option<&IssueFrequency> {
        self.frequencies.get(&issue)
    }

    pub fn latest_offer(&self) -> Option<&OfferRecord> {
        self.history.latest()
    }

    pub fn history(&self) -> &OfferHistory {
        &self.history
    }

    /// Latest offer per known party, in party-id order.
    pub fn agents(&self) -> impl Iterator<Item = (&PartyId, &OfferRecord)> {
        self.agents.iter()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}
