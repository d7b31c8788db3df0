//! Cross-boundary contracts for the alternating-offers negotiation core.
//!
//! This crate holds the data types shared between the strategy core, the
//! session harness, and tests: issues, values, bids, offer records, the
//! actions a party can emit, and session configuration. Behavior lives in
//! `strategy-core`; everything here is plain data plus invariant checks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod serde_issue_map;
pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Stable integer id of a negotiable issue, owned by the domain.
pub type IssueId = u32;

// ---------------------------------------------------------------------------
// Party identity
// ---------------------------------------------------------------------------

/// Identity of a negotiating party, assigned by the session at construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartyId(pub String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Issues and the domain
// ---------------------------------------------------------------------------

/// Kind tag for an issue or a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Discrete,
    Integer,
    Real,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discrete => write!(f, "discrete"),
            Self::Integer => write!(f, "integer"),
            Self::Real => write!(f, "real"),
        }
    }
}

/// One negotiable issue. Discrete issues carry a finite ordered option set;
/// numeric issues carry an inclusive range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    Discrete { options: Vec<String> },
    Integer { min: i64, max: i64 },
    Real { min: f64, max: f64 },
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::Discrete { .. } => IssueKind::Discrete,
            Self::Integer { .. } => IssueKind::Integer,
            Self::Real { .. } => IssueKind::Real,
        }
    }
}

/// The full set of issues under negotiation. Supplied externally and
/// read-only to the strategy core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Domain {
    #[serde(with = "serde_issue_map")]
    issues: BTreeMap<IssueId, Issue>,
}

impl Domain {
    pub fn new(issues: BTreeMap<IssueId, Issue>) -> Self {
        Self { issues }
    }

    pub fn issue(&self, id: IssueId) -> Option<&Issue> {
        self.issues.get(&id)
    }

    /// Issues in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&IssueId, &Issue)> {
        self.issues.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = IssueId> + '_ {
        self.issues.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Values and bids
// ---------------------------------------------------------------------------

/// A concrete assignment for one issue. Compared by kind plus payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Discrete(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::Discrete(_) => IssueKind::Discrete,
            Self::Integer(_) => IssueKind::Integer,
            Self::Real(_) => IssueKind::Real,
        }
    }

    /// Whether this value is a legal assignment for the given issue:
    /// matching kind, option present in the set, or number inside the range.
    pub fn matches(&self, issue: &Issue) -> bool {
        match (self, issue) {
            (Self::Discrete(option), Issue::Discrete { options }) => {
                options.iter().any(|candidate| candidate == option)
            }
            (Self::Integer(value), Issue::Integer { min, max }) => value >= min && value <= max,
            (Self::Real(value), Issue::Real { min, max }) => value >= min && value <= max,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discrete(option) => write!(f, "{option}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
        }
    }
}

/// An assignment of exactly one value per issue. Order of insertion is
/// irrelevant; iteration is in ascending issue-id order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Bid {
    #[serde(with = "serde_issue_map")]
    values: BTreeMap<IssueId, Value>,
}

impl Bid {
    pub fn new(values: BTreeMap<IssueId, Value>) -> Self {
        Self { values }
    }

    pub fn value(&self, id: IssueId) -> Option<&Value> {
        self.values.get(&id)
    }

    /// Insert or replace the value for an issue.
    pub fn set(&mut self, id: IssueId, value: Value) {
        self.values.insert(id, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IssueId, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A bid is total for a domain when every issue has exactly one legal
    /// value and no value refers to an issue outside the domain.
    pub fn is_total_for(&self, domain: &Domain) -> bool {
        if self.values.len() != domain.len() {
            return false;
        }
        domain.iter().all(|(id, issue)| {
            self.values
                .get(id)
                .map(|value| value.matches(issue))
                .unwrap_or(false)
        })
    }
}

impl FromIterator<(IssueId, Value)> for Bid {
    fn from_iter<T: IntoIterator<Item = (IssueId, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (id, value)) in self.values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}={value}")?;
        }
        write!(f, "}}")
    }
}

// ---------------------------------------------------------------------------
// Offers and actions
// ---------------------------------------------------------------------------

/// One observed offer: who sent which bid in which round. Immutable once
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferRecord {
    pub sender: PartyId,
    pub bid: Bid,
    pub round: u64,
}

/// The action a party emits each turn. `EndNegotiation` is only ever
/// received by the strategy core, never emitted by it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NegotiationAction {
    Accept { bid: Bid },
    Offer { bid: Bid },
    EndNegotiation,
}

impl NegotiationAction {
    pub fn bid(&self) -> Option<&Bid> {
        match self {
            Self::Accept { bid } | Self::Offer { bid } => Some(bid),
            Self::EndNegotiation => None,
        }
    }
}

impl fmt::Display for NegotiationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept { bid } => write!(f, "accept {bid}"),
            Self::Offer { bid } => write!(f, "offer {bid}"),
            Self::EndNegotiation => write!(f, "end_negotiation"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session configuration
// ---------------------------------------------------------------------------

/// Per-session settings for the harness. All strategy tuning lives in
/// `strategy-core`'s profile type; this only covers the session envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub schema_version: String,
    pub session_id: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    pub max_rounds: u64,
}

impl SessionConfig {
    /// Normalized elapsed time for a 1-based round: 0 at start, 1 at the
    /// deadline.
    pub fn normalized_time(&self, round: u64) -> f64 {
        if self.max_rounds == 0 {
            return 1.0;
        }
        (round as f64 / self.max_rounds as f64).clamp(0.0, 1.0)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            session_id: "session_local_001".to_string(),
            seed: 1337,
            max_rounds: 60,
        }
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session_id={} seed={} max_rounds={}",
            self.session_id, self.seed, self.max_rounds
        )
    }
}
