//! Decision core for an alternating-offers negotiation party.
//!
//! Each round the engine either accepts the standing offer or synthesizes a
//! new bid, using only the session clock, an externally supplied utility
//! space, and the history of offers seen so far. The pieces compose bottom
//! up: a time-dependent concession schedule, an online opponent model, a
//! weighted-random ("roulette wheel") bid synthesizer, and the decision
//! engine that ties them together. Everything is deterministic under a
//! fixed seed.

pub mod engine;
pub mod model;
pub mod num;
pub mod profile;
pub mod rng;
pub mod schedule;
pub mod space;
pub mod synthesis;

pub use engine::{DecisionEngine, DecisionTrace, EngineError};
pub use model::OpponentModel;
pub use profile::{AcceptPolicy, StrategyProfile};
pub use rng::AgentRng;
pub use schedule::ConcessionSchedule;
pub use space::{LinearAdditiveSpace, UtilityError, UtilitySpace};
pub use synthesis::{BidSynthesizer, SynthesisError};
