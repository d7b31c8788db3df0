//! Strategy tuning profiles.
//!
//! The original lineup of agents differed only in a handful of constants and
//! one acceptance rule; a profile captures those knobs so a single engine
//! can play every variant.

use contracts::PartyId;
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_HISTORY_CAPACITY;

/// Which rule decides whether the standing offer is good enough.
///
/// The two rules are materially different policies (absolute target vs.
/// relative to our own candidate) and are never merged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AcceptPolicy {
    /// Accept when `utility(last) >= willingness`.
    AbsoluteWillingness,
    /// Accept when `utility(last) >= utility(candidate)`.
    RelativeToOwnBid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyProfile {
    /// Concession-curve shape constant; higher holds out longer.
    pub stubbornness: f64,
    /// Constant added to the concession curve.
    pub offset: f64,
    /// Width of the per-round uniform jitter; 0 disables.
    pub jitter: f64,
    /// Upper bound of the intermittent willingness spike; 0 disables.
    pub spike_magnitude: f64,
    /// Mean rounds between spikes; 0 disables the spike timer.
    pub spike_frequency: u32,
    /// Reservation floor: willingness never targets below this.
    pub minimum_utility: f64,
    /// Damps how strongly the heaviest issue resists the wheel. Keep >= 1:
    /// at exactly 1 the heaviest issue is never re-randomized.
    pub issue_bias: f64,
    pub accept_policy: AcceptPolicy,
    /// Preload discrete frequency counts from our own evaluations so the
    /// first synthesized offers already look informed.
    pub seed_priors: bool,
    pub history_capacity: usize,
}

impl StrategyProfile {
    /// The mainline profile: randomized schedule, strong wheel bias,
    /// absolute acceptance.
    pub fn balanced() -> Self {
        Self {
            stubbornness: 10_000.0,
            offset: 0.90,
            jitter: 0.1,
            spike_magnitude: 0.25,
            spike_frequency: 50,
            minimum_utility: 0.0,
            issue_bias: 1.5,
            accept_policy: AcceptPolicy::AbsoluteWillingness,
            seed_priors: false,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Tournament tuning: slower concession, a reservation floor, gentler
    /// wheel bias, and evaluation-seeded priors.
    pub fn patient() -> Self {
        Self {
            stubbornness: 13_000.0,
            minimum_utility: 0.4,
            issue_bias: 1.15,
            seed_priors: true,
            ..Self::balanced()
        }
    }

    /// Concedes early and accepts anything at least as good as its own next
    /// offer.
    pub fn eager() -> Self {
        Self {
            stubbornness: 5_000.0,
            offset: 1.0,
            jitter: 0.0,
            spike_magnitude: 0.0,
            spike_frequency: 0,
            issue_bias: 1.0,
            accept_policy: AcceptPolicy::RelativeToOwnBid,
            ..Self::balanced()
        }
    }

    /// Barely moves: a quiet schedule pinned to a 0.9 reservation floor.
    pub fn stonewall() -> Self {
        Self {
            offset: 0.95,
            jitter: 0.0,
            spike_magnitude: 0.0,
            spike_frequency: 0,
            minimum_utility: 0.9,
            ..Self::balanced()
        }
    }

    /// Human-readable name derived from the stubbornness tier and the
    /// session-assigned identity.
    pub fn display_name(&self, id: &PartyId) -> String {
        const DESCRIPTORS: [&str; 9] = [
            "Submissive",
            "Soft",
            "Kind",
            "Reasonable",
            "Determined",
            "Firm",
            "Tough",
            "Angry",
            "Mad",
        ];
        let tier = (self.stubbornness.max(1.0).log10() + 1.0)
            .round()
            .clamp(0.0, (DESCRIPTORS.len() - 1) as f64) as usize;
        format!("{} {}", DESCRIPTORS[tier], id)
    }
}

impl Default for StrategyProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_keep_issue_bias_at_least_one() {
        for profile in [
            StrategyProfile::balanced(),
            StrategyProfile::patient(),
            StrategyProfile::eager(),
            StrategyProfile::stonewall(),
        ] {
            assert!(profile.issue_bias >= 1.0);
        }
    }

    #[test]
    fn display_name_scales_with_stubbornness() {
        let id = PartyId::new("party_1");
        let soft = StrategyProfile {
            stubbornness: 10.0,
            ..StrategyProfile::balanced()
        };
        let hard = StrategyProfile {
            stubbornness: 1e12,
            ..StrategyProfile::balanced()
        };
        assert_eq!(soft.display_name(&id), "Kind party_1");
        assert_eq!(hard.display_name(&id), "Mad party_1");
        assert_eq!(
            StrategyProfile::balanced().display_name(&id),
            "Firm party_1"
        );
    }

    #[test]
    fn profile_round_trip_serialization() {
        let profile = StrategyProfile::patient();
        let serialized = serde_json::to_string(&profile).expect("serialize");
        let decoded: StrategyProfile = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(profile, decoded);
    }
}
