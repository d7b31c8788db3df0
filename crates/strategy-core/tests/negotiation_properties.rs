use std::collections::BTreeMap;

use contracts::{Bid, Domain, Issue, NegotiationAction, PartyId, SessionConfig, Value};
use proptest::prelude::*;
use strategy_core::space::Evaluator;
use strategy_core::{
    AgentRng, BidSynthesizer, ConcessionSchedule, DecisionEngine, LinearAdditiveSpace,
    OpponentModel, StrategyProfile, UtilitySpace,
};

fn two_sided_domain() -> Domain {
    Domain::new(BTreeMap::from([
        (
            1,
            Issue::Discrete {
                options: vec![
                    "standard".to_string(),
                    "extended".to_string(),
                    "premium".to_string(),
                ],
            },
        ),
        (2, Issue::Integer { min: 0, max: 100 }),
    ]))
}

fn side_space(low: f64, mid: f64, high: f64, ideal: i64) -> LinearAdditiveSpace {
    LinearAdditiveSpace::new(
        two_sided_domain(),
        BTreeMap::from([(1, 1.0), (2, 2.0)]),
        BTreeMap::from([
            (
                1,
                Evaluator::Discrete {
                    evaluations: BTreeMap::from([
                        ("standard".to_string(), low),
                        ("extended".to_string(), mid),
                        ("premium".to_string(), high),
                    ]),
                },
            ),
            (2, Evaluator::Integer { ideal }),
        ]),
    )
}

/// Full alternating-offers session between two engines, transcript included.
fn run_session(
    seed: u64,
    max_rounds: u64,
    profile_a: StrategyProfile,
    profile_b: StrategyProfile,
) -> Vec<(PartyId, NegotiationAction)> {
    let config = SessionConfig {
        seed,
        max_rounds,
        ..SessionConfig::default()
    };
    let space_a = side_space(0.2, 0.6, 1.0, 0);
    let space_b = side_space(1.0, 0.5, 0.1, 100);
    let id_a = PartyId::new("party_1");
    let id_b = PartyId::new("party_2");
    let mut party_a = DecisionEngine::new(id_a.clone(), profile_a, config.seed);
    let mut party_b = DecisionEngine::new(id_b.clone(), profile_b, config.seed.wrapping_add(1));

    let mut transcript = Vec::new();
    for round in 1..=config.max_rounds {
        let time = config.normalized_time(round);

        let action = party_a.choose_action(&space_a, time);
        let done = matches!(action, NegotiationAction::Accept { .. });
        party_b.receive(&id_a, &action);
        transcript.push((id_a.clone(), action));
        if done {
            return transcript;
        }

        let action = party_b.choose_action(&space_b, time);
        let done = matches!(action, NegotiationAction::Accept { .. });
        party_a.receive(&id_b, &action);
        transcript.push((id_b.clone(), action));
        if done {
            return transcript;
        }
    }
    transcript
}

#[test]
fn session_transcripts_replay_under_a_fixed_seed() {
    let first = run_session(
        1337,
        40,
        StrategyProfile::balanced(),
        StrategyProfile::patient(),
    );
    let second = run_session(
        1337,
        40,
        StrategyProfile::balanced(),
        StrategyProfile::patient(),
    );
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn different_seeds_produce_different_transcripts() {
    let first = run_session(
        1,
        40,
        StrategyProfile::balanced(),
        StrategyProfile::balanced(),
    );
    let second = run_session(
        2,
        40,
        StrategyProfile::balanced(),
        StrategyProfile::balanced(),
    );
    assert_ne!(first, second);
}

#[test]
fn every_offer_in_a_session_is_total_for_the_domain() {
    let domain = two_sided_domain();
    let transcript = run_session(
        99,
        40,
        StrategyProfile::balanced(),
        StrategyProfile::eager(),
    );
    for (_, action) in &transcript {
        let bid = action.bid().expect("offers and accepts carry bids");
        assert!(bid.is_total_for(&domain));
    }
}

#[test]
fn an_accept_only_ever_ends_the_transcript() {
    for seed in [3, 17, 1000] {
        let transcript = run_session(
            seed,
            60,
            StrategyProfile::eager(),
            StrategyProfile::eager(),
        );
        for (index, (_, action)) in transcript.iter().enumerate() {
            if matches!(action, NegotiationAction::Accept { .. }) {
                assert_eq!(index, transcript.len() - 1);
            }
        }
    }
}

#[test]
fn aligned_eager_parties_agree_right_after_the_cold_rounds() {
    // With identical preferences both sides open with the same max bid,
    // and nothing can score above it, so the relative rule accepts the
    // standing offer on the first warm round.
    let space = side_space(0.2, 0.6, 1.0, 0);
    let config = SessionConfig::default();
    let id_a = PartyId::new("party_1");
    let id_b = PartyId::new("party_2");
    let mut party_a = DecisionEngine::new(id_a.clone(), StrategyProfile::eager(), 7);
    let mut party_b = DecisionEngine::new(id_b.clone(), StrategyProfile::eager(), 8);

    let mut transcript = Vec::new();
    'session: for round in 1..=config.max_rounds {
        let time = config.normalized_time(round);
        let action = party_a.choose_action(&space, time);
        let done = matches!(action, NegotiationAction::Accept { .. });
        party_b.receive(&id_a, &action);
        transcript.push(action);
        if done {
            break 'session;
        }
        let action = party_b.choose_action(&space, time);
        let done = matches!(action, NegotiationAction::Accept { .. });
        party_a.receive(&id_b, &action);
        transcript.push(action);
        if done {
            break 'session;
        }
    }

    // Two cold rounds apiece, then party_1 accepts: five actions total.
    assert_eq!(transcript.len(), 5);
    let max_bid = space.max_utility_bid().expect("max bid");
    assert_eq!(
        transcript.last(),
        Some(&NegotiationAction::Accept { bid: max_bid })
    );
}

#[test]
fn stonewall_never_accepts_a_lowball_session() {
    // The stonewall floor sits at 0.9; the opposed space keeps every offer
    // the balanced side makes well under that, so party_2 never accepts.
    let transcript = run_session(
        11,
        30,
        StrategyProfile::balanced(),
        StrategyProfile::stonewall(),
    );
    let space_b = side_space(1.0, 0.5, 0.1, 100);
    for (sender, action) in &transcript {
        if sender == &PartyId::new("party_2") {
            if let NegotiationAction::Accept { bid } = action {
                let utility = space_b.utility_of(bid).expect("utility");
                assert!(utility >= 0.9, "accepted at {utility}");
            }
        }
    }
}

proptest! {
    #[test]
    fn willingness_is_bounded_for_any_schedule(
        stubbornness in 1.0..50_000.0f64,
        offset in 0.5..1.0f64,
        floor in 0.0..0.9f64,
        t in 0.0..2.0f64,
        seed in any::<u64>(),
    ) {
        let mut rng = AgentRng::new(seed);
        let mut schedule = ConcessionSchedule::new(stubbornness, offset)
            .with_jitter(0.1)
            .with_floor(floor)
            .with_spike(0.25, 50, &mut rng);
        let w = schedule.willingness(t, &mut rng);
        prop_assert!((0.0..=1.0).contains(&w));
        prop_assert!(w >= floor - 1e-12);
    }

    #[test]
    fn synthesis_is_total_over_random_domains(
        option_counts in prop::collection::vec(2usize..6, 1..4),
        willingness in 0.0..1.0f64,
        seed in any::<u64>(),
    ) {
        let mut rng = AgentRng::new(seed);
        let mut issues = BTreeMap::new();
        let mut evaluators = BTreeMap::new();
        let mut weights = BTreeMap::new();
        for (index, count) in option_counts.iter().enumerate() {
            let id = index as u32 + 1;
            let options: Vec<String> = (0..*count).map(|n| format!("opt{n}")).collect();
            let evaluations = options
                .iter()
                .map(|option| (option.clone(), rng.next_f64()))
                .collect();
            issues.insert(id, Issue::Discrete { options });
            evaluators.insert(id, Evaluator::Discrete { evaluations });
            weights.insert(id, 1.0 + rng.next_f64());
        }
        issues.insert(100, Issue::Integer { min: -50, max: 50 });
        evaluators.insert(100, Evaluator::Integer { ideal: 50 });
        weights.insert(100, 1.0);
        issues.insert(101, Issue::Real { min: 0.0, max: 10.0 });
        evaluators.insert(101, Evaluator::Real { ideal: 10.0 });
        weights.insert(101, 1.0);
        let domain = Domain::new(issues);
        let space = LinearAdditiveSpace::new(domain.clone(), weights, evaluators);

        let me = PartyId::new("me");
        let mut model = OpponentModel::new(32);
        let opponent_bid = space.random_bid(&mut rng);
        model.observe(&PartyId::new("them"), &opponent_bid, 1);
        let max_bid = space.max_utility_bid().expect("max bid");
        let issue_count = domain.len();
        let derived: BTreeMap<u32, f64> = domain
            .ids()
            .map(|id| {
                let weight = space
                    .issue_weight(id)
                    .map(|w| w * issue_count as f64)
                    .unwrap_or(1.0);
                (id, weight)
            })
            .collect();

        let synthesis = BidSynthesizer::synthesize(
            &me,
            &max_bid,
            willingness,
            1.5,
            &model,
            &derived,
            &space,
            &mut rng,
        )
        .expect("synthesis");
        prop_assert!(synthesis.bid.is_total_for(&domain));
        prop_assert!(synthesis.wheel_spins <= 20 * issue_count as u32);
    }

    #[test]
    fn observation_history_never_exceeds_capacity(
        capacity in 1usize..64,
        observations in 1u64..200,
    ) {
        let mut model = OpponentModel::new(capacity);
        let sender = PartyId::new("them");
        for round in 0..observations {
            let bid = Bid::from_iter([(1, Value::Integer(round as i64))]);
            model.observe(&sender, &bid, round);
        }
        prop_assert!(model.history().len() <= capacity);
        prop_assert_eq!(
            model.history().len(),
            (observations as usize).min(capacity)
        );
        let latest = model.latest_offer().expect("non-empty history");
        prop_assert_eq!(latest.round, observations - 1);
    }

    #[test]
    fn engine_actions_replay_for_any_seed(seed in any::<u64>()) {
        let space = side_space(0.2, 0.6, 1.0, 0);
        let run = || {
            let mut engine =
                DecisionEngine::new(PartyId::new("me"), StrategyProfile::balanced(), seed);
            (1..=8u64)
                .map(|round| engine.choose_action(&space, round as f64 / 8.0))
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(run(), run());
    }
}
