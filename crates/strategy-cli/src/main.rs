use std::collections::BTreeMap;
use std::env;

use contracts::{Bid, Domain, Issue, NegotiationAction, PartyId, SessionConfig};
use strategy_core::space::Evaluator;
use strategy_core::{DecisionEngine, LinearAdditiveSpace, StrategyProfile, UtilitySpace};

fn print_usage() {
    println!("strategy-cli <command>");
    println!("commands:");
    println!("  simulate <seed> [rounds] [profile_a] [profile_b]");
    println!("    runs a deterministic two-party session on the demo domain");
    println!("    default rounds: 60, default profiles: balanced vs patient");
    println!("  profiles");
    println!("    prints every built-in profile as json");
}

fn parse_seed(value: Option<&String>) -> Result<u64, String> {
    let raw = value.ok_or_else(|| "missing seed".to_string())?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid seed: {raw}"))
}

fn parse_rounds(value: Option<&String>) -> Result<u64, String> {
    value
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| format!("invalid rounds: {raw}"))
        })
        .transpose()
        .map(|rounds| rounds.unwrap_or(60).max(1))
}

fn parse_profile(value: Option<&String>, fallback: StrategyProfile) -> Result<StrategyProfile, String> {
    match value.map(String::as_str) {
        None => Ok(fallback),
        Some("balanced") => Ok(StrategyProfile::balanced()),
        Some("patient") => Ok(StrategyProfile::patient()),
        Some("eager") => Ok(StrategyProfile::eager()),
        Some("stonewall") => Ok(StrategyProfile::stonewall()),
        Some(other) => Err(format!("unknown profile: {other}")),
    }
}

/// A small laptop-purchase domain: one discrete issue per side to fight
/// over, one shared price issue to meet in the middle on.
fn demo_domain() -> Domain {
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
        (
            2,
            Issue::Discrete {
                options: vec!["pickup".to_string(), "courier".to_string()],
            },
        ),
        (3, Issue::Integer { min: 400, max: 1200 }),
    ]))
}

fn buyer_space(domain: Domain) -> LinearAdditiveSpace {
    LinearAdditiveSpace::new(
        domain,
        BTreeMap::from([(1, 2.0), (2, 1.0), (3, 3.0)]),
        BTreeMap::from([
            (
                1,
                Evaluator::Discrete {
                    evaluations: BTreeMap::from([
                        ("standard".to_string(), 0.2),
                        ("extended".to_string(), 0.7),
                        ("premium".to_string(), 1.0),
                    ]),
                },
            ),
            (
                2,
                Evaluator::Discrete {
                    evaluations: BTreeMap::from([
                        ("pickup".to_string(), 0.3),
                        ("courier".to_string(), 1.0),
                    ]),
                },
            ),
            (3, Evaluator::Integer { ideal: 400 }),
        ]),
    )
}

fn seller_space(domain: Domain) -> LinearAdditiveSpace {
    LinearAdditiveSpace::new(
        domain,
        BTreeMap::from([(1, 1.0), (2, 1.0), (3, 4.0)]),
        BTreeMap::from([
            (
                1,
                Evaluator::Discrete {
                    evaluations: BTreeMap::from([
                        ("standard".to_string(), 1.0),
                        ("extended".to_string(), 0.6),
                        ("premium".to_string(), 0.2),
                    ]),
                },
            ),
            (
                2,
                Evaluator::Discrete {
                    evaluations: BTreeMap::from([
                        ("pickup".to_string(), 1.0),
                        ("courier".to_string(), 0.4),
                    ]),
                },
            ),
            (3, Evaluator::Integer { ideal: 1200 }),
        ]),
    )
}

fn report_agreement(bid: &Bid, buyer: &LinearAdditiveSpace, seller: &LinearAdditiveSpace) {
    let for_buyer = buyer.utility_of(bid).unwrap_or(0.0);
    let for_seller = seller.utility_of(bid).unwrap_or(0.0);
    println!("agreement: {bid}");
    println!("  buyer utility:  {for_buyer:.3}");
    println!("  seller utility: {for_seller:.3}");
}

fn run_session(args: &[String]) -> Result<(), String> {
    let seed = parse_seed(args.get(2))?;
    let max_rounds = parse_rounds(args.get(3))?;
    let profile_a = parse_profile(args.get(4), StrategyProfile::balanced())?;
    let profile_b = parse_profile(args.get(5), StrategyProfile::patient())?;

    let config = SessionConfig {
        seed,
        max_rounds,
        ..SessionConfig::default()
    };
    let domain = demo_domain();
    let buyer = buyer_space(domain.clone());
    let seller = seller_space(domain);

    let buyer_id = PartyId::new("party_1");
    let seller_id = PartyId::new("party_2");
    // Each party gets its own stream derived from the session seed.
    let mut party_a = DecisionEngine::new(buyer_id.clone(), profile_a, config.seed);
    let mut party_b = DecisionEngine::new(seller_id.clone(), profile_b, config.seed.wrapping_add(1));

    println!(
        "session seed={} rounds={} {} vs {}",
        config.seed,
        config.max_rounds,
        party_a.display_name(),
        party_b.display_name()
    );

    for round in 1..=config.max_rounds {
        let time = config.normalized_time(round);

        let action = party_a.choose_action(&buyer, time);
        println!("round {round:>3} {}: {}", buyer_id, action);
        if let NegotiationAction::Accept { bid } = &action {
            report_agreement(bid, &buyer, &seller);
            return Ok(());
        }
        party_b.receive(&buyer_id, &action);

        let action = party_b.choose_action(&seller, time);
        println!("round {round:>3} {}: {}", seller_id, action);
        if let NegotiationAction::Accept { bid } = &action {
            report_agreement(bid, &buyer, &seller);
            return Ok(());
        }
        party_a.receive(&seller_id, &action);
    }

    println!("no agreement after {} rounds", config.max_rounds);
    Ok(())
}

fn print_profiles() -> Result<(), String> {
    let presets = [
        ("balanced", StrategyProfile::balanced()),
        ("patient", StrategyProfile::patient()),
        ("eager", StrategyProfile::eager()),
        ("stonewall", StrategyProfile::stonewall()),
    ];
    for (name, profile) in presets {
        let json = serde_json::to_string_pretty(&profile)
            .map_err(|err| format!("failed to serialize profile {name}: {err}"))?;
        println!("{name}:");
        println!("{json}");
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("simulate") => {
            if let Err(err) = run_session(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        Some("profiles") => {
            if let Err(err) = print_profiles() {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        Some(other) => {
            eprintln!("error: unknown command: {other}");
            print_usage();
            std::process::exit(2);
        }
        None => {
            print_usage();
        }
    }
}
