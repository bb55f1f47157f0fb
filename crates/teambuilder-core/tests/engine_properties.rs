// Integration tests for the team formation engine.
//
// These run whole divisions through `build_teams` and check the properties
// every finished build must hold: each player placed exactly once, at most
// one sponsored player per team unless a relaxation was recorded, rosters
// within one player of each other, and identical output for identical seeds.

use std::collections::HashSet;

use teambuilder_core::distribution::{Distributor, Phase, SizeRules};
use teambuilder_core::error::{EngineError, Notice};
use teambuilder_core::model::{Coach, CoachRole, Player, Team};
use teambuilder_core::pairing::{pair_coaches, PairingOrigin};
use teambuilder_core::scoring::normalize_skill_scores;
use teambuilder_core::{build_teams, EngineConfig, TeamBuild};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Players with evaluations spread over 1..=9, a few sponsored.
fn division_players(n: usize) -> Vec<Player> {
    (0..n)
        .map(|i| {
            let p = Player::new(format!("P{i:03}"), format!("Player {i}"))
                .with_evaluation(format!("{}", (i * 7) % 9 + 1));
            if i % 11 == 3 {
                p.with_sponsor(format!("S{i}"))
            } else {
                p
            }
        })
        .collect()
}

fn head(id: &str, name: &str) -> Coach {
    Coach::new(id, name, CoachRole::Head)
}

fn assistant(id: &str, name: &str) -> Coach {
    Coach::new(id, name, CoachRole::Assistant)
}

/// Five heads, three assistants; one reciprocated pair and two coach-linked
/// players.
fn division_coaches() -> Vec<Coach> {
    vec![
        head("H1", "Alex Carter").with_pair_request("A1"),
        head("H2", "Blair Diaz").with_player("P004"),
        head("H3", "Casey Evans"),
        head("H4", "Drew Foster"),
        head("H5", "Emery Grant"),
        assistant("A1", "Finley Hayes").with_pair_request("H1"),
        assistant("A2", "Gray Ingram").with_player("P010"),
        assistant("A3", "Harper Jones"),
    ]
}

fn player_ids(build: &TeamBuild) -> Vec<Vec<String>> {
    build
        .teams
        .iter()
        .map(|t| t.players.iter().map(|p| p.player_id.clone()).collect())
        .collect()
}

fn relaxed_teams(build: &TeamBuild) -> HashSet<u32> {
    build
        .notices
        .iter()
        .filter_map(|n| match n {
            Notice::SponsorRuleRelaxed { team_id, .. } => Some(*team_id),
            _ => None,
        })
        .collect()
}

fn team_with<'a>(build: &'a TeamBuild, head_id: &str) -> &'a Team {
    build
        .teams
        .iter()
        .find(|t| t.head_coach.coach_id == head_id)
        .expect("team for head coach")
}

// ===========================================================================
// Invariants
// ===========================================================================

#[test]
fn every_player_is_placed_exactly_once() {
    let players = division_players(43);
    let expected: HashSet<String> = players.iter().map(|p| p.player_id.clone()).collect();
    let config = EngineConfig::new(9).with_seed(7);

    let build = build_teams(players, division_coaches(), &config).unwrap();

    let placed: Vec<String> = player_ids(&build).into_iter().flatten().collect();
    let unique: HashSet<String> = placed.iter().cloned().collect();
    assert_eq!(placed.len(), 43);
    assert_eq!(unique, expected);
    assert_eq!(build.stats.players, 43);
}

#[test]
fn sponsored_players_are_spread_unless_relaxed() {
    for seed in 0..20 {
        let config = EngineConfig::new(9).with_seed(seed);
        let build = build_teams(division_players(43), division_coaches(), &config).unwrap();
        let relaxed = relaxed_teams(&build);

        for team in &build.teams {
            if !relaxed.contains(&team.team_id) {
                assert!(team.sponsored_count() <= 1, "seed {seed}: team {} has {} sponsors", team.name, team.sponsored_count());
            }
        }
    }
}

#[test]
fn roster_sizes_stay_within_one() {
    for seed in 0..20 {
        let config = EngineConfig::new(9).with_seed(seed);
        let build = build_teams(division_players(43), division_coaches(), &config).unwrap();
        assert!(build.stats.size_spread() <= 1, "seed {seed}: spread {}", build.stats.size_spread());
        assert!(build.stats.smallest_team >= config.min_team_size);
    }
}

#[test]
fn higher_evaluation_never_scores_lower() {
    let config = EngineConfig::new(9).with_seed(1);
    let build = build_teams(division_players(43), division_coaches(), &config).unwrap();

    let mut scored: Vec<(f64, f64)> = build
        .teams
        .iter()
        .flat_map(|t| t.players.iter())
        .map(|p| (p.raw_evaluation.parse::<f64>().unwrap(), p.skill_score))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in scored.windows(2) {
        if pair[0].0 < pair[1].0 {
            assert!(pair[0].1 < pair[1].1);
        } else {
            assert!((pair[0].1 - pair[1].1).abs() < 1e-9);
        }
    }
}

#[test]
fn reciprocated_coaches_share_a_team() {
    let config = EngineConfig::new(9).with_seed(3);
    let build = build_teams(division_players(43), division_coaches(), &config).unwrap();

    let team = team_with(&build, "H1");
    assert_eq!(team.assistant_coach.as_ref().map(|a| a.coach_id.as_str()), Some("A1"));
    assert_eq!(team.name, "Carter/Hayes");
    assert_eq!(team.team_id, 1);
}

#[test]
fn coach_linked_players_stay_with_their_coach() {
    let config = EngineConfig::new(9).with_seed(3);
    let build = build_teams(division_players(43), division_coaches(), &config).unwrap();

    assert!(team_with(&build, "H2").has_player("P004"));
    let with_a2 = build
        .teams
        .iter()
        .find(|t| t.assistant_coach.as_ref().is_some_and(|a| a.coach_id == "A2"))
        .unwrap();
    assert!(with_a2.has_player("P010"));
}

#[test]
fn same_seed_same_teams() {
    let config = EngineConfig::new(9).with_seed(42);
    let first = build_teams(division_players(43), division_coaches(), &config).unwrap();
    let second = build_teams(division_players(43), division_coaches(), &config).unwrap();

    assert_eq!(player_ids(&first), player_ids(&second));
    let names = |b: &TeamBuild| b.teams.iter().map(|t| t.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&first), names(&second));
    assert_eq!(first.stats, second.stats);
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn equal_players_split_evenly_between_two_solo_heads() {
    let players: Vec<Player> = (0..20)
        .map(|i| Player::new(format!("P{i}"), format!("Kid {i}")).with_evaluation("3"))
        .collect();
    let coaches = vec![head("H1", "Pat Quinn"), head("H2", "Sam Reyes")];
    let config = EngineConfig::new(7).with_min_team_size(5).with_seed(9);

    let build = build_teams(players, coaches, &config).unwrap();

    let sizes: Vec<usize> = build.teams.iter().map(Team::player_count).collect();
    assert_eq!(sizes, vec![10, 10]);
    for team in &build.teams {
        assert!((team.total_score - 500.0).abs() < 1e-9);
        assert!(team.assistant_coach.is_none());
    }
    assert!(build.stats.total_score.stdev.abs() < 1e-9);
}

/// Twenty kids rated 20 down to 1 and one sponsored kid rated 10.5, so the
/// sponsored pick comes mid-pack after totals have built up.
fn mid_pack_sponsor_division() -> Vec<Player> {
    let mut players: Vec<Player> = (0..20)
        .map(|i| Player::new(format!("P{i}"), format!("Kid {i}")).with_evaluation(format!("{}", 20 - i)))
        .collect();
    players.push(Player::new("S1", "Sponsored Kid").with_evaluation("10.5").with_sponsor("ACME"));
    players
}

#[test]
fn lone_sponsored_player_joins_a_lowest_total_team() {
    let mut players = mid_pack_sponsor_division();
    normalize_skill_scores(&mut players);
    players.sort_by(|a, b| b.skill_score.total_cmp(&a.skill_score));

    let mut teams: Vec<Team> = (1..=4)
        .map(|i| Team::new(i, head(&format!("H{i}"), &format!("Coach Num{i}")), None))
        .collect();
    let rules = SizeRules {
        min_team_size: 3,
        max_team_size: None,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut distributor = Distributor::new(&mut teams, rules, &mut rng);

    let mut sponsored_placed = false;
    for player in players {
        if !player.is_sponsored() {
            distributor.assign(player).unwrap();
            continue;
        }

        let totals: Vec<f64> = distributor.teams().iter().map(|t| t.total_score).collect();
        let sizes: Vec<usize> = distributor.teams().iter().map(Team::player_count).collect();
        let smallest = sizes.iter().copied().min().unwrap();
        let eligible: Vec<usize> = (0..sizes.len())
            .filter(|&i| match distributor.phase() {
                Phase::FillingMinimum => sizes[i] < rules.min_team_size,
                Phase::Balancing => sizes[i] == smallest,
            })
            .collect();
        let lowest = eligible
            .iter()
            .map(|&i| totals[i])
            .fold(f64::INFINITY, f64::min);
        assert!(totals.iter().any(|&t| t > 0.0), "totals should have built up");

        let idx = distributor.assign(player).unwrap();
        assert!(eligible.contains(&idx));
        assert!(
            (totals[idx] - lowest).abs() < 1e-9,
            "sponsored kid went to a team totalling {} while {} was available",
            totals[idx],
            lowest
        );
        sponsored_placed = true;
    }
    assert!(sponsored_placed);
    assert!(distributor.into_notices().is_empty());

    let config = EngineConfig::new(6).with_seed(4);
    let coaches: Vec<Coach> = (1..=4).map(|i| head(&format!("H{i}"), &format!("Coach Num{i}"))).collect();
    let build = build_teams(mid_pack_sponsor_division(), coaches, &config).unwrap();
    let holder = build.teams.iter().find(|t| t.has_player("S1")).unwrap();
    assert_eq!(holder.sponsor_id.as_deref(), Some("ACME"));
    assert!(relaxed_teams(&build).is_empty());
    assert_eq!(build.stats.players, 21);
}

#[test]
fn head_with_child_gets_the_assistant_without_one() {
    let coaches = vec![
        head("H1", "Jo Adams"),
        head("H2", "Lee Brooks"),
        head("H3", "Max Cole").with_player("X1"),
        assistant("A1", "Ray Dunn"),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let outcome = pair_coaches(coaches, &mut rng);

    let seed = outcome.seeds.iter().find(|s| s.head.coach_id == "H3").unwrap();
    assert_eq!(seed.assistant.as_ref().map(|a| a.coach_id.as_str()), Some("A1"));
    assert_eq!(seed.origin, PairingOrigin::Complementary);
    let solo = outcome
        .seeds
        .iter()
        .filter(|s| s.origin == PairingOrigin::Solo)
        .count();
    assert_eq!(solo, 2);
    assert!(outcome.unplaced_assistants.is_empty());
}

#[test]
fn extreme_evaluations_build_without_panicking() {
    for raws in [["-1e308", "1e308", "0"], ["-1e308", "1e308", "1e308"]] {
        let players: Vec<Player> = raws
            .iter()
            .enumerate()
            .map(|(i, raw)| Player::new(format!("P{i}"), format!("Kid {i}")).with_evaluation(*raw))
            .collect();
        let config = EngineConfig::new(3).with_min_team_size(1).with_seed(9);

        let build = build_teams(players, vec![head("H1", "Jo Adams")], &config).unwrap();

        let team = &build.teams[0];
        assert_eq!(team.player_count(), 3);
        assert!(team.total_score.is_finite());
        assert!(team.players.iter().all(|p| (0.0..=100.0).contains(&p.skill_score)));
    }
}

#[test]
fn sibling_family_respects_roster_cap() {
    let players = vec![
        Player::new("P0", "Kit Reed").with_evaluation("5").with_family("Reed", "12 Main St"),
        Player::new("P1", "Lou Reed").with_evaluation("6").with_family("Reed", "12 Main St"),
        Player::new("P2", "Max Reed").with_evaluation("7").with_family("Reed", "12 Main St"),
        Player::new("P3", "Ned Shaw").with_evaluation("4"),
    ];
    let coaches = vec![head("H1", "Jo Reed").with_player("P0"), head("H2", "Lee Brooks")];
    let config = EngineConfig::new(2)
        .with_max_team_size(2)
        .with_siblings_together(true)
        .with_seed(3);

    let build = build_teams(players, coaches, &config).unwrap();

    assert!(build.teams.iter().all(|t| t.player_count() <= 2));
    let other = team_with(&build, "H2");
    assert!(other.has_player("P1") && other.has_player("P2"));
    assert!(build
        .notices
        .iter()
        .any(|n| matches!(n, Notice::SiblingsSeparated { .. })));
}

#[test]
fn extra_assistants_are_reported() {
    let players = division_players(10);
    let coaches = vec![
        head("H1", "Jo Adams"),
        assistant("A1", "Ray Dunn"),
        assistant("A2", "Kim Eld"),
    ];
    let config = EngineConfig::new(10).with_seed(5);

    let build = build_teams(players, coaches, &config).unwrap();

    assert_eq!(build.teams.len(), 1);
    assert_eq!(build.unplaced_assistants.len(), 1);
    assert!(build
        .notices
        .iter()
        .any(|n| matches!(n, Notice::UnplacedAssistant { .. })));
}

// ===========================================================================
// Failures
// ===========================================================================

#[test]
fn players_without_head_coaches_fail() {
    let err = build_teams(division_players(5), vec![assistant("A1", "Ray Dunn")], &EngineConfig::new(5)).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientCoaches { .. }));
    assert!(err.to_string().contains("0 head coach"));
}

#[test]
fn roster_cap_below_pool_fails() {
    let config = EngineConfig::new(8).with_max_team_size(8).with_seed(1);
    let err = build_teams(division_players(43), division_coaches(), &config).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientCoaches {
            head_coaches: 5,
            max_team_size: Some(8),
            ..
        }
    ));
}

#[test]
fn too_few_players_fail() {
    let config = EngineConfig::new(9).with_seed(1);
    let err = build_teams(division_players(12), division_coaches(), &config).unwrap_err();
    assert!(matches!(err, EngineError::ExhaustedCandidates { .. }));
}

// ===========================================================================
// Serialization
// ===========================================================================

#[test]
fn build_serializes_to_json() {
    let config = EngineConfig::new(9).with_seed(8);
    let build = build_teams(division_players(43), division_coaches(), &config).unwrap();

    let value = serde_json::to_value(&build).unwrap();
    assert_eq!(value["teams"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["stats"]["players"], 43);
    assert!(value.get("normalization").is_none());
    assert_eq!(value["teams"][0]["head_coach"]["coach_id"], "H1");
}
