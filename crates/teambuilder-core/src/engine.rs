// Engine entry point: normalize, pair, seed, group siblings, distribute.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::distribution::{distribute, Distributor, SizeRules};
use crate::error::{EngineError, Notice};
use crate::model::{Coach, CoachRole, Player, Team};
use crate::pairing::pair_coaches;
use crate::scoring::{normalize_skill_scores, NormalizationSummary};
use crate::seeding::{seed_teams, PlayerPool};
use crate::siblings::family_groups;
use crate::stats::BalanceStats;

/// Upper bound for a derived minimum team size.
pub const DEFAULT_MIN_TEAM_SIZE: usize = 3;

/// Division-level settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target roster size for the division.
    pub team_size: usize,
    /// Every team is filled to this size before any team grows past it.
    pub min_team_size: usize,
    /// Hard roster cap, if the division has one.
    pub max_team_size: Option<usize>,
    /// Place registered siblings on the same team.
    pub keep_siblings_together: bool,
    /// Seed for every random tie-break. `None` draws from OS entropy.
    pub random_seed: Option<u64>,
}

impl EngineConfig {
    /// Settings for a target team size, with the minimum derived from it.
    pub fn new(team_size: usize) -> Self {
        EngineConfig {
            team_size,
            min_team_size: Self::derived_min_team_size(team_size),
            max_team_size: None,
            keep_siblings_together: false,
            random_seed: None,
        }
    }

    /// `team_size - 1`, capped at `DEFAULT_MIN_TEAM_SIZE` and floored at 1.
    pub fn derived_min_team_size(team_size: usize) -> usize {
        team_size.saturating_sub(1).clamp(1, DEFAULT_MIN_TEAM_SIZE)
    }

    pub fn with_min_team_size(mut self, min_team_size: usize) -> Self {
        self.min_team_size = min_team_size;
        self
    }

    pub fn with_max_team_size(mut self, max_team_size: usize) -> Self {
        self.max_team_size = Some(max_team_size);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_siblings_together(mut self, keep: bool) -> Self {
        self.keep_siblings_together = keep;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.team_size == 0 {
            return Err(EngineError::InvalidConfig {
                field: "team_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.min_team_size == 0 {
            return Err(EngineError::InvalidConfig {
                field: "min_team_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Some(max) = self.max_team_size {
            if max < self.min_team_size {
                return Err(EngineError::InvalidConfig {
                    field: "max_team_size".into(),
                    message: format!("must be at least min_team_size ({}), got {max}", self.min_team_size),
                });
            }
        }
        Ok(())
    }

    fn size_rules(&self) -> SizeRules {
        SizeRules {
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Serialize)]
pub struct TeamBuild {
    pub teams: Vec<Team>,
    pub stats: BalanceStats,
    pub notices: Vec<Notice>,
    pub unplaced_assistants: Vec<Coach>,
    #[serde(skip)]
    pub normalization: NormalizationSummary,
}

/// Build teams with the random source described by `config.random_seed`.
pub fn build_teams(players: Vec<Player>, coaches: Vec<Coach>, config: &EngineConfig) -> Result<TeamBuild, EngineError> {
    let mut rng = match config.random_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    build_teams_with_rng(players, coaches, config, &mut rng)
}

/// Build teams drawing every tie-break from `rng`.
///
/// Fails before touching any team when the division cannot be placed:
/// no head coaches, a roster cap too small for the pool, or too few players
/// to bring every team to the minimum size.
pub fn build_teams_with_rng<R: Rng>(
    mut players: Vec<Player>,
    coaches: Vec<Coach>,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<TeamBuild, EngineError> {
    config.validate()?;

    let (normalization, mut notices) = normalize_skill_scores(&mut players);

    let head_coaches = coaches.iter().filter(|c| c.role == CoachRole::Head).count();
    check_capacity(players.len(), head_coaches, config)?;

    let pairing = pair_coaches(coaches, rng);
    notices.extend(pairing.notices());

    let groups = if config.keep_siblings_together {
        family_groups(&players)
    } else {
        Vec::new()
    };

    let mut pool = PlayerPool::new(players);
    let seeding = seed_teams(pairing.seeds, &mut pool);
    notices.extend(seeding.notices);
    let mut teams = seeding.teams;

    if !groups.is_empty() {
        let mut distributor = Distributor::new(&mut teams, config.size_rules(), rng);
        for group in &groups {
            let anchor = group
                .iter()
                .find_map(|id| distributor.teams().iter().position(|t| t.has_player(id)));
            let members: Vec<Player> = group.iter().filter_map(|id| pool.take(id)).collect();
            if members.is_empty() {
                continue;
            }
            distributor.assign_group(members, anchor)?;
        }
        info!("placed {} sibling groups", groups.len());
        notices.extend(distributor.into_notices());
    }

    notices.extend(distribute(&mut teams, pool.into_remaining(), config.size_rules(), rng)?);

    // Coach-linked and sibling placements can stack players on a few teams
    // and starve the rest.
    if let Some(short) = teams.iter().find(|t| t.player_count() < config.min_team_size) {
        return Err(EngineError::ExhaustedCandidates {
            reason: format!(
                "team {} ended with {} players, below the minimum of {}",
                short.name,
                short.player_count(),
                config.min_team_size
            ),
        });
    }

    let stats = BalanceStats::from_teams(&teams);
    if stats.teams > 0 && stats.total_score.mean > 0.0 {
        info!(
            "{} teams, {} players; total skill mean {:.2}, std dev {:.2}",
            stats.teams, stats.players, stats.total_score.mean, stats.total_score.stdev
        );
    }
    if stats.largest_team > config.team_size {
        warn!(
            "largest team has {} players, above the target of {}",
            stats.largest_team, config.team_size
        );
    }

    Ok(TeamBuild {
        teams,
        stats,
        notices,
        unplaced_assistants: pairing.unplaced_assistants,
        normalization,
    })
}

fn check_capacity(players: usize, head_coaches: usize, config: &EngineConfig) -> Result<(), EngineError> {
    if players > 0 && head_coaches == 0 {
        return Err(EngineError::InsufficientCoaches {
            players,
            head_coaches,
            max_team_size: None,
        });
    }
    if let Some(max) = config.max_team_size {
        if head_coaches.saturating_mul(max) < players {
            return Err(EngineError::InsufficientCoaches {
                players,
                head_coaches,
                max_team_size: Some(max),
            });
        }
    }
    let needed = head_coaches.saturating_mul(config.min_team_size);
    if players < needed {
        return Err(EngineError::ExhaustedCandidates {
            reason: format!(
                "{players} players cannot give {head_coaches} teams at least {} each",
                config.min_team_size
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(format!("P{i}"), format!("Kid {i}")).with_evaluation(format!("{}", i * 10)))
            .collect()
    }

    fn heads(n: usize) -> Vec<Coach> {
        (0..n)
            .map(|i| Coach::new(format!("H{i}"), format!("Coach Number{i}"), CoachRole::Head))
            .collect()
    }

    #[test]
    fn derived_minimum() {
        assert_eq!(EngineConfig::derived_min_team_size(10), 3);
        assert_eq!(EngineConfig::derived_min_team_size(3), 2);
        assert_eq!(EngineConfig::derived_min_team_size(1), 1);
        assert_eq!(EngineConfig::derived_min_team_size(0), 1);
        assert_eq!(EngineConfig::new(7).min_team_size, 3);
    }

    #[test]
    fn validate_rejects_bad_sizes() {
        let err = EngineConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { ref field, .. } if field == "team_size"));

        let err = EngineConfig::new(8).with_min_team_size(0).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { ref field, .. } if field == "min_team_size"));

        let err = EngineConfig::new(8).with_max_team_size(2).validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { ref field, .. } if field == "max_team_size"));

        assert!(EngineConfig::new(8).with_max_team_size(9).validate().is_ok());
    }

    #[test]
    fn no_head_coaches_is_fatal() {
        let coaches = vec![Coach::new("A1", "Only Assistant", CoachRole::Assistant)];
        let err = build_teams(players(4), coaches, &EngineConfig::new(4).with_seed(1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientCoaches {
                players: 4,
                head_coaches: 0,
                ..
            }
        ));
    }

    #[test]
    fn roster_cap_too_small_is_fatal() {
        let config = EngineConfig::new(5).with_min_team_size(2).with_max_team_size(3);
        let err = build_teams(players(7), heads(2), &config.with_seed(1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientCoaches {
                max_team_size: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn too_few_players_for_minimum_is_fatal() {
        let config = EngineConfig::new(8).with_min_team_size(3).with_seed(1);
        let err = build_teams(players(5), heads(2), &config).unwrap_err();
        assert!(matches!(err, EngineError::ExhaustedCandidates { .. }));
    }

    #[test]
    fn stacked_seeds_that_starve_a_team_are_fatal() {
        let mut coaches = heads(3);
        coaches[0] = coaches[0].clone().with_player("P0").with_pair_request("A0");
        coaches.push(
            Coach::new("A0", "Helper Number0", CoachRole::Assistant)
                .with_player("P1")
                .with_pair_request("H0"),
        );
        let config = EngineConfig::new(2).with_min_team_size(1).with_seed(2);

        // H0 pairs with A0 and takes both players; one residual player
        // cannot cover two empty teams.
        let err = build_teams(players(3), coaches, &config).unwrap_err();
        assert!(matches!(err, EngineError::ExhaustedCandidates { .. }));
    }

    #[test]
    fn empty_division_builds_nothing() {
        let build = build_teams(Vec::new(), Vec::new(), &EngineConfig::new(8).with_seed(1)).unwrap();
        assert!(build.teams.is_empty());
        assert_eq!(build.stats.players, 0);
    }

    #[test]
    fn unseeded_run_still_places_everyone() {
        let build = build_teams(players(9), heads(3), &EngineConfig::new(3)).unwrap();
        assert_eq!(build.stats.players, 9);
        assert!(build.teams.iter().all(|t| t.player_count() == 3));
    }

    #[test]
    fn siblings_share_a_team_when_enabled() {
        let mut roster = players(8);
        roster[1] = roster[1].clone().with_family("Smith", "1 Elm St");
        roster[6] = roster[6].clone().with_family("Smith", "1 Elm St");
        let config = EngineConfig::new(4).with_min_team_size(2).with_seed(5).with_siblings_together(true);

        let build = build_teams(roster, heads(2), &config).unwrap();

        let team = build.teams.iter().find(|t| t.has_player("P1")).unwrap();
        assert!(team.has_player("P6"));
        assert_eq!(build.stats.players, 8);
    }

    #[test]
    fn siblings_follow_coach_linked_sibling() {
        let mut roster = players(6);
        roster[0] = roster[0].clone().with_family("Lee", "9 Oak Rd");
        roster[5] = roster[5].clone().with_family("Lee", "9 Oak Rd");
        let mut coaches = heads(2);
        coaches[1] = coaches[1].clone().with_player("P0");
        let config = EngineConfig::new(3).with_min_team_size(2).with_seed(11).with_siblings_together(true);

        let build = build_teams(roster, coaches, &config).unwrap();

        let team = build.teams.iter().find(|t| t.head_coach.coach_id == "H1").unwrap();
        assert!(team.has_player("P0"));
        assert!(team.has_player("P5"));
    }
}
