// Greedy distribution of unseeded players across teams.
//
// Players are processed from highest to lowest skill. Each goes to the
// eligible team with the lowest running total, then the fewest players, then
// a random pick among exact ties. Eligibility comes from two size phases and
// the one-sponsor-per-team rule:
//
//   FillingMinimum: only teams below the minimum size are eligible.
//   Balancing:      only teams at the current smallest size are eligible, so
//                   no team gets more than one player ahead of another.
//
// The phase moves FillingMinimum -> Balancing once, when every team reaches
// the minimum, and never moves back. The sponsor rule is the only constraint
// that is ever relaxed, and only when it would otherwise leave a player with
// nowhere to go.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Notice};
use crate::model::{Player, Team};

/// Totals closer than this are treated as tied.
pub const SCORE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FillingMinimum,
    Balancing,
}

/// Size limits applied while distributing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRules {
    pub min_team_size: usize,
    pub max_team_size: Option<usize>,
}

/// Assigns players to a fixed set of teams, one at a time.
pub struct Distributor<'a, R: Rng> {
    teams: &'a mut [Team],
    rules: SizeRules,
    phase: Phase,
    rng: &'a mut R,
    notices: Vec<Notice>,
}

impl<'a, R: Rng> Distributor<'a, R> {
    pub fn new(teams: &'a mut [Team], rules: SizeRules, rng: &'a mut R) -> Self {
        let mut distributor = Distributor {
            teams,
            rules,
            phase: Phase::FillingMinimum,
            rng,
            notices: Vec::new(),
        };
        distributor.refresh_phase();
        distributor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn teams(&self) -> &[Team] {
        self.teams
    }

    /// Place one player and return the index of the team that received it.
    pub fn assign(&mut self, player: Player) -> Result<usize, EngineError> {
        let sponsored = player.is_sponsored();
        let mut candidates = self.candidates(self.phase, sponsored, true, 1);
        let mut relaxed = false;
        if candidates.is_empty() && sponsored {
            candidates = self.candidates(self.phase, sponsored, false, 1);
            relaxed = !candidates.is_empty();
        }
        if candidates.is_empty() {
            return Err(EngineError::ExhaustedCandidates {
                reason: format!(
                    "player {} ({}) fits no team in phase {:?}",
                    player.name, player.player_id, self.phase
                ),
            });
        }

        let idx = self.choose(&candidates);
        if relaxed {
            warn!(
                "every eligible team already has a sponsor; placing sponsored player {} on {}",
                player.name, self.teams[idx].name
            );
            self.notices.push(Notice::SponsorRuleRelaxed {
                player_id: player.player_id.clone(),
                team_id: self.teams[idx].team_id,
            });
        }
        debug!(
            "{} ({:.2}) -> {} [{:?}]",
            player.name, player.skill_score, self.teams[idx].name, self.phase
        );
        self.teams[idx].add_player(player);
        self.refresh_phase();
        Ok(idx)
    }

    /// Place a family as one unit, on `anchor` when a sibling already has a
    /// team, otherwise on the best team by the usual comparator. Size phases
    /// are not applied to families; the maximum size and the sponsor rule
    /// are. An anchor team without room for the whole family is skipped and
    /// the family is placed by the comparator, with a `SiblingsSeparated`
    /// notice.
    pub fn assign_group(&mut self, members: Vec<Player>, anchor: Option<usize>) -> Result<usize, EngineError> {
        if members.is_empty() {
            return Err(EngineError::ExhaustedCandidates {
                reason: "empty family group".into(),
            });
        }
        let sponsored = members.iter().any(Player::is_sponsored);
        let size = members.len();

        let full_anchor = anchor.filter(|&idx| !self.has_room(idx, size));
        if let Some(idx) = full_anchor {
            warn!(
                "{} cannot take {} more players; placing the rest of the family elsewhere",
                self.teams[idx].name, size
            );
        }
        let anchor = anchor.filter(|_| full_anchor.is_none());

        let (idx, relaxed) = match anchor {
            Some(idx) => (idx, sponsored && self.teams[idx].has_sponsor()),
            None => {
                let mut candidates = self.candidates(Phase::Balancing, sponsored, true, size);
                let mut relaxed = false;
                if candidates.is_empty() && sponsored {
                    candidates = self.candidates(Phase::Balancing, sponsored, false, size);
                    relaxed = !candidates.is_empty();
                }
                if candidates.is_empty() {
                    return Err(EngineError::ExhaustedCandidates {
                        reason: format!("family of {size} fits no team"),
                    });
                }
                (self.choose(&candidates), relaxed)
            }
        };

        let team_id = self.teams[idx].team_id;
        if let Some(full) = full_anchor {
            self.notices.push(Notice::SiblingsSeparated {
                player_ids: members.iter().map(|m| m.player_id.clone()).collect(),
                anchor_team_id: self.teams[full].team_id,
                team_id,
            });
        }
        for member in members {
            if member.is_sponsored() && (relaxed || self.teams[idx].has_sponsor()) {
                self.notices.push(Notice::SponsorRuleRelaxed {
                    player_id: member.player_id.clone(),
                    team_id,
                });
            }
            debug!("{} -> {} (family)", member.name, self.teams[idx].name);
            self.teams[idx].add_player(member);
        }
        self.refresh_phase();
        Ok(idx)
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices
    }

    /// Indices of teams that may take `incoming` more players.
    ///
    /// Under `Balancing` for a single player only the smallest teams qualify.
    /// For a family (`incoming > 1`) the smallest-size cap is skipped and
    /// every team qualifies, subject to the maximum.
    fn candidates(&self, phase: Phase, sponsored: bool, honor_sponsor: bool, incoming: usize) -> Vec<usize> {
        let smallest = self.teams.iter().map(Team::player_count).min().unwrap_or(0);
        self.teams
            .iter()
            .enumerate()
            .filter(|(_, t)| match phase {
                Phase::FillingMinimum => t.player_count() < self.rules.min_team_size,
                Phase::Balancing => incoming > 1 || t.player_count() <= smallest,
            })
            .filter(|(i, _)| self.has_room(*i, incoming))
            .filter(|(_, t)| !(honor_sponsor && sponsored && t.has_sponsor()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether team `idx` stays within the roster cap after `incoming` more.
    fn has_room(&self, idx: usize, incoming: usize) -> bool {
        self.rules
            .max_team_size
            .map_or(true, |max| self.teams[idx].player_count() + incoming <= max)
    }

    /// Lowest total, then fewest players, then uniform random.
    ///
    /// `candidates` must be non-empty. Totals are ordered with `total_cmp`;
    /// if none compares within `SCORE_EPSILON` of the lowest (a NaN total),
    /// every candidate stays in the running.
    fn choose(&mut self, candidates: &[usize]) -> usize {
        let lowest = candidates
            .iter()
            .map(|&i| self.teams[i].total_score)
            .min_by(f64::total_cmp)
            .unwrap_or(0.0);
        let mut by_score: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| (self.teams[i].total_score - lowest).abs() <= SCORE_EPSILON)
            .collect();
        if by_score.is_empty() {
            by_score = candidates.to_vec();
        }
        let fewest = by_score
            .iter()
            .map(|&i| self.teams[i].player_count())
            .min()
            .unwrap_or(0);
        let tied: Vec<usize> = by_score
            .into_iter()
            .filter(|&i| self.teams[i].player_count() == fewest)
            .collect();

        match tied.len() {
            0 => candidates[0],
            1 => tied[0],
            n => tied[self.rng.gen_range(0..n)],
        }
    }

    fn refresh_phase(&mut self) {
        if self.phase == Phase::FillingMinimum
            && self
                .teams
                .iter()
                .all(|t| t.player_count() >= self.rules.min_team_size)
        {
            self.phase = Phase::Balancing;
            debug!("every team has at least {} players; balancing", self.rules.min_team_size);
        }
    }
}

/// Sort the residual pool by descending skill (ties keep registration order)
/// and assign every player.
pub fn distribute<R: Rng>(
    teams: &mut [Team],
    mut residual: Vec<Player>,
    rules: SizeRules,
    rng: &mut R,
) -> Result<Vec<Notice>, EngineError> {
    residual.sort_by(|a, b| b.skill_score.total_cmp(&a.skill_score));
    let count = residual.len();

    let mut distributor = Distributor::new(teams, rules, rng);
    for player in residual {
        distributor.assign(player)?;
    }
    info!("distributed {} players across {} teams", count, distributor.teams().len());
    Ok(distributor.into_notices())
}
