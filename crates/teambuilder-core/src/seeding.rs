// Team seeding: one team per coach seed, carrying the coaches' own children.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::Notice;
use crate::model::{Player, Team};
use crate::pairing::CoachSeed;

// ---------------------------------------------------------------------------
// Player pool
// ---------------------------------------------------------------------------

/// Unassigned players, looked up by ID. Taking a player moves it out of the
/// pool, so a player can only ever be handed to one team.
#[derive(Debug, Clone)]
pub struct PlayerPool {
    slots: Vec<Option<Player>>,
    index: HashMap<String, usize>,
}

impl PlayerPool {
    pub fn new(players: Vec<Player>) -> Self {
        let mut index = HashMap::with_capacity(players.len());
        for (i, p) in players.iter().enumerate() {
            // First registration wins lookups for a duplicated ID.
            index.entry(p.player_id.clone()).or_insert(i);
        }
        PlayerPool {
            slots: players.into_iter().map(Some).collect(),
            index,
        }
    }

    /// Whether the ID belongs to any player in the division, assigned or not.
    pub fn is_known(&self, player_id: &str) -> bool {
        self.index.contains_key(player_id)
    }

    pub fn is_available(&self, player_id: &str) -> bool {
        self.index
            .get(player_id)
            .is_some_and(|&i| self.slots[i].is_some())
    }

    pub fn take(&mut self, player_id: &str) -> Option<Player> {
        let &i = self.index.get(player_id)?;
        self.slots[i].take()
    }

    pub fn get(&self, player_id: &str) -> Option<&Player> {
        let &i = self.index.get(player_id)?;
        self.slots[i].as_ref()
    }

    pub fn remaining(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Remaining players in registration order.
    pub fn into_remaining(self) -> Vec<Player> {
        self.slots.into_iter().flatten().collect()
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SeedingOutcome {
    pub teams: Vec<Team>,
    pub notices: Vec<Notice>,
}

/// Create one team per seed, numbered from 1 in seed order, and attach each
/// coach's associated player while it is still unassigned (head first, then
/// assistant; earlier seeds claim first).
///
/// A coach without a usable association contributes no player here. Those
/// slots are filled by the distribution pass, not by a random pick.
pub fn seed_teams(seeds: Vec<CoachSeed>, pool: &mut PlayerPool) -> SeedingOutcome {
    let mut teams = Vec::with_capacity(seeds.len());
    let mut notices = Vec::new();
    let mut claimed_by: HashMap<String, u32> = HashMap::new();

    for (i, seed) in seeds.into_iter().enumerate() {
        let team_id = i as u32 + 1;
        let mut team = Team::new(team_id, seed.head, seed.assistant);

        let wanted: Vec<(String, String)> = team
            .coaches()
            .filter_map(|c| {
                c.associated_player()
                    .map(|pid| (c.coach_id.clone(), pid.to_string()))
            })
            .collect();

        for (coach_id, player_id) in wanted {
            if let Some(player) = pool.take(&player_id) {
                if player.is_sponsored() && team.has_sponsor() {
                    notices.push(Notice::SponsorRuleRelaxed {
                        player_id: player_id.clone(),
                        team_id,
                    });
                }
                debug!("team {} seeded with {} via coach {}", team.name, player.name, coach_id);
                team.add_player(player);
                claimed_by.insert(player_id, team_id);
            } else if let Some(&owner) = claimed_by.get(&player_id) {
                notices.push(Notice::AssociationAlreadyClaimed {
                    coach_id,
                    player_id,
                    team_id: owner,
                });
            } else if !pool.is_known(&player_id) {
                notices.push(Notice::UnresolvedAssociation {
                    coach_id,
                    player_id,
                });
            }
        }

        teams.push(team);
    }

    let seeded: usize = teams.iter().map(Team::player_count).sum();
    info!(
        "seeded {} teams with {} coach-linked players ({} players unassigned)",
        teams.len(),
        seeded,
        pool.remaining()
    );

    SeedingOutcome { teams, notices }
}
