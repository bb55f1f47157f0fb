// Coach pairing: turn the coach pool into ordered (head, assistant) seeds.
//
// Order of operations:
// 1. Reciprocated requests (both coaches named each other).
// 2. Complementary fallback: heads without a child of their own take an
//    assistant who has one, and heads with a child take an assistant without.
// 3. Random fallback among whatever is left.
// 4. Remaining heads coach alone; remaining assistants are not placed.

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Notice;
use crate::model::{team_name, Coach, CoachRole};

/// How a seed's coaches came to be paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PairingOrigin {
    /// Head and assistant each requested the other.
    Reciprocated,
    /// Fallback pairing of a coach with a child and a coach without.
    Complementary,
    /// Fallback pairing with no associated-player preference left to apply.
    Random,
    /// No assistant was available.
    Solo,
}

/// One future team: a head coach and at most one assistant.
#[derive(Debug, Clone)]
pub struct CoachSeed {
    pub head: Coach,
    pub assistant: Option<Coach>,
    pub origin: PairingOrigin,
}

impl CoachSeed {
    pub fn team_name(&self) -> String {
        team_name(&self.head, self.assistant.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct PairingOutcome {
    /// Every head coach exactly once, in emission order.
    pub seeds: Vec<CoachSeed>,
    /// Assistants left over once the heads ran out.
    pub unplaced_assistants: Vec<Coach>,
}

impl PairingOutcome {
    pub fn notices(&self) -> Vec<Notice> {
        self.unplaced_assistants
            .iter()
            .map(|c| Notice::UnplacedAssistant {
                coach_id: c.coach_id.clone(),
                full_name: c.full_name.clone(),
            })
            .collect()
    }
}

/// Remove and return a uniformly chosen element, or `None` if `pool` is empty.
fn take_random<R: Rng>(pool: &mut Vec<usize>, rng: &mut R) -> Option<usize> {
    if pool.is_empty() {
        return None;
    }
    let i = rng.gen_range(0..pool.len());
    Some(pool.remove(i))
}

/// Pair the coach pool into team seeds.
///
/// Input order matters: reciprocated pairs are found by walking heads in
/// input order, so when two heads both reciprocate with the same assistant
/// (duplicate IDs) the first one wins and the other falls through to the
/// fallback passes. Fallback passes also walk heads in input order and pick
/// the assistant at random from the preferred group.
pub fn pair_coaches<R: Rng>(coaches: Vec<Coach>, rng: &mut R) -> PairingOutcome {
    let (heads, assistants): (Vec<Coach>, Vec<Coach>) =
        coaches.into_iter().partition(|c| c.role == CoachRole::Head);

    let mut head_taken = vec![false; heads.len()];
    let mut assistant_taken = vec![false; assistants.len()];
    let mut pairs: Vec<(usize, Option<usize>, PairingOrigin)> = Vec::new();

    // 1. Reciprocated requests.
    for (hi, head) in heads.iter().enumerate() {
        let Some(requested) = head.pair_request() else {
            continue;
        };
        let partner = (0..assistants.len()).find(|&ai| {
            !assistant_taken[ai]
                && assistants[ai].coach_id == requested
                && assistants[ai].pair_request() == Some(head.coach_id.as_str())
        });
        if let Some(ai) = partner {
            head_taken[hi] = true;
            assistant_taken[ai] = true;
            pairs.push((hi, Some(ai), PairingOrigin::Reciprocated));
        }
    }
    let reciprocated = pairs.len();

    // 2. Complementary fallback.
    let (mut with_player, mut without_player): (Vec<usize>, Vec<usize>) = (0..assistants.len())
        .filter(|&ai| !assistant_taken[ai])
        .partition(|&ai| assistants[ai].has_associated_player());

    for hi in 0..heads.len() {
        if head_taken[hi] || heads[hi].has_associated_player() {
            continue;
        }
        let Some(ai) = take_random(&mut with_player, rng) else {
            break;
        };
        head_taken[hi] = true;
        pairs.push((hi, Some(ai), PairingOrigin::Complementary));
    }
    for hi in 0..heads.len() {
        if head_taken[hi] || !heads[hi].has_associated_player() {
            continue;
        }
        let Some(ai) = take_random(&mut without_player, rng) else {
            break;
        };
        head_taken[hi] = true;
        pairs.push((hi, Some(ai), PairingOrigin::Complementary));
    }

    // 3. Random fallback over the rest, candidates kept in input order.
    let mut remaining: Vec<usize> = with_player.into_iter().chain(without_player).collect();
    remaining.sort_unstable();
    for hi in 0..heads.len() {
        if head_taken[hi] {
            continue;
        }
        let Some(ai) = take_random(&mut remaining, rng) else {
            break;
        };
        head_taken[hi] = true;
        pairs.push((hi, Some(ai), PairingOrigin::Random));
    }

    // 4. Solo heads.
    for hi in 0..heads.len() {
        if !head_taken[hi] {
            pairs.push((hi, None, PairingOrigin::Solo));
        }
    }

    // Move coaches out of the pools into their seeds.
    let mut heads: Vec<Option<Coach>> = heads.into_iter().map(Some).collect();
    let mut assistants: Vec<Option<Coach>> = assistants.into_iter().map(Some).collect();

    let seeds: Vec<CoachSeed> = pairs
        .into_iter()
        .filter_map(|(hi, ai, origin)| {
            let head = heads[hi].take()?;
            let assistant = ai.and_then(|ai| assistants[ai].take());
            Some(CoachSeed {
                head,
                assistant,
                origin,
            })
        })
        .collect();

    let unplaced_assistants: Vec<Coach> = remaining
        .into_iter()
        .filter_map(|ai| assistants[ai].take())
        .collect();

    for seed in &seeds {
        debug!("seed '{}' ({:?})", seed.team_name(), seed.origin);
    }
    for coach in &unplaced_assistants {
        warn!(
            "assistant coach {} ({}) left without a head coach",
            coach.full_name, coach.coach_id
        );
    }
    info!(
        "paired coaches into {} teams ({} reciprocated, {} unplaced assistants)",
        seeds.len(),
        reciprocated,
        unplaced_assistants.len()
    );

    PairingOutcome {
        seeds,
        unplaced_assistants,
    }
}
