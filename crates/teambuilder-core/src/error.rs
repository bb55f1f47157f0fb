// Fatal engine errors and the non-fatal notices collected during a run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Conditions that abort a run. Nothing is retried: a second attempt would
/// draw different random tie-breaks and silently change the output.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "insufficient coaches: {head_coaches} head coach(es) cannot place {players} player(s){}",
        cap_suffix(.max_team_size)
    )]
    InsufficientCoaches {
        players: usize,
        head_coaches: usize,
        max_team_size: Option<usize>,
    },

    #[error("no eligible team: {reason}")]
    ExhaustedCandidates { reason: String },

    #[error("invalid engine config field `{field}`: {message}")]
    InvalidConfig { field: String, message: String },
}

fn cap_suffix(max_team_size: &Option<usize>) -> String {
    match max_team_size {
        Some(max) => format!(" with at most {max} per team"),
        None => String::new(),
    }
}

/// Non-fatal conditions absorbed by a local fallback. Returned with the
/// finished teams so the caller can report them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The evaluation could not be parsed; the player received the pool mean.
    MalformedEvaluation { player_id: String, raw: String },
    /// A coach names a player who is not in this division.
    UnresolvedAssociation { coach_id: String, player_id: String },
    /// A coach's player was already attached to an earlier team.
    AssociationAlreadyClaimed {
        coach_id: String,
        player_id: String,
        team_id: u32,
    },
    /// An assistant coach left over after every head coach was paired.
    UnplacedAssistant { coach_id: String, full_name: String },
    /// A sponsored player joined a team that already had a sponsor.
    SponsorRuleRelaxed { player_id: String, team_id: u32 },
    /// The team holding a sibling was at the roster cap, so the rest of the
    /// family went to another team together.
    SiblingsSeparated {
        player_ids: Vec<String>,
        anchor_team_id: u32,
        team_id: u32,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MalformedEvaluation { player_id, raw } => {
                write!(f, "player {player_id}: unparseable evaluation '{raw}', using pool mean")
            }
            Notice::UnresolvedAssociation { coach_id, player_id } => {
                write!(f, "coach {coach_id}: associated player {player_id} not found")
            }
            Notice::AssociationAlreadyClaimed {
                coach_id,
                player_id,
                team_id,
            } => write!(
                f,
                "coach {coach_id}: associated player {player_id} already on team {team_id}"
            ),
            Notice::UnplacedAssistant { coach_id, full_name } => {
                write!(f, "assistant coach {full_name} ({coach_id}) has no head coach")
            }
            Notice::SponsorRuleRelaxed { player_id, team_id } => write!(
                f,
                "sponsored player {player_id} placed on team {team_id} which already has a sponsor"
            ),
            Notice::SiblingsSeparated {
                player_ids,
                anchor_team_id,
                team_id,
            } => write!(
                f,
                "team {anchor_team_id} is full; siblings {} placed on team {team_id}",
                player_ids.join(", ")
            ),
        }
    }
}
