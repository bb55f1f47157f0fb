// Player, coach, and team records shared by every stage of the engine.

use serde::{Deserialize, Serialize};

/// Uniform size assumed when a registration leaves the field blank.
pub const DEFAULT_UNIFORM_SIZE: &str = "Youth M";

/// Prefix used by the registration system for unanswered questions.
const NO_ANSWER: &str = "no answer";

/// True when a free-text registration answer is blank or a "No Answer" marker.
pub fn is_unanswered(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.to_lowercase().starts_with(NO_ANSWER)
}

/// Trim an optional answer, mapping blanks and "No Answer" markers to `None`.
pub fn answered(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !is_unanswered(v))
        .map(|v| v.trim().to_string())
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A registered player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    /// Date of birth as registered (`MM/DD/YYYY`).
    pub date_of_birth: String,
    /// Age in years at the division's as-of date, one decimal place.
    pub age: Option<f64>,
    pub experience: u32,
    pub uniform_size: String,
    /// Evaluation exactly as registered. Not guaranteed to be numeric.
    pub raw_evaluation: String,
    /// Normalized skill, filled in by `scoring::normalize_skill_scores`.
    pub skill_score: f64,
    pub sponsor_id: Option<String>,
    pub parent_name: Option<String>,
    pub street_address: Option<String>,
}

impl Player {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        Player {
            player_id: player_id.into(),
            name: name.into(),
            date_of_birth: String::new(),
            age: None,
            experience: 0,
            uniform_size: DEFAULT_UNIFORM_SIZE.to_string(),
            raw_evaluation: String::new(),
            skill_score: 0.0,
            sponsor_id: None,
            parent_name: None,
            street_address: None,
        }
    }

    pub fn with_evaluation(mut self, raw: impl Into<String>) -> Self {
        self.raw_evaluation = raw.into();
        self
    }

    pub fn with_sponsor(mut self, sponsor_id: impl Into<String>) -> Self {
        self.sponsor_id = Some(sponsor_id.into());
        self
    }

    pub fn with_family(mut self, parent_name: impl Into<String>, street_address: impl Into<String>) -> Self {
        self.parent_name = Some(parent_name.into());
        self.street_address = Some(street_address.into());
        self
    }

    /// A player is sponsored when the sponsor field holds a non-blank value.
    pub fn is_sponsored(&self) -> bool {
        self.sponsor_id
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Coach
// ---------------------------------------------------------------------------

/// The two coaching roles that can seed a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoachRole {
    Head,
    Assistant,
}

impl CoachRole {
    /// Parse a "Team Personnel Role" value. Anything that is neither a head
    /// nor an assistant role yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("head") {
            Some(CoachRole::Head)
        } else if lower.contains("assistant") {
            Some(CoachRole::Assistant)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CoachRole::Head => "Head Coach",
            CoachRole::Assistant => "Assistant Coach",
        }
    }
}

/// A volunteer coach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coach {
    pub coach_id: String,
    pub full_name: String,
    pub role: CoachRole,
    /// The coach's own child, if registered in the same division.
    pub associated_player_id: Option<String>,
    /// Volunteer ID of the partner this coach asked to be paired with.
    pub pair_request_id: Option<String>,
    /// Passed through to the assignments export.
    pub volunteer_type_id: String,
}

impl Coach {
    pub fn new(coach_id: impl Into<String>, full_name: impl Into<String>, role: CoachRole) -> Self {
        Coach {
            coach_id: coach_id.into(),
            full_name: full_name.into(),
            role,
            associated_player_id: None,
            pair_request_id: None,
            volunteer_type_id: String::new(),
        }
    }

    pub fn with_player(mut self, player_id: impl Into<String>) -> Self {
        self.associated_player_id = Some(player_id.into());
        self
    }

    pub fn with_pair_request(mut self, coach_id: impl Into<String>) -> Self {
        self.pair_request_id = Some(coach_id.into());
        self
    }

    /// The associated player ID, ignoring blanks and "No Answer" markers.
    pub fn associated_player(&self) -> Option<&str> {
        self.associated_player_id
            .as_deref()
            .filter(|id| !is_unanswered(id))
            .map(str::trim)
    }

    pub fn has_associated_player(&self) -> bool {
        self.associated_player().is_some()
    }

    pub fn pair_request(&self) -> Option<&str> {
        self.pair_request_id
            .as_deref()
            .filter(|id| !is_unanswered(id))
            .map(str::trim)
    }

    /// Final whitespace-delimited token of the full name.
    pub fn last_name(&self) -> &str {
        self.full_name.split_whitespace().last().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team under construction, and the unit handed to the exporters.
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub team_id: u32,
    pub name: String,
    pub head_coach: Coach,
    pub assistant_coach: Option<Coach>,
    pub players: Vec<Player>,
    pub sponsor_id: Option<String>,
    /// Running sum of member skill scores.
    pub total_score: f64,
}

impl Team {
    pub fn new(team_id: u32, head_coach: Coach, assistant_coach: Option<Coach>) -> Self {
        let name = team_name(&head_coach, assistant_coach.as_ref());
        Team {
            team_id,
            name,
            head_coach,
            assistant_coach,
            players: Vec::new(),
            sponsor_id: None,
            total_score: 0.0,
        }
    }

    /// Append a player and update the running score and sponsor.
    ///
    /// The first sponsor seen on a team is kept if a second sponsored player
    /// is ever forced onto it.
    pub fn add_player(&mut self, player: Player) {
        self.total_score += player.skill_score;
        if player.is_sponsored() && self.sponsor_id.is_none() {
            self.sponsor_id = player.sponsor_id.as_ref().map(|s| s.trim().to_string());
        }
        self.players.push(player);
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn has_sponsor(&self) -> bool {
        self.sponsor_id.is_some()
    }

    pub fn sponsored_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_sponsored()).count()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.player_id == player_id)
    }

    /// Head coach followed by the assistant, if any.
    pub fn coaches(&self) -> impl Iterator<Item = &Coach> {
        std::iter::once(&self.head_coach).chain(self.assistant_coach.as_ref())
    }
}

/// `"<head last>/<assistant last>"`, or the head's last name alone.
/// Collisions between teams are allowed.
pub fn team_name(head: &Coach, assistant: Option<&Coach>) -> String {
    match assistant {
        Some(a) => format!("{}/{}", head.last_name(), a.last_name()),
        None => head.last_name().to_string(),
    }
}
