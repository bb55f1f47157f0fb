// Registration data loading: players and coaches CSV exports.
//
// Columns are located by header name, not position. Exports differ between
// seasons in column order and in the wording of some headers, so two columns
// are matched by prefix ("Years of Experience...", "Uniform Size...").

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info, warn};

use teambuilder_core::model::{answered, Coach, CoachRole, Player, DEFAULT_UNIFORM_SIZE};
use teambuilder_core::scoring::compute_age;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} is missing required column(s): {}", .missing.join(", "))]
    MissingHeaders { path: String, missing: Vec<String> },
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

const PLAYER_ID: &str = "PlayerID";
const PLAYER_NAME: &str = "Player Name";
const DATE_OF_BIRTH: &str = "Date Of Birth";
const EXPERIENCE_PREFIX: &str = "years of experience";
const UNIFORM_PREFIX: &str = "uniform size";
const EVALUATION: &str = "Player Evaluation Rating";
const SPONSOR: &str = "sponsor_id";
const PARENT_NAME: &str = "Parent LastName";
const STREET_ADDRESS: &str = "Account Street Address";

const VOLUNTEER_ID: &str = "VolunteerID";
const PERSONNEL_NAME: &str = "Team Personnel Name";
const PERSONNEL_ROLE: &str = "Team Personnel Role";
const ASSOCIATED_PLAYERS: &str = "associatedPlayers";
const ASSOCIATED_PLAYER_ID: &str = "associated_player_id";
const COACH_PAIR: &str = "Coach Pair";
const VOLUNTEER_TYPE_ID: &str = "VolunteerTypeId";

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Trimmed header names from the header row; positions are looked up by
/// name on each call.
#[derive(Debug, Clone)]
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Columns {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.headers.iter().all(String::is_empty)
    }

    /// Exact header match.
    fn exact(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// First header starting with `prefix`, ignoring case.
    fn prefixed(&self, prefix: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.to_lowercase().starts_with(prefix))
    }

    fn require(&self, path: &str, names: &[&str]) -> Result<(), LoadError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| self.exact(n).is_none())
            .map(|n| n.to_string())
            .collect();
        if self.is_empty() || !missing.is_empty() {
            return Err(LoadError::MissingHeaders {
                path: path.to_string(),
                missing: if missing.is_empty() {
                    names.iter().map(|n| n.to_string()).collect()
                } else {
                    missing
                },
            });
        }
        Ok(())
    }
}

/// Trimmed cell value; absent columns and short rows read as "".
fn cell(record: &StringRecord, column: Option<usize>) -> &str {
    column.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Non-blank cell value.
fn optional_cell(record: &StringRecord, column: Option<usize>) -> Option<String> {
    let value = cell(record, column);
    (!value.is_empty()).then(|| value.to_string())
}

fn headers_of<R: Read>(rdr: &mut csv::Reader<R>, path: &str) -> Result<Columns, LoadError> {
    let headers = rdr.headers().map_err(|e| LoadError::Csv {
        path: path.to_string(),
        source: e,
    })?;
    Ok(Columns::new(headers))
}

// ---------------------------------------------------------------------------
// Reader-based loaders (enable testing without temp files)
// ---------------------------------------------------------------------------

/// Parse a players export. `path` labels errors; `as_of` is the reference
/// date for ages.
///
/// Rows without a PlayerID are skipped, and a repeated PlayerID keeps the
/// first row.
pub fn load_players_from_reader<R: Read>(rdr: R, path: &str, as_of: NaiveDate) -> Result<Vec<Player>, LoadError> {
    let mut rdr = csv::Reader::from_reader(rdr);
    let columns = headers_of(&mut rdr, path)?;
    columns.require(path, &[PLAYER_ID])?;

    let id = columns.exact(PLAYER_ID);
    let name = columns.exact(PLAYER_NAME);
    let dob = columns.exact(DATE_OF_BIRTH);
    let experience = columns.prefixed(EXPERIENCE_PREFIX);
    let uniform = columns.prefixed(UNIFORM_PREFIX);
    let evaluation = columns.exact(EVALUATION);
    let sponsor = columns.exact(SPONSOR);
    let parent = columns.exact(PARENT_NAME);
    let address = columns.exact(STREET_ADDRESS);

    if evaluation.is_none() {
        warn!("{path}: no '{EVALUATION}' column; every player will score the same");
    }

    let mut players = Vec::new();
    let mut seen = HashSet::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        let player_id = cell(&record, id);
        if player_id.is_empty() {
            warn!("skipping player row without a {PLAYER_ID}");
            continue;
        }
        if !seen.insert(player_id.to_string()) {
            warn!("duplicate player {}, keeping the first row", player_id);
            continue;
        }

        let date_of_birth = cell(&record, dob).to_string();
        let mut player = Player::new(player_id, cell(&record, name));
        player.age = compute_age(&date_of_birth, as_of);
        player.date_of_birth = date_of_birth;
        player.experience = cell(&record, experience).parse().unwrap_or(0);
        player.uniform_size = optional_cell(&record, uniform).unwrap_or_else(|| DEFAULT_UNIFORM_SIZE.to_string());
        player.raw_evaluation = cell(&record, evaluation).to_string();
        player.sponsor_id = optional_cell(&record, sponsor);
        player.parent_name = optional_cell(&record, parent);
        player.street_address = optional_cell(&record, address);
        players.push(player);
    }

    info!("{path}: loaded {} players", players.len());
    Ok(players)
}

/// Parse a coaches export. Rows whose role is neither head nor assistant
/// coach are dropped.
pub fn load_coaches_from_reader<R: Read>(rdr: R, path: &str) -> Result<Vec<Coach>, LoadError> {
    let mut rdr = csv::Reader::from_reader(rdr);
    let columns = headers_of(&mut rdr, path)?;
    columns.require(path, &[VOLUNTEER_ID, PERSONNEL_ROLE])?;

    let id = columns.exact(VOLUNTEER_ID);
    let name = columns.exact(PERSONNEL_NAME);
    let role_label = columns.exact(PERSONNEL_ROLE);
    let associated = columns.exact(ASSOCIATED_PLAYERS);
    let associated_alt = columns.exact(ASSOCIATED_PLAYER_ID);
    let pair = columns.exact(COACH_PAIR);
    let volunteer_type = columns.exact(VOLUNTEER_TYPE_ID);

    let mut coaches = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed coach row: {}", e);
                continue;
            }
        };

        let coach_id = cell(&record, id);
        let label = cell(&record, role_label);
        let Some(role) = CoachRole::from_label(label) else {
            debug!("skipping volunteer {} with role '{}'", coach_id, label);
            continue;
        };

        let mut coach = Coach::new(coach_id, cell(&record, name), role);
        coach.associated_player_id =
            answered(Some(cell(&record, associated))).or_else(|| answered(Some(cell(&record, associated_alt))));
        coach.pair_request_id = answered(Some(cell(&record, pair)));
        coach.volunteer_type_id = cell(&record, volunteer_type).to_string();
        coaches.push(coach);
    }

    let heads = coaches.iter().filter(|c| c.role == CoachRole::Head).count();
    info!(
        "{path}: loaded {} head and {} assistant coaches",
        heads,
        coaches.len() - heads
    );
    Ok(coaches)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load players from a CSV file.
pub fn load_players(path: &Path, as_of: NaiveDate) -> Result<Vec<Player>, LoadError> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: label.clone(),
        source: e,
    })?;
    load_players_from_reader(file, &label, as_of)
}

/// Load coaches from a CSV file.
pub fn load_coaches(path: &Path) -> Result<Vec<Coach>, LoadError> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: label.clone(),
        source: e,
    })?;
    load_coaches_from_reader(file, &label)
}
