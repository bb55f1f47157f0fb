// Output files: team assignments, team summary, debug players, JSON report.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use teambuilder_core::engine::{EngineConfig, TeamBuild};
use teambuilder_core::model::Team;

use crate::config::OutputConfig;

pub const ASSIGNMENTS_FILE: &str = "team_assignments.csv";
pub const SUMMARY_FILE: &str = "team_summary.csv";
pub const DEBUG_PLAYERS_FILE: &str = "debug_players.csv";
pub const REPORT_FILE: &str = "team_report.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error writing {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Round to three decimal places for the summary file.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ---------------------------------------------------------------------------
// Writer-based exporters
// ---------------------------------------------------------------------------

/// One row per coach, then one row per player, for each team.
pub fn write_team_assignments<W: Write>(out: W, teams: &[Team]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "TeamName",
        "VolunteerID",
        "VolunteerTypeID",
        "Team Personnel Name",
        "Team Personnel Role",
        "PlayerID",
        "Player Name",
    ])?;
    for team in teams {
        for coach in team.coaches() {
            wtr.write_record([
                team.name.as_str(),
                coach.coach_id.as_str(),
                coach.volunteer_type_id.as_str(),
                coach.full_name.as_str(),
                coach.role.label(),
                "",
                "",
            ])?;
        }
        for player in &team.players {
            wtr.write_record([
                team.name.as_str(),
                "",
                "",
                "",
                "",
                player.player_id.as_str(),
                player.name.as_str(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_team_summary<W: Write>(out: W, teams: &[Team]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["Team Name", "Number of Players", "Total Skill Score", "Sponsor ID"])?;
    for team in teams {
        wtr.write_record([
            team.name.clone(),
            team.player_count().to_string(),
            round3(team.total_score).to_string(),
            team.sponsor_id.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Every placed player with the inputs behind their skill score.
pub fn write_debug_players<W: Write>(out: W, teams: &[Team]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "PlayerID",
        "Player Name",
        "DOB",
        "Age",
        "Experience",
        "Uniform Size",
        "Evaluation Score",
        "Sponsor ID",
        "Skill Score",
        "Team Name",
    ])?;
    for team in teams {
        for p in &team.players {
            wtr.write_record([
                p.player_id.clone(),
                p.name.clone(),
                p.date_of_birth.clone(),
                p.age.map(|a| format!("{a:.1}")).unwrap_or_default(),
                p.experience.to_string(),
                p.uniform_size.clone(),
                p.raw_evaluation.clone(),
                p.sponsor_id.clone().unwrap_or_default(),
                format!("{:.3}", p.skill_score),
                team.name.clone(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// JSON report: run settings plus the full build.
#[derive(Debug, Serialize)]
pub struct TeamReport<'a> {
    pub as_of: NaiveDate,
    pub config: &'a EngineConfig,
    #[serde(flatten)]
    pub build: &'a TeamBuild,
}

pub fn write_report<W: Write>(out: W, report: &TeamReport<'_>) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(out, report)
}

// ---------------------------------------------------------------------------
// Path-based export
// ---------------------------------------------------------------------------

fn create(path: &Path) -> Result<std::fs::File, ExportError> {
    std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> ExportError + '_ {
    move |e| ExportError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Write every requested output into `output.dir`, creating it if needed.
/// Returns the paths written, in order.
pub fn export_all(
    build: &TeamBuild,
    engine: &EngineConfig,
    as_of: NaiveDate,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(&output.dir).map_err(|e| ExportError::Io {
        path: output.dir.display().to_string(),
        source: e,
    })?;
    let mut written = Vec::new();

    let path = output.dir.join(ASSIGNMENTS_FILE);
    write_team_assignments(create(&path)?, &build.teams).map_err(csv_err(&path))?;
    written.push(path);

    let path = output.dir.join(SUMMARY_FILE);
    write_team_summary(create(&path)?, &build.teams).map_err(csv_err(&path))?;
    written.push(path);

    if output.debug {
        let path = output.dir.join(DEBUG_PLAYERS_FILE);
        write_debug_players(create(&path)?, &build.teams).map_err(csv_err(&path))?;
        written.push(path);
    }

    if output.json {
        let path = output.dir.join(REPORT_FILE);
        let report = TeamReport {
            as_of,
            config: engine,
            build,
        };
        write_report(create(&path)?, &report).map_err(|e| ExportError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
        written.push(path);
    }

    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(written)
}
