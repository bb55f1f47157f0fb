// One full run: load registrations, build teams, report, export.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use teambuilder_core::engine::{build_teams, TeamBuild};

use crate::config::Config;
use crate::export::export_all;
use crate::load::{load_coaches, load_players};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub build: TeamBuild,
    pub written: Vec<PathBuf>,
}

impl RunOutcome {
    /// The balance line printed at the end of a run.
    pub fn balance_line(&self) -> String {
        let stats = &self.build.stats;
        if stats.teams > 1 {
            format!(
                "Total skill score per team: mean {:.3}, standard deviation {:.3}",
                stats.total_score.mean, stats.total_score.stdev
            )
        } else {
            format!(
                "Total skill score per team: mean {:.3}, standard deviation N/A ({} team)",
                stats.total_score.mean, stats.teams
            )
        }
    }
}

pub fn run(players_path: &Path, coaches_path: &Path, config: &Config) -> anyhow::Result<RunOutcome> {
    let players = load_players(players_path, config.as_of).context("failed to load players")?;
    let coaches = load_coaches(coaches_path).context("failed to load coaches")?;

    let build = build_teams(players, coaches, &config.engine).context("failed to build teams")?;

    let norm = &build.normalization;
    info!(
        "evaluations: {} parsed, {} missing, {} malformed",
        norm.parsed, norm.missing, norm.malformed
    );
    for notice in &build.notices {
        warn!("{}", notice);
    }
    for team in &build.teams {
        info!(
            "team {} '{}': {} players, total {:.3}{}",
            team.team_id,
            team.name,
            team.player_count(),
            team.total_score,
            team.sponsor_id
                .as_deref()
                .map(|s| format!(", sponsor {s}"))
                .unwrap_or_default()
        );
    }

    let written = export_all(&build, &config.engine, config.as_of, &config.output)
        .context("failed to write output files")?;

    let outcome = RunOutcome { build, written };
    info!("{}", outcome.balance_line());
    Ok(outcome)
}
