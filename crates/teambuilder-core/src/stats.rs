// Balance statistics over finished teams.

use serde::Serialize;

use crate::model::Team;

/// Mean and standard deviation of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Compute mean and standard deviation for a slice of values.
///
/// Returns `PoolStats { mean: 0.0, stdev: 0.0 }` for an empty slice.
/// Uses the population standard deviation (N denominator): the teams are the
/// whole division, not a sample of it.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// How evenly skill and head count ended up spread across teams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceStats {
    pub teams: usize,
    pub players: usize,
    /// Mean and population standard deviation of team `total_score`.
    pub total_score: PoolStats,
    pub smallest_team: usize,
    pub largest_team: usize,
}

impl BalanceStats {
    pub fn from_teams(teams: &[Team]) -> Self {
        let totals: Vec<f64> = teams.iter().map(|t| t.total_score).collect();
        let sizes = teams.iter().map(Team::player_count);
        BalanceStats {
            teams: teams.len(),
            players: teams.iter().map(Team::player_count).sum(),
            total_score: compute_pool_stats(&totals),
            smallest_team: sizes.clone().min().unwrap_or(0),
            largest_team: sizes.max().unwrap_or(0),
        }
    }

    /// Largest minus smallest roster size.
    pub fn size_spread(&self) -> usize {
        self.largest_team - self.smallest_team
    }
}
