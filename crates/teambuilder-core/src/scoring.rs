// Skill normalization: raw evaluations to a comparable 0-100 skill score.
//
// The evaluation format is not guaranteed; anything that is not a finite
// number counts as unanswered. Min/max scaling is re-derived for each
// division and never persisted between runs.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::Notice;
use crate::model::{is_unanswered, Player};

/// Multiplier applied to the [0, 1] normalized value.
pub const SKILL_SCALE: f64 = 100.0;

/// Normalized value used when the pool has fewer than two distinct
/// evaluations (nothing to scale against).
pub const FLAT_NORMALIZED: f64 = 0.5;

/// Days per year used for age derivation.
const DAYS_PER_YEAR: f64 = 365.25;

/// Registration date-of-birth format.
pub const DOB_FORMAT: &str = "%m/%d/%Y";

// ---------------------------------------------------------------------------
// Evaluation parsing
// ---------------------------------------------------------------------------

/// Outcome of reading a single raw evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Present(f64),
    /// Blank or explicitly unanswered.
    Missing,
    /// Something was entered but it is not a finite number.
    Malformed,
}

pub fn parse_evaluation(raw: &str) -> Evaluation {
    if is_unanswered(raw) {
        return Evaluation::Missing;
    }
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Evaluation::Present(v),
        _ => Evaluation::Malformed,
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// What the normalizer saw, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationSummary {
    pub parsed: usize,
    pub missing: usize,
    pub malformed: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Normalized value given to players without a usable evaluation.
    pub fill_value: f64,
}

/// Min/max context for a player pool.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of(values: &[f64]) -> Option<Range> {
        let first = *values.first()?;
        let (min, max) = values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Range { min, max })
    }

    /// Position of `value` within the range, in [0, 1].
    ///
    /// Values near `f64::MAX` overflow `max - min`; those are scaled on
    /// halves instead, which stays finite for any finite inputs.
    fn normalize(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return FLAT_NORMALIZED;
        }
        let span = self.max - self.min;
        let scaled = if span.is_finite() {
            (value - self.min) / span
        } else {
            (value / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        };
        if scaled.is_finite() {
            scaled.clamp(0.0, 1.0)
        } else {
            FLAT_NORMALIZED
        }
    }
}

/// Assign `skill_score` to every player in the pool.
///
/// 1. Parse each evaluation; blanks and "No Answer" are missing, anything
///    else non-numeric is malformed (and reported).
/// 2. Min/max scale the parsed values to [0, 1]. Fewer than two distinct
///    values means every normalized value is `FLAT_NORMALIZED`.
/// 3. Players without a usable value receive the mean of the normalized
///    present values.
/// 4. Scale by `SKILL_SCALE`.
///
/// The transform is monotonic: distinct raw values never swap order.
pub fn normalize_skill_scores(players: &mut [Player]) -> (NormalizationSummary, Vec<Notice>) {
    let mut notices = Vec::new();
    let evaluations: Vec<Evaluation> = players
        .iter()
        .map(|p| parse_evaluation(&p.raw_evaluation))
        .collect();

    let present: Vec<f64> = evaluations
        .iter()
        .filter_map(|e| match e {
            Evaluation::Present(v) => Some(*v),
            _ => None,
        })
        .collect();

    let range = Range::of(&present);
    let fill_value = match range {
        Some(r) => present.iter().map(|&v| r.normalize(v)).sum::<f64>() / present.len() as f64,
        None => FLAT_NORMALIZED,
    };

    let mut summary = NormalizationSummary {
        parsed: present.len(),
        missing: 0,
        malformed: 0,
        min: range.map(|r| r.min),
        max: range.map(|r| r.max),
        fill_value,
    };

    for (player, evaluation) in players.iter_mut().zip(evaluations) {
        let normalized = match (evaluation, range) {
            (Evaluation::Present(v), Some(r)) => r.normalize(v),
            (Evaluation::Malformed, _) => {
                summary.malformed += 1;
                notices.push(Notice::MalformedEvaluation {
                    player_id: player.player_id.clone(),
                    raw: player.raw_evaluation.clone(),
                });
                fill_value
            }
            _ => {
                summary.missing += 1;
                fill_value
            }
        };
        player.skill_score = normalized * SKILL_SCALE;
    }

    if summary.parsed == 0 && !players.is_empty() {
        warn!(
            "no parseable evaluations among {} players; balancing by head count only",
            players.len()
        );
    }
    debug!(
        "normalized {} evaluations (min={:?}, max={:?}, {} missing, {} malformed, fill={:.3})",
        summary.parsed, summary.min, summary.max, summary.missing, summary.malformed, summary.fill_value
    );

    (summary, notices)
}

// ---------------------------------------------------------------------------
// Age
// ---------------------------------------------------------------------------

/// Age in years on `as_of`, rounded half-up to one decimal place.
///
/// Returns `None` for a blank or unparseable date of birth.
pub fn compute_age(date_of_birth: &str, as_of: NaiveDate) -> Option<f64> {
    let dob = date_of_birth.trim();
    if dob.is_empty() {
        return None;
    }
    let birth = NaiveDate::parse_from_str(dob, DOB_FORMAT).ok()?;
    let days = (as_of - birth).num_days() as f64;
    Some(round_half_up(days / DAYS_PER_YEAR, 1))
}

fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}
