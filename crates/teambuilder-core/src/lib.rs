// Library root: the team formation engine. Pure and I/O-free; loading,
// configuration and export live in teambuilder-cli.

pub mod distribution;
pub mod engine;
pub mod error;
pub mod model;
pub mod pairing;
pub mod scoring;
pub mod seeding;
pub mod siblings;
pub mod stats;

pub use engine::{build_teams, build_teams_with_rng, EngineConfig, TeamBuild};
pub use error::{EngineError, Notice};
pub use model::{Coach, CoachRole, Player, Team};
