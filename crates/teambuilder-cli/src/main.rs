// Team builder entry point.
//
// 1. Initialize tracing (stderr, so stdout stays clean for the summary line)
// 2. Parse arguments and load config
// 3. Run: load CSVs, build teams, write outputs
// 4. Print the balance line

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use teambuilder_cli::config::{self, Overrides};
use teambuilder_cli::run::run;

#[derive(Parser)]
#[command(
    name = "teambuilder",
    about = "Assign youth players to skill-balanced teams",
    version
)]
struct Cli {
    /// Players registration CSV
    #[arg(long)]
    players: PathBuf,
    /// Coaches/volunteers CSV
    #[arg(long)]
    coaches: PathBuf,
    /// Target team size
    #[arg(long)]
    team_size: Option<usize>,
    /// Minimum players per team before any team grows further
    #[arg(long)]
    min_team_size: Option<usize>,
    /// Hard roster cap
    #[arg(long)]
    max_team_size: Option<usize>,
    /// Random seed for reproducible assignments
    #[arg(long)]
    seed: Option<u64>,
    /// Reference date for player ages (YYYY-MM-DD, default today)
    #[arg(long)]
    as_of: Option<String>,
    /// Keep siblings on the same team
    #[arg(long)]
    siblings: bool,
    /// Also write debug_players.csv
    #[arg(long)]
    debug: bool,
    /// Also write team_report.json
    #[arg(long)]
    json: bool,
    /// Directory for output files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// TOML config file; command-line values take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            team_size: self.team_size,
            min_team_size: self.min_team_size,
            max_team_size: self.max_team_size,
            seed: self.seed,
            as_of: self.as_of.clone(),
            siblings: self.siblings,
            debug: self.debug,
            json: self.json,
            output_dir: self.output_dir.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let today = chrono::Local::now().date_naive();
    let config = config::load_config(cli.config.as_deref(), &cli.overrides(), today)
        .context("failed to load configuration")?;
    info!(
        "Config loaded: team size {}, minimum {}, seed {}",
        config.engine.team_size,
        config.engine.min_team_size,
        config
            .engine
            .random_seed
            .map_or_else(|| "random".to_string(), |s| s.to_string())
    );

    let outcome = run(&cli.players, &cli.coaches, &config)?;

    println!("{}", outcome.balance_line());
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("teambuilder_core=info,teambuilder_cli=info,teambuilder=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
