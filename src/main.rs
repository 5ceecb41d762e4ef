//! Odds desk entry point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use oddsdesk::client::{read_picks, read_snapshots, run_analysis, DeskClient};
use oddsdesk::config::Config;
use oddsdesk::metrics;
use oddsdesk::odds::{
    line_movement, sport_counts, sport_label, BoardProjection, BookRow, Bucket, MarketGroup,
    OddsBoard, OddsSnapshot, SportFilter,
};
use oddsdesk::parlay::{detect_conflicts, PickId, ReconcilerState, SelectionReconciler};

const RULE: &str = "======================================================================";
const THIN_RULE: &str = "----------------------------------------------------------------------";

/// Sports odds comparison board and parlay selection checker.
#[derive(Parser, Debug)]
#[command(name = "oddsdesk")]
#[command(about = "Compare bookmaker odds and reconcile parlay selections")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the comparison board.
    Board {
        /// Read snapshots from a JSON file instead of the API.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Only show this game.
        #[arg(long)]
        game: Option<i64>,

        /// Only show games of this sport key.
        #[arg(long)]
        sport: Option<String>,
    },

    /// Print line movement for a game.
    Movement {
        /// Game to chart.
        #[arg(long)]
        game: i64,

        /// Read snapshots from a JSON file instead of the API.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Re-fetch live odds on an interval and reprint the board.
    Watch {
        /// Only show games of this sport key.
        #[arg(long)]
        sport: Option<String>,
    },

    /// Detect conflicts in a selection without contacting the API.
    Conflicts {
        /// JSON file of picks.
        #[arg(long)]
        picks: PathBuf,

        /// Pick ids in selection order.
        #[arg(long, value_delimiter = ',', required = true)]
        select: Vec<PickId>,
    },

    /// Reconcile a selection and validate it against the API.
    Analyze {
        /// Pick ids in selection order.
        #[arg(long, value_delimiter = ',', required = true)]
        select: Vec<PickId>,

        /// Read picks from a JSON file instead of the API.
        #[arg(long)]
        picks: Option<PathBuf>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let loaded = Config::load();

    // Initialize logging
    let (json_logs, config_verbose, level) = match &loaded {
        Ok(c) => (c.json_logs(), c.verbose, c.rust_log.clone()),
        Err(_) => (false, false, "info".to_string()),
    };

    let filter = if args.verbose || config_verbose {
        EnvFilter::new("oddsdesk=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(json_logs.then(|| fmt::layer().json()))
        .with((!json_logs).then(fmt::layer))
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    match args.command {
        Command::CheckConfig => cmd_check_config(loaded),
        Command::Conflicts { picks, select } => cmd_conflicts(&picks, &select),
        Command::Board { file, game, sport } => {
            cmd_board(&ready(loaded)?, file, game, sport).await
        }
        Command::Movement { game, file } => cmd_movement(&ready(loaded)?, game, file).await,
        Command::Watch { sport } => cmd_watch(&ready(loaded)?, sport).await,
        Command::Analyze { select, picks } => cmd_analyze(&ready(loaded)?, &select, picks).await,
    }
}

/// Unwrap a loaded configuration and validate it.
fn ready(loaded: Result<Config, envy::Error>) -> anyhow::Result<Config> {
    let config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config(loaded: Result<Config, envy::Error>) -> anyhow::Result<()> {
    println!("{}", RULE);
    println!("ODDS DESK - CONFIGURATION CHECK");
    println!("{}", RULE);

    print!("Loading configuration... ");
    let config = match loaded {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("{}", THIN_RULE);
    println!("Configuration Summary:");
    println!("  API Base URL: {}", config.base_url());
    println!("  HTTP Timeout: {}ms", config.http_timeout_ms);
    println!("  Poll Interval: {}s", config.poll_interval_secs);
    println!("  Log Level: {}", config.rust_log);
    println!("  Log Format: {}", if config.json_logs() { "json" } else { "text" });
    println!("{}", RULE);
    println!("CONFIGURATION CHECK PASSED");
    println!("{}", RULE);

    Ok(())
}

/// Print the comparison board once.
async fn cmd_board(
    config: &Config,
    file: Option<PathBuf>,
    game: Option<i64>,
    sport: Option<String>,
) -> anyhow::Result<()> {
    let snapshots = load_snapshots(config, file.as_deref()).await?;
    let board = OddsBoard::new(SportFilter::from_option(sport.as_deref()));
    let projection = board.refresh(&snapshots);

    print_sport_tabs(&snapshots);
    print_board(&projection, game);

    Ok(())
}

/// Print the line movement series for one game.
async fn cmd_movement(config: &Config, game: i64, file: Option<PathBuf>) -> anyhow::Result<()> {
    let snapshots = load_snapshots(config, file.as_deref()).await?;
    let series = line_movement(&snapshots, game);

    println!("{}", RULE);
    println!("LINE MOVEMENT - GAME {}", game);
    println!("{}", RULE);

    if series.is_empty() {
        println!("No snapshots for game {}", game);
        return Ok(());
    }

    for entry in &series {
        println!("{}", entry.bookmaker);
        for point in &entry.points {
            println!(
                "  {}  {:<8} {:<7} {}",
                point.time.format(&Rfc3339)?,
                point.market,
                point.bucket,
                fmt_odds(point.odds)
            );
        }
    }
    println!("{}", RULE);

    Ok(())
}

/// Poll live odds until Ctrl-C.
async fn cmd_watch(config: &Config, sport: Option<String>) -> anyhow::Result<()> {
    let client = DeskClient::new(config)?;
    let board = OddsBoard::new(SportFilter::from_option(sport.as_deref()));
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));

    info!(
        "Watching live odds every {}s from {}",
        config.poll_interval_secs,
        client.base_url()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match client.fetch_live_odds().await {
                    Ok(snapshots) => {
                        let projection = board.refresh(&snapshots);
                        print_board(&projection, None);
                    }
                    Err(e) => warn!("Live odds fetch failed: {}. Retrying next tick", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    Ok(())
}

/// Offline conflict detection over a picks file.
fn cmd_conflicts(picks_path: &Path, select: &[PickId]) -> anyhow::Result<()> {
    let picks = read_picks(picks_path)?;
    let reconciler = SelectionReconciler::new(picks);

    let mut selected = Vec::with_capacity(select.len());
    for id in select {
        match reconciler.pick(*id) {
            Some(pick) => selected.push(pick),
            None => warn!("Unknown pick {} skipped", id),
        }
    }

    let conflicts = detect_conflicts(selected.iter().copied());

    println!("{}", RULE);
    println!("CONFLICT CHECK");
    println!("{}", RULE);

    if conflicts.is_empty() {
        println!("No conflicts.");
    }
    for conflict in &conflicts {
        let describe = |id: PickId| {
            reconciler
                .pick(id)
                .map(|p| format!("{} {} ({})", p.matchup(), p.side, p.market))
                .unwrap_or_default()
        };
        println!("  keep   #{}: {}", conflict.keep, describe(conflict.keep));
        println!("  remove #{}: {}", conflict.remove, describe(conflict.remove));
    }

    let cleaned: Vec<PickId> = selected
        .iter()
        .map(|p| p.id)
        .filter(|id| !conflicts.iter().any(|c| c.remove == *id))
        .collect();

    println!("{}", THIN_RULE);
    println!("Cleaned selection: {:?}", cleaned);
    println!("{}", RULE);

    Ok(())
}

/// Full reconcile and validate flow against the API.
async fn cmd_analyze(
    config: &Config,
    select: &[PickId],
    picks_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let client = DeskClient::new(config)?;
    let picks = match picks_path {
        Some(path) => read_picks(&path)?,
        None => client.fetch_picks_today().await?,
    };

    let mut reconciler = SelectionReconciler::new(picks);
    for id in select {
        reconciler.select(*id)?;
    }

    let state = run_analysis(&mut reconciler, &client).await.clone();

    println!("{}", RULE);
    println!("PARLAY ANALYSIS");
    println!("{}", RULE);
    for pick in reconciler.selected_picks() {
        println!("  #{:<5} {} {} ({})", pick.id, pick.matchup(), pick.side, pick.market);
    }
    println!("{}", THIN_RULE);

    if let Some(warning) = reconciler.warning() {
        println!("Warning: {}", warning);
    }

    match state {
        ReconcilerState::Clean => match reconciler.last_build() {
            Some(build) => {
                println!("Parlay is valid");
                if let Some(ev) = build.combined_ev_pct {
                    println!("  Combined EV: {}%", ev);
                }
                if let Some(corr) = build.correlation_score {
                    println!("  Correlation: {}", corr);
                }
                if let Some(odds) = build.combined_odds_american {
                    println!("  Combined odds: {}", fmt_odds(odds));
                }
                for note in &build.compatibility_warnings {
                    println!("  Note: {}", note);
                }
            }
            None => println!("Nothing to validate"),
        },
        ReconcilerState::LocallyConflicted => {
            println!("Too few legs remain after removing conflicts");
        }
        ReconcilerState::ServerConflicted { reason } => {
            println!("Server reported a conflict: {}", reason);
        }
        ReconcilerState::Rejected { reason } => println!("Rejected: {}", reason),
        ReconcilerState::AwaitingValidation { .. } => {
            println!("Validation did not complete");
        }
    }
    println!("{}", RULE);

    Ok(())
}

async fn load_snapshots(config: &Config, file: Option<&Path>) -> anyhow::Result<Vec<OddsSnapshot>> {
    match file {
        Some(path) => Ok(read_snapshots(path)?),
        None => Ok(DeskClient::new(config)?.fetch_live_odds().await?),
    }
}

fn print_sport_tabs(snapshots: &[OddsSnapshot]) {
    let tabs: Vec<String> = sport_counts(snapshots)
        .iter()
        .map(|(key, count)| format!("{} ({})", sport_label(key), count))
        .collect();
    println!("Sports: {}", tabs.join("  "));
}

fn print_board(projection: &BoardProjection, only_game: Option<i64>) {
    println!("{}", RULE);

    if projection.is_empty() {
        println!("No live odds available.");
        println!("{}", RULE);
        return;
    }

    let mut printed = 0usize;
    for game in projection
        .games
        .iter()
        .filter(|game| only_game.map_or(true, |id| id == game.game_id))
    {
        printed += 1;
        println!("{}  [{}]", game.label(), sport_label(&game.sport_key));
        println!("{}", THIN_RULE);
        for group in projection.groups(game.game_id) {
            print_group(group);
        }
        println!("{}", RULE);
    }

    if let (0, Some(id)) = (printed, only_game) {
        println!("Game {} is not on the board.", id);
        println!("{}", RULE);
    }
}

fn print_group(group: &MarketGroup) {
    let (first, second) = group.market.buckets();
    println!("  {:<20} {:>16} {:>16}", group.label, first.to_string(), second.to_string());
    for row in &group.rows {
        println!(
            "  {:<20} {:>16} {:>16}",
            row.bookmaker,
            fmt_cell(group, row, first),
            fmt_cell(group, row, second)
        );
    }
}

/// Price cell with its line, `*` marking the best price.
fn fmt_cell(group: &MarketGroup, row: &BookRow, bucket: Bucket) -> String {
    let Some(cell) = row.price(bucket) else {
        return "-".to_string();
    };

    let odds = cell.odds.map(fmt_odds).unwrap_or_else(|| "-".to_string());
    let marker = if group.is_best(row, bucket) { "*" } else { " " };
    match cell.line {
        Some(line) => format!("{} {}{}", line, odds, marker),
        None => format!("{}{}", odds, marker),
    }
}

fn fmt_odds(odds: i32) -> String {
    if odds > 0 {
        format!("+{}", odds)
    } else {
        odds.to_string()
    }
}
