//! 棋譜（手順の直接指定、または対局記録 CSV）から問題候補を探して CSV に書き出す

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{ArgGroup, Parser};
use log::{error, info};
use tools::config::AppConfig;
use tools::export::{DEFAULT_EDITOR_URL, PuzzleSink};
use tools::games::{load_games, parse_moves};
use tools::scanner::{PuzzleScanner, ScanPolicy};
use xqpuzzles_uci::{AnalysisEngine, EngineKind, start_engine};

/// 手順指定時の序盤スキップ手数
const SINGLE_GAME_SKIP: usize = 5;
/// CSV 一括処理時の序盤スキップ手数
const ARCHIVE_SKIP: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "puzzle_maker",
    version,
    about = "Scan xiangqi games with an analysis engine and export puzzle candidates"
)]
#[command(group(ArgGroup::new("input").required(true).args(["moves", "games_csv"])))]
struct Cli {
    /// UCI moves of a single game, comma separated (h3e3,h8e8,...)
    #[arg(long)]
    moves: Option<String>,

    /// CSV file with games (id,rplayer,bplayer,moves_count,moves)
    #[arg(long = "games-csv", alias = "games_csv")]
    games_csv: Option<PathBuf>,

    /// Engine to use (pikafish / stockfish)
    #[arg(long)]
    engine: Option<EngineKind>,

    /// Engine binary (overrides the config file)
    #[arg(long = "engine-path")]
    engine_path: Option<PathBuf>,

    /// TOML config file with [engine] and [scan] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of opening plies to skip (default: 5 for --moves, 10 for --games-csv)
    #[arg(long = "skip-initial")]
    skip_initial: Option<usize>,

    /// Search depth per position
    #[arg(long)]
    depth: Option<u32>,

    /// Search time per position in milliseconds
    #[arg(long)]
    movetime: Option<u64>,

    /// Use the relaxed scan thresholds
    #[arg(long)]
    relaxed: bool,

    /// Output CSV (default: output.csv, or <games stem>_out.csv)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Board editor URL prefix written to the url column
    #[arg(long = "editor-url", default_value = DEFAULT_EDITOR_URL)]
    editor_url: String,

    /// Only log warnings and errors
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log engine traffic summaries and per-move details
    #[arg(long)]
    verbose: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn archive_output(games_csv: &Path) -> PathBuf {
    let stem = games_csv
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "games".to_string());
    games_csv.with_file_name(format!("{stem}_out.csv"))
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(kind) = cli.engine {
        config.engine.kind = kind;
    }
    if let Some(path) = &cli.engine_path {
        config.engine.path = Some(path.clone());
    }
    if let Some(depth) = cli.depth {
        config.engine.depth = Some(depth);
    }
    if let Some(ms) = cli.movetime {
        config.engine.movetime_ms = Some(ms);
    }
    if cli.relaxed {
        config.scan = ScanPolicy::relaxed();
    }
    Ok(config)
}

fn scan_single(
    engine: &mut dyn AnalysisEngine,
    config: &AppConfig,
    cli: &Cli,
    moves: &str,
) -> Result<()> {
    let moves = parse_moves(moves).context("invalid --moves")?;
    info!("{} moves: {}", moves.len(), moves.join(","));
    let out = cli.out.clone().unwrap_or_else(|| PathBuf::from("output.csv"));
    let mut sink = PuzzleSink::open(&out, &cli.editor_url)?;

    let puzzles = PuzzleScanner::new(engine, config.scan)
        .skip_initial(cli.skip_initial.unwrap_or(SINGLE_GAME_SKIP))
        .scan(&moves)?;
    sink.write(None, &puzzles)?;
    info!("found {} puzzle positions", puzzles.len());
    for puzzle in &puzzles {
        info!("position: {}", sink.url_for(&puzzle.fen));
    }
    Ok(())
}

fn scan_archive(
    engine: &mut dyn AnalysisEngine,
    config: &AppConfig,
    cli: &Cli,
    games_csv: &Path,
) -> Result<()> {
    let games = load_games(games_csv)?;
    let out = cli.out.clone().unwrap_or_else(|| archive_output(games_csv));
    let mut sink = PuzzleSink::open(&out, &cli.editor_url)?;
    let skip = cli.skip_initial.unwrap_or(ARCHIVE_SKIP);
    info!("{} games from {}", games.len(), games_csv.display());

    for game in &games {
        info!("game {} ({} vs {})", game.id, game.rplayer, game.bplayer);
        let result = PuzzleScanner::new(&mut *engine, config.scan)
            .skip_initial(skip)
            .scan(&game.moves);
        match result {
            Ok(puzzles) => {
                sink.write(Some(&game.id), &puzzles)?;
                info!("found {} positions in game {}", puzzles.len(), game.id);
                for puzzle in &puzzles {
                    info!("first turn {}: {}", puzzle.first_turn, sink.url_for(&puzzle.fen));
                }
            }
            Err(err) => error!("game {}: {err}", game.id),
        }
    }
    info!("{} puzzles written to {}", sink.written(), sink.path().display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(&cli)?;
    let mut engine = start_engine(&config.engine)
        .with_context(|| format!("failed to start {}", config.engine.kind))?;
    info!("engine: {}", engine.name());

    let result = match (&cli.moves, &cli.games_csv) {
        (Some(moves), _) => scan_single(engine.as_mut(), &config, &cli, moves),
        (None, Some(path)) => scan_archive(engine.as_mut(), &config, &cli, path),
        (None, None) => Err(anyhow!("either --moves or --games-csv is required")),
    };
    engine.quit();
    result
}
