//! play.xiangqi.com からユーザーの対局を取得して対局記録 CSV に保存する

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use tools::fetch::{DEFAULT_BASE_URL, DEFAULT_RETRIES, DEFAULT_TOTAL_GAMES, GameFetcher};
use tools::games::write_games;

#[derive(Parser, Debug)]
#[command(name = "fetch_games", version, about = "Download a player's xiangqi games as CSV")]
struct Cli {
    /// Username on play.xiangqi.com
    #[arg(long)]
    user: String,

    /// Admin JWT used as the bearer token
    #[arg(long, env = "XQ_JWT", hide_env_values = true)]
    jwt: String,

    /// Number of games to request
    #[arg(long = "total-games", default_value_t = DEFAULT_TOTAL_GAMES)]
    total_games: usize,

    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Retries per page
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// Output CSV (default: <user>.csv)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let out = cli
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.csv", cli.user)));

    let fetcher = GameFetcher::new(&cli.base_url, &cli.jwt)?.retries(cli.retries);
    let games = fetcher.fetch_games(&cli.user, cli.total_games);
    write_games(&out, &games)?;
    info!("{} games saved to {}", games.len(), out.display());
    Ok(())
}
