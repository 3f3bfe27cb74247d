//! play.xiangqi.com の対局一覧 API から棋譜を取得する

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

use crate::games::{GameRecord, parse_moves};

pub const DEFAULT_BASE_URL: &str = "https://api.play.xiangqi.com";
pub const GAMES_PER_PAGE: usize = 12;
/// これより短い対局は捨てる
pub const MIN_MOVES: u32 = 11;
pub const DEFAULT_TOTAL_GAMES: usize = 30;
pub const DEFAULT_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct Player {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiGame {
    id: Value,
    rplayer: Player,
    bplayer: Player,
    #[serde(default)]
    moves_count: u32,
    #[serde(default)]
    uci_moves: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GamesPage {
    #[serde(default)]
    games: Vec<ApiGame>,
}

fn value_to_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn extract_moves(value: Option<&Value>) -> Result<Vec<String>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("non-string move {item}"))
            })
            .collect(),
        Some(Value::String(s)) => parse_moves(s),
        Some(other) => Err(anyhow!("unexpected uci_moves value {other}")),
    }
}

/// 1 ページ分の JSON を解釈し、短すぎる対局や指し手の無い対局を除いて返す
pub fn parse_games_page(body: &str) -> Result<Vec<GameRecord>> {
    let page: GamesPage = serde_json::from_str(body).context("invalid games page")?;
    let mut games = Vec::with_capacity(page.games.len());
    for game in page.games {
        let id = value_to_id(&game.id);
        if game.moves_count < MIN_MOVES {
            continue;
        }
        let moves = match extract_moves(game.uci_moves.as_ref()) {
            Ok(moves) if !moves.is_empty() => moves,
            Ok(_) => continue,
            Err(err) => {
                warn!("game {id}: {err:#}");
                continue;
            }
        };
        games.push(GameRecord {
            id,
            rplayer: game.rplayer.username,
            bplayer: game.bplayer.username,
            moves_count: game.moves_count,
            moves,
        });
    }
    Ok(games)
}

/// 取得するページ番号（1 始まり）
pub fn pages_for(total_games: usize) -> std::ops::RangeInclusive<usize> {
    1..=total_games / GAMES_PER_PAGE + 1
}

pub struct GameFetcher {
    client: Client,
    base_url: String,
    jwt: String,
    retries: u32,
    retry_delay: Duration,
}

impl GameFetcher {
    pub fn new(base_url: &str, jwt: &str) -> Result<GameFetcher> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(GameFetcher {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            jwt: jwt.to_string(),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn page_url(&self, user: &str) -> String {
        format!("{}/api/users/games/{user}", self.base_url)
    }

    fn fetch_page_once(&self, user: &str, page: usize) -> Result<String> {
        let url = self.page_url(user);
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.jwt))
            .context("JWT is not a valid header value")?;
        let res = self
            .client
            .get(&url)
            .header(AUTHORIZATION, auth)
            .query(&[("page", page)])
            .send()
            .with_context(|| format!("GET {url}?page={page}"))?;
        let status = res.status();
        let text = res.text().with_context(|| format!("read body: {url}"))?;
        anyhow::ensure!(status.is_success(), "HTTP {status} for {url}: {text}");
        Ok(text)
    }

    /// 1 ページ取得する。失敗したら `retries` 回まで待って再試行する。
    pub fn fetch_page(&self, user: &str, page: usize) -> Result<Vec<GameRecord>> {
        let mut attempt = 0;
        loop {
            match self
                .fetch_page_once(user, page)
                .and_then(|body| parse_games_page(&body))
            {
                Ok(games) => return Ok(games),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    warn!("page {page} failed ({err:#}), retry {attempt}/{}", self.retries);
                    thread::sleep(self.retry_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// `total_games` 件分のページを順に取得する。取れなかったページは飛ばす。
    pub fn fetch_games(&self, user: &str, total_games: usize) -> Vec<GameRecord> {
        info!("fetching games of {user}");
        let mut games = Vec::new();
        for page in pages_for(total_games) {
            match self.fetch_page(user, page) {
                Ok(mut page_games) => {
                    info!("page {page}: {} games", page_games.len());
                    games.append(&mut page_games);
                }
                Err(err) => warn!("skipping page {page}: {err:#}"),
            }
        }
        games
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_games_page_filters_short_and_empty_games() {
        let body = r#"{
            "games": [
                {"id": 11, "rplayer": {"username": "red"}, "bplayer": {"username": "black"},
                 "moves_count": 40, "uci_moves": ["h3e3", "h8e8"]},
                {"id": 12, "rplayer": {"username": "red"}, "bplayer": {"username": "black"},
                 "moves_count": 8, "uci_moves": ["h3e3"]},
                {"id": "13", "rplayer": {"username": "r2"}, "bplayer": {"username": "b2"},
                 "moves_count": 30, "uci_moves": null},
                {"id": 14, "rplayer": {"username": "r3"}, "bplayer": {"username": "b3"},
                 "moves_count": 25, "uci_moves": "['b1c3', 'b10c8']"}
            ],
            "total": 4
        }"#;
        let games = parse_games_page(body).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].id, "11");
        assert_eq!(games[0].rplayer, "red");
        assert_eq!(games[0].moves, vec!["h3e3", "h8e8"]);
        assert_eq!(games[1].id, "14");
        assert_eq!(games[1].moves, vec!["b1c3", "b10c8"]);
    }

    #[test]
    fn test_pages_for_total() {
        assert_eq!(pages_for(30), 1..=3);
        assert_eq!(pages_for(12), 1..=2);
        assert_eq!(pages_for(0), 1..=1);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_games_page("<html>").is_err());
    }
}
