//! UCI / UCCI のコマンド組み立てと応答の解析
//!
//! 送信側は文字列を返すだけで、I/O は持たない。受信側の `parse_info` は決して失敗せず、
//! 読めなかったトークンは警告して読み飛ばす。

use log::warn;
use xqpuzzles_core::dialect::looks_like_move;
use xqpuzzles_core::{Bound, Color, PovScore, Score};

use crate::session::OptionValue;

/// 持ち時間。`red_time` / `black_time` はセンチ秒、`increment` は秒。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub red_time: u64,
    pub black_time: u64,
    pub increment: u64,
}

/// 探索の打ち切り条件。すべて省略可能。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub clock: Option<Clock>,
}

impl SearchLimits {
    pub fn depth(depth: u32) -> SearchLimits {
        SearchLimits {
            depth: Some(depth),
            ..SearchLimits::default()
        }
    }

    pub fn movetime(ms: u64) -> SearchLimits {
        SearchLimits {
            movetime_ms: Some(ms),
            ..SearchLimits::default()
        }
    }
}

pub fn encode_position(root_fen: &str, moves: &[String]) -> String {
    if moves.is_empty() {
        format!("position fen {root_fen}")
    } else {
        format!("position fen {root_fen} moves {}", moves.join(" "))
    }
}

pub fn encode_go(limits: &SearchLimits) -> String {
    let mut cmd = String::from("go");
    if let Some(ms) = limits.movetime_ms {
        cmd.push_str(&format!(" movetime {ms}"));
    }
    if let Some(depth) = limits.depth {
        cmd.push_str(&format!(" depth {depth}"));
    }
    if let Some(nodes) = limits.nodes {
        cmd.push_str(&format!(" nodes {nodes}"));
    }
    if let Some(clock) = limits.clock {
        cmd.push_str(&format!(
            " wtime {} btime {} winc {} binc {}",
            clock.red_time * 10,
            clock.black_time * 10,
            clock.increment * 1000,
            clock.increment * 1000
        ));
    }
    cmd
}

pub fn encode_setoption(name: &str, value: &OptionValue) -> String {
    format!("setoption name {name} value {}", value.to_protocol())
}

/// `(コマンド, 残り)` に分ける
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim_start()),
        None => (line, ""),
    }
}

/// `info` 行 1 本分。現れなかった項目は `None`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoRecord {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    /// 秒
    pub time: Option<f64>,
    pub nodes: Option<u64>,
    /// 1 始まり。省略時は 1 とみなす（[`InfoRecord::index`]）。
    pub multipv: Option<usize>,
    pub pv: Option<Vec<String>>,
    pub score: Option<PovScore>,
    /// `score` と常に一緒に置き換わる
    pub bound: Bound,
    pub wdl: Option<(u32, u32, u32)>,
    pub hashfull: Option<u32>,
    pub tbhits: Option<u64>,
    pub nps: Option<u64>,
    pub cpuload: Option<u32>,
    pub currmove: Option<String>,
    pub currmovenumber: Option<u32>,
    pub refutation: Option<Vec<String>>,
    pub currline: Option<Vec<String>>,
    pub ebf: Option<f64>,
    pub string: Option<String>,
}

impl InfoRecord {
    /// multipv 番号（1 始まり）
    pub fn index(&self) -> usize {
        self.multipv.unwrap_or(1)
    }

    /// 後から届いた行を重ねる。現れた項目だけ上書きする。
    pub fn merge(&mut self, other: InfoRecord) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            depth, seldepth, time, nodes, multipv, pv, wdl, hashfull, tbhits, nps, cpuload,
            currmove, currmovenumber, refutation, currline, ebf, string
        );
        if other.score.is_some() {
            self.score = other.score;
            self.bound = other.bound;
        }
    }
}

const KEYWORDS: &[&str] = &[
    "depth",
    "seldepth",
    "time",
    "nodes",
    "pv",
    "multipv",
    "score",
    "currmove",
    "currmovenumber",
    "hashfull",
    "nps",
    "tbhits",
    "cpuload",
    "refutation",
    "currline",
    "ebf",
    "string",
    "wdl",
    "lowerbound",
    "upperbound",
];

fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(&token)
}

/// 空白区切りのトークンと、その開始位置
fn tokenize(s: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if let Some(st) = start.take() {
                tokens.push((st, &s[st..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        tokens.push((st, &s[st..]));
    }
    tokens
}

fn parse_number<N: std::str::FromStr>(key: &str, token: Option<&(usize, &str)>) -> Option<N> {
    match token {
        Some((_, raw)) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("info {key}: cannot parse '{raw}'");
                None
            }
        },
        None => {
            warn!("info {key}: missing value");
            None
        }
    }
}

/// `info` に続く引数を解析する。`turn` は探索した局面の手番。
pub fn parse_info(args: &str, turn: Color) -> InfoRecord {
    let tokens = tokenize(args);
    let mut info = InfoRecord::default();
    let mut i = 0;
    while i < tokens.len() {
        let key = tokens[i].1;
        let next = tokens.get(i + 1);
        i += 1;
        match key {
            "depth" => {
                info.depth = parse_number(key, next);
                i += 1;
            }
            "seldepth" => {
                info.seldepth = parse_number(key, next);
                i += 1;
            }
            "time" => {
                info.time = parse_number::<u64>(key, next).map(|ms| ms as f64 / 1000.0);
                i += 1;
            }
            "nodes" => {
                info.nodes = parse_number(key, next);
                i += 1;
            }
            "multipv" => {
                info.multipv = parse_number(key, next);
                i += 1;
            }
            "hashfull" => {
                info.hashfull = parse_number(key, next);
                i += 1;
            }
            "tbhits" => {
                info.tbhits = parse_number(key, next);
                i += 1;
            }
            "nps" => {
                info.nps = parse_number(key, next);
                i += 1;
            }
            "cpuload" => {
                info.cpuload = parse_number(key, next);
                i += 1;
            }
            "currmovenumber" => {
                info.currmovenumber = parse_number(key, next);
                i += 1;
            }
            "ebf" => {
                info.ebf = parse_number(key, next);
                i += 1;
            }
            "currmove" => {
                info.currmove = next.map(|(_, mv)| mv.to_string());
                i += 1;
            }
            "score" => {
                let kind = next.map(|(_, k)| *k);
                let value: Option<i32> = parse_number(key, tokens.get(i + 1));
                i += 2;
                let relative = match (kind, value) {
                    (Some("cp"), Some(v)) => Some(Score::Cp(v)),
                    (Some("mate"), Some(v)) => Some(Score::Mate(v)),
                    (Some("cp" | "mate"), None) => None,
                    (other, _) => {
                        warn!("info score: unexpected kind {other:?}");
                        None
                    }
                };
                info.score = relative.map(|score| PovScore::new(score, turn));
                info.bound = Bound::Exact;
            }
            "lowerbound" => info.bound = Bound::Lower,
            "upperbound" => info.bound = Bound::Upper,
            "wdl" => {
                let w = parse_number(key, tokens.get(i));
                let d = parse_number(key, tokens.get(i + 1));
                let l = parse_number(key, tokens.get(i + 2));
                i += 3;
                info.wdl = match (w, d, l) {
                    (Some(w), Some(d), Some(l)) => Some((w, d, l)),
                    _ => None,
                };
            }
            "pv" | "refutation" => {
                let mut moves = Vec::new();
                while let Some((_, token)) = tokens.get(i) {
                    if is_keyword(token) {
                        break;
                    }
                    if !looks_like_move(token) {
                        warn!("info {key}: '{token}' is not a move");
                        break;
                    }
                    moves.push(token.to_string());
                    i += 1;
                }
                if key == "pv" {
                    info.pv = Some(moves);
                } else {
                    info.refutation = Some(moves);
                }
            }
            "currline" => {
                let mut moves = Vec::new();
                while let Some((_, token)) = tokens.get(i) {
                    if is_keyword(token) {
                        break;
                    }
                    moves.push(token.to_string());
                    i += 1;
                }
                info.currline = Some(moves);
            }
            "string" => {
                let rest = next.map_or("", |(offset, _)| &args[*offset..]);
                info.string = Some(rest.to_string());
                break;
            }
            unknown => {
                warn!("info: unknown keyword '{unknown}'");
                while let Some((_, token)) = tokens.get(i) {
                    if is_keyword(token) {
                        break;
                    }
                    i += 1;
                }
            }
        }
    }
    info
}

/// `bestmove` の引数から (指し手, ponder) を取り出す。`(none)` / `0000` は指し手なし。
pub fn parse_bestmove(args: &str) -> (Option<String>, Option<String>) {
    let mut tokens = args.split_whitespace();
    let best = match tokens.next() {
        None | Some("(none)") | Some("0000") => None,
        Some(mv) => Some(mv.to_string()),
    };
    let mut ponder = None;
    while let Some(token) = tokens.next() {
        if token == "ponder" {
            ponder = tokens.next().map(str::to_string);
        }
    }
    (best, ponder)
}
