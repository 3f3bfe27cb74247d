//! エンジンとのセッション
//!
//! ハンドシェイク（`uci` → `uciok`）、オプション設定、`isready` による同期、終了処理を扱う。
//! 探索そのものは [`crate::evaluator`] が担当する。

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, warn};

use crate::codec::{encode_setoption, split_command};
use crate::error::EngineError;
use crate::process::Transport;

/// `setoption` の値
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// 値なし（`none` を送る）
    None,
}

impl OptionValue {
    pub fn to_protocol(&self) -> String {
        match self {
            OptionValue::Bool(true) => "true".to_string(),
            OptionValue::Bool(false) => "false".to_string(),
            OptionValue::Int(v) => v.to_string(),
            OptionValue::Str(s) => s.clone(),
            OptionValue::None => "none".to_string(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_protocol())
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Str(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::Str(v)
    }
}

/// エンジンが宣言したオプション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOption {
    pub name: String,
    pub kind: String,
    pub default: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub vars: Vec<String>,
}

/// ハンドシェイクで得た情報
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub name: Option<String>,
    pub author: Option<String>,
    pub options: BTreeMap<String, EngineOption>,
    /// `UCI_Variant` の選択肢
    pub variants: Vec<String>,
}

impl EngineInfo {
    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}

/// 1 本のエンジンとの対話状態
pub struct EngineSession<T: Transport> {
    transport: T,
    info: EngineInfo,
    /// 送信済みのオプション
    sent: BTreeMap<String, OptionValue>,
    ready: bool,
}

impl<T: Transport> EngineSession<T> {
    pub fn new(transport: T) -> EngineSession<T> {
        EngineSession {
            transport,
            info: EngineInfo::default(),
            sent: BTreeMap::new(),
            ready: false,
        }
    }

    pub fn info(&self) -> &EngineInfo {
        &self.info
    }

    pub fn sent_options(&self) -> &BTreeMap<String, OptionValue> {
        &self.sent
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn transport_ref(&self) -> &T {
        &self.transport
    }

    pub fn send(&mut self, line: &str) -> Result<(), EngineError> {
        self.transport.send_line(line)
    }

    pub fn recv(&mut self) -> Result<String, EngineError> {
        self.transport.recv_line()
    }

    /// `uci` を送り `uciok` まで読む
    pub fn handshake(&mut self) -> Result<&EngineInfo, EngineError> {
        self.send("uci")?;
        loop {
            let line = self.recv()?;
            let (cmd, rest) = split_command(&line);
            match cmd {
                "uciok" => break,
                "id" => {
                    let (field, value) = split_command(rest);
                    match field {
                        "name" => self.info.name = Some(value.to_string()),
                        "author" => self.info.author = Some(value.to_string()),
                        _ => debug!("ignoring id field '{field}'"),
                    }
                }
                "option" => match parse_option(rest) {
                    Some(option) => {
                        if option.name == "UCI_Variant" {
                            self.info.variants = option.vars.clone();
                        }
                        self.info.options.insert(option.name.clone(), option);
                    }
                    None => warn!("malformed option line: {line}"),
                },
                "" => {}
                _ if is_banner(&line) => debug!("banner: {line}"),
                _ => warn!("unexpected line during handshake: {line}"),
            }
        }
        debug!(
            "engine {:?} by {:?}: {} options, {} variants",
            self.info.name,
            self.info.author,
            self.info.options.len(),
            self.info.variants.len()
        );
        Ok(&self.info)
    }

    pub fn set_option(&mut self, name: &str, value: OptionValue) -> Result<(), EngineError> {
        self.send(&encode_setoption(name, &value))?;
        self.sent.insert(name.to_string(), value);
        self.ready = false;
        Ok(())
    }

    /// 宣言されているオプションだけ送る。宣言が 1 つもなければすべて送る。
    pub fn set_option_if_available(
        &mut self,
        name: &str,
        value: OptionValue,
    ) -> Result<(), EngineError> {
        if self.info.options.is_empty() || self.info.has_option(name) {
            self.set_option(name, value)
        } else {
            debug!("engine does not declare option '{name}', skipped");
            Ok(())
        }
    }

    pub fn configure<I>(&mut self, options: I) -> Result<(), EngineError>
    where
        I: IntoIterator<Item = (String, OptionValue)>,
    {
        for (name, value) in options {
            self.set_option(&name, value)?;
        }
        Ok(())
    }

    /// `isready` を送り `readyok` まで待つ
    pub fn await_ready(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        loop {
            let line = self.recv()?;
            let (cmd, rest) = split_command(&line);
            match cmd {
                "readyok" => break,
                "info" if rest.starts_with("string") => {}
                "" => {}
                _ => warn!("unexpected line while waiting for readyok: {line}"),
            }
        }
        self.ready = true;
        Ok(())
    }

    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.send("ucinewgame")?;
        self.ready = false;
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.transport.close();
        self.ready = false;
    }
}

/// `Fairy-Stockfish 14 by Fabian Fichter` のような起動メッセージ
fn is_banner(line: &str) -> bool {
    line.contains(" by ")
}

fn flush_option_field(field: Option<&str>, buf: &mut Vec<&str>, option: &mut EngineOption) {
    let value = buf.join(" ");
    buf.clear();
    match field {
        Some("name") => option.name = value,
        Some("type") => option.kind = value,
        Some("default") => option.default = Some(value),
        Some("min") => option.min = Some(value),
        Some("max") => option.max = Some(value),
        Some("var") => option.vars.push(value),
        _ => {}
    }
}

/// `option` に続く部分を解析する
pub fn parse_option(rest: &str) -> Option<EngineOption> {
    const FIELDS: [&str; 6] = ["name", "type", "default", "min", "max", "var"];
    let mut option = EngineOption::default();
    let mut current: Option<&str> = None;
    let mut buf: Vec<&str> = Vec::new();

    for token in rest.split_whitespace() {
        // 名前の途中に "type" 以外のキーワードが来ても名前の一部として扱う
        let is_field = FIELDS.contains(&token) && (current != Some("name") || token == "type");
        if is_field {
            flush_option_field(current, &mut buf, &mut option);
            current = Some(token);
        } else {
            buf.push(token);
        }
    }
    flush_option_field(current, &mut buf, &mut option);

    if option.name.is_empty() {
        None
    } else {
        Some(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option_combo() {
        let option = parse_option(
            "name UCI_Variant type combo default chess var chess var xiangqi var shogi",
        )
        .unwrap();
        assert_eq!(option.name, "UCI_Variant");
        assert_eq!(option.kind, "combo");
        assert_eq!(option.default.as_deref(), Some("chess"));
        assert_eq!(option.vars, vec!["chess", "xiangqi", "shogi"]);
    }

    #[test]
    fn test_parse_option_spin_with_spaces_in_name() {
        let option = parse_option("name Skill Level type spin default 20 min 0 max 20").unwrap();
        assert_eq!(option.name, "Skill Level");
        assert_eq!(option.min.as_deref(), Some("0"));
        assert_eq!(option.max.as_deref(), Some("20"));
    }

    #[test]
    fn test_parse_option_empty_default() {
        let option = parse_option("name EvalFile type string default").unwrap();
        assert_eq!(option.default.as_deref(), Some(""));
        assert!(parse_option("type spin").is_none());
    }

    #[test]
    fn test_banner_detection() {
        assert!(is_banner("Pikafish 2024-06 by the Pikafish developers"));
        assert!(!is_banner("readyok"));
    }
}
