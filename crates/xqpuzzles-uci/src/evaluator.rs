//! 局面の評価
//!
//! 1 回の探索ごとに multipv 番号で添字付けした `InfoRecord` を集約し、`bestmove` を
//! 受け取った時点で評価値を持つ行だけを返す。評価値はすべて紅視点に直す。

use log::{debug, warn};
use xqpuzzles_core::{Board, Bound, Score};

use crate::codec::{InfoRecord, SearchLimits, encode_go, encode_position, parse_info, split_command};
use crate::error::EngineError;
use crate::process::Transport;
use crate::session::{EngineSession, OptionValue};

/// 候補手 1 本分の解析結果
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisLine {
    /// 読み筋の先頭。読み筋が無いときは `None`。
    pub mv: Option<String>,
    pub notation: Option<String>,
    /// 紅視点
    pub score: Score,
    pub bound: Bound,
    /// エンジン方言の読み筋
    pub pv: Vec<String>,
    pub depth: Option<u32>,
}

impl AnalysisLine {
    fn from_record(board: &Board, record: InfoRecord) -> Option<AnalysisLine> {
        let score = record.score?.red();
        let pv = record.pv.unwrap_or_default();
        let mv = pv.first().cloned();
        let notation = mv
            .as_deref()
            .and_then(|m| board.notation(m, board.dialect()).ok());
        Some(AnalysisLine {
            mv,
            notation,
            score,
            bound: record.bound,
            pv,
            depth: record.depth,
        })
    }
}

/// 上位 `multipv` 本の候補を探索する
pub fn analyse<T: Transport>(
    session: &mut EngineSession<T>,
    board: &Board,
    limits: &SearchLimits,
    multipv: usize,
) -> Result<Vec<AnalysisLine>, EngineError> {
    let multipv = multipv.max(1);
    session.set_option("MultiPV", OptionValue::Int(multipv as i64))?;
    session.new_game()?;
    session.await_ready()?;
    session.send(&encode_position(board.root_fen(), &board.stack()))?;
    session.send(&encode_go(limits))?;

    let turn = board.turn();
    let mut records: Vec<InfoRecord> = vec![InfoRecord::default(); multipv];
    loop {
        let line = session.recv()?;
        let (cmd, rest) = split_command(&line);
        match cmd {
            "info" => {
                let info = parse_info(rest, turn);
                let index = info.index();
                match records.get_mut(index.wrapping_sub(1)) {
                    Some(record) => record.merge(info),
                    None => warn!("multipv {index} is out of range (1..={multipv}), dropped"),
                }
            }
            "bestmove" => break,
            "" => {}
            _ => debug!("ignoring line during search: {line}"),
        }
    }

    Ok(records
        .into_iter()
        .filter_map(|record| AnalysisLine::from_record(board, record))
        .collect())
}

/// 最善の 1 本だけを返す
pub fn best_line<T: Transport>(
    session: &mut EngineSession<T>,
    board: &Board,
    limits: &SearchLimits,
) -> Result<AnalysisLine, EngineError> {
    analyse(session, board, limits, 1)?
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::protocol("search finished without a scored line"))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use xqpuzzles_core::Dialect;

    use super::*;

    /// 送信行を記録し、台本どおりの行を返す
    struct Scripted {
        replies: VecDeque<String>,
        sent: Vec<String>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Scripted {
            Scripted {
                replies: replies.iter().map(|s| s.to_string()).collect(),
                sent: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
            self.sent.push(line.to_string());
            Ok(())
        }

        fn recv_line(&mut self) -> Result<String, EngineError> {
            self.replies
                .pop_front()
                .ok_or_else(|| EngineError::protocol("script exhausted"))
        }

        fn close(&mut self) {}
    }

    fn session(replies: &[&str]) -> EngineSession<Scripted> {
        EngineSession::new(Scripted::new(replies))
    }

    #[test]
    fn test_analyse_demultiplexes_interleaved_lines() {
        let mut session = session(&[
            "readyok",
            "info depth 5 multipv 2 score cp 20 pv h2e2",
            "info depth 5 multipv 1 score cp 40 pv b2e2",
            "info depth 5 multipv 3 score cp -10 pv h0g2",
            "info depth 6 multipv 1 score cp 45 lowerbound pv b2e2 h9g7",
            "info depth 6 multipv 2 nodes 500",
            "bestmove b2e2 ponder h9g7",
        ]);
        let board = Board::new(Dialect::Ucci);
        let lines = analyse(&mut session, &board, &SearchLimits::depth(6), 3).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].mv.as_deref(), Some("b2e2"));
        assert_eq!(lines[0].score, Score::Cp(45));
        assert_eq!(lines[0].bound, Bound::Lower);
        assert_eq!(lines[0].pv.len(), 2);
        assert_eq!(lines[0].notation.as_deref(), Some("C8=5"));
        assert_eq!(lines[1].mv.as_deref(), Some("h2e2"));
        assert_eq!(lines[1].depth, Some(6));
        assert_eq!(lines[1].score, Score::Cp(20));
        assert_eq!(lines[2].score, Score::Cp(-10));

        let sent = &session.transport_ref().sent;
        assert_eq!(sent[0], "setoption name MultiPV value 3");
        assert_eq!(sent[1], "ucinewgame");
        assert_eq!(sent[2], "isready");
        assert_eq!(sent[3], format!("position fen {}", board.root_fen()));
        assert_eq!(sent[4], "go depth 6");
    }

    #[test]
    fn test_scores_are_reported_for_red() {
        let mut session = session(&["readyok", "info depth 3 score cp 80 pv h9g7", "bestmove h9g7"]);
        let mut board = Board::new(Dialect::Ucci);
        board.push(&["h2e2"], Dialect::Ucci).unwrap();
        let line = best_line(&mut session, &board, &SearchLimits::depth(3)).unwrap();
        // 黒番の +80 は紅視点で -80
        assert_eq!(line.score, Score::Cp(-80));
        assert!(session.transport_ref().sent[3].ends_with("moves h2e2"));
    }

    #[test]
    fn test_unscored_and_out_of_range_records_are_dropped() {
        let mut session = session(&[
            "readyok",
            "info depth 1 multipv 2 pv h2e2",
            "info depth 1 multipv 7 score cp 5 pv h2e2",
            "info depth 1 multipv 1 score cp 12 pv b2e2",
            "bestmove b2e2",
        ]);
        let board = Board::new(Dialect::Ucci);
        let lines = analyse(&mut session, &board, &SearchLimits::depth(1), 2).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].score, Score::Cp(12));
    }

    #[test]
    fn test_line_without_pv_keeps_score() {
        let mut session = session(&["readyok", "info depth 1 score mate -1", "bestmove (none)"]);
        let board = Board::new(Dialect::Uci);
        let line = best_line(&mut session, &board, &SearchLimits::depth(1)).unwrap();
        assert_eq!(line.mv, None);
        assert_eq!(line.notation, None);
        assert!(line.pv.is_empty());
        assert_eq!(line.score, Score::Mate(-1));
    }

    #[test]
    fn test_stream_closed_before_bestmove() {
        let mut session = session(&["readyok", "info depth 1 score cp 3 pv h3e3"]);
        let board = Board::new(Dialect::Uci);
        let err = best_line(&mut session, &board, &SearchLimits::depth(1)).unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }

    #[test]
    fn test_no_scored_line_is_protocol_error() {
        let mut session = session(&["readyok", "info depth 1 nodes 10", "bestmove h3e3"]);
        let board = Board::new(Dialect::Uci);
        let err = best_line(&mut session, &board, &SearchLimits::depth(1)).unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }
}
