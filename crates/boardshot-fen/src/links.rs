//! Analysis-site links, derived from a FEN string alone.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

const LICHESS: &str = "https://lichess.org";
const CHESSCOM_ANALYSIS: &str = "https://www.chess.com/analysis";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisLinks {
    pub lichess_editor: String,
    pub lichess_analysis: String,
    pub chesscom: String,
}

impl AnalysisLinks {
    /// Links for a standard six-field FEN.
    pub fn from_fen(fen: &str) -> Self {
        let lichess_fen = fen.replace(' ', "_");
        Self {
            lichess_editor: format!("{LICHESS}/editor/{lichess_fen}"),
            lichess_analysis: format!("{LICHESS}/analysis/{lichess_fen}"),
            chesscom: format!("{CHESSCOM_ANALYSIS}?fen={}", percent_encode(fen)),
        }
    }
}

/// Percent-encode everything except RFC 3986 unreserved characters and `/`.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(char::from(b));
        } else {
            // Writing to a String cannot fail.
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn lichess_links_use_underscores() {
        let links = AnalysisLinks::from_fen(START_FEN);
        assert_eq!(
            links.lichess_editor,
            "https://lichess.org/editor/rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR_w_KQkq_-_0_1"
        );
        assert!(links.lichess_analysis.starts_with("https://lichess.org/analysis/rnbqkbnr/"));
    }

    #[test]
    fn chesscom_link_is_percent_encoded() {
        let links = AnalysisLinks::from_fen(START_FEN);
        assert_eq!(
            links.chesscom,
            "https://www.chess.com/analysis?fen=rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR%20w%20KQkq%20-%200%201"
        );
    }
}
