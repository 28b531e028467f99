#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("board field has {found} ranks, expected 8")]
    InvalidRankCount { found: usize },
    #[error("rank {rank} describes {squares} squares, expected 8")]
    InvalidRank { rank: usize, squares: usize },
    #[error("invalid board symbol {symbol:?}")]
    InvalidSymbol { symbol: char },
    #[error("position needs 64 squares, got {found}")]
    InvalidSquareCount { found: usize },
    #[error("FEN record has {found} fields, expected 6")]
    InvalidFieldCount { found: usize },
    #[error("invalid {field} field {value:?}")]
    InvalidField { field: &'static str, value: String },
}
