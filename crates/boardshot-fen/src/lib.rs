//! Positions and FEN records for boardshot.
//!
//! A [`Position`] is the 8×8 grid as it appears in the screenshot. The
//! side to move and castling rights cannot be read off an image, so they
//! arrive separately as a [`GameState`] and are merged only when a
//! [`FenRecord`] is built. Everything downstream of the record, such as the
//! simplified board string and [`AnalysisLinks`], is re-derived from it and
//! never cached.
//!
//! ```
//! use boardshot_fen::{FenRecord, GameState, Position};
//!
//! let rec = FenRecord::new(&Position::starting(), &GameState::default());
//! assert_eq!(rec.standard(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
//! ```

mod error;
mod fen;
mod links;
mod position;
mod state;

pub use error::FenError;
pub use fen::{flip_board_field, FenRecord};
pub use links::AnalysisLinks;
pub use position::Position;
pub use state::{ActiveColor, CastlingRights, GameState, Perspective};
