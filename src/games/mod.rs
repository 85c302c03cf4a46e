//! Game selection subsystem.
//!
//! # Data Flow
//! ```text
//! games upstream body
//!     → upstream::payload::GamesPayload (typed shape check)
//!     → selector.rs (select by number / find by name)
//!     → task field value ("game", "gameindex")
//! ```

pub mod selector;

pub use selector::{find_game_index, select_game, select_game_with};
