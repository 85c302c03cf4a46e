//! Game selection over the curated `gamechoices` / `hiddengames` lists.
//!
//! # Selection Convention
//! ```text
//! selection == 0  → random pick from visible (1-based, uniform over [1, len])
//! selection  > 0  → visible[selection - 1]
//! selection  < 0  → hidden[|selection| - 1]
//! ```
//!
//! # Design Decisions
//! - Selections are 1-based so that 0 stays free for "random"
//! - Hidden games are never returned by a random pick
//! - `find_game_index` returns 0 for "not found", which is also the "random"
//!   selector. Callers that round-trip an unknown name get a random game.
//!   Kept as-is; no consumer currently needs to tell the two apart.

use rand::Rng;

/// Select a game by its 1-based selector, using the thread-local RNG for
/// random picks.
///
/// Returns `None` for out-of-range selectors or when a random pick is
/// requested from an empty visible list.
pub fn select_game<'a>(selection: i64, visible: &'a [String], hidden: &'a [String]) -> Option<&'a str> {
    select_game_with(selection, visible, hidden, &mut rand::thread_rng())
}

/// Same as [`select_game`] with an injected RNG.
pub fn select_game_with<'a, R: Rng>(
    selection: i64,
    visible: &'a [String],
    hidden: &'a [String],
    rng: &mut R,
) -> Option<&'a str> {
    let (list, position) = if selection == 0 {
        if visible.is_empty() {
            return None;
        }
        (visible, rng.gen_range(1..=visible.len()))
    } else if selection > 0 {
        (visible, usize::try_from(selection).ok()?)
    } else {
        (hidden, usize::try_from(selection.unsigned_abs()).ok()?)
    };

    list.get(position - 1).map(String::as_str)
}

/// Find the selector for a game name (case-insensitive exact match).
///
/// Visible games yield `1..=len`, hidden games yield `-1..=-len`, and an
/// unknown name yields `0`.
pub fn find_game_index(name: &str, visible: &[String], hidden: &[String]) -> i64 {
    let wanted = name.to_uppercase();
    let matches = |game: &String| game.to_uppercase() == wanted;

    if let Some(i) = visible.iter().position(matches) {
        return i as i64 + 1;
    }
    if let Some(j) = hidden.iter().position(matches) {
        return -(j as i64 + 1);
    }
    0
}
