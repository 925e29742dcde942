//! Stats store models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;

use crate::db::schema;

/// Running counters for one (user, game-type) pair.
///
/// `played` may exceed `wins + losses + draws`: abandoned games increment
/// only `played`, for every participant. That is a documented policy, not a
/// bug.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::player_stats)]
pub struct PlayerStat {
    id: i32,
    user_id: String,
    game_type: String,
    wins: i32,
    losses: i32,
    draws: i32,
    played: i32,
    updated_at: NaiveDateTime,
}

impl PlayerStat {
    /// Win rate as a percentage of played games (0.0 to 100.0).
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            0.0
        } else {
            (self.wins as f64 / self.played as f64) * 100.0
        }
    }
}

/// Insertable row used when no counters exist yet for the pair.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::player_stats)]
pub struct NewPlayerStat {
    user_id: String,
    game_type: String,
    wins: i32,
    losses: i32,
    draws: i32,
    played: i32,
}

/// Counter increments to apply in one atomic upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, new)]
pub struct StatDelta {
    /// Wins to add.
    pub wins: i32,
    /// Losses to add.
    pub losses: i32,
    /// Draws to add.
    pub draws: i32,
    /// Played games to add.
    pub played: i32,
}

impl StatDelta {
    /// A win plus one played game.
    pub fn win() -> Self {
        Self::new(1, 0, 0, 1)
    }

    /// A loss plus one played game.
    pub fn loss() -> Self {
        Self::new(0, 1, 0, 1)
    }

    /// A draw plus one played game.
    pub fn draw() -> Self {
        Self::new(0, 0, 1, 1)
    }

    /// One played game with no outcome attribution (abandonment).
    pub fn played_only() -> Self {
        Self::new(0, 0, 0, 1)
    }
}
