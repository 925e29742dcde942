//! Stats aggregation: attribution of terminal outcomes to counter rows.

use derive_getters::Getters;
use derive_new::new;
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, PlayerStat, StatDelta, StatsRepository};
use crate::games::{GamePlayer, GameType};

/// Counters summed across every game type a user has played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Getters, new)]
pub struct StatsSummary {
    wins: i32,
    losses: i32,
    draws: i32,
    played: i32,
}

impl StatsSummary {
    /// Sums a user's per-game-type rows.
    pub fn from_rows(rows: &[PlayerStat]) -> Self {
        rows.iter().fold(Self::default(), |acc, row| {
            Self::new(
                acc.wins + row.wins(),
                acc.losses + row.losses(),
                acc.draws + row.draws(),
                acc.played + row.played(),
            )
        })
    }

    /// Win rate as a percentage of played games (0.0 to 100.0).
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            0.0
        } else {
            (self.wins as f64 / self.played as f64) * 100.0
        }
    }
}

/// Consumes terminal outcomes and updates per-user, per-game-type counters.
#[derive(Debug, Clone)]
pub struct StatsService {
    repository: StatsRepository,
}

impl StatsService {
    /// Creates a stats service backed by the given repository.
    #[instrument(skip(repository))]
    pub fn new(repository: StatsRepository) -> Self {
        info!("Creating StatsService");
        Self { repository }
    }

    /// Records a completed session.
    ///
    /// With a winner: the winner gets win+played, every other roster member
    /// gets loss+played. A draw (`winner_id` = `None`): everyone gets
    /// draw+played. An empty roster is a no-op rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if an increment fails; increments already applied
    /// are not rolled back.
    #[instrument(skip(self, roster), fields(game_type = %game_type, roster_len = roster.len()))]
    pub fn record_completion(
        &self,
        roster: &[GamePlayer],
        winner_id: Option<&str>,
        game_type: GameType,
    ) -> Result<(), DbError> {
        if roster.is_empty() {
            debug!("Empty roster, nothing to record");
            return Ok(());
        }
        if let Some(winner) = winner_id {
            if !roster.iter().any(|p| p.user_id == winner) {
                warn!(winner, "Winner is not a roster member");
            }
        }

        let game_type = game_type.to_string();
        for player in roster {
            let delta = match winner_id {
                Some(winner) if player.user_id == winner => StatDelta::win(),
                Some(_) => StatDelta::loss(),
                None => StatDelta::draw(),
            };
            self.repository
                .apply_delta(&player.user_id, &game_type, delta)?;
        }

        info!(winner = ?winner_id, "Completion recorded");
        Ok(())
    }

    /// Records an abandoned session: every roster member, the abandoning
    /// user included, gets only a played increment. No win, loss, or draw is
    /// attributed to any party.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if an increment fails.
    #[instrument(skip(self, roster), fields(game_type = %game_type, roster_len = roster.len()))]
    pub fn record_abandonment(
        &self,
        roster: &[GamePlayer],
        game_type: GameType,
    ) -> Result<(), DbError> {
        let game_type = game_type.to_string();
        for player in roster {
            self.repository
                .apply_delta(&player.user_id, &game_type, StatDelta::played_only())?;
        }
        info!("Abandonment recorded");
        Ok(())
    }

    /// Returns every counter row for a user plus the cross-game summary.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on a database failure.
    #[instrument(skip(self))]
    pub fn get_user_stats(&self, user_id: &str) -> Result<(Vec<PlayerStat>, StatsSummary), DbError> {
        let rows = self.repository.get_user_stats(user_id)?;
        let summary = StatsSummary::from_rows(&rows);
        Ok((rows, summary))
    }
}
