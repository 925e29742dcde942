//! Stats repository: atomic upsert-and-increment on counter rows.

use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::{schema, DbError, NewPlayerStat, PlayerStat, StatDelta};

/// Repository over the player_stats table.
///
/// Counter rows are only ever mutated through [`StatsRepository::apply_delta`],
/// never via a blind overwrite, so concurrent completions touching the same
/// row both land.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db_path: String,
}

impl StatsRepository {
    /// Creates a repository over the database at the given path.
    ///
    /// Use `":memory:"` for an in-memory database in tests.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Self {
        info!(path = %db_path, "Creating StatsRepository");
        Self { db_path }
    }

    /// Establishes a database connection.
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("failed to connect to '{}': {e}", self.db_path)))
    }

    /// Applies counter increments for a (user, game-type) pair.
    ///
    /// Creates the row with the delta as its initial counters if it does not
    /// exist, otherwise increments in place. One statement, atomic either
    /// way.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on a database failure.
    #[instrument(skip(self))]
    pub fn apply_delta(
        &self,
        user_id: &str,
        game_type: &str,
        delta: StatDelta,
    ) -> Result<PlayerStat, DbError> {
        use schema::player_stats::dsl;

        debug!(user_id, game_type, ?delta, "Applying stat delta");
        let mut conn = self.connection()?;

        let row = diesel::insert_into(dsl::player_stats)
            .values(NewPlayerStat::new(
                user_id.to_string(),
                game_type.to_string(),
                delta.wins,
                delta.losses,
                delta.draws,
                delta.played,
            ))
            .on_conflict((dsl::user_id, dsl::game_type))
            .do_update()
            .set((
                dsl::wins.eq(dsl::wins + delta.wins),
                dsl::losses.eq(dsl::losses + delta.losses),
                dsl::draws.eq(dsl::draws + delta.draws),
                dsl::played.eq(dsl::played + delta.played),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .returning(PlayerStat::as_returning())
            .get_result(&mut conn)?;

        info!(
            user_id,
            game_type,
            wins = row.wins(),
            losses = row.losses(),
            draws = row.draws(),
            played = row.played(),
            "Stat row updated"
        );
        Ok(row)
    }

    /// Reads the counter row for a (user, game-type) pair, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on a database failure.
    #[instrument(skip(self))]
    pub fn get_stat(&self, user_id: &str, game_type: &str) -> Result<Option<PlayerStat>, DbError> {
        use schema::player_stats::dsl;

        let mut conn = self.connection()?;
        let row = dsl::player_stats
            .filter(dsl::user_id.eq(user_id))
            .filter(dsl::game_type.eq(game_type))
            .first::<PlayerStat>(&mut conn)
            .optional()?;
        Ok(row)
    }

    /// Reads every counter row for a user, ordered by game type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on a database failure.
    #[instrument(skip(self))]
    pub fn get_user_stats(&self, user_id: &str) -> Result<Vec<PlayerStat>, DbError> {
        use schema::player_stats::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::player_stats
            .filter(dsl::user_id.eq(user_id))
            .order(dsl::game_type.asc())
            .load::<PlayerStat>(&mut conn)?;

        debug!(user_id, count = rows.len(), "User stats loaded");
        Ok(rows)
    }
}
