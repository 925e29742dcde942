//! Tests for the stats repository and attribution policy.

use diesel::{Connection, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tempfile::NamedTempFile;

use parlor::{
    GamePlayer, GameType, Mark, StatDelta, StatsRepository, StatsService, StatsSummary,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn setup() -> (NamedTempFile, StatsRepository) {
    let db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db.path().to_str().expect("Invalid path").to_string();
    let mut conn = SqliteConnection::establish(&db_path).expect("Failed to connect");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Migrations failed");
    let repository = StatsRepository::new(db_path);
    (db, repository)
}

fn player(id: &str, mark: Mark) -> GamePlayer {
    GamePlayer {
        user_id: id.to_string(),
        username: id.to_string(),
        display_name: id.to_string(),
        mark,
    }
}

fn roster() -> Vec<GamePlayer> {
    vec![player("alice", Mark::X), player("bob", Mark::O)]
}

#[test]
fn test_first_delta_creates_row() {
    let (_db, repo) = setup();

    assert!(repo
        .get_stat("alice", "tic_tac_toe")
        .expect("Get failed")
        .is_none());

    let row = repo
        .apply_delta("alice", "tic_tac_toe", StatDelta::win())
        .expect("Delta failed");
    assert_eq!(row.user_id(), "alice");
    assert_eq!(row.game_type(), "tic_tac_toe");
    assert_eq!(*row.wins(), 1);
    assert_eq!(*row.losses(), 0);
    assert_eq!(*row.played(), 1);
}

#[test]
fn test_deltas_increment_in_place() {
    let (_db, repo) = setup();

    repo.apply_delta("alice", "tic_tac_toe", StatDelta::win())
        .expect("Delta failed");
    repo.apply_delta("alice", "tic_tac_toe", StatDelta::loss())
        .expect("Delta failed");
    repo.apply_delta("alice", "tic_tac_toe", StatDelta::draw())
        .expect("Delta failed");
    let row = repo
        .apply_delta("alice", "tic_tac_toe", StatDelta::played_only())
        .expect("Delta failed");

    assert_eq!(*row.wins(), 1);
    assert_eq!(*row.losses(), 1);
    assert_eq!(*row.draws(), 1);
    assert_eq!(*row.played(), 4);
}

#[test]
fn test_rows_keyed_by_user_and_game_type() {
    let (_db, repo) = setup();

    repo.apply_delta("alice", "tic_tac_toe", StatDelta::win())
        .expect("Delta failed");
    repo.apply_delta("alice", "connect_four", StatDelta::loss())
        .expect("Delta failed");
    repo.apply_delta("bob", "tic_tac_toe", StatDelta::loss())
        .expect("Delta failed");

    let rows = repo.get_user_stats("alice").expect("Get failed");
    assert_eq!(rows.len(), 2);
    // Ordered by game type.
    assert_eq!(rows[0].game_type(), "connect_four");
    assert_eq!(rows[1].game_type(), "tic_tac_toe");

    let rows = repo.get_user_stats("bob").expect("Get failed");
    assert_eq!(rows.len(), 1);
    assert_eq!(*rows[0].losses(), 1);
}

#[test]
fn test_completion_attributes_win_and_losses() {
    let (_db, repo) = setup();
    let stats = StatsService::new(repo.clone());

    stats
        .record_completion(&roster(), Some("bob"), GameType::ConnectFour)
        .expect("Record failed");

    let alice = repo
        .get_stat("alice", "connect_four")
        .expect("Get failed")
        .expect("Missing row");
    assert_eq!(*alice.losses(), 1);
    assert_eq!(*alice.played(), 1);

    let bob = repo
        .get_stat("bob", "connect_four")
        .expect("Get failed")
        .expect("Missing row");
    assert_eq!(*bob.wins(), 1);
    assert_eq!(*bob.played(), 1);
}

#[test]
fn test_completion_draw_credits_everyone() {
    let (_db, repo) = setup();
    let stats = StatsService::new(repo.clone());

    stats
        .record_completion(&roster(), None, GameType::TicTacToe)
        .expect("Record failed");

    for user in ["alice", "bob"] {
        let row = repo
            .get_stat(user, "tic_tac_toe")
            .expect("Get failed")
            .expect("Missing row");
        assert_eq!(*row.draws(), 1);
        assert_eq!(*row.played(), 1);
    }
}

#[test]
fn test_completion_empty_roster_is_noop() {
    let (_db, repo) = setup();
    let stats = StatsService::new(repo.clone());

    stats
        .record_completion(&[], Some("alice"), GameType::TicTacToe)
        .expect("Record failed");
    assert!(repo
        .get_stat("alice", "tic_tac_toe")
        .expect("Get failed")
        .is_none());
}

#[test]
fn test_unknown_winner_still_charges_losses() {
    let (_db, repo) = setup();
    let stats = StatsService::new(repo.clone());

    stats
        .record_completion(&roster(), Some("mallory"), GameType::TicTacToe)
        .expect("Record failed");

    for user in ["alice", "bob"] {
        let row = repo
            .get_stat(user, "tic_tac_toe")
            .expect("Get failed")
            .expect("Missing row");
        assert_eq!(*row.losses(), 1);
    }
    assert!(repo
        .get_stat("mallory", "tic_tac_toe")
        .expect("Get failed")
        .is_none());
}

#[test]
fn test_abandonment_charges_played_only() {
    let (_db, repo) = setup();
    let stats = StatsService::new(repo.clone());

    stats
        .record_abandonment(&roster(), GameType::TicTacToe)
        .expect("Record failed");

    for user in ["alice", "bob"] {
        let row = repo
            .get_stat(user, "tic_tac_toe")
            .expect("Get failed")
            .expect("Missing row");
        assert_eq!(*row.played(), 1);
        assert_eq!(*row.wins(), 0);
        assert_eq!(*row.losses(), 0);
        assert_eq!(*row.draws(), 0);
    }
}

#[test]
fn test_summary_sums_across_game_types() {
    let (_db, repo) = setup();
    let stats = StatsService::new(repo.clone());

    repo.apply_delta("alice", "tic_tac_toe", StatDelta::win())
        .expect("Delta failed");
    repo.apply_delta("alice", "connect_four", StatDelta::win())
        .expect("Delta failed");
    repo.apply_delta("alice", "connect_four", StatDelta::loss())
        .expect("Delta failed");

    let (rows, summary) = stats.get_user_stats("alice").expect("Stats failed");
    assert_eq!(rows.len(), 2);
    assert_eq!(*summary.wins(), 2);
    assert_eq!(*summary.losses(), 1);
    assert_eq!(*summary.played(), 3);
    assert!((summary.win_rate() - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_win_rate_zero_when_unplayed() {
    let summary = StatsSummary::default();
    assert_eq!(summary.win_rate(), 0.0);
}
