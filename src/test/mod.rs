//! Shared fixtures for the crate's tests: an in-memory database with the
//! migrations applied, plus factories for teams, matches and ranked
//! standings.

use chrono::Utc;
use diesel::{
    SqliteConnection,
    connection::LoadConnection,
    prelude::*,
    r2d2::{ConnectionManager, Pool, PooledConnection},
    sqlite::Sqlite,
};
use diesel_migrations::MigrationHarness;
use uuid::Uuid;

use crate::{
    schema::{group_matches, teams},
    state::DbPool,
    tournament::{Category, standings::Standing, teams::Team},
};

mod operator_workload;

pub fn test_pool() -> DbPool {
    let pool = Pool::builder()
        .max_size(1)
        .build(ConnectionManager::<SqliteConnection>::new(":memory:"))
        .unwrap();

    let mut conn = pool.get().unwrap();
    conn.run_pending_migrations(crate::MIGRATIONS).unwrap();

    pool
}

pub fn test_conn() -> PooledConnection<ConnectionManager<SqliteConnection>> {
    test_pool().get().unwrap()
}

pub fn insert_team(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    category: Category,
    group: Option<&str>,
    name: &str,
) -> String {
    let id = Uuid::now_v7().to_string();
    diesel::insert_into(teams::table)
        .values((
            teams::id.eq(&id),
            teams::name.eq(name),
            teams::category.eq(category.as_str()),
            teams::group_name.eq(group),
            teams::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)
        .unwrap();
    id
}

/// Inserts `n` teams named "Team 1".."Team n" and returns them in that
/// (seeded) order.
pub fn test_teams(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    category: Category,
    n: usize,
) -> Vec<Team> {
    (1..=n)
        .map(|i| {
            let id =
                insert_team(conn, category, None, &format!("Team {i}"));
            Team::fetch(&id, conn).unwrap()
        })
        .collect()
}

pub fn insert_group_match(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    category: Category,
    group: Option<&str>,
    match_day: i64,
    match_number: i64,
    team1: &str,
    team2: &str,
) -> String {
    let id = Uuid::now_v7().to_string();
    let now = Utc::now().naive_utc();
    diesel::insert_into(group_matches::table)
        .values((
            group_matches::id.eq(&id),
            group_matches::category.eq(category.as_str()),
            group_matches::group_name.eq(group),
            group_matches::match_day.eq(match_day),
            group_matches::match_number.eq(match_number),
            group_matches::team1_id.eq(Some(team1)),
            group_matches::team2_id.eq(Some(team2)),
            group_matches::status.eq("pending"),
            group_matches::created_at.eq(now),
            group_matches::updated_at.eq(now),
        ))
        .execute(&mut *conn)
        .unwrap();
    id
}

/// Inserts `n` teams and fabricates a ranked standings list for them (rank 1
/// first), the shape the playoff initializer consumes.
pub fn test_standings(
    conn: &mut impl LoadConnection<Backend = Sqlite>,
    category: Category,
    n: usize,
) -> (Vec<String>, Vec<Standing>) {
    let teams = test_teams(conn, category, n);
    let ids: Vec<String> = teams.iter().map(|t| t.id.clone()).collect();

    let standings = teams
        .iter()
        .enumerate()
        .map(|(i, team)| Standing {
            team_id: team.id.clone(),
            name: team.name.clone(),
            class_name: None,
            category: team.category.clone(),
            group_name: None,
            played: (n - 1) as i64,
            won: (n - 1 - i) as i64,
            drawn: 0,
            lost: i as i64,
            goals_for: 2 * (n - 1 - i) as i64,
            goals_against: 2 * i as i64,
            goal_difference: 2 * (n - 1) as i64 - 4 * i as i64,
            points: 3 * (n - 1 - i) as i64,
        })
        .collect();

    (ids, standings)
}
