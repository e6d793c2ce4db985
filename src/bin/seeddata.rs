//! Seeds the database: creates (or resets) the operator account and, on
//! request, generates the round-robin group schedule for every category.
//! The web application itself never generates schedules.

use argon2::Argon2;
use argon2::PasswordHasher;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use chrono::Utc;
use clap::Parser;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use superball::MIGRATIONS;
use superball::schema::{group_matches, teams, users};
use superball::tournament::Category;
use uuid::Uuid;

#[derive(Parser)]
pub struct Seed {
    database_url: Option<String>,
    /// Create or update the operator account with this email.
    #[clap(long)]
    admin_email: Option<String>,
    #[clap(long)]
    admin_password: Option<String>,
    #[clap(long, default_value = "admin")]
    admin_username: String,
    /// Generate the round-robin group schedule for every category which does
    /// not have one yet.
    #[clap(long, action)]
    schedule: bool,
}

fn main() {
    let args = Seed::parse();
    let db_url = if let Some(url) = args.database_url {
        url
    } else {
        std::env::var("DATABASE_URL").expect(
            "please either set `DATABASE_URL` or pass the database url as \
             the first argument",
        )
    };

    let mut conn = diesel::SqliteConnection::establish(&db_url).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();

    if let (Some(email), Some(password)) =
        (&args.admin_email, &args.admin_password)
    {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();

        let existing = users::table
            .filter(users::email.eq(email))
            .select(users::id)
            .first::<String>(&mut conn)
            .optional()
            .unwrap();

        match existing {
            Some(id) => {
                diesel::update(users::table.filter(users::id.eq(id)))
                    .set(users::password_hash.eq(&hash))
                    .execute(&mut conn)
                    .unwrap();
                println!("updated password for {email}");
            }
            None => {
                diesel::insert_into(users::table)
                    .values((
                        users::id.eq(Uuid::now_v7().to_string()),
                        users::email.eq(email),
                        users::username.eq(&args.admin_username),
                        users::password_hash.eq(&hash),
                        users::created_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(&mut conn)
                    .unwrap();
                println!("created operator account {email}");
            }
        }
    }

    if args.schedule {
        for category in Category::ALL {
            seed_schedule(category, &mut conn);
        }
    }
}

/// Classic circle-method round robin: one round per opponent, the first team
/// fixed, everyone else rotating. An odd team count gives one team per round
/// a rest day.
fn round_robin_pairs(team_ids: &[String]) -> Vec<Vec<(String, String)>> {
    let mut ids: Vec<Option<String>> =
        team_ids.iter().cloned().map(Some).collect();
    if ids.len() % 2 == 1 {
        ids.push(None);
    }

    let n = ids.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let mut pairs = Vec::new();
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) =
                (ids[i].clone(), ids[n - 1 - i].clone())
            {
                pairs.push((a, b));
            }
        }
        rounds.push(pairs);

        let last = ids.pop().unwrap();
        ids.insert(1, last);
    }
    rounds
}

fn seed_schedule(category: Category, conn: &mut SqliteConnection) {
    let existing = group_matches::table
        .filter(group_matches::category.eq(category.as_str()))
        .count()
        .get_result::<i64>(conn)
        .unwrap();
    if existing > 0 {
        println!("{category}: schedule already present, skipping");
        return;
    }

    let groups: Vec<Option<&str>> = if category.groups().is_empty() {
        vec![None]
    } else {
        category.groups().iter().map(|g| Some(*g)).collect()
    };

    let mut match_number = 1;
    let mut total = 0;
    for group in groups {
        let mut query = teams::table
            .filter(teams::category.eq(category.as_str()))
            .order_by(teams::created_at.asc())
            .select(teams::id)
            .into_boxed();
        if let Some(group) = group {
            query = query.filter(teams::group_name.eq(group));
        }
        let team_ids = query.load::<String>(conn).unwrap();

        for (day, pairs) in round_robin_pairs(&team_ids).iter().enumerate() {
            for (team1, team2) in pairs {
                let now = Utc::now().naive_utc();
                let n = diesel::insert_into(group_matches::table)
                    .values((
                        group_matches::id.eq(Uuid::now_v7().to_string()),
                        group_matches::category.eq(category.as_str()),
                        group_matches::group_name.eq(group),
                        group_matches::match_day.eq((day + 1) as i64),
                        group_matches::match_number.eq(match_number),
                        group_matches::team1_id.eq(Some(team1)),
                        group_matches::team2_id.eq(Some(team2)),
                        group_matches::status.eq("pending"),
                        group_matches::created_at.eq(now),
                        group_matches::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .unwrap();
                assert_eq!(n, 1);
                match_number += 1;
                total += 1;
            }
        }
    }

    println!("{category}: seeded {total} group matches");
}
