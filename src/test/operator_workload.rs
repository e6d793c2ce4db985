//! End-to-end operator workload, driven over HTTP against the real router.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    config::create_app,
    schema::users,
    state::DbPool,
    test::{insert_group_match, test_pool},
    tournament::{
        Category,
        bracket::BracketMatch,
        playoffs::{PlayoffMatch, PlayoffRound},
        standings::Standing,
        teams::Team,
    },
};

const ADMIN_EMAIL: &str = "operator@example.com";
const ADMIN_PASSWORD: &str = "hunter22";

fn seed_operator(pool: &DbPool) {
    let mut conn = pool.get().unwrap();

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string();

    diesel::insert_into(users::table)
        .values((
            users::id.eq(Uuid::now_v7().to_string()),
            users::email.eq(ADMIN_EMAIL),
            users::username.eq("operator"),
            users::password_hash.eq(&hash),
            users::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .unwrap();
}

async fn logged_in_server(pool: &DbPool) -> TestServer {
    seed_operator(pool);

    let mut server = TestServer::new(create_app(pool.clone())).unwrap();
    server.do_save_cookies();

    let res = server
        .post("/login")
        .form(&[("id", ADMIN_EMAIL), ("password", ADMIN_PASSWORD)])
        .await;
    res.assert_status(StatusCode::SEE_OTHER);

    server
}

async fn create_team(server: &TestServer, category: Category, name: &str) {
    let res = server
        .post(&format!("/admin/{category}/teams"))
        .form(&[
            ("name", name),
            ("class_name", ""),
            ("nickname", ""),
            ("group_name", ""),
        ])
        .await;
    res.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn group_results_flow_into_the_standings() {
    let pool = test_pool();
    let server = logged_in_server(&pool).await;

    for name in ["Reds", "Blues", "Greens", "Golds"] {
        create_team(&server, Category::Lower, name).await;
    }

    let teams = {
        let mut conn = pool.get().unwrap();
        Team::of_category(Category::Lower, &mut conn)
    };
    assert_eq!(teams.len(), 4);

    let match_id = {
        let mut conn = pool.get().unwrap();
        insert_group_match(
            &mut conn,
            Category::Lower,
            None,
            1,
            1,
            &teams[0].id,
            &teams[1].id,
        )
    };

    let res = server
        .post(&format!("/admin/group-matches/{match_id}/result"))
        .form(&[("team1_score", "2"), ("team2_score", "2")])
        .await;
    res.assert_status(StatusCode::SEE_OTHER);

    {
        let mut conn = pool.get().unwrap();
        let standings =
            Standing::of_category(Category::Lower, None, &mut conn);
        assert_eq!(standings.len(), 4);
        for row in standings
            .iter()
            .filter(|r| r.team_id == teams[0].id || r.team_id == teams[1].id)
        {
            assert_eq!(row.drawn, 1);
            assert_eq!(row.points, 1);
        }
    }

    let page = server.get("/lower").await;
    page.assert_status_ok();
    assert!(page.text().contains("Reds"));
}

#[tokio::test]
async fn playoff_flow_rejects_ties_and_advances_winners() {
    let pool = test_pool();
    let server = logged_in_server(&pool).await;

    for name in ["Reds", "Blues", "Greens", "Golds"] {
        create_team(&server, Category::Middle, name).await;
    }

    let res = server.post("/admin/middle/playoffs/init").await;
    res.assert_status(StatusCode::SEE_OTHER);

    let (semi1_id, semi1_team1) = {
        let mut conn = pool.get().unwrap();
        let matches = PlayoffMatch::of_category(Category::Middle, &mut conn);
        assert_eq!(matches.len(), 4);

        let semi1 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 1).unwrap();
        assert!(semi1.team1_id.is_some() && semi1.team2_id.is_some());

        (semi1.id.clone(), semi1.team1_id.clone().unwrap())
    };

    // A tie must be rejected without writing anything.
    let res = server
        .post(&format!("/admin/playoff-matches/{semi1_id}/result"))
        .form(&[("team1_score", "1"), ("team2_score", "1")])
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    {
        let mut conn = pool.get().unwrap();
        let semi1 = PlayoffMatch::fetch(&semi1_id, &mut conn).unwrap();
        assert!(!semi1.is_decided());
    }

    let res = server
        .post(&format!("/admin/playoff-matches/{semi1_id}/result"))
        .form(&[("team1_score", "3"), ("team2_score", "1")])
        .await;
    res.assert_status(StatusCode::SEE_OTHER);

    {
        let mut conn = pool.get().unwrap();
        let matches = PlayoffMatch::of_category(Category::Middle, &mut conn);
        let the_final =
            PlayoffMatch::find(&matches, PlayoffRound::Final, 1).unwrap();
        assert_eq!(the_final.team1_id.as_ref(), Some(&semi1_team1));
        assert_eq!(the_final.team2_id, None);
    }
}

#[tokio::test]
async fn bracket_can_be_built_over_http() {
    let pool = test_pool();
    let server = logged_in_server(&pool).await;

    for name in ["Reds", "Blues", "Greens", "Golds"] {
        create_team(&server, Category::Upper, name).await;
    }

    let res = server.post("/admin/upper/bracket/init").await;
    res.assert_status(StatusCode::SEE_OTHER);

    {
        let mut conn = pool.get().unwrap();
        let matches = BracketMatch::of_category(Category::Upper, &mut conn);
        // 4 teams: 3 winner-bracket matches plus 3 loser-bracket matches.
        assert_eq!(matches.len(), 6);
    }

    let page = server.get("/upper").await;
    page.assert_status_ok();
    assert!(page.text().contains("Elimination bracket"));
}

#[tokio::test]
async fn anonymous_visitors_cannot_mutate() {
    let pool = test_pool();
    let server = TestServer::new(create_app(pool.clone())).unwrap();

    let res = server
        .post("/admin/lower/teams")
        .form(&[("name", "Intruders")])
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);

    let mut conn = pool.get().unwrap();
    assert!(Team::of_category(Category::Lower, &mut conn).is_empty());

    // The public pages stay readable.
    let page = server.get("/lower").await;
    page.assert_status_ok();
}
