use axum::{
    extract::{Form, Path, State},
    response::Redirect,
};
use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;
use tokio::sync::broadcast::Sender;

use crate::{
    auth::User,
    msg::{Msg, MsgContents},
    schema::group_matches,
    state::Conn,
    template::Page,
    tournament::{Category, MatchStatus},
    util_resp::{FailureResponse, StandardResponse, bad_request, see_other_ok},
    widgets::alert::ErrorAlert,
};

#[derive(Queryable, Clone, Debug)]
pub struct GroupMatch {
    pub id: String,
    pub category: String,
    pub group_name: Option<String>,
    pub match_day: i64,
    pub match_number: i64,
    pub team1_id: Option<String>,
    pub team2_id: Option<String>,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl GroupMatch {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        match_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<GroupMatch, FailureResponse> {
        group_matches::table
            .filter(group_matches::id.eq(match_id))
            .first::<GroupMatch>(&mut *conn)
            .optional()
            .unwrap()
            .ok_or(FailureResponse::NotFound(()))
    }

    /// Schedule order: day first, then the match number within the day.
    pub fn of_category(
        category: Category,
        group: Option<&str>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Vec<GroupMatch> {
        let mut query = group_matches::table
            .filter(group_matches::category.eq(category.as_str()))
            .order_by((
                group_matches::match_day.asc(),
                group_matches::match_number.asc(),
            ))
            .into_boxed();

        if let Some(group) = group {
            query = query.filter(group_matches::group_name.eq(group));
        }

        query.load::<GroupMatch>(&mut *conn).unwrap()
    }

    /// A match counts as decided only once both scores are present.
    pub fn is_decided(&self) -> bool {
        self.team1_score.is_some() && self.team2_score.is_some()
    }
}

/// Commits a group-stage result. Ties are allowed here; the standings view
/// picks the change up on its own. Scores may be edited again later, the
/// match stays `completed`.
pub fn record_group_result(
    match_id: &str,
    team1_score: i64,
    team2_score: i64,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Category, String> {
    if team1_score < 0 || team2_score < 0 {
        return Err("Scores cannot be negative.".to_string());
    }

    let m = group_matches::table
        .filter(group_matches::id.eq(match_id))
        .first::<GroupMatch>(&mut *conn)
        .optional()
        .unwrap()
        .ok_or_else(|| "This match no longer exists.".to_string())?;

    let n = diesel::update(
        group_matches::table.filter(group_matches::id.eq(&m.id)),
    )
    .set((
        group_matches::team1_score.eq(Some(team1_score)),
        group_matches::team2_score.eq(Some(team2_score)),
        group_matches::status.eq(MatchStatus::Completed.as_str()),
        group_matches::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(&mut *conn)
    .unwrap();
    assert_eq!(n, 1);

    Ok(Category::parse(&m.category)
        .expect("group match category column holds an unknown value"))
}

#[derive(Deserialize)]
pub struct ScoreForm {
    pub team1_score: i64,
    pub team2_score: i64,
}

pub async fn do_enter_group_result(
    Path(match_id): Path<String>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
    Form(form): Form<ScoreForm>,
) -> StandardResponse {
    match record_group_result(
        &match_id,
        form.team1_score,
        form.team2_score,
        &mut *conn,
    ) {
        Ok(category) => {
            tracing::info!(%match_id, "group result saved");

            let _ = msgs.send(Msg {
                category,
                inner: MsgContents::GroupMatchesUpdate,
            });

            see_other_ok(Redirect::to(&format!("/admin/{category}")))
        }
        Err(e) => bad_request(
            Page::new()
                .user(user)
                .body(maud! {
                    ErrorAlert msg = (&e);
                })
                .render(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;

    use crate::{
        schema::standings,
        test::{insert_group_match, insert_team, test_conn},
        tournament::{
            Category, MatchStatus,
            group_matches::{GroupMatch, record_group_result},
            standings::Standing,
        },
    };

    #[test]
    fn saving_scores_completes_the_match() {
        let mut conn = test_conn();

        let a = insert_team(&mut conn, Category::Lower, None, "Alpha");
        let b = insert_team(&mut conn, Category::Lower, None, "Beta");
        let mid =
            insert_group_match(&mut conn, Category::Lower, None, 1, 1, &a, &b);

        let before = GroupMatch::fetch(&mid, &mut conn).unwrap();
        assert!(!before.is_decided());
        assert_eq!(MatchStatus::parse(&before.status), Some(MatchStatus::Pending));

        let category = record_group_result(&mid, 2, 2, &mut conn).unwrap();
        assert_eq!(category, Category::Lower);

        let after = GroupMatch::fetch(&mid, &mut conn).unwrap();
        assert!(after.is_decided());
        assert_eq!(after.team1_score, Some(2));
        assert_eq!(after.team2_score, Some(2));
        assert_eq!(
            MatchStatus::parse(&after.status),
            Some(MatchStatus::Completed)
        );
    }

    #[test]
    fn drawn_match_is_reflected_by_the_standings_view() {
        let mut conn = test_conn();

        let a = insert_team(&mut conn, Category::Lower, None, "Alpha");
        let b = insert_team(&mut conn, Category::Lower, None, "Beta");
        let mid =
            insert_group_match(&mut conn, Category::Lower, None, 1, 1, &a, &b);

        record_group_result(&mid, 2, 2, &mut conn).unwrap();

        let rows = Standing::of_category(Category::Lower, None, &mut conn);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.played, 1);
            assert_eq!(row.drawn, 1);
            assert_eq!(row.won, 0);
            assert_eq!(row.lost, 0);
            assert_eq!(row.points, 1);
            assert_eq!(row.goal_difference, 0);
        }

        // Editing the result afterwards moves the table with it.
        record_group_result(&mid, 3, 1, &mut conn).unwrap();

        let rows = standings::table
            .filter(standings::category.eq(Category::Lower.as_str()))
            .load::<Standing>(&mut conn)
            .unwrap();
        let alpha = rows.iter().find(|r| r.team_id == a).unwrap();
        let beta = rows.iter().find(|r| r.team_id == b).unwrap();
        assert_eq!(alpha.points, 3);
        assert_eq!(alpha.goal_difference, 2);
        assert_eq!(beta.points, 0);
        assert_eq!(beta.lost, 1);
    }

    #[test]
    fn negative_scores_are_rejected() {
        let mut conn = test_conn();

        let a = insert_team(&mut conn, Category::Lower, None, "Alpha");
        let b = insert_team(&mut conn, Category::Lower, None, "Beta");
        let mid =
            insert_group_match(&mut conn, Category::Lower, None, 1, 1, &a, &b);

        assert!(record_group_result(&mid, -1, 0, &mut conn).is_err());

        let m = GroupMatch::fetch(&mid, &mut conn).unwrap();
        assert!(!m.is_decided());
    }
}
