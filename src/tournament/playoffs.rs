//! The fixed semifinal/final/third-place playoff used by the group-stage
//! categories: two semifinals seeded from the standings (1st v 4th and
//! 2nd v 3rd), a final for the semifinal winners and a third-place match for
//! the semifinal losers.

use axum::{
    extract::{Form, Path, State},
    response::Redirect,
};
use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use tokio::sync::broadcast::Sender;
use uuid::Uuid;

use crate::{
    auth::User,
    msg::{Msg, MsgContents},
    schema::playoff_matches,
    state::Conn,
    template::Page,
    tournament::{
        Category, MatchStatus, group_matches::ScoreForm, standings::Standing,
    },
    util_resp::{FailureResponse, StandardResponse, bad_request, see_other_ok},
    widgets::alert::ErrorAlert,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayoffRound {
    Semifinal,
    Final,
    ThirdPlace,
}

impl PlayoffRound {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayoffRound::Semifinal => "semifinal",
            PlayoffRound::Final => "final",
            PlayoffRound::ThirdPlace => "third_place",
        }
    }

    pub fn parse(s: &str) -> Option<PlayoffRound> {
        match s {
            "semifinal" => Some(PlayoffRound::Semifinal),
            "final" => Some(PlayoffRound::Final),
            "third_place" => Some(PlayoffRound::ThirdPlace),
            _ => None,
        }
    }
}

#[derive(Queryable, Clone, Debug)]
pub struct PlayoffMatch {
    pub id: String,
    pub category: String,
    pub round: String,
    pub match_number: i64,
    pub team1_id: Option<String>,
    pub team2_id: Option<String>,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub winner_id: Option<String>,
    pub status: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl PlayoffMatch {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        match_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<PlayoffMatch, FailureResponse> {
        playoff_matches::table
            .filter(playoff_matches::id.eq(match_id))
            .first::<PlayoffMatch>(&mut *conn)
            .optional()
            .unwrap()
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn of_category(
        category: Category,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Vec<PlayoffMatch> {
        playoff_matches::table
            .filter(playoff_matches::category.eq(category.as_str()))
            .order_by(playoff_matches::match_number.asc())
            .load::<PlayoffMatch>(&mut *conn)
            .unwrap()
    }

    /// Picks a match out of a loaded set by its fixed place in the
    /// structure.
    pub fn find(
        matches: &[PlayoffMatch],
        round: PlayoffRound,
        match_number: i64,
    ) -> Option<&PlayoffMatch> {
        matches.iter().find(|m| {
            m.round == round.as_str() && m.match_number == match_number
        })
    }

    pub fn is_decided(&self) -> bool {
        self.team1_score.is_some() && self.team2_score.is_some()
    }
}

/// Seeds the playoff structure from the current standings: semifinal 1 is
/// 1st v 4th, semifinal 2 is 2nd v 3rd, final and third-place start empty.
/// Destructive and re-runnable: any existing playoff matches of the category
/// are deleted first.
pub fn initialize_playoffs(
    category: Category,
    standings: &[Standing],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), String> {
    if standings.len() < 4 {
        return Err(
            "At least 4 ranked teams are needed to start the playoffs."
                .to_string(),
        );
    }

    diesel::delete(
        playoff_matches::table
            .filter(playoff_matches::category.eq(category.as_str())),
    )
    .execute(&mut *conn)
    .unwrap();

    let rows = [
        (PlayoffRound::Semifinal, 1, Some(&standings[0]), Some(&standings[3])),
        (PlayoffRound::Semifinal, 2, Some(&standings[1]), Some(&standings[2])),
        (PlayoffRound::Final, 1, None, None),
        (PlayoffRound::ThirdPlace, 1, None, None),
    ];

    let now = Utc::now().naive_utc();
    for (round, match_number, team1, team2) in rows {
        let n = diesel::insert_into(playoff_matches::table)
            .values((
                playoff_matches::id.eq(Uuid::now_v7().to_string()),
                playoff_matches::category.eq(category.as_str()),
                playoff_matches::round.eq(round.as_str()),
                playoff_matches::match_number.eq(match_number),
                playoff_matches::team1_id
                    .eq(team1.map(|s| s.team_id.clone())),
                playoff_matches::team2_id
                    .eq(team2.map(|s| s.team_id.clone())),
                playoff_matches::status.eq(MatchStatus::Pending.as_str()),
                playoff_matches::created_at.eq(now),
                playoff_matches::updated_at.eq(now),
            ))
            .execute(&mut *conn)
            .unwrap();
        assert_eq!(n, 1);
    }

    tracing::info!(%category, "playoffs initialized from standings");

    Ok(())
}

fn set_round_slot(
    category: Category,
    round: PlayoffRound,
    position: i64,
    team_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) {
    let target = playoff_matches::table.filter(
        playoff_matches::category
            .eq(category.as_str())
            .and(playoff_matches::round.eq(round.as_str())),
    );
    let now = Utc::now().naive_utc();

    match position {
        1 => {
            diesel::update(target)
                .set((
                    playoff_matches::team1_id.eq(Some(team_id)),
                    playoff_matches::updated_at.eq(now),
                ))
                .execute(&mut *conn)
                .unwrap();
        }
        2 => {
            diesel::update(target)
                .set((
                    playoff_matches::team2_id.eq(Some(team_id)),
                    playoff_matches::updated_at.eq(now),
                ))
                .execute(&mut *conn)
                .unwrap();
        }
        _ => unreachable!("slot position is always 1 or 2"),
    }
}

/// Commits a playoff result. Ties are rejected before anything is written.
/// Saving a semifinal also pushes winners/losers forward: once both
/// semifinals are decided the final and third-place match are filled in one
/// pass; while the other semifinal is still open only the slot belonging to
/// the just-saved semifinal is filled, so the bracket can already show the
/// known participant.
pub fn record_playoff_result(
    match_id: &str,
    team1_score: i64,
    team2_score: i64,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Category, String> {
    if team1_score == team2_score {
        return Err(
            "A tie is not possible in the playoffs. Please enter a decisive \
             result."
                .to_string(),
        );
    }
    if team1_score < 0 || team2_score < 0 {
        return Err("Scores cannot be negative.".to_string());
    }

    let m = playoff_matches::table
        .filter(playoff_matches::id.eq(match_id))
        .first::<PlayoffMatch>(&mut *conn)
        .optional()
        .unwrap()
        .ok_or_else(|| "This match no longer exists.".to_string())?;

    let category = Category::parse(&m.category)
        .expect("playoff match category column holds an unknown value");

    let (Some(team1), Some(team2)) = (m.team1_id.clone(), m.team2_id.clone())
    else {
        return Err(
            "Both participants must be known before a result can be entered."
                .to_string(),
        );
    };

    let (winner, loser) = if team1_score > team2_score {
        (team1, team2)
    } else {
        (team2, team1)
    };

    let n = diesel::update(
        playoff_matches::table.filter(playoff_matches::id.eq(&m.id)),
    )
    .set((
        playoff_matches::team1_score.eq(Some(team1_score)),
        playoff_matches::team2_score.eq(Some(team2_score)),
        playoff_matches::winner_id.eq(Some(&winner)),
        playoff_matches::status.eq(MatchStatus::Completed.as_str()),
        playoff_matches::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(&mut *conn)
    .unwrap();
    assert_eq!(n, 1);

    if m.round == PlayoffRound::Semifinal.as_str() {
        advance_semifinalists(category, m.match_number, &winner, &loser, conn);
    }

    Ok(category)
}

fn advance_semifinalists(
    category: Category,
    saved_match_number: i64,
    winner: &str,
    loser: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) {
    // Re-read both semifinals: the just-saved one is included with its fresh
    // result.
    let semis: Vec<PlayoffMatch> = playoff_matches::table
        .filter(
            playoff_matches::category.eq(category.as_str()).and(
                playoff_matches::round.eq(PlayoffRound::Semifinal.as_str()),
            ),
        )
        .load::<PlayoffMatch>(&mut *conn)
        .unwrap();

    let semi1 = semis.iter().find(|m| m.match_number == 1);
    let semi2 = semis.iter().find(|m| m.match_number == 2);

    if let (Some(semi1), Some(semi2)) = (semi1, semi2)
        && let (Some(winner1), Some(winner2)) =
            (&semi1.winner_id, &semi2.winner_id)
    {
        // Both semifinals decided: fill the final with the winners and the
        // third-place match with the losers in one pass.
        let loser1 = if semi1.team1_score > semi1.team2_score {
            semi1.team2_id.as_ref()
        } else {
            semi1.team1_id.as_ref()
        };
        let loser2 = if semi2.team1_score > semi2.team2_score {
            semi2.team2_id.as_ref()
        } else {
            semi2.team1_id.as_ref()
        };

        set_round_slot(category, PlayoffRound::Final, 1, winner1, conn);
        set_round_slot(category, PlayoffRound::Final, 2, winner2, conn);
        if let Some(loser1) = loser1 {
            set_round_slot(
                category,
                PlayoffRound::ThirdPlace,
                1,
                loser1,
                conn,
            );
        }
        if let Some(loser2) = loser2 {
            set_round_slot(
                category,
                PlayoffRound::ThirdPlace,
                2,
                loser2,
                conn,
            );
        }
    } else {
        // Only the just-saved semifinal is decided: fill the slot belonging
        // to it (semifinal 1 -> slot 1, semifinal 2 -> slot 2) so the final
        // already shows the known participant.
        let position = saved_match_number;
        set_round_slot(category, PlayoffRound::Final, position, winner, conn);
        set_round_slot(
            category,
            PlayoffRound::ThirdPlace,
            position,
            loser,
            conn,
        );
    }
}

pub async fn do_initialize_playoffs(
    Path(category): Path<Category>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let standings = Standing::of_category(category, None, &mut *conn);

    match initialize_playoffs(category, &standings, &mut *conn) {
        Ok(()) => {
            let _ = msgs.send(Msg {
                category,
                inner: MsgContents::PlayoffMatchesUpdate,
            });

            see_other_ok(Redirect::to(&format!("/admin/{category}")))
        }
        Err(e) => bad_request(
            Page::new()
                .user(user)
                .category(category)
                .body(maud! {
                    ErrorAlert msg = (&e);
                })
                .render(),
        ),
    }
}

pub async fn do_enter_playoff_result(
    Path(match_id): Path<String>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
    Form(form): Form<ScoreForm>,
) -> StandardResponse {
    match record_playoff_result(
        &match_id,
        form.team1_score,
        form.team2_score,
        &mut *conn,
    ) {
        Ok(category) => {
            tracing::info!(%match_id, "playoff result saved");

            let _ = msgs.send(Msg {
                category,
                inner: MsgContents::PlayoffMatchesUpdate,
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
    use crate::{
        test::{test_conn, test_standings},
        tournament::{
            Category, MatchStatus,
            playoffs::{
                PlayoffMatch, PlayoffRound, initialize_playoffs,
                record_playoff_result,
            },
        },
    };

    #[test]
    fn initialization_seeds_first_against_fourth() {
        let mut conn = test_conn();
        let (teams, standings) =
            test_standings(&mut conn, Category::Lower, 4);

        initialize_playoffs(Category::Lower, &standings, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        assert_eq!(matches.len(), 4);

        let semi1 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 1).unwrap();
        assert_eq!(semi1.team1_id.as_ref(), Some(&teams[0]));
        assert_eq!(semi1.team2_id.as_ref(), Some(&teams[3]));

        let semi2 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 2).unwrap();
        assert_eq!(semi2.team1_id.as_ref(), Some(&teams[1]));
        assert_eq!(semi2.team2_id.as_ref(), Some(&teams[2]));

        let the_final =
            PlayoffMatch::find(&matches, PlayoffRound::Final, 1).unwrap();
        assert_eq!(the_final.team1_id, None);
        assert_eq!(the_final.team2_id, None);

        let third =
            PlayoffMatch::find(&matches, PlayoffRound::ThirdPlace, 1)
                .unwrap();
        assert_eq!(third.team1_id, None);
        assert_eq!(third.team2_id, None);
    }

    #[test]
    fn initialization_requires_four_ranked_teams() {
        let mut conn = test_conn();
        let (_, standings) = test_standings(&mut conn, Category::Lower, 3);

        assert!(
            initialize_playoffs(Category::Lower, &standings, &mut conn)
                .is_err()
        );
        assert!(
            PlayoffMatch::of_category(Category::Lower, &mut conn).is_empty()
        );
    }

    #[test]
    fn ties_are_rejected_with_no_write() {
        let mut conn = test_conn();
        let (_, standings) = test_standings(&mut conn, Category::Lower, 4);
        initialize_playoffs(Category::Lower, &standings, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        let semi1 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 1).unwrap();

        assert!(record_playoff_result(&semi1.id, 3, 3, &mut conn).is_err());

        let untouched = PlayoffMatch::fetch(&semi1.id, &mut conn).unwrap();
        assert!(!untouched.is_decided());
        assert_eq!(untouched.winner_id, None);
        assert_eq!(
            MatchStatus::parse(&untouched.status),
            Some(MatchStatus::Pending)
        );
    }

    #[test]
    fn a_single_decided_semifinal_fills_only_its_own_slot() {
        let mut conn = test_conn();
        let (teams, standings) =
            test_standings(&mut conn, Category::Lower, 4);
        initialize_playoffs(Category::Lower, &standings, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        let semi1 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 1).unwrap();

        // Seed 1 beats seed 4.
        record_playoff_result(&semi1.id, 2, 1, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        let the_final =
            PlayoffMatch::find(&matches, PlayoffRound::Final, 1).unwrap();
        assert_eq!(the_final.team1_id.as_ref(), Some(&teams[0]));
        assert_eq!(the_final.team2_id, None);

        let third =
            PlayoffMatch::find(&matches, PlayoffRound::ThirdPlace, 1)
                .unwrap();
        assert_eq!(third.team1_id.as_ref(), Some(&teams[3]));
        assert_eq!(third.team2_id, None);
    }

    #[test]
    fn both_decided_semifinals_fill_all_four_slots() {
        let mut conn = test_conn();
        let (teams, standings) =
            test_standings(&mut conn, Category::Lower, 4);
        initialize_playoffs(Category::Lower, &standings, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        let semi1 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 1).unwrap();
        let semi2 =
            PlayoffMatch::find(&matches, PlayoffRound::Semifinal, 2).unwrap();

        // Seed 1 beats seed 4; seed 3 upsets seed 2.
        record_playoff_result(&semi1.id, 2, 0, &mut conn).unwrap();
        record_playoff_result(&semi2.id, 1, 3, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        let the_final =
            PlayoffMatch::find(&matches, PlayoffRound::Final, 1).unwrap();
        assert_eq!(the_final.team1_id.as_ref(), Some(&teams[0]));
        assert_eq!(the_final.team2_id.as_ref(), Some(&teams[2]));

        let third =
            PlayoffMatch::find(&matches, PlayoffRound::ThirdPlace, 1)
                .unwrap();
        assert_eq!(third.team1_id.as_ref(), Some(&teams[3]));
        assert_eq!(third.team2_id.as_ref(), Some(&teams[1]));
    }

    #[test]
    fn reinitialization_rebuilds_from_fresh_standings() {
        let mut conn = test_conn();
        let (_, standings) = test_standings(&mut conn, Category::Lower, 4);

        initialize_playoffs(Category::Lower, &standings, &mut conn).unwrap();
        initialize_playoffs(Category::Lower, &standings, &mut conn).unwrap();

        let matches = PlayoffMatch::of_category(Category::Lower, &mut conn);
        assert_eq!(matches.len(), 4);
    }
}
