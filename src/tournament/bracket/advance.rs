//! Result entry for the double-elimination tree.
//!
//! Completing a match writes the winner into the slot its forward link
//! points at, and the loser into the linked loser-bracket slot. Both writes
//! are unconditional: re-entering a result simply overwrites whatever sits
//! in the downstream slots (last write wins).

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
    schema::bracket_matches,
    state::Conn,
    template::Page,
    tournament::{Category, MatchStatus, bracket::BracketMatch},
    util_resp::{StandardResponse, bad_request, see_other_ok},
    widgets::alert::ErrorAlert,
};

/// Writes a team into slot 1 or 2 of a downstream match.
fn set_slot(
    match_id: &str,
    position: i64,
    team_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) {
    let target = bracket_matches::table.filter(bracket_matches::id.eq(match_id));
    let now = Utc::now().naive_utc();

    let n = match position {
        1 => diesel::update(target)
            .set((
                bracket_matches::team1_id.eq(Some(team_id)),
                bracket_matches::updated_at.eq(now),
            ))
            .execute(&mut *conn)
            .unwrap(),
        2 => diesel::update(target)
            .set((
                bracket_matches::team2_id.eq(Some(team_id)),
                bracket_matches::updated_at.eq(now),
            ))
            .execute(&mut *conn)
            .unwrap(),
        _ => unreachable!("slot position is always 1 or 2"),
    };
    assert_eq!(n, 1);
}

/// Marks `winner_id` as the winner of a bracket match and advances both
/// teams along their forward links.
pub fn record_bracket_result(
    match_id: &str,
    winner_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<Category, String> {
    let m = bracket_matches::table
        .filter(bracket_matches::id.eq(match_id))
        .first::<BracketMatch>(&mut *conn)
        .optional()
        .unwrap()
        .ok_or_else(|| "This match no longer exists.".to_string())?;

    if m.team1_id.as_deref() != Some(winner_id)
        && m.team2_id.as_deref() != Some(winner_id)
    {
        return Err(
            "The winner must be one of the two teams in the match."
                .to_string(),
        );
    }

    let loser = if m.team1_id.as_deref() == Some(winner_id) {
        m.team2_id.clone()
    } else {
        m.team1_id.clone()
    };

    let n = diesel::update(
        bracket_matches::table.filter(bracket_matches::id.eq(&m.id)),
    )
    .set((
        bracket_matches::winner_id.eq(Some(winner_id)),
        bracket_matches::status.eq(MatchStatus::Completed.as_str()),
        bracket_matches::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(&mut *conn)
    .unwrap();
    assert_eq!(n, 1);

    if let (Some(next_id), Some(position)) =
        (&m.next_match_id, m.next_match_position)
    {
        set_slot(next_id, position, winner_id, conn);
    }

    if let (Some(loser), Some(next_id), Some(position)) =
        (&loser, &m.loser_next_match_id, m.loser_next_match_position)
    {
        set_slot(next_id, position, loser, conn);
    }

    Ok(Category::parse(&m.category)
        .expect("bracket match category column holds an unknown value"))
}

#[derive(Deserialize)]
pub struct BracketWinnerForm {
    pub winner_id: String,
}

pub async fn do_record_bracket_winner(
    Path(match_id): Path<String>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
    Form(form): Form<BracketWinnerForm>,
) -> StandardResponse {
    match record_bracket_result(&match_id, &form.winner_id, &mut *conn) {
        Ok(category) => {
            tracing::info!(%match_id, "bracket result saved");

            let _ = msgs.send(Msg {
                category,
                inner: MsgContents::BracketUpdate,
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
        test::{test_conn, test_teams},
        tournament::{
            Category, MatchStatus,
            bracket::{
                BracketMatch, BracketSide,
                advance::record_bracket_result,
                builder::build_double_elimination,
            },
        },
    };

    #[test]
    fn winner_and_loser_advance_along_their_links() {
        let mut conn = test_conn();
        let teams = test_teams(&mut conn, Category::Lower, 4);

        build_double_elimination(Category::Lower, &teams, &mut conn).unwrap();

        let round1 = BracketMatch::of_side(
            Category::Lower,
            BracketSide::Winner,
            &mut conn,
        )
        .into_iter()
        .filter(|m| m.round == 1)
        .collect::<Vec<_>>();

        // First semifinal: seed 1 beats seed 2.
        record_bracket_result(&round1[0].id, &teams[0].id, &mut conn)
            .unwrap();

        let saved =
            BracketMatch::fetch(&round1[0].id, &mut conn).unwrap();
        assert_eq!(saved.winner_id.as_deref(), Some(teams[0].id.as_str()));
        assert_eq!(
            MatchStatus::parse(&saved.status),
            Some(MatchStatus::Completed)
        );

        let winner_final = BracketMatch::fetch(
            saved.next_match_id.as_ref().unwrap(),
            &mut conn,
        )
        .unwrap();
        assert_eq!(
            winner_final.team1_id.as_deref(),
            Some(teams[0].id.as_str())
        );
        assert_eq!(winner_final.team2_id, None);

        let loser_match = BracketMatch::fetch(
            saved.loser_next_match_id.as_ref().unwrap(),
            &mut conn,
        )
        .unwrap();
        assert_eq!(
            loser_match.team1_id.as_deref(),
            Some(teams[1].id.as_str())
        );

        // Second semifinal fills the remaining slots.
        record_bracket_result(&round1[1].id, &teams[2].id, &mut conn)
            .unwrap();

        let winner_final =
            BracketMatch::fetch(&winner_final.id, &mut conn).unwrap();
        assert_eq!(
            winner_final.team2_id.as_deref(),
            Some(teams[2].id.as_str())
        );
        let loser_match =
            BracketMatch::fetch(&loser_match.id, &mut conn).unwrap();
        assert_eq!(
            loser_match.team2_id.as_deref(),
            Some(teams[3].id.as_str())
        );
    }

    #[test]
    fn re_entering_a_result_overwrites_downstream_slots() {
        let mut conn = test_conn();
        let teams = test_teams(&mut conn, Category::Lower, 4);

        build_double_elimination(Category::Lower, &teams, &mut conn).unwrap();

        let round1 = BracketMatch::of_side(
            Category::Lower,
            BracketSide::Winner,
            &mut conn,
        )
        .into_iter()
        .filter(|m| m.round == 1)
        .collect::<Vec<_>>();

        record_bracket_result(&round1[0].id, &teams[0].id, &mut conn)
            .unwrap();
        // The operator corrects the result: the other team actually won.
        record_bracket_result(&round1[0].id, &teams[1].id, &mut conn)
            .unwrap();

        let saved = BracketMatch::fetch(&round1[0].id, &mut conn).unwrap();
        let winner_final = BracketMatch::fetch(
            saved.next_match_id.as_ref().unwrap(),
            &mut conn,
        )
        .unwrap();
        assert_eq!(
            winner_final.team1_id.as_deref(),
            Some(teams[1].id.as_str())
        );
        let loser_match = BracketMatch::fetch(
            saved.loser_next_match_id.as_ref().unwrap(),
            &mut conn,
        )
        .unwrap();
        assert_eq!(
            loser_match.team1_id.as_deref(),
            Some(teams[0].id.as_str())
        );
    }

    #[test]
    fn an_outsider_cannot_be_recorded_as_winner() {
        let mut conn = test_conn();
        let teams = test_teams(&mut conn, Category::Lower, 4);

        build_double_elimination(Category::Lower, &teams, &mut conn).unwrap();

        let round1 = BracketMatch::of_side(
            Category::Lower,
            BracketSide::Winner,
            &mut conn,
        )
        .into_iter()
        .filter(|m| m.round == 1)
        .collect::<Vec<_>>();

        // Team 3 plays in the other semifinal.
        assert!(
            record_bracket_result(&round1[0].id, &teams[2].id, &mut conn)
                .is_err()
        );

        let untouched =
            BracketMatch::fetch(&round1[0].id, &mut conn).unwrap();
        assert_eq!(untouched.winner_id, None);
        assert_eq!(
            MatchStatus::parse(&untouched.status),
            Some(MatchStatus::Pending)
        );
    }
}
