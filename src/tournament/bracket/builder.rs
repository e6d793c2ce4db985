//! Double-elimination bracket construction.
//!
//! Given a seeded list of teams this lays out the whole tree up front: every
//! match of the winner and loser brackets, plus the forward links that the
//! advancement code follows when results come in. Later rounds start with
//! both team slots empty and fill up as matches are decided.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use itertools::Itertools;
use tokio::sync::broadcast::Sender;
use uuid::Uuid;

use crate::{
    auth::User,
    msg::{Msg, MsgContents},
    schema::bracket_matches,
    state::Conn,
    template::Page,
    tournament::{
        Category, MatchStatus, bracket::BracketSide, standings::Standing,
        teams::Team,
    },
    util_resp::{StandardResponse, bad_request, see_other_ok},
    widgets::alert::ErrorAlert,
};

/// Number of winner-bracket rounds for `num_teams` seeds, i.e.
/// `ceil(log2(num_teams))`. Callers guarantee `num_teams >= 2`.
pub fn winner_round_count(num_teams: usize) -> usize {
    usize::BITS as usize - (num_teams - 1).leading_zeros() as usize
}

struct NewMatch<'a> {
    category: Category,
    side: BracketSide,
    round: i64,
    match_number: i64,
    position_in_round: i64,
    team1_id: Option<&'a str>,
    team2_id: Option<&'a str>,
    winner_id: Option<&'a str>,
    completed: bool,
}

fn insert_match(
    m: &NewMatch<'_>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> String {
    let id = Uuid::now_v7().to_string();
    let now = Utc::now().naive_utc();

    let status = if m.completed {
        MatchStatus::Completed
    } else {
        MatchStatus::Pending
    };

    let n = diesel::insert_into(bracket_matches::table)
        .values((
            bracket_matches::id.eq(&id),
            bracket_matches::category.eq(m.category.as_str()),
            bracket_matches::bracket.eq(m.side.as_str()),
            bracket_matches::round.eq(m.round),
            bracket_matches::match_number.eq(m.match_number),
            bracket_matches::position_in_round.eq(m.position_in_round),
            bracket_matches::team1_id.eq(m.team1_id),
            bracket_matches::team2_id.eq(m.team2_id),
            bracket_matches::winner_id.eq(m.winner_id),
            bracket_matches::status.eq(status.as_str()),
            bracket_matches::created_at.eq(now),
            bracket_matches::updated_at.eq(now),
        ))
        .execute(&mut *conn)
        .unwrap();
    assert_eq!(n, 1);

    id
}

fn link_winner_advance(
    from: &str,
    to: &str,
    position: i64,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) {
    let n = diesel::update(
        bracket_matches::table.filter(bracket_matches::id.eq(from)),
    )
    .set((
        bracket_matches::next_match_id.eq(Some(to)),
        bracket_matches::next_match_position.eq(Some(position)),
        bracket_matches::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(&mut *conn)
    .unwrap();
    assert_eq!(n, 1);
}

fn link_loser_drop(
    from: &str,
    to: &str,
    position: i64,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) {
    let n = diesel::update(
        bracket_matches::table.filter(bracket_matches::id.eq(from)),
    )
    .set((
        bracket_matches::loser_next_match_id.eq(Some(to)),
        bracket_matches::loser_next_match_position.eq(Some(position)),
        bracket_matches::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(&mut *conn)
    .unwrap();
    assert_eq!(n, 1);
}

/// Builds the complete double-elimination tree for a category from an
/// already-seeded team list. The caller clears any previous bracket first;
/// this function only ever inserts.
///
/// Categories with a single team are rejected: a one-match "bracket" with no
/// opponent decides nothing, so the operator is told to add teams instead.
pub fn build_double_elimination(
    category: Category,
    seeds: &[Team],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), String> {
    if seeds.len() < 2 {
        return Err(
            "At least two teams are needed to build an elimination bracket."
                .to_string(),
        );
    }

    let winner_rounds = winner_round_count(seeds.len());
    let mut winner_ids: Vec<Vec<String>> = Vec::with_capacity(winner_rounds);

    // Winner round 1: consecutive seeds pair up. An odd team count gives the
    // last seed a bye, created already completed with that team as winner.
    let mut match_number = 1;
    let mut round1 = Vec::new();
    for (i, pair) in seeds.chunks(2).enumerate() {
        let team1 = &pair[0];
        let team2 = pair.get(1);

        round1.push(insert_match(
            &NewMatch {
                category,
                side: BracketSide::Winner,
                round: 1,
                match_number,
                position_in_round: i as i64,
                team1_id: Some(&team1.id),
                team2_id: team2.map(|t| t.id.as_str()),
                winner_id: if team2.is_none() {
                    Some(&team1.id)
                } else {
                    None
                },
                completed: team2.is_none(),
            },
            conn,
        ));
        match_number += 1;
    }
    winner_ids.push(round1);

    // Later winner rounds halve until a single final remains. Each previous
    // match i feeds match floor(i/2) of the new round, slot (i mod 2) + 1.
    for round in 2..=winner_rounds {
        let prev = winner_ids.last().unwrap().clone();
        let count = prev.len().div_ceil(2);

        let mut current = Vec::with_capacity(count);
        for i in 0..count {
            current.push(insert_match(
                &NewMatch {
                    category,
                    side: BracketSide::Winner,
                    round: round as i64,
                    match_number,
                    position_in_round: i as i64,
                    team1_id: None,
                    team2_id: None,
                    winner_id: None,
                    completed: false,
                },
                conn,
            ));
            match_number += 1;
        }

        for (i, from) in prev.iter().enumerate() {
            link_winner_advance(
                from,
                &current[i / 2],
                (i % 2 + 1) as i64,
                conn,
            );
        }

        winner_ids.push(current);
    }

    // Loser bracket. Even rounds absorb fresh winner-bracket losers and keep
    // the previous round's size; odd rounds (3, 5, ...) halve it. Round 1
    // pairs up the winner-round-1 losers.
    let loser_rounds = (winner_rounds - 1) * 2 + 1;
    let mut loser_ids: Vec<Vec<String>> = Vec::with_capacity(loser_rounds);
    let mut match_number = 1;

    for round in 1..=loser_rounds {
        let count = if round == 1 {
            winner_ids[0].len() / 2
        } else if round % 2 == 0 {
            loser_ids[round - 2].len()
        } else {
            loser_ids[round - 2].len().div_ceil(2)
        }
        .max(1);

        let mut matches = Vec::with_capacity(count);
        for i in 0..count {
            matches.push(insert_match(
                &NewMatch {
                    category,
                    side: BracketSide::Loser,
                    round: round as i64,
                    match_number,
                    position_in_round: i as i64,
                    team1_id: None,
                    team2_id: None,
                    winner_id: None,
                    completed: false,
                },
                conn,
            ));
            match_number += 1;
        }
        loser_ids.push(matches);
    }

    // Internal loser-bracket links. Into an even round the mapping is 1:1
    // and the advancing team takes slot 1 (slot 2 is reserved for the loser
    // dropping in from the winner bracket); into an odd round survivors pair
    // up 2:1.
    for round in 1..loser_rounds {
        let next = loser_ids[round].clone();
        for (i, from) in loser_ids[round - 1].iter().enumerate() {
            let (to_index, position) = if (round + 1) % 2 == 0 {
                (i, 1)
            } else {
                (i / 2, (i % 2 + 1) as i64)
            };

            if let Some(to) = next.get(to_index) {
                link_winner_advance(from, to, position, conn);
            }
        }
    }

    // Winner round 1 losers pair up into loser round 1.
    let loser_round1 = loser_ids[0].clone();
    for (i, from) in winner_ids[0].iter().enumerate() {
        if let Some(to) = loser_round1.get(i / 2) {
            link_loser_drop(from, to, (i % 2 + 1) as i64, conn);
        }
    }

    // Winner round r >= 2 losers drop into loser round (r-1)*2, one-to-one,
    // always into slot 2.
    for round in 2..=winner_rounds {
        let loser_round = (round - 1) * 2;
        let Some(targets) = loser_ids.get(loser_round - 1) else {
            continue;
        };

        for (i, from) in winner_ids[round - 1].iter().enumerate() {
            if let Some(to) = targets.get(i) {
                link_loser_drop(from, to, 2, conn);
            }
        }
    }

    tracing::info!(
        %category,
        teams = seeds.len(),
        winner_rounds,
        loser_rounds,
        "double-elimination bracket built"
    );

    Ok(())
}

/// Rebuilds the double-elimination bracket for a category, seeded by the
/// current standings. Destructive: the previous bracket for the category is
/// deleted first. The whole rebuild shares the request's transaction, so a
/// failure part-way leaves the old bracket in place.
pub async fn do_initialize_bracket(
    Path(category): Path<Category>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let team_map = Team::map_of_category(category, &mut *conn);
    let seeds = Standing::of_category(category, None, &mut *conn)
        .iter()
        .filter_map(|row| team_map.get(&row.team_id).cloned())
        .collect_vec();

    if seeds.is_empty() {
        return bad_request(
            Page::new()
                .user(user)
                .category(category)
                .body(maud! {
                    ErrorAlert msg = "There are no teams in this category yet.";
                })
                .render(),
        );
    }

    diesel::delete(
        bracket_matches::table
            .filter(bracket_matches::category.eq(category.as_str())),
    )
    .execute(&mut *conn)
    .unwrap();

    if let Err(e) = build_double_elimination(category, &seeds, &mut *conn) {
        return bad_request(
            Page::new()
                .user(user)
                .category(category)
                .body(maud! {
                    ErrorAlert msg = (&e);
                })
                .render(),
        );
    }

    let _ = msgs.send(Msg {
        category,
        inner: MsgContents::BracketUpdate,
    });

    see_other_ok(Redirect::to(&format!("/admin/{category}")))
}
