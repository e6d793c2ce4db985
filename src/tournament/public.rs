//! The public, read-only view of one category: standings, the round-robin
//! schedule, and whichever playoff structures exist. The page subscribes to
//! the category's WebSocket channel and reloads itself on any change.

use std::collections::{BTreeMap, HashMap};

use diesel::{connection::LoadConnection, sqlite::Sqlite};
use hypertext::prelude::*;

use crate::{
    auth::User,
    state::Conn,
    template::Page,
    tournament::{
        Category,
        bracket::{BracketMatch, BracketSide},
        group_matches::GroupMatch,
        live::WEBSOCKET_SCHEME,
        playoffs::{PlayoffMatch, PlayoffRound},
        standings::Standing,
        teams::{Team, name_of},
    },
    util_resp::{StandardResponse, success},
    widgets::alert::InfoAlert,
};

use axum::extract::Path;

pub struct StandingsTable<'a> {
    pub title: &'a str,
    pub rows: &'a [Standing],
}

impl Renderable for StandingsTable<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            h3 { (self.title) }
            table class="table table-striped align-middle" {
                thead {
                    tr {
                        th { "#" }
                        th { "Team" }
                        th { "P" }
                        th { "W" }
                        th { "D" }
                        th { "L" }
                        th { "GF" }
                        th { "GA" }
                        th { "GD" }
                        th { "Pts" }
                    }
                }
                tbody {
                    @for (rank, row) in self.rows.iter().enumerate() {
                        tr {
                            td { (rank + 1) }
                            td {
                                span class="fw-bold" { (row.label()) }
                                @if let Some(group) = &row.group_name {
                                    span class="badge bg-secondary ms-2" {
                                        "Group " (group)
                                    }
                                }
                            }
                            td { (row.played) }
                            td { (row.won) }
                            td { (row.drawn) }
                            td { (row.lost) }
                            td { (row.goals_for) }
                            td { (row.goals_against) }
                            td { (row.goal_difference) }
                            td class="fw-bold" { (row.points) }
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

/// Groups a schedule by match day, preserving match-number order within
/// each day.
pub fn by_match_day(
    matches: Vec<GroupMatch>,
) -> BTreeMap<i64, Vec<GroupMatch>> {
    let mut days: BTreeMap<i64, Vec<GroupMatch>> = BTreeMap::new();
    for m in matches {
        days.entry(m.match_day).or_default().push(m);
    }
    days
}

pub async fn category_page(
    Path(category): Path<Category>,
    user: Option<User<false>>,
    mut conn: Conn<false>,
) -> StandardResponse {
    let teams = Team::map_of_category(category, &mut *conn);

    let standings: Vec<(String, Vec<Standing>)> =
        if category.groups().is_empty() {
            vec![(
                "Standings".to_string(),
                Standing::of_category(category, None, &mut *conn),
            )]
        } else {
            category
                .groups()
                .iter()
                .map(|group| {
                    (
                        format!("Group {group} standings"),
                        Standing::of_category(
                            category,
                            Some(group),
                            &mut *conn,
                        ),
                    )
                })
                .collect()
        };

    let schedule =
        by_match_day(GroupMatch::of_category(category, None, &mut *conn));

    let playoffs = PlayoffMatch::of_category(category, &mut *conn);
    let semi1 = PlayoffMatch::find(&playoffs, PlayoffRound::Semifinal, 1).cloned();
    let semi2 = PlayoffMatch::find(&playoffs, PlayoffRound::Semifinal, 2).cloned();
    let the_final = PlayoffMatch::find(&playoffs, PlayoffRound::Final, 1).cloned();
    let third = PlayoffMatch::find(&playoffs, PlayoffRound::ThirdPlace, 1).cloned();

    let winner_side = bracket_rounds(category, BracketSide::Winner, &mut *conn);
    let loser_side = bracket_rounds(category, BracketSide::Loser, &mut *conn);

    success(
        Page::new()
            .user_opt(user)
            .category(category)
            .body(maud! {
                h1 class="mb-4" { (category.display_name()) }

                div class="row" {
                    @for (title, rows) in &standings {
                        div class="col-lg-6" {
                            StandingsTable
                                title=(title.as_str())
                                rows=(rows.as_slice());
                        }
                    }
                }

                h2 class="mt-4" { "Schedule" }
                @if schedule.is_empty() {
                    InfoAlert msg = "The schedule has not been published yet.";
                }
                @for (day, matches) in &schedule {
                    h4 class="mt-3" { "Match day " (day) }
                    table class="table table-sm align-middle" {
                        tbody {
                            @for m in matches {
                                tr {
                                    td class="text-muted" { "#" (m.match_number) }
                                    td { (name_of(&teams, m.team1_id.as_ref())) }
                                    td class="text-center" {
                                        @if m.is_decided() {
                                            span class="fw-bold" {
                                                (m.team1_score.unwrap())
                                                " : "
                                                (m.team2_score.unwrap())
                                            }
                                        } @else {
                                            span class="text-muted" { "vs" }
                                        }
                                    }
                                    td { (name_of(&teams, m.team2_id.as_ref())) }
                                }
                            }
                        }
                    }
                }

                @if !playoffs.is_empty() {
                    h2 class="mt-4" { "Playoffs" }
                    div class="row" {
                        @for (title, m) in [
                            ("Semifinal 1", semi1.clone()),
                            ("Semifinal 2", semi2.clone()),
                            ("Final", the_final.clone()),
                            ("Third place", third.clone()),
                        ] {
                            @if let Some(m) = m {
                                div class="col-md-6 col-xl-3" {
                                    div class="card mb-3" {
                                        div class="card-header fw-bold" { (title) }
                                        div class="card-body" {
                                            p {
                                                (name_of(&teams, m.team1_id.as_ref()))
                                                @if let Some(score) = m.team1_score {
                                                    span class="fw-bold ms-2" { (score) }
                                                }
                                            }
                                            p {
                                                (name_of(&teams, m.team2_id.as_ref()))
                                                @if let Some(score) = m.team2_score {
                                                    span class="fw-bold ms-2" { (score) }
                                                }
                                            }
                                            @if let Some(winner) = &m.winner_id {
                                                p class="text-success fw-bold mb-0" {
                                                    "Winner: "
                                                    (name_of(&teams, Some(winner)))
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                @if !winner_side.is_empty() {
                    h2 class="mt-4" { "Elimination bracket" }
                    (bracket_section("Winner bracket", &winner_side, &teams))
                    (bracket_section("Loser bracket", &loser_side, &teams))
                }

                script {
                    (format!(
                        r#"
                        const socket = new WebSocket(`{WEBSOCKET_SCHEME}${{window.location.host}}/{category}/live`);
                        socket.onmessage = function(event) {{
                            window.location.reload();
                        }};
                        "#
                    ))
                }
            })
            .render(),
    )
}

fn bracket_rounds(
    category: Category,
    side: BracketSide,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> BTreeMap<i64, Vec<BracketMatch>> {
    let mut rounds: BTreeMap<i64, Vec<BracketMatch>> = BTreeMap::new();
    for m in BracketMatch::of_side(category, side, conn) {
        rounds.entry(m.round).or_default().push(m);
    }
    rounds
}

fn bracket_section<'a>(
    title: &'a str,
    rounds: &'a BTreeMap<i64, Vec<BracketMatch>>,
    teams: &'a HashMap<String, Team>,
) -> impl Renderable + 'a {
    maud! {
        h3 class="mt-3" { (title) }
        div class="d-flex flex-row gap-4 overflow-auto" {
            @for (round, matches) in rounds {
                div {
                    h5 { "Round " (round) }
                    @for m in matches {
                        div class="card mb-2" style="min-width: 14rem;" {
                            div class="card-body py-2" {
                                @let decided = m.winner_id.is_some();
                                @for (team, slot_winner) in [
                                    (m.team1_id.as_ref(), m.winner_id == m.team1_id),
                                    (m.team2_id.as_ref(), m.winner_id == m.team2_id),
                                ] {
                                    @if decided && slot_winner {
                                        p class="mb-1 fw-bold text-success" {
                                            (name_of(teams, team))
                                        }
                                    } @else {
                                        p class="mb-1" {
                                            (name_of(teams, team))
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
