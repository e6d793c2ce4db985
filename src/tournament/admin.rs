//! The operator dashboard for one category: team management, group-stage
//! score entry, playoff initialization and score entry, and the
//! double-elimination bracket controls. All mutations POST to the endpoints
//! in the sibling modules and redirect back here.

use std::collections::HashMap;

use axum::extract::Path;
use hypertext::prelude::*;

use crate::{
    auth::User,
    state::Conn,
    template::Page,
    tournament::{
        Category,
        bracket::{BracketMatch, BracketSide},
        group_matches::GroupMatch,
        playoffs::{PlayoffMatch, PlayoffRound},
        public::by_match_day,
        teams::{Team, name_of},
    },
    util_resp::{StandardResponse, success},
    widgets::alert::InfoAlert,
};

pub async fn admin_dashboard(
    Path(category): Path<Category>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let team_list = Team::of_category(category, &mut *conn);
    let teams: HashMap<String, Team> = team_list
        .iter()
        .cloned()
        .map(|t| (t.id.clone(), t))
        .collect();

    let schedule =
        by_match_day(GroupMatch::of_category(category, None, &mut *conn));

    let playoffs = PlayoffMatch::of_category(category, &mut *conn);
    let playoff_cards = [
        ("Semifinal 1", PlayoffMatch::find(&playoffs, PlayoffRound::Semifinal, 1).cloned()),
        ("Semifinal 2", PlayoffMatch::find(&playoffs, PlayoffRound::Semifinal, 2).cloned()),
        ("Final", PlayoffMatch::find(&playoffs, PlayoffRound::Final, 1).cloned()),
        ("Third place", PlayoffMatch::find(&playoffs, PlayoffRound::ThirdPlace, 1).cloned()),
    ];

    let bracket = BracketMatch::of_category(category, &mut *conn);

    success(
        Page::new()
            .user(user)
            .category(category)
            .body(maud! {
                h1 class="mb-4" {
                    "Manage " (category.display_name())
                }

                h2 { "Teams (" (team_list.len()) ")" }
                form method="post"
                     action=(format!("/admin/{category}/teams"))
                     class="row g-2 mb-3" {
                    div class="col-auto" {
                        input type="text" class="form-control" name="name"
                              placeholder="Team name" required;
                    }
                    div class="col-auto" {
                        input type="text" class="form-control" name="class_name"
                              placeholder="Class (optional)";
                    }
                    div class="col-auto" {
                        input type="text" class="form-control" name="nickname"
                              placeholder="Nickname (optional)";
                    }
                    @if !category.groups().is_empty() {
                        div class="col-auto" {
                            select class="form-select" name="group_name" {
                                @for group in category.groups() {
                                    option value=(group) { "Group " (group) }
                                }
                            }
                        }
                    }
                    div class="col-auto" {
                        button type="submit" class="btn btn-success" {
                            "Add team"
                        }
                    }
                }
                table class="table align-middle" {
                    tbody {
                        @for team in &team_list {
                            tr {
                                td {
                                    form method="post"
                                         action=(format!("/admin/teams/{}/edit", team.id))
                                         class="row g-2" {
                                        div class="col-auto" {
                                            input type="text" class="form-control form-control-sm"
                                                  name="name" value=(team.name) required;
                                        }
                                        div class="col-auto" {
                                            input type="text" class="form-control form-control-sm"
                                                  name="class_name"
                                                  value=(team.class_name.as_deref().unwrap_or(""))
                                                  placeholder="Class";
                                        }
                                        div class="col-auto" {
                                            input type="text" class="form-control form-control-sm"
                                                  name="nickname"
                                                  value=(team.nickname.as_deref().unwrap_or(""))
                                                  placeholder="Nickname";
                                        }
                                        div class="col-auto" {
                                            button type="submit"
                                                   class="btn btn-sm btn-outline-primary" {
                                                "Save"
                                            }
                                        }
                                    }
                                }
                                td class="text-muted" {
                                    @if let Some(group) = &team.group_name {
                                        "Group " (group)
                                    }
                                }
                                td class="text-end" {
                                    form method="post"
                                         action=(format!("/admin/teams/{}/delete", team.id)) {
                                        button type="submit"
                                               class="btn btn-sm btn-outline-danger" {
                                            "Delete"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                h2 class="mt-4" { "Group stage" }
                @if schedule.is_empty() {
                    InfoAlert msg = "No schedule has been seeded for this
                                     category yet.";
                }
                @for (day, matches) in &schedule {
                    h4 class="mt-3" { "Match day " (day) }
                    table class="table table-sm align-middle" {
                        tbody {
                            @for m in matches {
                                tr {
                                    td class="text-muted" { "#" (m.match_number) }
                                    td { (name_of(&teams, m.team1_id.as_ref())) }
                                    td { (name_of(&teams, m.team2_id.as_ref())) }
                                    td {
                                        form method="post"
                                             action=(format!("/admin/group-matches/{}/result", m.id))
                                             class="row g-1" {
                                            div class="col-auto" {
                                                input type="number" min="0"
                                                      class="form-control form-control-sm"
                                                      style="width: 4rem;"
                                                      name="team1_score"
                                                      value=(m.team1_score.map(|s| s.to_string()).unwrap_or_default())
                                                      required;
                                            }
                                            div class="col-auto" {
                                                input type="number" min="0"
                                                      class="form-control form-control-sm"
                                                      style="width: 4rem;"
                                                      name="team2_score"
                                                      value=(m.team2_score.map(|s| s.to_string()).unwrap_or_default())
                                                      required;
                                            }
                                            div class="col-auto" {
                                                button type="submit"
                                                       class="btn btn-sm btn-primary" {
                                                    @if m.is_decided() {
                                                        "Update"
                                                    } @else {
                                                        "Save"
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

                h2 class="mt-4" { "Playoffs" }
                form method="post"
                     action=(format!("/admin/{category}/playoffs/init"))
                     class="mb-3" {
                    button type="submit" class="btn btn-warning" {
                        @if playoffs.is_empty() {
                            "Initialize playoffs from standings"
                        } @else {
                            "Re-initialize playoffs (replaces current matches)"
                        }
                    }
                }
                div class="row" {
                    @for (title, m) in &playoff_cards {
                        @if let Some(m) = m {
                            div class="col-md-6 col-xl-3" {
                                div class="card mb-3" {
                                    div class="card-header fw-bold" { (title) }
                                    div class="card-body" {
                                        p class="mb-1" {
                                            (name_of(&teams, m.team1_id.as_ref()))
                                        }
                                        p class="mb-2" {
                                            (name_of(&teams, m.team2_id.as_ref()))
                                        }
                                        @if m.team1_id.is_some() && m.team2_id.is_some() {
                                            form method="post"
                                                 action=(format!("/admin/playoff-matches/{}/result", m.id))
                                                 class="row g-1" {
                                                div class="col-auto" {
                                                    input type="number" min="0"
                                                          class="form-control form-control-sm"
                                                          style="width: 4rem;"
                                                          name="team1_score"
                                                          value=(m.team1_score.map(|s| s.to_string()).unwrap_or_default())
                                                          required;
                                                }
                                                div class="col-auto" {
                                                    input type="number" min="0"
                                                          class="form-control form-control-sm"
                                                          style="width: 4rem;"
                                                          name="team2_score"
                                                          value=(m.team2_score.map(|s| s.to_string()).unwrap_or_default())
                                                          required;
                                                }
                                                div class="col-auto" {
                                                    button type="submit"
                                                           class="btn btn-sm btn-primary" {
                                                        "Save"
                                                    }
                                                }
                                            }
                                        } @else {
                                            p class="text-muted mb-0" {
                                                "Waiting for participants"
                                            }
                                        }
                                        @if let Some(winner) = &m.winner_id {
                                            p class="text-success fw-bold mt-2 mb-0" {
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

                h2 class="mt-4" { "Elimination bracket" }
                form method="post"
                     action=(format!("/admin/{category}/bracket/init"))
                     class="mb-3" {
                    button type="submit" class="btn btn-warning" {
                        @if bracket.is_empty() {
                            "Build bracket from standings"
                        } @else {
                            "Rebuild bracket (replaces current matches)"
                        }
                    }
                }
                @if bracket.is_empty() {
                    InfoAlert msg = "No bracket has been built for this
                                     category yet.";
                }
                table class="table table-sm align-middle" {
                    tbody {
                        @for m in &bracket {
                            tr {
                                td class="text-muted" {
                                    @if m.side() == BracketSide::Winner {
                                        "WB"
                                    } @else {
                                        "LB"
                                    }
                                    " R" (m.round)
                                    " #" (m.position_in_round + 1)
                                }
                                td { (name_of(&teams, m.team1_id.as_ref())) }
                                td { (name_of(&teams, m.team2_id.as_ref())) }
                                td {
                                    @if let Some(winner) = &m.winner_id {
                                        span class="text-success fw-bold" {
                                            "Winner: "
                                            (name_of(&teams, Some(winner)))
                                        }
                                    }
                                }
                                td class="text-end" {
                                    @if m.team1_id.is_some() && m.team2_id.is_some() {
                                        form method="post"
                                             action=(format!("/admin/bracket-matches/{}/winner", m.id))
                                             class="d-inline" {
                                            @for team_id in [&m.team1_id, &m.team2_id] {
                                                @if let Some(team_id) = team_id {
                                                    button type="submit"
                                                           name="winner_id"
                                                           value=(team_id)
                                                           class="btn btn-sm btn-outline-success me-1" {
                                                        (name_of(&teams, Some(team_id)))
                                                        " won"
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
            })
            .render(),
    )
}
