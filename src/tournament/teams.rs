use std::collections::HashMap;

use axum::{
    extract::{Form, Path, State},
    response::Redirect,
};
use chrono::Utc;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::Sender;
use uuid::Uuid;

use crate::{
    auth::User,
    msg::{Msg, MsgContents},
    schema::teams,
    state::Conn,
    template::Page,
    tournament::Category,
    util_resp::{FailureResponse, StandardResponse, bad_request, see_other_ok},
    widgets::alert::ErrorAlert,
};

#[derive(Serialize, Deserialize, Queryable, Clone, Debug)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub class_name: Option<String>,
    pub nickname: Option<String>,
    pub category: String,
    pub group_name: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl Team {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        team_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Team, FailureResponse> {
        teams::table
            .filter(teams::id.eq(team_id))
            .first::<Team>(&mut *conn)
            .optional()
            .unwrap()
            .ok_or(FailureResponse::NotFound(()))
    }

    /// All teams of a category, in registration order.
    pub fn of_category(
        category: Category,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Vec<Team> {
        teams::table
            .filter(teams::category.eq(category.as_str()))
            .order_by(teams::created_at.asc())
            .load::<Team>(&mut *conn)
            .unwrap()
    }

    /// Lookup map for resolving team references in match rows. Deleted teams
    /// are simply absent; the caller renders a placeholder for those.
    pub fn map_of_category(
        category: Category,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> HashMap<String, Team> {
        Self::of_category(category, conn)
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect()
    }

    pub fn label(&self) -> String {
        match &self.class_name {
            Some(class) => format!("{} ({})", self.name, class),
            None => self.name.clone(),
        }
    }
}

/// Display name for a possibly-dangling team reference.
pub fn name_or_tbd(team: Option<&Team>) -> String {
    match team {
        Some(team) => team.label(),
        None => "TBD".to_string(),
    }
}

/// Resolves a team reference out of a lookup map; dangling references (for
/// example after a team deletion) come back as the placeholder.
pub fn name_of(teams: &HashMap<String, Team>, id: Option<&String>) -> String {
    name_or_tbd(id.and_then(|id| teams.get(id)))
}

#[derive(Deserialize)]
pub struct TeamForm {
    name: String,
    #[serde(default)]
    class_name: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    group_name: String,
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub async fn do_create_team(
    Path(category): Path<Category>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
    Form(form): Form<TeamForm>,
) -> StandardResponse {
    let Some(name) = non_empty(&form.name) else {
        return bad_request(
            Page::new()
                .user(user)
                .category(category)
                .body(maud! {
                    ErrorAlert msg = "Please enter a team name.";
                })
                .render(),
        );
    };

    let group_name = non_empty(&form.group_name);
    if let Some(group) = &group_name
        && !category.groups().contains(&group.as_str())
    {
        return bad_request(
            Page::new()
                .user(user)
                .category(category)
                .body(maud! {
                    ErrorAlert msg = (format!(
                        "There is no group \"{group}\" in this category."
                    ));
                })
                .render(),
        );
    }

    let n = diesel::insert_into(teams::table)
        .values((
            teams::id.eq(Uuid::now_v7().to_string()),
            teams::name.eq(&name),
            teams::class_name.eq(non_empty(&form.class_name)),
            teams::nickname.eq(non_empty(&form.nickname)),
            teams::category.eq(category.as_str()),
            teams::group_name.eq(group_name),
            teams::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)
        .unwrap();
    assert_eq!(n, 1);

    let _ = msgs.send(Msg {
        category,
        inner: MsgContents::TeamsUpdate,
    });

    see_other_ok(Redirect::to(&format!("/admin/{category}")))
}

pub async fn do_edit_team(
    Path(team_id): Path<String>,
    user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
    Form(form): Form<TeamForm>,
) -> StandardResponse {
    let team = Team::fetch(&team_id, &mut *conn)?;
    let category = Category::parse(&team.category)
        .expect("team category column holds an unknown value");

    let Some(name) = non_empty(&form.name) else {
        return bad_request(
            Page::new()
                .user(user)
                .category(category)
                .body(maud! {
                    ErrorAlert msg = "Please enter a team name.";
                })
                .render(),
        );
    };

    let n = diesel::update(teams::table.filter(teams::id.eq(&team.id)))
        .set((
            teams::name.eq(&name),
            teams::class_name.eq(non_empty(&form.class_name)),
            teams::nickname.eq(non_empty(&form.nickname)),
        ))
        .execute(&mut *conn)
        .unwrap();
    assert_eq!(n, 1);

    let _ = msgs.send(Msg {
        category,
        inner: MsgContents::TeamsUpdate,
    });

    see_other_ok(Redirect::to(&format!("/admin/{category}")))
}

/// Deleting a team does *not* delete matches which reference it; those
/// matches keep their dangling reference and render a placeholder instead.
pub async fn do_delete_team(
    Path(team_id): Path<String>,
    _user: User<true>,
    State(msgs): State<Sender<Msg>>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let team = Team::fetch(&team_id, &mut *conn)?;
    let category = Category::parse(&team.category)
        .expect("team category column holds an unknown value");

    let n = diesel::delete(teams::table.filter(teams::id.eq(&team.id)))
        .execute(&mut *conn)
        .unwrap();
    assert_eq!(n, 1);

    let _ = msgs.send(Msg {
        category,
        inner: MsgContents::TeamsUpdate,
    });

    see_other_ok(Redirect::to(&format!("/admin/{category}")))
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;

    use crate::{
        schema::{group_matches, teams},
        test::{insert_group_match, insert_team, test_conn},
        tournament::Category,
        tournament::teams::{Team, name_or_tbd},
    };

    #[test]
    fn deleting_a_team_leaves_its_matches_behind() {
        let mut conn = test_conn();

        let a = insert_team(&mut conn, Category::Lower, None, "Alpha");
        let b = insert_team(&mut conn, Category::Lower, None, "Beta");
        insert_group_match(&mut conn, Category::Lower, None, 1, 1, &a, &b);

        diesel::delete(teams::table.filter(teams::id.eq(&a)))
            .execute(&mut conn)
            .unwrap();

        let remaining = group_matches::table
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(remaining, 1);

        let map = Team::map_of_category(Category::Lower, &mut conn);
        assert!(map.get(&a).is_none());
        assert_eq!(name_or_tbd(map.get(&a)), "TBD");
        assert_eq!(name_or_tbd(map.get(&b)), "Beta");
    }
}
