use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use diesel_migrations::MigrationHarness;
use hypertext::prelude::*;
use tower_http::trace::TraceLayer;

use crate::{
    MIGRATIONS,
    auth::{
        User,
        login::{do_login, do_logout, login_page},
    },
    msg::Msg,
    state::{AppState, DbPool, tx_commit_middleware},
    template::Page,
    tournament::{
        Category,
        admin::admin_dashboard,
        bracket::{
            advance::do_record_bracket_winner,
            builder::do_initialize_bracket,
        },
        group_matches::do_enter_group_result,
        live::category_updates,
        playoffs::{do_enter_playoff_result, do_initialize_playoffs},
        public::category_page,
        teams::{do_create_team, do_delete_team, do_edit_team},
    },
    util_resp::{StandardResponse, success},
};

pub async fn home(user: Option<User<true>>) -> StandardResponse {
    success(
        Page::new()
            .user_opt(user)
            .body(maud! {
                h1 { "Superball" }
                p {
                    "The school sports tournament — live standings, "
                    "schedules and brackets for all three divisions."
                }
                ul {
                    @for category in Category::ALL {
                        li {
                            a href=(format!("/{category}")) {
                                (category.display_name())
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

pub fn create_app(pool: DbPool) -> Router {
    {
        let mut conn = pool.get().unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
    }

    let key = match std::env::var("SECRET_KEY") {
        Ok(secret) => Key::from(secret.as_bytes()),
        Err(_) => Key::generate(),
    };

    let (msgs, _) = tokio::sync::broadcast::channel::<Msg>(1000);

    let state = AppState { pool, key, msgs };

    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(do_login))
        .route("/logout", post(do_logout))
        .route("/:category", get(category_page))
        .route("/:category/live", get(category_updates))
        .route("/admin/:category", get(admin_dashboard))
        .route("/admin/:category/teams", post(do_create_team))
        .route("/admin/teams/:team_id/edit", post(do_edit_team))
        .route("/admin/teams/:team_id/delete", post(do_delete_team))
        .route(
            "/admin/group-matches/:match_id/result",
            post(do_enter_group_result),
        )
        .route(
            "/admin/playoff-matches/:match_id/result",
            post(do_enter_playoff_result),
        )
        .route(
            "/admin/:category/playoffs/init",
            post(do_initialize_playoffs),
        )
        .route("/admin/:category/bracket/init", post(do_initialize_bracket))
        .route(
            "/admin/bracket-matches/:match_id/winner",
            post(do_record_bracket_winner),
        )
        .layer(middleware::from_fn(tx_commit_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
