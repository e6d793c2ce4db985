use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    extract::Form,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;
use url::Url;

use crate::{
    auth::{User, clear_login_cookie, set_login_cookie},
    schema::users,
    state::Conn,
    template::Page,
    util_resp::{StandardResponse, bad_request, success},
    widgets::alert::ErrorAlert,
};

pub async fn login_page(user: Option<User<true>>) -> StandardResponse {
    if user.is_some() {
        return success(
            Page::new()
                .user_opt(user)
                .body(maud! {
                    ErrorAlert
                        msg = "You are already logged in, so cannot log in!";
                })
                .render(),
        );
    }

    success(
        Page::new()
            .user_opt(user)
            .body(maud! {
                form method="post" class="login-form" {
                    div class="form-group" {
                        label for="email" { "Email address" }
                        input type="email" class="form-control" id="email" name="id" placeholder="Enter email";
                    }
                    div class="form-group" {
                        label for="password" { "Password" }
                        input type="password" class="form-control" id="password" name="password" placeholder="Password";
                    }
                    button type="submit" class="btn btn-primary" { "Submit" }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct LoginForm {
    id: String,
    password: String,
    next: Option<String>,
}

pub async fn do_login(
    user: Option<User<true>>,
    mut conn: Conn<true>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let user1 = match users::table
        .filter(users::email.eq(&form.id).or(users::username.eq(&form.id)))
        .first::<User<true>>(&mut *conn)
        .optional()
        .unwrap()
    {
        Some(user) => user,
        None => {
            return bad_request(
                Page::new()
                    .user_opt(user)
                    .body(maud! {
                        ErrorAlert
                            msg = "No such user exists. Please return to the
                                   previous page and try again.";
                    })
                    .render(),
            )
            .into_response();
        }
    };

    let parsed_hash = PasswordHash::new(&user1.password_hash).unwrap();
    if Argon2::default()
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        // todo: password rate limiting
        return bad_request(
            Page::new()
                .user_opt(user)
                .body(maud! {
                    ErrorAlert msg =
                        "Incorrect password. Please return to the previous
                         page and try again.";
                })
                .render(),
        )
        .into_response();
    }

    let jar = set_login_cookie(user1.id, jar);

    let redirect_to = if let Some(url) =
        form.next.as_deref().and_then(|url| url.parse::<Url>().ok())
    {
        url.path().to_string()
    } else {
        "/".to_string()
    };

    (jar, Redirect::to(&redirect_to)).into_response()
}

pub async fn do_logout(jar: PrivateCookieJar) -> Response {
    (clear_login_cookie(jar), Redirect::to("/")).into_response()
}
