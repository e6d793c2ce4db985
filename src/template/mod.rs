//! Templating code.
//!
//! This defines the [`Page`] item, which is used in most of the other parts
//! of this crate.

use hypertext::prelude::*;

use crate::{auth::User, tournament::Category};

pub struct Page<R: Renderable, const TX: bool> {
    body: Option<R>,
    user: Option<User<TX>>,
    category: Option<Category>,
}

impl<R: Renderable, const TX: bool> Page<R, TX> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn body(mut self, body: R) -> Self {
        self.body = Some(body);
        self
    }

    pub fn user(mut self, user: User<TX>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn user_opt(mut self, user: Option<User<TX>>) -> Self {
        self.user = user;
        self
    }

    /// Highlights this category in the navigation bar.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

impl<R: Renderable, const TX: bool> Renderable for Page<R, TX> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            html {
                head {
                    title { "Superball" }
                    link
                        href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css"
                        rel="stylesheet";
                    script src="https://cdn.jsdelivr.net/npm/htmx.org@2.0.7/dist/htmx.min.js" integrity="sha384-ZBXiYtYQ6hJ2Y0ZNoYuI+Nq5MqWBr+chMrS/RkXpNzQCApHEhOt2aY8EJgqwHLkJ" crossorigin="anonymous" {
                    }
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                }
                body class="d-flex flex-column vh-100" {
                    nav class="navbar navbar-expand"
                        style="background-color: #452859;"
                        data-bs-theme="dark" {
                        div class="container-fluid" {
                            a class="navbar-brand text-white" href="/" {
                                "Superball"
                            }
                            ul class="navbar-nav me-auto" {
                                @for category in Category::ALL {
                                    li class="nav-item" {
                                        @if self.category == Some(category) {
                                            a class="nav-link active text-white fw-bold"
                                              href=(format!("/{category}")) {
                                                (category.display_name())
                                            }
                                        } @else {
                                            a class="nav-link text-white"
                                              href=(format!("/{category}")) {
                                                (category.display_name())
                                            }
                                        }
                                    }
                                }
                            }
                            ul class="navbar-nav" {
                                @if let Some(user) = &self.user {
                                    li class="nav-item" {
                                        span class="navbar-text text-white me-2" {
                                            (user.username)
                                        }
                                    }
                                    @if let Some(category) = &self.category {
                                        li class="nav-item" {
                                            a class="nav-link text-white"
                                              href=(format!("/admin/{category}")) {
                                                "Manage"
                                            }
                                        }
                                    }
                                    li class="nav-item" {
                                        form method="post" action="/logout" {
                                            button type="submit"
                                                   class="btn btn-link nav-link text-white" {
                                                "Log out"
                                            }
                                        }
                                    }
                                } @else {
                                    li class="nav-item" {
                                        a class="nav-link text-white" href="/login" {
                                            "Login"
                                        }
                                    }
                                }
                            }
                        }
                    }
                    div class="flex-grow-1 container py-4" {
                        @if let Some(body) = &self.body {
                            (body)
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

impl<R: Renderable, const TX: bool> Default for Page<R, TX> {
    fn default() -> Self {
        Self {
            body: Default::default(),
            user: Default::default(),
            category: Default::default(),
        }
    }
}
