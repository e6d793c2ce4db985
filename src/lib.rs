//! A small tournament-management web application for a school sports event.
//!
//! Teams play a round-robin group stage per age category; standings are a
//! database view over the results. From the standings an operator can seed
//! either the fixed semifinal/final/third-place playoff or a full
//! double-elimination bracket. Public pages show everything live, refreshed
//! over a WebSocket whenever the operator saves a result.

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod auth;
pub mod config;
pub mod msg;
pub mod schema;
pub mod state;
pub mod template;
pub mod tournament;
pub mod util_resp;
pub mod widgets;

#[cfg(test)]
mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
