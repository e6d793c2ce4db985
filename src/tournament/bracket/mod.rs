use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    schema::bracket_matches, tournament::Category, util_resp::FailureResponse,
};

pub mod advance;
pub mod builder;

/// Which side of the double-elimination tree a match belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketSide {
    Winner,
    Loser,
}

impl BracketSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BracketSide::Winner => "winner",
            BracketSide::Loser => "loser",
        }
    }

    pub fn parse(s: &str) -> Option<BracketSide> {
        match s {
            "winner" => Some(BracketSide::Winner),
            "loser" => Some(BracketSide::Loser),
            _ => None,
        }
    }
}

/// One node of the double-elimination tree. `next_match_*` says where the
/// winner advances to, `loser_next_match_*` where the loser drops to; the
/// position selects slot 1 (`team1`) or 2 (`team2`) of the downstream match.
/// A match with no winner link is a final.
#[derive(Queryable, Clone, Debug)]
pub struct BracketMatch {
    pub id: String,
    pub category: String,
    pub bracket: String,
    pub round: i64,
    pub match_number: i64,
    pub position_in_round: i64,
    pub team1_id: Option<String>,
    pub team2_id: Option<String>,
    pub winner_id: Option<String>,
    pub status: String,
    pub next_match_id: Option<String>,
    pub next_match_position: Option<i64>,
    pub loser_next_match_id: Option<String>,
    pub loser_next_match_position: Option<i64>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl BracketMatch {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        match_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<BracketMatch, FailureResponse> {
        bracket_matches::table
            .filter(bracket_matches::id.eq(match_id))
            .first::<BracketMatch>(&mut *conn)
            .optional()
            .unwrap()
            .ok_or(FailureResponse::NotFound(()))
    }

    /// Display order: bracket side, then round, then position in round.
    pub fn of_category(
        category: Category,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Vec<BracketMatch> {
        bracket_matches::table
            .filter(bracket_matches::category.eq(category.as_str()))
            .order_by((
                bracket_matches::bracket.asc(),
                bracket_matches::round.asc(),
                bracket_matches::position_in_round.asc(),
            ))
            .load::<BracketMatch>(&mut *conn)
            .unwrap()
    }

    pub fn of_side(
        category: Category,
        side: BracketSide,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Vec<BracketMatch> {
        bracket_matches::table
            .filter(
                bracket_matches::category
                    .eq(category.as_str())
                    .and(bracket_matches::bracket.eq(side.as_str())),
            )
            .order_by((
                bracket_matches::round.asc(),
                bracket_matches::position_in_round.asc(),
            ))
            .load::<BracketMatch>(&mut *conn)
            .unwrap()
    }

    pub fn side(&self) -> BracketSide {
        BracketSide::parse(&self.bracket)
            .expect("bracket column holds an unknown value")
    }
}
