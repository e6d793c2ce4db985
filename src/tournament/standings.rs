use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::Serialize;

use crate::{schema::standings, tournament::Category};

/// One row of the group-stage table. This is a projection of the `standings`
/// database view; none of the aggregation is re-done in Rust.
#[derive(Queryable, Serialize, Clone, Debug)]
pub struct Standing {
    pub team_id: String,
    pub name: String,
    pub class_name: Option<String>,
    pub category: String,
    pub group_name: Option<String>,
    pub played: i64,
    pub won: i64,
    pub drawn: i64,
    pub lost: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
    pub points: i64,
}

impl Standing {
    /// Rows come back pre-sorted by the view (points, then goal difference,
    /// then goals scored); this function applies no ordering of its own.
    #[tracing::instrument(skip(conn))]
    pub fn of_category(
        category: Category,
        group: Option<&str>,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Vec<Standing> {
        let mut query = standings::table
            .filter(standings::category.eq(category.as_str()))
            .into_boxed();

        if let Some(group) = group {
            query = query.filter(standings::group_name.eq(group));
        }

        query.load::<Standing>(&mut *conn).unwrap()
    }

    pub fn label(&self) -> String {
        match &self.class_name {
            Some(class) => format!("{} ({})", self.name, class),
            None => self.name.clone(),
        }
    }
}
