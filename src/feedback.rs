use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::domain::prs::FeedbackPoint;
use crate::domain::schema::feedback;
use crate::error::RecResult;

pub fn run(cfg: &Config, reviewer: &str, delta: f64) -> RecResult<()> {
    let conn = db::connect(cfg)?;
    let total = apply_delta(&conn, reviewer, delta)?;

    info!(
        "{} now has {} favorite-reviewer point(s) ({:+})",
        reviewer, total, delta
    );
    Ok(())
}

/// Add `delta` to the reviewer's stored total, creating the row if absent.
/// Returns the new total.
pub fn apply_delta(conn: &SqliteConnection, reviewer: &str, delta: f64) -> RecResult<f64> {
    let current = feedback::table
        .find(reviewer)
        .first::<FeedbackPoint>(conn)
        .optional()?
        .map(|f| f.fav_rev_points)
        .unwrap_or(0.0);

    let total = current + delta;
    diesel::replace_into(feedback::table)
        .values(&FeedbackPoint {
            reviewer: reviewer.to_string(),
            fav_rev_points: total,
        })
        .execute(conn)?;

    Ok(total)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_delta_creates_the_row() {
        let conn = db::test_conn();

        assert_eq!(apply_delta(&conn, "ferris", 2.5).unwrap(), 2.5);

        let rows = feedback::table.load::<FeedbackPoint>(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reviewer, "ferris");
        assert_eq!(rows[0].fav_rev_points, 2.5);
    }

    #[test]
    fn plus_five_minus_five_round_trips() {
        let conn = db::test_conn();

        apply_delta(&conn, "ferris", 1.0).unwrap();
        apply_delta(&conn, "ferris", 5.0).unwrap();
        let total = apply_delta(&conn, "ferris", -5.0).unwrap();

        assert_eq!(total, 1.0);
        let rows = feedback::table.load::<FeedbackPoint>(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fav_rev_points, 1.0);
    }

    #[test]
    fn deltas_are_per_reviewer() {
        let conn = db::test_conn();

        apply_delta(&conn, "ferris", 3.0).unwrap();
        apply_delta(&conn, "corro", -1.0).unwrap();

        let mut rows = feedback::table.load::<FeedbackPoint>(&conn).unwrap();
        rows.sort_by(|a, b| a.reviewer.cmp(&b.reviewer));
        assert_eq!(rows[0].reviewer, "corro");
        assert_eq!(rows[0].fav_rev_points, -1.0);
        assert_eq!(rows[1].reviewer, "ferris");
        assert_eq!(rows[1].fav_rev_points, 3.0);
    }
}
