use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::config::Config;
use crate::error::RecResult;

const DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pull_requests (
        pr_id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        user_login TEXT NOT NULL,
        labels TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pr_files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pr_id INTEGER NOT NULL,
        file_path TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pr_id INTEGER NOT NULL,
        reviewer TEXT NOT NULL,
        review_date TIMESTAMP,
        state TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS feedback (
        reviewer TEXT PRIMARY KEY,
        fav_rev_points DOUBLE NOT NULL
    )",
];

/// Open the configured database file, creating any missing tables.
pub fn connect(cfg: &Config) -> RecResult<SqliteConnection> {
    let conn = SqliteConnection::establish(&cfg.database.file)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

fn ensure_schema(conn: &SqliteConnection) -> RecResult<()> {
    for ddl in DDL {
        diesel::sql_query(*ddl).execute(conn)?;
    }
    Ok(())
}

pub fn reset(cfg: &Config) -> RecResult<()> {
    let conn = connect(cfg)?;
    truncate_all(&conn)
}

pub fn truncate_all(conn: &SqliteConnection) -> RecResult<()> {
    use crate::domain::schema::{feedback, pr_files, pull_requests, reviews};

    diesel::delete(reviews::table).execute(conn)?;
    diesel::delete(pr_files::table).execute(conn)?;
    diesel::delete(pull_requests::table).execute(conn)?;
    diesel::delete(feedback::table).execute(conn)?;

    info!("all tables truncated");
    Ok(())
}

#[cfg(test)]
pub fn test_conn() -> SqliteConnection {
    let conn = SqliteConnection::establish(":memory:").expect("in-memory sqlite");
    ensure_schema(&conn).expect("schema creation");
    conn
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domain::prs::{FeedbackPoint, NewPrFile, NewReview, PullRequest};
    use crate::domain::schema::{feedback, pr_files, pull_requests, reviews};
    use chrono::NaiveDate;

    fn seed_pull(conn: &SqliteConnection, pr_id: i32, author: &str, labels: &str) {
        let when = NaiveDate::from_ymd(2025, 3, 1).and_hms(0, 0, 0);
        diesel::replace_into(pull_requests::table)
            .values(&PullRequest {
                pr_id,
                title: format!("pr {}", pr_id),
                user_login: author.to_string(),
                labels: labels.to_string(),
                created_at: when,
                updated_at: when,
            })
            .execute(conn)
            .unwrap();
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = test_conn();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
    }

    #[test]
    fn truncate_empties_every_table() {
        let conn = test_conn();

        seed_pull(&conn, 1, "ferris", "bug");
        diesel::insert_into(pr_files::table)
            .values(&NewPrFile {
                pr_id: 1,
                file_path: "src/api.rs".to_string(),
            })
            .execute(&conn)
            .unwrap();
        diesel::insert_into(reviews::table)
            .values(&NewReview {
                pr_id: 1,
                reviewer: "alex".to_string(),
                review_date: None,
                state: "APPROVED".to_string(),
            })
            .execute(&conn)
            .unwrap();
        diesel::replace_into(feedback::table)
            .values(&FeedbackPoint {
                reviewer: "alex".to_string(),
                fav_rev_points: 2.0,
            })
            .execute(&conn)
            .unwrap();

        truncate_all(&conn).unwrap();

        assert_eq!(pull_requests::table.load::<PullRequest>(&conn).unwrap().len(), 0);
        assert_eq!(
            pr_files::table
                .load::<crate::domain::prs::PrFile>(&conn)
                .unwrap()
                .len(),
            0
        );
        assert_eq!(
            reviews::table
                .load::<crate::domain::prs::Review>(&conn)
                .unwrap()
                .len(),
            0
        );
        assert_eq!(feedback::table.load::<FeedbackPoint>(&conn).unwrap().len(), 0);
    }
}
