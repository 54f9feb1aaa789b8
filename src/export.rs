use std::fs;
use std::path::Path;

use csv::Writer;
use diesel::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::db;
use crate::domain::prs::{FeedbackPoint, PrFile, PullRequest, Review};
use crate::domain::schema::{feedback, pr_files, pull_requests, reviews};
use crate::error::RecResult;

/// Dump every table to `<out>/<table>.csv` with a header row.
pub fn run(cfg: &Config, out: &Path) -> RecResult<()> {
    let conn = db::connect(cfg)?;
    fs::create_dir_all(out)?;

    write_csv(
        &out.join("pull_requests.csv"),
        &pull_requests::table.load::<PullRequest>(&conn)?,
    )?;
    write_csv(&out.join("pr_files.csv"), &pr_files::table.load::<PrFile>(&conn)?)?;
    write_csv(&out.join("reviews.csv"), &reviews::table.load::<Review>(&conn)?)?;
    write_csv(
        &out.join("feedback.csv"),
        &feedback::table.load::<FeedbackPoint>(&conn)?,
    )?;

    info!("exported all tables to {}", out.display());
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> RecResult<()> {
    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
