use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::domain::prs::{FeedbackPoint, PrFile, PullRequest, Review};
use crate::domain::schema::{feedback, pr_files, pull_requests, reviews};
use crate::error::RecResult;
use crate::github::Client;
use crate::ingest;
use crate::scoring::{self, Candidate, HistoryEntry, TargetPr};

pub fn run(cfg: &Config, pr_number: i32, top_n: Option<usize>, post: bool) -> RecResult<()> {
    let conn = db::connect(cfg)?;

    let target = match ensure_target(&conn, cfg, pr_number)? {
        Some(target) => target,
        None => {
            println!("{}", render_empty(pr_number));
            return Ok(());
        }
    };

    let mut params = cfg.recommend.clone();
    if let Some(n) = top_n {
        params.top_n = n;
    }

    let history = load_history(&conn)?;
    let points = load_feedback(&conn)?;
    let ranked = scoring::rank_reviewers(&target, &history, &points, &params, Utc::now().naive_utc());

    let body = render(&target, &ranked);
    println!("{}", body);

    if post {
        let client = Client::new(cfg)?;
        client.new_comment(pr_number, &body)?;
        info!("posted recommendation on #{}", pr_number);
    }

    Ok(())
}

/// Load the target PR from the database, fetching and storing it first if it
/// is not there yet. `None` means the PR cannot be resolved at all, which is
/// reported as "no recommendation" rather than a failure.
fn ensure_target(
    conn: &SqliteConnection,
    cfg: &Config,
    pr_number: i32,
) -> RecResult<Option<TargetPr>> {
    let known = pull_requests::table
        .find(pr_number)
        .first::<PullRequest>(conn)
        .optional()?
        .is_some();

    if !known {
        info!("#{} not in the database yet, fetching it", pr_number);
        let fetched = Client::new(cfg)
            .and_then(|client| {
                let full = client.pull(pr_number)?;
                ingest::store_pull(conn, &client, full)
            });
        if let Err(why) = fetched {
            warn!("unable to fetch #{}: {:?}", pr_number, why);
            return Ok(None);
        }
    }

    load_target(conn, pr_number).map(Some)
}

pub fn load_target(conn: &SqliteConnection, pr_number: i32) -> RecResult<TargetPr> {
    let pr = pull_requests::table
        .find(pr_number)
        .first::<PullRequest>(conn)?;
    let files = pr_files::table
        .filter(pr_files::pr_id.eq(pr_number))
        .load::<PrFile>(conn)?;

    Ok(TargetPr {
        number: pr_number,
        author: pr.user_login.clone(),
        files: files.into_iter().map(|f| f.file_path).collect(),
        labels: pr.label_names().map(|l| l.to_lowercase()).collect(),
    })
}

/// Every review row, annotated with the file paths and labels of its PR.
pub fn load_history(conn: &SqliteConnection) -> RecResult<Vec<HistoryEntry>> {
    let prs = pull_requests::table.load::<PullRequest>(conn)?;
    let files = pr_files::table.load::<PrFile>(conn)?;
    let review_rows = reviews::table.load::<Review>(conn)?;

    let mut files_by_pr: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();
    for file in files {
        files_by_pr.entry(file.pr_id).or_default().insert(file.file_path);
    }

    let mut labels_by_pr: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();
    for pr in &prs {
        labels_by_pr.insert(
            pr.pr_id,
            pr.label_names().map(|l| l.to_lowercase()).collect(),
        );
    }

    Ok(review_rows
        .into_iter()
        .map(|review| HistoryEntry {
            files: files_by_pr.get(&review.pr_id).cloned().unwrap_or_default(),
            labels: labels_by_pr.get(&review.pr_id).cloned().unwrap_or_default(),
            pr_id: review.pr_id,
            reviewer: review.reviewer,
            review_date: review.review_date,
            state: review.state,
        })
        .collect())
}

pub fn load_feedback(conn: &SqliteConnection) -> RecResult<BTreeMap<String, f64>> {
    Ok(feedback::table
        .load::<FeedbackPoint>(conn)?
        .into_iter()
        .map(|f| (f.reviewer, f.fav_rev_points))
        .collect())
}

fn render(target: &TargetPr, ranked: &[Candidate]) -> String {
    if ranked.is_empty() {
        return render_empty(target.number);
    }

    let mut out = format!("Suggested reviewers for #{}:\n\n", target.number);
    out.push_str("| reviewer | score | prior activity |\n");
    out.push_str("|---|---|---|\n");
    for candidate in ranked {
        out.push_str(&format!(
            "| @{} | {:.2} | {} |\n",
            candidate.reviewer, candidate.score, candidate.reviews
        ));
    }
    out
}

fn render_empty(pr_number: i32) -> String {
    format!(
        "No reviewer recommendation for #{}: no historical overlap with its files or labels.",
        pr_number
    )
}
