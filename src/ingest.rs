use std::collections::BTreeSet;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::config::Config;
use crate::db;
use crate::domain::prs::{NewPrFile, NewReview, PullRequest, COMMIT_STATE};
use crate::domain::schema::{pr_files, pull_requests, reviews};
use crate::error::{RecError, RecResult};
use crate::github::{Client, PullFromJson};

/// Fetch all PRs matching the configured date/label filters and store their
/// metadata, changed files, reviews, and commit authors.
pub fn run(cfg: &Config) -> RecResult<()> {
    let conn = db::connect(cfg)?;
    let client = Client::new(cfg)?;

    let start = cfg.filters.start()?;
    let end = cfg.filters.end()?;
    let state = if cfg.filters.only_closed_prs {
        "closed"
    } else {
        "all"
    };

    info!(
        "fetching {} PRs created {} to {} (required labels: {:?})",
        state, start, end, cfg.filters.required_labels
    );

    let mut candidates = client.pulls_between(state, start, end)?;
    if !cfg.filters.required_labels.is_empty() {
        let wanted: BTreeSet<String> = cfg
            .filters
            .required_labels
            .iter()
            .map(|l| l.to_lowercase())
            .collect();
        candidates.retain(|pr| pr.has_any_label(&wanted));
    }

    info!("{} PRs match the date/label filters", candidates.len());

    let mut stored = 0;
    for pull in candidates {
        let number = pull.number;

        // the list endpoint omits merge status
        let full = ok_or_continue!(client.pull(number),
                                   why => error!("skipping #{}: {:?}", number, why));
        if cfg.filters.only_merged_prs && !full.merged {
            debug!("skipping #{}: not merged", number);
            continue;
        }

        ok_or_continue!(store_pull(&conn, &client, full),
                        why => error!("skipping #{}: {:?}", number, why));
        stored += 1;
    }

    info!("stored {} pull requests", stored);
    Ok(())
}

/// Upsert one PR and replace its file and review rows wholesale, so that
/// re-running the fetch never duplicates rows.
pub fn store_pull(conn: &SqliteConnection, client: &Client, pull: PullFromJson) -> RecResult<()> {
    let number = pull.number;

    let files = client.pull_files(number)?;
    let pr_reviews = client.pull_reviews(number)?;
    let commits = client.pull_commits(number)?;

    let record: PullRequest = pull.into();

    let mut review_rows = Vec::new();
    for commit in commits {
        if let Some(author) = commit.author {
            review_rows.push(NewReview {
                pr_id: number,
                reviewer: author.login,
                review_date: None,
                state: COMMIT_STATE.to_string(),
            });
        }
    }
    for review in pr_reviews {
        if !review.is_final() {
            continue;
        }
        review_rows.push(NewReview {
            pr_id: number,
            reviewer: review
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| "unknown".to_string()),
            review_date: review.submitted_at.map(|t| t.naive_utc()),
            state: review.state.to_uppercase(),
        });
    }

    let n_files = files.len();
    let n_activity = review_rows.len();

    conn.transaction::<_, RecError, _>(|| {
        diesel::replace_into(pull_requests::table)
            .values(&record)
            .execute(conn)?;

        diesel::delete(pr_files::table.filter(pr_files::pr_id.eq(number))).execute(conn)?;
        diesel::delete(reviews::table.filter(reviews::pr_id.eq(number))).execute(conn)?;

        for file in &files {
            diesel::insert_into(pr_files::table)
                .values(&NewPrFile {
                    pr_id: number,
                    file_path: file.filename.clone(),
                })
                .execute(conn)?;
        }
        for row in &review_rows {
            diesel::insert_into(reviews::table).values(row).execute(conn)?;
        }

        Ok(())
    })?;

    debug!(
        "stored #{} ({} files, {} activity rows)",
        number, n_files, n_activity
    );
    Ok(())
}
