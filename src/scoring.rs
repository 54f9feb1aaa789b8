//! Reviewer ranking. Pure: all inputs (history, feedback points, clock) are
//! passed in, so identical inputs always produce identical output.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use crate::config::RecommendConfig;
use crate::domain::prs::COMMIT_STATE;

/// The pull request reviewers are being suggested for.
#[derive(Clone, Debug)]
pub struct TargetPr {
    pub number: i32,
    pub author: String,
    pub files: BTreeSet<String>,
    /// Lowercased label names.
    pub labels: BTreeSet<String>,
}

/// One historical review (or commit-authorship) event, annotated with the
/// file paths and lowercased labels of the pull request it happened on.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub pr_id: i32,
    pub reviewer: String,
    pub review_date: Option<NaiveDateTime>,
    pub state: String,
    pub files: BTreeSet<String>,
    pub labels: BTreeSet<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub reviewer: String,
    pub score: f64,
    /// Number of history entries that contributed to the score.
    pub reviews: usize,
}

/// Rank reviewer candidates for `target`.
///
/// Each history entry sharing at least one file path or label with the target
/// contributes `state_weight * (file_weight * file_overlap + label_weight *
/// label_overlap)`, decayed by half every `half_life_days` of entry age.
/// Entries on the target itself and entries by the target's author never
/// contribute. Reviewers with no overlap at all are excluded outright, so
/// feedback points boost candidates but cannot conjure them. Ties break by
/// contributing-entry count, then by login.
pub fn rank_reviewers(
    target: &TargetPr,
    history: &[HistoryEntry],
    points: &BTreeMap<String, f64>,
    params: &RecommendConfig,
    now: NaiveDateTime,
) -> Vec<Candidate> {
    let half_life = params.half_life_days.max(f64::EPSILON);
    let mut base: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for entry in history {
        if entry.pr_id == target.number || entry.reviewer == target.author {
            continue;
        }

        let file_overlap = entry.files.intersection(&target.files).count();
        let label_overlap = entry.labels.intersection(&target.labels).count();
        if file_overlap == 0 && label_overlap == 0 {
            continue;
        }

        let age_days = match entry.review_date {
            Some(when) => (now - when).num_days().max(0) as f64,
            // undated rows (commit authorship) count as one half-life old
            None => half_life,
        };
        let decay = 0.5_f64.powf(age_days / half_life);
        let state_weight = if entry.state == COMMIT_STATE {
            params.commit_weight
        } else {
            1.0
        };

        let slot = base.entry(entry.reviewer.as_str()).or_insert((0.0, 0));
        slot.0 += state_weight
            * (params.file_weight * file_overlap as f64
                + params.label_weight * label_overlap as f64)
            * decay;
        slot.1 += 1;
    }

    let mut candidates: Vec<Candidate> = base
        .into_iter()
        .filter(|&(_, (score, _))| score > 0.0)
        .map(|(reviewer, (score, reviews))| Candidate {
            score: score + params.feedback_weight * points.get(reviewer).copied().unwrap_or(0.0),
            reviewer: reviewer.to_string(),
            reviews,
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.reviews.cmp(&a.reviews))
            .then_with(|| a.reviewer.cmp(&b.reviewer))
    });
    candidates.truncate(params.top_n);

    candidates
}
