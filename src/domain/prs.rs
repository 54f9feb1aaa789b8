use chrono::NaiveDateTime;

use super::schema::*;

/// Synthetic review state recording commit authorship on a PR.
pub const COMMIT_STATE: &str = "COMMIT";

#[derive(Clone, Debug, Eq, Insertable, Ord, PartialEq, PartialOrd, Queryable, Serialize)]
#[table_name = "pull_requests"]
pub struct PullRequest {
    pub pr_id: i32,
    pub title: String,
    pub user_login: String,
    /// Comma-joined label names, possibly empty.
    pub labels: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl PullRequest {
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Queryable, Serialize)]
pub struct PrFile {
    /// Surrogate key, meaningless beyond satisfying the schema.
    pub id: i32,
    pub pr_id: i32,
    pub file_path: String,
}

#[derive(Clone, Debug, Eq, Insertable, PartialEq)]
#[table_name = "pr_files"]
pub struct NewPrFile {
    pub pr_id: i32,
    pub file_path: String,
}

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Queryable, Serialize)]
pub struct Review {
    pub id: i32,
    pub pr_id: i32,
    pub reviewer: String,
    /// Absent for COMMIT rows.
    pub review_date: Option<NaiveDateTime>,
    pub state: String,
}

#[derive(Clone, Debug, Eq, Insertable, PartialEq)]
#[table_name = "reviews"]
pub struct NewReview {
    pub pr_id: i32,
    pub reviewer: String,
    pub review_date: Option<NaiveDateTime>,
    pub state: String,
}

#[derive(Clone, Debug, Insertable, PartialEq, Queryable, Serialize)]
#[table_name = "feedback"]
pub struct FeedbackPoint {
    pub reviewer: String,
    pub fav_rev_points: f64,
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn label_names_handles_empty_and_padding() {
        let mut pr = PullRequest {
            pr_id: 1,
            title: "t".to_string(),
            user_login: "u".to_string(),
            labels: String::new(),
            created_at: NaiveDate::from_ymd(2025, 1, 1).and_hms(0, 0, 0),
            updated_at: NaiveDate::from_ymd(2025, 1, 1).and_hms(0, 0, 0),
        };
        assert_eq!(pr.label_names().count(), 0);

        pr.labels = "bug, T-compiler ,".to_string();
        assert_eq!(pr.label_names().collect::<Vec<_>>(), vec!["bug", "T-compiler"]);
    }
}
