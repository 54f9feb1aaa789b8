use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::domain::prs::PullRequest;

#[derive(Clone, Debug, Deserialize)]
pub struct UserFromJson {
    pub login: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LabelFromJson {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullFromJson {
    pub number: i32,
    pub title: Option<String>,
    pub user: Option<UserFromJson>,
    #[serde(default)]
    pub labels: Vec<LabelFromJson>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only present on the single-PR endpoint; the list endpoint omits it.
    #[serde(default)]
    pub merged: bool,
}

impl PullFromJson {
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }

    /// Label filter check, case-insensitive, vacuously false on no overlap.
    pub fn has_any_label(&self, wanted: &BTreeSet<String>) -> bool {
        self.label_names().any(|l| wanted.contains(&l.to_lowercase()))
    }
}

impl Into<PullRequest> for PullFromJson {
    fn into(self) -> PullRequest {
        PullRequest {
            pr_id: self.number,
            title: self
                .title
                .unwrap_or_default()
                .replace(0x00 as char, ""),
            user_login: self
                .user
                .map(|u| u.login)
                .unwrap_or_else(|| "unknown".to_string()),
            labels: self.labels.iter().map(|l| l.name.as_str()).join(","),
            created_at: self.created_at.naive_utc(),
            updated_at: self.updated_at.naive_utc(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FileFromJson {
    pub filename: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewFromJson {
    pub user: Option<UserFromJson>,
    pub state: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReviewFromJson {
    /// Only submitted reviews count; PENDING ones are skipped.
    pub fn is_final(&self) -> bool {
        matches!(
            self.state.to_uppercase().as_str(),
            "APPROVED" | "COMMENTED" | "CHANGES_REQUESTED" | "DISMISSED"
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommitFromJson {
    pub author: Option<UserFromJson>,
}

#[cfg(test)]
mod test {
    use super::*;

    const PULL_JSON: &str = r#"{
        "number": 42,
        "title": "Teach the parser about trailing commas",
        "user": { "login": "ferris" },
        "labels": [ { "name": "bug" }, { "name": "T-parser" } ],
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-02T11:30:00Z",
        "merged": true
    }"#;

    #[test]
    fn pull_converts_to_record() {
        let pull: PullFromJson = serde_json::from_str(PULL_JSON).unwrap();
        assert!(pull.merged);

        let record: PullRequest = pull.into();
        assert_eq!(record.pr_id, 42);
        assert_eq!(record.user_login, "ferris");
        assert_eq!(record.labels, "bug,T-parser");
        assert_eq!(record.label_names().collect::<Vec<_>>(), vec!["bug", "T-parser"]);
    }

    #[test]
    fn missing_user_and_merged_default() {
        let pull: PullFromJson = serde_json::from_str(
            r#"{
                "number": 7,
                "title": null,
                "user": null,
                "created_at": "2025-03-01T10:00:00Z",
                "updated_at": "2025-03-01T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert!(!pull.merged);

        let record: PullRequest = pull.into();
        assert_eq!(record.user_login, "unknown");
        assert_eq!(record.labels, "");
    }

    #[test]
    fn label_filter_is_case_insensitive() {
        let pull: PullFromJson = serde_json::from_str(PULL_JSON).unwrap();
        let wanted = vec!["t-parser".to_string()].into_iter().collect();
        assert!(pull.has_any_label(&wanted));

        let unwanted = vec!["t-libs".to_string()].into_iter().collect();
        assert!(!pull.has_any_label(&unwanted));
    }

    #[test]
    fn pending_reviews_are_not_final() {
        let review: ReviewFromJson = serde_json::from_str(
            r#"{ "user": { "login": "ferris" }, "state": "PENDING", "submitted_at": null }"#,
        )
        .unwrap();
        assert!(!review.is_final());

        let review: ReviewFromJson = serde_json::from_str(
            r#"{ "user": { "login": "ferris" }, "state": "approved",
                 "submitted_at": "2025-03-02T09:00:00Z" }"#,
        )
        .unwrap();
        assert!(review.is_final());
    }
}
