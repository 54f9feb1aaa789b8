use std::env;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::RecResult;

/// Runtime configuration, deserialized from a TOML file and passed explicitly
/// to every subcommand.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub github: GithubConfig,
    pub filters: FilterConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GithubConfig {
    /// Access token; the GITHUB_TOKEN environment variable takes precedence
    /// so tokens can stay out of checked-in config files.
    #[serde(default)]
    pub token: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilterConfig {
    /// Earliest PR creation date fetched, `YYYY-MM-DD` or RFC 3339.
    pub start_date: String,
    /// Latest PR creation date fetched.
    pub end_date: String,
    #[serde(default)]
    pub only_closed_prs: bool,
    #[serde(default = "default_true")]
    pub only_merged_prs: bool,
    /// When non-empty, only PRs carrying at least one of these labels are
    /// stored (case-insensitive).
    #[serde(default)]
    pub required_labels: Vec<String>,
}

impl FilterConfig {
    pub fn start(&self) -> RecResult<NaiveDateTime> {
        parse_date(&self.start_date)
    }

    pub fn end(&self) -> RecResult<NaiveDateTime> {
        parse_date(&self.end_date)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub file: String,
}

/// Scoring knobs. Every field has a sane default so the whole section may be
/// omitted from the config file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Number of candidates returned.
    pub top_n: usize,
    /// Review weight halves every this many days.
    pub half_life_days: f64,
    /// Weight of each shared changed-file path.
    pub file_weight: f64,
    /// Weight of each shared label.
    pub label_weight: f64,
    /// Multiplier applied to stored favorite-reviewer points.
    pub feedback_weight: f64,
    /// Discount for commit-authorship rows relative to real reviews.
    pub commit_weight: f64,
    /// Label applied by the triage subcommand.
    pub triage_label: String,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        RecommendConfig {
            top_n: 3,
            half_life_days: 60.0,
            file_weight: 2.0,
            label_weight: 0.5,
            feedback_weight: 1.0,
            commit_weight: 0.5,
            triage_label: "needs-review".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> RecResult<Config> {
        let raw = fs::read_to_string(path)?;
        let mut cfg = Config::from_str(&raw)?;

        if let Ok(token) = env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                cfg.github.token = token;
            }
        }

        Ok(cfg)
    }

    fn from_str(input: &str) -> RecResult<Config> {
        Ok(toml::from_str(input)?)
    }
}

/// Accepts a bare date or a full timestamp; bare dates mean midnight UTC.
fn parse_date(s: &str) -> RecResult<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?.and_hms(0, 0, 0))
}

fn default_user_agent() -> String {
    "recbot".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
[github]
owner = "octocat"
repo = "hello-world"

[filters]
start_date = "2025-01-01"
end_date = "2025-06-30"

[database]
file = "recbot.sqlite"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = Config::from_str(MINIMAL).unwrap();

        assert_eq!(cfg.github.owner, "octocat");
        assert_eq!(cfg.github.repo, "hello-world");
        assert_eq!(cfg.github.user_agent, "recbot");
        assert!(cfg.github.token.is_empty());

        assert!(!cfg.filters.only_closed_prs);
        assert!(cfg.filters.only_merged_prs);
        assert!(cfg.filters.required_labels.is_empty());

        assert_eq!(cfg.recommend.top_n, 3);
        assert_eq!(cfg.recommend.half_life_days, 60.0);
        assert_eq!(cfg.recommend.triage_label, "needs-review");
    }

    #[test]
    fn full_config_parses() {
        let cfg = Config::from_str(
            r#"
[github]
token = "ghp_deadbeef"
owner = "octocat"
repo = "hello-world"
user_agent = "octobot"

[filters]
start_date = "2025-01-01"
end_date = "2025-06-30T12:30:00"
only_closed_prs = true
only_merged_prs = false
required_labels = ["bug", "T-compiler"]

[database]
file = "/tmp/recbot.sqlite"

[recommend]
top_n = 5
half_life_days = 30.0
file_weight = 3.0
label_weight = 1.0
feedback_weight = 2.0
commit_weight = 0.25
triage_label = "untriaged"
"#,
        )
        .unwrap();

        assert_eq!(cfg.github.token, "ghp_deadbeef");
        assert_eq!(cfg.github.user_agent, "octobot");
        assert!(cfg.filters.only_closed_prs);
        assert!(!cfg.filters.only_merged_prs);
        assert_eq!(cfg.filters.required_labels, vec!["bug", "T-compiler"]);
        assert_eq!(cfg.recommend.top_n, 5);
        assert_eq!(cfg.recommend.commit_weight, 0.25);
        assert_eq!(cfg.recommend.triage_label, "untriaged");
    }

    #[test]
    fn date_filters_parse() {
        let cfg = Config::from_str(MINIMAL).unwrap();
        let start = cfg.filters.start().unwrap();
        let end = cfg.filters.end().unwrap();

        assert_eq!(start, NaiveDate::from_ymd(2025, 1, 1).and_hms(0, 0, 0));
        assert!(start < end);

        assert_eq!(
            parse_date("2025-06-30T12:30:00").unwrap(),
            NaiveDate::from_ymd(2025, 6, 30).and_hms(12, 30, 0)
        );
        assert!(parse_date("not a date").is_err());
    }
}
