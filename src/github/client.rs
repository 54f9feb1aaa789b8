use std::collections::BTreeMap;
use std::thread::sleep;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{RecError, RecResult};
use crate::github::models::{CommitFromJson, FileFromJson, PullFromJson, ReviewFromJson};

pub const BASE_URL: &str = "https://api.github.com";

/// Pause between paginated requests.
pub const DELAY: u64 = 300;

const PER_PAGE: u32 = 100;
const MAX_ATTEMPTS: u64 = 10;

type ParameterMap = BTreeMap<&'static str, String>;

pub struct Client {
    token: String,
    ua: String,
    repo: String,
    client: HttpClient,
}

impl Client {
    pub fn new(cfg: &Config) -> RecResult<Self> {
        if cfg.github.token.is_empty() {
            throw!(RecError::Misc(Some(
                "no github token configured (set GITHUB_TOKEN or [github] token)".to_string()
            )));
        }

        let client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Client {
            token: cfg.github.token.clone(),
            ua: cfg.github.user_agent.clone(),
            repo: format!("{}/{}", cfg.github.owner, cfg.github.repo),
            client,
        })
    }

    /// All PRs created inside the given range, newest first. Listing is
    /// sorted by creation date descending, so pagination stops at the first
    /// PR older than `start`.
    pub fn pulls_between(
        &self,
        state: &str,
        start: chrono::NaiveDateTime,
        end: chrono::NaiveDateTime,
    ) -> RecResult<Vec<PullFromJson>> {
        let url = format!("{}/repos/{}/pulls", BASE_URL, self.repo);
        let mut page = 1u32;
        let mut all = Vec::new();

        'pages: loop {
            let res = self.get(
                &url,
                Some(&btreemap! {
                    "state" => state.to_string(),
                    "sort" => "created".to_string(),
                    "direction" => "desc".to_string(),
                    "per_page" => PER_PAGE.to_string(),
                    "page" => page.to_string()
                }),
            )?;
            let batch: Vec<PullFromJson> = self.deserialize(res)?;
            if batch.is_empty() {
                break;
            }

            for pull in batch {
                let created = pull.created_at.naive_utc();
                if created > end {
                    continue;
                }
                if created < start {
                    break 'pages;
                }
                all.push(pull);
            }

            page += 1;
            sleep(Duration::from_millis(DELAY));
        }

        Ok(all)
    }

    /// The full single-PR object (the list endpoint omits merge status).
    pub fn pull(&self, number: i32) -> RecResult<PullFromJson> {
        let url = format!("{}/repos/{}/pulls/{}", BASE_URL, self.repo, number);
        let res = self.get(&url, None)?;
        self.deserialize(res)
    }

    pub fn pull_files(&self, number: i32) -> RecResult<Vec<FileFromJson>> {
        let url = format!("{}/repos/{}/pulls/{}/files", BASE_URL, self.repo, number);
        self.get_models(&url)
    }

    pub fn pull_reviews(&self, number: i32) -> RecResult<Vec<ReviewFromJson>> {
        let url = format!("{}/repos/{}/pulls/{}/reviews", BASE_URL, self.repo, number);
        self.get_models(&url)
    }

    pub fn pull_commits(&self, number: i32) -> RecResult<Vec<CommitFromJson>> {
        let url = format!("{}/repos/{}/pulls/{}/commits", BASE_URL, self.repo, number);
        self.get_models(&url)
    }

    pub fn open_pulls(&self) -> RecResult<Vec<PullFromJson>> {
        let url = format!("{}/repos/{}/pulls", BASE_URL, self.repo);
        let res = self.get(
            &url,
            Some(&btreemap! {
                "state" => "open".to_string(),
                "per_page" => PER_PAGE.to_string()
            }),
        )?;
        self.follow_pages(res)
    }

    pub fn add_label(&self, number: i32, label: &str) -> RecResult<()> {
        let url = format!("{}/repos/{}/issues/{}/labels", BASE_URL, self.repo, number);
        let payload = serde_json::to_string(&[label])?;

        let res = self.post(&url, payload)?;
        if res.status() != StatusCode::OK {
            throw!(RecError::Misc(Some(res.text()?)));
        }

        Ok(())
    }

    pub fn new_comment(&self, number: i32, text: &str) -> RecResult<()> {
        let url = format!("{}/repos/{}/issues/{}/comments", BASE_URL, self.repo, number);
        let payload = serde_json::to_string(&btreemap!("body" => text))?;

        let res = self.post(&url, payload)?;
        if res.status() != StatusCode::CREATED {
            throw!(RecError::Misc(Some(res.text()?)));
        }

        Ok(())
    }

    fn get_models<M: DeserializeOwned>(&self, start_url: &str) -> RecResult<Vec<M>> {
        let res = self.get(
            start_url,
            Some(&btreemap! { "per_page" => PER_PAGE.to_string() }),
        )?;
        self.follow_pages(res)
    }

    fn follow_pages<M: DeserializeOwned>(&self, first: Response) -> RecResult<Vec<M>> {
        let mut next = next_page(first.headers());
        let mut models: Vec<M> = self.deserialize(first)?;

        while let Some(url) = next {
            sleep(Duration::from_millis(DELAY));
            let res = self.get(&url, None)?;
            next = next_page(res.headers());
            models.extend(self.deserialize::<Vec<M>>(res)?);
        }

        Ok(models)
    }

    fn post(&self, url: &str, payload: String) -> RecResult<Response> {
        Ok(self
            .set_headers(self.client.post(url).body(payload))
            .send()?)
    }

    fn get(&self, url: &str, params: Option<&ParameterMap>) -> RecResult<Response> {
        let qp_string = match params {
            Some(p) => {
                let mut qp = String::from("?");
                for (k, v) in p {
                    if qp.len() > 1 {
                        qp.push('&');
                    }
                    qp.push_str(&format!("{}={}", k, v));
                }
                qp
            }
            None => "".to_string(),
        };

        let url = format!("{}{}", url, qp_string);

        debug!("GETing: {}", &url);

        // bounded retry with linear backoff on upstream gateway hiccups
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                sleep(Duration::from_secs(attempt));
            }

            let res = self.set_headers(self.client.get(&url)).send()?;
            let status = res.status();

            match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => {
                    warn!("transient {} from {}, retrying", status, url);
                }
                StatusCode::FORBIDDEN if rate_limited(res.headers()) => {
                    throw!(RecError::RateLimit(rate_limit_reset(res.headers())));
                }
                _ if !status.is_success() => {
                    throw!(RecError::Misc(Some(format!("{} from {}", status, url))));
                }
                _ => return Ok(res),
            }
        }

        throw!(RecError::Misc(Some(format!(
            "no successful response from {} after {} attempts",
            url, MAX_ATTEMPTS
        ))))
    }

    fn deserialize<M: DeserializeOwned>(&self, res: Response) -> RecResult<M> {
        let buf = res.text()?;

        match serde_json::from_str(&buf) {
            Ok(m) => Ok(m),
            Err(why) => {
                error!("Unable to parse from JSON ({:?}): {}", why, buf);
                throw!(why)
            }
        }
    }

    fn set_headers(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("token {}", &self.token))
            .header(USER_AGENT, self.ua.clone())
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header("Time-Zone", "UTC")
    }
}

fn next_page(h: &HeaderMap) -> Option<String> {
    let lh = h.get(LINK)?.to_str().ok()?;

    for link in lh.split(',').map(|s| s.trim()) {
        let tokens = link.split(';').map(|s| s.trim()).collect::<Vec<_>>();

        if tokens.len() != 2 {
            continue;
        }

        if tokens[1] == "rel=\"next\"" {
            let url = tokens[0]
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string();
            return Some(url);
        }
    }

    None
}

fn rate_limited(h: &HeaderMap) -> bool {
    h.get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok())
        == Some(0)
}

fn rate_limit_reset(h: &HeaderMap) -> DateTime<Utc> {
    h.get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}
