use std::io;

use chrono::{DateTime, Utc};

pub type RecResult<T> = std::result::Result<T, RecError>;

#[derive(Debug)]
pub enum RecError {
    Http(reqwest::Error),
    Io(io::Error),
    Serde(serde_json::Error),
    Toml(toml::de::Error),
    Csv(csv::Error),
    Connection(diesel::ConnectionError),
    Diesel(diesel::result::Error),
    DateParse(chrono::ParseError),
    /// The API rate limit is exhausted until the contained reset time.
    RateLimit(DateTime<Utc>),
    Misc(Option<String>),
}

impl From<reqwest::Error> for RecError {
    fn from(e: reqwest::Error) -> Self {
        RecError::Http(e)
    }
}

impl From<io::Error> for RecError {
    fn from(e: io::Error) -> Self {
        RecError::Io(e)
    }
}

impl From<serde_json::Error> for RecError {
    fn from(e: serde_json::Error) -> Self {
        RecError::Serde(e)
    }
}

impl From<toml::de::Error> for RecError {
    fn from(e: toml::de::Error) -> Self {
        RecError::Toml(e)
    }
}

impl From<csv::Error> for RecError {
    fn from(e: csv::Error) -> Self {
        RecError::Csv(e)
    }
}

impl From<diesel::ConnectionError> for RecError {
    fn from(e: diesel::ConnectionError) -> Self {
        RecError::Connection(e)
    }
}

impl From<diesel::result::Error> for RecError {
    fn from(e: diesel::result::Error) -> Self {
        RecError::Diesel(e)
    }
}

impl From<chrono::ParseError> for RecError {
    fn from(e: chrono::ParseError) -> Self {
        RecError::DateParse(e)
    }
}
