use std::env;
use std::time::Duration;

use crate::filter::{FilterColumn, MatchMode, RowFilter};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_SCORES_PATH: &str = "/grading/live/guts/update/";
const DEFAULT_ROSTER_PATH: &str = "/grading/api/attendance/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Http,
    Demo,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: Source,
    pub base_url: String,
    pub scores_path: String,
    pub roster_path: String,
    pub scores_poll: Duration,
    pub toggle_refresh: Duration,
    pub filter: RowFilter,
    pub division_order: Vec<String>,
    pub session_cookie: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|val| val.trim().to_string())
                .filter(|val| !val.is_empty())
        };

        let source = match get("SCOREBOARD_SOURCE").map(|v| v.to_lowercase()).as_deref() {
            Some("demo") | Some("fake") => Source::Demo,
            _ => Source::Http,
        };
        let base_url = get("SCOREBOARD_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let scores_path = get("SCORES_PATH")
            .map(|p| normalize_path(&p))
            .unwrap_or_else(|| DEFAULT_SCORES_PATH.to_string());
        let roster_path = get("ROSTER_PATH")
            .map(|p| normalize_path(&p))
            .unwrap_or_else(|| DEFAULT_ROSTER_PATH.to_string());

        let scores_poll = Duration::from_secs(
            get("SCORES_POLL_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(25)
                .max(5),
        );
        let toggle_refresh = Duration::from_millis(
            get("TOGGLE_REFRESH_MS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(500)
                .clamp(50, 10_000),
        );

        let matcher = get("ROSTER_MATCH")
            .and_then(|val| MatchMode::parse(&val))
            .unwrap_or(MatchMode::Contains);
        let column = get("ROSTER_FILTER_COLUMN")
            .and_then(|val| FilterColumn::parse(&val))
            .unwrap_or(FilterColumn::Name);

        let division_order = get("SCOREBOARD_DIVISIONS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            source,
            base_url,
            scores_path,
            roster_path,
            scores_poll,
            toggle_refresh,
            filter: RowFilter { column, matcher },
            division_order,
            session_cookie: get("SESSION_COOKIE"),
        }
    }

    pub fn scores_url(&self) -> String {
        format!("{}{}", self.base_url, self.scores_path)
    }

    pub fn roster_url(&self) -> String {
        format!("{}{}", self.base_url, self.roster_path)
    }
}

fn normalize_path(raw: &str) -> String {
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{raw}")
    }
}
