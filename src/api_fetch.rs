use reqwest::blocking::{Client, Response};

use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::http_client::with_session;
use crate::roster::{RosterRow, parse_roster_json};
use crate::scoreboard::{ScoreSnapshot, parse_scores_json};

pub fn fetch_scores(client: &Client, config: &Config) -> FetchResult<ScoreSnapshot> {
    let resp = with_session(client.get(config.scores_url()), config).send()?;
    let body = read_body(resp)?;
    parse_scores_json(&body)
}

pub fn fetch_roster(client: &Client, config: &Config) -> FetchResult<Vec<RosterRow>> {
    let resp = with_session(client.get(config.roster_url()), config).send()?;
    let body = read_body(resp)?;
    parse_roster_json(&body)
}

/// Writes one row's attendance flag. The server reads form fields `id` and
/// `attending` (`"true"` / `"false"`).
pub fn post_attendance(
    client: &Client,
    config: &Config,
    id: u32,
    attending: bool,
) -> FetchResult<()> {
    let id = id.to_string();
    let attending = if attending { "true" } else { "false" };
    let form = [("id", id.as_str()), ("attending", attending)];
    let resp = with_session(client.post(config.roster_url()), config)
        .form(&form)
        .send()?;
    read_body(resp).map(|_| ())
}

fn read_body(resp: Response) -> FetchResult<String> {
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            body: truncate(&body, 120),
        });
    }
    Ok(body)
}

fn truncate(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
