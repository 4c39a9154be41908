use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{COOKIE, USER_AGENT};

use crate::config::Config;

const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Attaches the headers every API request carries.
pub fn with_session(req: RequestBuilder, config: &Config) -> RequestBuilder {
    let req = req.header(USER_AGENT, concat!("scoreboard_terminal/", env!("CARGO_PKG_VERSION")));
    match config.session_cookie.as_deref() {
        Some(cookie) => req.header(COOKIE, cookie),
        None => req,
    }
}
