pub mod api_fetch;
pub mod config;
pub mod error;
pub mod fake_feed;
pub mod feed;
pub mod filter;
pub mod http_client;
pub mod roster;
pub mod scoreboard;
pub mod state;
