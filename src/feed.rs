use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::api_fetch;
use crate::config::Config;
use crate::http_client::http_client;
use crate::state::{Delta, ProviderCommand};

/// Serves provider commands against the HTTP API. Every request runs on its
/// own worker thread; nothing orders the replies, so the last one to land wins.
pub fn spawn_provider(config: Config, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    let config = Arc::new(config);
    thread::spawn(move || {
        let client = match http_client() {
            Ok(client) => client,
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] HTTP client unavailable: {err:#}")));
                return;
            }
        };

        while let Ok(cmd) = cmd_rx.recv() {
            let tx = tx.clone();
            let config = Arc::clone(&config);
            match cmd {
                ProviderCommand::FetchScores => {
                    thread::spawn(move || match api_fetch::fetch_scores(client, &config) {
                        Ok(snapshot) => {
                            let _ = tx.send(Delta::SetScores(snapshot));
                        }
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!("[WARN] Scores fetch error: {err}")));
                        }
                    });
                }
                ProviderCommand::FetchRoster => {
                    thread::spawn(move || send_roster(client, &config, &tx));
                }
                ProviderCommand::SetAttendance { id, attending } => {
                    thread::spawn(move || {
                        if let Err(err) = api_fetch::post_attendance(client, &config, id, attending)
                        {
                            let _ = tx.send(Delta::ToggleFailed {
                                id,
                                error: err.to_string(),
                            });
                            return;
                        }
                        let _ = tx.send(Delta::Log(format!(
                            "[INFO] #{id} marked {}",
                            if attending { "present" } else { "absent" }
                        )));
                        thread::sleep(config.toggle_refresh);
                        send_roster(client, &config, &tx);
                    });
                }
            }
        }
    });
}

fn send_roster(client: &reqwest::blocking::Client, config: &Config, tx: &Sender<Delta>) {
    match api_fetch::fetch_roster(client, config) {
        Ok(rows) => {
            let _ = tx.send(Delta::SetRoster(rows));
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Roster fetch error: {err}")));
        }
    }
}
