use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::roster::RosterRow;
use crate::scoreboard::{DivisionScores, ScoreSnapshot};
use crate::state::{Delta, ProviderCommand};

const DEMO_LATENCY_MS: u64 = 150;

/// In-memory stand-in for the scoring server.
#[derive(Debug, Clone)]
pub struct DemoData {
    divisions: Vec<DivisionScores>,
    roster: Vec<RosterRow>,
}

impl Default for DemoData {
    fn default() -> Self {
        Self::seeded()
    }
}

impl DemoData {
    pub fn seeded() -> Self {
        let division = |name: &str, teams: &[&str]| DivisionScores {
            division: name.to_string(),
            teams: teams.iter().map(|t| (t.to_string(), 0.0)).collect(),
        };
        let divisions = vec![
            division(
                "Ramanujan",
                &[
                    "Euler's Totients",
                    "Prime Suspects",
                    "The Integers",
                    "Null Set",
                    "Pi Rates",
                    "Sine Language",
                    "Mean Girls",
                ],
            ),
            division(
                "Pascal",
                &[
                    "Triangle Club",
                    "Binomial Bunch",
                    "Fibonacci Fans",
                    "Golden Ratios",
                    "Square Roots",
                    "Odd Ones Out",
                ],
            ),
        ];

        let roster = [
            ("Ada Lovelace", "Northside Middle", true),
            ("Alan Turing", "Lakeview Academy", false),
            ("Emmy Noether", "Northside Middle", false),
            ("John Nash", "Riverside School", true),
            ("Joan Clarke", "Lakeview Academy", false),
            ("Katherine Johnson", "Riverside School", false),
            ("Mark Kac", "Hilltop Prep", true),
            ("Maryam Mirzakhani", "Hilltop Prep", false),
            ("Paul Erdos", "Northside Middle", false),
            ("Sophie Germain", "Riverside School", true),
            ("Srinivasa Ramanujan", "Lakeview Academy", false),
            ("Terence Tao", "Hilltop Prep", false),
        ]
        .into_iter()
        .enumerate()
        .map(|(idx, (name, school, attending))| RosterRow {
            id: idx as u32 + 1,
            name: name.to_string(),
            school: school.to_string(),
            attending,
        })
        .collect();

        Self { divisions, roster }
    }

    /// Guts scores only ever go up; bump a few teams and return the new totals.
    pub fn advance_scores(&mut self, rng: &mut impl Rng) -> ScoreSnapshot {
        for div in &mut self.divisions {
            for (_, score) in &mut div.teams {
                if rng.gen_bool(0.4) {
                    let points = f64::from(rng.gen_range(1..=4u32)) * 3.0;
                    *score += points + f64::from(rng.gen_range(0..1000u32)) / 1000.0;
                }
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            divisions: self.divisions.clone(),
        }
    }

    pub fn rows(&self) -> Vec<RosterRow> {
        self.roster.clone()
    }

    /// Returns false when no row has this id, the same as the server ignoring it.
    pub fn set_attendance(&mut self, id: u32, attending: bool) -> bool {
        match self.roster.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.attending = attending;
                true
            }
            None => false,
        }
    }
}

pub fn spawn_fake_provider(
    toggle_refresh: Duration,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) {
    thread::spawn(move || {
        let data = Arc::new(Mutex::new(DemoData::seeded()));
        let _ = tx.send(Delta::Log("[INFO] Demo feed active".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let tx = tx.clone();
            let data = Arc::clone(&data);
            match cmd {
                ProviderCommand::FetchScores => {
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(DEMO_LATENCY_MS));
                        let snapshot = {
                            let mut rng = rand::thread_rng();
                            let mut data = data.lock().expect("demo data lock poisoned");
                            data.advance_scores(&mut rng)
                        };
                        let _ = tx.send(Delta::SetScores(snapshot));
                    });
                }
                ProviderCommand::FetchRoster => {
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(DEMO_LATENCY_MS));
                        let rows = data.lock().expect("demo data lock poisoned").rows();
                        let _ = tx.send(Delta::SetRoster(rows));
                    });
                }
                ProviderCommand::SetAttendance { id, attending } => {
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(DEMO_LATENCY_MS));
                        let found = data
                            .lock()
                            .expect("demo data lock poisoned")
                            .set_attendance(id, attending);
                        if !found {
                            let _ = tx.send(Delta::Log(format!("[WARN] Demo roster has no #{id}")));
                        }
                        thread::sleep(toggle_refresh);
                        let rows = data.lock().expect("demo data lock poisoned").rows();
                        let _ = tx.send(Delta::SetRoster(rows));
                    });
                }
            }
        }
    });
}
