use std::collections::{HashSet, VecDeque};

use crate::config::Config;
use crate::filter::{self, RowFilter};
use crate::roster::{RosterRow, partition_rows};
use crate::scoreboard::{DivisionBoard, ScoreSnapshot, rank_snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Scoreboard,
    Roster,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub frozen: bool,
    pub boards: Vec<DivisionBoard>,
    pub division_order: Vec<String>,
    pub scores_updated: Option<String>,
    pub roster: Vec<RosterRow>,
    pub roster_updated: Option<String>,
    pub pending_toggles: HashSet<u32>,
    pub filter: RowFilter,
    pub search: String,
    pub search_active: bool,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Scoreboard,
            frozen: false,
            boards: Vec::new(),
            division_order: Vec::new(),
            scores_updated: None,
            roster: Vec::with_capacity(128),
            roster_updated: None,
            pending_toggles: HashSet::new(),
            filter: RowFilter::default(),
            search: String::new(),
            search_active: false,
            selected: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new();
        state.filter = config.filter;
        state.division_order = config.division_order.clone();
        state
    }

    /// Flips the freeze flag and returns the new value.
    pub fn toggle_freeze(&mut self) -> bool {
        self.frozen = !self.frozen;
        if self.frozen {
            self.push_log("[INFO] Scoreboard frozen");
        } else {
            self.push_log("[INFO] Scoreboard live");
        }
        self.frozen
    }

    /// Rows passing the search box, split into the (present, absent) tables.
    pub fn visible_tables(&self) -> (Vec<&RosterRow>, Vec<&RosterRow>) {
        partition_rows(filter::visible_rows(&self.roster, &self.filter, &self.search))
    }

    /// Visible rows in display order: the present table, then the absent one.
    pub fn visible_roster(&self) -> Vec<&RosterRow> {
        let (mut rows, absent) = self.visible_tables();
        rows.extend(absent);
        rows
    }

    pub fn selected_row(&self) -> Option<&RosterRow> {
        self.visible_roster().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.visible_roster().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let total = self.visible_roster().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.push(ch);
        self.selected = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.selected = 0;
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.selected = 0;
    }

    pub fn cycle_match_mode(&mut self) {
        self.filter.matcher = self.filter.matcher.cycle();
        self.clamp_selection();
    }

    pub fn cycle_filter_column(&mut self) {
        self.filter.column = self.filter.column.cycle();
        self.clamp_selection();
    }

    pub fn mark_pending(&mut self, id: u32) {
        self.pending_toggles.insert(id);
    }

    pub fn is_pending(&self, id: u32) -> bool {
        self.pending_toggles.contains(&id)
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetScores(ScoreSnapshot),
    SetRoster(Vec<RosterRow>),
    ToggleFailed { id: u32, error: String },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchScores,
    FetchRoster,
    SetAttendance { id: u32, attending: bool },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetScores(snapshot) => {
            // A response that was already in flight when the board froze is dropped.
            if state.frozen {
                state.push_log("[INFO] Scoreboard frozen; dropped late update");
                return;
            }
            state.boards = rank_snapshot(&snapshot, &state.division_order);
            state.scores_updated = Some(now_stamp());
        }
        Delta::SetRoster(rows) => {
            let selected_id = state.selected_row().map(|row| row.id);
            state.roster = rows;
            state.pending_toggles.clear();
            state.roster_updated = Some(now_stamp());
            let position = selected_id
                .and_then(|id| state.visible_roster().iter().position(|row| row.id == id));
            if let Some(idx) = position {
                state.selected = idx;
            }
            state.clamp_selection();
        }
        Delta::ToggleFailed { id, error } => {
            state.pending_toggles.remove(&id);
            state.push_log(format!("[WARN] Attendance update for #{id} failed: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
