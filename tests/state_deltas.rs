use std::sync::mpsc;
use std::time::{Duration, Instant};

use scoreboard_terminal::fake_feed::{DemoData, spawn_fake_provider};
use scoreboard_terminal::filter::{FilterColumn, MatchMode};
use scoreboard_terminal::roster::RosterRow;
use scoreboard_terminal::scoreboard::parse_scores_json;
use scoreboard_terminal::state::{AppState, Delta, ProviderCommand, apply_delta};

fn row(id: u32, name: &str, attending: bool) -> RosterRow {
    RosterRow {
        id,
        name: name.to_string(),
        school: "Riverside School".to_string(),
        attending,
    }
}

fn ids(rows: &[&RosterRow]) -> Vec<u32> {
    rows.iter().map(|r| r.id).collect()
}

#[test]
fn scores_replace_boards() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetScores(parse_scores_json(r#"{"A": {"x": 3, "y": 5}, "B": {"z": 1}}"#).unwrap()),
    );
    assert_eq!(state.boards.len(), 2);
    assert_eq!(state.boards[0].entries[0].team, "y");
    assert!(state.scores_updated.is_some());

    apply_delta(
        &mut state,
        Delta::SetScores(parse_scores_json(r#"{"B": {"z": 2}}"#).unwrap()),
    );
    assert_eq!(state.boards.len(), 1);
    assert_eq!(state.boards[0].name, "B");
}

#[test]
fn frozen_board_ignores_late_scores() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetScores(parse_scores_json(r#"{"A": {"x": 3}}"#).unwrap()),
    );
    let before = state.boards.clone();

    state.toggle_freeze();
    apply_delta(
        &mut state,
        Delta::SetScores(parse_scores_json(r#"{"A": {"x": 9, "y": 4}}"#).unwrap()),
    );
    assert_eq!(state.boards, before);
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some("[INFO] Scoreboard frozen; dropped late update")
    );

    assert!(!state.toggle_freeze());
    apply_delta(
        &mut state,
        Delta::SetScores(parse_scores_json(r#"{"A": {"x": 9, "y": 4}}"#).unwrap()),
    );
    assert_eq!(state.boards[0].entries.len(), 2);
}

#[test]
fn roster_snapshot_replaces_rows_and_clears_pending() {
    let mut state = AppState::new();
    state.roster = vec![row(1, "Old", true)];
    state.mark_pending(1);

    apply_delta(
        &mut state,
        Delta::SetRoster(vec![row(2, "Ada", true), row(3, "Joan", false)]),
    );

    assert_eq!(state.roster.len(), 2);
    assert!(state.pending_toggles.is_empty());
    assert!(state.roster_updated.is_some());
    let (present, absent) = state.visible_tables();
    assert_eq!(ids(&present), vec![2]);
    assert_eq!(ids(&absent), vec![3]);
}

#[test]
fn selection_follows_row_across_tables() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetRoster(vec![
            row(1, "Ada", true),
            row(2, "Joan", false),
            row(3, "John", false),
        ]),
    );
    state.select_next();
    state.select_next();
    assert_eq!(state.selected_row().map(|r| r.id), Some(3));

    // Row 3 moves to the present table after the server flips it.
    apply_delta(
        &mut state,
        Delta::SetRoster(vec![
            row(1, "Ada", true),
            row(2, "Joan", false),
            row(3, "John", true),
        ]),
    );
    assert_eq!(state.selected_row().map(|r| r.id), Some(3));
    assert_eq!(state.selected, 1);
}

#[test]
fn selection_clamps_when_rows_vanish() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetRoster(vec![row(1, "Ada", true), row(2, "Joan", true), row(3, "John", true)]),
    );
    state.selected = 2;
    apply_delta(&mut state, Delta::SetRoster(vec![row(1, "Ada", true)]));
    assert_eq!(state.selected, 0);

    apply_delta(&mut state, Delta::SetRoster(Vec::new()));
    assert_eq!(state.selected, 0);
    assert!(state.selected_row().is_none());
}

#[test]
fn search_filters_both_tables() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetRoster(vec![
            row(1, "John", true),
            row(2, "Joan", false),
            row(3, "Mark", false),
        ]),
    );
    for ch in "jo".chars() {
        state.push_search_char(ch);
    }
    let (present, absent) = state.visible_tables();
    assert_eq!(ids(&present), vec![1]);
    assert_eq!(ids(&absent), vec![2]);

    state.cycle_match_mode();
    assert_eq!(state.filter.matcher, MatchMode::Prefix);
    state.cycle_filter_column();
    assert_eq!(state.filter.column, FilterColumn::School);
    assert!(state.visible_roster().is_empty());

    state.clear_search();
    assert_eq!(state.visible_roster().len(), 3);
}

#[test]
fn failed_toggle_clears_only_that_row() {
    let mut state = AppState::new();
    state.mark_pending(1);
    state.mark_pending(2);
    apply_delta(
        &mut state,
        Delta::ToggleFailed {
            id: 1,
            error: "http 403: forbidden".to_string(),
        },
    );
    assert!(!state.is_pending(1));
    assert!(state.is_pending(2));
    assert!(state.logs.back().unwrap().starts_with("[WARN] Attendance update for #1"));
}

#[test]
fn repeated_toggle_to_same_flag_settles() {
    let mut server = DemoData::seeded();
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetRoster(server.rows()));

    let target = state
        .roster
        .iter()
        .find(|r| !r.attending)
        .map(|r| r.id)
        .expect("seed has an absent row");

    state.mark_pending(target);
    assert!(server.set_attendance(target, true));
    apply_delta(&mut state, Delta::SetRoster(server.rows()));
    let after_first = state.roster.clone();

    state.mark_pending(target);
    assert!(server.set_attendance(target, true));
    apply_delta(&mut state, Delta::SetRoster(server.rows()));

    assert_eq!(state.roster, after_first);
    assert!(state.pending_toggles.is_empty());
    assert!(state.roster.iter().any(|r| r.id == target && r.attending));
}

#[test]
fn log_ring_is_capped() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 50"));
}

#[test]
fn demo_scores_never_decrease() {
    let mut server = DemoData::seeded();
    let mut rng = rand::thread_rng();
    let first = server.advance_scores(&mut rng);
    let second = server.advance_scores(&mut rng);
    for (a, b) in first.divisions.iter().zip(&second.divisions) {
        assert_eq!(a.division, b.division);
        for ((team_a, score_a), (team_b, score_b)) in a.teams.iter().zip(&b.teams) {
            assert_eq!(team_a, team_b);
            assert!(score_b >= score_a);
        }
    }
    assert!(!server.set_attendance(9999, true));
}

fn next_roster(rx: &mpsc::Receiver<Delta>) -> Vec<RosterRow> {
    loop {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Delta::SetRoster(rows)) => return rows,
            Ok(_) => continue,
            Err(err) => panic!("no roster snapshot from demo provider: {err}"),
        }
    }
}

#[test]
fn demo_provider_refetches_roster_after_toggle() {
    let toggle_refresh = Duration::from_millis(50);
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_fake_provider(toggle_refresh, tx, cmd_rx);

    let seeded = DemoData::seeded().rows();
    let target = seeded
        .iter()
        .find(|r| !r.attending)
        .map(|r| r.id)
        .expect("seed has an absent row");

    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetRoster(seeded.clone()));
    state.mark_pending(target);

    let sent_at = Instant::now();
    cmd_tx
        .send(ProviderCommand::SetAttendance {
            id: target,
            attending: true,
        })
        .expect("provider should accept commands");
    cmd_tx
        .send(ProviderCommand::SetAttendance {
            id: target,
            attending: true,
        })
        .expect("provider should accept commands");

    let first = next_roster(&rx);
    assert!(sent_at.elapsed() >= toggle_refresh);
    assert!(first.iter().any(|r| r.id == target && r.attending));
    for (before, after) in seeded.iter().zip(&first) {
        if before.id != target {
            assert_eq!(before, after);
        }
    }
    apply_delta(&mut state, Delta::SetRoster(first.clone()));
    assert!(state.pending_toggles.is_empty());

    let second = next_roster(&rx);
    assert_eq!(second, first);
    apply_delta(&mut state, Delta::SetRoster(second));
    assert_eq!(state.roster, first);
}
