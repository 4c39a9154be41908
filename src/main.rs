use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use scoreboard_terminal::config::{Config, Source};
use scoreboard_terminal::filter::{column_label, match_mode_label};
use scoreboard_terminal::roster::{RosterRow, action_label};
use scoreboard_terminal::scoreboard::{DivisionBoard, RankedEntry, format_score};
use scoreboard_terminal::state::{AppState, Delta, ProviderCommand, Screen, apply_delta};
use scoreboard_terminal::{fake_feed, feed};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    scores_refresh: Duration,
    last_scores_refresh: Instant,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>, config: &Config) -> Self {
        Self {
            state: AppState::from_config(config),
            should_quit: false,
            cmd_tx,
            scores_refresh: config.scores_poll,
            last_scores_refresh: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.search_active {
            self.on_search_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Scoreboard,
            KeyCode::Char('2') => self.state.screen = Screen::Roster,
            KeyCode::Tab => {
                self.state.screen = match self.state.screen {
                    Screen::Scoreboard => Screen::Roster,
                    Screen::Roster => Screen::Scoreboard,
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if !self.state.toggle_freeze() {
                    self.request_scores(false);
                }
            }
            KeyCode::Char('R') => self.request_scores(true),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ if self.state.screen == Screen::Roster => self.on_roster_key(key),
            _ => {}
        }
    }

    fn on_roster_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('/') => self.state.search_active = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(' ') | KeyCode::Char('t') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('m') => self.state.cycle_match_mode(),
            KeyCode::Char('c') => self.state.cycle_filter_column(),
            KeyCode::Char('r') => self.request_roster(true),
            KeyCode::Esc => self.state.clear_search(),
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.state.search_active = false,
            KeyCode::Backspace => self.state.pop_search_char(),
            KeyCode::Down => self.state.select_next(),
            KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(ch) => self.state.push_search_char(ch),
            _ => {}
        }
    }

    fn send(&self, cmd: ProviderCommand) -> bool {
        let Some(tx) = &self.cmd_tx else {
            return false;
        };
        tx.send(cmd).is_ok()
    }

    fn request_scores(&mut self, announce: bool) {
        if self.state.frozen {
            if announce {
                self.state.push_log("[INFO] Scoreboard frozen; press f to resume");
            }
            return;
        }
        if self.send(ProviderCommand::FetchScores) {
            if announce {
                self.state.push_log("[INFO] Scores request sent");
            }
        } else {
            self.state.push_log("[WARN] Scores request failed");
        }
        self.last_scores_refresh = Instant::now();
    }

    fn request_roster(&mut self, announce: bool) {
        if self.send(ProviderCommand::FetchRoster) {
            if announce {
                self.state.push_log("[INFO] Roster request sent");
            }
        } else {
            self.state.push_log("[WARN] Roster request failed");
        }
    }

    fn toggle_selected(&mut self) {
        let Some(row) = self.state.selected_row() else {
            self.state.push_log("[INFO] No row selected");
            return;
        };
        let id = row.id;
        let attending = !row.attending;
        if self.send(ProviderCommand::SetAttendance { id, attending }) {
            self.state.mark_pending(id);
        } else {
            self.state.push_log("[WARN] Attendance update could not be sent");
        }
    }

    // The poll timer keeps running while frozen; the fetch itself is skipped.
    fn maybe_refresh_scores(&mut self) {
        if self.last_scores_refresh.elapsed() < self.scores_refresh {
            return;
        }
        if self.state.frozen {
            self.state.push_log("[INFO] Frozen; skipped scoreboard refresh");
            self.last_scores_refresh = Instant::now();
            return;
        }
        self.request_scores(false);
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = Config::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    match config.source {
        Source::Http => feed::spawn_provider(config.clone(), tx, cmd_rx),
        Source::Demo => fake_feed::spawn_fake_provider(config.toggle_refresh, tx, cmd_rx),
    }

    let mut app = App::new(Some(cmd_tx), &config);
    app.state.push_log(format!("[INFO] Source: {}", source_label(&config)));
    app.request_scores(false);
    app.request_roster(false);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_refresh_scores();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Scoreboard => render_scoreboard(frame, chunks[1], &app.state),
        Screen::Roster => render_roster(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    match state.screen {
        Screen::Scoreboard => format!(
            "LIVE SCOREBOARD | {} | Updated: {}",
            if state.frozen { "FROZEN" } else { "LIVE" },
            state.scores_updated.as_deref().unwrap_or("never")
        ),
        Screen::Roster => format!(
            "ATTENDANCE | Present {} / {} | Updated: {}",
            state.roster.iter().filter(|row| row.attending).count(),
            state.roster.len(),
            state.roster_updated.as_deref().unwrap_or("never")
        ),
    }
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Scoreboard => {
            let freeze = if state.frozen { "f Unfreeze" } else { "f Freeze" };
            format!("1 Scores | 2 Roster | {freeze} | R Refresh | ? Help | q Quit")
        }
        Screen::Roster if state.search_active => {
            "Type to filter | Backspace Delete | ↑/↓ Move | Enter/Esc Done".to_string()
        }
        Screen::Roster => {
            "1 Scores | / Search | j/k Move | Space Toggle | m Match | c Column | r Reload | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_scoreboard(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.boards.is_empty() {
        let empty = Paragraph::new("No scores yet").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let count = state.boards.len() as u32;
    let constraints: Vec<Constraint> = (0..count).map(|_| Constraint::Ratio(1, count)).collect();
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (board, pane) in state.boards.iter().zip(panes.iter()) {
        render_division(frame, *pane, board, state.frozen);
    }
}

fn render_division(frame: &mut Frame, area: Rect, board: &DivisionBoard, frozen: bool) {
    let title_style = if frozen {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let block = Block::default()
        .title(Span::styled(board.name.clone(), title_style))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }
    if board.entries.is_empty() {
        let empty = Paragraph::new("No teams").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);
    let (left, right) = board.columns();
    frame.render_widget(score_table(left), cols[0]);
    frame.render_widget(score_table(right), cols[1]);
}

fn score_table(entries: &[RankedEntry]) -> Table<'static> {
    let header = Row::new(["#", "Team", "Score"]).style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            Row::new([
                Cell::from(entry.rank.to_string()),
                Cell::from(entry.team.clone()),
                Cell::from(format_score(entry.score)),
            ])
        })
        .collect();
    Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(9),
        ],
    )
    .header(header)
}

fn render_roster(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let cursor = if state.search_active { "_" } else { "" };
    let search_style = if state.search_active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = Paragraph::new(format!(
        "Search [{} {}]: {}{cursor}",
        column_label(state.filter.column),
        match_mode_label(state.filter.matcher),
        state.search
    ))
    .style(search_style);
    frame.render_widget(search, sections[0]);

    let (present, absent) = state.visible_tables();
    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sections[1]);

    let present_selected = (state.selected < present.len()).then_some(state.selected);
    let absent_selected = state
        .selected
        .checked_sub(present.len())
        .filter(|idx| *idx < absent.len());

    render_roster_table(
        frame,
        tables[0],
        &format!("Present ({})", present.len()),
        &present,
        present_selected,
        state,
    );
    render_roster_table(
        frame,
        tables[1],
        &format!("Absent ({})", absent.len()),
        &absent,
        absent_selected,
        state,
    );
}

fn render_roster_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[&RosterRow],
    selected: Option<usize>,
    state: &AppState,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }
    if rows.is_empty() {
        let empty = Paragraph::new("No matching rows").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    // One line goes to the header.
    let visible = (inner.height - 1) as usize;
    let (start, end) = visible_range(selected.unwrap_or(0), rows.len(), visible);

    let table_rows: Vec<Row> = (start..end)
        .map(|idx| {
            let row = rows[idx];
            let pending = state.is_pending(row.id);
            let style = if selected == Some(idx) {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else if pending {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new([
                Cell::from(row.name.clone()),
                Cell::from(row.school.clone()),
                Cell::from(action_label(row, pending)),
            ])
            .style(style)
        })
        .collect();

    let header =
        Row::new(["Name", "School", ""]).style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(
        table_rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(35),
            Constraint::Min(12),
        ],
    )
    .header(header);
    frame.render_widget(table, inner);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn source_label(config: &Config) -> String {
    match config.source {
        Source::Http => config.base_url.clone(),
        Source::Demo => "demo feed".to_string(),
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Scoreboard Terminal - Help",
        "",
        "Global:",
        "  1 / 2 / Tab  Scoreboard / Roster",
        "  f            Freeze or resume the scoreboard",
        "  R            Refresh scores now",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Roster:",
        "  /            Search (Enter/Esc to finish)",
        "  Esc          Clear search",
        "  j/k or ↑/↓   Move selection",
        "  Space / t    Toggle attendance",
        "  m            Contains / prefix matching",
        "  c            Filter by name / school",
        "  r            Reload roster",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_range_centers_selection() {
        assert_eq!(visible_range(0, 0, 5), (0, 0));
        assert_eq!(visible_range(3, 4, 10), (0, 4));
        assert_eq!(visible_range(10, 20, 6), (7, 13));
        assert_eq!(visible_range(19, 20, 6), (14, 20));
    }

    #[test]
    fn frozen_tick_skips_fetch_but_resets_timer() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let config = Config::default();
        let mut app = App::new(Some(cmd_tx), &config);
        app.state.frozen = true;
        app.last_scores_refresh = Instant::now() - Duration::from_secs(60);

        app.maybe_refresh_scores();

        assert!(cmd_rx.try_recv().is_err());
        assert!(app.last_scores_refresh.elapsed() < Duration::from_secs(5));
        assert_eq!(
            app.state.logs.back().map(String::as_str),
            Some("[INFO] Frozen; skipped scoreboard refresh")
        );
    }

    #[test]
    fn live_tick_sends_fetch() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let config = Config::default();
        let mut app = App::new(Some(cmd_tx), &config);
        app.last_scores_refresh = Instant::now() - Duration::from_secs(60);

        app.maybe_refresh_scores();

        assert!(matches!(cmd_rx.try_recv(), Ok(ProviderCommand::FetchScores)));
    }

    #[test]
    fn unfreezing_refreshes_immediately() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let config = Config::default();
        let mut app = App::new(Some(cmd_tx), &config);
        app.state.frozen = true;

        app.on_key(KeyEvent::from(KeyCode::Char('f')));

        assert!(!app.state.frozen);
        assert!(matches!(cmd_rx.try_recv(), Ok(ProviderCommand::FetchScores)));
    }

    #[test]
    fn toggle_marks_row_pending() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let config = Config::default();
        let mut app = App::new(Some(cmd_tx), &config);
        app.state.screen = Screen::Roster;
        app.state.roster = vec![RosterRow {
            id: 7,
            name: "Joan".to_string(),
            school: "North".to_string(),
            attending: false,
        }];

        app.on_key(KeyEvent::from(KeyCode::Char(' ')));

        assert!(app.state.is_pending(7));
        assert!(matches!(
            cmd_rx.try_recv(),
            Ok(ProviderCommand::SetAttendance {
                id: 7,
                attending: true
            })
        ));
    }

    #[test]
    fn search_mode_captures_letters() {
        let config = Config::default();
        let mut app = App::new(None, &config);
        app.state.screen = Screen::Roster;

        app.on_key(KeyEvent::from(KeyCode::Char('/')));
        app.on_key(KeyEvent::from(KeyCode::Char('q')));
        app.on_key(KeyEvent::from(KeyCode::Char('j')));

        assert!(!app.should_quit);
        assert_eq!(app.state.search, "qj");
    }
}
