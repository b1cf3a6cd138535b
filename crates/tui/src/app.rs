use std::{cmp, io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use badgetrack_core::{
    aggregate::{BadgeAggregator, GameReport, SweepEvent, SweepState},
    api::BadgeApi,
    error::{AggregationError, TrackError},
    models::{AnnotatedBadge, GameProgress, TrackedGame},
    registration,
    tracker::{SweepRequest, Tracker},
};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 64;
const DETAIL_PAGE: u16 = 10;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Username,
    GameId,
    Games,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Username => Focus::GameId,
            Focus::GameId => Focus::Games,
            Focus::Games => Focus::Username,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Username => Focus::Games,
            Focus::GameId => Focus::Username,
            Focus::Games => Focus::GameId,
        }
    }
}

/// Single-line ASCII text field.
#[derive(Debug, Clone, Default)]
struct TextInput {
    input: String,
    cursor: usize,
}

impl TextInput {
    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_INPUT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    fn text(&self) -> &str {
        &self.input
    }

    /// Apply an editing key; returns `false` for keys the field does not handle.
    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert(ch)
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// Blocking message that must be dismissed before anything else happens.
#[derive(Debug, Clone)]
struct Notice {
    title: String,
    message: String,
}

enum AppEvent {
    Input(Event),
    Tick,
    NameResolved {
        game_id: String,
        name: Option<String>,
    },
}

struct ActiveSweep {
    state: SweepState,
    task: JoinHandle<()>,
}

/// Terminal front end for the badge tracker.
pub struct BadgeTrackApp {
    tracker: Tracker,
    api: Arc<dyn BadgeApi>,
    aggregator: BadgeAggregator,
    theme: Theme,
    focus: Focus,
    username_input: TextInput,
    game_input: TextInput,
    notice: Option<Notice>,
    cursor: usize,
    detail_offset: u16,
    status: String,
    should_quit: bool,
    pending_registration: Option<String>,
    sweep: Option<ActiveSweep>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    sweep_tx: mpsc::Sender<SweepEvent>,
    sweep_rx: Option<mpsc::Receiver<SweepEvent>>,
}

impl BadgeTrackApp {
    pub fn new(tracker: Tracker, api: Arc<dyn BadgeApi>) -> Self {
        let (sweep_tx, sweep_rx) = mpsc::channel(64);
        Self {
            tracker,
            aggregator: BadgeAggregator::new(api.clone()),
            api,
            theme: Theme::default(),
            focus: Focus::Username,
            username_input: TextInput::default(),
            game_input: TextInput::default(),
            notice: None,
            cursor: 0,
            detail_offset: 0,
            status: "Ready".to_string(),
            should_quit: false,
            pending_registration: None,
            sweep: None,
            event_tx: None,
            sweep_tx,
            sweep_rx: Some(sweep_rx),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.status = format!(
            "Tracking {} games. Enter a username to load badge progress.",
            self.tracker.games().len()
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let mut sweep_rx = self
            .sweep_rx
            .take()
            .context("application is already running")?;

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event) {
                        break;
                    }
                }
                Some(event) = sweep_rx.recv() => self.handle_sweep_event(event),
            }

            if self.should_quit {
                break;
            }
        }

        self.cancel_sweep();
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        self.sweep_rx = Some(sweep_rx);
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                self.handle_key(key);
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            Some(AppEvent::NameResolved { game_id, name }) => {
                self.handle_name_resolved(game_id, name);
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return;
        }

        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.set_focus(self.focus.next());
                return;
            }
            KeyCode::BackTab => {
                self.set_focus(self.focus.prev());
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Username => self.handle_username_key(key),
            Focus::GameId => self.handle_game_input_key(key),
            Focus::Games => self.handle_games_key(key),
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus == Focus::Username && focus != Focus::Username && self.username_changed() {
            self.commit_username();
        }
        self.focus = focus;
    }

    fn handle_username_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.commit_username(),
            KeyCode::Esc => self.set_focus(Focus::Games),
            _ => {
                self.username_input.handle_key(&key);
            }
        }
    }

    fn handle_game_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_game(),
            KeyCode::Esc => self.set_focus(Focus::Games),
            _ => {
                self.game_input.handle_key(&key);
            }
        }
    }

    fn handle_games_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.move_to(0),
            KeyCode::Char('G') | KeyCode::End => {
                self.move_to(self.tracker.games().len().saturating_sub(1))
            }
            KeyCode::Char('d') | KeyCode::Delete => self.remove_selected(),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('u') => self.set_focus(Focus::Username),
            KeyCode::Char('a') => self.set_focus(Focus::GameId),
            KeyCode::PageDown => {
                self.detail_offset = self.detail_offset.saturating_add(DETAIL_PAGE)
            }
            KeyCode::PageUp => self.detail_offset = self.detail_offset.saturating_sub(DETAIL_PAGE),
            _ => {}
        }
    }

    fn username_changed(&self) -> bool {
        self.username_input.text().trim() != self.tracker.username().unwrap_or("")
    }

    fn commit_username(&mut self) {
        self.cancel_sweep();
        if let Some(request) = self.tracker.set_username(self.username_input.text()) {
            self.start_sweep(request);
            return;
        }
        self.status = match self.tracker.username() {
            Some(username) => format!("Username set to {username}; no games tracked yet."),
            None => "Username cleared".to_string(),
        };
    }

    fn submit_game(&mut self) {
        if let Some(game_id) = &self.pending_registration {
            self.status = format!("Still looking up game {game_id}...");
            return;
        }
        let game_id = match self.tracker.check_candidate(self.game_input.text()) {
            Ok(game_id) => game_id,
            Err(err) => {
                self.show_track_error(&err);
                return;
            }
        };
        let Some(tx) = self.event_tx.clone() else {
            return;
        };

        self.pending_registration = Some(game_id.clone());
        self.status = format!("Looking up game {game_id}...");
        let api = self.api.clone();
        spawn(async move {
            let name = registration::resolve_name(api.as_ref(), &game_id).await;
            if tx
                .send(AppEvent::NameResolved { game_id, name })
                .await
                .is_err()
            {
                debug!("Event loop closed before name resolution completed");
            }
        });
    }

    fn handle_name_resolved(&mut self, game_id: String, name: Option<String>) {
        self.pending_registration = None;
        match self.tracker.commit_game(&game_id, name) {
            Ok(sweep) => {
                self.game_input.clear();
                self.move_to(self.tracker.games().len().saturating_sub(1));
                let label = self
                    .tracker
                    .store()
                    .get(&game_id)
                    .map(TrackedGame::display_name)
                    .unwrap_or_else(|| game_id.clone());
                self.status = format!("Now tracking {label}");
                if let Some(request) = sweep {
                    self.start_sweep(request);
                }
            }
            Err(err) => self.show_track_error(&err),
        }
    }

    fn remove_selected(&mut self) {
        let Some(game) = self.current_game().cloned() else {
            return;
        };
        match self.tracker.remove_game(&game.id) {
            Ok(sweep) => {
                self.clamp_cursor();
                self.status = format!("Stopped tracking {}", game.display_name());
                if let Some(request) = sweep {
                    self.start_sweep(request);
                }
            }
            Err(err) => self.show_track_error(&err),
        }
    }

    fn refresh(&mut self) {
        match self.tracker.sweep_request() {
            Some(request) => self.start_sweep(request),
            None if self.tracker.username().is_none() => {
                self.status = "Enter a username first".to_string()
            }
            None => self.status = "No games tracked".to_string(),
        }
    }

    fn start_sweep(&mut self, request: SweepRequest) {
        self.cancel_sweep();
        let state = SweepState::new(&request);
        info!(
            username = %state.key().username,
            games = state.total(),
            "Sweep scheduled"
        );
        self.status = format!(
            "Loading badges for {} ({} games)...",
            state.key().username,
            state.total()
        );
        let task = spawn(self.aggregator.clone().run(request, self.sweep_tx.clone()));
        self.sweep = Some(ActiveSweep { state, task });
    }

    fn cancel_sweep(&mut self) {
        if let Some(sweep) = self.sweep.take() {
            if !sweep.state.is_finished() {
                debug!(
                    generation = sweep.state.key().generation,
                    "Aborting superseded sweep"
                );
            }
            sweep.task.abort();
        }
    }

    fn handle_sweep_event(&mut self, event: SweepEvent) {
        let Some(sweep) = self.sweep.as_mut() else {
            debug!("Discarding sweep event with no active sweep");
            return;
        };
        if !sweep.state.accept(event) {
            return;
        }

        let state = &sweep.state;
        self.status = if !state.is_finished() {
            format!(
                "Loading badges for {} ({}/{})...",
                state.key().username,
                state.received(),
                state.total()
            )
        } else if state.failed() == 0 {
            format!("Loaded badges for {} games", state.total())
        } else {
            format!(
                "Loaded badges for {} games ({} failed)",
                state.total(),
                state.failed()
            )
        };
    }

    fn show_track_error(&mut self, err: &TrackError) {
        let (title, message) = describe_track_error(err);
        self.status = message.clone();
        self.notice = Some(Notice {
            title: title.to_string(),
            message,
        });
    }

    fn current_game(&self) -> Option<&TrackedGame> {
        self.tracker.games().get(self.cursor)
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.tracker.games().len();
        if len == 0 {
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.move_to(next as usize);
    }

    fn move_to(&mut self, index: usize) {
        if index != self.cursor {
            self.detail_offset = 0;
        }
        self.cursor = index;
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.tracker.games().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
            self.detail_offset = 0;
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(size);

        let input_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);
        self.render_input(
            frame,
            input_chunks[0],
            "Username",
            &self.username_input,
            Focus::Username,
        );
        let game_title = match &self.pending_registration {
            Some(game_id) => format!("Add game (looking up {game_id}...)"),
            None => "Add game (ID)".to_string(),
        };
        self.render_input(
            frame,
            input_chunks[1],
            &game_title,
            &self.game_input,
            Focus::GameId,
        );

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[1]);
        self.render_game_list(frame, body_chunks[0]);
        self.render_detail(frame, body_chunks[1]);
        self.render_status(frame, chunks[2]);

        if let Some(notice) = &self.notice {
            self.render_notice(frame, notice);
        }
    }

    fn border_style(&self, focus: Focus) -> Style {
        if self.focus == focus && self.notice.is_none() {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        }
    }

    fn render_input(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        input: &TextInput,
        focus: Focus,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(focus))
            .title(title.to_string());
        let line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(input.text().to_string()),
        ]);
        frame.render_widget(Paragraph::new(line).block(block), area);

        if self.focus == focus && self.notice.is_none() {
            let cursor_x =
                (area.x + 3 + input.cursor as u16).min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 1);
        }
    }

    fn render_game_list(&self, frame: &mut Frame, area: Rect) {
        let games = self.tracker.games();
        let mut list_state = ListState::default();
        if !games.is_empty() {
            list_state.select(Some(self.cursor.min(games.len() - 1)));
        }

        let items: Vec<ListItem> = games
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let marker = if idx == self.cursor {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let title = Span::styled(
                    game.display_name(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let id = Span::styled(
                    format!(" (ID: {})", game.id),
                    Style::default().fg(self.theme.muted),
                );
                let mut line = vec![marker, title, id];
                if let Some(progress) = self.report_for(game).and_then(GameReport::progress) {
                    line.push(Span::styled(
                        format!("  {}/{}", progress.obtained, progress.total),
                        Style::default().fg(self.theme.success),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(Focus::Games))
            .title(format!("Tracked games ({})", games.len()));
        if items.is_empty() {
            let paragraph = Paragraph::new("No games tracked. Press a to add one.")
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn report_for(&self, game: &TrackedGame) -> Option<&GameReport> {
        self.sweep.as_ref()?.state.report(&game.id)
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Badges");
        let Some(game) = self.current_game() else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };
        if self.tracker.username().is_none() {
            let hint = Paragraph::new("Enter a username to load badge progress.")
                .block(block)
                .style(Style::default().fg(self.theme.muted));
            frame.render_widget(hint, area);
            return;
        }

        let Some(report) = self.report_for(game) else {
            let message = match &self.sweep {
                Some(sweep) if !sweep.state.is_finished() => "Loading badges...",
                _ => "No results yet. Press r to refresh.",
            };
            let hint = Paragraph::new(message)
                .block(block)
                .style(Style::default().fg(self.theme.muted));
            frame.render_widget(hint, area);
            return;
        };

        match &report.result {
            Ok(badges) => self.render_badges(frame, area, block, game, badges),
            Err(err) => {
                let (message, color) = self.describe_aggregation_error(err);
                let paragraph = Paragraph::new(Line::from(Span::styled(
                    message,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )))
                .block(block)
                .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, area);
            }
        }
    }

    fn render_badges(
        &self,
        frame: &mut Frame,
        area: Rect,
        block: Block,
        game: &TrackedGame,
        badges: &[AnnotatedBadge],
    ) {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(inner);

        let progress = GameProgress::from_badges(badges);
        let title = Line::from(vec![
            Span::styled(
                game.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                ": {} / {} badges obtained",
                progress.obtained, progress.total
            )),
        ]);
        frame.render_widget(Paragraph::new(title), chunks[0]);

        let percent = progress.percent();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(self.theme.success))
            .percent(percent)
            .label(format!("{percent}%"));
        frame.render_widget(gauge, chunks[1]);

        let mut lines = Vec::new();
        for badge in badges {
            lines.extend(self.badge_card(badge));
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::styled(
                "This game has no badges.",
                Style::default().fg(self.theme.muted),
            )));
        }
        let max_offset = (lines.len() as u16).saturating_sub(chunks[2].height);
        let cards = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.detail_offset.min(max_offset), 0));
        frame.render_widget(cards, chunks[2]);
    }

    fn badge_card(&self, badge: &AnnotatedBadge) -> Vec<Line<'static>> {
        let status = match (badge.obtained, badge.obtained_date) {
            (true, Some(date)) => Line::from(vec![
                Span::styled("Obtained", Style::default().fg(self.theme.success)),
                Span::raw(format!(
                    " on {}",
                    date.with_timezone(&Local).format("%Y-%m-%d")
                )),
            ]),
            (true, None) => Line::from(Span::styled(
                "Obtained",
                Style::default().fg(self.theme.success),
            )),
            (false, _) => Line::from(Span::styled(
                "Not obtained",
                Style::default().fg(self.theme.muted),
            )),
        };
        let description = badge
            .badge
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or("No description.")
            .to_string();

        let mut lines = vec![
            Line::from(Span::styled(
                badge.badge.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(description),
            status,
        ];
        if !badge.badge.image_url.is_empty() {
            lines.push(Line::from(Span::styled(
                badge.badge.image_url.clone(),
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.push(Line::from(""));
        lines
    }

    fn describe_aggregation_error(&self, err: &AggregationError) -> (String, Color) {
        match err {
            AggregationError::UserNotFound { username } => {
                (format!("User {username} not found."), self.theme.danger)
            }
            AggregationError::UserBadgesUnavailable { .. } => (
                "Could not fetch the user's badges.".to_string(),
                self.theme.warning,
            ),
            AggregationError::GameBadgesUnavailable { game } => (
                format!("Could not fetch badges for {}.", game.display_name()),
                self.theme.warning,
            ),
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let help = match self.focus {
            Focus::Username => "Enter commit  Tab next field  Esc list",
            Focus::GameId => "Enter add game  Tab next field  Esc list",
            Focus::Games => {
                "j/k select  d remove  r refresh  PgUp/PgDn scroll  u username  a add  q quit"
            }
        };
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_notice(&self, frame: &mut Frame, notice: &Notice) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let height = 6_u16.min(frame_area.height.saturating_sub(2)).max(5_u16);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" dismiss"),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                notice.message.clone(),
                Style::default().fg(self.theme.warning),
            )),
            Line::from(""),
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(notice.title.clone()),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn describe_track_error(err: &TrackError) -> (&'static str, String) {
    match err {
        TrackError::InvalidIdentifier(_) => (
            "Invalid game ID",
            "Please enter a valid game ID (digits only).".to_string(),
        ),
        TrackError::AlreadyTracked(_) => (
            "Already tracked",
            "This game is already in the list.".to_string(),
        ),
        TrackError::Io(_) | TrackError::Serialize(_) => {
            ("Save failed", format!("Could not save the game list: {err}"))
        }
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io as stdio;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::default();
        for ch in "1245".chars() {
            input.handle_key(&key(KeyCode::Char(ch)));
        }
        input.move_cursor(-2);
        input.insert('3');
        assert_eq!(input.text(), "12345");

        input.move_home();
        input.delete();
        input.move_end();
        input.backspace();
        assert_eq!(input.text(), "234");

        input.move_cursor(-10);
        assert_eq!(input.cursor, 0);
        assert!(!input.handle_key(&key(KeyCode::Enter)));
    }

    #[test]
    fn text_input_rejects_control_and_overflow() {
        let mut input = TextInput::default();
        input.insert('\u{7}');
        input.insert('é');
        assert_eq!(input.text(), "");

        for _ in 0..(MAX_INPUT_LEN + 5) {
            input.insert('9');
        }
        assert_eq!(input.text().len(), MAX_INPUT_LEN);
    }

    #[test]
    fn focus_cycles_both_ways() {
        let mut focus = Focus::Username;
        for _ in 0..3 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Username);
        assert_eq!(Focus::Username.prev(), Focus::Games);
        assert_eq!(Focus::Games.prev(), Focus::GameId);
    }

    #[test]
    fn track_errors_have_notices() {
        let (title, message) = describe_track_error(&TrackError::InvalidIdentifier("x".into()));
        assert_eq!(title, "Invalid game ID");
        assert!(message.contains("digits only"));

        let (title, _) = describe_track_error(&TrackError::AlreadyTracked("1".into()));
        assert_eq!(title, "Already tracked");

        let io_err = TrackError::Io(stdio::Error::new(stdio::ErrorKind::Other, "disk full"));
        let (title, message) = describe_track_error(&io_err);
        assert_eq!(title, "Save failed");
        assert!(message.contains("disk full"));
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(40, 4, area);
        assert_eq!(rect, Rect::new(0, 3, 20, 4));
    }
}
