use crate::client::{
    AppSnapshot,
    RevealView,
    YoloView,
};
use alloy::primitives::Address;
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use randomness::{
    aggregator::Criteria,
    games::GameRecord,
    staking::estimate_rewards,
};
use randomness_tui::animation::RevealPhase;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;

const PREVIEW_ROWS: usize = 8;

pub enum UserEvent {
    Quit,
    Redraw,
    InvalidInput(String),
    CycleProvider,
    DrawNumber { min: u64, max: u64 },
    YoloRoll,
    PickFromList(String),
    LoadFile(String),
    PickFileWinners(usize),
    FetchSocial { tweet_url: String, criteria: Criteria },
    DrawSocialWinners(usize),
    RefreshGames,
    CreateGame,
    JoinGame(u64),
    ShowGame(u64),
    CloseGame,
    OpenPack,
    Stake { amount: f64, days: u32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Number,
    List,
    File,
    Social,
    Battles,
    Stake,
}

impl Tab {
    const ALL: [Tab; 6] = [
        Tab::Number,
        Tab::List,
        Tab::File,
        Tab::Social,
        Tab::Battles,
        Tab::Stake,
    ];

    fn title(self) -> &'static str {
        match self {
            Tab::Number => "1 Number",
            Tab::List => "2 List",
            Tab::File => "3 File",
            Tab::Social => "4 Social",
            Tab::Battles => "5 Battles",
            Tab::Stake => "6 Stake",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    fn fields(self) -> &'static [Field] {
        match self {
            Tab::Number => &[Field::Min, Field::Max],
            Tab::List => &[Field::Items],
            Tab::File => &[Field::FilePath, Field::FileCount],
            Tab::Social => &[Field::TweetUrl, Field::WinnerCount],
            Tab::Battles => &[],
            Tab::Stake => &[Field::StakeAmount, Field::StakeDays],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Min,
    Max,
    Items,
    FilePath,
    FileCount,
    TweetUrl,
    WinnerCount,
    StakeAmount,
    StakeDays,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Min => "Min",
            Field::Max => "Max",
            Field::Items => "Items",
            Field::FilePath => "File",
            Field::FileCount => "Winners",
            Field::TweetUrl => "Tweet URL",
            Field::WinnerCount => "Winners",
            Field::StakeAmount => "Amount",
            Field::StakeDays => "Days",
        }
    }
}

#[derive(Clone, Debug)]
struct Inputs {
    min: String,
    max: String,
    items: String,
    file_path: String,
    file_count: String,
    tweet_url: String,
    winner_count: String,
    stake_amount: String,
    stake_days: String,
}

impl Default for Inputs {
    fn default() -> Self {
        Inputs {
            min: "1".to_string(),
            max: "100".to_string(),
            items: String::new(),
            file_path: String::new(),
            file_count: "1".to_string(),
            tweet_url: String::new(),
            winner_count: "1".to_string(),
            stake_amount: String::new(),
            stake_days: "30".to_string(),
        }
    }
}

impl Inputs {
    fn get(&self, field: Field) -> &str {
        match field {
            Field::Min => &self.min,
            Field::Max => &self.max,
            Field::Items => &self.items,
            Field::FilePath => &self.file_path,
            Field::FileCount => &self.file_count,
            Field::TweetUrl => &self.tweet_url,
            Field::WinnerCount => &self.winner_count,
            Field::StakeAmount => &self.stake_amount,
            Field::StakeDays => &self.stake_days,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Min => &mut self.min,
            Field::Max => &mut self.max,
            Field::Items => &mut self.items,
            Field::FilePath => &mut self.file_path,
            Field::FileCount => &mut self.file_count,
            Field::TweetUrl => &mut self.tweet_url,
            Field::WinnerCount => &mut self.winner_count,
            Field::StakeAmount => &mut self.stake_amount,
            Field::StakeDays => &mut self.stake_days,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    Editing,
    QuitModal,
    GameDetail(u64),
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    tab: Tab,
    focus: usize,
    inputs: Inputs,
    criteria: Criteria,
    selected_game: usize,
    games: Vec<GameRecord>,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl UiState {
    fn focused_field(&self) -> Option<Field> {
        self.tab.fields().get(self.focus).copied()
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.focus = 0;
    }

    fn selected_game_id(&self) -> Option<u64> {
        self.games.get(self.selected_game).map(|g| g.id)
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableBracketedPaste,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    // cache games for selection handling between draws
    state.games = snap.games.clone();
    if state.selected_game >= state.games.len() {
        state.selected_game = state.games.len().saturating_sub(1);
    }
    sync_detail_mode(state, snap.reveal.as_ref());
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

/// The game detail view is open exactly while a reveal is loaded.
fn sync_detail_mode(state: &mut UiState, reveal: Option<&RevealView>) {
    match (state.mode, reveal) {
        (Mode::Normal, Some(reveal)) => state.mode = Mode::GameDetail(reveal.game.id),
        (Mode::GameDetail(_), None) => state.mode = Mode::Normal,
        _ => {}
    }
}

/// Terminal reads block, so they run on their own thread.
pub fn input_event_stream() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!("terminal input failed: {err}");
                    break;
                }
            }
        }
    });
    rx
}

pub async fn next_raw_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Result<Event> {
    rx.recv()
        .await
        .ok_or_else(|| eyre!("terminal input stream closed"))
}

pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => interpret_key(state, k),
        Event::Paste(text) if state.mode == Mode::Editing => {
            let field = state.focused_field()?;
            state.inputs.get_mut(field).push_str(&text);
            Some(UserEvent::Redraw)
        }
        Event::Resize(_, _) => Some(UserEvent::Redraw),
        _ => None,
    }
}

fn interpret_key(state: &mut UiState, k: KeyEvent) -> Option<UserEvent> {
    match state.mode {
        Mode::QuitModal => {
            return match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Editing => {
            let field = state.focused_field()?;
            return match k.code {
                KeyCode::Esc | KeyCode::Enter => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Tab => {
                    state.focus = (state.focus + 1) % state.tab.fields().len();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Backspace => {
                    state.inputs.get_mut(field).pop();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) => {
                    state.inputs.get_mut(field).push(c);
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::GameDetail(_) => {
            return match k.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::CloseGame)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }

    match k.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Right => {
            state.switch_tab(state.tab.next());
            return Some(UserEvent::Redraw);
        }
        KeyCode::Left => {
            state.switch_tab(state.tab.prev());
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char(c @ '1'..='6') => {
            let idx = c as usize - '1' as usize;
            state.switch_tab(Tab::ALL[idx]);
            return Some(UserEvent::Redraw);
        }
        KeyCode::Char('v') => return Some(UserEvent::CycleProvider),
        KeyCode::Char('e') if !state.tab.fields().is_empty() => {
            state.mode = Mode::Editing;
            return Some(UserEvent::Redraw);
        }
        KeyCode::Tab if !state.tab.fields().is_empty() => {
            state.focus = (state.focus + 1) % state.tab.fields().len();
            return Some(UserEvent::Redraw);
        }
        _ => {}
    }

    match state.tab {
        Tab::Number => match k.code {
            KeyCode::Enter => Some(
                match (parse_field::<u64>(state, Field::Min), parse_field::<u64>(state, Field::Max)) {
                    (Ok(min), Ok(max)) => UserEvent::DrawNumber { min, max },
                    (Err(e), _) | (_, Err(e)) => e,
                },
            ),
            KeyCode::Char('y') => Some(UserEvent::YoloRoll),
            _ => None,
        },
        Tab::List => match k.code {
            KeyCode::Enter => Some(UserEvent::PickFromList(state.inputs.items.clone())),
            _ => None,
        },
        Tab::File => match k.code {
            KeyCode::Enter => Some(UserEvent::LoadFile(state.inputs.file_path.clone())),
            KeyCode::Char('w') => Some(
                parse_field::<usize>(state, Field::FileCount)
                    .map_or_else(|e| e, UserEvent::PickFileWinners),
            ),
            _ => None,
        },
        Tab::Social => match k.code {
            KeyCode::Enter => Some(UserEvent::FetchSocial {
                tweet_url: state.inputs.tweet_url.trim().to_string(),
                criteria: state.criteria,
            }),
            KeyCode::Char('f') => {
                state.criteria.follows = !state.criteria.follows;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('r') => {
                state.criteria.retweets = !state.criteria.retweets;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('l') => {
                state.criteria.shares = !state.criteria.shares;
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('w') => Some(
                parse_field::<usize>(state, Field::WinnerCount)
                    .map_or_else(|e| e, UserEvent::DrawSocialWinners),
            ),
            _ => None,
        },
        Tab::Battles => match k.code {
            KeyCode::Up => {
                state.selected_game = state.selected_game.saturating_sub(1);
                Some(UserEvent::Redraw)
            }
            KeyCode::Down => {
                if state.selected_game + 1 < state.games.len() {
                    state.selected_game += 1;
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('g') => Some(UserEvent::RefreshGames),
            KeyCode::Char('c') => Some(UserEvent::CreateGame),
            KeyCode::Char('j') => Some(match state.selected_game_id() {
                Some(id) => UserEvent::JoinGame(id),
                None => UserEvent::InvalidInput("No game selected".to_string()),
            }),
            KeyCode::Char('o') => Some(UserEvent::OpenPack),
            KeyCode::Enter => state.selected_game_id().map(UserEvent::ShowGame),
            _ => None,
        },
        Tab::Stake => match k.code {
            KeyCode::Enter => Some(
                match (
                    parse_field::<f64>(state, Field::StakeAmount),
                    parse_field::<u32>(state, Field::StakeDays),
                ) {
                    (Ok(amount), Ok(days)) => UserEvent::Stake { amount, days },
                    (Err(e), _) | (_, Err(e)) => e,
                },
            ),
            _ => None,
        },
    }
}

fn parse_field<T: std::str::FromStr>(state: &UiState, field: Field) -> Result<T, UserEvent> {
    let raw = state.inputs.get(field).trim();
    raw.parse::<T>().map_err(|_| {
        UserEvent::InvalidInput(format!("{}: '{raw}' is not a valid number", field.label()))
    })
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // provider + wallet
            Constraint::Length(3), // tabs
            Constraint::Min(12),   // active tab
            Constraint::Length(9), // status/errors + help
        ])
        .split(f.area());

    draw_header(f, chunks[0], snap);
    draw_tabs(f, state, chunks[1]);
    match state.tab {
        Tab::Number => draw_number_tab(f, state, chunks[2], snap),
        Tab::List => draw_list_tab(f, state, chunks[2], snap),
        Tab::File => draw_file_tab(f, state, chunks[2], snap),
        Tab::Social => draw_social_tab(f, state, chunks[2], snap),
        Tab::Battles => draw_battles_tab(f, state, chunks[2], snap),
        Tab::Stake => draw_stake_tab(f, state, chunks[2], snap),
    }
    draw_bottom(f, state, chunks[3], snap);
    draw_modals(f, state, snap);
}

fn draw_header(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let account = match &snap.account {
        Some((name, address)) => format!("{name} ({address})"),
        None => "read-only".to_string(),
    };
    let text = format!(
        "Oracle: {} | Chain: {} ({}) | Wallet: {}",
        snap.provider.name, snap.provider.chain_name, snap.provider.chain_id, account
    );
    let widget = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Randomness"));
    f.render_widget(widget, area);
}

fn draw_tabs(f: &mut Frame, state: &UiState, area: Rect) {
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(state.tab.index())
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn input_lines(state: &UiState) -> Vec<Line<'static>> {
    state
        .tab
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let focused = idx == state.focus;
            let editing = focused && state.mode == Mode::Editing;
            let marker = if focused { "> " } else { "  " };
            let cursor = if editing { "_" } else { "" };
            let style = if editing {
                Style::default().fg(Color::Yellow)
            } else if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(Span::styled(
                format!("{marker}{}: {}{cursor}", field.label(), state.inputs.get(*field)),
                style,
            ))
        })
        .collect()
}

fn split_inputs_and_results(area: Rect, input_height: u16) -> (Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(input_height), Constraint::Min(3)])
        .split(area);
    (rows[0], rows[1])
}

fn draw_inputs(f: &mut Frame, state: &UiState, area: Rect, extra: Vec<Line<'static>>) {
    let mut lines = input_lines(state);
    lines.extend(extra);
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Input"));
    f.render_widget(widget, area);
}

fn draw_number_tab(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let (inputs, results) = split_inputs_and_results(area, 4);
    draw_inputs(f, state, inputs, Vec::new());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(results);

    let number = match snap.number {
        Some(n) => Line::from(Span::styled(
            n.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        None => Line::from("Press Enter to request a number"),
    };
    let widget = Paragraph::new(number)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Random Number"));
    f.render_widget(widget, cols[0]);

    let widget = Paragraph::new(yolo_lines(snap.yolo.as_ref()))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("YOLO"));
    f.render_widget(widget, cols[1]);
}

fn yolo_lines(yolo: Option<&YoloView>) -> Vec<Line<'static>> {
    match yolo {
        None => vec![Line::from("Press y to roll")],
        Some(view) if view.rolling => vec![Line::from("Rolling...")],
        Some(view) => {
            let label = view.label.unwrap_or_default();
            let color = if label == "YOLO!" { Color::Green } else { Color::Red };
            vec![
                Line::from(Span::styled(
                    label.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Rolled {}", view.roll.unwrap_or_default())),
            ]
        }
    }
}

fn draw_list_tab(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let (inputs, results) = split_inputs_and_results(area, 6);
    draw_inputs(
        f,
        state,
        inputs,
        vec![Line::from("  Separate items with commas or new lines")],
    );
    let text = match &snap.list_pick {
        Some(pick) => Line::from(Span::styled(
            pick.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        None => Line::from("Press Enter to pick an item"),
    };
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Picked"));
    f.render_widget(widget, results);
}

fn draw_file_tab(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let (inputs, results) = split_inputs_and_results(area, 5);
    draw_inputs(
        f,
        state,
        inputs,
        vec![Line::from("  .csv .tsv .txt .xls .xlsx")],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(results);

    let title = match &snap.file_name {
        Some(name) => format!("{name} ({} entries)", snap.file_rows.len()),
        None => "Entries".to_string(),
    };
    let mut rows: Vec<Line> = snap
        .file_rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| Line::from(row.clone()))
        .collect();
    if snap.file_rows.len() > PREVIEW_ROWS {
        rows.push(Line::from(format!(
            "... {} more",
            snap.file_rows.len() - PREVIEW_ROWS
        )));
    }
    let widget =
        Paragraph::new(rows).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, cols[0]);

    let winners: Vec<Line> = snap
        .file_winners
        .iter()
        .enumerate()
        .map(|(i, row)| Line::from(format!("#{} {row}", i + 1)))
        .collect();
    let widget = Paragraph::new(winners)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Winners"));
    f.render_widget(widget, cols[1]);
}

fn checkbox(label: &str, key: char, checked: bool) -> Span<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    let style = if checked {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    Span::styled(format!("{mark} {label} ({key})  "), style)
}

fn draw_social_tab(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let (inputs, results) = split_inputs_and_results(area, 5);
    let criteria = Line::from(vec![
        Span::raw("  "),
        checkbox("Follows", 'f', state.criteria.follows),
        checkbox("Retweets", 'r', state.criteria.retweets),
        checkbox("Likes", 'l', state.criteria.shares),
    ]);
    draw_inputs(f, state, inputs, vec![criteria]);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(results);

    let summary: Vec<Line> = match &snap.social {
        None => vec![Line::from("Press Enter to fetch interactions")],
        Some(social) => {
            let mut lines = Vec::new();
            if social.mock {
                lines.push(Line::from(Span::styled(
                    "Demo data: no real interactions matched",
                    Style::default().fg(Color::Yellow),
                )));
            }
            lines.push(Line::from(format!(
                "{} ({})",
                social.tweet.author.display_name, social.tweet.author.handle
            )));
            lines.push(Line::from(social.tweet.text.clone()));
            lines.push(Line::from(format!(
                "Retweets: {} | Likes: {}",
                social.tweet.stats.retweets, social.tweet.stats.likes
            )));
            lines.push(Line::from(format!(
                "Fetched: {} followers, {} retweeters, {} likers",
                social.counts.follows, social.counts.retweets, social.counts.shares
            )));
            lines.push(Line::from(format!("Eligible: {}", social.users.len())));
            lines
        }
    };
    let widget = Paragraph::new(summary)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Tweet"));
    f.render_widget(widget, cols[0]);

    let winners: Vec<Line> = snap
        .social_winners
        .iter()
        .enumerate()
        .map(|(i, p)| Line::from(format!("#{} {} ({})", i + 1, p.handle, p.display_name)))
        .collect();
    let widget = Paragraph::new(winners)
        .block(Block::default().borders(Borders::ALL).title("Winners"));
    f.render_widget(widget, cols[1]);
}

fn game_line(game: &GameRecord, account: Option<Address>) -> String {
    let state = if game.completed {
        "done"
    } else if game.is_open() {
        "open"
    } else {
        "active"
    };
    let mine = match account {
        Some(a) if game.involves(a) => " *",
        _ => "",
    };
    format!("#{:<4} {:<6} creator {}{mine}", game.id, state, game.creator)
}

fn draw_battles_tab(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let account = snap.account.as_ref().map(|(_, address)| *address);
    let items: Vec<ListItem> = snap
        .games
        .iter()
        .map(|g| ListItem::new(game_line(g, account)))
        .collect();
    let title = match &snap.game_fee {
        Some(fee) => format!("Games (fee {fee})"),
        None => "Games (g to load)".to_string(),
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    if !snap.games.is_empty() {
        list_state.select(Some(state.selected_game));
    }
    f.render_stateful_widget(list, cols[0], &mut list_state);

    let mut lines = Vec::new();
    match snap.opened_pack {
        Some(pack) => {
            lines.push(Line::from(format!("Round: {}", pack.round)));
            lines.push(Line::from(format!("Token: #{}", pack.token_id)));
        }
        None => lines.push(Line::from("Press o to open a pack")),
    }
    if let Some(available) = snap.available_nfts {
        lines.push(Line::from(format!("NFTs left: {available}")));
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Pack"));
    f.render_widget(widget, cols[1]);
}

fn draw_stake_tab(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let (inputs, results) = split_inputs_and_results(area, 4);
    draw_inputs(f, state, inputs, Vec::new());

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(results);

    let symbol = &snap.provider.currency_symbol;
    let amount = state.inputs.stake_amount.trim().parse::<f64>().ok();
    let days = state.inputs.stake_days.trim().parse::<u32>().ok();
    let estimate = match (amount, days) {
        (Some(amount), Some(days)) if amount.is_finite() && amount > 0.0 => {
            let est = estimate_rewards(amount, days);
            vec![
                Line::from(format!("APY: {:.2}%", est.apy)),
                Line::from(format!("Reward: {:.4} {symbol}", est.reward)),
            ]
        }
        _ => vec![Line::from("Enter an amount and period")],
    };
    let widget = Paragraph::new(estimate)
        .block(Block::default().borders(Borders::ALL).title("Estimate"));
    f.render_widget(widget, cols[0]);

    let staked = match snap.stake {
        Some(position) => vec![
            Line::from(format!("{} {symbol} for {} days", position.amount, position.days)),
            Line::from(format!("APY: {:.2}%", position.estimate.apy)),
            Line::from(format!("Expected: {:.4} {symbol}", position.estimate.reward)),
        ],
        None => vec![Line::from("Nothing staked")],
    };
    let widget = Paragraph::new(staked)
        .block(Block::default().borders(Borders::ALL).title("Position"));
    f.render_widget(widget, cols[1]);
}

fn help_text(state: &UiState) -> &'static str {
    if state.mode == Mode::Editing {
        return "type to edit | Tab next field | Enter/Esc done";
    }
    match state.tab {
        Tab::Number => "e edit | Enter draw | y YOLO | v provider | ←/→ tabs | q quit",
        Tab::List => "e edit | Enter pick | v provider | ←/→ tabs | q quit",
        Tab::File => "e edit | Enter load | w draw | v provider | ←/→ tabs | q quit",
        Tab::Social => "e edit | f/r/l criteria | Enter fetch | w draw | ←/→ tabs | q quit",
        Tab::Battles => "↑/↓ select | g load | c create | j join | Enter view | o pack | q quit",
        Tab::Stake => "e edit | Enter stake | ←/→ tabs | q quit",
    }
}

fn draw_bottom(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let status_widget = if snap.errors.is_empty() {
        let mut lines: Vec<Line> = Vec::new();
        if snap.status.trim().is_empty() {
            lines.push(Line::from("Ready"));
        } else {
            for line in snap.status.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap.errors.iter().map(|e| Line::from(e.clone())).collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(status_widget, chunks[0]);

    let help = Paragraph::new(help_text(state))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[1]);
}

fn reveal_lines(reveal: &RevealView) -> Vec<Line<'static>> {
    let game = &reveal.game;
    let mut lines = vec![
        Line::from(format!("Creator {}", game.creator)),
        Line::from(format!("Player  {}", game.player)),
        Line::from(""),
    ];
    match reveal.phase {
        RevealPhase::Reveal => {
            lines.push(Line::from("Revealing cards..."));
        }
        RevealPhase::Battle => {
            lines.push(Line::from(format!(
                "Card #{}  vs  Card #{}",
                game.creator_nft_index, game.player_nft_index
            )));
            lines.push(Line::from("Battling..."));
        }
        RevealPhase::Result => {
            lines.push(Line::from(format!(
                "Card #{}  vs  Card #{}",
                game.creator_nft_index, game.player_nft_index
            )));
            let winner = game
                .winner()
                .map(|w| format!("Winner: {w}"))
                .unwrap_or_else(|| "No winner yet".to_string());
            lines.push(Line::from(Span::styled(
                winner,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            match reveal.winner_is_account {
                Some(true) => lines.push(Line::from(Span::styled(
                    "You won!",
                    Style::default().fg(Color::Green),
                ))),
                Some(false) => lines.push(Line::from(Span::styled(
                    "You lost",
                    Style::default().fg(Color::Red),
                ))),
                None => {}
            }
        }
    }
    lines
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match state.mode {
        Mode::GameDetail(id) => {
            let area = centered_rect(60, 40, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!("Game #{id} (Esc to close)"));
            let lines = match &snap.reveal {
                Some(reveal) if reveal.game.id == id => reveal_lines(reveal),
                _ => vec![Line::from("Waiting for the game to finish...")],
            };
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(
                Paragraph::new(lines).alignment(Alignment::Center),
                block.inner(area),
            );
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal | Mode::Editing => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}
