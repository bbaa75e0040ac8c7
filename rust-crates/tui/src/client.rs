use crate::ui;
use alloy::primitives::{
    Address,
    U256,
    utils::format_ether,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use crossterm::event::Event;
use providers::{
    ProviderEntry,
    ProviderRegistry,
    ProviderStore,
    load_registry,
};
use randomness::{
    aggregator::Criteria,
    file_rows::parse_rows,
    games::{
        GameRecord,
        OpenedPack,
        PackBattlesClient,
        PackOpeningClient,
        read_provider,
        signing_provider,
        yolo_roll,
    },
    oracle::{
        RandomnessClient,
        RandomnessOracle,
    },
    participant::Participant,
    staking::{
        StakePosition,
        stake,
    },
    winners::{
        draw_items,
        select_winners,
    },
};
use randomness_tui::{
    animation::{
        BattleReveal,
        RevealPhase,
        YoloRoll,
    },
    social_client::{
        SocialClient,
        SocialSummary,
    },
    wallets::{
        self,
        UnlockedWallet,
    },
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::{
        Duration,
        Instant,
    },
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const ANIMATION_TICK: Duration = Duration::from_millis(200);
const MAX_ERRORS: usize = 50;

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider_id: Option<String>,
    pub providers_file: Option<String>,
    pub server_url: String,
    pub wallet: Option<WalletConfig>,
}

#[derive(Clone, Debug)]
pub struct YoloView {
    pub rolling: bool,
    pub roll: Option<u64>,
    pub label: Option<&'static str>,
}

#[derive(Clone, Debug)]
pub struct RevealView {
    pub game: GameRecord,
    pub phase: RevealPhase,
    pub winner_is_account: Option<bool>,
}

/// Everything the UI renders, captured at one instant.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub provider: ProviderEntry,
    pub account: Option<(String, Address)>,
    pub status: String,
    pub errors: Vec<String>,
    pub number: Option<u64>,
    pub yolo: Option<YoloView>,
    pub list_pick: Option<String>,
    pub file_name: Option<String>,
    pub file_rows: Vec<String>,
    pub file_winners: Vec<String>,
    pub social: Option<SocialSummary>,
    pub social_winners: Vec<Participant>,
    pub games: Vec<GameRecord>,
    pub game_fee: Option<String>,
    pub opened_pack: Option<OpenedPack>,
    pub available_nfts: Option<u64>,
    pub reveal: Option<RevealView>,
    pub stake: Option<StakePosition>,
}

pub struct AppController {
    oracle: RandomnessClient,
    social: SocialClient,
    wallet: Option<UnlockedWallet>,
    status: String,
    errors: Vec<String>,
    number: Option<u64>,
    yolo: Option<YoloRoll>,
    list_pick: Option<String>,
    file_name: Option<String>,
    file_rows: Vec<String>,
    file_winners: Vec<String>,
    social_summary: Option<SocialSummary>,
    social_winners: Vec<Participant>,
    games: Vec<GameRecord>,
    game_fee: Option<U256>,
    opened_pack: Option<OpenedPack>,
    available_nfts: Option<u64>,
    reveal: Option<BattleReveal>,
    stake: Option<StakePosition>,
}

impl AppController {
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = match config.providers_file.as_deref() {
            Some(raw) => ProviderStore::from_user_path(raw),
            None => ProviderStore::default_location(),
        };
        let registry = load_registry(&store).map_err(|e| eyre!("{e:#}"))?;
        let oracle = match config.provider_id.as_deref() {
            Some(id) => RandomnessClient::with_provider(registry, id)
                .wrap_err_with(|| format!("selecting oracle provider '{id}'"))?,
            None => RandomnessClient::new(registry),
        };
        let social = SocialClient::new(config.server_url)?;
        let wallet = match config.wallet {
            Some(WalletConfig { name, dir }) => {
                let descriptor = wallets::find_wallet(&dir, &name)?;
                Some(wallets::unlock_wallet(&descriptor)?)
            }
            None => None,
        };
        let status = format!("Connected to {}", oracle.provider().name);
        Ok(Self {
            oracle,
            social,
            wallet,
            status,
            errors: Vec::new(),
            number: None,
            yolo: None,
            list_pick: None,
            file_name: None,
            file_rows: Vec::new(),
            file_winners: Vec::new(),
            social_summary: None,
            social_winners: Vec::new(),
            games: Vec::new(),
            game_fee: None,
            opened_pack: None,
            available_nfts: None,
            reveal: None,
            stake: None,
        })
    }

    fn registry(&self) -> &ProviderRegistry {
        self.oracle.registry()
    }

    pub fn build_snapshot(&self, now: Instant) -> AppSnapshot {
        let account = self.wallet.as_ref().map(|w| (w.name.clone(), w.address));
        let yolo = self.yolo.as_ref().map(|roll| {
            let verdict = roll.visible_verdict(now);
            YoloView {
                rolling: roll.is_rolling(now),
                roll: verdict.map(|v| v.roll),
                label: verdict.map(|v| v.label()),
            }
        });
        let reveal = self.reveal.as_ref().map(|reveal| RevealView {
            game: reveal.game.clone(),
            phase: reveal.phase(now),
            winner_is_account: account.as_ref().and_then(|(_, address)| {
                if !reveal.game.involves(*address) {
                    return None;
                }
                reveal.game.winner().map(|w| w == *address)
            }),
        });
        AppSnapshot {
            provider: self.oracle.provider().clone(),
            account,
            status: self.status.clone(),
            errors: self.errors.clone(),
            number: self.number,
            yolo,
            list_pick: self.list_pick.clone(),
            file_name: self.file_name.clone(),
            file_rows: self.file_rows.clone(),
            file_winners: self.file_winners.clone(),
            social: self.social_summary.clone(),
            social_winners: self.social_winners.clone(),
            games: self.games.clone(),
            game_fee: self.game_fee.map(|fee| {
                format!("{} {}", format_ether(fee), self.oracle.provider().currency_symbol)
            }),
            opened_pack: self.opened_pack,
            available_nfts: self.available_nfts,
            reveal,
            stake: self.stake,
        }
    }

    pub fn has_running_animation(&self, now: Instant) -> bool {
        let yolo = self.yolo.as_ref().is_some_and(|roll| roll.is_rolling(now));
        let reveal = self.reveal.as_ref().is_some_and(|r| r.is_running(now));
        yolo || reveal
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.errors.clear();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    pub fn cycle_provider(&mut self) -> Result<()> {
        let current = self.oracle.provider().id.clone();
        let next = self.registry().next_after(&current).id.clone();
        let entry = self.oracle.select_provider(&next)?;
        let message = format!("Switched to {} on {}", entry.name, entry.chain_name);
        self.games.clear();
        self.game_fee = None;
        self.reveal = None;
        self.set_status(message);
        Ok(())
    }

    pub async fn draw_number(&mut self, min: u64, max: u64) -> Result<()> {
        let value = self.oracle.random_in_range(min, max).await?;
        self.number = Some(value);
        self.set_status(format!("Random number between {min} and {max}: {value}"));
        Ok(())
    }

    pub async fn yolo(&mut self) -> Result<()> {
        self.yolo = Some(YoloRoll::start(Instant::now()));
        let verdict = match yolo_roll(&mut self.oracle).await {
            Ok(verdict) => verdict,
            Err(err) => {
                self.yolo = None;
                return Err(err.into());
            }
        };
        if let Some(roll) = self.yolo.as_mut() {
            roll.settle(verdict);
        }
        let message = format!("YOLO roll from {}", self.oracle.provider().name);
        self.set_status(message);
        Ok(())
    }

    pub async fn pick_from_list(&mut self, raw: &str) -> Result<()> {
        let items = split_list_items(raw);
        let picked = self.oracle.random_pick(&items).await?;
        self.set_status(format!("Picked '{picked}' from {} items", items.len()));
        self.list_pick = Some(picked);
        Ok(())
    }

    pub fn load_file(&mut self, raw_path: &str) -> Result<()> {
        let path = PathBuf::from(shellexpand::tilde(raw_path.trim()).into_owned());
        let bytes = std::fs::read(&path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        let file_name = file_name_of(&path);
        let rows = parse_rows(&file_name, &bytes)?;
        if rows.is_empty() {
            return Err(eyre!("{file_name} contains no entries"));
        }
        self.set_status(format!("Loaded {} entries from {file_name}", rows.len()));
        self.file_name = Some(file_name);
        self.file_rows = rows;
        self.file_winners.clear();
        Ok(())
    }

    pub async fn pick_file_winners(&mut self, count: usize) -> Result<()> {
        if self.file_rows.is_empty() {
            return Err(eyre!("Load a file first"));
        }
        let winners = draw_items(&mut self.oracle, &self.file_rows, count).await?;
        self.set_status(format!("Selected {} of {} entries", winners.len(), self.file_rows.len()));
        self.file_winners = winners;
        Ok(())
    }

    pub async fn fetch_social(&mut self, tweet_url: &str, criteria: Criteria) -> Result<()> {
        criteria.validate()?;
        let summary = self.social.fetch_interactions(tweet_url, criteria).await?;
        let mut message = format!(
            "{} eligible participants for tweet by {}",
            summary.users.len(),
            summary.tweet.author.handle
        );
        if summary.mock {
            message.push_str(" (demo data)");
        }
        self.set_status(message);
        self.social_summary = Some(summary);
        self.social_winners.clear();
        Ok(())
    }

    pub async fn draw_social_winners(&mut self, count: usize) -> Result<()> {
        let pool = self
            .social_summary
            .as_ref()
            .map(|summary| summary.users.clone())
            .ok_or_else(|| eyre!("Fetch interactions first"))?;
        let winners = select_winners(&mut self.oracle, &pool, count).await?;
        self.set_status(format!("Selected {} winners", winners.len()));
        self.social_winners = winners;
        Ok(())
    }

    fn signer(&self) -> Result<&UnlockedWallet> {
        self.wallet
            .as_ref()
            .ok_or_else(|| eyre!("Start with --wallet <name> to send transactions"))
    }

    fn battles_reader(&self) -> Result<PackBattlesClient> {
        let entry = self.oracle.provider();
        Ok(PackBattlesClient::from_entry(entry, read_provider(entry)?)?)
    }

    fn battles_writer(&self) -> Result<PackBattlesClient> {
        let entry = self.oracle.provider();
        let wallet = self.signer()?.wallet.clone();
        Ok(PackBattlesClient::from_entry(entry, signing_provider(entry, wallet)?)?)
    }

    pub async fn refresh_games(&mut self) -> Result<()> {
        let battles = self.battles_reader()?;
        let fee = battles.game_fee().await?;
        let games = battles.games().await?;
        let open = games.iter().filter(|g| g.is_open()).count();
        self.set_status(format!("{} games, {open} open", games.len()));
        self.games = games;
        self.game_fee = Some(fee);
        Ok(())
    }

    pub async fn create_game(&mut self) -> Result<()> {
        let id = self.battles_writer()?.create_game().await?;
        self.set_status(format!("Created game #{id}; waiting for an opponent"));
        self.refresh_games().await
    }

    pub async fn join_game(&mut self, id: u64) -> Result<()> {
        let game = self
            .games
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| eyre!("Unknown game #{id}"))?;
        if !game.is_open() {
            return Err(eyre!("Game #{id} is not open"));
        }
        if self.wallet.as_ref().is_some_and(|w| game.creator == w.address) {
            return Err(eyre!("You cannot join your own game"));
        }
        self.battles_writer()?.join_game(id).await?;
        self.refresh_games().await?;
        self.show_game(id).await
    }

    pub async fn show_game(&mut self, id: u64) -> Result<()> {
        let game = self.battles_reader()?.game(id).await?;
        if game.completed {
            self.reveal = Some(BattleReveal::new(game, Instant::now()));
            self.set_status(format!("Revealing game #{id}"));
        } else {
            self.reveal = None;
            self.set_status(format!("Game #{id} has not finished yet"));
        }
        Ok(())
    }

    pub fn close_game(&mut self) {
        self.reveal = None;
    }

    pub async fn open_pack(&mut self) -> Result<()> {
        let entry = self.oracle.provider();
        let wallet = self.signer()?.wallet.clone();
        let packs = PackOpeningClient::from_entry(entry, signing_provider(entry, wallet)?)?;
        let pack = packs.open_pack().await?;
        let available = packs.available_nfts().await?;
        self.set_status(format!(
            "Pack opened in round {}: token #{}",
            pack.round, pack.token_id
        ));
        self.opened_pack = Some(pack);
        self.available_nfts = Some(available);
        Ok(())
    }

    pub fn stake(&mut self, amount: f64, days: u32) -> Result<()> {
        let position = stake(amount, days)?;
        self.set_status(format!(
            "Staked {amount} {} for {days} days (simulated)",
            self.oracle.provider().currency_symbol
        ));
        self.stake = Some(position);
        Ok(())
    }
}

/// Items separated by commas or newlines, trimmed, blanks dropped.
pub fn split_list_items(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Logs go to a file: the terminal belongs to the UI.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("creating log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, "randomness-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let controller = AppController::new(config)?;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    tracing::info!("UI ready");
    let res = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

fn redraw(controller: &AppController, ui_state: &mut ui::UiState, context: &'static str) -> Result<()> {
    let snapshot = controller.build_snapshot(Instant::now());
    ui::draw(ui_state, &snapshot).wrap_err(context)
}

fn show_processing_status(
    controller: &mut AppController,
    ui_state: &mut ui::UiState,
    message: impl Into<String>,
    context: &'static str,
) -> Result<()> {
    controller.set_status(message);
    redraw(controller, ui_state, context)
}

fn report_failure(controller: &mut AppController, action: &str, err: impl std::fmt::Display) {
    controller.push_errors(vec![format!("{action} failed: {err}")]);
}

async fn run_loop(
    mut controller: AppController,
    ui_state: &mut ui::UiState,
    input_events: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    tracing::info!("Running app loop");
    let mut ticker = time::interval(ANIMATION_TICK);
    let mut animating = false;
    redraw(&controller, ui_state, "initial draw failed")?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let running = controller.has_running_animation(Instant::now());
                // one more frame after an animation ends shows its final state
                if running || animating {
                    redraw(&controller, ui_state, "draw during animation failed")?;
                }
                animating = running;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                let outcome = match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => Ok(()),
                    ui::UserEvent::InvalidInput(message) => {
                        controller.push_errors(vec![message]);
                        Ok(())
                    }
                    ui::UserEvent::CycleProvider => controller
                        .cycle_provider()
                        .map_err(|e| ("Switching provider", e)),
                    ui::UserEvent::DrawNumber { min, max } => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Requesting random number...",
                            "draw while requesting number failed",
                        )?;
                        controller
                            .draw_number(min, max)
                            .await
                            .map_err(|e| ("Random number", e))
                    }
                    ui::UserEvent::YoloRoll => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Rolling...",
                            "draw while rolling failed",
                        )?;
                        controller.yolo().await.map_err(|e| ("YOLO roll", e))
                    }
                    ui::UserEvent::PickFromList(raw) => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Picking from list...",
                            "draw while picking from list failed",
                        )?;
                        controller
                            .pick_from_list(&raw)
                            .await
                            .map_err(|e| ("List pick", e))
                    }
                    ui::UserEvent::LoadFile(path) => controller
                        .load_file(&path)
                        .map_err(|e| ("Loading file", e)),
                    ui::UserEvent::PickFileWinners(count) => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            format!("Drawing {count} entries..."),
                            "draw while drawing file entries failed",
                        )?;
                        controller
                            .pick_file_winners(count)
                            .await
                            .map_err(|e| ("File draw", e))
                    }
                    ui::UserEvent::FetchSocial { tweet_url, criteria } => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Fetching interactions...",
                            "draw while fetching interactions failed",
                        )?;
                        controller
                            .fetch_social(&tweet_url, criteria)
                            .await
                            .map_err(|e| ("Fetching interactions", e))
                    }
                    ui::UserEvent::DrawSocialWinners(count) => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            format!("Selecting {count} winners..."),
                            "draw while selecting winners failed",
                        )?;
                        controller
                            .draw_social_winners(count)
                            .await
                            .map_err(|e| ("Winner selection", e))
                    }
                    ui::UserEvent::RefreshGames => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Loading games...",
                            "draw while loading games failed",
                        )?;
                        controller
                            .refresh_games()
                            .await
                            .map_err(|e| ("Loading games", e))
                    }
                    ui::UserEvent::CreateGame => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Creating game...",
                            "draw while creating game failed",
                        )?;
                        controller
                            .create_game()
                            .await
                            .map_err(|e| ("Creating game", e))
                    }
                    ui::UserEvent::JoinGame(id) => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            format!("Joining game #{id}..."),
                            "draw while joining game failed",
                        )?;
                        controller
                            .join_game(id)
                            .await
                            .map_err(|e| ("Joining game", e))
                    }
                    ui::UserEvent::ShowGame(id) => controller
                        .show_game(id)
                        .await
                        .map_err(|e| ("Loading game", e)),
                    ui::UserEvent::CloseGame => {
                        controller.close_game();
                        Ok(())
                    }
                    ui::UserEvent::OpenPack => {
                        show_processing_status(
                            &mut controller,
                            ui_state,
                            "Opening pack...",
                            "draw while opening pack failed",
                        )?;
                        controller
                            .open_pack()
                            .await
                            .map_err(|e| ("Opening pack", e))
                    }
                    ui::UserEvent::Stake { amount, days } => controller
                        .stake(amount, days)
                        .map_err(|e| ("Staking", e)),
                };
                if let Err((action, err)) = outcome {
                    report_failure(&mut controller, action, err);
                }
                redraw(&controller, ui_state, "draw after event failed")?;
            }
        }
    }
    Ok(())
}
