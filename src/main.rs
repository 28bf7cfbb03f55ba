use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use snake_engine::config::{EngineConfig, MIN_TICK_INTERVAL_MS, Ruleset};
use snake_engine::high_score::{HighScores, load_high_scores, save_high_scores, scores_path};
use snake_engine::input::GameInput;
use snake_engine::keys::poll_input;
use snake_engine::session::{GameSession, GameStatus};
use snake_engine::terminal_runtime::{TerminalSession, install_panic_hook};
use snake_engine::ui::hud::HudInfo;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Built-in rule set to play.
    #[arg(long, value_enum, default_value_t = Ruleset::Classic)]
    ruleset: Ruleset,
    /// JSON rule file; overrides --ruleset.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for reproducible food and power-up placement.
    #[arg(long)]
    seed: Option<u64>,
    /// Board width in cells.
    #[arg(long)]
    width: Option<u16>,
    /// Board height in cells.
    #[arg(long)]
    height: Option<u16>,
    /// Write debug logs to this file.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
    /// Neither load nor save high scores.
    #[arg(long = "no-persist")]
    no_persist: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let (ruleset_name, config) = resolve_config(&cli)?;
    let scores_file = (!cli.no_persist).then(scores_path);
    let mut high_scores = match &scores_file {
        Some(path) => load_high_scores(path).unwrap_or_else(|error| {
            eprintln!("Ignoring unreadable high score file {}: {error}", path.display());
            HighScores::default()
        }),
        None => HighScores::default(),
    };

    let mut session = GameSession::new(config)?.with_high_score(high_scores.get(&ruleset_name));

    install_panic_hook();
    let mut terminal = TerminalSession::enter()?;
    run(
        &mut terminal,
        &mut session,
        &ruleset_name,
        &mut high_scores,
        scores_file.as_deref(),
    )?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<(String, EngineConfig), Box<dyn Error>> {
    let (name, mut config) = match &cli.config {
        Some(path) => {
            let stem = path
                .file_stem()
                .map_or_else(|| "custom".to_owned(), |stem| stem.to_string_lossy().into_owned());
            (format!("custom:{stem}"), EngineConfig::from_json_file(path)?)
        }
        None => {
            let name = cli
                .ruleset
                .to_possible_value()
                .map_or_else(|| "classic".to_owned(), |value| value.get_name().to_owned());
            (name, cli.ruleset.config())
        }
    };

    if let Some(width) = cli.width {
        config.grid.width = width;
    }
    if let Some(height) = cli.height {
        config.grid.height = height;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;
    Ok((name, config))
}

fn run(
    terminal: &mut TerminalSession,
    session: &mut GameSession,
    ruleset_name: &str,
    high_scores: &mut HighScores,
    scores_file: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut previous_high_score = session.score().high_score();
    let mut last_status = session.status();
    let mut last_tick = Instant::now();

    loop {
        let snapshot = session.snapshot();
        terminal.draw(
            &snapshot,
            &HudInfo {
                ruleset: ruleset_name,
                previous_high_score,
            },
        )?;

        let interval = tick_interval_for_speed(snapshot.speed);
        let timeout = interval.saturating_sub(last_tick.elapsed());
        if let Some(input) = poll_input(timeout)? {
            if input == GameInput::Quit {
                break;
            }
            session.apply_input(input);
        }

        let since_tick = last_tick.elapsed();
        if since_tick >= interval {
            session.tick(since_tick);
            last_tick = Instant::now();
        }

        let status = session.status();
        if status != last_status {
            match status {
                GameStatus::GameOver => {
                    let score = session.score().score();
                    if high_scores.record(ruleset_name, score) {
                        if let Some(path) = scores_file {
                            if let Err(error) = save_high_scores(path, high_scores) {
                                warn!(%error, "failed to save high score");
                            }
                        }
                    }
                }
                GameStatus::Playing if last_status == GameStatus::GameOver => {
                    previous_high_score = session.score().high_score();
                }
                _ => {}
            }
            last_status = status;
        }
    }

    info!("quit requested");
    Ok(())
}

fn tick_interval_for_speed(speed: f32) -> Duration {
    let interval = Duration::from_secs_f32(1.0 / speed.max(1.0));
    interval.max(Duration::from_millis(MIN_TICK_INTERVAL_MS))
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}
