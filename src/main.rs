//! Humble Heroes CLI
//!
//! Terminal front end for the superhero leaderboard:
//! - List the leaderboard
//! - Add a hero
//! - Watch new heroes arrive live
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use humble_heroes::config::{generate_default_config, Config, LoggingConfig};
use humble_heroes::hero::{FormField, HeroEntry, HeroForm, SUBMIT_FAILED_MESSAGE};
use humble_heroes::session::{LeaderboardSession, SessionEvent, SessionOptions, SubmitError};
use humble_heroes::HttpHeroApi;

#[derive(Parser)]
#[command(name = "heroes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Humble Superhero leaderboard")]
#[command(long_about = "Rank superheroes by humility.\nList the leaderboard, add heroes, and watch new ones arrive live.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API origin (overrides config and HEROES_API_BASE_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: platform config dir, then ./heroes.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the leaderboard, most humble first
    List,

    /// Add a hero
    Add {
        /// Hero name
        name: String,
        /// Superpower
        superpower: String,
        /// Humility score, 1 to 10 (decimals allowed)
        score: String,
    },

    /// Show the leaderboard and follow new heroes as they are added
    Watch,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.apply_overrides(|key| (key == "HEROES_API_BASE_URL").then(|| url.clone()));
    }

    init_logging(&config.logging);
    tracing::debug!(base_url = %config.api.base_url, "Humble Heroes v{}", env!("CARGO_PKG_VERSION"));

    let api = HttpHeroApi::new(&config.api.base_url, config.api.request_timeout())
        .context("Failed to build HTTP client")?;

    match cli.command {
        Commands::List => {
            let session = LeaderboardSession::new(api, SessionOptions::default());
            if let Err(e) = session.load().await {
                anyhow::bail!(
                    "Cannot load the leaderboard from {}: {}",
                    config.api.base_url,
                    e
                );
            }
            print_table(&session.sorted().await);
        }

        Commands::Add {
            name,
            superpower,
            score,
        } => {
            let mut form = HeroForm::new();
            form.set_field(FormField::Name, name);
            form.set_field(FormField::Superpower, superpower);
            form.set_field(FormField::HumilityScore, score);

            let options = SessionOptions::default().refresh_delay(config.api.refresh_delay());
            let mut session = LeaderboardSession::new(api, options);
            let mut events = session.subscribe();

            match session.submit(&mut form).await {
                Ok(hero) => println!("Added {} ({})", hero.name, hero.superpower),
                Err(SubmitError::Validation(e)) => anyhow::bail!("{}", e),
                Err(SubmitError::Api(e)) => {
                    anyhow::bail!("{}\n{}", SUBMIT_FAILED_MESSAGE, e)
                }
            }

            // The refresh runs on its own after the delay
            let wait = config.api.refresh_delay() + config.api.request_timeout() + Duration::from_secs(1);
            match tokio::time::timeout(wait, next_load(&mut events)).await {
                Ok(true) => print_table(&session.sorted().await),
                Ok(false) => eprintln!("Hero added, but the leaderboard could not be refreshed"),
                Err(_) => eprintln!("Hero added, but the refresh timed out"),
            }
            session.unmount().await;
        }

        Commands::Watch => watch(api, &config).await?,

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for the leaderboard
    if config.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Wait for the next load outcome; `true` if it succeeded
async fn next_load(events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> bool {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Loaded { .. }) => return true,
            Ok(SessionEvent::LoadFailed { .. }) => return false,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return false,
        }
    }
}

async fn watch(api: HttpHeroApi, config: &Config) -> anyhow::Result<()> {
    let mut options = SessionOptions::default().refresh_delay(config.api.refresh_delay());
    if config.push.enabled {
        options = options.push(config.push_config());
    } else {
        eprintln!("Live updates are disabled in the config");
    }

    let mut session = LeaderboardSession::new(api, options);
    let mut events = session.subscribe();
    session.mount();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                println!("Stopping...");
                break;
            }
            event = events.recv() => {
                match event {
                    Ok(SessionEvent::Loaded { .. }) => print_table(&session.sorted().await),
                    Ok(SessionEvent::LoadFailed { error }) => {
                        eprintln!("Cannot load the leaderboard from {}: {}", config.api.base_url, error);
                    }
                    Ok(SessionEvent::HeroPushed(hero)) => print_pushed(&hero),
                    Ok(SessionEvent::PushStatus { connected: true, .. }) => {
                        println!("Live updates connected");
                    }
                    Ok(SessionEvent::PushStatus { connected: false, detail }) => {
                        eprintln!("Live updates disconnected: {}", detail);
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Watch output fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    session.unmount().await;
    Ok(())
}

fn print_table(heroes: &[HeroEntry]) {
    if heroes.is_empty() {
        println!("No superheroes yet.");
        println!();
        println!("Add the first one with:");
        println!("  heroes add \"Quiet Quill\" Editing 9.5");
        return;
    }

    println!(
        "{:<5} {:<24} {:<24} {:>6}  {}",
        "Rank", "Name", "Superpower", "Score", "Humility"
    );
    println!("{}", "-".repeat(72));

    for (i, hero) in heroes.iter().enumerate() {
        println!(
            "{:<5} {:<24} {:<24} {:>6}  {}",
            i + 1,
            truncate(&hero.name, 24),
            truncate(&hero.superpower, 24),
            hero.score_label(),
            hero.rating()
        );
    }
}

fn print_pushed(hero: &HeroEntry) {
    println!(
        "[{}] New hero: {} ({}) {} {}",
        chrono::Local::now().format("%H:%M:%S"),
        hero.name,
        hero.superpower,
        hero.score_label(),
        hero.rating()
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
