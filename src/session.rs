//! Leaderboard Session
//!
//! Native counterpart of the leaderboard page: loads the sorted list, follows
//! the push channel into the recent list, and submits new heroes with a
//! delayed refresh. Every completion is checked against the session's
//! liveness so nothing lands after unmount.
//!
//! # Example
//!
//! ```rust,no_run
//! use humble_heroes::api::HttpHeroApi;
//! use humble_heroes::push::PushConfig;
//! use humble_heroes::session::{LeaderboardSession, SessionEvent, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let base = "http://localhost:3000";
//!     let api = HttpHeroApi::new(base, std::time::Duration::from_secs(10))?;
//!     let mut session = LeaderboardSession::new(api, SessionOptions::default().push(PushConfig::new(base)));
//!     let mut events = session.subscribe();
//!     session.mount();
//!
//!     while let Ok(event) = events.recv().await {
//!         if let SessionEvent::HeroPushed(hero) = event {
//!             println!("new hero: {}", hero.name);
//!         }
//!     }
//!     session.unmount().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use crate::api::{ApiError, HeroApi};
use crate::hero::{HeroEntry, HeroForm, NewHero, ValidationError};
use crate::leaderboard::{Leaderboard, Liveness, REFRESH_DELAY_MS};
use crate::push::{PushChannel, PushConfig, PushEvent, PushEvents};

/// Something the view should re-render for
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The sorted list was replaced
    Loaded { count: usize },
    /// A load failed; the previous list stays
    LoadFailed { error: String },
    /// A hero arrived over the push channel and is now first in the recent list
    HeroPushed(HeroEntry),
    /// Push channel came up or went down
    PushStatus { connected: bool, detail: String },
    /// The server accepted a new hero
    Submitted(NewHero),
    /// The server (or network) refused a new hero
    SubmitFailed { error: String },
}

/// Why a submission did not go through
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Wait between a successful submission and the refresh load
    pub refresh_delay: Duration,
    /// Push channel to follow; `None` skips live updates
    pub push: Option<PushConfig>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            refresh_delay: Duration::from_millis(REFRESH_DELAY_MS),
            push: None,
        }
    }
}

impl SessionOptions {
    pub fn refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn push(mut self, config: PushConfig) -> Self {
        self.push = Some(config);
        self
    }
}

/// One mounted leaderboard view
pub struct LeaderboardSession<A: HeroApi + 'static> {
    api: Arc<A>,
    board: Arc<RwLock<Leaderboard>>,
    liveness: Liveness,
    events: broadcast::Sender<SessionEvent>,
    options: SessionOptions,
    push: Option<PushChannel>,
    tasks: Vec<JoinHandle<()>>,
}

impl<A: HeroApi + 'static> LeaderboardSession<A> {
    /// Create an idle session. Nothing is fetched until [`mount`](Self::mount)
    /// or an explicit [`load`](Self::load).
    pub fn new(api: A, options: SessionOptions) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api: Arc::new(api),
            board: Arc::new(RwLock::new(Leaderboard::new())),
            liveness: Liveness::new(),
            events,
            options,
            push: None,
            tasks: Vec::new(),
        }
    }

    /// Listen for state changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Shared handle to the leaderboard state
    pub fn board(&self) -> Arc<RwLock<Leaderboard>> {
        Arc::clone(&self.board)
    }

    pub async fn sorted(&self) -> Vec<HeroEntry> {
        self.board.read().await.sorted().to_vec()
    }

    pub async fn recent(&self) -> Vec<HeroEntry> {
        self.board.read().await.recent_vec()
    }

    pub fn is_mounted(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Start the initial load and open the push channel (once)
    pub fn mount(&mut self) {
        if !self.liveness.is_alive() {
            tracing::warn!("Ignoring mount of an unmounted session");
            return;
        }

        let task = tokio::spawn(self.load_task());
        self.tasks.push(task);

        if self.push.is_none() {
            if let Some(config) = self.options.push.clone() {
                let (channel, push_events) = PushChannel::open(config);
                self.push = Some(channel);
                let task = tokio::spawn(forward_push_events(
                    push_events,
                    Arc::clone(&self.board),
                    self.liveness.clone(),
                    self.events.clone(),
                ));
                self.tasks.push(task);
            }
        }
    }

    /// Load now and wait for the result
    pub async fn load(&self) -> Result<usize, ApiError> {
        load_into(
            self.api.as_ref(),
            &self.board,
            &self.liveness,
            &self.events,
        )
        .await
    }

    fn load_task(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let api = Arc::clone(&self.api);
        let board = Arc::clone(&self.board);
        let liveness = self.liveness.clone();
        let events = self.events.clone();
        async move {
            // Failures are already logged and published
            let _ = load_into(api.as_ref(), &board, &liveness, &events).await;
        }
    }

    /// Validate and submit the form. Validation failures never reach the
    /// network. On success the form is cleared and a refresh is scheduled
    /// after the refresh delay; on failure the form keeps its values.
    pub async fn submit(&mut self, form: &mut HeroForm) -> Result<NewHero, SubmitError> {
        let hero = form.prepare_submit()?;

        match self.api.create_hero(&hero).await {
            Ok(()) => {
                tracing::info!(name = %hero.name, score = hero.humility_score, "Superhero added");
                form.submit_succeeded();
                let _ = self.events.send(SessionEvent::Submitted(hero.clone()));
                self.schedule_refresh();
                Ok(hero)
            }
            Err(e) => {
                tracing::error!(error = %e, name = %hero.name, "Failed to add superhero");
                form.submit_failed();
                let _ = self.events.send(SessionEvent::SubmitFailed {
                    error: e.to_string(),
                });
                Err(SubmitError::Api(e))
            }
        }
    }

    fn schedule_refresh(&mut self) {
        self.tasks.retain(|t| !t.is_finished());

        let delay = self.options.refresh_delay;
        let load = self.load_task();
        let liveness = self.liveness.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if liveness.is_alive() {
                load.await;
            }
        });
        self.tasks.push(task);
    }

    /// Tear the view down: stop accepting results, close the push channel
    /// (exactly once) and cancel outstanding work.
    pub async fn unmount(mut self) {
        if !self.liveness.dispose() {
            return;
        }
        if let Some(channel) = self.push.take() {
            channel.close().await;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::debug!("Leaderboard session unmounted");
    }
}

impl<A: HeroApi + 'static> Drop for LeaderboardSession<A> {
    fn drop(&mut self) {
        self.liveness.dispose();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        // PushChannel aborts its own task on drop
    }
}

/// Fetch, sort and apply one load, unless the view is gone by the time the
/// response arrives.
async fn load_into<A: HeroApi + ?Sized>(
    api: &A,
    board: &RwLock<Leaderboard>,
    liveness: &Liveness,
    events: &broadcast::Sender<SessionEvent>,
) -> Result<usize, ApiError> {
    let ticket = board.write().await.begin_load();

    match api.list_heroes().await {
        Ok(heroes) => {
            if !liveness.is_alive() {
                return Ok(0);
            }
            let count = heroes.len();
            if board.write().await.finish_load(ticket, heroes) {
                tracing::debug!(count, ticket = ticket.sequence(), "Leaderboard loaded");
                let _ = events.send(SessionEvent::Loaded { count });
            }
            Ok(count)
        }
        Err(e) => {
            if liveness.is_alive() {
                tracing::error!(error = %e, "Failed to load superheroes");
                let _ = events.send(SessionEvent::LoadFailed {
                    error: e.to_string(),
                });
            }
            Err(e)
        }
    }
}

async fn forward_push_events(
    mut push_events: PushEvents,
    board: Arc<RwLock<Leaderboard>>,
    liveness: Liveness,
    events: broadcast::Sender<SessionEvent>,
) {
    while let Some(event) = push_events.recv().await {
        if !liveness.is_alive() {
            break;
        }
        match event {
            PushEvent::NewHero(hero) => {
                tracing::info!(name = %hero.name, "New superhero pushed");
                board.write().await.push_recent(hero.clone());
                let _ = events.send(SessionEvent::HeroPushed(hero));
            }
            PushEvent::Connected { sid } => {
                let _ = events.send(SessionEvent::PushStatus {
                    connected: true,
                    detail: sid,
                });
            }
            PushEvent::Disconnected { reason } => {
                tracing::warn!(reason = %reason, "Push channel disconnected");
                let _ = events.send(SessionEvent::PushStatus {
                    connected: false,
                    detail: reason,
                });
            }
        }
    }
}
