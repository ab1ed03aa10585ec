//! Global Page State
//!
//! Reactive state for the leaderboard page using Leptos signals. Every async
//! completion checks the page's liveness first, so a response that arrives
//! after the page is torn down changes nothing.

use leptos::*;

use humble_heroes::{
    FormField, HeroEntry, HeroForm, Leaderboard, Liveness, LoadTicket, REFRESH_DELAY_MS,
};

use crate::api;

/// Global page state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Sorted leaderboard and recent arrivals
    pub board: RwSignal<Leaderboard>,
    /// Submission form
    pub form: RwSignal<HeroForm>,
    /// Push channel status
    pub connected: RwSignal<bool>,
    /// A submission is in flight
    pub submitting: RwSignal<bool>,
    /// Error message (for toasts)
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
    /// Cleared when the page unmounts
    pub liveness: Liveness,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        board: create_rw_signal(Leaderboard::new()),
        form: create_rw_signal(HeroForm::new()),
        connected: create_rw_signal(false),
        submitting: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
        liveness: Liveness::new(),
    };

    provide_context(state);
}

impl GlobalState {
    /// Fetch the leaderboard and replace the sorted list. Failures are
    /// logged and leave the current list alone.
    pub fn load(&self) {
        let Some(ticket) = self.board.try_update(|b| b.begin_load()) else {
            return;
        };

        let state = self.clone();
        spawn_local(async move {
            let result = api::fetch_heroes().await;
            if !state.liveness.is_alive() {
                return;
            }
            match result {
                Ok(heroes) => state.apply_load(ticket, heroes),
                Err(e) => {
                    web_sys::console::error_1(&format!("Error fetching superheroes: {}", e).into());
                }
            }
        });
    }

    fn apply_load(&self, ticket: LoadTicket, heroes: Vec<HeroEntry>) {
        self.board.update(|b| {
            if !b.finish_load(ticket, heroes) {
                web_sys::console::log_1(
                    &format!("Dropping stale leaderboard load #{}", ticket.sequence()).into(),
                );
            }
        });
    }

    /// A hero arrived over the push channel
    pub fn push_hero(&self, hero: HeroEntry) {
        if !self.liveness.is_alive() {
            return;
        }
        web_sys::console::log_1(&format!("New superhero: {}", hero.name).into());
        self.board.update(|b| b.push_recent(hero));
    }

    pub fn set_field(&self, field: FormField, value: String) {
        self.form.update(|f| f.set_field(field, value));
    }

    /// Validate the form and send it. Invalid input never leaves the page.
    /// On success the form resets and the leaderboard is re-read after a
    /// short delay.
    pub fn submit(&self) {
        if self.submitting.get_untracked() {
            return;
        }
        let Some(Ok(hero)) = self.form.try_update(|f| f.prepare_submit()) else {
            return;
        };

        self.submitting.set(true);
        let state = self.clone();
        spawn_local(async move {
            let result = api::create_hero(&hero).await;
            if !state.liveness.is_alive() {
                return;
            }
            state.submitting.set(false);

            match result {
                Ok(()) => {
                    state.form.update(|f| f.submit_succeeded());
                    state.show_success(&format!("Added {}", hero.name));

                    let refresh = state.clone();
                    gloo_timers::callback::Timeout::new(REFRESH_DELAY_MS as u32, move || {
                        if refresh.liveness.is_alive() {
                            refresh.load();
                        }
                    })
                    .forget();
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("Error adding superhero: {}", e).into());
                    state.form.update(|f| f.submit_failed());
                }
            }
        });
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        let liveness = self.liveness.clone();
        gloo_timers::callback::Timeout::new(3000, move || {
            liveness.run_if_alive(|| success_signal.set(None));
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        let liveness = self.liveness.clone();
        gloo_timers::callback::Timeout::new(5000, move || {
            liveness.run_if_alive(|| error_signal.set(None));
        })
        .forget();
    }
}
