//! App Root Component
//!
//! Page layout, global providers, and the mount/unmount lifecycle: the
//! leaderboard is loaded and the push channel opened once on mount, and both
//! are shut off on cleanup.

use leptos::*;

use crate::api;
use crate::components::{HeroFormPanel, HeroTable, RecentHeroes, Toast};
use crate::state::global::{provide_global_state, GlobalState};
use crate::state::realtime::PushClient;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    state.load();

    let push = PushClient::new(&api::api_base());
    push.connect(state.clone());

    let liveness = state.liveness.clone();
    on_cleanup(move || {
        liveness.dispose();
        push.close();
    });

    view! {
        <main>
            <header>
                <h1>"Humble Superheroes"</h1>
                <p>"The heroes who would never call themselves heroes."</p>
            </header>

            <HeroFormPanel />
            <HeroTable />
            <RecentHeroes />

            <Footer />
            <Toast />
        </main>
    }
}

/// Footer component showing connection status
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let connected = state.connected;
    let connected_at = create_rw_signal(None::<String>);

    create_effect(move |_| {
        if connected.get() {
            connected_at.set(Some(chrono::Local::now().format("%H:%M:%S").to_string()));
        }
    });

    view! {
        <footer>
            {move || {
                if connected.get() {
                    view! { <span class="status-on">"● Connected"</span> }.into_view()
                } else {
                    view! { <span class="status-off">"● Disconnected"</span> }.into_view()
                }
            }}
            " "
            <span>
                {move || {
                    connected_at
                        .get()
                        .map(|t| format!("Connected since {}", t))
                        .unwrap_or_else(|| "Not connected".to_string())
                }}
            </span>
        </footer>
    }
}
