//! Leaderboard Components
//!
//! The sorted leaderboard table and the list of heroes added while the page
//! has been open.

use leptos::*;

use crate::components::StarRatingView;
use crate::state::global::GlobalState;

/// Stars followed by the numeric score
#[component]
fn HeroScore(score: f64) -> impl IntoView {
    view! {
        <StarRatingView score=score />
        " "
        <span class="score">{humble_heroes::format_score(score)}</span>
    }
}

/// Leaderboard, most humble first
#[component]
pub fn HeroTable() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <section>
            <h2>"Leaderboard"</h2>
            {move || {
                let heroes = state.board.with(|b| b.sorted().to_vec());
                if heroes.is_empty() {
                    view! { <p class="empty">"No superheroes in the sorted list."</p> }.into_view()
                } else {
                    view! {
                        <table>
                            <thead>
                                <tr>
                                    <th>"#"</th>
                                    <th>"Name"</th>
                                    <th>"Superpower"</th>
                                    <th>"Humility"</th>
                                </tr>
                            </thead>
                            <tbody>
                                {heroes
                                    .into_iter()
                                    .enumerate()
                                    .map(|(i, hero)| {
                                        let score = hero.humility_score;
                                        view! {
                                            <tr>
                                                <td>{i + 1}</td>
                                                <td>{hero.name}</td>
                                                <td>{hero.superpower}</td>
                                                <td>
                                                    <HeroScore score=score />
                                                </td>
                                            </tr>
                                        }
                                    })
                                    .collect_view()}
                            </tbody>
                        </table>
                    }
                    .into_view()
                }
            }}
        </section>
    }
}

/// Heroes announced over the push channel, newest first
#[component]
pub fn RecentHeroes() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let board = state.board;

    // Keyed by arrival number counted from the oldest
    let entries = move || {
        board.with(|b| {
            let count = b.recent_len();
            b.recent()
                .enumerate()
                .map(|(i, hero)| (count - i, hero.clone()))
                .collect::<Vec<_>>()
        })
    };

    view! {
        <section class="recent">
            <h2>"Recently Added"</h2>
            <Show
                when=move || board.with(|b| b.recent_len() > 0)
                fallback=|| view! { <p class="empty">"No new heroes added."</p> }
            >
                <ul>
                    <For
                        each=entries
                        key=|(arrival, _)| *arrival
                        children=move |(_, hero)| {
                            let score = hero.humility_score;
                            view! {
                                <li>
                                    <strong>{hero.name.clone()}</strong>
                                    " - "
                                    {hero.superpower.clone()}
                                    " "
                                    <HeroScore score=score />
                                </li>
                            }
                        }
                    />
                </ul>
            </Show>
        </section>
    }
}
