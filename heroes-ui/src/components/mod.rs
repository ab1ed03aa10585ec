//! UI Components
//!
//! Leptos components for the leaderboard page.

pub mod hero_form;
pub mod hero_table;
pub mod star_rating;
pub mod toast;

pub use hero_form::HeroFormPanel;
pub use hero_table::{HeroTable, RecentHeroes};
pub use star_rating::StarRatingView;
pub use toast::Toast;
