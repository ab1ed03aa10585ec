//! Heroes
//!
//! The leaderboard record, its star rating, and the submission form.

mod form;
mod rating;
mod types;

pub use form::{
    parse_submitted_score, score_hint, validate_score, FormField, HeroForm, ValidationError,
    MAX_SUBMIT_SCORE, MIN_SUBMIT_SCORE, SCORE_HINT_MESSAGE, SUBMIT_FAILED_MESSAGE,
};
pub use rating::{parse_number_prefix, parse_score, star_states, StarRating, StarState, STAR_COUNT};
pub use types::{decode_hero_list, format_score, HeroEntry, HeroId, NewHero};
