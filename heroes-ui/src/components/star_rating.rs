//! Star Rating Component
//!
//! Ten stars, each full, half or empty, derived from a humility score.

use humble_heroes::{StarRating, StarState};
use leptos::*;

/// CSS class for one star
fn star_class(state: StarState) -> String {
    format!("star {}", state.css_class())
}

#[component]
pub fn StarRatingView(score: f64) -> impl IntoView {
    let rating = StarRating::from_score(score);
    let label = format!("{} of 10 stars", rating.full_count());

    view! {
        <span class="star-rating" title=label>
            {rating
                .iter()
                .map(|state| view! { <span class=star_class(state)>{state.glyph().to_string()}</span> })
                .collect_view()}
        </span>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_classes() {
        let classes: Vec<String> = StarRating::from_score(3.5).iter().map(star_class).collect();
        assert_eq!(classes[2], "star full");
        assert_eq!(classes[3], "star half");
        assert_eq!(classes[4], "star empty");
        assert_eq!(classes.len(), 10);
    }
}
