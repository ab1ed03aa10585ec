//! Star Rating
//!
//! Turns a humility score into a row of ten stars with half-star granularity.

use serde::Serialize;
use std::fmt;

/// Number of stars in a rating row
pub const STAR_COUNT: usize = 10;

/// Highest score a rating can display
pub const MAX_SCORE: f64 = 10.0;

/// Fill state of a single star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StarState {
    Full,
    Half,
    Empty,
}

impl StarState {
    /// CSS class suffix used by the page (`star full`, `star half`, `star empty`)
    pub fn css_class(self) -> &'static str {
        match self {
            StarState::Full => "full",
            StarState::Half => "half",
            StarState::Empty => "empty",
        }
    }

    /// Terminal glyph
    pub fn glyph(self) -> char {
        match self {
            StarState::Full => '★',
            StarState::Half => '⯪',
            StarState::Empty => '☆',
        }
    }
}

/// A fixed row of ten stars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating([StarState; STAR_COUNT]);

impl StarRating {
    /// Build a rating from a numeric score.
    ///
    /// The score is clamped to `[0, 10]`; NaN counts as zero.
    pub fn from_score(score: f64) -> Self {
        let value = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, MAX_SCORE)
        };

        let mut stars = [StarState::Empty; STAR_COUNT];
        for (idx, star) in stars.iter_mut().enumerate() {
            let position = (idx + 1) as f64;
            *star = if value >= position {
                StarState::Full
            } else if value >= position - 0.5 {
                StarState::Half
            } else {
                StarState::Empty
            };
        }
        Self(stars)
    }

    /// Build a rating from raw text, e.g. straight out of an input field
    pub fn from_text(raw: &str) -> Self {
        Self::from_score(parse_score(raw))
    }

    pub fn states(&self) -> &[StarState; STAR_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = StarState> + '_ {
        self.0.iter().copied()
    }

    /// Number of full stars
    pub fn full_count(&self) -> usize {
        self.0.iter().filter(|s| **s == StarState::Full).count()
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for star in self.0 {
            write!(f, "{}", star.glyph())?;
        }
        Ok(())
    }
}

/// Star states for a score, as a plain vector
pub fn star_states(score: f64) -> Vec<StarState> {
    StarRating::from_score(score).states().to_vec()
}

/// Parse a score the lenient way: skip leading whitespace, take the longest
/// numeric prefix (`[+-]digits[.digits][e[+-]digits]`) and fall back to zero.
pub fn parse_score(raw: &str) -> f64 {
    parse_number_prefix(raw).unwrap_or(0.0)
}

/// Parse the longest leading decimal number, if any.
///
/// `"7.5kg"` gives `Some(7.5)`, `"abc"` gives `None`, `"Infinity"` gives
/// `Some(inf)`.
pub fn parse_number_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        let sign = if s.starts_with('-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when it is complete
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}
