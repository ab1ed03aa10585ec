//! Hero Form
//!
//! Input state and validation for the "add superhero" form. The same rules
//! back the page's form and the `heroes add` command.

use std::str::FromStr;
use thiserror::Error;

use super::rating::parse_number_prefix;
use super::types::NewHero;

/// Lowest score accepted on submission
pub const MIN_SUBMIT_SCORE: f64 = 1.0;
/// Highest score accepted on submission
pub const MAX_SUBMIT_SCORE: f64 = 10.0;

/// Shown next to the score field while typing
pub const SCORE_HINT_MESSAGE: &str = "Humility score must be between 1 and 10 (decimals allowed).";
/// Shown when a submission fails for any remote reason
pub const SUBMIT_FAILED_MESSAGE: &str = "Error adding superhero. Check console for details.";

/// Reasons a submission is refused before it leaves the client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Humility score must be between 1 and 10.")]
    ScoreOutOfRange(f64),

    #[error("Humility score must be between 1 and 10.")]
    ScoreNotNumeric(String),

    #[error("Name is required.")]
    MissingName,

    #[error("Superpower is required.")]
    MissingSuperpower,
}

/// Form inputs, keyed the way the page names its `<input>` elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Superpower,
    HumilityScore,
}

impl FormField {
    pub fn input_name(self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Superpower => "superpower",
            FormField::HumilityScore => "humilityScore",
        }
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FormField::Name),
            "superpower" => Ok(FormField::Superpower),
            "humilityScore" => Ok(FormField::HumilityScore),
            other => Err(format!("unknown form field: {}", other)),
        }
    }
}

/// Check a score against the submission bounds
pub fn validate_score(score: f64) -> Result<f64, ValidationError> {
    if score.is_nan() {
        return Err(ValidationError::ScoreNotNumeric(score.to_string()));
    }
    if !(MIN_SUBMIT_SCORE..=MAX_SUBMIT_SCORE).contains(&score) {
        return Err(ValidationError::ScoreOutOfRange(score));
    }
    Ok(score)
}

/// Parse and bound-check the raw score text of a submission
pub fn parse_submitted_score(raw: &str) -> Result<f64, ValidationError> {
    let score =
        parse_number_prefix(raw).ok_or_else(|| ValidationError::ScoreNotNumeric(raw.to_string()))?;
    validate_score(score)
}

/// Advisory check run on every keystroke. An empty field is not an error yet.
pub fn score_hint(raw: &str) -> Option<&'static str> {
    if raw.trim().is_empty() {
        return None;
    }
    match parse_submitted_score(raw) {
        Ok(_) => None,
        Err(_) => Some(SCORE_HINT_MESSAGE),
    }
}

/// State of the submission form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeroForm {
    pub name: String,
    pub superpower: String,
    pub humility_score: String,
    error: Option<String>,
}

impl HeroForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current user-visible message, if any
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Superpower => &self.superpower,
            FormField::HumilityScore => &self.humility_score,
        }
    }

    /// Store a field change. Score edits re-run the advisory check.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Superpower => self.superpower = value,
            FormField::HumilityScore => {
                self.error = score_hint(&value).map(str::to_string);
                self.humility_score = value;
            }
        }
    }

    /// Validate everything and build the payload. On rejection the message is
    /// kept on the form and nothing should be sent.
    pub fn prepare_submit(&mut self) -> Result<NewHero, ValidationError> {
        match self.validate() {
            Ok(hero) => Ok(hero),
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Blank checks ignore surrounding whitespace; the text is sent as typed
    fn validate(&self) -> Result<NewHero, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.superpower.trim().is_empty() {
            return Err(ValidationError::MissingSuperpower);
        }
        let humility_score = parse_submitted_score(&self.humility_score)?;

        Ok(NewHero {
            name: self.name.clone(),
            superpower: self.superpower.clone(),
            humility_score,
        })
    }

    /// The server accepted the hero: start over with an empty form
    pub fn submit_succeeded(&mut self) {
        *self = Self::default();
    }

    /// The server (or the network) refused: keep the values for correction
    pub fn submit_failed(&mut self) {
        self.error = Some(SUBMIT_FAILED_MESSAGE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(score: &str) -> HeroForm {
        let mut form = HeroForm::new();
        form.set_field(FormField::Name, "Gentle Giant");
        form.set_field(FormField::Superpower, "Strength");
        form.set_field(FormField::HumilityScore, score);
        form
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(1.0).is_ok());
        assert!(validate_score(10.0).is_ok());
        assert_eq!(validate_score(0.5), Err(ValidationError::ScoreOutOfRange(0.5)));
        assert!(validate_score(10.1).is_err());
        assert!(validate_score(f64::NAN).is_err());
    }

    #[test]
    fn test_score_hint_is_advisory() {
        let mut form = HeroForm::new();
        form.set_field(FormField::HumilityScore, "1");
        assert_eq!(form.error_message(), None);

        form.set_field(FormField::HumilityScore, "11");
        assert_eq!(form.error_message(), Some(SCORE_HINT_MESSAGE));
        // still accepted as typed
        assert_eq!(form.humility_score, "11");

        form.set_field(FormField::HumilityScore, "");
        assert_eq!(form.error_message(), None);

        form.set_field(FormField::HumilityScore, "abc");
        assert_eq!(form.error_message(), Some(SCORE_HINT_MESSAGE));
    }

    #[test]
    fn test_prepare_submit_rejects_low_score() {
        let mut form = filled("0.5");
        let err = form.prepare_submit().unwrap_err();
        assert_eq!(err, ValidationError::ScoreOutOfRange(0.5));
        assert_eq!(form.error_message(), Some("Humility score must be between 1 and 10."));
        assert_eq!(form.humility_score, "0.5");
    }

    #[test]
    fn test_prepare_submit_rejects_high_score_with_message() {
        for raw in ["11", "10.5"] {
            let mut form = filled(raw);
            assert!(form.prepare_submit().is_err());
            assert_eq!(form.error_message(), Some("Humility score must be between 1 and 10."));
            assert_eq!(form.humility_score, raw);
        }
    }

    #[test]
    fn test_prepare_submit_accepts_ten() {
        let mut form = filled("10");
        let hero = form.prepare_submit().unwrap();
        assert_eq!(hero.humility_score, 10.0);
        assert_eq!(hero.name, "Gentle Giant");
    }

    #[test]
    fn test_required_fields() {
        let mut form = filled("5");
        form.set_field(FormField::Name, "   ");
        assert_eq!(form.prepare_submit(), Err(ValidationError::MissingName));

        let mut form = filled("5");
        form.set_field(FormField::Superpower, "");
        assert_eq!(form.prepare_submit(), Err(ValidationError::MissingSuperpower));
    }

    #[test]
    fn test_payload_keeps_text_as_typed() {
        let mut form = HeroForm::new();
        form.set_field(FormField::Name, " Quiet Quill ");
        form.set_field(FormField::Superpower, "Editing  ");
        form.set_field(FormField::HumilityScore, "9");

        let hero = form.prepare_submit().unwrap();
        assert_eq!(hero.name, " Quiet Quill ");
        assert_eq!(hero.superpower, "Editing  ");
    }

    #[test]
    fn test_submit_outcomes() {
        let mut form = filled("7.5");
        form.submit_failed();
        assert_eq!(form.error_message(), Some(SUBMIT_FAILED_MESSAGE));
        assert_eq!(form.name, "Gentle Giant");

        form.submit_succeeded();
        assert_eq!(form, HeroForm::default());
    }

    #[test]
    fn test_field_names() {
        for field in [FormField::Name, FormField::Superpower, FormField::HumilityScore] {
            assert_eq!(field.input_name().parse::<FormField>(), Ok(field));
        }
        assert!("power".parse::<FormField>().is_err());
    }
}
