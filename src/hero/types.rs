//! Hero Types
//!
//! Leaderboard records as they travel over the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::rating::{parse_score, StarRating};

/// Server-assigned identifier; the API may hand out numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeroId {
    Number(i64),
    Text(String),
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeroId::Number(n) => write!(f, "{}", n),
            HeroId::Text(s) => f.write_str(s),
        }
    }
}

/// One leaderboard record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroEntry {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub id: Option<HeroId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub superpower: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub humility_score: f64,
}

impl HeroEntry {
    pub fn new(name: impl Into<String>, superpower: impl Into<String>, humility_score: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            superpower: superpower.into(),
            humility_score,
        }
    }

    pub fn with_id(mut self, id: HeroId) -> Self {
        self.id = Some(id);
        self
    }

    /// Key used to tell rows apart when rendering: the id if known, else the name
    pub fn row_key(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.name.clone(),
        }
    }

    pub fn rating(&self) -> StarRating {
        StarRating::from_score(self.humility_score)
    }

    /// Score as shown in tables
    pub fn score_label(&self) -> String {
        format_score(self.humility_score)
    }
}

/// Payload for `POST /superheroes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHero {
    pub name: String,
    pub superpower: String,
    pub humility_score: f64,
}

impl From<NewHero> for HeroEntry {
    fn from(hero: NewHero) -> Self {
        HeroEntry::new(hero.name, hero.superpower, hero.humility_score)
    }
}

/// Render a score without a trailing `.0` for whole numbers (`9`, `7.5`)
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.is_finite() {
        format!("{:.0}", score)
    } else {
        format!("{}", score)
    }
}

/// Decode a `GET /superheroes` body. Elements that are not hero objects are
/// skipped so one bad record cannot empty the leaderboard.
pub fn decode_hero_list(body: &str) -> serde_json::Result<Vec<HeroEntry>> {
    let items: Vec<Value> = serde_json::from_str(body)?;
    let total = items.len();

    let heroes: Vec<HeroEntry> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if !item.is_object() {
                tracing::warn!(index, "Skipping leaderboard entry that is not an object");
                return None;
            }
            match serde_json::from_value::<HeroEntry>(item) {
                Ok(hero) => Some(hero),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed leaderboard entry");
                    None
                }
            }
        })
        .collect();

    if heroes.len() < total {
        tracing::debug!(kept = heroes.len(), total, "Dropped unusable leaderboard entries");
    }
    Ok(heroes)
}

/// Strings pass through, numbers and booleans are shown as text, anything else is empty
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Integer ids stay numbers; other numbers and strings are kept as text
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<HeroId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => HeroId::Number(i),
            None => HeroId::Text(n.to_string()),
        }),
        Value::String(s) => Some(HeroId::Text(s)),
        _ => None,
    })
}

/// Accept numbers, numeric strings, or nothing at all. A broken score must not
/// take the whole list down with it, so anything unusable becomes zero.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_score(&s),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r#"{"id": 3, "name": "Tidal", "superpower": "Water", "humilityScore": 8.5}"#;
        let hero: HeroEntry = serde_json::from_str(json).unwrap();
        assert_eq!(hero.id, Some(HeroId::Number(3)));
        assert_eq!(hero.name, "Tidal");
        assert_eq!(hero.humility_score, 8.5);
        assert_eq!(hero.row_key(), "3");
    }

    #[test]
    fn test_deserialize_lenient_score() {
        let hero: HeroEntry =
            serde_json::from_str(r#"{"name": "A", "superpower": "B", "humilityScore": "8.5"}"#)
                .unwrap();
        assert_eq!(hero.humility_score, 8.5);

        let hero: HeroEntry =
            serde_json::from_str(r#"{"name": "A", "superpower": "B", "humilityScore": null}"#)
                .unwrap();
        assert_eq!(hero.humility_score, 0.0);

        let hero: HeroEntry = serde_json::from_str(r#"{"name": "A", "superpower": "B"}"#).unwrap();
        assert_eq!(hero.humility_score, 0.0);
        assert_eq!(hero.row_key(), "A");
    }

    #[test]
    fn test_deserialize_lenient_fields() {
        let hero: HeroEntry =
            serde_json::from_str(r#"{"id": 1.5, "name": null, "superpower": 42, "humilityScore": 7}"#)
                .unwrap();
        assert_eq!(hero.id, Some(HeroId::Text("1.5".to_string())));
        assert_eq!(hero.name, "");
        assert_eq!(hero.superpower, "42");

        let hero: HeroEntry =
            serde_json::from_str(r#"{"id": true, "name": "A", "superpower": ["x"], "humilityScore": 7}"#)
                .unwrap();
        assert_eq!(hero.id, None);
        assert_eq!(hero.superpower, "");
        assert_eq!(hero.row_key(), "A");
    }

    #[test]
    fn test_decode_hero_list_skips_bad_entries() {
        let body = r#"[
            null,
            {"id": 1, "name": null, "superpower": "Quiet", "humilityScore": 6},
            "not a hero",
            {"id": true, "name": "Tidal", "superpower": "Water", "humilityScore": "8.5"},
            7
        ]"#;
        let heroes = decode_hero_list(body).unwrap();
        assert_eq!(heroes.len(), 2);
        assert_eq!(heroes[0].name, "");
        assert_eq!(heroes[0].humility_score, 6.0);
        assert_eq!(heroes[1].name, "Tidal");
        assert_eq!(heroes[1].id, None);
        assert_eq!(heroes[1].humility_score, 8.5);
    }

    #[test]
    fn test_decode_hero_list_rejects_non_array() {
        assert!(decode_hero_list(r#"{"error": "nope"}"#).is_err());
        assert!(decode_hero_list("not json").is_err());
        assert!(decode_hero_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_text_id_and_unknown_fields() {
        let json = r#"{"id": "abc-1", "name": "A", "superpower": "B", "humilityScore": 2, "createdAt": "x"}"#;
        let hero: HeroEntry = serde_json::from_str(json).unwrap();
        assert_eq!(hero.id, Some(HeroId::Text("abc-1".to_string())));
    }

    #[test]
    fn test_new_hero_wire_format() {
        let payload = NewHero {
            name: "Quiet Storm".to_string(),
            superpower: "Weather".to_string(),
            humility_score: 9.5,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Quiet Storm", "superpower": "Weather", "humilityScore": 9.5})
        );
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(9.0), "9");
        assert_eq!(format_score(7.5), "7.5");
    }
}
