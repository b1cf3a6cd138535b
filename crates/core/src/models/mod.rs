//! Shared domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A game the user has chosen to monitor for badge progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedGame {
    /// Decimal game (universe) identifier; unique within the store.
    pub id: String,
    /// Display name resolved when the game was added, if any.
    pub name: Option<String>,
}

impl TrackedGame {
    /// Build a tracked game from an identifier and optional name.
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// Returns the resolved name, or `Game #<id>` when none is known.
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Game #{}", self.id),
        }
    }
}

/// A badge definition from a game's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Badge identifier, normalised to a string.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Badge title; empty when the catalog omits it.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Optional flavour text.
    #[serde(default)]
    pub description: Option<String>,
    /// Icon location; empty when the catalog omits it.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_url: String,
}

impl Badge {
    /// Returns the badge title, or `Badge #<id>` when the catalog has none.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Badge #{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// A badge awarded to a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    /// Identifier of the awarded badge.
    #[serde(deserialize_with = "string_or_number")]
    pub badge_id: String,
    /// When the badge was awarded; `None` when missing or unreadable.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub awarded_at: Option<DateTime<Utc>>,
}

/// A catalog badge annotated with one player's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedBadge {
    /// The catalog entry.
    #[serde(flatten)]
    pub badge: Badge,
    /// Whether the player holds the badge.
    pub obtained: bool,
    /// Award timestamp, when obtained and known.
    pub obtained_date: Option<DateTime<Utc>>,
}

/// Completion summary for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameProgress {
    /// Badges the player holds.
    pub obtained: usize,
    /// Badges in the catalog.
    pub total: usize,
}

impl GameProgress {
    /// Summarise an annotated badge list.
    pub fn from_badges(badges: &[AnnotatedBadge]) -> Self {
        Self {
            obtained: badges.iter().filter(|badge| badge.obtained).count(),
            total: badges.len(),
        }
    }

    /// Whole-number completion percentage, halves rounded up; `0` for an empty catalog.
    pub fn percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        let scaled = (self.obtained * 200 + self.total) / (self.total * 2);
        scaled.min(100) as u16
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|stamp| stamp.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(
            TrackedGame::new("123", Some("Alpha".to_string())).display_name(),
            "Alpha"
        );
        assert_eq!(TrackedGame::new("123", None).display_name(), "Game #123");
        assert_eq!(
            TrackedGame::new("7", Some(String::new())).display_name(),
            "Game #7"
        );
    }

    #[test]
    fn tracked_game_serialises_null_name() {
        let value = serde_json::to_value(TrackedGame::new("5", None)).unwrap();
        assert_eq!(value, json!({ "id": "5", "name": null }));
    }

    #[test]
    fn badge_ids_accept_numbers() {
        let badge: Badge = serde_json::from_value(json!({
            "id": 2124,
            "name": "Welcome",
            "imageUrl": "https://example.com/b.png"
        }))
        .unwrap();
        assert_eq!(badge.id, "2124");
        assert_eq!(badge.description, None);

        let earned: EarnedBadge = serde_json::from_value(json!({
            "badgeId": "b1",
            "awardedAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(earned.badge_id, "b1");
        assert!(earned.awarded_at.is_some());
    }

    #[test]
    fn null_badge_text_reads_as_empty() {
        let badges: Vec<Badge> = serde_json::from_value(json!([
            { "id": 1, "name": "A", "imageUrl": null },
            { "id": 2, "name": null, "description": null }
        ]))
        .unwrap();
        assert_eq!(badges[0].image_url, "");
        assert_eq!(badges[0].display_name(), "A");
        assert_eq!(badges[1].name, "");
        assert_eq!(badges[1].display_name(), "Badge #2");
    }

    #[test]
    fn unreadable_award_dates_become_none() {
        let earned: Vec<EarnedBadge> = serde_json::from_value(json!([
            { "badgeId": 1, "awardedAt": "2024-01-01T00:00:00Z" },
            { "badgeId": 2, "awardedAt": null },
            { "badgeId": 3, "awardedAt": "01/02/2024" },
            { "badgeId": 4, "awardedAt": 1704067200 },
            { "badgeId": 5 }
        ]))
        .unwrap();
        assert_eq!(earned.len(), 5);
        assert_eq!(
            earned[0].awarded_at.map(|at| at.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
        assert!(earned[1..].iter().all(|entry| entry.awarded_at.is_none()));
    }

    #[test]
    fn percent_rounds_half_up() {
        let progress = |obtained, total| GameProgress { obtained, total }.percent();
        assert_eq!(progress(0, 0), 0);
        assert_eq!(progress(1, 2), 50);
        assert_eq!(progress(1, 3), 33);
        assert_eq!(progress(2, 3), 67);
        assert_eq!(progress(1, 8), 13);
        assert_eq!(progress(4, 4), 100);
    }
}
