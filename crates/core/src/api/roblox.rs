use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::{BadgeApi, LookupError};
use crate::{
    config::AppConfig,
    models::{Badge, EarnedBadge},
};

/// HTTP client for the Roblox web APIs.
#[derive(Clone)]
pub struct RobloxClient {
    client: Client,
    games_url: String,
    users_url: String,
    badges_url: String,
}

impl RobloxClient {
    /// Build a client from configuration.
    pub fn new(config: &AppConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            games_url: trim_base(&config.games_api_url),
            users_url: trim_base(&config.users_api_url),
            badges_url: trim_base(&config.badges_api_url),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        debug!(url, "GET");
        let body = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl BadgeApi for RobloxClient {
    async fn game_name(&self, game_id: &str) -> Result<Option<String>, LookupError> {
        let url = format!("{}/v1/games", self.games_url);
        let page: GamesPage = self.get(&url, &[("universeIds", game_id)]).await?;
        Ok(page.first_name())
    }

    async fn user_id(&self, username: &str) -> Result<Option<u64>, LookupError> {
        let url = format!("{}/users/get-by-username", self.users_url);
        let user: UserLookup = self.get(&url, &[("username", username)]).await?;
        Ok(user.id.filter(|id| *id != 0))
    }

    async fn user_badges(&self, user_id: u64) -> Result<Vec<EarnedBadge>, LookupError> {
        let url = format!("{}/v1/users/{user_id}/badges", self.badges_url);
        let page: DataPage<EarnedBadge> = self.get(&url, &[]).await?;
        Ok(page.into_items())
    }

    async fn game_badges(&self, game_id: &str) -> Result<Vec<Badge>, LookupError> {
        let url = format!("{}/v1/universes/{game_id}/badges", self.badges_url);
        let page: DataPage<Badge> = self.get(&url, &[]).await?;
        Ok(page.into_items())
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Deserialize)]
struct DataPage<T> {
    data: Option<Vec<T>>,
}

impl<T> DataPage<T> {
    /// Entries of the page; a missing or null `data` field reads as empty.
    fn into_items(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GamesPage {
    #[serde(default)]
    data: Vec<GameDetails>,
}

impl GamesPage {
    fn first_name(self) -> Option<String> {
        self.data
            .into_iter()
            .next()
            .and_then(|game| game.name)
            .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GameDetails {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserLookup {
    #[serde(rename = "Id", default)]
    id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_page_takes_first_name() -> anyhow::Result<()> {
        let page: GamesPage = serde_json::from_str(
            r#"{"data":[{"id":1,"name":"Alpha","rootPlaceId":2},{"id":3,"name":"Beta"}]}"#,
        )?;
        assert_eq!(page.first_name().as_deref(), Some("Alpha"));

        let empty: GamesPage = serde_json::from_str(r#"{"data":[]}"#)?;
        assert_eq!(empty.first_name(), None);

        let missing: GamesPage = serde_json::from_str("{}")?;
        assert_eq!(missing.first_name(), None);
        Ok(())
    }

    #[test]
    fn user_lookup_reads_capitalised_id() -> anyhow::Result<()> {
        let found: UserLookup = serde_json::from_str(r#"{"Id":156,"Username":"builderman"}"#)?;
        assert_eq!(found.id, Some(156));

        let missing: UserLookup =
            serde_json::from_str(r#"{"success":false,"errorMessage":"User not found"}"#)?;
        assert_eq!(missing.id, None);
        Ok(())
    }

    #[test]
    fn badge_pages_default_to_empty() -> anyhow::Result<()> {
        let page: DataPage<Badge> = serde_json::from_str(
            r#"{"data":[{"id":10,"name":"First","description":null,"imageUrl":"https://img/1"}],"nextPageCursor":null}"#,
        )?;
        let badges = page.into_items();
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].id, "10");
        assert_eq!(badges[0].image_url, "https://img/1");

        let missing: DataPage<EarnedBadge> = serde_json::from_str("{}")?;
        assert!(missing.into_items().is_empty());
        let null: DataPage<Badge> = serde_json::from_str(r#"{"data":null}"#)?;
        assert!(null.into_items().is_empty());
        Ok(())
    }

    #[test]
    fn catalog_page_tolerates_null_fields() -> anyhow::Result<()> {
        let page: DataPage<Badge> = serde_json::from_str(
            r#"{"data":[{"id":1,"name":"A","imageUrl":null},{"id":2,"name":null,"imageUrl":"https://img/2"}]}"#,
        )?;
        let badges = page.into_items();
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].name, "A");
        assert_eq!(badges[0].image_url, "");
        assert_eq!(badges[1].name, "");
        assert_eq!(badges[1].image_url, "https://img/2");
        Ok(())
    }

    #[test]
    fn earned_page_keeps_entries_with_bad_dates() -> anyhow::Result<()> {
        let page: DataPage<EarnedBadge> = serde_json::from_str(
            r#"{"data":[{"badgeId":1,"awardedAt":"2024-01-01T00:00:00Z"},{"badgeId":2,"awardedAt":null},{"badgeId":3,"awardedAt":"yesterday"},{"badgeId":4}]}"#,
        )?;
        let earned = page.into_items();
        let ids: Vec<_> = earned.iter().map(|e| e.badge_id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        assert!(earned[0].awarded_at.is_some());
        assert!(earned[1..].iter().all(|e| e.awarded_at.is_none()));
        Ok(())
    }

    #[test]
    fn base_urls_lose_trailing_slash() {
        assert_eq!(trim_base(" https://badges.roblox.com/ "), "https://badges.roblox.com");
    }
}
