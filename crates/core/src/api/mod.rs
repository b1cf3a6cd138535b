//! External lookups against the game platform.

mod roblox;

#[cfg(test)]
pub(crate) mod fake;

pub use roblox::RobloxClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Badge, EarnedBadge};

/// Failure of a single HTTP lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport failure or non-success status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body was not the expected JSON.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The four lookups the tracker depends on.
#[async_trait]
pub trait BadgeApi: Send + Sync {
    /// Display name of a game, `None` when the service knows no such game.
    async fn game_name(&self, game_id: &str) -> Result<Option<String>, LookupError>;

    /// Numeric player identifier for a username, `None` when unknown.
    async fn user_id(&self, username: &str) -> Result<Option<u64>, LookupError>;

    /// Badges awarded to a player.
    async fn user_badges(&self, user_id: u64) -> Result<Vec<EarnedBadge>, LookupError>;

    /// Full badge catalog of a game.
    async fn game_badges(&self, game_id: &str) -> Result<Vec<Badge>, LookupError>;
}
