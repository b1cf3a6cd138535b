//! Error taxonomy shared by the store, registration, and aggregation flows.

use thiserror::Error;

use crate::models::TrackedGame;

/// Failures raised while registering or removing tracked games.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The candidate identifier is empty or contains a non-digit character.
    #[error("invalid game identifier {0:?}: digits only")]
    InvalidIdentifier(String),
    /// The identifier is already present in the store.
    #[error("game {0} is already tracked")]
    AlreadyTracked(String),
    /// The persisted slot could not be written.
    #[error("failed to persist tracked games: {0}")]
    Io(#[from] std::io::Error),
    /// The tracked-game sequence could not be serialised.
    #[error("failed to serialise tracked games: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures raised while aggregating one game's badges for a player.
#[derive(Debug, Clone, Error)]
pub enum AggregationError {
    /// The username did not resolve to a player identifier.
    #[error("user {username} not found")]
    UserNotFound {
        /// Username as submitted.
        username: String,
    },
    /// The player's earned-badge collection could not be fetched.
    #[error("could not fetch badges earned by user {user_id}")]
    UserBadgesUnavailable {
        /// Resolved player identifier.
        user_id: u64,
    },
    /// The game's badge catalog could not be fetched.
    #[error("could not fetch badges for {}", .game.display_name())]
    GameBadgesUnavailable {
        /// Game whose catalog failed.
        game: TrackedGame,
    },
}

impl AggregationError {
    /// Whether the failure stems from the player rather than the game.
    ///
    /// Player-scoped failures hit every game of a sweep alike, since they all
    /// share the same username.
    pub fn is_player_scoped(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::UserBadgesUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_error_uses_display_fallback() {
        let err = AggregationError::GameBadgesUnavailable {
            game: TrackedGame::new("42", None),
        };
        assert_eq!(err.to_string(), "could not fetch badges for Game #42");
        assert!(!err.is_player_scoped());

        let err = AggregationError::UserNotFound {
            username: "ghost".to_string(),
        };
        assert!(err.is_player_scoped());
    }
}
