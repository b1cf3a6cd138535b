//! Validation and name resolution for newly added games.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::{api::BadgeApi, error::TrackError, models::TrackedGame, store::TrackedGameStore};

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("invalid identifier regex"));

/// Whether `id` is a well-formed game identifier, as stored.
pub fn is_identifier(id: &str) -> bool {
    IDENTIFIER_RE.is_match(id)
}

/// Trim and validate a candidate game identifier.
///
/// Accepts a non-empty run of ASCII digits; anything else is rejected.
pub fn validate_identifier(raw: &str) -> Result<String, TrackError> {
    let candidate = raw.trim();
    if is_identifier(candidate) {
        Ok(candidate.to_string())
    } else {
        Err(TrackError::InvalidIdentifier(candidate.to_string()))
    }
}

/// Validate a candidate and ensure it is not already tracked.
pub fn check_candidate(store: &TrackedGameStore, raw: &str) -> Result<String, TrackError> {
    let id = validate_identifier(raw)?;
    if store.contains(&id) {
        return Err(TrackError::AlreadyTracked(id));
    }
    Ok(id)
}

/// Look up a game's display name.
///
/// Failures degrade to `None`; the game is tracked without a name.
pub async fn resolve_name(api: &dyn BadgeApi, game_id: &str) -> Option<String> {
    match api.game_name(game_id).await {
        Ok(Some(name)) => Some(name),
        Ok(None) => {
            warn!(game_id, "Name resolution found no game; tracking without a name");
            None
        }
        Err(err) => {
            warn!(game_id, "Name resolution failed: {err}");
            None
        }
    }
}

/// Validate, resolve, and store a new game in one step.
///
/// Validation errors are returned before any lookup or state change.
pub async fn register_game(
    store: &mut TrackedGameStore,
    api: &dyn BadgeApi,
    raw: &str,
) -> Result<TrackedGame, TrackError> {
    let id = check_candidate(store, raw)?;
    let name = resolve_name(api, &id).await;
    store.add(&id, name.clone())?;
    info!(game_id = %id, name = name.as_deref().unwrap_or("-"), "Game registered");
    Ok(TrackedGame::new(id, name))
}
