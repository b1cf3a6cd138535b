//! User-facing state: the tracked-game store plus the committed username.
//!
//! Every user action that should refresh badge progress yields a
//! [`SweepRequest`]. Requests carry a [`SweepKey`] so a front end can drop
//! results from a sweep that has since been superseded.

use tracing::info;

use crate::{
    api::BadgeApi,
    error::TrackError,
    models::TrackedGame,
    registration,
    store::TrackedGameStore,
};

/// Identity of one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepKey {
    /// Username the sweep aggregates for.
    pub username: String,
    /// Store version the game list was taken from.
    pub store_version: u64,
    /// Monotonic counter distinguishing sweeps over identical inputs.
    pub generation: u64,
}

/// A sweep ready to run: the username and a snapshot of the tracked games.
#[derive(Debug, Clone)]
pub struct SweepRequest {
    /// Sweep identity.
    pub key: SweepKey,
    /// Games to aggregate, in tracked order.
    pub games: Vec<TrackedGame>,
}

/// Owns the store and the committed username.
pub struct Tracker {
    store: TrackedGameStore,
    username: Option<String>,
    generation: u64,
}

impl Tracker {
    /// Wrap a loaded store; no username is committed yet.
    pub fn new(store: TrackedGameStore) -> Self {
        Self {
            store,
            username: None,
            generation: 0,
        }
    }

    /// Tracked games in insertion order.
    pub fn games(&self) -> &[TrackedGame] {
        self.store.list()
    }

    /// Underlying store.
    pub fn store(&self) -> &TrackedGameStore {
        &self.store
    }

    /// Committed username, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Commit a username.
    ///
    /// Returns a sweep when the trimmed username is non-empty and at least
    /// one game is tracked.
    pub fn set_username(&mut self, raw: &str) -> Option<SweepRequest> {
        let trimmed = raw.trim();
        self.username = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        info!(username = trimmed, "Username committed");
        self.sweep_request()
    }

    /// Validate a candidate identifier ahead of name resolution.
    pub fn check_candidate(&self, raw: &str) -> Result<String, TrackError> {
        registration::check_candidate(&self.store, raw)
    }

    /// Store a game and return the sweep it triggers, if any.
    ///
    /// The identifier is validated again here; malformed input never reaches the store.
    pub fn commit_game(
        &mut self,
        id: &str,
        name: Option<String>,
    ) -> Result<Option<SweepRequest>, TrackError> {
        let id = registration::check_candidate(&self.store, id)?;
        self.store.add(&id, name)?;
        Ok(self.sweep_request())
    }

    /// Validate, resolve, and store a game in one step.
    pub async fn add_game(
        &mut self,
        api: &dyn BadgeApi,
        raw: &str,
    ) -> Result<(TrackedGame, Option<SweepRequest>), TrackError> {
        let game = registration::register_game(&mut self.store, api, raw).await?;
        Ok((game, self.sweep_request()))
    }

    /// Stop tracking a game.
    ///
    /// Returns a sweep when a username is committed; a missing game is a no-op.
    pub fn remove_game(&mut self, id: &str) -> Result<Option<SweepRequest>, TrackError> {
        if !self.store.remove(id)? {
            return Ok(None);
        }
        Ok(self.sweep_request())
    }

    /// Build a sweep over the current games, if a username is committed and games exist.
    pub fn sweep_request(&mut self) -> Option<SweepRequest> {
        let username = self.username.clone()?;
        if self.store.is_empty() {
            return None;
        }
        self.generation += 1;
        Some(SweepRequest {
            key: SweepKey {
                username,
                store_version: self.store.version(),
                generation: self.generation,
            },
            games: self.store.list().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::fake::FakeApi, store::MemoryStorage};

    fn tracker_with(payload: &str) -> Tracker {
        Tracker::new(TrackedGameStore::load(
            MemoryStorage::with_slot("games", payload),
            "games",
        ))
    }

    #[test]
    fn blank_username_never_sweeps() {
        let mut tracker = tracker_with(r#"[{"id":"1","name":null}]"#);
        assert!(tracker.set_username("   ").is_none());
        assert_eq!(tracker.username(), None);
    }

    #[test]
    fn no_games_never_sweeps() {
        let mut tracker = tracker_with("[]");
        assert!(tracker.set_username("builder").is_none());
        assert_eq!(tracker.username(), Some("builder"));
    }

    #[test]
    fn username_commit_sweeps_games_in_order() {
        let mut tracker =
            tracker_with(r#"[{"id":"2","name":"Two"},{"id":"1","name":null}]"#);
        let request = tracker.set_username(" builder ").expect("sweep");
        assert_eq!(request.key.username, "builder");
        let ids: Vec<_> = request.games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn mutations_resweep_only_with_username() -> anyhow::Result<()> {
        let mut tracker = tracker_with("[]");
        assert!(tracker.commit_game("1", None)?.is_none());

        let first = tracker.set_username("builder").expect("sweep");
        let second = tracker.commit_game("2", None)?.expect("sweep after add");
        assert_ne!(first.key, second.key);
        assert!(second.key.store_version > first.key.store_version);

        let third = tracker.remove_game("1")?.expect("sweep after remove");
        assert_eq!(third.games.len(), 1);

        assert!(tracker.remove_game("missing")?.is_none());
        Ok(())
    }

    #[test]
    fn commit_rejects_malformed_identifiers() -> anyhow::Result<()> {
        let mut tracker = tracker_with("[]");
        tracker.set_username("builder");

        assert!(matches!(
            tracker.commit_game("abc", None),
            Err(TrackError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            tracker.commit_game("", Some("Blank".to_string())),
            Err(TrackError::InvalidIdentifier(_))
        ));
        assert!(tracker.games().is_empty());
        assert_eq!(tracker.store().version(), 0);

        let sweep = tracker.commit_game(" 12 ", None)?.expect("sweep after add");
        assert_eq!(sweep.games, [TrackedGame::new("12", None)]);
        assert!(matches!(
            tracker.commit_game("12", None),
            Err(TrackError::AlreadyTracked(_))
        ));
        Ok(())
    }

    #[test]
    fn repeated_sweeps_get_distinct_keys() {
        let mut tracker = tracker_with(r#"[{"id":"1","name":null}]"#);
        let a = tracker.set_username("builder").expect("sweep");
        let b = tracker.sweep_request().expect("sweep");
        assert_eq!(a.key.store_version, b.key.store_version);
        assert_ne!(a.key, b.key);
    }

    #[tokio::test]
    async fn add_game_validates_first() -> anyhow::Result<()> {
        let mut api = FakeApi::default();
        api.game_names.insert("9".to_string(), "Nine".to_string());
        let mut tracker = tracker_with("[]");
        tracker.set_username("builder");

        assert!(matches!(
            tracker.add_game(&api, "nine").await,
            Err(TrackError::InvalidIdentifier(_))
        ));
        let (game, sweep) = tracker.add_game(&api, "9").await?;
        assert_eq!(game.display_name(), "Nine");
        assert!(sweep.is_some());
        assert!(matches!(
            tracker.check_candidate("9"),
            Err(TrackError::AlreadyTracked(_))
        ));
        Ok(())
    }
}
