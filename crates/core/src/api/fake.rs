//! In-memory [`BadgeApi`] used by unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BadgeApi, LookupError};
use crate::models::{Badge, EarnedBadge};

#[derive(Default)]
pub(crate) struct FakeApi {
    pub game_names: HashMap<String, String>,
    pub users: HashMap<String, u64>,
    pub earned: HashMap<u64, Vec<EarnedBadge>>,
    pub catalogs: HashMap<String, Vec<Badge>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

fn unavailable() -> LookupError {
    LookupError::Decode(serde_json::from_str::<()>("unavailable").unwrap_err())
}

#[async_trait]
impl BadgeApi for FakeApi {
    async fn game_name(&self, game_id: &str) -> Result<Option<String>, LookupError> {
        self.record(format!("game_name:{game_id}"));
        if game_id == "500" {
            return Err(unavailable());
        }
        Ok(self.game_names.get(game_id).cloned())
    }

    async fn user_id(&self, username: &str) -> Result<Option<u64>, LookupError> {
        self.record(format!("user_id:{username}"));
        Ok(self.users.get(username).copied())
    }

    async fn user_badges(&self, user_id: u64) -> Result<Vec<EarnedBadge>, LookupError> {
        self.record(format!("user_badges:{user_id}"));
        self.earned.get(&user_id).cloned().ok_or_else(unavailable)
    }

    async fn game_badges(&self, game_id: &str) -> Result<Vec<Badge>, LookupError> {
        self.record(format!("game_badges:{game_id}"));
        self.catalogs.get(game_id).cloned().ok_or_else(unavailable)
    }
}

pub(crate) fn badge(id: &str) -> Badge {
    Badge {
        id: id.to_string(),
        name: format!("Badge {id}"),
        description: None,
        image_url: format!("https://img.example/{id}.png"),
    }
}
