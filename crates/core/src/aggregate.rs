//! Badge aggregation: merge a game's catalog with a player's earned badges.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    api::BadgeApi,
    error::AggregationError,
    models::{AnnotatedBadge, Badge, EarnedBadge, GameProgress, TrackedGame},
    tracker::{SweepKey, SweepRequest},
};

/// Outcome of aggregating one tracked game.
#[derive(Debug, Clone)]
pub struct GameReport {
    /// The game the report belongs to.
    pub game: TrackedGame,
    /// Annotated catalog, or why it could not be built.
    pub result: Result<Vec<AnnotatedBadge>, AggregationError>,
}

impl GameReport {
    /// Completion summary when aggregation succeeded.
    pub fn progress(&self) -> Option<GameProgress> {
        self.result
            .as_ref()
            .ok()
            .map(|badges| GameProgress::from_badges(badges))
    }
}

/// Events emitted by a running sweep.
#[derive(Debug)]
pub enum SweepEvent {
    /// One game finished, successfully or not.
    Report {
        /// Sweep the report belongs to.
        key: SweepKey,
        /// Per-game outcome.
        report: GameReport,
    },
    /// Every game of the sweep has been attempted.
    Finished {
        /// Sweep that completed.
        key: SweepKey,
    },
}

/// Annotate every catalog badge with the player's status, preserving catalog order.
///
/// When the earned collection lists a badge more than once, the first entry wins.
pub fn merge_badges(catalog: Vec<Badge>, earned: &[EarnedBadge]) -> Vec<AnnotatedBadge> {
    let mut awarded: HashMap<&str, Option<DateTime<Utc>>> = HashMap::with_capacity(earned.len());
    for entry in earned {
        awarded
            .entry(entry.badge_id.as_str())
            .or_insert(entry.awarded_at);
    }

    catalog
        .into_iter()
        .map(|badge| match awarded.get(badge.id.as_str()) {
            Some(obtained_date) => AnnotatedBadge {
                badge,
                obtained: true,
                obtained_date: *obtained_date,
            },
            None => AnnotatedBadge {
                badge,
                obtained: false,
                obtained_date: None,
            },
        })
        .collect()
}

/// Runs the per-game lookups and merge against a [`BadgeApi`].
#[derive(Clone)]
pub struct BadgeAggregator {
    api: Arc<dyn BadgeApi>,
}

impl BadgeAggregator {
    /// Create an aggregator over the given API.
    pub fn new(api: Arc<dyn BadgeApi>) -> Self {
        Self { api }
    }

    /// Aggregate one game's badges for `username`.
    ///
    /// The username is resolved afresh on every call.
    pub async fn aggregate(
        &self,
        username: &str,
        game: &TrackedGame,
    ) -> Result<Vec<AnnotatedBadge>, AggregationError> {
        let user_id = match self.api.user_id(username).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                warn!(username, "User not found");
                return Err(AggregationError::UserNotFound {
                    username: username.to_string(),
                });
            }
            Err(err) => {
                warn!(username, "User lookup failed: {err}");
                return Err(AggregationError::UserNotFound {
                    username: username.to_string(),
                });
            }
        };

        let earned = self.api.user_badges(user_id).await.map_err(|err| {
            warn!(user_id, "Earned badge lookup failed: {err}");
            AggregationError::UserBadgesUnavailable { user_id }
        })?;

        let catalog = self.api.game_badges(&game.id).await.map_err(|err| {
            warn!(game_id = %game.id, "Badge catalog lookup failed: {err}");
            AggregationError::GameBadgesUnavailable { game: game.clone() }
        })?;

        let badges = merge_badges(catalog, &earned);
        debug!(
            game_id = %game.id,
            user_id,
            total = badges.len(),
            "Badges aggregated"
        );
        Ok(badges)
    }

    /// Aggregate every game in order, one after another.
    ///
    /// A failure on one game never prevents the following games from being attempted.
    pub async fn aggregate_all(&self, username: &str, games: &[TrackedGame]) -> Vec<GameReport> {
        let mut reports = Vec::with_capacity(games.len());
        for game in games {
            let result = self.aggregate(username, game).await;
            reports.push(GameReport {
                game: game.clone(),
                result,
            });
        }
        reports
    }

    /// Run a sweep, sending each game's report as soon as it is ready.
    ///
    /// Stops early when the receiver has gone away.
    pub async fn run(self, request: SweepRequest, sender: mpsc::Sender<SweepEvent>) {
        info!(
            username = %request.key.username,
            games = request.games.len(),
            generation = request.key.generation,
            "Sweep started"
        );
        for game in &request.games {
            let result = self.aggregate(&request.key.username, game).await;
            let event = SweepEvent::Report {
                key: request.key.clone(),
                report: GameReport {
                    game: game.clone(),
                    result,
                },
            };
            if sender.send(event).await.is_err() {
                debug!("Sweep receiver closed; stopping");
                return;
            }
        }

        if sender
            .send(SweepEvent::Finished {
                key: request.key.clone(),
            })
            .await
            .is_err()
        {
            debug!("Sweep receiver closed before completion");
        }
    }
}

/// Results collected for the sweep currently in flight.
///
/// Events whose key does not match are from a superseded sweep and are ignored.
#[derive(Debug)]
pub struct SweepState {
    key: SweepKey,
    total: usize,
    reports: HashMap<String, GameReport>,
    finished: bool,
}

impl SweepState {
    /// Start collecting for `request`.
    pub fn new(request: &SweepRequest) -> Self {
        Self {
            key: request.key.clone(),
            total: request.games.len(),
            reports: HashMap::with_capacity(request.games.len()),
            finished: false,
        }
    }

    /// Identity of the sweep being collected.
    pub fn key(&self) -> &SweepKey {
        &self.key
    }

    /// Record an event; returns `false` when it belongs to another sweep.
    pub fn accept(&mut self, event: SweepEvent) -> bool {
        match event {
            SweepEvent::Report { key, report } => {
                if key != self.key {
                    debug!(generation = key.generation, "Dropping stale report");
                    return false;
                }
                self.reports.insert(report.game.id.clone(), report);
                true
            }
            SweepEvent::Finished { key } => {
                if key != self.key {
                    debug!(generation = key.generation, "Dropping stale completion");
                    return false;
                }
                self.finished = true;
                true
            }
        }
    }

    /// Report for one game, once it has arrived.
    pub fn report(&self, game_id: &str) -> Option<&GameReport> {
        self.reports.get(game_id)
    }

    /// Games the sweep covers.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Reports received so far.
    pub fn received(&self) -> usize {
        self.reports.len()
    }

    /// Reports that carry an error.
    pub fn failed(&self) -> usize {
        self.reports
            .values()
            .filter(|report| report.result.is_err())
            .count()
    }

    /// Whether the sweep has signalled completion.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
