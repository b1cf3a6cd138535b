#![warn(clippy::all, missing_docs)]

//! Core domain logic for the badge tracker.
//!
//! This crate hosts the tracked-game store, the HTTP lookups against the
//! game platform, and the aggregation that merges a game's badge catalog
//! with a player's earned badges. Rendering lives in the terminal front end.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod registration;
pub mod store;
pub mod tracker;

pub use aggregate::{merge_badges, BadgeAggregator, GameReport, SweepEvent, SweepState};
pub use api::{BadgeApi, LookupError, RobloxClient};
pub use config::AppConfig;
pub use error::{AggregationError, TrackError};
pub use models::{AnnotatedBadge, Badge, EarnedBadge, GameProgress, TrackedGame};
pub use store::{FileStorage, MemoryStorage, SlotStorage, TrackedGameStore};
pub use tracker::{SweepKey, SweepRequest, Tracker};
