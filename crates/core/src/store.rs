//! Tracked-game persistence.
//!
//! The list of tracked games lives in a single named slot of a key-value
//! store and is rewritten in full after every mutation.

use std::{
    collections::{HashMap, HashSet},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{error::TrackError, models::TrackedGame, registration};

/// A key-value store holding string payloads under named slots.
pub trait SlotStorage: Send + Sync {
    /// Read the payload stored under `key`, if any.
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    /// Replace the payload stored under `key`.
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Slot storage backed by one JSON file per slot.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the file holding `key`.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_component(key)))
    }
}

impl SlotStorage for FileStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.slot_path(key)).map_err(|err| err.error)?;
        Ok(())
    }
}

/// In-process slot storage.
#[derive(Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage with one pre-populated slot.
    pub fn with_slot(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .slots
            .lock()
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: SlotStorage + ?Sized> SlotStorage for std::sync::Arc<S> {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        (**self).write(key, value)
    }
}

/// Ordered, duplicate-free list of tracked games mirrored to a storage slot.
pub struct TrackedGameStore {
    storage: Box<dyn SlotStorage>,
    key: String,
    games: Vec<TrackedGame>,
    version: u64,
}

impl TrackedGameStore {
    /// Load the list stored under `key`.
    ///
    /// An absent, unreadable, or malformed slot yields an empty list.
    pub fn load(storage: impl SlotStorage + 'static, key: impl Into<String>) -> Self {
        let key = key.into();
        let games = match storage.read(&key) {
            Ok(Some(payload)) => parse_payload(&key, &payload),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(slot = %key, "Failed to read tracked games: {err}");
                Vec::new()
            }
        };
        info!(slot = %key, total = games.len(), "Tracked games loaded");
        Self {
            storage: Box::new(storage),
            key,
            games,
            version: 0,
        }
    }

    /// Open the file-backed store under `root`.
    pub fn open(root: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self::load(FileStorage::new(root.as_ref()), key)
    }

    /// Snapshot of the tracked games in insertion order.
    pub fn list(&self) -> &[TrackedGame] {
        &self.games
    }

    /// Whether `id` is tracked.
    pub fn contains(&self, id: &str) -> bool {
        self.games.iter().any(|game| game.id == id)
    }

    /// Look up a tracked game by identifier.
    pub fn get(&self, id: &str) -> Option<&TrackedGame> {
        self.games.iter().find(|game| game.id == id)
    }

    /// Number of tracked games.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no games are tracked.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Counter bumped on every successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Append a game and persist the list.
    ///
    /// Rejects malformed identifiers and ones already present. If persisting
    /// fails the append is undone, so memory and storage stay identical.
    pub fn add(&mut self, id: &str, name: Option<String>) -> Result<(), TrackError> {
        if !registration::is_identifier(id) {
            return Err(TrackError::InvalidIdentifier(id.to_string()));
        }
        if self.contains(id) {
            return Err(TrackError::AlreadyTracked(id.to_string()));
        }
        self.games.push(TrackedGame::new(id, name));
        if let Err(err) = self.persist() {
            self.games.pop();
            return Err(err);
        }
        self.version += 1;
        info!(game_id = id, "Game tracked");
        Ok(())
    }

    /// Remove every entry matching `id` and persist the list.
    ///
    /// Returns `false` without touching storage when `id` is not tracked.
    pub fn remove(&mut self, id: &str) -> Result<bool, TrackError> {
        if !self.contains(id) {
            debug!(game_id = id, "Remove ignored; game not tracked");
            return Ok(false);
        }
        let previous = self.games.clone();
        self.games.retain(|game| game.id != id);
        if let Err(err) = self.persist() {
            self.games = previous;
            return Err(err);
        }
        self.version += 1;
        info!(game_id = id, "Game removed");
        Ok(true)
    }

    fn persist(&self) -> Result<(), TrackError> {
        let serialised = serde_json::to_string(&self.games)?;
        self.storage.write(&self.key, &serialised)?;
        Ok(())
    }
}

fn parse_payload(key: &str, payload: &str) -> Vec<TrackedGame> {
    let games: Vec<TrackedGame> = match serde_json::from_str(payload) {
        Ok(games) => games,
        Err(err) => {
            warn!(slot = %key, "Ignoring malformed tracked games: {err}");
            return Vec::new();
        }
    };

    let total = games.len();
    let valid: Vec<TrackedGame> = games
        .into_iter()
        .filter(|game| registration::is_identifier(&game.id))
        .collect();
    if valid.len() != total {
        warn!(
            slot = %key,
            dropped = total - valid.len(),
            "Dropped tracked games with invalid identifiers"
        );
    }

    let mut seen = HashSet::new();
    let total = valid.len();
    let unique: Vec<TrackedGame> = valid
        .into_iter()
        .filter(|game| seen.insert(game.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(
            slot = %key,
            dropped = total - unique.len(),
            "Collapsed duplicate tracked games"
        );
    }
    unique
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "slot".to_string()
    } else {
        result
    }
}
