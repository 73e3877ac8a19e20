//! Best-score persistence
//!
//! The core only calls [`BestScoreStore::load_best`] at startup and
//! [`BestScoreStore::on_new_best`] when a run raises the best. Stores keep one
//! value per game variant in a small JSON record. A missing or unreadable
//! record loads as 0; failed writes are logged and otherwise ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Variant;

/// Durable home for the best score
pub trait BestScoreStore {
    /// Prior best, 0 if none was ever stored
    fn load_best(&self) -> u64;
    /// A run just raised the best to `value`
    fn on_new_best(&mut self, value: u64);
}

/// Per-variant bests as stored on disk / in LocalStorage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScores {
    pub best: BTreeMap<String, u64>,
}

impl BestScores {
    pub fn get(&self, variant: Variant) -> u64 {
        self.best.get(variant.as_str()).copied().unwrap_or(0)
    }

    /// Raise the stored value; never lowers it
    pub fn raise(&mut self, variant: Variant, value: u64) -> bool {
        let slot = self.best.entry(variant.as_str().to_string()).or_insert(0);
        if value > *slot {
            *slot = value;
            true
        } else {
            false
        }
    }

    fn parse(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable best-score record: {e}");
            Self::default()
        })
    }
}

/// Keeps the best in memory only (tests, demo runs)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub best: u64,
    /// How many times `on_new_best` fired
    pub updates: u32,
}

impl MemoryStore {
    pub fn new(best: u64) -> Self {
        Self { best, updates: 0 }
    }
}

impl BestScoreStore for MemoryStore {
    fn load_best(&self) -> u64 {
        self.best
    }

    fn on_new_best(&mut self, value: u64) {
        self.best = self.best.max(value);
        self.updates += 1;
    }
}

/// JSON file on the local filesystem (native builds)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: std::path::PathBuf,
    variant: Variant,
}

#[cfg(not(target_arch = "wasm32"))]
impl JsonFileStore {
    pub fn new(path: impl Into<std::path::PathBuf>, variant: Variant) -> Self {
        Self {
            path: path.into(),
            variant,
        }
    }

    fn read(&self) -> BestScores {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => BestScores::parse(&json),
            Err(_) => BestScores::default(),
        }
    }

    /// Write `value` if it beats the stored best
    pub fn save(&self, value: u64) -> std::io::Result<()> {
        let mut scores = self.read();
        if !scores.raise(self.variant, value) {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&scores)?;
        std::fs::write(&self.path, json)?;
        log::info!(
            "Best score for {} saved to {}",
            self.variant.as_str(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl BestScoreStore for JsonFileStore {
    fn load_best(&self) -> u64 {
        self.read().get(self.variant)
    }

    fn on_new_best(&mut self, value: u64) {
        if let Err(e) = self.save(value) {
            log::warn!("Failed to save best score: {e}");
        }
    }
}

/// Browser LocalStorage (wasm builds)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    variant: Variant,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    const STORAGE_KEY: &'static str = "glow_arcade_best";

    pub fn new(variant: Variant) -> Self {
        Self { variant }
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }

    fn read() -> BestScores {
        Self::storage()
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten())
            .map(|json| BestScores::parse(&json))
            .unwrap_or_default()
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStorageStore {
    fn load_best(&self) -> u64 {
        Self::read().get(self.variant)
    }

    fn on_new_best(&mut self, value: u64) {
        let mut scores = Self::read();
        if !scores.raise(self.variant, value) {
            return;
        }
        let Some(storage) = Self::storage() else { return };
        if let Ok(json) = serde_json::to_string(&scores) {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("Best score saved ({value})");
        }
    }
}
