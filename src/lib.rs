//! Glow Arcade - deterministic core for small glowing arcade games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, motion, scoring, run lifecycle)
//! - `audio`: Procedural sound descriptors (+ Web Audio renderer on wasm)
//! - `config`: Per-variant tuning, presets and validation
//! - `persistence`: Best-score storage
//! - `platform`: Browser facade

pub mod audio;
pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod sim;

pub use config::{GameConfig, Variant};
pub use error::{ConfigError, SpawnError};
pub use sim::{Arcade, GameEvent, Message, Phase, RunState};

/// Game-wide constants
pub mod consts {
    /// Longest frame the core will simulate in one `advance` (ms). Longer
    /// gaps (tab switch, debugger) are clamped so nothing tunnels.
    pub const MAX_FRAME_MS: f64 = 100.0;
    /// Frame time hosts should use when they have no clock of their own (ms)
    pub const DEFAULT_FRAME_MS: f64 = 1000.0 / 60.0;
}
