//! Error types
//!
//! Only configuration problems are fatal. Everything the simulation runs into
//! at tick time is either clamped or reported through [`SpawnError`], which
//! callers drop on the floor.

use thiserror::Error;

use crate::sim::EntityKind;

/// Rejected configuration (the only error that should abort startup)
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(String),
    #[error("arena bounds must have positive size, got {width}x{height}")]
    EmptyArena { width: f32, height: f32 },
    #[error("{name}: minimum {min} is greater than maximum {max}")]
    InvertedRange { name: &'static str, min: f64, max: f64 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("spawn interval decay must be in (0, 1], got {0}")]
    BadDecay(f64),
    #[error("pad scale must contain at least one step")]
    EmptyScale,
    #[error("drone needs at least one voice")]
    EmptyDrone,
    #[error("config is for {found}, expected {expected}")]
    VariantMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{name} must be in [{lo}, {hi}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },
}

/// Spawn refused by the entity pool
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("{kind:?} cap of {cap} reached")]
    CapacityExceeded { kind: EntityKind, cap: u32 },
}
