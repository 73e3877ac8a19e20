//! Deterministic simulation core
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Seeded RNG only, separate streams for gameplay / audio / cosmetics
//! - Stable iteration order (pool insertion order = id order)
//! - Every timer is a deadline on the run clock
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod entity;
pub mod player;
pub mod pool;
pub mod resolve;
pub mod rng;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{circles_overlap, player_overlaps};
pub use difficulty::{Difficulty, DifficultyCurve};
pub use entity::{Bounds, Entity, EntityId, EntityKind, Motion, SpawnAttrs};
pub use player::{Directional, Player};
pub use pool::{EntityPool, EvictReason, Evicted, MotionContext};
pub use resolve::{CollisionResolver, Resolution};
pub use rng::RandomSource;
pub use spawn::{Decoration, SpawnReport, SpawnScheduler};
pub use state::{BurstKind, EntityView, GameEvent, Message, Phase, RunState};
pub use tick::{Arcade, clamp_dt};
