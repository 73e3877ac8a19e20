//! Transient entities and the arena they move in

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;

/// Unique, monotonically assigned entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved for the player; pool ids start at 1
    pub const PLAYER: EntityId = EntityId(0);
}

/// Gameplay role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Collectible,
    Hazard,
}

/// Per-entity motion model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Straight line at constant velocity
    Drift,
    /// Straight line, reflecting off the arena walls
    Bounce,
    /// Re-aims at the player every tick
    Homing { base_speed: f32 },
}

/// Everything about a spawn besides kind, position and velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnAttrs {
    pub radius: f32,
    pub scale: f32,
    pub motion: Motion,
    pub ttl_ms: Option<f64>,
}

impl Default for SpawnAttrs {
    fn default() -> Self {
        Self {
            radius: 10.0,
            scale: 1.0,
            motion: Motion::Drift,
            ttl_ms: None,
        }
    }
}

/// A collectible or hazard owned by the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision radius at scale 1.0
    pub radius: f32,
    pub scale: f32,
    pub motion: Motion,
    /// Run clock at spawn (ms)
    pub spawn_time_ms: f64,
    /// Lifetime (ms); `None` lives until culled or collected
    pub ttl_ms: Option<f64>,
    pub alive: bool,
}

impl Entity {
    /// Radius used for overlap tests
    pub fn collision_radius(&self) -> f32 {
        self.radius * self.scale
    }

    /// Whether the lifetime has run out at run time `now_ms`
    pub fn expired(&self, now_ms: f64) -> bool {
        self.ttl_ms
            .is_some_and(|ttl| now_ms - self.spawn_time_ms >= ttl)
    }
}

/// Axis-aligned arena rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_arena(arena: &ArenaConfig) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(arena.width, arena.height))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// True when `p` lies strictly beyond the bounds grown by `margin`.
    /// A point exactly on the grown edge is still inside.
    pub fn outside_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x < self.min.x - margin
            || p.x > self.max.x + margin
            || p.y < self.min.y - margin
            || p.y > self.max.y + margin
    }

    /// Clamp a point into the bounds shrunk by `padding`
    pub fn clamp(&self, p: Vec2, padding: f32) -> Vec2 {
        let lo = self.min + Vec2::splat(padding);
        let hi = (self.max - Vec2::splat(padding)).max(lo);
        p.clamp(lo, hi)
    }
}
