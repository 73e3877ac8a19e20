//! Owner of every live collectible and hazard
//!
//! Entities live in a `Vec` kept in insertion (= id) order so traversal is
//! stable across runs with the same seed. Dead entities are evicted in the
//! same call that kills them; nothing ever iterates a dead entity.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Bounds, Entity, EntityId, EntityKind, Motion, SpawnAttrs};
use crate::config::PoolConfig;
use crate::error::SpawnError;

/// Why an entity left the pool during [`EntityPool::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictReason {
    /// Left the arena plus margin
    Culled,
    /// Lifetime ran out
    Expired,
}

/// Record of an entity removed by `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evicted {
    pub id: EntityId,
    pub kind: EntityKind,
    pub reason: EvictReason,
}

/// Per-tick inputs for entity motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionContext {
    /// Run clock after this tick (ms)
    pub now_ms: f64,
    pub player_pos: Vec2,
    pub speed_multiplier: f32,
}

/// Exclusive owner of all transient entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPool {
    config: PoolConfig,
    entities: Vec<Entity>,
    next_id: u32,
}

impl EntityPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            entities: Vec::new(),
            next_id: 1,
        }
    }

    pub fn cap(&self, kind: EntityKind) -> u32 {
        match kind {
            EntityKind::Collectible => self.config.collectible_cap,
            EntityKind::Hazard => self.config.hazard_cap,
        }
    }

    fn margin(&self, kind: EntityKind) -> f32 {
        match kind {
            EntityKind::Collectible => self.config.collectible_margin,
            EntityKind::Hazard => self.config.hazard_margin,
        }
    }

    /// Live entities of one kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Create an entity. Fails with `CapacityExceeded` at the per-kind cap.
    pub fn spawn(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        vel: Vec2,
        attrs: SpawnAttrs,
        now_ms: f64,
    ) -> Result<EntityId, SpawnError> {
        let cap = self.cap(kind);
        if self.count(kind) >= cap as usize {
            return Err(SpawnError::CapacityExceeded { kind, cap });
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(Entity {
            id,
            kind,
            pos,
            vel,
            radius: attrs.radius,
            scale: attrs.scale,
            motion: attrs.motion,
            spawn_time_ms: now_ms,
            ttl_ms: attrs.ttl_ms,
            alive: true,
        });
        Ok(id)
    }

    /// Move every entity by `velocity * dt`, then evict whatever left the
    /// arena (strictly past `bounds` grown by the kind's margin) or expired.
    pub fn tick(&mut self, dt_ms: f64, bounds: &Bounds, ctx: &MotionContext) -> Vec<Evicted> {
        let dt = (dt_ms / 1000.0) as f32;
        let mut evicted = Vec::new();

        for i in 0..self.entities.len() {
            let margin = self.margin(self.entities[i].kind);
            let entity = &mut self.entities[i];

            match entity.motion {
                Motion::Drift => {
                    entity.pos += entity.vel * dt;
                }
                Motion::Homing { base_speed } => {
                    let to_player = (ctx.player_pos - entity.pos).normalize_or_zero();
                    entity.vel = to_player * base_speed * ctx.speed_multiplier;
                    entity.pos += entity.vel * dt;
                }
                Motion::Bounce => {
                    entity.pos += entity.vel * dt;
                    bounce(entity, bounds);
                }
            }

            let reason = if entity.expired(ctx.now_ms) {
                Some(EvictReason::Expired)
            } else if bounds.outside_margin(entity.pos, margin) {
                Some(EvictReason::Culled)
            } else {
                None
            };

            if let Some(reason) = reason {
                entity.alive = false;
                evicted.push(Evicted {
                    id: entity.id,
                    kind: entity.kind,
                    reason,
                });
            }
        }

        if !evicted.is_empty() {
            self.entities.retain(|e| e.alive);
        }
        evicted
    }

    /// Remove by id. Missing ids are a no-op and return `None`.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        let mut entity = self.entities.remove(index);
        entity.alive = false;
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Read-only traversal in insertion order
    pub fn for_each_alive(&self, mut f: impl FnMut(&Entity)) {
        for entity in self.entities.iter().filter(|e| e.alive) {
            f(entity);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Drop everything. Ids keep counting so stale references from an
    /// earlier run can never match a new entity.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

fn bounce(entity: &mut Entity, bounds: &Bounds) {
    let r = entity.collision_radius();
    let lo = bounds.min + Vec2::splat(r);
    let hi = (bounds.max - Vec2::splat(r)).max(lo);

    if entity.pos.x < lo.x {
        entity.pos.x = lo.x + (lo.x - entity.pos.x);
        entity.vel.x = entity.vel.x.abs();
    } else if entity.pos.x > hi.x {
        entity.pos.x = hi.x - (entity.pos.x - hi.x);
        entity.vel.x = -entity.vel.x.abs();
    }
    if entity.pos.y < lo.y {
        entity.pos.y = lo.y + (lo.y - entity.pos.y);
        entity.vel.y = entity.vel.y.abs();
    } else if entity.pos.y > hi.y {
        entity.pos.y = hi.y - (entity.pos.y - hi.y);
        entity.vel.y = -entity.vel.y.abs();
    }
    entity.pos = entity.pos.clamp(lo, hi);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> EntityPool {
        EntityPool::new(PoolConfig {
            collectible_cap: 30,
            hazard_cap: 8,
            collectible_margin: 50.0,
            hazard_margin: 50.0,
        })
    }

    fn bounds() -> Bounds {
        Bounds::new(Vec2::ZERO, Vec2::new(800.0, 600.0))
    }

    fn ctx(now_ms: f64) -> MotionContext {
        MotionContext {
            now_ms,
            player_pos: Vec2::new(400.0, 520.0),
            speed_multiplier: 1.0,
        }
    }

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let mut pool = pool();
        let a = pool
            .spawn(EntityKind::Collectible, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .unwrap();
        let b = pool
            .spawn(EntityKind::Hazard, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .unwrap();
        pool.clear();
        let c = pool
            .spawn(EntityKind::Hazard, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .unwrap();
        assert!(a < b && b < c);
        assert_ne!(a, EntityId::PLAYER);
    }

    #[test]
    fn test_hazard_cap() {
        let mut pool = pool();
        for _ in 0..8 {
            pool.spawn(EntityKind::Hazard, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
                .unwrap();
        }
        let err = pool
            .spawn(EntityKind::Hazard, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            SpawnError::CapacityExceeded {
                kind: EntityKind::Hazard,
                cap: 8
            }
        );
        assert_eq!(pool.count(EntityKind::Hazard), 8);
        // Collectibles have their own cap
        assert!(pool
            .spawn(EntityKind::Collectible, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .is_ok());
    }

    #[test]
    fn test_tick_moves_by_velocity_times_dt() {
        let mut pool = pool();
        let id = pool
            .spawn(
                EntityKind::Collectible,
                Vec2::new(100.0, 0.0),
                Vec2::new(0.0, 100.0),
                SpawnAttrs::default(),
                0.0,
            )
            .unwrap();
        let evicted = pool.tick(500.0, &bounds(), &ctx(500.0));
        assert!(evicted.is_empty());
        assert_eq!(pool.get(id).unwrap().pos, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_cull_past_margin() {
        let mut pool = pool();
        let id = pool
            .spawn(
                EntityKind::Hazard,
                Vec2::new(400.0, 640.0),
                Vec2::new(0.0, 100.0),
                SpawnAttrs::default(),
                0.0,
            )
            .unwrap();
        // 640 + 10 = 650: exactly on the margin, retained
        assert!(pool.tick(100.0, &bounds(), &ctx(100.0)).is_empty());
        assert!(pool.get(id).is_some());
        // 660 > 650: culled
        let evicted = pool.tick(100.0, &bounds(), &ctx(200.0));
        assert_eq!(
            evicted,
            vec![Evicted {
                id,
                kind: EntityKind::Hazard,
                reason: EvictReason::Culled
            }]
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn test_ttl_expiry() {
        let mut pool = pool();
        let attrs = SpawnAttrs {
            ttl_ms: Some(3000.0),
            ..SpawnAttrs::default()
        };
        pool.spawn(EntityKind::Hazard, Vec2::new(300.0, 300.0), Vec2::ZERO, attrs, 0.0)
            .unwrap();
        assert!(pool.tick(100.0, &bounds(), &ctx(2900.0)).is_empty());
        let evicted = pool.tick(100.0, &bounds(), &ctx(3000.0));
        assert_eq!(evicted[0].reason, EvictReason::Expired);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut pool = pool();
        let a = pool
            .spawn(EntityKind::Collectible, Vec2::ZERO, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .unwrap();
        let b = pool
            .spawn(EntityKind::Collectible, Vec2::ONE, Vec2::ZERO, SpawnAttrs::default(), 0.0)
            .unwrap();
        let removed = pool.remove(a).unwrap();
        assert!(!removed.alive);
        let after_once: Vec<_> = pool.iter().cloned().collect();
        assert!(pool.remove(a).is_none());
        let after_twice: Vec<_> = pool.iter().cloned().collect();
        assert_eq!(after_once, after_twice);
        assert_eq!(pool.get(b).map(|e| e.id), Some(b));
    }

    #[test]
    fn test_homing_moves_toward_player() {
        let mut pool = pool();
        let attrs = SpawnAttrs {
            motion: Motion::Homing { base_speed: 50.0 },
            ..SpawnAttrs::default()
        };
        let id = pool
            .spawn(EntityKind::Hazard, Vec2::new(400.0, -40.0), Vec2::ZERO, attrs, 0.0)
            .unwrap();
        let mut c = ctx(1000.0);
        c.speed_multiplier = 2.0;
        pool.tick(1000.0, &bounds(), &c);
        let e = pool.get(id).unwrap();
        assert!((e.pos.y - 60.0).abs() < 1e-3);
        assert!((e.vel.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_bounce_stays_inside() {
        let mut pool = pool();
        let attrs = SpawnAttrs {
            radius: 8.0,
            motion: Motion::Bounce,
            ..SpawnAttrs::default()
        };
        let id = pool
            .spawn(
                EntityKind::Collectible,
                Vec2::new(10.0, 300.0),
                Vec2::new(-30.0, 0.0),
                attrs,
                0.0,
            )
            .unwrap();
        for step in 1..=100 {
            assert!(pool.tick(100.0, &bounds(), &ctx(step as f64 * 100.0)).is_empty());
        }
        let e = pool.get(id).unwrap();
        assert!(e.pos.x >= 8.0);
        assert!(e.vel.x > 0.0);
    }

    #[test]
    fn test_for_each_alive_in_insertion_order() {
        let mut pool = pool();
        let ids: Vec<_> = (0..5)
            .map(|i| {
                pool.spawn(
                    EntityKind::Collectible,
                    Vec2::splat(i as f32),
                    Vec2::ZERO,
                    SpawnAttrs::default(),
                    0.0,
                )
                .unwrap()
            })
            .collect();
        pool.remove(ids[2]);
        let mut seen = Vec::new();
        pool.for_each_alive(|e| seen.push(e.id));
        assert_eq!(seen, vec![ids[0], ids[1], ids[3], ids[4]]);
    }
}
