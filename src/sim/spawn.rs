//! Spawn scheduling
//!
//! Two gameplay clocks: the wave timer (small batches of collectibles and
//! hazards, interval decaying each wave) and an optional hazard timer whose
//! delay follows the difficulty fraction plus jitter. A third, cosmetic clock
//! drives decorations that live outside the entity pool.
//!
//! All waiting is a deadline compared against the run clock on each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::{Difficulty, lerp_interval};
use super::entity::{Bounds, EntityId, EntityKind, Motion, SpawnAttrs};
use super::player::Player;
use super::pool::EntityPool;
use super::rng::RandomSource;
use crate::config::{
    CountRange, DecorConfig, DifficultyConfig, MotionRule, Placement, SpawnConfig, SpawnRule,
};

/// Placement attempts before an inside spawn gives up
const PLACEMENT_ATTEMPTS: u32 = 8;
/// Clearance kept between a fresh inside spawn and the player
const SAFE_GAP: f32 = 24.0;
/// Keeps above-arena spawns off the side walls
const SIDE_INSET: f32 = 30.0;

/// Inputs shared by every spawn decision in one tick
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    /// Run clock (ms)
    pub now_ms: f64,
    pub difficulty: Difficulty,
    pub bounds: &'a Bounds,
    pub player: &'a Player,
}

/// What one scheduler tick produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnReport {
    /// `(collectibles, hazards)` actually spawned by a wave this tick
    pub wave: Option<(u32, u32)>,
    /// Hazards spawned by the hazard timer
    pub timed_hazards: u32,
    pub spawned: Vec<EntityId>,
    /// Requests refused by the pool or with no safe position
    pub dropped: u32,
}

/// Purely cosmetic particle, never part of collision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub origin: Vec2,
    pub scale: f32,
    pub born_ms: f64,
    pub lifetime_ms: f64,
    /// Total upward float over the lifetime
    pub rise: f32,
}

impl Decoration {
    fn progress(&self, now_ms: f64) -> f32 {
        ((now_ms - self.born_ms) / self.lifetime_ms).clamp(0.0, 1.0) as f32
    }

    /// Position at `now_ms`
    pub fn pos(&self, now_ms: f64) -> Vec2 {
        self.origin - Vec2::new(0.0, self.rise * self.progress(now_ms))
    }

    /// Fades from 0.6 to 0 over the lifetime
    pub fn alpha(&self, now_ms: f64) -> f32 {
        0.6 * (1.0 - self.progress(now_ms))
    }
}

/// Decides when and what to spawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    config: SpawnConfig,
    interval_floor_ms: f64,
    interval_ceiling_ms: f64,
    interval_decay: f64,
    /// Stored wave interval, decays each wave
    wave_interval_ms: f64,
    next_wave_at_ms: Option<f64>,
    next_hazard_at_ms: Option<f64>,
    next_decor_at_ms: Option<f64>,
    decorations: Vec<Decoration>,
}

impl SpawnScheduler {
    pub fn new(config: &SpawnConfig, difficulty: &DifficultyConfig) -> Self {
        Self {
            config: config.clone(),
            interval_floor_ms: difficulty.interval_min_ms,
            interval_ceiling_ms: difficulty.interval_max_ms,
            interval_decay: difficulty.interval_decay,
            wave_interval_ms: difficulty.interval_max_ms,
            next_wave_at_ms: None,
            next_hazard_at_ms: None,
            next_decor_at_ms: None,
            decorations: Vec::new(),
        }
    }

    /// Arm every clock with its initial interval, counted from run time `now_ms`
    pub fn reset(&mut self, now_ms: f64, rng: &mut RandomSource) {
        self.wave_interval_ms = self.interval_ceiling_ms;
        self.next_wave_at_ms = self.config.wave.map(|_| now_ms + self.wave_interval_ms);
        self.next_hazard_at_ms = self
            .config
            .hazard_timer
            .map(|timer| now_ms + timer.interval_max_ms + jitter(rng, timer.jitter_ms));
        self.next_decor_at_ms = self.config.decor.map(|decor| now_ms + decor.interval_ms);
        self.decorations.clear();
    }

    /// Invalidate every pending deadline; nothing fires until the next `reset`
    pub fn cancel(&mut self) {
        self.next_wave_at_ms = None;
        self.next_hazard_at_ms = None;
        self.next_decor_at_ms = None;
    }

    pub fn next_wave_at_ms(&self) -> Option<f64> {
        self.next_wave_at_ms
    }

    pub fn next_hazard_at_ms(&self) -> Option<f64> {
        self.next_hazard_at_ms
    }

    pub fn wave_interval_ms(&self) -> f64 {
        self.wave_interval_ms
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Place the opening collectibles
    pub fn populate(
        &mut self,
        ctx: &SpawnContext<'_>,
        pool: &mut EntityPool,
        rng: &mut RandomSource,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();
        for _ in 0..self.config.initial_collectibles {
            self.spawn_one(EntityKind::Collectible, ctx, pool, rng, &mut report);
        }
        report
    }

    /// Fire whichever gameplay deadlines have passed (at most one wave and one
    /// timed hazard per tick)
    pub fn tick(
        &mut self,
        ctx: &SpawnContext<'_>,
        pool: &mut EntityPool,
        rng: &mut RandomSource,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();

        if let (Some(at), Some(wave)) = (self.next_wave_at_ms, self.config.wave) {
            if ctx.now_ms >= at {
                let collectibles = self.spawn_batch(
                    EntityKind::Collectible,
                    wave.collectibles,
                    ctx,
                    pool,
                    rng,
                    &mut report,
                );
                let hazards =
                    self.spawn_batch(EntityKind::Hazard, wave.hazards, ctx, pool, rng, &mut report);
                report.wave = Some((collectibles, hazards));

                let interval = self
                    .wave_interval_ms
                    .min(ctx.difficulty.spawn_interval_ms)
                    .clamp(self.interval_floor_ms, self.interval_ceiling_ms);
                self.next_wave_at_ms = Some(ctx.now_ms + interval);
                self.wave_interval_ms =
                    (self.wave_interval_ms * self.interval_decay).max(self.interval_floor_ms);
                log::debug!(
                    "wave at {:.0}ms: {} collectibles, {} hazards, next in {:.0}ms",
                    ctx.now_ms,
                    collectibles,
                    hazards,
                    interval
                );
            }
        }

        if let (Some(at), Some(timer)) = (self.next_hazard_at_ms, self.config.hazard_timer) {
            if ctx.now_ms >= at {
                if self
                    .spawn_one(EntityKind::Hazard, ctx, pool, rng, &mut report)
                    .is_some()
                {
                    report.timed_hazards += 1;
                }
                let delay =
                    lerp_interval(ctx.difficulty.fraction, timer.interval_max_ms, timer.interval_min_ms);
                self.next_hazard_at_ms = Some(ctx.now_ms + delay + jitter(rng, timer.jitter_ms));
            }
        }

        report
    }

    /// Top collectibles back up to the target population
    pub fn replenish(
        &mut self,
        ctx: &SpawnContext<'_>,
        pool: &mut EntityPool,
        rng: &mut RandomSource,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();
        let target = self.config.target_collectibles as usize;
        let missing = target.saturating_sub(pool.count(EntityKind::Collectible));
        for _ in 0..missing {
            if self
                .spawn_one(EntityKind::Collectible, ctx, pool, rng, &mut report)
                .is_none()
            {
                break;
            }
        }
        report
    }

    /// Advance the cosmetic layer. Uses its own RNG so toggling decorations
    /// never changes gameplay.
    pub fn tick_decor(&mut self, now_ms: f64, bounds: &Bounds, rng: &mut RandomSource) {
        self.decorations
            .retain(|d| now_ms - d.born_ms < d.lifetime_ms);

        let (Some(at), Some(decor)) = (self.next_decor_at_ms, self.config.decor) else {
            return;
        };
        if now_ms >= at {
            self.decorations.push(make_decoration(&decor, now_ms, bounds, rng));
            self.next_decor_at_ms = Some(now_ms + decor.interval_ms);
        }
    }

    fn spawn_batch(
        &self,
        kind: EntityKind,
        counts: CountRange,
        ctx: &SpawnContext<'_>,
        pool: &mut EntityPool,
        rng: &mut RandomSource,
        report: &mut SpawnReport,
    ) -> u32 {
        let count = rng.uniform_int(counts.min as i32, counts.max as i32).max(0) as u32;
        (0..count)
            .filter(|_| self.spawn_one(kind, ctx, pool, rng, report).is_some())
            .count() as u32
    }

    fn spawn_one(
        &self,
        kind: EntityKind,
        ctx: &SpawnContext<'_>,
        pool: &mut EntityPool,
        rng: &mut RandomSource,
        report: &mut SpawnReport,
    ) -> Option<EntityId> {
        let rule = match kind {
            EntityKind::Collectible => self.config.collectible,
            EntityKind::Hazard => self.config.hazard,
        };

        let Some((pos, vel, attrs)) = roll_spawn(&rule, ctx, rng) else {
            log::trace!("{kind:?} spawn skipped: no clear position");
            report.dropped += 1;
            return None;
        };

        match pool.spawn(kind, pos, vel, attrs, ctx.now_ms) {
            Ok(id) => {
                report.spawned.push(id);
                Some(id)
            }
            Err(err) => {
                log::trace!("spawn dropped: {err}");
                report.dropped += 1;
                None
            }
        }
    }
}

fn jitter(rng: &mut RandomSource, jitter_ms: f64) -> f64 {
    if jitter_ms > 0.0 {
        rng.uniform(0.0, jitter_ms as f32) as f64
    } else {
        0.0
    }
}

/// Draw position, velocity and attributes for one spawn
fn roll_spawn(
    rule: &SpawnRule,
    ctx: &SpawnContext<'_>,
    rng: &mut RandomSource,
) -> Option<(Vec2, Vec2, SpawnAttrs)> {
    let bounds = ctx.bounds;
    let multiplier = ctx.difficulty.speed_multiplier as f32;
    let scale = rng.uniform(rule.scale.min, rule.scale.max);
    let base_speed = rng.uniform(rule.speed.min, rule.speed.max);
    let drift = rng.uniform(rule.drift.min, rule.drift.max);

    let (pos, vel) = match rule.placement {
        Placement::Above { offset } => {
            let x = rng.uniform(bounds.min.x + SIDE_INSET, bounds.max.x - SIDE_INSET);
            let pos = Vec2::new(x, bounds.min.y - offset);
            (pos, Vec2::new(drift, base_speed * multiplier))
        }
        Placement::Edges { offset } => {
            let pos = match rng.uniform_int(0, 3) {
                0 => Vec2::new(bounds.min.x - offset, rng.uniform(bounds.min.y, bounds.max.y)),
                1 => Vec2::new(bounds.max.x + offset, rng.uniform(bounds.min.y, bounds.max.y)),
                2 => Vec2::new(rng.uniform(bounds.min.x, bounds.max.x), bounds.min.y - offset),
                _ => Vec2::new(rng.uniform(bounds.min.x, bounds.max.x), bounds.max.y + offset),
            };
            let inward = (bounds.center() - pos).normalize_or_zero();
            let across = inward.perp() * drift;
            (pos, inward * base_speed * multiplier + across)
        }
        Placement::Inside { inset } => {
            let clearance = ctx.player.collision_radius() + rule.radius * scale + SAFE_GAP;
            let pos = (0..PLACEMENT_ATTEMPTS).find_map(|_| {
                let p = Vec2::new(
                    rng.uniform(bounds.min.x + inset, bounds.max.x - inset),
                    rng.uniform(bounds.min.y + inset, bounds.max.y - inset),
                );
                (p.distance(ctx.player.pos) > clearance).then_some(p)
            })?;
            let vel = Vec2::new(drift, rng.uniform(rule.drift.min, rule.drift.max));
            (pos, vel)
        }
    };

    let (motion, vel) = match rule.motion {
        MotionRule::Drift => (Motion::Drift, vel),
        MotionRule::Bounce => (Motion::Bounce, vel),
        // Homing velocity is recomputed by the pool every tick
        MotionRule::Homing => (Motion::Homing { base_speed }, Vec2::ZERO),
    };

    let attrs = SpawnAttrs {
        radius: rule.radius,
        scale,
        motion,
        ttl_ms: rule.ttl_ms,
    };
    Some((pos, vel, attrs))
}

fn make_decoration(
    decor: &DecorConfig,
    now_ms: f64,
    bounds: &Bounds,
    rng: &mut RandomSource,
) -> Decoration {
    let origin = Vec2::new(
        rng.uniform(bounds.min.x, bounds.max.x),
        rng.uniform(bounds.min.y, bounds.min.y + decor.band_height),
    );
    Decoration {
        origin,
        scale: rng.uniform(decor.scale.min, decor.scale.max),
        born_ms: now_ms,
        lifetime_ms: rng.uniform(decor.lifetime_ms.min, decor.lifetime_ms.max) as f64,
        rise: rng.uniform(decor.rise.min, decor.rise.max),
    }
}
