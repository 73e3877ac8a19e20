//! The run state machine and per-tick advance
//!
//! `Arcade` owns every component. Hosts push typed [`Message`]s in, call
//! [`Arcade::advance`] once per frame, and drain [`GameEvent`]s out. Nothing
//! outside `advance` mutates the pool.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::{Difficulty, DifficultyCurve};
use super::entity::{Bounds, EntityId};
use super::player::{Directional, Player};
use super::pool::{EntityPool, MotionContext};
use super::resolve::{CollisionResolver, Resolution};
use super::rng::{COSMETIC_STREAM, RandomSource};
use super::spawn::{Decoration, SpawnContext, SpawnScheduler};
use super::state::{BurstKind, EntityView, GameEvent, Message, Phase, RunState};
use crate::audio::{AmbientAudioSynthesizer, AmbientVoice};
use crate::config::GameConfig;
use crate::consts::MAX_FRAME_MS;
use crate::error::ConfigError;

/// Clamp a host-supplied frame time. Negative and NaN count as no time.
pub fn clamp_dt(dt_ms: f64) -> f64 {
    if dt_ms.is_nan() || dt_ms <= 0.0 {
        0.0
    } else {
        dt_ms.min(MAX_FRAME_MS)
    }
}

/// One game instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arcade {
    config: GameConfig,
    seed: u64,
    run: RunState,
    bounds: Bounds,
    curve: DifficultyCurve,
    pool: EntityPool,
    player: Player,
    scheduler: SpawnScheduler,
    resolver: CollisionResolver,
    audio: AmbientAudioSynthesizer,
    rng: RandomSource,
    cosmetic_rng: RandomSource,
    /// Fractional survival points not yet credited
    survival_carry: f64,
    inbox: Vec<Message>,
    #[serde(skip)]
    outbox: Vec<GameEvent>,
}

impl Arcade {
    /// Validate `config` and build an idle instance. `best` comes from the
    /// persistence collaborator (0 if absent).
    pub fn new(config: GameConfig, seed: u64, best: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            run: RunState::new(best),
            bounds: Bounds::from_arena(&config.arena),
            curve: DifficultyCurve::from_config(&config.difficulty),
            pool: EntityPool::new(config.pool),
            player: Player::new(&config.player),
            scheduler: SpawnScheduler::new(&config.spawn, &config.difficulty),
            resolver: CollisionResolver::new(config.scoring, config.hazard_policy),
            audio: AmbientAudioSynthesizer::new(&config.audio, seed),
            rng: RandomSource::new(seed),
            cosmetic_rng: RandomSource::with_stream(seed, COSMETIC_STREAM),
            survival_carry: 0.0,
            inbox: Vec::new(),
            outbox: Vec::new(),
            config,
            seed,
        })
    }

    /// Rebuild from a bare `RunState`. A running state restarts the clocks at
    /// its elapsed time with an empty arena.
    pub fn resume(config: GameConfig, seed: u64, state: RunState) -> Result<Self, ConfigError> {
        let mut arcade = Self::new(config, seed, state.best)?;
        match state.phase {
            Phase::Running => arcade.begin_run(Some(state)),
            Phase::Idle | Phase::GameOver => arcade.run = state,
        }
        arcade.outbox.clear();
        Ok(arcade)
    }

    /// Full snapshot, RNG state included
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a snapshot written by [`Arcade::to_json`]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let arcade: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        arcade.config.validate()?;
        Ok(arcade)
    }

    // === Input ===

    /// Queue a message for the next `advance`
    pub fn send(&mut self, message: Message) {
        self.inbox.push(message);
    }

    pub fn on_overlap(&mut self, a: EntityId, b: EntityId) {
        self.send(Message::Overlap(a, b));
    }

    pub fn on_pointer_down(&mut self) {
        self.send(Message::PointerDown);
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.send(Message::PointerMove { x, y });
    }

    pub fn on_pointer_up(&mut self) {
        self.send(Message::PointerUp);
    }

    pub fn set_steering_target(&mut self, target: Option<Vec2>) {
        self.send(Message::SteeringTarget(target));
    }

    pub fn set_directional_input(&mut self, left: bool, right: bool, up: bool, down: bool) {
        self.send(Message::Directional(Directional {
            left,
            right,
            up,
            down,
        }));
    }

    pub fn start(&mut self) {
        self.send(Message::Start);
    }

    pub fn stop(&mut self) {
        self.send(Message::Stop);
    }

    pub fn restart(&mut self) {
        self.send(Message::Restart);
    }

    // === Tick ===

    /// Advance by `dt_ms` of wall-clock time
    pub fn advance(&mut self, dt_ms: f64) {
        let dt_ms = clamp_dt(dt_ms);

        for message in std::mem::take(&mut self.inbox) {
            self.apply(message);
        }

        if self.run.phase != Phase::Running {
            return;
        }

        self.run.elapsed_ms += dt_ms;
        let now_ms = self.run.elapsed_ms;
        let difficulty = self.difficulty();

        self.player.update(dt_ms, &self.config.player, &self.bounds);

        let ctx = SpawnContext {
            now_ms,
            difficulty,
            bounds: &self.bounds,
            player: &self.player,
        };
        let report = self.scheduler.tick(&ctx, &mut self.pool, &mut self.rng);
        if let Some((collectibles, hazards)) = report.wave {
            self.outbox.push(GameEvent::WaveSpawned {
                collectibles,
                hazards,
            });
        }
        self.scheduler
            .tick_decor(now_ms, &self.bounds, &mut self.cosmetic_rng);

        let motion = MotionContext {
            now_ms,
            player_pos: self.player.pos,
            speed_multiplier: difficulty.speed_multiplier as f32,
        };
        let evicted = self.pool.tick(dt_ms, &self.bounds, &motion);
        for e in &evicted {
            log::trace!("{:?} {:?} evicted ({:?})", e.kind, e.id, e.reason);
        }

        let ctx = SpawnContext {
            now_ms,
            difficulty,
            bounds: &self.bounds,
            player: &self.player,
        };
        self.scheduler.replenish(&ctx, &mut self.pool, &mut self.rng);

        self.credit_survival(dt_ms);

        if let Some(cue) = self.audio.tick(now_ms) {
            self.outbox.push(GameEvent::Sound(cue));
        }
    }

    /// Take everything emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn apply(&mut self, message: Message) {
        match message {
            Message::PointerDown => match self.run.phase {
                Phase::Idle | Phase::GameOver => self.begin_run(None),
                Phase::Running => {}
            },
            Message::PointerMove { x, y } => self.player.steering = Some(Vec2::new(x, y)),
            Message::PointerUp => self.player.steering = None,
            Message::SteeringTarget(target) => self.player.steering = target,
            Message::Directional(keys) => self.player.keys = keys,
            Message::Overlap(a, b) => self.resolve_overlap(a, b),
            Message::Start => {
                if self.run.phase == Phase::Idle {
                    self.begin_run(None);
                }
            }
            Message::Stop => self.end_run(),
            Message::Restart => {
                self.end_run();
                self.begin_run(None);
            }
        }
    }

    fn resolve_overlap(&mut self, a: EntityId, b: EntityId) {
        if self.run.phase != Phase::Running {
            return;
        }
        let Some(resolution) =
            self.resolver
                .resolve(a, b, &mut self.pool, &mut self.run, &mut self.player)
        else {
            return;
        };

        match resolution {
            Resolution::Collected {
                id,
                points,
                streak,
                at,
            } => {
                self.outbox.push(GameEvent::Collected { id, points, streak });
                self.outbox.push(GameEvent::Burst {
                    at,
                    kind: BurstKind::Collect,
                });
                let cues = self.audio.collect();
                self.outbox.extend(cues.into_iter().map(GameEvent::Sound));
            }
            Resolution::Penalized { id, points_lost, at } => {
                self.hit_effects(id, points_lost, at);
            }
            Resolution::Fatal { id, at } => {
                self.hit_effects(id, 0, at);
                self.end_run();
            }
        }
    }

    fn hit_effects(&mut self, id: EntityId, points_lost: u64, at: Vec2) {
        self.outbox.push(GameEvent::HazardHit { id, points_lost });
        self.outbox.push(GameEvent::Burst {
            at,
            kind: BurstKind::Hit,
        });
        let cues = self.audio.hit();
        self.outbox.extend(cues.into_iter().map(GameEvent::Sound));
    }

    /// Enter `Running` with fresh state, or with `from` when resuming
    fn begin_run(&mut self, from: Option<RunState>) {
        self.run.begin();
        if let Some(state) = from {
            self.run = RunState {
                phase: Phase::Running,
                ..state
            };
        }
        let now_ms = self.run.elapsed_ms;

        self.pool.clear();
        let held = (self.player.steering, self.player.keys);
        self.player = Player::new(&self.config.player);
        (self.player.steering, self.player.keys) = held;
        self.survival_carry = 0.0;
        self.scheduler.reset(now_ms, &mut self.rng);
        let drone = self.audio.start(now_ms);

        let ctx = SpawnContext {
            now_ms,
            difficulty: self.curve.evaluate(now_ms / 1000.0),
            bounds: &self.bounds,
            player: &self.player,
        };
        self.scheduler.populate(&ctx, &mut self.pool, &mut self.rng);

        log::info!(
            "{} run started (seed {}, best {})",
            self.config.variant.as_str(),
            self.seed,
            self.run.best
        );
        self.outbox.push(GameEvent::RunStarted);
        if let Some(cue) = drone {
            self.outbox.push(GameEvent::Sound(cue));
        }
    }

    /// `Running -> GameOver`. No-op in any other phase, so it fires once per run.
    fn end_run(&mut self) {
        if self.run.phase != Phase::Running {
            return;
        }
        let new_best = self.run.finish();
        self.scheduler.cancel();
        let fade = self.audio.run_ended();

        log::info!(
            "{} run ended: score {} after {:.1}s",
            self.config.variant.as_str(),
            self.run.score,
            self.run.elapsed_secs()
        );
        self.outbox.push(GameEvent::RunEnded {
            score: self.run.score,
            best: self.run.best,
        });
        self.outbox.extend(fade.into_iter().map(GameEvent::Sound));
        if let Some(value) = new_best {
            log::info!("New best: {value}");
            self.outbox.push(GameEvent::NewBest { value });
            let cues = self.audio.new_best();
            self.outbox.extend(cues.into_iter().map(GameEvent::Sound));
        }
    }

    fn credit_survival(&mut self, dt_ms: f64) {
        let rate = self.config.scoring.survival_points_per_sec;
        if rate <= 0.0 {
            return;
        }
        self.survival_carry += rate * dt_ms / 1000.0;
        let whole = self.survival_carry.floor();
        if whole >= 1.0 {
            self.survival_carry -= whole;
            self.run.score = self.run.score.saturating_add(whole as u64);
        }
    }

    // === Snapshot accessors ===

    /// Live entities in pool order
    pub fn live_entities(&self) -> Vec<EntityView> {
        let mut views = Vec::with_capacity(self.pool.len());
        self.pool.for_each_alive(|e| {
            views.push(EntityView {
                id: e.id,
                kind: e.kind,
                pos: e.pos,
                scale: e.scale,
            })
        });
        views
    }

    pub fn current_score(&self) -> u64 {
        self.run.score
    }

    pub fn current_phase(&self) -> Phase {
        self.run.phase
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn best(&self) -> u64 {
        self.run.best
    }

    /// Difficulty at the current run time
    pub fn difficulty(&self) -> Difficulty {
        self.curve.evaluate(self.run.elapsed_secs())
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn decorations(&self) -> &[Decoration] {
        self.scheduler.decorations()
    }

    pub fn ambient_voices(&self) -> &[AmbientVoice] {
        self.audio.voices()
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
