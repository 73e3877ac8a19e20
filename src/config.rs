//! Game configuration
//!
//! One [`GameConfig`] per game variant, supplied at construction. Presets carry
//! the tuning each of the three games ships with; hosts may also load a JSON
//! override. Everything is validated up front so a bad config refuses to start
//! instead of producing a frozen or runaway spawner mid-run.

use serde::{Deserialize, Serialize};

use crate::audio::{DroneDescriptor, DroneVoice, Lfo, LfoTarget, Waveform};
use crate::error::ConfigError;

/// Which of the three games a config describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Falling-object collector
    #[default]
    AuroraBloom,
    /// Pointer-following survival chase
    MothDrift,
    /// Pond collector with penalty hazards
    LuminousLotus,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::AuroraBloom,
        Variant::MothDrift,
        Variant::LuminousLotus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::AuroraBloom => "aurora-bloom",
            Variant::MothDrift => "moth-drift",
            Variant::LuminousLotus => "luminous-lotus",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "aurora-bloom" | "aurora" => Some(Variant::AuroraBloom),
            "moth-drift" | "moth" => Some(Variant::MothDrift),
            "luminous-lotus" | "lotus" => Some(Variant::LuminousLotus),
            _ => None,
        }
    }
}

/// Inclusive-exclusive float range used for random draws
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max || self.min.is_nan() || self.max.is_nan() {
            return Err(ConfigError::InvertedRange {
                name,
                min: self.min as f64,
                max: self.max as f64,
            });
        }
        Ok(())
    }
}

/// Inclusive integer range for per-wave counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Visible play area; origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
}

/// What a hazard overlap does to the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardPolicy {
    /// Single life: first hit ends the run
    Terminal,
    /// Lose points and size, keep playing
    Penalty {
        points: u64,
        shrink: f32,
        min_scale: f32,
    },
}

/// Pool limits and culling margins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub collectible_cap: u32,
    pub hazard_cap: u32,
    /// Distance beyond the arena a collectible may travel before it is culled
    pub collectible_margin: f32,
    pub hazard_margin: f32,
}

/// Time-based ramp plus the wave interval range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub ramp_window_secs: f64,
    /// `K` in `speed = 1 + fraction * K`
    pub max_speed_gain: f64,
    pub interval_max_ms: f64,
    pub interval_min_ms: f64,
    /// Multiplier applied to the stored wave interval after each wave
    pub interval_decay: f64,
}

/// Where a spawned entity starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Just above the top edge, `offset` pixels out
    Above { offset: f32 },
    /// On a random side, `offset` pixels outside the arena
    Edges { offset: f32 },
    /// Anywhere inside the arena, `inset` pixels from the walls, away from the player
    Inside { inset: f32 },
}

/// How a spawned entity moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionRule {
    Drift,
    Bounce,
    Homing,
}

/// Randomized spawn parameters for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub placement: Placement,
    pub motion: MotionRule,
    /// Main-axis speed in px/s (scaled by the difficulty multiplier)
    pub speed: Span,
    /// Cross-axis velocity in px/s
    pub drift: Span,
    pub scale: Span,
    /// Collision radius at scale 1.0
    pub radius: f32,
    /// Lifetime in ms, if the entity expires on its own
    #[serde(default)]
    pub ttl_ms: Option<f64>,
}

/// Counts drawn for every wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    pub collectibles: CountRange,
    pub hazards: CountRange,
}

/// Independent hazard clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardTimerConfig {
    pub interval_max_ms: f64,
    pub interval_min_ms: f64,
    /// Extra random delay in `[0, jitter_ms)`
    pub jitter_ms: f64,
}

/// Cosmetic particles that never collide
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecorConfig {
    pub interval_ms: f64,
    pub lifetime_ms: Span,
    pub scale: Span,
    /// Height of the band at the top of the arena particles appear in
    pub band_height: f32,
    /// Total upward float over the particle lifetime
    pub rise: Span,
}

/// Everything the scheduler needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    #[serde(default)]
    pub wave: Option<WaveConfig>,
    #[serde(default)]
    pub hazard_timer: Option<HazardTimerConfig>,
    /// Collectibles placed when a run starts
    pub initial_collectibles: u32,
    /// Collectible population topped up after removals (0 = off)
    pub target_collectibles: u32,
    pub collectible: SpawnRule,
    pub hazard: SpawnRule,
    #[serde(default)]
    pub decor: Option<DecorConfig>,
}

/// Score rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_reward: u64,
    /// Streak bonus is `floor(sqrt(streak) * bonus_factor)`
    pub bonus_factor: f64,
    /// Passive points per second while running
    pub survival_points_per_sec: f64,
    /// Player scale gained per collectible
    pub grow_on_collect: f32,
    pub max_scale: f32,
}

/// Which axes the player may move on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Free,
}

/// Player movement tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub axis: Axis,
    pub start_x: f32,
    pub start_y: f32,
    /// Collision radius at scale 1.0
    pub radius: f32,
    pub start_scale: f32,
    /// Velocity toward the steering target per pixel of distance (1/s)
    pub follow_gain: f32,
    /// Speed while a directional key is held (px/s)
    pub key_speed: f32,
    pub max_speed: f32,
    /// Velocity kept per 60 Hz frame with no input (0 = stop dead)
    pub drag: f32,
    /// Steering stops when this close to the target
    pub deadzone: f32,
    /// Distance kept from the arena walls
    pub edge_padding: f32,
}

/// FM modulation on a tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FmConfig {
    pub freq: Span,
    pub depth: f32,
}

/// The collect chime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectVoice {
    pub waveform: Waveform,
    pub freq: Span,
    pub duration_ms: f64,
    pub gain: f32,
    #[serde(default)]
    pub fm: Option<FmConfig>,
}

/// Synthesis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Gap between pad notes; `None` turns the pad off
    #[serde(default)]
    pub pad_interval_ms: Option<f64>,
    pub pad_base_freq: f32,
    /// Semitone offsets the pad picks from
    pub pad_scale: Vec<i32>,
    pub pad_attack_ms: f64,
    pub pad_release_ms: f64,
    pub pad_gain: f32,
    pub collect: CollectVoice,
    pub click_noise_ms: f64,
    pub click_noise_gain: f32,
    pub hit_tone_ms: f64,
    pub hit_noise_ms: f64,
    pub hit_noise_gain: f32,
    /// Fade applied to everything when a run ends
    pub end_fade_ms: f64,
    /// Sustained bed started with each run
    #[serde(default)]
    pub drone: Option<DroneDescriptor>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            pad_interval_ms: Some(1200.0),
            pad_base_freq: 110.0,
            pad_scale: vec![0, 3, 5, 7, 10],
            pad_attack_ms: 80.0,
            pad_release_ms: 1200.0,
            pad_gain: 0.0016,
            collect: CollectVoice {
                waveform: Waveform::Triangle,
                freq: Span::new(600.0, 800.0),
                duration_ms: 180.0,
                gain: 0.0025,
                fm: Some(FmConfig {
                    freq: Span::new(120.0, 200.0),
                    depth: 60.0,
                }),
            },
            click_noise_ms: 40.0,
            click_noise_gain: 0.06,
            hit_tone_ms: 650.0,
            hit_noise_ms: 180.0,
            hit_noise_gain: 0.45,
            end_fade_ms: 800.0,
            drone: None,
        }
    }
}

/// Complete per-variant configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub variant: Variant,
    pub arena: ArenaConfig,
    pub pool: PoolConfig,
    pub difficulty: DifficultyConfig,
    pub spawn: SpawnConfig,
    pub scoring: ScoringConfig,
    pub hazard_policy: HazardPolicy,
    pub player: PlayerConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::preset(Variant::default())
    }
}

impl GameConfig {
    /// Shipped tuning for a variant
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::AuroraBloom => Self::aurora_bloom(),
            Variant::MothDrift => Self::moth_drift(),
            Variant::LuminousLotus => Self::luminous_lotus(),
        }
    }

    fn aurora_bloom() -> Self {
        Self {
            variant: Variant::AuroraBloom,
            arena: ArenaConfig {
                width: 800.0,
                height: 600.0,
            },
            pool: PoolConfig {
                collectible_cap: 30,
                hazard_cap: 10,
                collectible_margin: 50.0,
                hazard_margin: 50.0,
            },
            difficulty: DifficultyConfig {
                ramp_window_secs: 60.0,
                max_speed_gain: 1.2,
                interval_max_ms: 1000.0,
                interval_min_ms: 400.0,
                interval_decay: 0.98,
            },
            spawn: SpawnConfig {
                wave: Some(WaveConfig {
                    collectibles: CountRange::new(1, 3),
                    hazards: CountRange::new(0, 2),
                }),
                hazard_timer: None,
                initial_collectibles: 0,
                target_collectibles: 0,
                collectible: SpawnRule {
                    placement: Placement::Above { offset: 20.0 },
                    motion: MotionRule::Drift,
                    speed: Span::new(40.0, 100.0),
                    drift: Span::fixed(0.0),
                    scale: Span::new(0.6, 1.2),
                    radius: 12.0,
                    ttl_ms: None,
                },
                hazard: SpawnRule {
                    placement: Placement::Above { offset: 40.0 },
                    motion: MotionRule::Drift,
                    speed: Span::new(140.0, 260.0),
                    drift: Span::new(-40.0, 40.0),
                    scale: Span::new(0.8, 1.4),
                    radius: 10.0,
                    ttl_ms: None,
                },
                decor: Some(DecorConfig {
                    interval_ms: 200.0,
                    lifetime_ms: Span::new(1200.0, 2400.0),
                    scale: Span::new(0.4, 0.9),
                    band_height: 80.0,
                    rise: Span::new(10.0, 30.0),
                }),
            },
            scoring: ScoringConfig {
                base_reward: 10,
                bonus_factor: 0.0,
                survival_points_per_sec: 0.0,
                grow_on_collect: 0.0,
                max_scale: 1.0,
            },
            hazard_policy: HazardPolicy::Terminal,
            player: PlayerConfig {
                axis: Axis::Horizontal,
                start_x: 400.0,
                start_y: 520.0,
                radius: 18.0,
                start_scale: 1.0,
                follow_gain: 3.0,
                key_speed: 400.0,
                max_speed: 400.0,
                drag: 0.92,
                deadzone: 0.0,
                edge_padding: 24.0,
            },
            audio: AudioConfig {
                drone: Some(DroneDescriptor {
                    voices: vec![
                        DroneVoice { frequency: 110.0, gain: 0.7 },
                        DroneVoice { frequency: 112.5, gain: 0.6 },
                        DroneVoice { frequency: 220.0, gain: 0.45 },
                    ],
                    waveform: Waveform::Sine,
                    gain: 0.0025,
                    lowpass_hz: 1200.0,
                    lfo: Some(Lfo {
                        frequency: 0.06,
                        depth: 0.18,
                        target: LfoTarget::VoiceGain,
                    }),
                    fade_in_ms: 0.0,
                    fade_out_ms: 800.0,
                }),
                ..AudioConfig::default()
            },
        }
    }

    fn moth_drift() -> Self {
        Self {
            variant: Variant::MothDrift,
            arena: ArenaConfig {
                width: 960.0,
                height: 640.0,
            },
            pool: PoolConfig {
                collectible_cap: 30,
                hazard_cap: 12,
                collectible_margin: 40.0,
                hazard_margin: 60.0,
            },
            difficulty: DifficultyConfig {
                ramp_window_secs: 45.0,
                max_speed_gain: 2.2,
                interval_max_ms: 2200.0,
                interval_min_ms: 700.0,
                interval_decay: 1.0,
            },
            spawn: SpawnConfig {
                wave: None,
                hazard_timer: Some(HazardTimerConfig {
                    interval_max_ms: 2200.0,
                    interval_min_ms: 700.0,
                    jitter_ms: 150.0,
                }),
                initial_collectibles: 10,
                target_collectibles: 10,
                collectible: SpawnRule {
                    placement: Placement::Inside { inset: 40.0 },
                    motion: MotionRule::Drift,
                    speed: Span::fixed(0.0),
                    drift: Span::fixed(0.0),
                    scale: Span::fixed(1.0),
                    radius: 12.0,
                    ttl_ms: None,
                },
                hazard: SpawnRule {
                    placement: Placement::Edges { offset: 40.0 },
                    motion: MotionRule::Homing,
                    // 0.3..0.8 px per 16 ms frame
                    speed: Span::new(18.75, 50.0),
                    drift: Span::fixed(0.0),
                    scale: Span::fixed(1.0),
                    radius: 20.0,
                    ttl_ms: None,
                },
                decor: None,
            },
            scoring: ScoringConfig {
                base_reward: 10,
                bonus_factor: 6.0,
                survival_points_per_sec: 4.0,
                grow_on_collect: 0.0,
                max_scale: 1.0,
            },
            hazard_policy: HazardPolicy::Terminal,
            player: PlayerConfig {
                axis: Axis::Free,
                start_x: 480.0,
                start_y: 320.0,
                radius: 24.0,
                start_scale: 1.0,
                follow_gain: 12.0,
                key_speed: 144.0,
                max_speed: 500.0,
                drag: 0.9,
                deadzone: 0.0,
                edge_padding: 0.0,
            },
            audio: AudioConfig {
                // The detuned drone is the whole bed here
                pad_interval_ms: None,
                drone: Some(DroneDescriptor {
                    voices: vec![
                        DroneVoice { frequency: 220.0, gain: 1.0 },
                        DroneVoice { frequency: 220.0 * 1.007, gain: 1.0 },
                    ],
                    waveform: Waveform::Sine,
                    gain: 0.12,
                    lowpass_hz: 800.0,
                    lfo: Some(Lfo {
                        frequency: 0.07,
                        depth: 320.0,
                        target: LfoTarget::Cutoff,
                    }),
                    fade_in_ms: 1200.0,
                    fade_out_ms: 800.0,
                }),
                pad_base_freq: 220.0,
                collect: CollectVoice {
                    waveform: Waveform::Sine,
                    freq: Span::new(880.0, 1040.0),
                    duration_ms: 220.0,
                    gain: 0.18,
                    fm: None,
                },
                hit_noise_ms: 200.0,
                hit_noise_gain: 0.6,
                ..AudioConfig::default()
            },
        }
    }

    fn luminous_lotus() -> Self {
        Self {
            variant: Variant::LuminousLotus,
            arena: ArenaConfig {
                width: 900.0,
                height: 700.0,
            },
            pool: PoolConfig {
                collectible_cap: 30,
                hazard_cap: 8,
                collectible_margin: 40.0,
                hazard_margin: 40.0,
            },
            difficulty: DifficultyConfig {
                ramp_window_secs: 90.0,
                max_speed_gain: 1.2,
                interval_max_ms: 900.0,
                interval_min_ms: 900.0,
                interval_decay: 1.0,
            },
            spawn: SpawnConfig {
                wave: Some(WaveConfig {
                    collectibles: CountRange::new(1, 1),
                    hazards: CountRange::new(0, 0),
                }),
                hazard_timer: Some(HazardTimerConfig {
                    interval_max_ms: 1600.0,
                    interval_min_ms: 1600.0,
                    jitter_ms: 0.0,
                }),
                initial_collectibles: 0,
                target_collectibles: 0,
                collectible: SpawnRule {
                    placement: Placement::Inside { inset: 40.0 },
                    motion: MotionRule::Bounce,
                    speed: Span::fixed(0.0),
                    drift: Span::new(-30.0, 30.0),
                    scale: Span::fixed(1.0),
                    radius: 8.0,
                    ttl_ms: Some(9000.0),
                },
                hazard: SpawnRule {
                    placement: Placement::Inside { inset: 60.0 },
                    motion: MotionRule::Drift,
                    speed: Span::fixed(0.0),
                    drift: Span::fixed(0.0),
                    scale: Span::fixed(1.0),
                    radius: 10.0,
                    ttl_ms: Some(3000.0),
                },
                decor: None,
            },
            scoring: ScoringConfig {
                base_reward: 10,
                bonus_factor: 0.0,
                survival_points_per_sec: 0.0,
                grow_on_collect: 0.05,
                max_scale: 1.6,
            },
            hazard_policy: HazardPolicy::Penalty {
                points: 15,
                shrink: 0.12,
                min_scale: 0.5,
            },
            player: PlayerConfig {
                axis: Axis::Free,
                start_x: 450.0,
                start_y: 350.0,
                radius: 42.0,
                start_scale: 0.8,
                follow_gain: 6.0,
                key_speed: 240.0,
                max_speed: 900.0,
                drag: 0.0,
                deadzone: 4.0,
                edge_padding: 0.0,
            },
            audio: AudioConfig::default(),
        }
    }

    /// Preset for `variant`, or `json` when given. A JSON config written for
    /// another variant is refused so its best score never lands in the wrong
    /// slot.
    pub fn for_variant(variant: Variant, json: Option<&str>) -> Result<Self, ConfigError> {
        let Some(json) = json else {
            return Ok(Self::preset(variant));
        };
        let config = Self::from_json(json)?;
        if config.variant != variant {
            return Err(ConfigError::VariantMismatch {
                expected: variant.as_str(),
                found: config.variant.as_str(),
            });
        }
        Ok(config)
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        // Plain data, serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject anything that would freeze or run away at tick time
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        if !(arena.width > 0.0 && arena.height > 0.0) {
            return Err(ConfigError::EmptyArena {
                width: arena.width,
                height: arena.height,
            });
        }

        let d = &self.difficulty;
        positive("difficulty.ramp_window_secs", d.ramp_window_secs)?;
        positive("difficulty.interval_min_ms", d.interval_min_ms)?;
        non_negative("difficulty.max_speed_gain", d.max_speed_gain)?;
        ordered("difficulty.interval", d.interval_min_ms, d.interval_max_ms)?;
        if !(d.interval_decay > 0.0 && d.interval_decay <= 1.0) {
            return Err(ConfigError::BadDecay(d.interval_decay));
        }

        let s = &self.spawn;
        if let Some(wave) = &s.wave {
            ordered(
                "spawn.wave.collectibles",
                wave.collectibles.min as f64,
                wave.collectibles.max as f64,
            )?;
            ordered(
                "spawn.wave.hazards",
                wave.hazards.min as f64,
                wave.hazards.max as f64,
            )?;
        }
        if let Some(timer) = &s.hazard_timer {
            positive("spawn.hazard_timer.interval_min_ms", timer.interval_min_ms)?;
            ordered(
                "spawn.hazard_timer.interval",
                timer.interval_min_ms,
                timer.interval_max_ms,
            )?;
            non_negative("spawn.hazard_timer.jitter_ms", timer.jitter_ms)?;
        }
        if let Some(decor) = &s.decor {
            positive("spawn.decor.interval_ms", decor.interval_ms)?;
            decor.lifetime_ms.check("spawn.decor.lifetime_ms")?;
            decor.scale.check("spawn.decor.scale")?;
            decor.rise.check("spawn.decor.rise")?;
        }
        check_rule("spawn.collectible", &s.collectible)?;
        check_rule("spawn.hazard", &s.hazard)?;
        if s.target_collectibles > self.pool.collectible_cap {
            return Err(ConfigError::OutOfRange {
                name: "spawn.target_collectibles",
                value: s.target_collectibles as f64,
                lo: 0.0,
                hi: self.pool.collectible_cap as f64,
            });
        }

        non_negative("pool.collectible_margin", self.pool.collectible_margin as f64)?;
        non_negative("pool.hazard_margin", self.pool.hazard_margin as f64)?;

        let sc = &self.scoring;
        // Every collect must raise the score
        positive("scoring.base_reward", sc.base_reward as f64)?;
        non_negative("scoring.bonus_factor", sc.bonus_factor)?;
        non_negative("scoring.survival_points_per_sec", sc.survival_points_per_sec)?;
        non_negative("scoring.grow_on_collect", sc.grow_on_collect as f64)?;

        let p = &self.player;
        positive("player.radius", p.radius as f64)?;
        positive("player.start_scale", p.start_scale as f64)?;
        non_negative("player.max_speed", p.max_speed as f64)?;
        if !(0.0..=1.0).contains(&p.drag) {
            return Err(ConfigError::OutOfRange {
                name: "player.drag",
                value: p.drag as f64,
                lo: 0.0,
                hi: 1.0,
            });
        }
        ordered("scoring.max_scale", p.start_scale as f64, sc.max_scale as f64)?;
        if let HazardPolicy::Penalty {
            shrink, min_scale, ..
        } = self.hazard_policy
        {
            non_negative("hazard_policy.shrink", shrink as f64)?;
            positive("hazard_policy.min_scale", min_scale as f64)?;
            ordered("hazard_policy.min_scale", min_scale as f64, p.start_scale as f64)?;
        }

        let a = &self.audio;
        if let Some(interval) = a.pad_interval_ms {
            positive("audio.pad_interval_ms", interval)?;
            positive("audio.pad_base_freq", a.pad_base_freq as f64)?;
            if a.pad_scale.is_empty() {
                return Err(ConfigError::EmptyScale);
            }
        }
        if let Some(drone) = &a.drone {
            if drone.voices.is_empty() {
                return Err(ConfigError::EmptyDrone);
            }
            for voice in &drone.voices {
                positive("audio.drone.voices.frequency", voice.frequency as f64)?;
                non_negative("audio.drone.voices.gain", voice.gain as f64)?;
            }
            non_negative("audio.drone.gain", drone.gain as f64)?;
            positive("audio.drone.lowpass_hz", drone.lowpass_hz as f64)?;
            non_negative("audio.drone.fade_in_ms", drone.fade_in_ms)?;
            non_negative("audio.drone.fade_out_ms", drone.fade_out_ms)?;
        }
        a.collect.freq.check("audio.collect.freq")?;
        positive("audio.collect.duration_ms", a.collect.duration_ms)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            lo: 0.0,
            hi: f64::INFINITY,
        })
    }
}

fn ordered(name: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min, max })
    }
}

fn check_rule(name: &'static str, rule: &SpawnRule) -> Result<(), ConfigError> {
    rule.speed.check(name)?;
    rule.drift.check(name)?;
    rule.scale.check(name)?;
    positive(name, rule.radius as f64)?;
    if rule.scale.min <= 0.0 {
        return Err(ConfigError::NotPositive {
            name,
            value: rule.scale.min as f64,
        });
    }
    if let Some(ttl) = rule.ttl_ms {
        positive(name, ttl)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for variant in Variant::ALL {
            let config = GameConfig::preset(variant);
            assert_eq!(config.variant, variant);
            assert_eq!(config.validate(), Ok(()), "{}", variant.as_str());
        }
    }

    #[test]
    fn test_variant_names_round_trip() {
        for variant in Variant::ALL {
            assert_eq!(Variant::from_str(variant.as_str()), Some(variant));
        }
        assert_eq!(Variant::from_str("MOTH"), Some(Variant::MothDrift));
        assert_eq!(Variant::from_str("pong"), None);
    }

    #[test]
    fn test_interval_floor_above_ceiling_rejected() {
        let mut config = GameConfig::default();
        config.difficulty.interval_min_ms = 2000.0;
        config.difficulty.interval_max_ms = 1000.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_bad_decay_rejected() {
        let mut config = GameConfig::default();
        config.difficulty.interval_decay = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::BadDecay(1.5)));
    }

    #[test]
    fn test_negative_cap_fails_to_parse() {
        let mut value = serde_json::to_value(GameConfig::default()).unwrap();
        value["pool"]["hazard_cap"] = serde_json::json!(-1);
        let err = GameConfig::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_base_reward_refused() {
        let mut value = serde_json::to_value(GameConfig::preset(Variant::AuroraBloom)).unwrap();
        value["scoring"]["base_reward"] = serde_json::json!(0);
        value["scoring"]["bonus_factor"] = serde_json::json!(0.0);
        assert_eq!(
            GameConfig::from_json(&value.to_string()),
            Err(ConfigError::NotPositive {
                name: "scoring.base_reward",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_for_variant_refuses_foreign_config() {
        let moth = GameConfig::preset(Variant::MothDrift).to_json();
        assert_eq!(
            GameConfig::for_variant(Variant::LuminousLotus, Some(&moth)),
            Err(ConfigError::VariantMismatch {
                expected: "luminous-lotus",
                found: "moth-drift"
            })
        );
        let same = GameConfig::for_variant(Variant::MothDrift, Some(&moth)).unwrap();
        assert_eq!(same, GameConfig::preset(Variant::MothDrift));
        assert_eq!(
            GameConfig::for_variant(Variant::AuroraBloom, None),
            Ok(GameConfig::preset(Variant::AuroraBloom))
        );
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig::preset(Variant::LuminousLotus);
        let parsed = GameConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_drone_rejected() {
        let mut config = GameConfig::preset(Variant::MothDrift);
        if let Some(drone) = config.audio.drone.as_mut() {
            drone.voices.clear();
        }
        assert_eq!(config.validate(), Err(ConfigError::EmptyDrone));
    }

    #[test]
    fn test_pad_scale_only_checked_when_pads_on() {
        let mut config = GameConfig::preset(Variant::MothDrift);
        config.audio.pad_scale.clear();
        assert_eq!(config.validate(), Ok(()));
        config.audio.pad_interval_ms = Some(1200.0);
        assert_eq!(config.validate(), Err(ConfigError::EmptyScale));
    }

    #[test]
    fn test_penalty_floor_above_start_rejected() {
        let mut config = GameConfig::preset(Variant::LuminousLotus);
        config.hazard_policy = HazardPolicy::Penalty {
            points: 15,
            shrink: 0.1,
            min_scale: 2.0,
        };
        assert!(config.validate().is_err());
    }
}
