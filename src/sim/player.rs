//! Player movement from pointer steering and directional keys

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Bounds;
use crate::config::{Axis, PlayerConfig};

/// Frame length the drag factor is tuned against
const DRAG_FRAME_MS: f64 = 1000.0 / 60.0;
/// Below this speed drift is snapped to zero
const REST_SPEED: f32 = 2.0;

/// Held directional keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directional {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Directional {
    fn vector(&self, axis: Axis) -> Vec2 {
        let x = (self.right as i8 - self.left as i8) as f32;
        let y = match axis {
            Axis::Horizontal => 0.0,
            Axis::Free => (self.down as i8 - self.up as i8) as f32,
        };
        Vec2::new(x, y)
    }
}

/// The player avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub scale: f32,
    /// Collision radius at scale 1.0
    pub radius: f32,
    /// Pointer target, if the pointer is held / hovering
    pub steering: Option<Vec2>,
    pub keys: Directional,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            pos: Vec2::new(config.start_x, config.start_y),
            vel: Vec2::ZERO,
            scale: config.start_scale,
            radius: config.radius,
            steering: None,
            keys: Directional::default(),
        }
    }

    pub fn collision_radius(&self) -> f32 {
        self.radius * self.scale
    }

    /// Advance one tick; frame-rate independent
    pub fn update(&mut self, dt_ms: f64, config: &PlayerConfig, bounds: &Bounds) {
        let dt = (dt_ms / 1000.0) as f32;
        let keys = self.keys.vector(config.axis);

        // Keys win over the pointer, the pointer wins over coasting
        let mut snap_to = None;
        if keys != Vec2::ZERO {
            self.vel = keys.normalize() * config.key_speed;
        } else if let Some(target) = self.steering {
            let mut delta = target - self.pos;
            if config.axis == Axis::Horizontal {
                delta.y = 0.0;
            }
            let distance = delta.length();
            if distance <= config.deadzone {
                self.vel = Vec2::ZERO;
            } else {
                self.vel = (delta * config.follow_gain).clamp_length_max(config.max_speed);
                // Don't overshoot the target on long frames
                if self.vel.length() * dt >= distance {
                    snap_to = Some(self.pos + delta);
                }
            }
        } else {
            let frames = (dt_ms / DRAG_FRAME_MS) as f32;
            self.vel *= config.drag.powf(frames);
            if self.vel.length() < REST_SPEED {
                self.vel = Vec2::ZERO;
            }
        }

        self.vel = self.vel.clamp_length_max(config.max_speed.max(config.key_speed));
        self.pos = snap_to.unwrap_or(self.pos + self.vel * dt);
        if config.axis == Axis::Horizontal {
            self.pos.y = config.start_y;
        }
        self.pos = bounds.clamp(self.pos, config.edge_padding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, Variant};

    fn setup(variant: Variant) -> (Player, PlayerConfig, Bounds) {
        let config = GameConfig::preset(variant);
        let bounds = Bounds::from_arena(&config.arena);
        (Player::new(&config.player), config.player, bounds)
    }

    #[test]
    fn test_horizontal_axis_locks_y() {
        let (mut player, config, bounds) = setup(Variant::AuroraBloom);
        player.steering = Some(Vec2::new(100.0, 50.0));
        for _ in 0..60 {
            player.update(16.0, &config, &bounds);
        }
        assert_eq!(player.pos.y, config.start_y);
        assert!(player.pos.x < 150.0);
    }

    #[test]
    fn test_keys_override_pointer() {
        let (mut player, config, bounds) = setup(Variant::AuroraBloom);
        player.steering = Some(Vec2::new(0.0, 0.0));
        player.keys.right = true;
        let x0 = player.pos.x;
        player.update(100.0, &config, &bounds);
        assert!((player.pos.x - (x0 + 40.0)).abs() < 1e-3);
    }

    #[test]
    fn test_clamped_to_arena_padding() {
        let (mut player, config, bounds) = setup(Variant::AuroraBloom);
        player.keys.left = true;
        for _ in 0..100 {
            player.update(100.0, &config, &bounds);
        }
        assert_eq!(player.pos.x, config.edge_padding);
    }

    #[test]
    fn test_drag_brings_player_to_rest() {
        let (mut player, config, bounds) = setup(Variant::AuroraBloom);
        player.vel = Vec2::new(400.0, 0.0);
        for _ in 0..120 {
            player.update(16.0, &config, &bounds);
        }
        assert_eq!(player.vel, Vec2::ZERO);
    }

    #[test]
    fn test_follow_never_overshoots() {
        let (mut player, config, bounds) = setup(Variant::MothDrift);
        let target = Vec2::new(500.0, 330.0);
        player.steering = Some(target);
        player.update(100.0, &config, &bounds);
        assert_eq!(player.pos, target);
    }

    #[test]
    fn test_deadzone_stops() {
        let (mut player, config, bounds) = setup(Variant::LuminousLotus);
        player.steering = Some(player.pos + Vec2::new(3.0, 0.0));
        let before = player.pos;
        player.update(16.0, &config, &bounds);
        assert_eq!(player.pos, before);
        assert_eq!(player.vel, Vec2::ZERO);
    }
}
