//! Circle overlap detection
//!
//! The core never looks for overlaps itself: hosts report them as
//! `(a, b)` pairs. This detector is the reference producer used by the
//! headless runner and by hosts without a physics engine of their own.

use glam::Vec2;

use super::entity::EntityId;
use super::player::Player;
use super::pool::EntityPool;

/// Circles touch when their centers are no further apart than the radii sum
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}

/// Every pool entity currently touching the player, as `(PLAYER, id)` pairs
/// in pool order
pub fn player_overlaps(player: &Player, pool: &EntityPool) -> Vec<(EntityId, EntityId)> {
    let mut pairs = Vec::new();
    let radius = player.collision_radius();
    pool.for_each_alive(|entity| {
        if circles_overlap(player.pos, radius, entity.pos, entity.collision_radius()) {
            pairs.push((EntityId::PLAYER, entity.id));
        }
    });
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, PoolConfig, Variant};
    use crate::sim::entity::{EntityKind, SpawnAttrs};

    #[test]
    fn test_touching_counts_as_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.1, 0.0), 5.0));
    }

    #[test]
    fn test_player_overlaps_in_pool_order() {
        let config = GameConfig::preset(Variant::AuroraBloom);
        let player = Player::new(&config.player);
        let mut pool = EntityPool::new(PoolConfig {
            collectible_cap: 4,
            hazard_cap: 4,
            collectible_margin: 0.0,
            hazard_margin: 0.0,
        });
        let attrs = SpawnAttrs::default();
        let near = pool
            .spawn(EntityKind::Hazard, player.pos + Vec2::new(20.0, 0.0), Vec2::ZERO, attrs, 0.0)
            .unwrap();
        pool.spawn(EntityKind::Collectible, Vec2::ZERO, Vec2::ZERO, attrs, 0.0)
            .unwrap();
        let on_top = pool
            .spawn(EntityKind::Collectible, player.pos, Vec2::ZERO, attrs, 0.0)
            .unwrap();

        assert_eq!(
            player_overlaps(&player, &pool),
            vec![(EntityId::PLAYER, near), (EntityId::PLAYER, on_top)]
        );
    }
}
