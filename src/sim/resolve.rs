//! Applies scoring and hazard rules to reported overlaps

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityKind};
use super::player::Player;
use super::pool::EntityPool;
use super::state::RunState;
use crate::config::{HazardPolicy, ScoringConfig};

/// What an overlap did to the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Collected {
        id: EntityId,
        points: u64,
        streak: u32,
        at: Vec2,
    },
    /// Penalty policy: the run continues
    Penalized {
        id: EntityId,
        points_lost: u64,
        at: Vec2,
    },
    /// Terminal policy: the caller must end the run
    Fatal { id: EntityId, at: Vec2 },
}

/// Scoring and hazard policy for one variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionResolver {
    scoring: ScoringConfig,
    policy: HazardPolicy,
}

impl CollisionResolver {
    pub fn new(scoring: ScoringConfig, policy: HazardPolicy) -> Self {
        Self { scoring, policy }
    }

    /// Points for a collect that brought the streak to `streak`
    pub fn reward(&self, streak: u32) -> u64 {
        let bonus = ((streak as f64).sqrt() * self.scoring.bonus_factor).floor();
        self.scoring.base_reward + bonus as u64
    }

    /// Resolve one `(a, b)` pair. Pairs that don't involve the player, or
    /// whose other side is already gone, resolve to nothing.
    pub fn resolve(
        &self,
        a: EntityId,
        b: EntityId,
        pool: &mut EntityPool,
        run: &mut RunState,
        player: &mut Player,
    ) -> Option<Resolution> {
        let other = match (a, b) {
            (EntityId::PLAYER, EntityId::PLAYER) => return None,
            (EntityId::PLAYER, other) | (other, EntityId::PLAYER) => other,
            _ => return None,
        };
        let (kind, at) = pool
            .get(other)
            .filter(|e| e.alive)
            .map(|e| (e.kind, e.pos))?;

        match kind {
            EntityKind::Collectible => {
                pool.remove(other);
                run.streak = run.streak.saturating_add(1);
                let points = self.reward(run.streak);
                run.score = run.score.saturating_add(points);
                if self.scoring.grow_on_collect > 0.0 {
                    player.scale =
                        (player.scale + self.scoring.grow_on_collect).min(self.scoring.max_scale);
                }
                Some(Resolution::Collected {
                    id: other,
                    points,
                    streak: run.streak,
                    at,
                })
            }
            EntityKind::Hazard => match self.policy {
                // The hazard stays where it hit so the final frame shows it
                HazardPolicy::Terminal => Some(Resolution::Fatal { id: other, at }),
                HazardPolicy::Penalty {
                    points,
                    shrink,
                    min_scale,
                } => {
                    pool.remove(other);
                    let before = run.score;
                    run.score = run.score.saturating_sub(points);
                    run.streak = 0;
                    player.scale = (player.scale - shrink).max(min_scale);
                    Some(Resolution::Penalized {
                        id: other,
                        points_lost: before - run.score,
                        at,
                    })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, Variant};
    use crate::sim::entity::SpawnAttrs;

    struct Rig {
        resolver: CollisionResolver,
        pool: EntityPool,
        run: RunState,
        player: Player,
    }

    fn rig(variant: Variant) -> Rig {
        let config = GameConfig::preset(variant);
        let mut run = RunState::new(0);
        run.begin();
        Rig {
            resolver: CollisionResolver::new(config.scoring, config.hazard_policy),
            pool: EntityPool::new(config.pool),
            run,
            player: Player::new(&config.player),
        }
    }

    impl Rig {
        fn spawn(&mut self, kind: EntityKind) -> EntityId {
            self.pool
                .spawn(kind, Vec2::new(100.0, 100.0), Vec2::ZERO, SpawnAttrs::default(), 0.0)
                .unwrap()
        }

        fn hit(&mut self, id: EntityId) -> Option<Resolution> {
            self.resolver.resolve(
                EntityId::PLAYER,
                id,
                &mut self.pool,
                &mut self.run,
                &mut self.player,
            )
        }
    }

    #[test]
    fn test_streak_bonus_sequence() {
        let mut rig = rig(Variant::MothDrift);
        let mut scores = Vec::new();
        for _ in 0..3 {
            let id = rig.spawn(EntityKind::Collectible);
            rig.hit(id).unwrap();
            scores.push(rig.run.score);
        }
        // 10+6, +10+8, +10+10
        assert_eq!(scores, vec![16, 34, 54]);
        assert_eq!(rig.run.streak, 3);
    }

    #[test]
    fn test_duplicate_overlap_ignored() {
        let mut rig = rig(Variant::AuroraBloom);
        let id = rig.spawn(EntityKind::Collectible);
        assert!(rig.hit(id).is_some());
        assert!(rig.hit(id).is_none());
        assert_eq!(rig.run.score, 10);
        assert_eq!(rig.run.streak, 1);
    }

    #[test]
    fn test_pair_order_and_non_player_pairs() {
        let mut rig = rig(Variant::AuroraBloom);
        let a = rig.spawn(EntityKind::Collectible);
        let b = rig.spawn(EntityKind::Hazard);
        let r = &rig.resolver;
        assert!(r
            .resolve(a, b, &mut rig.pool, &mut rig.run, &mut rig.player)
            .is_none());
        assert!(matches!(
            r.resolve(a, EntityId::PLAYER, &mut rig.pool, &mut rig.run, &mut rig.player),
            Some(Resolution::Collected { .. })
        ));
    }

    #[test]
    fn test_terminal_hazard_is_fatal_and_kept() {
        let mut rig = rig(Variant::AuroraBloom);
        let id = rig.spawn(EntityKind::Hazard);
        assert!(matches!(rig.hit(id), Some(Resolution::Fatal { .. })));
        assert!(rig.pool.get(id).is_some());
    }

    #[test]
    fn test_penalty_floors_score_and_scale() {
        let mut rig = rig(Variant::LuminousLotus);
        rig.run.score = 10;
        rig.run.streak = 5;
        let id = rig.spawn(EntityKind::Hazard);
        let res = rig.hit(id).unwrap();
        assert_eq!(
            res,
            Resolution::Penalized {
                id,
                points_lost: 10,
                at: Vec2::new(100.0, 100.0)
            }
        );
        assert_eq!(rig.run.score, 0);
        assert_eq!(rig.run.streak, 0);
        assert!(rig.pool.get(id).is_none());

        for _ in 0..10 {
            let id = rig.spawn(EntityKind::Hazard);
            rig.hit(id);
        }
        assert_eq!(rig.player.scale, 0.5);
        assert_eq!(rig.run.score, 0);
    }

    #[test]
    fn test_collect_grows_up_to_cap() {
        let mut rig = rig(Variant::LuminousLotus);
        for _ in 0..25 {
            let id = rig.spawn(EntityKind::Collectible);
            rig.hit(id);
        }
        assert_eq!(rig.player.scale, 1.6);
    }
}
