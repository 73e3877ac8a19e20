//! Run state and the typed messages crossing the core boundary
//!
//! Everything that must survive a save/restore for determinism lives here or
//! in the types it references.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityKind};
use super::player::Directional;
use crate::audio::SoundCue;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for a start trigger
    #[default]
    Idle,
    /// Spawning, scoring and ticking
    Running,
    /// Run ended; clock, scheduler and entities frozen
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::GameOver => "game-over",
        }
    }
}

/// Per-run scoreboard. `best` outlives the run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunState {
    pub phase: Phase,
    pub score: u64,
    pub streak: u32,
    pub elapsed_ms: f64,
    pub best: u64,
}

impl RunState {
    pub fn new(best: u64) -> Self {
        Self {
            best,
            ..Self::default()
        }
    }

    /// Fresh run: everything but `best` goes back to zero
    pub fn begin(&mut self) {
        *self = Self {
            phase: Phase::Running,
            best: self.best,
            ..Self::default()
        };
    }

    /// Enter `GameOver`. Returns the new best if this run raised it.
    pub fn finish(&mut self) -> Option<u64> {
        self.phase = Phase::GameOver;
        if self.score > self.best {
            self.best = self.score;
            Some(self.best)
        } else {
            None
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }
}

/// Input delivered into the core, applied at the start of the next tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Message {
    PointerDown,
    PointerMove { x: f32, y: f32 },
    PointerUp,
    Directional(Directional),
    /// `None` releases steering
    SteeringTarget(Option<Vec2>),
    /// One overlapping pair reported by the collision collaborator
    Overlap(EntityId, EntityId),
    Start,
    /// Explicit external stop; ends a running run
    Stop,
    Restart,
}

/// Cosmetic effect the renderer may draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstKind {
    Collect,
    Hit,
}

/// Output of one tick, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    WaveSpawned { collectibles: u32, hazards: u32 },
    Collected { id: EntityId, points: u64, streak: u32 },
    HazardHit { id: EntityId, points_lost: u64 },
    RunEnded { score: u64, best: u64 },
    /// Persistence hook; at most once per run
    NewBest { value: u64 },
    Burst { at: Vec2, kind: BurstKind },
    Sound(SoundCue),
}

/// Read-only view of a live entity for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub scale: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_keeps_best() {
        let mut run = RunState {
            phase: Phase::GameOver,
            score: 120,
            streak: 4,
            elapsed_ms: 9000.0,
            best: 300,
        };
        run.begin();
        assert_eq!(run, RunState {
            phase: Phase::Running,
            best: 300,
            ..RunState::default()
        });
    }

    #[test]
    fn test_finish_raises_best_only_when_beaten() {
        let mut run = RunState::new(50);
        run.begin();
        run.score = 50;
        assert_eq!(run.finish(), None);
        assert_eq!(run.best, 50);

        run.begin();
        run.score = 51;
        assert_eq!(run.finish(), Some(51));
        assert_eq!(run.phase, Phase::GameOver);
    }
}
