//! Glow Arcade headless runner
//!
//! Plays one run of a variant with a simple autopilot standing in for the
//! pointer, and the reference circle detector standing in for the physics
//! engine. Useful for tuning presets and eyeballing determinism.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::{Parser, ValueEnum};
    use glam::Vec2;
    use serde::Serialize;

    use glow_arcade::consts::DEFAULT_FRAME_MS;
    use glow_arcade::persistence::{BestScoreStore, JsonFileStore, MemoryStore};
    use glow_arcade::sim::{Arcade, EntityKind, GameEvent, Phase, player_overlaps};
    use glow_arcade::{GameConfig, Variant};

    /// Hazards closer than this push the autopilot away
    const DANGER_RADIUS: f32 = 140.0;

    #[derive(Parser, Debug)]
    #[command(name = "glow-arcade")]
    #[command(about = "Headless autopilot run of a Glow Arcade variant")]
    struct Cli {
        #[arg(long, value_enum, default_value_t = CliVariant::AuroraBloom)]
        variant: CliVariant,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Stop after this much simulated time if the run is still going
        #[arg(long, default_value_t = 60.0)]
        seconds: f64,
        /// JSON config replacing the variant preset (must be for the same variant)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Persist the best score in this JSON file
        #[arg(long)]
        best_file: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
    enum CliVariant {
        AuroraBloom,
        MothDrift,
        LuminousLotus,
    }

    impl From<CliVariant> for Variant {
        fn from(value: CliVariant) -> Self {
            match value {
                CliVariant::AuroraBloom => Variant::AuroraBloom,
                CliVariant::MothDrift => Variant::MothDrift,
                CliVariant::LuminousLotus => Variant::LuminousLotus,
            }
        }
    }

    #[derive(Debug, Default, Serialize)]
    struct Summary {
        variant: &'static str,
        seed: u64,
        score: u64,
        best: u64,
        elapsed_secs: f64,
        phase: &'static str,
        waves: u32,
        collected: u32,
        hazard_hits: u32,
        new_best: bool,
        sound_cues: u32,
    }

    /// Steer toward the nearest collectible, away from nearby hazards
    fn autopilot(arcade: &Arcade) -> Option<Vec2> {
        let me = arcade.player().pos;
        let entities = arcade.live_entities();

        let flee = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Hazard)
            .map(|e| me - e.pos)
            .filter(|away| away.length() < DANGER_RADIUS)
            .fold(Vec2::ZERO, |acc, away| {
                acc + away.normalize_or_zero() * (DANGER_RADIUS - away.length())
            });
        if flee != Vec2::ZERO {
            return Some(me + flee);
        }

        entities
            .iter()
            .filter(|e| e.kind == EntityKind::Collectible)
            .min_by(|a, b| me.distance(a.pos).total_cmp(&me.distance(b.pos)))
            .map(|e| e.pos)
    }

    fn tally(summary: &mut Summary, store: &mut dyn BestScoreStore, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::WaveSpawned { .. } => summary.waves += 1,
                GameEvent::Collected { .. } => summary.collected += 1,
                GameEvent::HazardHit { .. } => summary.hazard_hits += 1,
                GameEvent::Sound(_) => summary.sound_cues += 1,
                GameEvent::NewBest { value } => {
                    summary.new_best = true;
                    store.on_new_best(value);
                }
                GameEvent::RunStarted | GameEvent::RunEnded { .. } | GameEvent::Burst { .. } => {}
            }
        }
    }

    fn load_config(cli: &Cli) -> Result<GameConfig> {
        let json = match &cli.config {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
            ),
            None => None,
        };
        GameConfig::for_variant(cli.variant.into(), json.as_deref())
            .context("loading config")
    }

    pub fn run() -> Result<()> {
        env_logger::init();
        let cli = Cli::parse();
        let config = load_config(&cli)?;
        let variant = config.variant;

        let mut store: Box<dyn BestScoreStore> = match &cli.best_file {
            Some(path) => Box::new(JsonFileStore::new(path, variant)),
            None => Box::new(MemoryStore::default()),
        };

        let mut arcade = Arcade::new(config, cli.seed, store.load_best())?;
        let mut summary = Summary {
            variant: variant.as_str(),
            seed: cli.seed,
            ..Summary::default()
        };

        log::info!("Glow Arcade headless: {} for {}s", variant.as_str(), cli.seconds);
        arcade.start();
        let limit_ms = cli.seconds.max(0.0) * 1000.0;

        loop {
            for (a, b) in player_overlaps(arcade.player(), arcade.pool()) {
                arcade.on_overlap(a, b);
            }
            arcade.set_steering_target(autopilot(&arcade));
            arcade.advance(DEFAULT_FRAME_MS);

            tally(&mut summary, store.as_mut(), arcade.drain_events());

            match arcade.current_phase() {
                Phase::GameOver => break,
                Phase::Running if arcade.run_state().elapsed_ms >= limit_ms => {
                    arcade.stop();
                    arcade.advance(0.0);
                    tally(&mut summary, store.as_mut(), arcade.drain_events());
                    break;
                }
                _ => {}
            }
        }

        let run = arcade.run_state();
        summary.score = run.score;
        summary.best = run.best;
        summary.elapsed_secs = run.elapsed_secs();
        summary.phase = run.phase.as_str();

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!(
                "{} seed {}: score {} (best {}) after {:.1}s | waves {} collected {} hits {}{}",
                summary.variant,
                summary.seed,
                summary.score,
                summary.best,
                summary.elapsed_secs,
                summary.waves,
                summary.collected,
                summary.hazard_hits,
                if summary.new_best { " | NEW BEST" } else { "" }
            );
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_variant_flag_parses_kebab_names() {
            let cli = Cli::try_parse_from(["glow-arcade", "--variant", "moth-drift"]).unwrap();
            assert_eq!(Variant::from(cli.variant), Variant::MothDrift);

            let cli = Cli::try_parse_from(["glow-arcade"]).unwrap();
            assert_eq!(cli.variant, CliVariant::AuroraBloom);
        }

        #[test]
        fn test_unknown_variant_rejected_by_clap() {
            let err = Cli::try_parse_from(["glow-arcade", "--variant", "pong"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        }

        #[test]
        fn test_config_file_for_other_variant_refused() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("lotus.json");
            std::fs::write(&path, GameConfig::preset(Variant::LuminousLotus).to_json()).unwrap();

            let cli = Cli::try_parse_from([
                "glow-arcade",
                "--variant",
                "moth-drift",
                "--config",
                path.to_str().unwrap(),
            ])
            .unwrap();
            assert!(load_config(&cli).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `platform::web::init`
}
