//! wasm-bindgen facade for a browser host
//!
//! The page owns rendering, sprite physics and the frame loop. It feeds
//! pointer, key and overlap events in, calls `advance` from
//! `requestAnimationFrame`, and reads JSON snapshots back out. Sound cues are
//! rendered here and new bests go straight to LocalStorage.

use wasm_bindgen::prelude::*;

use crate::audio::web::WebAudioRenderer;
use crate::config::{GameConfig, Variant};
use crate::persistence::{BestScoreStore, LocalStorageStore};
use crate::sim::{Arcade, EntityId, GameEvent};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) fails harmlessly
    let _ = console_log::init_with_level(log::Level::Info);
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WebArcade {
    arcade: Arcade,
    store: LocalStorageStore,
    audio: WebAudioRenderer,
}

#[wasm_bindgen]
impl WebArcade {
    /// `variant` is a preset name; `config_json` optionally replaces the
    /// preset and must be written for the same variant
    #[wasm_bindgen(constructor)]
    pub fn new(variant: &str, seed: f64, config_json: Option<String>) -> Result<WebArcade, JsValue> {
        let variant = Variant::from_str(variant)
            .ok_or_else(|| JsValue::from_str(&format!("unknown variant: {variant}")))?;
        let config = GameConfig::for_variant(variant, config_json.as_deref()).map_err(js_err)?;
        let store = LocalStorageStore::new(config.variant);
        let arcade = Arcade::new(config, seed as u64, store.load_best()).map_err(js_err)?;
        log::info!("{} ready (seed {})", variant.as_str(), seed as u64);
        Ok(Self {
            arcade,
            store,
            audio: WebAudioRenderer::new(),
        })
    }

    pub fn pointer_down(&mut self) {
        // First gesture unlocks audio
        self.audio.resume();
        self.arcade.on_pointer_down();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.arcade.on_pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.arcade.on_pointer_up();
    }

    pub fn keys(&mut self, left: bool, right: bool, up: bool, down: bool) {
        self.arcade.set_directional_input(left, right, up, down);
    }

    pub fn overlap(&mut self, a: u32, b: u32) {
        self.arcade.on_overlap(EntityId(a), EntityId(b));
    }

    pub fn start(&mut self) {
        self.audio.resume();
        self.arcade.start();
    }

    pub fn stop(&mut self) {
        self.arcade.stop();
    }

    pub fn restart(&mut self) {
        self.arcade.restart();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    /// Advance one frame. Returns the non-audio events as a JSON array.
    pub fn advance(&mut self, dt_ms: f64) -> String {
        self.arcade.advance(dt_ms);
        self.audio.release_finished();
        let mut visible = Vec::new();
        for event in self.arcade.drain_events() {
            match event {
                GameEvent::Sound(cue) => self.audio.play(&cue),
                GameEvent::NewBest { value } => {
                    self.store.on_new_best(value);
                    visible.push(event);
                }
                other => visible.push(other),
            }
        }
        serde_json::to_string(&visible).unwrap_or_default()
    }

    /// Live entities as a JSON array of `{id, kind, pos, scale}`
    pub fn entities(&self) -> String {
        serde_json::to_string(&self.arcade.live_entities()).unwrap_or_default()
    }

    /// Player position, velocity and scale as JSON
    pub fn player(&self) -> String {
        serde_json::to_string(self.arcade.player()).unwrap_or_default()
    }

    pub fn decorations(&self) -> String {
        serde_json::to_string(self.arcade.decorations()).unwrap_or_default()
    }

    pub fn score(&self) -> f64 {
        self.arcade.current_score() as f64
    }

    pub fn best(&self) -> f64 {
        self.arcade.best() as f64
    }

    pub fn phase(&self) -> String {
        self.arcade.current_phase().as_str().to_string()
    }

    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.arcade.to_json().map_err(js_err)
    }

    pub fn restore(&mut self, json: &str) -> Result<(), JsValue> {
        self.arcade = Arcade::from_json(json).map_err(js_err)?;
        Ok(())
    }
}
