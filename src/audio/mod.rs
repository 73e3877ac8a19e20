//! Procedural audio
//!
//! The core only produces sound *descriptors*; nothing here touches audio
//! hardware. `synth` decides what to play and when, `web` (browser builds
//! only) turns descriptors into Web Audio nodes.

pub mod synth;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use synth::{AmbientAudioSynthesizer, AmbientVoice};

use serde::{Deserialize, Serialize};

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

/// Exponential attack/release gain shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Time to reach `peak_gain` from silence
    pub attack_ms: f64,
    /// Time from the peak back to silence
    pub release_ms: f64,
    pub peak_gain: f32,
}

/// Frequency modulation applied to a tone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modulation {
    pub frequency: f32,
    /// Peak frequency deviation in Hz
    pub depth: f32,
}

/// One oscillator voice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneDescriptor {
    pub frequency: f32,
    /// Exponential glide target reached at the end of the tone
    pub end_frequency: Option<f32>,
    pub waveform: Waveform,
    /// Delay from the moment the cue is emitted
    pub start_offset_ms: f64,
    pub duration_ms: f64,
    pub envelope: Envelope,
    pub modulation: Option<Modulation>,
}

/// A burst of white noise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseDescriptor {
    pub start_offset_ms: f64,
    pub duration_ms: f64,
    pub gain: f32,
    /// Optional low-pass cutoff
    pub lowpass_hz: Option<f32>,
}

/// What a drone's LFO wobbles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LfoTarget {
    /// Every voice gain, depth in gain units
    VoiceGain,
    /// The low-pass cutoff, depth in Hz
    Cutoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lfo {
    pub frequency: f32,
    pub depth: f32,
    pub target: LfoTarget,
}

/// One sustained oscillator of a drone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DroneVoice {
    pub frequency: f32,
    pub gain: f32,
}

/// Continuous ambient bed that sounds for the whole run
///
/// Voices mix through one low-pass filter into a drone gain, which fades in
/// linearly on start and back out on stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneDescriptor {
    pub voices: Vec<DroneVoice>,
    pub waveform: Waveform,
    /// Level of the drone gain once faded in
    pub gain: f32,
    pub lowpass_hz: f32,
    #[serde(default)]
    pub lfo: Option<Lfo>,
    pub fade_in_ms: f64,
    pub fade_out_ms: f64,
}

/// Everything the audio collaborator is asked to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Ambient pad note
    Pad(ToneDescriptor),
    /// Effect tone (collect chime, hit descent, arpeggio step)
    Tone(ToneDescriptor),
    Noise(NoiseDescriptor),
    /// Start the run's drone; at most one is sounding at a time
    DroneStart(DroneDescriptor),
    /// Fade the drone out and release it
    DroneStop { fade_ms: f64 },
    /// Fade everything still sounding to silence
    FadeOut { fade_ms: f64 },
}

/// Nodes kept alive until their fade has finished, then handed back for
/// disconnection. Times are on the audio clock, in seconds.
#[derive(Debug)]
pub struct ReleaseQueue<T> {
    pending: Vec<(f64, T)>,
}

impl<T> Default for ReleaseQueue<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> ReleaseQueue<T> {
    pub fn push(&mut self, at_secs: f64, node: T) {
        self.pending.push((at_secs, node));
    }

    /// Remove and return everything due at or before `now_secs`, oldest first
    pub fn take_due(&mut self, now_secs: f64) -> Vec<T> {
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(at, _)| *at <= now_secs);
        self.pending = pending;
        due.into_iter().map(|(_, node)| node).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
