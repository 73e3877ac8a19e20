//! Ambient pad and drone scheduling, plus effect descriptors
//!
//! Every parameter is a function of the run clock and draws from a dedicated
//! audio RNG stream, so the descriptor stream is reproducible and never
//! perturbs gameplay randomness.

use serde::{Deserialize, Serialize};

use super::{Envelope, Modulation, NoiseDescriptor, SoundCue, ToneDescriptor, Waveform};
use crate::config::AudioConfig;
use crate::sim::rng::{AUDIO_STREAM, RandomSource};

const COLLECT_ATTACK_MS: f64 = 10.0;
const CLICK_LOWPASS_HZ: f32 = 3000.0;
const HIT_ATTACK_MS: f64 = 20.0;
const HIT_PEAK_GAIN: f32 = 0.006;
/// Hit tones glide down to this fraction of their start frequency
const HIT_GLIDE: f32 = 0.5;
const HIT_FREQS: [(f32, Waveform); 2] = [(200.0, Waveform::Sawtooth), (120.0, Waveform::Sine)];
/// New-best fanfare
const ARPEGGIO: [f32; 5] = [500.0, 600.0, 700.0, 800.0, 1000.0];
const ARPEGGIO_STEP_MS: f64 = 80.0;
const ARPEGGIO_NOTE_MS: f64 = 150.0;
const ARPEGGIO_GAIN: f32 = 0.05;

/// A pad note currently sounding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientVoice {
    pub frequency: f32,
    /// Run clock when the note began
    pub start_ms: f64,
    pub duration_ms: f64,
    pub envelope: Envelope,
}

impl AmbientVoice {
    fn finished(&self, now_ms: f64) -> bool {
        now_ms - self.start_ms >= self.duration_ms
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientAudioSynthesizer {
    config: AudioConfig,
    rng: RandomSource,
    next_pad_at_ms: Option<f64>,
    voices: Vec<AmbientVoice>,
    #[serde(default)]
    drone_on: bool,
}

impl AmbientAudioSynthesizer {
    pub fn new(config: &AudioConfig, seed: u64) -> Self {
        Self {
            config: config.clone(),
            rng: RandomSource::with_stream(seed, AUDIO_STREAM),
            next_pad_at_ms: None,
            voices: Vec::new(),
            drone_on: false,
        }
    }

    pub fn voices(&self) -> &[AmbientVoice] {
        &self.voices
    }

    pub fn next_pad_at_ms(&self) -> Option<f64> {
        self.next_pad_at_ms
    }

    pub fn drone_on(&self) -> bool {
        self.drone_on
    }

    /// Begin pad scheduling and start the drone, if the variant has them.
    /// The first pad note sounds one interval after `now_ms`.
    pub fn start(&mut self, now_ms: f64) -> Option<SoundCue> {
        self.voices.clear();
        self.next_pad_at_ms = self.config.pad_interval_ms.map(|gap| now_ms + gap);
        let drone = self.config.drone.clone()?;
        self.drone_on = true;
        Some(SoundCue::DroneStart(drone))
    }

    /// Drop every voice and pending note without a fade
    pub fn silence(&mut self) {
        self.voices.clear();
        self.next_pad_at_ms = None;
        self.drone_on = false;
    }

    /// Expire finished voices and emit a pad note if one is due
    pub fn tick(&mut self, now_ms: f64) -> Option<SoundCue> {
        self.voices.retain(|v| !v.finished(now_ms));

        let due = self.next_pad_at_ms.filter(|at| now_ms >= *at)?;
        let step = *self.rng.pick(&self.config.pad_scale)?;
        let frequency = self.config.pad_base_freq * 2f32.powf(step as f32 / 12.0);
        let envelope = Envelope {
            attack_ms: self.config.pad_attack_ms,
            release_ms: self.config.pad_release_ms,
            peak_gain: self.config.pad_gain,
        };
        let duration_ms = envelope.attack_ms + envelope.release_ms;

        self.voices.push(AmbientVoice {
            frequency,
            start_ms: now_ms,
            duration_ms,
            envelope,
        });
        self.next_pad_at_ms = self.config.pad_interval_ms.map(|gap| due.max(now_ms) + gap);

        Some(SoundCue::Pad(ToneDescriptor {
            frequency,
            end_frequency: None,
            waveform: Waveform::Sine,
            start_offset_ms: 0.0,
            duration_ms,
            envelope,
            modulation: None,
        }))
    }

    /// Bright chime plus a filtered click
    pub fn collect(&mut self) -> Vec<SoundCue> {
        let voice = self.config.collect;
        let frequency = self.rng.uniform(voice.freq.min, voice.freq.max);
        let modulation = voice.fm.map(|fm| Modulation {
            frequency: self.rng.uniform(fm.freq.min, fm.freq.max),
            depth: fm.depth,
        });
        let attack_ms = COLLECT_ATTACK_MS.min(voice.duration_ms);

        let mut cues = vec![SoundCue::Tone(ToneDescriptor {
            frequency,
            end_frequency: None,
            waveform: voice.waveform,
            start_offset_ms: 0.0,
            duration_ms: voice.duration_ms,
            envelope: Envelope {
                attack_ms,
                release_ms: voice.duration_ms - attack_ms,
                peak_gain: voice.gain,
            },
            modulation,
        })];
        if self.config.click_noise_ms > 0.0 {
            cues.push(SoundCue::Noise(NoiseDescriptor {
                start_offset_ms: 0.0,
                duration_ms: self.config.click_noise_ms,
                gain: self.config.click_noise_gain,
                lowpass_hz: Some(CLICK_LOWPASS_HZ),
            }));
        }
        cues
    }

    /// Low dual-tone descent plus a heavier noise burst
    pub fn hit(&mut self) -> Vec<SoundCue> {
        let duration_ms = self.config.hit_tone_ms;
        let mut cues = Vec::with_capacity(3);
        if duration_ms > 0.0 {
            for (frequency, waveform) in HIT_FREQS {
                cues.push(SoundCue::Tone(ToneDescriptor {
                    frequency,
                    end_frequency: Some(frequency * HIT_GLIDE),
                    waveform,
                    start_offset_ms: 0.0,
                    duration_ms,
                    envelope: Envelope {
                        attack_ms: HIT_ATTACK_MS.min(duration_ms),
                        release_ms: (duration_ms - HIT_ATTACK_MS).max(0.0),
                        peak_gain: HIT_PEAK_GAIN,
                    },
                    modulation: None,
                }));
            }
        }
        cues.push(SoundCue::Noise(NoiseDescriptor {
            start_offset_ms: 0.0,
            duration_ms: self.config.hit_noise_ms,
            gain: self.config.hit_noise_gain,
            lowpass_hz: None,
        }));
        cues
    }

    /// Run over: release the drone and fade everything out. No more pads.
    pub fn run_ended(&mut self) -> Vec<SoundCue> {
        let mut cues = Vec::with_capacity(2);
        if self.drone_on {
            let fade_ms = self
                .config
                .drone
                .as_ref()
                .map_or(self.config.end_fade_ms, |d| d.fade_out_ms);
            cues.push(SoundCue::DroneStop { fade_ms });
        }
        self.silence();
        cues.push(SoundCue::FadeOut {
            fade_ms: self.config.end_fade_ms,
        });
        cues
    }

    /// Ascending arpeggio for a new best score
    pub fn new_best(&self) -> Vec<SoundCue> {
        ARPEGGIO
            .iter()
            .enumerate()
            .map(|(i, &frequency)| {
                SoundCue::Tone(ToneDescriptor {
                    frequency,
                    end_frequency: None,
                    waveform: Waveform::Square,
                    start_offset_ms: i as f64 * ARPEGGIO_STEP_MS,
                    duration_ms: ARPEGGIO_NOTE_MS,
                    envelope: Envelope {
                        attack_ms: 5.0,
                        release_ms: ARPEGGIO_NOTE_MS - 5.0,
                        peak_gain: ARPEGGIO_GAIN,
                    },
                    modulation: None,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LfoTarget;
    use crate::config::{GameConfig, Variant};

    fn pads(synth: &mut AmbientAudioSynthesizer, until_ms: f64) -> Vec<ToneDescriptor> {
        let mut out = Vec::new();
        let mut now = 0.0;
        while now <= until_ms {
            if let Some(SoundCue::Pad(tone)) = synth.tick(now) {
                out.push(tone);
            }
            now += 100.0;
        }
        out
    }

    #[test]
    fn test_pad_cadence_and_scale() {
        let config = AudioConfig::default();
        let mut synth = AmbientAudioSynthesizer::new(&config, 42);
        synth.start(0.0);
        let notes = pads(&mut synth, 6000.0);
        assert_eq!(notes.len(), 5);

        let allowed: Vec<f32> = config
            .pad_scale
            .iter()
            .map(|s| 110.0 * 2f32.powf(*s as f32 / 12.0))
            .collect();
        for note in &notes {
            assert!(allowed.contains(&note.frequency));
            assert_eq!(note.envelope.attack_ms, 80.0);
            assert_eq!(note.envelope.release_ms, 1200.0);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let config = AudioConfig::default();
        let mut a = AmbientAudioSynthesizer::new(&config, 7);
        let mut b = AmbientAudioSynthesizer::new(&config, 7);
        a.start(0.0);
        b.start(0.0);
        assert_eq!(pads(&mut a, 20_000.0), pads(&mut b, 20_000.0));
        assert_eq!(a.collect(), b.collect());
    }

    #[test]
    fn test_no_pads_before_start() {
        let mut synth = AmbientAudioSynthesizer::new(&AudioConfig::default(), 1);
        assert!(pads(&mut synth, 10_000.0).is_empty());
    }

    #[test]
    fn test_voices_expire() {
        let mut synth = AmbientAudioSynthesizer::new(&AudioConfig::default(), 3);
        synth.start(0.0);
        synth.tick(1200.0);
        assert_eq!(synth.voices().len(), 1);
        synth.tick(2479.0);
        assert_eq!(synth.voices().len(), 2);
        // First voice lasted 1280 ms
        synth.tick(2480.0);
        assert_eq!(synth.voices().len(), 1);
    }

    #[test]
    fn test_collect_descriptor_ranges() {
        let mut synth = AmbientAudioSynthesizer::new(&AudioConfig::default(), 9);
        for _ in 0..50 {
            let cues = synth.collect();
            let SoundCue::Tone(tone) = &cues[0] else {
                panic!("expected a tone first, got {:?}", cues[0]);
            };
            assert!((600.0..=800.0).contains(&tone.frequency));
            assert_eq!(tone.duration_ms, 180.0);
            let fm = tone.modulation.unwrap();
            assert!((120.0..=200.0).contains(&fm.frequency));
            assert!(matches!(cues[1], SoundCue::Noise(n) if n.duration_ms == 40.0));
        }
    }

    #[test]
    fn test_hit_is_descending_dual_tone_plus_noise() {
        let mut synth = AmbientAudioSynthesizer::new(&AudioConfig::default(), 9);
        let cues = synth.hit();
        assert_eq!(cues.len(), 3);
        for cue in &cues[..2] {
            let SoundCue::Tone(tone) = cue else {
                panic!("expected tone");
            };
            assert!(tone.end_frequency.unwrap() < tone.frequency);
            assert!((120.0..=200.0).contains(&tone.frequency));
        }
        assert!(matches!(cues[2], SoundCue::Noise(n) if n.duration_ms == 180.0));
    }

    #[test]
    fn test_run_end_fades_and_stops_pads() {
        let mut synth = AmbientAudioSynthesizer::new(&AudioConfig::default(), 5);
        synth.start(0.0);
        synth.tick(1200.0);
        assert_eq!(synth.run_ended(), vec![SoundCue::FadeOut { fade_ms: 800.0 }]);
        assert!(synth.voices().is_empty());
        assert!(synth.tick(100_000.0).is_none());
    }

    #[test]
    fn test_drone_starts_and_stops_with_run() {
        let config = GameConfig::preset(Variant::AuroraBloom).audio;
        let mut synth = AmbientAudioSynthesizer::new(&config, 5);
        let Some(SoundCue::DroneStart(drone)) = synth.start(0.0) else {
            panic!("aurora should start a drone");
        };
        let freqs: Vec<f32> = drone.voices.iter().map(|v| v.frequency).collect();
        assert_eq!(freqs, vec![110.0, 112.5, 220.0]);
        assert_eq!(drone.lfo.map(|l| l.target), Some(LfoTarget::VoiceGain));
        assert!(synth.drone_on());

        assert_eq!(
            synth.run_ended(),
            vec![
                SoundCue::DroneStop { fade_ms: 800.0 },
                SoundCue::FadeOut { fade_ms: 800.0 },
            ]
        );
        assert!(!synth.drone_on());
        // A second end has no drone left to stop
        assert_eq!(synth.run_ended(), vec![SoundCue::FadeOut { fade_ms: 800.0 }]);
    }

    #[test]
    fn test_moth_drone_without_pads() {
        let config = GameConfig::preset(Variant::MothDrift).audio;
        let mut synth = AmbientAudioSynthesizer::new(&config, 5);
        let Some(SoundCue::DroneStart(drone)) = synth.start(0.0) else {
            panic!("moth should start a drone");
        };
        assert_eq!(drone.voices.len(), 2);
        assert_eq!(drone.fade_in_ms, 1200.0);
        assert_eq!(drone.lfo.map(|l| l.target), Some(LfoTarget::Cutoff));
        assert_eq!(synth.next_pad_at_ms(), None);
        assert!(pads(&mut synth, 20_000.0).is_empty());
    }

    #[test]
    fn test_lotus_has_no_drone() {
        let config = GameConfig::preset(Variant::LuminousLotus).audio;
        let mut synth = AmbientAudioSynthesizer::new(&config, 5);
        assert_eq!(synth.start(0.0), None);
        assert!(!synth.drone_on());
        assert_eq!(synth.next_pad_at_ms(), Some(1200.0));
    }

    #[test]
    fn test_new_best_arpeggio_ascends() {
        let synth = AmbientAudioSynthesizer::new(&AudioConfig::default(), 5);
        let freqs: Vec<f32> = synth
            .new_best()
            .iter()
            .filter_map(|c| match c {
                SoundCue::Tone(t) => Some(t.frequency),
                _ => None,
            })
            .collect();
        assert_eq!(freqs, ARPEGGIO.to_vec());
    }
}
