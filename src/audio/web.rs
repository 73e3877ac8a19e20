//! Web Audio renderer for sound descriptors
//!
//! Turns [`SoundCue`]s into oscillator, noise and gain nodes. All cues route
//! through one bus gain node so a run-end fade can silence whatever is still
//! ringing without tracking individual nodes. Retired buses and drones are
//! disconnected once their fade has run out.

use web_sys::{
    AudioBuffer, AudioContext, AudioContextState, AudioNode, BiquadFilterType, GainNode,
    OscillatorNode, OscillatorType,
};

use super::{
    DroneDescriptor, LfoTarget, NoiseDescriptor, ReleaseQueue, SoundCue, ToneDescriptor, Waveform,
};
use crate::sim::rng::{AUDIO_STREAM, RandomSource};

/// Exponential ramps can't reach zero
const SILENT: f32 = 0.0001;
/// Length of the shared white-noise buffer (seconds)
const NOISE_SECONDS: f32 = 1.0;

fn osc_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Square => OscillatorType::Square,
    }
}

/// Nodes of the sounding drone
struct Drone {
    output: GainNode,
    /// Drone gain before master volume
    level: f32,
    sources: Vec<OscillatorNode>,
    nodes: Vec<AudioNode>,
}

pub struct WebAudioRenderer {
    ctx: Option<AudioContext>,
    bus: Option<GainNode>,
    noise: Option<AudioBuffer>,
    drone: Option<Drone>,
    retired: ReleaseQueue<AudioNode>,
    master_volume: f32,
    muted: bool,
}

impl Default for WebAudioRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudioRenderer {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            bus: None,
            noise: None,
            drone: None,
            retired: ReleaseQueue::default(),
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Resume the context (browsers require a user gesture first)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
        self.relevel_drone();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.relevel_drone();
    }

    /// Disconnect every retired node whose fade has finished
    pub fn release_finished(&mut self) {
        let Some(ctx) = &self.ctx else { return };
        for node in self.retired.take_due(ctx.current_time()) {
            node.disconnect().ok();
        }
    }

    fn relevel_drone(&self) {
        let (Some(ctx), Some(drone)) = (&self.ctx, &self.drone) else {
            return;
        };
        let gain = drone.output.gain();
        let t = ctx.current_time();
        gain.cancel_scheduled_values(t).ok();
        gain.set_value_at_time(drone.level * self.volume(), t).ok();
    }

    fn volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    pub fn play(&mut self, cue: &SoundCue) {
        let vol = self.volume();
        let Some(ctx) = self.ctx.clone() else { return };
        if ctx.state() == AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        self.release_finished();

        match cue {
            SoundCue::FadeOut { fade_ms } => self.fade_out(&ctx, *fade_ms),
            // Drones start even when muted so unmuting brings them back
            SoundCue::DroneStart(drone) => self.start_drone(&ctx, drone, vol),
            SoundCue::DroneStop { fade_ms } => self.stop_drone(&ctx, *fade_ms),
            _ if vol <= 0.0 => {}
            SoundCue::Pad(tone) | SoundCue::Tone(tone) => {
                if let Some(bus) = self.bus(&ctx) {
                    play_tone(&ctx, &bus, tone, vol);
                }
            }
            SoundCue::Noise(noise) => {
                let (Some(bus), Some(buffer)) = (self.bus(&ctx), self.noise_buffer(&ctx)) else {
                    return;
                };
                play_noise(&ctx, &bus, &buffer, noise, vol);
            }
        }
    }

    /// Current bus, created on demand
    fn bus(&mut self, ctx: &AudioContext) -> Option<GainNode> {
        if self.bus.is_none() {
            let bus = ctx.create_gain().ok()?;
            bus.gain().set_value(1.0);
            bus.connect_with_audio_node(&ctx.destination()).ok()?;
            self.bus = Some(bus);
        }
        self.bus.clone()
    }

    fn noise_buffer(&mut self, ctx: &AudioContext) -> Option<AudioBuffer> {
        if self.noise.is_none() {
            let rate = ctx.sample_rate();
            let len = (rate * NOISE_SECONDS) as u32;
            let buffer = ctx.create_buffer(1, len, rate).ok()?;
            let mut rng = RandomSource::with_stream(len as u64, AUDIO_STREAM);
            let mut samples: Vec<f32> = (0..len).map(|_| rng.uniform(-0.5, 0.5)).collect();
            buffer.copy_to_channel(&mut samples, 0).ok()?;
            self.noise = Some(buffer);
        }
        self.noise.clone()
    }

    /// Ramp the current bus down and retire it; later cues get a fresh bus
    fn fade_out(&mut self, ctx: &AudioContext, fade_ms: f64) {
        self.stop_drone(ctx, fade_ms);
        let Some(bus) = self.bus.take() else { return };
        let t = ctx.current_time();
        let end = t + fade_ms / 1000.0;
        let gain = bus.gain();
        gain.cancel_scheduled_values(t).ok();
        gain.set_value_at_time(gain.value().max(SILENT), t).ok();
        gain.exponential_ramp_to_value_at_time(SILENT, end).ok();
        self.retired.push(end, bus.into());
    }

    /// Build the drone graph and fade it in. Replaces any drone still sounding.
    fn start_drone(&mut self, ctx: &AudioContext, descriptor: &DroneDescriptor, vol: f32) {
        self.stop_drone(ctx, descriptor.fade_out_ms);
        let Some(bus) = self.bus(ctx) else { return };
        match build_drone(ctx, &bus, descriptor, vol) {
            Some(drone) => self.drone = Some(drone),
            None => log::warn!("Failed to build drone"),
        }
    }

    /// Linear fade to silence, then stop the oscillators and queue the graph
    /// for disconnection
    fn stop_drone(&mut self, ctx: &AudioContext, fade_ms: f64) {
        let Some(drone) = self.drone.take() else { return };
        let t = ctx.current_time();
        let end = t + fade_ms / 1000.0;
        let gain = drone.output.gain();
        gain.cancel_scheduled_values(t).ok();
        gain.set_value_at_time(gain.value(), t).ok();
        gain.linear_ramp_to_value_at_time(0.0, end).ok();

        for osc in &drone.sources {
            osc.stop_with_when(end + 0.02).ok();
        }
        self.retired.push(end + 0.02, drone.output.into());
        for node in drone.nodes {
            self.retired.push(end + 0.02, node);
        }
    }
}

fn build_drone(
    ctx: &AudioContext,
    bus: &GainNode,
    descriptor: &DroneDescriptor,
    vol: f32,
) -> Option<Drone> {
    let output = ctx.create_gain().ok()?;
    let filter = ctx.create_biquad_filter().ok()?;
    filter.set_type(BiquadFilterType::Lowpass);
    filter.frequency().set_value(descriptor.lowpass_hz);
    filter.connect_with_audio_node(&output).ok()?;
    output.connect_with_audio_node(bus).ok()?;

    let mut sources = Vec::with_capacity(descriptor.voices.len() + 1);
    let mut nodes: Vec<AudioNode> = vec![filter.clone().into()];
    let mut voice_gains = Vec::with_capacity(descriptor.voices.len());
    for voice in &descriptor.voices {
        let osc = ctx.create_oscillator().ok()?;
        let amp = ctx.create_gain().ok()?;
        osc.set_type(osc_type(descriptor.waveform));
        osc.frequency().set_value(voice.frequency);
        amp.gain().set_value(voice.gain);
        osc.connect_with_audio_node(&amp).ok()?;
        amp.connect_with_audio_node(&filter).ok()?;
        nodes.push(osc.clone().into());
        nodes.push(amp.clone().into());
        voice_gains.push(amp);
        sources.push(osc);
    }

    if let Some(lfo) = descriptor.lfo {
        let osc = ctx.create_oscillator().ok()?;
        let depth = ctx.create_gain().ok()?;
        osc.frequency().set_value(lfo.frequency);
        depth.gain().set_value(lfo.depth);
        osc.connect_with_audio_node(&depth).ok()?;
        match lfo.target {
            LfoTarget::VoiceGain => {
                for amp in &voice_gains {
                    depth.connect_with_audio_param(&amp.gain()).ok()?;
                }
            }
            LfoTarget::Cutoff => {
                depth.connect_with_audio_param(&filter.frequency()).ok()?;
            }
        }
        nodes.push(osc.clone().into());
        nodes.push(depth.into());
        sources.push(osc);
    }

    let t = ctx.current_time();
    let target = descriptor.gain * vol;
    let gain = output.gain();
    if descriptor.fade_in_ms > 0.0 {
        gain.set_value_at_time(0.0, t).ok();
        gain.linear_ramp_to_value_at_time(target, t + descriptor.fade_in_ms / 1000.0)
            .ok();
    } else {
        gain.set_value_at_time(target, t).ok();
    }
    for osc in &sources {
        osc.start().ok();
    }

    Some(Drone {
        output,
        level: descriptor.gain,
        sources,
        nodes,
    })
}

fn play_tone(ctx: &AudioContext, bus: &GainNode, tone: &ToneDescriptor, vol: f32) -> Option<()> {
    let osc = ctx.create_oscillator().ok()?;
    let env = ctx.create_gain().ok()?;
    osc.set_type(osc_type(tone.waveform));
    osc.connect_with_audio_node(&env).ok()?;
    env.connect_with_audio_node(bus).ok()?;

    let start = ctx.current_time() + tone.start_offset_ms / 1000.0;
    let peak = start + tone.envelope.attack_ms / 1000.0;
    let end = start + tone.duration_ms / 1000.0;

    let freq = osc.frequency();
    freq.set_value_at_time(tone.frequency, start).ok();
    if let Some(target) = tone.end_frequency {
        freq.exponential_ramp_to_value_at_time(target.max(1.0), end).ok();
    }

    let gain = env.gain();
    gain.set_value_at_time(SILENT, start).ok();
    gain.exponential_ramp_to_value_at_time((tone.envelope.peak_gain * vol).max(SILENT), peak)
        .ok();
    gain.exponential_ramp_to_value_at_time(SILENT, end).ok();

    if let Some(modulation) = tone.modulation {
        let lfo = ctx.create_oscillator().ok()?;
        let depth = ctx.create_gain().ok()?;
        lfo.frequency().set_value(modulation.frequency);
        depth.gain().set_value(modulation.depth);
        lfo.connect_with_audio_node(&depth).ok()?;
        depth.connect_with_audio_param(&freq).ok()?;
        lfo.start_with_when(start).ok();
        lfo.stop_with_when(end + 0.02).ok();
    }

    osc.start_with_when(start).ok();
    osc.stop_with_when(end + 0.02).ok();
    Some(())
}

fn play_noise(
    ctx: &AudioContext,
    bus: &GainNode,
    buffer: &AudioBuffer,
    noise: &NoiseDescriptor,
    vol: f32,
) -> Option<()> {
    let src = ctx.create_buffer_source().ok()?;
    let env = ctx.create_gain().ok()?;
    src.set_buffer(Some(buffer));

    match noise.lowpass_hz {
        Some(cutoff) => {
            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(cutoff);
            src.connect_with_audio_node(&filter).ok()?;
            filter.connect_with_audio_node(&env).ok()?;
        }
        None => {
            src.connect_with_audio_node(&env).ok()?;
        }
    }
    env.connect_with_audio_node(bus).ok()?;

    let start = ctx.current_time() + noise.start_offset_ms / 1000.0;
    let end = start + noise.duration_ms / 1000.0;
    let gain = env.gain();
    gain.set_value_at_time((noise.gain * vol).max(SILENT), start).ok();
    gain.exponential_ramp_to_value_at_time(SILENT, end).ok();

    src.start_with_when(start).ok();
    src.stop_with_when(end + 0.02).ok();
    Some(())
}
