//! Per-note voice
//!
//! A [`Voice`] owns the complete timing state of one sounding note: the two
//! pulse channels, the triangle, the noise channel and the mixer filters. It
//! renders blocks of stereo frames on demand and keeps every counter running
//! across calls, so splitting a note into blocks of any size produces the same
//! samples as one long render.

use crate::constants::{
    duty_fraction, noise_frequency, wavelength, ENVELOPE_CLOCK, MIN_FREQUENCY, SWEEP_CLOCK,
};
use crate::dither::{NoiseSource, SeededNoise};
use crate::generators::{
    sweep_shift, NoiseChannel, NoiseConfig, PulseChannel, PulseConfig, TriangleChannel,
};
use crate::mixer::Mixer;
use crate::note::NotePitch;
use crate::params::{InstrumentParams, ParamSnapshot, PulseSnapshot};
use std::sync::Arc;
use tracing::debug;

/// One note's worth of 2A03 channel state
pub struct Voice<N: NotePitch, S: NoiseSource = SeededNoise> {
    params: Arc<InstrumentParams>,
    note: N,
    sample_rate: u32,
    frames_per_period: usize,
    /// Longest renderable wavelength (MIN_FREQUENCY)
    max_wavelength: i32,
    /// Pitch the channel wavelengths were last derived from
    last_frequency: f32,
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    triangle: TriangleChannel,
    noise: NoiseChannel,
    mixer: Mixer,
    dither: S,
}

impl<N: NotePitch> Voice<N, SeededNoise> {
    /// Create a voice with the default seeded dither source
    pub fn new(
        params: Arc<InstrumentParams>,
        sample_rate: u32,
        note: N,
        frames_per_period: usize,
    ) -> Self {
        Self::with_noise_source(params, sample_rate, note, frames_per_period, SeededNoise::new())
    }
}

impl<N: NotePitch, S: NoiseSource> Voice<N, S> {
    /// Create a voice with a custom dither source
    pub fn with_noise_source(
        params: Arc<InstrumentParams>,
        sample_rate: u32,
        note: N,
        frames_per_period: usize,
        dither: S,
    ) -> Self {
        let max_wavelength = wavelength(sample_rate, MIN_FREQUENCY);
        debug!(
            sample_rate,
            frames_per_period,
            frequency = note.frequency(),
            "creating voice"
        );
        Self {
            params,
            note,
            sample_rate,
            frames_per_period,
            max_wavelength,
            last_frequency: 0.0,
            pulse1: PulseChannel::pulse1(),
            pulse2: PulseChannel::pulse2(),
            triangle: TriangleChannel::new(),
            noise: NoiseChannel::new(),
            mixer: Mixer::new(sample_rate),
            dither,
        }
    }

    /// The note this voice plays
    pub fn note(&self) -> &N {
        &self.note
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Host block size the voice was created for
    pub fn frames_per_period(&self) -> usize {
        self.frames_per_period
    }

    /// Current wavelengths of pulse 1, pulse 2, triangle and noise in samples
    pub fn wavelengths(&self) -> [i32; 4] {
        [
            self.pulse1.wavelength(),
            self.pulse2.wavelength(),
            self.triangle.wavelength(),
            self.noise.wavelength(),
        ]
    }

    /// Noise channel state
    pub fn noise_channel(&self) -> &NoiseChannel {
        &self.noise
    }

    /// Render `frames` stereo frames into the start of `buffer`
    ///
    /// `frames` is clamped to the buffer length. Both channels of every frame
    /// receive the same sample.
    pub fn render(&mut self, buffer: &mut [[f32; 2]], frames: usize) {
        let frames = frames.min(buffer.len());
        if frames == 0 {
            return;
        }

        let snapshot = self.params.snapshot();
        let frequency = self.note.frequency();
        self.update_wavelengths(frequency, &snapshot);

        let pulse1 = self.pulse_config(&snapshot.pulse[0], snapshot.channels.is_pulse1_enabled());
        let pulse2 = self.pulse_config(&snapshot.pulse[1], snapshot.channels.is_pulse2_enabled());
        let noise = NoiseConfig {
            enabled: snapshot.channels.is_noise_enabled(),
            volume: snapshot.noise.volume,
            envelope_enabled: snapshot.noise.envelope_enabled,
            envelope_looped: snapshot.noise.envelope_looped,
            envelope_length: self.envelope_length(snapshot.noise.envelope_length),
            short_mode: snapshot.noise.short_mode,
        };
        let triangle_enabled = snapshot.channels.is_triangle_enabled();
        let triangle_volume = snapshot.triangle.volume;
        let max_wavelength = self.max_wavelength;

        for frame in buffer[..frames].iter_mut() {
            let levels = [
                self.pulse1.clock(&pulse1, max_wavelength),
                self.pulse2.clock(&pulse2, max_wavelength),
                self.triangle
                    .clock(triangle_enabled, triangle_volume, max_wavelength),
                self.noise.clock(&noise),
            ];
            let sample = self
                .mixer
                .mix(levels, snapshot.master_volume, &mut self.dither);
            *frame = [sample, sample];
        }
    }

    fn update_wavelengths(&mut self, frequency: f32, snapshot: &ParamSnapshot) {
        if frequency != self.last_frequency {
            self.pulse1.set_wavelength(wavelength(
                self.sample_rate,
                frequency * snapshot.pulse[0].multiplier,
            ));
            self.pulse2.set_wavelength(wavelength(
                self.sample_rate,
                frequency * snapshot.pulse[1].multiplier,
            ));
            self.triangle.set_wavelength(wavelength(
                self.sample_rate,
                frequency * snapshot.triangle.multiplier,
            ));
            self.last_frequency = frequency;
        }

        let noise_rate = if snapshot.noise.use_note_frequency {
            frequency
        } else {
            noise_frequency(snapshot.noise.frequency_index)
        };
        self.noise
            .set_wavelength(wavelength(self.sample_rate, noise_rate));
    }

    fn pulse_config(&self, pulse: &PulseSnapshot, enabled: bool) -> PulseConfig {
        PulseConfig {
            enabled,
            duty: duty_fraction(pulse.duty_cycle),
            volume: pulse.volume,
            envelope_enabled: pulse.envelope_enabled,
            envelope_looped: pulse.envelope_looped,
            envelope_length: self.envelope_length(pulse.envelope_length),
            sweep_enabled: pulse.sweep_enabled,
            sweep_rate: wavelength(
                self.sample_rate,
                (SWEEP_CLOCK / (pulse.sweep_rate + 1) as f32).floor(),
            ),
            sweep_shift: sweep_shift(pulse.sweep_amount),
        }
    }

    fn envelope_length(&self, setting: i32) -> i32 {
        wavelength(
            self.sample_rate,
            (ENVELOPE_CLOCK / (setting + 1) as f32).floor(),
        )
    }
}

impl<N: NotePitch + std::fmt::Debug, S: NoiseSource> std::fmt::Debug for Voice<N, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("note", &self.note)
            .field("sample_rate", &self.sample_rate)
            .field("wavelengths", &self.wavelengths())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::Silence;
    use crate::note::{FixedPitch, SharedNote};

    fn solo_pulse1() -> Arc<InstrumentParams> {
        let params = Arc::new(InstrumentParams::new());
        params.pulse2.enabled.set(false);
        params.triangle.enabled.set(false);
        params.noise.enabled.set(false);
        params
    }

    #[test]
    fn test_wavelengths_from_note() {
        let params = Arc::new(InstrumentParams::new());
        params.pulse2.coarse_detune.set(12.0);
        let mut voice = Voice::new(params, 44_100, FixedPitch::new(440.0), 64);
        let mut buf = [[0.0f32; 2]; 1];
        voice.render(&mut buf, 1);
        let [p1, p2, tri, _] = voice.wavelengths();
        assert_eq!(p1, 100);
        assert_eq!(p2, 50);
        assert_eq!(tri, 100);
    }

    #[test]
    fn test_noise_wavelength_from_index() {
        let params = Arc::new(InstrumentParams::new());
        params.noise.frequency_index.set(15.0);
        let mut voice = Voice::new(Arc::clone(&params), 44_100, FixedPitch::new(440.0), 64);
        let mut buf = [[0.0f32; 2]; 1];
        voice.render(&mut buf, 1);
        // 895 kHz / 5 = 179 kHz, faster than the output rate
        assert_eq!(voice.wavelengths()[3], 0);

        params.noise.frequency_index.set(0.0);
        voice.render(&mut buf, 1);
        assert_eq!(voice.wavelengths()[3], wavelength(44_100, 895_000.0 / 4069.0));

        params.noise.use_note_frequency.set(true);
        voice.render(&mut buf, 1);
        assert_eq!(voice.wavelengths()[3], 100);
    }

    #[test]
    fn test_detune_applies_on_next_pitch_change() {
        let params = Arc::new(InstrumentParams::new());
        let note = Arc::new(SharedNote::new(440.0));
        let mut voice = Voice::new(Arc::clone(&params), 44_100, Arc::clone(&note), 64);
        let mut buf = [[0.0f32; 2]; 4];
        voice.render(&mut buf, 4);
        assert_eq!(voice.wavelengths()[0], 100);

        params.pulse1.coarse_detune.set(12.0);
        voice.render(&mut buf, 4);
        assert_eq!(voice.wavelengths()[0], 100);

        note.set_frequency(441.0);
        voice.render(&mut buf, 4);
        assert_eq!(voice.wavelengths()[0], wavelength(44_100, 882.0));
    }

    #[test]
    fn test_noise_envelope_follows_block_renders() {
        let params = Arc::new(InstrumentParams::new());
        params.pulse1.enabled.set(false);
        params.pulse2.enabled.set(false);
        params.triangle.enabled.set(false);
        assert!(params.set_by_key("envon4", 1.0));
        let mut voice = Voice::new(Arc::clone(&params), 44_100, FixedPitch::new(440.0), 64);
        assert_eq!(voice.note().frequency(), 440.0);
        assert_eq!(voice.noise_channel().envelope().value(), 15);

        // envlen4 = 0: one step every trunc(44100 / 240) = 183 samples
        let mut buf = [[0.0f32; 2]; 183];
        for expected in [14, 13, 12] {
            voice.render(&mut buf, 183);
            assert_eq!(voice.noise_channel().envelope().value(), expected);
        }

        params.noise.envelope_length.set(1.0);
        let mut buf = [[0.0f32; 2]; 367];
        voice.render(&mut buf, 367);
        assert_eq!(voice.noise_channel().envelope().value(), 11);
    }

    #[test]
    fn test_render_zero_frames_leaves_buffer() {
        let mut voice = Voice::new(solo_pulse1(), 44_100, FixedPitch::new(440.0), 64);
        let mut buf = [[7.0f32; 2]; 8];
        voice.render(&mut buf, 0);
        assert!(buf.iter().all(|f| *f == [7.0, 7.0]));
    }

    #[test]
    fn test_render_clamps_to_buffer() {
        let mut voice = Voice::new(solo_pulse1(), 44_100, FixedPitch::new(440.0), 64);
        let mut buf = [[0.0f32; 2]; 16];
        voice.render(&mut buf, 1000);
        assert!(buf.iter().all(|f| f[0].is_finite() && f[0] == f[1]));
    }

    #[test]
    fn test_only_prefix_written() {
        let mut voice = Voice::new(solo_pulse1(), 44_100, FixedPitch::new(440.0), 64);
        let mut buf = [[9.0f32; 2]; 16];
        voice.render(&mut buf, 10);
        assert!(buf[..10].iter().all(|f| f[0] != 9.0));
        assert!(buf[10..].iter().all(|f| *f == [9.0, 9.0]));
    }

    #[test]
    fn test_custom_noise_source() {
        let params = solo_pulse1();
        let mut a = Voice::with_noise_source(
            Arc::clone(&params),
            44_100,
            FixedPitch::new(440.0),
            64,
            Silence,
        );
        let mut b = Voice::with_noise_source(params, 44_100, FixedPitch::new(440.0), 64, Silence);
        let mut buf_a = [[0.0f32; 2]; 256];
        let mut buf_b = [[0.0f32; 2]; 256];
        a.render(&mut buf_a, 256);
        b.render(&mut buf_b, 256);
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn test_invalid_frequencies_do_not_panic() {
        for freq in [0.0, -440.0, f32::NAN, f32::INFINITY, 1.0e9, 1.0] {
            let mut voice = Voice::new(
                Arc::new(InstrumentParams::new()),
                44_100,
                FixedPitch::new(freq),
                64,
            );
            let mut buf = [[0.0f32; 2]; 512];
            voice.render(&mut buf, 512);
            assert!(buf.iter().all(|f| f[0].is_finite()), "non-finite output at {freq} Hz");
        }
    }
}
