//! Channel generators for the 2A03 voice
//!
//! This module contains the individual channel state machines:
//! - Pulse channels (2) with duty cycle, envelope and sweep
//! - Triangle channel (32-step sequencer)
//! - Noise channel driven by a 15-bit LFSR
//! - Decaying envelope shared by pulse and noise channels
//!
//! All timing is expressed in whole output samples. Every `clock` call renders
//! the current output level (0-15) and then advances the channel by one sample.

use crate::constants::{
    LFSR_SEED, LFSR_TOP_BIT, MAX_LEVEL, MIN_WAVELENGTH, TRIANGLE_TABLE,
};

/// Remap a user sweep amount (-7..=7) to the signed shift the hardware uses
///
/// Positive results lengthen the wavelength (pitch falls), negative results
/// shorten it (pitch rises). Zero disables the sweep.
#[inline]
pub fn sweep_shift(amount: i32) -> i32 {
    let shift = -amount;
    if shift > 0 {
        8 - shift
    } else if shift < 0 {
        -8 - shift
    } else {
        0
    }
}

/// 4-bit decaying envelope
///
/// Starts at 15 and decrements once every `length` samples. When it would drop
/// below zero it either reloads 15 (looped) or holds at 0.
#[derive(Clone, Debug)]
pub struct Envelope {
    counter: i32,
    value: i32,
}

impl Envelope {
    /// Create an envelope at full level
    pub fn new() -> Self {
        Self {
            counter: 0,
            value: MAX_LEVEL,
        }
    }

    /// Current envelope level (0-15)
    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Scale a channel volume by the envelope
    #[inline]
    pub fn apply(&self, volume: i32) -> i32 {
        volume * self.value / MAX_LEVEL
    }

    /// Advance the envelope by one sample
    #[inline]
    pub fn tick(&mut self, length: i32, looped: bool) {
        self.counter += 1;
        if self.counter >= length {
            self.counter = 0;
            self.value -= 1;
            if self.value < 0 {
                self.value = if looped { MAX_LEVEL } else { 0 };
            }
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-block settings of a pulse channel, derived from the parameter snapshot
#[derive(Clone, Copy, Debug, Default)]
pub struct PulseConfig {
    /// Channel enable
    pub enabled: bool,
    /// Fraction of the period the output is high
    pub duty: f32,
    /// Channel volume (0-15)
    pub volume: i32,
    /// Scale the volume by the envelope
    pub envelope_enabled: bool,
    /// Reload the envelope after it reaches zero
    pub envelope_looped: bool,
    /// Samples per envelope step
    pub envelope_length: i32,
    /// Sweep enable
    pub sweep_enabled: bool,
    /// Samples per sweep step
    pub sweep_rate: i32,
    /// Signed sweep shift, see [`sweep_shift`]
    pub sweep_shift: i32,
}

/// Output level for a channel with optional envelope scaling
#[inline]
fn channel_level(volume: i32, envelope_enabled: bool, envelope: &Envelope) -> i32 {
    if envelope_enabled {
        envelope.apply(volume)
    } else {
        volume
    }
}

/// Pulse (square) channel with sweep unit
#[derive(Clone, Debug)]
pub struct PulseChannel {
    /// Period in samples
    wavelength: i32,
    /// Position within the period
    phase: i32,
    envelope: Envelope,
    sweep_counter: i32,
    /// Pulse 1 negates in ones' complement, costing one extra step per sweep
    ones_complement_sweep: bool,
}

impl PulseChannel {
    /// Create pulse channel 1 (ones' complement sweep)
    pub fn pulse1() -> Self {
        Self::with_sweep_mode(true)
    }

    /// Create pulse channel 2 (two's complement sweep)
    pub fn pulse2() -> Self {
        Self::with_sweep_mode(false)
    }

    fn with_sweep_mode(ones_complement_sweep: bool) -> Self {
        Self {
            wavelength: 0,
            phase: 0,
            envelope: Envelope::new(),
            sweep_counter: 0,
            ones_complement_sweep,
        }
    }

    /// Set the period in samples
    #[inline]
    pub fn set_wavelength(&mut self, wavelength: i32) {
        self.wavelength = wavelength;
    }

    /// Current period in samples
    #[inline]
    pub fn wavelength(&self) -> i32 {
        self.wavelength
    }

    /// Current phase counter
    #[inline]
    pub fn phase(&self) -> i32 {
        self.phase
    }

    /// Envelope state
    #[inline]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Check whether the wavelength can be rendered and swept
    #[inline]
    pub fn is_in_range(&self, max_wavelength: i32) -> bool {
        (MIN_WAVELENGTH..=max_wavelength).contains(&self.wavelength)
    }

    /// Render the current level and advance by one sample
    #[inline]
    pub fn clock(&mut self, cfg: &PulseConfig, max_wavelength: i32) -> i32 {
        let output = if cfg.enabled && self.is_in_range(max_wavelength) {
            if self.phase as f32 > self.wavelength as f32 * cfg.duty {
                0
            } else {
                channel_level(cfg.volume, cfg.envelope_enabled, &self.envelope)
            }
        } else {
            0
        };

        self.sweep_counter += 1;
        if self.sweep_counter >= cfg.sweep_rate {
            self.sweep_counter = 0;
            if cfg.sweep_enabled && self.is_in_range(max_wavelength) {
                self.apply_sweep(cfg.sweep_shift);
            }
        }

        self.phase = (self.phase + 1) % self.wavelength.max(1);
        self.envelope
            .tick(cfg.envelope_length, cfg.envelope_looped);

        output
    }

    #[inline]
    fn apply_sweep(&mut self, shift: i32) {
        if shift > 0 {
            self.wavelength += self.wavelength >> shift;
        } else if shift < 0 {
            self.wavelength -= self.wavelength >> shift.abs();
            if self.ones_complement_sweep {
                self.wavelength -= 1;
            }
        }
    }
}

/// Triangle channel
#[derive(Clone, Debug, Default)]
pub struct TriangleChannel {
    wavelength: i32,
    phase: i32,
}

impl TriangleChannel {
    /// Create a new triangle channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the period in samples
    #[inline]
    pub fn set_wavelength(&mut self, wavelength: i32) {
        self.wavelength = wavelength;
    }

    /// Current period in samples
    #[inline]
    pub fn wavelength(&self) -> i32 {
        self.wavelength
    }

    /// Render the current level and advance by one sample
    ///
    /// The phase is wrapped before use so a shortened wavelength never indexes
    /// past the end of the sequence.
    #[inline]
    pub fn clock(&mut self, enabled: bool, volume: i32, max_wavelength: i32) -> i32 {
        let in_range = (1..=max_wavelength).contains(&self.wavelength);
        if in_range {
            self.phase %= self.wavelength;
        }

        let output = if enabled && in_range {
            let step = (self.phase as i64 * 32 / self.wavelength as i64) as usize;
            TRIANGLE_TABLE[step.min(31)] as i32 * volume / MAX_LEVEL
        } else {
            0
        };

        self.phase = self.phase.wrapping_add(1).max(0);
        output
    }
}

/// 15-bit linear-feedback shift register used by the noise channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lfsr {
    state: u16,
}

impl Lfsr {
    /// Create a register with the power-on seed
    pub fn new() -> Self {
        Self { state: LFSR_SEED }
    }

    /// Raw register contents
    #[inline]
    pub fn state(&self) -> u16 {
        self.state
    }

    /// Output gate: open while bit 0 is clear
    #[inline]
    pub fn gate_open(&self) -> bool {
        self.state & 1 == 0
    }

    /// Shift once
    ///
    /// Feedback is bit 0 XOR bit 6 in short mode, bit 0 XOR bit 1 otherwise,
    /// and is inserted at the top bit after the right shift.
    #[inline]
    pub fn step(&mut self, short_mode: bool) {
        let tap = if short_mode { 6 } else { 1 };
        let feedback = (self.state ^ (self.state >> tap)) & 1;
        self.state = (self.state >> 1) | (feedback << LFSR_TOP_BIT);
    }
}

impl Default for Lfsr {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-block settings of the noise channel
#[derive(Clone, Copy, Debug, Default)]
pub struct NoiseConfig {
    /// Channel enable
    pub enabled: bool,
    /// Channel volume (0-15)
    pub volume: i32,
    /// Scale the volume by the envelope
    pub envelope_enabled: bool,
    /// Reload the envelope after it reaches zero
    pub envelope_looped: bool,
    /// Samples per envelope step
    pub envelope_length: i32,
    /// Short (93-step) LFSR sequence
    pub short_mode: bool,
}

/// Noise channel
#[derive(Clone, Debug)]
pub struct NoiseChannel {
    /// Samples between LFSR steps
    wavelength: i32,
    counter: i32,
    lfsr: Lfsr,
    envelope: Envelope,
}

impl NoiseChannel {
    /// Create a new noise channel
    pub fn new() -> Self {
        Self {
            wavelength: 0,
            counter: 0,
            lfsr: Lfsr::new(),
            envelope: Envelope::new(),
        }
    }

    /// Set the number of samples between LFSR steps
    #[inline]
    pub fn set_wavelength(&mut self, wavelength: i32) {
        self.wavelength = wavelength;
    }

    /// Current LFSR step interval in samples
    #[inline]
    pub fn wavelength(&self) -> i32 {
        self.wavelength
    }

    /// Shift register state
    #[inline]
    pub fn lfsr(&self) -> &Lfsr {
        &self.lfsr
    }

    /// Envelope state
    #[inline]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Render the current level and advance by one sample
    #[inline]
    pub fn clock(&mut self, cfg: &NoiseConfig) -> i32 {
        let output = if cfg.enabled && self.lfsr.gate_open() {
            channel_level(cfg.volume, cfg.envelope_enabled, &self.envelope)
        } else {
            0
        };

        self.counter += 1;
        if self.counter >= self.wavelength {
            self.counter = 0;
            self.lfsr.step(cfg.short_mode);
        }
        self.envelope
            .tick(cfg.envelope_length, cfg.envelope_looped);

        output
    }
}

impl Default for NoiseChannel {
    fn default() -> Self {
        Self::new()
    }
}
