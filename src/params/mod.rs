//! Shared instrument parameters
//!
//! Every user-facing control of the instrument lives here as a lock-free
//! atomic cell. A UI or automation thread writes values while the audio
//! thread reads a [`ParamSnapshot`] once per rendered block.
//!
//! All writes are clamped to the declared range and quantized to the declared
//! step. Coarse detune controls also maintain the derived frequency
//! multiplier `2^(semitones / 12)`, updated in the same call as the write.

mod settings;

use crate::mixer::ChannelFlags;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

/// Kind of value a parameter holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// On/off switch
    Bool,
    /// Integer choice
    Int,
    /// Stepped floating point value
    Float,
}

/// Static description of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParamDescriptor {
    /// Stable persistence key (e.g. `vol1`)
    pub key: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Value kind
    pub kind: ParamKind,
    /// Lowest accepted value
    pub min: f32,
    /// Highest accepted value
    pub max: f32,
    /// Quantization step
    pub step: f32,
    /// Initial value
    pub default: f32,
}

/// Stepped floating point parameter stored as `f32` bits
#[derive(Debug)]
pub struct FloatParam {
    key: &'static str,
    name: &'static str,
    min: f32,
    max: f32,
    step: f32,
    default: f32,
    value: AtomicU32,
}

impl FloatParam {
    /// Create a parameter at its default value
    pub fn new(
        key: &'static str,
        name: &'static str,
        default: f32,
        min: f32,
        max: f32,
        step: f32,
    ) -> Self {
        Self {
            key,
            name,
            min,
            max,
            step,
            default,
            value: AtomicU32::new(default.to_bits()),
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Current value truncated to an integer
    #[inline]
    pub fn value_i32(&self) -> i32 {
        self.value() as i32
    }

    /// Write a value, clamped and quantized. Non-finite values are ignored.
    pub fn set(&self, value: f32) {
        if let Some(v) = self.quantize(value) {
            self.value.store(v.to_bits(), Ordering::Relaxed);
        }
    }

    /// Restore the default value
    pub fn reset(&self) {
        self.value.store(self.default.to_bits(), Ordering::Relaxed);
    }

    /// Static description of this parameter
    pub fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor {
            key: self.key,
            name: self.name,
            kind: ParamKind::Float,
            min: self.min,
            max: self.max,
            step: self.step,
            default: self.default,
        }
    }

    fn quantize(&self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let clamped = value.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        Some((self.min + steps * self.step).clamp(self.min, self.max))
    }
}

/// Integer choice parameter
#[derive(Debug)]
pub struct IntParam {
    key: &'static str,
    name: &'static str,
    min: i32,
    max: i32,
    default: i32,
    value: AtomicI32,
}

impl IntParam {
    /// Create a parameter at its default value
    pub fn new(key: &'static str, name: &'static str, default: i32, min: i32, max: i32) -> Self {
        Self {
            key,
            name,
            min,
            max,
            default,
            value: AtomicI32::new(default),
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> i32 {
        self.value.load(Ordering::Relaxed)
    }

    /// Write a value, clamped to the range
    pub fn set(&self, value: i32) {
        self.value
            .store(value.clamp(self.min, self.max), Ordering::Relaxed);
    }

    /// Restore the default value
    pub fn reset(&self) {
        self.value.store(self.default, Ordering::Relaxed);
    }

    /// Static description of this parameter
    pub fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor {
            key: self.key,
            name: self.name,
            kind: ParamKind::Int,
            min: self.min as f32,
            max: self.max as f32,
            step: 1.0,
            default: self.default as f32,
        }
    }
}

/// On/off parameter
#[derive(Debug)]
pub struct BoolParam {
    key: &'static str,
    name: &'static str,
    default: bool,
    value: AtomicBool,
}

impl BoolParam {
    /// Create a parameter at its default value
    pub fn new(key: &'static str, name: &'static str, default: bool) -> Self {
        Self {
            key,
            name,
            default,
            value: AtomicBool::new(default),
        }
    }

    /// Current value
    #[inline]
    pub fn value(&self) -> bool {
        self.value.load(Ordering::Relaxed)
    }

    /// Write a value
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Restore the default value
    pub fn reset(&self) {
        self.value.store(self.default, Ordering::Relaxed);
    }

    /// Static description of this parameter
    pub fn descriptor(&self) -> ParamDescriptor {
        ParamDescriptor {
            key: self.key,
            name: self.name,
            kind: ParamKind::Bool,
            min: 0.0,
            max: 1.0,
            step: 1.0,
            default: if self.default { 1.0 } else { 0.0 },
        }
    }
}

/// Coarse detune in semitones with its derived frequency multiplier
#[derive(Debug)]
pub struct DetuneParam {
    semitones: FloatParam,
    multiplier: AtomicU32,
}

impl DetuneParam {
    /// Create a detune control at 0 semitones (range -24..=24)
    pub fn new(key: &'static str, name: &'static str) -> Self {
        Self {
            semitones: FloatParam::new(key, name, 0.0, -24.0, 24.0, 1.0),
            multiplier: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    /// Detune in semitones
    #[inline]
    pub fn value(&self) -> f32 {
        self.semitones.value()
    }

    /// Frequency multiplier `2^(semitones / 12)`
    #[inline]
    pub fn multiplier(&self) -> f32 {
        f32::from_bits(self.multiplier.load(Ordering::Relaxed))
    }

    /// Write the detune and recompute the multiplier
    pub fn set(&self, semitones: f32) {
        self.semitones.set(semitones);
        self.update_multiplier();
    }

    /// Restore 0 semitones
    pub fn reset(&self) {
        self.semitones.reset();
        self.update_multiplier();
    }

    /// Static description of this parameter
    pub fn descriptor(&self) -> ParamDescriptor {
        self.semitones.descriptor()
    }

    fn update_multiplier(&self) {
        let multiplier = (self.semitones.value() / 12.0).exp2();
        self.multiplier
            .store(multiplier.to_bits(), Ordering::Relaxed);
    }
}

/// Borrowed handle to any parameter, used for key-based access
#[derive(Clone, Copy, Debug)]
pub enum ParamRef<'a> {
    /// On/off parameter
    Bool(&'a BoolParam),
    /// Integer choice
    Int(&'a IntParam),
    /// Stepped float
    Float(&'a FloatParam),
    /// Coarse detune
    Detune(&'a DetuneParam),
}

impl ParamRef<'_> {
    /// Static description of the referenced parameter
    pub fn descriptor(&self) -> ParamDescriptor {
        match self {
            ParamRef::Bool(p) => p.descriptor(),
            ParamRef::Int(p) => p.descriptor(),
            ParamRef::Float(p) => p.descriptor(),
            ParamRef::Detune(p) => p.descriptor(),
        }
    }

    /// Current value as a number (bools read as 0/1)
    pub fn get(&self) -> f32 {
        match self {
            ParamRef::Bool(p) => {
                if p.value() {
                    1.0
                } else {
                    0.0
                }
            }
            ParamRef::Int(p) => p.value() as f32,
            ParamRef::Float(p) => p.value(),
            ParamRef::Detune(p) => p.value(),
        }
    }

    /// Write a numeric value (bools: non-zero is on, ints round to nearest)
    pub fn set(&self, value: f32) {
        match self {
            ParamRef::Bool(p) => p.set(value != 0.0),
            ParamRef::Int(p) => {
                if value.is_finite() {
                    p.set(value.round() as i32);
                }
            }
            ParamRef::Float(p) => p.set(value),
            ParamRef::Detune(p) => p.set(value),
        }
    }

    /// Restore the default value
    pub fn reset(&self) {
        match self {
            ParamRef::Bool(p) => p.reset(),
            ParamRef::Int(p) => p.reset(),
            ParamRef::Float(p) => p.reset(),
            ParamRef::Detune(p) => p.reset(),
        }
    }
}

/// Pulse channel controls
#[derive(Debug)]
pub struct PulseParams {
    /// Channel enable
    pub enabled: BoolParam,
    /// Coarse detune (-24..=24 semitones)
    pub coarse_detune: DetuneParam,
    /// Volume (0..=15)
    pub volume: FloatParam,
    /// Envelope enable
    pub envelope_enabled: BoolParam,
    /// Envelope loop
    pub envelope_looped: BoolParam,
    /// Envelope length (0..=15)
    pub envelope_length: FloatParam,
    /// Duty cycle selection (0..=3)
    pub duty_cycle: IntParam,
    /// Sweep enable
    pub sweep_enabled: BoolParam,
    /// Sweep amount (-7..=7)
    pub sweep_amount: FloatParam,
    /// Sweep rate (0..=7)
    pub sweep_rate: FloatParam,
}

impl PulseParams {
    fn pulse1() -> Self {
        Self {
            enabled: BoolParam::new("on1", "Channel 1 Enable", true),
            coarse_detune: DetuneParam::new("crs1", "Channel 1 Coarse detune"),
            volume: FloatParam::new("vol1", "Channel 1 Volume", 15.0, 0.0, 15.0, 1.0),
            envelope_enabled: BoolParam::new("envon1", "Channel 1 Envelope enable", false),
            envelope_looped: BoolParam::new("envloop1", "Channel 1 Envelope loop", false),
            envelope_length: FloatParam::new(
                "envlen1",
                "Channel 1 Envelope length",
                0.0,
                0.0,
                15.0,
                1.0,
            ),
            duty_cycle: IntParam::new("dc1", "Channel 1 Duty cycle", 0, 0, 3),
            sweep_enabled: BoolParam::new("sweep1", "Channel 1 Sweep enable", false),
            sweep_amount: FloatParam::new("swamt1", "Channel 1 Sweep amount", 0.0, -7.0, 7.0, 1.0),
            sweep_rate: FloatParam::new("swrate1", "Channel 1 Sweep rate", 0.0, 0.0, 7.0, 1.0),
        }
    }

    fn pulse2() -> Self {
        Self {
            enabled: BoolParam::new("on2", "Channel 2 Enable", true),
            coarse_detune: DetuneParam::new("crs2", "Channel 2 Coarse detune"),
            volume: FloatParam::new("vol2", "Channel 2 Volume", 15.0, 0.0, 15.0, 1.0),
            envelope_enabled: BoolParam::new("envon2", "Channel 2 Envelope enable", false),
            envelope_looped: BoolParam::new("envloop2", "Channel 2 Envelope loop", false),
            envelope_length: FloatParam::new(
                "envlen2",
                "Channel 2 Envelope length",
                0.0,
                0.0,
                15.0,
                1.0,
            ),
            duty_cycle: IntParam::new("dc2", "Channel 2 Duty cycle", 2, 0, 3),
            sweep_enabled: BoolParam::new("sweep2", "Channel 2 Sweep enable", false),
            sweep_amount: FloatParam::new("swamt2", "Channel 2 Sweep amount", 0.0, -7.0, 7.0, 1.0),
            sweep_rate: FloatParam::new("swrate2", "Channel 2 Sweep rate", 0.0, 0.0, 7.0, 1.0),
        }
    }

    fn refs(&self) -> [ParamRef<'_>; 10] {
        [
            ParamRef::Bool(&self.enabled),
            ParamRef::Detune(&self.coarse_detune),
            ParamRef::Float(&self.volume),
            ParamRef::Bool(&self.envelope_enabled),
            ParamRef::Bool(&self.envelope_looped),
            ParamRef::Float(&self.envelope_length),
            ParamRef::Int(&self.duty_cycle),
            ParamRef::Bool(&self.sweep_enabled),
            ParamRef::Float(&self.sweep_amount),
            ParamRef::Float(&self.sweep_rate),
        ]
    }

    fn snapshot(&self) -> PulseSnapshot {
        PulseSnapshot {
            multiplier: self.coarse_detune.multiplier(),
            volume: self.volume.value_i32(),
            envelope_enabled: self.envelope_enabled.value(),
            envelope_looped: self.envelope_looped.value(),
            envelope_length: self.envelope_length.value_i32(),
            duty_cycle: self.duty_cycle.value(),
            sweep_enabled: self.sweep_enabled.value(),
            sweep_amount: self.sweep_amount.value_i32(),
            sweep_rate: self.sweep_rate.value_i32(),
        }
    }
}

/// Triangle channel controls
#[derive(Debug)]
pub struct TriangleParams {
    /// Channel enable
    pub enabled: BoolParam,
    /// Coarse detune (-24..=24 semitones)
    pub coarse_detune: DetuneParam,
    /// Volume (0..=15)
    pub volume: FloatParam,
}

impl TriangleParams {
    fn new() -> Self {
        Self {
            enabled: BoolParam::new("on3", "Channel 3 Enable", true),
            coarse_detune: DetuneParam::new("crs3", "Channel 3 Coarse detune"),
            volume: FloatParam::new("vol3", "Channel 3 Volume", 15.0, 0.0, 15.0, 1.0),
        }
    }
}

/// Noise channel controls
#[derive(Debug)]
pub struct NoiseParams {
    /// Channel enable
    pub enabled: BoolParam,
    /// Volume (0..=15)
    pub volume: FloatParam,
    /// Envelope enable
    pub envelope_enabled: BoolParam,
    /// Envelope loop
    pub envelope_looped: BoolParam,
    /// Envelope length (0..=15)
    pub envelope_length: FloatParam,
    /// Short LFSR sequence
    pub short_mode: BoolParam,
    /// Clock the LFSR at the note frequency instead of a preset rate
    pub use_note_frequency: BoolParam,
    /// Preset rate index (0 slowest ..= 15 fastest)
    pub frequency_index: FloatParam,
}

impl NoiseParams {
    fn new() -> Self {
        Self {
            enabled: BoolParam::new("on4", "Channel 4 Enable", true),
            volume: FloatParam::new("vol4", "Channel 4 Volume", 15.0, 0.0, 15.0, 1.0),
            envelope_enabled: BoolParam::new("envon4", "Channel 4 Envelope enable", false),
            envelope_looped: BoolParam::new("envloop4", "Channel 4 Envelope loop", false),
            envelope_length: FloatParam::new(
                "envlen4",
                "Channel 4 Envelope length",
                0.0,
                0.0,
                15.0,
                1.0,
            ),
            short_mode: BoolParam::new("nmode4", "Channel 4 Noise mode", false),
            use_note_frequency: BoolParam::new("nfrqmode4", "Channel 4 Noise frequency mode", false),
            frequency_index: FloatParam::new(
                "nfreq4",
                "Channel 4 Noise frequency",
                0.0,
                0.0,
                15.0,
                1.0,
            ),
        }
    }
}

/// The full parameter set of one instrument
///
/// Shared between the control side and every voice as `Arc<InstrumentParams>`.
#[derive(Debug)]
pub struct InstrumentParams {
    /// Pulse channel 1
    pub pulse1: PulseParams,
    /// Pulse channel 2
    pub pulse2: PulseParams,
    /// Triangle channel
    pub triangle: TriangleParams,
    /// Noise channel
    pub noise: NoiseParams,
    /// Master volume (0.0..=2.0, step 0.01)
    pub master_volume: FloatParam,
    /// Vibrato depth (0..=15). Stored and persisted but not rendered.
    pub vibrato: FloatParam,
}

impl InstrumentParams {
    /// Create a parameter set with every control at its default
    pub fn new() -> Self {
        Self {
            pulse1: PulseParams::pulse1(),
            pulse2: PulseParams::pulse2(),
            triangle: TriangleParams::new(),
            noise: NoiseParams::new(),
            master_volume: FloatParam::new("vol", "Master volume", 1.0, 0.0, 2.0, 0.01),
            vibrato: FloatParam::new("vibr", "Vibrato (unimplemented)", 0.0, 0.0, 15.0, 1.0),
        }
    }

    /// Every parameter in persistence order
    pub fn params(&self) -> Vec<ParamRef<'_>> {
        let mut params = Vec::with_capacity(33);
        params.extend(self.pulse1.refs());
        params.extend(self.pulse2.refs());
        params.extend([
            ParamRef::Bool(&self.triangle.enabled),
            ParamRef::Detune(&self.triangle.coarse_detune),
            ParamRef::Float(&self.triangle.volume),
            ParamRef::Bool(&self.noise.enabled),
            ParamRef::Float(&self.noise.volume),
            ParamRef::Bool(&self.noise.envelope_enabled),
            ParamRef::Bool(&self.noise.envelope_looped),
            ParamRef::Float(&self.noise.envelope_length),
            ParamRef::Bool(&self.noise.short_mode),
            ParamRef::Bool(&self.noise.use_note_frequency),
            ParamRef::Float(&self.noise.frequency_index),
            ParamRef::Float(&self.master_volume),
            ParamRef::Float(&self.vibrato),
        ]);
        params
    }

    /// Descriptions of every parameter in persistence order
    pub fn descriptors(&self) -> Vec<ParamDescriptor> {
        self.params().iter().map(ParamRef::descriptor).collect()
    }

    /// Look up a parameter by its persistence key
    pub fn param(&self, key: &str) -> Option<ParamRef<'_>> {
        self.params()
            .into_iter()
            .find(|p| p.descriptor().key == key)
    }

    /// Write a parameter by key. Returns `false` for unknown keys.
    pub fn set_by_key(&self, key: &str, value: f32) -> bool {
        match self.param(key) {
            Some(param) => {
                param.set(value);
                true
            }
            None => false,
        }
    }

    /// Read a parameter by key (bools read as 0/1)
    pub fn get_by_key(&self, key: &str) -> Option<f32> {
        self.param(key).map(|p| p.get())
    }

    /// Restore every parameter to its default
    pub fn reset_to_defaults(&self) {
        for param in self.params() {
            param.reset();
        }
    }

    /// Read every value the render loop needs
    pub fn snapshot(&self) -> ParamSnapshot {
        let mut channels = ChannelFlags::empty();
        channels.set(ChannelFlags::PULSE1, self.pulse1.enabled.value());
        channels.set(ChannelFlags::PULSE2, self.pulse2.enabled.value());
        channels.set(ChannelFlags::TRIANGLE, self.triangle.enabled.value());
        channels.set(ChannelFlags::NOISE, self.noise.enabled.value());

        ParamSnapshot {
            channels,
            pulse: [self.pulse1.snapshot(), self.pulse2.snapshot()],
            triangle: TriangleSnapshot {
                multiplier: self.triangle.coarse_detune.multiplier(),
                volume: self.triangle.volume.value_i32(),
            },
            noise: NoiseSnapshot {
                volume: self.noise.volume.value_i32(),
                envelope_enabled: self.noise.envelope_enabled.value(),
                envelope_looped: self.noise.envelope_looped.value(),
                envelope_length: self.noise.envelope_length.value_i32(),
                short_mode: self.noise.short_mode.value(),
                use_note_frequency: self.noise.use_note_frequency.value(),
                frequency_index: self.noise.frequency_index.value_i32(),
            },
            master_volume: self.master_volume.value(),
            vibrato: self.vibrato.value(),
        }
    }
}

impl Default for InstrumentParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-once view of a pulse channel's settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseSnapshot {
    /// Detune frequency multiplier
    pub multiplier: f32,
    /// Volume (0..=15)
    pub volume: i32,
    /// Envelope enable
    pub envelope_enabled: bool,
    /// Envelope loop
    pub envelope_looped: bool,
    /// Envelope length setting (0..=15)
    pub envelope_length: i32,
    /// Duty cycle selection (0..=3)
    pub duty_cycle: i32,
    /// Sweep enable
    pub sweep_enabled: bool,
    /// Sweep amount (-7..=7)
    pub sweep_amount: i32,
    /// Sweep rate setting (0..=7)
    pub sweep_rate: i32,
}

/// Read-once view of the triangle channel's settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleSnapshot {
    /// Detune frequency multiplier
    pub multiplier: f32,
    /// Volume (0..=15)
    pub volume: i32,
}

/// Read-once view of the noise channel's settings
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSnapshot {
    /// Volume (0..=15)
    pub volume: i32,
    /// Envelope enable
    pub envelope_enabled: bool,
    /// Envelope loop
    pub envelope_looped: bool,
    /// Envelope length setting (0..=15)
    pub envelope_length: i32,
    /// Short LFSR sequence
    pub short_mode: bool,
    /// Clock the LFSR at the note frequency
    pub use_note_frequency: bool,
    /// Preset rate index (0..=15)
    pub frequency_index: i32,
}

/// Parameter values captured at the start of a render call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSnapshot {
    /// Enabled channels
    pub channels: ChannelFlags,
    /// Pulse 1 and pulse 2
    pub pulse: [PulseSnapshot; 2],
    /// Triangle
    pub triangle: TriangleSnapshot,
    /// Noise
    pub noise: NoiseSnapshot,
    /// Master volume
    pub master_volume: f32,
    /// Vibrato depth (not rendered)
    pub vibrato: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    #[test]
    fn test_defaults() {
        let params = InstrumentParams::new();
        let snap = params.snapshot();
        assert_eq!(snap.channels, ChannelFlags::all());
        assert_eq!(snap.pulse[0].duty_cycle, 0);
        assert_eq!(snap.pulse[1].duty_cycle, 2);
        assert_eq!(snap.pulse[0].volume, 15);
        assert_eq!(snap.triangle.volume, 15);
        assert_eq!(snap.noise.volume, 15);
        assert_eq!(snap.noise.frequency_index, 0);
        assert!(!snap.noise.short_mode);
        assert_eq!(snap.master_volume, 1.0);
        assert_eq!(snap.vibrato, 0.0);
        assert_eq!(snap.pulse[0].multiplier, 1.0);
    }

    #[test]
    fn test_float_param_clamps_and_quantizes() {
        let params = InstrumentParams::new();
        params.pulse1.volume.set(22.0);
        assert_eq!(params.pulse1.volume.value(), 15.0);
        params.pulse1.volume.set(-3.0);
        assert_eq!(params.pulse1.volume.value(), 0.0);
        params.pulse1.volume.set(7.4);
        assert_eq!(params.pulse1.volume.value(), 7.0);
        params.pulse1.sweep_amount.set(-6.6);
        assert_eq!(params.pulse1.sweep_amount.value(), -7.0);

        params.master_volume.set(1.234);
        assert_abs_diff_eq!(params.master_volume.value(), 1.23, epsilon = 1e-5);
        params.master_volume.set(5.0);
        assert_eq!(params.master_volume.value(), 2.0);
    }

    #[test]
    fn test_non_finite_writes_ignored() {
        let params = InstrumentParams::new();
        params.pulse2.volume.set(9.0);
        params.pulse2.volume.set(f32::NAN);
        assert_eq!(params.pulse2.volume.value(), 9.0);
        params.master_volume.set(f32::INFINITY);
        assert_eq!(params.master_volume.value(), 1.0);
    }

    #[test]
    fn test_duty_cycle_clamps() {
        let params = InstrumentParams::new();
        params.pulse1.duty_cycle.set(9);
        assert_eq!(params.pulse1.duty_cycle.value(), 3);
        params.pulse1.duty_cycle.set(-1);
        assert_eq!(params.pulse1.duty_cycle.value(), 0);
    }

    #[test]
    fn test_detune_updates_multiplier_immediately() {
        let params = InstrumentParams::new();
        params.pulse1.coarse_detune.set(12.0);
        assert_abs_diff_eq!(params.pulse1.coarse_detune.multiplier(), 2.0, epsilon = 1e-6);
        params.triangle.coarse_detune.set(-24.0);
        assert_abs_diff_eq!(params.triangle.coarse_detune.multiplier(), 0.25, epsilon = 1e-6);
        params.pulse2.coarse_detune.set(7.0);
        assert_abs_diff_eq!(
            params.pulse2.coarse_detune.multiplier(),
            2f32.powf(7.0 / 12.0),
            epsilon = 1e-6
        );
        params.pulse2.coarse_detune.set(40.0);
        assert_abs_diff_eq!(params.pulse2.coarse_detune.multiplier(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_keys_unique_and_complete() {
        let params = InstrumentParams::new();
        let descriptors = params.descriptors();
        assert_eq!(descriptors.len(), 33);
        let mut keys: Vec<_> = descriptors.iter().map(|d| d.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 33);
        for key in ["on1", "swrate2", "crs3", "nfrqmode4", "vol", "vibr"] {
            assert!(params.param(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_descriptor_names() {
        let params = InstrumentParams::new();
        let vibrato = params.param("vibr").map(|p| p.descriptor());
        assert_eq!(vibrato.map(|d| d.name), Some("Vibrato (unimplemented)"));
        let vol1 = params.param("vol1").map(|p| p.descriptor());
        assert_eq!(vol1.map(|d| d.name), Some("Channel 1 Volume"));
        assert_eq!(vol1.map(|d| d.kind), Some(ParamKind::Float));
    }

    #[test]
    fn test_set_and_get_by_key() {
        let params = InstrumentParams::new();
        assert!(params.set_by_key("crs2", 12.0));
        assert_abs_diff_eq!(params.pulse2.coarse_detune.multiplier(), 2.0, epsilon = 1e-6);
        assert!(params.set_by_key("on3", 0.0));
        assert!(!params.triangle.enabled.value());
        assert!(params.set_by_key("dc1", 2.6));
        assert_eq!(params.pulse1.duty_cycle.value(), 3);
        assert_eq!(params.get_by_key("on3"), Some(0.0));
        assert_eq!(params.get_by_key("dc1"), Some(3.0));
        assert!(!params.set_by_key("bogus", 1.0));
        assert_eq!(params.get_by_key("bogus"), None);
    }

    #[test]
    fn test_reset_to_defaults() {
        let params = InstrumentParams::new();
        params.pulse1.coarse_detune.set(5.0);
        params.noise.short_mode.set(true);
        params.master_volume.set(0.3);
        params.reset_to_defaults();
        assert_eq!(params.snapshot(), InstrumentParams::new().snapshot());
    }

    #[test]
    fn test_params_shared_across_threads() {
        let params = Arc::new(InstrumentParams::new());
        let writer = Arc::clone(&params);
        std::thread::spawn(move || {
            writer.noise.volume.set(4.0);
        })
        .join()
        .expect("writer thread panicked");
        assert_eq!(params.snapshot().noise.volume, 4);
    }
}
