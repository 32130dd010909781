//! 2A03 Output Mixer
//!
//! Combines the four channel levels into one sample. The channels are mixed
//! in two pairs (pulse 1 + pulse 2, triangle + noise), each of which goes
//! through the same analog coloration chain:
//!
//! - multiplicative dither
//! - rescale from 0..=30 to -1..=1
//! - signed power-law distortion
//! - one-pole low-pass
//! - hardwired pair weight
//!
//! The weighted pairs are normalized, scaled by the master volume and passed
//! through a DC blocker.

use crate::constants::{
    DISTORTION_EXPONENT, DITHER_AMP, LOWPASS_COEFF, MAX_LEVEL, MIX_ALL, MIX_PULSE,
    MIX_TRIANGLE_NOISE, REFERENCE_SAMPLE_RATE,
};
use crate::dc_filter::DcBlocker;
use crate::dither::NoiseSource;
use bitflags::bitflags;

bitflags! {
    /// Channel enable flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelFlags: u8 {
        /// Pulse channel 1
        const PULSE1 = 0x01;
        /// Pulse channel 2
        const PULSE2 = 0x02;
        /// Triangle channel
        const TRIANGLE = 0x04;
        /// Noise channel
        const NOISE = 0x08;
    }
}

impl ChannelFlags {
    /// Check if pulse channel 1 is enabled
    pub fn is_pulse1_enabled(&self) -> bool {
        self.contains(ChannelFlags::PULSE1)
    }

    /// Check if pulse channel 2 is enabled
    pub fn is_pulse2_enabled(&self) -> bool {
        self.contains(ChannelFlags::PULSE2)
    }

    /// Check if the triangle channel is enabled
    pub fn is_triangle_enabled(&self) -> bool {
        self.contains(ChannelFlags::TRIANGLE)
    }

    /// Check if the noise channel is enabled
    pub fn is_noise_enabled(&self) -> bool {
        self.contains(ChannelFlags::NOISE)
    }
}

/// Sign-preserving power: `sign(x) * |x|^exponent`
#[inline]
pub fn signed_pow(x: f32, exponent: f32) -> f32 {
    x.abs().powf(exponent).copysign(x)
}

/// Low-pass coefficient for a sample rate, calibrated at 44.1 kHz
#[inline]
pub fn lowpass_coefficient(sample_rate: u32) -> f32 {
    LOWPASS_COEFF * sample_rate as f32 / REFERENCE_SAMPLE_RATE
}

/// Coloration chain for one channel pair
#[derive(Clone, Debug)]
pub struct PairStage {
    weight: f32,
    lowpass: f32,
    last: f32,
}

impl PairStage {
    /// Create a pair stage with the given output weight and low-pass coefficient
    pub fn new(weight: f32, lowpass: f32) -> Self {
        Self {
            weight,
            lowpass,
            last: 0.0,
        }
    }

    /// Process two channel levels (0-15 each) with one dither draw
    #[inline]
    pub fn process(&mut self, a: i32, b: i32, dither: f32) -> f32 {
        let mut x = (a + b) as f32;
        x *= 1.0 + dither * DITHER_AMP;
        x = x / MAX_LEVEL as f32 - 1.0;
        x = signed_pow(x, DISTORTION_EXPONENT);
        x += (self.last - x) * self.lowpass;
        self.last = x;
        x * self.weight
    }

    /// Low-passed value before weighting
    #[inline]
    pub fn last(&self) -> f32 {
        self.last
    }
}

/// Four-channel mixer with master volume and DC blocking
#[derive(Clone, Debug)]
pub struct Mixer {
    pulse: PairStage,
    triangle_noise: PairStage,
    dc: DcBlocker,
}

impl Mixer {
    /// Create a mixer for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let lowpass = lowpass_coefficient(sample_rate);
        Mixer {
            pulse: PairStage::new(MIX_PULSE, lowpass),
            triangle_noise: PairStage::new(MIX_TRIANGLE_NOISE, lowpass),
            dc: DcBlocker::new(),
        }
    }

    /// Mix one sample of channel levels
    ///
    /// Levels are the 0-15 outputs of pulse 1, pulse 2, triangle and noise.
    /// Non-finite results are replaced by silence.
    #[inline]
    pub fn mix<S: NoiseSource + ?Sized>(
        &mut self,
        levels: [i32; 4],
        master_volume: f32,
        dither: &mut S,
    ) -> f32 {
        let pulse = self
            .pulse
            .process(levels[0], levels[1], dither.next_sample());
        let triangle_noise =
            self.triangle_noise
                .process(levels[2], levels[3], dither.next_sample());

        let mix = (pulse + triangle_noise) * MIX_ALL * master_volume;
        if mix.is_finite() {
            self.dc.process(mix)
        } else {
            self.dc.process(0.0)
        }
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.pulse.last = 0.0;
        self.triangle_noise.last = 0.0;
        self.dc.reset();
    }
}
