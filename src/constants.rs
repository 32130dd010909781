//! 2A03 Hardware Constants
//!
//! Lookup tables, timing limits and mixing weights shared by the generators,
//! the mixer and the voice.

/// Pulse duty cycle fractions selected by the 2-bit duty setting
pub const DUTY_CYCLES: [f32; 4] = [0.125, 0.25, 0.5, 0.75];

/// 32-step triangle sequencer output (4-bit levels)
pub const TRIANGLE_TABLE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

/// Half the NTSC CPU clock; noise rates are derived from it
pub const NOISE_BASE_FREQUENCY: f32 = 895_000.0;

/// Preset noise clock rates in Hz, fastest first
///
/// Looked up as `NOISE_FREQUENCIES[15 - index]`, so noise frequency index 0
/// selects the slowest rate and index 15 the fastest.
pub const NOISE_FREQUENCIES: [f32; 16] = [
    NOISE_BASE_FREQUENCY / 5.0,
    NOISE_BASE_FREQUENCY / 9.0,
    NOISE_BASE_FREQUENCY / 17.0,
    NOISE_BASE_FREQUENCY / 33.0,
    NOISE_BASE_FREQUENCY / 65.0,
    NOISE_BASE_FREQUENCY / 97.0,
    NOISE_BASE_FREQUENCY / 129.0,
    NOISE_BASE_FREQUENCY / 161.0,
    NOISE_BASE_FREQUENCY / 193.0,
    NOISE_BASE_FREQUENCY / 255.0,
    NOISE_BASE_FREQUENCY / 381.0,
    NOISE_BASE_FREQUENCY / 509.0,
    NOISE_BASE_FREQUENCY / 763.0,
    NOISE_BASE_FREQUENCY / 1017.0,
    NOISE_BASE_FREQUENCY / 2035.0,
    NOISE_BASE_FREQUENCY / 4069.0,
];

/// Power-on value of the noise shift register (must be non-zero)
pub const LFSR_SEED: u16 = 1;

/// Bit position the LFSR feedback is shifted into (15-bit register)
pub const LFSR_TOP_BIT: u32 = 14;

/// Lowest note frequency the voice will play; defines the longest wavelength
pub const MIN_FREQUENCY: f32 = 10.0;

/// Shortest wavelength (in samples) a pulse channel will render or sweep
pub const MIN_WAVELENGTH: i32 = 4;

/// Maximum 4-bit envelope and volume level
pub const MAX_LEVEL: i32 = 15;

/// Envelope clock in Hz before the length divider: `240 / (length + 1)`
pub const ENVELOPE_CLOCK: f32 = 240.0;

/// Sweep clock in Hz before the rate divider: `120 / (rate + 1)`
pub const SWEEP_CLOCK: f32 = 120.0;

/// Sample rate the low-pass coefficient is calibrated for
pub const REFERENCE_SAMPLE_RATE: f32 = 44_100.0;

/// Weight of the previous sample in the analog low-pass stage at 44.1 kHz
pub const LOWPASS_COEFF: f32 = 1.0 / 20.0;

/// Exponent of the signed power-law DAC distortion
pub const DISTORTION_EXPONENT: f32 = 0.9;

/// Amplitude of the multiplicative dither noise
pub const DITHER_AMP: f32 = 1.0 / 60.0;

/// Hardwired mixing weight of the pulse pair
pub const MIX_PULSE: f32 = 1.0 / 20.0;

/// Hardwired mixing weight of the triangle/noise pair
pub const MIX_TRIANGLE_NOISE: f32 = 1.0 / 12.0;

/// Normalization applied to the sum of both weighted pairs
pub const MIX_ALL: f32 = 1.0 / (MIX_PULSE + MIX_TRIANGLE_NOISE);

/// Feedback pole of the output DC blocker
pub const DC_BLOCK_POLE: f32 = 0.999;

/// Convert a frequency to a whole number of samples per period
///
/// Truncates toward zero. Non-positive or non-finite frequencies saturate to
/// `i32::MAX` (or 0 for NaN), which every caller treats as out of range.
#[inline]
pub fn wavelength(sample_rate: u32, frequency: f32) -> i32 {
    (sample_rate as f32 / frequency) as i32
}

/// Get the duty fraction for a duty cycle setting (masked to 0-3)
#[inline]
pub fn duty_fraction(setting: i32) -> f32 {
    DUTY_CYCLES[(setting & 0x03) as usize]
}

/// Get the preset noise rate for a noise frequency index (clamped to 0-15)
#[inline]
pub fn noise_frequency(index: i32) -> f32 {
    NOISE_FREQUENCIES[15 - index.clamp(0, 15) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_table_is_symmetric() {
        for i in 0..16 {
            assert_eq!(TRIANGLE_TABLE[i], TRIANGLE_TABLE[31 - i]);
        }
        assert_eq!(TRIANGLE_TABLE[0], 15);
        assert_eq!(TRIANGLE_TABLE[15], 0);
    }

    #[test]
    fn test_noise_table_monotonic_decreasing() {
        for i in 1..NOISE_FREQUENCIES.len() {
            assert!(
                NOISE_FREQUENCIES[i] < NOISE_FREQUENCIES[i - 1],
                "Noise table not monotonic at {i}"
            );
        }
    }

    #[test]
    fn test_noise_index_zero_is_slowest() {
        assert_eq!(noise_frequency(0), NOISE_FREQUENCIES[15]);
        assert_eq!(noise_frequency(15), NOISE_FREQUENCIES[0]);
        assert!(noise_frequency(0) < noise_frequency(1));
        // Out of range indices clamp instead of panicking
        assert_eq!(noise_frequency(-3), noise_frequency(0));
        assert_eq!(noise_frequency(99), noise_frequency(15));
    }

    #[test]
    fn test_wavelength_truncates() {
        assert_eq!(wavelength(44_100, 440.0), 100);
        assert_eq!(wavelength(44_100, 240.0), 183);
        assert_eq!(wavelength(44_100, MIN_FREQUENCY), 4410);
    }

    #[test]
    fn test_wavelength_degenerate_frequencies() {
        assert_eq!(wavelength(44_100, 0.0), i32::MAX);
        assert_eq!(wavelength(44_100, f32::NAN), 0);
        assert!(wavelength(44_100, -5.0) < MIN_WAVELENGTH);
    }

    #[test]
    fn test_duty_fraction_masks_setting() {
        assert_eq!(duty_fraction(0), 0.125);
        assert_eq!(duty_fraction(2), 0.5);
        assert_eq!(duty_fraction(3), 0.75);
        assert_eq!(duty_fraction(6), 0.5);
    }

    #[test]
    fn test_mix_all_normalizes_pair_weights() {
        assert!(((MIX_PULSE + MIX_TRIANGLE_NOISE) * MIX_ALL - 1.0).abs() < 1e-6);
    }
}
