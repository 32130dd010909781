//! DC offset removal filter
//!
//! The channel pairs are rescaled around -1 before mixing, so the raw mix
//! carries a large constant offset. This filter removes it with a one-pole
//! high-pass: `y[n] = (x[n] - x[n-1]) + pole * y[n-1]`.

use crate::constants::DC_BLOCK_POLE;

/// One-pole DC blocking filter
#[derive(Clone, Debug)]
pub struct DcBlocker {
    /// Feedback coefficient (close to 1.0)
    pole: f32,
    /// Previous input
    last_input: f32,
    /// Previous output
    last_output: f32,
}

impl DcBlocker {
    /// Create a DC blocker with the standard output pole
    pub fn new() -> Self {
        Self::with_pole(DC_BLOCK_POLE)
    }

    /// Create a DC blocker with a custom feedback pole
    pub fn with_pole(pole: f32) -> Self {
        Self {
            pole,
            last_input: 0.0,
            last_output: 0.0,
        }
    }

    /// Process a sample and return the DC-adjusted value
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        // Difference first: a large constant input must cancel exactly
        let output = (sample - self.last_input) + self.pole * self.last_output;
        self.last_input = sample;
        self.last_output = output;
        output
    }

    /// Last value returned by [`process`](Self::process)
    #[inline]
    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Reset the filter state
    pub fn reset(&mut self) {
        self.last_input = 0.0;
        self.last_output = 0.0;
    }
}

impl Default for DcBlocker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dc_blocker_removes_offset() {
        let mut filter = DcBlocker::new();

        let mut output = 0.0;
        for _ in 0..20_000 {
            output = filter.process(-1.0);
        }

        assert!(
            output.abs() < 1e-6,
            "DC blocker should remove constant offset, got {output}"
        );
    }

    #[test]
    fn test_dc_blocker_large_offset_keeps_decaying() {
        let mut filter = DcBlocker::new();
        let mut output = 0.0;
        for n in 0..1_000_000 {
            output = filter.process(-1.0);
            if n == 20_000 {
                assert!(output.abs() < 1e-6, "not settled after 20k samples: {output}");
            }
        }
        assert!(output.abs() < 1e-30, "stuck at {output}");
    }

    #[test]
    fn test_dc_blocker_step_response_decays_geometrically() {
        let mut filter = DcBlocker::new();
        assert_abs_diff_eq!(filter.process(1.0), 1.0);
        assert_abs_diff_eq!(filter.process(1.0), 0.999, epsilon = 1e-6);
        assert_abs_diff_eq!(filter.process(1.0), 0.999 * 0.999, epsilon = 1e-6);
    }

    #[test]
    fn test_dc_blocker_passes_ac() {
        let mut filter = DcBlocker::new();
        for _ in 0..20_000 {
            filter.process(0.5);
        }

        // Alternating input survives almost unattenuated
        let mut peak = 0.0f32;
        for n in 0..1000 {
            let x = if n % 2 == 0 { 0.75 } else { 0.25 };
            peak = peak.max(filter.process(x).abs());
        }
        assert!(peak > 0.2, "DC blocker should pass AC component, got {peak}");
    }

    #[test]
    fn test_dc_blocker_reset() {
        let mut filter = DcBlocker::new();
        for i in 0..100 {
            filter.process(i as f32 * 0.01);
        }

        filter.reset();

        assert_eq!(filter.last_output(), 0.0);
        assert_eq!(filter.process(0.0), 0.0);
    }
}
