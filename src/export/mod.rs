//! Offline rendering of held notes to audio files
//!
//! # Examples
//!
//! ```no_run
//! use rp2a03::export::render_note_to_wav;
//! use rp2a03::Instrument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let instrument = Instrument::new(44_100, 256);
//! instrument.params().pulse1.duty_cycle.set(2);
//!
//! render_note_to_wav(&instrument, 440.0, 2.0, "a4.wav")?;
//! # Ok(())
//! # }
//! ```

mod wav;
pub use wav::*;

/// Export configuration options
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Whether to scale the render down if it would clip
    pub normalize: bool,
    /// Fade out duration in seconds (0 = no fade)
    pub fade_out_duration: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            channels: 2,
            normalize: false,
            fade_out_duration: 0.0,
        }
    }
}

impl ExportConfig {
    /// Create config for mono export
    pub fn mono() -> Self {
        Self {
            channels: 1,
            ..Default::default()
        }
    }

    /// Enable normalization to prevent clipping
    pub fn normalize(mut self, enable: bool) -> Self {
        self.normalize = enable;
        self
    }

    /// Add fade out at the end
    pub fn fade_out(mut self, duration_seconds: f32) -> Self {
        self.fade_out_duration = duration_seconds;
        self
    }
}

/// Scale frames down so the peak sits at 0.95
fn normalize_frames(frames: &mut [[f32; 2]]) {
    let peak = frames
        .iter()
        .flat_map(|f| f.iter())
        .fold(0.0f32, |peak, s| peak.max(s.abs()));

    if peak > 0.95 {
        let scale = 0.95 / peak;
        for sample in frames.iter_mut().flat_map(|f| f.iter_mut()) {
            *sample *= scale;
        }
    }
}

/// Linear fade to silence over the last `fade_duration` seconds
fn apply_fade_out(frames: &mut [[f32; 2]], fade_duration: f32, sample_rate: u32) {
    if fade_duration <= 0.0 || frames.is_empty() {
        return;
    }

    let fade_frames = ((fade_duration * sample_rate as f32) as usize).max(1);
    let start_fade = frames.len().saturating_sub(fade_frames);

    for (i, frame) in frames.iter_mut().enumerate().skip(start_fade) {
        let progress = (i - start_fade) as f32 / fade_frames as f32;
        let fade_factor = 1.0 - progress;
        frame[0] *= fade_factor;
        frame[1] *= fade_factor;
    }
}
