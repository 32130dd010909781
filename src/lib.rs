//! NES 2A03 APU voice generator
//!
//! A per-note software emulation of the four sound channels found in the
//! Ricoh 2A03: two pulse channels with envelope and frequency sweep, a
//! 32-step triangle channel and an LFSR noise channel. Every sounding note
//! owns one [`Voice`]; all voices of an instrument read the same shared
//! [`InstrumentParams`].
//!
//! # Features
//! - Sample-accurate pulse, triangle and noise oscillators with integer timing
//! - Decaying/looping 4-bit envelopes and hardware-style frequency sweep
//! - Short and long LFSR noise modes
//! - Analog output coloration: dither, soft distortion, one-pole low-pass and DC blocking
//! - Lock-free parameter set that may be written from a UI thread while audio renders
//! - JSON settings documents with stable parameter keys
//!
//! # Crate feature flags
//! - `export-wav` (default): Render held notes to WAV files (`export`)
//! - `cli` (opt-in): The `rp2a03-render` command line tool
//!
//! # Quick start
//! ```no_run
//! use rp2a03::{FixedPitch, Instrument};
//!
//! let instrument = Instrument::new(44_100, 256);
//! instrument.params().pulse1.volume.set(12.0);
//! instrument.params().pulse2.enabled.set(false);
//!
//! let mut voice = instrument.create_voice(FixedPitch::new(440.0));
//! let mut block = vec![[0.0f32; 2]; 256];
//! voice.render(&mut block, 256);
//! ```

#![warn(missing_docs)]

pub mod constants;
pub mod dc_filter;
pub mod dither;
#[cfg(feature = "export-wav")]
pub mod export;
pub mod generators;
pub mod instrument;
pub mod mixer;
pub mod note;
pub mod params;
pub mod voice;

/// Error types for voice rendering and settings handling
///
/// The render path itself never fails; these errors come from the outer
/// surfaces (settings documents, file export, configuration).
#[derive(thiserror::Error, Debug)]
pub enum Rp2a03Error {
    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed instrument settings document
    #[error("Settings error: {0}")]
    SettingsError(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Rp2a03Error {
    /// Converts a String into `Rp2a03Error::Other`.
    ///
    /// Prefer the explicit variants (`SettingsError`, `ConfigError`, ...) where
    /// the failure has a clear category.
    fn from(msg: String) -> Self {
        Rp2a03Error::Other(msg)
    }
}

impl From<&str> for Rp2a03Error {
    fn from(msg: &str) -> Self {
        Rp2a03Error::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for Rp2a03Error {
    fn from(err: serde_json::Error) -> Self {
        Rp2a03Error::SettingsError(err.to_string())
    }
}

/// Result type for fallible crate operations
pub type Result<T> = std::result::Result<T, Rp2a03Error>;

// Public API exports
pub use dither::{NoiseSource, SeededNoise};
pub use instrument::{Instrument, RenderConfig};
pub use note::{FixedPitch, NotePitch, SharedNote};
pub use params::{InstrumentParams, ParamSnapshot};
pub use voice::Voice;

#[cfg(feature = "export-wav")]
pub use export::render_note_to_wav;
