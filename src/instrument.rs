//! Instrument and voice lifecycle
//!
//! The [`Instrument`] owns the shared parameter set and the render
//! configuration. Hosts keep one voice slot per playing note and call
//! [`Instrument::play_note`] for every block; the voice is created on the
//! note's first block and dropped by [`Instrument::release_note`].

use crate::note::NotePitch;
use crate::params::InstrumentParams;
use crate::voice::Voice;
use crate::{Result, Rp2a03Error};
use std::sync::Arc;
use tracing::trace;

/// Default output sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default host block size in frames
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Sample rate and block size a host renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Frames per host period
    pub block_size: usize,
}

impl RenderConfig {
    /// Lowest accepted sample rate
    pub const MIN_SAMPLE_RATE: u32 = 8_000;
    /// Highest accepted sample rate
    pub const MAX_SAMPLE_RATE: u32 = 192_000;

    /// Create a validated configuration
    pub fn new(sample_rate: u32, block_size: usize) -> Result<Self> {
        let config = Self {
            sample_rate,
            block_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_SAMPLE_RATE..=Self::MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(Rp2a03Error::ConfigError(format!(
                "sample rate {} Hz outside {}..={} Hz",
                self.sample_rate,
                Self::MIN_SAMPLE_RATE,
                Self::MAX_SAMPLE_RATE
            )));
        }
        if self.block_size == 0 {
            return Err(Rp2a03Error::ConfigError(
                "block size must be at least one frame".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// A 2A03 instrument: shared parameters plus render configuration
#[derive(Debug, Clone)]
pub struct Instrument {
    params: Arc<InstrumentParams>,
    config: RenderConfig,
}

impl Instrument {
    /// Create an instrument with default parameters
    ///
    /// The configuration is not validated; use [`Instrument::with_config`] for
    /// checked construction.
    pub fn new(sample_rate: u32, block_size: usize) -> Self {
        Self {
            params: Arc::new(InstrumentParams::new()),
            config: RenderConfig {
                sample_rate,
                block_size,
            },
        }
    }

    /// Create an instrument from a validated configuration
    pub fn with_config(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            params: Arc::new(InstrumentParams::new()),
            config,
        })
    }

    /// Replace the parameter set (e.g. one loaded from a settings document)
    pub fn with_params(mut self, params: InstrumentParams) -> Self {
        self.params = Arc::new(params);
        self
    }

    /// Shared parameter set
    pub fn params(&self) -> &Arc<InstrumentParams> {
        &self.params
    }

    /// Render configuration
    pub fn config(&self) -> RenderConfig {
        self.config
    }

    /// Create a voice for `note`
    pub fn create_voice<N: NotePitch>(&self, note: N) -> Voice<N> {
        Voice::new(
            Arc::clone(&self.params),
            self.config.sample_rate,
            note,
            self.config.block_size,
        )
    }

    /// Render one block of a note
    ///
    /// A new voice is created in `slot` when the note has not played any
    /// frames yet or the slot is empty; otherwise the existing voice keeps
    /// running. `frames` is the number of frames left in the current host
    /// period.
    pub fn play_note<N: NotePitch + Clone>(
        &self,
        slot: &mut Option<Voice<N>>,
        note: &N,
        buffer: &mut [[f32; 2]],
        frames: usize,
    ) {
        if note.total_frames_played() == 0 || slot.is_none() {
            trace!(frequency = note.frequency(), "starting voice");
            *slot = Some(self.create_voice(note.clone()));
        }
        if let Some(voice) = slot.as_mut() {
            voice.render(buffer, frames);
        }
    }

    /// Drop the voice held in `slot`
    pub fn release_note<N: NotePitch>(&self, slot: &mut Option<Voice<N>>) {
        if slot.take().is_some() {
            trace!("released voice");
        }
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_BLOCK_SIZE)
    }
}
