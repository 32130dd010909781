//! WAV file export functionality

use super::{apply_fade_out, normalize_frames, ExportConfig};
use crate::instrument::Instrument;
use crate::note::FixedPitch;
use crate::{Result, Rp2a03Error};
use std::path::Path;
use tracing::{debug, info};

/// Render a held note and write it to a 16-bit stereo WAV file
///
/// The note is rendered block by block at the instrument's sample rate and
/// block size, exactly as a host would. Returns the number of frames written.
///
/// # Examples
///
/// ```no_run
/// use rp2a03::{render_note_to_wav, Instrument};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let instrument = Instrument::default();
/// render_note_to_wav(&instrument, 261.63, 1.5, "c4.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn render_note_to_wav<P: AsRef<Path>>(
    instrument: &Instrument,
    frequency: f32,
    seconds: f32,
    output_path: P,
) -> Result<usize> {
    render_note_to_wav_with_config(
        instrument,
        frequency,
        seconds,
        output_path,
        ExportConfig::default(),
    )
}

/// Render a held note to WAV with custom channel count, normalization and fade
pub fn render_note_to_wav_with_config<P: AsRef<Path>>(
    instrument: &Instrument,
    frequency: f32,
    seconds: f32,
    output_path: P,
    config: ExportConfig,
) -> Result<usize> {
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(Rp2a03Error::ConfigError(format!(
            "note duration must be a non-negative number of seconds, got {seconds}"
        )));
    }
    if !(1..=2).contains(&config.channels) {
        return Err(Rp2a03Error::ConfigError(format!(
            "unsupported channel count {}",
            config.channels
        )));
    }

    let render = instrument.config();
    render.validate()?;

    let total_frames = (seconds * render.sample_rate as f32).round() as usize;
    info!(
        frequency,
        seconds,
        frames = total_frames,
        "rendering note"
    );
    let mut frames = render_note(instrument, frequency, total_frames);

    if config.normalize {
        debug!("normalizing audio");
        normalize_frames(&mut frames);
    }

    if config.fade_out_duration > 0.0 {
        debug!(seconds = config.fade_out_duration, "applying fade out");
        apply_fade_out(&mut frames, config.fade_out_duration, render.sample_rate);
    }

    let samples = if config.channels == 2 {
        interleave(&frames)
    } else {
        frames.iter().map(|f| f[0]).collect()
    };

    write_wav_file(
        output_path.as_ref(),
        &samples,
        render.sample_rate,
        config.channels,
    )?;
    info!(path = %output_path.as_ref().display(), "export complete");

    Ok(total_frames)
}

/// Render `total_frames` stereo frames of a fixed-pitch note
pub fn render_note(instrument: &Instrument, frequency: f32, total_frames: usize) -> Vec<[f32; 2]> {
    let block_size = instrument.config().block_size.max(1);
    let mut voice = instrument.create_voice(FixedPitch::new(frequency));
    let mut frames = vec![[0.0f32; 2]; total_frames];
    for block in frames.chunks_mut(block_size) {
        let len = block.len();
        voice.render(block, len);
    }
    frames
}

/// Flatten stereo frames to interleaved samples
fn interleave(frames: &[[f32; 2]]) -> Vec<f32> {
    let mut samples = Vec::with_capacity(frames.len() * 2);
    for frame in frames {
        samples.push(frame[0]);
        samples.push(frame[1]);
    }
    samples
}

/// Write samples to WAV file
fn write_wav_file(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| {
        Rp2a03Error::AudioFileError(format!("Failed to create WAV file: {}", e))
    })?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| Rp2a03Error::AudioFileError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Rp2a03Error::AudioFileError(format!("Failed to finalize WAV file: {}", e)))?;

    Ok(())
}
