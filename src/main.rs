//! rp2a03-render: render a single 2A03 note to a WAV file
//!
//! ```text
//! rp2a03-render --note A4 --seconds 2 --set dc1=2 --set envon1=1 -o a4.wav
//! rp2a03-render --settings lead.json --frequency 523.25 -o c5.wav
//! rp2a03-render --list-params
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use rp2a03::export::{render_note_to_wav_with_config, ExportConfig};
use rp2a03::{Instrument, InstrumentParams, RenderConfig};
use std::path::PathBuf;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Render a held NES 2A03 note to WAV
#[derive(Parser, Debug)]
#[command(name = "rp2a03-render", version, about)]
struct Args {
    /// Output WAV path
    #[arg(short, long, default_value = "note.wav")]
    output: PathBuf,

    /// Note frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f32,

    /// Note name such as A4, C#5 or Eb3 (overrides --frequency)
    #[arg(short, long)]
    note: Option<String>,

    /// Note length in seconds
    #[arg(short, long, default_value_t = 1.0)]
    seconds: f32,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Frames rendered per block
    #[arg(long, default_value_t = 256)]
    block_size: usize,

    /// Instrument settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override a parameter, e.g. --set vol1=8 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Write a mono file instead of stereo
    #[arg(long)]
    mono: bool,

    /// Scale the render down if it would clip
    #[arg(long)]
    normalize: bool,

    /// Fade out over the last N seconds
    #[arg(long, default_value_t = 0.0)]
    fade: f32,

    /// Print every parameter descriptor as JSON and exit
    #[arg(long)]
    list_params: bool,

    /// Print the effective settings document as JSON and exit
    #[arg(long)]
    dump_settings: bool,
}

/// Convert a note name (e.g. `A4`, `C#5`, `Eb3`) to equal-tempered Hz
fn note_to_frequency(name: &str) -> Option<f32> {
    let name = name.trim();
    let split = name.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let (pitch, octave) = name.split_at(split);
    let octave: i32 = octave.parse().ok()?;

    let mut chars = pitch.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base = NOTE_NAMES.iter().position(|n| n.len() == 1 && n.starts_with(letter))? as i32;
    let accidental = match chars.as_str() {
        "" => 0,
        "#" | "s" => 1,
        "b" => -1,
        _ => return None,
    };

    let midi = (octave + 1) * 12 + base + accidental;
    Some(440.0 * ((midi - 69) as f32 / 12.0).exp2())
}

fn apply_override(params: &InstrumentParams, arg: &str) -> Result<()> {
    let (key, value) = arg
        .split_once('=')
        .with_context(|| format!("override '{arg}' is not KEY=VALUE"))?;
    let key = key.trim();
    let value: f32 = match value.trim() {
        "true" | "on" => 1.0,
        "false" | "off" => 0.0,
        v => v
            .parse()
            .with_context(|| format!("override '{arg}' has a non-numeric value"))?,
    };
    if !params.set_by_key(key, value) {
        bail!("unknown parameter key '{key}' (see --list-params)");
    }
    tracing::debug!(key, value, "applied override");
    Ok(())
}

fn load_params(args: &Args) -> Result<InstrumentParams> {
    let params = match &args.settings {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read settings {}", path.display()))?;
            let params = InstrumentParams::from_json_str(&text)
                .with_context(|| format!("invalid settings file {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded settings");
            params
        }
        None => InstrumentParams::new(),
    };

    for arg in &args.overrides {
        apply_override(&params, arg)?;
    }
    Ok(params)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let params = load_params(&args)?;

    if args.list_params {
        println!("{}", serde_json::to_string_pretty(&params.descriptors())?);
        return Ok(());
    }
    if args.dump_settings {
        println!("{}", params.to_json_string()?);
        return Ok(());
    }

    let frequency = match &args.note {
        Some(name) => note_to_frequency(name)
            .with_context(|| format!("cannot parse note name '{name}'"))?,
        None => args.frequency,
    };

    let config = RenderConfig::new(args.sample_rate, args.block_size)?;
    let instrument = Instrument::with_config(config)?.with_params(params);

    let mut export = if args.mono {
        ExportConfig::mono()
    } else {
        ExportConfig::default()
    };
    export = export.normalize(args.normalize).fade_out(args.fade);

    let frames = render_note_to_wav_with_config(
        &instrument,
        frequency,
        args.seconds,
        &args.output,
        export,
    )
    .with_context(|| format!("failed to render {}", args.output.display()))?;

    println!(
        "Wrote {} frames ({:.2} Hz, {:.2}s) to {}",
        frames,
        frequency,
        args.seconds,
        args.output.display()
    );
    Ok(())
}
