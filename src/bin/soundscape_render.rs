//! soundscape-render: bounce a healing session to a WAV file offline.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use soundscape_core::dsp::renderer::render_wav;
use soundscape_core::{EngineConfig, RenderHost, SessionController};

/// Render a soundscape session to a 16-bit stereo WAV file
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Session id from the frequency catalog, e.g. 528hz-love
    session: String,

    /// Output WAV path
    #[arg(short, long, default_value = "soundscape.wav")]
    output: PathBuf,

    /// Seconds of audio to render
    #[arg(short, long, default_value_t = 30.0)]
    duration: f64,

    /// Intensity in [0, 1]
    #[arg(short, long, default_value_t = 0.5)]
    intensity: f64,

    /// Healing layers to add on top of the session tone
    #[arg(short, long, default_value_t = 0)]
    layers: usize,

    /// Output sample rate in Hz [default: 48000]
    #[arg(long)]
    sample_rate: Option<f32>,

    /// Seed for reproducible layer choices
    #[arg(long)]
    seed: Option<u64>,

    /// JSON engine config; command-line options override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// List the catalog and exit
    #[arg(long)]
    list: bool,
}

/// Load the config file, if any, then apply command-line overrides.
fn engine_config(args: &Args) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(sample_rate) = args.sample_rate {
        config.sample_rate = sample_rate;
    }
    config.seed = args.seed.or(config.seed);
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = engine_config(&args)?;

    let mut controller = SessionController::with_config(RenderHost::new(), config);

    if args.list {
        for preset in controller.catalog().presets() {
            println!(
                "{:<20} {:>8.1} Hz  {}",
                preset.session_id, preset.base_frequency, preset.display_name
            );
        }
        return Ok(());
    }

    controller.set_intensity(args.intensity);
    controller.start_session(&args.session);
    if !controller.is_playing() {
        return Err(format!("session '{}' did not start", args.session).into());
    }
    for _ in 0..args.layers {
        controller.add_healing_layer();
    }

    let wav = render_wav(&mut controller, args.duration);
    std::fs::write(&args.output, &wav)?;
    info!(
        path = %args.output.display(),
        bytes = wav.len(),
        layers = controller.current_layers().len(),
        "wrote WAV"
    );

    controller.shutdown();
    Ok(())
}
