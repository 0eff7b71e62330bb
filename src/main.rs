use tonemix::decoder::{decode_named, WavDecoder};
use tonemix::session::{FileSink, PlaybackSink};
use tonemix::types::*;
use tonemix::worker::{join_worker, RenderWorker};
use tonemix::{Profile, RenderError};

use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "tonemix")]
#[command(about = "Blend a recording with task-preset tone overlays into a stereo WAV")]
struct Cli {
    /// Source recording (.wav; .mp3 needs an external decoder)
    input: Option<PathBuf>,

    /// Output WAV path
    #[arg(short, long, default_value = "tonemix_out.wav")]
    output: PathBuf,

    /// Task preset: 1 (+10.5 Hz), 2 (+22 Hz), 3 (+5.5 Hz then +1.75 Hz)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=3))]
    task: u8,

    /// Left tone amplitude, percent (default: the task's default)
    #[arg(long)]
    left: Option<f64>,

    /// Right tone amplitude, percent (default: the task's default)
    #[arg(long)]
    right: Option<f64>,

    /// Base tone frequency (Hz)
    #[arg(long, default_value_t = DEFAULT_BASE_FREQ_HZ)]
    base_freq: f64,

    /// Program length (seconds)
    #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
    duration: u32,

    /// Mute the recording so only the tones are heard
    #[arg(long)]
    solo: bool,

    /// Built-in profile: "ducked" (-14 dBFS, -6 dB duck) or "direct" (-10 dBFS, no duck)
    #[arg(long, default_value = "ducked")]
    profile: String,

    /// Load the profile from a JSON file instead of a built-in
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Print the active profile as JSON and exit
    #[arg(long)]
    print_profile: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if e.is_recoverable() {
                error!("Try a WAV file your system can decode.");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RenderError> {
    let profile = match &cli.profile_file {
        Some(path) => Profile::load(path)?,
        None => Profile::builtin(&cli.profile).ok_or_else(|| {
            RenderError::Config(format!(
                "unknown profile '{}' (expected 'ducked' or 'direct')",
                cli.profile
            ))
        })?,
    };

    if cli.print_profile {
        println!("{}", profile.to_json()?);
        return Ok(());
    }

    let input = cli.input.as_ref().ok_or_else(|| {
        RenderError::InvalidInputFormat("no input file given".into())
    })?;

    let task = Task::try_from(cli.task)?;
    let mut params = profile.params_for(task);
    params.base_frequency_hz = cli.base_freq;
    params.target_duration_seconds = cli.duration;
    params.solo_tone = cli.solo;
    if let Some(l) = cli.left {
        params.left_percent = l;
    }
    if let Some(r) = cli.right {
        params.right_percent = r;
    }
    for (side, p) in [("left", params.left_percent), ("right", params.right_percent)] {
        if !task.is_recommended_percent(p) {
            warn!(
                "{} amplitude {}% is outside the {} choices {:?}",
                side,
                p,
                task,
                task.amplitude_choices()
            );
        }
    }

    info!("═══════════════════════════════════════════════");
    info!("  TONEMIX v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Profile: {} ({:.1} dBFS, duck {:?})",
        profile.name, profile.target_level_dbfs, profile.duck
    );
    info!("  Input:  {:?}", input);
    info!("  Output: {:?}", cli.output);
    info!("  {}", params);
    info!("═══════════════════════════════════════════════");

    let name = input.to_string_lossy().into_owned();
    let bytes = std::fs::read(input)?;
    let audio = Arc::new(decode_named(&name, &bytes, &WavDecoder)?);
    drop(bytes);

    let (handle, worker) = RenderWorker::spawn()?;
    let result = handle.render_blocking(audio, params, profile);
    drop(handle);
    let joined = join_worker(worker);

    let wav = result?;
    joined?;
    let mut sink = FileSink::new(cli.output.clone());
    sink.play(&wav)?;
    Ok(())
}
