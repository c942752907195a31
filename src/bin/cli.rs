use anyhow::{Context, Result, bail};
use clap::Parser;
use crossbeam::channel::{Receiver, bounded};
use log::{debug, info, warn};
use octadrive::audio::engine::Engine;
use octadrive::audio::ring_buffer::scope_buffer;
use octadrive::audio::scope::{Scope, ScopeEvent, ScopeTimer, ScopeView};
use octadrive::io::wav::{BlockWriter, read_wav};
use octadrive::params::state::{load_state, save_state};
use octadrive::params::{ParameterId, ParameterSnapshot, ParameterStore};
use octadrive::settings::Settings;
use octadrive::sim::stages::distortion::DistortionAlgorithm;
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::{fs, time::Instant};

#[derive(Parser, Debug)]
#[command(name = "octadrive")]
#[command(version)]
#[command(about = "Render a WAV file through the octadrive distortion.")]
struct Args {
    #[arg(long, short, help = "Input WAV file")]
    input: PathBuf,
    #[arg(long, short, help = "Output WAV file (defaults to a timestamped name)")]
    output: Option<PathBuf>,
    #[arg(
        long,
        env = "OUTPUT_DIR",
        default_value = ".",
        help = "Directory for timestamped output files"
    )]
    output_dir: String,
    #[arg(long, help = "Drive, 1-1000")]
    drive: Option<f32>,
    #[arg(long, help = "Asymmetry, -1-1")]
    asymmetry: Option<f32>,
    #[arg(long, help = "Sub-octave mix, 0-1")]
    suboctave: Option<f32>,
    #[arg(long, help = "Dry/wet mix, 0-1")]
    drywet: Option<f32>,
    #[arg(long, help = "Tone, 0 dark - 0.5 flat - 1 bright")]
    tone: Option<f32>,
    #[arg(long, value_enum)]
    algorithm: Option<DistortionAlgorithm>,
    #[arg(long, help = "Load parameters from a saved state file")]
    state: Option<PathBuf>,
    #[arg(long, help = "Write the final parameters to a state file")]
    save_state: Option<PathBuf>,
    #[arg(long, help = "Samples per processing block")]
    block_size: Option<usize>,
    #[arg(long, help = "Run the oscilloscope while rendering")]
    scope: bool,
}

impl Args {
    fn overrides(&self) -> impl Iterator<Item = (ParameterId, f32)> {
        [
            (ParameterId::Drive, self.drive),
            (ParameterId::Asymmetry, self.asymmetry),
            (ParameterId::SubOctave, self.suboctave),
            (ParameterId::DryWet, self.drywet),
            (ParameterId::Tone, self.tone),
            (
                ParameterId::Algorithm,
                self.algorithm.map(|a| a.index() as f32),
            ),
        ]
        .into_iter()
        .filter_map(|(id, value)| value.map(|v| (id, v)))
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    info!("octadrive v{}", env!("CARGO_PKG_VERSION"));
    debug!("Args: {:?}", args);

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("Failed to load settings, using defaults: {e:#}");
        Settings::default()
    });
    info!("{settings}");

    let initial = match &args.state {
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("failed to read state file '{}'", path.display()))?;
            load_state(&data)?
        }
        None => ParameterSnapshot::default(),
    };

    let store = Arc::new(ParameterStore::new(initial));
    for (id, value) in args.overrides() {
        store.set(id, value);
    }
    let params = store.snapshot();
    info!("Parameters: {params:?}");

    if let Some(path) = &args.save_state {
        fs::write(path, save_state(&params)?)
            .with_context(|| format!("failed to write state file '{}'", path.display()))?;
        info!("State saved to {}", path.display());
    }

    let block_size = args.block_size.unwrap_or(settings.render.block_size);
    if block_size == 0 {
        bail!("block size must be greater than zero");
    }

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}/processed_{}.wav",
            args.output_dir,
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    });

    let running = Arc::new(AtomicBool::new(true));
    let shutdown_flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, stopping render...");
        shutdown_flag.store(false, Ordering::SeqCst);
    })
    .context("error setting Ctrl+C handler")?;

    let (mut engine, handle) = Engine::new(Arc::clone(&store));

    let scope = if args.scope {
        let (producer, consumer) = scope_buffer();
        let scope = Scope::new(consumer);
        let view = scope.view();
        let (repaint_tx, repaint_rx) = bounded(4);
        handle.attach_scope(producer);
        let timer = ScopeTimer::spawn(scope, &settings.scope, repaint_tx);
        Some((timer, view, repaint_rx))
    } else {
        None
    };

    let rendered = render(&args.input, &output, block_size, &mut engine, &running, |_| {
        if let Some((_, view, repaint_rx)) = &scope {
            log_repaints(view, repaint_rx);
        }
    })?;

    if let Some((mut timer, _, _)) = scope {
        handle.detach_scope();
        engine.handle_messages();
        handle.collect_retired();
        timer.stop();
    }

    info!("Rendered {rendered} frames to {}", output.display());
    Ok(())
}

/// Stream `input` through the engine into `output`, one block at a time.
fn render(
    input: &Path,
    output: &Path,
    block_size: usize,
    engine: &mut Engine,
    running: &AtomicBool,
    mut on_block: impl FnMut(usize),
) -> Result<usize> {
    let file = read_wav(input)?;
    let channel_count = file.channels.len();
    let frames = file.frames();

    let mut writer = BlockWriter::create(output, file.sample_rate, channel_count)?;
    let mut buffers = vec![vec![0.0f32; block_size]; channel_count];

    let started = Instant::now();
    let mut position = 0;
    while position < frames {
        if !running.load(Ordering::SeqCst) {
            warn!("Render interrupted at frame {position} of {frames}");
            break;
        }

        let len = block_size.min(frames - position);
        for (buffer, source) in buffers.iter_mut().zip(&file.channels) {
            buffer[..len].copy_from_slice(&source[position..position + len]);
        }

        let mut block: Vec<&mut [f32]> = buffers.iter_mut().map(|b| &mut b[..len]).collect();
        engine.process(&mut block);
        writer.write_block(&block)?;

        position += len;
        on_block(position);
    }

    writer.finalize()?;
    debug!("Render took {:?}", started.elapsed());
    Ok(position)
}

fn log_repaints(view: &ScopeView, repaint_rx: &Receiver<ScopeEvent>) {
    for ScopeEvent::Repaint { drained, ready } in repaint_rx.try_iter() {
        if drained == 0 {
            continue;
        }
        let (min, max) = view.with_samples(|samples| {
            samples
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)))
        });
        debug!("Scope: drained {drained}, {ready} queued, range {min:.3}..{max:.3}");
    }
}
