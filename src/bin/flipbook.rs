use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use flipbook::{
    DirectorySink, ExportFormat, ExportPipeline, FlipbookConfig, FlipbookError, FrameId,
    FrameStore, ManualClock, NormalizePreset, PlaybackController, PlaybackState, RenderSignal,
    SystemClock, export::progress::LogObserver, foundation::core::Fps,
    store::ingest::import_files,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flipbook", version, about = "Stop-motion frame store, player and exporter")]
struct Cli {
    /// Configuration JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the frame record (overrides the config).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add image files as new frames, in order.
    Add(AddArgs),
    /// List frames in sequence order.
    List,
    /// Delete a frame by id.
    Delete {
        /// Frame id as printed by `list`.
        id: String,
    },
    /// Move the frame at position FROM to position TO (1-based).
    Move {
        /// Current position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Remove every frame.
    Clear {
        /// Delete the stored record itself instead of writing an empty one.
        #[arg(long)]
        purge: bool,
    },
    /// Play the sequence and print one line per rendered frame.
    Play(PlayArgs),
    /// Export the sequence into a directory.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct AddArgs {
    /// Image files.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Normalization preset.
    #[arg(long, value_enum, default_value_t = PresetChoice::Upload)]
    preset: PresetChoice,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Frames per second (1-24); defaults to the config value.
    #[arg(long)]
    fps: Option<u32>,

    /// Stop on the last frame instead of wrapping.
    #[arg(long)]
    no_loop: bool,

    /// Number of timer ticks to run.
    #[arg(long, default_value_t = 24)]
    ticks: usize,

    /// Wait for real time between ticks instead of simulating the clock.
    #[arg(long)]
    realtime: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Requested format; falls back along its chain when unavailable.
    #[arg(long, value_enum, default_value_t = FormatChoice::Gif)]
    format: FormatChoice,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Frames per second; defaults to the config value.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetChoice {
    Capture,
    Upload,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Gif,
    Webm,
    Mp4,
    Png,
}

impl From<FormatChoice> for ExportFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Gif => ExportFormat::Gif,
            FormatChoice::Webm => ExportFormat::WebM,
            FormatChoice::Mp4 => ExportFormat::Mp4,
            FormatChoice::Png => ExportFormat::PngSequence,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    match cli.cmd {
        Command::Add(args) => cmd_add(&cfg, args),
        Command::List => cmd_list(&cfg),
        Command::Delete { id } => cmd_delete(&cfg, &id),
        Command::Move { from, to } => cmd_move(&cfg, from, to),
        Command::Clear { purge } => cmd_clear(&cfg, purge),
        Command::Play(args) => cmd_play(&cfg, args),
        Command::Export(args) => cmd_export(&cfg, args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<FlipbookConfig> {
    let mut cfg = match &cli.config {
        Some(path) => FlipbookConfig::load(path)?,
        None => FlipbookConfig::default(),
    };
    if let Some(dir) = &cli.store {
        cfg.storage.dir = dir.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn open_store(cfg: &FlipbookConfig) -> anyhow::Result<FrameStore> {
    let backend = cfg
        .storage
        .open()
        .with_context(|| format!("open frame store in '{}'", cfg.storage.dir.display()))?;
    Ok(FrameStore::open_with_key(backend, cfg.storage.key.clone()))
}

fn cmd_add(cfg: &FlipbookConfig, args: AddArgs) -> anyhow::Result<()> {
    let mut store = open_store(cfg)?;
    let preset: NormalizePreset = match args.preset {
        PresetChoice::Capture => cfg.capture.preset,
        PresetChoice::Upload => cfg.upload,
    };

    let report = import_files(&mut store, &args.files, preset);
    for frame in &report.added {
        println!("added {} ({}, {} bytes)", frame.id(), frame.image().mime(), frame.image().len());
    }
    for failure in &report.failed {
        eprintln!("skipped {}: {}", failure.source, failure.error);
    }
    for source in &report.skipped {
        eprintln!("not attempted {source}");
    }

    if report.storage_failed() {
        anyhow::bail!(
            "frames could not be persisted; {} frame(s) were added",
            report.added.len()
        );
    }
    if report.added.is_empty() {
        anyhow::bail!("no frame was added");
    }
    Ok(())
}

fn cmd_list(cfg: &FlipbookConfig) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    if store.is_empty() {
        println!("no frames");
        return Ok(());
    }
    for (i, frame) in store.frames().iter().enumerate() {
        let dims = frame
            .image()
            .dimensions()
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_else(|_| "?".to_string());
        println!(
            "{:>4}  {}  {}  {}  {} bytes",
            i + 1,
            frame.id(),
            frame.created_at(),
            dims,
            frame.image().len()
        );
    }
    Ok(())
}

fn cmd_delete(cfg: &FlipbookConfig, id: &str) -> anyhow::Result<()> {
    let mut store = open_store(cfg)?;
    if store.delete(&FrameId::from(id))? {
        println!("deleted {id}");
    } else {
        println!("no frame with id {id}");
    }
    Ok(())
}

fn cmd_move(cfg: &FlipbookConfig, from: usize, to: usize) -> anyhow::Result<()> {
    let mut store = open_store(cfg)?;
    let (Some(from_idx), Some(to_idx)) = (from.checked_sub(1), to.checked_sub(1)) else {
        anyhow::bail!("positions are 1-based");
    };
    if store.reorder(from_idx, to_idx)? {
        println!("moved frame {from} to {to}");
    } else {
        println!("nothing moved ({} frames)", store.len());
    }
    Ok(())
}

fn cmd_clear(cfg: &FlipbookConfig, purge: bool) -> anyhow::Result<()> {
    let mut store = open_store(cfg)?;
    let before = store.len();
    if purge {
        store.purge()?;
        println!("purged {before} frame(s)");
    } else {
        store.clear_all()?;
        println!("cleared {before} frame(s)");
    }
    Ok(())
}

fn print_signal(signal: &RenderSignal) {
    match &signal.frame {
        Some(frame) => println!(
            "[{:?}] frame {}/{} {}",
            signal.state,
            signal.index + 1,
            signal.len,
            frame.id()
        ),
        None => println!("[{:?}] no frames", signal.state),
    }
}

fn cmd_play(cfg: &FlipbookConfig, args: PlayArgs) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let fps = args.fps.unwrap_or(cfg.playback.fps);
    let looping = cfg.playback.looping && !args.no_loop;

    if args.realtime {
        let mut player =
            PlaybackController::enter(store.list(), SystemClock::new()).with_settings(fps, looping);
        player.on_render(print_signal);
        run_realtime(&mut player, args.ticks);
        player.leave();
    } else {
        let clock = ManualClock::new();
        let mut player =
            PlaybackController::enter(store.list(), clock.clone()).with_settings(fps, looping);
        player.on_render(print_signal);
        player.refresh();
        player.play();
        let step = player.fps().frame_interval();
        let mut fired = 0;
        while fired < args.ticks && player.state() == PlaybackState::Playing {
            clock.advance(step);
            fired += player.pump();
        }
        player.pause();
        player.leave();
    }
    Ok(())
}

fn run_realtime(player: &mut PlaybackController, ticks: usize) {
    player.refresh();
    player.play();
    let mut fired = 0;
    while fired < ticks && player.state() == PlaybackState::Playing {
        let wait = player.next_deadline().unwrap_or(Duration::ZERO);
        std::thread::sleep(wait);
        fired += player.pump();
    }
    player.pause();
}

fn cmd_export(cfg: &FlipbookConfig, args: ExportArgs) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let fps = Fps::new(args.fps.unwrap_or(cfg.playback.fps))?;
    let format = ExportFormat::from(args.format);

    let mut pipeline = ExportPipeline::new(cfg.export.clone());
    let artifact = match pipeline.export(store.frames(), fps, format, &mut LogObserver) {
        Ok(artifact) => artifact,
        Err(FlipbookError::EmptySequence) => {
            println!("nothing to export");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if artifact.format != format {
        eprintln!("{format} export unavailable, fell back to {}", artifact.format);
    }

    let mut sink = DirectorySink::new(&args.out);
    pipeline.deliver(&artifact, &mut sink)?;
    for path in sink.written() {
        println!("wrote {}", path.display());
    }
    Ok(())
}
