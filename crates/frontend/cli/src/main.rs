use anyhow::{bail, Context, Result};
use clap::Parser;
use host_core::logging::{LogConfig, LogLevel};
use host_n64::{HeadlessHost, HostConfig, SaveFlags};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "n64host", about = "Run an N64 image through the headless host adapter")]
struct Args {
    /// Cartridge (.z64/.n64/.v64) or 64DD disk image
    image: PathBuf,

    /// Number of host ticks to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Frame-skip budget (overrides the config file)
    #[arg(long)]
    skip: Option<u32>,

    /// Overlay game.eep after formatting save memory
    #[arg(long, default_value_t = false)]
    eep: bool,

    /// Overlay game.sra after formatting save memory
    #[arg(long, default_value_t = false)]
    sra: bool,

    /// Overlay game.fla after formatting save memory
    #[arg(long, default_value_t = false)]
    fla: bool,

    /// JSON host configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding 64DD_IPL.bin
    #[arg(long)]
    system_dir: Option<PathBuf>,

    /// Directory holding the save overlays
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write host logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Have the headless core stop after this many frames
    #[arg(long)]
    halt_after: Option<u64>,

    /// Print the debug state after every frame
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Write the final debug state to this file as JSON
    #[arg(long)]
    state: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let log_config = LogConfig::global();
    let Some(level) = LogLevel::from_str(&args.log_level) else {
        bail!("Unknown log level: {}", args.log_level);
    };
    log_config.set_global_level(level);
    if let Some(path) = &args.log_file {
        log_config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }

    let mut config = match &args.config {
        Some(path) => HostConfig::load(path),
        None => HostConfig::default(),
    };
    if let Some(skip) = args.skip {
        config.skip_count = skip;
    }
    if let Some(dir) = &args.system_dir {
        config.system_dir = dir.clone();
    }
    if let Some(dir) = &args.save_dir {
        config.save_dir = dir.clone();
    }

    let image = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;

    let mut host = HeadlessHost::headless(config);
    host.core_mut().set_halt_after(args.halt_after);
    let header = host
        .try_load_game(&image, SaveFlags::new(args.eep, args.sra, args.fla))
        .with_context(|| format!("loading {}", args.image.display()))?;
    log::info!(
        "Loaded \"{}\" ({:?}, {:.2} fps)",
        header.name,
        header.region(),
        host.av_info().fps
    );

    for frame in 1..=args.frames {
        host.step_frame();
        if args.debug {
            println!(
                "DEBUG STATE (frame {}):\n{}",
                frame,
                serde_json::to_string_pretty(&host.debug_state())?
            );
        }
        if !host.is_running() {
            log::info!("Core stopped after {} ticks", frame);
            break;
        }
    }

    let stats = host.stats();
    println!(
        "{} frames stepped: {} presented, {} skipped",
        stats.stepped, stats.presented, stats.skipped
    );

    if let Some(path) = &args.state {
        let mut f = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        write!(f, "{}", serde_json::to_string_pretty(&host.debug_state())?)?;
    }

    host.unload();
    log_config.clear_log_file();
    Ok(())
}
