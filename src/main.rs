use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use glitcher::{
    config::parse_hex_color, source, EffectConfig, GlitchGroup, Glitcher, PngSequence, RawStdout,
    Registry, Scheduler,
};
use rand::{random, rngs::StdRng, SeedableRng};
use tracing::{info, Level};

#[derive(Parser)]
struct Args {
    /// The file to load the base image / video from, repeat for more glitchers
    #[arg(short = 'f', long = "file", required = true)]
    files: Vec<PathBuf>,

    /// JSON effect configuration shared by all glitchers
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Shifts scanline bands by up to <PX> pixels
    #[arg(long, value_name = "PX")]
    glitch: Option<f64>,

    /// Height of a glitch band
    #[arg(long, value_name = "LINES")]
    glitch_height: Option<f64>,

    /// Makes pixels of <RRGGBB> transparent
    #[arg(long, value_name = "RRGGBB")]
    transparent: Option<String>,

    /// The targeted refresh rate
    #[arg(long, value_name = "FPS", default_value_t = 30)]
    target_fps: u32,

    /// Stops after <N> frames instead of running until interrupted
    #[arg(long, value_name = "N")]
    frames: Option<u64>,

    /// Seed for reproducible glitches
    #[arg(long)]
    seed: Option<u64>,

    /// Writes PNG frames into <DIR> instead of raw RGBA to stdout
    #[arg(short = 'o', long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Logs every tick
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn effect_config(&self) -> Result<EffectConfig> {
        let mut config = match &self.config {
            Some(path) => EffectConfig::load(path)?,
            None => EffectConfig::default(),
        };

        if let Some(value) = self.glitch {
            let glitches = config
                .glitches
                .get_or_insert_with(|| GlitchGroup::new(value, 1.0));
            glitches.value = value;
        }

        if let Some(height) = self.glitch_height {
            match config.glitches.as_mut() {
                Some(glitches) => glitches.height = height,
                None => bail!("--glitch-height needs --glitch or a glitches config"),
            }
        }

        if let Some(color) = &self.transparent {
            config.transparent = Some(parse_hex_color(color)?);
        }

        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    if args.out_dir.is_none() && args.files.len() > 1 {
        bail!("raw stdout output takes a single file, use --out-dir for more");
    }

    let config = args.effect_config()?;

    let mut registry = Registry::new();
    for file in args.files.iter() {
        info!(file = %file.display(), "loading source");
        let source =
            source::open(file).with_context(|| format!("loading {}", file.display()))?;
        let glitcher = Glitcher::with_source(config.clone(), source)?;
        let (width, height) = glitcher.dimensions();
        let handle = registry.insert(glitcher);
        info!(%handle, width, height, "registered glitcher");

        if args.out_dir.is_none() {
            info!(
                "play with: ffplay -f rawvideo -pixel_format rgba -video_size {width}x{height} -framerate {} -",
                args.target_fps
            );
        }
    }

    let seed = args.seed.unwrap_or_else(random);
    info!(seed, "seeding glitches");
    let mut rng = StdRng::seed_from_u64(seed);

    let mut scheduler = Scheduler::new(args.target_fps).stop_when_empty();
    if let Some(frames) = args.frames {
        scheduler = scheduler.with_max_ticks(frames);
    }

    let stop = scheduler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    let ticks = match &args.out_dir {
        Some(dir) => {
            let mut png = PngSequence::create(dir)?;
            scheduler.run(&mut registry, &mut rng, &mut png).await
        }
        None => {
            let mut raw = RawStdout::new();
            scheduler.run(&mut registry, &mut rng, &mut raw).await
        }
    };

    info!(ticks, "done");
    Ok(())
}
