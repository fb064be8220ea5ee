use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use synthgen::{BatchGenerator, FailurePolicy, GenCfg, GenError, ImageSet};

/// Paste random cards onto random backgrounds and record their outlines.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of image samples to generate
    #[arg(short, long, default_value_t = 10)]
    samples: usize,

    /// Folder with card images
    #[arg(short, long = "input-folder", default_value = "data/input")]
    input_folder: PathBuf,

    /// Folder with background images
    #[arg(short, long = "bg-folder", default_value = "data/background")]
    bg_folder: PathBuf,

    /// Folder for generated images and labels.json
    #[arg(short, long = "output-folder", default_value = "output")]
    output_folder: PathBuf,

    /// Draw every label outline onto the generated image
    #[arg(long)]
    draw_boxes: bool,

    #[arg(long, default_value_t = 571)]
    card_width: u32,

    #[arg(long, default_value_t = 800)]
    card_height: u32,

    /// Keep cards at their native size
    #[arg(long)]
    no_resize: bool,

    /// Worker threads (default: available cores + 4)
    #[arg(long)]
    workers: Option<usize>,

    /// What to do with the batch when a sample fails
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    on_error: FailurePolicy,

    /// Base seed for per-sample randomness
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl From<Cli> for GenCfg {
    fn from(cli: Cli) -> Self {
        GenCfg {
            samples: cli.samples,
            input_dir: cli.input_folder,
            bg_dir: cli.bg_folder,
            out_dir: cli.output_folder,
            draw_boxes: cli.draw_boxes,
            card_size: (!cli.no_resize).then_some((cli.card_width, cli.card_height)),
            workers: cli.workers,
            failure_policy: cli.on_error,
            seed: cli.seed,
        }
    }
}

fn staged(err: GenError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("{stage} stage failed"))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("info")
    };
    env_logger::Builder::from_env(env).init();

    let cfg = GenCfg::from(cli);
    let images = ImageSet::load(&cfg.input_dir, &cfg.bg_dir, cfg.card_size).map_err(staged)?;

    let progress = ProgressBar::new(cfg.samples as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}")
            .context("invalid progress template")?,
    );

    let generator = BatchGenerator::new(&images, &cfg).with_progress(progress);
    let report = generator.run().map_err(staged)?;

    if report.failures.is_empty() {
        println!("generated {} samples in {}", report.written, cfg.out_dir.display());
    } else {
        println!(
            "generated {} of {} samples in {} ({} skipped)",
            report.written,
            report.requested,
            cfg.out_dir.display(),
            report.failures.len()
        );
    }
    Ok(())
}
