//! rotsom CLI - rotation-invariant SOM training.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn};
use rotsom::storage::{write_rotation_bank, write_som};
use rotsom::{
    ImageStream, Initialization, NeighborhoodKind, Result, RotsomError, Schedule, Trainer,
    TrainingConfig,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "rotsom")]
#[command(version)]
#[command(about = "Rotation-invariant self-organizing map training", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum InitArg {
    Zero,
    Random,
}

#[derive(Clone, Copy, ValueEnum)]
enum NeighborhoodArg {
    Gaussian,
    MexicanHat,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a map from a binary image stream
    Train {
        /// Input image stream
        #[arg(short, long)]
        input: PathBuf,

        /// Output map file
        #[arg(short, long)]
        output: PathBuf,

        /// Neuron patch edge length
        #[arg(short = 'd', long, default_value = "32")]
        neuron_dim: usize,

        /// Map width in neurons
        #[arg(long, default_value = "10")]
        som_width: usize,

        /// Map height in neurons
        #[arg(long, default_value = "10")]
        som_height: usize,

        /// Weight initialization
        #[arg(long, value_enum, default_value = "zero")]
        init: InitArg,

        /// Seed for random initialization
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of rotations per input
        #[arg(short, long, default_value = "360")]
        rotations: usize,

        /// Disable matching against the flipped image
        #[arg(long)]
        no_flip: bool,

        /// Neighborhood kernel
        #[arg(long, value_enum, default_value = "gaussian")]
        neighborhood: NeighborhoodArg,

        /// Neighborhood width sigma
        #[arg(long, default_value = "1.1")]
        sigma: f32,

        /// Sigma reached on the last input (linear decay)
        #[arg(long, conflicts_with = "sigma_decay")]
        sigma_end: Option<f32>,

        /// Per-input multiplier on sigma (exponential decay)
        #[arg(long)]
        sigma_decay: Option<f32>,

        /// Learning rate
        #[arg(short, long, default_value = "0.2")]
        learning_rate: f32,

        /// Learning rate reached on the last input (linear decay)
        #[arg(long, conflicts_with = "learning_rate_decay")]
        learning_rate_end: Option<f32>,

        /// Per-input multiplier on the learning rate (exponential decay)
        #[arg(long)]
        learning_rate_decay: Option<f32>,

        /// Stop after this many inputs
        #[arg(short = 'n', long)]
        max_inputs: Option<usize>,

        /// Fail when a NaN appears in the map or the distance matrix
        #[arg(long)]
        check_finite: bool,

        /// Worker threads, 0 for all cores
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,

        /// Write the first input's oriented variants to this file
        #[arg(long)]
        dump_rotations: Option<PathBuf>,
    },

    /// Show the header of a binary image stream
    Info {
        /// Stream file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Train {
            input,
            output,
            neuron_dim,
            som_width,
            som_height,
            init,
            seed,
            rotations,
            no_flip,
            neighborhood,
            sigma,
            sigma_end,
            sigma_decay,
            learning_rate,
            learning_rate_end,
            learning_rate_decay,
            max_inputs,
            check_finite,
            threads,
            dump_rotations,
        } => {
            let config = TrainingConfig {
                neuron_dim,
                som_width,
                som_height,
                init: match init {
                    InitArg::Zero => Initialization::Zero,
                    InitArg::Random => Initialization::Random,
                },
                seed,
                rotations,
                flip: !no_flip,
                neighborhood: match neighborhood {
                    NeighborhoodArg::Gaussian => NeighborhoodKind::Gaussian,
                    NeighborhoodArg::MexicanHat => NeighborhoodKind::MexicanHat,
                },
                sigma,
                learning_rate,
                sigma_schedule: schedule_from(sigma_end, sigma_decay),
                learning_rate_schedule: schedule_from(learning_rate_end, learning_rate_decay),
                max_inputs,
                check_finite,
                num_threads: threads,
            };
            train(config, input, output, dump_rotations)
        }

        Commands::Info { input } => info(input),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn schedule_from(end: Option<f32>, decay: Option<f32>) -> Schedule {
    match (end, decay) {
        (Some(end), _) => Schedule::Linear { end },
        (None, Some(rate)) => Schedule::Exponential { rate },
        (None, None) => Schedule::Constant,
    }
}

fn train(
    config: TrainingConfig,
    input: PathBuf,
    output: PathBuf,
    dump_rotations: Option<PathBuf>,
) -> Result<()> {
    if config.num_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build_global()
            .map_err(|e| RotsomError::Config(format!("worker pool: {}", e)))?;
    }

    let started = Instant::now();
    let mut stream = ImageStream::open(&input)?;
    let available = stream.number_of_entries();
    let planned = match config.max_inputs {
        Some(cap) => cap.min(available),
        None => available,
    };

    println!(
        "Training on {} of {} images ({}x{}) from {}",
        planned,
        available,
        stream.width(),
        stream.height(),
        input.display()
    );

    let mut trainer = Trainer::new(config, stream.width(), stream.height(), planned)?;

    if let Some(path) = &dump_rotations {
        match stream.next() {
            Some(first) => {
                let image = first?;
                trainer.step(&image)?;
                write_rotation_bank(trainer.bank(), path)?;
                println!("Wrote oriented variants of the first input to {}", path.display());
            }
            None => warn!("Input stream is empty, nothing to dump"),
        }
    }

    let bar = ProgressBar::new(planned as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
            .unwrap()
            .progress_chars("█▓▒░  "),
    );

    let progress = bar.clone();
    let result = trainer.train(stream.by_ref().inspect(move |_| progress.inc(1)));
    bar.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            // Keep what was learned before the failure when possible.
            if matches!(e, RotsomError::Io(_)) && trainer.steps_done() > 0 {
                if let Err(flush) = write_som(trainer.som(), &output) {
                    warn!("Could not flush partial map: {}", flush);
                } else {
                    warn!(
                        "Flushed partial map after {} inputs to {}",
                        trainer.steps_done(),
                        output.display()
                    );
                }
            }
            return Err(e);
        }
    };

    write_som(trainer.som(), &output)?;

    println!(
        "✓ Trained on {} inputs in {:.1?}{}",
        trainer.steps_done(),
        started.elapsed(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    println!("✓ Map written to {}", output.display());
    Ok(())
}

fn info(input: PathBuf) -> Result<()> {
    let stream = ImageStream::open(&input)?;
    println!("{}", input.display());
    println!("  entries: {}", stream.number_of_entries());
    println!("  image size: {}x{}", stream.width(), stream.height());
    Ok(())
}
