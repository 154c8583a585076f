// CLI entry for halo_blur
use anyhow::{Context, Result};
use clap::Parser;
use halo_blur::core_modules::utils::image_helper::image_helper::save_bmp;
use halo_blur::pipeline::DEFAULT_REPETITIONS;
use halo_blur::{BlurError, BlurPipeline, BmpFile, PipelineConfig};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "halo_blur", version, about = "Distributed Gaussian blur with halo exchange")]
struct Cli {
    /// Number of repetitions
    #[arg(
        default_value_t = DEFAULT_REPETITIONS,
        value_parser = clap::value_parser!(u32).range(0..=1_000_000)
    )]
    repetitions: u32,

    /// Number of ranks (defaults to the number of CPUs)
    #[arg(short = 'n', long = "processes", value_parser = clap::value_parser!(u32).range(1..=4096))]
    processes: Option<u32>,

    /// Input bitmap
    #[arg(long = "input", default_value = "MARBLES.BMP")]
    input: PathBuf,
    /// Output bitmap
    #[arg(long = "output", default_value = "MARBLES2.BMP")]
    output: PathBuf,
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| BlurError::Environment(e.to_string()))?;

    let processes = cli.processes.map(|n| n as usize).unwrap_or_else(num_cpus::get);
    let pipeline = BlurPipeline::new(PipelineConfig {
        processes,
        repetitions: cli.repetitions,
    });

    let report = runtime
        .block_on(pipeline.run(BmpFile(cli.input.clone())))
        .with_context(|| format!("failed to blur {}", cli.input.display()))?;

    save_bmp(&cli.output, &report.image)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!("wrote {}", cli.output.display());

    println!("{}", report.summary_line());
    Ok(())
}

fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<BlurError>()
        .map_or(1, BlurError::exit_code)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return ExitCode::from(BlurError::Usage(error.kind().to_string()).exit_code());
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::from(exit_code(&error))
        }
    }
}
