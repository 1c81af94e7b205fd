use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use median_stack::{MedianStack, DEFAULT_OUTPUT_PATH};

#[derive(Parser)]
#[command(
    name = "median-stack",
    about = "Composite geo-positioned rasters using a per-channel median",
    version,
    after_help = "The result is always written to out.tif in the current directory.\n\
                  Set RUST_LOG=debug for per-tag placement details."
)]
struct Cli {
    /// Input images, placed by their position and resolution tags
    #[arg(required = true, num_args = 1..)]
    images: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let stack = MedianStack::new();
    if let Err(e) = stack.run(&cli.images, Path::new(DEFAULT_OUTPUT_PATH)) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
