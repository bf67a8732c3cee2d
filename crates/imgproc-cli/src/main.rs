//! imgproc - command-line image filtering engine
//!
//! Applies one of five filters to an image and writes the result as PNG
//! under a fixed file name.

use anyhow::{Context, Result};
use clap::Parser;
use imgproc_ops::{run, EngineOptions, FilterRequest};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgproc")]
#[command(author, version, about = "Apply an image filter and write the result as PNG")]
#[command(allow_negative_numbers = true)]
#[command(long_about = "
Applies one filter to an input image (PNG or JPEG) and writes the
result as 8-bit PNG into the output directory.

Filters:
  1  median     [kernel_size]          -> median.png
  2  gaussian   <kernel_size> <sigma>  -> gauss.png
  3  edge                              -> edges.png
  4  uniform    [kernel_size]          -> conv.png
  5  threshold  [threshold]            -> thresh.png

kernel_size is a positive odd integer (default 3), sigma a positive
number, threshold an integer in 0..=255 (default 128).

Examples:
  imgproc 1 noisy.png 5                 # 5x5 median
  imgproc 2 photo.jpg 7 1.5             # gaussian blur
  imgproc 5 scan.png 100 --save-gray    # also writes gray.png
  imgproc -o out/ 3 photo.png           # edges into out/edges.png
")]
struct Cli {
    /// Filter id (1-5)
    filter_id: String,

    /// Input image
    input: PathBuf,

    /// Filter parameters
    params: Vec<String>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Directory to write output into
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write the luminance image to gray.png (threshold filter only)
    #[arg(long)]
    save_gray: bool,
}

impl Cli {
    fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            output_dir: self.output_dir.clone(),
            save_gray: self.save_gray,
        }
    }
}

/// Installs the stderr logger once at startup. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let request = FilterRequest::from_args(&cli.filter_id, &cli.input, &cli.params)
        .context("Invalid invocation")?;
    debug!(?request, "parsed request");

    if cli.verbose > 0 {
        println!("Applying {} filter to {}", request.kind(), cli.input.display());
    }

    let outcome = run(&request, &cli.engine_options())
        .with_context(|| format!("Failed to process: {}", cli.input.display()))?;

    if cli.verbose > 0 {
        for path in &outcome.written {
            println!(
                "Wrote {} ({}x{}, {} channel(s))",
                path.display(),
                outcome.width,
                outcome.height,
                outcome.channels
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use imgproc_core::RasterImage;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_params() {
        let cli = Cli::try_parse_from(["imgproc", "2", "in.png", "5", "1.5"]).unwrap();
        assert_eq!(cli.filter_id, "2");
        assert_eq!(cli.input, PathBuf::from("in.png"));
        assert_eq!(cli.params, vec!["5", "1.5"]);
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert!(!cli.save_gray);
    }

    #[test]
    fn test_defaults_without_params() {
        let cli = Cli::try_parse_from(["imgproc", "3", "in.png"]).unwrap();
        assert!(cli.params.is_empty());
        assert_eq!(cli.threads, 0);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let cli = Cli::try_parse_from(["imgproc", "5", "in.png", "-1"]).unwrap();
        assert_eq!(cli.params, vec!["-1"]);
        let err = FilterRequest::from_args(&cli.filter_id, &cli.input, &cli.params).unwrap_err();
        assert_eq!(err.kind(), imgproc_ops::ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "imgproc", "-vv", "-j", "4", "-o", "out", "--save-gray", "5", "in.png", "90",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, 4);
        assert!(cli.save_gray);
        let opts = cli.engine_options();
        assert_eq!(opts.output_dir, PathBuf::from("out"));
        assert!(opts.save_gray);
    }

    #[test]
    fn test_missing_input_is_usage_error() {
        assert!(Cli::try_parse_from(["imgproc", "1"]).is_err());
        assert!(Cli::try_parse_from(["imgproc"]).is_err());
    }

    #[test]
    fn test_unknown_filter_id_reaches_dispatcher() {
        let cli = Cli::try_parse_from(["imgproc", "9", "in.png"]).unwrap();
        let err = FilterRequest::from_args(&cli.filter_id, &cli.input, &cli.params).unwrap_err();
        assert_eq!(err.kind(), imgproc_ops::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let src = RasterImage::from_pixel(6, 4, &[40, 80, 120]).unwrap();
        imgproc_io::write(&input, &src).unwrap();

        let out = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["imgproc", "-o", out, "4", input.to_str().unwrap()]).unwrap();
        let request = FilterRequest::from_args(&cli.filter_id, &cli.input, &cli.params).unwrap();
        let outcome = run(&request, &cli.engine_options()).unwrap();
        assert_eq!(outcome.written, vec![dir.path().join("conv.png")]);
        assert_eq!(imgproc_io::read(&outcome.written[0]).unwrap(), src);
    }
}
