//! Quick commandline utility to compare a nifti image with its segmentation.
//!
//! Takes the central axial slice of a structural image and of its manual
//! segmentation and writes a PNG with two panels: the slice alone, and the
//! slice with the labels overlaid. The figure is then opened in a viewer.

use clap::Parser;
use std::path::PathBuf;

use overlaynii::figure::{DEFAULT_ALPHA, DEFAULT_DPI};
use overlaynii::output::DEFAULT_OUTPUT;
use overlaynii::{run, OverlayConfig, DEFAULT_IMAGE, DEFAULT_SEGMENTATION};

// use clap to create commandline interface
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// the structural nifti/analyze image
    #[arg(short, long, default_value = DEFAULT_IMAGE)]
    image: PathBuf,

    /// the manual segmentation of the same subject
    #[arg(short, long, default_value = DEFAULT_SEGMENTATION)]
    segmentation: PathBuf,

    /// the PNG file to write. An existing file is overwritten.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// resolution of the saved figure
    #[arg(short, long, default_value_t = DEFAULT_DPI)]
    dpi: u32,

    /// opacity of the segmentation overlay (0 to 1)
    #[arg(short, long, default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// only write the PNG, do not open a viewer
    #[arg(long)]
    no_show: bool,

    /// verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Main function that parses commandline arguments and runs the program.
fn main() {
    let cli = Args::parse();
    setup_logging(cli.verbose);

    let config = OverlayConfig {
        image: cli.image,
        segmentation: cli.segmentation,
        output: cli.output,
        dpi: cli.dpi,
        alpha: cli.alpha,
        show: !cli.no_show,
    };

    if let Err(e) = run(&config) {
        eprintln!("Error! {}", e);
        std::process::exit(-2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_fixed_run() {
        let cli = Args::parse_from(["overlaynii"]);
        assert_eq!(cli.image, PathBuf::from(DEFAULT_IMAGE));
        assert_eq!(cli.output, PathBuf::from("ibsr01_mri_seg_overlay.png"));
        assert_eq!(cli.dpi, 300);
        assert_eq!(cli.alpha, 0.4);
        assert!(!cli.no_show);
    }
}
