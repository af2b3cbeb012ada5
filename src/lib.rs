//! Render a segmentation overlay on the central axial slice of a nifti volume.
//!
//! The pipeline loads a structural image and its manual segmentation, cuts
//! both at the middle of the third axis, and writes a two-panel figure: the
//! structural slice on its own, and the same slice with the labels blended on
//! top.

pub mod colormap;
pub mod common;
pub mod error;
pub mod figure;
pub mod glyphs;
pub mod output;
pub mod volume;

use log::info;
use std::path::PathBuf;

use crate::common::{middle_index, Direction};
use crate::error::Result;
use crate::figure::{Figure, DEFAULT_ALPHA, DEFAULT_DPI, OVERLAY_TITLE, STRUCTURAL_TITLE};
use crate::volume::VolumePair;

pub use crate::error::OverlayError;

pub const DEFAULT_IMAGE: &str = "data/raw/IBSR_01/images/analyze/IBSR_01_ana.img";
pub const DEFAULT_SEGMENTATION: &str = "data/raw/IBSR_01/segmentation/analyze/IBSR_01_seg_ana.img";

/// Everything a single overlay run needs.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub image: PathBuf,
    pub segmentation: PathBuf,
    pub output: PathBuf,
    pub dpi: u32,
    pub alpha: f64,
    /// Open the written figure in a viewer and wait for the user.
    pub show: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::from(DEFAULT_IMAGE),
            segmentation: PathBuf::from(DEFAULT_SEGMENTATION),
            output: PathBuf::from(output::DEFAULT_OUTPUT),
            dpi: DEFAULT_DPI,
            alpha: DEFAULT_ALPHA,
            show: true,
        }
    }
}

/// Runs the whole pipeline and returns the path of the written figure.
pub fn run(config: &OverlayConfig) -> Result<PathBuf> {
    let pair = VolumePair::load(&config.image, &config.segmentation)?;

    let axis = Direction::Z;
    let index = middle_index(pair.structural.shape()[axis.to_usize()]);
    let (structural, segmentation) = pair.slices(axis, index)?;
    let world = pair.structural.slice_world_position(axis, index);
    info!(
        "Slicing on axis {} at index {} (world {:.2}, {:.2}, {:.2})",
        axis, index, world.x, world.y, world.z
    );

    let figure = Figure::overlay_comparison(&structural, &segmentation, config.alpha, config.dpi);
    let img = figure.render()?;
    let title = format!("{STRUCTURAL_TITLE} | {OVERLAY_TITLE}");
    output::save_png(&img, &config.output, config.dpi, &title)?;

    if config.show {
        output::show(&config.output)?;
    }
    Ok(config.output.clone())
}
