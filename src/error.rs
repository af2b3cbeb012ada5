use nifti::error::NiftiError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for overlaynii operations
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Error types for overlaynii operations
#[derive(Error, Debug)]
pub enum OverlayError {
    /// An input volume does not exist on disk
    #[error("Did not find input file {}", .0.display())]
    MissingInput(PathBuf),

    /// The nifti reader rejected a file
    #[error("Could not read nifti file: {0}")]
    Nifti(#[from] NiftiError),

    /// The volume is not 3D (after dropping a singleton time axis)
    #[error("Input {} must be 3D, found shape {shape:?}", path.display())]
    NotThreeD { path: PathBuf, shape: Vec<usize> },

    /// The structural and segmentation volumes disagree on shape
    #[error("Segmentation shape {segmentation:?} does not match image shape {structural:?}")]
    ShapeMismatch {
        structural: Vec<usize>,
        segmentation: Vec<usize>,
    },

    /// The requested slice is outside the volume
    #[error("Slice {index} is out of range for axis {axis} with length {len}")]
    SliceOutOfRange {
        axis: usize,
        index: usize,
        len: usize,
    },

    /// Layers stacked in one panel must share a shape
    #[error("Overlay layer shape {found:?} does not match base layer shape {expected:?}")]
    LayerShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding error
    #[error("PNG error: {0}")]
    Png(#[from] png::EncodingError),
}
