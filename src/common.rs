use ndarray::{Array2, Array3, ArrayView2, Axis};
use std::fmt;

use crate::error::{OverlayError, Result};

// set up enums and structs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    X,
    Y,
    Z,
}

impl Direction {
    pub fn to_usize(&self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }
}
impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::X => write!(f, "0"),
            Direction::Y => write!(f, "1"),
            Direction::Z => write!(f, "2"),
        }
    }
}

/// A single 2D plane cut out of a volume, remembering where it came from.
#[derive(Debug, Clone)]
pub struct Slice2D {
    pub plane: Array2<f64>,
    pub axis: Direction,
    pub index: usize,
}
impl Slice2D {
    pub fn new(plane: Array2<f64>, axis: Direction, index: usize) -> Self {
        Self { plane, axis, index }
    }

    /// The plane rotated for display, see [`rot90`].
    pub fn rotated(&self) -> Array2<f64> {
        rot90(self.plane.view())
    }
}

/// Index of the central slice for an axis of length `depth`.
///
/// Integer division, so a depth of 0 or 1 yields 0.
pub fn middle_index(depth: usize) -> usize {
    depth / 2
}

/// Extracts the plane at `index` along `axis`.
///
/// Unlike `index_axis` this returns an error instead of panicking when the
/// index lies outside the volume.
pub fn extract_slice(img: &Array3<f64>, axis: Direction, index: usize) -> Result<Slice2D> {
    let a = axis.to_usize();
    let len = img.shape()[a];
    if index >= len {
        return Err(OverlayError::SliceOutOfRange {
            axis: a,
            index,
            len,
        });
    }
    let plane = img.index_axis(Axis(a), index).to_owned();
    Ok(Slice2D::new(plane, axis, index))
}

/// Rotates a plane 90 degrees counter-clockwise.
///
/// `out[i, j] = plane[j, ncols - 1 - i]`, the same layout `numpy.rot90`
/// produces, so the first voxel axis runs left to right and the second runs
/// bottom to top.
pub fn rot90(plane: ArrayView2<f64>) -> Array2<f64> {
    let mut view = plane.reversed_axes();
    view.invert_axis(Axis(0));
    view.to_owned()
}
