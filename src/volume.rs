//! Loading of structural and segmentation volumes.
//!
//! Reading is left entirely to the `nifti` crate, which understands single
//! `.nii`/`.nii.gz` files as well as `.hdr`/`.img` pairs. This module only
//! turns what it returns into a 3D `f64` array and checks that a structural
//! image and its segmentation line up.

use log::{debug, info};
use nalgebra::{Matrix4, Point3, Point4};
use ndarray::{Array3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use std::path::{Path, PathBuf};

use crate::common::{extract_slice, Direction, Slice2D};
use crate::error::{OverlayError, Result};

/// A 3D volume read from disk.
#[derive(Debug, Clone)]
pub struct Volume {
    pub data: Array3<f64>,
    pub affine: Matrix4<f64>,
    pub path: PathBuf,
}

impl Volume {
    pub fn new(data: Array3<f64>, affine: Matrix4<f64>, path: PathBuf) -> Self {
        Self { data, affine, path }
    }

    pub fn shape(&self) -> [usize; 3] {
        let (x, y, z) = self.data.dim();
        [x, y, z]
    }

    pub fn slice(&self, axis: Direction, index: usize) -> Result<Slice2D> {
        extract_slice(&self.data, axis, index)
    }

    /// World coordinates of the centre of slice `index` along `axis`.
    pub fn slice_world_position(&self, axis: Direction, index: usize) -> Point3<f64> {
        let shape = self.shape();
        let mut vox = Point4::new(
            (shape[0] as f64 - 1.0) / 2.0,
            (shape[1] as f64 - 1.0) / 2.0,
            (shape[2] as f64 - 1.0) / 2.0,
            1.0,
        );
        vox[axis.to_usize()] = index as f64;
        let world = self.affine * vox.coords;
        Point3::new(world[0], world[1], world[2])
    }
}

/// Header and data paths when `path` names either half of a `.hdr`/`.img`
/// pair, compressed or not.
///
/// The sibling prefers the uncompressed extension when neither file exists,
/// so a missing half is reported under its usual name.
pub fn file_pair(path: &Path) -> Option<(PathBuf, PathBuf)> {
    let name = path.file_name()?.to_str()?;
    let lower = name.to_ascii_lowercase();
    let (stem, is_header) = ["hdr.gz", "img.gz", "hdr", "img"]
        .iter()
        .find_map(|ext| {
            let stem_len = lower.strip_suffix(ext)?.strip_suffix('.')?.len();
            Some((&name[..stem_len], ext.starts_with("hdr")))
        })?;
    let sibling_exts = if is_header {
        ["img", "img.gz"]
    } else {
        ["hdr", "hdr.gz"]
    };
    let candidates: Vec<PathBuf> = sibling_exts
        .iter()
        .map(|ext| path.with_file_name(format!("{stem}.{ext}")))
        .collect();
    let sibling = candidates
        .iter()
        .find(|p| p.exists())
        .unwrap_or(&candidates[0])
        .clone();
    if is_header {
        Some((path.to_path_buf(), sibling))
    } else {
        Some((sibling, path.to_path_buf()))
    }
}

/// Reads a single volume, dropping a trailing time axis of length one.
///
/// A `.hdr`/`.img` pair can be addressed by either file; both must exist.
/// The header must be NIfTI-1: plain Analyze 7.5 headers without the NIfTI
/// magic are rejected by the reader and come back as [`OverlayError::Nifti`].
pub fn load_volume<P: AsRef<Path>>(path: P) -> Result<Volume> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(OverlayError::MissingInput(path.to_path_buf()));
    }
    info!("Loading: {}", path.display());

    let obj = match file_pair(path) {
        Some((hdr, img)) => {
            for half in [&hdr, &img] {
                if !half.exists() {
                    return Err(OverlayError::MissingInput(half.clone()));
                }
            }
            debug!("Reading pair {} + {}", hdr.display(), img.display());
            ReaderOptions::new().read_file_pair(&hdr, &img)?
        }
        None => ReaderOptions::new().read_file(path)?,
    };
    let affine = obj.header().affine::<f64>();
    let img = obj.into_volume().into_ndarray::<f64>()?;
    debug!("Raw shape of {}: {:?}", path.display(), img.shape());

    // analyze files frequently carry dim[4] = 1
    let img = if img.ndim() == 4 && img.shape()[3] == 1 {
        img.index_axis_move(Axis(3), 0)
    } else {
        img
    };
    let shape = img.shape().to_vec();
    let data = img
        .into_dimensionality::<Ix3>()
        .map_err(|_| OverlayError::NotThreeD {
            path: path.to_path_buf(),
            shape,
        })?;

    Ok(Volume::new(data, affine, path.to_path_buf()))
}

/// A structural image together with its manual segmentation.
#[derive(Debug, Clone)]
pub struct VolumePair {
    pub structural: Volume,
    pub segmentation: Volume,
}

impl VolumePair {
    /// Builds a pair, refusing volumes whose shapes disagree.
    pub fn new(structural: Volume, segmentation: Volume) -> Result<Self> {
        if structural.shape() != segmentation.shape() {
            return Err(OverlayError::ShapeMismatch {
                structural: structural.shape().to_vec(),
                segmentation: segmentation.shape().to_vec(),
            });
        }
        Ok(Self {
            structural,
            segmentation,
        })
    }

    /// Loads the structural image first, so a missing structural file fails
    /// before the segmentation is touched.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(structural: P, segmentation: Q) -> Result<Self> {
        let structural = load_volume(structural)?;
        let segmentation = load_volume(segmentation)?;
        info!("Dims: {:?}", structural.shape());
        Self::new(structural, segmentation)
    }

    /// Cuts both volumes at the same index along `axis`.
    pub fn slices(&self, axis: Direction, index: usize) -> Result<(Slice2D, Slice2D)> {
        Ok((
            self.structural.slice(axis, index)?,
            self.segmentation.slice(axis, index)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn volume(shape: (usize, usize, usize)) -> Volume {
        Volume::new(
            Array::from_shape_fn(shape, |(x, y, z)| (x + y + z) as f64),
            Matrix4::identity(),
            PathBuf::from("mem.nii"),
        )
    }

    #[test]
    fn test_pair_rejects_depth_mismatch() {
        let err = VolumePair::new(volume((4, 4, 6)), volume((4, 4, 5))).unwrap_err();
        match err {
            OverlayError::ShapeMismatch {
                structural,
                segmentation,
            } => {
                assert_eq!(structural, vec![4, 4, 6]);
                assert_eq!(segmentation, vec![4, 4, 5]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_pair_rejects_in_plane_mismatch() {
        assert!(VolumePair::new(volume((4, 5, 6)), volume((5, 4, 6))).is_err());
    }

    #[test]
    fn test_pair_slices_share_index() {
        let pair = VolumePair::new(volume((4, 4, 6)), volume((4, 4, 6))).unwrap();
        let (a, b) = pair.slices(Direction::Z, 3).unwrap();
        assert_eq!(a.index, 3);
        assert_eq!(b.index, 3);
        assert_eq!(a.plane, b.plane);
    }

    #[test]
    fn test_world_position_uses_affine() {
        let mut v = volume((11, 21, 8));
        let mut affine = Matrix4::identity();
        affine[(0, 0)] = 2.0;
        affine[(2, 2)] = 1.5;
        affine[(2, 3)] = -10.0;
        v.affine = affine;
        let p = v.slice_world_position(Direction::Z, 4);
        assert_eq!(p, Point3::new(10.0, 10.0, -4.0));
    }

    #[test]
    fn test_file_pair_from_either_half() {
        let hdr = PathBuf::from("data/IBSR_01_ana.hdr");
        let img = PathBuf::from("data/IBSR_01_ana.img");
        assert_eq!(file_pair(&img), Some((hdr.clone(), img.clone())));
        assert_eq!(file_pair(&hdr), Some((hdr, img)));
    }

    #[test]
    fn test_file_pair_compressed_and_dotted_names() {
        let (hdr, img) = file_pair(Path::new("sub.01/t1.v2.img.gz")).unwrap();
        assert_eq!(hdr, PathBuf::from("sub.01/t1.v2.hdr"));
        assert_eq!(img, PathBuf::from("sub.01/t1.v2.img.gz"));

        let (hdr, _) = file_pair(Path::new("T1.IMG")).unwrap();
        assert_eq!(hdr, PathBuf::from("T1.hdr"));
    }

    #[test]
    fn test_single_files_are_not_pairs() {
        assert_eq!(file_pair(Path::new("t1.nii")), None);
        assert_eq!(file_pair(Path::new("t1.nii.gz")), None);
        assert_eq!(file_pair(Path::new("img")), None);
    }

    #[test]
    fn test_missing_file() {
        let err = load_volume("does/not/exist.img").unwrap_err();
        assert!(matches!(err, OverlayError::MissingInput(_)));
    }
}
