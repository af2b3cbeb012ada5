//! Colour maps and intensity normalisation for slice rendering.

use ndarray::ArrayView2;

/// Number of entries in every lookup table.
pub const LUT_SIZE: usize = 256;

/// Control points of the `nipy_spectral` map, one every 0.05 from 0 to 1.
const NIPY_SPECTRAL: [[f64; 3]; 21] = [
    [0.0, 0.0, 0.0],
    [0.4667, 0.0, 0.5333],
    [0.5333, 0.0, 0.6],
    [0.0, 0.0, 0.6667],
    [0.0, 0.0, 0.8667],
    [0.0, 0.4667, 0.8667],
    [0.0, 0.6, 0.8667],
    [0.0, 0.6667, 0.6667],
    [0.0, 0.6667, 0.5333],
    [0.0, 0.6, 0.0],
    [0.0, 0.7333, 0.0],
    [0.0, 0.8667, 0.0],
    [0.0, 1.0, 0.0],
    [0.7333, 1.0, 0.0],
    [0.9333, 0.9333, 0.0],
    [1.0, 0.8, 0.0],
    [1.0, 0.6, 0.0],
    [1.0, 0.0, 0.0],
    [0.8667, 0.0, 0.0],
    [0.8, 0.0, 0.0],
    [0.8, 0.8, 0.8],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Gray,
    NipySpectral,
}

impl Colormap {
    /// Builds the 256 entry lookup table.
    pub fn lut(&self) -> Vec<[u8; 3]> {
        (0..LUT_SIZE)
            .map(|i| {
                let x = i as f64 / (LUT_SIZE - 1) as f64;
                let rgb = match self {
                    Colormap::Gray => [x, x, x],
                    Colormap::NipySpectral => interpolate(&NIPY_SPECTRAL, x),
                };
                rgb.map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
            })
            .collect()
    }
}

fn interpolate(points: &[[f64; 3]], x: f64) -> [f64; 3] {
    let segments = (points.len() - 1) as f64;
    let pos = x.clamp(0.0, 1.0) * segments;
    let lo = (pos.floor() as usize).min(points.len() - 2);
    let t = pos - lo as f64;
    let (a, b) = (points[lo], points[lo + 1]);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Linear mapping of data values onto the `0..=1` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// Scales to the finite min and max of `data`.
    ///
    /// Returns `0..0` for data without any finite value.
    pub fn autoscale(data: ArrayView2<f64>) -> Self {
        let (vmin, vmax) = data
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if vmin > vmax {
            Self::new(0.0, 0.0)
        } else {
            Self::new(vmin, vmax)
        }
    }

    /// A degenerate range maps everything to 0, non finite values as well.
    pub fn eval(&self, v: f64) -> f64 {
        if !v.is_finite() || self.vmax <= self.vmin {
            return 0.0;
        }
        ((v - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }

    /// Index into a lookup table of `LUT_SIZE` entries.
    pub fn lut_index(&self, v: f64) -> usize {
        ((self.eval(v) * LUT_SIZE as f64) as usize).min(LUT_SIZE - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gray_endpoints() {
        let lut = Colormap::Gray.lut();
        assert_eq!(lut.len(), LUT_SIZE);
        assert_eq!(lut[0], [0, 0, 0]);
        assert_eq!(lut[255], [255, 255, 255]);
        assert!(lut.iter().all(|c| c[0] == c[1] && c[1] == c[2]));
    }

    #[test]
    fn test_nipy_spectral_endpoints() {
        let lut = Colormap::NipySpectral.lut();
        assert_eq!(lut[0], [0, 0, 0]);
        assert_eq!(lut[255], [204, 204, 204]);
    }

    #[test]
    fn test_nipy_spectral_midpoint_is_green() {
        let rgb = interpolate(&NIPY_SPECTRAL, 0.6);
        assert!(rgb[0].abs() < 1e-9);
        assert!((rgb[1] - 1.0).abs() < 1e-9);
        assert!(rgb[2].abs() < 1e-9);
    }

    #[test]
    fn test_autoscale() {
        let data = array![[2.0, f64::NAN], [-1.0, 7.0]];
        let norm = Normalize::autoscale(data.view());
        assert_eq!(norm, Normalize::new(-1.0, 7.0));
        assert_eq!(norm.eval(3.0), 0.5);
        assert_eq!(norm.lut_index(-1.0), 0);
        assert_eq!(norm.lut_index(7.0), LUT_SIZE - 1);
    }

    #[test]
    fn test_constant_data_maps_to_zero() {
        let data = array![[5.0, 5.0], [5.0, 5.0]];
        let norm = Normalize::autoscale(data.view());
        assert_eq!(norm.eval(5.0), 0.0);
        assert_eq!(norm.lut_index(5.0), 0);
    }
}
