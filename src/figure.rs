//! Composition of slices into a titled, multi-panel figure.
//!
//! A [`Figure`] is a row of equally wide [`Panel`]s. Each panel stacks one or
//! more [`Layer`]s of the same shape, blending every layer over the ones below
//! it with its own opacity. Images keep square pixels and are centred in the
//! space left under the title; no ticks, labels or frames are drawn.

use image::{Rgb, RgbImage};
use log::debug;
use ndarray::Array2;

use crate::colormap::{Colormap, Normalize};
use crate::common::Slice2D;
use crate::error::{OverlayError, Result};
use crate::glyphs::{draw_text, text_size, GLYPH_HEIGHT};

pub const FIGSIZE: (f64, f64) = (12.0, 6.0);
pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_ALPHA: f64 = 0.4;
/// Title font size in points.
pub const TITLE_POINTS: f64 = 12.0;
/// Padding around each panel, as a fraction of the title font size.
pub const PAD_FRACTION: f64 = 1.08;

pub const STRUCTURAL_TITLE: &str = "MRI T1 - Slice Axial (Centro)";
pub const OVERLAY_TITLE: &str = "Segmentação Manual (43 Labels)";

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A 2D array drawn through a colour map.
#[derive(Debug, Clone)]
pub struct Layer {
    pub plane: Array2<f64>,
    pub colormap: Colormap,
    pub alpha: f64,
    /// `None` scales to the data's own range.
    pub norm: Option<Normalize>,
}

impl Layer {
    pub fn new(plane: Array2<f64>, colormap: Colormap) -> Self {
        Self {
            plane,
            colormap,
            alpha: 1.0,
            norm: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    fn normalize(&self) -> Normalize {
        self.norm
            .unwrap_or_else(|| Normalize::autoscale(self.plane.view()))
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub layers: Vec<Layer>,
}

impl Panel {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            layers: Vec::new(),
        }
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Shape `(rows, cols)` shared by all layers, or an error naming the first
    /// layer that disagrees with the base.
    fn shape(&self) -> Result<Option<(usize, usize)>> {
        let Some(base) = self.layers.first() else {
            return Ok(None);
        };
        let expected = base.plane.dim();
        for layer in &self.layers[1..] {
            let found = layer.plane.dim();
            if found != expected {
                return Err(OverlayError::LayerShape { expected, found });
            }
        }
        Ok(Some(expected))
    }
}

/// Pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Figure {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn new(width_in: f64, height_in: f64, dpi: u32) -> Self {
        Self {
            width_in,
            height_in,
            dpi,
            panels: Vec::new(),
        }
    }

    /// The structural slice next to the same slice with the segmentation
    /// blended on top at `alpha`. Both planes are rotated for display.
    pub fn overlay_comparison(
        structural: &Slice2D,
        segmentation: &Slice2D,
        alpha: f64,
        dpi: u32,
    ) -> Self {
        let base = structural.rotated();
        let labels = segmentation.rotated();
        Self::new(FIGSIZE.0, FIGSIZE.1, dpi)
            .panel(Panel::new(STRUCTURAL_TITLE).layer(Layer::new(base.clone(), Colormap::Gray)))
            .panel(
                Panel::new(OVERLAY_TITLE)
                    .layer(Layer::new(base, Colormap::Gray))
                    .layer(Layer::new(labels, Colormap::NipySpectral).with_alpha(alpha)),
            )
    }

    pub fn panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (self.width_in * dpi).round().max(1.0) as u32,
            (self.height_in * dpi).round().max(1.0) as u32,
        )
    }

    fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    /// Integer magnification of the bitmap font that comes closest to
    /// `TITLE_POINTS` at this DPI.
    pub fn title_scale(&self) -> u32 {
        let px = self.points_to_pixels(TITLE_POINTS);
        ((px / GLYPH_HEIGHT as f64).round() as u32).max(1)
    }

    fn pad(&self) -> u32 {
        self.points_to_pixels(TITLE_POINTS * PAD_FRACTION).round() as u32
    }

    /// Area each panel has available for its image, below the title.
    pub fn image_boxes(&self) -> Vec<Rect> {
        let (width, height) = self.pixel_size();
        let n = self.panels.len() as u32;
        if n == 0 {
            return Vec::new();
        }
        let column = width / n;
        let pad = self.pad();
        let top = pad + GLYPH_HEIGHT * self.title_scale() + pad / 2;
        (0..n)
            .map(|i| Rect {
                x: i * column + pad,
                y: top,
                width: column.saturating_sub(2 * pad),
                height: height.saturating_sub(top + pad),
            })
            .collect()
    }

    /// Rasterises the figure.
    pub fn render(&self) -> Result<RgbImage> {
        let (width, height) = self.pixel_size();
        let mut canvas = RgbImage::from_pixel(width, height, WHITE);
        let scale = self.title_scale();
        let pad = self.pad();
        let column = width / self.panels.len().max(1) as u32;

        for (i, (panel, bbox)) in self.panels.iter().zip(self.image_boxes()).enumerate() {
            let (title_width, _) = text_size(&panel.title, scale);
            let title_x = (i as u32 * column) as i64 + (column as i64 - title_width as i64) / 2;
            draw_text(&mut canvas, &panel.title, title_x, pad as i64, scale, BLACK);

            if let Some(shape) = panel.shape()? {
                draw_panel_image(&mut canvas, panel, shape, bbox);
            }
        }
        Ok(canvas)
    }
}

/// Largest rectangle with the plane's aspect ratio that fits in `bbox`,
/// centred, and the source-to-output magnification.
fn fit(shape: (usize, usize), bbox: Rect) -> (Rect, f64) {
    let (rows, cols) = shape;
    let s = (bbox.width as f64 / cols as f64).min(bbox.height as f64 / rows as f64);
    let w = (cols as f64 * s).floor() as u32;
    let h = (rows as f64 * s).floor() as u32;
    let rect = Rect {
        x: bbox.x + bbox.width.saturating_sub(w) / 2,
        y: bbox.y + bbox.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    };
    (rect, s)
}

fn draw_panel_image(canvas: &mut RgbImage, panel: &Panel, shape: (usize, usize), bbox: Rect) {
    let (rows, cols) = shape;
    if rows == 0 || cols == 0 {
        return;
    }
    let (rect, s) = fit(shape, bbox);
    debug!(
        "Panel '{}': {}x{} plane drawn at {:?}",
        panel.title, rows, cols, rect
    );
    let luts: Vec<_> = panel.layers.iter().map(|l| l.colormap.lut()).collect();
    let norms: Vec<_> = panel.layers.iter().map(Layer::normalize).collect();

    for py in 0..rect.height {
        let row = (((py as f64 + 0.5) / s) as usize).min(rows - 1);
        for px in 0..rect.width {
            let col = (((px as f64 + 0.5) / s) as usize).min(cols - 1);
            let mut rgb = [255.0f64; 3];
            for ((layer, lut), norm) in panel.layers.iter().zip(&luts).zip(&norms) {
                let color = lut[norm.lut_index(layer.plane[[row, col]])];
                for c in 0..3 {
                    rgb[c] = layer.alpha * color[c] as f64 + (1.0 - layer.alpha) * rgb[c];
                }
            }
            canvas.put_pixel(
                rect.x + px,
                rect.y + py,
                Rgb(rgb.map(|c| c.round().clamp(0.0, 255.0) as u8)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Direction;
    use ndarray::{array, Array};

    #[test]
    fn test_pixel_size_and_scale() {
        let fig = Figure::new(FIGSIZE.0, FIGSIZE.1, DEFAULT_DPI);
        assert_eq!(fig.pixel_size(), (3600, 1800));
        assert_eq!(fig.title_scale(), 6);
        assert_eq!(Figure::new(12.0, 6.0, 10).title_scale(), 1);
    }

    #[test]
    fn test_image_boxes_are_equal() {
        let fig = Figure::new(12.0, 6.0, 100)
            .panel(Panel::new("a"))
            .panel(Panel::new("b"));
        let boxes = fig.image_boxes();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].width, boxes[1].width);
        assert_eq!(boxes[0].height, boxes[1].height);
        assert_eq!(boxes[1].x - boxes[0].x, 600);
    }

    #[test]
    fn test_fit_keeps_aspect() {
        let bbox = Rect {
            x: 10,
            y: 20,
            width: 400,
            height: 100,
        };
        let (rect, s) = fit((10, 20), bbox);
        assert_eq!(s, 10.0);
        assert_eq!(
            rect,
            Rect {
                x: 110,
                y: 20,
                width: 200,
                height: 100
            }
        );
    }

    #[test]
    fn test_layer_shape_mismatch() {
        let fig = Figure::new(2.0, 1.0, 50).panel(
            Panel::new("x")
                .layer(Layer::new(Array2::zeros((4, 5)), Colormap::Gray))
                .layer(Layer::new(Array2::zeros((5, 4)), Colormap::NipySpectral)),
        );
        let err = fig.render().unwrap_err();
        assert!(matches!(
            err,
            OverlayError::LayerShape {
                expected: (4, 5),
                found: (5, 4)
            }
        ));
    }

    #[test]
    fn test_overlay_blends_with_alpha() {
        let unit = Some(Normalize::new(0.0, 1.0));
        let fig = Figure::new(1.0, 1.0, 100).panel(
            Panel::new("")
                .layer(Layer {
                    norm: unit,
                    ..Layer::new(array![[1.0]], Colormap::Gray)
                })
                .layer(Layer {
                    norm: unit,
                    ..Layer::new(array![[0.0]], Colormap::NipySpectral).with_alpha(0.4)
                }),
        );
        let img = fig.render().unwrap();
        // white base darkened by the black end of the spectral map
        assert_eq!(img.get_pixel(50, 60), &Rgb([153, 153, 153]));
        // outside the image the background stays white
        assert_eq!(img.get_pixel(1, 99), &WHITE);
    }

    #[test]
    fn test_constant_layer_renders_black() {
        let fig = Figure::new(1.0, 1.0, 100)
            .panel(Panel::new("").layer(Layer::new(Array2::from_elem((3, 3), 7.0), Colormap::Gray)));
        let img = fig.render().unwrap();
        assert_eq!(img.get_pixel(50, 60), &BLACK);
    }

    #[test]
    fn test_overlay_comparison_layout() {
        let structural = Array::from_shape_fn((8, 6), |(x, y)| (x * 6 + y) as f64);
        let labels = Array::from_shape_fn((8, 6), |(x, _)| (x % 3) as f64);
        let a = Slice2D::new(structural, Direction::Z, 2);
        let b = Slice2D::new(labels, Direction::Z, 2);
        let fig = Figure::overlay_comparison(&a, &b, DEFAULT_ALPHA, 50);
        assert_eq!(fig.panels.len(), 2);
        assert_eq!(fig.panels[0].title, STRUCTURAL_TITLE);
        assert_eq!(fig.panels[1].title, OVERLAY_TITLE);
        assert_eq!(fig.panels[1].layers[1].alpha, DEFAULT_ALPHA);
        // rotated: rows come from the second voxel axis
        assert_eq!(fig.panels[0].layers[0].plane.dim(), (6, 8));

        let img = fig.render().unwrap();
        assert_eq!(img.dimensions(), (600, 300));
    }
}
