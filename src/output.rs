//! Writing the rendered figure to disk and handing it to a viewer.

use image::RgbImage;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

pub const DEFAULT_OUTPUT: &str = "ibsr01_mri_seg_overlay.png";

const METERS_PER_INCH: f64 = 0.0254;

/// Writes `img` as an 8-bit RGB PNG, replacing any existing file.
///
/// The DPI is recorded in the `pHYs` chunk. Panel titles go into an
/// international text chunk so they survive in UTF-8.
pub fn save_png<P: AsRef<Path>>(img: &RgbImage, path: P, dpi: u32, title: &str) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), img.width(), img.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = (dpi as f64 / METERS_PER_INCH).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));
    encoder.add_itxt_chunk("Title".to_string(), title.to_string())?;
    encoder.add_text_chunk(
        "Software".to_string(),
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    )?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(img.as_raw())?;
    writer.finish()?;
    info!(
        "Output: {} ({}x{} px, {} dpi)",
        path.display(),
        img.width(),
        img.height(),
        dpi
    );
    Ok(())
}

/// Opens `path` in the system image viewer and blocks until Enter is pressed.
///
/// Failing to launch a viewer is not fatal: the figure is already on disk.
pub fn show<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = fs::canonicalize(path.as_ref())?;
    let url = format!("file://{}", path.display());
    if let Err(e) = webbrowser::open(&url) {
        warn!("Could not open a viewer for {}: {}", path.display(), e);
        return Ok(());
    }
    print!("Showing {}. Press Enter to exit.", path.display());
    io::stdout().flush()?;
    wait_for_enter(io::stdin().lock())
}

fn wait_for_enter<R: BufRead>(mut reader: R) -> Result<()> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    #[test]
    fn test_save_png_overwrites_and_records_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        fs::write(&path, b"stale").unwrap();

        let img = RgbImage::from_pixel(7, 3, Rgb([10, 20, 30]));
        save_png(&img, &path, 300, "Segmentação").unwrap();

        let mut decoder = png::Decoder::new(File::open(&path).unwrap());
        decoder.set_ignore_text_chunk(false);
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (7, 3));
        assert_eq!(info.color_type, png::ColorType::Rgb);
        let dims = info.pixel_dims.unwrap();
        assert_eq!(dims.xppu, 11811);
        assert_eq!(dims.unit, png::Unit::Meter);
        assert!(info
            .utf8_text
            .iter()
            .any(|t| t.keyword == "Title" && t.get_text().unwrap() == "Segmentação"));
    }

    #[test]
    fn test_save_png_unwritable_dir() {
        let img = RgbImage::new(1, 1);
        let err = save_png(&img, "no/such/dir/out.png", 300, "").unwrap_err();
        assert!(matches!(err, crate::error::OverlayError::Io(_)));
    }

    #[test]
    fn test_wait_for_enter_returns_on_newline() {
        wait_for_enter(Cursor::new("\n")).unwrap();
        wait_for_enter(Cursor::new("")).unwrap();
    }
}
