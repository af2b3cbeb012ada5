//! A 5x8 bitmap font for panel titles.
//!
//! Each glyph is eight rows of five bits, most significant bit on the left.
//! Capitals and digits use rows 0..=6, lowercase bodies rows 2..=6, and row 7
//! holds descenders. Lowercase accented letters are built by clearing the
//! top two rows of the base letter and drawing a mark there.

use image::{Rgb, RgbImage};

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 8;
/// Horizontal advance per character, in font pixels.
pub const ADVANCE: u32 = GLYPH_WIDTH + 1;

type Glyph = [u8; 8];

const UNKNOWN: Glyph = [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04, 0x00];

fn base_glyph(c: char) -> Option<Glyph> {
    let g = match c {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04, 0x00],
        '#' => [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A, 0x00],
        '%' => [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03, 0x00],
        '\'' => [0x04, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02, 0x00],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08, 0x00],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00, 0x00],
        '=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '?' => UNKNOWN,
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E, 0x00],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F, 0x00],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E, 0x00],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02, 0x00],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E, 0x00],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E, 0x00],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08, 0x00],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E, 0x00],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C, 0x00],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11, 0x00],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E, 0x00],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E, 0x00],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E, 0x00],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F, 0x00],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10, 0x00],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F, 0x00],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11, 0x00],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C, 0x00],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11, 0x00],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F, 0x00],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11, 0x00],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x00],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E, 0x00],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10, 0x00],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D, 0x00],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11, 0x00],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E, 0x00],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x00],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E, 0x00],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04, 0x00],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A, 0x00],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11, 0x00],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04, 0x00],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F, 0x00],
        'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F, 0x00],
        'b' => [0x10, 0x10, 0x1E, 0x11, 0x11, 0x11, 0x1E, 0x00],
        'c' => [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E, 0x00],
        'd' => [0x01, 0x01, 0x0F, 0x11, 0x11, 0x11, 0x0F, 0x00],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E, 0x00],
        'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08, 0x00],
        'g' => [0x00, 0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        'h' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11, 0x00],
        'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E, 0x00],
        'j' => [0x02, 0x00, 0x06, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12, 0x00],
        'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E, 0x00],
        'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11, 0x00],
        'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11, 0x00],
        'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E, 0x00],
        'p' => [0x00, 0x00, 0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10],
        'q' => [0x00, 0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x01],
        'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10, 0x00],
        's' => [0x00, 0x00, 0x0F, 0x10, 0x0E, 0x01, 0x1E, 0x00],
        't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06, 0x00],
        'u' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D, 0x00],
        'v' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04, 0x00],
        'w' => [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A, 0x00],
        'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x00],
        'y' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        'z' => [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F, 0x00],
        _ => return None,
    };
    Some(g)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Acute,
    Grave,
    Circumflex,
    Tilde,
    Diaeresis,
    Cedilla,
}

impl Mark {
    fn rows(&self) -> [u8; 2] {
        match self {
            Mark::Acute => [0x02, 0x04],
            Mark::Grave => [0x08, 0x04],
            Mark::Circumflex => [0x04, 0x0A],
            Mark::Tilde => [0x0D, 0x16],
            Mark::Diaeresis => [0x0A, 0x00],
            Mark::Cedilla => [0x04, 0x00],
        }
    }
}

/// Splits a Latin-1 letter into its base letter and diacritic.
fn decompose(c: char) -> Option<(char, Option<Mark>)> {
    use Mark::*;
    let parts = match c {
        'á' => ('a', Some(Acute)),
        'à' => ('a', Some(Grave)),
        'â' => ('a', Some(Circumflex)),
        'ã' => ('a', Some(Tilde)),
        'ä' => ('a', Some(Diaeresis)),
        'é' => ('e', Some(Acute)),
        'è' => ('e', Some(Grave)),
        'ê' => ('e', Some(Circumflex)),
        'ë' => ('e', Some(Diaeresis)),
        'í' => ('i', Some(Acute)),
        'ì' => ('i', Some(Grave)),
        'î' => ('i', Some(Circumflex)),
        'ï' => ('i', Some(Diaeresis)),
        'ó' => ('o', Some(Acute)),
        'ò' => ('o', Some(Grave)),
        'ô' => ('o', Some(Circumflex)),
        'õ' => ('o', Some(Tilde)),
        'ö' => ('o', Some(Diaeresis)),
        'ú' => ('u', Some(Acute)),
        'ù' => ('u', Some(Grave)),
        'û' => ('u', Some(Circumflex)),
        'ü' => ('u', Some(Diaeresis)),
        'ñ' => ('n', Some(Tilde)),
        'ç' => ('c', Some(Cedilla)),
        // capitals have no room above the cap height, drop the mark
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => ('A', None),
        'É' | 'È' | 'Ê' | 'Ë' => ('E', None),
        'Í' | 'Ì' | 'Î' | 'Ï' => ('I', None),
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => ('O', None),
        'Ú' | 'Ù' | 'Û' | 'Ü' => ('U', None),
        'Ñ' => ('N', None),
        'Ç' => ('C', None),
        _ => return None,
    };
    Some(parts)
}

/// Bitmap for `c`, falling back to `?` for anything the font lacks.
fn glyph(c: char) -> Glyph {
    if let Some(g) = base_glyph(c) {
        return g;
    }
    let Some((base, mark)) = decompose(c) else {
        return UNKNOWN;
    };
    let mut g = base_glyph(base).unwrap_or(UNKNOWN);
    match mark {
        Some(Mark::Cedilla) => g[7] |= Mark::Cedilla.rows()[0],
        Some(m) => {
            let [top, second] = m.rows();
            g[0] = top;
            g[1] = second;
        }
        None => {}
    }
    g
}

/// Pixel size of `text` drawn at `scale`.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let n = text.chars().count() as u32;
    let width = if n == 0 { 0 } else { (n * ADVANCE - 1) * scale };
    (width, GLYPH_HEIGHT * scale)
}

/// Draws `text` with its top-left corner at `(x, y)`. Pixels outside the
/// image are skipped.
pub fn draw_text(img: &mut RgbImage, text: &str, x: i64, y: i64, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1) as i64;
    for (n, c) in text.chars().enumerate() {
        let origin = x + n as i64 * ADVANCE as i64 * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH as i64 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let px = origin + col * scale;
                let py = y + row as i64 * scale;
                fill(img, px, py, scale, color);
            }
        }
    }
}

fn fill(img: &mut RgbImage, x: i64, y: i64, size: i64, color: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for yy in y.max(0)..(y + size).min(h) {
        for xx in x.max(0)..(x + size).min(w) {
            img.put_pixel(xx as u32, yy as u32, color);
        }
    }
}
