//! # Debug image drawing

use crate::prelude::v1::*;

pub const MASK: Bgr = Bgr::new(0x40, 0xC0, 0xC0);
pub const REJECTED: Bgr = Bgr::new(0x00, 0x00, 0xFF);
pub const ACCEPTED: Bgr = Bgr::new(0x00, 0xFF, 0x00);
pub const BOUNDS: Bgr = Bgr::new(0xFF, 0x40, 0x40);

/// Render a darkened grayscale copy of `src` into `out` as `Bgr`.
pub fn background(src: &Image, out: &mut Image) {
    out.resize(Format::Bgr, src.dims());
    let out = out.as_bgr_mut();

    match src.format() {
        Format::Gray | Format::Yuv420Sp => {
            for (px, &v) in out.iter_mut().zip(src.data()) {
                *px = Bgr::gray(v / 2);
            }
        }
        Format::Bgr => {
            for (px, v) in out.iter_mut().zip(src.as_bgr()) {
                *px = Bgr::gray(v.luma() / 2);
            }
        }
        Format::Yuv => {
            for (px, v) in out.iter_mut().zip(src.data().chunks_exact(3)) {
                *px = Bgr::gray(v[0] / 2);
            }
        }
        Format::Unknown => out.iter_mut().for_each(|px| *px = Bgr::default()),
    }
}

/// Paint every pixel that is set in the `Gray` mask.
pub fn tint(mask: &Image, out: &mut Image, color: Bgr) {
    for (px, &v) in out.as_bgr_mut().iter_mut().zip(mask.data()) {
        if v != 0 {
            *px = color;
        }
    }
}

/// Draw a vertical line between rows `y0` and `y1` inclusive, clipped to the image.
pub fn vline(out: &mut Image, x: i32, y0: i32, y1: i32, color: Bgr) {
    let Dims { width, height } = out.dims();
    if x < 0 || x as usize >= width {
        return;
    }

    let y0 = y0.max(0) as usize;
    let y1 = y1.min(height as i32 - 1);
    if y1 < 0 {
        return;
    }

    let pixels = out.as_bgr_mut();
    for y in y0..=(y1 as usize) {
        pixels[y * width + x as usize] = color;
    }
}

/// Draw a horizontal line between columns `x0` and `x1` inclusive, clipped to the image.
pub fn hline(out: &mut Image, y: i32, x0: i32, x1: i32, color: Bgr) {
    let Dims { width, height } = out.dims();
    if y < 0 || y as usize >= height {
        return;
    }

    let x0 = x0.max(0) as usize;
    let x1 = x1.min(width as i32 - 1);
    if x1 < 0 {
        return;
    }

    let row = &mut out.as_bgr_mut()[y as usize * width..];
    for px in &mut row[x0..=(x1 as usize)] {
        *px = color;
    }
}

/// Outline a rectangle given by inclusive corners.
pub fn rect(out: &mut Image, min: (i32, i32), max: (i32, i32), color: Bgr) {
    hline(out, min.1, min.0, max.0, color);
    hline(out, max.1, min.0, max.0, color);
    vline(out, min.0, min.1, max.1, color);
    vline(out, max.0, min.1, max.1, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_clipped() {
        let mut out = Image::new(Format::Bgr, Dims::new(4, 3));
        rect(&mut out, (-2, 1), (10, 10), ACCEPTED);
        vline(&mut out, 7, 0, 2, REJECTED);

        let px = out.as_bgr();
        assert_eq!(px[0], Bgr::default());
        assert_eq!(px[4], ACCEPTED);
        assert_eq!(px[7], ACCEPTED);
        assert_eq!(px[8], Bgr::default());
        assert!(!px.contains(&REJECTED));
    }

    #[test]
    fn background_is_dimmed_gray() {
        let src = Image::from_data(Format::Gray, Dims::new(2, 1), &[200, 10]).unwrap();
        let mask = Image::from_data(Format::Gray, Dims::new(2, 1), &[0, 0xFF]).unwrap();
        let mut out = Image::default();
        background(&src, &mut out);
        tint(&mask, &mut out, MASK);
        assert_eq!(out.as_bgr(), &[Bgr::gray(100), MASK]);
    }
}
