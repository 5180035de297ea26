//! # Per-pixel image operations

use crate::error::Error;
use crate::prelude::v1::*;

fn check_same(op: &'static str, src1: &Image, src2: &Image) -> Result<()> {
    src2.expect(src1.format(), src1.dims()).map_err(|e| e.context(op))
}

/// Compute the per-byte absolute difference of two images of the same format and dimensions.
pub fn absdiff(src1: &Image, src2: &Image, dst: &mut Image) -> Result<()> {
    check_same("absdiff", src1, src2)?;
    dst.resize(src1.format(), src1.dims());

    dst.data_mut()
        .iter_mut()
        .zip(src1.data().iter().zip(src2.data()))
        .for_each(|(out, (&a, &b))| *out = a.abs_diff(b));

    Ok(())
}

fn compare(
    op: &'static str,
    src: &Image,
    dst: &mut Image,
    keep: impl Fn(u8) -> bool,
) -> Result<()> {
    if src.format() != Format::Gray {
        return Err(Error::UnsupportedFormat {
            op,
            format: src.format(),
        }
        .into());
    }

    dst.resize(Format::Gray, src.dims());
    dst.data_mut()
        .iter_mut()
        .zip(src.data())
        .for_each(|(out, &v)| *out = if keep(v) { 0xFF } else { 0 });

    Ok(())
}

/// Set pixels strictly greater than `thresh` to `0xFF`, and the rest to `0`.
pub fn greater_than(src: &Image, dst: &mut Image, thresh: u8) -> Result<()> {
    compare("greater_than", src, dst, |v| v > thresh)
}

/// Set pixels strictly less than `thresh` to `0xFF`, and the rest to `0`.
pub fn less_than(src: &Image, dst: &mut Image, thresh: u8) -> Result<()> {
    compare("less_than", src, dst, |v| v < thresh)
}

/// Average the four pixels of a 2x2 block.
#[inline]
fn avg4(a: u8, b: u8, c: u8, d: u8) -> u8 {
    ((a as u16 + b as u16 + c as u16 + d as u16) / 4) as u8
}

/// Halve the image in both dimensions by averaging 2x2 pixel blocks.
///
/// Odd trailing rows and columns are dropped. `Yuv420Sp` images are decimated into packed
/// `Yuv`, where the chroma plane already has the target resolution.
pub fn decimate(src: &Image, dst: &mut Image) -> Result<()> {
    let dims = src.dims();
    let out_dims = dims.halved();
    let data = src.data();

    match src.format() {
        Format::Gray | Format::Bgr | Format::Yuv => {
            let step = src.format().pixel_step();
            let skip = src.skip();
            dst.resize(src.format(), out_dims);
            let out = dst.data_mut();

            for row in 0..out_dims.height {
                let top = &data[(row * 2) * skip..];
                let bottom = &data[(row * 2 + 1) * skip..];
                let out_row = &mut out[row * out_dims.width * step..];

                for col in 0..out_dims.width {
                    for ch in 0..step {
                        let l = col * 2 * step + ch;
                        let r = l + step;
                        out_row[col * step + ch] = avg4(top[l], top[r], bottom[l], bottom[r]);
                    }
                }
            }
        }
        Format::Yuv420Sp => {
            src.format().check_dims(dims)?;
            let width = dims.width;
            let (luma, chroma) = data.split_at(dims.pixels());
            dst.resize(Format::Yuv, out_dims);
            let out = dst.data_mut();

            for row in 0..out_dims.height {
                let top = &luma[(row * 2) * width..];
                let bottom = &luma[(row * 2 + 1) * width..];
                let vu = &chroma[row * width..];

                for col in 0..out_dims.width {
                    let px = &mut out[(row * out_dims.width + col) * 3..][..3];
                    px[0] = avg4(top[col * 2], top[col * 2 + 1], bottom[col * 2], bottom[col * 2 + 1]);
                    px[1] = vu[col * 2 + 1];
                    px[2] = vu[col * 2];
                }
            }
        }
        format => {
            return Err(Error::UnsupportedFormat {
                op: "decimate",
                format,
            }
            .into())
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS_4X2: Dims = Dims::new(4, 2);
    const GRAY_4X2: [u8; 8] = [0x00, 0xFF, 0x00, 0xFF, 0xFF, 0x00, 0xFF, 0x00];

    #[test]
    fn greater_than_is_strict() {
        let src = Image::from_data(Format::Gray, DIMS_4X2, &[0, 18, 19, 20, 255, 19, 1, 100])
            .unwrap();
        let mut dst = Image::default();
        greater_than(&src, &mut dst, 19).unwrap();
        assert_eq!(dst.format(), Format::Gray);
        assert_eq!(dst.dims(), DIMS_4X2);
        assert_eq!(dst.data(), &[0, 0, 0, 0xFF, 0xFF, 0, 0, 0xFF]);
    }

    #[test]
    fn less_than_is_strict() {
        let src = Image::from_data(Format::Gray, DIMS_4X2, &[0, 18, 19, 20, 255, 19, 1, 100])
            .unwrap();
        let mut dst = Image::default();
        less_than(&src, &mut dst, 19).unwrap();
        assert_eq!(dst.data(), &[0xFF, 0xFF, 0, 0, 0, 0, 0xFF, 0]);
    }

    #[test]
    fn thresholding_rejects_color() {
        let src = Image::new(Format::Bgr, DIMS_4X2);
        let mut dst = Image::default();
        assert!(greater_than(&src, &mut dst, 0x95).is_err());
        assert!(less_than(&src, &mut dst, 0x95).is_err());
    }

    #[test]
    fn absdiff_is_symmetric() {
        let a = Image::from_data(Format::Gray, DIMS_4X2, &GRAY_4X2).unwrap();
        let b = Image::from_data(Format::Gray, DIMS_4X2, &[0x10; 8]).unwrap();
        let mut ab = Image::default();
        let mut ba = Image::default();
        absdiff(&a, &b, &mut ab).unwrap();
        absdiff(&b, &a, &mut ba).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.data(), &[0x10, 0xEF, 0x10, 0xEF, 0xEF, 0x10, 0xEF, 0x10]);
    }

    #[test]
    fn absdiff_rejects_mismatch() {
        let a = Image::new(Format::Gray, DIMS_4X2);
        let b = Image::new(Format::Gray, Dims::new(2, 2));
        let c = Image::new(Format::Bgr, DIMS_4X2);
        let mut dst = Image::default();
        assert!(absdiff(&a, &b, &mut dst).is_err());
        assert!(absdiff(&a, &c, &mut dst).is_err());
    }

    #[test]
    fn decimate_gray() {
        let src = Image::from_data(Format::Gray, DIMS_4X2, &GRAY_4X2).unwrap();
        let mut dst = Image::default();
        decimate(&src, &mut dst).unwrap();
        assert_eq!(dst.format(), Format::Gray);
        assert_eq!(dst.dims(), Dims::new(2, 1));
        assert_eq!(dst.data(), &[0x7F, 0x7F]);
    }

    #[test]
    fn decimate_bgr_per_channel() {
        let mut src = Image::new(Format::Bgr, Dims::new(2, 2));
        src.as_bgr_mut()
            .copy_from_slice(&[Bgr::new(4, 0, 8), Bgr::new(8, 0, 8), Bgr::new(0, 4, 8), Bgr::new(0, 4, 8)]);
        let mut dst = Image::default();
        decimate(&src, &mut dst).unwrap();
        assert_eq!(dst.dims(), Dims::new(1, 1));
        assert_eq!(dst.as_bgr(), &[Bgr::new(3, 2, 8)]);
    }

    #[test]
    fn decimate_yuv420sp_to_yuv() {
        // 4x4 NV21 needs 24 bytes
        let err = Image::from_data(Format::Yuv420Sp, Dims::new(4, 4), &[0; 16]).unwrap_err();
        assert!(err.to_string().contains("24 bytes"));

        let mut data = vec![0u8; 24];
        data[..16].iter_mut().for_each(|b| *b = 40);
        data[16..].copy_from_slice(&[200, 100, 201, 101, 202, 102, 203, 103]);
        let src = Image::from_data(Format::Yuv420Sp, Dims::new(4, 4), &data).unwrap();
        let mut dst = Image::default();
        decimate(&src, &mut dst).unwrap();
        assert_eq!(dst.format(), Format::Yuv);
        assert_eq!(dst.dims(), Dims::new(2, 2));
        assert_eq!(dst.data(), &[40, 100, 200, 40, 101, 201, 40, 102, 202, 40, 103, 203]);
    }
}
