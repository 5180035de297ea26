//! # Motion mask computation
//!
//! The differentiator compares two images of the same format and produces a single channel mask
//! where every pixel is either `0x00` (unchanged) or `0xFF` (changed).

use crate::error::Error;
use crate::prelude::v1::*;
use crate::processing::{absdiff, greater_than};
use rayon::prelude::*;

/// Number of pixels in one parallel work item of the three channel reduction.
const BLOCK_PIXELS: usize = 4096;

/// Computes thresholded difference images.
///
/// The struct caches the intermediate absolute difference image between calls.
#[derive(Default)]
pub struct Differentiator {
    diff: Image,
}

impl Differentiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the motion mask of `src1` and `src2` into `dst`.
    ///
    /// # Arguments
    ///
    /// * `config` - per-format thresholds.
    /// * `src1` - first image.
    /// * `src2` - second image, of the same format and dimensions as `src1`.
    /// * `dst` - output `Gray` mask.
    /// * `adjust` - value added to the threshold.
    pub fn apply(
        &mut self,
        config: &DiffConfig,
        src1: &Image,
        src2: &Image,
        dst: &mut Image,
        adjust: i32,
    ) -> Result<()> {
        let format = src1.format();
        let thresh = match format {
            Format::Gray => config.thresh_gray,
            Format::Bgr => config.thresh_bgr,
            Format::Yuv => config.thresh_yuv,
            format => {
                return Err(Error::UnsupportedFormat {
                    op: "differentiator",
                    format,
                }
                .into())
            }
        } as i32
            + adjust;

        absdiff(src1, src2, &mut self.diff)?;

        if format == Format::Gray {
            greater_than(&self.diff, dst, thresh.clamp(0, 255) as u8)
        } else {
            add_and_thresh(&self.diff, dst, thresh)
        }
    }
}

fn add_and_thresh_serial(src: &[u8], dst: &mut [u8], thresh: i32) {
    for (out, px) in dst.iter_mut().zip(src.chunks_exact(3)) {
        let sum = px[0] as i32 + px[1] as i32 + px[2] as i32;
        *out = if sum > thresh { 0xFF } else { 0 };
    }
}

/// Sum the three channels of every pixel and compare the sum against `thresh`.
///
/// Whole blocks of pixels are processed in parallel, the remainder serially. The result does
/// not depend on the number of threads.
pub fn add_and_thresh(src: &Image, dst: &mut Image, thresh: i32) -> Result<()> {
    if src.format().pixel_step() != 3 {
        return Err(Error::UnsupportedFormat {
            op: "add_and_thresh",
            format: src.format(),
        }
        .into());
    }

    let pixels = src.dims().pixels();
    let split = (pixels / BLOCK_PIXELS) * BLOCK_PIXELS;
    dst.resize(Format::Gray, src.dims());

    let (src_blocks, src_tail) = src.data().split_at(split * 3);
    let (dst_blocks, dst_tail) = dst.data_mut().split_at_mut(split);

    dst_blocks
        .par_chunks_mut(BLOCK_PIXELS)
        .zip(src_blocks.par_chunks(BLOCK_PIXELS * 3))
        .for_each(|(out, px)| add_and_thresh_serial(px, out, thresh));

    add_and_thresh_serial(src_tail, dst_tail, thresh);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random(format: Format, dims: Dims) -> Image {
        let mut image = Image::new(format, dims);
        rand::thread_rng().fill(image.data_mut());
        image
    }

    #[test]
    fn identical_inputs_give_empty_mask() {
        let config = DiffConfig::default();
        let mut diff = Differentiator::new();
        let dims = Dims::new(67, 91);

        for format in [Format::Gray, Format::Bgr, Format::Yuv] {
            let src = random(format, dims);
            let mut dst = Image::default();
            diff.apply(&config, &src, &src.clone(), &mut dst, 0).unwrap();
            assert_eq!(dst.format(), Format::Gray);
            assert_eq!(dst.dims(), dims);
            assert!(dst.data().iter().all(|&v| v == 0), "{:?}", format);
        }
    }

    #[test]
    fn single_changed_pixel() {
        let dims = Dims::new(4, 2);
        let a = Image::from_data(Format::Gray, dims, &[10, 10, 10, 10, 10, 10, 10, 10]).unwrap();
        let b = Image::from_data(Format::Gray, dims, &[10, 10, 10, 10, 10, 40, 10, 10]).unwrap();
        let mut dst = Image::default();
        Differentiator::new()
            .apply(&DiffConfig::default(), &a, &b, &mut dst, 0)
            .unwrap();
        assert_eq!(dst.data(), &[0, 0, 0, 0, 0, 0xFF, 0, 0]);
    }

    #[test]
    fn gray_threshold_is_strict() {
        let config = DiffConfig::default();
        let dims = Dims::new(2, 1);
        let a = Image::from_data(Format::Gray, dims, &[100, 100]).unwrap();
        let b = Image::from_data(Format::Gray, dims, &[119, 120]).unwrap();
        let mut dst = Image::default();
        let mut diff = Differentiator::new();

        diff.apply(&config, &a, &b, &mut dst, 0).unwrap();
        assert_eq!(dst.data(), &[0, 0xFF]);

        diff.apply(&config, &a, &b, &mut dst, 1).unwrap();
        assert_eq!(dst.data(), &[0, 0]);
    }

    #[test]
    fn color_threshold_uses_channel_sum() {
        let config = DiffConfig::default();
        let dims = Dims::new(2, 1);
        let a = Image::from_data(Format::Bgr, dims, &[0, 0, 0, 0, 0, 0]).unwrap();
        // 8 + 8 + 7 = 23 is not above the threshold, 8 + 8 + 8 = 24 is
        let b = Image::from_data(Format::Bgr, dims, &[8, 8, 7, 8, 8, 8]).unwrap();
        let mut dst = Image::default();
        Differentiator::new()
            .apply(&config, &a, &b, &mut dst, 0)
            .unwrap();
        assert_eq!(dst.data(), &[0, 0xFF]);
    }

    #[test]
    fn planar_chroma_is_unsupported() {
        let src = Image::new(Format::Yuv420Sp, Dims::new(4, 4));
        let mut dst = Image::default();
        let err = Differentiator::new()
            .apply(&DiffConfig::default(), &src, &src.clone(), &mut dst, 0)
            .unwrap_err();
        assert!(matches!(
            Error::kind_of(&err),
            Some(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn parallel_result_is_independent_of_threads() {
        // 3 whole blocks and a partial one
        let dims = Dims::new(BLOCK_PIXELS / 16, 16 * 3 + 5);
        let src = random(Format::Bgr, dims);

        let mut expected = vec![0; dims.pixels()];
        add_and_thresh_serial(src.data(), &mut expected, 200);

        for threads in [1, 2, 5] {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let mut dst = Image::default();
            pool.install(|| add_and_thresh(&src, &mut dst, 200)).unwrap();
            assert_eq!(dst.data(), &expected[..]);
        }
    }
}
