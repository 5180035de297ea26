//! Decimation pyramid and per-frame motion masks.

use crate::error::Error;
use crate::prelude::v1::*;
use crate::processing::decimate;
use log::info;

/// Level that is only kept as a decimation cache.
struct IgnoredLevel {
    image: Image,
}

/// Level that strips are detected in.
pub struct Level {
    /// Source images, newest first.
    images: [Image; 3],
    /// Changes between the newest and the previous image.
    pub diff1: Image,
    /// `diff1` of the previous frame.
    pub diff2: Image,
    /// Mask that strips are detected in.
    pub preprocessed: Image,
    /// Changes between the newest image and the one from two frames before.
    span: Image,
    /// Number of source pixels per level pixel, in each direction.
    pub step: usize,
    /// Number of strips detected in `preprocessed` for the latest frame.
    pub num_strips: usize,
}

impl Level {
    fn new(format: Format, dims: Dims, step: usize) -> Self {
        let image = Image::new(format, dims);
        let mask = Image::new(Format::Gray, dims);
        Self {
            images: [image.clone(), image.clone(), image],
            diff1: mask.clone(),
            diff2: mask.clone(),
            preprocessed: mask.clone(),
            span: mask,
            step,
            num_strips: 0,
        }
    }

    /// Newest source image at level resolution.
    pub fn image1(&self) -> &Image {
        &self.images[0]
    }

    pub fn dims(&self) -> Dims {
        self.preprocessed.dims()
    }

    /// Rotate the history so that the oldest image slot becomes the newest.
    fn age(&mut self) {
        self.images.rotate_right(1);
        std::mem::swap(&mut self.diff1, &mut self.diff2);
    }

    /// Compute the masks of the current frame.
    fn update_masks(
        &mut self,
        config: &DiffConfig,
        differentiator: &mut Differentiator,
        first_frame: bool,
    ) -> Result<()> {
        if first_frame {
            let [image1, image2, image3] = &mut self.images;
            image2.clone_from(image1);
            image3.clone_from(image1);
            self.diff2.resize(Format::Gray, image1.dims());
            self.diff2.fill(0);
        }

        let [image1, image2, image3] = &self.images;
        differentiator.apply(config, image1, image2, &mut self.diff1, 0)?;
        differentiator.apply(config, image1, image3, &mut self.span, 0)?;

        self.preprocess();
        Ok(())
    }

    /// Keep the two frame changes that either single transition confirms.
    ///
    /// The result is a subset of `span`.
    fn preprocess(&mut self) {
        self.preprocessed.resize(Format::Gray, self.span.dims());

        let confirmed = self.diff1.data().iter().zip(self.diff2.data());
        self.preprocessed
            .data_mut()
            .iter_mut()
            .zip(self.span.data().iter().zip(confirmed))
            .for_each(|(out, (&span, (&d1, &d2)))| *out = span & (d1 | d2));
    }
}

/// Cascade of decimated frames.
///
/// Frames are halved until they are no taller than the configured height. Only the coarsest level
/// keeps history and motion masks, the finer ones hold only their current image.
pub struct Pyramid {
    ignored: Vec<IgnoredLevel>,
    level: Level,
    decimations: usize,
}

impl Pyramid {
    /// Plan the levels needed to process frames of the given format and dimensions.
    ///
    /// `Yuv420Sp` frames are always decimated at least once, which turns them into packed `Yuv`.
    pub fn new(format: Format, dims: Dims, max_image_height: usize) -> Result<Self> {
        if format == Format::Unknown {
            return Err(Error::UnsupportedFormat {
                op: "pyramid",
                format,
            }
            .into());
        }

        if dims.pixels() == 0 {
            return Err(anyhow!("cannot process empty frames"));
        }

        format.check_dims(dims)?;

        let mut decimations = 0;
        let mut level_dims = dims;

        while level_dims.height > max_image_height
            || (format == Format::Yuv420Sp && decimations == 0)
        {
            level_dims = level_dims.halved();
            decimations += 1;
        }

        if level_dims.pixels() == 0 {
            return Err(anyhow!(
                "frames of {}x{} become empty when decimated to {} rows",
                dims.width,
                dims.height,
                max_image_height
            ));
        }

        let level_format = match format {
            Format::Yuv420Sp => Format::Yuv,
            format => format,
        };

        let step = 1 << decimations;

        info!(
            "pyramid: {}x{} {:?} -> {}x{} {:?}, step {}",
            dims.width,
            dims.height,
            format,
            level_dims.width,
            level_dims.height,
            level_format,
            step
        );

        Ok(Self {
            ignored: (1..decimations)
                .map(|_| IgnoredLevel {
                    image: Image::default(),
                })
                .collect(),
            level: Level::new(level_format, level_dims, step),
            decimations,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    /// Decimate the next frame and refresh the masks of the processed level.
    ///
    /// # Arguments
    ///
    /// * `src` - frame in the format and dimensions the pyramid was planned for.
    /// * `config` - thresholds for the differentiator.
    /// * `differentiator` - differentiator used for all masks.
    /// * `first_frame` - whether this is the first frame of the stream, which has no history.
    pub fn update(
        &mut self,
        src: &Image,
        config: &DiffConfig,
        differentiator: &mut Differentiator,
        first_frame: bool,
    ) -> Result<()> {
        for i in 0..self.ignored.len() {
            let (done, rest) = self.ignored.split_at_mut(i);
            let input = done.last().map(|l| &l.image).unwrap_or(src);
            decimate(input, &mut rest[0].image)?;
        }

        self.level.age();

        let input = self.ignored.last().map(|l| &l.image).unwrap_or(src);
        let newest = &mut self.level.images[0];

        if self.decimations == 0 {
            newest.clone_from(input);
        } else {
            decimate(input, newest)?;
        }

        self.level.update_masks(config, differentiator, first_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(dims: Dims, value: u8, blob: Option<(usize, usize)>) -> Image {
        let mut image = Image::new(Format::Gray, dims);
        image.fill(value);
        if let Some((x, y)) = blob {
            image.data_mut()[y * dims.width + x] = value.wrapping_add(100);
        }
        image
    }

    #[test]
    fn small_frames_are_not_decimated() {
        let pyramid = Pyramid::new(Format::Gray, Dims::new(200, 100), 300).unwrap();
        assert_eq!(pyramid.level().step, 1);
        assert_eq!(pyramid.level().dims(), Dims::new(200, 100));
    }

    #[test]
    fn large_frames_are_halved_until_short_enough() {
        let pyramid = Pyramid::new(Format::Bgr, Dims::new(1280, 720), 300).unwrap();
        assert_eq!(pyramid.level().step, 4);
        assert_eq!(pyramid.level().dims(), Dims::new(320, 180));
        assert_eq!(pyramid.ignored.len(), 1);
        assert_eq!(pyramid.level().image1().format(), Format::Bgr);
    }

    #[test]
    fn yuv420sp_is_always_decimated() {
        let pyramid = Pyramid::new(Format::Yuv420Sp, Dims::new(64, 48), 300).unwrap();
        assert_eq!(pyramid.level().step, 2);
        assert_eq!(pyramid.level().image1().format(), Format::Yuv);
        assert!(Pyramid::new(Format::Yuv420Sp, Dims::new(63, 48), 300).is_err());
    }

    #[test]
    fn degenerate_frames_are_rejected() {
        assert!(Pyramid::new(Format::Gray, Dims::new(0, 10), 300).is_err());
        assert!(Pyramid::new(Format::Unknown, Dims::new(10, 10), 300).is_err());
        assert!(Pyramid::new(Format::Gray, Dims::new(1, 1000), 2).is_err());
    }

    #[test]
    fn first_frame_has_empty_masks() {
        let dims = Dims::new(8, 4);
        let mut pyramid = Pyramid::new(Format::Gray, dims, 300).unwrap();
        let mut diff = Differentiator::new();
        let config = DiffConfig::default();

        pyramid
            .update(&frame(dims, 50, Some((3, 2))), &config, &mut diff, true)
            .unwrap();

        let level = pyramid.level();
        assert_eq!(level.image1(), &level.images[2]);
        for mask in [&level.diff1, &level.diff2, &level.preprocessed] {
            assert_eq!(mask.dims(), dims);
            assert!(mask.data().iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn history_ages_every_frame() {
        let dims = Dims::new(8, 4);
        let mut pyramid = Pyramid::new(Format::Gray, dims, 300).unwrap();
        let mut diff = Differentiator::new();
        let config = DiffConfig::default();

        let frames = [
            frame(dims, 50, Some((1, 1))),
            frame(dims, 50, Some((3, 1))),
            frame(dims, 50, Some((5, 1))),
        ];

        for (i, f) in frames.iter().enumerate() {
            pyramid.update(f, &config, &mut diff, i == 0).unwrap();
        }

        let level = pyramid.level();
        assert_eq!(level.image1(), &frames[2]);
        assert_eq!(&level.images[1], &frames[1]);
        assert_eq!(&level.images[2], &frames[0]);

        let set = |mask: &Image| -> Vec<usize> {
            (0..mask.data().len())
                .filter(|&i| mask.data()[i] != 0)
                .collect()
        };

        assert_eq!(set(&level.diff1), vec![8 + 3, 8 + 5]);
        assert_eq!(set(&level.diff2), vec![8 + 1, 8 + 3]);
        assert_eq!(set(&level.preprocessed), vec![8 + 1, 8 + 5]);
    }

    #[test]
    fn preprocessed_never_grows() {
        let dims = Dims::new(16, 8);
        let mut pyramid = Pyramid::new(Format::Gray, dims, 300).unwrap();
        let mut diff = Differentiator::new();
        let config = DiffConfig::default();

        for i in 0..6 {
            let mut f = frame(dims, 40, None);
            f.data_mut()
                .iter_mut()
                .enumerate()
                .for_each(|(p, v)| *v = ((p * 31 + i * 57) % 256) as u8);
            pyramid.update(&f, &config, &mut diff, i == 0).unwrap();

            let level = pyramid.level();
            assert!(level
                .preprocessed
                .data()
                .iter()
                .zip(level.span.data())
                .all(|(&p, &s)| p & !s == 0));
        }
    }
}
