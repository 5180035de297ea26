//! Block flood fill detector.

use crate::explorer::levels::Pyramid;
use crate::prelude::v1::*;
use crate::visualize::{self, ACCEPTED, BOUNDS, MASK};
use log::{debug, info};
use nalgebra as na;

/// Block subdivision based motion detector.
///
/// This detector splits up the motion mask of the latest transition into square blocks, and marks
/// blocks where at least `block_min_fill` of the pixels changed. The largest 8-connected region of
/// marked blocks is reported if it covers at least `block_min_area` of the frame.
///
/// Unlike [`Explorer`](crate::explorer::Explorer), this detector does not look for streaks and
/// reports any sufficiently large motion. It serves as a baseline.
pub struct BlockDetector {
    format: Format,
    dims: Dims,
    diff: DiffConfig,
    pyramid: Pyramid,
    differentiator: Differentiator,
    block_size: usize,
    min_fill: f32,
    min_area: f32,
    /// Dimensions of the block grid.
    grid: Dims,
    map: Vec<bool>,
    /// Blocks of the largest region.
    region: Vec<(usize, usize)>,
    object: Object,
    visualized: Image,
    visualized_valid: bool,
    frame_num: usize,
}

impl BlockDetector {
    pub fn new(config: &Config, format: Format, dims: Dims) -> Result<Self> {
        config.validate()?;
        let pyramid = Pyramid::new(format, dims, config.max_image_height)?;
        let level_dims = pyramid.level().dims();
        let block_size = config.block_size;
        let grid = Dims::new(
            (level_dims.width + block_size - 1) / block_size,
            (level_dims.height + block_size - 1) / block_size,
        );

        info!(
            "block detector: {}x{} grid of {}px blocks",
            grid.width, grid.height, block_size
        );

        Ok(Self {
            format,
            dims,
            diff: config.diff.clone(),
            pyramid,
            differentiator: Differentiator::new(),
            block_size,
            min_fill: config.block_min_fill,
            min_area: config.block_min_area,
            grid,
            map: vec![false; grid.pixels()],
            region: vec![],
            object: Object::default(),
            visualized: Image::default(),
            visualized_valid: false,
            frame_num: 0,
        })
    }

    /// Mark blocks with enough changed pixels.
    fn fill_map(&mut self) {
        let mask = &self.pyramid.level().diff1;
        let Dims { width, height } = mask.dims();
        let data = mask.data();

        for by in 0..self.grid.height {
            for bx in 0..self.grid.width {
                let xs = (bx * self.block_size)..((bx + 1) * self.block_size).min(width);
                let ys = (by * self.block_size)..((by + 1) * self.block_size).min(height);
                let total = xs.len() * ys.len();

                let set = ys
                    .flat_map(|y| xs.clone().map(move |x| y * width + x))
                    .filter(|&i| data[i] != 0)
                    .count();

                self.map[by * self.grid.width + bx] =
                    set > 0 && set as f32 >= self.min_fill * total as f32;
            }
        }
    }

    /// Flood fill compute the biggest region of marked blocks.
    fn find_region(&mut self) {
        let Dims { width, height } = self.grid;
        let map = &mut self.map;
        let mut region = vec![];
        self.region.clear();

        for y in 0..height {
            for x in 0..width {
                if !map[y * width + x] {
                    continue;
                }

                map[y * width + x] = false;
                region.clear();
                let mut to_fill = vec![(x, y); 1];

                while let Some((x, y)) = to_fill.pop() {
                    region.push((x, y));

                    let neighbor_offs = (-1..=1).flat_map(|x| (-1..=1).map(move |y| (x, y)));

                    // Go through each neighbor and add any unvisited marked entries.
                    for (x, y) in neighbor_offs
                        .map(|(ox, oy)| (x as isize + ox, y as isize + oy))
                        .filter(|&(ox, oy)| {
                            (0..width as isize).contains(&ox) && (0..height as isize).contains(&oy)
                        })
                        .map(|(x, y)| (x as usize, y as usize))
                    {
                        if map[y * width + x] {
                            to_fill.push((x, y));
                            map[y * width + x] = false;
                        }
                    }
                }

                if region.len() > self.region.len() {
                    std::mem::swap(&mut region, &mut self.region);
                }
            }
        }
    }

    fn find_object(&mut self) {
        self.object.clear();

        let area = self.region.len() as f32 / self.grid.pixels() as f32;
        if self.region.is_empty() || area < self.min_area {
            return;
        }

        let level = self.pyramid.level();
        let Dims { width, height } = level.dims();
        let (step, size) = (level.step, self.block_size);

        let (min, max) = self.region.iter().fold(
            ((usize::MAX, usize::MAX), (0, 0)),
            |(min, max), &(x, y)| ((min.0.min(x), min.1.min(y)), (max.0.max(x), max.1.max(y))),
        );

        // Level pixel range covered by the blocks, converted to source pixels.
        let to_source = |v: usize| (v * step) as i32;
        self.object.bounds = Bounds::new(
            na::Point2::new(to_source(min.0 * size), to_source(min.1 * size)),
            na::Point2::new(
                to_source(((max.0 + 1) * size).min(width)) - 1,
                to_source(((max.1 + 1) * size).min(height)) - 1,
            ),
        );

        let centre = |v: usize, limit: usize| {
            let end = ((v + 1) * size).min(limit);
            (to_source(v * size) + to_source(end)) / 2
        };

        self.object.points.extend(
            self.region
                .iter()
                .map(|&(x, y)| na::Point2::new(centre(x, width), centre(y, height))),
        );
        self.object.points.sort_unstable_by_key(|p| (p.x, p.y));
    }

    fn visualize(&mut self) {
        let level = self.pyramid.level();
        visualize::background(level.image1(), &mut self.visualized);
        visualize::tint(&level.diff1, &mut self.visualized, MASK);

        if !self.object.is_detected() {
            return;
        }

        let Dims { width, height } = level.dims();
        let size = self.block_size as i32;
        for &(x, y) in &self.region {
            let (x, y) = (x as i32 * size, y as i32 * size);
            visualize::rect(&mut self.visualized, (x, y), (x + size - 1, y + size - 1), ACCEPTED);
        }

        let step = level.step as i32;
        let bounds = &self.object.bounds;
        visualize::rect(
            &mut self.visualized,
            (bounds.min.x / step, bounds.min.y / step),
            (
                (bounds.max.x / step).min(width as i32 - 1),
                (bounds.max.y / step).min(height as i32 - 1),
            ),
            BOUNDS,
        );
    }
}

impl Algorithm for BlockDetector {
    fn set_input(&mut self, frame: &Image) -> Result<()> {
        frame.expect(self.format, self.dims)?;

        let first_frame = self.frame_num == 0;
        self.frame_num += 1;
        self.visualized_valid = false;

        self.pyramid
            .update(frame, &self.diff, &mut self.differentiator, first_frame)?;

        self.fill_map();
        self.find_region();
        self.find_object();

        debug!(
            "frame {}: largest region of {} blocks, detected: {}",
            self.frame_num,
            self.region.len(),
            self.object.is_detected()
        );

        Ok(())
    }

    fn get_debug_image(&mut self) -> &Image {
        if !self.visualized_valid {
            self.visualize();
            self.visualized_valid = true;
        }

        &self.visualized
    }

    fn get_object(&self) -> &Object {
        &self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: Dims = Dims::new(64, 32);

    fn frame(blob: Option<(usize, usize)>) -> Image {
        let mut image = Image::new(Format::Gray, DIMS);
        image.fill(30);
        if let Some((x0, y0)) = blob {
            for y in y0..y0 + 8 {
                for x in x0..x0 + 12 {
                    image.data_mut()[y * DIMS.width + x] = 220;
                }
            }
        }
        image
    }

    fn detector() -> BlockDetector {
        let config = Config {
            name: "block-v1".into(),
            block_size: 4,
            ..Default::default()
        };
        BlockDetector::new(&config, Format::Gray, DIMS).unwrap()
    }

    #[test]
    fn static_frames_give_nothing() {
        let mut detector = detector();
        for _ in 0..3 {
            detector.set_input(&frame(None)).unwrap();
            assert!(!detector.get_object().is_detected());
        }
    }

    #[test]
    fn appearing_blob_is_boxed() {
        let mut detector = detector();
        detector.set_input(&frame(None)).unwrap();
        assert!(!detector.get_object().is_detected());

        detector.set_input(&frame(Some((8, 12)))).unwrap();
        let object = detector.get_object();
        assert!(object.is_detected());
        assert_eq!(object.bounds.min, na::Point2::new(8, 12));
        assert_eq!(object.bounds.max, na::Point2::new(19, 19));
        assert_eq!(object.points.len(), 3 * 2);
        assert_eq!(object.points[0], na::Point2::new(10, 14));

        let image = detector.get_debug_image();
        assert_eq!(image.dims(), DIMS);
        assert_eq!(image.as_bgr()[12 * DIMS.width + 8], BOUNDS);
    }

    #[test]
    fn largest_region_wins() {
        let mut detector = detector();
        detector.set_input(&frame(None)).unwrap();

        let mut next = frame(Some((40, 4)));
        // A second, single block change far away.
        for y in 24..28 {
            for x in 4..8 {
                next.data_mut()[y * DIMS.width + x] = 220;
            }
        }

        detector.set_input(&next).unwrap();
        let object = detector.get_object();
        assert_eq!(object.bounds.min, na::Point2::new(40, 4));
        assert_eq!(detector.region.len(), 6);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let config = Config {
            block_size: 0,
            ..Default::default()
        };
        let err = BlockDetector::new(&config, Format::Gray, DIMS).err().unwrap();
        assert!(matches!(
            crate::error::Error::kind_of(&err),
            Some(crate::error::Error::InvalidConfig { property, .. }) if property == "block_size"
        ));
    }

    #[test]
    fn area_threshold_applies() {
        let config = Config {
            block_size: 4,
            block_min_area: 0.5,
            ..Default::default()
        };
        let mut detector = BlockDetector::new(&config, Format::Gray, DIMS).unwrap();
        detector.set_input(&frame(None)).unwrap();
        detector.set_input(&frame(Some((8, 12)))).unwrap();
        assert!(!detector.get_object().is_detected());
    }
}
