//! # Strip based fast moving object detector
//!
//! Every frame goes through the following stages:
//!
//! 1. The frame is decimated until it is short enough, and the coarsest level keeps the last
//!    three images together with the masks of the last two transitions.
//! 2. Vertical runs of changed pixels ("strips") are extracted from the preprocessed mask.
//! 3. Strips that touch are linked into components, components close to each other are linked
//!    into trajectories.
//! 4. The largest trajectory is checked for consistent motion across both transitions.

mod classify;
pub(crate) mod levels;
mod strips;
mod trajectories;
mod visualize;

pub use classify::{Rejection, Verdict};

use crate::prelude::v1::*;
use classify::Candidate;
use levels::Pyramid;
use log::{debug, info, trace};
use strips::{Component, Strip};
use trajectories::{LinkLimits, Trajectory};

/// Strip based detector.
pub struct Explorer {
    config: Config,
    format: Format,
    dims: Dims,
    pyramid: Pyramid,
    differentiator: Differentiator,
    strips: Vec<Strip>,
    components: Vec<Component>,
    trajectories: Vec<Trajectory>,
    /// Verdict on the largest trajectory, which is first after ranking.
    verdict: Option<Verdict>,
    object: Object,
    visualized: Image,
    visualized_valid: bool,
    frame_num: usize,
}

impl Explorer {
    /// Create a detector for frames of the given format and dimensions.
    ///
    /// Fails if the format cannot be processed, or if the frames are too small to be decimated to
    /// `max_image_height`.
    pub fn new(config: &Config, format: Format, dims: Dims) -> Result<Self> {
        config.validate()?;
        let pyramid = Pyramid::new(format, dims, config.max_image_height)?;

        info!(
            "explorer: {}x{} {:?}, processing at step {}",
            dims.width,
            dims.height,
            format,
            pyramid.level().step
        );

        Ok(Self {
            config: config.clone(),
            format,
            dims,
            pyramid,
            differentiator: Differentiator::new(),
            strips: vec![],
            components: vec![],
            trajectories: vec![],
            verdict: None,
            object: Object::default(),
            visualized: Image::default(),
            visualized_valid: false,
            frame_num: 0,
        })
    }

    /// Number of frames supplied so far.
    pub fn frame_num(&self) -> usize {
        self.frame_num
    }

    /// Verdict on the trajectory evaluated in the latest frame.
    ///
    /// `None` if no trajectory had enough strips to be evaluated.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    fn find_strips(&mut self) {
        let level = self.pyramid.level();
        self.strips.clear();
        strips::find_strips(&level.preprocessed, level.step, &mut self.strips);
        self.pyramid.level_mut().num_strips = self.strips.len();
    }

    fn find_components(&mut self) {
        let step = self.pyramid.level().step;
        self.components.clear();
        strips::find_components(&mut self.strips, step, &mut self.components);
    }

    fn find_trajectories(&mut self) {
        let level = self.pyramid.level();
        let Dims { width, height } = level.dims();
        let step = level.step as f32;

        let limits = LinkLimits {
            min_strips: self.config.min_strips_in_component,
            max_gap_x: (self.config.max_gap_x * width as f32 * step) as i32,
            max_gap_y: (self.config.max_gap_y * height as f32 * step) as i32,
        };

        self.trajectories.clear();
        trajectories::find_trajectories(
            &self.strips,
            &mut self.components,
            &limits,
            &mut self.trajectories,
        );
    }

    fn find_object(&mut self) {
        trajectories::rank(&mut self.trajectories);
        self.verdict = None;
        self.object.clear();

        // Only the largest trajectory is considered.
        let traj = match self.trajectories.first() {
            Some(traj) if traj.num_strips >= self.config.min_strips_in_object => traj,
            _ => return,
        };

        let level = self.pyramid.level();
        let candidate = Candidate {
            traj,
            components: &self.components,
            strips: &self.strips,
        };

        let verdict = candidate.classify(
            &level.diff1,
            &level.diff2,
            level.step,
            self.config.min_motion,
        );

        trace!(
            "frame {}: trajectory of {} strips in {} components: {:?}",
            self.frame_num,
            traj.num_strips,
            candidate.num_components(),
            verdict
        );

        if verdict == Verdict::Accepted {
            self.object.bounds = candidate.bounds(level.step);
            candidate.points(
                &level.preprocessed,
                level.step,
                self.config.point_set_source_resolution,
                &mut self.object.points,
            );
        }

        self.verdict = Some(verdict);
    }

    fn visualize(&mut self) {
        let level = self.pyramid.level();
        let candidate = self.trajectories.first().map(|traj| Candidate {
            traj,
            components: &self.components,
            strips: &self.strips,
        });

        let (accepted, rejected) = match (self.verdict, candidate.as_ref()) {
            (Some(Verdict::Accepted), Some(c)) => (Some((c, &self.object.bounds)), None),
            (Some(Verdict::Rejected(_)), Some(c)) => (None, Some(c)),
            _ => (None, None),
        };

        visualize::render(level, accepted, rejected, &mut self.visualized);
    }
}

impl Algorithm for Explorer {
    fn set_input(&mut self, frame: &Image) -> Result<()> {
        frame.expect(self.format, self.dims)?;

        let first_frame = self.frame_num == 0;
        self.frame_num += 1;
        self.visualized_valid = false;

        self.pyramid.update(
            frame,
            &self.config.diff,
            &mut self.differentiator,
            first_frame,
        )?;

        self.find_strips();
        self.find_components();
        self.find_trajectories();
        self.find_object();

        debug!(
            "frame {}: {} strips, {} components, {} trajectories, {:?}",
            self.frame_num,
            self.pyramid.level().num_strips,
            self.components.len(),
            self.trajectories.len(),
            self.verdict
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
