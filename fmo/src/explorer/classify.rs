//! Deciding whether a trajectory is a fast moving object.

use super::strips::{Component, Strip};
use super::trajectories::{components_of, strips_of, Trajectory};
use crate::prelude::v1::*;
use nalgebra as na;

/// Reason for rejecting a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// One of the two transitions has no strips of the trajectory.
    NoMotion,
    /// Neither transition starts at the leftmost strip.
    Orientation,
    /// The later transition does not end at the rightmost strip.
    RightEdge,
    /// The transitions do not cover enough of the trajectory.
    TooShort,
}

/// Outcome of classifying a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

/// Trajectory together with the strip storage it refers to.
#[derive(Clone, Copy)]
pub struct Candidate<'a> {
    pub traj: &'a Trajectory,
    pub components: &'a [Component],
    pub strips: &'a [Strip],
}

impl<'a> Candidate<'a> {
    pub fn strips(&self) -> impl Iterator<Item = &'a Strip> + 'a {
        strips_of(self.traj, self.components, self.strips)
    }

    fn first_strip(&self) -> &'a Strip {
        &self.strips[self.components[self.traj.first].first]
    }

    fn last_strip(&self) -> &'a Strip {
        &self.strips[self.components[self.traj.last].last]
    }

    /// Horizontal range of strips whose centre is set in a level mask.
    fn range_in(&self, mask: &Image, step: usize) -> Option<(i32, i32)> {
        let width = mask.dims().width;
        let data = mask.data();

        self.strips()
            .filter(|strip| {
                let (col, row) = strip.project(step);
                data[row * width + col] != 0
            })
            .fold(None, |range, strip| match range {
                None => Some((strip.x, strip.x)),
                Some((first, last)) => Some((first.min(strip.x), last.max(strip.x))),
            })
    }

    /// Check that the two most recent transitions show consistent motion along the trajectory.
    ///
    /// One transition must cover the left end of the trajectory and the other the right end, and
    /// each must leave a `min_motion` share of the trajectory length uncovered on the far side.
    ///
    /// # Arguments
    ///
    /// * `diff1` - newest transition mask, at level resolution.
    /// * `diff2` - previous transition mask.
    /// * `step` - source pixels per level pixel.
    /// * `min_motion` - required share of the trajectory length.
    pub fn classify(&self, diff1: &Image, diff2: &Image, step: usize, min_motion: f32) -> Verdict {
        let ranges = (self.range_in(diff1, step), self.range_in(diff2, step));
        let (mut range1, mut range2) = match ranges {
            (Some(r1), Some(r2)) => (r1, r2),
            _ => return Verdict::Rejected(Rejection::NoMotion),
        };

        let x_min = self.first_strip().x;
        let x_max = self.last_strip().x;

        // Motion to the left is handled by swapping the transitions.
        if range1.0 != x_min {
            std::mem::swap(&mut range1, &mut range2);
        }

        if range1.0 != x_min {
            return Verdict::Rejected(Rejection::Orientation);
        }

        if range2.1 != x_max {
            return Verdict::Rejected(Rejection::RightEdge);
        }

        let min_motion = (min_motion * (x_max - x_min) as f32) as i32;

        if x_max - range1.1 < min_motion || range2.0 - x_min < min_motion {
            return Verdict::Rejected(Rejection::TooShort);
        }

        Verdict::Accepted
    }

    /// Bounding box in source pixels, with inclusive corners.
    ///
    /// The vertical extent covers every strip, the horizontal one spans from the first strip of the
    /// first component to the last strip of the last component.
    pub fn bounds(&self, step: usize) -> Bounds {
        let (top, bottom) = self
            .strips()
            .fold((i32::MAX, i32::MIN), |(top, bottom), strip| {
                (top.min(strip.top), bottom.max(strip.bottom))
            });

        // First source column of the level column holding `x`.
        let step = step as i32;
        let left = |x: i32| x - step / 2;

        Bounds::new(
            na::Point2::new(left(self.first_strip().x), top),
            na::Point2::new(left(self.last_strip().x) + step - 1, bottom),
        )
    }

    /// Collect pixels covered by the trajectory, sorted by `(x, y)`.
    ///
    /// Runs are recovered from the mask the strips were detected in. Each level pixel produces
    /// either its centre or, with `source_resolution`, every source pixel it covers.
    ///
    /// # Arguments
    ///
    /// * `mask` - level mask the strips were detected in.
    /// * `step` - source pixels per level pixel.
    /// * `source_resolution` - whether to emit all covered source pixels.
    /// * `points` - output, cleared first.
    pub fn points(
        &self,
        mask: &Image,
        step: usize,
        source_resolution: bool,
        points: &mut Vec<na::Point2<i32>>,
    ) {
        points.clear();

        let Dims { width, height } = mask.dims();
        let data = mask.data();
        let set = |col: usize, row: usize| data[row * width + col] != 0;
        let istep = step as i32;

        for strip in self.strips() {
            let (col, row) = strip.project(step);
            if !set(col, row) {
                continue;
            }

            let top = (0..row).rev().take_while(|&r| set(col, r)).last().unwrap_or(row);
            let bottom = (row..height).take_while(|&r| set(col, r)).last().unwrap_or(row);

            for r in top..=bottom {
                let (x, y) = (col as i32 * istep, r as i32 * istep);
                if source_resolution {
                    for dx in 0..istep {
                        points.extend((0..istep).map(|dy| na::Point2::new(x + dx, y + dy)));
                    }
                } else {
                    points.push(na::Point2::new(x + istep / 2, y + istep / 2));
                }
            }
        }

        points.sort_unstable_by_key(|p| (p.x, p.y));
        points.dedup();
    }

    /// Number of components in the trajectory.
    pub fn num_components(&self) -> usize {
        components_of(self.traj, self.components).count()
    }
}
