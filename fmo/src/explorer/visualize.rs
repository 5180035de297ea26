//! Debug rendering of the strip pipeline.

use super::classify::Candidate;
use super::levels::Level;
use crate::prelude::v1::*;
use crate::visualize::{self, ACCEPTED, BOUNDS, MASK, REJECTED};

fn draw_strips(out: &mut Image, candidate: &Candidate, step: usize, color: Bgr) {
    let istep = step as i32;
    for strip in candidate.strips() {
        let (col, _) = strip.project(step);
        let top = strip.top / istep;
        let bottom = strip.bottom / istep;
        visualize::vline(out, col as i32, top, bottom, color);
    }
}

/// Render the processed level with the detection results on top.
///
/// # Arguments
///
/// * `level` - processed level of the latest frame.
/// * `accepted` - accepted trajectory and its bounds.
/// * `rejected` - evaluated trajectory that was rejected.
/// * `out` - output `Bgr` image at level resolution.
pub fn render(
    level: &Level,
    accepted: Option<(&Candidate, &Bounds)>,
    rejected: Option<&Candidate>,
    out: &mut Image,
) {
    visualize::background(level.image1(), out);
    visualize::tint(&level.preprocessed, out, MASK);

    if let Some(candidate) = rejected {
        draw_strips(out, candidate, level.step, REJECTED);
    }

    if let Some((candidate, bounds)) = accepted {
        draw_strips(out, candidate, level.step, ACCEPTED);

        let step = level.step as i32;
        visualize::rect(
            out,
            (bounds.min.x / step, bounds.min.y / step),
            (bounds.max.x / step, bounds.max.y / step),
            BOUNDS,
        );
    }
}
