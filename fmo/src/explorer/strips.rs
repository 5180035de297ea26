//! Strip detection and same-frame component linking.

use crate::prelude::v1::*;

/// Strips and components are addressed by indices that must fit into this bound.
pub const MAX_INDEX: usize = i16::MAX as usize;

/// Position of a strip within the chain of its component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    /// Not yet claimed by any other strip, starts a new component.
    Untouched,
    /// Last strip of the chain.
    End,
    /// Index of the next strip of the chain.
    Next(usize),
}

/// Vertical run of changed pixels, in source image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strip {
    pub x: i32,
    pub y: i32,
    pub half_height: i32,
    /// First row covered by the run.
    pub top: i32,
    /// Last row covered by the run, inclusive.
    pub bottom: i32,
    pub link: Link,
}

impl Strip {
    /// Create a strip covering the source rows `top..=bottom`.
    pub fn new(x: i32, top: i32, bottom: i32) -> Self {
        Self {
            x,
            y: (top + bottom + 1) / 2,
            half_height: (bottom - top + 2) / 2,
            top,
            bottom,
            link: Link::Untouched,
        }
    }

    /// Column and row of the level pixel holding the strip centre.
    pub fn project(&self, step: usize) -> (usize, usize) {
        let step = step as i32;
        let half = step / 2;
        (
            ((self.x - half) / step) as usize,
            ((self.y - half) / step) as usize,
        )
    }
}

/// Detect vertical runs of set pixels in a `Gray` mask.
///
/// Strips are appended column by column, so their `x` never decreases.
///
/// # Arguments
///
/// * `mask` - level mask to scan.
/// * `step` - source pixels per level pixel.
/// * `strips` - output vector, strips are appended.
pub fn find_strips(mask: &Image, step: usize, strips: &mut Vec<Strip>) {
    assert_eq!(mask.format(), Format::Gray, "strips need a gray mask");

    let Dims { width, height } = mask.dims();
    let data = mask.data();
    let istep = step as i32;

    let mut push = |col: usize, top: usize, bottom: usize| {
        strips.push(Strip::new(
            col as i32 * istep + istep / 2,
            top as i32 * istep,
            bottom as i32 * istep - 1,
        ));
    };

    for col in 0..width {
        let mut top = None;

        for row in 0..height {
            match (data[row * width + col] != 0, top) {
                (true, None) => top = Some(row),
                (false, Some(t)) => {
                    push(col, t, row);
                    top = None;
                }
                _ => {}
            }
        }

        if let Some(t) = top {
            push(col, t, height);
        }
    }
}

/// Chain of strips belonging to one connected component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Component {
    /// Index of the first strip.
    pub first: usize,
    /// Index of the last strip.
    pub last: usize,
    pub num_strips: usize,
    /// Vertical extent of all strips, inclusive.
    pub top: i32,
    pub bottom: i32,
    /// Next component of the trajectory this component belongs to.
    pub next: Option<usize>,
    /// Index of the trajectory this component belongs to.
    pub trajectory: Option<usize>,
}

impl Component {
    fn new(first: usize) -> Self {
        Self {
            first,
            last: first,
            num_strips: 0,
            top: i32::MAX,
            bottom: i32::MIN,
            next: None,
            trajectory: None,
        }
    }
}

/// Iterate over strip indices of the chain starting at `first`.
pub fn chain(strips: &[Strip], first: usize) -> impl Iterator<Item = usize> + '_ {
    std::iter::successors(Some(first), move |&i| match strips[i].link {
        Link::Next(next) => Some(next),
        _ => None,
    })
}

/// Link strips into connected components.
///
/// Strips must be ordered by `x`. Every strip is linked to the first later strip at most `step`
/// pixels to the right that overlaps it vertically. Strips that no earlier strip links to start a
/// new component.
pub fn find_components(strips: &mut [Strip], step: usize, components: &mut Vec<Component>) {
    assert!(strips.len() < MAX_INDEX, "too many strips");
    let step = step as i32;

    for i in 0..strips.len() {
        if strips[i].link == Link::Untouched {
            components.push(Component::new(i));
        }

        let me = strips[i];
        strips[i].link = Link::End;

        for j in (i + 1)..strips.len() {
            let candidate = &mut strips[j];

            if candidate.x - me.x > step {
                break;
            }

            if (candidate.y - me.y).abs() < me.half_height + candidate.half_height {
                // Claimed strips are never roots, their own link is set once they are reached.
                candidate.link = Link::End;
                strips[i].link = Link::Next(j);
                break;
            }
        }
    }

    assert!(components.len() < MAX_INDEX, "too many components");

    for comp in components.iter_mut() {
        for i in chain(strips, comp.first) {
            let strip = &strips[i];
            comp.last = i;
            comp.num_strips += 1;
            comp.top = comp.top.min(strip.top);
            comp.bottom = comp.bottom.max(strip.bottom);
        }
    }
}
