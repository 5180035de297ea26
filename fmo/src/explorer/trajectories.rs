//! Linking components into trajectories.

use super::strips::{chain, Component, Strip};

/// Chain of components believed to belong to one moving object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trajectory {
    /// Index of the first component.
    pub first: usize,
    /// Index of the last component.
    pub last: usize,
    /// Total number of strips of all components.
    pub num_strips: usize,
}

/// Limits for joining components, in source pixels.
#[derive(Clone, Copy, Debug)]
pub struct LinkLimits {
    /// Components with fewer strips are ignored.
    pub min_strips: usize,
    /// Largest horizontal gap between the end of a component and the start of the next one.
    pub max_gap_x: i32,
    /// Vertical extents of joined components may be this far apart.
    pub max_gap_y: i32,
}

/// Link components into trajectories.
///
/// Components are visited from left to right. Each one is joined to the first later component
/// that starts to the right of it within `max_gap_x` and overlaps it vertically within
/// `max_gap_y`. A component can be joined to at most one predecessor.
pub fn find_trajectories(
    strips: &[Strip],
    components: &mut [Component],
    limits: &LinkLimits,
    trajectories: &mut Vec<Trajectory>,
) {
    for i in 0..components.len() {
        if components[i].num_strips < limits.min_strips {
            continue;
        }

        let traj = match components[i].trajectory {
            Some(traj) => traj,
            None => {
                trajectories.push(Trajectory {
                    first: i,
                    last: i,
                    num_strips: components[i].num_strips,
                });
                components[i].trajectory = Some(trajectories.len() - 1);
                trajectories.len() - 1
            }
        };

        let me = components[i];
        let right = strips[me.last].x;

        for j in (i + 1)..components.len() {
            let candidate = &mut components[j];
            let gap = strips[candidate.first].x - right;

            if gap > limits.max_gap_x {
                break;
            }

            if gap <= 0
                || candidate.num_strips < limits.min_strips
                || candidate.trajectory.is_some()
                || candidate.top > me.bottom + limits.max_gap_y
                || me.top > candidate.bottom + limits.max_gap_y
            {
                continue;
            }

            candidate.trajectory = Some(traj);
            let num_strips = candidate.num_strips;
            components[i].next = Some(j);

            let trajectory = &mut trajectories[traj];
            trajectory.last = j;
            trajectory.num_strips += num_strips;
            break;
        }
    }
}

/// Order trajectories by strip count, largest first.
///
/// The sort is stable, so equally sized trajectories keep their left-to-right order. Component
/// back references into the trajectory list are stale afterwards.
pub fn rank(trajectories: &mut [Trajectory]) {
    trajectories.sort_by(|a, b| b.num_strips.cmp(&a.num_strips));
}

/// Iterate over component indices of a trajectory.
pub fn components_of<'a>(
    traj: &Trajectory,
    components: &'a [Component],
) -> impl Iterator<Item = usize> + 'a {
    std::iter::successors(Some(traj.first), move |&c| components[c].next)
}

/// Iterate over all strips of a trajectory, component by component.
pub fn strips_of<'a>(
    traj: &Trajectory,
    components: &'a [Component],
    strips: &'a [Strip],
) -> impl Iterator<Item = &'a Strip> + 'a {
    components_of(traj, components)
        .flat_map(move |c| chain(strips, components[c].first))
        .map(move |s| &strips[s])
}
