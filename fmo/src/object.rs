//! # Detection results

use nalgebra as na;

/// Axis aligned bounding box in source image pixels, with inclusive corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: na::Point2<i32>,
    pub max: na::Point2<i32>,
}

impl Bounds {
    /// The box reported when nothing has been detected.
    pub fn none() -> Self {
        Self::new(na::Point2::new(-1, -1), na::Point2::new(-1, -1))
    }

    pub fn new(min: na::Point2<i32>, max: na::Point2<i32>) -> Self {
        Self { min, max }
    }

    /// Number of columns covered.
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::none()
    }
}

/// Object detected in the latest frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Object {
    pub bounds: Bounds,
    /// Pixels belonging to the object, in source image coordinates, ordered by `(x, y)`.
    pub points: Vec<na::Point2<i32>>,
}

impl Object {
    pub fn is_detected(&self) -> bool {
        self.bounds != Bounds::none()
    }

    /// Reset to the "no detection" state, keeping the point allocation.
    pub fn clear(&mut self) {
        self.bounds = Bounds::none();
        self.points.clear();
    }
}
