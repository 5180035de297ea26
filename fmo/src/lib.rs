//! # Fast Moving Object detection
//!
//! This library detects objects that cross many pixels between consecutive frames of a video
//! stream. Such objects do not appear as coherent blobs, but as thin motion streaks. For every
//! processed frame at most one such object is reported.
//!
//! Detection pipelines are interchangeable behind the [`Algorithm`](algorithm::Algorithm) trait
//! and are built by name through the algorithm registry:
//!
//! ```
//! use fmo::prelude::v1::*;
//!
//! let config = Config::default();
//! let dims = Dims::new(320, 240);
//! let mut algorithm = fmo::algorithm::make(&config, Format::Gray, dims).unwrap();
//!
//! let frame = Image::new(Format::Gray, dims);
//! algorithm.set_input(&frame).unwrap();
//! assert!(!algorithm.get_object().is_detected());
//! ```

pub mod algorithm;
pub mod block;
pub mod config;
pub mod differentiator;
pub mod error;
pub mod explorer;
pub mod image;
pub mod object;
pub mod processing;
pub mod properties;
mod visualize;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            algorithm::{Algorithm, Factory, Registry},
            block::BlockDetector,
            config::{Config, DiffConfig},
            differentiator::Differentiator,
            error::Error as FmoError,
            explorer::Explorer,
            image::{Bgr, Dims, Format, Image},
            object::{Bounds, Object},
            properties::*,
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
