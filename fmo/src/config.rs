//! # Algorithm settings
//!
//! Settings are plain data built by the caller (typically deserialized from a document) and copied
//! into each pipeline instance, which never modifies them.

use crate::prelude::v1::*;

/// Thresholds used when computing motion masks.
///
/// A pixel is considered changed when its difference is strictly greater than the threshold. For
/// three channel formats the threshold applies to the sum of the three channel differences.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiffConfig {
    pub thresh_gray: usize,
    pub thresh_bgr: usize,
    pub thresh_yuv: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            thresh_gray: 19,
            thresh_bgr: 23,
            thresh_yuv: 23,
        }
    }
}

impl Properties for DiffConfig {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            ("thresh_gray", PropertyMut::usize(&mut self.thresh_gray, 0, 254)),
            ("thresh_bgr", PropertyMut::usize(&mut self.thresh_bgr, 0, 764)),
            ("thresh_yuv", PropertyMut::usize(&mut self.thresh_yuv, 0, 764)),
        ]
    }
}

/// Settings shared by all built-in algorithms.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Name of the algorithm to build.
    pub name: String,
    pub diff: DiffConfig,
    /// Frames are decimated until they are no taller than this.
    pub max_image_height: usize,
    /// Components with fewer strips are not linked into trajectories.
    pub min_strips_in_component: usize,
    /// Trajectories with fewer strips are never considered objects.
    pub min_strips_in_object: usize,
    /// Largest horizontal gap between linked components, relative to the frame width.
    pub max_gap_x: f32,
    /// Vertical tolerance between linked components, relative to the frame height.
    pub max_gap_y: f32,
    /// Share of the object extent each transition must account for.
    pub min_motion: f32,
    /// Report object points at source resolution instead of processing resolution.
    pub point_set_source_resolution: bool,
    /// Side length of a block, in processed pixels (block detector).
    pub block_size: usize,
    /// Share of changed pixels that makes a block active (block detector).
    pub block_min_fill: f32,
    /// Share of the frame the largest active region must cover (block detector).
    pub block_min_area: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "explorer-v1".into(),
            diff: DiffConfig::default(),
            max_image_height: 300,
            min_strips_in_component: 2,
            min_strips_in_object: 6,
            max_gap_x: 0.25,
            max_gap_y: 0.065,
            min_motion: 0.25,
            point_set_source_resolution: false,
            block_size: 8,
            block_min_fill: 0.25,
            block_min_area: 0.001,
        }
    }
}

impl Properties for Config {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        let mut props = vec![
            ("name", PropertyMut::string(&mut self.name)),
            (
                "max_image_height",
                PropertyMut::usize(&mut self.max_image_height, 2, 1 << 14),
            ),
            (
                "min_strips_in_component",
                PropertyMut::usize(&mut self.min_strips_in_component, 1, 1000),
            ),
            (
                "min_strips_in_object",
                PropertyMut::usize(&mut self.min_strips_in_object, 1, 10000),
            ),
            ("max_gap_x", PropertyMut::float(&mut self.max_gap_x, 0.0, 1.0)),
            ("max_gap_y", PropertyMut::float(&mut self.max_gap_y, 0.0, 1.0)),
            ("min_motion", PropertyMut::float(&mut self.min_motion, 0.0, 1.0)),
            (
                "point_set_source_resolution",
                PropertyMut::bool(&mut self.point_set_source_resolution),
            ),
            ("block_size", PropertyMut::usize(&mut self.block_size, 1, 256)),
            (
                "block_min_fill",
                PropertyMut::float(&mut self.block_min_fill, 0.0, 1.0),
            ),
            (
                "block_min_area",
                PropertyMut::float(&mut self.block_min_area, 0.0, 1.0),
            ),
        ];
        props.extend(self.diff.props_mut());
        props
    }
}

impl Config {
    /// Default settings for the algorithm of the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check every numeric setting against its allowed range.
    pub fn validate(&self) -> Result<()> {
        self.clone().validate_props()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = Config::default();
        config.diff.thresh_gray = 300;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            Error::kind_of(&err),
            Some(Error::InvalidConfig { property, .. }) if property == "thresh_gray"
        ));
    }

    #[test]
    fn nan_fraction_is_rejected() {
        let config = Config {
            min_motion: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nested_props_are_settable() {
        let mut config = Config::default();
        assert!(config.set_prop("thresh_bgr", &Property::usize(40)));
        assert!(config.set_prop("min_motion", &Property::float(0.4)));
        assert_eq!(config.diff.thresh_bgr, 40);
        assert_eq!(config.min_motion, 0.4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_document_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "name": "block-v1", "diff": { "thresh_gray": 30 } }"#)
                .unwrap();
        assert_eq!(config.name, "block-v1");
        assert_eq!(config.diff.thresh_gray, 30);
        assert_eq!(config.diff.thresh_bgr, 23);
        assert_eq!(config.min_strips_in_object, 6);
    }
}
