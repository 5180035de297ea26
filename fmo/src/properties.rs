//! Dynamic properties.
//!
//! Settings objects expose their tunable values by name, together with the range each value may
//! take. This lets a loader or a user interface edit settings without knowing their concrete type,
//! and lets the crate reject out-of-range values before they reach a pipeline.

use crate::error::Error;

/// Object with named, editable settings.
pub trait Properties {
    /// Get mutable views of all settings.
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![]
    }

    /// Get a snapshot of all settings together with their bounds.
    fn props(&mut self) -> Vec<(&str, Property)> {
        self.props_mut()
            .into_iter()
            .map(|(n, p)| (n, Property::from(&p)))
            .collect()
    }

    /// Set a single property by name.
    ///
    /// Returns `false` if no property of that name and type exists. Bounds are not enforced here,
    /// see [`validate_props`](Properties::validate_props).
    fn set_prop(&mut self, name: &str, value: &Property) -> bool {
        self.props_mut()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map_or(false, |(_, mut p)| p.set(value))
    }

    /// Check that every bounded property lies within its bounds.
    fn validate_props(&mut self) -> anyhow::Result<()> {
        self.props_mut()
            .iter()
            .try_for_each(|(name, prop)| prop.check(name))
    }
}

/// Value with an inclusive lower and upper bound.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct BoundedProp<T> {
    pub val: T,
    pub min: T,
    pub max: T,
}

/// Owned copy of a setting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Property {
    String(String),
    Bool(bool),
    Float(BoundedProp<f32>),
    Usize(BoundedProp<usize>),
}

impl Property {
    /// Create an unbounded float value, for use with [`Properties::set_prop`].
    pub fn float(val: f32) -> Self {
        Self::Float(BoundedProp {
            val,
            min: f32::MIN,
            max: f32::MAX,
        })
    }

    /// Create an unbounded integer value, for use with [`Properties::set_prop`].
    pub fn usize(val: usize) -> Self {
        Self::Usize(BoundedProp {
            val,
            min: usize::MIN,
            max: usize::MAX,
        })
    }
}

impl<'a> From<&PropertyMut<'a>> for Property {
    fn from(prop: &PropertyMut<'a>) -> Self {
        match prop {
            PropertyMut::String(s) => Self::String(s.to_string()),
            PropertyMut::Bool(b) => Self::Bool(**b),
            PropertyMut::Float(p) => Self::Float(p.snapshot()),
            PropertyMut::Usize(p) => Self::Usize(p.snapshot()),
        }
    }
}

/// Bounded reference to a setting.
pub struct BoundedPropMut<'a, T> {
    pub val: &'a mut T,
    pub min: T,
    pub max: T,
}

impl<'a, T: PartialOrd + Copy> BoundedPropMut<'a, T> {
    /// Move the value into bounds.
    pub fn clamp(&mut self) {
        if *self.val < self.min {
            *self.val = self.min;
        } else if *self.val > self.max {
            *self.val = self.max;
        }
    }

    pub fn in_bounds(&self) -> bool {
        *self.val >= self.min && *self.val <= self.max
    }

    fn snapshot(&self) -> BoundedProp<T> {
        BoundedProp {
            val: *self.val,
            min: self.min,
            max: self.max,
        }
    }
}

/// Mutable view of a setting.
pub enum PropertyMut<'a> {
    String(&'a mut String),
    Bool(&'a mut bool),
    Float(BoundedPropMut<'a, f32>),
    Usize(BoundedPropMut<'a, usize>),
}

impl<'a> PropertyMut<'a> {
    pub fn string(s: &'a mut String) -> Self {
        Self::String(s)
    }

    pub fn bool(b: &'a mut bool) -> Self {
        Self::Bool(b)
    }

    /// Create a floating point property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the setting.
    /// * `min` - lowest accepted value.
    /// * `max` - highest accepted value.
    pub fn float(val: &'a mut f32, min: f32, max: f32) -> Self {
        Self::Float(BoundedPropMut { val, min, max })
    }

    /// Create an integer property.
    ///
    /// # Arguments
    ///
    /// * `val` - reference to the setting.
    /// * `min` - lowest accepted value.
    /// * `max` - highest accepted value.
    pub fn usize(val: &'a mut usize, min: usize, max: usize) -> Self {
        Self::Usize(BoundedPropMut { val, min, max })
    }

    /// Copy the value of `other` if it is of the same type.
    pub fn set(&mut self, other: &Property) -> bool {
        match (self, other) {
            (Self::String(s), Property::String(os)) => **s = os.clone(),
            (Self::Bool(b), Property::Bool(ob)) => **b = *ob,
            (Self::Float(p), Property::Float(o)) => *p.val = o.val,
            (Self::Usize(p), Property::Usize(o)) => *p.val = o.val,
            _ => return false,
        }
        true
    }

    /// Fail with [`Error::InvalidConfig`] if the value lies outside its bounds.
    pub fn check(&self, name: &str) -> anyhow::Result<()> {
        let (value, min, max) = match self {
            // NaN compares false against both bounds.
            Self::Float(p) if !p.in_bounds() => (*p.val as f64, p.min as f64, p.max as f64),
            Self::Usize(p) if !p.in_bounds() => (*p.val as f64, p.min as f64, p.max as f64),
            _ => return Ok(()),
        };

        Err(Error::InvalidConfig {
            property: name.to_string(),
            value,
            min,
            max,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Knobs {
        gain: f32,
        taps: usize,
        label: String,
    }

    impl Properties for Knobs {
        fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
            vec![
                ("gain", PropertyMut::float(&mut self.gain, 0.0, 1.0)),
                ("taps", PropertyMut::usize(&mut self.taps, 1, 8)),
                ("label", PropertyMut::string(&mut self.label)),
            ]
        }
    }

    fn knobs(gain: f32) -> Knobs {
        Knobs {
            gain,
            taps: 2,
            label: String::new(),
        }
    }

    #[test]
    fn set_by_name() {
        let mut knobs = knobs(0.5);

        assert!(knobs.set_prop("taps", &Property::usize(4)));
        assert!(knobs.set_prop("label", &Property::String("x".into())));
        assert!(!knobs.set_prop("gain", &Property::usize(4)));
        assert!(!knobs.set_prop("missing", &Property::float(0.1)));

        assert_eq!(knobs.taps, 4);
        assert_eq!(knobs.label, "x");
        assert_eq!(knobs.gain, 0.5);
    }

    #[test]
    fn snapshot_carries_bounds() {
        let mut knobs = knobs(0.5);
        let props = knobs.props();
        assert_eq!(
            props[1],
            (
                "taps",
                Property::Usize(BoundedProp {
                    val: 2,
                    min: 1,
                    max: 8
                })
            )
        );
    }

    #[test]
    fn validation_reports_property() {
        let mut knobs = knobs(1.5);

        let err = knobs.validate_props().unwrap_err();
        match Error::kind_of(&err) {
            Some(Error::InvalidConfig { property, .. }) => assert_eq!(property, "gain"),
            other => panic!("unexpected error {:?}", other),
        }

        if let Some((_, PropertyMut::Float(mut gain))) = knobs.props_mut().into_iter().next() {
            gain.clamp();
        }
        assert_eq!(knobs.gain, 1.0);
        assert!(knobs.validate_props().is_ok());

        knobs.gain = f32::NAN;
        assert!(knobs.validate_props().is_err());
    }
}
