//! # Algorithm selection
//!
//! Every detection pipeline implements [`Algorithm`]. Pipelines are built by name through a
//! [`Registry`] of factories. A process-wide registry, seeded with the built-in pipelines on first
//! use, backs the free functions [`make`], [`register_factory`] and [`list_factories`].

use crate::error::Error;
use crate::prelude::v1::*;
use log::info;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Fast moving object detector.
pub trait Algorithm {
    /// Process the next frame of the stream.
    ///
    /// Frames must be supplied in order. The frame has to match the format and dimensions the
    /// algorithm was created with, otherwise `Err` is returned and no state is changed.
    ///
    /// # Arguments
    ///
    /// * `frame` - source image, only read during the call.
    fn set_input(&mut self, frame: &Image) -> Result<()>;

    /// Get a visualization of the latest processed frame.
    ///
    /// The image is rendered on first request and stays valid until the next call to
    /// [`set_input`](Algorithm::set_input).
    fn get_debug_image(&mut self) -> &Image;

    /// Get the object detected in the latest processed frame.
    ///
    /// When nothing was detected, the returned object carries the sentinel bounds
    /// (see [`Bounds::none`]).
    fn get_object(&self) -> &Object;
}

/// Function building a configured algorithm instance.
pub type Factory =
    Arc<dyn Fn(&Config, Format, Dims) -> Result<Box<dyn Algorithm>> + Send + Sync + 'static>;

/// Name of the full strip based pipeline.
pub const EXPLORER_V1: &str = "explorer-v1";
/// Name of the block flood fill baseline.
pub const BLOCK_V1: &str = "block-v1";

fn builtins() -> Vec<(&'static str, Factory)> {
    let explorer: Factory = Arc::new(
        |config: &Config, format: Format, dims: Dims| -> Result<Box<dyn Algorithm>> {
            Ok(Box::new(crate::explorer::Explorer::new(config, format, dims)?))
        },
    );

    let block: Factory = Arc::new(
        |config: &Config, format: Format, dims: Dims| -> Result<Box<dyn Algorithm>> {
            Ok(Box::new(crate::block::BlockDetector::new(config, format, dims)?))
        },
    );

    vec![(EXPLORER_V1, explorer), (BLOCK_V1, block)]
}

/// Name to factory mapping.
#[derive(Default, Clone)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry containing the built-in algorithms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.seed_builtins();
        registry
    }

    /// Add the built-in algorithms.
    ///
    /// Names that are already registered keep their factory, so this can be called any number of
    /// times and in any order relative to [`register`](Self::register).
    pub fn seed_builtins(&mut self) {
        for (name, factory) in builtins() {
            if !self.factories.contains_key(name) {
                info!("registering built-in algorithm {}", name);
                self.factories.insert(name.to_string(), factory);
            }
        }
    }

    /// Register a new factory.
    ///
    /// Fails with [`Error::Duplicate`] if the name is taken. The first registration always wins.
    pub fn register(
        &mut self,
        name: &str,
        factory: impl Fn(&Config, Format, Dims) -> Result<Box<dyn Algorithm>> + Send + Sync + 'static,
    ) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(Error::Duplicate(name.to_string()).into());
        }

        self.factories.insert(name.to_string(), Arc::new(factory));
        Ok(())
    }

    /// Look up the factory of a given name.
    pub fn get(&self, name: &str) -> Result<Factory> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()).into())
    }

    /// Build the algorithm named by `config.name`.
    ///
    /// # Arguments
    ///
    /// * `config` - settings, validated before the factory is invoked.
    /// * `format` - format of every frame that will be supplied.
    /// * `dims` - dimensions of every frame that will be supplied.
    pub fn make(&self, config: &Config, format: Format, dims: Dims) -> Result<Box<dyn Algorithm>> {
        let factory = self.get(&config.name)?;
        config.validate()?;
        factory(config, format, dims)
    }

    /// List registered names in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::with_builtins()));

fn global_factory(name: &str) -> Result<Factory> {
    REGISTRY
        .read()
        .map_err(|_| anyhow!("algorithm registry is poisoned"))?
        .get(name)
}

/// Build an algorithm from the process-wide registry.
pub fn make(config: &Config, format: Format, dims: Dims) -> Result<Box<dyn Algorithm>> {
    // The lock is released before the factory runs, so factories may use the registry.
    let factory = global_factory(&config.name)?;
    config.validate()?;
    factory(config, format, dims)
}

/// Add a factory to the process-wide registry.
pub fn register_factory(
    name: &str,
    factory: impl Fn(&Config, Format, Dims) -> Result<Box<dyn Algorithm>> + Send + Sync + 'static,
) -> Result<()> {
    REGISTRY
        .write()
        .map_err(|_| anyhow!("algorithm registry is poisoned"))?
        .register(name, factory)
}

/// List the names in the process-wide registry.
pub fn list_factories() -> Vec<String> {
    REGISTRY
        .read()
        .map(|registry| registry.list())
        .unwrap_or_default()
}
