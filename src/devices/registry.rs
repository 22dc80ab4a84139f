use log::debug;
use std::collections::BTreeMap;

use super::traits::InputDevice;
use crate::output::OutputDevice;
use crate::utils::error::ReaderError;

pub type Constructor<D> = Box<dyn Fn() -> Result<Box<D>, ReaderError> + Send + Sync>;

/// Name-keyed table of device constructors, filled once at startup.
pub struct DeviceRegistry<D: ?Sized> {
    kind: &'static str,
    constructors: BTreeMap<String, Constructor<D>>,
}

pub type InputRegistry = DeviceRegistry<dyn InputDevice>;
pub type OutputRegistry = DeviceRegistry<dyn OutputDevice>;

impl<D: ?Sized> DeviceRegistry<D> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: BTreeMap::new(),
        }
    }

    /// Last registration under a name wins.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Result<Box<D>, ReaderError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.insert(name.clone(), Box::new(constructor)).is_some() {
            debug!("Replaced {} device '{}'", self.kind, name);
        }
    }

    pub fn get(&self, name: &str) -> Result<Box<D>, ReaderError> {
        let constructor = self.constructors.get(name).ok_or_else(|| self.unknown(name))?;
        constructor()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Fails fast on a name nobody registered.
    pub fn ensure(&self, name: &str) -> Result<(), ReaderError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(self.unknown(name))
        }
    }

    fn unknown(&self, name: &str) -> ReaderError {
        ReaderError::UnknownDevice(format!(
            "no {} device named '{}' (available: {})",
            self.kind,
            name,
            self.names().join(", ")
        ))
    }
}
