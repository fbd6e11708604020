use crate::controller::Controller;
use crate::error::{BatonError, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// Controllers by name.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: Arc<DashMap<String, Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under its own name. Names are unique.
    pub fn register(&self, controller: Controller) -> Result<&Self> {
        let name = controller.name().to_string();
        match self.controllers.entry(name) {
            Entry::Occupied(entry) => Err(BatonError::invalid_controller(
                entry.key().clone(),
                "a controller with this name is already registered",
            )),
            Entry::Vacant(entry) => {
                tracing::debug!("Registered controller {}", entry.key());
                entry.insert(controller);
                Ok(self)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Controller> {
        self.controllers.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.controllers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.controllers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
