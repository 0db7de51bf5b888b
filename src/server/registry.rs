//! Collection registry for looking up record services by name

use crate::core::error::RecordError;
use crate::core::service::RecordService;
use anyhow::{Result, bail};
use indexmap::IndexMap;
use std::sync::Arc;

/// Registry of the collections served by the application
///
/// Collections are keyed by their plural name, which is also their URL
/// segment (`/api/{plural}`), and kept in registration order.
#[derive(Default, Clone)]
pub struct CollectionRegistry {
    services: IndexMap<String, Arc<dyn RecordService>>,
}

impl CollectionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its schema's plural name
    ///
    /// Registering the same name twice is an error.
    pub fn register(&mut self, service: Arc<dyn RecordService>) -> Result<()> {
        let name = service.schema().plural().to_string();
        if self.services.contains_key(&name) {
            bail!("Collection '{}' is already registered", name);
        }
        self.services.insert(name, service);
        Ok(())
    }

    /// Look up a collection's service
    pub fn get(&self, name: &str) -> Result<Arc<dyn RecordService>, RecordError> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| RecordError::UnknownCollection {
                collection: name.to_string(),
            })
    }

    /// Registered collection names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.services.keys().map(|s| s.as_str()).collect()
    }

    pub fn services(&self) -> impl Iterator<Item = &Arc<dyn RecordService>> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
