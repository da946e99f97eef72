//! [`ConfigStore`]: process-wide named configuration.
//!
//! Each namespace maps property names to arbitrary JSON values. The host
//! constructs one store at startup, shares it behind an `Arc`, and drops it at
//! exit; there is no hidden global.
//!
//! Lookup policy: reading a namespace that was never applied is an error
//! ([`AppError::ConfigNotFound`]); reading a missing property of an existing
//! namespace yields `None`.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tracing::debug;

use crate::error::AppError;
use crate::settings::Settings;

/// Namespace used when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Property name -> value for a single namespace.
pub type Properties = serde_json::Map<String, Value>;

/// Shared namespace -> properties map.
///
/// Concurrent writers to the same property are last-write-wins; the lock only
/// keeps the map itself consistent.
#[derive(Debug, Default)]
pub struct ConfigStore {
    namespaces: RwLock<HashMap<String, Properties>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store seeded with every `[namespaces.<name>]` table from
    /// `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let store = Self::new();
        for (name, properties) in &settings.namespaces {
            store.apply(name, properties.clone())?;
        }
        Ok(store)
    }

    /// Replace the whole property map of `namespace`, creating it if needed.
    pub fn apply(&self, namespace: &str, properties: Properties) -> Result<(), AppError> {
        debug!(namespace, count = properties.len(), "config namespace applied");
        self.write()?.insert(namespace.to_string(), properties);
        Ok(())
    }

    /// Read a property, or the whole namespace as a JSON object when
    /// `property` is `None`. `namespace` defaults to [`DEFAULT_NAMESPACE`].
    pub fn get(
        &self,
        property: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<Option<Value>, AppError> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        let guard = self.read()?;
        let properties = guard
            .get(namespace)
            .ok_or_else(|| AppError::ConfigNotFound(namespace.to_string()))?;
        Ok(match property {
            Some(key) => properties.get(key).cloned(),
            None => Some(Value::Object(properties.clone())),
        })
    }

    /// Snapshot of a namespace's properties.
    pub fn properties(&self, namespace: Option<&str>) -> Result<Properties, AppError> {
        let namespace = namespace.unwrap_or(DEFAULT_NAMESPACE);
        self.read()?
            .get(namespace)
            .cloned()
            .ok_or_else(|| AppError::ConfigNotFound(namespace.to_string()))
    }

    /// A single property; `Ok(None)` if the namespace exists but lacks it.
    pub fn property(&self, property: &str, namespace: Option<&str>) -> Result<Option<Value>, AppError> {
        self.get(Some(property), namespace)
    }

    /// Set `namespace[property] = value`. A `None` value is a no-op so callers
    /// can forward optional overrides without erasing existing settings.
    pub fn set(
        &self,
        namespace: &str,
        property: &str,
        value: Option<Value>,
    ) -> Result<(), AppError> {
        let Some(value) = value else {
            return Ok(());
        };
        let mut guard = self.write()?;
        let properties = guard
            .get_mut(namespace)
            .ok_or_else(|| AppError::ConfigNotFound(namespace.to_string()))?;
        debug!(namespace, property, %value, "config update");
        properties.insert(property.to_string(), value);
        Ok(())
    }

    /// Names of all applied namespaces, sorted.
    pub fn namespaces(&self) -> Result<Vec<String>, AppError> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Properties>>, AppError> {
        self.namespaces
            .read()
            .map_err(|_| AppError::State("config store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Properties>>, AppError> {
        self.namespaces
            .write()
            .map_err(|_| AppError::State("config store lock poisoned".into()))
    }
}
