//! Input catalog.
//!
//! Inputs are owned by the catalog; mixers only hold cheap [`Input`] handles.
//! Two handles are equal only if they refer to the same catalog entry, so an
//! input that is unregistered and registered again under the same identifier
//! is a different input.

use crate::mixer::{MixerError, Result};
use mixdesk_types::InputInfo;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct InputEntry {
    id: String,
    display_name: String,
}

/// Reference to a live audio input.
#[derive(Clone)]
pub struct Input {
    entry: Arc<InputEntry>,
}

impl Input {
    fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            entry: Arc::new(InputEntry {
                id: id.into(),
                display_name: display_name.into(),
            }),
        }
    }

    /// Catalog identifier of this input.
    pub fn id(&self) -> &str {
        &self.entry.id
    }

    pub fn display_name(&self) -> &str {
        &self.entry.display_name
    }
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
    }
}

impl Eq for Input {}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Input").field(&self.entry.id).finish()
    }
}

impl From<&Input> for InputInfo {
    fn from(input: &Input) -> Self {
        InputInfo {
            id: input.id().to_string(),
            display_name: input.display_name().to_string(),
        }
    }
}

/// Resolves input identifiers to live input handles.
pub trait InputCatalog: Send + Sync {
    /// Look up an input by identifier.
    fn resolve(&self, input_id: &str) -> Result<Input>;

    /// Identifier of an input, for display purposes.
    fn identifier_of(&self, input: &Input) -> String {
        input.id().to_string()
    }

    /// All currently known inputs.
    fn list(&self) -> Vec<Input>;
}

/// In-memory input catalog.
#[derive(Debug, Default)]
pub struct MemoryInputCatalog {
    inputs: RwLock<BTreeMap<String, Input>>,
}

impl MemoryInputCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input, replacing any existing input with the same identifier.
    pub fn register(&self, id: impl Into<String>, display_name: impl Into<String>) -> Input {
        let input = Input::new(id, display_name);
        let mut inputs = self.inputs.write();
        if inputs
            .insert(input.id().to_string(), input.clone())
            .is_some()
        {
            tracing::info!(input_id = %input.id(), "Replaced input in catalog");
        } else {
            tracing::info!(input_id = %input.id(), "Registered input");
        }
        input
    }

    /// Remove an input from the catalog.
    ///
    /// Channels already routed from it keep their handle until rerouted.
    pub fn unregister(&self, id: &str) -> Option<Input> {
        let removed = self.inputs.write().remove(id);
        if removed.is_some() {
            tracing::info!(input_id = %id, "Unregistered input");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inputs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.read().is_empty()
    }
}

impl InputCatalog for MemoryInputCatalog {
    fn resolve(&self, input_id: &str) -> Result<Input> {
        self.inputs
            .read()
            .get(input_id)
            .cloned()
            .ok_or_else(|| MixerError::InputNotFound(input_id.to_string()))
    }

    fn list(&self) -> Vec<Input> {
        self.inputs.read().values().cloned().collect()
    }
}
