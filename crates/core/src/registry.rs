//! Tool registry: the fixed name-to-definition mapping for the process.
//!
//! Populated during startup, then shared behind an `Arc` for the lifetime of
//! the process. Lookups are plain `HashMap` reads, safe from any number of
//! concurrent callers because nothing mutates after the build phase.

use crate::error::RegistryError;
use crate::schema::{ToolDefinition, ToolSpec};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Duplicate names are a startup bug and fail loudly.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), RegistryError> {
        let name = definition.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool { name });
        }
        tracing::debug!(tool = %name, "registered tool");
        self.tools.insert(name, Arc::new(definition));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ToolDefinition>, RegistryError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTool {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All tool specs, sorted by name for stable listings.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> =
            self.tools.values().map(|t| t.spec.clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}
