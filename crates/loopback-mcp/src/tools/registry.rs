//! Tool registration and lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::types::ToolDefinition;

use super::{api_call, echo, ping, Tool};

#[derive(Default)]
struct Entries {
    ordered: Vec<Arc<Tool>>,
    index: HashMap<String, usize>,
}

/// Name → tool record map, listed in registration order.
///
/// Records are swapped whole under the write lock, so a lookup sees either
/// the old record or the new one.
#[derive(Default)]
pub struct ToolRegistry {
    entries: RwLock<Entries>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `echo`, `ping`, and `api_call`.
    pub fn with_builtin_tools() -> Self {
        let registry = Self::new();
        registry.register(echo::tool());
        registry.register(ping::tool());
        registry.register(api_call::tool());
        registry
    }

    /// Insert `tool` under its name, returning the record it replaced.
    /// A replacement keeps the original listing position.
    pub fn register(&self, tool: Tool) -> Option<Arc<Tool>> {
        let name = tool.name().to_string();
        let tool = Arc::new(tool);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        match entries.index.get(&name).copied() {
            Some(pos) => {
                tracing::debug!("Replacing tool '{name}'");
                Some(std::mem::replace(&mut entries.ordered[pos], tool))
            }
            None => {
                tracing::debug!("Registering tool '{name}'");
                let pos = entries.ordered.len();
                entries.ordered.push(tool);
                entries.index.insert(name, pos);
                None
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Tool>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .index
            .get(name)
            .map(|&pos| Arc::clone(&entries.ordered[pos]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Public summaries in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .ordered
            .iter()
            .map(|t| t.definition().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.list().into_iter().map(|d| d.name).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    use crate::types::{McpResult, ToolCallResult};

    async fn constant(_args: Value) -> McpResult<ToolCallResult> {
        Ok(ToolCallResult::text("constant".to_string()))
    }

    #[test]
    fn test_builtin_tools_in_order() {
        let registry = ToolRegistry::with_builtin_tools();
        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "ping", "api_call"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("ping"));
        assert!(registry.lookup("nonexistent").is_none());
    }

    #[test]
    fn test_replacement_keeps_position() {
        let registry = ToolRegistry::with_builtin_tools();
        let previous = registry.register(Tool::new("echo", "Replaced", json!({}), constant));

        assert_eq!(
            previous.map(|t| t.description().to_string()).as_deref(),
            Some("Echo back the provided message")
        );
        let list = registry.list();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].name, "echo");
        assert_eq!(list[0].description, "Replaced");
        assert_eq!(registry.lookup("echo").unwrap().input_schema(), &json!({}));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list().is_empty());
    }
}
