//! A named, schema-described callable operation.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

/// Future returned by a tool handler.
pub type ToolFuture = Pin<Box<dyn Future<Output = McpResult<ToolCallResult>> + Send>>;

type BoxedHandler = Box<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// Tool record: public summary plus the handler that does the work.
///
/// Immutable once built; replace it by registering a new record under the
/// same name. Handlers validate their own arguments.
pub struct Tool {
    definition: ToolDefinition,
    handler: BoxedHandler,
}

impl Tool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<ToolCallResult>> + Send + 'static,
    {
        Self {
            definition: ToolDefinition {
                name: name.into(),
                description: description.into(),
                input_schema,
            },
            handler: Box::new(move |args| -> ToolFuture { Box::pin(handler(args)) }),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn input_schema(&self) -> &Value {
        &self.definition.input_schema
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Run the handler. The returned future owns everything it needs.
    pub fn call(&self, arguments: Value) -> ToolFuture {
        (self.handler)(arguments)
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.definition.name)
            .field("description", &self.definition.description)
            .finish_non_exhaustive()
    }
}
