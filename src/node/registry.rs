// Operation code to handler table
use crate::error::{Result, UnsupportedOperationSnafu};
use crate::node::operations::Handler;

/// Maps operation codes to handlers.
///
/// Built once at startup and handed to the [`Dispatcher`](crate::node::Dispatcher)
/// by reference. Codes are matched case-sensitively, without normalization.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    entries: Vec<(String, Handler)>,
}

impl OperationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in handler under its canonical code.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for handler in Handler::ALL {
            registry.register(handler.code(), handler);
        }
        registry
    }

    /// Register `handler` under `code`. A later registration of the same code
    /// replaces the earlier one.
    pub fn register(&mut self, code: impl Into<String>, handler: Handler) {
        let code = code.into();
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((code, handler)),
        }
    }

    pub fn lookup(&self, code: &str) -> Result<Handler> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, handler)| *handler)
            .ok_or_else(|| {
                UnsupportedOperationSnafu {
                    operation: code.to_string(),
                }
                .build()
            })
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == code)
    }

    /// Supported codes in registration order.
    pub fn list_supported(&self) -> Vec<&str> {
        self.entries.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
