mod traits;

use std::collections::HashMap;
use std::sync::Arc;

use crate::document::DocumentKind;
use crate::error::DocumentError;

pub use traits::{HandlerOp, HandlerRequest};

/// The pair of operations serving one document kind.
#[derive(Clone)]
pub struct HandlerDescriptor {
    pub kind: DocumentKind,
    pub on_create: Arc<dyn HandlerOp>,
    pub on_update: Arc<dyn HandlerOp>,
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Collects handler registrations during startup.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<DocumentKind, HandlerDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `kind`. A second registration for the same kind replaces the
    /// first.
    pub fn register(
        mut self,
        kind: DocumentKind,
        on_create: Arc<dyn HandlerOp>,
        on_update: Arc<dyn HandlerOp>,
    ) -> Self {
        let previous = self.handlers.insert(
            kind,
            HandlerDescriptor {
                kind,
                on_create,
                on_update,
            },
        );
        if previous.is_some() {
            tracing::debug!(target: "docstream.registry", %kind, "handler re-registered");
        }
        self
    }

    pub fn build(self) -> HandlerRegistry {
        let mut kinds: Vec<_> = self.handlers.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        tracing::info!(target: "docstream.registry", kinds = ?kinds, "handler registry built");
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

/// Immutable kind → handler table, built once and shared by reference.
pub struct HandlerRegistry {
    handlers: HashMap<DocumentKind, HandlerDescriptor>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn resolve(&self, kind: DocumentKind) -> Result<&HandlerDescriptor, DocumentError> {
        self.handlers
            .get(&kind)
            .ok_or(DocumentError::UnsupportedKind(kind))
    }

    pub fn kinds(&self) -> Vec<DocumentKind> {
        DocumentKind::ALL
            .into_iter()
            .filter(|k| self.handlers.contains_key(k))
            .collect()
    }
}
