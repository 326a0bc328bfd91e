//! Named lookup of shared components (stores, tool modules).
//!
//! A [`ComponentRegistry`] is an explicit context object: create one, fill
//! it, and hand it to [`AgentBuilder`](crate::agent::AgentBuilder). Clones
//! share the same table.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::files::FileStore;
use crate::store::ThreadStore;
use crate::tools::ToolModule;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ComponentKind {
    ThreadStore,
    FileStore,
    ToolModule,
}

/// A registered component instance.
#[derive(Clone)]
pub enum Component {
    ThreadStore(Arc<dyn ThreadStore>),
    FileStore(Arc<dyn FileStore>),
    ToolModule(Arc<ToolModule>),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::ThreadStore(_) => ComponentKind::ThreadStore,
            Self::FileStore(_) => ComponentKind::FileStore,
            Self::ToolModule(_) => ComponentKind::ToolModule,
        }
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToolModule(module) => f.debug_tuple("ToolModule").field(module).finish(),
            other => f.debug_tuple(&other.kind().to_string()).finish(),
        }
    }
}

type Key = (ComponentKind, String);

#[derive(Clone, Default)]
pub struct ComponentRegistry {
    entries: Arc<RwLock<HashMap<Key, Component>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `component` under `name`, silently replacing any previous
    /// component of the same kind and name. Returns the replaced one.
    pub fn register(&self, name: impl Into<String>, component: Component) -> Option<Component> {
        let key = (component.kind(), name.into());
        debug!(kind = %key.0, name = %key.1, "registering component");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, component)
    }

    pub fn get(&self, kind: ComponentKind, name: &str) -> Option<Component> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, name.to_string()))
            .cloned()
    }

    /// Registered `(kind, name)` pairs, sorted, optionally filtered by kind.
    pub fn list(&self, kind: Option<ComponentKind>) -> Vec<(ComponentKind, String)> {
        let mut keys: Vec<Key> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(k, _)| kind.map_or(true, |wanted| *k == wanted))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn thread_store(&self, name: &str) -> Option<Arc<dyn ThreadStore>> {
        match self.get(ComponentKind::ThreadStore, name)? {
            Component::ThreadStore(store) => Some(store),
            _ => None,
        }
    }

    pub fn file_store(&self, name: &str) -> Option<Arc<dyn FileStore>> {
        match self.get(ComponentKind::FileStore, name)? {
            Component::FileStore(store) => Some(store),
            _ => None,
        }
    }

    pub fn tool_module(&self, name: &str) -> Option<Arc<ToolModule>> {
        match self.get(ComponentKind::ToolModule, name)? {
            Component::ToolModule(module) => Some(module),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.list(None))
            .finish()
    }
}
