//! Handler registry
//!
//! Process-wide (per manager) map from instance id to the callable
//! surface its legacy inline handlers route through. Owned by the
//! manager and passed by reference; never ambient global state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Handler = Arc<dyn Fn() + Send + Sync>;

/// The set of callable methods one instance exposes.
#[derive(Default)]
pub struct HandlerSurface {
    methods: HashMap<String, Handler>,
}

impl HandlerSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a named method.
    pub fn bind<F>(&mut self, name: &str, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Instance-id → handler-surface registry.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Mutex<HashMap<String, HandlerSurface>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an instance's surface. Idempotent.
    pub fn register(&self, instance_id: &str, surface: HandlerSurface) {
        self.entries
            .lock()
            .expect("registry poisoned")
            .insert(instance_id.to_string(), surface);
    }

    /// Remove an instance's surface. Idempotent.
    pub fn unregister(&self, instance_id: &str) {
        self.entries
            .lock()
            .expect("registry poisoned")
            .remove(instance_id);
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.entries
            .lock()
            .expect("registry poisoned")
            .contains_key(instance_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route a named call to an instance's handler.
    ///
    /// Unknown ids and methods are reported and swallowed; a stale
    /// inline reference must never take the host page down.
    pub fn invoke(&self, instance_id: &str, method: &str) -> bool {
        let handler = {
            let entries = self.entries.lock().expect("registry poisoned");
            let Some(surface) = entries.get(instance_id) else {
                tracing::warn!(instance = instance_id, method, "invoke on unknown instance");
                return false;
            };
            let Some(handler) = surface.get(method) else {
                tracing::warn!(instance = instance_id, method, "invoke on unknown method");
                return false;
            };
            handler.clone()
        };
        handler();
        true
    }
}
