//! Instance manager (embedding facade)
//!
//! Owns the host document handle, the handler registry, the shared
//! style registry, and the container-ownership map; composes the CSS,
//! DOM, and gateway crates into the public `embed()`/`create()` API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alcove_css::{InjectionLedger, ScopeEngine};
use alcove_dom::{ContainerTarget, HostDocument, NodeId, StyleRegistry};

use crate::config::WidgetConfig;
use crate::instance::WidgetHandle;
use crate::registry::HandlerRegistry;
use crate::WidgetError;

/// State shared between the manager and every instance it creates.
pub(crate) struct ManagerShared {
    pub doc: Mutex<HostDocument>,
    pub styles: Mutex<StyleRegistry>,
    pub registry: HandlerRegistry,
    pub scope_engine: ScopeEngine,
    pub ledger: InjectionLedger,
    owners: Mutex<HashMap<NodeId, String>>,
}

impl ManagerShared {
    /// Claim exclusive ownership of a container for an instance.
    ///
    /// A container hosts at most one live instance; a claim by the
    /// current owner (re-initialization) is a no-op.
    pub fn claim_container(&self, container: NodeId, instance_id: &str) -> Result<(), WidgetError> {
        let mut owners = self.owners.lock().expect("owner map poisoned");
        match owners.get(&container) {
            Some(owner) if owner != instance_id => {
                Err(WidgetError::ContainerInUse(owner.clone()))
            }
            _ => {
                owners.insert(container, instance_id.to_string());
                Ok(())
            }
        }
    }

    /// Release a container if `instance_id` still owns it.
    pub fn release_container(&self, container: NodeId, instance_id: &str) {
        let mut owners = self.owners.lock().expect("owner map poisoned");
        if owners.get(&container).is_some_and(|o| o == instance_id) {
            owners.remove(&container);
        }
    }

    pub fn container_owner(&self, container: NodeId) -> Option<String> {
        self.owners
            .lock()
            .expect("owner map poisoned")
            .get(&container)
            .cloned()
    }
}

/// Embedding facade.
///
/// One manager per host document; every widget instance on the page
/// goes through it.
pub struct WidgetManager {
    shared: Arc<ManagerShared>,
}

impl WidgetManager {
    /// Manager over a fresh host document.
    pub fn new() -> Self {
        Self::with_document(HostDocument::new())
    }

    /// Manager over an existing host document.
    pub fn with_document(doc: HostDocument) -> Self {
        Self {
            shared: Arc::new(ManagerShared {
                doc: Mutex::new(doc),
                styles: Mutex::new(StyleRegistry::new()),
                registry: HandlerRegistry::new(),
                scope_engine: ScopeEngine::new(),
                ledger: InjectionLedger::new(),
                owners: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Read access to the host document.
    pub fn with_doc<R>(&self, f: impl FnOnce(&HostDocument) -> R) -> R {
        f(&self.shared.doc.lock().expect("document poisoned"))
    }

    /// Write access to the host document (host-page fixtures, tests).
    pub fn with_doc_mut<R>(&self, f: impl FnOnce(&mut HostDocument) -> R) -> R {
        f(&mut self.shared.doc.lock().expect("document poisoned"))
    }

    /// The manager-owned handler registry.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.shared.registry
    }

    /// Route a legacy inline-handler call to an instance.
    pub fn invoke(&self, instance_id: &str, method: &str) -> bool {
        self.shared.registry.invoke(instance_id, method)
    }

    /// Live instances holding the shared style tag for a prefix.
    pub fn style_ref_count(&self, prefix: &str) -> usize {
        self.shared
            .styles
            .lock()
            .expect("style registry poisoned")
            .ref_count(prefix)
    }

    /// Create an instance without initializing it.
    pub fn create(&self, config: WidgetConfig) -> WidgetHandle {
        WidgetHandle::create(self.shared.clone(), config)
    }

    /// Embed a widget into a container.
    ///
    /// Returns a live handle; when `auto_init` is set (the default)
    /// initialization runs here and failures surface as `error`
    /// events, never as an error from `embed` itself.
    pub async fn embed(
        &self,
        target: impl Into<ContainerTarget>,
        mut config: WidgetConfig,
    ) -> WidgetHandle {
        config.container = Some(target.into());
        let auto_init = config.auto_init;
        let handle = self.create(config);

        if auto_init {
            if let Err(e) = handle.initialize().await {
                tracing::error!(
                    instance = handle.instance_id(),
                    error = %e,
                    "auto-initialization failed"
                );
            }
        }
        handle
    }
}

impl Default for WidgetManager {
    fn default() -> Self {
        Self::new()
    }
}
