//! Instance events
//!
//! Namespaced events dispatched per instance. Listeners attach to one
//! instance's hub; there is no global bus, so one instance's events
//! are never observable on another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Event namespace prefix (`alcove:<event>`).
pub const EVENT_NAMESPACE: &str = "alcove";

/// Events emitted by a widget instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Initialized,
    Error,
    Configured,
    Destroyed,
    ScrapingStarted,
    StatsDisplayed,
    JobPaused,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Error => "error",
            Self::Configured => "configured",
            Self::Destroyed => "destroyed",
            Self::ScrapingStarted => "scrapingStarted",
            Self::StatsDisplayed => "statsDisplayed",
            Self::JobPaused => "jobPaused",
        }
    }

    /// Fully-qualified event name.
    pub fn qualified(&self) -> String {
        format!("{}:{}", EVENT_NAMESPACE, self.name())
    }
}

/// One dispatched event.
#[derive(Debug, Clone)]
pub struct WidgetEvent {
    /// Id of the emitting instance (always present in the payload).
    pub instance_id: String,
    pub kind: EventKind,
    /// Namespaced name, e.g. `alcove:initialized`
    pub name: String,
    /// Event-specific detail
    pub detail: Value,
}

type Listener = Arc<dyn Fn(&WidgetEvent) + Send + Sync>;

/// Listener token returned by `add_listener`.
pub type ListenerId = u64;

/// Per-instance event hub.
#[derive(Default)]
pub struct EventHub {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener for one event kind.
    pub fn add_listener<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&WidgetEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener table poisoned")
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Detach a previously-added listener. Unknown ids are ignored.
    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) {
        if let Some(list) = self
            .listeners
            .lock()
            .expect("listener table poisoned")
            .get_mut(&kind)
        {
            list.retain(|(lid, _)| *lid != id);
        }
    }

    /// Dispatch an event to every listener of its kind.
    pub fn emit(&self, instance_id: &str, kind: EventKind, mut detail: Value) {
        if let Value::Object(map) = &mut detail {
            map.insert("instance".into(), Value::String(instance_id.to_string()));
        }
        let event = WidgetEvent {
            instance_id: instance_id.to_string(),
            kind,
            name: kind.qualified(),
            detail,
        };

        // Snapshot so a listener may add/remove listeners re-entrantly.
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .expect("listener table poisoned")
            .get(&kind)
            .map(|l| l.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default();

        tracing::debug!(instance = instance_id, event = %event.name, "dispatch");
        for listener in snapshot {
            listener(&event);
        }
    }
}
