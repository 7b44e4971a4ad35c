//! Alcove Widget Engine
//!
//! Embeds mutually-isolated copies of a scraper control widget into an
//! uncontrolled host document.
//!
//! # Goals
//! - The host page's CSS, globals, and DOM are never polluted
//! - Instances never observe each other's styles, DOM, or events
//! - Failures surface as `error` events, never as panics in the host
//!
//! # Example
//! ```rust,ignore
//! use alcove_widget::{WidgetManager, WidgetConfig};
//!
//! let manager = WidgetManager::new();
//! let widget = manager.embed("#sidebar", WidgetConfig::default()).await;
//! widget.trigger_quick_scraping().await;
//! widget.destroy();
//! ```

mod bridge;
mod config;
mod events;
mod instance;
mod manager;
mod registry;
mod ui;

pub use bridge::{rewrite_inline_handlers, BOUND_MARKER, LEGACY_GLOBAL, REGISTRY_GLOBAL};
pub use config::{ConfigPatch, Theme, WidgetConfig};
pub use events::{EventHub, EventKind, ListenerId, WidgetEvent, EVENT_NAMESPACE};
pub use instance::WidgetHandle;
pub use manager::WidgetManager;
pub use registry::{HandlerRegistry, HandlerSurface};
pub use ui::widget_css;

// Re-export sub-crates for advanced usage
pub use alcove_css as css;
pub use alcove_dom as dom;
pub use alcove_net as net;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Widget engine error
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error(transparent)]
    Dom(#[from] alcove_dom::DomError),

    #[error(transparent)]
    Net(#[from] alcove_net::NetError),

    #[error("container already in use by instance {0}")]
    ContainerInUse(String),

    #[error("instance has been destroyed")]
    Destroyed,
}

impl WidgetError {
    /// Whether this is the container-not-found failure mode.
    pub fn is_container_not_found(&self) -> bool {
        matches!(self, Self::Dom(alcove_dom::DomError::ContainerNotFound(_)))
    }
}
