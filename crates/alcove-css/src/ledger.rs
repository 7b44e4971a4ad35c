//! Injection ledger
//!
//! Tracks which `(stylesheet, instance)` pairs have already been
//! injected so re-initialization never duplicates a `<style>` sheet.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::scope::content_hash;

/// Once-per-(content, instance) marker set.
#[derive(Debug, Default)]
pub struct InjectionLedger {
    seen: Mutex<HashSet<(u64, String)>>,
}

impl InjectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time this `(css, instance_id)` pair is
    /// seen; every later call with the same pair returns false.
    pub fn first_injection(&self, css: &str, instance_id: &str) -> bool {
        let key = (content_hash(css), instance_id.to_string());
        self.seen.lock().expect("ledger poisoned").insert(key)
    }

    /// Forget every record for an instance (used on destroy, so a
    /// re-created instance with the same id can inject again).
    pub fn forget_instance(&self, instance_id: &str) {
        self.seen
            .lock()
            .expect("ledger poisoned")
            .retain(|(_, id)| id != instance_id);
    }
}
