use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::annotate::annotator::SaveControl;
use crate::dom::document::NodeId;
use crate::scan::observer::ObserverHandle;

/// Activation state, as set by the control surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub active: bool,
    pub auth_token: Option<String>,
    pub platform: Option<String>,
}

/// Per-engine shared state, passed explicitly to the scanner and the save
/// workflow. Separate engines never share one.
///
/// `controls` binds each injected control to the post data it submits. Click
/// dispatch reads it; duplicate detection relies on the page marker instead.
#[derive(Debug, Default)]
pub struct EngineContext {
    state: Mutex<EngineState>,
    controls: Mutex<BTreeMap<NodeId, SaveControl>>,
    observer: Mutex<Option<ObserverHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EngineState {
        lock(&self.state).clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    pub fn auth_token(&self) -> Option<String> {
        lock(&self.state).auth_token.clone()
    }

    pub fn platform(&self) -> Option<String> {
        lock(&self.state).platform.clone()
    }

    pub fn activate(&self, token: Option<String>, platform: Option<String>) {
        let mut state = lock(&self.state);
        state.active = true;
        state.auth_token = token;
        state.platform = platform;
    }

    /// Clear activation state and bindings, handing back the observer so the
    /// caller can stop it.
    pub fn deactivate(&self) -> Option<ObserverHandle> {
        *lock(&self.state) = EngineState::default();
        lock(&self.controls).clear();
        lock(&self.observer).take()
    }

    // ========================================================================
    // Control bindings
    // ========================================================================

    pub fn register_controls(&self, controls: &[SaveControl]) {
        let mut bound = lock(&self.controls);
        for control in controls {
            bound.insert(control.id, control.clone());
        }
    }

    pub fn control(&self, id: NodeId) -> Option<SaveControl> {
        lock(&self.controls).get(&id).cloned()
    }

    /// All bound controls, in creation order.
    pub fn controls(&self) -> Vec<SaveControl> {
        lock(&self.controls).values().cloned().collect()
    }

    // ========================================================================
    // Observer
    // ========================================================================

    pub fn has_observer(&self) -> bool {
        lock(&self.observer)
            .as_ref()
            .map(|h| !h.is_stopped())
            .unwrap_or(false)
    }

    pub fn take_observer(&self) -> Option<ObserverHandle> {
        lock(&self.observer).take()
    }

    pub fn set_observer(&self, handle: ObserverHandle) {
        let previous = lock(&self.observer).replace(handle);
        if let Some(mut previous) = previous {
            previous.stop();
        }
    }
}
