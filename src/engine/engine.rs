use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::annotate::annotator::{SaveState, remove_all_controls};
use crate::annotate::notifier::Notifier;
use crate::dom::Page;
use crate::dom::document::NodeId;
use crate::engine::context::EngineContext;
use crate::engine::message::ControlMessage;
use crate::platform::detector::detect;
use crate::platform::registry::PlatformRegistry;
use crate::scan::observer::observe;
use crate::scan::scanner::Scanner;
use crate::submit::endpoint::SaveEndpoint;
use crate::submit::workflow::SaveWorkflow;

/// Timing knobs for one engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Quiet period before a mutation burst triggers a re-scan.
    pub debounce: Duration,
    /// Longest a burst of mutations can postpone a re-scan.
    pub max_wait: Duration,
    /// How long a notification stays on the page.
    pub notification: Duration,
    /// Upper bound on one save request.
    pub request_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            max_wait: Duration::from_millis(1000),
            notification: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// The detection -> extraction -> annotation -> submission pipeline for one
/// page. Must be driven from within a tokio runtime.
pub struct Engine {
    page: Page,
    registry: Arc<PlatformRegistry>,
    context: Arc<EngineContext>,
    endpoint: Arc<dyn SaveEndpoint>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        page: Page,
        registry: Arc<PlatformRegistry>,
        endpoint: Arc<dyn SaveEndpoint>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            page,
            registry,
            context: Arc::new(EngineContext::new()),
            endpoint,
            settings,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.context
    }

    pub fn handle_message(&self, message: ControlMessage) {
        match message {
            ControlMessage::Activate { token } => {
                self.activate(&token);
            }
            ControlMessage::Deactivate => {
                self.deactivate();
            }
        }
    }

    /// Store the token and start observing the page. Returns the detected
    /// platform id, or `None` for unsupported pages, which stay untouched.
    /// A repeated activation only refreshes the token.
    pub fn activate(&self, token: &str) -> Option<String> {
        let origin = self.page.with(|doc| doc.url().to_string());
        let platform = detect(&self.registry, &origin);
        self.context
            .activate(Some(token.to_string()), platform.clone());

        let Some(id) = platform else {
            info!(%origin, "activated on unsupported page; nothing to observe");
            return None;
        };

        if self.context.has_observer() {
            debug!(platform = %id, "already observing; token refreshed");
            return Some(id);
        }

        let descriptor = Arc::new(self.registry.get(&id)?.clone());
        let scanner = Scanner::new(descriptor, Arc::clone(&self.context));
        let (initial, handle) = observe(
            self.page.clone(),
            scanner,
            self.settings.debounce,
            self.settings.max_wait,
        );
        self.context.set_observer(handle);

        info!(
            platform = %id,
            posts = initial.candidates,
            annotated = initial.annotated.len(),
            "activated"
        );
        Some(id)
    }

    /// Stop observing and strip every control from the page. Saves already in
    /// flight run to completion. Returns how many controls were removed.
    pub fn deactivate(&self) -> usize {
        if let Some(mut observer) = self.context.deactivate() {
            observer.stop();
        }
        let removed = self.page.with(remove_all_controls);
        info!(removed, "deactivated");
        removed
    }

    /// Dispatch a click on `control`. Each click runs as its own task; returns
    /// `None` when the id is not a bound control.
    pub fn click(&self, control: NodeId) -> Option<JoinHandle<SaveState>> {
        let control = self.context.control(control)?;
        let workflow = self.workflow();
        Some(tokio::spawn(async move { workflow.click(&control).await }))
    }

    fn workflow(&self) -> SaveWorkflow {
        let notifier = Notifier::new(self.page.clone(), self.settings.notification);
        let workflow = SaveWorkflow::new(
            self.page.clone(),
            Arc::clone(&self.context),
            Arc::clone(&self.endpoint),
            notifier,
            self.settings.request_timeout,
        );

        match self.context.platform().and_then(|id| self.registry.get(&id).cloned()) {
            Some(descriptor) => workflow.with_descriptor(Arc::new(descriptor)),
            None => workflow,
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // The observer task holds the page and the context; stop it so both
        // are released.
        if let Some(mut observer) = self.context.take_observer() {
            observer.stop();
        }
    }
}
