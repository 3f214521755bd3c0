use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::annotate::annotator::{SaveControl, SaveState, control_state, set_control_state};
use crate::annotate::notifier::{NotificationKind, Notifier};
use crate::dom::Page;
use crate::engine::context::EngineContext;
use crate::extract::extractor::extract_media;
use crate::platform::descriptor::PlatformDescriptor;
use crate::submit::endpoint::SaveEndpoint;
use crate::submit::error::SaveError;
use crate::submit::request::SaveRequest;

/// Drives one control through `idle -> submitting -> saved | idle`.
///
/// Each click runs independently; several can be in flight at once, each
/// touching only its own control.
#[derive(Clone)]
pub struct SaveWorkflow {
    page: Page,
    context: Arc<EngineContext>,
    endpoint: Arc<dyn SaveEndpoint>,
    notifier: Notifier,
    timeout: Duration,
    descriptor: Option<Arc<PlatformDescriptor>>,
}

impl SaveWorkflow {
    pub fn new(
        page: Page,
        context: Arc<EngineContext>,
        endpoint: Arc<dyn SaveEndpoint>,
        notifier: Notifier,
        timeout: Duration,
    ) -> Self {
        Self {
            page,
            context,
            endpoint,
            notifier,
            timeout,
            descriptor: None,
        }
    }

    /// Re-resolve media from the live post at click time with this platform's
    /// strategies. Without it the scan-time media URL is used.
    pub fn with_descriptor(mut self, descriptor: Arc<PlatformDescriptor>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Handle a click on `control` and return the state it ends in.
    pub async fn click(&self, control: &SaveControl) -> SaveState {
        let current = self
            .page
            .with(|doc| doc.is_connected(control.id).then(|| control_state(doc, control.id)))
            .flatten();

        match current {
            Some(SaveState::Idle) => {}
            Some(state) => {
                debug!(url = %control.extracted.url, state = state.as_str(), "click ignored");
                return state;
            }
            None => {
                debug!(url = %control.extracted.url, "click on a detached control ignored");
                return SaveState::Idle;
            }
        }

        let Some(token) = self.context.auth_token() else {
            self.notifier
                .show(NotificationKind::Error, &SaveError::MissingToken.user_message());
            return SaveState::Idle;
        };

        let image_url = self.page.with(|doc| {
            set_control_state(doc, control.id, SaveState::Submitting);
            self.descriptor
                .as_deref()
                .filter(|_| doc.is_connected(control.post))
                .and_then(|d| extract_media(doc, control.post, d))
                .or_else(|| control.extracted.media_url.clone())
        });

        let request = SaveRequest::new(&control.extracted, image_url, Utc::now());
        info!(url = %request.url, platform = %request.platform, "saving post");

        let outcome = match tokio::time::timeout(self.timeout, self.endpoint.save(&request, &token)).await {
            Ok(result) => result,
            Err(_) => Err(SaveError::Timeout(self.timeout)),
        }
        .and_then(|response| {
            if response.success {
                Ok(response)
            } else {
                Err(SaveError::Rejected(response.error))
            }
        });

        match outcome {
            Ok(_) => {
                self.page
                    .with(|doc| set_control_state(doc, control.id, SaveState::Saved));
                info!(url = %request.url, "post saved");
                self.notifier.show(
                    NotificationKind::Success,
                    &format!("Post saved successfully! URL: {}", request.url),
                );
                SaveState::Saved
            }
            Err(error) => {
                warn!(url = %request.url, %error, "save failed");
                self.page
                    .with(|doc| set_control_state(doc, control.id, SaveState::Idle));
                self.notifier
                    .show(NotificationKind::Error, &error.user_message());
                SaveState::Idle
            }
        }
    }
}
