use std::time::Duration;

use tracing::{info, warn};

use crate::dom::Page;
use crate::dom::document::{Document, NodeId};

pub const NOTIFICATION_CLASS: &str = "linkogenei-notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        }
    }
}

/// Shows transient page-level toasts that remove themselves after a delay.
#[derive(Debug, Clone)]
pub struct Notifier {
    page: Page,
    display: Duration,
}

impl Notifier {
    pub fn new(page: Page, display: Duration) -> Self {
        Self { page, display }
    }

    pub fn display(&self) -> Duration {
        self.display
    }

    /// Append a notification to the page body and schedule its removal.
    pub fn show(&self, kind: NotificationKind, message: &str) -> NodeId {
        let node = self.page.with(|doc| {
            let node = doc.create_element("div");
            doc.set_attribute(
                node,
                "class",
                &format!("{} {} show", NOTIFICATION_CLASS, kind.as_str()),
            );
            doc.set_text(node, message);
            let body = doc.body();
            doc.append_child(body, node);
            node
        });

        match kind {
            NotificationKind::Success => info!(%message, "notification shown"),
            NotificationKind::Error => warn!(%message, "error notification shown"),
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let page = self.page.clone();
                let display = self.display;
                handle.spawn(async move {
                    tokio::time::sleep(display).await;
                    page.with(|doc| doc.remove(node));
                });
            }
            Err(_) => warn!("no async runtime; notification will not auto-dismiss"),
        }

        node
    }
}

/// Text of every notification currently on the page, oldest first.
pub fn visible_notifications(doc: &Document) -> Vec<String> {
    doc.descendants(doc.body())
        .into_iter()
        .filter(|node| doc.has_class(*node, NOTIFICATION_CLASS))
        .map(|node| doc.text_content(node))
        .collect()
}
