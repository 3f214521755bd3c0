use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::dom::Page;
use crate::dom::document::MutationRecord;
use crate::scan::scanner::{ScanReport, Scanner};

/// Running observation of a page. Stopping (or dropping) the handle ends
/// the re-scan loop; scans already in progress finish first.
#[derive(Debug)]
pub struct ObserverHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ObserverHandle {
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_none() || self.task.is_finished()
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scan the page once, then keep re-scanning after structural mutations.
///
/// Returns the report of the initial scan along with the handle.
/// Attribute-only batches are ignored. With a non-zero `debounce`, a burst
/// of structural mutations is coalesced into one re-scan that runs once no
/// child-list change has arrived for `debounce`, or `max_wait` after the
/// burst started, whichever comes first.
///
/// Must be called from within a tokio runtime.
pub fn observe(
    page: Page,
    scanner: Scanner,
    debounce: Duration,
    max_wait: Duration,
) -> (ScanReport, ObserverHandle) {
    // Subscribe before the initial scan so nothing slips between the two.
    let (mut records, initial) = page.with(|doc| {
        let records = doc.observe();
        let body = doc.body();
        (records, scanner.scan(doc, body))
    });

    let (stop_tx, mut stop_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                first = records.recv() => {
                    let Some(first) = first else { break };
                    if !drain_batch(&mut records, first) {
                        trace!("attribute-only mutation batch ignored");
                        continue;
                    }

                    if !debounce.is_zero() {
                        tokio::select! {
                            _ = &mut stop_rx => break,
                            open = settle(&mut records, debounce, max_wait) => {
                                if !open {
                                    break;
                                }
                            }
                        }
                    }

                    debug!(platform = %scanner.descriptor().id, "re-scanning after mutation");
                    page.with(|doc| {
                        let body = doc.body();
                        scanner.scan(doc, body);
                    });
                }
            }
        }
        debug!("page observation stopped");
    });

    let handle = ObserverHandle {
        stop: Some(stop_tx),
        task,
    };
    (initial, handle)
}

/// Consume the records already queued behind `first`. Returns whether the
/// batch contains any structural change.
fn drain_batch(records: &mut mpsc::UnboundedReceiver<MutationRecord>, first: MutationRecord) -> bool {
    let mut structural = first.is_child_list();
    while let Ok(record) = records.try_recv() {
        structural |= record.is_child_list();
    }
    structural
}

/// Wait until no child-list record arrives for `quiet`, but never longer
/// than `max_wait` in total. Attribute records are consumed without
/// extending the wait. Returns false if the document went away.
async fn settle(
    records: &mut mpsc::UnboundedReceiver<MutationRecord>,
    quiet: Duration,
    max_wait: Duration,
) -> bool {
    let started = Instant::now();
    let hard_deadline = started + max_wait.max(quiet);
    let mut quiet_deadline = started + quiet;

    loop {
        let deadline = quiet_deadline.min(hard_deadline);
        match tokio::time::timeout_at(deadline, records.recv()).await {
            Err(_) => return true,
            Ok(Some(record)) if record.is_child_list() => {
                quiet_deadline = Instant::now() + quiet;
            }
            Ok(Some(_)) => {}
            Ok(None) => return false,
        }
    }
}
