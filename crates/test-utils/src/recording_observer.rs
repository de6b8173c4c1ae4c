use std::sync::{Arc, Mutex};

use pipexec::exec::{ProgressEvent, ProgressObserver};

/// An observer that records every event it receives, in order.
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to the code under test.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Lines seen while scanning for a trigger.
    pub fn scanned_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::ScannedLine { line, .. } => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_event(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
