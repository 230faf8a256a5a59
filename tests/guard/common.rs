/*!
 * Shared test resources
 */

use parking_lot::Mutex;
use resource_scope::Resource;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Acquired(String),
    Released(String),
}

/// Ordered log of every back-end call
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Released(name) => Some(name.clone()),
                Event::Acquired(_) => None,
            })
            .collect()
    }

    pub fn release_count(&self, name: &str) -> usize {
        self.released().iter().filter(|n| *n == name).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Resource whose handles are names, with scripted failures
pub struct RecordingResource {
    kind: &'static str,
    recorder: Arc<Recorder>,
    fail_acquire: HashSet<String>,
    fail_release: HashSet<String>,
}

impl RecordingResource {
    pub fn new(kind: &'static str, recorder: &Arc<Recorder>) -> Self {
        Self {
            kind,
            recorder: recorder.clone(),
            fail_acquire: HashSet::new(),
            fail_release: HashSet::new(),
        }
    }

    pub fn fail_acquire(mut self, name: &str) -> Self {
        self.fail_acquire.insert(name.to_string());
        self
    }

    pub fn fail_release(mut self, name: &str) -> Self {
        self.fail_release.insert(name.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Resource for RecordingResource {
    type Params = String;
    type Handle = String;
    type Error = BackendError;

    fn kind(&self) -> &'static str {
        self.kind
    }

    fn acquire(&self, name: String) -> Result<String, BackendError> {
        if self.fail_acquire.contains(&name) {
            return Err(BackendError(format!("cannot open {}", name)));
        }
        self.recorder.push(Event::Acquired(name.clone()));
        Ok(name)
    }

    fn release(&self, name: String) -> Result<(), BackendError> {
        self.recorder.push(Event::Released(name.clone()));
        if self.fail_release.contains(&name) {
            return Err(BackendError(format!("cannot close {}", name)));
        }
        Ok(())
    }
}
