//! In-memory presence source for tests.

use super::error::{MonitorError, Result};
use super::presence::PresenceDocument;
use super::source::PresenceSource;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeSource {
    docs: Mutex<HashMap<String, PresenceDocument>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, doc: serde_json::Value) {
        let doc: PresenceDocument = serde_json::from_value(doc).unwrap();
        let url = url.into();
        self.failing.lock().unwrap().remove(&url);
        self.docs.lock().unwrap().insert(url, doc);
    }

    /// Make `url` answer with a network error.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn respond(&self, url: &str) -> Result<PresenceDocument> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().contains(url) {
            return Err(MonitorError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.docs
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MonitorError::NotFound(url.to_string()))
    }
}

impl PresenceSource for FakeSource {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PresenceDocument>> + Send + 'a>> {
        let outcome = self.respond(url);
        Box::pin(std::future::ready(outcome))
    }
}
