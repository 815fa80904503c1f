use crate::transport::{ReplySender, Transport, Visibility};
use std::sync::{Arc, Mutex};

/// An event published through a [`RecordingTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct PublishedEvent {
    pub event_name: String,
    pub payload: String,
    pub visibility: Visibility,
}

#[derive(Default)]
struct TransportState {
    connected: bool,
    refuse_publish: bool,
    published: Vec<PublishedEvent>,
    subscriptions: Vec<(String, ReplySender)>,
}

/// A [`Transport`] for tests that records every publish.
///
/// Clones share their state, so a test can keep one clone while the code
/// under test owns another one.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<TransportState>>,
}

impl RecordingTransport {
    /// Creates a transport that is already connected.
    pub fn connected() -> Self {
        let transport = Self::default();
        transport.set_connected(true);
        transport
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().unwrap().connected = connected;
    }

    /// Lets every following publish fail.
    pub fn refuse_publish(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_publish = refuse;
    }

    pub fn published(&self) -> Vec<PublishedEvent> {
        self.state.lock().unwrap().published.clone()
    }

    /// Events published under `event_name`.
    pub fn published_as(&self, event_name: &str) -> Vec<PublishedEvent> {
        self.published()
            .into_iter()
            .filter(|event| event.event_name == event_name)
            .collect()
    }

    pub fn subscribed_topics(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .subscriptions
            .iter()
            .map(|(topic, _)| topic.clone())
            .collect()
    }

    /// Delivers `payload` to every subscriber as the cloud would.
    pub fn reply(&self, payload: &str) {
        let state = self.state.lock().unwrap();
        for (_, handler) in state.subscriptions.iter() {
            handler.send(payload.to_string()).unwrap();
        }
    }
}

impl Transport for RecordingTransport {
    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn publish(&mut self, event_name: &str, payload: &str, visibility: Visibility) -> bool {
        let mut state = self.state.lock().unwrap();
        if !state.connected || state.refuse_publish {
            return false;
        }
        state.published.push(PublishedEvent {
            event_name: event_name.to_string(),
            payload: payload.to_string(),
            visibility,
        });
        true
    }

    fn subscribe(&mut self, topic: &str, handler: ReplySender) -> bool {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .push((topic.to_string(), handler));
        true
    }
}
