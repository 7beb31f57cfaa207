//! Message bus abstraction
//!
//! The node publishes strings to topics and receives strings from subscribed
//! topics through a handler closure. Transport details stay behind
//! [`MessageBus`].

use farsight_core::Error;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub mod mqtt;

pub use mqtt::MqttBus;

/// Callback invoked with each message payload received on a topic
pub type Handler = Box<dyn Fn(&str) + Send + Sync>;

/// Publish/subscribe transport
pub trait MessageBus: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), Error>;

    /// Route messages on `topic` to `handler`, replacing any previous handler
    fn subscribe(&self, topic: &str, handler: Handler) -> Result<(), Error>;

    fn unsubscribe(&self, topic: &str) -> Result<(), Error>;
}

/// Topic-keyed handler table shared by bus implementations
#[derive(Default)]
pub struct Subscriptions {
    handlers: RwLock<HashMap<String, Arc<dyn Fn(&str) + Send + Sync>>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a previous handler was replaced
    pub fn insert(&self, topic: &str, handler: Handler) -> bool {
        self.handlers
            .write()
            .insert(topic.to_string(), Arc::from(handler))
            .is_some()
    }

    /// Returns true if a handler was removed
    pub fn remove(&self, topic: &str) -> bool {
        self.handlers.write().remove(topic).is_some()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.handlers.read().contains_key(topic)
    }

    pub fn topics(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }

    /// Deliver `payload` to the handler of `topic`. The table is not locked
    /// while the handler runs.
    pub fn dispatch(&self, topic: &str, payload: &str) -> bool {
        let handler = self.handlers.read().get(topic).cloned();
        match handler {
            Some(handler) => {
                handler(payload);
                true
            }
            None => {
                warn!("Received message on topic {} with no subscriber", topic);
                false
            }
        }
    }
}

/// In-process bus: publishes are recorded and delivered to local subscribers
#[derive(Default)]
pub struct LoopbackBus {
    subscriptions: Subscriptions,
    published: Mutex<Vec<(String, String)>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message as if it came from a remote publisher
    pub fn inject(&self, topic: &str, payload: &str) -> bool {
        self.subscriptions.dispatch(topic, payload)
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    /// Payloads published on `topic`, oldest first
    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains(topic)
    }
}

impl MessageBus for LoopbackBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), Error> {
        self.published.lock().push((topic.to_string(), payload.to_string()));
        if self.subscriptions.contains(topic) {
            self.subscriptions.dispatch(topic, payload);
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> Result<(), Error> {
        self.subscriptions.insert(topic, handler);
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), Error> {
        if self.subscriptions.remove(topic) {
            Ok(())
        } else {
            Err(Error::invalid_operation(format!("not subscribed to {}", topic)))
        }
    }
}
