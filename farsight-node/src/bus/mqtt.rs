//! MQTT transport

use super::{Handler, MessageBus, Subscriptions};
use crate::config::BusConfig;
use farsight_core::Error;
use parking_lot::Mutex;
use rumqttc::{Client, ClientError, Connection, Event, MqttOptions, Outgoing, Packet, QoS};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outstanding requests the client may queue before `try_*` calls fail
const REQUEST_CAPACITY: usize = 64;
/// Pause before the connection is retried after an error
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// MQTT client whose network loop runs on a background thread.
///
/// Subscriptions are replayed after every (re)connection. Publishing never
/// blocks: when the request queue is full the publish fails with `Network`.
pub struct MqttBus {
    client: Mutex<Client>,
    subscriptions: Arc<Subscriptions>,
    _worker: JoinHandle<()>,
}

impl MqttBus {
    pub fn connect(config: &BusConfig) -> Result<Self, Error> {
        let client_id = format!("{}-{}", config.client_id, std::process::id());
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        let subscriptions = Arc::new(Subscriptions::new());

        let worker = {
            let client = client.clone();
            let subscriptions = subscriptions.clone();
            thread::Builder::new()
                .name("farsight-mqtt".to_string())
                .spawn(move || run_connection(connection, client, subscriptions))
                .map_err(|e| Error::library(format!("could not start mqtt thread: {}", e)))?
        };

        info!("MQTT client connecting to {}:{}", config.host, config.port);
        Ok(Self {
            client: Mutex::new(client),
            subscriptions,
            _worker: worker,
        })
    }
}

fn network_error(action: &str, topic: &str, err: ClientError) -> Error {
    Error::network(format!("could not {} {}: {}", action, topic, err))
}

fn run_connection(mut connection: Connection, mut client: Client, subscriptions: Arc<Subscriptions>) {
    for notification in connection.iter() {
        match notification {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match std::str::from_utf8(&publish.payload) {
                    Ok(payload) => {
                        subscriptions.dispatch(&publish.topic, payload);
                    }
                    Err(_) => warn!("Dropping non UTF-8 message on topic {}", publish.topic),
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to MQTT broker");
                for topic in subscriptions.topics() {
                    if let Err(e) = client.try_subscribe(topic.clone(), QoS::AtMostOnce) {
                        warn!("Could not subscribe to {}: {}", topic, e);
                    }
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("MQTT client disconnecting");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT connection error: {}, reconnecting", e);
                thread::sleep(RECONNECT_DELAY);
            }
        }
    }
}

impl MessageBus for MqttBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), Error> {
        self.client
            .lock()
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| network_error("publish to", topic, e))
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> Result<(), Error> {
        self.subscriptions.insert(topic, handler);
        self.client
            .lock()
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| network_error("subscribe to", topic, e))
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), Error> {
        if !self.subscriptions.remove(topic) {
            return Err(Error::invalid_operation(format!("not subscribed to {}", topic)));
        }
        self.client
            .lock()
            .try_unsubscribe(topic)
            .map_err(|e| network_error("unsubscribe from", topic, e))
    }
}

impl Drop for MqttBus {
    fn drop(&mut self) {
        if let Err(e) = self.client.lock().try_disconnect() {
            debug!("MQTT disconnect request failed: {}", e);
        }
    }
}
