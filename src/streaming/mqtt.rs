// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! MQTT bus client - feeds inbound messages into the ingress queue

use std::sync::Arc;
use std::time::Duration;
use parking_lot::RwLock;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, Publish, QoS,
    SubscribeFilter,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::{BusConfig, BusError, Publisher};
use crate::core::{IngressQueue, RawEvent};

/// Connected MQTT session.
///
/// The rumqttc event loop runs on its own tokio task and only ever touches
/// the [`IngressQueue`].
pub struct MqttBus {
    client: AsyncClient,
    broker: String,
    connected: Arc<RwLock<bool>>,
    task: JoinHandle<()>,
}

impl MqttBus {
    /// Connect, wait for the first CONNACK and start the receive task.
    ///
    /// Failing to establish the first session is an error; later
    /// disconnects are retried in the background.
    pub async fn connect(
        config: &BusConfig,
        subscriptions: Vec<String>,
        queue: Arc<IngressQueue>,
    ) -> Result<Self, BusError> {
        let broker = format!("{}:{}", config.broker, config.port);
        let client_id = format!("{}-{}", config.client_id_prefix, uuid::Uuid::new_v4().simple());

        let mut options = MqttOptions::new(&client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        options.set_clean_session(true);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, config.request_capacity.max(10));

        let timeout = Duration::from_secs(config.connect_timeout_secs.max(1));
        match tokio::time::timeout(timeout, wait_for_connack(&mut eventloop, &broker)).await {
            Ok(result) => result?,
            Err(_) => return Err(BusError::Timeout(broker)),
        }
        info!("MQTT connected to {} as {}", broker, client_id);

        subscribe_all(&client, &subscriptions)?;

        let connected = Arc::new(RwLock::new(true));
        let task = tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            subscriptions,
            queue,
            Arc::clone(&connected),
            Duration::from_millis(config.reconnect_interval_ms),
        ));

        Ok(Self {
            client,
            broker,
            connected,
            task,
        })
    }

    pub fn broker(&self) -> &str {
        &self.broker
    }

    pub async fn disconnect(&self) -> Result<(), BusError> {
        let result = self
            .client
            .disconnect()
            .await
            .map_err(|e| BusError::Connect {
                broker: self.broker.clone(),
                reason: e.to_string(),
            });
        self.task.abort();
        *self.connected.write() = false;
        result
    }
}

impl Publisher for MqttBus {
    fn publish(&self, topic: &str, payload: &str) -> Result<(), BusError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| BusError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    fn is_connected(&self) -> bool {
        *self.connected.read()
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop, broker: &str) -> Result<(), BusError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(BusError::Connect {
                        broker: broker.to_string(),
                        reason: format!("{:?}", ack.code),
                    })
                };
            }
            Ok(_) => {}
            Err(e) => {
                return Err(BusError::Connect {
                    broker: broker.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn subscribe_all(client: &AsyncClient, topics: &[String]) -> Result<(), BusError> {
    let filters: Vec<_> = topics
        .iter()
        .map(|t| SubscribeFilter::new(t.clone(), QoS::AtMostOnce))
        .collect();

    client
        .try_subscribe_many(filters)
        .map_err(|e| BusError::Subscribe(e.to_string()))?;

    for topic in topics {
        debug!("Subscribed to MQTT topic: {}", topic);
    }
    Ok(())
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    subscriptions: Vec<String>,
    queue: Arc<IngressQueue>,
    connected: Arc<RwLock<bool>>,
    reconnect_interval: Duration,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT reconnected, restoring subscriptions");
                *connected.write() = true;
                if let Err(e) = subscribe_all(&client, &subscriptions) {
                    error!("{}", e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(msg))) => match decode_message(&msg) {
                Some(event) => queue.enqueue(event),
                None => trace!("Dropping non UTF-8 payload on {}", msg.topic),
            },
            Ok(_) => {}
            Err(e) => {
                *connected.write() = false;
                warn!("MQTT error: {:?}", e);
                tokio::time::sleep(reconnect_interval).await;
            }
        }
    }
}

/// Decode an inbound publish; payloads that are not UTF-8 never reach the queue
pub fn decode_message(msg: &Publish) -> Option<RawEvent> {
    let payload = std::str::from_utf8(&msg.payload).ok()?;
    Some(RawEvent::new(&msg.topic, payload.trim()))
}
