use std::time::Duration;

use rumqttc::{
    AsyncClient, ClientError, ConnectionError, Event, EventLoop, Incoming, LastWill, MqttOptions,
    Outgoing, QoS,
};
use tracing::{debug, error, info, warn};

use crate::config::MqttConfig;

use super::{Outbound, Transport};

const ONLINE: &str = "online";
const OFFLINE: &str = "offline";

/// What the cooperative loop needs to react to from the broker.
#[derive(Debug)]
pub enum Inbound {
    /// A ConnAck arrived; subscriptions and retained state must be re-sent.
    Connected,
    Message { topic: String, payload: String },
}

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    availability_topic: String,
}

impl MqttClient {
    pub fn new(config: &MqttConfig, availability_topic: &str) -> Self {
        let mut mqttopts =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        mqttopts.set_keep_alive(Duration::from_secs(30));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            mqttopts.set_credentials(user, pass);
        }

        mqttopts.set_last_will(LastWill::new(
            availability_topic,
            OFFLINE.as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
        ));

        let (client, eventloop) = AsyncClient::new(mqttopts, 100);

        Self {
            client,
            eventloop,
            availability_topic: availability_topic.to_string(),
        }
    }

    /// Handle for the controller. Shares the request queue with this client.
    pub fn transport(&self) -> AsyncClient {
        self.client.clone()
    }

    /// Drive the network one step. Returns `Ok(None)` for traffic the
    /// controller does not care about (pings, acks, outgoing packets).
    pub async fn poll(&mut self) -> Result<Option<Inbound>, ConnectionError> {
        match self.eventloop.poll().await? {
            Event::Incoming(Incoming::ConnAck(ack)) => {
                info!("Connected to MQTT broker (session_present={})", ack.session_present);
                if let Err(e) =
                    self.client
                        .try_publish(&self.availability_topic, QoS::AtLeastOnce, true, ONLINE)
                {
                    error!("Failed to publish online status: {}", e);
                }
                Ok(Some(Inbound::Connected))
            }
            Event::Incoming(Incoming::Publish(publish)) => {
                let payload = String::from_utf8_lossy(&publish.payload).to_string();
                Ok(Some(Inbound::Message {
                    topic: publish.topic,
                    payload,
                }))
            }
            event => {
                debug!("MQTT event: {:?}", event);
                Ok(None)
            }
        }
    }

    /// Mark the device offline and close the session, flushing for at most `grace`.
    pub async fn shutdown(mut self, grace: Duration) {
        if let Err(e) =
            self.client
                .try_publish(&self.availability_topic, QoS::AtLeastOnce, true, OFFLINE)
        {
            warn!("Failed to publish offline status: {}", e);
        }
        if let Err(e) = self.client.try_disconnect() {
            warn!("Failed to queue disconnect: {}", e);
            return;
        }

        let flush = async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Event loop closed during shutdown: {}", e);
                        break;
                    }
                }
            }
        };
        if tokio::time::timeout(grace, flush).await.is_err() {
            warn!("Timed out flushing MQTT session on shutdown");
        }
    }
}

impl Transport for AsyncClient {
    type Error = ClientError;

    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error> {
        self.try_subscribe(topic, QoS::AtLeastOnce)
    }

    /// Retained messages carry state and go out at-least-once; the rest are
    /// fire-and-forget.
    fn publish(&mut self, message: Outbound<'_>) -> Result<(), Self::Error> {
        let qos = if message.retain {
            QoS::AtLeastOnce
        } else {
            QoS::AtMostOnce
        };
        self.try_publish(message.topic, qos, message.retain, message.payload)
    }
}
