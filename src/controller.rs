use std::collections::BTreeMap;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::channel::{ChannelId, ChannelState, Command};
use crate::mqtt::{Outbound, Transport};
use crate::telemetry::{ChannelReport, TelemetrySnapshot, TelemetryTimer};
use crate::topics::TopicTable;

/// Bridges command topics to channel outputs and reports state and telemetry.
///
/// Every mutation is published before the method returns, so subscribers
/// never see state older than one publish.
pub struct Controller<T, B> {
    topics: TopicTable,
    channels: [ChannelState; 3],
    transport: T,
    board: B,
    timer: TelemetryTimer,
    started: Instant,
    connected: bool,
}

impl<T, B> Controller<T, B>
where
    T: Transport,
    B: Board,
{
    pub fn new(topics: TopicTable, transport: T, board: B, timer: TelemetryTimer) -> Self {
        let started = Instant::now();
        Self {
            topics,
            channels: [ChannelState::default(); 3],
            transport,
            board,
            timer,
            started,
            connected: false,
        }
    }

    pub fn state(&self, channel: ChannelId) -> ChannelState {
        self.channels[channel.index()]
    }

    /// Next instant `poll_telemetry` can fire.
    pub fn telemetry_deadline(&self) -> Instant {
        self.timer.deadline()
    }

    /// Re-entry point for every broker (re)connection: subscribe to the
    /// command topics and republish all state as retained messages.
    pub fn on_connect(&mut self) {
        self.connected = true;
        let commands: Vec<String> = self.topics.command_topics().map(String::from).collect();
        for topic in &commands {
            if let Err(e) = self.transport.subscribe(topic) {
                warn!("Failed to subscribe to {}: {}", topic, e);
            }
        }

        for id in ChannelId::ALL {
            let state = self.state(id);
            self.board.set_output(id, state.power);
            self.publish_power(id);
            self.publish_mode(id);
        }
        info!("Subscribed to {} command topics, state republished", commands.len());
    }

    /// The broker link dropped. Telemetry is held back until the next
    /// `on_connect` so the outbound queue keeps room for resubscribing.
    pub fn on_disconnect(&mut self) {
        if self.connected {
            info!("Broker connection lost, pausing telemetry");
        }
        self.connected = false;
    }

    /// Apply one inbound message. Unknown topics and unrecognized payloads are
    /// dropped without touching state or publishing.
    pub fn on_command(&mut self, topic: &str, payload: &str) {
        let Some(id) = self.topics.channel_for_command(topic) else {
            debug!("Ignoring message on unknown topic {}", topic);
            return;
        };

        let command = match payload.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!("Ignoring command for {}: {}", id, e);
                return;
            }
        };

        match command {
            Command::SetPower(power) => {
                info!("{} power -> {}", id, power);
                self.channels[id.index()].power = power;
                self.board.set_output(id, power);
                self.publish_power(id);
            }
            Command::SetMode(mode) => {
                info!("{} mode -> {}", id, mode);
                self.channels[id.index()].mode = mode;
                self.publish_mode(id);
            }
        }
    }

    /// Call on every loop iteration; publishes telemetry once the interval
    /// since the previous report has elapsed. A tick that falls while
    /// disconnected is consumed without publishing.
    pub fn poll_telemetry(&mut self, now: Instant) -> bool {
        if !self.timer.due(now) {
            return false;
        }
        if !self.connected {
            debug!("Skipping telemetry while disconnected");
            return false;
        }
        self.publish_telemetry();
        true
    }

    pub fn publish_telemetry(&mut self) {
        let snapshot = self.snapshot();
        let payload = match snapshot.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode telemetry: {}", e);
                return;
            }
        };

        debug!("Publishing telemetry: {}", payload);
        let message = Outbound {
            topic: self.topics.telemetry(),
            payload: &payload,
            retain: false,
        };
        if let Err(e) = self.transport.publish(message) {
            warn!("Failed to publish telemetry: {}", e);
        }
    }

    fn snapshot(&mut self) -> TelemetrySnapshot {
        let channels: BTreeMap<ChannelId, ChannelReport> = ChannelId::ALL
            .into_iter()
            .map(|id| {
                let state = self.state(id);
                let report = ChannelReport {
                    state: state.power,
                    mode: state.mode,
                };
                (id, report)
            })
            .collect();

        TelemetrySnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            channels,
            readings: self.board.readings(),
        }
    }

    fn publish_power(&mut self, id: ChannelId) {
        let power = self.state(id).power;
        let topic = self.topics.channel(id).state.as_str();
        let message = Outbound {
            topic,
            payload: power.as_str(),
            retain: true,
        };
        if let Err(e) = self.transport.publish(message) {
            warn!("Failed to publish {}: {}", topic, e);
        }
    }

    fn publish_mode(&mut self, id: ChannelId) {
        let mode = self.state(id).mode;
        let topic = self.topics.channel(id).mode.as_str();
        let message = Outbound {
            topic,
            payload: mode.as_str(),
            retain: true,
        };
        if let Err(e) = self.transport.publish(message) {
            warn!("Failed to publish {}: {}", topic, e);
        }
    }
}
