mod board;
mod channel;
mod config;
mod controller;
mod mqtt;
mod telemetry;
mod topics;

use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info};

use crate::board::SimulatedBoard;
use crate::controller::Controller;
use crate::mqtt::client::{Inbound, MqttClient};
use crate::telemetry::TelemetryTimer;
use crate::topics::TopicTable;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting room-controller (mqtt={}:{}, topics={}/#, telemetry every {}s)",
        config.mqtt.broker_host,
        config.mqtt.broker_port,
        config.mqtt.topic_base,
        config.telemetry.interval_secs,
    );
    if !config.wifi.ssid.is_empty() {
        info!("  Wi-Fi network: {}", config.wifi.ssid);
    }

    let topics = TopicTable::new(&config.mqtt.topic_base);
    let mut mqtt_client = MqttClient::new(&config.mqtt, topics.availability());
    let timer = TelemetryTimer::new(config.telemetry.interval(), Instant::now());
    let mut controller = Controller::new(
        topics,
        mqtt_client.transport(),
        SimulatedBoard::new(),
        timer,
    );

    let mut sigterm = match tokio::signal::unix::signal(
        tokio::signal::unix::SignalKind::terminate(),
    ) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::process::exit(1);
        }
    };

    // One cooperative loop: network I/O, command dispatch and telemetry timing.
    loop {
        tokio::select! {
            event = mqtt_client.poll() => {
                match event {
                    Ok(Some(Inbound::Connected)) => controller.on_connect(),
                    Ok(Some(Inbound::Message { topic, payload })) => {
                        controller.on_command(&topic, &payload);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!("MQTT connection error: {}. Reconnecting...", e);
                        controller.on_disconnect();
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
            _ = tokio::time::sleep_until(controller.telemetry_deadline()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }

        controller.poll_telemetry(Instant::now());
    }

    mqtt_client.shutdown(Duration::from_secs(2)).await;
    info!("room-controller stopped");
}
