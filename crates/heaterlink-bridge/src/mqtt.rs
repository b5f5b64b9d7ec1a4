//! Broker side of the bridge, on the blocking rumqttc client.
//!
//! The client's event loop runs on its own thread. On every (re)connect it
//! subscribes to the device's command topics and republishes the retained
//! discovery documents; inbound commands are parsed and forwarded to the
//! poll loop over a channel.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use heaterlink_link::HeaterCommand;
use heaterlink_state::{DeviceTopics, OutboundMessage};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS};
use tracing::{debug, error, info, warn};

use crate::error::{BridgeError, Result};
use crate::intake::parse_command;
use crate::shutdown::ShutdownToken;
use crate::sink::StateSink;

const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub keep_alive: Duration,
    /// How long [`MqttSession::connect`] waits for the first acknowledgement.
    pub connect_timeout: Duration,
    /// Capacity of the client's request queue.
    pub capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            username: None,
            password: None,
            client_id: "heaterlink".to_string(),
            keep_alive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            capacity: 64,
        }
    }
}

impl MqttConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or_default());
        }
        options
    }
}

/// [`StateSink`] publishing through the MQTT client.
///
/// Publishing never blocks. While the broker is unreachable the client's
/// request queue fills up and further messages fail with
/// [`BridgeError::Client`] until the connection drains it; the poll loop
/// logs and drops them, and the next poll publishes fresh state anyway.
#[derive(Clone)]
pub struct MqttSink {
    client: Client,
}

impl StateSink for MqttSink {
    fn publish(&mut self, message: &OutboundMessage, retain: bool) -> Result<()> {
        self.client.try_publish(
            message.topic.as_str(),
            QoS::AtLeastOnce,
            retain,
            message.payload.clone().into_bytes(),
        )?;
        Ok(())
    }
}

/// A live broker session.
pub struct MqttSession {
    client: Client,
    events: JoinHandle<()>,
    shutdown: ShutdownToken,
}

impl MqttSession {
    /// Connect and start the event thread.
    ///
    /// Fails if the broker does not acknowledge within
    /// [`MqttConfig::connect_timeout`]; after that, connection loss is
    /// retried in the background.
    pub fn connect(
        config: &MqttConfig,
        topics: DeviceTopics,
        discovery: Vec<OutboundMessage>,
        commands: Sender<HeaterCommand>,
        shutdown: ShutdownToken,
    ) -> Result<Self> {
        let endpoint = config.endpoint();
        info!(%endpoint, client_id = %config.client_id, "connecting to broker");

        let (client, connection) = Client::new(config.options(), config.capacity);
        let (ready_tx, ready_rx) = bounded(1);

        let events = {
            let session = EventContext {
                client: client.clone(),
                topics,
                discovery,
                commands,
                shutdown: shutdown.clone(),
            };
            thread::Builder::new()
                .name("mqtt-events".to_string())
                .spawn(move || session.run(connection, ready_tx))
                .map_err(|err| BridgeError::Connect {
                    endpoint: endpoint.clone(),
                    reason: format!("event thread: {err}"),
                })?
        };

        match ready_rx.recv_timeout(config.connect_timeout) {
            Ok(Ok(())) => Ok(Self {
                client,
                events,
                shutdown,
            }),
            Ok(Err(reason)) => Err(BridgeError::Connect { endpoint, reason }),
            Err(_) => {
                // Lets the event thread stop at its next error.
                shutdown.cancel();
                let _ = client.try_disconnect();
                Err(BridgeError::Connect {
                    endpoint,
                    reason: "no acknowledgement".to_string(),
                })
            }
        }
    }

    pub fn sink(&self) -> MqttSink {
        MqttSink {
            client: self.client.clone(),
        }
    }

    /// Disconnect and wait for the event thread to finish.
    ///
    /// Cancels the session's shutdown token, so an event thread stuck
    /// reconnecting exits after its current attempt. If the request queue is
    /// full the disconnect cannot be queued and the thread is left to exit on
    /// its own.
    pub fn close(self) {
        self.shutdown.cancel();
        if let Err(err) = self.client.try_disconnect() {
            warn!(error = %err, "disconnect request dropped; not waiting for event thread");
            return;
        }
        if self.events.join().is_err() {
            error!("mqtt event thread panicked");
        }
    }
}

struct EventContext {
    client: Client,
    topics: DeviceTopics,
    discovery: Vec<OutboundMessage>,
    commands: Sender<HeaterCommand>,
    shutdown: ShutdownToken,
}

impl EventContext {
    fn run(self, mut connection: Connection, ready: Sender<std::result::Result<(), String>>) {
        let mut ready = Some(ready);

        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(code = ?ack.code, "connected to broker");
                    self.announce();
                    if let Some(ready) = ready.take() {
                        let _ = ready.send(Ok(()));
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match parse_command(&self.topics, &publish.topic, &publish.payload) {
                        Ok(command) => {
                            debug!(
                                topic = %publish.topic,
                                command = command.name(),
                                "command received"
                            );
                            if self.commands.send(command).is_err() {
                                debug!("command intake closed");
                                break;
                            }
                        }
                        Err(err) => warn!(topic = %publish.topic, error = %err, "ignoring message"),
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    debug!(pkid = ack.pkid, "subscription acknowledged");
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    warn!("broker closed the session");
                }
                Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                    debug!("disconnecting from broker");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    if let Some(ready) = ready.take() {
                        let _ = ready.send(Err(err.to_string()));
                        break;
                    }
                    if self.shutdown.is_cancelled() {
                        break;
                    }
                    error!(error = %err, "broker connection lost; reconnecting");
                    thread::sleep(RECONNECT_DELAY);
                }
            }
        }
        debug!("mqtt event thread exiting");
    }

    // Called from the event thread itself, so the queue must not block.
    fn announce(&self) {
        for topic in self.topics.command_topics() {
            if let Err(err) = self.client.try_subscribe(topic.as_str(), QoS::ExactlyOnce) {
                warn!(%topic, error = %err, "subscribe failed");
            }
        }
        for message in &self.discovery {
            let result = self.client.try_publish(
                message.topic.as_str(),
                QoS::AtLeastOnce,
                true,
                message.payload.clone().into_bytes(),
            );
            if let Err(err) = result {
                warn!(topic = %message.topic, error = %err, "discovery publish failed");
            }
        }
        info!(
            commands = self.topics.command_topics().len(),
            discovery = self.discovery.len(),
            "announced device"
        );
    }
}
