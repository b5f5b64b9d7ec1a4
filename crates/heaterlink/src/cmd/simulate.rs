use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use heaterlink_bridge::{
    BridgeError, MqttConfig, MqttSession, PollConfig, PollLoop, ShutdownToken, StateSink,
};
use heaterlink_frame::{Auth, Passkey};
use heaterlink_link::{LinkChannel, LinkConfig};
use heaterlink_state::{
    device_id, discovery_messages, DeviceInfo, DeviceTopics, OutboundMessage, StatePublisher,
};
use heaterlink_transport::{notification_channel, SimulatedHeater};
use tracing::info;

use crate::cmd::{BridgeArgs, SimulateArgs};
use crate::exit::{bridge_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let bridge = &args.bridge;
    let passkey = parse_passkey(bridge.passkey)?;
    let device_passkey = match args.device_passkey {
        Some(value) => parse_passkey(value)?,
        None => passkey,
    };

    let device_id = device_id(&bridge.mac_address);
    let topics = DeviceTopics::new(&bridge.topic_prefix, &device_id);
    let discovery = discovery_messages(
        &bridge.discovery_prefix,
        &topics,
        &device_info(bridge, &device_id),
    );

    let (notifications, receiver) = notification_channel();
    let heater = SimulatedHeater::new(device_passkey, notifications)
        .with_name(format!("sim:{}", bridge.mac_address));
    let link = Arc::new(LinkChannel::new(
        heater,
        receiver,
        LinkConfig {
            auth: Auth::Passkey(passkey),
            ..LinkConfig::default()
        },
    ));

    let shutdown = ShutdownToken::new();
    install_ctrlc_handler(shutdown.clone())?;
    if let Some(seconds) = args.duration {
        let shutdown = shutdown.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds));
            shutdown.cancel();
        });
    }

    let publisher = StatePublisher::new(topics.clone());
    let poll_config = PollConfig {
        poll_interval: Duration::from_secs(bridge.poll_interval),
    };
    let (commands_tx, commands) = unbounded();
    info!(%device_id, endpoint = %link.endpoint(), "starting simulated bridge");

    if args.dry_run {
        drop(commands_tx);
        let mut sink = StdoutSink { format };
        sink.publish_all(&discovery, true)
            .map_err(|err| bridge_error("discovery failed", err))?;
        PollLoop::new(link, publisher, sink, commands, poll_config, shutdown)
            .run()
            .map_err(|err| bridge_error("bridge stopped", err))?;
        return Ok(SUCCESS);
    }

    let session = MqttSession::connect(
        &mqtt_config(bridge, &device_id),
        topics,
        discovery,
        commands_tx,
        shutdown.clone(),
    )
    .map_err(|err| bridge_error("connect failed", err))?;

    let result = PollLoop::new(
        link,
        publisher,
        session.sink(),
        commands,
        poll_config,
        shutdown,
    )
    .run();
    session.close();
    result.map_err(|err| bridge_error("bridge stopped", err))?;

    Ok(SUCCESS)
}

struct StdoutSink {
    format: OutputFormat,
}

impl StateSink for StdoutSink {
    fn publish(&mut self, message: &OutboundMessage, retain: bool) -> Result<(), BridgeError> {
        print_message(message, retain, self.format);
        Ok(())
    }
}

fn parse_passkey(value: u16) -> CliResult<Passkey> {
    Passkey::new(value)
        .ok_or_else(|| CliError::new(USAGE, format!("passkey {value} out of range")))
}

fn device_info(bridge: &BridgeArgs, device_id: &str) -> DeviceInfo {
    DeviceInfo {
        name: bridge.device_name.clone(),
        identifiers: device_id.to_string(),
        manufacturer: bridge.device_manufacturer.clone(),
        model: bridge.device_model.clone(),
        via_device: host_name(),
        sw_version: format!("heaterlink {}", env!("CARGO_PKG_VERSION")),
    }
}

fn mqtt_config(bridge: &BridgeArgs, device_id: &str) -> MqttConfig {
    MqttConfig {
        host: bridge.mqtt_host.clone(),
        port: bridge.mqtt_port,
        username: bridge.mqtt_username.clone(),
        password: bridge.mqtt_password.clone(),
        client_id: device_id.to_string(),
        ..MqttConfig::default()
    }
}

fn host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "heaterlink".to_string())
}

fn install_ctrlc_handler(shutdown: ShutdownToken) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.cancel()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}
