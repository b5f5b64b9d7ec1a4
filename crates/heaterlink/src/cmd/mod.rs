use clap::{Args, Subcommand, ValueEnum};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the MQTT bridge against a simulated heater.
    Simulate(SimulateArgs),
    /// Decode a telemetry frame given as hex.
    Decode(DecodeArgs),
    /// Encode a command frame.
    Encode(EncodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Simulate(args) => simulate::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Heater, device and broker settings shared by bridge commands.
#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Link address of the heater (e.g. EC:B1:C3:00:3C:56).
    #[arg(long = "mac", env = "BLE_MAC_ADDRESS")]
    pub mac_address: String,
    /// Numeric heater passkey.
    #[arg(
        long,
        env = "BLE_PASSKEY",
        default_value_t = 1234,
        value_parser = clap::value_parser!(u16).range(0..=9999)
    )]
    pub passkey: u16,
    /// Seconds between status polls.
    #[arg(
        long,
        env = "BLE_POLL_INTERVAL",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval: u64,
    /// Device name announced for discovery.
    #[arg(long, env = "DEVICE_NAME")]
    pub device_name: String,
    /// Device manufacturer announced for discovery.
    #[arg(long, env = "DEVICE_MANUFACTURER", default_value = "Vevor")]
    pub device_manufacturer: String,
    /// Device model announced for discovery.
    #[arg(long, env = "DEVICE_MODEL")]
    pub device_model: String,
    /// Broker host.
    #[arg(long, env = "MQTT_HOST", default_value = "127.0.0.1")]
    pub mqtt_host: String,
    /// Broker port.
    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    pub mqtt_port: u16,
    /// Broker user name.
    #[arg(long, env = "MQTT_USERNAME")]
    pub mqtt_username: Option<String>,
    /// Broker password.
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub mqtt_password: Option<String>,
    /// Prefix for discovery documents.
    #[arg(long, env = "MQTT_DISCOVERY_PREFIX", default_value = "homeassistant")]
    pub discovery_prefix: String,
    /// Prefix for device topics; the device id is appended.
    #[arg(long, env = "MQTT_PREFIX", default_value = "")]
    pub topic_prefix: String,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub bridge: BridgeArgs,
    /// Passkey the simulated heater accepts. Default: --passkey.
    #[arg(long, value_parser = clap::value_parser!(u16).range(0..=9999))]
    pub device_passkey: Option<u16>,
    /// Print messages to stdout instead of connecting to a broker.
    #[arg(long)]
    pub dry_run: bool,
    /// Stop after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; spaces and colons are ignored.
    pub frame: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EncodeCommand {
    Status,
    Start,
    Stop,
    Level,
    Temperature,
    Mode,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command to encode.
    pub command: EncodeCommand,
    /// Argument for level, temperature or mode (mode accepts a name).
    pub value: Option<String>,
    /// Numeric passkey for normal frames.
    #[arg(
        long,
        default_value_t = 1234,
        conflicts_with = "pairing",
        value_parser = clap::value_parser!(u16).range(0..=9999)
    )]
    pub passkey: u16,
    /// Build a pairing frame with random auth bytes.
    #[arg(long)]
    pub pairing: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
