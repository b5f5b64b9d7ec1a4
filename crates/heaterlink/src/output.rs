use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use heaterlink_frame::{command_name, CommandFrame, TelemetrySnapshot};
use heaterlink_state::OutboundMessage;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    running_state: u8,
    error_code: u8,
    error_message: &'a str,
    running_step: u8,
    running_step_message: &'a str,
    status: String,
    altitude: u16,
    running_mode: u8,
    running_mode_name: &'a str,
    set_level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    set_temperature: Option<u8>,
    supply_voltage: f32,
    case_temperature: i16,
    cab_temperature: i16,
    raw: String,
}

impl<'a> SnapshotOutput<'a> {
    fn new(snapshot: &'a TelemetrySnapshot) -> Self {
        Self {
            running_state: snapshot.running_state(),
            error_code: snapshot.error_code(),
            error_message: snapshot.error_message(),
            running_step: snapshot.running_step(),
            running_step_message: snapshot.running_step_message(),
            status: snapshot.status_message(),
            altitude: snapshot.altitude(),
            running_mode: snapshot.running_mode().code(),
            running_mode_name: snapshot.running_mode().name(),
            set_level: snapshot.set_level(),
            set_temperature: snapshot.set_temperature(),
            supply_voltage: snapshot.supply_voltage(),
            case_temperature: snapshot.case_temperature(),
            cab_temperature: snapshot.cab_temperature(),
            raw: hex::encode(snapshot.raw()),
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("status", self.status.clone()),
            ("running state", self.running_state.to_string()),
            (
                "error",
                format!("{} ({})", self.error_code, self.error_message),
            ),
            (
                "running step",
                format!("{} ({})", self.running_step, self.running_step_message),
            ),
            (
                "mode",
                format!("{} ({})", self.running_mode, self.running_mode_name),
            ),
            ("level", self.set_level.to_string()),
        ];
        if let Some(celsius) = self.set_temperature {
            rows.push(("set temperature", format!("{celsius} °C")));
        }
        rows.extend([
            ("supply voltage", format!("{:.1} V", self.supply_voltage)),
            ("altitude", format!("{} m", self.altitude)),
            ("heater temperature", format!("{} °C", self.case_temperature)),
            ("room temperature", format!("{} °C", self.cab_temperature)),
        ]);
        rows
    }
}

pub fn print_snapshot(snapshot: &TelemetrySnapshot, format: OutputFormat) {
    let out = SnapshotOutput::new(snapshot);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            &["FIELD", "VALUE"],
            out.rows()
                .into_iter()
                .map(|(field, value)| vec![field.to_string(), value])
                .collect(),
        ),
        OutputFormat::Pretty => {
            for (field, value) in out.rows() {
                println!("{field:<20}{value}");
            }
        }
        OutputFormat::Raw => print_raw(snapshot.raw()),
    }
}

#[derive(Serialize)]
struct CommandFrameOutput {
    command: u8,
    command_name: &'static str,
    argument: u16,
    pairing: bool,
    checksum: u8,
    frame: String,
}

pub fn print_command_frame(frame: &CommandFrame, format: OutputFormat) {
    let out = CommandFrameOutput {
        command: frame.command(),
        command_name: command_name(frame.command()),
        argument: frame.argument(),
        pairing: frame.is_pairing(),
        checksum: frame.checksum(),
        frame: hex::encode(frame.as_bytes()),
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            &["COMMAND", "ARGUMENT", "AUTH", "FRAME"],
            vec![vec![
                out.command_name.to_string(),
                out.argument.to_string(),
                if out.pairing { "pairing" } else { "passkey" }.to_string(),
                out.frame.clone(),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "command={} ({}) argument={} pairing={} frame={}",
            out.command, out.command_name, out.argument, out.pairing, out.frame
        ),
        OutputFormat::Raw => print_raw(frame.as_bytes()),
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    topic: &'a str,
    payload: &'a str,
    retain: bool,
    timestamp: String,
}

/// One line per message, for dry runs without a broker.
pub fn print_message(message: &OutboundMessage, retain: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&MessageOutput {
            topic: &message.topic,
            payload: &message.payload,
            retain,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Raw => println!("{}", message.payload),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} {}", message.topic, message.payload);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
