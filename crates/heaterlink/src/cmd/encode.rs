use heaterlink_frame::{encode, Auth, Passkey, RunningMode};
use heaterlink_link::HeaterCommand;

use crate::cmd::{EncodeArgs, EncodeCommand};
use crate::exit::{link_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_command_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let command = heater_command(args.command, args.value.as_deref())?;
    let (code, argument) = command
        .request()
        .map_err(|err| link_error("encode failed", err))?;

    let auth = if args.pairing {
        Auth::Pairing
    } else {
        let passkey = Passkey::new(args.passkey)
            .ok_or_else(|| CliError::new(USAGE, format!("passkey {} out of range", args.passkey)))?;
        Auth::Passkey(passkey)
    };

    print_command_frame(&encode(code, argument, auth), format);
    Ok(SUCCESS)
}

fn heater_command(command: EncodeCommand, value: Option<&str>) -> CliResult<HeaterCommand> {
    let needs_value = matches!(
        command,
        EncodeCommand::Level | EncodeCommand::Temperature | EncodeCommand::Mode
    );
    let value = match (needs_value, value) {
        (true, Some(value)) => value.trim(),
        (true, None) => {
            return Err(CliError::new(
                USAGE,
                format!("{command:?} requires a value").to_lowercase(),
            ))
        }
        (false, Some(_)) => {
            return Err(CliError::new(
                USAGE,
                format!("{command:?} takes no value").to_lowercase(),
            ))
        }
        (false, None) => "",
    };

    match command {
        EncodeCommand::Status => Ok(HeaterCommand::QueryStatus),
        EncodeCommand::Start => Ok(HeaterCommand::Start),
        EncodeCommand::Stop => Ok(HeaterCommand::Stop),
        EncodeCommand::Level => Ok(HeaterCommand::SetLevel(integer(value)?)),
        EncodeCommand::Temperature => Ok(HeaterCommand::SetTemperature(integer(value)?)),
        EncodeCommand::Mode => match RunningMode::from_name(value) {
            Some(mode) => Ok(HeaterCommand::SetMode(i64::from(mode.code()))),
            None => Ok(HeaterCommand::SetMode(integer(value)?)),
        },
    }
}

fn integer(value: &str) -> CliResult<i64> {
    value
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid integer: {value}")))
}
