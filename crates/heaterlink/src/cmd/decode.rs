use heaterlink_frame::decode;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_snapshot, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = parse_hex(&args.frame)?;
    let snapshot = decode(&raw).map_err(|err| frame_error("decode failed", err))?;
    print_snapshot(&snapshot, format);
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if compact.is_empty() {
        return Err(CliError::new(USAGE, "frame must not be empty"));
    }
    hex::decode(&compact)
        .map_err(|err| CliError::new(USAGE, format!("frame is not hex: {err}")))
}
