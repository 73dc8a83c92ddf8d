use clap::{Args, Subcommand};
use std::path::PathBuf;

use zoomctl_control::EffectType;
use zoomctl_frame::G1X_FOUR_DEVICE_ID;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod effects;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the messages a command produces.
    Encode(EncodeArgs),
    /// Classify and decode inbound messages.
    Decode(DecodeArgs),
    /// List known effect codes.
    Effects(EffectsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Effects(args) => effects::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Wrap the command in EnableEdit / DisableEdit.
    #[arg(long)]
    pub edit: bool,
    /// Also write the frames to a .syx file.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Device id (decimal or 0x-prefixed hex).
    #[arg(
        long,
        env = "ZOOMCTL_DEVICE_ID",
        default_value_t = G1X_FOUR_DEVICE_ID,
        value_parser = parse_data_byte
    )]
    pub device_id: u8,
    #[command(subcommand)]
    pub target: EncodeTarget,
}

#[derive(Subcommand, Debug)]
pub enum EncodeTarget {
    /// Ask for the current patch.
    RequestCurrent,
    /// Ask for a stored patch (0-49).
    RequestPatch { patch: u8 },
    /// Switch an effect slot on or off.
    Toggle {
        #[arg(long)]
        slot: u8,
        #[arg(long, conflicts_with = "off", required_unless_present = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Load an effect into a slot, by name or code.
    SetType {
        #[arg(long)]
        slot: u8,
        #[arg(long, value_parser = parse_effect)]
        effect: u16,
    },
    /// Set one knob of a slot's effect.
    SetParam {
        #[arg(long)]
        slot: u8,
        #[arg(long)]
        param: u8,
        #[arg(long)]
        value: u16,
    },
    /// Switch to a stored patch with a program change.
    Select { patch: u8 },
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Messages as hex, one argument per message (e.g. "C0 05").
    #[arg(value_name = "HEX")]
    pub messages: Vec<String>,
    /// Read messages from a .syx file instead.
    #[arg(long, value_name = "FILE", conflicts_with = "messages")]
    pub file: Option<PathBuf>,
    /// Device id (decimal or 0x-prefixed hex).
    #[arg(
        long,
        env = "ZOOMCTL_DEVICE_ID",
        default_value_t = G1X_FOUR_DEVICE_ID,
        value_parser = parse_data_byte
    )]
    pub device_id: u8,
}

#[derive(Args, Debug)]
pub struct EffectsArgs {
    /// Only list one category (e.g. drive, reverb).
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_number(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid number: {input}"))
}

fn parse_data_byte(input: &str) -> Result<u8, String> {
    let value = parse_number(input)?;
    if value > 0x7F {
        return Err(format!("{input} is not a 7-bit data byte"));
    }
    Ok(value as u8)
}

fn parse_effect(input: &str) -> Result<u16, String> {
    if let Some(code) = EffectType::from_name(input).and_then(|t| t.code()) {
        return Ok(code);
    }
    let value = parse_number(input)
        .map_err(|_| format!("unknown effect: {input} (see `zoomctl effects`)"))?;
    u16::try_from(value).map_err(|_| format!("effect code too large: {input}"))
}

/// Parse one message written as hex. Whitespace, commas and `0x` prefixes
/// are ignored.
pub fn parse_hex_message(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    if digits.is_empty() {
        return Err(CliError::new(USAGE, "empty hex message"));
    }
    if !digits.is_ascii() {
        return Err(CliError::new(USAGE, format!("invalid hex: {input}")));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("odd number of hex digits: {input}"),
        ));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex: {input}")))
        })
        .collect()
}
