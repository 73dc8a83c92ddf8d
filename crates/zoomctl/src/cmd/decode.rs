use std::fs::File;

use serde::Serialize;
use zoomctl_control::{DispatchOutcome, Dispatcher, MessageClass, Patch, PatchParser};
use zoomctl_frame::{command_name, FrameConfig, FrameReader};

use crate::cmd::{parse_hex_message, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{hex, new_table, print_json, print_raw, OutputFormat};

#[derive(Serialize, Default)]
struct DecodedMessage {
    index: usize,
    kind: &'static str,
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    program: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    controller: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patch: Option<Patch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DecodedMessage {
    fn from_outcome(index: usize, bytes: &[u8], outcome: DispatchOutcome) -> Self {
        let mut out = Self {
            index,
            kind: outcome.class.kind(),
            hex: hex(bytes),
            ..Self::default()
        };

        match outcome.class {
            MessageClass::ProgramChange(n) => out.program = Some(n),
            MessageClass::ControlChange { controller, value } => {
                out.controller = Some(controller);
                out.value = Some(value);
            }
            MessageClass::VendorFrame(frame) => out.command = Some(command_name(frame.command_id())),
            MessageClass::InvalidVendorFrame(err) => out.error = Some(err.to_string()),
            MessageClass::Unrecognized => {}
        }

        match outcome.patch {
            Some(Ok(patch)) => out.patch = Some(patch),
            Some(Err(err)) => out.error = Some(err.to_string()),
            None => {}
        }
        out
    }

    fn is_invalid(&self) -> bool {
        self.error.is_some()
    }

    fn detail(&self) -> String {
        if let Some(err) = &self.error {
            return format!("error: {err}");
        }
        if let Some(patch) = &self.patch {
            return format!("patch \"{}\" level {}", patch.name, patch.level);
        }
        match (self.program, self.controller, self.value, self.command) {
            (Some(n), ..) => format!("patch {n}"),
            (_, Some(c), Some(v), _) => format!("cc {c} = {v}"),
            (.., Some(command)) => command.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Serialize)]
struct DecodeOutput {
    schema_id: &'static str,
    messages: Vec<DecodedMessage>,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = FrameConfig {
        device_id: args.device_id,
        ..FrameConfig::default()
    };
    let messages = load_messages(&args, &config)?;
    if messages.is_empty() {
        return Err(CliError::new(
            USAGE,
            "no input: pass hex messages or --file",
        ));
    }

    let mut dispatcher = Dispatcher::with_parts(config, PatchParser::new());
    let decoded: Vec<DecodedMessage> = messages
        .iter()
        .enumerate()
        .map(|(index, m)| DecodedMessage::from_outcome(index, m, dispatcher.dispatch(m)))
        .collect();

    let invalid = decoded.iter().filter(|m| m.is_invalid()).count();
    if invalid > 0 {
        tracing::warn!(invalid, total = decoded.len(), "some messages did not decode");
    }

    print_decoded(decoded, &messages, format);
    Ok(if invalid > 0 { DATA_INVALID } else { SUCCESS })
}

fn load_messages(args: &DecodeArgs, config: &FrameConfig) -> CliResult<Vec<Vec<u8>>> {
    let Some(path) = &args.file else {
        return args.messages.iter().map(|m| parse_hex_message(m)).collect();
    };

    let context = format!("failed reading {}", path.display());
    let file = File::open(path).map_err(|err| io_error(&context, err))?;
    FrameReader::with_config(file, config.clone())
        .map(|message| {
            message
                .map(|bytes| bytes.to_vec())
                .map_err(|err| frame_error(&context, err))
        })
        .collect()
}

fn print_decoded(decoded: Vec<DecodedMessage>, messages: &[Vec<u8>], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DecodeOutput {
            schema_id: "zoomctl/cli/v1/decode",
            messages: decoded,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "KIND", "DETAIL"]);
            for m in &decoded {
                table.add_row(vec![m.index.to_string(), m.kind.to_string(), m.detail()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for m in &decoded {
                println!("{} {} {}", m.index, m.kind, m.detail());
                if let Some(patch) = &m.patch {
                    for slot in &patch.effects {
                        println!(
                            "    slot {}: {} ({})",
                            slot.index,
                            slot.effect_type,
                            if slot.enabled { "on" } else { "off" }
                        );
                    }
                }
            }
        }
        OutputFormat::Raw => print_raw(&messages.concat()),
    }
}
