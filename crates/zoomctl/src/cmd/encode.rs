use std::fs::File;
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use zoomctl_control::{
    classify_with_config, ControlError, Controller, ControllerConfig, MessageClass,
};
use zoomctl_frame::{command_name, decode_frame_with_config, FrameConfig, FrameWriter};
use zoomctl_transport::LoopbackChannel;

use crate::cmd::{EncodeArgs, EncodeTarget};
use crate::exit::{control_error, frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex, new_table, print_json, print_raw, OutputFormat};

#[derive(Serialize)]
struct MessageOutput {
    index: usize,
    kind: &'static str,
    size: usize,
    hex: String,
}

#[derive(Serialize)]
struct EncodeOutput {
    schema_id: &'static str,
    device_id: u8,
    messages: Vec<MessageOutput>,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = ControllerConfig::for_device(args.device_id);
    let messages = encode_messages(&args.target, args.edit, config.clone())?;

    if let Some(path) = &args.out {
        write_syx(path, &messages, &config.frame)?;
    }

    print_messages(&messages, &config.frame, format);
    Ok(SUCCESS)
}

/// Run the target through a controller wired to a loopback channel and
/// collect what it sent.
fn encode_messages(
    target: &EncodeTarget,
    edit: bool,
    config: ControllerConfig,
) -> CliResult<Vec<Bytes>> {
    let device = LoopbackChannel::new();
    let mut controller = Controller::with_config(device.clone(), config);

    controller
        .connect()
        .map_err(|err| control_error("connect failed", err))?;
    if edit {
        controller
            .enable_edit_mode()
            .map_err(|err| control_error("enable edit failed", err))?;
    }
    apply(&mut controller, target).map_err(|err| control_error("encode failed", err))?;
    if edit {
        controller
            .disable_edit_mode()
            .map_err(|err| control_error("disable edit failed", err))?;
    }
    controller
        .disconnect()
        .map_err(|err| control_error("disconnect failed", err))?;

    Ok(device.take_sent())
}

fn apply(
    controller: &mut Controller<LoopbackChannel>,
    target: &EncodeTarget,
) -> Result<(), ControlError> {
    match *target {
        EncodeTarget::RequestCurrent => controller.request_current_patch().map(drop),
        EncodeTarget::RequestPatch { patch } => controller.request_patch(patch).map(drop),
        EncodeTarget::Toggle { slot, on, .. } => controller.toggle_effect(slot, on).map(drop),
        EncodeTarget::SetType { slot, effect } => {
            controller.set_effect_type(slot, effect).map(drop)
        }
        EncodeTarget::SetParam { slot, param, value } => {
            controller.set_effect_parameter(slot, param, value).map(drop)
        }
        EncodeTarget::Select { patch } => controller.select_patch(patch),
    }
}

fn write_syx(path: &Path, messages: &[Bytes], config: &FrameConfig) -> CliResult<()> {
    let frames = messages
        .iter()
        .map(|m| decode_frame_with_config(m, config))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| {
            CliError::new(
                USAGE,
                "program change messages cannot be stored in a .syx file",
            )
        })?;

    let file = File::create(path)
        .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
    let mut writer = FrameWriter::with_config(file, config.clone());
    for frame in &frames {
        writer
            .write_frame(frame)
            .map_err(|err| frame_error(&format!("failed writing {}", path.display()), err))?;
    }
    tracing::info!(
        path = %path.display(),
        frames = writer.frames_written(),
        "wrote syx file"
    );
    Ok(())
}

fn message_kind(message: &[u8], config: &FrameConfig) -> &'static str {
    match classify_with_config(message, config) {
        MessageClass::ProgramChange(_) => "PROGRAM_CHANGE",
        MessageClass::VendorFrame(frame) => command_name(frame.command_id()),
        _ => "UNKNOWN",
    }
}

fn print_messages(messages: &[Bytes], config: &FrameConfig, format: OutputFormat) {
    let rows: Vec<MessageOutput> = messages
        .iter()
        .enumerate()
        .map(|(index, m)| MessageOutput {
            index,
            kind: message_kind(m, config),
            size: m.len(),
            hex: hex(m),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&EncodeOutput {
            schema_id: "zoomctl/cli/v1/encode",
            device_id: config.device_id,
            messages: rows,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "MESSAGE", "SIZE", "BYTES"]);
            for row in rows {
                table.add_row(vec![
                    row.index.to_string(),
                    row.kind.to_string(),
                    row.size.to_string(),
                    row.hex,
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{} {:<14} {}", row.index, row.kind, row.hex);
            }
        }
        OutputFormat::Raw => print_raw(&messages.concat()),
    }
}
