//! Drive an edit session against a loopback "pedal".
//!
//! The loopback channel records every outbound message and lets us inject
//! the replies a real G1X Four would send.
//!
//! Run: cargo run --example edit-session

use zoomctl::control::{Controller, Patch};
use zoomctl::frame::{encode_frame, PATCH_DUMP};
use zoomctl::transport::LoopbackChannel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pedal = LoopbackChannel::new();
    let mut controller = Controller::new(pedal.clone());

    controller.on_patch_data_received(|patch: &Patch| {
        println!("patch received: {}", serde_json::to_string(patch)?);
        Ok(())
    })?;
    controller.on_patch_change(|n| {
        println!("pedal switched to patch {n}");
        Ok(())
    })?;

    controller.connect()?;
    controller.request_current_patch()?;

    // What the pedal would answer with.
    let mut payload = vec![0u8; 64];
    payload[45..50].copy_from_slice(b"LEAD1");
    pedal.inject(encode_frame(PATCH_DUMP, &payload)?.as_bytes());
    pedal.inject(&[0xC0, 7]);
    controller.process_inbound();

    controller.enable_edit_mode()?;
    controller.toggle_effect(1, true)?;
    controller.set_effect_parameter(1, 0, 80)?;
    controller.disable_edit_mode()?;

    if let Err(err) = controller.set_effect_parameter(1, 0, 90) {
        println!("rejected outside edit mode: {err}");
    }

    for message in pedal.take_sent() {
        let hex: Vec<String> = message.iter().map(|b| format!("{b:02X}")).collect();
        println!("sent: {}", hex.join(" "));
    }

    controller.disconnect()?;
    Ok(())
}
