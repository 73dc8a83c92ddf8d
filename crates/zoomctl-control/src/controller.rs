use bytes::Bytes;
use tracing::{debug, info};
use zoomctl_frame::Frame;
use zoomctl_transport::{inbound_queue, InboundReceiver, MessageChannel};

use crate::command::{encode_with_config, program_change, Command};
use crate::config::ControllerConfig;
use crate::dispatch::{DispatchOutcome, Dispatcher, SubscriberResult};
use crate::error::{DispatchError, EncodeError, Result};
use crate::patch::{Patch, PatchParser};
use crate::session::{Session, SessionEvent, SessionState, Transition};

/// Drives one pedal over one message channel.
///
/// Owns the session state, so every command is checked against the mode the
/// pedal is in before it is sent. Inbound messages are queued by the
/// transport callback and handled on the caller's thread by
/// [`process_inbound`](Self::process_inbound).
pub struct Controller<C> {
    channel: C,
    session: Session,
    dispatcher: Dispatcher,
    inbound: Option<InboundReceiver>,
    config: ControllerConfig,
    current_patch: Option<Patch>,
}

impl<C: MessageChannel> Controller<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, ControllerConfig::default())
    }

    pub fn with_config(channel: C, config: ControllerConfig) -> Self {
        Self::with_parser(channel, config, PatchParser::new())
    }

    /// Controller with a custom patch parser (for a known slot layout).
    pub fn with_parser(channel: C, config: ControllerConfig, parser: PatchParser) -> Self {
        Self {
            channel,
            session: Session::new(),
            dispatcher: Dispatcher::with_parts(config.frame.clone(), parser)
                .with_diagnostic_capacity(config.diagnostic_capacity),
            inbound: None,
            config,
            current_patch: None,
        }
    }

    /// Subscribe to the channel and move to `Idle`.
    pub fn connect(&mut self) -> Result<()> {
        self.session.plan(SessionEvent::Connect)?;

        let (handler, receiver) = inbound_queue(self.config.inbound_capacity);
        self.channel.subscribe(handler)?;
        self.inbound = Some(receiver);
        self.session.transition(SessionEvent::Connect)?;

        info!(transport = self.channel.transport_name(), "connected");
        Ok(())
    }

    /// Drop the channel subscription and any pending inbound state.
    pub fn disconnect(&mut self) -> Result<()> {
        let transition = self.session.transition(SessionEvent::Disconnect)?;
        self.channel.unsubscribe();

        if transition.discard_pending {
            if let Some(receiver) = self.inbound.take() {
                let discarded = receiver.clear();
                if discarded > 0 {
                    debug!(discarded, "pending inbound messages discarded");
                }
            }
            self.current_patch = None;
        }

        info!(from = %transition.from, "disconnected");
        Ok(())
    }

    pub fn enable_edit_mode(&mut self) -> Result<Transition> {
        self.apply(SessionEvent::EnableEdit)
    }

    pub fn disable_edit_mode(&mut self) -> Result<Transition> {
        self.apply(SessionEvent::DisableEdit)
    }

    pub fn request_current_patch(&mut self) -> Result<Frame> {
        self.send(&Command::RequestCurrentPatch)
    }

    pub fn request_patch(&mut self, patch: u8) -> Result<Frame> {
        self.send(&Command::RequestPatch { patch })
    }

    pub fn toggle_effect(&mut self, slot: u8, enabled: bool) -> Result<Frame> {
        self.send(&Command::ToggleEffect { slot, enabled })
    }

    pub fn set_effect_type(&mut self, slot: u8, effect_type: u16) -> Result<Frame> {
        self.send(&Command::SetEffectType { slot, effect_type })
    }

    pub fn set_effect_parameter(&mut self, slot: u8, param: u8, value: u16) -> Result<Frame> {
        self.send(&Command::SetEffectParameter { slot, param, value })
    }

    /// Switch the pedal to a stored patch with a program change.
    pub fn select_patch(&mut self, patch: u8) -> Result<()> {
        let message = program_change(patch)?;
        let state = self.session.state();
        if !state.is_connected() {
            return Err(EncodeError::WrongMode {
                command: "select-patch",
                state,
            }
            .into());
        }
        self.channel.send(&message)?;
        debug!(patch, "program change sent");
        Ok(())
    }

    /// Encode a command against the current state and send it.
    ///
    /// `EnableEdit` and `DisableEdit` also move the session, so the tracked
    /// mode stays in step with the pedal.
    pub fn send(&mut self, command: &Command) -> Result<Frame> {
        let event = match command {
            Command::EnableEdit => Some(SessionEvent::EnableEdit),
            Command::DisableEdit => Some(SessionEvent::DisableEdit),
            _ => None,
        };
        if let Some(event) = event {
            self.session.plan(event)?;
        }
        let frame = self.transmit(command)?;
        if let Some(event) = event {
            self.session.transition(event)?;
        }
        Ok(frame)
    }

    /// Dispatch every queued inbound message, oldest first.
    pub fn process_inbound(&mut self) -> Vec<DispatchOutcome> {
        let messages: Vec<Bytes> = match &self.inbound {
            Some(receiver) => receiver.drain().collect(),
            None => return Vec::new(),
        };
        messages
            .iter()
            .map(|message| self.handle_message(message))
            .collect()
    }

    /// Dispatch one inbound message directly.
    pub fn handle_message(&mut self, bytes: &[u8]) -> DispatchOutcome {
        let outcome = self.dispatcher.dispatch(bytes);
        if let Some(Ok(patch)) = &outcome.patch {
            debug!(name = %patch.name, "patch received");
            self.current_patch = Some(patch.clone());
        }
        outcome
    }

    /// The last patch parsed from a dump, if any.
    pub fn current_patch(&self) -> Option<&Patch> {
        self.current_patch.as_ref()
    }

    /// A failing or panicking subscriber is reported through
    /// [`take_diagnostics`](Self::take_diagnostics). Panics still pass through
    /// the process panic hook, which prints to stderr unless replaced.
    pub fn on_patch_change<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(u8) -> SubscriberResult + Send + 'static,
    {
        Ok(self.dispatcher.on_patch_change(f)?)
    }

    pub fn on_patch_data_received<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(&Patch) -> SubscriberResult + Send + 'static,
    {
        Ok(self.dispatcher.on_patch_data_received(f)?)
    }

    pub fn on_control_change<F>(&mut self, f: F) -> Result<()>
    where
        F: FnMut(u8, u8) -> SubscriberResult + Send + 'static,
    {
        Ok(self.dispatcher.on_control_change(f)?)
    }

    /// Subscriber failures since the last call. At most
    /// [`ControllerConfig::diagnostic_capacity`] are kept in between.
    pub fn take_diagnostics(&mut self) -> Vec<DispatchError> {
        self.dispatcher.take_diagnostics()
    }

    /// Diagnostics discarded because nobody drained them in time.
    pub fn dropped_diagnostics(&self) -> u64 {
        self.dispatcher.dropped_diagnostics()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Inbound messages dropped because the queue was full.
    pub fn dropped_inbound(&self) -> u64 {
        self.inbound.as_ref().map_or(0, InboundReceiver::dropped)
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Send the frame that goes with a transition, then apply it.
    fn apply(&mut self, event: SessionEvent) -> Result<Transition> {
        let transition = self.session.plan(event)?;
        if let Some(command) = transition.emits {
            self.transmit(&command)?;
        }
        Ok(self.session.transition(event)?)
    }

    fn transmit(&mut self, command: &Command) -> Result<Frame> {
        let frame = encode_with_config(command, self.session.state(), &self.config.frame)?;
        self.channel.send(frame.as_bytes())?;
        debug!(
            command = command.name(),
            size = frame.wire_size(),
            "frame sent"
        );
        Ok(frame)
    }
}

impl<C> std::fmt::Debug for Controller<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.session.state())
            .field("dispatcher", &self.dispatcher)
            .field("connected_queue", &self.inbound.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use zoomctl_frame::{encode_frame, PATCH_DUMP};
    use zoomctl_transport::{LoopbackChannel, TransportError};

    use super::*;
    use crate::error::{ControlError, SessionError};

    fn connected() -> (Controller<LoopbackChannel>, LoopbackChannel) {
        let channel = LoopbackChannel::new();
        let mut controller = Controller::new(channel.clone());
        controller.connect().unwrap();
        (controller, channel)
    }

    fn dump(name: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8; 40];
        payload[21..21 + name.len()].copy_from_slice(name);
        encode_frame(PATCH_DUMP, &payload).unwrap().as_bytes().to_vec()
    }

    #[test]
    fn connect_subscribes() {
        let (controller, channel) = connected();
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(channel.has_subscriber());
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn connect_twice_fails() {
        let (mut controller, _) = connected();
        assert!(matches!(
            controller.connect(),
            Err(ControlError::Session(SessionError::InvalidTransition { .. }))
        ));
    }

    #[test]
    fn edit_mode_sends_frames() {
        let (mut controller, channel) = connected();
        controller.enable_edit_mode().unwrap();
        controller.set_effect_parameter(0, 1, 50).unwrap();
        controller.disable_edit_mode().unwrap();

        let sent = channel.take_sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].as_ref(), &[0xF0, 0x52, 0x00, 0x64, 0x50, 0xF7]);
        assert_eq!(sent[1][4], 0x31);
        assert_eq!(sent[2].as_ref(), &[0xF0, 0x52, 0x00, 0x64, 0x51, 0xF7]);
    }

    #[test]
    fn rejected_command_sends_nothing() {
        let (mut controller, channel) = connected();
        assert!(controller.toggle_effect(0, true).is_err());
        controller.enable_edit_mode().unwrap();
        assert!(controller.toggle_effect(7, true).is_err());
        assert_eq!(channel.take_sent().len(), 1);
    }

    #[test]
    fn failed_send_keeps_state() {
        let (mut controller, channel) = connected();
        channel.close();
        assert!(matches!(
            controller.enable_edit_mode(),
            Err(ControlError::Transport(TransportError::Closed))
        ));
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn send_routes_edit_toggles_through_session() {
        let (mut controller, _) = connected();
        let frame = controller.send(&Command::EnableEdit).unwrap();
        assert_eq!(frame.command_id(), zoomctl_frame::ENABLE_EDIT);
        assert_eq!(controller.state(), SessionState::EditMode);
        assert!(controller.send(&Command::EnableEdit).is_err());
    }

    #[test]
    fn select_patch_sends_program_change() {
        let (mut controller, channel) = connected();
        controller.select_patch(12).unwrap();
        assert_eq!(channel.take_sent()[0].as_ref(), &[0xC0, 12]);
        assert!(controller.select_patch(50).is_err());

        let mut offline = Controller::new(LoopbackChannel::new());
        assert!(matches!(
            offline.select_patch(1),
            Err(ControlError::Encode(EncodeError::WrongMode { .. }))
        ));
    }

    #[test]
    fn inbound_messages_processed_in_order() {
        let (mut controller, channel) = connected();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        controller
            .on_patch_change(move |n| {
                s.lock().unwrap().push(format!("pc {n}"));
                Ok(())
            })
            .unwrap();
        let s = Arc::clone(&seen);
        controller
            .on_patch_data_received(move |patch: &Patch| {
                s.lock().unwrap().push(patch.name.clone());
                Ok(())
            })
            .unwrap();

        assert!(channel.inject(&[0xC0, 4]));
        assert!(channel.inject(&dump(b"LEAD1")));
        assert!(seen.lock().unwrap().is_empty());

        let outcomes = controller.process_inbound();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["pc 4", "LEAD1"]);
        assert_eq!(controller.current_patch().unwrap().name, "LEAD1");
        assert!(controller.process_inbound().is_empty());
    }

    #[test]
    fn disconnect_discards_pending() {
        let (mut controller, channel) = connected();
        controller.handle_message(&dump(b"OLD"));
        channel.inject(&dump(b"PENDING"));

        controller.disconnect().unwrap();
        assert_eq!(controller.state(), SessionState::PoweredOff);
        assert!(controller.current_patch().is_none());
        assert!(controller.process_inbound().is_empty());
        assert!(!channel.has_subscriber());
    }

    #[test]
    fn duplicate_subscriber_rejected() {
        let (mut controller, _) = connected();
        controller.on_control_change(|_, _| Ok(())).unwrap();
        assert!(matches!(
            controller.on_control_change(|_, _| Ok(())),
            Err(ControlError::Dispatch(DispatchError::AlreadyRegistered(_)))
        ));
    }

    #[test]
    fn other_device_id() {
        let channel = LoopbackChannel::new();
        let mut controller =
            Controller::with_config(channel.clone(), ControllerConfig::for_device(0x58));
        controller.connect().unwrap();
        controller.request_current_patch().unwrap();
        assert_eq!(channel.take_sent()[0][3], 0x58);
    }

    #[test]
    fn undrained_diagnostics_are_capped() {
        let channel = LoopbackChannel::new();
        let config = ControllerConfig {
            diagnostic_capacity: 4,
            ..ControllerConfig::default()
        };
        let mut controller = Controller::with_config(channel.clone(), config);
        controller.on_patch_change(|_| Err("locked".into())).unwrap();
        controller.connect().unwrap();

        for round in 0..5u8 {
            for n in 0..20u8 {
                channel.inject(&[0xC0, n]);
            }
            assert_eq!(controller.process_inbound().len(), 20, "round {round}");
        }

        assert_eq!(controller.dropped_diagnostics(), 96);
        assert_eq!(controller.take_diagnostics().len(), 4);
    }
}
