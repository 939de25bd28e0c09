//! The one HID session: link liveness plus decoded input.
//!
//! A `HidSession` is shared between the BLE stack (client callbacks and
//! report notifications) and the consumer polling input, so it lives in
//! a `'static`, typically a `static_cell::StaticCell`:
//!
//! ```ignore
//! static SESSION: StaticCell<HidSession<BootMouseParser>> = StaticCell::new();
//! let session = SESSION.init(HidSession::new(BootMouseParser::new()));
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::BLE_PASSKEY;
use crate::hid::dispatch::{NotificationDispatcher, ReportSink};
use crate::hid::parser::ReportParser;
use crate::hid::state::MouseDelta;
use crate::hid::DeviceKind;

pub struct HidSession<P> {
    connected: AtomicBool,
    passkey: u32,
    dispatcher: NotificationDispatcher<P>,
}

impl<P: ReportParser> HidSession<P> {
    pub const fn new(parser: P) -> Self {
        Self::with_passkey(parser, BLE_PASSKEY)
    }

    pub const fn with_passkey(parser: P, passkey: u32) -> Self {
        Self {
            connected: AtomicBool::new(false),
            passkey,
            dispatcher: NotificationDispatcher::new(parser),
        }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<P> {
        &self.dispatcher
    }

    pub(crate) fn passkey(&self) -> u32 {
        self.passkey
    }

    /// Link state as last reported by the stack's connect/disconnect callbacks.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn device_kind(&self) -> DeviceKind {
        self.dispatcher.kind()
    }

    pub fn is_mouse(&self) -> bool {
        self.device_kind().is_mouse()
    }

    pub fn is_gamepad(&self) -> bool {
        self.device_kind().is_gamepad()
    }

    // Gamepad

    /// Digital X derived from the hat switch: -1 left, 0 center, 1 right.
    pub fn gamepad_digital_x_axis(&self) -> i32 {
        self.dispatcher.with_state(|s| s.gamepad_digital_x())
    }

    /// Digital Y derived from the hat switch: -1 up, 0 center, 1 down.
    pub fn gamepad_digital_y_axis(&self) -> i32 {
        self.dispatcher.with_state(|s| s.gamepad_digital_y())
    }

    pub fn gamepad_left_stick_x_axis(&self) -> i32 {
        self.dispatcher.with_state(|s| s.gamepad_left_stick_x())
    }

    pub fn gamepad_left_stick_y_axis(&self) -> i32 {
        self.dispatcher.with_state(|s| s.gamepad_left_stick_y())
    }

    pub fn gamepad_button(&self, index: usize) -> bool {
        self.dispatcher.with_state(|s| s.gamepad_button(index))
    }

    // Mouse

    pub fn mouse_delta_x(&self) -> i32 {
        self.dispatcher.motion().delta().x
    }

    pub fn mouse_delta_y(&self) -> i32 {
        self.dispatcher.motion().delta().y
    }

    /// Both accumulated deltas, read together.
    pub fn mouse_deltas(&self) -> MouseDelta {
        self.dispatcher.motion().delta()
    }

    pub fn reset_mouse_deltas(&self) {
        self.dispatcher.motion().reset();
    }

    /// Read the accumulated deltas and zero them atomically.
    pub fn take_mouse_deltas(&self) -> MouseDelta {
        self.dispatcher.motion().take()
    }

    pub fn mouse_button(&self, index: usize) -> bool {
        self.dispatcher.with_state(|s| s.mouse_button(index))
    }

    /// Wheel value of the last mouse report (not accumulated).
    pub fn mouse_wheel(&self) -> i32 {
        self.dispatcher.with_state(|s| s.mouse_wheel())
    }
}

impl<P: ReportParser> ReportSink for HidSession<P> {
    fn on_report(&self, payload: &[u8], report_id: u8) {
        self.dispatcher.on_report(payload, report_id);
    }
}
