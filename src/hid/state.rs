//! Report state aggregator.
//!
//! Holds what the consumer polls: decoded buttons/axes for the current
//! device kind and the mouse motion accumulator.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::hid::mapping::{GamepadConfig, InputFields, MouseConfig};
use crate::hid::DeviceKind;

/// Hat switch to digital X, indexed by hat value:
/// center, N, NE, E, SE, S, SW, W, NW.
const HAT_X: [i32; 9] = [0, 0, 1, 1, 1, 0, -1, -1, -1];
/// Hat switch to digital Y (negative = up), same indexing as [`HAT_X`].
const HAT_Y: [i32; 9] = [0, -1, -1, 0, 1, 1, 1, 0, -1];

/// Translate a hat value into a digital (x, y) direction.
///
/// Values outside 0..=8 read as centered.
pub fn hat_to_digital(hat: i32) -> (i32, i32) {
    let index = if (0..=8).contains(&hat) { hat as usize } else { 0 };
    (HAT_X[index], HAT_Y[index])
}

/// Decoded input of the current session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportState {
    kind: DeviceKind,
    fields: InputFields,
}

impl ReportState {
    pub const fn new() -> Self {
        Self {
            kind: DeviceKind::Unclassified,
            fields: InputFields::new(),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Switch to a new device kind and clear all decoded fields.
    pub fn reset(&mut self, kind: DeviceKind) {
        self.kind = kind;
        self.fields = InputFields::new();
    }

    pub fn fields(&self) -> &InputFields {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut InputFields {
        &mut self.fields
    }

    /// Relative mouse axes only describe the report they came in, so
    /// they are zeroed before the next one is decoded.
    pub(crate) fn begin_report(&mut self) {
        if self.kind.is_mouse() {
            self.fields.axes[MouseConfig::X] = 0;
            self.fields.axes[MouseConfig::Y] = 0;
            self.fields.axes[MouseConfig::WHEEL] = 0;
        }
    }

    /// X/Y motion carried by the last decoded mouse report.
    pub(crate) fn mouse_motion(&self) -> Option<(i32, i32)> {
        match self.kind {
            DeviceKind::Mouse(_) => Some((
                self.fields.axis(MouseConfig::X),
                self.fields.axis(MouseConfig::Y),
            )),
            _ => None,
        }
    }

    // Mouse

    pub fn mouse_button(&self, index: usize) -> bool {
        match self.kind {
            DeviceKind::Mouse(cfg) if index < cfg.buttons as usize => self.fields.buttons.get(index),
            _ => false,
        }
    }

    pub fn mouse_wheel(&self) -> i32 {
        match self.kind {
            DeviceKind::Mouse(_) => self.fields.axis(MouseConfig::WHEEL),
            _ => 0,
        }
    }

    // Gamepad

    pub fn gamepad_button(&self, index: usize) -> bool {
        match self.kind {
            DeviceKind::Gamepad(cfg) if index < cfg.buttons as usize => {
                self.fields.buttons.get(index)
            }
            _ => false,
        }
    }

    fn gamepad_axis(&self, slot: usize) -> i32 {
        match self.kind {
            DeviceKind::Gamepad(_) => self.fields.axis(slot),
            _ => 0,
        }
    }

    pub fn gamepad_left_stick_x(&self) -> i32 {
        self.gamepad_axis(GamepadConfig::X)
    }

    pub fn gamepad_left_stick_y(&self) -> i32 {
        self.gamepad_axis(GamepadConfig::Y)
    }

    pub fn gamepad_hat(&self) -> i32 {
        self.gamepad_axis(GamepadConfig::HAT_SWITCH)
    }

    pub fn gamepad_digital_x(&self) -> i32 {
        hat_to_digital(self.gamepad_hat()).0
    }

    pub fn gamepad_digital_y(&self) -> i32 {
        hat_to_digital(self.gamepad_hat()).1
    }
}

/// Accumulated, not yet consumed mouse motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseDelta {
    pub x: i32,
    pub y: i32,
}

impl MouseDelta {
    pub const ZERO: MouseDelta = MouseDelta { x: 0, y: 0 };
}

/// Mouse motion accumulator shared between the notification context
/// (writer) and the consumer (reader/reset).
pub struct MouseMotion {
    acc: Mutex<CriticalSectionRawMutex, Cell<MouseDelta>>,
}

impl MouseMotion {
    pub const fn new() -> Self {
        Self {
            acc: Mutex::new(Cell::new(MouseDelta::ZERO)),
        }
    }

    pub fn accumulate(&self, dx: i32, dy: i32) {
        self.acc.lock(|acc| {
            let d = acc.get();
            acc.set(MouseDelta {
                x: d.x.saturating_add(dx),
                y: d.y.saturating_add(dy),
            });
        });
    }

    /// Current totals; does not consume them.
    pub fn delta(&self) -> MouseDelta {
        self.acc.lock(|acc| acc.get())
    }

    pub fn reset(&self) {
        self.acc.lock(|acc| acc.set(MouseDelta::ZERO));
    }

    /// Read and reset in one step, so no motion slips in between.
    pub fn take(&self) -> MouseDelta {
        self.acc.lock(|acc| acc.replace(MouseDelta::ZERO))
    }
}

impl Default for MouseMotion {
    fn default() -> Self {
        Self::new()
    }
}
