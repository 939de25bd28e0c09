//! HID input side: device classification, field mappings, report state
//! and the notification path feeding the report parser.

pub mod classify;
pub mod dispatch;
pub mod mapping;
pub mod mouse;
pub mod parser;
pub mod state;


use core::fmt;
use core::ops::BitOr;

use mapping::{FieldMapping, GamepadConfig, MouseConfig};

/// Non-exclusive device-type flags produced by the classifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceTypes(u8);

impl DeviceTypes {
    pub const NONE: DeviceTypes = DeviceTypes(0);
    pub const MOUSE: DeviceTypes = DeviceTypes(1 << 0);
    pub const GAMEPAD: DeviceTypes = DeviceTypes(1 << 1);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::MOUSE.0 | Self::GAMEPAD.0))
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: DeviceTypes) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Neither mouse nor gamepad.
    pub const fn is_unknown(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DeviceTypes {
    type Output = DeviceTypes;

    fn bitor(self, rhs: Self) -> Self {
        DeviceTypes(self.0 | rhs.0)
    }
}

/// What the current session is, fixed once at classification time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    #[default]
    Unclassified,
    Mouse(MouseConfig),
    Gamepad(GamepadConfig),
}

impl DeviceKind {
    pub fn is_mouse(&self) -> bool {
        matches!(self, DeviceKind::Mouse(_))
    }

    pub fn is_gamepad(&self) -> bool {
        matches!(self, DeviceKind::Gamepad(_))
    }
}

impl From<FieldMapping> for DeviceKind {
    fn from(mapping: FieldMapping) -> Self {
        match mapping {
            FieldMapping::Mouse(cfg) => DeviceKind::Mouse(cfg),
            FieldMapping::Gamepad(cfg) => DeviceKind::Gamepad(cfg),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Unclassified => f.write_str("unclassified"),
            DeviceKind::Mouse(_) => f.write_str("mouse"),
            DeviceKind::Gamepad(_) => f.write_str("gamepad"),
        }
    }
}
