//! Field mappings handed to the report parser.
//!
//! A mapping tells the parser which usages of the report map to decode
//! and where to store them: button `n` lands in bit `n` of
//! [`InputFields::buttons`], the `i`-th listed axis usage in
//! [`InputFields::axes`]`[i]`.

use crate::hid::DeviceTypes;

/// Widest button bitfield a mapping can address.
pub const MAX_BUTTONS: usize = 32;

/// Axis slots in [`InputFields`].
pub const MAX_AXES: usize = 8;

/// Generic Desktop axis usages the mappings refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisUsage {
    X,
    Y,
    Z,
    Rz,
    Wheel,
    /// Reported as 0 = centered, 1..=8 = N, NE, E, SE, S, SW, W, NW.
    HatSwitch,
}

impl AxisUsage {
    /// Generic Desktop usage ID.
    pub const fn usage_id(&self) -> u16 {
        match self {
            AxisUsage::X => 0x30,
            AxisUsage::Y => 0x31,
            AxisUsage::Z => 0x32,
            AxisUsage::Rz => 0x35,
            AxisUsage::Wheel => 0x38,
            AxisUsage::HatSwitch => 0x39,
        }
    }
}

/// Mouse layout: buttons plus relative X/Y and wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseConfig {
    pub buttons: u8,
    pub axes: [AxisUsage; MouseConfig::NUM_AXES],
}

impl MouseConfig {
    pub const NUM_BUTTONS: u8 = 5;
    pub const NUM_AXES: usize = 3;

    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const WHEEL: usize = 2;

    pub const fn new() -> Self {
        Self {
            buttons: Self::NUM_BUTTONS,
            axes: [AxisUsage::X, AxisUsage::Y, AxisUsage::Wheel],
        }
    }
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Gamepad layout: buttons, two sticks and the hat switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadConfig {
    pub buttons: u8,
    pub axes: [AxisUsage; GamepadConfig::NUM_AXES],
}

impl GamepadConfig {
    pub const NUM_BUTTONS: u8 = 16;
    pub const NUM_AXES: usize = 5;

    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const Z: usize = 2;
    pub const RZ: usize = 3;
    pub const HAT_SWITCH: usize = 4;

    pub const fn new() -> Self {
        Self {
            buttons: Self::NUM_BUTTONS,
            axes: [
                AxisUsage::X,
                AxisUsage::Y,
                AxisUsage::Z,
                AxisUsage::Rz,
                AxisUsage::HatSwitch,
            ],
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parser configuration chosen from the classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldMapping {
    Mouse(MouseConfig),
    Gamepad(GamepadConfig),
}

impl FieldMapping {
    /// Pick the mapping for a classification. Gamepad wins over mouse
    /// when both flags are set; `None` for an unknown device.
    pub fn for_device_types(types: DeviceTypes) -> Option<Self> {
        if types.contains(DeviceTypes::GAMEPAD) {
            Some(FieldMapping::Gamepad(GamepadConfig::new()))
        } else if types.contains(DeviceTypes::MOUSE) {
            Some(FieldMapping::Mouse(MouseConfig::new()))
        } else {
            None
        }
    }

    pub fn button_count(&self) -> u8 {
        match self {
            FieldMapping::Mouse(cfg) => cfg.buttons,
            FieldMapping::Gamepad(cfg) => cfg.buttons,
        }
    }

    pub fn axes(&self) -> &[AxisUsage] {
        match self {
            FieldMapping::Mouse(cfg) => &cfg.axes,
            FieldMapping::Gamepad(cfg) => &cfg.axes,
        }
    }

    /// Slot in [`InputFields::axes`] that receives `usage`.
    pub fn axis_slot(&self, usage: AxisUsage) -> Option<usize> {
        self.axes().iter().position(|&a| a == usage)
    }
}

/// Button bitfield, index = logical button number (0-based).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSet(u32);

impl ButtonSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub fn get(&self, index: usize) -> bool {
        index < MAX_BUTTONS && self.0 & (1 << index) != 0
    }

    pub fn set(&mut self, index: usize, pressed: bool) {
        if index >= MAX_BUTTONS {
            return;
        }
        if pressed {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    /// Drop every button at or above `count`.
    pub fn truncate(&mut self, count: u8) {
        if (count as usize) < MAX_BUTTONS {
            self.0 &= (1u32 << count) - 1;
        }
    }
}

/// Decoded field buffers the parser writes into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputFields {
    pub buttons: ButtonSet,
    pub axes: [i32; MAX_AXES],
}

impl InputFields {
    pub const fn new() -> Self {
        Self {
            buttons: ButtonSet::empty(),
            axes: [0; MAX_AXES],
        }
    }

    /// Axis value, 0 for a slot outside the buffer.
    pub fn axis(&self, slot: usize) -> i32 {
        self.axes.get(slot).copied().unwrap_or(0)
    }
}
