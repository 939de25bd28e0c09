//! Bluetooth Low Energy subsystem.
//!
//! This module drives an external BLE stack in **Central** role:
//!
//! 1. **Scanner** - discovers nearby BLE peripherals advertising the
//!    HID-over-GATT Profile (HOGP) and hands one candidate over.
//! 2. **Connection Manager** - acquires a client (reuse or create),
//!    enforces the bonding limit and keeps at most one live session.
//! 3. **HID Client** - performs GATT service/characteristic discovery
//!    on the connected peripheral, classifies its report map and
//!    subscribes to every HID Report characteristic with a known report ID.
//! 4. **Security** - link/pairing callbacks installed on every client.
//!
//! The stack itself is abstracted by the traits in [`transport`].

pub mod adv_parser;
pub mod connection;
pub mod hid_client;
pub mod scanner;
pub mod security;
pub mod transport;

use core::fmt;

/// 48-bit BLE device address, most significant byte first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(pub [u8; 6]);

impl Address {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Connection handle assigned by the stack.
pub type ConnHandle = u16;

/// GAP connection parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnParams {
    /// Minimum connection interval (1.25 ms units).
    pub min_interval: u16,
    /// Maximum connection interval (1.25 ms units).
    pub max_interval: u16,
    /// Peripheral latency (connection events).
    pub latency: u16,
    /// Supervision timeout (10 ms units).
    pub supervision_timeout: u16,
}

/// Security state of a link, reported when pairing completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnDesc {
    pub conn_handle: ConnHandle,
    pub encrypted: bool,
    pub authenticated: bool,
    pub bonded: bool,
}
