//! Application-wide constants and connection configuration.
//!
//! Timing parameters, GATT identities and capacity limits live here so
//! they can be tuned in one place.

use crate::ble::ConnParams;

// BLE link

/// BLE connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms, 12 = 15 ms.  Safe for three peripherals sharing the radio.
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE peripheral latency (number of connection events the peer can skip).
pub const BLE_PERIPHERAL_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 150 = 1.5 s.
pub const BLE_SUP_TIMEOUT: u16 = 150;

/// How long a single connection attempt may take before the stack gives up (ms).
pub const BLE_CONNECT_TIMEOUT_MS: u32 = 5_000;

/// Simultaneous connections the platform supports when the stack does
/// not report its own limit.
pub const BLE_DEFAULT_MAX_CONNECTIONS: usize = 3;

// Pairing

/// Passkey handed out on passkey-entry pairing.
pub const BLE_PASSKEY: u32 = 123_456;

// HID-over-GATT identities (16-bit SIG UUIDs)

pub const HID_SERVICE_UUID: u16 = 0x1812;
pub const HID_INFORMATION_UUID: u16 = 0x2A4A;
pub const HID_REPORT_MAP_UUID: u16 = 0x2A4B;
pub const HID_CONTROL_POINT_UUID: u16 = 0x2A4C;
pub const HID_REPORT_DATA_UUID: u16 = 0x2A4D;
pub const REPORT_REFERENCE_UUID: u16 = 0x2908;

// Capacities

/// Largest report map accepted (HIDS caps the characteristic at 512 bytes).
pub const REPORT_MAP_CAPACITY: usize = 512;

/// Characteristics a transport returns for one service enumeration.
pub const MAX_SERVICE_CHARACTERISTICS: usize = 16;

/// Report subscriptions recorded per session.
pub const MAX_SUBSCRIPTIONS: usize = 8;

/// Raw advertising payload kept per device (advertisement + scan response).
pub const ADV_DATA_CAPACITY: usize = 62;

/// Runtime knobs for [`HidConnection`](crate::ble::connection::HidConnection).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectConfig {
    /// Link parameters applied to freshly created clients.
    pub conn_params: ConnParams,
    /// Connect timeout applied to freshly created clients (ms).
    pub connect_timeout_ms: u32,
    /// Fail the attempt when no report characteristic could be subscribed.
    ///
    /// Off by default: a session with zero subscriptions is reported as
    /// connected and left to the caller to treat as degraded.
    pub require_subscription: bool,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            conn_params: ConnParams {
                min_interval: BLE_CONN_INTERVAL_MIN,
                max_interval: BLE_CONN_INTERVAL_MAX,
                latency: BLE_PERIPHERAL_LATENCY,
                supervision_timeout: BLE_SUP_TIMEOUT,
            },
            connect_timeout_ms: BLE_CONNECT_TIMEOUT_MS,
            require_subscription: false,
        }
    }
}
