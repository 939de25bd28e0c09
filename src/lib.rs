//! bleamiga - BLE HID session layer.
//!
//! Discovers one BLE HID peripheral (mouse or gamepad), connects to it,
//! classifies its report map, subscribes to its input reports and
//! aggregates the decoded input into a state the consumer polls:
//!
//! ```text
//! Scanner ──candidate──▶ HidConnection ──subscribe──▶ RemoteCharacteristic
//!                              │                              │
//!                      classify/configure               notifications
//!                              ▼                              ▼
//!                         HidSession ◀──── NotificationDispatcher
//!                              │
//!                    consumer polls buttons, axes, deltas
//! ```
//!
//! The BLE stack is abstracted by [`ble::transport`]; the HID descriptor
//! parser by [`hid::parser::ReportParser`].  Shared objects are `'static`
//! and guarded by `embassy-sync` critical-section mutexes, so the crate
//! runs the same on target (`no_std`) and on the host under test.
//!
//! Logging goes through `defmt` or `log` depending on the enabled
//! feature, and compiles away when neither is.

#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod ble;
pub mod config;
pub mod error;
pub mod hid;
pub mod session;

pub use ble::connection::{ConnectionState, HidConnection, SessionSummary};
pub use ble::scanner::{HidScanFilter, Scanner};
pub use config::ConnectConfig;
pub use error::{ConnectError, ParserError, TransportError};
pub use hid::{DeviceKind, DeviceTypes};
pub use session::HidSession;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
