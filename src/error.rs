//! Error types for bleamiga.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging and `Display` for host logging.

use core::fmt;

/// Failure reported by the BLE stack for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The operation did not complete within its deadline.
    Timeout,
    /// The link is not (or no longer) established.
    NotConnected,
    /// The peer or the stack refused the request.
    Rejected,
    /// Raw stack status code.
    Raw(i32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => f.write_str("timed out"),
            TransportError::NotConnected => f.write_str("not connected"),
            TransportError::Rejected => f.write_str("rejected"),
            TransportError::Raw(code) => write!(f, "stack error {}", code),
        }
    }
}

/// Non-zero result code from the HID report parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParserError(pub i32);

impl ParserError {
    /// `parse` was called before a successful `init`.
    pub const NOT_CONFIGURED: ParserError = ParserError(-1);
    /// The requested field mapping is not supported by this parser.
    pub const UNSUPPORTED_MAPPING: ParserError = ParserError(-2);
    /// The payload is shorter than the report layout.
    pub const SHORT_REPORT: ParserError = ParserError(-3);
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parser result {}", self.0)
    }
}

/// Terminal outcome of one `connect` attempt.
///
/// Every variant past acquisition is returned only after the link has
/// been torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectError {
    /// A session is already up; disconnect it first.
    Busy,
    /// Fast-path reconnect through an existing client for this peer failed.
    ReconnectFailed,
    /// The stack could not hand out a new client.
    ClientCreateFailed,
    /// The GAP connection could not be established.
    ConnectFailed,
    /// The peer exposes no HID service (0x1812).
    HidServiceNotFound,
    /// Characteristic enumeration on the HID service failed.
    DiscoveryFailed,
    /// The HID service has no report map characteristic (0x2A4B).
    ReportMapNotFound,
    /// The report map is not readable or the read failed.
    ReportMapUnreadable,
    /// The report map read back empty.
    ReportMapEmpty,
    /// The report map describes neither a mouse nor a gamepad.
    UnsupportedDevice,
    /// The report parser rejected the report map.
    ParserInit(ParserError),
    /// Enabling notifications on a report characteristic failed.
    SubscribeFailed,
    /// No report characteristic could be subscribed and the config requires one.
    NoSubscriptions,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Busy => f.write_str("session already active"),
            ConnectError::ReconnectFailed => f.write_str("reconnect failed"),
            ConnectError::ClientCreateFailed => f.write_str("could not create client"),
            ConnectError::ConnectFailed => f.write_str("failed to connect"),
            ConnectError::HidServiceNotFound => f.write_str("HID service not found"),
            ConnectError::DiscoveryFailed => f.write_str("characteristic discovery failed"),
            ConnectError::ReportMapNotFound => f.write_str("HID report map not found"),
            ConnectError::ReportMapUnreadable => f.write_str("HID report map can't be read"),
            ConnectError::ReportMapEmpty => f.write_str("HID report map is empty"),
            ConnectError::UnsupportedDevice => f.write_str("unexpected device type"),
            ConnectError::ParserInit(e) => write!(f, "parser init failed ({})", e),
            ConnectError::SubscribeFailed => f.write_str("subscribe notification failed"),
            ConnectError::NoSubscriptions => f.write_str("no report characteristic subscribed"),
        }
    }
}

impl From<ParserError> for ConnectError {
    fn from(e: ParserError) -> Self {
        ConnectError::ParserInit(e)
    }
}
