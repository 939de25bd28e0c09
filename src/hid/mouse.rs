//! Boot-protocol mouse parser.
//!
//! Many BLE mice send plain boot-layout input reports even in Report
//! Protocol mode.  This parser decodes that layout directly, so a mouse
//! session can run without a full descriptor parser.
//!
//! Layout (3 or 4 bytes, after the report ID has been stripped by the
//! GATT layer):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel  (signed, -127..127), optional
//! ```

use crate::error::ParserError;
use crate::hid::classify;
use crate::hid::mapping::{ButtonSet, FieldMapping, InputFields, MouseConfig};
use crate::hid::parser::ReportParser;

/// Boot-layout mouse input report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = left, bit 1 = right, bit 2 = middle).
    pub buttons: u8,
    /// Relative X movement (signed).
    pub x: i8,
    /// Relative Y movement (signed).
    pub y: i8,
    /// Scroll wheel delta (signed).
    pub wheel: i8,
}

impl MouseReport {
    /// Parse from raw BLE HID notification bytes.
    ///
    /// Accepts 3-byte (no wheel) or 4-byte (with wheel) reports.
    pub fn from_ble_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }
        Some(Self {
            buttons: data[0],
            x: data[1] as i8,
            y: data[2] as i8,
            wheel: if data.len() >= 4 { data[3] as i8 } else { 0 },
        })
    }
}

/// [`ReportParser`] for boot-layout mice.
///
/// Only accepts a mouse mapping.  When the report map tags its mouse
/// input with a report ID, notifications carrying other IDs are ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct BootMouseParser {
    config: Option<MouseConfig>,
    report_id: Option<u8>,
}

impl BootMouseParser {
    pub const fn new() -> Self {
        Self {
            config: None,
            report_id: None,
        }
    }

    /// Report ID the mouse input uses, if the report map declares one.
    pub fn report_id(&self) -> Option<u8> {
        self.report_id
    }
}

impl ReportParser for BootMouseParser {
    fn init(&mut self, mapping: &FieldMapping, descriptor: &[u8]) -> Result<(), ParserError> {
        match mapping {
            FieldMapping::Mouse(cfg) => {
                self.config = Some(*cfg);
                self.report_id = classify::summarize(descriptor).mouse_report_id;
                Ok(())
            }
            FieldMapping::Gamepad(_) => {
                self.config = None;
                self.report_id = None;
                Err(ParserError::UNSUPPORTED_MAPPING)
            }
        }
    }

    fn parse(
        &mut self,
        payload: &[u8],
        report_id: u8,
        fields: &mut InputFields,
    ) -> Result<(), ParserError> {
        let cfg = self.config.ok_or(ParserError::NOT_CONFIGURED)?;
        if matches!(self.report_id, Some(id) if id != report_id) {
            return Ok(());
        }

        let report = MouseReport::from_ble_bytes(payload).ok_or(ParserError::SHORT_REPORT)?;

        let mut buttons = ButtonSet::from_bits(report.buttons as u32);
        buttons.truncate(cfg.buttons);
        fields.buttons = buttons;
        fields.axes[MouseConfig::X] = report.x as i32;
        fields.axes[MouseConfig::Y] = report.y as i32;
        fields.axes[MouseConfig::WHEEL] = report.wheel as i32;
        Ok(())
    }

    fn num_mappings(&self) -> usize {
        usize::from(self.config.is_some())
    }
}
