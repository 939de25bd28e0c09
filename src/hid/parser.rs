//! Interface to the HID report parser.
//!
//! Descriptor parsing itself lives outside this crate.  The session
//! asks the parser to classify the report map, initializes it with the
//! chosen [`FieldMapping`] and then feeds it every notification.

use crate::error::ParserError;
use crate::hid::classify;
use crate::hid::mapping::{FieldMapping, InputFields};
use crate::hid::DeviceTypes;

pub trait ReportParser {
    /// Decide which device types the report map describes.
    fn classify(&self, descriptor: &[u8]) -> DeviceTypes {
        classify::detect_device_types(descriptor)
    }

    /// Prepare to decode reports described by `descriptor` into the
    /// slots of `mapping`.
    fn init(&mut self, mapping: &FieldMapping, descriptor: &[u8]) -> Result<(), ParserError>;

    /// Decode one report, tagged with the report ID bound at subscribe
    /// time, into `fields`. Fields the report does not carry are left
    /// untouched.
    fn parse(
        &mut self,
        payload: &[u8],
        report_id: u8,
        fields: &mut InputFields,
    ) -> Result<(), ParserError>;

    /// Report IDs the last `init` mapped to fields.
    fn num_mappings(&self) -> usize;
}
