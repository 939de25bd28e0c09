//! Capability classifier.
//!
//! Walks a HID Report Descriptor (the HOGP "report map") just far enough
//! to tell which kinds of input device it describes.  Field layout is
//! left to the report parser; here we only look at application
//! collections and the report IDs their inputs use.
//!
//! ## HID Report Descriptor Structure
//!
//! A Report Descriptor is a sequence of short items, each a prefix byte
//! (tag, type, size) followed by 0, 1, 2 or 4 data bytes:
//! - Usage Page (global): category of usages
//! - Usage (local): function within that page
//! - Collection (main): groups items; an *Application* collection
//!   names the device kind through the usage preceding it
//! - Report ID (global): tags subsequent reports
//! - Input (main): a field the device sends
//!
//! ## Limitations
//!
//! - Push/Pop state is not supported
//! - Long items are skipped
//! - Only Generic Desktop application collections are classified

use crate::hid::DeviceTypes;

/// Usage page codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsagePage {
    /// Generic Desktop (mouse, keyboard, joystick).
    GenericDesktop,
    /// Keyboard/Keypad.
    Keyboard,
    /// Button.
    Button,
    /// Consumer Control.
    Consumer,
    /// Unknown/unsupported.
    Unknown(u16),
}

impl From<u16> for UsagePage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => UsagePage::GenericDesktop,
            0x07 => UsagePage::Keyboard,
            0x09 => UsagePage::Button,
            0x0C => UsagePage::Consumer,
            other => UsagePage::Unknown(other),
        }
    }
}

/// Generic Desktop usage codes that name an application collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DesktopUsage {
    Pointer,
    Mouse,
    Joystick,
    Gamepad,
    Keyboard,
    Unknown(u16),
}

impl From<u16> for DesktopUsage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => DesktopUsage::Pointer,
            0x02 => DesktopUsage::Mouse,
            0x04 => DesktopUsage::Joystick,
            0x05 => DesktopUsage::Gamepad,
            0x06 => DesktopUsage::Keyboard,
            other => DesktopUsage::Unknown(other),
        }
    }
}

impl DesktopUsage {
    fn device_types(self) -> DeviceTypes {
        match self {
            DesktopUsage::Pointer | DesktopUsage::Mouse => DeviceTypes::MOUSE,
            DesktopUsage::Joystick | DesktopUsage::Gamepad => DeviceTypes::GAMEPAD,
            _ => DeviceTypes::NONE,
        }
    }
}

/// What the report map describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorSummary {
    pub types: DeviceTypes,
    /// Report ID of the first mouse input, when the map uses report IDs.
    pub mouse_report_id: Option<u8>,
    /// Report ID of the first gamepad input, when the map uses report IDs.
    pub gamepad_report_id: Option<u8>,
}

const MAIN_INPUT: u8 = 0x08;
const MAIN_COLLECTION: u8 = 0x0A;
const MAIN_END_COLLECTION: u8 = 0x0C;
const GLOBAL_USAGE_PAGE: u8 = 0x00;
const GLOBAL_REPORT_ID: u8 = 0x08;
const LOCAL_USAGE: u8 = 0x00;
const COLLECTION_APPLICATION: u32 = 0x01;
const LONG_ITEM_PREFIX: u8 = 0xFE;

/// Classify a report map into device-type flags.
pub fn detect_device_types(data: &[u8]) -> DeviceTypes {
    summarize(data).types
}

/// Walk a report map and collect its device types and report IDs.
pub fn summarize(data: &[u8]) -> DescriptorSummary {
    let mut summary = DescriptorSummary::default();

    // Parser state.
    let mut usage_page: u16 = 0;
    let mut usage: Option<(u16, u16)> = None;
    let mut report_id: u8 = 0;
    let mut depth: usize = 0;
    let mut application = DeviceTypes::NONE;

    let mut i = 0;
    while i < data.len() {
        let prefix = data[i];

        if prefix == LONG_ITEM_PREFIX {
            let Some(&len) = data.get(i + 1) else { break };
            i += 3 + len as usize;
            continue;
        }

        let tag = (prefix >> 4) & 0x0F;
        let item_type = (prefix >> 2) & 0x03;
        let size = match prefix & 0x03 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };

        if i + 1 + size > data.len() {
            break;
        }

        let value: u32 = match size {
            0 => 0,
            1 => data[i + 1] as u32,
            2 => u16::from_le_bytes([data[i + 1], data[i + 2]]) as u32,
            _ => u32::from_le_bytes([data[i + 1], data[i + 2], data[i + 3], data[i + 4]]),
        };

        match item_type {
            // Main items
            0 => {
                match tag {
                    MAIN_COLLECTION => {
                        if depth == 0 && value == COLLECTION_APPLICATION {
                            application = match usage {
                                Some((page, id)) if UsagePage::from(page) == UsagePage::GenericDesktop => {
                                    DesktopUsage::from(id).device_types()
                                }
                                _ => DeviceTypes::NONE,
                            };
                            summary.types = summary.types | application;
                        }
                        depth += 1;
                    }
                    MAIN_END_COLLECTION => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            application = DeviceTypes::NONE;
                        }
                    }
                    MAIN_INPUT => {
                        if report_id != 0 {
                            if application.contains(DeviceTypes::MOUSE)
                                && summary.mouse_report_id.is_none()
                            {
                                summary.mouse_report_id = Some(report_id);
                            }
                            if application.contains(DeviceTypes::GAMEPAD)
                                && summary.gamepad_report_id.is_none()
                            {
                                summary.gamepad_report_id = Some(report_id);
                            }
                        }
                    }
                    _ => {}
                }
                // Local state does not survive a main item.
                usage = None;
            }
            // Global items
            1 => match tag {
                GLOBAL_USAGE_PAGE => usage_page = value as u16,
                GLOBAL_REPORT_ID => report_id = value as u8,
                _ => {}
            },
            // Local items
            2 => {
                if tag == LOCAL_USAGE && usage.is_none() {
                    // A 4-byte usage carries its own page in the high half.
                    usage = Some(if size == 4 {
                        ((value >> 16) as u16, value as u16)
                    } else {
                        (usage_page, value as u16)
                    });
                }
            }
            _ => {}
        }

        i += 1 + size;
    }

    if summary.types.is_unknown() {
        debug!("HID descriptor: no mouse or gamepad collection found");
    }
    summary
}
