//! BLE GATT HID Client - reads, classifies and subscribes to the HID
//! service of a connected peripheral.
//!
//! Once the connection manager has found the HID Service (UUID 0x1812),
//! this module:
//! 1. Reads the Report Map characteristic (UUID 0x2A4B).
//! 2. Classifies it and configures the report parser for the chosen
//!    field mapping.
//! 3. Enumerates all HID Report characteristics (UUID 0x2A4D), reads the
//!    Report Reference descriptor (UUID 0x2908) of each to get its report
//!    ID, and enables notifications tagged with that ID.

use heapless::Vec;

use crate::ble::transport::{RemoteCharacteristic, RemoteDescriptor, RemoteService};
use crate::config::{
    HID_REPORT_DATA_UUID, HID_REPORT_MAP_UUID, MAX_SUBSCRIPTIONS, REPORT_REFERENCE_UUID,
};
use crate::error::ConnectError;
use crate::hid::dispatch::{NotificationDispatcher, NotifyHandler, ReportSink};
use crate::hid::mapping::FieldMapping;
use crate::hid::parser::ReportParser;
use crate::hid::DeviceKind;

/// One HID Report characteristic with notifications enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Subscription {
    /// Attribute handle of the characteristic value.
    pub handle: u16,
    /// Report ID from its Report Reference descriptor.
    pub report_id: u8,
}

/// Read the report map into `buf`, returning its length.
pub async fn read_report_map<S: RemoteService>(
    service: &S,
    buf: &mut [u8],
) -> Result<usize, ConnectError> {
    let Some(report_map) = service.characteristic(HID_REPORT_MAP_UUID).await else {
        warn!("HID report map not found");
        return Err(ConnectError::ReportMapNotFound);
    };

    if !report_map.can_read() {
        warn!("HID report map can't be read");
        return Err(ConnectError::ReportMapUnreadable);
    }

    let len = match report_map.read_value(buf).await {
        Ok(len) => len.min(buf.len()),
        Err(e) => {
            warn!("HID report map read failed: {}", e);
            return Err(ConnectError::ReportMapUnreadable);
        }
    };

    if len == 0 {
        warn!("HID report map is empty");
        return Err(ConnectError::ReportMapEmpty);
    }

    debug!("HID report map: {} bytes", len);
    Ok(len)
}

/// Classify `descriptor` and initialize the parser for it.
///
/// Gamepad wins over mouse when both are described.  Returns the kind the
/// session now has.
pub fn classify_and_configure<P: ReportParser>(
    dispatcher: &NotificationDispatcher<P>,
    descriptor: &[u8],
) -> Result<DeviceKind, ConnectError> {
    let types = dispatcher.classify(descriptor);

    let Some(mapping) = FieldMapping::for_device_types(types) else {
        warn!("Unexpected device type (flags {})", types.bits());
        return Err(ConnectError::UnsupportedDevice);
    };

    let mappings = dispatcher.configure(mapping, descriptor).map_err(|e| {
        warn!("Report parser init failed: {}", e);
        ConnectError::ParserInit(e)
    })?;

    let kind = DeviceKind::from(mapping);
    info!("Device is {} (reportId mappings: {})", kind, mappings);
    Ok(kind)
}

/// Report ID from the characteristic's Report Reference descriptor, if
/// it has one that reads back non-empty.
async fn read_report_id<C: RemoteCharacteristic>(characteristic: &C) -> Option<u8> {
    let descriptor = characteristic.descriptor(REPORT_REFERENCE_UUID).await?;
    // [report ID, report type]
    let mut value = [0u8; 2];
    match descriptor.read_value(&mut value).await {
        Ok(n) if n > 0 => Some(value[0]),
        Ok(_) => None,
        Err(e) => {
            debug!("Report reference read failed: {}", e);
            None
        }
    }
}

/// Subscribe to every notifiable HID Report characteristic that carries a
/// Report Reference descriptor, delivering its notifications to `sink`.
///
/// Returns how many subscriptions were made; they are also recorded in
/// `subscriptions` as far as it has room.  Any subscribe failure aborts.
pub async fn subscribe_reports<S: RemoteService>(
    service: &S,
    sink: &'static dyn ReportSink,
    subscriptions: &mut Vec<Subscription, MAX_SUBSCRIPTIONS>,
) -> Result<usize, ConnectError> {
    let characteristics = service.characteristics(true).await.map_err(|e| {
        warn!("HID characteristic discovery failed: {}", e);
        ConnectError::DiscoveryFailed
    })?;

    let mut count = 0;
    for characteristic in characteristics
        .iter()
        .filter(|c| c.uuid() == HID_REPORT_DATA_UUID && c.can_notify())
    {
        let Some(report_id) = read_report_id(characteristic).await else {
            debug!(
                "Report characteristic {} has no report reference, skipping",
                characteristic.handle()
            );
            continue;
        };

        if let Err(e) = characteristic
            .subscribe(true, NotifyHandler::new(report_id, sink))
            .await
        {
            warn!(
                "Subscribe notification failed on {} (report id {}): {}",
                characteristic.handle(),
                report_id,
                e
            );
            return Err(ConnectError::SubscribeFailed);
        }

        info!(
            "Subscribed to report id {} on handle {}",
            report_id,
            characteristic.handle()
        );
        count += 1;
        let record = Subscription {
            handle: characteristic.handle(),
            report_id,
        };
        if subscriptions.push(record).is_err() {
            debug!("Subscription table full, report id {} not recorded", report_id);
        }
    }

    Ok(count)
}
