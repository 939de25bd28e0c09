//! BLE GAP scanner - finds one HID peripheral to connect to.
//!
//! Discovered devices are filtered by connectability and the presence
//! of the HID Service UUID (0x1812) in their advertisement.  The first
//! match stops the scan and is parked until the caller picks it up, so
//! scanning and connecting never overlap.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ble::transport::{AdvertisedDevice, ScanAction, ScanCallbacks, ScanEngine};
use crate::config::HID_SERVICE_UUID;
use crate::error::TransportError;

struct FilterState<D> {
    candidate: Option<D>,
    last_scan_count: usize,
}

/// Scan callbacks: the HID filter plus the parked candidate.
///
/// Shared with the scan engine, so it lives in a `'static`.
pub struct HidScanFilter<D> {
    state: Mutex<CriticalSectionRawMutex, RefCell<FilterState<D>>>,
}

impl<D> HidScanFilter<D> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(FilterState {
                candidate: None,
                last_scan_count: 0,
            })),
        }
    }

    /// Drop the parked candidate.
    pub fn reset(&self) {
        self.state.lock(|s| s.borrow_mut().candidate = None);
    }

    pub fn take_candidate(&self) -> Option<D> {
        self.state.lock(|s| s.borrow_mut().candidate.take())
    }

    /// Devices the engine reported when the last scan ended.
    pub fn last_scan_count(&self) -> usize {
        self.state.lock(|s| s.borrow().last_scan_count)
    }
}

impl<D: Clone> HidScanFilter<D> {
    pub fn candidate(&self) -> Option<D> {
        self.state.lock(|s| s.borrow().candidate.clone())
    }
}

impl<D> Default for HidScanFilter<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AdvertisedDevice + Clone> ScanCallbacks<D> for HidScanFilter<D> {
    fn on_result(&self, device: &D) -> ScanAction {
        if !device.is_connectable() {
            trace!("Ignoring non-connectable advertiser {}", device.address());
            return ScanAction::Continue;
        }

        if device.has_service_uuid() && device.is_advertising_service(HID_SERVICE_UUID) {
            info!("Advertised HID device found: {}", device.address());
            self.state
                .lock(|s| s.borrow_mut().candidate = Some(device.clone()));
            // Stop scan before connecting.
            ScanAction::Stop
        } else {
            info!("Advertised non-HID device found: {}", device.address());
            ScanAction::Continue
        }
    }

    fn on_scan_end(&self, discovered: usize, reason: i32) {
        info!(
            "Scan ended, reason: {}, device count: {}",
            reason, discovered
        );
        self.state.lock(|s| s.borrow_mut().last_scan_count = discovered);
    }
}

/// Drives the stack's scan engine with a [`HidScanFilter`].
pub struct Scanner<E: ScanEngine> {
    engine: E,
    filter: &'static HidScanFilter<E::Device>,
}

impl<E: ScanEngine> Scanner<E> {
    /// Install the filter on `engine` and enable active scanning, which
    /// collects scan responses as well.
    pub fn new(mut engine: E, filter: &'static HidScanFilter<E::Device>) -> Self {
        engine.set_callbacks(filter);
        engine.set_active_scan(true);
        Self { engine, filter }
    }

    /// Start (or restart) discovery for `duration_ms` (0 = until a
    /// candidate is found or [`stop`](Self::stop) is called).
    ///
    /// Any previously parked candidate is dropped.
    pub fn start(&mut self, duration_ms: u32, continue_scanning: bool) -> Result<(), TransportError> {
        self.filter.reset();
        debug!(
            "BLE scan starting ({} ms window, continue: {})",
            duration_ms, continue_scanning
        );
        self.engine
            .start(duration_ms, continue_scanning, !continue_scanning)
    }

    pub fn stop(&mut self) -> Result<(), TransportError> {
        self.engine.stop()
    }

    pub fn is_scanning(&self) -> bool {
        self.engine.is_scanning()
    }

    /// The parked candidate, if any. It stays parked until taken or reset.
    pub fn device_to_connect(&self) -> Option<E::Device> {
        self.filter.candidate()
    }

    /// Hand the parked candidate over to the caller.
    pub fn take_device_to_connect(&mut self) -> Option<E::Device> {
        self.filter.take_candidate()
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }

    pub fn discovered_count(&self) -> usize {
        self.filter.last_scan_count()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
