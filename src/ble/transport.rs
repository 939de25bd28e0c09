//! Interface to the BLE stack.
//!
//! The session core never talks to a radio directly.  The embedding
//! firmware implements these traits on top of its stack (SoftDevice,
//! NimBLE, a host adapter, ...).  Handles (`BleClient`, `RemoteService`,
//! ...) are cheap clones referring to objects owned by the stack.
//!
//! Radio round-trips are `async`; teardown, scan control and every
//! callback are synchronous because they may run inside the stack's
//! own event context.

use heapless::Vec;

use crate::ble::{Address, ConnDesc, ConnHandle, ConnParams};
use crate::config::MAX_SERVICE_CHARACTERISTICS;
use crate::error::TransportError;
use crate::hid::dispatch::NotifyHandler;

/// One peer seen during scanning.
pub trait AdvertisedDevice {
    fn address(&self) -> Address;
    fn is_connectable(&self) -> bool;
    /// Whether the advertisement carries any service UUID list at all.
    fn has_service_uuid(&self) -> bool;
    fn is_advertising_service(&self, uuid: u16) -> bool;
}

/// Verdict returned from [`ScanCallbacks::on_result`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanAction {
    Continue,
    /// Halt the scan right away; the engine must not report further results.
    Stop,
}

/// Handler the scan engine invokes from its own context.
pub trait ScanCallbacks<D> {
    fn on_result(&self, device: &D) -> ScanAction;
    /// Scan window closed (or was stopped). Purely informational.
    fn on_scan_end(&self, discovered: usize, reason: i32);
}

/// Advertisement scanner of the stack.
pub trait ScanEngine {
    type Device: AdvertisedDevice + Clone + 'static;

    fn set_callbacks(&mut self, callbacks: &'static dyn ScanCallbacks<Self::Device>);
    /// Active scanning requests scan responses (names, extra UUIDs).
    fn set_active_scan(&mut self, active: bool);
    /// Start scanning for `duration_ms` (0 = until stopped).
    ///
    /// `is_continue` keeps the stack's result cache from the previous
    /// scan; `restart` restarts an already running scan.
    fn start(&mut self, duration_ms: u32, is_continue: bool, restart: bool)
        -> Result<(), TransportError>;
    fn stop(&mut self) -> Result<(), TransportError>;
    fn is_scanning(&self) -> bool;
}

/// Link-level callbacks installed on a client.
pub trait ClientCallbacks<C: BleClient> {
    fn on_connect(&self, client: &C);
    fn on_disconnect(&self, client: &C, reason: i32);
    /// Return `true` to accept the peer's requested parameters.
    fn on_conn_params_update_request(&self, client: &C, params: &ConnParams) -> bool;
    fn on_pass_key_request(&self) -> u32;
    fn on_confirm_pin(&self, pass_key: u32) -> bool;
    /// Pairing finished on `desc.conn_handle`.
    ///
    /// This can race the connect flow, so the affected client is looked
    /// up by handle rather than taken from any session object.
    fn on_authentication_complete(&self, desc: &ConnDesc, clients: &dyn ClientLookup<C>);
}

/// Resolve a client from its connection handle.
pub trait ClientLookup<C> {
    fn client_by_handle(&self, handle: ConnHandle) -> Option<C>;
}

/// Bond storage of the stack.
pub trait BondStore {
    fn num_bonds(&self) -> usize;
    fn bonded_address(&self, index: usize) -> Option<Address>;
    fn delete_all_bonds(&mut self) -> Result<(), TransportError>;
    /// Simultaneous connections (and therefore bonds) the platform supports.
    fn max_connections(&self) -> usize;
}

/// Client pool plus bond storage: everything the connection manager
/// needs from the stack.
///
/// Stacks also implement [`ClientLookup`] for their client type so it
/// can be handed to [`ClientCallbacks::on_authentication_complete`].
pub trait BleHost: BondStore {
    type Device: AdvertisedDevice;
    type Client: BleClient<Device = Self::Device>;

    fn created_client_count(&self) -> usize;
    fn client_by_peer_address(&self, address: &Address) -> Option<Self::Client>;
    /// Any client object whose link is currently down.
    fn disconnected_client(&self) -> Option<Self::Client>;
    fn create_client(&mut self) -> Result<Self::Client, TransportError>;
    fn delete_client(&mut self, client: Self::Client);
}

/// GATT client bound to (at most) one peer.
pub trait BleClient: Clone + 'static {
    type Device: AdvertisedDevice;
    type Service: RemoteService;

    fn set_client_callbacks(&self, callbacks: &'static dyn ClientCallbacks<Self>);
    fn set_connection_params(&self, params: &ConnParams);
    fn set_connect_timeout(&self, timeout_ms: u32);
    /// Establish the link. With `refresh_services == false` the cached
    /// attribute table from an earlier connection is kept.
    async fn connect(&self, device: &Self::Device, refresh_services: bool)
        -> Result<(), TransportError>;
    fn disconnect(&self) -> Result<(), TransportError>;
    fn is_connected(&self) -> bool;
    fn peer_address(&self) -> Address;
    fn rssi(&self) -> i8;
    async fn service(&self, uuid: u16) -> Option<Self::Service>;
}

pub trait RemoteService {
    type Characteristic: RemoteCharacteristic;

    async fn characteristic(&self, uuid: u16) -> Option<Self::Characteristic>;
    /// Every characteristic of the service, including several instances
    /// sharing one UUID. `refresh` re-runs discovery.
    async fn characteristics(
        &self,
        refresh: bool,
    ) -> Result<Vec<Self::Characteristic, MAX_SERVICE_CHARACTERISTICS>, TransportError>;
}

pub trait RemoteCharacteristic {
    type Descriptor: RemoteDescriptor;

    fn uuid(&self) -> u16;
    fn handle(&self) -> u16;
    fn can_read(&self) -> bool;
    fn can_notify(&self) -> bool;
    /// Read the value into `buf`, returning the number of bytes stored.
    async fn read_value(&self, buf: &mut [u8]) -> Result<usize, TransportError>;
    async fn descriptor(&self, uuid: u16) -> Option<Self::Descriptor>;
    /// Enable notifications (or indications when `notifications` is false)
    /// and deliver each one to `handler`.
    async fn subscribe(&self, notifications: bool, handler: NotifyHandler)
        -> Result<(), TransportError>;
}

pub trait RemoteDescriptor {
    async fn read_value(&self, buf: &mut [u8]) -> Result<usize, TransportError>;
}
