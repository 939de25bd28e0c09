//! In-memory BLE stack and report parser for host tests.
//!
//! A [`MockDevice`] carries the peripheral it advertises (its HID
//! service, if any); a [`MockClient`] adopts that peripheral once it
//! connects.  Every client records the calls made on it so tests can
//! assert on the exact flow.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bleamiga::ble::transport::{
    AdvertisedDevice, BleClient, BleHost, BondStore, ClientCallbacks, ClientLookup,
    RemoteCharacteristic, RemoteDescriptor, RemoteService, ScanAction, ScanCallbacks, ScanEngine,
};
use bleamiga::ble::{Address, ConnHandle, ConnParams};
use bleamiga::config::{
    HID_REPORT_DATA_UUID, HID_REPORT_MAP_UUID, HID_SERVICE_UUID, MAX_SERVICE_CHARACTERISTICS,
};
use bleamiga::error::{ParserError, TransportError};
use bleamiga::hid::dispatch::NotifyHandler;
use bleamiga::hid::mapping::{ButtonSet, FieldMapping, GamepadConfig, InputFields, MouseConfig};
use bleamiga::hid::parser::ReportParser;
use bleamiga::session::HidSession;

pub fn addr(last: u8) -> Address {
    Address::new([0xC0, 0xDE, 0x00, 0x00, 0x00, last])
}

/// Leak `value` to get the `'static` the stack callbacks need.
pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

// ─── Report maps ─────────────────────────────────────────────────────────

/// 3-button mouse with wheel, no report IDs.
pub const MOUSE_REPORT_MAP: &[u8] = &[
    0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x09, 0x01, 0xA1, 0x00, 0x05, 0x09, 0x19, 0x01, 0x29,
    0x03, 0x15, 0x00, 0x25, 0x01, 0x95, 0x03, 0x75, 0x01, 0x81, 0x02, 0x95, 0x01, 0x75, 0x05,
    0x81, 0x01, 0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x09, 0x38, 0x15, 0x81, 0x25, 0x7F, 0x75,
    0x08, 0x95, 0x03, 0x81, 0x06, 0xC0, 0xC0,
];

/// Gamepad application collection with report ID 3.
pub const GAMEPAD_REPORT_MAP: &[u8] = &[
    0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, 0x85, 0x03, 0x05, 0x09, 0x19, 0x01, 0x29, 0x10, 0x15,
    0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x10, 0x81, 0x02, 0x05, 0x01, 0x09, 0x30, 0x09, 0x31,
    0x15, 0x81, 0x25, 0x7F, 0x75, 0x08, 0x95, 0x02, 0x81, 0x02, 0x09, 0x39, 0x15, 0x00, 0x25,
    0x08, 0x75, 0x08, 0x95, 0x01, 0x81, 0x42, 0xC0,
];

/// Boot keyboard: neither mouse nor gamepad.
pub const KEYBOARD_REPORT_MAP: &[u8] = &[
    0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x05, 0x07, 0x19, 0xE0, 0x29, 0xE7, 0x15, 0x00, 0x25,
    0x01, 0x75, 0x01, 0x95, 0x08, 0x81, 0x02, 0xC0,
];

/// Mouse (report ID 1) and gamepad (report ID 3) in one map.
pub fn combo_report_map() -> Vec<u8> {
    let mut map = vec![
        0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0x85, 0x01, 0x05, 0x09, 0x19, 0x01, 0x29, 0x03, 0x95,
        0x03, 0x75, 0x01, 0x81, 0x02, 0xC0,
    ];
    map.extend_from_slice(GAMEPAD_REPORT_MAP);
    map
}

// ─── GATT ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct CharInner {
    uuid: u16,
    handle: u16,
    readable: bool,
    notify: bool,
    value: Vec<u8>,
    read_error: Option<TransportError>,
    reference: Option<Vec<u8>>,
    subscribe_error: Option<TransportError>,
    handler: Cell<Option<NotifyHandler>>,
    subscribe_calls: Cell<usize>,
}

#[derive(Clone)]
pub struct MockCharacteristic(Rc<CharInner>);

impl MockCharacteristic {
    /// Readable report map characteristic.
    pub fn report_map(value: &[u8]) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_MAP_UUID,
            handle: 0x0010,
            readable: true,
            value: value.to_vec(),
            ..Default::default()
        }))
    }

    pub fn unreadable_report_map() -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_MAP_UUID,
            handle: 0x0010,
            readable: false,
            ..Default::default()
        }))
    }

    pub fn failing_report_map(error: TransportError) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_MAP_UUID,
            handle: 0x0010,
            readable: true,
            read_error: Some(error),
            ..Default::default()
        }))
    }

    /// Notifiable input report with a Report Reference descriptor.
    pub fn input_report(handle: u16, report_id: u8) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_DATA_UUID,
            handle,
            readable: true,
            notify: true,
            reference: Some(vec![report_id, 0x01]),
            ..Default::default()
        }))
    }

    pub fn input_report_without_reference(handle: u16) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_DATA_UUID,
            handle,
            notify: true,
            ..Default::default()
        }))
    }

    pub fn input_report_with_empty_reference(handle: u16) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_DATA_UUID,
            handle,
            notify: true,
            reference: Some(Vec::new()),
            ..Default::default()
        }))
    }

    /// Output report: no notify property.
    pub fn output_report(handle: u16, report_id: u8) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_DATA_UUID,
            handle,
            readable: true,
            reference: Some(vec![report_id, 0x02]),
            ..Default::default()
        }))
    }

    pub fn refusing_report(handle: u16, report_id: u8) -> Self {
        Self(Rc::new(CharInner {
            uuid: HID_REPORT_DATA_UUID,
            handle,
            notify: true,
            reference: Some(vec![report_id, 0x01]),
            subscribe_error: Some(TransportError::Rejected),
            ..Default::default()
        }))
    }

    pub fn other(uuid: u16, handle: u16) -> Self {
        Self(Rc::new(CharInner {
            uuid,
            handle,
            readable: true,
            notify: true,
            ..Default::default()
        }))
    }

    pub fn is_subscribed(&self) -> bool {
        self.0.handler.get().is_some()
    }

    pub fn subscribe_calls(&self) -> usize {
        self.0.subscribe_calls.get()
    }

    /// Push a notification through the installed handler, as the stack
    /// would.  Returns `false` when nothing is subscribed.
    pub fn notify(&self, payload: &[u8]) -> bool {
        match self.0.handler.get() {
            Some(handler) => {
                handler.handle(payload);
                true
            }
            None => false,
        }
    }
}

pub struct MockDescriptor(Vec<u8>);

impl RemoteDescriptor for MockDescriptor {
    async fn read_value(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = self.0.len().min(buf.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        Ok(n)
    }
}

impl RemoteCharacteristic for MockCharacteristic {
    type Descriptor = MockDescriptor;

    fn uuid(&self) -> u16 {
        self.0.uuid
    }

    fn handle(&self) -> u16 {
        self.0.handle
    }

    fn can_read(&self) -> bool {
        self.0.readable
    }

    fn can_notify(&self) -> bool {
        self.0.notify
    }

    async fn read_value(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if let Some(e) = self.0.read_error {
            return Err(e);
        }
        let n = self.0.value.len().min(buf.len());
        buf[..n].copy_from_slice(&self.0.value[..n]);
        Ok(n)
    }

    async fn descriptor(&self, uuid: u16) -> Option<MockDescriptor> {
        if uuid != bleamiga::config::REPORT_REFERENCE_UUID {
            return None;
        }
        self.0.reference.clone().map(MockDescriptor)
    }

    async fn subscribe(
        &self,
        notifications: bool,
        handler: NotifyHandler,
    ) -> Result<(), TransportError> {
        assert!(notifications, "reports are subscribed as notifications");
        self.0.subscribe_calls.set(self.0.subscribe_calls.get() + 1);
        if let Some(e) = self.0.subscribe_error {
            return Err(e);
        }
        self.0.handler.set(Some(handler));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockService {
    characteristics: Vec<MockCharacteristic>,
    discovery_error: Option<TransportError>,
}

impl MockService {
    pub fn new(characteristics: Vec<MockCharacteristic>) -> Self {
        Self {
            characteristics,
            discovery_error: None,
        }
    }

    pub fn failing_discovery(mut self) -> Self {
        self.discovery_error = Some(TransportError::Timeout);
        self
    }
}

impl RemoteService for MockService {
    type Characteristic = MockCharacteristic;

    async fn characteristic(&self, uuid: u16) -> Option<MockCharacteristic> {
        self.characteristics.iter().find(|c| c.uuid() == uuid).cloned()
    }

    async fn characteristics(
        &self,
        _refresh: bool,
    ) -> Result<heapless::Vec<MockCharacteristic, MAX_SERVICE_CHARACTERISTICS>, TransportError>
    {
        if let Some(e) = self.discovery_error {
            return Err(e);
        }
        let mut out = heapless::Vec::new();
        for c in &self.characteristics {
            out.push(c.clone()).map_err(|_| TransportError::Raw(-1))?;
        }
        Ok(out)
    }
}

// ─── Advertising ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockDevice {
    pub address: Address,
    pub connectable: bool,
    pub advertised: Vec<u16>,
    /// HID service the peer exposes once connected.
    pub hid_service: Option<MockService>,
    /// Connection attempts that fail before one succeeds.
    pub connect_failures: Rc<Cell<usize>>,
}

impl MockDevice {
    pub fn hid(last: u8, service: MockService) -> Self {
        Self {
            address: addr(last),
            connectable: true,
            advertised: vec![HID_SERVICE_UUID],
            hid_service: Some(service),
            connect_failures: Rc::new(Cell::new(0)),
        }
    }

    /// Advertises HID but exposes no HID service after connecting.
    pub fn without_hid_service(last: u8) -> Self {
        Self {
            address: addr(last),
            connectable: true,
            advertised: vec![HID_SERVICE_UUID],
            hid_service: None,
            connect_failures: Rc::new(Cell::new(0)),
        }
    }

    pub fn non_hid(last: u8) -> Self {
        Self {
            address: addr(last),
            connectable: true,
            advertised: vec![0x180F],
            hid_service: None,
            connect_failures: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing_connects(self, count: usize) -> Self {
        self.connect_failures.set(count);
        self
    }
}

impl AdvertisedDevice for MockDevice {
    fn address(&self) -> Address {
        self.address
    }

    fn is_connectable(&self) -> bool {
        self.connectable
    }

    fn has_service_uuid(&self) -> bool {
        !self.advertised.is_empty()
    }

    fn is_advertising_service(&self, uuid: u16) -> bool {
        self.advertised.contains(&uuid)
    }
}

#[derive(Default)]
pub struct MockScanEngine {
    callbacks: Option<&'static dyn ScanCallbacks<MockDevice>>,
    pub active: bool,
    pub scanning: bool,
    /// `(duration_ms, is_continue, restart)` of every start.
    pub starts: Vec<(u32, bool, bool)>,
    pub stops: usize,
    delivered: usize,
}

impl MockScanEngine {
    /// Report `devices` one by one until a callback asks to stop.
    /// Returns how many were delivered.
    pub fn feed(&mut self, devices: &[MockDevice]) -> usize {
        let callbacks = self.callbacks.expect("scan callbacks installed");
        let mut delivered = 0;
        for device in devices {
            if !self.scanning {
                break;
            }
            delivered += 1;
            self.delivered += 1;
            if callbacks.on_result(device) == ScanAction::Stop {
                self.scanning = false;
                callbacks.on_scan_end(self.delivered, 0);
            }
        }
        delivered
    }

    /// Close the scan window.
    pub fn expire(&mut self) {
        if self.scanning {
            self.scanning = false;
            if let Some(callbacks) = self.callbacks {
                callbacks.on_scan_end(self.delivered, 0);
            }
        }
    }
}

impl ScanEngine for MockScanEngine {
    type Device = MockDevice;

    fn set_callbacks(&mut self, callbacks: &'static dyn ScanCallbacks<MockDevice>) {
        self.callbacks = Some(callbacks);
    }

    fn set_active_scan(&mut self, active: bool) {
        self.active = active;
    }

    fn start(
        &mut self,
        duration_ms: u32,
        is_continue: bool,
        restart: bool,
    ) -> Result<(), TransportError> {
        self.starts.push((duration_ms, is_continue, restart));
        if !is_continue {
            self.delivered = 0;
        }
        self.scanning = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        self.stops += 1;
        self.scanning = false;
        Ok(())
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }
}

// ─── Clients and host ───────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    SetCallbacks,
    SetParams(ConnParams),
    SetTimeout(u32),
    Connect { refresh: bool },
    Disconnect,
}

struct ClientInner {
    handle: ConnHandle,
    connected: Cell<bool>,
    peer: Cell<Address>,
    hid_service: RefCell<Option<MockService>>,
    callbacks: Cell<Option<&'static dyn ClientCallbacks<MockClient>>>,
    calls: RefCell<Vec<Call>>,
}

#[derive(Clone)]
pub struct MockClient(Rc<ClientInner>);

impl MockClient {
    fn new(handle: ConnHandle) -> Self {
        Self(Rc::new(ClientInner {
            handle,
            connected: Cell::new(false),
            peer: Cell::new(Address::default()),
            hid_service: RefCell::new(None),
            callbacks: Cell::new(None),
            calls: RefCell::new(Vec::new()),
        }))
    }

    /// A client left over from an earlier session with `device`.
    pub fn known(handle: ConnHandle, device: &MockDevice, connected: bool) -> Self {
        let client = Self::new(handle);
        client.0.peer.set(device.address);
        client.0.connected.set(connected);
        *client.0.hid_service.borrow_mut() = device.hid_service.clone();
        client
    }

    pub fn conn_handle(&self) -> ConnHandle {
        self.0.handle
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.calls.borrow().clone()
    }

    pub fn connects(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Connect { refresh } => Some(refresh),
                _ => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == Call::Disconnect)
            .count()
    }

    pub fn has_callbacks(&self) -> bool {
        self.0.callbacks.get().is_some()
    }

    pub fn is_same(&self, other: &MockClient) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Simulate the peer dropping the link.
    pub fn drop_link(&self, reason: i32) {
        if self.0.connected.replace(false) {
            if let Some(callbacks) = self.0.callbacks.get() {
                callbacks.on_disconnect(self, reason);
            }
        }
    }

    fn record(&self, call: Call) {
        self.0.calls.borrow_mut().push(call);
    }
}

impl BleClient for MockClient {
    type Device = MockDevice;
    type Service = MockService;

    fn set_client_callbacks(&self, callbacks: &'static dyn ClientCallbacks<Self>) {
        self.record(Call::SetCallbacks);
        self.0.callbacks.set(Some(callbacks));
    }

    fn set_connection_params(&self, params: &ConnParams) {
        self.record(Call::SetParams(*params));
    }

    fn set_connect_timeout(&self, timeout_ms: u32) {
        self.record(Call::SetTimeout(timeout_ms));
    }

    async fn connect(
        &self,
        device: &MockDevice,
        refresh_services: bool,
    ) -> Result<(), TransportError> {
        self.record(Call::Connect {
            refresh: refresh_services,
        });
        let failures = device.connect_failures.get();
        if failures > 0 {
            device.connect_failures.set(failures - 1);
            return Err(TransportError::Timeout);
        }

        self.0.peer.set(device.address);
        *self.0.hid_service.borrow_mut() = device.hid_service.clone();
        self.0.connected.set(true);
        if let Some(callbacks) = self.0.callbacks.get() {
            callbacks.on_connect(self);
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), TransportError> {
        self.record(Call::Disconnect);
        self.drop_link(0x16);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.0.connected.get()
    }

    fn peer_address(&self) -> Address {
        self.0.peer.get()
    }

    fn rssi(&self) -> i8 {
        -58
    }

    async fn service(&self, uuid: u16) -> Option<MockService> {
        if uuid != HID_SERVICE_UUID || !self.is_connected() {
            return None;
        }
        self.0.hid_service.borrow().clone()
    }
}

pub struct MockHost {
    pub clients: Vec<MockClient>,
    pub bonds: Vec<Address>,
    pub max_connections: usize,
    pub created: usize,
    pub deleted: usize,
    pub bond_wipes: usize,
    pub fail_create: bool,
    next_handle: ConnHandle,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
            bonds: Vec::new(),
            max_connections: 3,
            created: 0,
            deleted: 0,
            bond_wipes: 0,
            fail_create: false,
            next_handle: 1,
        }
    }

    pub fn with_client(mut self, client: MockClient) -> Self {
        self.next_handle = self.next_handle.max(client.conn_handle() + 1);
        self.clients.push(client);
        self
    }

    pub fn with_bonds(mut self, count: u8) -> Self {
        self.bonds = (0..count).map(|i| addr(0xB0 + i)).collect();
        self
    }

    pub fn last_client(&self) -> MockClient {
        self.clients.last().cloned().expect("a client")
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BondStore for MockHost {
    fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    fn bonded_address(&self, index: usize) -> Option<Address> {
        self.bonds.get(index).copied()
    }

    fn delete_all_bonds(&mut self) -> Result<(), TransportError> {
        self.bonds.clear();
        self.bond_wipes += 1;
        Ok(())
    }

    fn max_connections(&self) -> usize {
        self.max_connections
    }
}

impl BleHost for MockHost {
    type Device = MockDevice;
    type Client = MockClient;

    fn created_client_count(&self) -> usize {
        self.clients.len()
    }

    fn client_by_peer_address(&self, address: &Address) -> Option<MockClient> {
        self.clients
            .iter()
            .find(|c| c.peer_address() == *address)
            .cloned()
    }

    fn disconnected_client(&self) -> Option<MockClient> {
        self.clients.iter().find(|c| !c.is_connected()).cloned()
    }

    fn create_client(&mut self) -> Result<MockClient, TransportError> {
        if self.fail_create {
            return Err(TransportError::Rejected);
        }
        let client = MockClient::new(self.next_handle);
        self.next_handle += 1;
        self.created += 1;
        self.clients.push(client.clone());
        Ok(client)
    }

    fn delete_client(&mut self, client: MockClient) {
        self.clients.retain(|c| !c.is_same(&client));
        self.deleted += 1;
    }
}

impl ClientLookup<MockClient> for MockHost {
    fn client_by_handle(&self, handle: ConnHandle) -> Option<MockClient> {
        self.clients
            .iter()
            .find(|c| c.conn_handle() == handle)
            .cloned()
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────

/// Test parser with fixed layouts:
/// mouse `[buttons, x, y, wheel]`, gamepad `[buttons lo, buttons hi, x, y, hat]`.
///
/// Every payload it is handed is recorded with its report ID.
#[derive(Default)]
pub struct ScriptedParser {
    mapping: Option<FieldMapping>,
    pub init_error: Option<ParserError>,
    /// Only decode reports with this ID, when set.
    pub accept_report_id: Option<u8>,
    pub seen: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init(error: ParserError) -> Self {
        Self {
            init_error: Some(error),
            ..Self::default()
        }
    }

    pub fn accepting(report_id: u8) -> Self {
        Self {
            accept_report_id: Some(report_id),
            ..Self::default()
        }
    }
}

impl ReportParser for ScriptedParser {
    fn init(&mut self, mapping: &FieldMapping, _descriptor: &[u8]) -> Result<(), ParserError> {
        if let Some(e) = self.init_error {
            self.mapping = None;
            return Err(e);
        }
        self.mapping = Some(*mapping);
        Ok(())
    }

    fn parse(
        &mut self,
        payload: &[u8],
        report_id: u8,
        fields: &mut InputFields,
    ) -> Result<(), ParserError> {
        self.seen.borrow_mut().push((report_id, payload.to_vec()));
        let mapping = self.mapping.ok_or(ParserError::NOT_CONFIGURED)?;
        if matches!(self.accept_report_id, Some(id) if id != report_id) {
            return Ok(());
        }

        match mapping {
            FieldMapping::Mouse(_) => {
                if payload.len() < 4 {
                    return Err(ParserError::SHORT_REPORT);
                }
                fields.buttons = ButtonSet::from_bits(payload[0] as u32);
                fields.axes[MouseConfig::X] = payload[1] as i8 as i32;
                fields.axes[MouseConfig::Y] = payload[2] as i8 as i32;
                fields.axes[MouseConfig::WHEEL] = payload[3] as i8 as i32;
            }
            FieldMapping::Gamepad(_) => {
                if payload.len() < 5 {
                    return Err(ParserError::SHORT_REPORT);
                }
                fields.buttons =
                    ButtonSet::from_bits(u16::from_le_bytes([payload[0], payload[1]]) as u32);
                fields.axes[GamepadConfig::X] = payload[2] as i8 as i32;
                fields.axes[GamepadConfig::Y] = payload[3] as i8 as i32;
                fields.axes[GamepadConfig::HAT_SWITCH] = payload[4] as i32;
            }
        }
        Ok(())
    }

    fn num_mappings(&self) -> usize {
        usize::from(self.mapping.is_some())
    }
}

pub type TestSession = HidSession<ScriptedParser>;

pub fn session(parser: ScriptedParser) -> &'static TestSession {
    leak(HidSession::new(parser))
}
