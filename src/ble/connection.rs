//! BLE connection manager.
//!
//! Turns one scanned HID candidate into a live session: acquires a
//! client from the stack (reusing one where possible), enforces the
//! bonding limit, then discovers, classifies and subscribes through
//! [`hid_client`](crate::ble::hid_client).
//!
//! Exactly one session is kept.  Every failure after the link came up
//! tears the link down before `connect` returns.

use core::fmt;

use heapless::Vec;

use crate::ble::hid_client::{self, Subscription};
use crate::ble::transport::{AdvertisedDevice, BleClient, BleHost, BondStore, ClientCallbacks};
use crate::ble::Address;
use crate::config::{ConnectConfig, HID_SERVICE_UUID, MAX_SUBSCRIPTIONS, REPORT_MAP_CAPACITY};
use crate::error::{ConnectError, TransportError};
use crate::hid::dispatch::ReportSink;
use crate::hid::parser::ReportParser;
use crate::hid::DeviceKind;
use crate::session::HidSession;

/// Where the session currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Idle,
    Acquiring,
    Discovering,
    Classifying,
    Subscribing,
    Ready,
    Failed,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Acquiring => "acquiring",
            ConnectionState::Discovering => "discovering",
            ConnectionState::Classifying => "classifying",
            ConnectionState::Subscribing => "subscribing",
            ConnectionState::Ready => "ready",
            ConnectionState::Failed => "failed",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful [`HidConnection::connect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionSummary {
    pub address: Address,
    pub kind: DeviceKind,
    /// Report characteristics subscribed.  Zero means a degraded session
    /// that will never deliver input.
    pub subscriptions: usize,
}

/// Wipe every bond when the store holds as many as the platform has
/// connections.  Returns whether a wipe happened.
pub fn evict_all_bonds_if_at_capacity<B: BondStore>(bonds: &mut B) -> bool {
    if bonds.num_bonds() < bonds.max_connections() {
        return false;
    }

    warn!("Max clients reached! Full reset, clearing all bonded clients");
    if let Err(e) = bonds.delete_all_bonds() {
        error!("Deleting bonds failed: {}", e);
    }
    true
}

fn log_bonds<B: BondStore>(bonds: &B) {
    let count = bonds.num_bonds();
    if count == 0 {
        return;
    }
    info!("Num bonds: {}", count);
    for i in 0..count {
        if let Some(address) = bonds.bonded_address(i) {
            info!("- Bonded client {}: {}", i, address);
        }
    }
}

/// Single-session HID connection manager.
pub struct HidConnection<H: BleHost, P: ReportParser + 'static> {
    session: &'static HidSession<P>,
    config: ConnectConfig,
    state: ConnectionState,
    client: Option<H::Client>,
    subscriptions: Vec<Subscription, MAX_SUBSCRIPTIONS>,
}

impl<H: BleHost, P: ReportParser + 'static> HidConnection<H, P> {
    pub fn new(session: &'static HidSession<P>, config: ConnectConfig) -> Self {
        Self {
            session,
            config,
            state: ConnectionState::Idle,
            client: None,
            subscriptions: Vec::new(),
        }
    }

    /// A ready session whose link has since dropped reads as
    /// [`ConnectionState::Disconnected`].
    pub fn state(&self) -> ConnectionState {
        if self.state == ConnectionState::Ready && !self.session.is_connected() {
            ConnectionState::Disconnected
        } else {
            self.state
        }
    }

    pub fn session(&self) -> &'static HidSession<P> {
        self.session
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn set_state(&mut self, state: ConnectionState) {
        trace!("Connection state: {} -> {}", self.state, state);
        self.state = state;
    }

    /// Tear down the current session's link, if any.
    pub fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(client) = self.client.take() else {
            return Ok(());
        };
        self.subscriptions.clear();
        self.set_state(ConnectionState::Disconnected);
        client.disconnect()
    }

    /// Connect to `device` and bring up a HID session on it.
    ///
    /// Any earlier session that is no longer live is discarded first.
    pub async fn connect(
        &mut self,
        host: &mut H,
        device: &H::Device,
    ) -> Result<SessionSummary, ConnectError> {
        if self.state == ConnectionState::Ready && self.session.is_connected() {
            warn!("Session already active, disconnect first");
            return Err(ConnectError::Busy);
        }

        self.client = None;
        self.subscriptions.clear();
        self.session.dispatcher().clear();

        self.set_state(ConnectionState::Acquiring);
        let client = match self.acquire_client(host, device).await {
            Ok(client) => client,
            Err(e) => {
                self.set_state(ConnectionState::Failed);
                return Err(e);
            }
        };

        info!("Connected to: {} RSSI: {}", client.peer_address(), client.rssi());

        match self.establish_session(&client).await {
            Ok(summary) => {
                self.client = Some(client);
                self.set_state(ConnectionState::Ready);
                Ok(summary)
            }
            Err(e) => {
                warn!("Connection failed: {}", e);
                if let Err(err) = client.disconnect() {
                    warn!("Disconnect after failure failed: {}", err);
                }
                self.subscriptions.clear();
                self.session.dispatcher().clear();
                self.set_state(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    fn install_callbacks(&self, client: &H::Client) {
        let callbacks: &'static dyn ClientCallbacks<H::Client> = self.session;
        client.set_client_callbacks(callbacks);
    }

    /// Find or create a client and get its link up.
    async fn acquire_client(
        &self,
        host: &mut H,
        device: &H::Device,
    ) -> Result<H::Client, ConnectError> {
        let mut reused = None;

        if host.created_client_count() > 0 {
            // A client that already knows this peer keeps its attribute
            // cache: reconnect without refreshing services.
            if let Some(known) = host.client_by_peer_address(&device.address()) {
                self.install_callbacks(&known);
                if let Err(e) = known.connect(device, false).await {
                    warn!("Reconnect failed: {}", e);
                    return Err(ConnectError::ReconnectFailed);
                }
                info!("Reconnected client");
                reused = Some(known);
            } else if let Some(idle) = host.disconnected_client() {
                info!("Found disconnected client");
                self.install_callbacks(&idle);
                reused = Some(idle);
            }
        }

        let client = match reused {
            Some(client) => client,
            None => self.create_client(host, device).await?,
        };

        if !client.is_connected() {
            if let Err(e) = client.connect(device, true).await {
                warn!("Failed to connect: {}", e);
                return Err(ConnectError::ConnectFailed);
            }
        }

        Ok(client)
    }

    async fn create_client(
        &self,
        host: &mut H,
        device: &H::Device,
    ) -> Result<H::Client, ConnectError> {
        evict_all_bonds_if_at_capacity(host);
        log_bonds(host);

        let client = host.create_client().map_err(|e| {
            warn!("Client creation failed: {}", e);
            ConnectError::ClientCreateFailed
        })?;
        info!("New client");

        self.install_callbacks(&client);
        client.set_connection_params(&self.config.conn_params);
        client.set_connect_timeout(self.config.connect_timeout_ms);

        if let Err(e) = client.connect(device, true).await {
            // A fresh client that never connected holds nothing worth keeping.
            warn!("Failed to connect: {}", e);
            host.delete_client(client);
            return Err(ConnectError::ConnectFailed);
        }

        Ok(client)
    }

    async fn establish_session(
        &mut self,
        client: &H::Client,
    ) -> Result<SessionSummary, ConnectError> {
        self.set_state(ConnectionState::Discovering);
        let Some(service) = client.service(HID_SERVICE_UUID).await else {
            warn!("HID service not found");
            return Err(ConnectError::HidServiceNotFound);
        };

        self.set_state(ConnectionState::Classifying);
        let mut report_map = [0u8; REPORT_MAP_CAPACITY];
        let len = hid_client::read_report_map(&service, &mut report_map).await?;
        let kind = hid_client::classify_and_configure(
            self.session.dispatcher(),
            &report_map[..len],
        )?;

        self.set_state(ConnectionState::Subscribing);
        let sink: &'static dyn ReportSink = self.session;
        let subscribed =
            hid_client::subscribe_reports(&service, sink, &mut self.subscriptions).await?;

        if subscribed == 0 {
            if self.config.require_subscription {
                warn!("No report characteristic subscribed");
                return Err(ConnectError::NoSubscriptions);
            }
            warn!("No report characteristic subscribed, session will stay silent");
        }

        Ok(SessionSummary {
            address: client.peer_address(),
            kind,
            subscriptions: subscribed,
        })
    }
}
