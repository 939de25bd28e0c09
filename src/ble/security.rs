//! Link and pairing callbacks.
//!
//! Installed on every client the connection manager hands to the stack.
//! They run in the stack's context, independently of any `connect` in
//! flight, and only touch the session's shared link flag.

use crate::ble::transport::{BleClient, ClientCallbacks, ClientLookup};
use crate::ble::{ConnDesc, ConnParams};
use crate::hid::parser::ReportParser;
use crate::session::HidSession;

impl<C: BleClient, P: ReportParser> ClientCallbacks<C> for HidSession<P> {
    fn on_connect(&self, client: &C) {
        info!("Connected to {}", client.peer_address());
        self.set_connected(true);
    }

    fn on_disconnect(&self, client: &C, reason: i32) {
        info!("{} disconnected, reason = {}", client.peer_address(), reason);
        self.set_connected(false);
    }

    fn on_conn_params_update_request(&self, _client: &C, params: &ConnParams) -> bool {
        debug!(
            "Peer requests interval {}-{} latency {} timeout {}",
            params.min_interval,
            params.max_interval,
            params.latency,
            params.supervision_timeout
        );
        true
    }

    fn on_pass_key_request(&self) -> u32 {
        info!("Client passkey request");
        self.passkey()
    }

    fn on_confirm_pin(&self, pass_key: u32) -> bool {
        info!("Confirming passkey {}", pass_key);
        true
    }

    fn on_authentication_complete(&self, desc: &ConnDesc, clients: &dyn ClientLookup<C>) {
        if desc.encrypted {
            debug!(
                "Link {} encrypted (bonded: {})",
                desc.conn_handle,
                desc.bonded
            );
            return;
        }

        warn!("Encrypt connection failed - disconnecting link {}", desc.conn_handle);
        match clients.client_by_handle(desc.conn_handle) {
            Some(client) => {
                if let Err(e) = client.disconnect() {
                    warn!("Disconnect of link {} failed: {}", desc.conn_handle, e);
                }
            }
            None => warn!("No client for link {}", desc.conn_handle),
        }
    }
}
