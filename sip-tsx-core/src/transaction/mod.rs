//! The four RFC 3261 §17 transaction state machines and the plumbing shared
//! between them (registration, the callback surface, the event mailbox).
//!
//! Grounded in the teacher's `transaction` module: this crate keeps its
//! split into `key`/`client`/`client_inv`/`server`/`server_inv`/`registration`
//! submodules, but realizes each transaction as its own `tokio::spawn`ed
//! actor consuming an `mpsc` mailbox instead of the teacher's pull-based
//! `receive().await` API, since the spec models transactions as push-driven
//! state machines fed by the manager (§4.E, §5).

mod client;
mod client_inv;
pub(crate) mod key;
pub(crate) mod registration;
mod server;
mod server_inv;

use std::fmt;
use std::net::SocketAddr;

use sip_tsx_types::MessageView;
use tokio::sync::mpsc;

pub use client::spawn_client_non_invite;
pub use client_inv::spawn_client_invite;
pub use key::TsxKey;
pub(crate) use registration::{TransactionTable, TsxRegistration};
pub use server::spawn_server_non_invite;
pub use server_inv::spawn_server_invite;

/// Events fed into a transaction's mailbox. The manager is the only producer;
/// each transaction's own actor task is the sole consumer, giving FIFO
/// per-transaction ordering without a shared lock (§5).
pub(crate) enum TsxEvent<M> {
    /// TU-send(response|request): the TU posts a response through a server
    /// transaction's handle.
    Send(M),
    /// on-message(msg): an inbound request/response matched to this key.
    Message(M),
    /// transport-error: the underlying send failed unrecoverably.
    TransportError,
}

/// Callback surface notified of a transaction's externally-visible events
/// (§6 "callback events delivered to the TU"). Every method defaults to a
/// no-op so a TU only implements what it cares about, mirroring how the
/// teacher keeps its TU-facing surface minimal.
pub trait TransactionCallback<M: MessageView>: Send + Sync + 'static {
    /// `provisional(response)`.
    fn on_provisional(&self, _response: M) {}

    /// `final(response)`.
    fn on_final(&self, _response: M) {}

    /// `timeout`.
    fn on_timeout(&self) {}

    /// `transport_failure`.
    fn on_transport_failure(&self) {}

    /// `transaction_terminated`.
    fn on_terminated(&self) {}
}

/// A [`TransactionCallback`] that additionally accepts new server
/// transactions (§6: `incoming_request(request, server-tx-handle)`).
/// Registered once per [`crate::manager::TransactionManager`] as "the TU".
pub trait IncomingRequestHandler<M: MessageView>: TransactionCallback<M> {
    fn incoming_request(&self, request: M, remote: SocketAddr, handle: ServerTxHandle<M>);
}

/// Handle the TU uses to post a response into a live server transaction
/// (§6: `send_response(server-tx-handle, response)`).
#[derive(Clone)]
pub struct ServerTxHandle<M> {
    key: TsxKey,
    sender: mpsc::UnboundedSender<TsxEvent<M>>,
}

impl<M> fmt::Debug for ServerTxHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTxHandle").field("key", &self.key).finish()
    }
}

impl<M> ServerTxHandle<M> {
    pub(crate) fn new(key: TsxKey, sender: mpsc::UnboundedSender<TsxEvent<M>>) -> Self {
        ServerTxHandle { key, sender }
    }

    pub fn key(&self) -> &TsxKey {
        &self.key
    }

    /// Post a response. Silently dropped if the transaction has already
    /// terminated (§4.E's "Any state + Send of a final while Completed /
    /// Terminated is silently discarded").
    pub fn send_response(&self, response: M) {
        let _ = self.sender.send(TsxEvent::Send(response));
    }
}

/// Handle the manager returns from [`crate::manager::TransactionManager::begin_client_tx`].
/// Client transactions take no further input from the TU besides origination
/// (§6); this handle exists for symmetry and diagnostics.
#[derive(Clone)]
pub struct ClientTxHandle {
    key: TsxKey,
}

impl fmt::Debug for ClientTxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTxHandle").field("key", &self.key).finish()
    }
}

impl ClientTxHandle {
    pub(crate) fn new(key: TsxKey) -> Self {
        ClientTxHandle { key }
    }

    pub fn key(&self) -> &TsxKey {
        &self.key
    }
}

